use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub store_url: String,
    pub store_namespace: String,
    pub template_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "8080"),
            store_url: read_secret("STORE_URL")
                .unwrap_or_else(|| try_load("STORE_URL", "redis://127.0.0.1:6379/0")),
            store_namespace: try_load("STORE_NAMESPACE", "recipe-webapp"),
            template_dir: var("TEMPLATE_DIR").ok().map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            store_url: "memory://".to_string(),
            store_namespace: "recipe-webapp".to_string(),
            template_dir: None,
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not found");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

// Store credentials live in the URL, so prefer a mounted secret over the environment.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret at {path}: {e}");
        })
        .ok()
}
