use std::sync::Arc;

use handlebars::TemplateError;
use store::{Store, StoreError};
use thiserror::Error;
use tracing::info;

use super::{config::Config, recipes::Recipes, templates::Templates};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to open the store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to load templates: {0}")]
    Templates(#[from] TemplateError),
}

pub struct State {
    pub config: Config,
    pub recipes: Recipes,
    pub templates: Templates,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, StartupError> {
        info!("Opening store at {}", redact(&config.store_url));
        let store = Store::connect(&config.store_url, &config.store_namespace)?;

        Self::with_store(config, &store).await
    }

    pub async fn with_store(config: Config, store: &Store) -> Result<Arc<Self>, StartupError> {
        let templates = Templates::new(config.template_dir.as_deref())?;
        let recipes = Recipes::bootstrap(store).await;

        Ok(Arc::new(Self {
            config,
            recipes,
            templates,
        }))
    }
}

// Drops the userinfo part of a URL so passwords stay out of the log.
fn redact(url: &str) -> String {
    match (url.split_once("://"), url.rfind('@')) {
        (Some((scheme, _)), Some(at)) => format!("{scheme}://***{}", &url[at..]),
        _ => url.to_string(),
    }
}
