//! Documentation of a small recipe book web app.
//!
//! Recipes are named pieces of text. Each one can be viewed, edited, saved and
//! deleted through four routes, and lives as a JSON document in a document store.
//!
//!
//!
//! # Routes
//!
//! | Route | Method | Behavior |
//! |---|---|---|
//! | `/view/{title}` | GET | Show recipe or redirect to edit |
//! | `/edit/{title}` | GET | Show edit form (blank if not found) |
//! | `/save/{title}` | POST (form field `body`) | Create or update, then redirect to view |
//! | `/delete/{title}` | GET | Delete and show status page, or redirect to edit if missing |
//!
//! Titles may contain anything, including `/`. Redirects percent-encode them.
//!
//!
//!
//! # Recipe Lifecycle
//!
//! ```text
//! Missing --save--> Exists --save--> Exists (body updated, same id) --delete--> Missing
//! ```
//!
//! - Viewing or deleting a missing recipe sends the user to its edit page
//! - Saving looks the title up first, then either updates the body or inserts a new document
//! - Deleting renders the view page with a status title instead of redirecting
//!
//!
//!
//! # Notes
//!
//! ## Ids
//! Ids come from an atomic counter seeded with the size of the `recipes` collection at
//! startup. Nothing looks recipes up by id, it only tells documents apart.
//!
//! ## Failures
//! Store errors become a plain 500, the detail is logged. If the store cannot be reached
//! at boot the server still starts, and requests fail until it comes back.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! docker run -p 6379:6379 redis
//! RUST_LOG=info cargo run -p recipebook
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE_URL=memory:// cargo run -p recipebook
//! ```
//!
//! Smoke test a running server.
//! ```sh
//! cargo run -p tester -- --base-url http://localhost:8080
//! ```
//!
//!
//!
//! # Environment
//!
//! - `RUST_PORT`: listener port, default `8080`
//! - `STORE_URL`: `redis://...` or `memory://`, default `redis://127.0.0.1:6379/0`.
//!   `/run/secrets/STORE_URL` wins when present
//! - `STORE_NAMESPACE`: database name prefixed to collection keys, default `recipe-webapp`
//! - `TEMPLATE_DIR`: load `view.hbs` and `edit.hbs` from this directory
//! - `RUST_LOG`: tracing filter, default `info`
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod recipes;
pub mod routes;
pub mod state;
pub mod templates;
pub mod utils;

use config::Config;
use routes::{delete_handler, edit_handler, save_handler, view_handler};
use state::State;
use utils::{DELETE_ROUTE, EDIT_ROUTE, SAVE_ROUTE, VIEW_ROUTE};

pub fn app(state: Arc<State>) -> Router {
    Router::new()
        .route(&format!("{VIEW_ROUTE}{{*title}}"), get(view_handler))
        .route(&format!("{EDIT_ROUTE}{{*title}}"), get(edit_handler))
        .route(&format!("{SAVE_ROUTE}{{*title}}"), post(save_handler))
        .route(&format!("{DELETE_ROUTE}{{*title}}"), get(delete_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Initializing state...");
    let state = match State::new(Config::load()).await {
        Ok(state) => state,
        Err(e) => {
            error!("{e}");
            return;
        }
    };

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {address}: {e}");
            return;
        }
    };
    info!("Server running on {address}");

    if let Err(e) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }

    info!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
