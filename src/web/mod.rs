// ============================================================================
// Module : web
// ============================================================================
// Serveur HTTP en lecture seule au-dessus du store
//
// CONCEPTS RUST :
// 1. Arc<AppState> : état partagé entre toutes les requêtes, sans copie
// 2. Router axum : association route -> handler, vérifiée à la compilation
// ============================================================================

pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::store::ParquetStore;

pub use error::{WebError, WebResult};

/// État partagé par les handlers
#[derive(Debug)]
pub struct AppState {
    /// Store Parquet, en lecture seule après le bootstrap
    pub store: ParquetStore,

    /// Devise de cotation (ex: "usd")
    pub vs_currency: String,

    /// Nombre maximum de lignes dans la page de détail
    pub table_rows: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            store: ParquetStore::new(&config.store_path),
            vs_currency: config.vs_currency.clone(),
            table_rows: config.table_rows,
        }
    }
}

/// Construit le router avec les deux routes de lecture
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/crypto/{asset}", get(handlers::show_crypto))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Lance le serveur HTTP et bloque jusqu'à son arrêt
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(config));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Impossible d'écouter sur {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "HTTP server listening");
    axum::serve(listener, app)
        .await
        .context("Le serveur HTTP s'est arrêté sur une erreur")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_config() {
        let config = Config {
            vs_currency: "eur".to_string(),
            table_rows: 30,
            ..Config::default()
        };
        let state = AppState::from_config(&config);

        assert_eq!(state.store.path(), config.store_path.as_path());
        assert_eq!(state.vs_currency, "eur");
        assert_eq!(state.table_rows, 30);
    }

    #[test]
    fn test_create_app_builds_router() {
        let state = Arc::new(AppState::from_config(&Config::default()));
        let _app: Router = create_app(state);
    }
}
