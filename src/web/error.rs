// ============================================================================
// Erreurs HTTP
// ============================================================================
// Chaque variante sait se convertir en réponse HTTP (trait IntoResponse)
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] implémente std::error::Error et Display
// - #[error("...")] définit le message affiché
// ============================================================================

use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Erreurs renvoyées par les handlers
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Crypto absente du store (404)
    #[error("Data for {0} not found.")]
    NotFound(String),

    /// Erreur de lecture du store ou de rendu de template (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    /// Construit une erreur interne à partir de n'importe quelle erreur affichable
    ///
    /// `{:#}` sur une anyhow::Error affiche toute la chaîne de contexte.
    pub fn internal(err: impl Display) -> Self {
        WebError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Internal(message) => {
                error!(error = %message, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Corps texte brut (text/plain; charset=utf-8)
        (status, self.to_string()).into_response()
    }
}

/// Type Result des handlers
pub type WebResult<T> = Result<T, WebError>;
