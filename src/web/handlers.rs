// ============================================================================
// Handlers HTTP
// ============================================================================
// GET /                -> liste des cryptos du store (index.html)
// GET /crypto/{asset}  -> tableau des derniers prix journaliers (crypto.html)
//
// Les lectures Parquet sont bloquantes : elles passent par spawn_blocking
// pour ne pas bloquer les workers tokio.
// ============================================================================

use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use tracing::{debug, info};

use super::error::{WebError, WebResult};
use super::AppState;
use crate::models::DailyPrice;
use crate::store::ParquetStore;

// ============================================================================
// Templates
// ============================================================================

/// Page d'accueil : liste des cryptos disponibles
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub assets: Vec<String>,
}

/// Page de détail : prix journaliers d'une crypto
#[derive(Template)]
#[template(path = "crypto.html")]
pub struct CryptoPage {
    /// Nom affiché (ex: "Bitcoin")
    pub coin: String,

    /// Devise de cotation affichée (ex: "USD")
    pub vs_currency: String,

    /// Lignes du tableau, du jour le plus ancien au plus récent
    pub rows: Vec<PriceRow>,
}

/// Une ligne du tableau, déjà formatée pour l'affichage
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: String,
    pub price: String,
}

impl From<&DailyPrice> for PriceRow {
    fn from(point: &DailyPrice) -> Self {
        Self {
            date: point.day_label(),
            price: format_price(point.price),
        }
    }
}

/// Rend un template en réponse HTML, ou en 500 si le rendu échoue
fn render<T: Template>(template: &T) -> WebResult<Response> {
    let html = template.render().map_err(WebError::internal)?;
    Ok(Html(html).into_response())
}

/// Exécute une lecture du store sur le pool de threads bloquants
///
/// CONCEPT RUST : Closures FnOnce + Send + 'static
/// - La closure est déplacée vers un autre thread : elle doit posséder ses données
/// - D'où le clone du store (un simple PathBuf) avant le move
async fn with_store<T, F>(store: &ParquetStore, read: F) -> WebResult<T>
where
    T: Send + 'static,
    F: FnOnce(&ParquetStore) -> anyhow::Result<T> + Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || read(&store))
        .await
        .map_err(WebError::internal)?
        .map_err(WebError::internal)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Liste des cryptos
pub async fn index(State(state): State<Arc<AppState>>) -> WebResult<Response> {
    let assets = with_store(&state.store, |store| store.list_keys()).await?;
    debug!(count = assets.len(), "Rendering index");

    render(&IndexPage { assets })
}

/// GET /crypto/{asset} - Derniers prix journaliers d'une crypto
///
/// Renvoie au plus `table_rows` lignes (les plus récentes), dans l'ordre
/// chronologique. Une crypto inconnue donne un 404 en texte brut.
pub async fn show_crypto(
    State(state): State<Arc<AppState>>,
    Path(asset): Path<String>,
) -> WebResult<Response> {
    let key = asset.clone();
    let series = with_store(&state.store, move |store| store.read(&key))
        .await?
        .ok_or_else(|| {
            info!(asset = %asset, "Unknown asset requested");
            WebError::NotFound(asset.clone())
        })?;

    let rows: Vec<PriceRow> = series
        .tail(state.table_rows)
        .iter()
        .map(PriceRow::from)
        .collect();
    debug!(asset = %asset, rows = rows.len(), "Rendering price table");

    render(&CryptoPage {
        coin: capitalize(&asset),
        vs_currency: state.vs_currency.to_uppercase(),
        rows,
    })
}

// ============================================================================
// Formatage
// ============================================================================

/// Première lettre en majuscule, le reste en minuscules ("bitcoin" -> "Bitcoin")
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Formatte un prix : 2 décimales, 6 pour les cryptos sous l'unité
pub fn format_price(price: f64) -> String {
    if price.abs() >= 1.0 {
        format!("{:.2}", price)
    } else {
        format!("{:.6}", price)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
