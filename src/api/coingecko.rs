// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère l'historique de prix d'une crypto via l'endpoint market_chart
//
// CONCEPTS RUST AVANCÉS :
// 1. async/await : programmation asynchrone (non-bloquante)
// 2. Result<T, E> : gestion d'erreurs avec contexte
// 3. Serde : désérialisation JSON automatique
// ============================================================================

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use super::PriceHistorySource;
use crate::config::Config;
use crate::models::PriceSample;

/// User-Agent envoyé à CoinGecko (les requêtes anonymes sans UA sont parfois refusées)
const USER_AGENT: &str = concat!("cryptoboard/", env!("CARGO_PKG_VERSION"));

/// Header utilisé par CoinGecko pour les clés du plan "demo"
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

// ============================================================================
// Structures pour parser la réponse JSON de CoinGecko
// ============================================================================
// Exemple de réponse :
// {
//   "prices":        [[1711843200000, 69702.3], [1711929600000, 71246.9], ...],
//   "market_caps":   [[...], ...],
//   "total_volumes": [[...], ...]
// }
// Seul "prices" nous intéresse : serde ignore les autres champs.
// ============================================================================

/// Réponse de /coins/{id}/market_chart
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    /// Paires [timestamp_ms, prix]
    /// CONCEPT RUST : [f64; 2]
    /// - Tableau de taille fixe, mappé directement depuis un array JSON à 2 éléments
    /// Champ obligatoire : une réponse sans "prices" est une erreur de parsing
    pub prices: Vec<[f64; 2]>,
}

/// Client HTTP pour CoinGecko
///
/// Le reqwest::Client est créé une seule fois : il garde un pool de connexions
/// réutilisé entre les appels du bootstrap.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    /// Crée un client vers `base_url` (ex: "https://api.coingecko.com/api/v3")
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        debug!("Creating HTTP client");
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Crée un client à partir de la configuration de l'application
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.api_key.clone())
    }

    /// Récupère l'historique de prix d'une crypto sur les `days` derniers jours
    ///
    /// # Arguments
    /// * `asset` - Identifiant CoinGecko (ex: "bitcoin")
    /// * `vs_currency` - Devise de cotation (ex: "usd")
    /// * `days` - Fenêtre glissante se terminant maintenant
    ///
    /// # Retourne
    /// * Les points bruts, du plus ancien au plus récent
    ///
    /// Toute erreur (réseau, statut HTTP, JSON invalide) est renvoyée telle quelle :
    /// pas de retry, pas de backoff.
    #[instrument(skip(self))]
    pub async fn fetch_market_chart(
        &self,
        asset: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<PriceSample>> {
        let url = build_market_chart_url(&self.base_url, asset, vs_currency, days);
        debug!(url = %url, "Built CoinGecko market_chart URL");

        let mut request = self.http.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        debug!("Sending HTTP request to CoinGecko");
        let response = request
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers CoinGecko pour {}", asset))?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, "CoinGecko returned error status");
            anyhow::bail!("CoinGecko a retourné une erreur pour {} : HTTP {}", asset, status);
        }

        debug!("Parsing JSON response");
        let chart: MarketChartResponse = response
            .json()
            .await
            .with_context(|| format!("Échec du parsing JSON de la réponse CoinGecko pour {}", asset))?;

        let samples = parse_market_chart(chart, asset)?;

        info!(samples = samples.len(), "Successfully fetched price history");
        Ok(samples)
    }
}

impl PriceHistorySource for CoinGeckoClient {
    async fn fetch_price_history(
        &self,
        asset: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<PriceSample>> {
        self.fetch_market_chart(asset, vs_currency, days).await
    }
}

/// Construit l'URL de l'endpoint market_chart
///
/// L'identifiant est inséré dans le chemin : il vient de notre propre fichier
/// de configuration, pas de l'utilisateur HTTP.
pub fn build_market_chart_url(base_url: &str, asset: &str, vs_currency: &str, days: u32) -> String {
    format!(
        "{}/coins/{}/market_chart?vs_currency={}&days={}",
        base_url.trim_end_matches('/'),
        asset,
        vs_currency,
        days
    )
}

/// Convertit la réponse CoinGecko en points de prix triés chronologiquement
///
/// CONCEPT RUST : Ownership
/// - `chart` est "moved" : on consomme le Vec sans copier les données
pub fn parse_market_chart(chart: MarketChartResponse, asset: &str) -> Result<Vec<PriceSample>> {
    let mut samples = Vec::with_capacity(chart.prices.len());

    for [timestamp_ms, price] in chart.prices {
        // CoinGecko envoie les timestamps en millisecondes (entiers JSON lus en f64)
        if !timestamp_ms.is_finite() {
            anyhow::bail!("Timestamp invalide dans la réponse CoinGecko pour {}", asset);
        }
        let timestamp = DateTime::from_timestamp_millis(timestamp_ms as i64)
            .with_context(|| format!("Timestamp hors limites pour {} : {}", asset, timestamp_ms))?;

        samples.push(PriceSample::new(timestamp, price));
    }

    // Une série vide est une réponse valide : la crypto sera stockée sans aucun jour
    if samples.is_empty() {
        warn!(asset, "CoinGecko returned no price points");
    }

    // Ordre chronologique garanti pour le resampler
    samples.sort_by_key(|s| s.timestamp);

    debug!(parsed = samples.len(), "Finished parsing market chart");
    Ok(samples)
}

// ============================================================================
// Tests unitaires
// ============================================================================
