// ============================================================================
// Module : api
// ============================================================================
// Clients des APIs de données de marché
// ============================================================================

pub mod coingecko; // Client API CoinGecko

use std::future::Future;

use anyhow::Result;

use crate::models::PriceSample;

// Re-export des éléments principaux
pub use coingecko::CoinGeckoClient;

/// Source d'historique de prix
///
/// CONCEPT RUST : Trait comme point d'extension
/// - Le bootstrap ne connaît que ce trait, pas CoinGecko
/// - Les tests fournissent une source en mémoire, sans réseau
/// - `impl Future + Send` : la future peut être envoyée entre threads tokio
pub trait PriceHistorySource {
    /// Points bruts de `asset`, cotés en `vs_currency`, sur les `days` derniers
    /// jours, du plus ancien au plus récent
    fn fetch_price_history(
        &self,
        asset: &str,
        vs_currency: &str,
        days: u32,
    ) -> impl Future<Output = Result<Vec<PriceSample>>> + Send;
}
