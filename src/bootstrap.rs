// ============================================================================
// Bootstrap : remplissage initial du store
// ============================================================================
// Exécuté une seule fois au démarrage, avant le serveur HTTP :
//
//   store absent ?  ── non ──> rien à faire (Ready)
//        │
//        oui
//        ▼
//   liste des cryptos -> fetch CoinGecko -> resample journalier -> write_all
//
// Aucune isolation des erreurs : un seul échec annule tout le lot, rien n'est
// écrit, et le prochain démarrage recommence depuis le début.
// ============================================================================

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::PriceHistorySource;
use crate::config::Config;
use crate::models::{load_asset_list, resample_daily, DailySeries};
use crate::store::ParquetStore;

/// Résultat du bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Le store existait déjà : aucun appel réseau
    AlreadyPopulated,

    /// Le store vient d'être créé avec `assets` cryptos
    Populated { assets: usize },
}

/// Passe l'application de l'état "non initialisé" à "prête"
///
/// CONCEPT RUST : Generics avec trait bound
/// - S: PriceHistorySource accepte CoinGecko en production, une source en
///   mémoire dans les tests
/// - Monomorphisation : pas de coût d'appel dynamique
pub async fn bootstrap<S>(config: &Config, source: &S, store: &ParquetStore) -> Result<BootstrapOutcome>
where
    S: PriceHistorySource,
{
    if store.exists() {
        info!(path = %store.path().display(), "Store already present, skipping fetch");
        return Ok(BootstrapOutcome::AlreadyPopulated);
    }

    info!(path = %store.path().display(), "Store absent, fetching price history");
    let assets = load_asset_list(&config.asset_list_path)?;

    let mut all_series: BTreeMap<String, DailySeries> = BTreeMap::new();

    // Chargement séquentiel : une crypto après l'autre
    for (i, asset) in assets.iter().enumerate() {
        debug!(asset = %asset, progress = i + 1, total = assets.len(), "Fetching asset");

        let samples = source
            .fetch_price_history(asset, &config.vs_currency, config.days)
            .await
            .with_context(|| format!("Échec du chargement de {}", asset))?;

        let daily = resample_daily(&samples);
        info!(asset = %asset, samples = samples.len(), days = daily.len(), "Asset resampled");

        // Un doublon dans la liste est rechargé : la dernière version gagne
        all_series.insert(asset.clone(), daily);
    }

    store.write_all(&all_series)?;

    let count = all_series.len();
    info!(assets = count, "Bootstrap complete");
    Ok(BootstrapOutcome::Populated { assets: count })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceSample;
    use chrono::{Duration, TimeZone, Utc};
    use std::path::Path;
    use std::sync::Mutex;

    /// Source en mémoire qui enregistre chaque appel
    #[derive(Default)]
    struct RecordingSource {
        calls: Mutex<Vec<String>>,
        failing: Option<String>,
        empty: Option<String>,
    }

    impl RecordingSource {
        fn failing_on(asset: &str) -> Self {
            Self {
                failing: Some(asset.to_string()),
                ..Self::default()
            }
        }

        fn empty_for(asset: &str) -> Self {
            Self {
                empty: Some(asset.to_string()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PriceHistorySource for RecordingSource {
        async fn fetch_price_history(
            &self,
            asset: &str,
            _vs_currency: &str,
            days: u32,
        ) -> Result<Vec<PriceSample>> {
            self.calls.lock().unwrap().push(asset.to_string());

            if self.failing.as_deref() == Some(asset) {
                anyhow::bail!("unknown coin id: {}", asset);
            }
            if self.empty.as_deref() == Some(asset) {
                return Ok(Vec::new());
            }

            // Deux points par jour : seul le second doit survivre au resample
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let samples = (0..i64::from(days))
                .flat_map(|d| {
                    let day = start + Duration::days(d);
                    [
                        PriceSample::new(day + Duration::hours(1), d as f64),
                        PriceSample::new(day + Duration::hours(23), d as f64 + 0.5),
                    ]
                })
                .collect();
            Ok(samples)
        }
    }

    fn test_config(dir: &Path, assets: &str) -> Config {
        let asset_list_path = dir.join("cryptocurrencies.txt");
        std::fs::write(&asset_list_path, assets).unwrap();

        Config {
            asset_list_path,
            store_path: dir.join("crypto_data.parquet"),
            days: 5,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_fetches_once_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), "bitcoin\nethereum\n");
        let store = ParquetStore::new(&config.store_path);

        let source = RecordingSource::default();
        let outcome = bootstrap(&config, &source, &store).await.unwrap();

        assert_eq!(outcome, BootstrapOutcome::Populated { assets: 2 });
        assert_eq!(source.calls(), vec!["bitcoin", "ethereum"]);
        assert!(store.exists());
        assert_eq!(store.list_keys().unwrap(), vec!["bitcoin", "ethereum"]);

        let btc = store.read("bitcoin").unwrap().unwrap();
        assert_eq!(btc.len(), 5);
        assert_eq!(btc.last().unwrap().price, 4.5);

        // Second démarrage : store présent, zéro fetch
        let second = RecordingSource::default();
        let outcome = bootstrap(&config, &second, &store).await.unwrap();

        assert_eq!(outcome, BootstrapOutcome::AlreadyPopulated);
        assert!(second.calls().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_aborts_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), "bitcoin\nnot-a-coin\nethereum\n");
        let store = ParquetStore::new(&config.store_path);

        let source = RecordingSource::failing_on("not-a-coin");
        let result = bootstrap(&config, &source, &store).await;

        assert!(result.is_err());
        assert_eq!(source.calls(), vec!["bitcoin", "not-a-coin"]);
        assert!(!store.exists());

        // Le démarrage suivant recommence tout le lot
        let retry = RecordingSource::default();
        bootstrap(&config, &retry, &store).await.unwrap();
        assert_eq!(retry.calls(), vec!["bitcoin", "not-a-coin", "ethereum"]);
    }

    #[tokio::test]
    async fn test_empty_history_is_stored_as_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), "bitcoin
newcoin
");
        let store = ParquetStore::new(&config.store_path);

        let source = RecordingSource::empty_for("newcoin");
        let outcome = bootstrap(&config, &source, &store).await.unwrap();

        assert_eq!(outcome, BootstrapOutcome::Populated { assets: 2 });
        assert_eq!(store.list_keys().unwrap(), vec!["bitcoin", "newcoin"]);

        let newcoin = store.read("newcoin").unwrap().unwrap();
        assert!(newcoin.is_empty());
        assert_eq!(store.read("bitcoin").unwrap().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_missing_asset_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            asset_list_path: dir.path().join("absent.txt"),
            store_path: dir.path().join("crypto_data.parquet"),
            ..Config::default()
        };
        let store = ParquetStore::new(&config.store_path);

        let source = RecordingSource::default();
        assert!(bootstrap(&config, &source, &store).await.is_err());
        assert!(source.calls().is_empty());
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_duplicates_are_fetched_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), "bitcoin\n\nbitcoin\n");
        let store = ParquetStore::new(&config.store_path);

        let source = RecordingSource::default();
        let outcome = bootstrap(&config, &source, &store).await.unwrap();

        assert_eq!(source.calls(), vec!["bitcoin", "bitcoin"]);
        assert_eq!(outcome, BootstrapOutcome::Populated { assets: 1 });
    }
}
