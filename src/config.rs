// ============================================================================
// Configuration
// ============================================================================
// Toutes les constantes de l'application (chemins, devise, fenêtre en jours)
// sont regroupées dans une seule valeur Config, construite une fois dans main()
// puis passée au bootstrap et au serveur web.
//
// CONCEPTS RUST :
// 1. impl Default : valeurs par défaut d'une structure
// 2. std::env::var : lecture optionnelle des variables d'environnement
// 3. PathBuf : chemin possédé (owned), à l'inverse de &Path
// ============================================================================

use std::path::PathBuf;

use tracing::warn;

/// URL de base de l'API publique CoinGecko
pub const DEFAULT_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration complète de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Fichier texte listant les cryptos (un identifiant par ligne)
    pub asset_list_path: PathBuf,

    /// Fichier Parquet qui sert de store
    pub store_path: PathBuf,

    /// Devise de cotation (ex: "usd")
    pub vs_currency: String,

    /// Fenêtre d'historique demandée à CoinGecko, en jours
    pub days: u32,

    /// Nombre maximum de lignes affichées dans la page de détail
    pub table_rows: usize,

    /// URL de base de l'API CoinGecko
    pub api_base_url: String,

    /// Clé d'API CoinGecko (plan "demo"), optionnelle
    pub api_key: Option<String>,

    /// Adresse d'écoute du serveur HTTP
    pub bind_addr: String,

    /// Répertoire des fichiers de logs
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_list_path: PathBuf::from("cryptocurrencies.txt"),
            store_path: PathBuf::from("crypto_data.parquet"),
            vs_currency: "usd".to_string(),
            days: 365,
            table_rows: 365,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            bind_addr: "127.0.0.1:5000".to_string(),
            log_dir: PathBuf::from("./logs"),
        }
    }
}

impl Config {
    /// Construit la configuration par défaut puis applique les surcharges
    /// présentes dans l'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Variante testable de from_env() : `lookup` joue le rôle de std::env::var
    ///
    /// CONCEPT RUST : Closures génériques
    /// - F: Fn(&str) -> Option<String> accepte n'importe quelle fonction de lecture
    /// - Les tests passent une HashMap au lieu de modifier l'environnement du process
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("CRYPTOBOARD_ASSETS") {
            config.asset_list_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CRYPTOBOARD_STORE") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(currency) = lookup("CRYPTOBOARD_VS_CURRENCY") {
            config.vs_currency = currency.trim().to_lowercase();
        }
        if let Some(raw) = lookup("CRYPTOBOARD_DAYS") {
            match raw.trim().parse::<u32>() {
                Ok(days) if days > 0 => config.days = days,
                _ => warn!(value = %raw, "Ignoring invalid CRYPTOBOARD_DAYS"),
            }
        }
        if let Some(url) = lookup("COINGECKO_API_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        config.api_key = lookup("COINGECKO_API_KEY").filter(|key| !key.trim().is_empty());
        if let Some(addr) = lookup("CRYPTOBOARD_ADDR") {
            config.bind_addr = addr;
        }

        config
    }
}
