// ============================================================================
// Cryptoboard - Point d'entrée
// ============================================================================
// 1. Initialise les logs
// 2. Bootstrap : si le store Parquet n'existe pas, charge l'historique de
//    chaque crypto depuis CoinGecko et l'écrit sur disque
// 3. Lance le serveur HTTP (lecture seule)
//
// Le serveur n'est démarré qu'une fois le bootstrap terminé.
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use cryptoboard::api::CoinGeckoClient;
use cryptoboard::bootstrap::{bootstrap, BootstrapOutcome};
use cryptoboard::config::Config;
use cryptoboard::store::ParquetStore;
use cryptoboard::web;

// ============================================================================
// Initialisation du logging
// ============================================================================

/// Initialise le système de logging vers fichier et vers la sortie standard
///
/// CONCEPT RUST : Tracing subscriber
/// - Registry : point central des logs
/// - Layer : transforme et route les logs (un layer fichier, un layer stdout)
/// - EnvFilter : filtre par niveau (RUST_LOG env var)
/// - RollingFileAppender : rotation automatique
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f logs/cryptoboard.log
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run
/// RUST_LOG=cryptoboard=trace cargo run
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : cryptoboard.log.2024-01-15, etc.
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "cryptoboard.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: cryptoboard::api::coingecko)
                .with_thread_ids(true) // Inclut l'ID du thread (utile pour async)
                .with_line_number(true), // Inclut le numéro de ligne
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            // Par défaut : debug pour cryptoboard, info pour les requêtes HTTP et le reste
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptoboard=debug,tower_http=info,info".into()),
        )
        .try_init()
        .context("Échec de l'installation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Si les logs ne peuvent pas être initialisés, on continue sans
    init_logging(&Config::default().log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    // Lue après les logs pour que les surcharges invalides soient tracées
    let config = Config::from_env();

    info!(
        store = %config.store_path.display(),
        assets = %config.asset_list_path.display(),
        vs_currency = %config.vs_currency,
        days = config.days,
        "Cryptoboard starting up"
    );

    let store = ParquetStore::new(&config.store_path);
    let client = CoinGeckoClient::from_config(&config)?;

    match bootstrap(&config, &client, &store).await {
        Ok(BootstrapOutcome::AlreadyPopulated) => info!("Using existing store"),
        Ok(BootstrapOutcome::Populated { assets }) => info!(assets, "Store populated"),
        Err(e) => {
            error!(error = ?e, "Bootstrap failed");
            return Err(e.context("Échec du bootstrap : le serveur ne démarre pas"));
        }
    }

    let result = web::serve(&config).await;

    match &result {
        Ok(_) => info!("Server exited normally"),
        Err(e) => error!(error = ?e, "Server exited with error"),
    }

    result
}
