// ============================================================================
// Cryptoboard - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // Client API CoinGecko
pub mod bootstrap; // Remplissage initial du store
pub mod config;    // Configuration de l'application
pub mod models;    // Structures de données + resampler
pub mod store;     // Store Parquet
pub mod web;       // Serveur HTTP
