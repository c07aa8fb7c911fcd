// ============================================================================
// Module : models
// ============================================================================
// Ce module contient les structures de données de l'application
// ============================================================================

pub mod asset_list; // Chargement de cryptocurrencies.txt
pub mod price;      // PriceSample, DailySeries et le resampler journalier

// Re-export pour simplifier les imports
// Au lieu de : use cryptoboard::models::price::DailySeries;
// On peut faire : use cryptoboard::models::DailySeries;
pub use asset_list::{load_asset_list, parse_asset_list};
pub use price::{resample_daily, DailyPrice, DailySeries, PriceSample, DAY_FORMAT};
