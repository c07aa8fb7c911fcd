// ============================================================================
// Module : store
// ============================================================================
// Persistance des séries journalières dans un fichier Parquet
// ============================================================================

pub mod parquet_store;

pub use parquet_store::ParquetStore;
