// ============================================================================
// Store : fichier Parquet clé -> série journalière
// ============================================================================
// Un seul fichier, une ligne par (crypto, jour) :
//
//   asset: Utf8 | day: Date32 | price: Float64
//   ---------------------------------------------
//   bitcoin     | 2024-03-01  | 61234.5
//   bitcoin     | 2024-03-02  | 62001.1
//   ethereum    | 2024-03-01  | 3421.7
//   newcoin     | null        | null
//
// Les lignes sont groupées par crypto (ordre alphabétique) puis par jour.
// Une crypto sans aucun jour garde une ligne (day, price) à null pour que sa
// clé reste présente dans le store.
// Les clés sont stockées telles quelles, sans préfixe.
//
// CONCEPTS RUST :
// 1. Arc<dyn Array> (ArrayRef) : colonnes Arrow partagées sans copie
// 2. downcast_ref : passer d'un trait object à un type concret
// 3. Écriture atomique : fichier temporaire puis rename
// ============================================================================

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::{debug, info, warn};

use crate::models::{DailyPrice, DailySeries};

const ASSET_COLUMN: &str = "asset";
const DAY_COLUMN: &str = "day";
const PRICE_COLUMN: &str = "price";

/// Store Parquet des séries journalières
#[derive(Debug, Clone)]
pub struct ParquetStore {
    path: PathBuf,
}

impl ParquetStore {
    /// Crée un store pointant vers `path` (le fichier n'est pas créé ici)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Chemin du fichier Parquet
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Vrai si le fichier du store a déjà été créé
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Écrit toutes les séries
    ///
    /// Une série dont la clé existe déjà remplace l'ancienne ; les autres
    /// entrées déjà présentes sont conservées. Le fichier complet est réécrit
    /// dans un fichier temporaire puis renommé : en cas d'échec, l'ancien
    /// fichier (ou son absence) est laissé intact.
    pub fn write_all(&self, series: &BTreeMap<String, DailySeries>) -> Result<()> {
        let mut merged = self.read_all()?;
        for (asset, daily) in series {
            merged.insert(asset.clone(), daily.clone());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le répertoire {}", parent.display()))?;
        }

        let schema = Arc::new(store_schema());
        let batch = build_record_batch(schema.clone(), &merged)?;

        let tmp_path = self.tmp_path();
        let written = write_parquet(&tmp_path, schema, &batch).and_then(|()| {
            fs::rename(&tmp_path, &self.path).with_context(|| {
                format!("Impossible de renommer {} en {}", tmp_path.display(), self.path.display())
            })
        });

        if let Err(e) = written {
            // Pas de fichier temporaire orphelin après un échec
            if tmp_path.exists() {
                if let Err(rm) = fs::remove_file(&tmp_path) {
                    warn!(path = %tmp_path.display(), error = %rm, "Failed to remove temporary store file");
                }
            }
            return Err(e);
        }

        info!(
            path = %self.path.display(),
            assets = merged.len(),
            rows = batch.num_rows(),
            "Store written"
        );
        Ok(())
    }

    /// Liste les cryptos présentes dans le store, triées
    ///
    /// Un store absent est vu comme vide.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }

    /// Lit la série d'une crypto
    ///
    /// # Retourne
    /// * `Ok(Some(series))` - la clé existe
    /// * `Ok(None)` - clé inconnue (ou store absent)
    /// * `Err(..)` - erreur d'I/O ou fichier illisible
    pub fn read(&self, asset: &str) -> Result<Option<DailySeries>> {
        let mut all = self.scan(Some(asset))?;
        Ok(all.remove(asset))
    }

    /// Lit toutes les séries du store
    pub fn read_all(&self) -> Result<BTreeMap<String, DailySeries>> {
        self.scan(None)
    }

    /// Parcourt le fichier et regroupe les lignes par crypto
    ///
    /// `only` limite la lecture à une seule crypto (les autres lignes sont ignorées).
    fn scan(&self, only: Option<&str>) -> Result<BTreeMap<String, DailySeries>> {
        if !self.exists() {
            debug!(path = %self.path.display(), "Store file absent, treating as empty");
            return Ok(BTreeMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Impossible d'ouvrir le store {}", self.path.display()))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("Fichier Parquet invalide : {}", self.path.display()))?
            .build()
            .context("Échec de la création du lecteur Parquet")?;

        let mut rows: BTreeMap<String, Vec<DailyPrice>> = BTreeMap::new();

        for batch in reader {
            let batch = batch.context("Échec de la lecture d'un batch Parquet")?;
            let assets = column::<StringArray>(&batch, ASSET_COLUMN)?;
            let days = column::<Date32Array>(&batch, DAY_COLUMN)?;
            let prices = column::<Float64Array>(&batch, PRICE_COLUMN)?;

            for i in 0..batch.num_rows() {
                if assets.is_null(i) {
                    continue;
                }

                let asset = assets.value(i);
                if only.is_some_and(|wanted| wanted != asset) {
                    continue;
                }

                let points = rows.entry(asset.to_string()).or_default();

                // Ligne marqueur d'une série vide
                if days.is_null(i) || prices.is_null(i) {
                    continue;
                }

                let day = date32_to_naive(days.value(i))
                    .with_context(|| format!("Date hors limites pour {}", asset))?;
                points.push(DailyPrice::new(day, prices.value(i)));
            }
        }

        Ok(rows
            .into_iter()
            .map(|(asset, points)| (asset, DailySeries::from_sorted(points)))
            .collect())
    }

    /// Fichier temporaire utilisé pendant l'écriture (ex: crypto_data.parquet.tmp)
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

// ============================================================================
// Conversions Arrow <-> modèles
// ============================================================================

fn store_schema() -> Schema {
    Schema::new(vec![
        Field::new(ASSET_COLUMN, DataType::Utf8, false),
        Field::new(DAY_COLUMN, DataType::Date32, true),
        Field::new(PRICE_COLUMN, DataType::Float64, true),
    ])
}

/// Construit un RecordBatch à partir des séries (une ligne par jour)
fn build_record_batch(
    schema: Arc<Schema>,
    series: &BTreeMap<String, DailySeries>,
) -> Result<RecordBatch> {
    let mut asset_builder = StringBuilder::new();
    let mut days = Vec::new();
    let mut prices = Vec::new();

    for (asset, daily) in series {
        if daily.is_empty() {
            asset_builder.append_value(asset);
            days.push(None);
            prices.push(None);
            continue;
        }

        for point in daily.points() {
            asset_builder.append_value(asset);
            days.push(Some(naive_to_date32(point.day)));
            prices.push(Some(point.price));
        }
    }

    let asset_array: ArrayRef = Arc::new(asset_builder.finish());
    let day_array: ArrayRef = Arc::new(Date32Array::from(days));
    let price_array: ArrayRef = Arc::new(Float64Array::from(prices));

    RecordBatch::try_new(schema, vec![asset_array, day_array, price_array])
        .context("Échec de la création du RecordBatch")
}

/// Écrit un batch dans un nouveau fichier Parquet (compression Snappy)
fn write_parquet(path: &Path, schema: Arc<Schema>, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Impossible de créer {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .context("Échec de la création du writer Parquet")?;
    writer.write(batch).context("Échec de l'écriture du batch Parquet")?;
    writer.close().context("Échec de la fermeture du fichier Parquet")?;
    Ok(())
}

/// Récupère une colonne typée par son nom
fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Colonne manquante dans le store : {}", name))?
        .as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("Type inattendu pour la colonne {}", name))
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Date32 = nombre de jours depuis le 1970-01-01
fn naive_to_date32(day: NaiveDate) -> i32 {
    (day - unix_epoch()).num_days() as i32
}

fn date32_to_naive(days: i32) -> Option<NaiveDate> {
    unix_epoch().checked_add_signed(chrono::Duration::days(i64::from(days)))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{resample_daily, PriceSample};
    use chrono::{Duration, TimeZone, Utc};

    fn series(start: (i32, u32, u32), prices: &[f64]) -> DailySeries {
        let base = Utc
            .with_ymd_and_hms(start.0, start.1, start.2, 12, 0, 0)
            .unwrap();
        let samples: Vec<PriceSample> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceSample::new(base + Duration::days(i as i64), p))
            .collect();
        resample_daily(&samples)
    }

    #[test]
    fn test_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path().join("crypto_data.parquet"));

        assert!(!store.exists());
        assert!(store.list_keys().unwrap().is_empty());
        assert!(store.read("bitcoin").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path().join("crypto_data.parquet"));

        let btc = series((2024, 1, 1), &[42000.0, 42500.5, 41999.9]);
        let eth = series((2023, 12, 30), &[2300.0, 2310.0]);
        let mut all = BTreeMap::new();
        all.insert("bitcoin".to_string(), btc.clone());
        all.insert("ethereum".to_string(), eth.clone());

        store.write_all(&all).unwrap();

        assert!(store.exists());
        assert_eq!(store.list_keys().unwrap(), vec!["bitcoin", "ethereum"]);
        assert_eq!(store.read("bitcoin").unwrap(), Some(btc));
        assert_eq!(store.read("ethereum").unwrap(), Some(eth));
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path().join("crypto_data.parquet"));

        let mut all = BTreeMap::new();
        all.insert("bitcoin".to_string(), series((2024, 1, 1), &[1.0]));
        store.write_all(&all).unwrap();

        assert!(matches!(store.read("dogecoin"), Ok(None)));
        // Les clés sont stockées sans préfixe
        assert!(matches!(store.read("/bitcoin"), Ok(None)));
    }

    #[test]
    fn test_write_all_replaces_same_key_and_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path().join("crypto_data.parquet"));

        let mut first = BTreeMap::new();
        first.insert("bitcoin".to_string(), series((2024, 1, 1), &[1.0, 2.0]));
        first.insert("ethereum".to_string(), series((2024, 1, 1), &[3.0]));
        store.write_all(&first).unwrap();

        let replacement = series((2024, 2, 1), &[10.0]);
        let mut second = BTreeMap::new();
        second.insert("bitcoin".to_string(), replacement.clone());
        store.write_all(&second).unwrap();

        assert_eq!(store.read("bitcoin").unwrap(), Some(replacement));
        assert_eq!(store.read("ethereum").unwrap().map(|s| s.len()), Some(1));
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_empty_write_creates_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path().join("nested").join("crypto_data.parquet"));

        store.write_all(&BTreeMap::new()).unwrap();

        assert!(store.exists());
        assert!(store.list_keys().unwrap().is_empty());
    }

    #[test]
    fn test_empty_series_keeps_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path().join("crypto_data.parquet"));

        let mut all = BTreeMap::new();
        all.insert("bitcoin".to_string(), series((2024, 1, 1), &[1.0, 2.0]));
        all.insert("newcoin".to_string(), DailySeries::new());
        store.write_all(&all).unwrap();

        assert_eq!(store.list_keys().unwrap(), vec!["bitcoin", "newcoin"]);
        let empty = store.read("newcoin").unwrap().unwrap();
        assert!(empty.is_empty());
        assert_eq!(store.read("bitcoin").unwrap().map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_failed_write_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        // Le chemin du store est un répertoire : le rename final échoue
        let path = dir.path().join("crypto_data.parquet");
        fs::create_dir(&path).unwrap();
        let store = ParquetStore::new(&path);

        let mut all = BTreeMap::new();
        all.insert("bitcoin".to_string(), series((2024, 1, 1), &[1.0]));

        assert!(store.write_all(&all).is_err());
        assert!(!store.tmp_path().exists());
        assert!(!store.exists());
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crypto_data.parquet");
        fs::write(&path, b"not a parquet file").unwrap();
        let store = ParquetStore::new(path);

        assert!(store.read("bitcoin").is_err());
        assert!(store.list_keys().is_err());
    }

    #[test]
    fn test_date32_conversion() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(naive_to_date32(unix_epoch()), 0);
        assert_eq!(date32_to_naive(naive_to_date32(day)), Some(day));
        assert_eq!(
            date32_to_naive(-1),
            NaiveDate::from_ymd_opt(1969, 12, 31)
        );
    }
}
