// ============================================================================
// Chargement de la liste des cryptos
// ============================================================================
// Le fichier contient un identifiant CoinGecko par ligne (ex: "bitcoin")
// Les lignes vides sont ignorées, l'ordre et les doublons sont conservés
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Extrait les identifiants d'un texte (une entrée par ligne)
///
/// CONCEPT RUST : Iterator chain
/// - .lines() : découpe sur \n (et \r\n)
/// - .map(str::trim) : retire les espaces autour
/// - .filter() : écarte les lignes devenues vides
pub fn parse_asset_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Lit la liste des cryptos depuis un fichier texte
///
/// Échoue si le fichier est absent : sans liste, le bootstrap ne peut rien faire.
pub fn load_asset_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire la liste des cryptos : {}", path.display()))?;

    let assets = parse_asset_list(&content);
    debug!(path = %path.display(), count = assets.len(), "Loaded asset list");
    Ok(assets)
}
