// ============================================================================
// Structures : PriceSample et DailySeries
// ============================================================================
// PriceSample : un point brut (instant, prix) renvoyé par CoinGecko
// DailySeries : un prix par jour calendaire UTC, dérivé des points bruts
//
// CONCEPTS RUST :
// 1. DateTime<Utc> vs NaiveDate : instant précis vs simple date de calendrier
// 2. BTreeMap : map triée par clé, parfaite pour grouper par jour
// 3. Slices (&[T]) : vue empruntée sur une partie d'un Vec
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

/// Format d'affichage des jours dans les pages HTML (ex: "2024-03-15")
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Un prix observé à un instant donné (résolution milliseconde)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    /// Instant de l'observation, toujours en UTC
    pub timestamp: DateTime<Utc>,

    /// Prix dans la devise de cotation (ex: USD)
    pub price: f64,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }

    /// Jour calendaire UTC auquel appartient l'échantillon
    ///
    /// CONCEPT : Frontière de jour
    /// - La frontière est minuit UTC, jamais le fuseau local de la machine
    /// - Un point à 23:59:59 UTC appartient au jour J, un point à 00:00:00 au jour J+1
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Prix de clôture d'une journée
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPrice {
    /// Jour calendaire UTC
    pub day: NaiveDate,

    /// Dernier prix observé ce jour-là
    pub price: f64,
}

impl DailyPrice {
    pub fn new(day: NaiveDate, price: f64) -> Self {
        Self { day, price }
    }

    /// Formatte le jour pour l'affichage (YYYY-MM-DD)
    pub fn day_label(&self) -> String {
        self.day.format(DAY_FORMAT).to_string()
    }
}

/// Série journalière d'un actif : une entrée par jour, triée par jour croissant
///
/// CONCEPT RUST : Newtype autour de Vec
/// - On garde le Vec privé pour garantir l'invariant (trié, un seul prix par jour)
/// - Les seuls constructeurs sont resample_daily() et from_sorted()
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    points: Vec<DailyPrice>,
}

impl DailySeries {
    /// Crée une série vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Construit une série à partir de points déjà triés par jour, sans doublon
    ///
    /// Utilisé par le store à la relecture du fichier Parquet, qui a été écrit
    /// depuis une DailySeries et respecte donc déjà l'invariant. Les points
    /// sont tout de même retriés si besoin, et un jour dupliqué garde sa
    /// dernière occurrence.
    pub fn from_sorted(points: Vec<DailyPrice>) -> Self {
        if points.windows(2).all(|w| w[0].day < w[1].day) {
            return Self { points };
        }

        let by_day: BTreeMap<NaiveDate, f64> =
            points.into_iter().map(|p| (p.day, p.price)).collect();
        Self {
            points: by_day
                .into_iter()
                .map(|(day, price)| DailyPrice::new(day, price))
                .collect(),
        }
    }

    /// Retourne le nombre de jours
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Tous les points, du plus ancien au plus récent
    pub fn points(&self) -> &[DailyPrice] {
        &self.points
    }

    /// Les `n` jours les plus récents, toujours dans l'ordre croissant
    ///
    /// CONCEPT RUST : saturating_sub
    /// - Évite un underflow quand la série est plus courte que n
    /// - Une série de 10 jours avec n = 365 est renvoyée en entier
    pub fn tail(&self, n: usize) -> &[DailyPrice] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Retourne le jour le plus récent
    pub fn last(&self) -> Option<&DailyPrice> {
        self.points.last()
    }
}

// ============================================================================
// Resampler : points bruts -> un prix par jour
// ============================================================================

/// Rééchantillonne des points bruts en une série journalière
///
/// Règles :
/// - Regroupement par jour calendaire UTC (voir PriceSample::day)
/// - Dans chaque jour, on garde le prix du point le plus récent
/// - À instant égal, le point qui apparaît en dernier dans l'entrée gagne
/// - Un jour sans aucun point n'a pas d'entrée (trou, pas de remplissage)
///
/// L'entrée n'a pas besoin d'être triée.
///
/// CONCEPT RUST : BTreeMap comme accumulateur
/// - La clé (NaiveDate) est triée : la sortie est naturellement croissante
/// - La valeur garde (instant, prix) du meilleur candidat vu jusqu'ici
pub fn resample_daily(samples: &[PriceSample]) -> DailySeries {
    let mut closes: BTreeMap<NaiveDate, (DateTime<Utc>, f64)> = BTreeMap::new();

    for sample in samples {
        closes
            .entry(sample.day())
            .and_modify(|(ts, price)| {
                if sample.timestamp >= *ts {
                    *ts = sample.timestamp;
                    *price = sample.price;
                }
            })
            .or_insert((sample.timestamp, sample.price));
    }

    DailySeries {
        points: closes
            .into_iter()
            .map(|(day, (_, price))| DailyPrice::new(day, price))
            .collect(),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
