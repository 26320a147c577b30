//! Popularity ranking: mean peak players per game, densely ranked.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;

use crate::numbers::{u64_to_f64, u128_to_f64};
use crate::schema::NormalizedRecord;

/// One ranked game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularityEntry {
    pub name: String,
    pub mean_peak_players: f64,
    pub rank: u32,
}

/// Dense popularity ranks keyed by game name.
///
/// Rank 1 is the lowest mean; equal means share a rank and the next distinct
/// mean gets the following integer. Entries are ordered by (mean, name), so
/// the table is identical for any ordering of the same input rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopularityTable {
    entries: Vec<PopularityEntry>,
    unnamed_rows: usize,
}

impl PopularityTable {
    #[must_use]
    pub fn entries(&self) -> &[PopularityEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn rank(&self, name: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.rank)
    }

    #[must_use]
    pub fn mean_peak_players(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.mean_peak_players)
    }

    /// Highest rank assigned, which equals the number of distinct means.
    #[must_use]
    pub fn max_rank(&self) -> u32 {
        self.entries.last().map_or(0, |e| e.rank)
    }

    /// Rows dropped because their name was empty after trimming.
    #[must_use]
    pub const fn unnamed_rows(&self) -> usize {
        self.unnamed_rows
    }

    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, u32> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.rank))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PeakTally {
    sum: u128,
    count: u64,
}

impl PeakTally {
    fn mean(self) -> f64 {
        u128_to_f64(self.sum) / u64_to_f64(self.count)
    }

    /// Compare means exactly by cross-multiplying sums and counts.
    fn cmp_mean(self, other: Self) -> Ordering {
        let lhs = self.sum.checked_mul(u128::from(other.count));
        let rhs = other.sum.checked_mul(u128::from(self.count));
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            _ => self.mean().total_cmp(&other.mean()),
        }
    }
}

/// Group records by name, average `peak_players`, and assign dense ranks.
///
/// Rows whose name is empty cannot be drawn as a game and are dropped here.
#[must_use]
pub fn rank_popularity<I>(records: I) -> PopularityTable
where
    I: IntoIterator<Item = NormalizedRecord>,
{
    let mut tallies: BTreeMap<String, PeakTally> = BTreeMap::new();
    let mut unnamed_rows = 0usize;

    for record in records {
        if record.name.is_empty() {
            unnamed_rows += 1;
            continue;
        }
        let tally = tallies.entry(record.name).or_default();
        tally.sum += u128::from(record.peak_players);
        tally.count += 1;
    }

    if unnamed_rows > 0 {
        debug!("Dropped {unnamed_rows} rows with empty game names before ranking");
    }

    let mut grouped: Vec<(String, PeakTally)> = tallies.into_iter().collect();
    grouped.sort_by(|(a_name, a), (b_name, b)| a.cmp_mean(*b).then_with(|| a_name.cmp(b_name)));

    let mut entries = Vec::with_capacity(grouped.len());
    let mut rank = 0u32;
    let mut previous: Option<PeakTally> = None;
    for (name, tally) in grouped {
        if previous.is_none_or(|prev| prev.cmp_mean(tally) != Ordering::Equal) {
            rank += 1;
        }
        previous = Some(tally);
        entries.push(PopularityEntry {
            name,
            mean_peak_players: tally.mean(),
            rank,
        });
    }

    info!("Calculated weights for {} unique games.", entries.len());
    PopularityTable {
        entries,
        unnamed_rows,
    }
}
