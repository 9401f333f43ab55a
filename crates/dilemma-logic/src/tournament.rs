//! Local round-robin tournament between catalog strategies
//!
//! Never touches the ledger. Every unordered pair of entrants plays one
//! engagement (a full match); entrants are ranked by mean score per
//! engagement. Listing a strategy twice pairs it against itself.

use serde::{Deserialize, Serialize};
use crate::game::{run_match, RoundConfig};
use crate::strategy::StrategyId;

/// Running score for one entrant during a single run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TournamentEntry {
    pub strategy: StrategyId,
    pub cumulative_score: u128,
    pub games_played: u32,
}

impl TournamentEntry {
    fn new(strategy: StrategyId) -> Self {
        Self { strategy, cumulative_score: 0, games_played: 0 }
    }

    fn record(&mut self, score: u128) {
        self.cumulative_score += score;
        self.games_played += 1;
    }

    /// Mean score per engagement; zero when nothing was played
    pub fn mean_score(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.cumulative_score as f64 / self.games_played as f64
        }
    }
}

/// One line of the final ranking
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub strategy: StrategyId,
    pub mean_score: f64,
    pub cumulative_score: u128,
    pub games_played: u32,
}

/// Parameters for a tournament run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Seed for every randomized decision and round count
    pub seed: [u8; 32],
    /// Length of each engagement
    pub rounds: RoundConfig,
    /// Stake per round in ledger units
    pub stake: u64,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            seed: [0u8; 32],
            rounds: RoundConfig::standard(),
            stake: 1,
        }
    }
}

/// All unordered index pairs `(i, j)` with `i < j`, in lexicographic order
fn all_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

/// Run the tournament and rank entrants by mean score, highest first
///
/// Ties keep the order in which entrants were listed (stable sort).
pub fn run_tournament(strategies: &[StrategyId], config: &TournamentConfig) -> Vec<Standing> {
    let mut entries: Vec<TournamentEntry> = strategies.iter().copied().map(TournamentEntry::new).collect();

    for (match_index, (i, j)) in all_pairs(entries.len()).enumerate() {
        let result = run_match(
            entries[i].strategy,
            entries[j].strategy,
            &config.seed,
            match_index as u32,
            &config.rounds,
            config.stake,
        );
        entries[i].record(result.total_score_a);
        entries[j].record(result.total_score_b);
    }

    rank(entries)
}

/// Run the tournament for string ids; unknown ids enter as `random`
pub fn run_tournament_by_id(ids: &[&str], config: &TournamentConfig) -> Vec<Standing> {
    let strategies: Vec<StrategyId> = ids.iter().map(|id| StrategyId::resolve(id)).collect();
    run_tournament(&strategies, config)
}

fn rank(mut entries: Vec<TournamentEntry>) -> Vec<Standing> {
    // total_cmp gives a total order; sort_by is stable
    entries.sort_by(|a, b| b.mean_score().total_cmp(&a.mean_score()));
    entries
        .into_iter()
        .map(|e| Standing {
            strategy: e.strategy,
            mean_score: e.mean_score(),
            cumulative_score: e.cumulative_score,
            games_played: e.games_played,
        })
        .collect()
}
