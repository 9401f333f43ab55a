//! Round records and the local match engine

use serde::{Deserialize, Serialize};
use crate::random::SeededRng;
use crate::strategy::{decide_with, Move, StrategyId};
use crate::payoff;

/// One resolved round, seen from one party
///
/// `player_*` is the party owning the history, `opponent_*` the other side.
/// Records are immutable once appended to a history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based position in the history
    pub round_index: u32,
    pub player_move: Move,
    pub opponent_move: Move,
    pub player_payout: u128,
    pub opponent_payout: u128,
}

impl RoundRecord {
    /// Record a round with payouts computed from the payoff table
    pub fn scored(round_index: u32, player_move: Move, opponent_move: Move, stake: u64) -> Self {
        let (player_payout, opponent_payout) = payoff(player_move, opponent_move, stake);
        Self::confirmed(round_index, (player_move, opponent_move), (player_payout, opponent_payout))
    }

    /// Record a round with payouts confirmed elsewhere (e.g. by the ledger)
    pub fn confirmed(round_index: u32, moves: (Move, Move), payouts: (u128, u128)) -> Self {
        Self {
            round_index,
            player_move: moves.0,
            opponent_move: moves.1,
            player_payout: payouts.0,
            opponent_payout: payouts.1,
        }
    }

    /// The same round seen from the other party
    pub fn mirrored(&self) -> Self {
        Self {
            round_index: self.round_index,
            player_move: self.opponent_move,
            opponent_move: self.player_move,
            player_payout: self.opponent_payout,
            opponent_payout: self.player_payout,
        }
    }
}

/// Flip a whole history to the other party's perspective
pub fn mirror_history(history: &[RoundRecord]) -> Vec<RoundRecord> {
    history.iter().map(RoundRecord::mirrored).collect()
}

/// Result of a complete match, from party A's perspective
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchResult {
    pub rounds: Vec<RoundRecord>,
    pub total_score_a: u128,
    pub total_score_b: u128,
    pub round_count: u32,
}

/// Upper bound on rounds in one match, whatever the config asks for
pub const MAX_ROUNDS: u32 = 10_000;

/// Configuration for round count distribution per match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub min_rounds: u32,
    pub max_rounds: u32,
    pub end_probability: u8, // % chance to end each round after min
}

impl RoundConfig {
    /// 20 to 50 rounds, 5% chance to stop after each round past the minimum
    pub fn standard() -> Self {
        Self { min_rounds: 20, max_rounds: 50, end_probability: 5 }
    }

    /// Exactly `rounds` rounds
    pub fn fixed(rounds: u32) -> Self {
        Self { min_rounds: rounds, max_rounds: rounds, end_probability: 0 }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Determine how many rounds this match will have
///
/// Uses geometric distribution with configurable parameters
fn determine_round_count(rng: &mut SeededRng, config: &RoundConfig) -> u32 {
    let max_rounds = config.max_rounds.min(MAX_ROUNDS);
    let mut rounds = config.min_rounds.min(max_rounds);

    while rounds < max_rounds {
        if rng.next_percent() < config.end_probability {
            break;
        }
        rounds += 1;
    }

    rounds
}

/// Run a complete match between two strategies
///
/// # Arguments
/// * `strategy_a` - First party's strategy
/// * `strategy_b` - Second party's strategy
/// * `seed` - Randomness seed shared by the whole run
/// * `match_index` - Index of this match within the run
/// * `config` - Round count distribution
/// * `stake` - Stake per round in ledger units
pub fn run_match(
    strategy_a: StrategyId,
    strategy_b: StrategyId,
    seed: &[u8; 32],
    match_index: u32,
    config: &RoundConfig,
    stake: u64,
) -> MatchResult {
    let mut rng = SeededRng::new(seed, match_index);
    let round_count = determine_round_count(&mut rng, config);

    let mut history_a: Vec<RoundRecord> = Vec::with_capacity(round_count as usize);
    let mut history_b: Vec<RoundRecord> = Vec::with_capacity(round_count as usize);
    let mut total_a = 0u128;
    let mut total_b = 0u128;

    for round in 0..round_count {
        // Separate generators per party so one side's draws never shift the other's
        let mut rng_a = rng.for_round(round * 2);
        let mut rng_b = rng.for_round(round * 2 + 1);

        // Both decide before either move is revealed
        let move_a = decide_with(strategy_a, &history_a, &mut rng_a);
        let move_b = decide_with(strategy_b, &history_b, &mut rng_b);

        let record = RoundRecord::scored(round + 1, move_a, move_b, stake);
        total_a += record.player_payout;
        total_b += record.opponent_payout;

        history_b.push(record.mirrored());
        history_a.push(record);
    }

    MatchResult {
        rounds: history_a,
        total_score_a: total_a,
        total_score_b: total_b,
        round_count,
    }
}

/// Explain a round in plain words, naming the opponent's strategy
pub fn describe_outcome(player_move: Move, opponent_move: Move, opponent: StrategyId) -> String {
    let outcome = match (player_move, opponent_move) {
        (Move::Cooperate, Move::Cooperate) => "Both cooperated - mutual benefit!",
        (Move::Cooperate, Move::Defect) => "You cooperated but were betrayed",
        (Move::Defect, Move::Cooperate) => "You exploited their trust",
        (Move::Defect, Move::Defect) => "Both defected - mutual loss",
    };

    format!(
        "You {}, {} {}. {}",
        player_move.verb(),
        opponent.descriptor().display_name,
        opponent_move.verb(),
        outcome
    )
}
