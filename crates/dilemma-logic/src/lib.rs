//! Match Logic for the Dilemma Arena
//!
//! Core game logic for the two-party Prisoner's Dilemma.
//! This crate is compiled to:
//! - Native (for the ledger workflow client)
//! - WASM (for the frontend strategy picker and tournament replay)

mod random;
mod strategy;
mod game;
mod tournament;

#[cfg(feature = "wasm")]
mod wasm;

pub use random::SeededRng;
pub use strategy::{
    decide, decide_by_id, decide_with, describe_strategy, DecisionFn, Move, StrategyDescriptor,
    StrategyId, UnknownStrategy, CATALOG, GENEROUS_FORGIVENESS_PERCENT,
    OCCASIONAL_DEFECTION_PERCENT, RANDOM_COOPERATE_PERCENT,
};
pub use game::{describe_outcome, mirror_history, run_match, MatchResult, RoundConfig, RoundRecord, MAX_ROUNDS};
pub use tournament::{run_tournament, run_tournament_by_id, Standing, TournamentConfig, TournamentEntry};

/// Both cooperate
pub const REWARD_MULTIPLIER: u128 = 2;
/// Defect against a cooperator
pub const TEMPTATION_MULTIPLIER: u128 = 3;
/// Cooperate against a defector
pub const SUCKER_MULTIPLIER: u128 = 0;
/// Both defect
pub const PUNISHMENT_MULTIPLIER: u128 = 0;

/// Payoff table for the Prisoner's Dilemma, scaled by `stake`
/// Returns (player_payout, opponent_payout)
pub fn payoff(player: Move, opponent: Move, stake: u64) -> (u128, u128) {
    let s = stake as u128;
    match (player, opponent) {
        (Move::Cooperate, Move::Cooperate) => (REWARD_MULTIPLIER * s, REWARD_MULTIPLIER * s),
        (Move::Cooperate, Move::Defect) => (SUCKER_MULTIPLIER * s, TEMPTATION_MULTIPLIER * s),
        (Move::Defect, Move::Cooperate) => (TEMPTATION_MULTIPLIER * s, SUCKER_MULTIPLIER * s),
        (Move::Defect, Move::Defect) => (PUNISHMENT_MULTIPLIER * s, PUNISHMENT_MULTIPLIER * s),
    }
}
