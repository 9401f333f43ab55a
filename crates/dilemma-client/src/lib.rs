//! Ledger-backed Prisoner's Dilemma client
//!
//! Drives one game at a time through the ledger contract: create the game,
//! commit the player's move, let the algorithmic opponent (or a second local
//! player) answer under a fixed counterparty identity, and resolve. The ledger
//! client, signer and advice source are external; they are reached through
//! the traits in [`ledger`] and [`opponent`].
//!
//! Strategy evaluation, payoffs and local tournaments live in
//! `dilemma-logic` and are re-exported here.

pub mod config;
pub mod error;
pub mod ledger;
pub mod opponent;
pub mod telemetry;
pub mod workflow;

pub use config::{AdviceConfig, ArenaConfig, GameConfig, LoggingConfig, NetworkConfig, OpponentKind};
pub use error::{
    AdviceError, ConfigError, DecodeError, LedgerError, Phase, SessionError, SignerError, WorkflowError,
};
pub use ledger::codec::UNITS_PER_TOKEN;
pub use ledger::response::{GameResult, LedgerResponse};
pub use ledger::{
    Address, GameId, LedgerGameClient, LedgerOperation, SignedEnvelope, Signer, Submission, UnsignedEnvelope,
};
pub use opponent::{
    fallback_rationale, AdviceCapability, AdviceKind, AdviceSource, Decision, OpponentDecisionService, Tone,
};
pub use telemetry::init_logging;
pub use workflow::{GameWorkflow, Identity, MoveOutcome, OpponentMode, SessionSnapshot, SessionStatus};

pub use dilemma_logic::{
    decide, describe_outcome, describe_strategy, payoff, run_tournament, Move, RoundRecord, Standing, StrategyId,
    TournamentConfig,
};
