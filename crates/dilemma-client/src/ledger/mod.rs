//! Contract-call seams: the ledger client and the signer
//!
//! The ledger contract and the SDK that talks to it are external. The
//! workflow only assumes the two-step contract below: `build` an unsigned
//! envelope for an operation, then `submit` the signed envelope and get the
//! contract's raw return value back.

pub mod codec;
pub mod response;

use std::fmt;

use async_trait::async_trait;
use dilemma_logic::{Move, StrategyId};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, SignerError};

/// Identifier the ledger assigns to a game on creation
pub type GameId = u64;

/// Account address on the ledger
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contract call with its typed arguments, already in wire encoding
///
/// Argument names follow the deployed contract's parameter names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
pub enum LedgerOperation {
    CreateGame {
        player1: Address,
        stake: i128,
    },
    SetMove {
        player: Address,
        game_id: GameId,
        #[serde(rename = "move_")]
        move_code: String,
    },
    JoinGame {
        player2: Address,
        game_id: GameId,
        #[serde(rename = "move_")]
        move_code: String,
    },
    ResolveGame {
        game_id: GameId,
    },
    /// Single-player path: create, play against the contract's AI and resolve
    PlayGame {
        player: Address,
        player_move: String,
        ai_strategy: String,
        stake: i128,
    },
}

impl LedgerOperation {
    pub fn create_game(player: &Address, stake: u64) -> Self {
        LedgerOperation::CreateGame {
            player1: player.clone(),
            stake: codec::encode_stake(stake),
        }
    }

    pub fn set_move(player: &Address, game_id: GameId, mv: Move) -> Self {
        LedgerOperation::SetMove {
            player: player.clone(),
            game_id,
            move_code: codec::encode_move(mv),
        }
    }

    pub fn join_game(player: &Address, game_id: GameId, mv: Move) -> Self {
        LedgerOperation::JoinGame {
            player2: player.clone(),
            game_id,
            move_code: codec::encode_move(mv),
        }
    }

    pub fn resolve_game(game_id: GameId) -> Self {
        LedgerOperation::ResolveGame { game_id }
    }

    pub fn play_game(player: &Address, mv: Move, strategy: StrategyId, stake: u64) -> Self {
        LedgerOperation::PlayGame {
            player: player.clone(),
            player_move: codec::encode_move(mv),
            ai_strategy: codec::contract_strategy_code(strategy).to_string(),
            stake: codec::encode_stake(stake),
        }
    }

    /// Contract method name
    pub fn method(&self) -> &'static str {
        match self {
            LedgerOperation::CreateGame { .. } => "create_game",
            LedgerOperation::SetMove { .. } => "set_move",
            LedgerOperation::JoinGame { .. } => "join_game",
            LedgerOperation::ResolveGame { .. } => "resolve_game",
            LedgerOperation::PlayGame { .. } => "play_game",
        }
    }

    /// Game the operation targets, when it already exists
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            LedgerOperation::SetMove { game_id, .. }
            | LedgerOperation::JoinGame { game_id, .. }
            | LedgerOperation::ResolveGame { game_id } => Some(*game_id),
            LedgerOperation::CreateGame { .. } | LedgerOperation::PlayGame { .. } => None,
        }
    }
}

/// Transaction envelope waiting for a signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEnvelope {
    pub xdr: String,
}

/// Transaction envelope returned by the signer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub signed_tx_xdr: String,
}

/// Outcome of a successful submit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub tx_hash: String,
    /// Raw return value as handed back by the SDK, in whatever shape
    pub response: serde_json::Value,
}

/// Builds and submits contract calls
#[async_trait]
pub trait LedgerGameClient: Send + Sync {
    /// Build the unsigned envelope for an operation
    async fn build(&self, operation: &LedgerOperation) -> Result<UnsignedEnvelope, LedgerError>;

    /// Submit a signed envelope and wait for the contract's return value
    async fn submit(&self, envelope: SignedEnvelope) -> Result<Submission, LedgerError>;

    async fn create_game(&self, player: &Address, stake: u64) -> Result<UnsignedEnvelope, LedgerError> {
        self.build(&LedgerOperation::create_game(player, stake)).await
    }

    async fn set_move(&self, player: &Address, game_id: GameId, mv: Move) -> Result<UnsignedEnvelope, LedgerError> {
        self.build(&LedgerOperation::set_move(player, game_id, mv)).await
    }

    async fn join_game(&self, player: &Address, game_id: GameId, mv: Move) -> Result<UnsignedEnvelope, LedgerError> {
        self.build(&LedgerOperation::join_game(player, game_id, mv)).await
    }

    async fn resolve_game(&self, game_id: GameId) -> Result<UnsignedEnvelope, LedgerError> {
        self.build(&LedgerOperation::resolve_game(game_id)).await
    }
}

/// Turns unsigned envelopes into signed ones
///
/// May wait indefinitely for out-of-band approval. No timeout is applied.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, unsigned_xdr: &str) -> Result<SignedEnvelope, SignerError>;
}
