//! Game workflow: one session from creation to resolution
//!
//! ```text
//! Idle -> Creating -> AwaitingMove -> Resolving -> Resolved
//!            |             |              |
//!            +-------------+--------------+-----> Failed
//! ```
//!
//! Every ledger step is build, sign, submit, decode. A failure in any of them
//! moves the session to `Failed`; nothing is retried here. Moves and payouts
//! are recorded only after the ledger confirmed them.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dilemma_logic::{describe_outcome, payoff, Move, RoundRecord, StrategyId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ArenaConfig, NetworkConfig};
use crate::error::{LedgerError, SessionError, WorkflowError};
use crate::ledger::codec::{self, format_units};
use crate::ledger::response::{self, LedgerResponse};
use crate::ledger::{Address, GameId, LedgerGameClient, LedgerOperation, Signer, Submission, UnsignedEnvelope};
use crate::opponent::{Decision, OpponentDecisionService, Tone};

/// Lifecycle state of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Creating,
    AwaitingMove,
    Resolving,
    Resolved,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Resolved | SessionStatus::Failed)
    }

    /// Forward transitions only; going back to `Idle` is `reset`'s job
    pub fn can_advance_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Idle, Creating)
                | (Creating, AwaitingMove)
                | (Creating, Resolved)
                | (Creating, Failed)
                | (AwaitingMove, AwaitingMove)
                | (AwaitingMove, Resolving)
                | (AwaitingMove, Failed)
                | (Resolving, Resolved)
                | (Resolving, Failed)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Creating => "creating",
            SessionStatus::AwaitingMove => "awaiting move",
            SessionStatus::Resolving => "resolving",
            SessionStatus::Resolved => "resolved",
            SessionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Who plays the second seat
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpponentMode {
    /// A catalog strategy decides and submits under the counterparty identity
    Algorithmic { strategy: StrategyId, tone: Tone },
    /// A second local player submits under the counterparty identity
    HotSeat,
}

/// Envelope build that has been requested from the ledger but not polled yet
type PendingBuild<'a> = Pin<Box<dyn Future<Output = Result<UnsignedEnvelope, LedgerError>> + Send + 'a>>;

/// An identity able to sign for itself
#[derive(Clone)]
pub struct Identity {
    pub address: Address,
    pub signer: Arc<dyn Signer>,
}

impl Identity {
    pub fn new(address: Address, signer: Arc<dyn Signer>) -> Self {
        Self { address, signer }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity").field("address", &self.address).finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct GameSession {
    id: Option<GameId>,
    status: SessionStatus,
    stake: u64,
    round_index: u32,
    planned_move: Option<Move>,
    player_move: Option<Move>,
    opponent_move: Option<Move>,
    payouts: Option<(u128, u128)>,
    last_error: Option<SessionError>,
    last_tx_hash: Option<String>,
    /// Ledger method whose round-trip has started but not finished
    in_flight: Option<&'static str>,
}

impl GameSession {
    fn idle() -> Self {
        Self {
            id: None,
            status: SessionStatus::Idle,
            stake: 0,
            round_index: 0,
            planned_move: None,
            player_move: None,
            opponent_move: None,
            payouts: None,
            last_error: None,
            last_tx_hash: None,
            in_flight: None,
        }
    }

    fn advance(&mut self, next: SessionStatus) -> Result<(), WorkflowError> {
        if !self.status.can_advance_to(next) {
            return Err(WorkflowError::invalid_input(format!(
                "illegal transition from {} to {}",
                self.status, next
            )));
        }
        debug!(game_id = ?self.id, from = %self.status, to = %next, "session transition");
        self.status = next;
        Ok(())
    }
}

/// Read-only view of the current session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: Option<GameId>,
    pub status: SessionStatus,
    pub stake: u64,
    pub round_index: u32,
    pub planned_move: Option<Move>,
    pub player_move: Option<Move>,
    pub opponent_move: Option<Move>,
    pub payouts: Option<(u128, u128)>,
    pub last_error: Option<SessionError>,
    pub last_tx_hash: Option<String>,
    pub explorer_link: Option<String>,
    /// Ledger method still marked as running
    pub in_flight: Option<&'static str>,
}

/// Result of a `submit_move` call
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MoveOutcome {
    pub status: SessionStatus,
    /// Present when the algorithmic opponent answered in the same call
    pub opponent: Option<Decision>,
}

/// Sequences ledger operations for one game at a time and keeps the
/// resolved rounds of the current match
pub struct GameWorkflow {
    ledger: Arc<dyn LedgerGameClient>,
    opponents: OpponentDecisionService,
    network: NetworkConfig,
    mode: OpponentMode,
    default_stake: u64,
    max_stake: u64,
    player: Option<Address>,
    signer: Option<Arc<dyn Signer>>,
    counterparty: Address,
    counterparty_signer: Option<Arc<dyn Signer>>,
    session: GameSession,
    history: Vec<RoundRecord>,
}

impl GameWorkflow {
    pub fn new(ledger: Arc<dyn LedgerGameClient>, opponents: OpponentDecisionService, config: &ArenaConfig) -> Self {
        Self {
            ledger,
            opponents,
            network: config.network.clone(),
            mode: config.game.opponent_mode(),
            default_stake: config.game.default_stake,
            max_stake: config.game.max_stake,
            player: None,
            signer: None,
            counterparty: config.network.counterparty.clone(),
            counterparty_signer: None,
            session: GameSession::idle(),
            history: Vec::new(),
        }
    }

    /// Address the human player acts under
    pub fn with_player(mut self, address: Address) -> Self {
        self.player = Some(address);
        self
    }

    /// Signer for the human player
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Identity the second seat submits under, replacing the configured one
    pub fn with_counterparty(mut self, counterparty: Identity) -> Self {
        self.counterparty = counterparty.address;
        self.counterparty_signer = Some(counterparty.signer);
        self
    }

    /// Signer for the configured counterparty address
    pub fn with_counterparty_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.counterparty_signer = Some(signer);
        self
    }

    pub fn with_opponent_mode(mut self, mode: OpponentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Configured stake for callers that let the player skip choosing one
    pub fn default_stake(&self) -> u64 {
        self.default_stake
    }

    pub fn opponent_mode(&self) -> OpponentMode {
        self.mode
    }

    /// Switch opponents; only between sessions
    pub fn set_opponent_mode(&mut self, mode: OpponentMode) -> Result<(), WorkflowError> {
        if self.session.status != SessionStatus::Idle {
            return Err(WorkflowError::invalid_input("the opponent can only change between sessions"));
        }
        self.mode = mode;
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.player = None;
        self.signer = None;
    }

    /// Create a game on the ledger; the move is kept as the player's plan
    pub async fn start(&mut self, stake: u64, player_move: Move) -> Result<GameId, WorkflowError> {
        self.ensure_settled()?;
        if self.session.status != SessionStatus::Idle {
            return Err(WorkflowError::invalid_input(format!(
                "a session is already {}; reset before starting another",
                self.session.status
            )));
        }
        let player = self.require_player()?;
        let signer = self.require_signer()?;
        self.validate_stake(stake)?;
        self.require_counterparty()?;

        self.session = GameSession::idle();
        self.session.stake = stake;
        self.session.planned_move = Some(player_move);
        self.session.round_index = self.next_round_index();
        self.session.advance(SessionStatus::Creating)?;
        info!(stake = %format_units(stake as u128), player = %player, "creating game");

        let ledger = Arc::clone(&self.ledger);
        let pending = ledger.create_game(&player, stake);
        let decoded = match self.round_trip("create_game", None, pending, signer).await {
            Ok(submission) => response::decode_game_id(&LedgerResponse::classify(submission.response))
                .map_err(|source| WorkflowError::Decode { operation: "create_game", source }),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(game_id) => {
                self.session.id = Some(game_id);
                self.session.advance(SessionStatus::AwaitingMove)?;
                info!(game_id, "game created");
                Ok(game_id)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Commit a move for the next party still to move
    ///
    /// The first call commits the human player's move. Against an
    /// algorithmic opponent the counter-move is decided and submitted in the
    /// same call; in hot-seat mode a second call commits it.
    pub async fn submit_move(&mut self, session_id: GameId, mv: Move) -> Result<MoveOutcome, WorkflowError> {
        self.ensure_settled()?;
        self.expect_status(SessionStatus::AwaitingMove, "submit a move")?;
        let game_id = self.expect_session(session_id)?;

        if self.session.player_move.is_none() {
            let player = self.require_player()?;
            let signer = self.require_signer()?;
            let counterparty = self.require_counterparty()?;

            let ledger = Arc::clone(&self.ledger);
            let pending = ledger.set_move(&player, game_id, mv);
            if let Err(e) = self.acknowledged("set_move", game_id, pending, signer).await {
                return Err(self.fail(e));
            }
            self.session.player_move = Some(mv);
            info!(game_id, player_move = %mv, "player move confirmed");

            match self.mode {
                OpponentMode::Algorithmic { strategy, tone } => {
                    let decision = self.opponents.decide(strategy, &self.history, tone).await;
                    self.submit_counter_move(game_id, &counterparty, decision.chosen).await?;
                    Ok(MoveOutcome {
                        status: self.session.status,
                        opponent: Some(decision),
                    })
                }
                OpponentMode::HotSeat => {
                    self.session.advance(SessionStatus::AwaitingMove)?;
                    Ok(MoveOutcome {
                        status: self.session.status,
                        opponent: None,
                    })
                }
            }
        } else if self.session.opponent_move.is_none() && self.mode == OpponentMode::HotSeat {
            let counterparty = self.require_counterparty()?;
            self.submit_counter_move(game_id, &counterparty, mv).await?;
            Ok(MoveOutcome {
                status: self.session.status,
                opponent: None,
            })
        } else {
            Err(WorkflowError::invalid_input("both moves for this game are already being submitted"))
        }
    }

    async fn submit_counter_move(&mut self, game_id: GameId, counterparty: &Identity, mv: Move) -> Result<(), WorkflowError> {
        let ledger = Arc::clone(&self.ledger);
        let pending = ledger.join_game(&counterparty.address, game_id, mv);
        if let Err(e) = self.acknowledged("join_game", game_id, pending, Arc::clone(&counterparty.signer)).await {
            return Err(self.fail(e));
        }
        self.session.opponent_move = Some(mv);
        info!(game_id, opponent_move = %mv, "opponent move confirmed");
        self.session.advance(SessionStatus::Resolving)
    }

    /// Ask the ledger to settle the game and record the confirmed round
    pub async fn resolve(&mut self, session_id: GameId) -> Result<RoundRecord, WorkflowError> {
        self.ensure_settled()?;
        self.expect_status(SessionStatus::Resolving, "resolve")?;
        let game_id = self.expect_session(session_id)?;
        let (player_move, opponent_move) = match (self.session.player_move, self.session.opponent_move) {
            (Some(p), Some(o)) => (p, o),
            _ => return Err(WorkflowError::invalid_input("both moves must be confirmed before resolving")),
        };
        let signer = self.require_signer()?;

        let ledger = Arc::clone(&self.ledger);
        let pending = ledger.resolve_game(game_id);
        let decoded = match self.round_trip("resolve_game", Some(game_id), pending, signer).await {
            Ok(submission) => response::decode_payouts(&LedgerResponse::classify(submission.response))
                .map_err(|source| WorkflowError::Decode { operation: "resolve_game", source }),
            Err(e) => Err(e),
        };

        let payouts = match decoded {
            Ok(payouts) => payouts,
            Err(e) => return Err(self.fail(e)),
        };
        self.settle((player_move, opponent_move), payouts)
    }

    /// Single-transaction game against the contract's own AI
    pub async fn play_single(&mut self, stake: u64, player_move: Move, strategy: StrategyId) -> Result<RoundRecord, WorkflowError> {
        self.ensure_settled()?;
        if self.session.status != SessionStatus::Idle {
            return Err(WorkflowError::invalid_input(format!(
                "a session is already {}; reset before starting another",
                self.session.status
            )));
        }
        let player = self.require_player()?;
        let signer = self.require_signer()?;
        self.validate_stake(stake)?;
        if codec::known_strategy_code(strategy).is_none() {
            warn!(strategy = %strategy, "strategy unknown to the contract, it will play random");
        }

        self.session = GameSession::idle();
        self.session.stake = stake;
        self.session.planned_move = Some(player_move);
        self.session.round_index = self.next_round_index();
        self.session.advance(SessionStatus::Creating)?;
        info!(stake = %format_units(stake as u128), strategy = %strategy, "playing single-call game");

        let operation = LedgerOperation::play_game(&player, player_move, strategy, stake);
        let ledger = Arc::clone(&self.ledger);
        let pending = ledger.build(&operation);
        let decoded = match self.round_trip(operation.method(), None, pending, signer).await {
            Ok(submission) => response::decode_game_result(&LedgerResponse::classify(submission.response))
                .map_err(|source| WorkflowError::Decode { operation: "play_game", source }),
            Err(e) => Err(e),
        };

        let result = match decoded {
            Ok(result) => result,
            Err(e) => return Err(self.fail(e)),
        };
        self.session.id = Some(result.game_id);
        self.session.player_move = Some(player_move);
        self.session.opponent_move = Some(result.ai_move);
        self.settle_as(
            (player_move, result.ai_move),
            (result.player_payout, result.ai_payout),
            strategy,
        )
    }

    /// Start, commit and resolve one full round against the algorithmic
    /// opponent. A resolved previous session is discarded first.
    pub async fn play_round(&mut self, stake: u64, player_move: Move) -> Result<RoundRecord, WorkflowError> {
        if self.session.status == SessionStatus::Resolved {
            self.reset();
        }
        let game_id = self.start(stake, player_move).await?;
        self.submit_move(game_id, player_move).await?;
        if self.session.status != SessionStatus::Resolving {
            return Err(WorkflowError::invalid_input("play_round needs an algorithmic opponent"));
        }
        self.resolve(game_id).await
    }

    /// Discard the session and go back to `Idle`; history is kept
    pub fn reset(&mut self) {
        if let Some(method) = self.session.in_flight {
            warn!(game_id = ?self.session.id, method, "discarding session with an unfinished ledger call");
        }
        debug!(game_id = ?self.session.id, status = %self.session.status, "session reset");
        self.session = GameSession::idle();
    }

    /// Forget the resolved rounds and start a fresh match
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Resolved rounds, oldest first, from the human player's side
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = &self.session;
        SessionSnapshot {
            id: session.id,
            status: session.status,
            stake: session.stake,
            round_index: session.round_index,
            planned_move: session.planned_move,
            player_move: session.player_move,
            opponent_move: session.opponent_move,
            payouts: session.payouts,
            last_error: session.last_error.clone(),
            last_tx_hash: session.last_tx_hash.clone(),
            explorer_link: self.explorer_link(),
            in_flight: session.in_flight,
        }
    }

    /// Explorer page of the session's latest transaction
    pub fn explorer_link(&self) -> Option<String> {
        self.session
            .last_tx_hash
            .as_deref()
            .map(|hash| self.network.transaction_link(hash))
    }

    pub fn contract_link(&self) -> Option<String> {
        self.network.contract_link()
    }

    fn settle(&mut self, moves: (Move, Move), payouts: (u128, u128)) -> Result<RoundRecord, WorkflowError> {
        let strategy = match self.mode {
            OpponentMode::Algorithmic { strategy, .. } => Some(strategy),
            OpponentMode::HotSeat => None,
        };
        let record = self.record_round(moves, payouts)?;
        match strategy {
            Some(strategy) => info!(outcome = %describe_outcome(moves.0, moves.1, strategy), "round resolved"),
            None => info!(player_move = %moves.0, opponent_move = %moves.1, "round resolved"),
        }
        Ok(record)
    }

    fn settle_as(&mut self, moves: (Move, Move), payouts: (u128, u128), strategy: StrategyId) -> Result<RoundRecord, WorkflowError> {
        let record = self.record_round(moves, payouts)?;
        info!(outcome = %describe_outcome(moves.0, moves.1, strategy), "round resolved");
        Ok(record)
    }

    fn record_round(&mut self, moves: (Move, Move), payouts: (u128, u128)) -> Result<RoundRecord, WorkflowError> {
        let expected = payoff(moves.0, moves.1, self.session.stake);
        if expected != payouts {
            warn!(
                game_id = ?self.session.id,
                ledger = ?payouts,
                local = ?expected,
                "ledger payouts differ from the payoff table, keeping the ledger's"
            );
        }

        self.session.payouts = Some(payouts);
        self.session.advance(SessionStatus::Resolved)?;

        let record = RoundRecord::confirmed(self.session.round_index, moves, payouts);
        self.history.push(record);
        info!(
            game_id = ?self.session.id,
            player_payout = %format_units(payouts.0),
            opponent_payout = %format_units(payouts.1),
            "payouts confirmed"
        );
        Ok(record)
    }

    /// Build, sign and submit one operation
    async fn round_trip(
        &mut self,
        method: &'static str,
        game_id: Option<GameId>,
        build: PendingBuild<'_>,
        signer: Arc<dyn Signer>,
    ) -> Result<Submission, WorkflowError> {
        let game_id = game_id.or(self.session.id);
        self.session.in_flight = Some(method);

        debug!(method, ?game_id, "building");
        let unsigned = build
            .await
            .map_err(|e| WorkflowError::Build { operation: method, message: e.message })?;

        debug!(method, ?game_id, "awaiting signature");
        let signed = signer
            .sign(&unsigned.xdr)
            .await
            .map_err(|e| WorkflowError::Sign { operation: method, message: e.message })?;
        if signed.signed_tx_xdr.trim().is_empty() {
            return Err(WorkflowError::Sign {
                operation: method,
                message: "invalid sign result: empty signed envelope".to_string(),
            });
        }

        debug!(method, ?game_id, "submitting");
        let submission = self
            .ledger
            .submit(signed)
            .await
            .map_err(|e| WorkflowError::Submit { operation: method, message: e.message })?;

        debug!(method, ?game_id, tx_hash = %submission.tx_hash, "submitted");
        self.session.in_flight = None;
        self.session.last_tx_hash = Some(submission.tx_hash.clone());
        Ok(submission)
    }

    /// Round-trip for operations that return nothing useful
    async fn acknowledged(
        &mut self,
        method: &'static str,
        game_id: GameId,
        build: PendingBuild<'_>,
        signer: Arc<dyn Signer>,
    ) -> Result<(), WorkflowError> {
        let submission = self.round_trip(method, Some(game_id), build, signer).await?;
        response::decode_ack(&LedgerResponse::classify(submission.response))
            .map_err(|source| WorkflowError::Decode { operation: method, source })
    }

    /// Record a ledger-phase failure on the session and hand it back
    fn fail(&mut self, error: WorkflowError) -> WorkflowError {
        warn!(
            game_id = ?self.session.id,
            phase = %error.phase(),
            operation = error.operation().unwrap_or("-"),
            error = %error,
            "session failed"
        );
        self.session.in_flight = None;
        self.session.last_error = Some(SessionError::from(&error));
        if self.session.status.can_advance_to(SessionStatus::Failed) {
            self.session.status = SessionStatus::Failed;
        }
        error
    }

    /// Reject calls while an abandoned ledger call is still marked running
    fn ensure_settled(&self) -> Result<(), WorkflowError> {
        match self.session.in_flight {
            Some(method) => Err(WorkflowError::invalid_input(format!(
                "a {} call was abandoned before it finished; reset the session",
                method
            ))),
            None => Ok(()),
        }
    }

    fn expect_status(&self, expected: SessionStatus, action: &str) -> Result<(), WorkflowError> {
        if self.session.status == expected {
            return Ok(());
        }
        let hint = match self.session.status {
            SessionStatus::Failed => "; the session failed, reset and start again",
            _ => "",
        };
        Err(WorkflowError::invalid_input(format!(
            "cannot {} while the session is {}{}",
            action, self.session.status, hint
        )))
    }

    fn expect_session(&self, session_id: GameId) -> Result<GameId, WorkflowError> {
        match self.session.id {
            Some(id) if id == session_id => Ok(id),
            Some(id) => Err(WorkflowError::invalid_input(format!(
                "game {} is not the current session (current is {})",
                session_id, id
            ))),
            None => Err(WorkflowError::invalid_input("no game has been created yet")),
        }
    }

    fn require_player(&self) -> Result<Address, WorkflowError> {
        match &self.player {
            Some(address) if !address.is_empty() => Ok(address.clone()),
            _ => Err(WorkflowError::invalid_input("no player identity connected")),
        }
    }

    fn require_signer(&self) -> Result<Arc<dyn Signer>, WorkflowError> {
        self.signer
            .clone()
            .ok_or_else(|| WorkflowError::invalid_input("no signer available for the player"))
    }

    fn require_counterparty(&self) -> Result<Identity, WorkflowError> {
        if self.counterparty.is_empty() {
            return Err(WorkflowError::invalid_input("no counterparty identity configured"));
        }
        match &self.counterparty_signer {
            Some(signer) => Ok(Identity::new(self.counterparty.clone(), Arc::clone(signer))),
            None => Err(WorkflowError::invalid_input("no signer available for the counterparty")),
        }
    }

    fn validate_stake(&self, stake: u64) -> Result<(), WorkflowError> {
        if stake == 0 {
            return Err(WorkflowError::invalid_input("stake must be a positive amount"));
        }
        if stake > self.max_stake {
            return Err(WorkflowError::invalid_input(format!(
                "stake {} exceeds the maximum of {}",
                format_units(stake as u128),
                format_units(self.max_stake as u128)
            )));
        }
        Ok(())
    }

    fn next_round_index(&self) -> u32 {
        self.history.last().map_or(1, |r| r.round_index + 1)
    }
}
