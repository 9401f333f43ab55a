//! In-memory test doubles for the ledger, signers and advice sources

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dilemma_client::{
    AdviceError, AdviceKind, AdviceSource, Address, ArenaConfig, GameId, GameWorkflow, Identity,
    LedgerError, LedgerGameClient, LedgerOperation, OpponentDecisionService, OpponentMode, RoundRecord,
    SignedEnvelope, Signer, SignerError, Submission, UnsignedEnvelope,
};
use dilemma_logic::{payoff, Move};
use serde_json::{json, Value};

pub const PLAYER: &str = "GPLAYER";
pub const HOUSE: &str = "GHOUSE";

/// How the mock hands back return values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStyle {
    /// The bare return value
    Direct,
    /// `{"result": {"retval": ..}}` with amounts as strings
    Boxed,
}

/// Where an injected failure strikes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Build,
    Submit,
    /// Submit succeeds but the return value is unreadable
    Garble,
    /// Submit never completes
    Hang,
}

/// One game as the mock contract stores it
#[derive(Debug, Clone, PartialEq)]
pub struct MockGame {
    pub player1: Address,
    pub player2: Option<Address>,
    pub stake: i128,
    pub move1: Option<String>,
    pub move2: Option<String>,
    pub resolved: bool,
}

#[derive(Debug, Default)]
struct LedgerState {
    games: HashMap<GameId, MockGame>,
    next_id: GameId,
    pending: HashMap<String, LedgerOperation>,
    applied: Vec<LedgerOperation>,
    failures: Vec<(&'static str, FailAt)>,
    payout_override: Option<(u64, u64)>,
    tx_counter: u64,
}

impl LedgerState {
    /// Take a one-shot failure armed for this method and phase
    fn take_failure(&mut self, method: &str, phases: &[FailAt]) -> Option<FailAt> {
        let index = self
            .failures
            .iter()
            .position(|(m, phase)| *m == method && phases.contains(phase))?;
        Some(self.failures.remove(index).1)
    }

    fn apply(&mut self, operation: &LedgerOperation) -> Result<Value, String> {
        match operation {
            LedgerOperation::CreateGame { player1, stake } => {
                if *stake <= 0 {
                    return Err("InvalidStake".into());
                }
                self.next_id += 1;
                let id = self.next_id;
                self.games.insert(
                    id,
                    MockGame {
                        player1: player1.clone(),
                        player2: None,
                        stake: *stake,
                        move1: None,
                        move2: None,
                        resolved: false,
                    },
                );
                Ok(json!(id))
            }
            LedgerOperation::SetMove { player, game_id, move_code } => {
                let game = self.games.get_mut(game_id).ok_or("GameNotFound")?;
                if &game.player1 != player {
                    return Err("NotPlayer".into());
                }
                if game.move1.is_some() {
                    return Err("AlreadyMoved".into());
                }
                game.move1 = Some(move_code.clone());
                Ok(Value::Null)
            }
            LedgerOperation::JoinGame { player2, game_id, move_code } => {
                let game = self.games.get_mut(game_id).ok_or("GameNotFound")?;
                if game.player2.is_some() {
                    return Err("GameFull".into());
                }
                game.player2 = Some(player2.clone());
                game.move2 = Some(move_code.clone());
                Ok(Value::Null)
            }
            LedgerOperation::ResolveGame { game_id } => {
                let override_payouts = self.payout_override;
                let game = self.games.get_mut(game_id).ok_or("GameNotFound")?;
                if game.resolved {
                    return Err("AlreadyResolved".into());
                }
                let (m1, m2) = match (&game.move1, &game.move2) {
                    (Some(a), Some(b)) => (parse_move(a)?, parse_move(b)?),
                    _ => return Err("MovesPending".into()),
                };
                game.resolved = true;
                let (p1, p2) = match override_payouts {
                    Some((a, b)) => (a as u128, b as u128),
                    None => payoff(m1, m2, game.stake as u64),
                };
                Ok(json!([p1 as u64, p2 as u64]))
            }
            LedgerOperation::PlayGame { player, player_move, ai_strategy, stake } => {
                if *stake <= 0 {
                    return Err("InvalidStake".into());
                }
                let mine = parse_move(player_move)?;
                let ai = match ai_strategy.as_str() {
                    "DEF" => Move::Defect,
                    _ => Move::Cooperate,
                };
                self.next_id += 1;
                let id = self.next_id;
                self.games.insert(
                    id,
                    MockGame {
                        player1: player.clone(),
                        player2: None,
                        stake: *stake,
                        move1: Some(player_move.clone()),
                        move2: Some(ai.code().to_string()),
                        resolved: true,
                    },
                );
                let (p, a) = payoff(mine, ai, *stake as u64);
                Ok(json!({
                    "game_id": id,
                    "ai_move": ai.code(),
                    "player_payout": p as u64,
                    "ai_payout": a as u64,
                }))
            }
        }
    }
}

fn parse_move(code: &str) -> Result<Move, String> {
    Move::from_code(code).ok_or_else(|| format!("InvalidMove({})", code))
}

/// Turn numbers inside a return value into strings, the way some SDK paths do
fn stringify_amounts(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_amounts).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, stringify_amounts(v))).collect()),
        other => other,
    }
}

/// Mock ledger with the two-party contract's semantics
#[derive(Debug, Clone)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
    style: ResponseStyle,
}

impl MockLedger {
    pub fn new(style: ResponseStyle) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            style,
        }
    }

    /// Arm a one-shot failure for the next call of `method`
    pub fn fail_next(&self, method: &'static str, at: FailAt) {
        self.state.lock().unwrap().failures.push((method, at));
    }

    /// Make `resolve_game` return these payouts instead of the table's
    pub fn override_payouts(&self, player1: u64, player2: u64) {
        self.state.lock().unwrap().payout_override = Some((player1, player2));
    }

    pub fn game(&self, id: GameId) -> Option<MockGame> {
        self.state.lock().unwrap().games.get(&id).cloned()
    }

    /// Operations that reached the contract, in order
    pub fn applied(&self) -> Vec<LedgerOperation> {
        self.state.lock().unwrap().applied.clone()
    }

    pub fn applied_methods(&self) -> Vec<&'static str> {
        self.applied().iter().map(|op| op.method()).collect()
    }

    fn wrap(&self, value: Value) -> Value {
        match self.style {
            ResponseStyle::Direct => value,
            ResponseStyle::Boxed => json!({ "status": "SUCCESS", "result": { "retval": stringify_amounts(value) } }),
        }
    }
}

#[async_trait]
impl LedgerGameClient for MockLedger {
    async fn build(&self, operation: &LedgerOperation) -> Result<UnsignedEnvelope, LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.take_failure(operation.method(), &[FailAt::Build]).is_some() {
            return Err(LedgerError::new(format!(
                "simulation failed for {}: HostError(Contract, #3)",
                operation.method()
            )));
        }
        state.tx_counter += 1;
        let xdr = format!("AAAA{}:{}", state.tx_counter, operation.method());
        state.pending.insert(xdr.clone(), operation.clone());
        Ok(UnsignedEnvelope { xdr })
    }

    async fn submit(&self, envelope: SignedEnvelope) -> Result<Submission, LedgerError> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            let xdr = envelope
                .signed_tx_xdr
                .strip_prefix("signed:")
                .ok_or_else(|| LedgerError::new("tx_bad_auth"))?
                .to_string();
            let operation = state
                .pending
                .remove(&xdr)
                .ok_or_else(|| LedgerError::new("tx_bad_seq"))?;
            let method = operation.method();

            match state.take_failure(method, &[FailAt::Submit, FailAt::Garble, FailAt::Hang]) {
                Some(FailAt::Submit) => {
                    return Err(LedgerError::new("Transaction submission failed: tx_failed - op_underfunded"))
                }
                Some(FailAt::Hang) => None,
                garble => {
                    let value = state.apply(&operation).map_err(|e| LedgerError::new(format!("contract error: {}", e)))?;
                    state.applied.push(operation);
                    let response = if garble.is_some() {
                        json!({ "error": "unreadable return value" })
                    } else {
                        self.wrap(value)
                    };
                    Some(Submission {
                        tx_hash: format!("{:064x}", xdr.len() as u64 * 7919 + state.applied.len() as u64),
                        response,
                    })
                }
            }
        };

        match outcome {
            Some(submission) => Ok(submission),
            None => {
                std::future::pending::<()>().await;
                Err(LedgerError::new("unreachable"))
            }
        }
    }
}

/// Signer double
#[derive(Debug)]
pub struct MockSigner {
    behavior: SignBehavior,
    calls: AtomicUsize,
}

#[derive(Debug, Clone)]
enum SignBehavior {
    Approve,
    Reject(String),
    Empty,
}

impl MockSigner {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self { behavior: SignBehavior::Approve, calls: AtomicUsize::new(0) })
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        Arc::new(Self { behavior: SignBehavior::Reject(message.to_string()), calls: AtomicUsize::new(0) })
    }

    /// Hands back an empty envelope
    pub fn blank() -> Arc<Self> {
        Arc::new(Self { behavior: SignBehavior::Empty, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn sign(&self, unsigned_xdr: &str) -> Result<SignedEnvelope, SignerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SignBehavior::Approve => Ok(SignedEnvelope { signed_tx_xdr: format!("signed:{}", unsigned_xdr) }),
            SignBehavior::Reject(message) => Err(SignerError::new(message.clone())),
            SignBehavior::Empty => Ok(SignedEnvelope { signed_tx_xdr: String::new() }),
        }
    }
}

/// Advice source that answers with a fixed line or always errors
#[derive(Debug, Clone)]
pub struct ScriptedAdvice {
    reply: Result<String, AdviceError>,
}

impl ScriptedAdvice {
    pub fn saying(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(text.to_string()) })
    }

    /// The service answers, but with an error status
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { reply: Err(AdviceError::Failed("503 Service Unavailable".into())) })
    }

    /// The service cannot be reached at all
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self { reply: Err(AdviceError::Unavailable) })
    }
}

#[async_trait]
impl AdviceSource for ScriptedAdvice {
    async fn advise(&self, _persona: &str, _history: &[RoundRecord], _kind: AdviceKind) -> Result<String, AdviceError> {
        self.reply.clone()
    }
}

/// Workflow wired to the mocks with a connected player and the house counterparty
pub fn workflow(ledger: &MockLedger, mode: OpponentMode) -> GameWorkflow {
    workflow_with(ledger, mode, MockSigner::approving(), MockSigner::approving())
}

pub fn workflow_with(
    ledger: &MockLedger,
    mode: OpponentMode,
    player_signer: Arc<MockSigner>,
    house_signer: Arc<MockSigner>,
) -> GameWorkflow {
    let config = ArenaConfig::default();
    GameWorkflow::new(
        Arc::new(ledger.clone()),
        OpponentDecisionService::from_config(&config.advice, None),
        &config,
    )
    .with_player(Address::new(PLAYER))
    .with_signer(player_signer)
    .with_counterparty(Identity::new(Address::new(HOUSE), house_signer))
    .with_opponent_mode(mode)
}
