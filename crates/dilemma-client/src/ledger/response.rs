//! Contract return values and their decoders
//!
//! Depending on the call path the SDK hands back either the return value
//! itself or the value boxed under a wrapper key (`result`, `retval`, or an
//! Ok-wrapper `{ "value": .. }`), sometimes nested. A response is classified
//! once into a [`LedgerResponse`]; each decoder then reads the unwrapped value
//! and reports field paths relative to the raw response.

use dilemma_logic::Move;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::codec::{self, describe};
use super::GameId;
use crate::error::DecodeError;

/// Name used for the root of a direct return value in error messages
const ROOT: &str = "return value";

/// A contract return value, tagged by the shape it arrived in
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerResponse {
    /// The return value itself
    Direct(Value),
    /// The return value found under `path`, e.g. `result.retval`
    Boxed { path: String, value: Value },
}

impl LedgerResponse {
    /// Peel every wrapper off a raw response
    pub fn classify(raw: Value) -> Self {
        let mut path: Vec<&'static str> = Vec::new();
        let mut current = raw;
        loop {
            match unbox(current) {
                Ok((key, inner)) => {
                    path.push(key);
                    current = inner;
                }
                Err(value) => {
                    current = value;
                    break;
                }
            }
        }

        if path.is_empty() {
            LedgerResponse::Direct(current)
        } else {
            LedgerResponse::Boxed { path: path.join("."), value: current }
        }
    }

    /// The unwrapped return value
    pub fn value(&self) -> &Value {
        match self {
            LedgerResponse::Direct(value) => value,
            LedgerResponse::Boxed { value, .. } => value,
        }
    }

    pub fn is_boxed(&self) -> bool {
        matches!(self, LedgerResponse::Boxed { .. })
    }

    /// Path of the unwrapped value inside the raw response
    pub fn root(&self) -> &str {
        match self {
            LedgerResponse::Direct(_) => ROOT,
            LedgerResponse::Boxed { path, .. } => path,
        }
    }

    fn field(&self, name: &str) -> String {
        match self {
            LedgerResponse::Direct(_) => name.to_string(),
            LedgerResponse::Boxed { path, .. } => format!("{}.{}", path, name),
        }
    }

    fn index(&self, i: usize) -> String {
        format!("{}[{}]", self.root(), i)
    }
}

fn unbox(value: Value) -> Result<(&'static str, Value), Value> {
    match value {
        Value::Object(mut map) => {
            for key in ["result", "retval"] {
                if let Some(inner) = map.remove(key) {
                    return Ok((key, inner));
                }
            }
            if map.len() == 1 {
                if let Some(inner) = map.remove("value") {
                    return Ok(("value", inner));
                }
            }
            Err(Value::Object(map))
        }
        other => Err(other),
    }
}

/// Result record of the single-player `play_game` call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: GameId,
    pub ai_move: Move,
    pub player_payout: u128,
    pub ai_payout: u128,
}

/// Game id returned by `create_game`
pub fn decode_game_id(response: &LedgerResponse) -> Result<GameId, DecodeError> {
    codec::decode_game_id(response.root(), response.value())
}

/// `(player1, player2)` payouts returned by `resolve_game`
pub fn decode_payouts(response: &LedgerResponse) -> Result<(u128, u128), DecodeError> {
    match response.value() {
        Value::Array(items) => {
            if items.len() > 2 {
                return Err(DecodeError::UnexpectedShape {
                    field: response.root().to_string(),
                    found: format!("array of {} elements", items.len()),
                });
            }
            let player = payout_at(response, items, 0)?;
            let opponent = payout_at(response, items, 1)?;
            Ok((player, opponent))
        }
        Value::Null => Err(DecodeError::MissingField { field: response.root().to_string() }),
        other => Err(DecodeError::UnexpectedShape {
            field: response.root().to_string(),
            found: describe(other),
        }),
    }
}

fn payout_at(response: &LedgerResponse, items: &[Value], i: usize) -> Result<u128, DecodeError> {
    let field = response.index(i);
    let value = items.get(i).ok_or_else(|| DecodeError::MissingField { field: field.clone() })?;
    codec::decode_amount(&field, value)
}

/// Record returned by `play_game`
pub fn decode_game_result(response: &LedgerResponse) -> Result<GameResult, DecodeError> {
    let map = match response.value() {
        Value::Object(map) => map,
        Value::Null => return Err(DecodeError::MissingField { field: response.root().to_string() }),
        other => {
            return Err(DecodeError::UnexpectedShape {
                field: response.root().to_string(),
                found: describe(other),
            })
        }
    };

    Ok(GameResult {
        game_id: codec::decode_game_id(&response.field("game_id"), entry(response, map, "game_id")?)?,
        ai_move: codec::decode_move(&response.field("ai_move"), entry(response, map, "ai_move")?)?,
        player_payout: codec::decode_amount(
            &response.field("player_payout"),
            entry(response, map, "player_payout")?,
        )?,
        ai_payout: codec::decode_amount(&response.field("ai_payout"), entry(response, map, "ai_payout")?)?,
    })
}

fn entry<'a>(response: &LedgerResponse, map: &'a Map<String, Value>, name: &str) -> Result<&'a Value, DecodeError> {
    map.get(name).ok_or_else(|| DecodeError::MissingField { field: response.field(name) })
}

/// Acknowledgement of a call that returns nothing (`set_move`, `join_game`)
///
/// Anything is accepted except an object carrying an `error` entry.
pub fn decode_ack(response: &LedgerResponse) -> Result<(), DecodeError> {
    match response.value() {
        Value::Object(map) => match map.get("error") {
            Some(error) => Err(DecodeError::InvalidField {
                field: response.field("error"),
                expected: "no contract error",
                found: describe(error),
            }),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}
