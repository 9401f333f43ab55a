//! Wire encoding for amounts, moves and strategy codes

use dilemma_logic::{Move, StrategyId};
use serde_json::Value;

use crate::error::DecodeError;

/// Ledger units per whole token (7 decimal places)
pub const UNITS_PER_TOKEN: u64 = 10_000_000;

/// Strategy code the contract's AI falls back to
pub const FALLBACK_STRATEGY_CODE: &str = "RND";

/// Whole tokens to ledger units; `None` on overflow
pub fn units_from_tokens(tokens: u64) -> Option<u64> {
    tokens.checked_mul(UNITS_PER_TOKEN)
}

/// Render ledger units as a token amount with all 7 decimals, e.g. `"1.5000000"`
pub fn format_units(units: u128) -> String {
    let scale = UNITS_PER_TOKEN as u128;
    format!("{}.{:07}", units / scale, units % scale)
}

/// Stake argument as the contract's signed 128-bit amount
pub fn encode_stake(stake: u64) -> i128 {
    i128::from(stake)
}

pub fn encode_move(mv: Move) -> String {
    mv.code().to_string()
}

/// Contract-side code for the single-player AI, when the contract knows it
pub fn known_strategy_code(strategy: StrategyId) -> Option<&'static str> {
    match strategy {
        StrategyId::Random => Some("RND"),
        StrategyId::AlwaysCooperate => Some("COOP"),
        StrategyId::AlwaysDefect => Some("DEF"),
        StrategyId::TitForTat => Some("TFT"),
        _ => None,
    }
}

/// Contract-side code for the single-player AI; unknown ones play random
pub fn contract_strategy_code(strategy: StrategyId) -> &'static str {
    known_strategy_code(strategy).unwrap_or(FALLBACK_STRATEGY_CODE)
}

/// Short description of a JSON value for error messages
pub(crate) fn describe(value: &Value) -> String {
    let text = value.to_string();
    if text.len() > 64 {
        let cut = (0..=64).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &text[..cut])
    } else {
        text
    }
}

/// Decode a non-negative integer amount, given as a number or a digit string
pub fn decode_amount(field: &str, value: &Value) -> Result<u128, DecodeError> {
    let invalid = || DecodeError::InvalidField {
        field: field.to_string(),
        expected: "non-negative integer",
        found: describe(value),
    };

    match value {
        Value::Number(n) => n.as_u64().map(u128::from).ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<u128>().map_err(|_| invalid()),
        Value::Null => Err(DecodeError::MissingField { field: field.to_string() }),
        _ => Err(invalid()),
    }
}

/// Decode a game id, given as a number or a digit string
pub fn decode_game_id(field: &str, value: &Value) -> Result<u64, DecodeError> {
    let amount = decode_amount(field, value)?;
    u64::try_from(amount).map_err(|_| DecodeError::InvalidField {
        field: field.to_string(),
        expected: "64-bit game id",
        found: describe(value),
    })
}

/// Decode a `"C"`/`"D"` move code
pub fn decode_move(field: &str, value: &Value) -> Result<Move, DecodeError> {
    match value {
        Value::String(code) => Move::from_code(code).ok_or_else(|| DecodeError::InvalidField {
            field: field.to_string(),
            expected: "move code \"C\" or \"D\"",
            found: describe(value),
        }),
        Value::Null => Err(DecodeError::MissingField { field: field.to_string() }),
        _ => Err(DecodeError::InvalidField {
            field: field.to_string(),
            expected: "move code \"C\" or \"D\"",
            found: describe(value),
        }),
    }
}
