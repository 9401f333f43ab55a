//! WASM bindings for the frontend strategy picker and tournament view

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;
use crate::{decide, describe_strategy, payoff, run_tournament, Move, RoundRecord, StrategyId, TournamentConfig, CATALOG};

fn parse_move(code: &str) -> Result<Move, JsError> {
    Move::from_code(code).ok_or_else(|| JsError::new(&format!("Invalid move: {}", code)))
}

/// Decide the next move for a strategy
///
/// # Arguments
/// * `strategy_id` - Catalog id such as `"tit-for-tat"`; unknown ids play as `random`
/// * `history_json` - JSON array of RoundRecord, oldest first, from the deciding side
///
/// # Returns
/// `"C"` or `"D"`
#[wasm_bindgen]
pub fn decide_move(strategy_id: &str, history_json: &str) -> Result<String, JsError> {
    let history: Vec<RoundRecord> = serde_json::from_str(history_json)
        .map_err(|e| JsError::new(&format!("Invalid history: {}", e)))?;

    Ok(decide(StrategyId::resolve(strategy_id), &history).code().to_string())
}

/// Payouts for one round as a two-element array `[player, opponent]`
///
/// Amounts are returned as decimal strings since they can exceed 2^53.
#[wasm_bindgen]
pub fn compute_payoff(player_move: &str, opponent_move: &str, stake: u64) -> Result<JsValue, JsError> {
    let (player, opponent) = payoff(parse_move(player_move)?, parse_move(opponent_move)?, stake);

    serde_wasm_bindgen::to_value(&[player.to_string(), opponent.to_string()])
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Run a local tournament
///
/// # Arguments
/// * `strategy_ids_json` - JSON array of catalog ids
/// * `seed` - 32-byte seed
/// * `rounds` - Rounds per engagement
#[wasm_bindgen]
pub fn run_local_tournament(strategy_ids_json: &str, seed: &[u8], rounds: u32) -> Result<JsValue, JsError> {
    let ids: Vec<String> = serde_json::from_str(strategy_ids_json)
        .map_err(|e| JsError::new(&format!("Invalid strategy list: {}", e)))?;
    let seed_arr: [u8; 32] = seed.try_into()
        .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))?;

    let strategies: Vec<StrategyId> = ids.iter().map(|id| StrategyId::resolve(id)).collect();
    let config = TournamentConfig {
        seed: seed_arr,
        rounds: crate::RoundConfig::fixed(rounds),
        stake: 1,
    };

    serde_wasm_bindgen::to_value(&run_tournament(&strategies, &config))
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Get human-readable description of a strategy
#[wasm_bindgen]
pub fn get_strategy_description(strategy_id: &str) -> Result<String, JsError> {
    let strategy: StrategyId = strategy_id.parse()
        .map_err(|e| JsError::new(&format!("{}", e)))?;

    Ok(describe_strategy(strategy))
}

#[derive(serde::Serialize)]
struct StrategyInfo {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    randomized: bool,
}

/// Get the strategy catalog in catalog order
#[wasm_bindgen]
pub fn get_strategy_types() -> Result<JsValue, JsError> {
    let types: Vec<StrategyInfo> = CATALOG
        .iter()
        .map(|d| StrategyInfo {
            id: d.key,
            name: d.display_name,
            description: d.description,
            randomized: d.id.is_randomized(),
        })
        .collect();

    serde_wasm_bindgen::to_value(&types)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
