//! Strategy catalog and move decisions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use crate::game::RoundRecord;
use crate::random::SeededRng;

/// Chance (in percent) that Random cooperates
pub const RANDOM_COOPERATE_PERCENT: u8 = 50;

/// Chance (in percent) that Generous Tit-for-Tat forgives a defection
pub const GENEROUS_FORGIVENESS_PERCENT: u8 = 10;

/// Chance (in percent) that the Occasional Defector betrays
pub const OCCASIONAL_DEFECTION_PERCENT: u8 = 15;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    /// Single-character ledger code: `"C"` or `"D"`
    pub fn code(self) -> &'static str {
        match self {
            Move::Cooperate => "C",
            Move::Defect => "D",
        }
    }

    /// Parse a ledger move code
    pub fn from_code(code: &str) -> Option<Move> {
        match code {
            "C" => Some(Move::Cooperate),
            "D" => Some(Move::Defect),
            _ => None,
        }
    }

    /// Past-tense verb used in outcome text
    pub fn verb(self) -> &'static str {
        match self {
            Move::Cooperate => "cooperated",
            Move::Defect => "defected",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Identifier of a catalog strategy
///
/// Declaration order is catalog order, which the tournament uses to break ties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyId {
    /// 50/50 each call.
    Random,
    /// Never defects.
    AlwaysCooperate,
    /// Never cooperates.
    AlwaysDefect,
    /// Cooperate first, then mirror the opponent's last move.
    TitForTat,
    /// Tit-for-Tat that sometimes forgives a defection.
    GenerousTitForTat,
    /// Defect first, then mirror the opponent's last move.
    SuspiciousTitForTat,
    /// Cooperate after the opponent cooperated, defect otherwise.
    WinStayLoseShift,
    /// Mirror the opponent's last move.
    Pavlov,
    /// Mostly cooperates, betrays at random.
    OccasionalDefector,
}

impl StrategyId {
    /// Every strategy in catalog order
    pub const ALL: [StrategyId; 9] = [
        StrategyId::Random,
        StrategyId::AlwaysCooperate,
        StrategyId::AlwaysDefect,
        StrategyId::TitForTat,
        StrategyId::GenerousTitForTat,
        StrategyId::SuspiciousTitForTat,
        StrategyId::WinStayLoseShift,
        StrategyId::Pavlov,
        StrategyId::OccasionalDefector,
    ];

    /// Stable kebab-case id
    pub fn as_str(self) -> &'static str {
        self.descriptor().key
    }

    /// Look up a strategy by id, failing closed to `Random` for unknown ids
    pub fn resolve(id: &str) -> StrategyId {
        id.parse().unwrap_or(StrategyId::Random)
    }

    /// Catalog entry for this strategy
    pub fn descriptor(self) -> &'static StrategyDescriptor {
        &CATALOG[self as usize]
    }

    /// Whether decisions draw from the random generator
    pub fn is_randomized(self) -> bool {
        matches!(
            self,
            StrategyId::Random | StrategyId::GenerousTitForTat | StrategyId::OccasionalDefector
        )
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an id that is not in the catalog
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl fmt::Display for UnknownStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown strategy: {}", self.0)
    }
}

impl std::error::Error for UnknownStrategy {}

impl FromStr for StrategyId {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CATALOG
            .iter()
            .find(|d| d.key.eq_ignore_ascii_case(wanted) || d.display_name.eq_ignore_ascii_case(wanted))
            .map(|d| d.id)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Decision rule: history from the deciding party's perspective plus a generator
pub type DecisionFn = fn(&[RoundRecord], &mut SeededRng) -> Move;

/// Static catalog entry
pub struct StrategyDescriptor {
    pub id: StrategyId,
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub decide: DecisionFn,
}

impl fmt::Debug for StrategyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyDescriptor")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// The strategy catalog, indexed by `StrategyId as usize`
pub static CATALOG: [StrategyDescriptor; 9] = [
    StrategyDescriptor {
        id: StrategyId::Random,
        key: "random",
        display_name: "Random",
        description: "Makes random decisions.",
        decide: decide_random,
    },
    StrategyDescriptor {
        id: StrategyId::AlwaysCooperate,
        key: "always-cooperate",
        display_name: "Always Cooperate",
        description: "Always chooses to cooperate.",
        decide: decide_always_cooperate,
    },
    StrategyDescriptor {
        id: StrategyId::AlwaysDefect,
        key: "always-defect",
        display_name: "Always Defect",
        description: "Always chooses to defect.",
        decide: decide_always_defect,
    },
    StrategyDescriptor {
        id: StrategyId::TitForTat,
        key: "tit-for-tat",
        display_name: "Tit-for-Tat",
        description: "Copies your last move. Starts with cooperation.",
        decide: decide_tit_for_tat,
    },
    StrategyDescriptor {
        id: StrategyId::GenerousTitForTat,
        key: "generous-tit-for-tat",
        display_name: "Generous Tit-for-Tat",
        description: "Mostly copies you, but forgives occasionally.",
        decide: decide_generous_tit_for_tat,
    },
    StrategyDescriptor {
        id: StrategyId::SuspiciousTitForTat,
        key: "suspicious-tit-for-tat",
        display_name: "Suspicious Tit-for-Tat",
        description: "Assumes the worst, then copies your moves.",
        decide: decide_suspicious_tit_for_tat,
    },
    StrategyDescriptor {
        id: StrategyId::WinStayLoseShift,
        key: "win-stay-lose-shift",
        display_name: "Win-Stay, Lose-Shift",
        description: "Repeats winning moves, switches after losses.",
        decide: decide_win_stay_lose_shift,
    },
    StrategyDescriptor {
        id: StrategyId::Pavlov,
        key: "pavlov",
        display_name: "Pavlov",
        description: "Answers cooperation with cooperation and defection with defection.",
        decide: decide_pavlov,
    },
    StrategyDescriptor {
        id: StrategyId::OccasionalDefector,
        key: "occasional-defector",
        display_name: "Occasional Defector",
        description: "Usually cooperates, but randomly betrays.",
        decide: decide_occasional_defector,
    },
];

/// Decide the next move with a fresh, non-reproducible generator
///
/// `history` is ordered oldest first and seen from the deciding party: each
/// record's `opponent_move` is what the other side played.
pub fn decide(strategy: StrategyId, history: &[RoundRecord]) -> Move {
    let mut rng = SeededRng::from_entropy();
    decide_with(strategy, history, &mut rng)
}

/// Decide the next move drawing randomness from `rng`
pub fn decide_with(strategy: StrategyId, history: &[RoundRecord], rng: &mut SeededRng) -> Move {
    (strategy.descriptor().decide)(history, rng)
}

/// Decide for a strategy named by string id; unknown ids behave as `random`
pub fn decide_by_id(id: &str, history: &[RoundRecord]) -> Move {
    decide(StrategyId::resolve(id), history)
}

/// Human-readable description of a strategy
pub fn describe_strategy(strategy: StrategyId) -> String {
    let descriptor = strategy.descriptor();
    format!("{}: {}", descriptor.display_name, descriptor.description)
}

fn last_observed(history: &[RoundRecord]) -> Option<Move> {
    history.last().map(|r| r.opponent_move)
}

fn decide_random(_history: &[RoundRecord], rng: &mut SeededRng) -> Move {
    if rng.next_percent() < RANDOM_COOPERATE_PERCENT {
        Move::Cooperate
    } else {
        Move::Defect
    }
}

fn decide_always_cooperate(_history: &[RoundRecord], _rng: &mut SeededRng) -> Move {
    Move::Cooperate
}

fn decide_always_defect(_history: &[RoundRecord], _rng: &mut SeededRng) -> Move {
    Move::Defect
}

fn decide_tit_for_tat(history: &[RoundRecord], _rng: &mut SeededRng) -> Move {
    last_observed(history).unwrap_or(Move::Cooperate)
}

fn decide_generous_tit_for_tat(history: &[RoundRecord], rng: &mut SeededRng) -> Move {
    match last_observed(history) {
        None | Some(Move::Cooperate) => Move::Cooperate,
        Some(Move::Defect) => {
            if rng.next_percent() < GENEROUS_FORGIVENESS_PERCENT {
                Move::Cooperate
            } else {
                Move::Defect
            }
        }
    }
}

fn decide_suspicious_tit_for_tat(history: &[RoundRecord], _rng: &mut SeededRng) -> Move {
    last_observed(history).unwrap_or(Move::Defect)
}

fn decide_win_stay_lose_shift(history: &[RoundRecord], _rng: &mut SeededRng) -> Move {
    match last_observed(history) {
        None | Some(Move::Cooperate) => Move::Cooperate,
        Some(Move::Defect) => Move::Defect,
    }
}

fn decide_pavlov(history: &[RoundRecord], _rng: &mut SeededRng) -> Move {
    last_observed(history).unwrap_or(Move::Cooperate)
}

fn decide_occasional_defector(_history: &[RoundRecord], rng: &mut SeededRng) -> Move {
    if rng.next_percent() < OCCASIONAL_DEFECTION_PERCENT {
        Move::Defect
    } else {
        Move::Cooperate
    }
}
