//! Opponent decisions with an optional narrated rationale
//!
//! The move always comes from the strategy engine. An advice source, when one
//! is configured, only supplies the text that accompanies the move; any
//! failure there falls back to a static line keyed by strategy and tone.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dilemma_logic::{decide, mirror_history, Move, RoundRecord, StrategyId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AdviceConfig;
use crate::error::AdviceError;

/// Voice used for rationale and advice text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    Formal,
    #[default]
    Casual,
    Wise,
    Playful,
}

impl Tone {
    fn opener(self) -> &'static str {
        match self {
            Tone::Formal => "Allow me to explain: ",
            Tone::Casual => "Here's the deal: ",
            Tone::Wise => "Consider this: ",
            Tone::Playful => "Guess what? ",
        }
    }
}

/// What the advice source is asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdviceKind {
    Welcome,
    Advice,
    Explanation,
    Encouragement,
}

/// External narrative-advice source
#[async_trait]
pub trait AdviceSource: Send + Sync {
    /// `history` is from the human player's perspective
    async fn advise(&self, persona: &str, history: &[RoundRecord], kind: AdviceKind) -> Result<String, AdviceError>;
}

/// Whether narrated advice can be requested at all
#[derive(Clone)]
pub enum AdviceCapability {
    Unavailable,
    Available(Arc<dyn AdviceSource>),
}

impl AdviceCapability {
    /// Available only when an api key is configured and a source is supplied
    pub fn from_config(config: &AdviceConfig, source: Option<Arc<dyn AdviceSource>>) -> Self {
        match source {
            Some(source) if config.has_api_key() => AdviceCapability::Available(source),
            _ => AdviceCapability::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AdviceCapability::Available(_))
    }
}

impl fmt::Debug for AdviceCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdviceCapability::Unavailable => f.write_str("Unavailable"),
            AdviceCapability::Available(_) => f.write_str("Available(..)"),
        }
    }
}

/// An opponent move together with the text shown alongside it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub strategy: StrategyId,
    pub chosen: Move,
    pub rationale: String,
    /// `false` when the static fallback text was used
    pub narrated: bool,
}

/// Chooses moves for the algorithmic opponent
#[derive(Clone, Debug)]
pub struct OpponentDecisionService {
    persona: String,
    advice: AdviceCapability,
}

impl OpponentDecisionService {
    pub fn new(persona: impl Into<String>, advice: AdviceCapability) -> Self {
        Self {
            persona: persona.into(),
            advice,
        }
    }

    /// Service that never consults an advice source
    pub fn offline(persona: impl Into<String>) -> Self {
        Self::new(persona, AdviceCapability::Unavailable)
    }

    pub fn from_config(config: &AdviceConfig, source: Option<Arc<dyn AdviceSource>>) -> Self {
        Self::new(config.persona.clone(), AdviceCapability::from_config(config, source))
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn advice_available(&self) -> bool {
        self.advice.is_available()
    }

    /// Move for the opponent, given the history as the human player saw it
    pub fn choose_move(&self, strategy: StrategyId, player_history: &[RoundRecord]) -> Move {
        decide(strategy, &mirror_history(player_history))
    }

    /// Move plus rationale. Never fails: advice errors are swallowed.
    pub async fn decide(&self, strategy: StrategyId, player_history: &[RoundRecord], tone: Tone) -> Decision {
        let chosen = self.choose_move(strategy, player_history);
        let (rationale, narrated) = match self.narrate(player_history, AdviceKind::Explanation).await {
            Some(text) => (text, true),
            None => (fallback_rationale(strategy, tone), false),
        };

        debug!(strategy = %strategy, chosen = %chosen, narrated, "opponent decided");
        Decision {
            strategy,
            chosen,
            rationale,
            narrated,
        }
    }

    /// Free-standing advice text for the player (welcome, tips, ...)
    pub async fn advise(&self, strategy: StrategyId, player_history: &[RoundRecord], kind: AdviceKind, tone: Tone) -> String {
        match self.narrate(player_history, kind).await {
            Some(text) => text,
            None => fallback_text(strategy, kind, tone),
        }
    }

    async fn narrate(&self, player_history: &[RoundRecord], kind: AdviceKind) -> Option<String> {
        let source = match &self.advice {
            AdviceCapability::Available(source) => source,
            AdviceCapability::Unavailable => return None,
        };

        match source.advise(&self.persona, player_history, kind).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                debug!(persona = %self.persona, ?kind, "advice source returned no text");
                None
            }
            Err(e) => {
                debug!(persona = %self.persona, ?kind, error = %e, "advice source failed, using fallback");
                None
            }
        }
    }
}

fn strategy_line(strategy: StrategyId) -> &'static str {
    match strategy {
        StrategyId::Random => "I flipped a coin. Chance decides this round.",
        StrategyId::AlwaysCooperate => "I always cooperate. Trust is my only policy.",
        StrategyId::AlwaysDefect => "I always defect. Protecting myself comes first.",
        StrategyId::TitForTat => "I start friendly and then answer whatever you did last.",
        StrategyId::GenerousTitForTat => "I answer what you did last, but now and then I forgive a betrayal.",
        StrategyId::SuspiciousTitForTat => "I start wary and then answer whatever you did last.",
        StrategyId::WinStayLoseShift => "I stay with cooperation while you cooperate and switch when you don't.",
        StrategyId::Pavlov => "Cooperation earns cooperation from me, and defection earns defection.",
        StrategyId::OccasionalDefector => "I usually cooperate, though every so often I betray.",
    }
}

/// Static rationale for a strategy in the given tone
pub fn fallback_rationale(strategy: StrategyId, tone: Tone) -> String {
    format!("{}{}", tone.opener(), strategy_line(strategy))
}

/// Static text for any advice kind
pub fn fallback_text(strategy: StrategyId, kind: AdviceKind, tone: Tone) -> String {
    match kind {
        AdviceKind::Welcome => format!("{}each round you choose to trust or to betray. Let's see what you pick.", tone.opener()),
        AdviceKind::Encouragement => format!("{}every round teaches something about trust. Keep going.", tone.opener()),
        AdviceKind::Advice | AdviceKind::Explanation => fallback_rationale(strategy, tone),
    }
}
