//! Shapes exchanged with the AI coach: phase analysis and chat messages.

use serde::{Deserialize, Deserializer, Serialize};

/// The four evaluation buckets of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Opening,
    Middlegame,
    Tactics,
    Endgame,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Opening, Phase::Middlegame, Phase::Tactics, Phase::Endgame];

    pub fn label(self) -> &'static str {
        match self {
            Phase::Opening => "Opening",
            Phase::Middlegame => "Middlegame",
            Phase::Tactics => "Tactics",
            Phase::Endgame => "Endgame",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseAnalysis {
    /// 0-100 by contract with the AI; stored exactly as received.
    #[serde(deserialize_with = "score_from_number")]
    pub score: i64,
    pub feedback: String,
    pub errors: Vec<String>,
}

/// Colour bucket used when presenting a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl PhaseAnalysis {
    pub fn clamped_score(&self) -> u8 {
        self.score.clamp(0, 100) as u8
    }

    pub fn band(&self) -> ScoreBand {
        match self.clamped_score() {
            70.. => ScoreBand::Strong,
            40..=69 => ScoreBand::Fair,
            _ => ScoreBand::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysis {
    pub opening: PhaseAnalysis,
    pub middlegame: PhaseAnalysis,
    pub tactics: PhaseAnalysis,
    pub endgame: PhaseAnalysis,
    pub overall_advice: String,
    pub referenced_books: Vec<String>,
}

impl FullAnalysis {
    pub fn phase(&self, phase: Phase) -> &PhaseAnalysis {
        match phase {
            Phase::Opening => &self.opening,
            Phase::Middlegame => &self.middlegame,
            Phase::Tactics => &self.tactics,
            Phase::Endgame => &self.endgame,
        }
    }
}

/// Accept integral floats (`85.0`) as well as integers.
fn score_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    n.as_i64()
        .or_else(|| n.as_f64().map(|f| f.round() as i64))
        .ok_or_else(|| serde::de::Error::custom(format!("score out of range: {n}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Everything the coach sees when answering one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    pub query: String,
    pub pgn: String,
    pub fen: String,
    /// Transcript before `query`.
    pub history: Vec<ChatMessage>,
    pub analysis: Option<FullAnalysis>,
}
