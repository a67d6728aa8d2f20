//! Conversation transcript types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Human,
    Ai,
}

impl TurnRole {
    /// Prefix used when rendering a transcript for prompts
    pub fn prefix(&self) -> &'static str {
        match self {
            TurnRole::Human => "Human",
            TurnRole::Ai => "AI",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::Human => "human",
            TurnRole::Ai => "ai",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "human" => Some(TurnRole::Human),
            "ai" => Some(TurnRole::Ai),
            _ => None,
        }
    }
}

/// A single message in a session transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Human, content)
    }

    /// Create an assistant turn
    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Ai, content)
    }
}

/// Last `k` exchanges (`2k` turns) of a transcript
pub fn recent_window(turns: &[ChatTurn], k: usize) -> &[ChatTurn] {
    let take = k.saturating_mul(2);
    &turns[turns.len().saturating_sub(take)..]
}

/// Render turns as `Human: ...` / `AI: ...` lines
pub fn buffer_string(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.prefix(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}
