//! Conversation types: user identity, turns, and per-user history.
//!
//! The wire shape of [`Turn`] matches the upstream `contents` format
//! (`{"role": "user", "parts": [{"text": "..."}]}`) so stored history can be
//! replayed to the provider without conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, stable identifier for one end user.
///
/// Minted once per client and handed back (e.g. via cookie) so later
/// requests land on the same conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Mint a new random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied identifier.
    ///
    /// Identifiers are opaque, so anything non-blank is accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// One text segment of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// One role-tagged message unit in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Display text: all parts joined by newlines, trimmed.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// True when no part carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.parts.iter().all(|p| p.text.trim().is_empty())
    }
}

/// Ordered sequence of turns for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory(Vec<Turn>);

impl ConversationHistory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }

    pub fn push(&mut self, turn: Turn) {
        self.0.push(turn);
    }

    /// Drop the oldest turns until at most `max_turns` remain.
    ///
    /// Turns are dropped in pairs so a window that started on a user turn
    /// keeps starting on one. A cap below 2 is raised to 2 so the latest
    /// exchange always survives.
    pub fn truncate_front(&mut self, max_turns: usize) {
        let max_turns = max_turns.max(2);
        if self.0.len() <= max_turns {
            return;
        }
        let mut excess = self.0.len() - max_turns;
        if excess % 2 == 1 {
            excess += 1;
        }
        let excess = excess.min(self.0.len());
        self.0.drain(..excess);
    }

    /// Whether turns strictly alternate user, model, user, ... starting with user.
    ///
    /// Diagnostic only: stores never reject a non-alternating history.
    pub fn is_alternating(&self) -> bool {
        self.0.iter().enumerate().all(|(i, turn)| {
            let expected = if i % 2 == 0 { Role::User } else { Role::Model };
            turn.role == expected
        })
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.0
    }
}

impl From<Vec<Turn>> for ConversationHistory {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

impl IntoIterator for ConversationHistory {
    type Item = Turn;
    type IntoIter = std::vec::IntoIter<Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
