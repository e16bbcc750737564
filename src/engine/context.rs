//! Conversation state rehydrated from storage at the start of every turn.
//!
//! The orchestrator treats a `ConversationContext` as immutable input: it
//! builds a revised copy (messages appended, active personas unioned) and
//! returns it in the turn outcome. Persistence of the revised value belongs
//! to the storage collaborator, not to this crate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::persona::Persona;
use super::phase::ConversationPhase;

/// Rough complexity classification of the app idea under discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Who authored a message in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Persona,
    System,
}

/// One prior turn in the conversation history. Append-only within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    /// Set when role is Persona.
    pub persona: Option<Persona>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            persona: None,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn persona(persona: Persona, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Persona,
            persona: Some(persona),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Everything the engine knows about one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub conversation_id: String,
    pub app_idea: String,
    pub target_users: Vec<String>,
    pub complexity: Option<Complexity>,
    pub current_phase: ConversationPhase,
    pub previous_messages: Vec<ChatMessage>,
    pub active_personas: BTreeSet<Persona>,
}

impl ConversationContext {
    /// Fresh context for a new conversation, starting at discovery.
    pub fn new(conversation_id: impl Into<String>, app_idea: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            app_idea: app_idea.into(),
            target_users: Vec::new(),
            complexity: None,
            current_phase: ConversationPhase::InitialDiscovery,
            previous_messages: Vec::new(),
            active_personas: BTreeSet::new(),
        }
    }

    /// Fresh context with a generated conversation id.
    pub fn with_generated_id(app_idea: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), app_idea)
    }

    /// Copy with a message appended to history.
    pub fn with_message(&self, message: ChatMessage) -> Self {
        let mut next = self.clone();
        next.previous_messages.push(message);
        next
    }

    /// Copy advanced to the next phase; unchanged when already at the last.
    ///
    /// Phase advancement is caller-driven: the orchestrator reports progress
    /// and completion signals but never moves the phase itself.
    pub fn advance_phase(&self) -> Self {
        let mut next = self.clone();
        if let Some(phase) = self.current_phase.next() {
            next.current_phase = phase;
        }
        next
    }

    /// The most recent user-authored messages, newest last.
    pub fn recent_user_messages(&self, limit: usize) -> Vec<&ChatMessage> {
        let mut recent: Vec<&ChatMessage> = self
            .previous_messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .take(limit)
            .collect();
        recent.reverse();
        recent
    }
}
