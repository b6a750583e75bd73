//! Rolling conversation memory shared by every channel
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use crate::features::personas::DEFAULT_PERSONA_ID;

/// Shown to the model in place of an empty history
pub const EMPTY_HISTORY_MARKER: &str = "No recent history.";

/// Source of "now" so timeouts can be tested without sleeping
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationContext {
    active_persona_id: String,
    history: VecDeque<Turn>,
    last_interaction: Option<DateTime<Utc>>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        ConversationContext {
            active_persona_id: DEFAULT_PERSONA_ID.to_string(),
            history: VecDeque::new(),
            last_interaction: None,
        }
    }

    pub fn active_persona_id(&self) -> &str {
        &self.active_persona_id
    }

    pub fn history(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_interaction(&self) -> Option<DateTime<Utc>> {
        self.last_interaction
    }

    /// Clear everything after a period of silence.
    ///
    /// Returns true when a reset happened. The timestamp is cleared too, so a
    /// second call without a new exchange in between is a no-op.
    pub fn expire_if_idle(&mut self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match self.last_interaction {
            Some(last) if now - last > timeout => {
                self.history.clear();
                self.active_persona_id = DEFAULT_PERSONA_ID.to_string();
                self.last_interaction = None;
                true
            }
            _ => false,
        }
    }

    /// Append a completed exchange, keeping only the newest `max_turns` turns
    pub fn record_exchange(
        &mut self,
        user_text: &str,
        assistant_text: &str,
        now: DateTime<Utc>,
        max_turns: usize,
    ) {
        self.push_bounded(Turn::user(user_text), max_turns);
        self.push_bounded(Turn::assistant(assistant_text), max_turns);
        self.last_interaction = Some(now);
    }

    fn push_bounded(&mut self, turn: Turn, max_turns: usize) {
        self.history.push_back(turn);
        while self.history.len() > max_turns {
            self.history.pop_front();
        }
    }

    /// Make `persona_id` active with a blank memory
    pub fn switch_to(&mut self, persona_id: &str, now: DateTime<Utc>) {
        self.active_persona_id = persona_id.to_string();
        self.forget(now);
    }

    /// Drop the history but keep the active persona
    pub fn forget(&mut self, now: DateTime<Utc>) {
        self.history.clear();
        self.last_interaction = Some(now);
    }

    /// Point at `default` without touching history (active persona vanished)
    pub(crate) fn heal_active(&mut self) {
        self.active_persona_id = DEFAULT_PERSONA_ID.to_string();
    }

    /// One `Role: text` line per turn, oldest first
    pub fn render_history(&self, assistant_label: &str) -> String {
        if self.history.is_empty() {
            return EMPTY_HISTORY_MARKER.to_string();
        }
        self.history
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    Role::User => "User",
                    Role::Assistant => assistant_label,
                };
                format!("{speaker}: {}", turn.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_new_context_is_default_and_empty() {
        let ctx = ConversationContext::new();
        assert_eq!(ctx.active_persona_id(), "default");
        assert_eq!(ctx.history_len(), 0);
        assert!(ctx.last_interaction().is_none());
    }

    #[test]
    fn test_history_truncates_oldest_first() {
        let mut ctx = ConversationContext::new();
        for i in 0..15 {
            ctx.record_exchange(&format!("q{i}"), &format!("a{i}"), at(0), 20);
        }

        assert_eq!(ctx.history_len(), 20);
        let texts: Vec<_> = ctx.history().map(|t| t.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"q5"));
        assert_eq!(texts.last(), Some(&"a14"));
        // order preserved and roles still alternate
        for (i, turn) in ctx.history().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
    }

    #[test]
    fn test_odd_bound_drops_single_turns() {
        let mut ctx = ConversationContext::new();
        ctx.record_exchange("q0", "a0", at(0), 3);
        ctx.record_exchange("q1", "a1", at(1), 3);

        let texts: Vec<_> = ctx.history().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["a0", "q1", "a1"]);
    }

    #[test]
    fn test_expire_resets_once() {
        let mut ctx = ConversationContext::new();
        ctx.switch_to("pirate", at(0));
        ctx.record_exchange("Hello", "Ahoy!", at(0), 20);

        let timeout = Duration::minutes(2);
        assert!(!ctx.expire_if_idle(at(2), timeout), "exactly the timeout is not idle");
        assert!(ctx.expire_if_idle(at(3), timeout));
        assert_eq!(ctx.active_persona_id(), "default");
        assert_eq!(ctx.history_len(), 0);

        assert!(!ctx.expire_if_idle(at(4), timeout));
        assert_eq!(ctx.active_persona_id(), "default");
    }

    #[test]
    fn test_expire_without_timestamp_is_noop() {
        let mut ctx = ConversationContext::new();
        assert!(!ctx.expire_if_idle(at(59), Duration::minutes(2)));
    }

    #[test]
    fn test_switch_and_forget() {
        let mut ctx = ConversationContext::new();
        ctx.record_exchange("Hello", "Hi", at(0), 20);

        ctx.switch_to("pirate", at(1));
        assert_eq!(ctx.active_persona_id(), "pirate");
        assert_eq!(ctx.history_len(), 0);
        assert_eq!(ctx.last_interaction(), Some(at(1)));

        ctx.record_exchange("Hello", "Ahoy", at(2), 20);
        ctx.forget(at(3));
        assert_eq!(ctx.active_persona_id(), "pirate");
        assert_eq!(ctx.history_len(), 0);
        assert_eq!(ctx.last_interaction(), Some(at(3)));
    }

    #[test]
    fn test_render_history() {
        let mut ctx = ConversationContext::new();
        assert_eq!(ctx.render_history("Droid"), EMPTY_HISTORY_MARKER);

        ctx.record_exchange("Hello", "Ahoy!", at(0), 20);
        assert_eq!(ctx.render_history("Droid"), "User: Hello\nDroid: Ahoy!");
    }
}
