//! First-run onboarding gate.
//!
//! A short question flow that must be completed before the board accepts
//! input. A negative answer to the belief question locks the flow for a
//! while; the lock is lifted lazily by [`Onboarding::evaluate`] comparing the
//! stored timestamp against the current time.

use crate::config::BoardConfig;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use thiserror::Error;

pub const KEY_COMPLETED: &str = "onboarding_completed";
pub const KEY_BLOCKED: &str = "onboarding_blocked";
pub const KEY_BLOCK_TIMESTAMP: &str = "onboarding_block_timestamp";
pub const KEY_NICKNAME: &str = "user_nickname";

/// Number of single-answer statements shown before the belief question.
pub const STATEMENT_COUNT: u8 = 4;

/// Milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    use web_time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnboardingError {
    #[error("Answer {answer:?} is not valid in state {state:?}")]
    InvalidAnswer { state: OnboardingState, answer: Answer },
    #[error("Name must not be blank")]
    BlankName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingState {
    /// One of the opening statements, acknowledged with [`Answer::Ok`].
    Statement(u8),
    /// Yes/No question; "No" blocks.
    Belief,
    /// Acknowledged with [`Answer::Yes`].
    Commitment,
    NameEntry,
    /// Final greeting, shown until the dwell time has passed.
    Greeting { since: u64 },
    Blocked { since: u64 },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Ok,
    Yes,
    No,
    Name(String),
}

/// Onboarding state machine backed by a key-value store.
pub struct Onboarding<S: KeyValueStore> {
    store: Arc<S>,
    state: OnboardingState,
    name: String,
    block_ms: u64,
    dwell_ms: u64,
}

impl<S: KeyValueStore> Onboarding<S> {
    /// Rebuild the machine from persisted flags.
    pub fn restore(store: Arc<S>, config: &BoardConfig, now: u64) -> Self {
        let mut onboarding = Self {
            store,
            state: OnboardingState::Statement(0),
            name: String::new(),
            block_ms: config.onboarding_block_ms,
            dwell_ms: config.greeting_dwell_ms,
        };
        onboarding.name = onboarding.read(KEY_NICKNAME).unwrap_or_default();

        if onboarding.read(KEY_COMPLETED).is_some() {
            onboarding.state = OnboardingState::Completed;
            return onboarding;
        }

        if onboarding.read(KEY_BLOCKED).is_some() {
            let since = onboarding
                .read(KEY_BLOCK_TIMESTAMP)
                .and_then(|ts| ts.trim().parse::<u64>().ok());
            match since {
                Some(since) => {
                    onboarding.state = OnboardingState::Blocked { since };
                    onboarding.evaluate(now);
                }
                None => {
                    log::warn!("Onboarding block flag without a valid timestamp, clearing it");
                    onboarding.clear_block();
                }
            }
        }
        onboarding
    }

    pub fn state(&self) -> OnboardingState {
        self.state
    }

    /// Zero-based question index, `None` when blocked or completed.
    pub fn step_index(&self) -> Option<u8> {
        match self.state {
            OnboardingState::Statement(i) => Some(i),
            OnboardingState::Belief => Some(STATEMENT_COUNT),
            OnboardingState::Commitment => Some(STATEMENT_COUNT + 1),
            OnboardingState::NameEntry => Some(STATEMENT_COUNT + 2),
            OnboardingState::Greeting { .. } => Some(STATEMENT_COUNT + 3),
            OnboardingState::Blocked { .. } | OnboardingState::Completed => None,
        }
    }

    pub fn is_board_unlocked(&self) -> bool {
        self.state == OnboardingState::Completed
    }

    /// The chosen name, once one has been entered.
    pub fn display_name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }

    /// Apply the user's answer to the current question.
    pub fn answer(&mut self, answer: Answer, now: u64) -> Result<OnboardingState, OnboardingError> {
        let next = match (self.state, &answer) {
            (OnboardingState::Statement(i), Answer::Ok) if i + 1 < STATEMENT_COUNT => {
                OnboardingState::Statement(i + 1)
            }
            (OnboardingState::Statement(_), Answer::Ok) => OnboardingState::Belief,
            (OnboardingState::Belief, Answer::Yes) => OnboardingState::Commitment,
            (OnboardingState::Belief, Answer::No) => {
                self.write(KEY_BLOCKED, "true");
                self.write(KEY_BLOCK_TIMESTAMP, &now.to_string());
                log::info!("Onboarding blocked at {}", now);
                OnboardingState::Blocked { since: now }
            }
            (OnboardingState::Commitment, Answer::Yes) => OnboardingState::NameEntry,
            (OnboardingState::NameEntry, Answer::Name(name)) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(OnboardingError::BlankName);
                }
                self.name = name.to_string();
                OnboardingState::Greeting { since: now }
            }
            (state, _) => {
                return Err(OnboardingError::InvalidAnswer {
                    state,
                    answer: answer.clone(),
                });
            }
        };
        self.state = next;
        Ok(next)
    }

    /// Run the timed transitions. Returns true if the state changed.
    pub fn evaluate(&mut self, now: u64) -> bool {
        match self.state {
            OnboardingState::Blocked { since } if now.saturating_sub(since) >= self.block_ms => {
                self.clear_block();
                self.state = OnboardingState::Belief;
                log::info!("Onboarding block expired");
                true
            }
            OnboardingState::Greeting { since } if now.saturating_sub(since) >= self.dwell_ms => {
                self.write(KEY_COMPLETED, "true");
                let name = self.name.clone();
                self.write(KEY_NICKNAME, &name);
                self.state = OnboardingState::Completed;
                log::info!("Onboarding completed for {}", self.name);
                true
            }
            _ => false,
        }
    }

    /// Forget everything and start over.
    pub fn reset(&mut self) {
        for key in [KEY_COMPLETED, KEY_BLOCKED, KEY_BLOCK_TIMESTAMP, KEY_NICKNAME] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("Failed to clear {}: {}", key, e);
            }
        }
        self.name.clear();
        self.state = OnboardingState::Statement(0);
    }

    fn clear_block(&self) {
        for key in [KEY_BLOCKED, KEY_BLOCK_TIMESTAMP] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("Failed to clear {}: {}", key, e);
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            log::warn!("Failed to write {}: {}", key, e);
        }
    }
}
