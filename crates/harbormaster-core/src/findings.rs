//! Per-run accumulator for messages and field corrections.
//!
//! One `Findings` value is created per verification run and threaded
//! `&mut` through every checker. Nothing here is ambient or global; the
//! accumulator's lifetime is exactly one run.

use std::collections::BTreeSet;

use harbormaster_remote::{FieldCorrection, TicketField};

use crate::message::{Severity, VerificationMessage};

/// Everything the checkers produced during one run.
#[derive(Debug, Default, Clone)]
pub struct Findings {
    /// Deduplicated, render-ordered findings.
    pub messages: BTreeSet<VerificationMessage>,
    /// Proposed field overwrites, in checker-registration order. Later
    /// corrections for the same field win when applied.
    pub corrections: Vec<FieldCorrection>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: VerificationMessage) {
        self.messages.insert(message);
    }

    pub fn require(&mut self, text: impl Into<String>) {
        self.push(VerificationMessage::required(text));
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(VerificationMessage::warning(text));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(VerificationMessage::info(text));
    }

    /// Propose overwriting one ticket field.
    pub fn correct(&mut self, field: TicketField, value: impl Into<String>) {
        self.corrections
            .push(FieldCorrection::new(field, value.into()));
    }

    /// True when no checker found anything to report.
    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of findings at the given severity.
    pub fn count_at(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }
}
