//! Error and diagnostic types shared by every analysis component.
//!
//! Fatal misuse of the driver API surfaces as [`AnalysisError`]; conditions
//! that a sound analysis can still proceed past (e.g. a divisor interval
//! that merely *contains* zero) surface as non-fatal [`Diagnostic`] values
//! that the caller collects instead of this crate printing anything itself.

use thiserror::Error;

/// Fatal errors that abort an analysis outright.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The driver referenced an undeclared variable or used an unknown
    /// relational/binary operator.
    #[error("domain misuse: {0}")]
    DomainMisuse(String),

    /// The fixpoint engine was configured with an iteration cap and ran
    /// past it without reaching a post-fixpoint.
    #[error("analysis did not terminate within {rounds} rounds")]
    NonTerminating {
        /// Number of rounds attempted before the cap was hit.
        rounds: u32,
    },
}

/// Kind of a non-fatal diagnostic emitted by a transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A modulo transformer's divisor interval was exactly `{0}`; the
    /// element at that point collapses to bottom.
    DivisionByZero,
    /// A modulo transformer's divisor interval contains zero but is wider
    /// than `{0}`; the transformer proceeded with the computed bound.
    PossibleDivisionByZero,
}

/// A single non-fatal diagnostic, carrying enough context for a driver to
/// report it without this crate doing any printing of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What kind of condition was observed.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
    /// The control location the diagnostic pertains to, if known.
    pub location: Option<String>,
}

impl Diagnostic {
    pub(crate) fn division_by_zero(location: Option<String>) -> Self {
        let diag = Self {
            kind: DiagnosticKind::DivisionByZero,
            message: "modulo by an interval that is exactly {0}".to_string(),
            location,
        };
        log::warn!("{:?}: {}", diag.location, diag.message);
        diag
    }

    pub(crate) fn possible_division_by_zero(location: Option<String>) -> Self {
        let diag = Self {
            kind: DiagnosticKind::PossibleDivisionByZero,
            message: "modulo divisor interval contains 0".to_string(),
            location,
        };
        log::debug!("{:?}: {}", diag.location, diag.message);
        diag
    }
}
