//! Bridge errors
//!
//! Every error raised by the bridge is fatal to the script instance that
//! raised it. The error travels back to the host as the instance's outcome.

use thiserror::Error;

use crate::bridge::abort::AbortReason;
use crate::bridge::action::{ActionId, ActionType};
use crate::bridge::continuation::SituationId;
use crate::bridge::engine::EngineKind;
use crate::bridge::neutral::NeutralStringStorage;
use crate::bridge::value::OperandKind;

/// Bridge result
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("Operand underflow: expected {expected}, channel is empty")]
    Underflow { expected: OperandKind },

    #[error("Operand type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: OperandKind,
        found: OperandKind,
    },

    #[error("Engine structure kind mismatch: expected {expected}, found {found}")]
    HandleKindMismatch {
        expected: EngineKind,
        found: EngineKind,
    },

    #[error("Invalid engine structure kind {0}")]
    InvalidEngineKind(u8),

    #[error("Engine structure kind {0} is not declared")]
    UndeclaredEngineKind(EngineKind),

    #[error("Allocation failure: {what} ({requested} requested, limit {limit})")]
    AllocationFailure {
        what: &'static str,
        requested: usize,
        limit: usize,
    },

    #[error("Double release of {0}")]
    DoubleRelease(NeutralStringStorage),

    #[error("Invalid or released {0}")]
    InvalidStorage(NeutralStringStorage),

    #[error("Script aborted: {0}")]
    AbortRequested(AbortReason),

    #[error("Unknown action service {0}")]
    UnknownAction(ActionId),

    #[error("Action service {action}: {message}")]
    ActionSignature { action: ActionId, message: String },

    #[error("No saved state is ready")]
    NoSavedState,

    #[error("Unknown script situation {0}")]
    UnknownSituation(SituationId),

    #[error("Saved state image truncated: {missing} operands missing")]
    TruncatedStateImage { missing: usize },

    #[error("Saving state to the operand channel is disabled")]
    SavedStateToStackDisabled,

    #[error("Illegal entry point parameter type {ty} (#{index})")]
    IllegalEntryParameter { index: usize, ty: ActionType },

    #[error("Script error: {0}")]
    Script(String),
}

/// Fault classes reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Channel pop kind disagreement or emptiness
    TypeMismatch,
    /// Engine structure operation against the wrong kind
    HandleKindMismatch,
    /// Host-side resource exhaustion
    AllocationFailure,
    /// Releasing already released storage
    DoubleRelease,
    /// Action failure or cancellation
    AbortRequested,
    /// Misuse of the contract by translated code or host
    Contract,
}

impl BridgeError {
    /// Classify the error.
    pub fn class(&self) -> FaultClass {
        match self {
            BridgeError::Underflow { .. }
            | BridgeError::TypeMismatch { .. }
            | BridgeError::TruncatedStateImage { .. } => FaultClass::TypeMismatch,
            BridgeError::HandleKindMismatch { .. }
            | BridgeError::InvalidEngineKind(_)
            | BridgeError::UndeclaredEngineKind(_) => FaultClass::HandleKindMismatch,
            BridgeError::AllocationFailure { .. } => FaultClass::AllocationFailure,
            BridgeError::DoubleRelease(_) | BridgeError::InvalidStorage(_) => {
                FaultClass::DoubleRelease
            }
            BridgeError::AbortRequested(_) => FaultClass::AbortRequested,
            _ => FaultClass::Contract,
        }
    }

    /// Whether the error came from an abort or cancellation.
    pub fn is_abort(&self) -> bool {
        matches!(self, BridgeError::AbortRequested(_))
    }
}
