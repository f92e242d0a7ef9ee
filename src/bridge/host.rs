//! Host program interface
//!
//! The operations translated code needs from the host, reached through
//! [`Intrinsics`](crate::bridge::intrinsics::Intrinsics). Each script
//! instance is given its own implementation at construction.

use crate::bridge::action::{ActionId, ActionReturn};
use crate::bridge::continuation::StateCapture;
use crate::bridge::engine::{EngineHandle, EngineKind};
use crate::bridge::error::BridgeResult;
use crate::bridge::neutral::NeutralStringStorage;
use crate::bridge::value::{Operand, OperandKind};

/// Services a host provides to one running script instance.
pub trait HostProgram {
    /// Push onto the instance's operand channel.
    fn push_operand(
        &mut self,
        operand: Operand,
    ) -> BridgeResult<()>;

    /// Pop from the instance's operand channel; the kind must match.
    fn pop_operand(
        &mut self,
        kind: OperandKind,
    ) -> BridgeResult<Operand>;

    /// Default instance of an engine structure kind.
    fn create_engine_structure(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle>;

    /// Compare two handles of the same kind.
    fn compare_engine_structures(
        &mut self,
        a: &EngineHandle,
        b: &EngineHandle,
    ) -> BridgeResult<bool>;

    /// Explicit-stack action call, followed by the abort check.
    fn execute_action(
        &mut self,
        action: ActionId,
        arg_count: usize,
    ) -> BridgeResult<()>;

    /// Direct-argument action call, followed by the abort check.
    fn execute_action_fast(
        &mut self,
        action: ActionId,
        arg_count: usize,
        args: &[Operand],
    ) -> BridgeResult<ActionReturn>;

    /// Accept the continuation of a suspend point.
    fn store_state(
        &mut self,
        capture: StateCapture,
    ) -> BridgeResult<()>;

    fn allocate_neutral_string(
        &mut self,
        text: &str,
    ) -> BridgeResult<NeutralStringStorage>;

    fn release_neutral_string(
        &mut self,
        storage: NeutralStringStorage,
    ) -> BridgeResult<()>;

    fn neutral_string_to_text(
        &self,
        storage: &NeutralStringStorage,
    ) -> BridgeResult<String>;

    /// Fail with `AbortRequested` if the action failed or cancellation was
    /// requested.
    fn check_abort(
        &self,
        action_succeeded: bool,
    ) -> BridgeResult<()>;
}
