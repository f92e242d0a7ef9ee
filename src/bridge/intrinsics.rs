//! Intrinsics called by translated script code
//!
//! One [`Intrinsics`] is built per script instance entry, over that
//! instance's [`HostProgram`]. Its methods correspond one to one with the
//! stack, action, suspend and abort points of the original bytecode.

use std::sync::Arc;

use crate::bridge::action::{ActionId, ActionReturn};
use crate::bridge::continuation::{GeneratedProgram, ProgramCounter, SituationId, StateCapture};
use crate::bridge::engine::{EngineHandle, EngineKind, EngineRegistry};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::host::HostProgram;
use crate::bridge::neutral::NeutralStringStorage;
use crate::bridge::value::{ChannelValue, ObjectId, Operand, Vector3};

/// Typed entry points into the host for translated code.
pub struct Intrinsics<'h> {
    host: &'h mut dyn HostProgram,
    engines: Arc<EngineRegistry>,
}

impl<'h> Intrinsics<'h> {
    pub fn new(
        host: &'h mut dyn HostProgram,
        engines: Arc<EngineRegistry>,
    ) -> Self {
        Self { host, engines }
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    // ------------------------------------------------------------------
    // Operand channel
    // ------------------------------------------------------------------

    pub fn push<T: ChannelValue>(
        &mut self,
        value: T,
    ) -> BridgeResult<()> {
        self.host.push_operand(value.into_operand())
    }

    pub fn pop<T: ChannelValue>(&mut self) -> BridgeResult<T> {
        let operand = self.host.pop_operand(T::KIND)?;
        T::from_operand(operand).map_err(|other| BridgeError::TypeMismatch {
            expected: T::KIND,
            found: other.kind(),
        })
    }

    pub fn push_int(
        &mut self,
        value: i32,
    ) -> BridgeResult<()> {
        self.push(value)
    }

    pub fn pop_int(&mut self) -> BridgeResult<i32> {
        self.pop()
    }

    pub fn push_float(
        &mut self,
        value: f32,
    ) -> BridgeResult<()> {
        self.push(value)
    }

    pub fn pop_float(&mut self) -> BridgeResult<f32> {
        self.pop()
    }

    pub fn push_string(
        &mut self,
        value: &str,
    ) -> BridgeResult<()> {
        self.push(value.to_string())
    }

    pub fn pop_string(&mut self) -> BridgeResult<String> {
        self.pop()
    }

    pub fn push_object(
        &mut self,
        value: ObjectId,
    ) -> BridgeResult<()> {
        self.push(value)
    }

    pub fn pop_object(&mut self) -> BridgeResult<ObjectId> {
        self.pop()
    }

    /// Push x, y, z.
    pub fn push_vector(
        &mut self,
        v: Vector3,
    ) -> BridgeResult<()> {
        self.push_float(v.x)?;
        self.push_float(v.y)?;
        self.push_float(v.z)
    }

    /// Pop z, y, x.
    pub fn pop_vector(&mut self) -> BridgeResult<Vector3> {
        let z = self.pop_float()?;
        let y = self.pop_float()?;
        let x = self.pop_float()?;
        Ok(Vector3 { x, y, z })
    }

    // ------------------------------------------------------------------
    // Engine structures
    // ------------------------------------------------------------------

    pub fn push_engine(
        &mut self,
        kind: EngineKind,
        handle: &EngineHandle,
    ) -> BridgeResult<()> {
        self.engines.push(&mut *self.host, kind, handle)
    }

    pub fn pop_engine(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        self.engines.pop(&mut *self.host, kind)
    }

    pub fn compare_engine(
        &mut self,
        kind: EngineKind,
        a: &EngineHandle,
        b: &EngineHandle,
    ) -> BridgeResult<bool> {
        self.engines.compare(&mut *self.host, kind, a, b)
    }

    pub fn create_engine(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        self.engines.create(&mut *self.host, kind)
    }

    pub fn release_engine(
        &self,
        handle: &mut EngineHandle,
    ) -> bool {
        self.engines.release(handle)
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Call an action whose arguments are already on the channel.
    pub fn execute_action(
        &mut self,
        action: ActionId,
        arg_count: usize,
    ) -> BridgeResult<()> {
        self.host.execute_action(action, arg_count)
    }

    /// Call an action with arguments in declared order.
    pub fn execute_action_fast(
        &mut self,
        action: ActionId,
        arg_count: usize,
        args: &[Operand],
    ) -> BridgeResult<ActionReturn> {
        self.host.execute_action_fast(action, arg_count, args)
    }

    pub fn check_abort(
        &self,
        action_succeeded: bool,
    ) -> BridgeResult<()> {
        self.host.check_abort(action_succeeded)
    }

    // ------------------------------------------------------------------
    // Continuations
    // ------------------------------------------------------------------

    /// Hand the host a continuation for the current suspend point.
    pub fn store_state(
        &mut self,
        globals: Option<Vec<Operand>>,
        locals: Vec<Operand>,
        resume_pc: ProgramCounter,
        situation: SituationId,
        program: Box<dyn GeneratedProgram>,
    ) -> BridgeResult<()> {
        self.host.store_state(StateCapture {
            globals,
            locals,
            resume_pc,
            situation,
            program,
        })
    }

    // ------------------------------------------------------------------
    // Neutral strings
    // ------------------------------------------------------------------

    pub fn allocate_neutral_string(
        &mut self,
        text: &str,
    ) -> BridgeResult<NeutralStringStorage> {
        self.host.allocate_neutral_string(text)
    }

    pub fn release_neutral_string(
        &mut self,
        storage: NeutralStringStorage,
    ) -> BridgeResult<()> {
        self.host.release_neutral_string(storage)
    }

    pub fn neutral_string_to_text(
        &self,
        storage: &NeutralStringStorage,
    ) -> BridgeResult<String> {
        self.host.neutral_string_to_text(storage)
    }
}
