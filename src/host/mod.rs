//! Reference host runtime
//!
//! [`ScriptRuntime`] owns one script instance: its generated program, its
//! operand channel, neutral string heap, saved-state slot and abort signal.
//! It implements [`HostProgram`] for the translated code and forwards every
//! action to an [`ActionHost`].

pub mod actions;
pub mod params;
pub mod scheduler;

pub use actions::{replay_fast_commands, ActionContext, ActionHost};
pub use scheduler::{PendingSituation, SituationScheduler};

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, error, warn};

use crate::bridge::abort::AbortSignal;
use crate::bridge::action::fast::{build_commands, collect_return};
use crate::bridge::action::{
    ActionId, ActionReturn, ActionTable, ActionType, FastActionCmd, FastActionOutput,
};
use crate::bridge::channel::OperandChannel;
use crate::bridge::continuation::{
    image, GeneratedProgram, SavedState, SavedStateHeader, StateCapture,
};
use crate::bridge::engine::{EngineHandle, EngineKind, EngineRegistry};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::host::HostProgram;
use crate::bridge::intrinsics::Intrinsics;
use crate::bridge::neutral::{NeutralStringHeap, NeutralStringStorage};
use crate::bridge::value::{ObjectId, Operand, OperandKind};
use crate::util::config::RuntimeConfig;

/// Instance state reachable from translated code.
pub struct RuntimeCore<A: ActionHost> {
    actions: A,
    table: Arc<ActionTable>,
    stack: OperandChannel,
    strings: NeutralStringHeap,
    abort: AbortSignal,
    saved_state: Option<SavedState>,
    actor: ObjectId,
    config: RuntimeConfig,
}

impl<A: ActionHost> RuntimeCore<A> {
    fn new(
        actions: A,
        table: Arc<ActionTable>,
        config: RuntimeConfig,
    ) -> Self {
        let mut stack = OperandChannel::with_depth(config.max_channel_depth);
        stack.set_verbose(config.verbose);
        Self {
            actions,
            table,
            stack,
            strings: NeutralStringHeap::with_limit(
                config.string_encoding,
                config.max_neutral_bytes,
            ),
            abort: AbortSignal::new(),
            saved_state: None,
            actor: config.invalid_object(),
            config,
        }
    }

    fn run_fast(
        &mut self,
        action: ActionId,
        arg_count: usize,
        cmds: &[FastActionCmd],
    ) -> BridgeResult<FastActionOutput> {
        let mut ctx = ActionContext::new(
            &mut self.stack,
            &self.strings,
            &self.abort,
            &mut self.saved_state,
            self.actor,
        );
        self.actions
            .execute_action_fast(&mut ctx, action, arg_count, cmds)
    }

    fn finish_action(
        &self,
        action: ActionId,
        succeeded: bool,
    ) -> BridgeResult<()> {
        if !succeeded {
            warn!("Action service {} invocation failed", action);
        }
        self.abort.check(succeeded)
    }
}

impl<A: ActionHost> HostProgram for RuntimeCore<A> {
    fn push_operand(
        &mut self,
        operand: Operand,
    ) -> BridgeResult<()> {
        self.stack.push_operand(operand)
    }

    fn pop_operand(
        &mut self,
        kind: OperandKind,
    ) -> BridgeResult<Operand> {
        self.stack.pop_operand(kind)
    }

    fn create_engine_structure(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        self.actions.create_engine_structure(kind)
    }

    fn compare_engine_structures(
        &mut self,
        a: &EngineHandle,
        b: &EngineHandle,
    ) -> BridgeResult<bool> {
        a.ensure_kind(b.kind())?;
        Ok(match (a.structure(), b.structure()) {
            (None, None) => true,
            (Some(x), Some(y)) => x.compare(&**y),
            _ => false,
        })
    }

    fn execute_action(
        &mut self,
        action: ActionId,
        arg_count: usize,
    ) -> BridgeResult<()> {
        debug!("VMACTION: {} ({} arguments)", action, arg_count);
        self.table.get(action)?.check_arg_count(arg_count)?;
        let mut ctx = ActionContext::new(
            &mut self.stack,
            &self.strings,
            &self.abort,
            &mut self.saved_state,
            self.actor,
        );
        let succeeded = self.actions.execute_action(&mut ctx, action, arg_count)?;
        self.finish_action(action, succeeded)
    }

    fn execute_action_fast(
        &mut self,
        action: ActionId,
        arg_count: usize,
        args: &[Operand],
    ) -> BridgeResult<ActionReturn> {
        debug!("VMACTION (direct): {} ({} arguments)", action, arg_count);
        let table = Arc::clone(&self.table);
        let definition = table.get(action)?;

        let mut allocated: SmallVec<[NeutralStringStorage; 4]> = SmallVec::new();
        let strings = &mut self.strings;
        let built = build_commands(definition, arg_count, args, |text| {
            let storage = strings.allocate(text)?;
            allocated.push(storage);
            Ok(storage)
        });
        let outcome = match built {
            Ok(cmds) => self.run_fast(action, arg_count, &cmds),
            Err(err) => Err(err),
        };

        // Argument strings are released on every path.
        let released = allocated
            .into_iter()
            .try_for_each(|storage| self.strings.release(storage));

        let output = outcome?;
        released?;
        self.finish_action(action, output.succeeded)?;
        collect_return(definition, output.results)
    }

    fn store_state(
        &mut self,
        capture: StateCapture,
    ) -> BridgeResult<()> {
        let state = SavedState::from_capture(capture, self.actor);
        debug!(
            "store state: situation {} pc {} ({} locals, globals {})",
            state.situation(),
            state.resume_pc(),
            state.locals().len(),
            if state.globals().is_some() { "saved" } else { "unchanged" }
        );
        self.saved_state = Some(state);
        Ok(())
    }

    fn allocate_neutral_string(
        &mut self,
        text: &str,
    ) -> BridgeResult<NeutralStringStorage> {
        self.strings.allocate(text)
    }

    fn release_neutral_string(
        &mut self,
        storage: NeutralStringStorage,
    ) -> BridgeResult<()> {
        self.strings.release(storage)
    }

    fn neutral_string_to_text(
        &self,
        storage: &NeutralStringStorage,
    ) -> BridgeResult<String> {
        self.strings.to_native_text(storage)
    }

    fn check_abort(
        &self,
        action_succeeded: bool,
    ) -> BridgeResult<()> {
        self.abort.check(action_succeeded)
    }
}

/// One script instance and the host services it runs against.
pub struct ScriptRuntime<A: ActionHost> {
    program: Box<dyn GeneratedProgram>,
    entry_params: Vec<ActionType>,
    engines: Arc<EngineRegistry>,
    core: RuntimeCore<A>,
}

impl<A: ActionHost> ScriptRuntime<A> {
    /// Create a runtime with the standard engine structure kinds and an
    /// entry point without parameters.
    pub fn new(
        program: Box<dyn GeneratedProgram>,
        actions: A,
        table: Arc<ActionTable>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            program,
            entry_params: Vec::new(),
            engines: Arc::new(EngineRegistry::with_standard_kinds()),
            core: RuntimeCore::new(actions, table, config),
        }
    }

    /// Declare the entry point's parameter types.
    pub fn with_entry_params(
        mut self,
        params: impl Into<Vec<ActionType>>,
    ) -> Self {
        self.entry_params = params.into();
        self
    }

    pub fn with_engines(
        mut self,
        engines: Arc<EngineRegistry>,
    ) -> Self {
        self.engines = engines;
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.core.config
    }

    pub fn actions(&self) -> &A {
        &self.core.actions
    }

    pub fn actions_mut(&mut self) -> &mut A {
        &mut self.core.actions
    }

    pub fn action_table(&self) -> &ActionTable {
        &self.core.table
    }

    pub fn channel(&self) -> &OperandChannel {
        &self.core.stack
    }

    pub fn channel_mut(&mut self) -> &mut OperandChannel {
        &mut self.core.stack
    }

    pub fn strings(&self) -> &NeutralStringHeap {
        &self.core.strings
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    /// Bridge over this instance, for driving translated code directly.
    pub fn intrinsics(&mut self) -> Intrinsics<'_> {
        Intrinsics::new(&mut self.core, Arc::clone(&self.engines))
    }

    /// Actor of the execution in progress, or the invalid object when idle.
    pub fn current_actor(&self) -> ObjectId {
        self.core.actor
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Run the entry point on behalf of `actor`.
    pub fn execute_script(
        &mut self,
        actor: ObjectId,
        params: &[&str],
        default_return_code: i32,
    ) -> BridgeResult<i32> {
        let previous = std::mem::replace(&mut self.core.actor, actor);
        let result = self.run_entry(actor, params, default_return_code);
        self.core.actor = previous;
        self.finish("script", result)
    }

    fn run_entry(
        &mut self,
        actor: ObjectId,
        params: &[&str],
        default_return_code: i32,
    ) -> BridgeResult<i32> {
        let params = params::convert_parameters(
            &self.entry_params,
            params,
            self.core.config.invalid_object(),
        )?;
        debug!("execute script for {} ({} parameters)", actor, params.len());
        let mut bridge = Intrinsics::new(&mut self.core, Arc::clone(&self.engines));
        self.program
            .execute_script(&mut bridge, actor, params, default_return_code)
    }

    /// Resume a stored continuation on behalf of `actor`. The state is
    /// consumed.
    pub fn execute_script_situation(
        &mut self,
        state: SavedState,
        actor: ObjectId,
    ) -> BridgeResult<()> {
        let previous = std::mem::replace(&mut self.core.actor, actor);
        let (mut program, situation, locals) = state.into_resume();
        debug!("execute situation {} for {}", situation, actor);
        let mut bridge = Intrinsics::new(&mut self.core, Arc::clone(&self.engines));
        let result = program.execute_script_situation(&mut bridge, situation, locals, actor);
        self.core.actor = previous;
        self.finish("situation", result)
    }

    fn finish<T>(
        &mut self,
        what: &str,
        result: BridgeResult<T>,
    ) -> BridgeResult<T> {
        if let Err(err) = &result {
            error!("{} failed: {}", what, err);
            self.core.stack.clear();
        }
        self.core.abort.clear();
        result
    }

    // ------------------------------------------------------------------
    // Abort
    // ------------------------------------------------------------------

    /// Request cancellation of the running script.
    pub fn abort_script(&self) {
        self.core.abort.request();
    }

    pub fn is_script_aborted(&self) -> bool {
        self.core.abort.is_requested()
    }

    /// Handle that other threads can use to cancel this instance.
    pub fn abort_signal(&self) -> AbortSignal {
        self.core.abort.clone()
    }

    // ------------------------------------------------------------------
    // Saved state
    // ------------------------------------------------------------------

    /// Take the most recent continuation.
    pub fn take_saved_state(&mut self) -> BridgeResult<SavedState> {
        self.core.saved_state.take().ok_or(BridgeError::NoSavedState)
    }

    pub fn has_saved_state(&self) -> bool {
        self.core.saved_state.is_some()
    }

    /// Independent copy of a continuation.
    pub fn duplicate_saved_state(
        &self,
        state: &SavedState,
    ) -> SavedState {
        state.duplicate()
    }

    /// Lay a continuation out on a channel.
    pub fn push_saved_state(
        &self,
        state: &SavedState,
        channel: &mut OperandChannel,
    ) -> BridgeResult<SavedStateHeader> {
        if !self.core.config.save_state_to_stack {
            return Err(BridgeError::SavedStateToStackDisabled);
        }
        image::push_state(channel, state)
    }

    /// Rebuild a continuation from a channel image, on a clone of this
    /// runtime's program with the image's globals loaded.
    pub fn pop_saved_state(
        &self,
        channel: &mut OperandChannel,
        header: &SavedStateHeader,
    ) -> BridgeResult<SavedState> {
        if !self.core.config.save_state_to_stack {
            return Err(BridgeError::SavedStateToStackDisabled);
        }
        let (globals, locals) = image::pop_state(channel, header)?;
        let mut program = self.program.clone_program();
        if let Some(globals) = &globals {
            program.load_globals(globals.clone())?;
        }
        Ok(SavedState::from_capture(
            StateCapture {
                globals,
                locals,
                resume_pc: header.resume_pc,
                situation: header.situation,
                program,
            },
            header.actor,
        ))
    }

    // ------------------------------------------------------------------
    // Program
    // ------------------------------------------------------------------

    pub fn clone_program(&self) -> Box<dyn GeneratedProgram> {
        self.program.clone_program()
    }

    /// Replace the live program's globals.
    pub fn load_globals(
        &mut self,
        globals: Vec<Operand>,
    ) -> BridgeResult<()> {
        self.program.load_globals(globals)
    }
}

#[cfg(test)]
mod tests;
