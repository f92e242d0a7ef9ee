//! Action handlers
//!
//! An [`ActionHost`] implements the game side of every action ordinal. It
//! sees the running instance only through an [`ActionContext`].

use crate::bridge::abort::AbortSignal;
use crate::bridge::action::{ActionId, FastActionCmd, FastActionOutput};
use crate::bridge::channel::OperandChannel;
use crate::bridge::continuation::SavedState;
use crate::bridge::engine::{EngineHandle, EngineKind};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::neutral::{NeutralStringHeap, NeutralStringStorage};
use crate::bridge::value::ObjectId;

/// View of a running instance handed to action handlers.
pub struct ActionContext<'a> {
    stack: &'a mut OperandChannel,
    strings: &'a NeutralStringHeap,
    abort: &'a AbortSignal,
    saved_state: &'a mut Option<SavedState>,
    actor: ObjectId,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        stack: &'a mut OperandChannel,
        strings: &'a NeutralStringHeap,
        abort: &'a AbortSignal,
        saved_state: &'a mut Option<SavedState>,
        actor: ObjectId,
    ) -> Self {
        Self {
            stack,
            strings,
            abort,
            saved_state,
            actor,
        }
    }

    /// The instance's operand channel.
    pub fn stack(&mut self) -> &mut OperandChannel {
        self.stack
    }

    /// Object the script is running on behalf of.
    pub fn actor(&self) -> ObjectId {
        self.actor
    }

    pub fn neutral_text(
        &self,
        storage: &NeutralStringStorage,
    ) -> BridgeResult<String> {
        self.strings.to_native_text(storage)
    }

    /// Request cancellation of the running script. Takes effect at the
    /// abort check following this action.
    pub fn abort_script(&self) {
        self.abort.request();
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        self.abort
    }

    /// Take the continuation stored just before this action was called.
    /// Only meaningful inside handlers that take an action argument.
    pub fn take_saved_state(&mut self) -> BridgeResult<SavedState> {
        self.saved_state.take().ok_or(BridgeError::NoSavedState)
    }
}

/// Game-side implementation of action services.
pub trait ActionHost: Send {
    /// Run an action whose arguments are on the channel, first declared
    /// argument on top. Returns `false` if the action failed.
    fn execute_action(
        &mut self,
        ctx: &mut ActionContext<'_>,
        action: ActionId,
        arg_count: usize,
    ) -> BridgeResult<bool>;

    /// Run a compiled direct call. The default replays the commands through
    /// [`execute_action`](Self::execute_action).
    fn execute_action_fast(
        &mut self,
        ctx: &mut ActionContext<'_>,
        action: ActionId,
        arg_count: usize,
        cmds: &[FastActionCmd],
    ) -> BridgeResult<FastActionOutput> {
        replay_fast_commands(self, ctx, action, arg_count, cmds)
    }

    /// Default instance of an engine structure kind. The default is an
    /// empty handle.
    fn create_engine_structure(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        Ok(EngineHandle::empty(kind))
    }
}

/// Execute a direct-call command list against the context's channel.
pub fn replay_fast_commands<H: ActionHost + ?Sized>(
    host: &mut H,
    ctx: &mut ActionContext<'_>,
    action: ActionId,
    arg_count: usize,
    cmds: &[FastActionCmd],
) -> BridgeResult<FastActionOutput> {
    let mut output = FastActionOutput::default();

    for cmd in cmds {
        match cmd {
            FastActionCmd::PushInt(v) => ctx.stack.push_int(*v)?,
            FastActionCmd::PushFloat(v) => ctx.stack.push_float(*v)?,
            FastActionCmd::PushObject(id) => ctx.stack.push_object(*id)?,
            FastActionCmd::PushString(storage) => {
                let text = ctx.strings.to_native_text(storage)?;
                ctx.stack.push_string(text)?;
            }
            FastActionCmd::Call => {
                if !host.execute_action(ctx, action, arg_count)? {
                    return Ok(FastActionOutput::failed());
                }
                output.succeeded = true;
            }
            pop => {
                if let Some(kind) = pop.pop_kind() {
                    output.results.push(ctx.stack.pop_operand(kind)?);
                }
            }
        }
    }

    Ok(output)
}
