//! Saved state images on an operand channel
//!
//! A saved state can be laid out on a channel as globals, a zero base
//! pointer marker and locals, each block pushed in reverse so it pops back
//! in order. The header carries what the channel itself cannot.

use serde::{Deserialize, Serialize};

use crate::bridge::channel::OperandChannel;
use crate::bridge::continuation::{ProgramCounter, SavedState, SituationId};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::value::{ObjectId, Operand};

/// Metadata of a saved state image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedStateHeader {
    pub situation: SituationId,
    pub resume_pc: ProgramCounter,
    pub global_count: usize,
    pub local_count: usize,
    pub actor: ObjectId,
}

/// Push variables so that `vars[0]` ends up on top.
pub fn push_variables(
    channel: &mut OperandChannel,
    vars: &[Operand],
) -> BridgeResult<()> {
    for var in vars.iter().rev() {
        channel.push_operand(var.clone())?;
    }
    Ok(())
}

/// Pop `count` variables of whatever kind is on top.
pub fn pop_variables(
    channel: &mut OperandChannel,
    count: usize,
) -> BridgeResult<Vec<Operand>> {
    let mut vars = Vec::with_capacity(count);
    for popped in 0..count {
        let var = channel.pop_any().ok_or(BridgeError::TruncatedStateImage {
            missing: count - popped,
        })?;
        vars.push(var);
    }
    Ok(vars)
}

/// Lay a saved state out on the channel.
pub fn push_state(
    channel: &mut OperandChannel,
    state: &SavedState,
) -> BridgeResult<SavedStateHeader> {
    if let Some(globals) = state.globals() {
        push_variables(channel, globals)?;
    }
    // Saved base pointer; nothing reads it back.
    channel.push_int(0)?;
    push_variables(channel, state.locals())?;
    Ok(state.header())
}

/// Take an image back off the channel as `(globals, locals)`.
pub fn pop_state(
    channel: &mut OperandChannel,
    header: &SavedStateHeader,
) -> BridgeResult<(Option<Vec<Operand>>, Vec<Operand>)> {
    let locals = pop_variables(channel, header.local_count)?;
    channel.pop_int()?;
    let globals = if header.global_count > 0 {
        Some(pop_variables(channel, header.global_count)?)
    } else {
        None
    };
    Ok((globals, locals))
}
