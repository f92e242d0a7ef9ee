//! Continuations
//!
//! Translated code suspends by handing the host a [`StateCapture`]: the live
//! locals, an optional globals snapshot, the resume address and situation,
//! and a clone of the program object. The clone freezes the globals as they
//! were at the suspend point, so later mutation of the live program cannot
//! reach a stored continuation. The host later resumes by running the
//! situation on that clone.

pub mod image;
pub use image::SavedStateHeader;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bridge::error::BridgeResult;
use crate::bridge::intrinsics::Intrinsics;
use crate::bridge::value::{ObjectId, Operand};

/// Fast-resume identifier of a script situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SituationId(pub u32);

impl fmt::Display for SituationId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resume address inside the original bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramCounter(pub u32);

impl fmt::Display for ProgramCounter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Interface implemented by translated script programs and driven by the
/// host.
pub trait GeneratedProgram: Send {
    /// Run the entry point and return its result, or `default_return_code`
    /// when the entry point returns nothing.
    fn execute_script(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        actor: ObjectId,
        params: Vec<Operand>,
        default_return_code: i32,
    ) -> BridgeResult<i32>;

    /// Resume at a previously captured situation, with `locals` as the
    /// resume entry point's parameters.
    fn execute_script_situation(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        situation: SituationId,
        locals: Vec<Operand>,
        actor: ObjectId,
    ) -> BridgeResult<()>;

    /// Deep copy, including the current globals.
    fn clone_program(&self) -> Box<dyn GeneratedProgram>;

    /// Replace the globals.
    fn load_globals(
        &mut self,
        globals: Vec<Operand>,
    ) -> BridgeResult<()>;
}

/// What translated code hands over at a suspend point.
pub struct StateCapture {
    /// `None` means the globals are carried by `program` unchanged.
    pub globals: Option<Vec<Operand>>,
    pub locals: Vec<Operand>,
    pub resume_pc: ProgramCounter,
    pub situation: SituationId,
    pub program: Box<dyn GeneratedProgram>,
}

impl fmt::Debug for StateCapture {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("StateCapture")
            .field("globals", &self.globals)
            .field("locals", &self.locals)
            .field("resume_pc", &self.resume_pc)
            .field("situation", &self.situation)
            .finish_non_exhaustive()
    }
}

/// A stored continuation. Immutable once created and consumed exactly once
/// by [`execute_script_situation`](GeneratedProgram::execute_script_situation).
pub struct SavedState {
    globals: Option<Vec<Operand>>,
    locals: Vec<Operand>,
    resume_pc: ProgramCounter,
    situation: SituationId,
    program: Box<dyn GeneratedProgram>,
    actor: ObjectId,
}

impl SavedState {
    /// Record a capture made while running on behalf of `actor`.
    pub fn from_capture(
        capture: StateCapture,
        actor: ObjectId,
    ) -> Self {
        Self {
            globals: capture.globals,
            locals: capture.locals,
            resume_pc: capture.resume_pc,
            situation: capture.situation,
            program: capture.program,
            actor,
        }
    }

    pub fn globals(&self) -> Option<&[Operand]> {
        self.globals.as_deref()
    }

    pub fn locals(&self) -> &[Operand] {
        &self.locals
    }

    pub fn resume_pc(&self) -> ProgramCounter {
        self.resume_pc
    }

    pub fn situation(&self) -> SituationId {
        self.situation
    }

    /// Actor the script was running on behalf of when it suspended.
    pub fn actor(&self) -> ObjectId {
        self.actor
    }

    /// Independent copy with its own program clone.
    pub fn duplicate(&self) -> Self {
        Self {
            globals: self.globals.clone(),
            locals: self.locals.clone(),
            resume_pc: self.resume_pc,
            situation: self.situation,
            program: self.program.clone_program(),
            actor: self.actor,
        }
    }

    pub fn header(&self) -> SavedStateHeader {
        SavedStateHeader {
            situation: self.situation,
            resume_pc: self.resume_pc,
            global_count: self.globals.as_ref().map_or(0, Vec::len),
            local_count: self.locals.len(),
            actor: self.actor,
        }
    }

    /// Split into the program clone, the situation and the resume locals.
    pub fn into_resume(self) -> (Box<dyn GeneratedProgram>, SituationId, Vec<Operand>) {
        (self.program, self.situation, self.locals)
    }
}

impl fmt::Debug for SavedState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SavedState")
            .field("situation", &self.situation)
            .field("resume_pc", &self.resume_pc)
            .field("actor", &self.actor)
            .field("globals", &self.globals)
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}
