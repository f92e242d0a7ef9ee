//! Operand channel
//!
//! A strictly typed LIFO used to pass action arguments and results. A pop
//! must name the kind it expects; disagreement or emptiness is an error and
//! leaves the channel unchanged. Nothing is ever coerced.

use smallvec::SmallVec;
use tracing::trace;

use crate::bridge::engine::{EngineHandle, EngineKind};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::value::{ChannelValue, ObjectId, Operand, OperandKind, Vector3};

/// Default maximum number of operands held at once.
pub const DEFAULT_CHANNEL_DEPTH: usize = 4096;

/// Typed operand stack owned by one script instance.
#[derive(Debug, Clone)]
pub struct OperandChannel {
    slots: SmallVec<[Operand; 16]>,
    max_depth: usize,
    verbose: bool,
}

impl Default for OperandChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl OperandChannel {
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_CHANNEL_DEPTH)
    }

    /// Create a channel that refuses to hold more than `max_depth` operands.
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            slots: SmallVec::new(),
            max_depth,
            verbose: false,
        }
    }

    /// Trace every push and pop.
    pub fn set_verbose(
        &mut self,
        verbose: bool,
    ) {
        self.verbose = verbose;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Kind of the operand that the next pop would return.
    pub fn peek_kind(&self) -> Option<OperandKind> {
        self.slots.last().map(Operand::kind)
    }

    /// Drop every operand, releasing any engine handles held.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Push an operand of any kind.
    pub fn push_operand(
        &mut self,
        operand: Operand,
    ) -> BridgeResult<()> {
        if self.slots.len() >= self.max_depth {
            return Err(BridgeError::AllocationFailure {
                what: "operand channel slot",
                requested: self.slots.len() + 1,
                limit: self.max_depth,
            });
        }
        if self.verbose {
            trace!("VMPUSH: {}", operand);
        }
        self.slots.push(operand);
        Ok(())
    }

    /// Pop the top operand, which must be of the requested kind.
    pub fn pop_operand(
        &mut self,
        expected: OperandKind,
    ) -> BridgeResult<Operand> {
        let found = self
            .peek_kind()
            .ok_or(BridgeError::Underflow { expected })?;
        if found != expected {
            return Err(match (expected, found) {
                (OperandKind::Engine(expected), OperandKind::Engine(found)) => {
                    BridgeError::HandleKindMismatch { expected, found }
                }
                _ => BridgeError::TypeMismatch { expected, found },
            });
        }
        let operand = self.slots.pop().ok_or(BridgeError::Underflow { expected })?;
        if self.verbose {
            trace!("VMPOP: {}", operand);
        }
        Ok(operand)
    }

    /// Pop the top operand whatever its kind.
    pub fn pop_any(&mut self) -> Option<Operand> {
        self.slots.pop()
    }

    pub fn push<T: ChannelValue>(
        &mut self,
        value: T,
    ) -> BridgeResult<()> {
        self.push_operand(value.into_operand())
    }

    pub fn pop<T: ChannelValue>(&mut self) -> BridgeResult<T> {
        let operand = self.pop_operand(T::KIND)?;
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
        value: impl Into<String>,
    ) -> BridgeResult<()> {
        self.push(value.into())
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

    /// Push an engine handle. The channel holds its own reference.
    pub fn push_engine(
        &mut self,
        handle: &EngineHandle,
    ) -> BridgeResult<()> {
        self.push_operand(Operand::Engine(handle.clone()))
    }

    pub fn pop_engine(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        match self.pop_operand(OperandKind::Engine(kind))? {
            Operand::Engine(handle) => Ok(handle),
            other => Err(BridgeError::TypeMismatch {
                expected: OperandKind::Engine(kind),
                found: other.kind(),
            }),
        }
    }

    /// Push a vector as x, y, z.
    pub fn push_vector(
        &mut self,
        v: Vector3,
    ) -> BridgeResult<()> {
        self.push_float(v.x)?;
        self.push_float(v.y)?;
        self.push_float(v.z)
    }

    /// Pop a vector pushed by [`push_vector`](Self::push_vector).
    pub fn pop_vector(&mut self) -> BridgeResult<Vector3> {
        let z = self.pop_float()?;
        let y = self.pop_float()?;
        let x = self.pop_float()?;
        Ok(Vector3 { x, y, z })
    }

    /// Operands from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Operand> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests;
