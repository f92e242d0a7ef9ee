//! Engine structure registry
//!
//! Holds the kinds a host declares and validates every engine structure
//! operation against them before the host is consulted. The declared kind
//! supplied by translated code must match the kind stored in the handle.

use std::borrow::Cow;

use tracing::trace;

use crate::bridge::engine::{EngineHandle, EngineKind, MAX_ENGINE_KINDS};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::host::HostProgram;
use crate::bridge::value::{Operand, OperandKind};

const KIND_SLOTS: usize = MAX_ENGINE_KINDS as usize;

/// Declared engine structure kinds.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    names: [Option<Cow<'static, str>>; KIND_SLOTS],
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five standard kinds (effect, event, location,
    /// talent, itemproperty).
    pub fn with_standard_kinds() -> Self {
        Self::new()
            .declare(EngineKind::EFFECT, "effect")
            .declare(EngineKind::EVENT, "event")
            .declare(EngineKind::LOCATION, "location")
            .declare(EngineKind::TALENT, "talent")
            .declare(EngineKind::ITEM_PROPERTY, "itemproperty")
    }

    /// Declare a kind under a name. Redeclaring renames it.
    pub fn declare(
        mut self,
        kind: EngineKind,
        name: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.names[kind.index() as usize] = Some(name.into());
        self
    }

    pub fn is_declared(
        &self,
        kind: EngineKind,
    ) -> bool {
        self.names[kind.index() as usize].is_some()
    }

    pub fn name(
        &self,
        kind: EngineKind,
    ) -> Option<&str> {
        self.names[kind.index() as usize].as_deref()
    }

    /// Declared kinds in index order.
    pub fn declared(&self) -> impl Iterator<Item = (EngineKind, &str)> + '_ {
        EngineKind::all().filter_map(move |kind| self.name(kind).map(|name| (kind, name)))
    }

    pub fn len(&self) -> usize {
        self.names.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail unless the kind is declared.
    pub fn validate(
        &self,
        kind: EngineKind,
    ) -> BridgeResult<EngineKind> {
        if self.is_declared(kind) {
            Ok(kind)
        } else {
            Err(BridgeError::UndeclaredEngineKind(kind))
        }
    }

    fn check_handle(
        &self,
        kind: EngineKind,
        handle: &EngineHandle,
    ) -> BridgeResult<()> {
        self.validate(kind)?;
        handle.ensure_kind(kind)
    }

    /// Push a handle onto the host's operand channel. The channel receives
    /// its own reference; the caller's handle stays valid.
    pub fn push(
        &self,
        host: &mut dyn HostProgram,
        kind: EngineKind,
        handle: &EngineHandle,
    ) -> BridgeResult<()> {
        self.check_handle(kind, handle)?;
        host.push_operand(Operand::Engine(handle.clone()))
    }

    /// Pop a handle of the given kind from the host's operand channel.
    pub fn pop(
        &self,
        host: &mut dyn HostProgram,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        self.validate(kind)?;
        match host.pop_operand(OperandKind::Engine(kind))? {
            Operand::Engine(handle) => {
                handle.ensure_kind(kind)?;
                Ok(handle)
            }
            other => Err(BridgeError::TypeMismatch {
                expected: OperandKind::Engine(kind),
                found: other.kind(),
            }),
        }
    }

    /// Compare two handles of the given kind. Both handles must carry that
    /// kind; the comparison itself is delegated to the host.
    pub fn compare(
        &self,
        host: &mut dyn HostProgram,
        kind: EngineKind,
        a: &EngineHandle,
        b: &EngineHandle,
    ) -> BridgeResult<bool> {
        self.check_handle(kind, a)?;
        self.check_handle(kind, b)?;
        host.compare_engine_structures(a, b)
    }

    /// Ask the host for a default instance of the given kind.
    pub fn create(
        &self,
        host: &mut dyn HostProgram,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        self.validate(kind)?;
        let handle = host.create_engine_structure(kind)?;
        handle.ensure_kind(kind)?;
        trace!("engine create: {} ({})", kind, self.name(kind).unwrap_or("?"));
        Ok(handle)
    }

    /// Release a handle. Releasing an empty handle is a no-op.
    pub fn release(
        &self,
        handle: &mut EngineHandle,
    ) -> bool {
        handle.release()
    }
}
