//! Engine structures
//!
//! Engine structures are opaque, host-owned resources tagged with one of at
//! most [`MAX_ENGINE_KINDS`] kinds (effects, events, locations, ...). The host
//! allocates them and is the only party that frees the underlying resource.
//! Scripts hold them through [`EngineHandle`], which drops its reference
//! exactly once, whether released explicitly or on scope exit.

pub mod registry;
pub use registry::EngineRegistry;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bridge::error::{BridgeError, BridgeResult};

/// Number of engine structure kinds the bridge can carry.
pub const MAX_ENGINE_KINDS: u8 = 10;

/// Kind tag of an engine structure, always in `[0, MAX_ENGINE_KINDS)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EngineKind(u8);

impl EngineKind {
    pub const EFFECT: EngineKind = EngineKind(0);
    pub const EVENT: EngineKind = EngineKind(1);
    pub const LOCATION: EngineKind = EngineKind(2);
    pub const TALENT: EngineKind = EngineKind(3);
    pub const ITEM_PROPERTY: EngineKind = EngineKind(4);

    /// Create a kind tag, rejecting indices outside the supported range.
    pub fn new(index: u8) -> BridgeResult<Self> {
        if index < MAX_ENGINE_KINDS {
            Ok(Self(index))
        } else {
            Err(BridgeError::InvalidEngineKind(index))
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Iterate over every supported kind.
    pub fn all() -> impl Iterator<Item = EngineKind> {
        (0..MAX_ENGINE_KINDS).map(EngineKind)
    }
}

impl TryFrom<u8> for EngineKind {
    type Error = BridgeError;

    fn try_from(index: u8) -> BridgeResult<Self> {
        EngineKind::new(index)
    }
}

impl From<EngineKind> for u8 {
    fn from(kind: EngineKind) -> u8 {
        kind.0
    }
}

impl fmt::Display for EngineKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "engine{}", self.0)
    }
}

/// A host-defined engine structure.
///
/// Equality between two structures is host policy; the bridge only ever
/// asks for it between structures of the same kind.
pub trait EngineStructure: fmt::Debug + Send + Sync {
    /// Kind this structure was created as.
    fn engine_kind(&self) -> EngineKind;

    /// Compare against another structure of the same kind.
    fn compare(
        &self,
        other: &dyn EngineStructure,
    ) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Shared reference to a host engine structure.
pub type EngineStructureRef = Arc<dyn EngineStructure>;

/// Script-side handle to an engine structure.
///
/// The kind is fixed at creation. A handle may be empty (never assigned or
/// already released). Cloning acquires an independent reference; each holder
/// releases only its own.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    kind: EngineKind,
    structure: Option<EngineStructureRef>,
}

impl EngineHandle {
    /// Wrap a structure, taking the kind from the structure itself.
    pub fn new(structure: EngineStructureRef) -> Self {
        Self {
            kind: structure.engine_kind(),
            structure: Some(structure),
        }
    }

    /// Wrap a structure under an explicitly declared kind.
    pub fn with_kind(
        kind: EngineKind,
        structure: EngineStructureRef,
    ) -> BridgeResult<Self> {
        let found = structure.engine_kind();
        if found != kind {
            return Err(BridgeError::HandleKindMismatch {
                expected: kind,
                found,
            });
        }
        Ok(Self {
            kind,
            structure: Some(structure),
        })
    }

    /// An empty handle of the given kind.
    pub fn empty(kind: EngineKind) -> Self {
        Self {
            kind,
            structure: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.structure.is_none()
    }

    pub fn structure(&self) -> Option<&EngineStructureRef> {
        self.structure.as_ref()
    }

    /// Borrow the structure as its concrete host type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.structure
            .as_deref()
            .and_then(|s| s.as_any().downcast_ref::<T>())
    }

    /// Fail unless the handle carries the expected kind.
    pub fn ensure_kind(
        &self,
        expected: EngineKind,
    ) -> BridgeResult<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(BridgeError::HandleKindMismatch {
                expected,
                found: self.kind,
            })
        }
    }

    /// Drop this handle's reference to the structure.
    ///
    /// Returns `false` when the handle was already empty, in which case
    /// nothing happens.
    pub fn release(&mut self) -> bool {
        match self.structure.take() {
            Some(structure) => {
                trace!("engine release: {} ({:?})", self.kind, structure);
                drop(structure);
                true
            }
            None => false,
        }
    }

    /// Release and consume the handle.
    pub fn dispose(mut self) {
        self.release();
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl PartialEq for EngineHandle {
    /// Identity: same kind and the same underlying structure, or both empty.
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match (&self.structure, &other.structure) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
            _ => false,
        }
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.structure {
            Some(structure) => write!(f, "{:?}", structure),
            None => write!(f, "<empty>"),
        }
    }
}
