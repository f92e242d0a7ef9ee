//! Operand representation
//!
//! An [`Operand`] is a tagged value of exactly one kind. Operands only live
//! for the duration of one argument/result exchange with the host.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bridge::engine::{EngineHandle, EngineKind};

/// Identifier of a host object (the actor a script runs on behalf of, items,
/// areas, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The host's conventional "no object" id.
    pub const INVALID: ObjectId = ObjectId(0x7F00_0000);

    /// Create a new object id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Three component vector, transported as three floats.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(
        x: f32,
        y: f32,
        z: f32,
    ) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Kind tag of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Int,
    Float,
    String,
    Object,
    Engine(EngineKind),
}

impl fmt::Display for OperandKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            OperandKind::Int => write!(f, "int"),
            OperandKind::Float => write!(f, "float"),
            OperandKind::String => write!(f, "string"),
            OperandKind::Object => write!(f, "object"),
            OperandKind::Engine(kind) => write!(f, "{}", kind),
        }
    }
}

/// A typed value crossing the script/host boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i32),
    Float(f32),
    String(String),
    Object(ObjectId),
    Engine(EngineHandle),
}

impl Operand {
    /// Get the kind of this operand.
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Int(_) => OperandKind::Int,
            Operand::Float(_) => OperandKind::Float,
            Operand::String(_) => OperandKind::String,
            Operand::Object(_) => OperandKind::Object,
            Operand::Engine(handle) => OperandKind::Engine(handle.kind()),
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Operand::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Operand::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Operand::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Operand::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_engine(&self) -> Option<&EngineHandle> {
        match self {
            Operand::Engine(handle) => Some(handle),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "(int) {}", v),
            Operand::Float(v) => write!(f, "(float) {}", v),
            Operand::String(s) => write!(f, "(string) {:?}", s),
            Operand::Object(id) => write!(f, "(object) {}", id),
            Operand::Engine(handle) => write!(f, "({}) {}", handle.kind(), handle),
        }
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Int(v)
    }
}

impl From<f32> for Operand {
    fn from(v: f32) -> Self {
        Operand::Float(v)
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::String(s)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::String(s.to_string())
    }
}

impl From<ObjectId> for Operand {
    fn from(id: ObjectId) -> Self {
        Operand::Object(id)
    }
}

impl From<EngineHandle> for Operand {
    fn from(handle: EngineHandle) -> Self {
        Operand::Engine(handle)
    }
}

/// Values with a fixed operand kind that travel through the channel by
/// value.
///
/// Engine structure handles are not `ChannelValue`s: their kind is only
/// known at runtime and is supplied explicitly by the caller.
pub trait ChannelValue: Sized {
    /// Operand kind this type maps to.
    const KIND: OperandKind;

    fn into_operand(self) -> Operand;

    /// Unwrap an operand, giving it back unchanged when the kind differs.
    fn from_operand(operand: Operand) -> Result<Self, Operand>;
}

impl ChannelValue for i32 {
    const KIND: OperandKind = OperandKind::Int;

    fn into_operand(self) -> Operand {
        Operand::Int(self)
    }

    fn from_operand(operand: Operand) -> Result<Self, Operand> {
        match operand {
            Operand::Int(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl ChannelValue for f32 {
    const KIND: OperandKind = OperandKind::Float;

    fn into_operand(self) -> Operand {
        Operand::Float(self)
    }

    fn from_operand(operand: Operand) -> Result<Self, Operand> {
        match operand {
            Operand::Float(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl ChannelValue for String {
    const KIND: OperandKind = OperandKind::String;

    fn into_operand(self) -> Operand {
        Operand::String(self)
    }

    fn from_operand(operand: Operand) -> Result<Self, Operand> {
        match operand {
            Operand::String(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl ChannelValue for ObjectId {
    const KIND: OperandKind = OperandKind::Object;

    fn into_operand(self) -> Operand {
        Operand::Object(self)
    }

    fn from_operand(operand: Operand) -> Result<Self, Operand> {
        match operand {
            Operand::Object(id) => Ok(id),
            other => Err(other),
        }
    }
}
