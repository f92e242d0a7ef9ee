//! Action services
//!
//! Actions are host functions invoked by ordinal. Their signatures live in an
//! [`ActionTable`]; the direct-argument calling convention in [`fast`] uses
//! them to turn an argument slice into the same channel traffic the
//! explicit-stack convention produces.

pub mod fast;
pub use fast::{FastActionCmd, FastActionOutput};

use std::borrow::Cow;
use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::bridge::engine::EngineKind;
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::value::{ObjectId, Operand, OperandKind, Vector3};

/// Ordinal of an action service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameter and return types of action services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Void,
    Int,
    Float,
    String,
    Object,
    Vector,
    /// Deferred script code; carried as saved state, never on the channel.
    Action,
    Engine(EngineKind),
}

impl ActionType {
    /// Operand kind of a single-slot type.
    pub fn operand_kind(self) -> Option<OperandKind> {
        match self {
            ActionType::Int => Some(OperandKind::Int),
            ActionType::Float => Some(OperandKind::Float),
            ActionType::String => Some(OperandKind::String),
            ActionType::Object => Some(OperandKind::Object),
            ActionType::Engine(kind) => Some(OperandKind::Engine(kind)),
            ActionType::Void | ActionType::Vector | ActionType::Action => None,
        }
    }

    /// Number of channel slots a value of this type occupies.
    pub fn width(self) -> usize {
        match self {
            ActionType::Void | ActionType::Action => 0,
            ActionType::Vector => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ActionType::Void => write!(f, "void"),
            ActionType::Int => write!(f, "int"),
            ActionType::Float => write!(f, "float"),
            ActionType::String => write!(f, "string"),
            ActionType::Object => write!(f, "object"),
            ActionType::Vector => write!(f, "vector"),
            ActionType::Action => write!(f, "action"),
            ActionType::Engine(kind) => write!(f, "{}", kind),
        }
    }
}

/// Signature of one action service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: ActionId,
    pub name: Cow<'static, str>,
    pub return_type: ActionType,
    pub params: Vec<ActionType>,
    /// Parameters without defaults.
    pub min_params: usize,
}

impl ActionDefinition {
    pub fn new(
        id: u32,
        name: impl Into<Cow<'static, str>>,
        return_type: ActionType,
        params: impl Into<Vec<ActionType>>,
    ) -> Self {
        let params = params.into();
        Self {
            id: ActionId(id),
            name: name.into(),
            return_type,
            min_params: params.len(),
            params,
        }
    }

    /// Allow trailing parameters to be omitted.
    pub fn with_min_params(
        mut self,
        min_params: usize,
    ) -> Self {
        self.min_params = min_params.min(self.params.len());
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Fail unless `arg_count` is a legal argument count.
    pub fn check_arg_count(
        &self,
        arg_count: usize,
    ) -> BridgeResult<()> {
        if arg_count < self.min_params || arg_count > self.params.len() {
            return Err(BridgeError::ActionSignature {
                action: self.id,
                message: format!(
                    "{} takes {}..={} arguments, {} supplied",
                    self.name,
                    self.min_params,
                    self.params.len(),
                    arg_count
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ActionDefinition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if i >= self.min_params {
                write!(f, "[{}]", param)?;
            } else {
                write!(f, "{}", param)?;
            }
        }
        write!(f, ")")
    }
}

/// Action signatures known to a host.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    definitions: HashMap<ActionId, ActionDefinition>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, replacing one with the same ordinal.
    pub fn insert(
        &mut self,
        definition: ActionDefinition,
    ) -> Option<ActionDefinition> {
        self.definitions.insert(definition.id, definition)
    }

    pub fn with(
        mut self,
        definition: ActionDefinition,
    ) -> Self {
        self.insert(definition);
        self
    }

    pub fn get(
        &self,
        action: ActionId,
    ) -> BridgeResult<&ActionDefinition> {
        self.definitions
            .get(&action)
            .ok_or(BridgeError::UnknownAction(action))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions ordered by ordinal.
    pub fn sorted(&self) -> Vec<&ActionDefinition> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by_key(|d| d.id);
        defs
    }
}

/// Result of a direct-argument action call.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionReturn {
    Void,
    Int(i32),
    Float(f32),
    String(String),
    Object(ObjectId),
    Vector(Vector3),
}

impl ActionReturn {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ActionReturn::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            ActionReturn::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ActionReturn::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            ActionReturn::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vector3> {
        match self {
            ActionReturn::Vector(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to the operands an explicit-stack caller would have popped.
    pub fn into_operands(self) -> Vec<Operand> {
        match self {
            ActionReturn::Void => Vec::new(),
            ActionReturn::Int(v) => vec![Operand::Int(v)],
            ActionReturn::Float(v) => vec![Operand::Float(v)],
            ActionReturn::String(s) => vec![Operand::String(s)],
            ActionReturn::Object(id) => vec![Operand::Object(id)],
            ActionReturn::Vector(v) => {
                vec![Operand::Float(v.x), Operand::Float(v.y), Operand::Float(v.z)]
            }
        }
    }
}

#[cfg(test)]
mod tests;
