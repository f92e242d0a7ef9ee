//! Direct-argument action calls
//!
//! A direct call is compiled into a flat command list: push every argument
//! in reverse declared order, call, then pop the result. Replaying that list
//! against a channel produces exactly the traffic of an explicit-stack call.

use smallvec::{smallvec, SmallVec};

use crate::bridge::action::{ActionDefinition, ActionReturn, ActionType};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::neutral::NeutralStringStorage;
use crate::bridge::value::{ObjectId, Operand, OperandKind, Vector3};

/// One step of a direct-argument call.
#[derive(Debug, Clone, PartialEq)]
pub enum FastActionCmd {
    PushInt(i32),
    PushFloat(f32),
    PushObject(ObjectId),
    PushString(NeutralStringStorage),
    Call,
    PopInt,
    PopFloat,
    PopObject,
    PopString,
}

impl FastActionCmd {
    /// Kind popped by a pop command.
    pub fn pop_kind(&self) -> Option<OperandKind> {
        match self {
            FastActionCmd::PopInt => Some(OperandKind::Int),
            FastActionCmd::PopFloat => Some(OperandKind::Float),
            FastActionCmd::PopObject => Some(OperandKind::Object),
            FastActionCmd::PopString => Some(OperandKind::String),
            _ => None,
        }
    }
}

/// Outcome of replaying a command list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FastActionOutput {
    pub succeeded: bool,
    /// Operands in pop order.
    pub results: SmallVec<[Operand; 3]>,
}

impl FastActionOutput {
    pub fn failed() -> Self {
        Self::default()
    }
}

fn signature_error(
    definition: &ActionDefinition,
    message: String,
) -> BridgeError {
    BridgeError::ActionSignature {
        action: definition.id,
        message,
    }
}

/// Compile a direct call into commands.
///
/// `args` are in declared order, a vector taking three consecutive floats
/// (x, y, z) and action-typed parameters taking none. Strings are handed to
/// `allocate`; the caller owns every storage it returns and must release
/// them after the call, including when this function fails part way.
pub fn build_commands(
    definition: &ActionDefinition,
    arg_count: usize,
    args: &[Operand],
    mut allocate: impl FnMut(&str) -> BridgeResult<NeutralStringStorage>,
) -> BridgeResult<Vec<FastActionCmd>> {
    definition.check_arg_count(arg_count)?;

    let pops: SmallVec<[FastActionCmd; 3]> = match definition.return_type {
        ActionType::Void => SmallVec::new(),
        ActionType::Int => smallvec![FastActionCmd::PopInt],
        ActionType::Float => smallvec![FastActionCmd::PopFloat],
        ActionType::String => smallvec![FastActionCmd::PopString],
        ActionType::Object => smallvec![FastActionCmd::PopObject],
        ActionType::Vector => smallvec![
            FastActionCmd::PopFloat,
            FastActionCmd::PopFloat,
            FastActionCmd::PopFloat
        ],
        other => {
            return Err(signature_error(
                definition,
                format!("unsupported return type {} for a direct call", other),
            ))
        }
    };

    // Push groups in declared order; emitted reversed below.
    let mut groups: Vec<SmallVec<[FastActionCmd; 3]>> = Vec::with_capacity(arg_count);
    let mut param = 0;
    let mut n = 0;

    while n < args.len() {
        let ty = *definition.params.get(param).ok_or_else(|| {
            signature_error(definition, format!("too many arguments ({})", args.len()))
        })?;
        param += 1;

        let group: SmallVec<[FastActionCmd; 3]> = match (ty, args.get(n)) {
            (ActionType::Action, _) => continue,
            (ActionType::Int, Some(Operand::Int(v))) => smallvec![FastActionCmd::PushInt(*v)],
            (ActionType::Float, Some(Operand::Float(v))) => {
                smallvec![FastActionCmd::PushFloat(*v)]
            }
            (ActionType::Object, Some(Operand::Object(id))) => {
                smallvec![FastActionCmd::PushObject(*id)]
            }
            (ActionType::String, Some(Operand::String(s))) => {
                smallvec![FastActionCmd::PushString(allocate(s)?)]
            }
            (ActionType::Vector, _) => {
                let mut group = SmallVec::new();
                for i in 0..3 {
                    match args.get(n + i) {
                        Some(Operand::Float(v)) => group.push(FastActionCmd::PushFloat(*v)),
                        _ => {
                            return Err(signature_error(
                                definition,
                                format!("partial vector at argument {}", n),
                            ))
                        }
                    }
                }
                group
            }
            (ActionType::Engine(kind), _) => {
                return Err(signature_error(
                    definition,
                    format!("{} parameters are not allowed in a direct call", kind),
                ))
            }
            (ActionType::Void, _) => {
                return Err(signature_error(
                    definition,
                    format!("illegal void parameter #{}", param - 1),
                ))
            }
            (expected, found) => {
                return Err(signature_error(
                    definition,
                    format!(
                        "argument {} is {}, expected {}",
                        n,
                        found.map_or_else(|| "missing".to_string(), |o| o.kind().to_string()),
                        expected
                    ),
                ))
            }
        };

        n += ty.width();
        groups.push(group);
    }

    // Trailing action parameters are counted but carry nothing.
    while param < arg_count && definition.params[param] == ActionType::Action {
        param += 1;
    }
    if param != arg_count {
        return Err(signature_error(
            definition,
            format!(
                "{} arguments supplied for argument count {}",
                param, arg_count
            ),
        ));
    }

    let mut commands: Vec<FastActionCmd> = groups.into_iter().rev().flatten().collect();
    commands.push(FastActionCmd::Call);
    commands.extend(pops);
    Ok(commands)
}

/// Assemble the return value from operands in pop order.
pub fn collect_return(
    definition: &ActionDefinition,
    results: SmallVec<[Operand; 3]>,
) -> BridgeResult<ActionReturn> {
    let mismatch = |found: Option<&Operand>| {
        signature_error(
            definition,
            format!(
                "returned {}, expected {}",
                found.map_or_else(|| "nothing".to_string(), |o| o.kind().to_string()),
                definition.return_type
            ),
        )
    };

    let mut it = results.into_iter();
    let value = match (definition.return_type, it.next()) {
        (ActionType::Void, None) => ActionReturn::Void,
        (ActionType::Int, Some(Operand::Int(v))) => ActionReturn::Int(v),
        (ActionType::Float, Some(Operand::Float(v))) => ActionReturn::Float(v),
        (ActionType::String, Some(Operand::String(s))) => ActionReturn::String(s),
        (ActionType::Object, Some(Operand::Object(id))) => ActionReturn::Object(id),
        (ActionType::Vector, Some(Operand::Float(z))) => match (it.next(), it.next()) {
            (Some(Operand::Float(y)), Some(Operand::Float(x))) => {
                ActionReturn::Vector(Vector3 { x, y, z })
            }
            (other, _) => return Err(mismatch(other.as_ref())),
        },
        (_, other) => return Err(mismatch(other.as_ref())),
    };

    match it.next() {
        None => Ok(value),
        Some(extra) => Err(mismatch(Some(&extra))),
    }
}
