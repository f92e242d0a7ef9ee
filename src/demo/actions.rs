//! Console action host
//!
//! A small action set in the spirit of a script console: printing, string
//! and math helpers, an effect engine structure and `DelayCommand`. Printed
//! text is logged and kept for inspection.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::bridge::action::{ActionDefinition, ActionId, ActionTable, ActionType};
use crate::bridge::engine::{EngineHandle, EngineKind, EngineStructure};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::value::ObjectId;
use crate::host::{ActionContext, ActionHost, SituationScheduler};

/// Action ordinals of the console action set.
pub mod ids {
    use crate::bridge::action::ActionId;

    pub const RANDOM: ActionId = ActionId(0);
    pub const PRINT_STRING: ActionId = ActionId(1);
    pub const PRINT_FLOAT: ActionId = ActionId(2);
    pub const PRINT_INTEGER: ActionId = ActionId(4);
    pub const PRINT_OBJECT: ActionId = ActionId(5);
    pub const DELAY_COMMAND: ActionId = ActionId(7);
    pub const GET_STRING_UPPER_CASE: ActionId = ActionId(60);
    pub const EFFECT_HEAL: ActionId = ActionId(78);
    pub const GET_IS_EFFECT_VALID: ActionId = ActionId(88);
    pub const INT_TO_STRING: ActionId = ActionId(92);
    pub const VECTOR_MAGNITUDE: ActionId = ActionId(104);
    pub const APPLY_EFFECT_TO_OBJECT: ActionId = ActionId(220);
}

pub const DURATION_TYPE_INSTANT: i32 = 0;

/// Signatures of the console action set.
pub fn demo_action_table() -> ActionTable {
    let effect = ActionType::Engine(EngineKind::EFFECT);
    ActionTable::new()
        .with(ActionDefinition::new(0, "Random", ActionType::Int, [ActionType::Int]))
        .with(ActionDefinition::new(1, "PrintString", ActionType::Void, [ActionType::String]))
        .with(
            ActionDefinition::new(
                2,
                "PrintFloat",
                ActionType::Void,
                [ActionType::Float, ActionType::Int, ActionType::Int],
            )
            .with_min_params(1),
        )
        .with(ActionDefinition::new(4, "PrintInteger", ActionType::Void, [ActionType::Int]))
        .with(ActionDefinition::new(5, "PrintObject", ActionType::Void, [ActionType::Object]))
        .with(ActionDefinition::new(
            7,
            "DelayCommand",
            ActionType::Void,
            [ActionType::Float, ActionType::Action],
        ))
        .with(ActionDefinition::new(
            60,
            "GetStringUpperCase",
            ActionType::String,
            [ActionType::String],
        ))
        .with(ActionDefinition::new(78, "EffectHeal", effect, [ActionType::Int]))
        .with(ActionDefinition::new(88, "GetIsEffectValid", ActionType::Int, [effect]))
        .with(ActionDefinition::new(92, "IntToString", ActionType::String, [ActionType::Int]))
        .with(ActionDefinition::new(
            104,
            "VectorMagnitude",
            ActionType::Float,
            [ActionType::Vector],
        ))
        .with(
            ActionDefinition::new(
                220,
                "ApplyEffectToObject",
                ActionType::Void,
                [ActionType::Int, effect, ActionType::Object, ActionType::Float],
            )
            .with_min_params(3),
        )
}

const EFFECT_TYPE_INVALID: u32 = u32::MAX;
const EFFECT_TYPE_HEAL: u32 = 1;

/// Effect engine structure.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoEffect {
    pub effect_type: u32,
    pub amount: i32,
}

impl DemoEffect {
    /// The default instance handed out for uninitialized effect variables.
    pub fn invalid() -> Self {
        Self {
            effect_type: EFFECT_TYPE_INVALID,
            amount: 0,
        }
    }

    pub fn heal(amount: i32) -> Self {
        Self {
            effect_type: EFFECT_TYPE_HEAL,
            amount,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.effect_type != EFFECT_TYPE_INVALID
    }
}

impl fmt::Display for DemoEffect {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.effect_type {
            EFFECT_TYPE_HEAL => write!(f, "heal({})", self.amount),
            EFFECT_TYPE_INVALID => write!(f, "invalid effect"),
            other => write!(f, "effect type {}", other),
        }
    }
}

impl EngineStructure for DemoEffect {
    fn engine_kind(&self) -> EngineKind {
        EngineKind::EFFECT
    }

    /// Effects compare by type only.
    fn compare(
        &self,
        other: &dyn EngineStructure,
    ) -> bool {
        other
            .as_any()
            .downcast_ref::<DemoEffect>()
            .is_some_and(|o| o.effect_type == self.effect_type)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handler for one action ordinal. Returns `false` when the action failed.
pub type ActionHandler =
    fn(&mut ConsoleActions, &mut ActionContext<'_>, usize) -> BridgeResult<bool>;

/// Console action host.
pub struct ConsoleActions {
    handlers: HashMap<ActionId, ActionHandler>,
    scheduler: SituationScheduler,
    rng: StdRng,
    output: Vec<String>,
    applied: Vec<(ObjectId, EngineHandle)>,
    cancel_after: Option<usize>,
    executed: usize,
}

impl fmt::Debug for ConsoleActions {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ConsoleActions")
            .field("handlers_count", &self.handlers.len())
            .field("pending", &self.scheduler.len())
            .field("output", &self.output)
            .field("executed", &self.executed)
            .finish()
    }
}

impl ConsoleActions {
    /// Create the host with every console action registered.
    pub fn new(
        scheduler: SituationScheduler,
        seed: u64,
    ) -> Self {
        let mut actions = Self {
            handlers: HashMap::new(),
            scheduler,
            rng: StdRng::seed_from_u64(seed),
            output: Vec::new(),
            applied: Vec::new(),
            cancel_after: None,
            executed: 0,
        };
        actions.register(ids::RANDOM, random);
        actions.register(ids::PRINT_STRING, print_string);
        actions.register(ids::PRINT_FLOAT, print_float);
        actions.register(ids::PRINT_INTEGER, print_integer);
        actions.register(ids::PRINT_OBJECT, print_object);
        actions.register(ids::DELAY_COMMAND, delay_command);
        actions.register(ids::GET_STRING_UPPER_CASE, get_string_upper_case);
        actions.register(ids::EFFECT_HEAL, effect_heal);
        actions.register(ids::GET_IS_EFFECT_VALID, get_is_effect_valid);
        actions.register(ids::INT_TO_STRING, int_to_string);
        actions.register(ids::VECTOR_MAGNITUDE, vector_magnitude);
        actions.register(ids::APPLY_EFFECT_TO_OBJECT, apply_effect_to_object);
        actions
    }

    /// Register or replace the handler for an ordinal.
    pub fn register(
        &mut self,
        action: ActionId,
        handler: ActionHandler,
    ) {
        self.handlers.insert(action, handler);
    }

    /// Request cancellation once `count` actions have completed.
    pub fn cancel_after(
        mut self,
        count: usize,
    ) -> Self {
        self.cancel_after = Some(count);
        self
    }

    /// Printed lines, oldest first.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Effects applied so far, with their targets.
    pub fn applied(&self) -> &[(ObjectId, EngineHandle)] {
        &self.applied
    }

    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn scheduler(&self) -> &SituationScheduler {
        &self.scheduler
    }

    fn print(
        &mut self,
        line: String,
    ) {
        info!("{}", line);
        self.output.push(line);
    }
}

impl ActionHost for ConsoleActions {
    fn execute_action(
        &mut self,
        ctx: &mut ActionContext<'_>,
        action: ActionId,
        arg_count: usize,
    ) -> BridgeResult<bool> {
        let handler = *self
            .handlers
            .get(&action)
            .ok_or(BridgeError::UnknownAction(action))?;
        let succeeded = handler(self, ctx, arg_count)?;

        self.executed += 1;
        if self.cancel_after.is_some_and(|limit| self.executed >= limit) {
            debug!("cancel requested after {} actions", self.executed);
            ctx.abort_script();
        }
        Ok(succeeded)
    }

    fn create_engine_structure(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        if kind == EngineKind::EFFECT {
            Ok(EngineHandle::new(Arc::new(DemoEffect::invalid())))
        } else {
            Ok(EngineHandle::empty(kind))
        }
    }
}

fn random(
    host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let max = ctx.stack().pop_int()?;
    let value = if max > 0 { host.rng.random_range(0..max) } else { 0 };
    ctx.stack().push_int(value)?;
    Ok(true)
}

fn print_string(
    host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let text = ctx.stack().pop_string()?;
    host.print(text);
    Ok(true)
}

fn print_float(
    host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    arg_count: usize,
) -> BridgeResult<bool> {
    let value = ctx.stack().pop_float()?;
    let width = if arg_count > 1 { ctx.stack().pop_int()? } else { 18 };
    let decimals = if arg_count > 2 { ctx.stack().pop_int()? } else { 9 };
    let width = width.clamp(0, 64) as usize;
    let decimals = decimals.clamp(0, 32) as usize;
    host.print(format!("{:>width$.decimals$}", value, width = width, decimals = decimals));
    Ok(true)
}

fn print_integer(
    host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let value = ctx.stack().pop_int()?;
    host.print(value.to_string());
    Ok(true)
}

fn print_object(
    host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let object = ctx.stack().pop_object()?;
    host.print(object.to_string());
    Ok(true)
}

fn delay_command(
    host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let seconds = ctx.stack().pop_float()?;
    let state = ctx.take_saved_state()?;
    host.scheduler.schedule(seconds, ctx.actor(), state);
    Ok(true)
}

fn get_string_upper_case(
    _host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let text = ctx.stack().pop_string()?;
    ctx.stack().push_string(text.to_uppercase())?;
    Ok(true)
}

fn effect_heal(
    _host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let amount = ctx.stack().pop_int()?;
    let effect = EngineHandle::new(Arc::new(DemoEffect::heal(amount)));
    ctx.stack().push_engine(&effect)?;
    Ok(true)
}

fn get_is_effect_valid(
    _host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let effect = ctx.stack().pop_engine(EngineKind::EFFECT)?;
    let valid = effect
        .downcast_ref::<DemoEffect>()
        .is_some_and(DemoEffect::is_valid);
    ctx.stack().push_int(i32::from(valid))?;
    Ok(true)
}

fn int_to_string(
    _host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let value = ctx.stack().pop_int()?;
    ctx.stack().push_string(value.to_string())?;
    Ok(true)
}

fn vector_magnitude(
    _host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    _arg_count: usize,
) -> BridgeResult<bool> {
    let v = ctx.stack().pop_vector()?;
    ctx.stack()
        .push_float((v.x * v.x + v.y * v.y + v.z * v.z).sqrt())?;
    Ok(true)
}

/// Fails for the invalid object, which aborts the calling script.
fn apply_effect_to_object(
    host: &mut ConsoleActions,
    ctx: &mut ActionContext<'_>,
    arg_count: usize,
) -> BridgeResult<bool> {
    let duration_type = ctx.stack().pop_int()?;
    let effect = ctx.stack().pop_engine(EngineKind::EFFECT)?;
    let target = ctx.stack().pop_object()?;
    let duration = if arg_count > 3 { ctx.stack().pop_float()? } else { 0.0 };

    if target == ObjectId::INVALID {
        return Ok(false);
    }

    let description = effect
        .downcast_ref::<DemoEffect>()
        .map_or_else(|| effect.to_string(), DemoEffect::to_string);
    debug!(
        "apply {} to {} (duration type {}, {:.1}s)",
        description, target, duration_type, duration
    );
    host.print(format!("{} -> {}", description, target));
    host.applied.push((target, effect));
    Ok(true)
}
