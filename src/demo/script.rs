//! Hand-translated sample script
//!
//! ```text
//! int    g_count    = 5;
//! string g_greeting = "hello";
//!
//! void Report(int nBonus)
//! {
//!     PrintString(g_greeting + ": count is " + IntToString(g_count + nBonus));
//! }
//!
//! void main(int nBonus)
//! {
//!     PrintString(GetStringUpperCase(g_greeting));
//!
//!     effect eHeal = EffectHeal(g_count + nBonus);
//!     if (GetIsEffectValid(eHeal))
//!         ApplyEffectToObject(DURATION_TYPE_INSTANT, eHeal, OBJECT_SELF);
//!
//!     DelayCommand(1.5, Report(nBonus));
//!     g_count = 7;
//!
//!     PrintInteger(Random(1) + g_count);
//!     PrintFloat(VectorMagnitude(Vector(3.0, 4.0, 0.0)), 0, 1);
//! }
//! ```
//!
//! Calls with engine structure arguments or results go through the operand
//! channel; everything else uses direct calls.

use crate::bridge::action::ActionReturn;
use crate::bridge::continuation::{GeneratedProgram, ProgramCounter, SituationId};
use crate::bridge::engine::EngineKind;
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::intrinsics::Intrinsics;
use crate::bridge::value::{ObjectId, Operand};
use crate::demo::actions::{ids, DURATION_TYPE_INSTANT};

/// Resume point of `DelayCommand(1.5, Report(nBonus))`.
pub const REPORT_SITUATION: SituationId = SituationId(1);
const REPORT_PC: ProgramCounter = ProgramCounter(0x0000_0064);

/// Translated program state: the script's globals.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoScript {
    pub g_count: i32,
    pub g_greeting: String,
}

impl Default for DemoScript {
    fn default() -> Self {
        Self {
            g_count: 5,
            g_greeting: "hello".to_string(),
        }
    }
}

fn expect_string(ret: ActionReturn) -> BridgeResult<String> {
    match ret {
        ActionReturn::String(s) => Ok(s),
        other => Err(BridgeError::Script(format!("expected a string result, got {:?}", other))),
    }
}

fn expect_int(ret: &ActionReturn) -> BridgeResult<i32> {
    ret.as_int()
        .ok_or_else(|| BridgeError::Script(format!("expected an int result, got {:?}", ret)))
}

fn expect_float(ret: &ActionReturn) -> BridgeResult<f32> {
    ret.as_float()
        .ok_or_else(|| BridgeError::Script(format!("expected a float result, got {:?}", ret)))
}

impl DemoScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Globals in declaration order.
    pub fn globals(&self) -> Vec<Operand> {
        vec![
            Operand::Int(self.g_count),
            Operand::String(self.g_greeting.clone()),
        ]
    }

    fn main(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        actor: ObjectId,
        n_bonus: i32,
    ) -> BridgeResult<()> {
        let upper = bridge.execute_action_fast(
            ids::GET_STRING_UPPER_CASE,
            1,
            &[Operand::from(self.g_greeting.as_str())],
        )?;
        bridge.execute_action_fast(ids::PRINT_STRING, 1, &upper.into_operands())?;

        bridge.push_int(self.g_count + n_bonus)?;
        bridge.execute_action(ids::EFFECT_HEAL, 1)?;
        let mut heal = bridge.pop_engine(EngineKind::EFFECT)?;

        bridge.push_engine(EngineKind::EFFECT, &heal)?;
        bridge.execute_action(ids::GET_IS_EFFECT_VALID, 1)?;
        if bridge.pop_int()? != 0 {
            bridge.push_object(actor)?;
            bridge.push_engine(EngineKind::EFFECT, &heal)?;
            bridge.push_int(DURATION_TYPE_INSTANT)?;
            bridge.execute_action(ids::APPLY_EFFECT_TO_OBJECT, 3)?;
        }
        bridge.release_engine(&mut heal);

        bridge.store_state(
            None,
            vec![Operand::Int(n_bonus)],
            REPORT_PC,
            REPORT_SITUATION,
            self.clone_program(),
        )?;
        bridge.push_float(1.5)?;
        bridge.execute_action(ids::DELAY_COMMAND, 2)?;
        self.g_count = 7;

        let roll = bridge.execute_action_fast(ids::RANDOM, 1, &[Operand::Int(1)])?;
        let total = expect_int(&roll)? + self.g_count;
        bridge.execute_action_fast(ids::PRINT_INTEGER, 1, &[Operand::Int(total)])?;

        let magnitude = bridge.execute_action_fast(
            ids::VECTOR_MAGNITUDE,
            1,
            &[Operand::Float(3.0), Operand::Float(4.0), Operand::Float(0.0)],
        )?;
        bridge.execute_action_fast(
            ids::PRINT_FLOAT,
            3,
            &[
                Operand::Float(expect_float(&magnitude)?),
                Operand::Int(0),
                Operand::Int(1),
            ],
        )?;
        Ok(())
    }

    fn report(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        n_bonus: i32,
    ) -> BridgeResult<()> {
        let count = bridge.execute_action_fast(
            ids::INT_TO_STRING,
            1,
            &[Operand::Int(self.g_count + n_bonus)],
        )?;
        let line = format!("{}: count is {}", self.g_greeting, expect_string(count)?);
        bridge.push_string(&line)?;
        bridge.execute_action(ids::PRINT_STRING, 1)
    }
}

impl GeneratedProgram for DemoScript {
    fn execute_script(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        actor: ObjectId,
        params: Vec<Operand>,
        default_return_code: i32,
    ) -> BridgeResult<i32> {
        let n_bonus = params.first().and_then(Operand::as_int).unwrap_or(0);
        self.main(bridge, actor, n_bonus)?;
        Ok(default_return_code)
    }

    fn execute_script_situation(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        situation: SituationId,
        locals: Vec<Operand>,
        _actor: ObjectId,
    ) -> BridgeResult<()> {
        match (situation, locals.as_slice()) {
            (REPORT_SITUATION, [Operand::Int(n_bonus)]) => self.report(bridge, *n_bonus),
            (REPORT_SITUATION, _) => Err(BridgeError::Script(format!(
                "Report expects one int local, got {}",
                locals.len()
            ))),
            (other, _) => Err(BridgeError::UnknownSituation(other)),
        }
    }

    fn clone_program(&self) -> Box<dyn GeneratedProgram> {
        Box::new(self.clone())
    }

    fn load_globals(
        &mut self,
        globals: Vec<Operand>,
    ) -> BridgeResult<()> {
        match globals.as_slice() {
            [Operand::Int(count), Operand::String(greeting)] => {
                self.g_count = *count;
                self.g_greeting = greeting.clone();
                Ok(())
            }
            _ => Err(BridgeError::Script(format!(
                "expected (int, string) globals, got {} values",
                globals.len()
            ))),
        }
    }
}
