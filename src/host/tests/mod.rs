//! Host runtime tests


use std::any::Any;
use std::sync::Arc;

use crate::bridge::abort::AbortReason;
use crate::bridge::action::{ActionDefinition, ActionId, ActionReturn, ActionTable, ActionType};
use crate::bridge::continuation::{GeneratedProgram, SavedState, SituationId};
use crate::bridge::engine::{EngineHandle, EngineKind, EngineStructure};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::intrinsics::Intrinsics;
use crate::bridge::value::{ObjectId, Operand, Vector3};
use crate::host::{ActionContext, ActionHost, ScriptRuntime};
use crate::util::config::RuntimeConfig;

pub(super) const ADD: ActionId = ActionId(10);
pub(super) const FAIL: ActionId = ActionId(11);
pub(super) const SHOUT: ActionId = ActionId(12);
pub(super) const SCALE: ActionId = ActionId(13);
pub(super) const CANCEL: ActionId = ActionId(14);
pub(super) const DELAY: ActionId = ActionId(15);
pub(super) const APPLY_EFFECT: ActionId = ActionId(16);
pub(super) const RECORD: ActionId = ActionId(17);

pub(super) fn table() -> Arc<ActionTable> {
    Arc::new(
        ActionTable::new()
            .with(ActionDefinition::new(
                10,
                "Add",
                ActionType::Int,
                [ActionType::Int, ActionType::Int],
            ))
            .with(ActionDefinition::new(11, "Fail", ActionType::Void, Vec::new()))
            .with(ActionDefinition::new(
                12,
                "Shout",
                ActionType::String,
                [ActionType::String],
            ))
            .with(ActionDefinition::new(
                13,
                "Scale",
                ActionType::Vector,
                [ActionType::Vector, ActionType::Float],
            ))
            .with(ActionDefinition::new(14, "Cancel", ActionType::Void, Vec::new()))
            .with(ActionDefinition::new(
                15,
                "Delay",
                ActionType::Void,
                [ActionType::Float, ActionType::Action],
            ))
            .with(ActionDefinition::new(
                16,
                "ApplyEffect",
                ActionType::Void,
                [ActionType::Engine(EngineKind::EFFECT)],
            ))
            .with(ActionDefinition::new(
                17,
                "Record",
                ActionType::Void,
                [ActionType::Int],
            )),
    )
}

#[derive(Debug, PartialEq)]
pub(super) struct TestEffect {
    pub amount: i32,
}

impl EngineStructure for TestEffect {
    fn engine_kind(&self) -> EngineKind {
        EngineKind::EFFECT
    }

    fn compare(
        &self,
        other: &dyn EngineStructure,
    ) -> bool {
        other
            .as_any()
            .downcast_ref::<TestEffect>()
            .is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub(super) struct TestActions {
    pub popped: Vec<i32>,
    pub recorded: Vec<i32>,
    pub delayed: Vec<SavedState>,
    pub effects: Vec<EngineHandle>,
    pub calls: usize,
}

impl ActionHost for TestActions {
    fn execute_action(
        &mut self,
        ctx: &mut ActionContext<'_>,
        action: ActionId,
        _arg_count: usize,
    ) -> BridgeResult<bool> {
        self.calls += 1;
        match action {
            ADD => {
                let a = ctx.stack().pop_int()?;
                let b = ctx.stack().pop_int()?;
                self.popped.extend([a, b]);
                ctx.stack().push_int(a + b)?;
            }
            FAIL => return Ok(false),
            SHOUT => {
                let s = ctx.stack().pop_string()?;
                ctx.stack().push_string(s.to_uppercase())?;
            }
            SCALE => {
                let v = ctx.stack().pop_vector()?;
                let k = ctx.stack().pop_float()?;
                ctx.stack()
                    .push_vector(Vector3::new(v.x * k, v.y * k, v.z * k))?;
            }
            CANCEL => ctx.abort_script(),
            DELAY => {
                ctx.stack().pop_float()?;
                let state = ctx.take_saved_state()?;
                self.delayed.push(state);
            }
            APPLY_EFFECT => {
                let effect = ctx.stack().pop_engine(EngineKind::EFFECT)?;
                self.effects.push(effect);
            }
            RECORD => {
                let value = ctx.stack().pop_int()?;
                self.recorded.push(value);
            }
            other => return Err(BridgeError::UnknownAction(other)),
        }
        Ok(true)
    }

    fn create_engine_structure(
        &mut self,
        kind: EngineKind,
    ) -> BridgeResult<EngineHandle> {
        if kind == EngineKind::EFFECT {
            EngineHandle::with_kind(kind, Arc::new(TestEffect { amount: 0 }))
        } else {
            Ok(EngineHandle::empty(kind))
        }
    }
}

pub(super) type Entry = fn(&mut Scripted, &mut Intrinsics<'_>) -> BridgeResult<i32>;
pub(super) type Resume = fn(&mut Scripted, &mut Intrinsics<'_>, Vec<Operand>) -> BridgeResult<()>;

/// Program whose entry point and resume point are plain functions over a
/// single integer global.
#[derive(Clone)]
pub(super) struct Scripted {
    pub g1: i32,
    pub params: Vec<Operand>,
    entry: Entry,
    resume: Resume,
}

impl Scripted {
    pub fn new(
        entry: Entry,
        resume: Resume,
    ) -> Self {
        Self {
            g1: 0,
            params: Vec::new(),
            entry,
            resume,
        }
    }
}

fn no_resume(
    _: &mut Scripted,
    _: &mut Intrinsics<'_>,
    _: Vec<Operand>,
) -> BridgeResult<()> {
    Ok(())
}

impl GeneratedProgram for Scripted {
    fn execute_script(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        _actor: ObjectId,
        params: Vec<Operand>,
        _default_return_code: i32,
    ) -> BridgeResult<i32> {
        self.params = params;
        let entry = self.entry;
        entry(self, bridge)
    }

    fn execute_script_situation(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        _situation: SituationId,
        locals: Vec<Operand>,
        _actor: ObjectId,
    ) -> BridgeResult<()> {
        let resume = self.resume;
        resume(self, bridge, locals)
    }

    fn clone_program(&self) -> Box<dyn GeneratedProgram> {
        Box::new(self.clone())
    }

    fn load_globals(
        &mut self,
        globals: Vec<Operand>,
    ) -> BridgeResult<()> {
        match globals.first() {
            Some(Operand::Int(v)) => {
                self.g1 = *v;
                Ok(())
            }
            _ => Err(BridgeError::Script("g1 must be an int".to_string())),
        }
    }
}

pub(super) fn runtime_with(program: Scripted) -> ScriptRuntime<TestActions> {
    ScriptRuntime::new(
        Box::new(program),
        TestActions::default(),
        table(),
        RuntimeConfig::default(),
    )
}

pub(super) fn runtime() -> ScriptRuntime<TestActions> {
    runtime_with(Scripted::new(|_, _| Ok(0), no_resume))
}

#[test]
fn test_explicit_call_pops_last_pushed_first() {
    let mut rt = runtime();
    let mut bridge = rt.intrinsics();
    bridge.push_int(3).unwrap();
    bridge.push_int(4).unwrap();
    bridge.execute_action(ADD, 2).unwrap();
    assert_eq!(bridge.pop_int(), Ok(7));

    assert_eq!(rt.actions().popped, vec![4, 3]);
    assert!(rt.channel().is_empty());
}

#[test]
fn test_fast_call_matches_explicit_call() {
    let mut explicit = runtime();
    {
        let mut bridge = explicit.intrinsics();
        bridge.push_int(3).unwrap();
        bridge.push_int(4).unwrap();
        bridge.execute_action(ADD, 2).unwrap();
        assert_eq!(bridge.pop_int(), Ok(7));
    }

    let mut fast = runtime();
    let ret = fast
        .intrinsics()
        .execute_action_fast(ADD, 2, &[Operand::Int(4), Operand::Int(3)])
        .unwrap();

    assert_eq!(ret, ActionReturn::Int(7));
    assert_eq!(fast.actions().popped, explicit.actions().popped);
    assert!(fast.channel().is_empty());
}

#[test]
fn test_fast_vector_argument_and_return() {
    let mut rt = runtime();
    let args = [
        Operand::Float(1.0),
        Operand::Float(2.0),
        Operand::Float(3.0),
        Operand::Float(2.0),
    ];
    let ret = rt.intrinsics().execute_action_fast(SCALE, 2, &args).unwrap();

    assert_eq!(ret, ActionReturn::Vector(Vector3::new(2.0, 4.0, 6.0)));
    assert!(rt.channel().is_empty());
}

#[test]
fn test_fast_string_arguments_are_released() {
    let mut rt = runtime();
    let ret = rt
        .intrinsics()
        .execute_action_fast(SHOUT, 1, &[Operand::from("hello")])
        .unwrap();

    assert_eq!(ret, ActionReturn::String("HELLO".to_string()));
    assert_eq!(rt.strings().live_count(), 0);
}

#[test]
fn test_fast_string_released_when_signature_fails() {
    let mut rt = runtime();
    let err = rt
        .intrinsics()
        .execute_action_fast(SHOUT, 1, &[Operand::from("a"), Operand::Int(1)])
        .unwrap_err();

    assert!(matches!(err, BridgeError::ActionSignature { .. }));
    assert_eq!(rt.strings().live_count(), 0);
    assert_eq!(rt.actions().calls, 0);
}

#[test]
fn test_fast_call_rejects_engine_parameters() {
    let mut rt = runtime();
    let effect = rt.intrinsics().create_engine(EngineKind::EFFECT).unwrap();
    let err = rt
        .intrinsics()
        .execute_action_fast(APPLY_EFFECT, 1, &[Operand::Engine(effect)])
        .unwrap_err();

    assert!(matches!(err, BridgeError::ActionSignature { action, .. } if action == APPLY_EFFECT));
}

#[test]
fn test_fast_call_unknown_action() {
    let mut rt = runtime();
    assert_eq!(
        rt.intrinsics().execute_action_fast(ActionId(999), 0, &[]),
        Err(BridgeError::UnknownAction(ActionId(999)))
    );
}

#[test]
fn test_explicit_call_checks_signature_before_dispatch() {
    let mut rt = runtime();
    let mut bridge = rt.intrinsics();
    assert_eq!(
        bridge.execute_action(ActionId(999), 0),
        Err(BridgeError::UnknownAction(ActionId(999)))
    );

    bridge.push_int(1).unwrap();
    bridge.push_int(2).unwrap();
    bridge.push_int(3).unwrap();
    let err = bridge.execute_action(ADD, 3).unwrap_err();
    assert!(matches!(err, BridgeError::ActionSignature { action, .. } if action == ADD));

    // Same misuse on the direct path fails the same way.
    let fast = bridge
        .execute_action_fast(ADD, 1, &[Operand::Int(1)])
        .unwrap_err();
    assert!(matches!(fast, BridgeError::ActionSignature { action, .. } if action == ADD));

    assert_eq!(rt.actions().calls, 0);
    assert_eq!(rt.channel().len(), 3);
}

#[test]
fn test_failed_action_requests_abort() {
    let mut rt = runtime();
    assert_eq!(
        rt.intrinsics().execute_action(FAIL, 0),
        Err(BridgeError::AbortRequested(AbortReason::ActionFailed))
    );
    assert_eq!(
        rt.intrinsics().execute_action_fast(FAIL, 0, &[]),
        Err(BridgeError::AbortRequested(AbortReason::ActionFailed))
    );
}

#[test]
fn test_action_can_cancel_script() {
    let mut rt = runtime();
    assert_eq!(
        rt.intrinsics().execute_action(CANCEL, 0),
        Err(BridgeError::AbortRequested(AbortReason::Cancelled))
    );
    assert!(rt.is_script_aborted());
}

#[test]
fn test_abort_from_another_thread() {
    let mut rt = runtime();
    let signal = rt.abort_signal();
    std::thread::spawn(move || signal.request()).join().unwrap();

    let mut bridge = rt.intrinsics();
    bridge.push_int(1).unwrap();
    bridge.push_int(2).unwrap();
    assert_eq!(
        bridge.execute_action(ADD, 2),
        Err(BridgeError::AbortRequested(AbortReason::Cancelled))
    );
}

#[test]
fn test_check_abort_semantics() {
    let mut rt = runtime();
    assert_eq!(rt.intrinsics().check_abort(true), Ok(()));
    assert_eq!(
        rt.intrinsics().check_abort(false),
        Err(BridgeError::AbortRequested(AbortReason::ActionFailed))
    );
    rt.abort_script();
    assert_eq!(
        rt.intrinsics().check_abort(true),
        Err(BridgeError::AbortRequested(AbortReason::Cancelled))
    );
}

#[test]
fn test_execute_script_returns_entry_result() {
    let mut rt = runtime_with(Scripted::new(
        |p, bridge| {
            let a = p.params[0].as_int().unwrap_or_default();
            let ret = bridge.execute_action_fast(ADD, 2, &[Operand::Int(a), Operand::Int(1)])?;
            Ok(ret.as_int().unwrap_or_default())
        },
        no_resume,
    ))
    .with_entry_params([ActionType::Int]);

    assert_eq!(rt.execute_script(ObjectId(9), &["41"], -1), Ok(42));
    assert_eq!(rt.current_actor(), ObjectId::INVALID);
}

#[test]
fn test_execute_script_failure_clears_channel_and_flag() {
    let mut rt = runtime_with(Scripted::new(
        |_, bridge| {
            bridge.push_int(1)?;
            bridge.push_int(2)?;
            bridge.execute_action(CANCEL, 0)?;
            Ok(1)
        },
        no_resume,
    ));

    assert_eq!(
        rt.execute_script(ObjectId(1), &[], 0),
        Err(BridgeError::AbortRequested(AbortReason::Cancelled))
    );
    assert!(rt.channel().is_empty());
    assert!(!rt.is_script_aborted());
}

#[test]
fn test_execute_script_rejects_illegal_entry_parameter() {
    let mut rt = runtime().with_entry_params([ActionType::Int, ActionType::Vector]);
    assert_eq!(
        rt.execute_script(ObjectId(1), &["1", "2"], 0),
        Err(BridgeError::IllegalEntryParameter {
            index: 1,
            ty: ActionType::Vector,
        })
    );
}

#[test]
fn test_engine_handle_through_channel() {
    let mut rt = runtime();
    let mut bridge = rt.intrinsics();
    let effect = bridge.create_engine(EngineKind::EFFECT).unwrap();
    assert!(!effect.is_empty());

    bridge.push_engine(EngineKind::EFFECT, &effect).unwrap();
    bridge.execute_action(APPLY_EFFECT, 1).unwrap();

    assert_eq!(rt.actions().effects.len(), 1);
    assert_eq!(rt.actions().effects[0], effect);
}

#[test]
fn test_engine_compare_uses_host_policy() {
    let mut rt = runtime();
    let mut bridge = rt.intrinsics();
    let a = bridge.create_engine(EngineKind::EFFECT).unwrap();
    let b = bridge.create_engine(EngineKind::EFFECT).unwrap();
    let empty = EngineHandle::empty(EngineKind::EFFECT);

    assert_ne!(a, b);
    assert_eq!(bridge.compare_engine(EngineKind::EFFECT, &a, &b), Ok(true));
    assert_eq!(bridge.compare_engine(EngineKind::EFFECT, &a, &empty), Ok(false));
}

#[test]
fn test_engine_kind_mismatch_is_rejected() {
    let mut rt = runtime();
    let mut bridge = rt.intrinsics();
    let effect = bridge.create_engine(EngineKind::EFFECT).unwrap();

    assert_eq!(
        bridge.push_engine(EngineKind::EVENT, &effect),
        Err(BridgeError::HandleKindMismatch {
            expected: EngineKind::EVENT,
            found: EngineKind::EFFECT,
        })
    );
    assert!(rt.channel().is_empty());
}

#[test]
fn test_engine_release_is_idempotent() {
    let mut rt = runtime();
    let bridge = rt.intrinsics();
    let mut handle =
        EngineHandle::with_kind(EngineKind::EFFECT, Arc::new(TestEffect { amount: 3 })).unwrap();

    assert!(bridge.release_engine(&mut handle));
    assert!(!bridge.release_engine(&mut handle));
    assert!(handle.is_empty());
}
