//! Suspend and resume integration tests
//!
//! A hand-written program captures a continuation, the host schedules it
//! and a later call resumes it, possibly in another runtime.

use std::sync::Arc;

use nwscript_bridge::bridge::{
    ActionDefinition, ActionId, ActionTable, ActionType, BridgeError, BridgeResult,
    GeneratedProgram, Intrinsics, ObjectId, Operand, OperandChannel, ProgramCounter,
    SavedStateHeader, SituationId,
};
use nwscript_bridge::host::{ActionContext, ActionHost, ScriptRuntime, SituationScheduler};
use nwscript_bridge::util::config::RuntimeConfig;

const DELAY: ActionId = ActionId(7);
const RECORD: ActionId = ActionId(8);
const RESUME_SITUATION: SituationId = SituationId(1);

/// Records ints and schedules delayed continuations.
struct Recorder {
    scheduler: SituationScheduler,
    recorded: Vec<i32>,
}

impl Recorder {
    fn new(scheduler: SituationScheduler) -> Self {
        Self {
            scheduler,
            recorded: Vec::new(),
        }
    }
}

impl ActionHost for Recorder {
    fn execute_action(
        &mut self,
        ctx: &mut ActionContext<'_>,
        action: ActionId,
        _arg_count: usize,
    ) -> BridgeResult<bool> {
        match action {
            DELAY => {
                let delay = ctx.stack().pop_float()?;
                let state = ctx.take_saved_state()?;
                self.scheduler.schedule(delay, ctx.actor(), state);
            }
            RECORD => {
                let value = ctx.stack().pop_int()?;
                self.recorded.push(value);
            }
            other => return Err(BridgeError::UnknownAction(other)),
        }
        Ok(true)
    }
}

/// ```text
/// int g_count = 0;
///
/// void main(int nStep)
/// {
///     g_count = 5;
///     DelayCommand(fDelay, Record(g_count + nStep));
///     g_count = 7;
/// }
/// ```
#[derive(Clone)]
struct Counter {
    g_count: i32,
    delay: f32,
}

impl Counter {
    fn new(delay: f32) -> Self {
        Self { g_count: 0, delay }
    }
}

impl GeneratedProgram for Counter {
    fn execute_script(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        _actor: ObjectId,
        params: Vec<Operand>,
        _default_return_code: i32,
    ) -> BridgeResult<i32> {
        let step = params.first().and_then(Operand::as_int).unwrap_or_default();
        self.g_count = 5;
        bridge.store_state(
            Some(vec![Operand::Int(self.g_count)]),
            vec![Operand::Int(step)],
            ProgramCounter(0x20),
            RESUME_SITUATION,
            self.clone_program(),
        )?;
        bridge.push_float(self.delay)?;
        bridge.execute_action(DELAY, 2)?;
        self.g_count = 7;
        Ok(self.g_count)
    }

    fn execute_script_situation(
        &mut self,
        bridge: &mut Intrinsics<'_>,
        situation: SituationId,
        locals: Vec<Operand>,
        _actor: ObjectId,
    ) -> BridgeResult<()> {
        if situation != RESUME_SITUATION {
            return Err(BridgeError::UnknownSituation(situation));
        }
        let step = locals.first().and_then(Operand::as_int).unwrap_or_default();
        bridge.execute_action_fast(RECORD, 1, &[Operand::Int(self.g_count + step)])?;
        Ok(())
    }

    fn clone_program(&self) -> Box<dyn GeneratedProgram> {
        Box::new(self.clone())
    }

    fn load_globals(
        &mut self,
        globals: Vec<Operand>,
    ) -> BridgeResult<()> {
        match globals.as_slice() {
            [Operand::Int(count)] => {
                self.g_count = *count;
                Ok(())
            }
            _ => Err(BridgeError::Script(format!(
                "expected one int global, got {}",
                globals.len()
            ))),
        }
    }
}

fn runtime(
    scheduler: &SituationScheduler,
    delay: f32,
    config: RuntimeConfig,
) -> ScriptRuntime<Recorder> {
    let table = ActionTable::new()
        .with(ActionDefinition::new(
            7,
            "DelayCommand",
            ActionType::Void,
            [ActionType::Float, ActionType::Action],
        ))
        .with(ActionDefinition::new(8, "Record", ActionType::Void, [ActionType::Int]));
    ScriptRuntime::new(
        Box::new(Counter::new(delay)),
        Recorder::new(scheduler.clone()),
        Arc::new(table),
        config,
    )
    .with_entry_params([ActionType::Int])
}

fn run_due(
    rt: &mut ScriptRuntime<Recorder>,
    scheduler: &SituationScheduler,
) -> usize {
    let due = scheduler.drain_all();
    let count = due.len();
    for pending in due {
        rt.execute_script_situation(pending.state, pending.actor).unwrap();
    }
    count
}

#[test]
fn test_resume_sees_globals_at_suspend() {
    let scheduler = SituationScheduler::new();
    let mut rt = runtime(&scheduler, 1.0, RuntimeConfig::default());

    assert_eq!(rt.execute_script(ObjectId(3), &["10"], 0), Ok(7));
    assert_eq!(scheduler.len(), 1);
    assert!(rt.actions().recorded.is_empty());

    assert_eq!(run_due(&mut rt, &scheduler), 1);
    assert_eq!(rt.actions().recorded, vec![15]);
    assert_eq!(scheduler.now(), 1.0);
}

#[test]
fn test_scheduled_actor_is_the_suspending_actor() {
    let scheduler = SituationScheduler::new();
    let mut rt = runtime(&scheduler, 0.5, RuntimeConfig::default());

    rt.execute_script(ObjectId(9), &["0"], 0).unwrap();
    let due = scheduler.advance(0.5);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].actor, ObjectId(9));
    assert_eq!(due[0].state.actor(), ObjectId(9));
    assert_eq!(rt.current_actor(), ObjectId::INVALID);
}

#[test]
fn test_situations_run_in_due_order() {
    let scheduler = SituationScheduler::new();
    let mut slow = runtime(&scheduler, 3.0, RuntimeConfig::default());
    let mut fast = runtime(&scheduler, 1.0, RuntimeConfig::default());

    slow.execute_script(ObjectId(1), &["100"], 0).unwrap();
    fast.execute_script(ObjectId(2), &["200"], 0).unwrap();

    assert!(scheduler.advance(0.5).is_empty());
    let due = scheduler.advance(1.0);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].actor, ObjectId(2));
    for pending in due {
        fast.execute_script_situation(pending.state, pending.actor).unwrap();
    }
    assert_eq!(fast.actions().recorded, vec![205]);

    assert_eq!(run_due(&mut slow, &scheduler), 1);
    assert_eq!(slow.actions().recorded, vec![105]);
    assert!(scheduler.is_empty());
}

#[test]
fn test_state_image_moves_between_runtimes() {
    let scheduler = SituationScheduler::new();
    let mut source = runtime(&scheduler, 0.0, RuntimeConfig::default());
    source.execute_script(ObjectId(4), &["1"], 0).unwrap();
    let state = scheduler.drain_all().remove(0).state;

    let mut channel = OperandChannel::new();
    let header = source.push_saved_state(&state, &mut channel).unwrap();
    assert_eq!(header.global_count, 1);
    assert_eq!(header.local_count, 1);
    assert_eq!(channel.len(), 3);

    let json = serde_json::to_string(&header).unwrap();
    let header: SavedStateHeader = serde_json::from_str(&json).unwrap();

    let other_scheduler = SituationScheduler::new();
    let mut target = runtime(&other_scheduler, 0.0, RuntimeConfig::default());
    let restored = target.pop_saved_state(&mut channel, &header).unwrap();
    assert!(channel.is_empty());
    assert_eq!(restored.globals(), Some(&[Operand::Int(5)][..]));
    assert_eq!(restored.situation(), RESUME_SITUATION);

    target
        .execute_script_situation(restored, header.actor)
        .unwrap();
    assert_eq!(target.actions().recorded, vec![6]);
}

#[test]
fn test_duplicate_state_resumes_twice() {
    let scheduler = SituationScheduler::new();
    let mut rt = runtime(&scheduler, 0.0, RuntimeConfig::default());
    rt.execute_script(ObjectId(1), &["2"], 0).unwrap();

    let state = scheduler.drain_all().remove(0).state;
    let copy = rt.duplicate_saved_state(&state);
    rt.execute_script_situation(state, ObjectId(1)).unwrap();
    rt.execute_script_situation(copy, ObjectId(1)).unwrap();

    assert_eq!(rt.actions().recorded, vec![7, 7]);
}

#[test]
fn test_state_image_disabled_by_config() {
    let scheduler = SituationScheduler::new();
    let config = RuntimeConfig {
        save_state_to_stack: false,
        ..RuntimeConfig::default()
    };
    let mut rt = runtime(&scheduler, 0.0, config);
    rt.execute_script(ObjectId(1), &["0"], 0).unwrap();
    let state = scheduler.drain_all().remove(0).state;

    let mut channel = OperandChannel::new();
    assert_eq!(
        rt.push_saved_state(&state, &mut channel).unwrap_err(),
        BridgeError::SavedStateToStackDisabled
    );
    assert!(channel.is_empty());
}

#[test]
fn test_resume_with_unknown_situation_fails() {
    let scheduler = SituationScheduler::new();
    let mut rt = runtime(&scheduler, 0.0, RuntimeConfig::default());
    rt.execute_script(ObjectId(1), &["0"], 0).unwrap();

    let state = scheduler.drain_all().remove(0).state;
    let mut channel = OperandChannel::new();
    let mut header = rt.push_saved_state(&state, &mut channel).unwrap();
    header.situation = SituationId(99);
    let forged = rt.pop_saved_state(&mut channel, &header).unwrap();

    assert_eq!(
        rt.execute_script_situation(forged, ObjectId(1)),
        Err(BridgeError::UnknownSituation(SituationId(99)))
    );
    assert!(rt.actions().recorded.is_empty());
}
