//! Demo script and console host
//!
//! Runs [`DemoScript`] against [`ConsoleActions`] on a [`ScriptRuntime`],
//! then resumes every delayed situation it left behind. Used by the CLI,
//! the benchmarks and the integration tests.

pub mod actions;
pub mod script;

pub use actions::{demo_action_table, ConsoleActions, DemoEffect};
pub use script::{DemoScript, REPORT_SITUATION};

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use crate::bridge::action::ActionType;
use crate::bridge::value::ObjectId;
use crate::host::{ScriptRuntime, SituationScheduler};
use crate::util::config::BridgeConfig;

/// Seed of the console host's random number generator.
pub const DEMO_SEED: u64 = 0x5eed;

/// How to run the demo.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoOptions {
    pub actor: ObjectId,
    /// Entry point parameters as the host would pass them.
    pub params: Vec<String>,
    /// Cancel the script once this many actions have completed.
    pub cancel_after: Option<usize>,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            actor: ObjectId(1),
            params: vec!["0".to_string()],
            cancel_after: None,
        }
    }
}

/// Outcome of a demo run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    pub actor: ObjectId,
    /// Entry point result, absent when the script was aborted.
    pub return_code: Option<i32>,
    /// Why the script stopped early.
    pub aborted: Option<String>,
    pub output: Vec<String>,
    pub situations_run: usize,
    pub actions_executed: usize,
    /// Game time after the last situation ran.
    pub clock: f64,
    pub live_strings: usize,
}

/// Build a runtime for the demo script over `actions`.
pub fn demo_runtime(
    config: &BridgeConfig,
    actions: ConsoleActions,
) -> ScriptRuntime<ConsoleActions> {
    ScriptRuntime::new(
        Box::new(DemoScript::new()),
        actions,
        Arc::new(demo_action_table()),
        config.runtime.clone(),
    )
    .with_entry_params([ActionType::Int])
}

/// Run the demo script and every situation it schedules.
///
/// An abort is part of the report; any other script failure is an error.
pub fn run_demo(
    config: &BridgeConfig,
    options: &DemoOptions,
) -> anyhow::Result<DemoReport> {
    let scheduler = SituationScheduler::new();
    let mut actions = ConsoleActions::new(scheduler.clone(), DEMO_SEED);
    if let Some(count) = options.cancel_after {
        actions = actions.cancel_after(count);
    }
    let mut runtime = demo_runtime(config, actions);

    let params: Vec<&str> = options.params.iter().map(String::as_str).collect();
    let mut report = DemoReport {
        actor: options.actor,
        return_code: None,
        aborted: None,
        output: Vec::new(),
        situations_run: 0,
        actions_executed: 0,
        clock: 0.0,
        live_strings: 0,
    };

    match runtime.execute_script(options.actor, &params, config.runtime.default_return_code) {
        Ok(code) => report.return_code = Some(code),
        Err(err) if err.is_abort() => {
            warn!("demo script aborted: {}", err);
            report.aborted = Some(err.to_string());
        }
        Err(err) => return Err(err).context("demo script failed"),
    }

    // Situations run even after an abort; they are separate executions.
    loop {
        let due = scheduler.drain_all();
        if due.is_empty() {
            break;
        }
        for pending in due {
            let situation = pending.state.situation();
            match runtime.execute_script_situation(pending.state, pending.actor) {
                Ok(()) => {}
                Err(err) if err.is_abort() => warn!("situation {} aborted: {}", situation, err),
                Err(err) => {
                    return Err(err).with_context(|| format!("situation {} failed", situation))
                }
            }
            report.situations_run += 1;
        }
    }

    report.output = runtime.actions().output().to_vec();
    report.actions_executed = runtime.actions().executed();
    report.clock = scheduler.now();
    report.live_strings = runtime.strings().live_count();
    info!(
        "demo finished: {} lines, {} situations",
        report.output.len(),
        report.situations_run
    );
    Ok(report)
}
