//! Scenario execution against a live bridge

use crate::config::ScenarioConfig;
use crate::report::{DispatchCounts, ScenarioReport};
use anyhow::{Context, Result};
use auth_bridge::{Bridge, Handle, Notification, Recorder};
use rayon::prelude::*;

/// Run every scenario on `bridge`, sequentially or on the rayon pool.
///
/// Pinned handles are registered before anything runs so that handles the
/// bridge issues to other scenarios can never collide with them. Reports
/// come back in scenario order either way.
pub fn run_all(
    bridge: &Bridge,
    recorder: &Recorder,
    scenarios: &[ScenarioConfig],
    parallel: bool,
) -> Result<Vec<ScenarioReport>> {
    let mut handles = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        handles.push(match scenario.handle {
            Some(raw) => Some(register_pinned(bridge, scenario, raw)?),
            None => None,
        });
    }

    let run = |(scenario, handle): (&ScenarioConfig, &Option<Handle>)| {
        let handle = handle.unwrap_or_else(|| bridge.begin_session());
        run_session(bridge, recorder, scenario, handle)
    };

    if parallel {
        log::info!("Running {} scenario(s) in parallel", scenarios.len());
        scenarios.par_iter().zip(handles.par_iter()).map(run).collect()
    } else {
        scenarios.iter().zip(handles.iter()).map(run).collect()
    }
}

/// Open a session for one scenario and drive it through the bridge
pub fn run_scenario(
    bridge: &Bridge,
    recorder: &Recorder,
    scenario: &ScenarioConfig,
) -> Result<ScenarioReport> {
    let handle = match scenario.handle {
        Some(raw) => register_pinned(bridge, scenario, raw)?,
        None => bridge.begin_session(),
    };
    run_session(bridge, recorder, scenario, handle)
}

fn register_pinned(bridge: &Bridge, scenario: &ScenarioConfig, raw: i64) -> Result<Handle> {
    let handle = Handle::from_raw(raw);
    bridge
        .register(handle)
        .with_context(|| format!("Scenario '{}': cannot register handle", scenario.name))?;
    Ok(handle)
}

/// Drive one scripted session, already open under `handle`
fn run_session(
    bridge: &Bridge,
    recorder: &Recorder,
    scenario: &ScenarioConfig,
    handle: Handle,
) -> Result<ScenarioReport> {
    let started_at = bridge
        .session(handle)
        .with_context(|| format!("Scenario '{}': session vanished", scenario.name))?
        .started_at;

    log::debug!("Scenario '{}' running as session {}", scenario.name, handle);

    let mut dispatches = DispatchCounts::default();
    let mut cancelled = false;
    for (index, event) in scenario.events.iter().enumerate() {
        if scenario.cancel_after == Some(index) {
            cancelled |= bridge.cancel(handle);
        }
        dispatches.record(bridge.signal(handle, event.to_signal()));
    }
    if scenario.cancel_after == Some(scenario.events.len()) {
        cancelled |= bridge.cancel(handle);
    }

    // Timeouts belong to the application; here the script running dry is the timeout
    let abandoned = bridge.registry().contains(handle);
    if abandoned {
        log::warn!(
            "Scenario '{}' ended without a terminal event, cancelling session {}",
            scenario.name,
            handle
        );
        bridge.cancel(handle);
    }

    // The session is retired now; nothing more can arrive for it
    let mut progress = Vec::new();
    let mut terminal = None;
    for notification in recorder.take(handle) {
        match notification {
            Notification::Progress(p) => progress.push(p),
            Notification::Terminal(t) => terminal = terminal.or(Some(t)),
        }
    }
    let error_kind = terminal.as_ref().and_then(|t| t.outcome.error_kind());

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        handle,
        started_at,
        cancelled,
        abandoned,
        progress,
        terminal,
        error_kind,
        dispatches,
    })
}
