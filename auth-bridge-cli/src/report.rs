//! Run reports
//!
//! One section per scenario: the handle it ran under, the progress the
//! receiver saw in order, the terminal outcome and what the bridge did with
//! each inbound signal. Rendered as text or JSON.

use auth_bridge::{BridgeStats, Dispatch, ErrorKind, Handle, Progress, Terminal, Timestamp};
use serde::Serialize;
use std::fmt::Write;

/// Tally of [`Dispatch`] results for one scenario
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchCounts {
    pub progress: usize,
    pub suppressed: usize,
    pub delivered: usize,
    pub discarded: usize,
}

impl DispatchCounts {
    pub fn record(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Progress => self.progress += 1,
            Dispatch::Suppressed => self.suppressed += 1,
            Dispatch::Delivered => self.delivered += 1,
            Dispatch::Discarded(_) => self.discarded += 1,
        }
    }
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub handle: Handle,
    pub started_at: Timestamp,
    pub cancelled: bool,
    /// Session was still prompting when the script ran out of events
    pub abandoned: bool,
    pub progress: Vec<Progress>,
    pub terminal: Option<Terminal>,
    pub error_kind: Option<ErrorKind>,
    pub dispatches: DispatchCounts,
}

/// Everything one CLI invocation produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: &'static str,
    pub generated_at: Timestamp,
    pub scenarios: Vec<ScenarioReport>,
    pub stats: BridgeStats,
}

impl RunReport {
    pub fn new(scenarios: Vec<ScenarioReport>, stats: BridgeStats) -> Self {
        Self {
            version: auth_bridge::VERSION,
            generated_at: chrono::Utc::now(),
            scenarios,
            stats,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human readable rendering
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "═══════════════════════════════════════════════";

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "  Auth Bridge - Scenario Report");
        let _ = writeln!(out, "{}\n", rule);

        for scenario in &self.scenarios {
            render_scenario(&mut out, scenario);
        }

        let stats = &self.stats;
        let _ = writeln!(out, "───────────────────────────────────────────────");
        let _ = writeln!(out, "Totals:");
        let _ = writeln!(out, "  Delivered:  {}", stats.delivered);
        let _ = writeln!(out, "  Progress:   {}", stats.progress_relayed);
        let _ = writeln!(out, "  Suppressed: {}", stats.suppressed);
        let _ = writeln!(out, "  Discarded:  {}", stats.discarded);
        let _ = writeln!(out, "  Cancelled:  {}", stats.cancelled);
        let _ = writeln!(out, "  Live:       {}", stats.live_sessions);
        out
    }
}

fn render_scenario(out: &mut String, scenario: &ScenarioReport) {
    let _ = writeln!(
        out,
        "▶ {} (handle {}, started {})",
        scenario.name,
        scenario.handle,
        scenario.started_at.format("%H:%M:%S%.3f")
    );

    for progress in &scenario.progress {
        let _ = writeln!(out, "  progress: {}", progress);
    }

    match &scenario.terminal {
        Some(terminal) => {
            let _ = write!(out, "  terminal: {}", terminal.outcome);
            if let Some(kind) = scenario.error_kind {
                let _ = write!(out, " [{}]", kind);
            }
            if terminal.had_failures {
                let _ = write!(out, " after {} failed attempt(s)", terminal.failed_attempts);
            }
            let _ = writeln!(out);
        }
        None if scenario.cancelled => {
            let _ = writeln!(out, "  terminal: none (cancelled)");
        }
        None if scenario.abandoned => {
            let _ = writeln!(out, "  terminal: none (no terminal event, session cancelled)");
        }
        None => {
            let _ = writeln!(out, "  terminal: none");
        }
    }

    let counts = &scenario.dispatches;
    let _ = writeln!(
        out,
        "  dispatch: {} progress, {} suppressed, {} delivered, {} discarded\n",
        counts.progress, counts.suppressed, counts.delivered, counts.discarded
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_bridge::{DiscardReason, Outcome};

    fn lockout_report() -> ScenarioReport {
        let mut dispatches = DispatchCounts::default();
        dispatches.record(Dispatch::Progress);
        dispatches.record(Dispatch::Delivered);
        dispatches.record(Dispatch::Discarded(DiscardReason::UnknownHandle));

        ScenarioReport {
            name: "lockout".to_string(),
            handle: Handle::from_raw(3),
            started_at: chrono::Utc::now(),
            cancelled: false,
            abandoned: false,
            progress: vec![Progress::Failed { attempt: 1 }],
            terminal: Some(Terminal::new(
                Outcome::Error { code: 7, message: "lockout".into() },
                1,
            )),
            error_kind: Some(ErrorKind::Lockout),
            dispatches,
        }
    }

    #[test]
    fn test_dispatch_counts() {
        let report = lockout_report();
        assert_eq!(
            report.dispatches,
            DispatchCounts { progress: 1, suppressed: 0, delivered: 1, discarded: 1 }
        );
    }

    #[test]
    fn test_text_report() {
        let report = RunReport::new(vec![lockout_report()], BridgeStats::default());
        let text = report.render_text();

        assert!(text.contains("▶ lockout (handle #3"));
        assert!(text.contains("progress: failed (attempt 1)"));
        assert!(text.contains("terminal: error 7: lockout [Lockout] after 1 failed attempt(s)"));
        assert!(text.contains("1 progress, 0 suppressed, 1 delivered, 1 discarded"));
    }

    #[test]
    fn test_json_report() {
        let report = RunReport::new(vec![lockout_report()], BridgeStats::default());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        let scenario = &value["scenarios"][0];
        assert_eq!(scenario["handle"], 3);
        assert_eq!(scenario["terminal"]["outcome"]["result"], "error");
        assert_eq!(scenario["terminal"]["outcome"]["code"], 7);
        assert_eq!(scenario["error_kind"], "Lockout");
        assert_eq!(scenario["progress"][0]["kind"], "failed");
    }
}
