//! Terminal-delivery guard
//!
//! Per-session state machine that decides what each normalized event does:
//!
//! ```text
//! Prompting --Failed/Help--> Prompting      (relay as progress)
//! Prompting --Error/Succeeded--> Delivering (one call into native code)
//! Delivering --delivery returns--> Retired  (handle removed from registry)
//! Retired --anything--> Retired             (discarded)
//! ```
//!
//! Callbacks for one handle are serialized on the session's dispatch lane,
//! which is held across the native call. The state lock is only held while
//! deciding, so a receiver may cancel sessions from inside a notification.

use crate::config::BridgeConfig;
use crate::ffi::Boundary;
use crate::registry::{Session, SessionCell, SessionRegistry};
use crate::types::{AuthEvent, DiscardReason, Dispatch, Handle, Outcome, Progress, SessionStatus, Terminal};
use std::sync::Arc;

/// Decision taken for one event under the session's state lock
#[derive(Debug, PartialEq, Eq)]
enum Admission {
    Relay(Progress),
    Suppress,
    Deliver(Terminal),
    Discard(DiscardReason),
}

pub(crate) struct TerminalGuard<'a> {
    registry: &'a SessionRegistry,
    boundary: &'a Boundary,
    config: &'a BridgeConfig,
}

impl<'a> TerminalGuard<'a> {
    pub(crate) fn new(
        registry: &'a SessionRegistry,
        boundary: &'a Boundary,
        config: &'a BridgeConfig,
    ) -> Self {
        Self {
            registry,
            boundary,
            config,
        }
    }

    /// Run one normalized event through the state machine
    pub(crate) fn dispatch(&self, handle: Handle, event: AuthEvent) -> Dispatch {
        let cell = match self.registry.cell(handle) {
            Ok(cell) => cell,
            Err(_) => {
                log::debug!("Discarding stray {} event for unknown session {}", event.name(), handle);
                return Dispatch::Discarded(DiscardReason::UnknownHandle);
            }
        };

        let _lane = cell.lane.lock();
        let admission = {
            let mut session = cell.state.lock();
            admit(&mut session, event, self.config)
        };

        match admission {
            Admission::Relay(progress) => {
                self.boundary.relay(handle, &progress);
                Dispatch::Progress
            }
            Admission::Suppress => Dispatch::Suppressed,
            Admission::Deliver(terminal) => {
                let _retire = Retirement {
                    registry: self.registry,
                    handle,
                    cell: &cell,
                };
                self.boundary.deliver(handle, &terminal);
                Dispatch::Delivered
            }
            Admission::Discard(reason) => {
                match reason {
                    DiscardReason::Delivering => log::warn!(
                        "Discarding re-entrant callback for session {} during terminal delivery",
                        handle
                    ),
                    _ => log::debug!("Discarding callback for retired session {}", handle),
                }
                Dispatch::Discarded(reason)
            }
        }
    }
}

/// Retires the session once the terminal call returns, including by unwinding
struct Retirement<'a> {
    registry: &'a SessionRegistry,
    handle: Handle,
    cell: &'a Arc<SessionCell>,
}

impl Drop for Retirement<'_> {
    fn drop(&mut self) {
        self.registry.retire_cell(self.handle, self.cell);
    }
}

fn admit(session: &mut Session, event: AuthEvent, config: &BridgeConfig) -> Admission {
    match session.status {
        SessionStatus::Retired => return Admission::Discard(DiscardReason::Retired),
        SessionStatus::Delivering => return Admission::Discard(DiscardReason::Delivering),
        SessionStatus::Prompting => {}
    }

    let progress = match event {
        AuthEvent::Failed => {
            session.attempt_count = session.attempt_count.saturating_add(1);
            Progress::Failed {
                attempt: session.attempt_count,
            }
        }
        AuthEvent::Help { code, message } => {
            session.help_count = session.help_count.saturating_add(1);
            Progress::Help { code, message }
        }
        AuthEvent::Error { code, message } => {
            return begin_delivery(session, Outcome::Error { code, message })
        }
        AuthEvent::Succeeded => return begin_delivery(session, Outcome::Success),
    };

    if config.should_forward(&progress) {
        Admission::Relay(progress)
    } else {
        Admission::Suppress
    }
}

fn begin_delivery(session: &mut Session, outcome: Outcome) -> Admission {
    assert!(
        !session.handed_off,
        "terminal notification for session {} handed off twice",
        session.handle
    );
    session.handed_off = true;
    session.status = SessionStatus::Delivering;
    Admission::Deliver(Terminal::new(outcome, session.attempt_count))
}
