//! # Lifecycle
//!
//! Process-wide engine state machine:
//!
//! ```text
//! Initializing ──► Running ──► ShuttingDown ──► Terminated
//!       │                                           ▲
//!       └───────────── fatal init error ────────────┘
//! ```

use log::info;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Initializing,
    Running,
    ShuttingDown,
    Terminated,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal lifecycle transition from {from:?} to {to:?}")]
pub struct LifecycleError {
    pub from: Lifecycle,
    pub to: Lifecycle,
}

impl Lifecycle {
    pub fn can_transition_to(self, next: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, next),
            (Initializing, Running)
                | (Initializing, Terminated)
                | (Running, ShuttingDown)
                | (ShuttingDown, Terminated)
        )
    }

    /// Moves to `next`, refusing transitions the state machine does not allow.
    pub fn transition(&mut self, next: Lifecycle) -> Result<(), LifecycleError> {
        if !self.can_transition_to(next) {
            return Err(LifecycleError {
                from: *self,
                to: next,
            });
        }
        info!("Lifecycle: {self:?} -> {next:?}");
        *self = next;
        Ok(())
    }

    pub fn is_running(self) -> bool {
        self == Lifecycle::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_run_reaches_terminated() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.transition(Lifecycle::Running).unwrap();
        assert!(lifecycle.is_running());
        lifecycle.transition(Lifecycle::ShuttingDown).unwrap();
        lifecycle.transition(Lifecycle::Terminated).unwrap();
        assert_eq!(lifecycle, Lifecycle::Terminated);
    }

    #[test]
    fn init_failure_goes_straight_to_terminated() {
        let mut lifecycle = Lifecycle::Initializing;
        lifecycle.transition(Lifecycle::Terminated).unwrap();
        assert_eq!(lifecycle, Lifecycle::Terminated);
    }

    #[test]
    fn illegal_transitions_leave_state_unchanged() {
        let mut lifecycle = Lifecycle::Running;
        assert_eq!(
            lifecycle.transition(Lifecycle::Terminated),
            Err(LifecycleError {
                from: Lifecycle::Running,
                to: Lifecycle::Terminated,
            })
        );
        assert_eq!(lifecycle, Lifecycle::Running);

        let mut lifecycle = Lifecycle::Terminated;
        assert!(lifecycle.transition(Lifecycle::Running).is_err());
        assert!(lifecycle.transition(Lifecycle::Initializing).is_err());

        let mut lifecycle = Lifecycle::ShuttingDown;
        assert!(lifecycle.transition(Lifecycle::Running).is_err());
    }
}
