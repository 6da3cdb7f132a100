// Copyright (c) 2025 - Cowboy AI, Inc.
//! Driver Lifecycle State Machine
//!
//! This is a **Mealy Machine**: outputs depend on both state and input.
//!
//! ```text
//!            Start             Started
//! Stopped ─────────> Starting ─────────> Running
//!    ^                  │                   │
//!    │   StartFailed    │                   │ Stop
//!    ├──────────────────┘                   v
//!    │              Drained             Stopping
//!    └──────────────────────────────────────┘
//! ```
//!
//! `Stop` while already `Stopped` or `Stopping` is accepted as a no-op, which
//! makes stopping idempotent.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// Driver state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Stopped => "Stopped",
            DriverState::Starting => "Starting",
            DriverState::Running => "Running",
            DriverState::Stopping => "Stopping",
        };
        f.write_str(name)
    }
}

/// Lifecycle command (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// Begin startup
    Start,
    /// Startup completed; the run loop is live
    Started,
    /// Startup failed before the run loop was launched
    StartFailed,
    /// Request shutdown
    Stop,
    /// Run loop finished its in-flight batch and exited
    Drained,
}

/// Transition output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEffect {
    /// State changed
    Transitioned,
    /// Input accepted without changing state
    NoOp,
}

impl StateMachine for DriverState {
    type Input = LifecycleCommand;
    type Output = LifecycleEffect;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use LifecycleCommand as Cmd;

        match (self, input) {
            (DriverState::Stopped, Cmd::Start) => {
                Ok((DriverState::Starting, LifecycleEffect::Transitioned))
            }
            (DriverState::Starting, Cmd::Started) => {
                Ok((DriverState::Running, LifecycleEffect::Transitioned))
            }
            (DriverState::Starting, Cmd::StartFailed) => {
                Ok((DriverState::Stopped, LifecycleEffect::Transitioned))
            }
            (DriverState::Running, Cmd::Stop) => {
                Ok((DriverState::Stopping, LifecycleEffect::Transitioned))
            }
            (DriverState::Stopping, Cmd::Drained) => {
                Ok((DriverState::Stopped, LifecycleEffect::Transitioned))
            }

            // Idempotent stop
            (DriverState::Stopped, Cmd::Stop) | (DriverState::Stopping, Cmd::Stop) => {
                Ok((*self, LifecycleEffect::NoOp))
            }

            (DriverState::Starting | DriverState::Running | DriverState::Stopping, Cmd::Start) => {
                Err(TransitionError::PreconditionFailed(format!(
                    "driver already {}",
                    self
                )))
            }
            (DriverState::Starting, Cmd::Stop) => Err(TransitionError::PreconditionFailed(
                "start in progress".to_string(),
            )),

            (from, input) => Err(TransitionError::InvalidTransition {
                from: from.to_string(),
                to: format!("{:?}", input),
            }),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        use LifecycleCommand as Cmd;

        match self {
            DriverState::Stopped => vec![Cmd::Start, Cmd::Stop],
            DriverState::Starting => vec![Cmd::Started, Cmd::StartFailed],
            DriverState::Running => vec![Cmd::Stop],
            DriverState::Stopping => vec![Cmd::Drained, Cmd::Stop],
        }
    }
}
