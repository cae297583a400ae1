//! Turn state machine
//!
//! `Start -> InvokingModel -> (ExecutingTools -> InvokingModel)* -> End`.
//! [`transition`] is pure; the driver in [`crate::Graph`] performs the effects
//! and feeds back the resulting signal.

use crate::error::{GraphError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Start,
    /// `iteration` counts model invocations in this turn, starting at 1
    InvokingModel { iteration: usize },
    ExecutingTools { iteration: usize },
    End,
}

/// Outcome of the last effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Begin,
    ModelReplied { tool_calls: bool },
    ToolsFinished,
}

/// Work the driver performs next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    InvokeModel,
    ExecuteTools,
    /// Persist the checkpoint and finish the turn
    Commit,
}

pub fn transition(state: TurnState, signal: Signal, max_iterations: usize) -> Result<(TurnState, Effect)> {
    match (state, signal) {
        (TurnState::Start, Signal::Begin) => Ok((TurnState::InvokingModel { iteration: 1 }, Effect::InvokeModel)),

        (TurnState::InvokingModel { .. }, Signal::ModelReplied { tool_calls: false }) => {
            Ok((TurnState::End, Effect::Commit))
        }

        (TurnState::InvokingModel { iteration }, Signal::ModelReplied { tool_calls: true }) => {
            if iteration >= max_iterations {
                return Err(GraphError::ToolLoopExceeded(max_iterations));
            }
            Ok((TurnState::ExecutingTools { iteration }, Effect::ExecuteTools))
        }

        (TurnState::ExecutingTools { iteration }, Signal::ToolsFinished) => Ok((
            TurnState::InvokingModel {
                iteration: iteration + 1,
            },
            Effect::InvokeModel,
        )),

        (state, signal) => Err(GraphError::InvalidTransition(format!(
            "{:?} on {:?}",
            signal, state
        ))),
    }
}
