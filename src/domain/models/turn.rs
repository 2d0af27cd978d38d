#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum TurnState {
    Idle,
    Sending,
    Streaming,
    Aborted,
    Failed,
}

/// How a turn ended. The engine is back to `Idle` whichever way it went.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Aborted,
    Failed(String),
}

impl TurnOutcome {
    pub fn final_state(&self) -> TurnState {
        match self {
            TurnOutcome::Completed => return TurnState::Idle,
            TurnOutcome::Aborted => return TurnState::Aborted,
            TurnOutcome::Failed(_) => return TurnState::Failed,
        }
    }
}
