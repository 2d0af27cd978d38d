use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Extraction,
    Transport,
    Persistence,
    NotFound,
}

/// Failure surfaced to the presentation layer, either as a banner or as the
/// result of an operation. Nothing past the engine boundary sees a raw error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: &str) -> EngineError {
        return EngineError {
            kind,
            message: message.to_string(),
        };
    }

    pub fn configuration(message: &str) -> EngineError {
        return EngineError::new(ErrorKind::Configuration, message);
    }

    pub fn validation(message: &str) -> EngineError {
        return EngineError::new(ErrorKind::Validation, message);
    }

    pub fn transport(message: &str) -> EngineError {
        return EngineError::new(ErrorKind::Transport, message);
    }

    pub fn not_found(message: &str) -> EngineError {
        return EngineError::new(ErrorKind::NotFound, message);
    }
}
