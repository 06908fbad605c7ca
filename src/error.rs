//! Error types shared by every engine component.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid interaction: {0}")]
    InvalidInteraction(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unknown learner profile: {0}")]
    UnknownProfile(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
