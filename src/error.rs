use crate::engine::health::GuardError;
use crate::engine::provider::ProviderError;

/// Crate-wide error type for the directly invokable entry points.
///
/// The main turn flow never returns this — `orchestrate` absorbs failures at
/// the persona call site and always produces a well-formed result. It exists
/// for the seams that do propagate: standalone conflict resolution and
/// host-side plumbing.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("service '{service}' unavailable, retry in {retry_after_secs}s")]
    ServiceUnavailable {
        service: String,
        retry_after_secs: u64,
    },

    #[error("{0}")]
    Internal(String),
}

impl From<GuardError> for EngineError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Open {
                service,
                retry_after_secs,
            } => EngineError::ServiceUnavailable {
                service,
                retry_after_secs,
            },
            GuardError::Failed { source, .. } => EngineError::Provider(source),
        }
    }
}
