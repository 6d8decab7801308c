use x121_layout_client::LayoutApiError;
use x121_layout_core::error::CoreError;
use x121_layout_core::types::DbId;

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The persistence service failed or rejected the request.
    #[error(transparent)]
    Api(#[from] LayoutApiError),

    /// A domain-level error from the layout core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The active layout changed while the request was in flight, so its
    /// response was not applied.
    #[error("Layout session changed before the response for layout {layout_id:?} arrived")]
    Stale { layout_id: Option<DbId> },
}

impl EngineError {
    /// `true` when retrying the same operation later might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.is_retryable(),
            Self::Core(_) | Self::Stale { .. } => false,
        }
    }
}
