/// Domain errors raised when a layout action cannot be applied.
///
/// Store mutators treat unknown ids as no-ops; these errors are for callers
/// that must report why an interaction was refused.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `id` is a panel id or a view module key, depending on `entity`.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}
