use thiserror::Error;

/// Error type for the composition runtime.
///
/// Duplicate registration and missing modules are deliberately *not* errors
/// (the first is a logged diagnostic, the second an absent result); the only
/// hard failures are initializer/method failures surfacing out of an
/// instantiation or call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The named member exists but is not a method.
    #[error("member '{0}' is not callable")]
    NotCallable(String),

    /// A bound method was invoked after its receiver was dropped.
    #[error("bound receiver no longer exists")]
    DeadReceiver,

    /// Failure raised by collaborator-supplied initializers or methods.
    #[error("{0}")]
    Message(String),
}

impl CoreError {
    /// Build a [`CoreError::Message`] from anything string-like.
    pub fn msg(message: impl Into<String>) -> Self {
        CoreError::Message(message.into())
    }
}
