#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// All connection attempts were exhausted.
    #[error("failed to connect after {attempts} attempts")]
    ConnectFailed { attempts: usize },

    /// The transport task has exited; no further messages can be sent.
    #[error("connection closed")]
    Closed,
}
