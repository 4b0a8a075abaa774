use chrono::{DateTime, Utc};

/// Time source injected into orchestration code.
///
/// Pure evaluators never read it; they take the instant as an argument.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}
