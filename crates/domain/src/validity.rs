//! Validity window bounding when a grant authorizes anything.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use bastion_core::{AppError, AppResult};

/// Lifetime applied when a grant is created without an explicit expiry.
pub const DEFAULT_GRANT_LIFETIME_DAYS: i64 = 25_550;

/// Half-open validity window of a grant.
///
/// Both bounds are always populated and exclusive: a grant is not yet valid
/// at `date_start` and no longer valid at `date_expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    date_start: DateTime<Utc>,
    date_expired: DateTime<Utc>,
}

impl ValidityWindow {
    /// Creates a window, requiring `date_start < date_expired`.
    pub fn new(date_start: DateTime<Utc>, date_expired: DateTime<Utc>) -> AppResult<Self> {
        if date_start >= date_expired {
            return Err(AppError::Validation(format!(
                "date_start '{}' must be before date_expired '{}'",
                date_start.to_rfc3339(),
                date_expired.to_rfc3339()
            )));
        }

        Ok(Self {
            date_start,
            date_expired,
        })
    }

    /// Creates a window filling omitted bounds from the creation instant.
    pub fn with_defaults(
        created_at: DateTime<Utc>,
        date_start: Option<DateTime<Utc>>,
        date_expired: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        let date_start = date_start.unwrap_or(created_at);
        let date_expired = date_expired
            .unwrap_or_else(|| created_at + Duration::days(DEFAULT_GRANT_LIFETIME_DAYS));

        Self::new(date_start, date_expired)
    }

    /// Returns the exclusive lower bound.
    #[must_use]
    pub fn date_start(&self) -> DateTime<Utc> {
        self.date_start
    }

    /// Returns the exclusive upper bound.
    #[must_use]
    pub fn date_expired(&self) -> DateTime<Utc> {
        self.date_expired
    }

    /// Returns whether `now` lies strictly inside the window.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.date_start < now && now < self.date_expired
    }

    /// Returns whether `now` lies outside the window, bounds included.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.contains(now)
    }
}
