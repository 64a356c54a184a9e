//! Age-based classification of memory rows.
//!
//! Rows are never deleted. At query time each row is labelled `active`,
//! `decayed`, or `expired` from the whole days elapsed since `updated_at`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specbrain_core::config::DecayWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayStatus {
    Active,
    Decayed,
    Expired,
}

impl DecayStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Decayed => "decayed",
            Self::Expired => "expired",
        }
    }

    /// Whether callers should still act on the row.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Expired)
    }
}

impl fmt::Display for DecayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row annotated with its decay status and age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decayed<T> {
    pub row: T,
    pub status: DecayStatus,
    pub age_days: i64,
}

/// Whole days between `since` and `now`; clock skew never yields a negative age.
pub fn age_days(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_days().max(0)
}

/// Classify an age against a window. Thresholds are inclusive.
pub fn classify(age_days: i64, window: DecayWindow) -> DecayStatus {
    if let Some(expire) = window.expire_days {
        if age_days >= i64::from(expire) {
            return DecayStatus::Expired;
        }
    }
    if age_days >= i64::from(window.decay_days) {
        DecayStatus::Decayed
    } else {
        DecayStatus::Active
    }
}

/// Annotate a row last touched at `updated_at`.
pub fn annotate<T>(row: T, updated_at: DateTime<Utc>, now: DateTime<Utc>, window: DecayWindow) -> Decayed<T> {
    let age = age_days(updated_at, now);
    Decayed {
        row,
        status: classify(age, window),
        age_days: age,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const LEXICON: DecayWindow = DecayWindow::new(90, Some(180));
    const URLS: DecayWindow = DecayWindow::new(120, None);

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(classify(0, LEXICON), DecayStatus::Active);
        assert_eq!(classify(89, LEXICON), DecayStatus::Active);
        assert_eq!(classify(90, LEXICON), DecayStatus::Decayed);
        assert_eq!(classify(179, LEXICON), DecayStatus::Decayed);
        assert_eq!(classify(180, LEXICON), DecayStatus::Expired);
    }

    #[test]
    fn windows_without_expiry_never_expire() {
        assert_eq!(classify(10_000, URLS), DecayStatus::Decayed);
        assert!(classify(10_000, URLS).is_usable());
        assert!(!classify(180, LEXICON).is_usable());
    }

    #[test]
    fn future_timestamps_count_as_fresh() {
        let now = Utc::now();
        let d = annotate("x", now + Duration::days(3), now, LEXICON);
        assert_eq!(d.age_days, 0);
        assert_eq!(d.status, DecayStatus::Active);
    }
}
