//! When a match accepts predictions.
//!
//! The window opens 24 hours before the scheduled start and closes at the
//! start. An admin override opens it early but never reopens a match that has
//! already started.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const PREDICTION_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PredictionWindow {
    Open,
    NotYetOpen,
    Closed,
}

impl PredictionWindow {
    pub fn is_open(self) -> bool {
        self == PredictionWindow::Open
    }
}

/// Must be evaluated on every check: `now` keeps moving.
pub fn is_prediction_open(
    now: DateTime<Utc>,
    match_start: DateTime<Utc>,
    admin_override: bool,
) -> bool {
    prediction_window(now, match_start, admin_override).is_open()
}

pub fn prediction_window(
    now: DateTime<Utc>,
    match_start: DateTime<Utc>,
    admin_override: bool,
) -> PredictionWindow {
    let until_start = match_start - now;
    if until_start <= Duration::zero() {
        return PredictionWindow::Closed;
    }
    if admin_override || until_start <= Duration::hours(PREDICTION_WINDOW_HOURS) {
        PredictionWindow::Open
    } else {
        PredictionWindow::NotYetOpen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 14, 0, 0).unwrap()
    }

    #[test]
    fn open_inside_the_window_regardless_of_override() {
        for hours_before in [1, 12, 23] {
            let now = start() - Duration::hours(hours_before);
            assert!(is_prediction_open(now, start(), false));
            assert!(is_prediction_open(now, start(), true));
        }
        let one_second_before = start() - Duration::seconds(1);
        assert!(is_prediction_open(one_second_before, start(), false));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let now = start() - Duration::hours(24);
        assert!(is_prediction_open(now, start(), false));

        let just_outside = now - Duration::seconds(1);
        assert!(!is_prediction_open(just_outside, start(), false));
        assert_eq!(
            prediction_window(just_outside, start(), false),
            PredictionWindow::NotYetOpen
        );
    }

    #[test]
    fn override_opens_early() {
        let now = start() - Duration::days(5);
        assert!(!is_prediction_open(now, start(), false));
        assert!(is_prediction_open(now, start(), true));
    }

    #[test]
    fn closed_at_start() {
        assert!(!is_prediction_open(start(), start(), false));
        assert!(!is_prediction_open(start(), start(), true));
    }

    #[test]
    fn started_match_stays_closed_with_override() {
        let now = start() + Duration::minutes(30);
        assert_eq!(prediction_window(now, start(), true), PredictionWindow::Closed);
        assert!(!is_prediction_open(now + Duration::days(3), start(), true));
    }
}
