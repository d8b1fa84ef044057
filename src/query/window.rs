//! Resolution of a `last_modified` time window from an optional explicit
//! start point and a duration.

use super::duration::HumanDuration;
use super::filter::{Condition, Filter};
use chrono::{DateTime, Utc};

/// Field the resolved window filters against.
pub const LAST_MODIFIED_FIELD: &str = "last_modified";

/// An inclusive time range; `end` unset means "on or after `start`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Compute the time window for a query, anchored to `now` when no explicit
/// start point is given.
///
/// - no start point, duration > 0: the last `duration` ending at `now`
/// - no start point, duration == 0: no window at all
/// - explicit start, duration > 0: `duration` forward from the start
/// - explicit start, duration == 0: open-ended from the start
pub fn resolve_window(
    start_point: Option<DateTime<Utc>>,
    duration: HumanDuration,
    now: DateTime<Utc>,
) -> Option<TimeWindow> {
    match start_point {
        None => {
            if duration.is_positive() {
                Some(TimeWindow {
                    start: now - duration.as_duration(),
                    end: Some(now),
                })
            } else {
                None
            }
        }
        Some(start) => {
            let end = duration
                .is_positive()
                .then(|| start + duration.as_duration());
            Some(TimeWindow { start, end })
        }
    }
}

impl TimeWindow {
    /// Merge this window into `filter` as a range condition on
    /// [`LAST_MODIFIED_FIELD`].
    pub fn apply(self, filter: &mut Filter) {
        filter.insert(
            LAST_MODIFIED_FIELD,
            Condition::Range {
                start: self.start,
                end: self.end,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn duration_only_anchors_to_now() {
        let now = at("2025-11-04T12:00:00Z");
        let window = resolve_window(None, "7h".parse().unwrap(), now).unwrap();
        assert_eq!(window.start, now - Duration::hours(7));
        assert_eq!(window.end, Some(now));
    }

    #[test]
    fn neither_start_nor_duration_yields_no_window() {
        let now = at("2025-11-04T12:00:00Z");
        assert!(resolve_window(None, HumanDuration::zero(), now).is_none());
    }

    #[test]
    fn explicit_start_with_duration_extends_forward() {
        let now = at("2025-12-01T00:00:00Z");
        let start = at("2025-11-04T00:00:00Z");
        let window = resolve_window(Some(start), "10h".parse().unwrap(), now).unwrap();
        assert_eq!(window.start, start);
        assert_eq!(window.end, Some(at("2025-11-04T10:00:00Z")));
    }

    #[test]
    fn explicit_start_alone_is_open_ended() {
        let now = at("2025-12-01T00:00:00Z");
        let start = at("2025-11-04T00:00:00Z");
        let window = resolve_window(Some(start), HumanDuration::zero(), now).unwrap();
        assert_eq!(window.start, start);
        assert_eq!(window.end, None);
    }

    #[test]
    fn apply_sets_the_last_modified_condition() {
        let start = at("2025-11-04T00:00:00Z");
        let mut filter = Filter::new();
        TimeWindow { start, end: None }.apply(&mut filter);
        assert_eq!(
            filter.get(LAST_MODIFIED_FIELD),
            Some(&Condition::Range { start, end: None })
        );
    }
}
