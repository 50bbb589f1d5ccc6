// ⏰ Past-Instant Validation
//
// Decides whether a scheduled instant is acceptable for a new (or moved)
// event or news item. "Now" is always passed in, never read here.

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;

use crate::error::ScheduleError;
use crate::schedule::EventInstant;

/// Default tolerance for clock skew and submission latency
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 5;

/// Largest window configuration accepts (one day)
pub const MAX_TOLERANCE_MINUTES: i64 = 24 * 60;

// ============================================================================
// CLOCK
// ============================================================================

/// Source of "now" in local wall time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the machine's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always answers the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PastPolicy {
    /// Reject anything at or before now
    Strict,
    /// Reject only what is earlier than `now - window`
    Tolerance(Duration),
}

impl PastPolicy {
    /// Window of `minutes`, clamped to `0..=MAX_TOLERANCE_MINUTES`
    pub fn tolerance_minutes(minutes: i64) -> Self {
        let minutes = minutes.clamp(0, MAX_TOLERANCE_MINUTES);
        PastPolicy::Tolerance(Duration::minutes(minutes))
    }

    pub fn name(&self) -> &'static str {
        match self {
            PastPolicy::Strict => "strict",
            PastPolicy::Tolerance(_) => "tolerance",
        }
    }
}

impl Default for PastPolicy {
    fn default() -> Self {
        PastPolicy::tolerance_minutes(DEFAULT_TOLERANCE_MINUTES)
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Outcome of a check; `reason` is set only on rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    fn accept() -> Self {
        Verdict {
            accepted: true,
            reason: None,
        }
    }

    fn reject(reason: String) -> Self {
        Verdict {
            accepted: false,
            reason: Some(reason),
        }
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PastInstantValidator {
    policy: PastPolicy,
}

impl PastInstantValidator {
    pub fn new(policy: PastPolicy) -> Self {
        PastInstantValidator { policy }
    }

    pub fn policy(&self) -> PastPolicy {
        self.policy
    }

    pub fn check(&self, instant: &EventInstant, now: NaiveDateTime) -> Verdict {
        let at = instant.as_naive();

        match self.policy {
            PastPolicy::Strict => {
                if at <= now {
                    return Verdict::reject(format!(
                        "Scheduled date and time ({}) must be in the future",
                        describe(instant)
                    ));
                }
            }
            PastPolicy::Tolerance(window) => {
                // No representable cutoff means nothing is too early
                let Some(cutoff) = now.checked_sub_signed(window) else {
                    return Verdict::accept();
                };

                if at < cutoff {
                    return Verdict::reject(format!(
                        "Scheduled date and time ({}) is in the past; allowed slack is {} minute(s)",
                        describe(instant),
                        window.num_minutes()
                    ));
                }
            }
        }

        Verdict::accept()
    }

    /// Same decision as [`check`](Self::check), as a `Result`
    pub fn ensure(&self, instant: &EventInstant, now: NaiveDateTime) -> Result<(), ScheduleError> {
        let verdict = self.check(instant, now);
        match verdict.reason {
            Some(reason) if !verdict.accepted => Err(ScheduleError::EventInPast { reason }),
            _ => Ok(()),
        }
    }
}

fn describe(instant: &EventInstant) -> String {
    format!("{} {}", instant.date_string(), instant.time_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::combine;

    fn instant() -> EventInstant {
        combine("2025-12-27", "16:32").unwrap()
    }

    fn at(seconds_offset: i64) -> NaiveDateTime {
        instant().as_naive() + Duration::seconds(seconds_offset)
    }

    #[test]
    fn test_one_second_ahead_is_accepted_by_both_policies() {
        // instant = now + 1s
        let now = at(-1);

        let strict = PastInstantValidator::new(PastPolicy::Strict);
        let tolerant = PastInstantValidator::default();

        assert!(strict.check(&instant(), now).accepted);
        assert!(tolerant.check(&instant(), now).accepted);
    }

    #[test]
    fn test_one_second_behind_splits_the_policies() {
        // instant = now - 1s
        let now = at(1);

        let strict = PastInstantValidator::new(PastPolicy::Strict);
        let verdict = strict.check(&instant(), now);
        assert!(!verdict.accepted);
        assert!(verdict.reason.unwrap().contains("2025-12-27 16:32"));

        let tolerant = PastInstantValidator::default();
        assert_eq!(tolerant.check(&instant(), now), Verdict::accept());
    }

    #[test]
    fn test_strict_rejects_exactly_now() {
        let strict = PastInstantValidator::new(PastPolicy::Strict);
        assert!(!strict.check(&instant(), at(0)).accepted);
    }

    #[test]
    fn test_tolerance_boundary() {
        let tolerant = PastInstantValidator::default();

        // Exactly five minutes late is still inside the window
        assert!(tolerant.check(&instant(), at(5 * 60)).accepted);
        assert!(!tolerant.check(&instant(), at(5 * 60 + 1)).accepted);
    }

    #[test]
    fn test_configurable_window() {
        let tolerant = PastInstantValidator::new(PastPolicy::tolerance_minutes(30));

        assert!(tolerant.check(&instant(), at(29 * 60)).accepted);
        let verdict = tolerant.check(&instant(), at(31 * 60));
        assert!(!verdict.accepted);
        assert!(verdict.reason.unwrap().contains("30 minute"));
    }

    #[test]
    fn test_oversized_window_never_panics() {
        let clamped = PastPolicy::tolerance_minutes(i64::MAX);
        assert_eq!(clamped, PastPolicy::tolerance_minutes(MAX_TOLERANCE_MINUTES));

        let huge = PastInstantValidator::new(PastPolicy::Tolerance(Duration::MAX));
        assert!(huge.check(&instant(), at(365 * 24 * 60 * 60)).accepted);
        assert!(huge.ensure(&instant(), NaiveDateTime::MAX).is_ok());
    }

    #[test]
    fn test_reason_names_no_record_kind() {
        let verdict = PastInstantValidator::default().check(&instant(), at(3600));
        assert!(verdict.reason.unwrap().starts_with("Scheduled date and time (2025-12-27 16:32)"));
    }

    #[test]
    fn test_midnight_new_year_against_mocked_now() {
        let new_year = combine("2025-01-01", "00:00").unwrap();
        let validator = PastInstantValidator::default();

        let before = combine("2024-12-31", "23:00").unwrap().as_naive();
        let after = combine("2025-01-02", "00:00").unwrap().as_naive();

        assert!(validator.check(&new_year, before).accepted);
        assert!(!validator.check(&new_year, after).accepted);
    }

    #[test]
    fn test_check_is_idempotent() {
        let validator = PastInstantValidator::new(PastPolicy::Strict);
        let subject = instant();
        let now = at(60);

        let first = validator.check(&subject, now);
        let second = validator.check(&subject, now);

        assert_eq!(first, second);
        assert_eq!(subject, instant());
    }

    #[test]
    fn test_ensure_maps_to_event_in_past() {
        let validator = PastInstantValidator::new(PastPolicy::Strict);

        assert!(validator.ensure(&instant(), at(-60)).is_ok());
        let err = validator.ensure(&instant(), at(60)).unwrap_err();
        assert_eq!(err.kind(), "event_in_past");
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(at(0));
        assert_eq!(clock.now(), instant().as_naive());
        assert_eq!(PastPolicy::default().name(), "tolerance");
    }
}
