use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::DomainError;

/// Longest delay a jitter window may produce: one week.
pub const MAX_JITTER_SECS: f64 = 7.0 * 24.0 * 3600.0;

/// Closed interval, in seconds, from which every reschedule delay is drawn.
///
/// A fresh draw is taken on each reschedule so successive intervals of the
/// same task are independent and accounts never fall into lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterRange {
    min_secs: f64,
    max_secs: f64,
}

impl JitterRange {
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self, DomainError> {
        if !min_secs.is_finite() || !max_secs.is_finite() {
            return Err(DomainError::Validation(
                "Jitter bounds must be finite".to_string(),
            ));
        }
        if min_secs < 0.0 {
            return Err(DomainError::Validation(format!(
                "Jitter minimum must not be negative (got {min_secs})"
            )));
        }
        if min_secs > max_secs {
            return Err(DomainError::Validation(format!(
                "Jitter minimum {min_secs} exceeds maximum {max_secs}"
            )));
        }
        if max_secs > MAX_JITTER_SECS {
            return Err(DomainError::Validation(format!(
                "Jitter maximum {max_secs} exceeds {MAX_JITTER_SECS} seconds"
            )));
        }
        Ok(Self { min_secs, max_secs })
    }

    /// Fixed period, used by tests and startup offsets.
    pub fn fixed(secs: f64) -> Self {
        let secs = secs.clamp(0.0, MAX_JITTER_SECS);
        Self {
            min_secs: secs,
            max_secs: secs,
        }
    }

    pub(crate) const fn between(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> f64 {
        self.max_secs
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs_f64(self.max_secs)
    }

    pub fn next_delay(&self) -> Duration {
        self.next_delay_with(&mut rand::thread_rng())
    }

    pub fn next_delay_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_secs == self.max_secs {
            return Duration::from_secs_f64(self.min_secs);
        }
        Duration::from_secs_f64(rng.gen_range(self.min_secs..=self.max_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(JitterRange::new(10.0, 5.0).is_err());
        assert!(JitterRange::new(-1.0, 5.0).is_err());
        assert!(JitterRange::new(f64::NAN, 5.0).is_err());
        assert!(JitterRange::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn test_rejects_windows_longer_than_a_week() {
        assert!(JitterRange::new(1e13, 1e13).is_err());
        assert!(JitterRange::new(0.0, MAX_JITTER_SECS + 1.0).is_err());
        assert!(JitterRange::new(0.0, MAX_JITTER_SECS).is_ok());
        assert_eq!(JitterRange::fixed(1e13).max_secs(), MAX_JITTER_SECS);
    }

    #[test]
    fn test_draws_stay_within_bounds() {
        let range = JitterRange::new(307.0, 902.0).unwrap();
        for _ in 0..1_000 {
            let secs = range.next_delay().as_secs_f64();
            assert!((307.0..=902.0).contains(&secs), "draw {secs} out of range");
        }
    }

    #[test]
    fn test_draws_are_not_constant() {
        let range = JitterRange::new(678.0, 876.0).unwrap();
        let distinct: HashSet<u128> = (0..200)
            .map(|_| range.next_delay().as_millis())
            .collect();
        assert!(distinct.len() > 100, "only {} distinct draws", distinct.len());
    }

    #[test]
    fn test_degenerate_range_is_exact() {
        let range = JitterRange::fixed(7.0);
        assert_eq!(range.next_delay(), Duration::from_secs(7));
    }
}
