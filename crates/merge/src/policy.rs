use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ceiling on how far a geometry update may move a farm.
pub const DEFAULT_MAX_GEOMETRY_SHIFT_KM: f64 = 5.0;

/// Tunables for the merge engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    /// A geometry update whose representative point lies strictly further
    /// than this from the stored one is rejected and flagged.
    pub max_geometry_shift_km: f64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            max_geometry_shift_km: DEFAULT_MAX_GEOMETRY_SHIFT_KM,
        }
    }
}

impl MergePolicy {
    pub fn with_max_geometry_shift_km(mut self, km: f64) -> Self {
        self.max_geometry_shift_km = km;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.max_geometry_shift_km.is_finite() || self.max_geometry_shift_km < 0.0 {
            return Err(PolicyError::InvalidThreshold(self.max_geometry_shift_km));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("max_geometry_shift_km must be a finite, non-negative number (got {0})")]
    InvalidThreshold(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_five_km() {
        let policy = MergePolicy::default();
        assert_eq!(policy.max_geometry_shift_km, 5.0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn rejects_bad_thresholds() {
        for km in [-1.0, f64::NAN, f64::INFINITY] {
            let policy = MergePolicy::default().with_max_geometry_shift_km(km);
            assert!(policy.validate().is_err(), "{km} should be rejected");
        }
        assert!(MergePolicy::default()
            .with_max_geometry_shift_km(0.0)
            .validate()
            .is_ok());
    }
}
