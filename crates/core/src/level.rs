//! The bounded proficiency scale shared by set items and position requirements.
//!
//! One inclusive scale is configured per deployment (default `1..=5`) and
//! every level written through the engine is validated against it.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Level;

/// Lowest level on the default scale.
pub const DEFAULT_LEVEL_MIN: Level = 1;

/// Highest level on the default scale.
pub const DEFAULT_LEVEL_MAX: Level = 5;

/// An inclusive `min..=max` range of valid required levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelScale {
    min: Level,
    max: Level,
}

impl LevelScale {
    /// Build a scale, rejecting an empty range.
    pub fn new(min: Level, max: Level) -> Result<Self, CoreError> {
        if min > max {
            return Err(CoreError::Validation(format!(
                "Level scale minimum {min} exceeds maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Level {
        self.min
    }

    pub fn max(&self) -> Level {
        self.max
    }

    pub fn contains(&self, level: Level) -> bool {
        (self.min..=self.max).contains(&level)
    }

    /// Fail with [`CoreError::InvalidLevel`] when `level` is off the scale.
    pub fn validate(&self, level: Level) -> Result<(), CoreError> {
        if self.contains(level) {
            Ok(())
        } else {
            Err(CoreError::InvalidLevel {
                level,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for LevelScale {
    fn default() -> Self {
        Self {
            min: DEFAULT_LEVEL_MIN,
            max: DEFAULT_LEVEL_MAX,
        }
    }
}
