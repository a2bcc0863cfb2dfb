use std::time::Duration;

use crate::error::{Error, Result};

/// Zoom and scale numbers for the viewer, validated once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    /// Scale applied to a freshly loaded model.
    pub default_scale: f32,
    /// Multiplier per zoom step; must be greater than 1.
    pub zoom_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// When set, an in-flight load is abandoned after this long.
    pub load_timeout: Option<Duration>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            default_scale: 0.1,
            zoom_factor: 1.2,
            min_scale: 1e-3,
            max_scale: 1e3,
            load_timeout: None,
        }
    }
}

impl ViewSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.zoom_factor.is_finite() || self.zoom_factor <= 1.0 {
            return Err(Error::InvalidSettings(format!(
                "zoom_factor must be greater than 1, got {}",
                self.zoom_factor
            )));
        }
        if !self.min_scale.is_finite() || self.min_scale <= 0.0 {
            return Err(Error::InvalidSettings(format!(
                "min_scale must be positive, got {}",
                self.min_scale
            )));
        }
        if !self.max_scale.is_finite() || self.max_scale < self.min_scale {
            return Err(Error::InvalidSettings(format!(
                "max_scale must be at least min_scale ({}), got {}",
                self.min_scale, self.max_scale
            )));
        }
        if self.default_scale < self.min_scale || self.default_scale > self.max_scale {
            return Err(Error::InvalidSettings(format!(
                "default_scale {} is outside [{}, {}]",
                self.default_scale, self.min_scale, self.max_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ViewSettings::default().validate().is_ok());
    }

    #[test]
    fn zoom_factor_of_one_is_rejected() {
        let settings = ViewSettings {
            zoom_factor: 1.0,
            ..ViewSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn inverted_scale_bounds_are_rejected() {
        let settings = ViewSettings {
            min_scale: 2.0,
            max_scale: 1.0,
            ..ViewSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn default_scale_outside_bounds_is_rejected() {
        let settings = ViewSettings {
            default_scale: 0.5,
            min_scale: 1.0,
            max_scale: 10.0,
            ..ViewSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
