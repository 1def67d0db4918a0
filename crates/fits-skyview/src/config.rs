//! Rendering configuration.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default contrast constant `k` for [`Stretch::Log`].
pub const DEFAULT_LOG_CONTRAST: f64 = 1000.0;

/// Intensity transfer applied to normalized samples in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Stretch {
    /// `f(t) = t`
    Linear,
    /// `f(t) = sqrt(t)`
    #[default]
    Sqrt,
    /// `f(t) = ln(1 + k t) / ln(1 + k)`
    Log,
}

impl Stretch {
    /// Apply the transfer to `t`, which must already lie in `[0, 1]`.
    pub fn apply(self, t: f64, log_contrast: f64) -> f64 {
        match self {
            Stretch::Linear => t,
            Stretch::Sqrt => t.sqrt(),
            Stretch::Log => (log_contrast * t).ln_1p() / log_contrast.ln_1p(),
        }
    }
}

impl fmt::Display for Stretch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stretch::Linear => "linear",
            Stretch::Sqrt => "sqrt",
            Stretch::Log => "log",
        })
    }
}

impl FromStr for Stretch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Stretch::Linear),
            "sqrt" => Ok(Stretch::Sqrt),
            "log" => Ok(Stretch::Log),
            other => Err(Error::InvalidConfig(format!("unknown stretch {other:?}"))),
        }
    }
}

/// How raw samples become display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub stretch: Stretch,
    /// Reverse row order so the first stored row (the bottom of the sky
    /// image) ends up at the bottom of the display.
    pub flip_rows: bool,
    /// Contrast constant for [`Stretch::Log`]; must be finite and positive.
    pub log_contrast: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            stretch: Stretch::default(),
            flip_rows: true,
            log_contrast: DEFAULT_LOG_CONTRAST,
        }
    }
}

impl RenderConfig {
    pub fn with_stretch(mut self, stretch: Stretch) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn with_flip_rows(mut self, flip_rows: bool) -> Self {
        self.flip_rows = flip_rows;
        self
    }

    pub fn with_log_contrast(mut self, log_contrast: f64) -> Self {
        self.log_contrast = log_contrast;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.log_contrast.is_finite() || self.log_contrast <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "log_contrast must be finite and positive, got {}",
                self.log_contrast
            )));
        }
        Ok(())
    }
}
