//! Sampling configuration

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Default cap on generated tokens: replies must fit one console line.
pub const DEFAULT_MAX_TOKENS: u32 = 50;

/// Generation options passed verbatim to the backend.
///
/// Only `max_tokens` is always set. The optional values are forwarded to
/// backends that understand them and silently ignored by the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Softmax temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Penalty applied to recently generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            top_p: None,
            repeat_penalty: None,
        }
    }
}

impl SamplingConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_repeat_penalty(mut self, penalty: f32) -> Self {
        self.repeat_penalty = Some(penalty);
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_tokens == 0 {
            return Err(DomainError::ZeroMaxTokens);
        }
        if let Some(t) = self.temperature
            && !(t.is_finite() && t >= 0.0)
        {
            return Err(DomainError::InvalidSampling {
                name: "temperature",
                value: t,
            });
        }
        if let Some(p) = self.top_p
            && !(p > 0.0 && p <= 1.0)
        {
            return Err(DomainError::InvalidSampling {
                name: "top_p",
                value: p,
            });
        }
        if let Some(r) = self.repeat_penalty
            && !(r.is_finite() && r > 0.0)
        {
            return Err(DomainError::InvalidSampling {
                name: "repeat_penalty",
                value: r,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.max_tokens, 50);
        assert!(sampling.temperature.is_none());
        assert!(sampling.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let sampling = SamplingConfig::default()
            .with_max_tokens(128)
            .with_temperature(0.7)
            .with_top_p(0.9)
            .with_repeat_penalty(1.1);
        assert_eq!(sampling.max_tokens, 128);
        assert_eq!(sampling.temperature, Some(0.7));
        assert_eq!(sampling.top_p, Some(0.9));
        assert_eq!(sampling.repeat_penalty, Some(1.1));
        assert!(sampling.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert_eq!(
            SamplingConfig::default().with_max_tokens(0).validate(),
            Err(DomainError::ZeroMaxTokens)
        );
        assert!(SamplingConfig::default().with_temperature(-0.1).validate().is_err());
        assert!(SamplingConfig::default().with_top_p(0.0).validate().is_err());
        assert!(SamplingConfig::default().with_top_p(1.5).validate().is_err());
        assert!(SamplingConfig::default().with_repeat_penalty(0.0).validate().is_err());
    }

    #[test]
    fn test_serde_skips_unset_options() {
        let json = serde_json::to_value(SamplingConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({"max_tokens": 50}));
    }
}
