//! The immutable description of one fix request.

use crate::error::FixError;
use std::ops::RangeInclusive;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const MAX_OUTPUT_TOKENS_RANGE: RangeInclusive<u32> = 1..=8192;

pub const DEFAULT_SHELL: &str = "powershell";

/// Checks that `value` is a finite temperature inside [`TEMPERATURE_RANGE`].
pub fn check_temperature(value: f64) -> Result<f64, String> {
    if value.is_finite() && TEMPERATURE_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "temperature must be between {} and {}, got {}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end(),
            value
        ))
    }
}

pub fn check_max_output_tokens(value: u32) -> Result<u32, String> {
    if MAX_OUTPUT_TOKENS_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "max_output_tokens must be between {} and {}, got {}",
            MAX_OUTPUT_TOKENS_RANGE.start(),
            MAX_OUTPUT_TOKENS_RANGE.end(),
            value
        ))
    }
}

pub fn check_model(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err("model must not be empty".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Model parameters for one generation call. Fields are private so the
/// ranges can only be established through [`GenerationParams::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    model: String,
    temperature: f64,
    max_output_tokens: u32,
}

impl GenerationParams {
    pub fn new(model: &str, temperature: f64, max_output_tokens: u32) -> Result<Self, FixError> {
        Ok(Self {
            model: check_model(model).map_err(FixError::InvalidInput)?,
            temperature: check_temperature(temperature).map_err(FixError::InvalidInput)?,
            max_output_tokens: check_max_output_tokens(max_output_tokens)
                .map_err(FixError::InvalidInput)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }
}

/// A fix request as received from the calling shell. The command and error
/// payloads are still encoded; decoding happens in the router.
#[derive(Debug, Clone)]
pub struct FixRequest {
    pub target_shell: String,
    pub last_command_b64: String,
    pub error_output_b64: String,
    pub params: GenerationParams,
}
