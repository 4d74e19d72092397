// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serializable configuration for the partitioned and retry executors.
//!
//! Builders stay the primary surface; these documents exist so tools can keep
//! executor settings in JSON and convert them into builders at call time.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::partition::resolve_divisions;
use crate::retry::{Backoff, DEFAULT_GROWTH_FACTOR};

/// Error type for config decoding and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A uniform range whose lower bound exceeds its upper bound.
    #[error("uniform range is inverted: {low_ms}ms > {high_ms}ms")]
    InvertedRange {
        /// Configured lower bound.
        low_ms: u64,
        /// Configured upper bound.
        high_ms: u64,
    },
    /// Exponential growth factor of zero.
    #[error("exponential growth factor must be at least 1")]
    ZeroFactor,
}

const fn default_factor() -> u32 {
    DEFAULT_GROWTH_FACTOR
}

/// Concurrency settings for [`PartitionedExecutor`](crate::PartitionedExecutor).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionConfig {
    /// Upper bound on partitions; `None` uses available parallelism.
    #[serde(default)]
    pub max_concurrency: Option<NonZeroUsize>,
}

impl PartitionConfig {
    /// Partition count this config resolves to on the current machine.
    pub fn divisions(&self) -> usize {
        resolve_divisions(self.max_concurrency.map(NonZeroUsize::get))
    }
}

/// Serializable backoff policy. Custom policies are code-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum BackoffSpec {
    /// Constant delay.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Uniformly random delay in `[low_ms, high_ms]`.
    FixedUniform {
        /// Inclusive lower bound.
        low_ms: u64,
        /// Inclusive upper bound.
        high_ms: u64,
    },
    /// `initial_ms * factor^(attempt - 1)`.
    Exponential {
        /// First delay.
        initial_ms: u64,
        /// Growth factor.
        #[serde(default = "default_factor")]
        factor: u32,
    },
    /// Exponential growth from a uniformly random first delay.
    ExponentialUniform {
        /// Inclusive lower bound of the first delay.
        low_ms: u64,
        /// Inclusive upper bound of the first delay.
        high_ms: u64,
        /// Growth factor.
        #[serde(default = "default_factor")]
        factor: u32,
    },
}

impl Default for BackoffSpec {
    fn default() -> Self {
        Self::Fixed { delay_ms: 0 }
    }
}

impl BackoffSpec {
    /// Rejects inverted ranges and zero growth factors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Fixed { .. } => Ok(()),
            Self::FixedUniform { low_ms, high_ms } => check_range(low_ms, high_ms),
            Self::Exponential { factor, .. } => check_factor(factor),
            Self::ExponentialUniform {
                low_ms,
                high_ms,
                factor,
            } => {
                check_range(low_ms, high_ms)?;
                check_factor(factor)
            }
        }
    }

    /// The runtime policy these settings describe.
    pub fn to_backoff<'a, E>(&self) -> Backoff<'a, E> {
        let ms = Duration::from_millis;
        match *self {
            Self::Fixed { delay_ms } => Backoff::fixed(ms(delay_ms)),
            Self::FixedUniform { low_ms, high_ms } => {
                Backoff::fixed_uniform(ms(low_ms), ms(high_ms))
            }
            Self::Exponential { initial_ms, factor } => {
                Backoff::exponential(ms(initial_ms), factor)
            }
            Self::ExponentialUniform {
                low_ms,
                high_ms,
                factor,
            } => Backoff::exponential_uniform(ms(low_ms), ms(high_ms), factor),
        }
    }
}

fn check_range(low_ms: u64, high_ms: u64) -> Result<(), ConfigError> {
    if low_ms > high_ms {
        return Err(ConfigError::InvertedRange { low_ms, high_ms });
    }
    Ok(())
}

fn check_factor(factor: u32) -> Result<(), ConfigError> {
    if factor == 0 {
        return Err(ConfigError::ZeroFactor);
    }
    Ok(())
}

/// Settings for [`RetryExecutor::from_config`](crate::RetryExecutor::from_config).
///
/// When both `max_attempts` and `minimum_total_lifetime_ms` are present the
/// lifetime wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Name used in log fields; random when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Backoff policy.
    #[serde(default)]
    pub backoff: BackoffSpec,
    /// Attempt limit; unbounded when absent.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Ceiling for any single delay.
    #[serde(default)]
    pub max_backoff_ms: Option<u64>,
    /// Derive the attempt budget from a total backoff lifetime.
    #[serde(default)]
    pub minimum_total_lifetime_ms: Option<u64>,
    /// RNG seed for uniform policies.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RetryConfig {
    /// Validates the backoff settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backoff.validate()
    }
}

/// Top-level config document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrideConfig {
    /// Partitioned executor settings.
    #[serde(default)]
    pub partition: PartitionConfig,
    /// Retry executor settings.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl StrideConfig {
    /// Decode and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.retry.validate()?;
        Ok(config)
    }

    /// Decode and validate JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.retry.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
