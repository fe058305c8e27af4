//! Unified error handling for tempvoice.
//!
//! Nothing in the lifecycle core is fatal: gateway failures degrade to a
//! logged no-op, capacity exhaustion aborts a single provisioning attempt.
//! These types exist so callers (and tests) can see *why* something was
//! skipped, and so metrics get stable labels.

use thiserror::Error;

// ============================================================================
// Gateway Errors (platform calls)
// ============================================================================

/// Errors returned by a [`Gateway`](crate::gateway::Gateway) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The channel (or guild) is not known to the platform.
    #[error("not found")]
    NotFound,

    /// The platform rejected or failed the request.
    #[error("platform request failed: {0}")]
    Http(String),

    /// An identifier could not be interpreted by the platform adapter.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Guild state is not available in the local cache.
    #[error("guild not cached: {0}")]
    MissingCache(String),
}

impl GatewayError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Http(_) => "http",
            Self::InvalidId(_) => "invalid_id",
            Self::MissingCache(_) => "missing_cache",
        }
    }

    /// Whether this error means the remote object is gone.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

// ============================================================================
// Provisioning Errors (lobby handler)
// ============================================================================

/// Why a single provisioning attempt aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// The guild already holds `max_channels_per_guild` temporary channels.
    #[error("guild is at capacity")]
    AtCapacity,

    /// The platform refused to create the channel; the slot was released.
    #[error("channel creation failed: {0}")]
    CreateFailed(GatewayError),
}

impl ProvisionError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AtCapacity => "at_capacity",
            Self::CreateFailed(_) => "create_failed",
        }
    }
}
