//! Error taxonomy of a scan
//!
//! - [`ProviderError`]: one inventory call failed
//! - [`FetchError`]: one region or record of a category failed; recorded
//!   into the category result, never aborts the category
//! - [`ScanError`]: aborts the whole scan (configuration, category timeout,
//!   category crash)

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Category, Region};

/// Failure of a single call against the inventory provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    #[error("DNS lookup of {name} failed: {message}")]
    Dns { name: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Api {
            operation,
            message: message.into(),
        }
    }

    pub fn dns(name: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Dns {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure of one unit of work inside a category: a region listing, or the
/// resolution of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub category: Category,
    pub region: Region,
    /// Record the failure belongs to, `None` for a whole-region failure
    pub subject: Option<String>,
    pub message: String,
}

impl FetchError {
    pub fn region(category: Category, region: Region, message: impl Into<String>) -> Self {
        Self {
            category,
            region,
            subject: None,
            message: message.into(),
        }
    }

    pub fn record(
        category: Category,
        region: Region,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            region,
            subject: Some(subject.into()),
            message: message.into(),
        }
    }

    /// True when the whole region was lost, not just one record
    pub fn is_regional(&self) -> bool {
        self.subject.is_none()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(
                f,
                "failed to resolve {} {} in region {}: {}",
                self.category, subject, self.region, self.message
            ),
            None => write!(
                f,
                "failed to fetch {} in region {}: {}",
                self.category, self.region, self.message
            ),
        }
    }
}

impl std::error::Error for FetchError {}

/// Joins every failure into one message, `None` when there are none.
pub fn combine(failures: &[FetchError]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }

    Some(
        failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Errors that abort a scan outright
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unable to enumerate regions: {0}")]
    RegionEnumeration(#[source] ProviderError),

    #[error("Timed out after {}s waiting for {category}", .timeout.as_secs_f64())]
    CategoryTimeout {
        category: Category,
        timeout: Duration,
    },

    #[error("{category} collector stopped without delivering a result: {reason}")]
    CategoryCrash { category: Category, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// Category that caused the abort, if any
    pub fn category(&self) -> Option<Category> {
        match self {
            ScanError::CategoryTimeout { category, .. } | ScanError::CategoryCrash { category, .. } => {
                Some(*category)
            }
            _ => None,
        }
    }

    /// True for failures that happen before any collector runs
    pub fn is_config(&self) -> bool {
        matches!(self, ScanError::Config(_) | ScanError::RegionEnumeration(_))
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
