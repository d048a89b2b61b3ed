//! Scan settings

use core_config::{env_list, env_parse, ConfigError, FromEnv};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::Category;

/// Default wait for one category before the scan is abandoned
pub const DEFAULT_CATEGORY_TIMEOUT: Duration = Duration::from_secs(20);

/// Default cap on concurrent outward calls per category
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    /// Timeout applied to every category without an override
    pub category_timeout: Duration,
    /// Per-category timeout overrides
    pub category_timeouts: BTreeMap<Category, Duration>,
    /// Maximum concurrent region/record tasks per category
    pub max_in_flight: usize,
    /// Restrict the scan to these regions (all visible regions when `None`)
    pub regions: Option<Vec<String>>,
}

impl ScanSettings {
    pub fn timeout_for(&self, category: Category) -> Duration {
        self.category_timeouts
            .get(&category)
            .copied()
            .unwrap_or(self.category_timeout)
    }

    pub fn with_category_timeout(mut self, timeout: Duration) -> Self {
        self.category_timeout = timeout;
        self
    }

    /// Override the timeout of a single category
    pub fn with_timeout(mut self, category: Category, timeout: Duration) -> Self {
        self.category_timeouts.insert(category, timeout);
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = Some(regions);
        self
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            category_timeout: DEFAULT_CATEGORY_TIMEOUT,
            category_timeouts: BTreeMap::new(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            regions: None,
        }
    }
}

impl FromEnv for ScanSettings {
    /// Reads, all optional:
    /// - SCAN_CATEGORY_TIMEOUT_SECS: default 20
    /// - SCAN_<CATEGORY>_TIMEOUT_SECS: e.g. SCAN_LOAD_BALANCERS_TIMEOUT_SECS
    /// - SCAN_MAX_IN_FLIGHT: default 32
    /// - SCAN_REGIONS: comma-separated allow-list
    fn from_env() -> Result<Self, ConfigError> {
        let mut settings = ScanSettings::default();

        if let Some(secs) = env_parse::<u64>("SCAN_CATEGORY_TIMEOUT_SECS")? {
            settings.category_timeout = Duration::from_secs(secs);
        }

        for category in Category::ALL {
            let key = format!("SCAN_{}_TIMEOUT_SECS", category.env_key());
            if let Some(secs) = env_parse::<u64>(&key)? {
                settings
                    .category_timeouts
                    .insert(category, Duration::from_secs(secs));
            }
        }

        if let Some(max) = env_parse::<usize>("SCAN_MAX_IN_FLIGHT")? {
            if max == 0 {
                return Err(ConfigError::ParseError {
                    key: "SCAN_MAX_IN_FLIGHT".to_string(),
                    details: "must be at least 1".to_string(),
                });
            }
            settings.max_in_flight = max;
        }

        settings.regions = env_list("SCAN_REGIONS");

        Ok(settings)
    }
}
