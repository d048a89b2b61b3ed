//! Configuration for the IPv4 cost scanner

use clap::Args;
use core_config::{env_or_default, ConfigError, Environment, FromEnv};
use domain_ip_costs::ScanSettings;
use eyre::{Result, WrapErr};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub aws: AwsConfig,
    pub scan: ScanSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwsConfig {
    /// Region used for region discovery; every scanned region gets its own client
    pub home_region: String,
    /// Named profile from the shared config files
    pub profile: Option<String>,
}

fn default_home_region() -> &'static str {
    "us-east-1"
}

impl FromEnv for AwsConfig {
    /// Reads:
    /// - AWS_REGION: defaults to us-east-1
    /// - AWS_PROFILE: optional
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            home_region: env_or_default("AWS_REGION", default_home_region()),
            profile: std::env::var("AWS_PROFILE").ok().filter(|p| !p.is_empty()),
        })
    }
}

/// Scan flags shared by every command. Each one overrides its environment
/// counterpart.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Regions to scan. Defaults to every region visible to the credentials.
    #[arg(short = 'R', long, value_delimiter = ',', global = true)]
    pub regions: Option<Vec<String>>,

    /// Seconds to wait for each resource category
    #[arg(long, value_name = "SECS", global = true)]
    pub category_timeout: Option<u64>,

    /// Maximum concurrent API calls per category
    #[arg(long, value_name = "N", global = true)]
    pub max_in_flight: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            environment: Environment::from_env(),
            aws: AwsConfig::from_env().wrap_err("Invalid AWS configuration")?,
            scan: ScanSettings::from_env().wrap_err("Invalid scan configuration")?,
        })
    }

    /// Apply command line overrides on top of the environment
    pub fn with_args(mut self, args: &ScanArgs) -> Self {
        if let Some(regions) = &args.regions {
            self.scan = self.scan.with_regions(regions.clone());
        }
        if let Some(secs) = args.category_timeout {
            self.scan = self.scan.with_category_timeout(Duration::from_secs(secs));
        }
        if let Some(max) = args.max_in_flight {
            self.scan = self.scan.with_max_in_flight(max);
        }
        self
    }
}
