//! Public IPv4 cost scanning
//!
//! Discovers every resource holding a public IPv4 address across all
//! regions of an account, prices each address, and groups the results per
//! category:
//!
//! - EC2 instances (attached Elastic IPs included)
//! - Elastic IPs (idle ones carry a surcharge)
//! - Load balancers (one charge per address their DNS name resolves to)
//! - Elastic network interfaces
//!
//! Cloud access goes through the [`InventoryProvider`] trait. A scan is
//! driven by the [`ScatterGatherCoordinator`]:
//!
//! ```ignore
//! let coordinator = ScatterGatherCoordinator::new(provider, ScanSettings::from_env()?);
//! let snapshot = coordinator.scan().await?;
//! println!("{} addresses, {} per month", snapshot.total_count(), snapshot.total_cost());
//! ```

pub mod collectors;
pub mod context;
pub mod coordinator;
pub mod cost;
pub mod error;
pub mod models;
pub mod provider;
pub mod regions;
pub mod settings;
pub mod snapshot;

pub use context::ScanContext;
pub use coordinator::ScatterGatherCoordinator;
pub use cost::{Billable, CostModel};
pub use error::{FetchError, ProviderError, ProviderResult, ScanError, ScanResult};
pub use models::{
    AssociationTarget, Category, ElasticIpRecord, InstanceRecord, LoadBalancerKind,
    LoadBalancerRecord, Money, NetworkInterfaceRecord, Region, ResourceRecord, Tag, TrafficMetric,
};
pub use provider::{
    AddressAttrs, InstanceAttrs, InventoryProvider, LoadBalancerAttrs, NetworkInterfaceAttrs,
};
pub use regions::RegionEnumerator;
pub use settings::ScanSettings;
pub use snapshot::{CategoryResult, Snapshot};
