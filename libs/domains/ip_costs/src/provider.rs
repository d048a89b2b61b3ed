//! Inventory provider interface
//!
//! The scan engine never talks to a cloud API directly. It consumes an
//! [`InventoryProvider`]; the binary supplies the AWS implementation and
//! tests supply in-memory ones.

use async_trait::async_trait;
use std::net::IpAddr;

use crate::error::ProviderResult;
use crate::models::{AssociationTarget, LoadBalancerKind, Region, Tag, TrafficMetric};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceAttrs {
    pub instance_id: String,
    pub state: String,
    pub public_ip: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressAttrs {
    pub public_ip: String,
    pub allocation_id: Option<String>,
    /// Instance or NAT gateway using the address, resolved by the provider
    pub association: Option<AssociationTarget>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancerAttrs {
    pub name: String,
    pub kind: LoadBalancerKind,
    pub dns_name: String,
    /// ARN for ELBv2 load balancers, `None` for classic ones
    pub arn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInterfaceAttrs {
    pub interface_id: String,
    pub public_ip: Option<String>,
    pub interface_type: Option<String>,
    pub description: Option<String>,
}

/// Source of inventory and metrics for a scan.
///
/// Every method is one outward call and may block; implementations must not
/// retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Regions visible under the active credentials
    async fn list_regions(&self) -> ProviderResult<Vec<Region>>;

    async fn list_instances(&self, region: &Region) -> ProviderResult<Vec<InstanceAttrs>>;

    async fn list_addresses(&self, region: &Region) -> ProviderResult<Vec<AddressAttrs>>;

    /// Application, network and gateway load balancers
    async fn list_load_balancers(&self, region: &Region) -> ProviderResult<Vec<LoadBalancerAttrs>>;

    async fn list_classic_load_balancers(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<LoadBalancerAttrs>>;

    async fn list_network_interfaces(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<NetworkInterfaceAttrs>>;

    /// Addresses a DNS name currently resolves to
    async fn resolve_dns(&self, name: &str) -> ProviderResult<Vec<IpAddr>>;

    /// Bytes processed over the metric window
    async fn query_traffic_metric(
        &self,
        region: &Region,
        metric: &TrafficMetric,
    ) -> ProviderResult<u64>;
}
