//! In-memory inventory used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use domain_ip_costs::{
    AddressAttrs, AssociationTarget, Category, InstanceAttrs, InventoryProvider, LoadBalancerAttrs,
    LoadBalancerKind, NetworkInterfaceAttrs, ProviderError, ProviderResult, Region, ScanContext,
    TrafficMetric,
};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Span;

#[derive(Default)]
pub struct FakeInventory {
    regions: Vec<Region>,
    instances: HashMap<Region, Vec<InstanceAttrs>>,
    addresses: HashMap<Region, Vec<AddressAttrs>>,
    load_balancers: HashMap<Region, Vec<LoadBalancerAttrs>>,
    classic_load_balancers: HashMap<Region, Vec<LoadBalancerAttrs>>,
    interfaces: HashMap<Region, Vec<NetworkInterfaceAttrs>>,
    dns: HashMap<String, Vec<IpAddr>>,
    traffic: HashMap<String, u64>,
    failing: HashSet<(Category, Region)>,
    panicking: HashSet<(Category, Region)>,
    hanging: HashSet<Category>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeInventory {
    pub fn with_regions(names: &[&str]) -> Self {
        Self {
            regions: names.iter().map(|name| Region::from(*name)).collect(),
            ..Default::default()
        }
    }

    pub fn instance(mut self, region: &str, id: &str, public_ip: Option<&str>) -> Self {
        self.instances
            .entry(Region::from(region))
            .or_default()
            .push(InstanceAttrs {
                instance_id: id.to_string(),
                state: "running".to_string(),
                public_ip: public_ip.map(str::to_string),
                vpc_id: Some("vpc-1".to_string()),
                subnet_id: Some("subnet-1".to_string()),
                tags: vec![],
            });
        self
    }

    pub fn address(
        mut self,
        region: &str,
        ip: &str,
        association: Option<AssociationTarget>,
    ) -> Self {
        self.addresses
            .entry(Region::from(region))
            .or_default()
            .push(AddressAttrs {
                public_ip: ip.to_string(),
                allocation_id: Some(format!("eipalloc-{}", ip)),
                association,
                tags: vec![],
            });
        self
    }

    /// Application load balancer resolving to `ips`
    pub fn load_balancer(mut self, region: &str, name: &str, ips: &[&str]) -> Self {
        let dns_name = format!("{}.{}.elb.amazonaws.com", name, region);
        self.dns.insert(
            dns_name.clone(),
            ips.iter().map(|ip| ip.parse().unwrap()).collect(),
        );
        self.load_balancers
            .entry(Region::from(region))
            .or_default()
            .push(LoadBalancerAttrs {
                name: name.to_string(),
                kind: LoadBalancerKind::Application,
                dns_name,
                arn: Some(format!(
                    "arn:aws:elasticloadbalancing:{}:123456789012:loadbalancer/app/{}/1",
                    region, name
                )),
            });
        self
    }

    /// Classic load balancer whose DNS name does not resolve
    pub fn unresolvable_classic(mut self, region: &str, name: &str) -> Self {
        self.classic_load_balancers
            .entry(Region::from(region))
            .or_default()
            .push(LoadBalancerAttrs {
                name: name.to_string(),
                kind: LoadBalancerKind::Classic,
                dns_name: format!("{}.missing.elb.amazonaws.com", name),
                arn: None,
            });
        self
    }

    pub fn traffic(mut self, identifier: &str, bytes: u64) -> Self {
        self.traffic.insert(identifier.to_string(), bytes);
        self
    }

    pub fn interface(mut self, region: &str, id: &str, public_ip: Option<&str>) -> Self {
        self.interfaces
            .entry(Region::from(region))
            .or_default()
            .push(NetworkInterfaceAttrs {
                interface_id: id.to_string(),
                public_ip: public_ip.map(str::to_string),
                interface_type: Some("interface".to_string()),
                description: None,
            });
        self
    }

    pub fn failing(mut self, category: Category, region: &str) -> Self {
        self.failing.insert((category, Region::from(region)));
        self
    }

    pub fn panicking(mut self, category: Category, region: &str) -> Self {
        self.panicking.insert((category, Region::from(region)));
        self
    }

    /// Every listing of `category` blocks forever
    pub fn hanging(mut self, category: Category) -> Self {
        self.hanging.insert(category);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Outward calls made so far, region listing excluded
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn into_provider(self) -> Arc<FakeInventory> {
        Arc::new(self)
    }

    async fn enter(
        &self,
        category: Category,
        region: &Region,
        operation: &'static str,
    ) -> ProviderResult<InFlight<'_>> {
        let guard = self.track().await;

        if self.hanging.contains(&category) {
            std::future::pending::<()>().await;
        }
        let key = (category, region.clone());
        if self.panicking.contains(&key) {
            panic!("{} listing blew up in {}", category, region);
        }
        if self.failing.contains(&key) {
            return Err(ProviderError::api(operation, "UnauthorizedOperation"));
        }
        Ok(guard)
    }

    /// Counts one call against the in-flight gauge and applies the delay
    async fn track(&self) -> InFlight<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight::new(&self.in_flight, &self.peak_in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        guard
    }

    fn listed<T: Clone>(map: &HashMap<Region, Vec<T>>, region: &Region) -> Vec<T> {
        map.get(region).cloned().unwrap_or_default()
    }
}

struct InFlight<'a> {
    current: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn new(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { current }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventoryProvider for FakeInventory {
    async fn list_regions(&self) -> ProviderResult<Vec<Region>> {
        Ok(self.regions.clone())
    }

    async fn list_instances(&self, region: &Region) -> ProviderResult<Vec<InstanceAttrs>> {
        let _guard = self.enter(Category::Instances, region, "DescribeInstances").await?;
        Ok(Self::listed(&self.instances, region))
    }

    async fn list_addresses(&self, region: &Region) -> ProviderResult<Vec<AddressAttrs>> {
        let _guard = self.enter(Category::ElasticIps, region, "DescribeAddresses").await?;
        Ok(Self::listed(&self.addresses, region))
    }

    async fn list_load_balancers(&self, region: &Region) -> ProviderResult<Vec<LoadBalancerAttrs>> {
        let _guard = self
            .enter(Category::LoadBalancers, region, "DescribeLoadBalancers")
            .await?;
        Ok(Self::listed(&self.load_balancers, region))
    }

    async fn list_classic_load_balancers(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<LoadBalancerAttrs>> {
        let _guard = self
            .enter(Category::LoadBalancers, region, "DescribeClassicLoadBalancers")
            .await?;
        Ok(Self::listed(&self.classic_load_balancers, region))
    }

    async fn list_network_interfaces(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<NetworkInterfaceAttrs>> {
        let _guard = self
            .enter(Category::NetworkInterfaces, region, "DescribeNetworkInterfaces")
            .await?;
        Ok(Self::listed(&self.interfaces, region))
    }

    async fn resolve_dns(&self, name: &str) -> ProviderResult<Vec<IpAddr>> {
        let _guard = self.track().await;
        self.dns
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::dns(name, "no such host"))
    }

    async fn query_traffic_metric(
        &self,
        _region: &Region,
        metric: &TrafficMetric,
    ) -> ProviderResult<u64> {
        let _guard = self.track().await;
        Ok(self.traffic.get(&metric.identifier).copied().unwrap_or_default())
    }
}

pub fn context(provider: Arc<FakeInventory>, max_in_flight: usize) -> ScanContext {
    let regions = provider.regions.clone();
    ScanContext::new(provider, regions, max_in_flight, Span::none())
}
