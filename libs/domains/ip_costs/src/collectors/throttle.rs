//! Per-call admission for the outward calls of one category

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::ProviderResult;
use crate::models::{Region, TrafficMetric};
use crate::provider::{
    AddressAttrs, InstanceAttrs, InventoryProvider, LoadBalancerAttrs, NetworkInterfaceAttrs,
};

/// Wraps a provider so that at most `max_in_flight` of its calls run at
/// once, however many calls a single task issues concurrently.
pub(crate) struct Throttled {
    inner: Arc<dyn InventoryProvider>,
    permits: Semaphore,
}

impl Throttled {
    pub(crate) fn new(inner: Arc<dyn InventoryProvider>, max_in_flight: usize) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_in_flight.max(1)),
        }
    }

    async fn permit(&self) -> SemaphorePermit<'_> {
        // Owned by this wrapper and never closed
        self.permits
            .acquire()
            .await
            .expect("in-flight semaphore closed")
    }
}

#[async_trait]
impl InventoryProvider for Throttled {
    async fn list_regions(&self) -> ProviderResult<Vec<Region>> {
        let _permit = self.permit().await;
        self.inner.list_regions().await
    }

    async fn list_instances(&self, region: &Region) -> ProviderResult<Vec<InstanceAttrs>> {
        let _permit = self.permit().await;
        self.inner.list_instances(region).await
    }

    async fn list_addresses(&self, region: &Region) -> ProviderResult<Vec<AddressAttrs>> {
        let _permit = self.permit().await;
        self.inner.list_addresses(region).await
    }

    async fn list_load_balancers(&self, region: &Region) -> ProviderResult<Vec<LoadBalancerAttrs>> {
        let _permit = self.permit().await;
        self.inner.list_load_balancers(region).await
    }

    async fn list_classic_load_balancers(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<LoadBalancerAttrs>> {
        let _permit = self.permit().await;
        self.inner.list_classic_load_balancers(region).await
    }

    async fn list_network_interfaces(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<NetworkInterfaceAttrs>> {
        let _permit = self.permit().await;
        self.inner.list_network_interfaces(region).await
    }

    async fn resolve_dns(&self, name: &str) -> ProviderResult<Vec<IpAddr>> {
        let _permit = self.permit().await;
        self.inner.resolve_dns(name).await
    }

    async fn query_traffic_metric(
        &self,
        region: &Region,
        metric: &TrafficMetric,
    ) -> ProviderResult<u64> {
        let _permit = self.permit().await;
        self.inner.query_traffic_metric(region, metric).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockInventoryProvider;

    #[tokio::test]
    async fn test_calls_pass_through_and_release_permits() {
        let mut mock = MockInventoryProvider::new();
        mock.expect_list_instances()
            .times(3)
            .returning(|_| Ok(vec![InstanceAttrs::default()]));

        let throttled = Throttled::new(Arc::new(mock), 1);
        let region = Region::new("us-east-1");

        for _ in 0..3 {
            assert_eq!(throttled.list_instances(&region).await.unwrap().len(), 1);
        }
        assert_eq!(throttled.permits.available_permits(), 1);
    }

    #[test]
    fn test_zero_cap_admits_one_call() {
        let throttled = Throttled::new(Arc::new(MockInventoryProvider::new()), 0);
        assert_eq!(throttled.permits.available_permits(), 1);
    }
}
