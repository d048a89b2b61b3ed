use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::IpAddr;
use tracing::debug;

use super::{CategorySource, RegionListing, Resolution};
use crate::cost::{Billable, CostModel};
use crate::error::{FetchError, ProviderError};
use crate::models::{Category, LoadBalancerRecord, Region, ResourceRecord, TrafficMetric};
use crate::provider::{InventoryProvider, LoadBalancerAttrs};

/// ELBv2 and classic load balancers, billed per address their public DNS
/// name resolves to.
#[derive(Debug, Default)]
pub struct LoadBalancerSource;

#[async_trait]
impl CategorySource for LoadBalancerSource {
    type Pending = LoadBalancerAttrs;

    fn category(&self) -> Category {
        Category::LoadBalancers
    }

    async fn list_region(
        &self,
        provider: &dyn InventoryProvider,
        region: &Region,
    ) -> Result<RegionListing<LoadBalancerAttrs>, FetchError> {
        let (modern, classic) = tokio::join!(
            provider.list_load_balancers(region),
            provider.list_classic_load_balancers(region),
        );

        let to_fetch_error = |e: ProviderError| {
            FetchError::region(Category::LoadBalancers, region.clone(), e.to_string())
        };

        let mut pending = modern.map_err(to_fetch_error)?;
        pending.extend(classic.map_err(to_fetch_error)?);

        Ok(RegionListing::pending(pending))
    }

    async fn resolve(
        &self,
        provider: &dyn InventoryProvider,
        region: &Region,
        attrs: LoadBalancerAttrs,
    ) -> Resolution {
        let metric = TrafficMetric::for_load_balancer(attrs.kind, &attrs.name, attrs.arn.as_deref());

        let traffic = async {
            match &metric {
                Some(metric) => Some(provider.query_traffic_metric(region, metric).await),
                None => None,
            }
        };
        let (resolved, traffic) = tokio::join!(provider.resolve_dns(&attrs.dns_name), traffic);

        let mut failures = Vec::new();

        let public_ips: Vec<IpAddr> = match resolved {
            Ok(ips) => ips.into_iter().collect::<BTreeSet<_>>().into_iter().collect(),
            Err(e) => {
                failures.push(FetchError::record(
                    Category::LoadBalancers,
                    region.clone(),
                    &attrs.name,
                    e.to_string(),
                ));
                return Resolution {
                    record: None,
                    failures,
                };
            }
        };

        let traffic_last_week = match traffic {
            Some(Ok(bytes)) => Some(bytes),
            Some(Err(e)) => {
                failures.push(FetchError::record(
                    Category::LoadBalancers,
                    region.clone(),
                    &attrs.name,
                    e.to_string(),
                ));
                None
            }
            None => None,
        };

        debug!(
            name = %attrs.name,
            kind = %attrs.kind,
            ips = public_ips.len(),
            "Load balancer resolved"
        );

        let monthly_cost = CostModel::monthly_cost(Billable::LoadBalancer {
            resolved_ips: public_ips.len(),
        });

        Resolution {
            record: Some(ResourceRecord::LoadBalancer(LoadBalancerRecord {
                region: region.clone(),
                name: attrs.name,
                kind: attrs.kind,
                dns_name: attrs.dns_name,
                public_ips,
                traffic_last_week,
                monthly_cost,
            })),
            failures,
        }
    }
}
