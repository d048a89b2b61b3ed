use async_trait::async_trait;
use std::convert::Infallible;

use super::{CategorySource, RegionListing, Resolution};
use crate::cost::{Billable, CostModel};
use crate::error::FetchError;
use crate::models::{name_tag, Category, InstanceRecord, Region, ResourceRecord};
use crate::provider::InventoryProvider;

/// Instances holding a public address, attached Elastic IPs included.
#[derive(Debug, Default)]
pub struct InstanceSource;

#[async_trait]
impl CategorySource for InstanceSource {
    type Pending = Infallible;

    fn category(&self) -> Category {
        Category::Instances
    }

    async fn list_region(
        &self,
        provider: &dyn InventoryProvider,
        region: &Region,
    ) -> Result<RegionListing<Infallible>, FetchError> {
        let instances = provider
            .list_instances(region)
            .await
            .map_err(|e| FetchError::region(Category::Instances, region.clone(), e.to_string()))?;

        let records = instances
            .into_iter()
            .filter_map(|attrs| {
                let public_ip = attrs.public_ip.filter(|ip| !ip.is_empty())?;
                Some(ResourceRecord::Instance(InstanceRecord {
                    region: region.clone(),
                    name_tag: name_tag(&attrs.tags),
                    instance_id: attrs.instance_id,
                    state: attrs.state,
                    public_ip,
                    vpc_id: attrs.vpc_id,
                    subnet_id: attrs.subnet_id,
                    monthly_cost: CostModel::monthly_cost(Billable::Instance {
                        has_public_ip: true,
                    }),
                }))
            })
            .collect();

        Ok(RegionListing::ready(records))
    }

    async fn resolve(
        &self,
        _provider: &dyn InventoryProvider,
        _region: &Region,
        pending: Infallible,
    ) -> Resolution {
        match pending {}
    }
}
