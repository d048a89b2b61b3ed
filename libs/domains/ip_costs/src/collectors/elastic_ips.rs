use async_trait::async_trait;
use std::convert::Infallible;

use super::{CategorySource, RegionListing, Resolution};
use crate::cost::{Billable, CostModel};
use crate::error::FetchError;
use crate::models::{name_tag, AssociationTarget, Category, ElasticIpRecord, Region, ResourceRecord};
use crate::provider::InventoryProvider;

/// Elastic IPs not attached to an instance; attached ones are billed with
/// their instance. Unassociated ones carry the idle surcharge.
#[derive(Debug, Default)]
pub struct ElasticIpSource;

#[async_trait]
impl CategorySource for ElasticIpSource {
    type Pending = Infallible;

    fn category(&self) -> Category {
        Category::ElasticIps
    }

    async fn list_region(
        &self,
        provider: &dyn InventoryProvider,
        region: &Region,
    ) -> Result<RegionListing<Infallible>, FetchError> {
        let addresses = provider
            .list_addresses(region)
            .await
            .map_err(|e| FetchError::region(Category::ElasticIps, region.clone(), e.to_string()))?;

        let records = addresses
            .into_iter()
            .filter(|attrs| !matches!(attrs.association, Some(AssociationTarget::Instance(_))))
            .map(|attrs| {
                let monthly_cost = CostModel::monthly_cost(Billable::ElasticIp {
                    associated: attrs.association.is_some(),
                });
                ResourceRecord::ElasticIp(ElasticIpRecord {
                    region: region.clone(),
                    name_tag: name_tag(&attrs.tags),
                    public_ip: attrs.public_ip,
                    allocation_id: attrs.allocation_id,
                    association: attrs.association,
                    monthly_cost,
                })
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
