use async_trait::async_trait;
use std::convert::Infallible;

use super::{CategorySource, RegionListing, Resolution};
use crate::cost::{Billable, CostModel};
use crate::error::FetchError;
use crate::models::{Category, NetworkInterfaceRecord, Region, ResourceRecord};
use crate::provider::InventoryProvider;

/// Network interfaces with a public address association.
#[derive(Debug, Default)]
pub struct NetworkInterfaceSource;

#[async_trait]
impl CategorySource for NetworkInterfaceSource {
    type Pending = Infallible;

    fn category(&self) -> Category {
        Category::NetworkInterfaces
    }

    async fn list_region(
        &self,
        provider: &dyn InventoryProvider,
        region: &Region,
    ) -> Result<RegionListing<Infallible>, FetchError> {
        let interfaces = provider.list_network_interfaces(region).await.map_err(|e| {
            FetchError::region(Category::NetworkInterfaces, region.clone(), e.to_string())
        })?;

        let records = interfaces
            .into_iter()
            .filter_map(|attrs| {
                let public_ip = attrs.public_ip.filter(|ip| !ip.is_empty())?;
                Some(ResourceRecord::NetworkInterface(NetworkInterfaceRecord {
                    region: region.clone(),
                    interface_id: attrs.interface_id,
                    public_ip,
                    interface_type: attrs.interface_type,
                    description: attrs.description,
                    monthly_cost: CostModel::monthly_cost(Billable::NetworkInterface {
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
