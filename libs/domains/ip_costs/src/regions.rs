use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ScanError, ScanResult};
use crate::models::Region;
use crate::provider::InventoryProvider;

/// Lists the regions a scan targets.
pub struct RegionEnumerator {
    provider: Arc<dyn InventoryProvider>,
}

impl RegionEnumerator {
    pub fn new(provider: Arc<dyn InventoryProvider>) -> Self {
        Self { provider }
    }

    /// Every visible region, deduplicated and sorted, optionally narrowed to
    /// `allow`. A listing failure or an empty result is fatal.
    pub async fn enumerate(&self, allow: Option<&[String]>) -> ScanResult<Vec<Region>> {
        let visible: BTreeSet<Region> = self
            .provider
            .list_regions()
            .await
            .map_err(ScanError::RegionEnumeration)?
            .into_iter()
            .collect();

        debug!(count = visible.len(), "Listed visible regions");

        let regions: Vec<Region> = match allow {
            Some(allow) => {
                let unknown: Vec<&str> = allow
                    .iter()
                    .map(String::as_str)
                    .filter(|name| !visible.contains(&Region::from(*name)))
                    .collect();
                if !unknown.is_empty() {
                    return Err(ScanError::Config(format!(
                        "regions not visible to the active credentials: {}",
                        unknown.join(", ")
                    )));
                }
                visible
                    .into_iter()
                    .filter(|region| allow.iter().any(|name| name == region.as_str()))
                    .collect()
            }
            None => visible.into_iter().collect(),
        };

        if regions.is_empty() {
            return Err(ScanError::Config("no regions to scan".to_string()));
        }

        info!(count = regions.len(), "Scan targets enumerated");
        Ok(regions)
    }
}
