//! Scan coordinator
//!
//! Runs the four category collectors concurrently, each under its own
//! timeout, and fans their results into one [`Snapshot`]. The first
//! category to time out or crash aborts the scan; the remaining collectors
//! are cancelled when their task group is dropped.

use observability::ScanMetrics;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{info, info_span, instrument, warn};
use uuid::Uuid;

use crate::collectors;
use crate::context::ScanContext;
use crate::error::{ScanError, ScanResult};
use crate::models::{Category, Region};
use crate::provider::InventoryProvider;
use crate::regions::RegionEnumerator;
use crate::settings::ScanSettings;
use crate::snapshot::{CategoryResult, Snapshot};

pub struct ScatterGatherCoordinator {
    provider: Arc<dyn InventoryProvider>,
    settings: ScanSettings,
}

impl ScatterGatherCoordinator {
    pub fn new(provider: Arc<dyn InventoryProvider>, settings: ScanSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Regions the scan will target
    pub async fn regions(&self) -> ScanResult<Vec<Region>> {
        RegionEnumerator::new(Arc::clone(&self.provider))
            .enumerate(self.settings.regions.as_deref())
            .await
    }

    /// Run every category and build the snapshot.
    #[instrument(skip(self))]
    pub async fn scan(&self) -> ScanResult<Snapshot> {
        let started = Instant::now();
        let scan_id = Uuid::now_v7();
        let regions = self.regions().await?;
        let ctx = self.context(scan_id, &regions);

        info!(%scan_id, regions = regions.len(), "Starting scan");

        let launches: Vec<_> = Category::ALL
            .into_iter()
            .map(|category| {
                let ctx = ctx.clone();
                let future = async move { collectors::collect(category, &ctx).await };
                (category, self.settings.timeout_for(category), future)
            })
            .collect();

        let outcome = fan_in(launches).await;
        ScanMetrics::record_scan(outcome.is_ok(), started.elapsed());

        let categories = outcome?;
        let snapshot = Snapshot::new(scan_id, regions, categories);

        info!(
            %scan_id,
            total_count = snapshot.total_count(),
            total_cost = %snapshot.total_cost(),
            has_failures = snapshot.has_failures(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );

        Ok(snapshot)
    }

    /// Run a single category under the same timeout rule as a full scan.
    #[instrument(skip(self))]
    pub async fn collect_one(&self, category: Category) -> ScanResult<CategoryResult> {
        let regions = self.regions().await?;
        let ctx = self.context(Uuid::now_v7(), &regions);

        let launch = (
            category,
            self.settings.timeout_for(category),
            async move { collectors::collect(category, &ctx).await },
        );

        let mut results = fan_in(vec![launch]).await?;
        results
            .remove(&category)
            .ok_or_else(|| ScanError::Internal(format!("no result delivered for {}", category)))
    }

    fn context(&self, scan_id: Uuid, regions: &[Region]) -> ScanContext {
        ScanContext::new(
            Arc::clone(&self.provider),
            regions.to_vec(),
            self.settings.max_in_flight,
            info_span!("scan", %scan_id),
        )
    }
}

/// Spawn every category future under its own timeout and collect results
/// as they finish. Returns on the first timeout or crash; dropping the task
/// group aborts whatever is still running.
pub(crate) async fn fan_in<F>(
    launches: Vec<(Category, Duration, F)>,
) -> ScanResult<BTreeMap<Category, CategoryResult>>
where
    F: Future<Output = CategoryResult> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    let mut origins = HashMap::new();

    for (category, timeout, future) in launches {
        let handle = tasks.spawn(async move {
            let outcome = tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| ScanError::CategoryTimeout { category, timeout });
            (category, outcome)
        });
        origins.insert(handle.id(), category);
    }

    let mut results = BTreeMap::new();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (category, Ok(result)))) => {
                info!(
                    %category,
                    count = result.total_count(),
                    failures = result.failures().len(),
                    "Category delivered"
                );
                results.insert(category, result);
            }
            Ok((_, (category, Err(err)))) => {
                warn!(%category, error = %err, "Aborting scan");
                return Err(err);
            }
            Err(join_error) => {
                let err = match origins.get(&join_error.id()) {
                    Some(category) => ScanError::CategoryCrash {
                        category: *category,
                        reason: join_error.to_string(),
                    },
                    None => ScanError::Internal(join_error.to_string()),
                };
                warn!(error = %err, "Aborting scan");
                return Err(err);
            }
        }
    }

    Ok(results)
}
