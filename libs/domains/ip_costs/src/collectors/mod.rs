//! Per-category scatter-gather collectors
//!
//! Every category shares one engine, [`gather`]:
//!
//! ```text
//!            ┌─────────────── JoinSet (one per category) ───────────────┐
//! regions ──►│ list_region(r1)  list_region(r2)  ...  list_region(rN)   │
//!            │        │ pending records (load balancers only)           │
//!            │        └──► resolve(p1)  resolve(p2)  ...                │
//!            └───────────────────────┬──────────────────────────────────┘
//!                                    ▼
//!                      single consumer merges outcomes
//!                                    ▼
//!                             CategoryResult
//! ```
//!
//! Completion is the task group running empty, so no task ever signals
//! "done" on its own. Tasks reach the provider through [`Throttled`], which
//! admits at most `max_in_flight` outward calls for the whole category,
//! both levels and concurrent calls within one task included.

mod elastic_ips;
mod instances;
mod load_balancers;
mod network_interfaces;
mod throttle;

pub use elastic_ips::ElasticIpSource;
pub use instances::InstanceSource;
pub use load_balancers::LoadBalancerSource;
pub use network_interfaces::NetworkInterfaceSource;

use async_trait::async_trait;
use observability::ScanMetrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info_span, warn, Instrument};

use crate::context::ScanContext;
use crate::error::FetchError;
use crate::models::{Category, Region, ResourceRecord};
use crate::provider::InventoryProvider;
use crate::snapshot::CategoryResult;
use throttle::Throttled;

/// Result of listing one region.
#[derive(Debug)]
pub struct RegionListing<P> {
    /// Records that are complete as listed
    pub ready: Vec<ResourceRecord>,
    /// Records that need a second, per-record lookup
    pub pending: Vec<P>,
}

impl<P> RegionListing<P> {
    pub fn ready(records: Vec<ResourceRecord>) -> Self {
        Self {
            ready: records,
            pending: Vec::new(),
        }
    }

    pub fn pending(pending: Vec<P>) -> Self {
        Self {
            ready: Vec::new(),
            pending,
        }
    }
}

/// Result of resolving one pending record.
#[derive(Debug, Default)]
pub struct Resolution {
    pub record: Option<ResourceRecord>,
    pub failures: Vec<FetchError>,
}

/// How one category is listed per region and, optionally, resolved per
/// record.
#[async_trait]
pub trait CategorySource: Send + Sync + 'static {
    /// A discovered record awaiting resolution
    type Pending: Send + 'static;

    fn category(&self) -> Category;

    async fn list_region(
        &self,
        provider: &dyn InventoryProvider,
        region: &Region,
    ) -> Result<RegionListing<Self::Pending>, FetchError>;

    async fn resolve(
        &self,
        provider: &dyn InventoryProvider,
        region: &Region,
        pending: Self::Pending,
    ) -> Resolution;
}

enum Outcome<P> {
    Listed {
        region: Region,
        listing: Result<RegionListing<P>, FetchError>,
    },
    Resolved(Resolution),
}

/// Where a task came from, to attribute panics
enum Origin {
    Region(Region),
    Record(Region),
}

/// Run one category across every region of the scan.
///
/// Always returns a result: records from every region that succeeded and
/// one failure per region or record that did not.
pub async fn gather<S: CategorySource>(source: Arc<S>, ctx: &ScanContext) -> CategoryResult {
    let category = source.category();
    let started = Instant::now();
    let provider: Arc<dyn InventoryProvider> =
        Arc::new(Throttled::new(ctx.provider(), ctx.max_in_flight()));
    let mut tasks: JoinSet<Outcome<S::Pending>> = JoinSet::new();
    let mut origins: HashMap<Id, Origin> = HashMap::new();

    for region in ctx.regions() {
        let source = Arc::clone(&source);
        let provider = Arc::clone(&provider);
        let task_region = region.clone();
        let span = info_span!(parent: ctx.span(), "region", %category, region = %region);

        let handle = tasks.spawn(
            async move {
                let fetch_started = Instant::now();
                let listing = source.list_region(provider.as_ref(), &task_region).await;
                ScanMetrics::record_region_fetch(
                    category.as_ref(),
                    listing.is_ok(),
                    fetch_started.elapsed(),
                );
                Outcome::Listed {
                    region: task_region,
                    listing,
                }
            }
            .instrument(span),
        );
        origins.insert(handle.id(), Origin::Region(region.clone()));
    }

    let mut records = Vec::new();
    let mut failures = Vec::new();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, Outcome::Listed { region, listing })) => {
                origins.remove(&id);
                match listing {
                    Ok(listing) => {
                        debug!(
                            %category,
                            region = %region,
                            ready = listing.ready.len(),
                            pending = listing.pending.len(),
                            "Region listed"
                        );
                        records.extend(listing.ready);

                        for pending in listing.pending {
                            let source = Arc::clone(&source);
                            let provider = Arc::clone(&provider);
                            let task_region = region.clone();
                            let span =
                                info_span!(parent: ctx.span(), "record", %category, region = %region);

                            let handle = tasks.spawn(
                                async move {
                                    Outcome::Resolved(
                                        source
                                            .resolve(provider.as_ref(), &task_region, pending)
                                            .await,
                                    )
                                }
                                .instrument(span),
                            );
                            origins.insert(handle.id(), Origin::Record(region.clone()));
                        }
                    }
                    Err(failure) => {
                        warn!(%category, region = %region, error = %failure, "Region fetch failed");
                        failures.push(failure);
                    }
                }
            }
            Ok((id, Outcome::Resolved(resolution))) => {
                origins.remove(&id);
                for failure in &resolution.failures {
                    warn!(%category, error = %failure, "Record resolution failed");
                }
                records.extend(resolution.record);
                failures.extend(resolution.failures);
            }
            Err(join_error) => {
                let (region, subject) = match origins.remove(&join_error.id()) {
                    Some(Origin::Region(region)) => (region, None),
                    Some(Origin::Record(region)) => (region, Some("record")),
                    None => (Region::new("unknown"), None),
                };
                warn!(%category, region = %region, error = %join_error, "Task stopped without a result");
                let message = format!("task stopped without a result: {}", join_error);
                failures.push(match subject {
                    Some(subject) => FetchError::record(category, region, subject, message),
                    None => FetchError::region(category, region, message),
                });
            }
        }
    }

    let result = CategoryResult::new(category, records, failures);
    ScanMetrics::record_category(
        category.as_ref(),
        result.total_count(),
        result.total_cost().to_decimal(),
        result.failures().len(),
        started.elapsed(),
    );
    debug!(
        %category,
        count = result.total_count(),
        cost = %result.total_cost(),
        failures = result.failures().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Category gathered"
    );
    result
}

/// Run the collector of `category`.
pub async fn collect(category: Category, ctx: &ScanContext) -> CategoryResult {
    match category {
        Category::Instances => gather(Arc::new(InstanceSource), ctx).await,
        Category::ElasticIps => gather(Arc::new(ElasticIpSource), ctx).await,
        Category::LoadBalancers => gather(Arc::new(LoadBalancerSource), ctx).await,
        Category::NetworkInterfaces => gather(Arc::new(NetworkInterfaceSource), ctx).await,
    }
}
