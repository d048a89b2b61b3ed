use std::sync::Arc;
use tracing::Span;

use crate::models::Region;
use crate::provider::InventoryProvider;

/// Everything a collector needs for one scan, passed explicitly to every
/// task. Cheap to clone.
#[derive(Clone)]
pub struct ScanContext {
    provider: Arc<dyn InventoryProvider>,
    regions: Arc<[Region]>,
    max_in_flight: usize,
    span: Span,
}

impl ScanContext {
    pub fn new(
        provider: Arc<dyn InventoryProvider>,
        regions: Vec<Region>,
        max_in_flight: usize,
        span: Span,
    ) -> Self {
        Self {
            provider,
            regions: regions.into(),
            max_in_flight: max_in_flight.max(1),
            span,
        }
    }

    pub fn provider(&self) -> Arc<dyn InventoryProvider> {
        Arc::clone(&self.provider)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Parent span of every task spawned for this scan
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl std::fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanContext")
            .field("regions", &self.regions)
            .field("max_in_flight", &self.max_in_flight)
            .finish_non_exhaustive()
    }
}
