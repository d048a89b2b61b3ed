use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{combine, FetchError};
use crate::models::{Category, Money, Region, ResourceRecord};

/// Outcome of one category for one scan, built in one step once every
/// task of the category has finished.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResult {
    category: Category,
    records: Vec<ResourceRecord>,
    total_count: usize,
    total_cost: Money,
    combined_error: Option<String>,
    #[serde(skip)]
    failures: Vec<FetchError>,
}

impl CategoryResult {
    pub fn new(category: Category, records: Vec<ResourceRecord>, failures: Vec<FetchError>) -> Self {
        let total_count = records.iter().map(ResourceRecord::billable_addresses).sum();
        let total_cost = records.iter().map(ResourceRecord::monthly_cost).sum();
        let combined_error = combine(&failures);

        Self {
            category,
            records,
            total_count,
            total_cost,
            combined_error,
            failures,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Records in arrival order
    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    /// Billable public addresses: one per record, the resolved IP count for
    /// load balancers
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn total_cost(&self) -> Money {
        self.total_cost
    }

    /// Every failure of the category joined into one message
    pub fn combined_error(&self) -> Option<&str> {
        self.combined_error.as_deref()
    }

    pub fn failures(&self) -> &[FetchError] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Complete result of one scan. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    scan_id: Uuid,
    scanned_at: DateTime<Utc>,
    regions: Vec<Region>,
    categories: BTreeMap<Category, CategoryResult>,
    total_count: usize,
    total_cost: Money,
}

impl Snapshot {
    pub fn new(
        scan_id: Uuid,
        regions: Vec<Region>,
        categories: BTreeMap<Category, CategoryResult>,
    ) -> Self {
        let total_count = categories.values().map(CategoryResult::total_count).sum();
        let total_cost = categories.values().map(CategoryResult::total_cost).sum();

        Self {
            scan_id,
            scanned_at: Utc::now(),
            regions,
            categories,
            total_count,
            total_cost,
        }
    }

    pub fn scan_id(&self) -> Uuid {
        self.scan_id
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn category(&self, category: Category) -> Option<&CategoryResult> {
        self.categories.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryResult> {
        self.categories.values()
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn total_cost(&self) -> Money {
        self.total_cost
    }

    /// True when at least one category recorded a failure
    pub fn has_failures(&self) -> bool {
        self.categories.values().any(|result| !result.is_complete())
    }
}
