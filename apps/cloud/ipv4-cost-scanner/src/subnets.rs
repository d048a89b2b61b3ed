//! Subnet auto-assign public IP survey
//!
//! Lists every subnet with its `MapPublicIpOnLaunch` flag and, on request,
//! flips the flag. Region failures are reported and do not stop the others.

use async_trait::async_trait;
use domain_ip_costs::{ProviderResult, Region};
use futures::stream::{self, StreamExt};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SubnetAttrs {
    pub subnet_id: String,
    pub vpc_id: String,
    pub map_public_ip_on_launch: bool,
}

/// Subnet operations of the inventory provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubnetInventory: Send + Sync {
    async fn list_subnets(&self, region: &Region) -> ProviderResult<Vec<SubnetAttrs>>;

    async fn set_map_public_ip_on_launch(
        &self,
        region: &Region,
        subnet_id: &str,
        enabled: bool,
    ) -> ProviderResult<()>;
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct SubnetRow {
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "VPC ID")]
    pub vpc_id: String,
    #[tabled(rename = "Subnet ID")]
    pub subnet_id: String,
    /// Flag value after the survey (flipped when toggling succeeded)
    #[tabled(rename = "Auto-Attach IP")]
    pub map_public_ip_on_launch: bool,
}

#[derive(Debug, Default)]
pub struct SubnetReport {
    pub rows: Vec<SubnetRow>,
    pub failures: Vec<String>,
}

impl SubnetReport {
    pub fn render(&self) -> String {
        let mut out = Table::new(&self.rows).with(Style::rounded()).to_string();
        for failure in &self.failures {
            out.push_str(&format!("\nwarning: {}", failure));
        }
        out
    }
}

/// Survey every region, `max_in_flight` regions at a time.
pub async fn survey<S>(
    inventory: &S,
    regions: &[Region],
    toggle: bool,
    max_in_flight: usize,
) -> SubnetReport
where
    S: SubnetInventory + ?Sized,
{
    let reports: Vec<SubnetReport> = stream::iter(regions.iter().cloned())
        .map(move |region| async move { survey_region(inventory, &region, toggle).await })
        .buffer_unordered(max_in_flight.max(1))
        .collect()
        .await;

    let mut report = SubnetReport::default();
    for partial in reports {
        report.rows.extend(partial.rows);
        report.failures.extend(partial.failures);
    }
    report.rows.sort_by(|a, b| {
        (&a.region, &a.vpc_id, &a.subnet_id).cmp(&(&b.region, &b.vpc_id, &b.subnet_id))
    });
    report
}

async fn survey_region<S>(inventory: &S, region: &Region, toggle: bool) -> SubnetReport
where
    S: SubnetInventory + ?Sized,
{
    let mut report = SubnetReport::default();

    let subnets = match inventory.list_subnets(region).await {
        Ok(subnets) => subnets,
        Err(e) => {
            warn!(region = %region, error = %e, "Failed to describe subnets");
            report
                .failures
                .push(format!("failed to describe subnets in region {}: {}", region, e));
            return report;
        }
    };

    for subnet in subnets {
        let mut current = subnet.map_public_ip_on_launch;

        if toggle {
            let wanted = !current;
            match inventory
                .set_map_public_ip_on_launch(region, &subnet.subnet_id, wanted)
                .await
            {
                Ok(()) => {
                    info!(
                        region = %region,
                        subnet_id = %subnet.subnet_id,
                        enabled = wanted,
                        "Toggled auto-assign public IP"
                    );
                    current = wanted;
                }
                Err(e) => {
                    warn!(
                        region = %region,
                        subnet_id = %subnet.subnet_id,
                        error = %e,
                        "Failed to toggle subnet"
                    );
                    report.failures.push(format!(
                        "failed to toggle subnet {} in region {}: {}",
                        subnet.subnet_id, region, e
                    ));
                }
            }
        }

        report.rows.push(SubnetRow {
            region: region.to_string(),
            vpc_id: subnet.vpc_id,
            subnet_id: subnet.subnet_id,
            map_public_ip_on_launch: current,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_ip_costs::ProviderError;
    use std::sync::{Arc, Mutex};

    fn subnet(id: &str, enabled: bool) -> SubnetAttrs {
        SubnetAttrs {
            subnet_id: id.to_string(),
            vpc_id: "vpc-1".to_string(),
            map_public_ip_on_launch: enabled,
        }
    }

    #[tokio::test]
    async fn test_survey_lists_without_changes() {
        let mut mock = MockSubnetInventory::new();
        mock.expect_list_subnets()
            .returning(|_| Ok(vec![subnet("subnet-b", true), subnet("subnet-a", false)]));
        mock.expect_set_map_public_ip_on_launch().never();

        let report = survey(&mock, &[Region::new("us-east-1")], false, 4).await;

        assert!(report.failures.is_empty());
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].subnet_id, "subnet-a");
        assert!(!report.rows[0].map_public_ip_on_launch);
        assert!(report.render().contains("Auto-Attach IP"));
    }

    #[tokio::test]
    async fn test_toggle_flips_each_flag() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);

        let mut mock = MockSubnetInventory::new();
        mock.expect_list_subnets()
            .returning(|_| Ok(vec![subnet("subnet-a", true), subnet("subnet-b", false)]));
        mock.expect_set_map_public_ip_on_launch()
            .times(2)
            .returning(move |_, subnet_id, enabled| {
                recorded.lock().unwrap().push((subnet_id.to_string(), enabled));
                Ok(())
            });

        let report = survey(&mock, &[Region::new("us-east-1")], true, 4).await;

        let mut calls = calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(
            calls,
            vec![("subnet-a".to_string(), false), ("subnet-b".to_string(), true)]
        );
        assert!(!report.rows[0].map_public_ip_on_launch);
        assert!(report.rows[1].map_public_ip_on_launch);
    }

    #[tokio::test]
    async fn test_region_failure_is_reported() {
        let mut mock = MockSubnetInventory::new();
        mock.expect_list_subnets().returning(|region| {
            if region.as_str() == "eu-west-1" {
                Err(ProviderError::api("DescribeSubnets", "AuthFailure"))
            } else {
                Ok(vec![subnet("subnet-a", false)])
            }
        });

        let regions = [Region::new("us-east-1"), Region::new("eu-west-1")];
        let report = survey(&mock, &regions, false, 2).await;

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("eu-west-1"));
        assert!(report.render().contains("warning: failed to describe subnets"));
    }
}
