//! Terminal presentation of a scan snapshot
//!
//! Each category becomes one table sorted by public IP, followed by a cost
//! summary and the warnings of every category that lost a region or record.

use domain_ip_costs::{Category, CategoryResult, Money, ResourceRecord, Snapshot};
use tabled::builder::Builder;
use tabled::settings::Style;

pub const INSTANCE_HEADERS: [&str; 8] = [
    "Region",
    "Name Tag",
    "Instance State",
    "Instance ID",
    "Public IP",
    "VPC ID",
    "Subnet ID",
    "Cost",
];

const ELASTIC_IP_HEADERS: [&str; 5] = ["Region", "Name tag", "Public IP", "Attached Resource", "Cost"];

const LOAD_BALANCER_HEADERS: [&str; 7] = [
    "Region",
    "Load Balancer Type",
    "Name",
    "DNS Name",
    "IP Count",
    "Traffic MBs (last 7 days)",
    "Cost",
];

const NETWORK_INTERFACE_HEADERS: [&str; 4] = ["Region", "Public IP", "ENI ID", "Cost"];

pub fn headers(category: Category) -> &'static [&'static str] {
    match category {
        Category::Instances => &INSTANCE_HEADERS,
        Category::ElasticIps => &ELASTIC_IP_HEADERS,
        Category::LoadBalancers => &LOAD_BALANCER_HEADERS,
        Category::NetworkInterfaces => &NETWORK_INTERFACE_HEADERS,
    }
}

/// Cells of one record, in header order
pub fn record_cells(record: &ResourceRecord) -> Vec<String> {
    match record {
        ResourceRecord::Instance(r) => vec![
            r.region.to_string(),
            r.name_tag.clone(),
            r.state.clone(),
            r.instance_id.clone(),
            r.public_ip.clone(),
            r.vpc_id.clone().unwrap_or_default(),
            r.subnet_id.clone().unwrap_or_default(),
            r.monthly_cost.to_string(),
        ],
        ResourceRecord::ElasticIp(r) => vec![
            r.region.to_string(),
            r.name_tag.clone(),
            r.public_ip.clone(),
            r.association
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            r.monthly_cost.to_string(),
        ],
        ResourceRecord::LoadBalancer(r) => vec![
            r.region.to_string(),
            r.kind.to_string(),
            r.name.clone(),
            r.dns_name.clone(),
            r.ip_count().to_string(),
            r.traffic_last_week
                .map(|bytes| format!("{:.2}", bytes as f64 / 1024.0 / 1024.0))
                .unwrap_or_else(|| "n/a".to_string()),
            r.monthly_cost.to_string(),
        ],
        ResourceRecord::NetworkInterface(r) => vec![
            r.region.to_string(),
            r.public_ip.clone(),
            r.interface_id.clone(),
            r.monthly_cost.to_string(),
        ],
    }
}

/// Records ordered by public IP; records without a parseable IP go last
pub fn sorted_by_ip(records: &[ResourceRecord]) -> Vec<&ResourceRecord> {
    let mut sorted: Vec<&ResourceRecord> = records.iter().collect();
    sorted.sort_by_key(|record| {
        let ip = record.sort_ip();
        (ip.is_none(), ip)
    });
    sorted
}

/// Presentation of one category
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub category: Category,
    pub title: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
    pub total_count: usize,
    pub total_cost: Money,
    pub error: Option<String>,
}

impl CategoryView {
    pub fn from_result(result: &CategoryResult) -> Self {
        let category = result.category();
        Self {
            category,
            title: category.title(),
            headers: headers(category),
            rows: sorted_by_ip(result.records())
                .into_iter()
                .map(record_cells)
                .collect(),
            total_count: result.total_count(),
            total_cost: result.total_cost(),
            error: result.combined_error().map(str::to_string),
        }
    }

    pub fn table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|header| header.to_string()));
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        format!("{}\n{}", self.title, table)
    }
}

/// Cost summary lines
pub fn summary(snapshot: &Snapshot) -> Vec<String> {
    let total = |category: Category| {
        snapshot
            .category(category)
            .map(|result| (result.total_count(), result.total_cost()))
            .unwrap_or((0, Money::ZERO))
    };

    let (eni_count, eni_cost) = total(Category::NetworkInterfaces);
    let (ec2_count, ec2_cost) = total(Category::Instances);
    let (lb_count, lb_cost) = total(Category::LoadBalancers);
    let (eip_count, eip_cost) = total(Category::ElasticIps);

    vec![
        "--------------------------------".to_string(),
        format!(
            "Public IPs attached to {} Elastic Network Interfaces: ${}",
            eni_count, eni_cost
        ),
        format!("EC2: ${} for {} instances", ec2_cost, ec2_count),
        format!("Load balancers: ${} for {} load balancer IPs", lb_cost, lb_count),
        format!("and ${} for {} Elastic IPs", eip_cost, eip_count),
        "Note: ENI costs also include those for EC2, LB and EIP. Still, unattached EIPs have an \
         additional cost, so the total IPv4 cost isn't exactly the same as the ENI cost"
            .to_string(),
        "--------------------------------".to_string(),
    ]
}

/// Scan id, region count and scan time
pub fn scan_banner(snapshot: &Snapshot) -> String {
    format!(
        "Scan {} of {} regions at {}",
        snapshot.scan_id(),
        snapshot.regions().len(),
        snapshot.scanned_at().format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Every table, the summary and any warnings
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let views: Vec<CategoryView> = snapshot.categories().map(CategoryView::from_result).collect();

    let mut sections = vec![scan_banner(snapshot)];
    sections.extend(views.iter().map(CategoryView::table));
    sections.push(summary(snapshot).join("\n"));

    let warnings: Vec<String> = views
        .iter()
        .filter_map(|view| {
            view.error
                .as_ref()
                .map(|error| format!("warning: {}: {}", view.category, error))
        })
        .collect();
    if !warnings.is_empty() {
        sections.push(warnings.join("\n"));
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_ip_costs::{
        AssociationTarget, ElasticIpRecord, FetchError, InstanceRecord, LoadBalancerKind,
        LoadBalancerRecord, NetworkInterfaceRecord, Region,
    };
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn region() -> Region {
        Region::new("us-east-1")
    }

    fn instance(ip: &str) -> ResourceRecord {
        ResourceRecord::Instance(InstanceRecord {
            region: region(),
            instance_id: format!("i-{}", ip),
            name_tag: "web".to_string(),
            state: "running".to_string(),
            public_ip: ip.to_string(),
            vpc_id: Some("vpc-1".to_string()),
            subnet_id: None,
            monthly_cost: Money::from_cents(365),
        })
    }

    fn eip(ip: &str, association: Option<AssociationTarget>) -> ResourceRecord {
        let monthly_cost = if association.is_some() {
            Money::from_cents(365)
        } else {
            Money::from_cents(730)
        };
        ResourceRecord::ElasticIp(ElasticIpRecord {
            region: region(),
            public_ip: ip.to_string(),
            allocation_id: None,
            name_tag: String::new(),
            association,
            monthly_cost,
        })
    }

    fn load_balancer(ips: &[&str]) -> ResourceRecord {
        ResourceRecord::LoadBalancer(LoadBalancerRecord {
            region: region(),
            name: "web".to_string(),
            kind: LoadBalancerKind::Application,
            dns_name: "web.elb.amazonaws.com".to_string(),
            public_ips: ips.iter().map(|ip| ip.parse().unwrap()).collect(),
            traffic_last_week: Some(3 * 1024 * 1024),
            monthly_cost: Money::from_cents(365 * ips.len() as i64),
        })
    }

    fn interface(ip: &str) -> ResourceRecord {
        ResourceRecord::NetworkInterface(NetworkInterfaceRecord {
            region: region(),
            interface_id: "eni-1".to_string(),
            public_ip: ip.to_string(),
            interface_type: None,
            description: None,
            monthly_cost: Money::from_cents(365),
        })
    }

    fn snapshot() -> Snapshot {
        let mut categories = BTreeMap::new();
        categories.insert(
            Category::Instances,
            CategoryResult::new(
                Category::Instances,
                vec![instance("203.0.113.20"), instance("203.0.113.3")],
                vec![],
            ),
        );
        categories.insert(
            Category::ElasticIps,
            CategoryResult::new(
                Category::ElasticIps,
                vec![
                    eip("198.51.100.1", None),
                    eip(
                        "198.51.100.2",
                        Some(AssociationTarget::NatGateway("nat-1".to_string())),
                    ),
                ],
                vec![FetchError::region(
                    Category::ElasticIps,
                    Region::new("eu-west-1"),
                    "UnauthorizedOperation",
                )],
            ),
        );
        categories.insert(
            Category::LoadBalancers,
            CategoryResult::new(
                Category::LoadBalancers,
                vec![load_balancer(&["192.0.2.1", "192.0.2.2", "192.0.2.3"])],
                vec![],
            ),
        );
        categories.insert(
            Category::NetworkInterfaces,
            CategoryResult::new(Category::NetworkInterfaces, vec![interface("203.0.113.9")], vec![]),
        );
        Snapshot::new(Uuid::nil(), vec![region()], categories)
    }

    fn cents(cell: &str) -> i64 {
        cell.replace('.', "").parse().unwrap()
    }

    #[test]
    fn test_rows_rederive_snapshot_totals() {
        let snapshot = snapshot();
        let mut count = 0;
        let mut cost = 0;

        for result in snapshot.categories() {
            let view = CategoryView::from_result(result);
            let cost_column = view.headers.len() - 1;

            let view_cost: i64 = view.rows.iter().map(|row| cents(&row[cost_column])).sum();
            let view_count: usize = match view.category {
                Category::LoadBalancers => view
                    .rows
                    .iter()
                    .map(|row| row[4].parse::<usize>().unwrap())
                    .sum(),
                _ => view.rows.len(),
            };

            assert_eq!(view_cost, result.total_cost().cents());
            assert_eq!(view_count, result.total_count());
            count += view_count;
            cost += view_cost;
        }

        assert_eq!(count, snapshot.total_count());
        assert_eq!(cost, snapshot.total_cost().cents());
    }

    #[test]
    fn test_rows_are_sorted_by_ip() {
        let snapshot = snapshot();
        let view = CategoryView::from_result(snapshot.category(Category::Instances).unwrap());

        let ips: Vec<&str> = view.rows.iter().map(|row| row[4].as_str()).collect();
        assert_eq!(ips, vec!["203.0.113.3", "203.0.113.20"]);
    }

    #[test]
    fn test_load_balancer_row() {
        let cells = record_cells(&load_balancer(&["192.0.2.1"]));
        assert_eq!(cells[1], "application");
        assert_eq!(cells[4], "1");
        assert_eq!(cells[5], "3.00");
        assert_eq!(cells[6], "3.65");
    }

    #[test]
    fn test_render_includes_summary_and_warnings() {
        let snapshot = snapshot();
        let rendered = render_snapshot(&snapshot);

        let stamp = snapshot.scanned_at().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        assert!(rendered.starts_with("Scan 00000000-0000-0000-0000-000000000000 of 1 regions at "));
        assert!(rendered.lines().next().unwrap().ends_with(&stamp));
        assert!(rendered.contains("EC2 Instances (includes attached EIPs)"));
        assert!(rendered.contains("NAT Gateway: nat-1"));
        assert!(rendered.contains("EC2: $7.30 for 2 instances"));
        assert!(rendered.contains("Load balancers: $10.95 for 3 load balancer IPs"));
        assert!(rendered.contains("and $10.95 for 2 Elastic IPs"));
        assert!(rendered.contains("warning: elastic_ips: failed to fetch elastic_ips in region eu-west-1"));
    }
}
