use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::net::IpAddr;
use std::ops::{Add, AddAssign};
use strum::{AsRefStr, Display, EnumString};

/// Opaque region identifier, the unit of parallelism of a scan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Region {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Resource category, each owning an independent collector and result.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Instances,
    ElasticIps,
    LoadBalancers,
    NetworkInterfaces,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Instances,
        Category::ElasticIps,
        Category::LoadBalancers,
        Category::NetworkInterfaces,
    ];

    /// Human readable title used by the table renderer
    pub fn title(&self) -> &'static str {
        match self {
            Category::Instances => "EC2 Instances (includes attached EIPs)",
            Category::ElasticIps => "Elastic IPs not attached to instances",
            Category::LoadBalancers => "Load Balancers",
            Category::NetworkInterfaces => "Elastic Network Interfaces (also include EC2, LBs and EIPs)",
        }
    }

    /// Upper-case key used in per-category environment variables
    pub fn env_key(&self) -> &'static str {
        match self {
            Category::Instances => "INSTANCES",
            Category::ElasticIps => "ELASTIC_IPS",
            Category::LoadBalancers => "LOAD_BALANCERS",
            Category::NetworkInterfaces => "NETWORK_INTERFACES",
        }
    }
}

/// Exact monetary amount in cents.
///
/// Serialized as a decimal number (`3.65`), displayed with two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(into = "f64")]
pub struct Money {
    cents: i64,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Convert to decimal value
    pub fn to_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Multiply by a count of units
    pub fn times(self, units: usize) -> Money {
        let units = i64::try_from(units).unwrap_or(i64::MAX);
        Money {
            cents: self.cents.saturating_mul(units),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl From<Money> for f64 {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// Key-value tag attached to a cloud resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

const NAME_TAG_KEYS: [&str; 3] = [
    "Name",
    "aws:cloudformation:stack-name",
    "aws:autoscaling:groupName",
];

/// Best display name for a resource: the `Name` tag, falling back to the
/// owning CloudFormation stack, then the owning auto scaling group.
pub fn name_tag(tags: &[Tag]) -> String {
    NAME_TAG_KEYS
        .iter()
        .find_map(|key| {
            tags.iter()
                .find(|tag| tag.key == *key && !tag.value.is_empty())
                .map(|tag| tag.value.clone())
        })
        .unwrap_or_default()
}

/// What an Elastic IP is currently attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AssociationTarget {
    Instance(String),
    NatGateway(String),
}

impl fmt::Display for AssociationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssociationTarget::Instance(id) => write!(f, "Instance: {}", id),
            AssociationTarget::NatGateway(id) => write!(f, "NAT Gateway: {}", id),
        }
    }
}

/// Load balancer flavour; decides which traffic metric applies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoadBalancerKind {
    Application,
    Network,
    Gateway,
    Classic,
}

/// Processed-bytes metric of one load balancer: Sum at one hour
/// granularity over the last seven days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficMetric {
    pub kind: LoadBalancerKind,
    /// Dimension value identifying the load balancer
    pub identifier: String,
}

impl TrafficMetric {
    pub const PERIOD_SECS: i32 = 3600;
    pub const WINDOW_DAYS: i64 = 7;
    pub const STATISTIC: &'static str = "Sum";

    /// Metric for a load balancer, `None` for kinds that publish none.
    ///
    /// ELBv2 load balancers are identified by the part of their ARN after
    /// `loadbalancer/`, classic ones by name.
    pub fn for_load_balancer(
        kind: LoadBalancerKind,
        name: &str,
        arn: Option<&str>,
    ) -> Option<Self> {
        let identifier = match kind {
            LoadBalancerKind::Classic => name.to_string(),
            LoadBalancerKind::Application | LoadBalancerKind::Network => {
                let arn = arn?;
                match arn.split_once("loadbalancer/") {
                    Some((_, suffix)) if !suffix.is_empty() => suffix.to_string(),
                    _ => arn.to_string(),
                }
            }
            LoadBalancerKind::Gateway => return None,
        };

        Some(Self { kind, identifier })
    }

    pub fn namespace(&self) -> &'static str {
        match self.kind {
            LoadBalancerKind::Application => "AWS/ApplicationELB",
            LoadBalancerKind::Network => "AWS/NetworkELB",
            LoadBalancerKind::Gateway => "AWS/GatewayELB",
            LoadBalancerKind::Classic => "AWS/ELB",
        }
    }

    pub fn dimension_name(&self) -> &'static str {
        match self.kind {
            LoadBalancerKind::Classic => "LoadBalancerName",
            _ => "LoadBalancer",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self.kind {
            LoadBalancerKind::Classic => "EstimatedProcessedBytes",
            _ => "ProcessedBytes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceRecord {
    pub region: Region,
    pub instance_id: String,
    pub name_tag: String,
    pub state: String,
    pub public_ip: String,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub monthly_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElasticIpRecord {
    pub region: Region,
    pub public_ip: String,
    pub allocation_id: Option<String>,
    pub name_tag: String,
    pub association: Option<AssociationTarget>,
    pub monthly_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadBalancerRecord {
    pub region: Region,
    pub name: String,
    pub kind: LoadBalancerKind,
    pub dns_name: String,
    /// Distinct addresses the DNS name resolved to at scan time
    pub public_ips: Vec<IpAddr>,
    /// Bytes processed over the last seven days, when the metric was available
    pub traffic_last_week: Option<u64>,
    pub monthly_cost: Money,
}

impl LoadBalancerRecord {
    pub fn ip_count(&self) -> usize {
        self.public_ips.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInterfaceRecord {
    pub region: Region,
    pub interface_id: String,
    pub public_ip: String,
    pub interface_type: Option<String>,
    pub description: Option<String>,
    pub monthly_cost: Money,
}

/// One billable resource found by a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum ResourceRecord {
    Instance(InstanceRecord),
    ElasticIp(ElasticIpRecord),
    LoadBalancer(LoadBalancerRecord),
    NetworkInterface(NetworkInterfaceRecord),
}

impl ResourceRecord {
    pub fn category(&self) -> Category {
        match self {
            ResourceRecord::Instance(_) => Category::Instances,
            ResourceRecord::ElasticIp(_) => Category::ElasticIps,
            ResourceRecord::LoadBalancer(_) => Category::LoadBalancers,
            ResourceRecord::NetworkInterface(_) => Category::NetworkInterfaces,
        }
    }

    pub fn region(&self) -> &Region {
        match self {
            ResourceRecord::Instance(r) => &r.region,
            ResourceRecord::ElasticIp(r) => &r.region,
            ResourceRecord::LoadBalancer(r) => &r.region,
            ResourceRecord::NetworkInterface(r) => &r.region,
        }
    }

    pub fn monthly_cost(&self) -> Money {
        match self {
            ResourceRecord::Instance(r) => r.monthly_cost,
            ResourceRecord::ElasticIp(r) => r.monthly_cost,
            ResourceRecord::LoadBalancer(r) => r.monthly_cost,
            ResourceRecord::NetworkInterface(r) => r.monthly_cost,
        }
    }

    /// Number of public addresses this record accounts for
    pub fn billable_addresses(&self) -> usize {
        match self {
            ResourceRecord::LoadBalancer(r) => r.ip_count(),
            _ => 1,
        }
    }

    /// Address used to order records for display
    pub fn sort_ip(&self) -> Option<IpAddr> {
        match self {
            ResourceRecord::Instance(r) => r.public_ip.parse().ok(),
            ResourceRecord::ElasticIp(r) => r.public_ip.parse().ok(),
            ResourceRecord::LoadBalancer(r) => r.public_ips.first().copied(),
            ResourceRecord::NetworkInterface(r) => r.public_ip.parse().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_money_display_and_sum() {
        let fee = Money::from_cents(365);
        assert_eq!(fee.to_string(), "3.65");
        assert_eq!(fee.times(3), Money::from_cents(1095));
        assert_eq!(fee.times(0), Money::ZERO);

        let total: Money = [fee, fee, fee].iter().sum();
        assert_eq!(total.to_string(), "10.95");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-730).to_string(), "-7.30");
    }

    #[test]
    fn test_money_serializes_as_decimal() {
        let json = serde_json::to_string(&Money::from_cents(730)).unwrap();
        assert_eq!(json, "7.3");
    }

    #[test]
    fn test_load_balancer_record_json_keeps_both_tags() {
        let record = ResourceRecord::LoadBalancer(LoadBalancerRecord {
            region: Region::new("us-east-1"),
            name: "web".to_string(),
            kind: LoadBalancerKind::Network,
            dns_name: "web.elb.amazonaws.com".to_string(),
            public_ips: vec!["198.51.100.1".parse().unwrap()],
            traffic_last_week: None,
            monthly_cost: Money::from_cents(365),
        });

        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text.matches("\"kind\"").count(), 1);

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["record_type"], "load_balancer");
        assert_eq!(json["kind"], "network");
    }

    #[test]
    fn test_name_tag_fallbacks() {
        assert_eq!(name_tag(&[]), "");

        let tags = vec![
            Tag::new("aws:autoscaling:groupName", "web-asg"),
            Tag::new("aws:cloudformation:stack-name", "web-stack"),
        ];
        assert_eq!(name_tag(&tags), "web-stack");

        let tags = vec![Tag::new("aws:autoscaling:groupName", "web-asg")];
        assert_eq!(name_tag(&tags), "web-asg");

        let tags = vec![
            Tag::new("aws:cloudformation:stack-name", "web-stack"),
            Tag::new("Name", "bastion"),
        ];
        assert_eq!(name_tag(&tags), "bastion");
    }

    #[test]
    fn test_category_string_forms() {
        assert_eq!(Category::ElasticIps.to_string(), "elastic_ips");
        assert_eq!(
            Category::from_str("load_balancers").unwrap(),
            Category::LoadBalancers
        );
        assert_eq!(Category::NetworkInterfaces.env_key(), "NETWORK_INTERFACES");
    }

    #[test]
    fn test_association_target_display() {
        assert_eq!(
            AssociationTarget::Instance("i-123".into()).to_string(),
            "Instance: i-123"
        );
        assert_eq!(
            AssociationTarget::NatGateway("nat-9".into()).to_string(),
            "NAT Gateway: nat-9"
        );
    }

    #[test]
    fn test_traffic_metric_per_kind() {
        let alb = TrafficMetric::for_load_balancer(
            LoadBalancerKind::Application,
            "web",
            Some("arn:aws:elasticloadbalancing:us-east-1:123:loadbalancer/app/web/50dc6c495c0c9188"),
        )
        .unwrap();
        assert_eq!(alb.identifier, "app/web/50dc6c495c0c9188");
        assert_eq!(alb.namespace(), "AWS/ApplicationELB");
        assert_eq!(alb.dimension_name(), "LoadBalancer");
        assert_eq!(alb.metric_name(), "ProcessedBytes");

        let nlb = TrafficMetric::for_load_balancer(
            LoadBalancerKind::Network,
            "edge",
            Some("arn:aws:elasticloadbalancing:eu-west-1:123:loadbalancer/net/edge/abc"),
        )
        .unwrap();
        assert_eq!(nlb.identifier, "net/edge/abc");
        assert_eq!(nlb.namespace(), "AWS/NetworkELB");

        let classic =
            TrafficMetric::for_load_balancer(LoadBalancerKind::Classic, "legacy", None).unwrap();
        assert_eq!(classic.identifier, "legacy");
        assert_eq!(classic.namespace(), "AWS/ELB");
        assert_eq!(classic.dimension_name(), "LoadBalancerName");
        assert_eq!(classic.metric_name(), "EstimatedProcessedBytes");

        assert!(
            TrafficMetric::for_load_balancer(LoadBalancerKind::Gateway, "gw", Some("arn")).is_none()
        );
        assert!(
            TrafficMetric::for_load_balancer(LoadBalancerKind::Application, "web", None).is_none()
        );
    }

    #[test]
    fn test_load_balancer_kind_parse() {
        assert_eq!(
            LoadBalancerKind::from_str("network").unwrap(),
            LoadBalancerKind::Network
        );
        assert_eq!(LoadBalancerKind::Classic.to_string(), "classic");
    }
}
