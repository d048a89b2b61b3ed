//! AWS inventory provider
//!
//! Talks to EC2, Elastic Load Balancing (classic and v2) and CloudWatch
//! through the official SDK, one regional client per call.
//!
//! Credentials follow the SDK default chain:
//! - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//! - Shared config and credentials files (`AWS_PROFILE`)
//! - Web identity token, IAM instance profile

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat};
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{AttributeBooleanValue, Tag as Ec2Tag};
use aws_sdk_elasticloadbalancingv2::types::LoadBalancerTypeEnum;
use chrono::Utc;
use domain_ip_costs::{
    AddressAttrs, AssociationTarget, InstanceAttrs, InventoryProvider, LoadBalancerAttrs,
    LoadBalancerKind, NetworkInterfaceAttrs, ProviderError, ProviderResult, Region, Tag,
    TrafficMetric,
};
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use tracing::{debug, instrument};

use crate::config::AwsConfig;
use crate::subnets::{SubnetAttrs, SubnetInventory};

const METRIC_QUERY_ID: &str = "processed_bytes";

/// AWS implementation of the inventory interface
pub struct AwsInventory {
    sdk_config: SdkConfig,
}

impl AwsInventory {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    /// Load the SDK configuration from the default credential chain
    pub async fn load(config: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.home_region.clone()));

        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }

        Self::new(loader.load().await)
    }

    fn ec2(&self, region: &Region) -> aws_sdk_ec2::Client {
        let config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(aws_sdk_ec2::config::Region::new(region.to_string()))
            .build();
        aws_sdk_ec2::Client::from_conf(config)
    }

    fn elb(&self, region: &Region) -> aws_sdk_elasticloadbalancing::Client {
        let config = aws_sdk_elasticloadbalancing::config::Builder::from(&self.sdk_config)
            .region(aws_sdk_elasticloadbalancing::config::Region::new(region.to_string()))
            .build();
        aws_sdk_elasticloadbalancing::Client::from_conf(config)
    }

    fn elbv2(&self, region: &Region) -> aws_sdk_elasticloadbalancingv2::Client {
        let config = aws_sdk_elasticloadbalancingv2::config::Builder::from(&self.sdk_config)
            .region(aws_sdk_elasticloadbalancingv2::config::Region::new(region.to_string()))
            .build();
        aws_sdk_elasticloadbalancingv2::Client::from_conf(config)
    }

    fn cloudwatch(&self, region: &Region) -> aws_sdk_cloudwatch::Client {
        let config = aws_sdk_cloudwatch::config::Builder::from(&self.sdk_config)
            .region(aws_sdk_cloudwatch::config::Region::new(region.to_string()))
            .build();
        aws_sdk_cloudwatch::Client::from_conf(config)
    }

    /// NAT gateway owning each allocation id in the region
    async fn nat_gateways_by_allocation(
        &self,
        client: &aws_sdk_ec2::Client,
    ) -> ProviderResult<HashMap<String, String>> {
        let mut owners = HashMap::new();
        let mut next_token = None;

        loop {
            let output = client
                .describe_nat_gateways()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("DescribeNatGateways", e))?;

            for gateway in output.nat_gateways() {
                let Some(gateway_id) = gateway.nat_gateway_id() else {
                    continue;
                };
                for address in gateway.nat_gateway_addresses() {
                    if let Some(allocation_id) = address.allocation_id() {
                        owners.insert(allocation_id.to_string(), gateway_id.to_string());
                    }
                }
            }

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(owners)
    }
}

fn api_error<E: std::error::Error>(operation: &'static str, err: E) -> ProviderError {
    ProviderError::api(operation, DisplayErrorContext(err).to_string())
}

fn tags(tags: &[Ec2Tag]) -> Vec<Tag> {
    tags.iter()
        .filter_map(|tag| Some(Tag::new(tag.key()?, tag.value().unwrap_or_default())))
        .collect()
}

fn load_balancer_kind(kind: Option<&LoadBalancerTypeEnum>) -> Option<LoadBalancerKind> {
    match kind? {
        LoadBalancerTypeEnum::Application => Some(LoadBalancerKind::Application),
        LoadBalancerTypeEnum::Network => Some(LoadBalancerKind::Network),
        LoadBalancerTypeEnum::Gateway => Some(LoadBalancerKind::Gateway),
        _ => None,
    }
}

#[async_trait]
impl InventoryProvider for AwsInventory {
    async fn list_regions(&self) -> ProviderResult<Vec<Region>> {
        let client = aws_sdk_ec2::Client::new(&self.sdk_config);
        let output = client
            .describe_regions()
            .send()
            .await
            .map_err(|e| api_error("DescribeRegions", e))?;

        Ok(output
            .regions()
            .iter()
            .filter_map(|region| region.region_name())
            .map(Region::from)
            .collect())
    }

    #[instrument(skip_all, fields(region = %region))]
    async fn list_instances(&self, region: &Region) -> ProviderResult<Vec<InstanceAttrs>> {
        let client = self.ec2(region);
        let mut instances = Vec::new();
        let mut next_token = None;

        loop {
            let output = client
                .describe_instances()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("DescribeInstances", e))?;

            for reservation in output.reservations() {
                for instance in reservation.instances() {
                    instances.push(InstanceAttrs {
                        instance_id: instance.instance_id().unwrap_or_default().to_string(),
                        state: instance
                            .state()
                            .and_then(|state| state.name())
                            .map(|name| name.as_str().to_string())
                            .unwrap_or_default(),
                        public_ip: instance.public_ip_address().map(str::to_string),
                        vpc_id: instance.vpc_id().map(str::to_string),
                        subnet_id: instance.subnet_id().map(str::to_string),
                        tags: tags(instance.tags()),
                    });
                }
            }

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!(count = instances.len(), "Described instances");
        Ok(instances)
    }

    #[instrument(skip_all, fields(region = %region))]
    async fn list_addresses(&self, region: &Region) -> ProviderResult<Vec<AddressAttrs>> {
        let client = self.ec2(region);
        let output = client
            .describe_addresses()
            .send()
            .await
            .map_err(|e| api_error("DescribeAddresses", e))?;

        let needs_nat_lookup = output.addresses().iter().any(|address| {
            address.instance_id().is_none() && address.network_interface_id().is_some()
        });
        let nat_owners = if needs_nat_lookup {
            self.nat_gateways_by_allocation(&client).await?
        } else {
            HashMap::new()
        };

        let addresses = output
            .addresses()
            .iter()
            .map(|address| {
                let association = match (address.instance_id(), address.allocation_id()) {
                    (Some(instance_id), _) => {
                        Some(AssociationTarget::Instance(instance_id.to_string()))
                    }
                    (None, Some(allocation_id)) => nat_owners
                        .get(allocation_id)
                        .map(|gateway_id| AssociationTarget::NatGateway(gateway_id.clone())),
                    (None, None) => None,
                };

                AddressAttrs {
                    public_ip: address.public_ip().unwrap_or_default().to_string(),
                    allocation_id: address.allocation_id().map(str::to_string),
                    association,
                    tags: tags(address.tags()),
                }
            })
            .collect::<Vec<_>>();

        debug!(count = addresses.len(), "Described addresses");
        Ok(addresses)
    }

    #[instrument(skip_all, fields(region = %region))]
    async fn list_load_balancers(&self, region: &Region) -> ProviderResult<Vec<LoadBalancerAttrs>> {
        let client = self.elbv2(region);
        let mut load_balancers = Vec::new();
        let mut marker = None;

        loop {
            let output = client
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| api_error("DescribeLoadBalancers", e))?;

            for lb in output.load_balancers() {
                let Some(kind) = load_balancer_kind(lb.r#type()) else {
                    debug!(name = ?lb.load_balancer_name(), "Skipping load balancer of unknown type");
                    continue;
                };
                load_balancers.push(LoadBalancerAttrs {
                    name: lb.load_balancer_name().unwrap_or_default().to_string(),
                    kind,
                    dns_name: lb.dns_name().unwrap_or_default().to_string(),
                    arn: lb.load_balancer_arn().map(str::to_string),
                });
            }

            marker = output.next_marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        debug!(count = load_balancers.len(), "Described load balancers");
        Ok(load_balancers)
    }

    #[instrument(skip_all, fields(region = %region))]
    async fn list_classic_load_balancers(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<LoadBalancerAttrs>> {
        let client = self.elb(region);
        let mut load_balancers = Vec::new();
        let mut marker = None;

        loop {
            let output = client
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| api_error("DescribeClassicLoadBalancers", e))?;

            for lb in output.load_balancer_descriptions() {
                load_balancers.push(LoadBalancerAttrs {
                    name: lb.load_balancer_name().unwrap_or_default().to_string(),
                    kind: LoadBalancerKind::Classic,
                    dns_name: lb.dns_name().unwrap_or_default().to_string(),
                    arn: None,
                });
            }

            marker = output.next_marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        debug!(count = load_balancers.len(), "Described classic load balancers");
        Ok(load_balancers)
    }

    #[instrument(skip_all, fields(region = %region))]
    async fn list_network_interfaces(
        &self,
        region: &Region,
    ) -> ProviderResult<Vec<NetworkInterfaceAttrs>> {
        let client = self.ec2(region);
        let mut interfaces = Vec::new();
        let mut next_token = None;

        loop {
            let output = client
                .describe_network_interfaces()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("DescribeNetworkInterfaces", e))?;

            for interface in output.network_interfaces() {
                interfaces.push(NetworkInterfaceAttrs {
                    interface_id: interface.network_interface_id().unwrap_or_default().to_string(),
                    public_ip: interface
                        .association()
                        .and_then(|association| association.public_ip())
                        .map(str::to_string),
                    interface_type: interface.interface_type().map(|t| t.as_str().to_string()),
                    description: interface
                        .description()
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                });
            }

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!(count = interfaces.len(), "Described network interfaces");
        Ok(interfaces)
    }

    async fn resolve_dns(&self, name: &str) -> ProviderResult<Vec<IpAddr>> {
        let resolved = tokio::net::lookup_host((name, 0))
            .await
            .map_err(|e| ProviderError::dns(name, e.to_string()))?;

        let ips: BTreeSet<IpAddr> = resolved.map(|addr| addr.ip()).collect();
        Ok(ips.into_iter().collect())
    }

    #[instrument(skip_all, fields(region = %region, identifier = %metric.identifier))]
    async fn query_traffic_metric(
        &self,
        region: &Region,
        metric: &TrafficMetric,
    ) -> ProviderResult<u64> {
        let invalid = |e: aws_sdk_cloudwatch::error::BuildError| {
            ProviderError::InvalidRequest(e.to_string())
        };

        let dimension = Dimension::builder()
            .name(metric.dimension_name())
            .value(&metric.identifier)
            .build()
            .map_err(invalid)?;
        let stat = MetricStat::builder()
            .metric(
                Metric::builder()
                    .namespace(metric.namespace())
                    .metric_name(metric.metric_name())
                    .dimensions(dimension)
                    .build(),
            )
            .period(TrafficMetric::PERIOD_SECS)
            .stat(TrafficMetric::STATISTIC)
            .build()
            .map_err(invalid)?;
        let query = MetricDataQuery::builder()
            .id(METRIC_QUERY_ID)
            .metric_stat(stat)
            .return_data(true)
            .build()
            .map_err(invalid)?;

        let end = Utc::now();
        let start = end - chrono::Duration::days(TrafficMetric::WINDOW_DAYS);
        let client = self.cloudwatch(region);

        let mut total = 0.0_f64;
        let mut next_token = None;

        loop {
            let output = client
                .get_metric_data()
                .metric_data_queries(query.clone())
                .start_time(DateTime::from_secs(start.timestamp()))
                .end_time(DateTime::from_secs(end.timestamp()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("GetMetricData", e))?;

            total += output
                .metric_data_results()
                .iter()
                .filter(|result| result.id() == Some(METRIC_QUERY_ID))
                .flat_map(|result| result.values())
                .sum::<f64>();

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(total.max(0.0) as u64)
    }
}

#[async_trait]
impl SubnetInventory for AwsInventory {
    #[instrument(skip_all, fields(region = %region))]
    async fn list_subnets(&self, region: &Region) -> ProviderResult<Vec<SubnetAttrs>> {
        let client = self.ec2(region);
        let mut subnets = Vec::new();
        let mut next_token = None;

        loop {
            let output = client
                .describe_subnets()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("DescribeSubnets", e))?;

            for subnet in output.subnets() {
                subnets.push(SubnetAttrs {
                    subnet_id: subnet.subnet_id().unwrap_or_default().to_string(),
                    vpc_id: subnet.vpc_id().unwrap_or_default().to_string(),
                    map_public_ip_on_launch: subnet.map_public_ip_on_launch().unwrap_or(false),
                });
            }

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(subnets)
    }

    #[instrument(skip_all, fields(region = %region, subnet_id = %subnet_id, enabled = enabled))]
    async fn set_map_public_ip_on_launch(
        &self,
        region: &Region,
        subnet_id: &str,
        enabled: bool,
    ) -> ProviderResult<()> {
        self.ec2(region)
            .modify_subnet_attribute()
            .subnet_id(subnet_id)
            .map_public_ip_on_launch(AttributeBooleanValue::builder().value(enabled).build())
            .send()
            .await
            .map_err(|e| api_error("ModifySubnetAttribute", e))?;

        Ok(())
    }
}
