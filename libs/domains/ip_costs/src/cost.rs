//! Monthly cost of public IPv4 addresses.

use crate::models::Money;

/// Cost-relevant attributes of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Billable {
    Instance { has_public_ip: bool },
    ElasticIp { associated: bool },
    NetworkInterface { has_public_ip: bool },
    LoadBalancer { resolved_ips: usize },
}

/// Pure, stateless cost rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostModel;

impl CostModel {
    /// Charge per public IPv4 address per month: 0.005/hour over 730 hours.
    pub const FLAT_FEE: Money = Money::from_cents(365);

    pub fn monthly_cost(billable: Billable) -> Money {
        let fee = Self::FLAT_FEE;
        match billable {
            Billable::Instance { has_public_ip } | Billable::NetworkInterface { has_public_ip } => {
                if has_public_ip { fee } else { Money::ZERO }
            }
            // An idle reservation is charged on top of the address itself
            Billable::ElasticIp { associated: true } => fee,
            Billable::ElasticIp { associated: false } => fee.times(2),
            Billable::LoadBalancer { resolved_ips } => fee.times(resolved_ips),
        }
    }
}
