//! Cloud inventory providers

pub mod aws;

pub use aws::AwsInventory;
