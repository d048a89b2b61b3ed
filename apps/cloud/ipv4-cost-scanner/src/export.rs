//! CSV export of the instance table

use domain_ip_costs::{Category, CategoryResult};
use eyre::{ensure, Result, WrapErr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::render::{record_cells, sorted_by_ip, INSTANCE_HEADERS};

pub const DEFAULT_CSV_PATH: &str = "ec2_instances.csv";

/// Writes the header row and one row per instance, sorted by public IP.
/// Returns the number of data rows.
pub fn write_instances_csv<W: Write>(writer: W, result: &CategoryResult) -> Result<usize> {
    ensure!(
        result.category() == Category::Instances,
        "only the instances category can be exported, got {}",
        result.category()
    );

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(INSTANCE_HEADERS)?;

    let records = sorted_by_ip(result.records());
    for record in &records {
        csv.write_record(record_cells(record))?;
    }
    csv.flush()?;

    Ok(records.len())
}

pub fn export_instances(path: &Path, result: &CategoryResult) -> Result<usize> {
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    let rows = write_instances_csv(BufWriter::new(file), result)
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), rows, "Exported instances");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_ip_costs::{InstanceRecord, Money, Region, ResourceRecord};

    fn instance(id: &str, ip: &str, name: &str) -> ResourceRecord {
        ResourceRecord::Instance(InstanceRecord {
            region: Region::new("eu-west-1"),
            instance_id: id.to_string(),
            name_tag: name.to_string(),
            state: "running".to_string(),
            public_ip: ip.to_string(),
            vpc_id: Some("vpc-1".to_string()),
            subnet_id: Some("subnet-1".to_string()),
            monthly_cost: Money::from_cents(365),
        })
    }

    #[test]
    fn test_write_instances_csv() {
        let result = CategoryResult::new(
            Category::Instances,
            vec![
                instance("i-2", "203.0.113.20", "api, internal"),
                instance("i-1", "203.0.113.3", "web"),
            ],
            vec![],
        );

        let mut out = Vec::new();
        let rows = write_instances_csv(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(rows, 2);
        assert_eq!(
            lines[0],
            "Region,Name Tag,Instance State,Instance ID,Public IP,VPC ID,Subnet ID,Cost"
        );
        assert_eq!(
            lines[1],
            "eu-west-1,web,running,i-1,203.0.113.3,vpc-1,subnet-1,3.65"
        );
        assert_eq!(
            lines[2],
            "eu-west-1,\"api, internal\",running,i-2,203.0.113.20,vpc-1,subnet-1,3.65"
        );
    }

    #[test]
    fn test_empty_export_keeps_header() {
        let result = CategoryResult::new(Category::Instances, vec![], vec![]);

        let mut out = Vec::new();
        assert_eq!(write_instances_csv(&mut out, &result).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_rejects_other_categories() {
        let result = CategoryResult::new(Category::ElasticIps, vec![], vec![]);
        assert!(write_instances_csv(Vec::new(), &result).is_err());
    }
}
