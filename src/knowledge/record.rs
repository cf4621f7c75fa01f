//! Defect record types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Severity labels shared by every schema version, most urgent first.
/// Clients read the leading number only.
pub const SEVERITY_SCALE: [&str; 4] = ["1 - Critical", "2 - High", "3 - Medium", "4 - Low"];

/// Knowledge-base entry for one defect class.
///
/// Serialized with the field names the mobile client already consumes
/// (`className`, `severityLevel`, `CoA`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DefectRecord {
    #[validate(length(min = 1))]
    pub class_name: String,

    pub stress_factors: Vec<String>,

    /// Numeric-scale label, "1 - Critical" is the most urgent
    #[validate(length(min = 1))]
    pub severity_level: String,

    /// Estimated power loss range, e.g. "15-25%"
    #[validate(length(min = 1))]
    pub power_loss: String,

    #[validate(length(min = 1))]
    pub category: String,

    /// Classes of Abnormalities code
    #[serde(rename = "CoA")]
    #[validate(length(min = 1))]
    pub coa: String,

    #[validate(length(min = 1))]
    pub description: String,

    /// Ordered remediation steps
    #[validate(length(min = 1))]
    pub recommendations: Vec<String>,
}

/// Schema version 1 record, before `priorityLevel` became `severityLevel`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LegacyDefectRecord {
    pub class_name: String,
    pub stress_factors: Vec<String>,
    pub priority_level: String,
    pub power_loss: String,
    pub category: String,
    #[serde(rename = "CoA")]
    pub coa: String,
    pub description: String,
    pub recommendations: Vec<String>,
}

impl LegacyDefectRecord {
    /// Map the three-level priority onto [`SEVERITY_SCALE`]. v1 had no
    /// critical level, so `High` lands on the second step.
    pub fn migrate(self) -> Result<DefectRecord, String> {
        let severity_level = match self.priority_level.trim().to_ascii_lowercase().as_str() {
            "high" => SEVERITY_SCALE[1],
            "medium" => SEVERITY_SCALE[2],
            "low" => SEVERITY_SCALE[3],
            _ => return Err(self.priority_level),
        };

        Ok(DefectRecord {
            class_name: self.class_name,
            stress_factors: self.stress_factors,
            severity_level: severity_level.to_string(),
            power_loss: self.power_loss,
            category: self.category,
            coa: self.coa,
            description: self.description,
            recommendations: self.recommendations,
        })
    }
}
