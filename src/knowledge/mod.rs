//! Defect Knowledge Base
//!
//! Read-only table mapping a defect class key (as emitted by the detector)
//! to its severity, power-loss estimate and remediation steps. Loaded once
//! at startup, shared behind an `Arc`, never mutated.

pub mod record;
mod schema;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use record::{DefectRecord, LegacyDefectRecord};
pub use schema::CURRENT_SCHEMA_VERSION;

/// Table compiled into the binary (latest revision)
const EMBEDDED_TABLE: &str = include_str!("../../data/defect_classes.json");

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeBaseError {
    #[error("Failed to read defect table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed defect table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported defect table schema version {0}")]
    UnsupportedVersion(u32),

    #[error("Defect table is empty")]
    Empty,

    #[error("Invalid class key {0:?}: keys must be non-empty lowercase")]
    InvalidKey(String),

    #[error("Duplicate class key {0:?}")]
    DuplicateKey(String),

    #[error("Invalid record for {key}: {reason}")]
    InvalidRecord { key: String, reason: String },

    #[error("Unknown priority level {value:?} for {key}")]
    UnknownPriority { key: String, value: String },
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    records: HashMap<String, DefectRecord>,
    source_version: u32,
}

impl KnowledgeBase {
    pub fn load_embedded() -> Result<Self, KnowledgeBaseError> {
        Self::from_json_str(EMBEDDED_TABLE)
    }

    pub fn from_path(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let text = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a table document, migrating older schema versions.
    pub fn from_json_str(text: &str) -> Result<Self, KnowledgeBaseError> {
        let (source_version, records) = schema::parse_document(text)?;
        Ok(Self {
            records,
            source_version,
        })
    }

    /// Exact lookup on the trimmed, lowercased key. A miss is not an error.
    pub fn lookup(&self, class_key: &str) -> Option<&DefectRecord> {
        self.records.get(&class_key.trim().to_lowercase())
    }

    /// Known class keys, sorted
    pub fn class_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.records.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Schema version of the document the table was loaded from
    pub fn source_version(&self) -> u32 {
        self.source_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LEGACY_TABLE: &str = r#"{
        "schemaVersion": 1,
        "defects": {
            "short-circuit": {
                "className": "Short Circuit",
                "stressFactors": ["Electrical", "Manufacturing"],
                "priorityLevel": "High",
                "powerLoss": "50-100%",
                "category": "Electrical",
                "CoA": "Circuit Failure",
                "description": "Current follows an unintended path.",
                "recommendations": ["Immediate system shutdown"]
            },
            "dust-deposit": {
                "className": "Dust Deposit",
                "stressFactors": ["Environmental"],
                "priorityLevel": "Low",
                "powerLoss": "3-15%",
                "category": "Maintenance",
                "CoA": "Surface Contamination",
                "description": "Dust on the glass.",
                "recommendations": ["Clean regularly"]
            }
        }
    }"#;

    fn single_record_table(version: u32, key: &str, record: &str) -> String {
        format!(r#"{{"schemaVersion": {version}, "defects": {{"{key}": {record}}}}}"#)
    }

    #[test]
    fn test_embedded_table_loads() {
        let kb = KnowledgeBase::load_embedded().unwrap();
        assert_eq!(kb.source_version(), CURRENT_SCHEMA_VERSION);
        assert_eq!(
            kb.class_keys(),
            vec!["bypass-diode", "dust-deposit", "partial-shading", "short-circuit"]
        );
    }

    #[test]
    fn test_short_circuit_is_strings_and_modules() {
        let kb = KnowledgeBase::load_embedded().unwrap();
        let record = kb.lookup("short-circuit").unwrap();
        assert!(record.category.contains("Strings and modules"));
        assert!(record.severity_level.starts_with('1'));
    }

    #[test]
    fn test_lookup_is_case_insensitive_exact() {
        let kb = KnowledgeBase::load_embedded().unwrap();
        assert!(kb.lookup("Short-Circuit").is_some());
        assert!(kb.lookup("PARTIAL-SHADING").is_some());
        assert!(kb.lookup(" short-circuit ").is_some());
        assert!(kb.lookup("\tDust-Deposit\n").is_some());
        assert!(kb.lookup("short").is_none());
        assert!(kb.lookup("short-circuits").is_none());
        assert!(kb.lookup("unknown-class").is_none());
    }

    #[test]
    fn test_legacy_table_migrates_priority() {
        let kb = KnowledgeBase::from_json_str(LEGACY_TABLE).unwrap();
        assert_eq!(kb.source_version(), 1);
        assert_eq!(kb.lookup("short-circuit").unwrap().severity_level, "2 - High");
        assert_eq!(kb.lookup("dust-deposit").unwrap().severity_level, "4 - Low");
    }

    fn leading_level(severity: &str) -> u32 {
        severity
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|digits| digits.parse().ok())
            .unwrap()
    }

    #[test]
    fn test_legacy_levels_match_current_scale() {
        let current = KnowledgeBase::load_embedded().unwrap();
        let table = LEGACY_TABLE.replace("\"Low\"", "\"Medium\"");
        let migrated = KnowledgeBase::from_json_str(&table).unwrap();

        // embedded partial-shading is the Medium entry
        let current_medium = &current.lookup("partial-shading").unwrap().severity_level;
        let migrated_medium = &migrated.lookup("dust-deposit").unwrap().severity_level;
        assert!(current_medium.ends_with("Medium"));
        assert_eq!(migrated_medium, current_medium);
        assert_eq!(leading_level(migrated_medium), leading_level(current_medium));

        let current_high = &current.lookup("bypass-diode").unwrap().severity_level;
        let migrated_high = &migrated.lookup("short-circuit").unwrap().severity_level;
        assert_eq!(leading_level(migrated_high), leading_level(current_high));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let record = r#"{
            "className": "Short Circuit", "stressFactors": [], "severityLevel": "1 - Critical",
            "powerLoss": "50%", "category": "Strings and modules", "CoA": "1",
            "description": "Short.", "recommendations": ["Shut down"]
        }"#;
        let table = format!(
            r#"{{"schemaVersion": 2, "defects": {{"short-circuit": {record}, "short-circuit": {}}}}}"#,
            record.replace("Short.", "Second")
        );
        let err = KnowledgeBase::from_json_str(&table).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::DuplicateKey(ref k) if k == "short-circuit"));

        let legacy = LEGACY_TABLE.replace("\"dust-deposit\"", "\"short-circuit\"");
        let err = KnowledgeBase::from_json_str(&legacy).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::DuplicateKey(_)));
    }

    #[test]
    fn test_severity_off_scale_rejected() {
        let record = r#"{
            "className": "Hot Spot", "stressFactors": [], "severityLevel": "High",
            "powerLoss": "5%", "category": "Cells", "CoA": "2", "description": "Hot cell.",
            "recommendations": ["Inspect"]
        }"#;
        let err = KnowledgeBase::from_json_str(&single_record_table(2, "hot-spot", record)).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::InvalidRecord { ref key, .. } if key == "hot-spot"));
    }

    #[test]
    fn test_legacy_unknown_priority_rejected() {
        let table = LEGACY_TABLE.replace("\"High\"", "\"Urgent\"");
        let err = KnowledgeBase::from_json_str(&table).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::UnknownPriority { ref value, .. } if value == "Urgent"));
    }

    #[test]
    fn test_v2_rejects_legacy_field() {
        let table = LEGACY_TABLE.replace("\"schemaVersion\": 1", "\"schemaVersion\": 2");
        let err = KnowledgeBase::from_json_str(&table).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::Parse(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let err = KnowledgeBase::from_json_str(r#"{"schemaVersion": 7, "defects": {}}"#).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = KnowledgeBase::from_json_str(r#"{"schemaVersion": 2, "defects": {}}"#).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::Empty));
    }

    #[test]
    fn test_uppercase_key_rejected() {
        let record = r#"{
            "className": "Hot Spot", "stressFactors": [], "severityLevel": "2 - High",
            "powerLoss": "5%", "category": "Cells", "CoA": "2", "description": "Hot cell.",
            "recommendations": ["Inspect"]
        }"#;
        let err = KnowledgeBase::from_json_str(&single_record_table(2, "Hot-Spot", record)).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::InvalidKey(ref k) if k == "Hot-Spot"));
    }

    #[test]
    fn test_record_validation() {
        let no_recommendations = r#"{
            "className": "Hot Spot", "stressFactors": [], "severityLevel": "2 - High",
            "powerLoss": "5%", "category": "Cells", "CoA": "2", "description": "Hot cell.",
            "recommendations": []
        }"#;
        let err = KnowledgeBase::from_json_str(&single_record_table(2, "hot-spot", no_recommendations))
            .unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::InvalidRecord { ref key, .. } if key == "hot-spot"));

        let blank_recommendation = no_recommendations.replace("[]", r#"["  "]"#);
        let err = KnowledgeBase::from_json_str(&single_record_table(2, "hot-spot", &blank_recommendation))
            .unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::InvalidRecord { .. }));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LEGACY_TABLE.as_bytes()).unwrap();

        let kb = KnowledgeBase::from_path(file.path()).unwrap();
        assert_eq!(kb.len(), 2);

        let missing = KnowledgeBase::from_path(Path::new("/nonexistent/defects.json")).unwrap_err();
        assert!(matches!(missing, KnowledgeBaseError::Io { .. }));
    }
}
