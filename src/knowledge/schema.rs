//! Versioned table document
//!
//! ```json
//! { "schemaVersion": 2, "defects": { "short-circuit": { ... } } }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::record::{DefectRecord, LegacyDefectRecord, SEVERITY_SCALE};
use super::KnowledgeBaseError;

pub const CURRENT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionHeader {
    schema_version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "T: DeserializeOwned")]
struct TableDocument<T> {
    defects: Entries<T>,
}

/// JSON object kept as ordered pairs, so repeated keys survive parsing
/// instead of silently overwriting each other.
#[derive(Debug)]
struct Entries<T>(Vec<(String, T)>);

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: DeserializeOwned> Visitor<'de> for EntriesVisitor<T> {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of defect records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Parse a table document of any supported version into current records.
pub(super) fn parse_document(
    text: &str,
) -> Result<(u32, HashMap<String, DefectRecord>), KnowledgeBaseError> {
    let version = serde_json::from_str::<VersionHeader>(text)?.schema_version;

    let entries: Vec<(String, DefectRecord)> = match version {
        1 => {
            let doc: TableDocument<LegacyDefectRecord> = serde_json::from_str(text)?;
            doc.defects
                .0
                .into_iter()
                .map(|(key, record)| match record.migrate() {
                    Ok(migrated) => Ok((key, migrated)),
                    Err(value) => Err(KnowledgeBaseError::UnknownPriority { key, value }),
                })
                .collect::<Result<Vec<_>, KnowledgeBaseError>>()?
        }
        CURRENT_SCHEMA_VERSION => {
            let doc: TableDocument<DefectRecord> = serde_json::from_str(text)?;
            doc.defects.0
        }
        other => return Err(KnowledgeBaseError::UnsupportedVersion(other)),
    };

    if entries.is_empty() {
        return Err(KnowledgeBaseError::Empty);
    }

    let mut table = HashMap::with_capacity(entries.len());
    for (key, record) in entries {
        if key.is_empty() || key != key.to_lowercase() || key.trim() != key {
            return Err(KnowledgeBaseError::InvalidKey(key));
        }
        if table.contains_key(&key) {
            return Err(KnowledgeBaseError::DuplicateKey(key));
        }

        record.validate().map_err(|e| KnowledgeBaseError::InvalidRecord {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        if record.recommendations.iter().any(|r| r.trim().is_empty()) {
            return Err(KnowledgeBaseError::InvalidRecord {
                key,
                reason: "recommendations: blank entry".to_string(),
            });
        }

        if !SEVERITY_SCALE.contains(&record.severity_level.as_str()) {
            return Err(KnowledgeBaseError::InvalidRecord {
                reason: format!("severityLevel {:?} is not on the scale", record.severity_level),
                key,
            });
        }

        table.insert(key, record);
    }

    Ok((version, table))
}
