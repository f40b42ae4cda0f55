//! Residency records and snapshots.
//!
//! A [`Snapshot`] is the full output of one collection pass. It carries no
//! timestamp, so two passes over unchanged counter files compare equal.

use serde::{Deserialize, Serialize};

/// Residency of one power entity in one state.
///
/// Every numeric field is `None` unless its prefix was configured, found in
/// the source text and parsed successfully. A record with all fields `None`
/// means the state is configured but nothing matched this cycle.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ResidencyRecord {
    /// Power entity name (e.g. "MIF", "PCIe-Modem").
    pub entity_name: String,
    /// State name within the entity (e.g. "SLEEP").
    pub state_name: String,
    /// Number of times the state was entered.
    pub entry_count: Option<u64>,
    /// Cumulative time spent in the state, milliseconds.
    pub total_time_ms: Option<u64>,
    /// Timestamp of the last entry into the state, milliseconds.
    pub last_entry_timestamp_ms: Option<u64>,
}

impl ResidencyRecord {
    /// Creates a record with no fields populated.
    pub fn new(entity_name: impl Into<String>, state_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            state_name: state_name.into(),
            ..Default::default()
        }
    }

    /// Returns true if no numeric field was extracted.
    pub fn is_empty(&self) -> bool {
        self.entry_count.is_none()
            && self.total_time_ms.is_none()
            && self.last_entry_timestamp_ms.is_none()
    }
}

/// Ordered set of residency records from a single collection pass.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub records: Vec<ResidencyRecord>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends all records of `other`, preserving their order.
    pub fn merge(&mut self, other: Snapshot) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResidencyRecord> {
        self.records.iter()
    }

    /// Returns the records of one entity, in configuration order.
    pub fn entity(&self, entity_name: &str) -> Vec<&ResidencyRecord> {
        self.records
            .iter()
            .filter(|r| r.entity_name == entity_name)
            .collect()
    }

    /// Looks up a single (entity, state) record.
    pub fn find(&self, entity_name: &str, state_name: &str) -> Option<&ResidencyRecord> {
        self.records
            .iter()
            .find(|r| r.entity_name == entity_name && r.state_name == state_name)
    }

    /// Number of distinct entities with at least one record.
    pub fn entity_count(&self) -> usize {
        let mut names: Vec<&str> = self.records.iter().map(|r| r.entity_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

impl FromIterator<ResidencyRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ResidencyRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Snapshot {
    type Item = ResidencyRecord;
    type IntoIter = std::vec::IntoIter<ResidencyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: &str, state: &str, count: Option<u64>) -> ResidencyRecord {
        ResidencyRecord {
            entry_count: count,
            ..ResidencyRecord::new(entity, state)
        }
    }

    #[test]
    fn test_record_is_empty() {
        assert!(ResidencyRecord::new("GPS", "ON").is_empty());
        assert!(!record("GPS", "ON", Some(0)).is_empty());
    }

    #[test]
    fn test_snapshot_merge_preserves_order() {
        let mut a: Snapshot = vec![record("LPM", "SICD", Some(1))].into_iter().collect();
        let b: Snapshot = vec![record("MIF", "SICD", Some(2)), record("MIF", "STOP", None)]
            .into_iter()
            .collect();
        a.merge(b);

        let names: Vec<_> = a
            .iter()
            .map(|r| (r.entity_name.as_str(), r.state_name.as_str()))
            .collect();
        assert_eq!(names, vec![("LPM", "SICD"), ("MIF", "SICD"), ("MIF", "STOP")]);
        assert_eq!(a.entity_count(), 2);
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot: Snapshot = vec![
            record("WIFI", "AWAKE", Some(5)),
            record("WIFI", "ASLEEP", Some(7)),
            record("WIFI-PCIE", "L0", None),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.entity("WIFI").len(), 2);
        assert_eq!(snapshot.find("WIFI", "ASLEEP").unwrap().entry_count, Some(7));
        assert!(snapshot.find("WIFI", "L0").is_none());
    }

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let json = serde_json::to_value(record("NFC", "IDLE", Some(3))).unwrap();
        assert_eq!(json["entry_count"], 3);
        assert!(json["total_time_ms"].is_null());
        assert!(json["last_entry_timestamp_ms"].is_null());
    }
}
