//! Feature encoder - categorical fields to integer codes
//!
//! The encoding table is a file-system artifact loaded once at startup and
//! read-only for the process lifetime. Encoding itself is a pure function of
//! (record, table) and never fails: a categorical value absent from the
//! table degrades to the sentinel code instead of rejecting the request.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::layout::FEATURE_COUNT;
use super::vector::FeatureVector;
use crate::models::transaction::Transaction;

/// Reserved code substituted for any categorical value not present in the
/// encoding table
pub const SENTINEL_CODE: i64 = -1;

/// The categorical fields of a transaction record, in layout order
pub const CATEGORICAL_FIELDS: [&str; 3] = ["use_chip", "merchant_city", "merchant_state"];

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to read encoding table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse encoding table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Mapping from {categorical field name} -> {raw string value -> code}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncodingTable {
    #[serde(flatten)]
    fields: HashMap<String, HashMap<String, i64>>,
}

impl EncodingTable {
    /// Load the table artifact. Called once at startup; a missing or
    /// malformed artifact is a startup failure, not a per-request one.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EncodingError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| EncodingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table: Self = serde_json::from_str(&raw).map_err(|source| EncodingError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        for field in CATEGORICAL_FIELDS {
            if !table.fields.contains_key(field) {
                tracing::warn!(
                    "Encoding table has no entries for '{}'; its values will encode to the sentinel",
                    field
                );
            }
        }

        tracing::info!(
            "Encoding table loaded from {} ({} categorical fields)",
            path.display(),
            table.fields.len()
        );
        Ok(table)
    }

    /// Parse a table from a JSON string (test fixtures, embedded defaults)
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Integer code for a raw categorical value; misses degrade to the
    /// sentinel, never an error.
    pub fn code(&self, field: &str, raw: &str) -> i64 {
        self.fields
            .get(field)
            .and_then(|values| values.get(raw))
            .copied()
            .unwrap_or(SENTINEL_CODE)
    }
}

/// Encode a stored record into the model's input vector.
///
/// Deterministic and total: categorical fields go through the table, all
/// other fields pass through unchanged. The field-by-field enumeration below
/// is the structural mapping onto `FEATURE_LAYOUT` order - keep the two in
/// sync.
pub fn encode(txn: &Transaction, table: &EncodingTable) -> FeatureVector {
    let flags = txn.flags();

    let values: [f32; FEATURE_COUNT] = [
        txn.client_id as f32,
        txn.card_id as f32,
        txn.amount as f32,
        table.code("use_chip", &txn.use_chip) as f32,
        txn.merchant_id as f32,
        table.code("merchant_city", &txn.merchant_city) as f32,
        table.code("merchant_state", &txn.merchant_state) as f32,
        txn.zip as f32,
        txn.mcc as f32,
        txn.hour as f32,
        txn.dayofweek as f32,
        txn.is_weekend as f32,
        flags.0[0] as f32,
        flags.0[1] as f32,
        flags.0[2] as f32,
        flags.0[3] as f32,
        flags.0[4] as f32,
        flags.0[5] as f32,
    ];

    FeatureVector::from_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Write;

    const TABLE_JSON: &str = r#"{
        "use_chip": {"Swipe Transaction": 0, "Chip Transaction": 1},
        "merchant_city": {"Orlando": 0, "Miami": 1},
        "merchant_state": {"FL": 0}
    }"#;

    fn sample_transaction() -> Transaction {
        Transaction {
            id: 1,
            client_id: 123,
            card_id: 4567,
            amount: 100.50,
            use_chip: "Swipe Transaction".to_string(),
            merchant_id: 7890,
            merchant_city: "Orlando".to_string(),
            merchant_state: "FL".to_string(),
            zip: 32804.0,
            mcc: 7538,
            hour: 14,
            dayofweek: 2,
            is_weekend: 0,
            error_0: 0,
            error_1: 0,
            error_2: 0,
            error_3: 1,
            error_4: 0,
            error_5: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn encode_maps_categoricals_and_passes_numerics_through() {
        let table = EncodingTable::from_json(TABLE_JSON).unwrap();
        let vector = encode(&sample_transaction(), &table);

        assert_eq!(vector.get_by_name("client_id"), Some(123.0));
        assert_eq!(vector.get_by_name("amount"), Some(100.50));
        assert_eq!(vector.get_by_name("use_chip"), Some(0.0));
        assert_eq!(vector.get_by_name("merchant_city"), Some(0.0));
        assert_eq!(vector.get_by_name("merchant_state"), Some(0.0));
        assert_eq!(vector.get_by_name("zip"), Some(32804.0));
        assert_eq!(vector.get_by_name("hour"), Some(14.0));
        assert_eq!(vector.get_by_name("bad_zipcode"), Some(1.0));
    }

    #[test]
    fn encode_is_deterministic() {
        let table = EncodingTable::from_json(TABLE_JSON).unwrap();
        let txn = sample_transaction();

        assert_eq!(encode(&txn, &table), encode(&txn, &table));
    }

    #[test]
    fn unknown_category_degrades_to_sentinel() {
        let table = EncodingTable::from_json(TABLE_JSON).unwrap();
        let mut txn = sample_transaction();
        txn.merchant_city = "Winterfell".to_string();
        txn.merchant_state = "XX".to_string();

        let vector = encode(&txn, &table);
        assert_eq!(vector.get_by_name("merchant_city"), Some(SENTINEL_CODE as f32));
        assert_eq!(vector.get_by_name("merchant_state"), Some(SENTINEL_CODE as f32));
        // Known fields are unaffected
        assert_eq!(vector.get_by_name("use_chip"), Some(0.0));
    }

    #[test]
    fn missing_sub_table_degrades_to_sentinel() {
        let table = EncodingTable::from_json(r#"{"use_chip": {"Swipe Transaction": 0}}"#).unwrap();
        let vector = encode(&sample_transaction(), &table);

        assert_eq!(vector.get_by_name("merchant_city"), Some(-1.0));
        assert_eq!(vector.get_by_name("merchant_state"), Some(-1.0));
    }

    #[test]
    fn load_reads_artifact_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE_JSON.as_bytes()).unwrap();

        let table = EncodingTable::load(file.path()).unwrap();
        assert_eq!(table.code("use_chip", "Chip Transaction"), 1);
        assert_eq!(table.code("use_chip", "Carrier Pigeon"), SENTINEL_CODE);
    }

    #[test]
    fn load_missing_artifact_is_an_error() {
        let err = EncodingTable::load("nonexistent/encoding_map.json").unwrap_err();
        assert!(matches!(err, EncodingError::Io { .. }));
    }
}
