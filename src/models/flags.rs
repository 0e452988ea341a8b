//! Transaction failure flags
//!
//! Two dataset versions name the same six flag slots differently. They are
//! treated as one versioned schema: storage is always by slot
//! (`error_0..error_5` columns), and the wire names are selected by the
//! `FLAG_SCHEMA` configuration value.
//!
//! Slot table:
//!
//! | Slot | Generic   | Named                  |
//! |------|-----------|------------------------|
//! | 0    | `error_0` | `bad_cvv`              |
//! | 1    | `error_1` | `bad_card_number`      |
//! | 2    | `error_2` | `bad_pin`              |
//! | 3    | `error_3` | `bad_zipcode`          |
//! | 4    | `error_4` | `insufficient_balance` |
//! | 5    | `error_5` | `technical_glitch`     |

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of failure-flag slots
pub const FLAG_COUNT: usize = 6;

/// Wire names of the generic schema variant
pub const GENERIC_FLAG_NAMES: [&str; FLAG_COUNT] =
    ["error_0", "error_1", "error_2", "error_3", "error_4", "error_5"];

/// Wire names of the named schema variant
pub const NAMED_FLAG_NAMES: [&str; FLAG_COUNT] = [
    "bad_cvv",
    "bad_card_number",
    "bad_pin",
    "bad_zipcode",
    "insufficient_balance",
    "technical_glitch",
];

/// Which wire names the API accepts and emits for the six flag slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSchema {
    Generic,
    #[default]
    Named,
}

impl FlagSchema {
    pub fn wire_names(&self) -> &'static [&'static str; FLAG_COUNT] {
        match self {
            Self::Generic => &GENERIC_FLAG_NAMES,
            Self::Named => &NAMED_FLAG_NAMES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Named => "named",
        }
    }
}

impl FromStr for FlagSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "named" => Ok(Self::Named),
            other => Err(format!("unknown flag schema '{}'", other)),
        }
    }
}

/// The six failure-flag values of a transaction, by slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureFlags(pub [i64; FLAG_COUNT]);

impl FailureFlags {
    /// Resolve the flag fields of a submitted transaction against the
    /// configured schema.
    ///
    /// Every slot must be present under its wire name with a 0/1 value, and
    /// no unknown fields are allowed. Returns the rejected field names
    /// otherwise.
    pub fn resolve(fields: &BTreeMap<String, i64>, schema: FlagSchema) -> Result<Self, Vec<String>> {
        let names = schema.wire_names();
        let mut flags = [0i64; FLAG_COUNT];
        let mut rejected = Vec::new();

        for (slot, name) in names.iter().enumerate() {
            match fields.get(*name) {
                Some(&value) if value == 0 || value == 1 => flags[slot] = value,
                _ => rejected.push((*name).to_string()),
            }
        }

        for key in fields.keys() {
            if !names.contains(&key.as_str()) {
                rejected.push(key.clone());
            }
        }

        if rejected.is_empty() {
            Ok(Self(flags))
        } else {
            Err(rejected)
        }
    }

    /// Render the flags under the configured wire names, for responses.
    pub fn to_wire(&self, schema: FlagSchema) -> serde_json::Map<String, serde_json::Value> {
        schema
            .wire_names()
            .iter()
            .zip(self.0.iter())
            .map(|(name, value)| (name.to_string(), serde_json::Value::from(*value)))
            .collect()
    }
}
