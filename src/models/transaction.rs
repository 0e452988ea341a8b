//! Transaction model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::models::flags::{FailureFlags, FlagSchema};

/// Accepted transaction-channel values
pub const CHANNEL_VALUES: [&str; 2] = ["Swipe Transaction", "Chip Transaction"];

/// A persisted transaction record. Immutable once inserted; the inference
/// path never updates or deletes it.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub client_id: i64,
    pub card_id: i64,
    pub amount: f64,
    pub use_chip: String,
    pub merchant_id: i64,
    pub merchant_city: String,
    pub merchant_state: String,
    pub zip: f64,
    pub mcc: i64,
    pub hour: i64,
    pub dayofweek: i64,
    pub is_weekend: i64,
    pub error_0: i64,
    pub error_1: i64,
    pub error_2: i64,
    pub error_3: i64,
    pub error_4: i64,
    pub error_5: i64,
    pub created_at: DateTime<Utc>,
}

/// A submitted transaction, before validation and id assignment.
///
/// The six failure flags arrive under the wire names of the configured
/// schema and are collected by the flattened map; `validate_against`
/// resolves them into slots.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTransaction {
    pub client_id: i64,
    pub card_id: i64,
    pub amount: f64,
    #[validate(custom(function = "validate_channel"))]
    pub use_chip: String,
    pub merchant_id: i64,
    pub merchant_city: String,
    pub merchant_state: String,
    pub zip: f64,
    pub mcc: i64,
    #[validate(range(min = 0, max = 23))]
    pub hour: i64,
    #[validate(range(min = 0, max = 6))]
    pub dayofweek: i64,
    #[validate(range(min = 0, max = 1))]
    pub is_weekend: i64,
    #[serde(flatten)]
    pub flags: BTreeMap<String, i64>,
}

fn validate_channel(value: &str) -> Result<(), ValidationError> {
    if CHANNEL_VALUES.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_channel"))
    }
}

impl NewTransaction {
    /// Validate all field ranges and resolve the failure flags against the
    /// configured schema. Returns `AppError::Validation` carrying every
    /// rejected field name; nothing may be persisted in that case.
    pub fn validate_against(&self, schema: FlagSchema) -> Result<FailureFlags, AppError> {
        let mut rejected: Vec<String> = Vec::new();

        if let Err(errors) = self.validate() {
            rejected.extend(errors.field_errors().keys().map(|k| k.to_string()));
        }

        let flags = match FailureFlags::resolve(&self.flags, schema) {
            Ok(flags) => Some(flags),
            Err(mut flag_fields) => {
                rejected.append(&mut flag_fields);
                None
            }
        };

        if rejected.is_empty() {
            Ok(flags.unwrap_or_default())
        } else {
            rejected.sort();
            rejected.dedup();
            Err(AppError::Validation(rejected))
        }
    }
}

/// Wire representation of a stored transaction: the persisted record plus
/// its assigned id, flags under the configured wire names.
#[derive(Debug, Serialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub client_id: i64,
    pub card_id: i64,
    pub amount: f64,
    pub use_chip: String,
    pub merchant_id: i64,
    pub merchant_city: String,
    pub merchant_state: String,
    pub zip: f64,
    pub mcc: i64,
    pub hour: i64,
    pub dayofweek: i64,
    pub is_weekend: i64,
    #[serde(flatten)]
    pub flags: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Insert a validated record and return it with its assigned id.
    pub async fn create(
        pool: &SqlitePool,
        data: &NewTransaction,
        flags: &FailureFlags,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                client_id, card_id, amount, use_chip, merchant_id,
                merchant_city, merchant_state, zip, mcc,
                hour, dayofweek, is_weekend,
                error_0, error_1, error_2, error_3, error_4, error_5,
                created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(data.client_id)
        .bind(data.card_id)
        .bind(data.amount)
        .bind(&data.use_chip)
        .bind(data.merchant_id)
        .bind(&data.merchant_city)
        .bind(&data.merchant_state)
        .bind(data.zip)
        .bind(data.mcc)
        .bind(data.hour)
        .bind(data.dayofweek)
        .bind(data.is_weekend)
        .bind(flags.0[0])
        .bind(flags.0[1])
        .bind(flags.0[2])
        .bind(flags.0[3])
        .bind(flags.0[4])
        .bind(flags.0[5])
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// The persisted record verbatim, or `None` if no such id exists.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The six failure-flag values by slot
    pub fn flags(&self) -> FailureFlags {
        FailureFlags([
            self.error_0,
            self.error_1,
            self.error_2,
            self.error_3,
            self.error_4,
            self.error_5,
        ])
    }

    pub fn to_record(&self, schema: FlagSchema) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            client_id: self.client_id,
            card_id: self.card_id,
            amount: self.amount,
            use_chip: self.use_chip.clone(),
            merchant_id: self.merchant_id,
            merchant_city: self.merchant_city.clone(),
            merchant_state: self.merchant_state.clone(),
            zip: self.zip,
            mcc: self.mcc,
            hour: self.hour,
            dayofweek: self.dayofweek,
            is_weekend: self.is_weekend,
            flags: self.flags().to_wire(schema),
            created_at: self.created_at,
        }
    }
}
