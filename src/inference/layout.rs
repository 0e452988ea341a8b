//! Feature layout - the classifier's input contract
//!
//! The model was trained on features in exactly this order; reordering
//! silently produces wrong predictions, so the layout is fixed here and
//! versioned.
//!
//! ## Rules (NEVER break these):
//! 1. Add feature -> increment FEATURE_VERSION
//! 2. Change order -> increment FEATURE_VERSION
//! 3. Remove feature -> increment FEATURE_VERSION

use crc32fast::Hasher;

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

/// Feature names in exact order they appear in the vector.
/// This is the SINGLE SOURCE OF TRUTH for the model input order.
///
/// The six flag slots carry the named-variant labels here; the generic
/// variant maps onto the same slots (see `models::flags`).
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Identifiers (0-1) ===
    "client_id",            // 0
    "card_id",              // 1
    // === Amount (2) ===
    "amount",               // 2
    // === Channel and merchant (3-8); 3, 5, 6 are integer-encoded ===
    "use_chip",             // 3: transaction channel code
    "merchant_id",          // 4
    "merchant_city",        // 5: city code
    "merchant_state",       // 6: state code
    "zip",                  // 7
    "mcc",                  // 8
    // === Temporal (9-11) ===
    "hour",                 // 9
    "dayofweek",            // 10
    "is_weekend",           // 11
    // === Failure flags (12-17) ===
    "bad_cvv",              // 12
    "bad_card_number",      // 13
    "bad_pin",              // 14
    "bad_zipcode",          // 15
    "insufficient_balance", // 16
    "technical_glitch",     // 17
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 18;

/// Compute CRC32 hash of the feature layout.
/// Used to detect layout mismatches at runtime.
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Error when a feature vector doesn't match the expected layout
#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version, self.expected_hash, self.actual_version, self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that incoming data matches the current layout
pub fn validate_layout(
    incoming_version: u8,
    incoming_hash: u32,
) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}
