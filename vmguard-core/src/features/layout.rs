//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! The scaler and classifier artifacts were fit on columns in exactly
//! this order. Reordering produces wrong predictions with no error.
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in training order
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Network (0-1) ===
    "rxbytes_rate",          // 0: Bytes received per second
    "txbytes_rate",          // 1: Bytes transmitted per second

    // === CPU (2-6) ===
    "timecpu",               // 2: CPU time share
    "timesys",               // 3: System CPU time share
    "timeusr",               // 4: User CPU time share
    "state",                 // 5: Domain state code
    "cputime",               // 6: Cumulative CPU time

    // === Memory (7-10) ===
    "memminor_fault",        // 7: Minor page faults
    "memunused",             // 8: Unused guest memory
    "memlast_update",        // 9: Memory stats update stamp
    "memrss",                // 10: Resident set size

    // === Virtual disk vda (11-14) ===
    "vdard_req_rate",        // 11: vda read requests per second
    "vdard_bytes_rate",      // 12: vda read bytes per second
    "vdawr_reqs_rate",       // 13: vda write requests per second
    "vdawr_bytes_rate",      // 14: vda write bytes per second

    // === Virtual disk hda (15-16) ===
    "hdard_req_rate",        // 15: hda read requests per second
    "hdard_bytes_rate",      // 16: hda read bytes per second
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 17;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of version + ordered names, used to detect layout mismatches
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for status endpoints and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

/// Compare an artifact's recorded column order against `FEATURE_LAYOUT`
pub fn verify_feature_names<S: AsRef<str>>(names: &[S]) -> Result<(), String> {
    if names.len() != FEATURE_COUNT {
        return Err(format!(
            "artifact lists {} features, expected {}",
            names.len(),
            FEATURE_COUNT
        ));
    }

    for (i, (got, want)) in names.iter().zip(FEATURE_LAYOUT).enumerate() {
        if got.as_ref() != *want {
            return Err(format!(
                "feature {} is `{}`, expected `{}`",
                i,
                got.as_ref(),
                want
            ));
        }
    }

    Ok(())
}

/// Short operator-facing description shown next to attributions
pub fn describe(name: &str) -> Option<&'static str> {
    match name {
        "rxbytes_rate" => Some("Inbound network throughput"),
        "txbytes_rate" => Some("Outbound network throughput"),
        "timecpu" | "cputime" => Some("CPU consumption"),
        "timesys" => Some("Kernel-mode CPU time"),
        "timeusr" => Some("User-mode CPU time"),
        "memminor_fault" => Some("Minor page fault activity"),
        "memunused" => Some("Free guest memory"),
        "memrss" => Some("Resident memory footprint"),
        "vdard_req_rate" | "vdard_bytes_rate" => Some("Virtual disk read activity"),
        "vdawr_reqs_rate" | "vdawr_bytes_rate" => Some("Virtual disk write activity"),
        "hdard_req_rate" | "hdard_bytes_rate" => Some("Secondary disk read activity"),
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
