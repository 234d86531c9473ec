//! ID generation utilities for Sweepr
//!
//! Provides functions for naming jobs, handles and scheduler sessions.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique scheduler session ID
///
/// Format: `session-{timestamp_ms}-{random_hex}`
pub fn generate_session_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("session-{}-{:04x}", timestamp, random)
}

/// Job name within a batch: the experiment name with the job index appended.
///
/// Example: `("sweep", 3)` -> `sweep3`
pub fn job_name(prefix: &str, index: usize) -> String {
    format!("{}{}", prefix, index)
}

/// Handle ID for a submitted job
///
/// Format: `{session_id}/{job_name}`
pub fn generate_handle_id(session_id: &str, job_name: &str) -> String {
    format!("{}/{}", session_id, job_name)
}
