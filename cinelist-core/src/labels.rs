//! Label rules shared by the item store and the mutation actions.
//!
//! A label containing the word "error" (any casing) is the fault injection
//! hook: it makes the server fail on purpose so client failure paths can be
//! exercised. It is not a business rule.

/// Substring that triggers a simulated server fault.
pub const FAULT_TRIGGER: &str = "error";

/// Message surfaced verbatim when the fault injection hook fires.
pub const SIMULATED_FAULT_MESSAGE: &str = "Simulated server error for labels containing 'error'";

/// Returns true if the label should trigger a simulated fault.
pub fn contains_fault_trigger(label: &str) -> bool {
    label.to_lowercase().contains(FAULT_TRIGGER)
}

/// Trim a label, returning `None` when nothing but whitespace remains.
pub fn normalize_label(label: &str) -> Option<&str> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
