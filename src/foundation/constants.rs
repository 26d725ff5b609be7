//! System-wide constants for certificate issuance.

/// Minimum zero-padded width of the sequence component of a control number.
///
/// Sequences above 9999 render at their natural width; the pad is a floor,
/// not a ceiling.
pub const SEQUENCE_PAD_WIDTH: usize = 4;

/// Fallback certificate type code when the type is missing or its name
/// yields no letters.
pub const FALLBACK_TYPE_CODE: &str = "CERT";

/// Separator between control number components (`COR-2024-03-0001`).
pub const CONTROL_NUMBER_SEPARATOR: char = '-';

/// Default retry budget for the optimistic-scan allocation strategy.
pub const DEFAULT_ALLOCATION_RETRY_BUDGET: u32 = 5;

/// Bounded wait for the store write lock before giving up.
pub const STORAGE_LOCK_TIMEOUT_SECS: u64 = 5;

/// Activity log lines quote at most this many characters of the purpose.
pub const ACTIVITY_PURPOSE_SNIPPET_LEN: usize = 50;
