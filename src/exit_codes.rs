//! Exit code constants for the keju CLI.
//!
//! - 0: Every validation stage passed
//! - 1: A validation stage failed (structure/build/unit test/coverage/functional)
//! - 2: User error (bad arguments, unreadable or invalid configuration)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Validation failure: the submission was rejected at some stage.
pub const VALIDATION_FAILURE: i32 = 1;

/// User error: bad arguments or invalid validation configuration.
pub const USER_ERROR: i32 = 2;
