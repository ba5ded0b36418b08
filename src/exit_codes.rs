//! Exit code constants for the guardfile CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid options)
//! - 2: I/O failure
//! - 3: Encode/decode failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid options file.
pub const USER_ERROR: i32 = 1;

/// Filesystem failure: open, read, write, sync, or rename errors.
pub const IO_FAILURE: i32 = 2;

/// Structured content could not be encoded or decoded.
pub const CODEC_FAILURE: i32 = 3;
