// Licensed under the Apache-2.0 license

//! Tunable constants for the Firmware Device state machine. Timing values
//! follow the typical FD timeout ranges DSP0267 §9.2 suggests rather than
//! a fixed mandated value -- implementations are expected to tune these
//! to their own flash/verify throughput.

/// Maximum component image transfer chunk this FD will ever request,
/// regardless of what the UA offers in `RequestUpdate`.
pub const FD_MAX_XFER_SIZE: usize = 512;

/// `FD T1`: maximum time to wait for the next UA request before an
/// in-progress update is abandoned and the FD reverts to `Idle`.
pub const DEFAULT_FD_T1_TIMEOUT_MS: u64 = 120_000;

/// `FD T2`: retry interval for FD-initiated requests (`RequestFirmwareData`,
/// `TransferComplete`, `VerifyComplete`, `ApplyComplete`) that go
/// unanswered.
pub const DEFAULT_FD_T2_RETRY_TIME_MS: u64 = 1_000;

/// Number of unanswered retries of an FD-initiated request before the
/// update is treated as failed.
pub const DEFAULT_FD_MAX_RETRY_COUNT: u8 = 3;
