// Licensed under the Apache-2.0 license

#![cfg_attr(not(test), no_std)]

//! Synchronous Firmware Device (FD) state machine for DSP0267 firmware
//! updates, built on the `pldm` codec crate. A caller owns the MCTP
//! transport; this crate only ever touches the PLDM payload bytes handed
//! to it and the platform hooks in [`ops::FdOps`].

pub mod config;
pub mod error;
pub mod fd;
pub mod ops;
pub mod session;

pub use error::{FdOpsError, MsgHandlerError};
pub use fd::FirmwareDevice;
pub use ops::{ComponentOperation, FdOps};
