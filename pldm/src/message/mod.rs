// Licensed under the Apache-2.0 license

pub mod bios;
pub mod control;
pub mod firmware_update;
pub mod platform;
