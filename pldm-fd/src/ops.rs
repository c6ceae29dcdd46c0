// Licensed under the Apache-2.0 license

//! Platform-specific operations the state machine in [`crate::fd`] calls
//! out to. This is the synchronous analogue of the reference's weak
//! `FdOps` hooks -- a single-threaded firmware device has no need for the
//! async/mutex machinery an OS-hosted daemon does.

use crate::error::FdOpsError;
use pldm::message::firmware_update::get_fw_params::FirmwareParameters;
use pldm::protocol::firmware_update::Descriptor;
use pldm::util::clock::MonotonicClock;
use pldm::util::fw_component::FirmwareComponent;

/// Distinguishes a `PassComponentTable` dry-run eligibility check from the
/// real `UpdateComponent` request that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentOperation {
    PassComponent,
    UpdateComponent,
}

/// Platform hooks a [`crate::fd::FirmwareDevice`] drives. Every method is
/// synchronous and expected to return quickly; long-running work (flash
/// writes, verification) is expected to be chunked across repeated calls
/// rather than blocking here.
pub trait FdOps: MonotonicClock {
    /// Fills `device_identifiers` with this device's descriptors and
    /// returns how many were written.
    fn get_device_identifiers(
        &mut self,
        device_identifiers: &mut [Descriptor],
    ) -> Result<usize, FdOpsError>;

    /// Fills in this device's current firmware parameters.
    fn get_firmware_parms(
        &mut self,
        firmware_params: &mut FirmwareParameters,
    ) -> Result<(), FdOpsError>;

    /// Clamps the UA-offered transfer size to whatever this device can
    /// actually sustain.
    fn get_xfer_size(&mut self, ua_transfer_size: usize) -> usize;

    /// Evaluates whether `component` is eligible for the given
    /// operation against the device's current parameters.
    fn handle_component(
        &mut self,
        component: &FirmwareComponent,
        firmware_params: &FirmwareParameters,
        operation: ComponentOperation,
    ) -> Result<pldm::protocol::firmware_update::ComponentResponseCode, FdOpsError>;

    /// Writes `data` (offset-addressed component image bytes) to the
    /// in-progress download target.
    fn download_data(&mut self, offset: u32, data: &[u8]) -> Result<(), FdOpsError>;

    /// Runs one step of image verification, returning a progress percent
    /// in `[0, 100]`; `100` signals verification is complete.
    fn verify_step(&mut self) -> Result<u8, FdOpsError>;

    /// Runs one step of applying the verified image, returning a progress
    /// percent in `[0, 100]`.
    fn apply_step(&mut self) -> Result<u8, FdOpsError>;

    /// Activates the applied image. Returns the estimated time (seconds)
    /// until the activation completes, as `ActivateFirmware`'s response
    /// reports back to the UA.
    fn activate(&mut self, self_contained: bool) -> Result<u16, FdOpsError>;

    /// Aborts an in-progress download/verify/apply, discarding any
    /// partial state.
    fn cancel(&mut self);
}
