// Licensed under the Apache-2.0 license

use pldm::codec::PldmCodecError;
use pldm::error::PldmError;

/// Failure reported by an [`crate::ops::FdOps`] implementation -- the
/// platform-specific side of a command the state machine can't satisfy
/// itself (reading descriptors, flashing a component, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdOpsError {
    DeviceIdentifiersError,
    FirmwareParametersError,
    ComponentOperationError,
    DownloadError,
    VerifyError,
    ApplyError,
    ActivateError,
}

/// Top-level error a command handler can fail with. Distinguishes a
/// malformed request (caller's fault, answered with a completion code)
/// from an internal/ops failure (this device's fault).
#[derive(Debug)]
pub enum MsgHandlerError {
    Codec(PldmCodecError),
    PldmCommon(PldmError),
    FdOps(FdOpsError),
    /// The command is legal but not valid in the FD's current state.
    NotReady,
}

impl From<PldmCodecError> for MsgHandlerError {
    fn from(e: PldmCodecError) -> Self {
        MsgHandlerError::Codec(e)
    }
}

impl From<PldmError> for MsgHandlerError {
    fn from(e: PldmError) -> Self {
        MsgHandlerError::PldmCommon(e)
    }
}

impl From<FdOpsError> for MsgHandlerError {
    fn from(e: FdOpsError) -> Self {
        MsgHandlerError::FdOps(e)
    }
}
