// Licensed under the Apache-2.0 license

/// Rich internal error taxonomy used by every codec in this crate.
///
/// This is the Rust analogue of the negative `errno`-style codes the wire
/// protocol's reference implementation returns internally (`-EINVAL`,
/// `-EOVERFLOW`, `-EBADMSG`, ...). It is never meant to cross a stable ABI
/// boundary; a caller that needs a protocol completion code maps through
/// [`PldmError::to_completion_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PldmError {
    InvalidData,
    InvalidLength,
    InvalidMsgType,
    InvalidProtocolVersion,
    UnsupportedCmd,
    UnsupportedPldmType,
    InvalidCompletionCode,
    InvalidTransferOpFlag,
    InvalidTransferRespFlag,

    InvalidVersionStringType,
    InvalidVersionStringLength,
    InvalidFdState,
    InvalidDescriptorType,
    InvalidDescriptorLength,
    InvalidDescriptorCount,
    InvalidComponentClassification,
    InvalidComponentResponseCode,
    InvalidComponentCompatibilityResponse,
    InvalidComponentCompatibilityResponseCode,
    InvalidTransferResult,
    InvalidVerifyResult,
    InvalidApplyResult,
    InvalidGetStatusReasonCode,
    InvalidAuxStateStatus,
    /// An instance ID outside the header's 5-bit range (`[0, 31]`) was
    /// passed to a header constructor.
    InvalidInstanceId,

    InvalidBiosTableType,
    InvalidBiosAttrType,
    InvalidBiosStringType,
    /// A BIOS table's trailing CRC32 didn't match its contents.
    ChecksumMismatch,
    /// A monotonic handle counter (BIOS string/attribute handles) has
    /// saturated and cannot allocate another unique value.
    HandleExhausted,

    /// A msgbuf cursor would have read or written past its end.
    Overflow,
    /// A strict-consume completion found unconsumed bytes left in the cursor.
    BadMsg,
    /// A tag-driven decode (sensor data size, range field format, ...) saw a
    /// value outside the tag's legal range.
    InvalidDataSize,
    /// The repository or tree has no record matching the lookup key.
    NotFound,
    /// A caller-provided buffer was too small to hold the requested output.
    OutOfMemory,
    /// The requested operation is not implemented for this record/entry kind.
    NotSupported,
    /// The state machine cannot accept this call right now.
    Busy,
    /// Fallback for conditions that don't fit a more specific variant.
    InternalError,
}

impl PldmError {
    /// Maps an internal error to the positive completion code a response
    /// should carry, per the table in the protocol's error handling design:
    /// `InvalidData -> INVALID_DATA`, `BadMsg|Overflow|InvalidLength ->
    /// INVALID_LENGTH`, `UnsupportedPldmType -> INVALID_PLDM_TYPE`, default
    /// `-> ERROR`.
    pub fn to_completion_code(self) -> u8 {
        use crate::protocol::base::PldmBaseCompletionCode as Cc;
        match self {
            PldmError::InvalidData
            | PldmError::InvalidDataSize
            | PldmError::InvalidTransferOpFlag
            | PldmError::InvalidTransferRespFlag
            | PldmError::InvalidDescriptorType
            | PldmError::InvalidDescriptorLength
            | PldmError::InvalidDescriptorCount
            | PldmError::InvalidComponentClassification
            | PldmError::InvalidComponentResponseCode
            | PldmError::InvalidComponentCompatibilityResponse
            | PldmError::InvalidComponentCompatibilityResponseCode
            | PldmError::InvalidTransferResult
            | PldmError::InvalidVerifyResult
            | PldmError::InvalidApplyResult
            | PldmError::InvalidGetStatusReasonCode
            | PldmError::InvalidAuxStateStatus
            | PldmError::InvalidInstanceId
            | PldmError::InvalidBiosTableType
            | PldmError::InvalidBiosAttrType
            | PldmError::InvalidBiosStringType
            | PldmError::ChecksumMismatch
            | PldmError::InvalidVersionStringType
            | PldmError::InvalidVersionStringLength
            | PldmError::InvalidMsgType
            | PldmError::InvalidCompletionCode
            | PldmError::InvalidFdState => Cc::InvalidData as u8,
            PldmError::BadMsg | PldmError::Overflow | PldmError::InvalidLength => {
                Cc::InvalidLength as u8
            }
            PldmError::UnsupportedPldmType => Cc::InvalidPldmType as u8,
            PldmError::UnsupportedCmd => Cc::UnsupportedPldmCmd as u8,
            _ => Cc::Error as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    InvalidMctpPayloadLength,
    InvalidMctpMsgType,
}
