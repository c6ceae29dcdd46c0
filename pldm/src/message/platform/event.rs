// Licensed under the Apache-2.0 license

//! `PlatformEventMessage` (DSP0248 §17.1) and
//! `PollForPlatformEventMessage` (DSP0248 §17.4): the asynchronous event
//! channel a terminus uses to notify the platform of sensor/effecter
//! state changes, and the poll-based alternative for transports without
//! an unsolicited-message path.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::platform::{
    is_legal_event_class, validate_poll_ack, PollEventTransferOperationFlag,
    PLDM_EVENT_ID_FRAGMENT, PLDM_EVENT_ID_NULL,
};
use core::convert::TryFrom;

/// `event_message_format_version` values legal for `cperEvent` class data
/// (DSP0248 Table 17).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CperEventFormatType {
    Single = 0,
    Fru = 1,
}

impl TryFrom<u8> for CperEventFormatType {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0 => Ok(Self::Single),
            1 => Ok(Self::Fru),
            _ => Err(PldmError::InvalidData),
        }
    }
}

/// Decoded `PlatformEventMessage` request. `event_data` borrows from the
/// input buffer; the caller dispatches on `event_class` to further decode
/// it (e.g. with [`super::sensor::decode_numeric_sensor_data`]).
#[derive(Debug, PartialEq)]
pub struct PlatformEventMessageRequest<'a> {
    pub format_version: u8,
    pub tid: u8,
    pub event_class: u8,
    pub event_data: &'a [u8],
}

pub fn decode_platform_event_message_request(
    buf: &[u8],
) -> Result<PlatformEventMessageRequest<'_>, PldmError> {
    let mut msg = MsgBuf::new_read(buf, 3)?;
    let format_version = msg.extract()?;
    let tid = msg.extract()?;
    let event_class: u8 = msg.extract()?;
    if !is_legal_event_class(event_class) {
        return Err(PldmError::InvalidData);
    }
    let event_data = msg.span_remaining()?;
    msg.complete_consumed()?;
    Ok(PlatformEventMessageRequest {
        format_version,
        tid,
        event_class,
        event_data,
    })
}

/// Decoded `cperEvent` class event data (DSP0248 §17.4): a format-type
/// tag followed by the raw CPER record.
#[derive(Debug, PartialEq)]
pub struct CperEventData<'a> {
    pub format_type: CperEventFormatType,
    pub cper_data: &'a [u8],
}

pub fn decode_cper_event_data(buf: &[u8]) -> Result<CperEventData<'_>, PldmError> {
    let mut msg = MsgBuf::new_read(buf, 1)?;
    let format_type_raw: u8 = msg.extract()?;
    let format_type = CperEventFormatType::try_from(format_type_raw)?;
    let cper_data = msg.span_remaining()?;
    msg.complete_consumed()?;
    Ok(CperEventData {
        format_type,
        cper_data,
    })
}

/// Decoded `PollForPlatformEventMessage` request. Joint validation of
/// `operation_flag` against `event_id_to_acknowledge` happens here --
/// `GetFirstPart` only pairs with the null id, `GetNextPart` only with
/// the fragment id, and `AckOnly` with neither.
#[derive(Debug, PartialEq)]
pub struct PollForPlatformEventMessageRequest {
    pub format_version: u8,
    pub transfer_operation_flag: PollEventTransferOperationFlag,
    pub data_transfer_handle: u32,
    pub event_id_to_acknowledge: u16,
}

pub fn decode_poll_for_platform_event_message_request(
    buf: &[u8],
) -> Result<PollForPlatformEventMessageRequest, PldmError> {
    let mut msg = MsgBuf::new_read(buf, 8)?;
    let format_version = msg.extract()?;
    let transfer_operation_flag_raw: u8 = msg.extract()?;
    let transfer_operation_flag =
        PollEventTransferOperationFlag::try_from(transfer_operation_flag_raw)?;
    let data_transfer_handle = msg.extract()?;
    let event_id_to_acknowledge = msg.extract()?;
    validate_poll_ack(transfer_operation_flag, event_id_to_acknowledge)?;
    msg.complete_consumed()?;
    Ok(PollForPlatformEventMessageRequest {
        format_version,
        transfer_operation_flag,
        data_transfer_handle,
        event_id_to_acknowledge,
    })
}

/// `event_id` sentinel returned in a poll response when no event is
/// pending (DSP0248 §17.4).
pub const PLDM_PLATFORM_EVENT_ID_NONE: u16 = PLDM_EVENT_ID_NULL;

/// True when `event_id` marks this response as the last fragment of a
/// multi-part event (the caller must not issue a further `GetNextPart`).
pub fn is_terminal_event_id(event_id: u16) -> bool {
    event_id == PLDM_EVENT_ID_NULL || event_id == PLDM_EVENT_ID_FRAGMENT
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_platform_event_message_rejects_bad_class() {
        let buf = [1u8, 2, 0xFF, 9, 9];
        assert_eq!(
            decode_platform_event_message_request(&buf).unwrap_err(),
            PldmError::InvalidData
        );
    }

    #[test]
    fn test_decode_platform_event_message_ok() {
        let buf = [1u8, 2, 0x00, 9, 9, 9];
        let decoded = decode_platform_event_message_request(&buf).unwrap();
        assert_eq!(decoded.tid, 2);
        assert_eq!(decoded.event_data, &[9, 9, 9]);
    }

    #[test]
    fn test_decode_cper_event_data() {
        let buf = [0u8, 0xAB, 0xCD];
        let decoded = decode_cper_event_data(&buf).unwrap();
        assert_eq!(decoded.format_type, CperEventFormatType::Single);
        assert_eq!(decoded.cper_data, &[0xAB, 0xCD]);
    }

    #[test]
    fn test_poll_request_validates_joint_constraint() {
        let mut buf = [0u8; 8];
        buf[1] = PollEventTransferOperationFlag::GetFirstPart as u8;
        buf[6] = 0x01; // event_id_to_acknowledge != 0, illegal for GetFirstPart
        assert!(decode_poll_for_platform_event_message_request(&buf).is_err());
    }

    #[test]
    fn test_is_terminal_event_id() {
        assert!(is_terminal_event_id(PLDM_EVENT_ID_NULL));
        assert!(is_terminal_event_id(PLDM_EVENT_ID_FRAGMENT));
        assert!(!is_terminal_event_id(5));
    }
}
