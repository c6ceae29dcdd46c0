// Licensed under the Apache-2.0 license

//! `SetEventReceiver` (DSP0248 §16.3): configures where a terminus sends its
//! asynchronous `PlatformEventMessage` traffic. The request's trailing
//! `heartbeatTimer` field is present only when
//! `event_message_global_enable == AsyncKeepAlive`, so it's handled with
//! [`MsgBuf`] rather than a fixed zerocopy struct.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::base::{InstanceId, PldmMsgHeader, PldmMsgType, PldmSupportedType, PLDM_MSG_HEADER_LEN};
use crate::protocol::platform::{
    EventMessageGlobalEnable, PlatformCmd, PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP,
};
use zerocopy::IntoBytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetEventReceiverRequest {
    pub event_message_global_enable: EventMessageGlobalEnable,
    pub transport_protocol_type: u8,
    pub event_receiver_address_info: u8,
    pub heartbeat_timer: Option<u16>,
}

pub fn encode_set_event_receiver_request(
    buf: &mut [u8],
    instance_id: InstanceId,
    req: &SetEventReceiverRequest,
) -> Result<usize, PldmError> {
    if req.transport_protocol_type != PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP {
        return Err(PldmError::InvalidData);
    }
    let needs_heartbeat = req.event_message_global_enable == EventMessageGlobalEnable::AsyncKeepAlive;
    if needs_heartbeat != req.heartbeat_timer.is_some() {
        return Err(PldmError::InvalidData);
    }
    if let Some(timer) = req.heartbeat_timer {
        if needs_heartbeat && timer == 0 {
            return Err(PldmError::InvalidData);
        }
    }

    let len = PLDM_MSG_HEADER_LEN + 3 + if needs_heartbeat { 2 } else { 0 };
    let mut msg = MsgBuf::new_write(buf, len)?;
    let hdr = PldmMsgHeader::<[u8; PLDM_MSG_HEADER_LEN]>::new(
        instance_id,
        PldmMsgType::Request,
        PldmSupportedType::Platform,
        PlatformCmd::SetEventReceiver as u8,
    )?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(req.event_message_global_enable as u8)?;
    msg.insert(req.transport_protocol_type)?;
    msg.insert(req.event_receiver_address_info)?;
    if let Some(timer) = req.heartbeat_timer {
        msg.insert(timer)?;
    }
    msg.complete_used(buf.len())
}

pub fn decode_set_event_receiver_request(buf: &[u8]) -> Result<SetEventReceiverRequest, PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 3)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;

    let global_enable_raw: u8 = msg.extract()?;
    let event_message_global_enable = EventMessageGlobalEnable::try_from(global_enable_raw)?;

    let transport_protocol_type: u8 = msg.extract()?;
    if transport_protocol_type != PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP {
        return Err(PldmError::InvalidData);
    }

    let event_receiver_address_info = msg.extract()?;

    let heartbeat_timer = if event_message_global_enable == EventMessageGlobalEnable::AsyncKeepAlive {
        let timer: u16 = msg.extract()?;
        if timer == 0 {
            return Err(PldmError::InvalidData);
        }
        Some(timer)
    } else {
        None
    };

    msg.complete_consumed()?;

    Ok(SetEventReceiverRequest {
        event_message_global_enable,
        transport_protocol_type,
        event_receiver_address_info,
        heartbeat_timer,
    })
}

pub fn encode_set_event_receiver_response(
    buf: &mut [u8],
    instance_id: InstanceId,
    completion_code: u8,
) -> Result<usize, PldmError> {
    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 1)?;
    let hdr = PldmMsgHeader::<[u8; PLDM_MSG_HEADER_LEN]>::new(
        instance_id,
        PldmMsgType::Response,
        PldmSupportedType::Platform,
        PlatformCmd::SetEventReceiver as u8,
    )?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(completion_code)?;
    msg.complete_used(buf.len())
}

pub fn decode_set_event_receiver_response(buf: &[u8]) -> Result<u8, PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 1)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let completion_code = msg.extract()?;
    msg.complete_consumed()?;
    Ok(completion_code)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_event_receiver_roundtrip_async_only() {
        let mut buf = [0u8; 32];
        let req = SetEventReceiverRequest {
            event_message_global_enable: EventMessageGlobalEnable::AsyncOnly,
            transport_protocol_type: PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP,
            event_receiver_address_info: 0x08,
            heartbeat_timer: None,
        };
        let used = encode_set_event_receiver_request(&mut buf, 1, &req).unwrap();
        let decoded = decode_set_event_receiver_request(&buf[..used]).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_set_event_receiver_roundtrip_keep_alive() {
        let mut buf = [0u8; 32];
        let req = SetEventReceiverRequest {
            event_message_global_enable: EventMessageGlobalEnable::AsyncKeepAlive,
            transport_protocol_type: PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP,
            event_receiver_address_info: 0x08,
            heartbeat_timer: Some(1000),
        };
        let used = encode_set_event_receiver_request(&mut buf, 1, &req).unwrap();
        let decoded = decode_set_event_receiver_request(&buf[..used]).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_set_event_receiver_keep_alive_requires_nonzero_timer() {
        let req = SetEventReceiverRequest {
            event_message_global_enable: EventMessageGlobalEnable::AsyncKeepAlive,
            transport_protocol_type: PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP,
            event_receiver_address_info: 0x08,
            heartbeat_timer: Some(0),
        };
        let mut buf = [0u8; 32];
        assert_eq!(
            encode_set_event_receiver_request(&mut buf, 1, &req).unwrap_err(),
            PldmError::InvalidData
        );
    }

    #[test]
    fn test_set_event_receiver_keep_alive_requires_timer_present() {
        let req = SetEventReceiverRequest {
            event_message_global_enable: EventMessageGlobalEnable::AsyncKeepAlive,
            transport_protocol_type: PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP,
            event_receiver_address_info: 0x08,
            heartbeat_timer: None,
        };
        let mut buf = [0u8; 32];
        assert_eq!(
            encode_set_event_receiver_request(&mut buf, 1, &req).unwrap_err(),
            PldmError::InvalidData
        );
    }

    #[test]
    fn test_set_event_receiver_rejects_non_mctp_transport() {
        let req = SetEventReceiverRequest {
            event_message_global_enable: EventMessageGlobalEnable::AsyncOnly,
            transport_protocol_type: 0x01,
            event_receiver_address_info: 0x08,
            heartbeat_timer: None,
        };
        let mut buf = [0u8; 32];
        assert_eq!(
            encode_set_event_receiver_request(&mut buf, 1, &req).unwrap_err(),
            PldmError::InvalidData
        );
    }

    #[test]
    fn test_set_event_receiver_response_roundtrip() {
        let mut buf = [0u8; 16];
        let used = encode_set_event_receiver_response(&mut buf, 1, 0).unwrap();
        let cc = decode_set_event_receiver_response(&buf[..used]).unwrap();
        assert_eq!(cc, 0);
    }
}
