// Licensed under the Apache-2.0 license

//! State sensor and state effecter commands (DSP0248 §16, §17):
//! `GetStateSensorReadings`, `SetStateEffecterStates`,
//! `GetStateEffecterStates`, and `SetStateEffecterEnables`. Every one of
//! these carries a `compositeXxxCount`-prefixed array of small fixed-width
//! fields, so they're walked with [`MsgBuf`] rather than zerocopy, the same
//! way [`super::effecter::decode_set_numeric_effecter_value_request`] handles
//! its variable-width value.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::base::{InstanceId, PldmMsgHeader, PldmMsgType, PldmSupportedType, PLDM_MSG_HEADER_LEN};
use crate::protocol::platform::PlatformCmd;
use zerocopy::IntoBytes;

pub const PLDM_COMPOSITE_COUNT_MIN: usize = 1;
pub const PLDM_COMPOSITE_COUNT_MAX: usize = 8;

/// One `set_effecter_state_field` entry of a `SetStateEffecterStates`
/// request: `{ set_request, effecter_state }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetEffecterStateField {
    pub set_request: u8,
    pub effecter_state: u8,
}

/// One `get_sensor_state_field` entry of a `GetStateSensorReadings`
/// response: `{ sensor_op_state, present_state, previous_state, event_state }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetSensorStateField {
    pub sensor_op_state: u8,
    pub present_state: u8,
    pub previous_state: u8,
    pub event_state: u8,
}

/// One `get_effecter_state_field` entry of a `GetStateEffecterStates`
/// response: `{ effecter_op_state, pending_state, present_state }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetEffecterStateField {
    pub effecter_op_state: u8,
    pub pending_state: u8,
    pub present_state: u8,
}

fn header(
    instance_id: InstanceId,
    msg_type: PldmMsgType,
    cmd: PlatformCmd,
) -> Result<PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>, PldmError> {
    PldmMsgHeader::new(instance_id, msg_type, PldmSupportedType::Platform, cmd as u8)
}

fn check_composite_count(count: usize) -> Result<(), PldmError> {
    if !(PLDM_COMPOSITE_COUNT_MIN..=PLDM_COMPOSITE_COUNT_MAX).contains(&count) {
        return Err(PldmError::InvalidData);
    }
    Ok(())
}

// ---- SetStateEffecterStates ------------------------------------------------

pub fn encode_set_state_effecter_states_request(
    buf: &mut [u8],
    instance_id: InstanceId,
    effecter_id: u16,
    fields: &[SetEffecterStateField],
) -> Result<usize, PldmError> {
    check_composite_count(fields.len())?;

    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 3 + fields.len() * 2)?;
    let hdr = header(instance_id, PldmMsgType::Request, PlatformCmd::SetStateEffecterStates)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(effecter_id)?;
    msg.insert(fields.len() as u8)?;
    for field in fields {
        msg.insert(field.set_request)?;
        msg.insert(field.effecter_state)?;
    }
    msg.complete_used(buf.len())
}

pub fn decode_set_state_effecter_states_request(
    buf: &[u8],
) -> Result<(u16, u8, [SetEffecterStateField; PLDM_COMPOSITE_COUNT_MAX]), PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 3)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let effecter_id = msg.extract()?;
    let comp_effecter_count: u8 = msg.extract()?;
    check_composite_count(comp_effecter_count as usize)?;

    let mut fields = [SetEffecterStateField::default(); PLDM_COMPOSITE_COUNT_MAX];
    for field in fields.iter_mut().take(comp_effecter_count as usize) {
        field.set_request = msg.extract()?;
        field.effecter_state = msg.extract()?;
    }
    msg.complete_consumed()?;
    Ok((effecter_id, comp_effecter_count, fields))
}

pub fn encode_set_state_effecter_states_response(
    buf: &mut [u8],
    instance_id: InstanceId,
    completion_code: u8,
) -> Result<usize, PldmError> {
    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 1)?;
    let hdr = header(instance_id, PldmMsgType::Response, PlatformCmd::SetStateEffecterStates)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(completion_code)?;
    msg.complete_used(buf.len())
}

pub fn decode_set_state_effecter_states_response(buf: &[u8]) -> Result<u8, PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 1)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let completion_code = msg.extract()?;
    msg.complete_consumed()?;
    Ok(completion_code)
}

// ---- GetStateSensorReadings -------------------------------------------------

pub fn encode_get_state_sensor_readings_request(
    buf: &mut [u8],
    instance_id: InstanceId,
    sensor_id: u16,
    sensor_rearm: u8,
    reserved: u8,
) -> Result<usize, PldmError> {
    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 4)?;
    let hdr = header(instance_id, PldmMsgType::Request, PlatformCmd::GetStateSensorReadings)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(sensor_id)?;
    msg.insert(sensor_rearm)?;
    msg.insert(reserved)?;
    msg.complete_used(buf.len())
}

pub fn decode_get_state_sensor_readings_request(buf: &[u8]) -> Result<(u16, u8, u8), PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 4)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let sensor_id = msg.extract()?;
    let sensor_rearm = msg.extract()?;
    let reserved = msg.extract()?;
    msg.complete_consumed()?;
    Ok((sensor_id, sensor_rearm, reserved))
}

pub fn encode_get_state_sensor_readings_response(
    buf: &mut [u8],
    instance_id: InstanceId,
    completion_code: u8,
    fields: &[GetSensorStateField],
) -> Result<usize, PldmError> {
    check_composite_count(fields.len())?;

    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 2 + fields.len() * 4)?;
    let hdr = header(instance_id, PldmMsgType::Response, PlatformCmd::GetStateSensorReadings)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(completion_code)?;
    msg.insert(fields.len() as u8)?;
    for field in fields {
        msg.insert(field.sensor_op_state)?;
        msg.insert(field.present_state)?;
        msg.insert(field.previous_state)?;
        msg.insert(field.event_state)?;
    }
    msg.complete_used(buf.len())
}

pub fn decode_get_state_sensor_readings_response(
    buf: &[u8],
) -> Result<(u8, u8, [GetSensorStateField; PLDM_COMPOSITE_COUNT_MAX]), PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 1)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let completion_code = msg.extract()?;

    let mut fields = [GetSensorStateField::default(); PLDM_COMPOSITE_COUNT_MAX];
    if completion_code != 0 {
        msg.complete()?;
        return Ok((completion_code, 0, fields));
    }

    let comp_sensor_count: u8 = msg.extract()?;
    check_composite_count(comp_sensor_count as usize)?;

    for field in fields.iter_mut().take(comp_sensor_count as usize) {
        field.sensor_op_state = msg.extract()?;
        field.present_state = msg.extract()?;
        field.previous_state = msg.extract()?;
        field.event_state = msg.extract()?;
    }
    msg.complete_consumed()?;
    Ok((completion_code, comp_sensor_count, fields))
}

// ---- GetStateEffecterStates -------------------------------------------------

pub fn encode_get_state_effecter_states_request(
    buf: &mut [u8],
    instance_id: InstanceId,
    effecter_id: u16,
) -> Result<usize, PldmError> {
    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 2)?;
    let hdr = header(instance_id, PldmMsgType::Request, PlatformCmd::GetStateEffecterStates)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(effecter_id)?;
    msg.complete_used(buf.len())
}

pub fn decode_get_state_effecter_states_request(buf: &[u8]) -> Result<u16, PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 2)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let effecter_id = msg.extract()?;
    msg.complete_consumed()?;
    Ok(effecter_id)
}

pub fn encode_get_state_effecter_states_response(
    buf: &mut [u8],
    instance_id: InstanceId,
    completion_code: u8,
    fields: &[GetEffecterStateField],
) -> Result<usize, PldmError> {
    check_composite_count(fields.len())?;

    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 2 + fields.len() * 3)?;
    let hdr = header(instance_id, PldmMsgType::Response, PlatformCmd::GetStateEffecterStates)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(completion_code)?;
    msg.insert(fields.len() as u8)?;
    for field in fields {
        msg.insert(field.effecter_op_state)?;
        msg.insert(field.pending_state)?;
        msg.insert(field.present_state)?;
    }
    msg.complete_used(buf.len())
}

pub fn decode_get_state_effecter_states_response(
    buf: &[u8],
) -> Result<(u8, u8, [GetEffecterStateField; PLDM_COMPOSITE_COUNT_MAX]), PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 1)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let completion_code = msg.extract()?;

    let mut fields = [GetEffecterStateField::default(); PLDM_COMPOSITE_COUNT_MAX];
    if completion_code != 0 {
        msg.complete()?;
        return Ok((completion_code, 0, fields));
    }

    let comp_effecter_count: u8 = msg.extract()?;
    check_composite_count(comp_effecter_count as usize)?;

    for field in fields.iter_mut().take(comp_effecter_count as usize) {
        field.effecter_op_state = msg.extract()?;
        field.pending_state = msg.extract()?;
        field.present_state = msg.extract()?;
    }
    msg.complete_consumed()?;
    Ok((completion_code, comp_effecter_count, fields))
}

// ---- SetStateEffecterEnables ------------------------------------------------

/// `effecterEnable` values for `SetStateEffecterEnables` (DSP0248 Table 27).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffecterEnable {
    Disable = 0,
    EnableNoEventGeneration = 1,
    EnableEventGeneration = 2,
}

impl TryFrom<u8> for EffecterEnable {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0 => Ok(Self::Disable),
            1 => Ok(Self::EnableNoEventGeneration),
            2 => Ok(Self::EnableEventGeneration),
            _ => Err(PldmError::InvalidData),
        }
    }
}

pub fn encode_set_state_effecter_enables_request(
    buf: &mut [u8],
    instance_id: InstanceId,
    effecter_id: u16,
    enables: &[EffecterEnable],
) -> Result<usize, PldmError> {
    check_composite_count(enables.len())?;

    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 3 + enables.len())?;
    let hdr = header(instance_id, PldmMsgType::Request, PlatformCmd::SetStateEffecterEnables)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(effecter_id)?;
    msg.insert(enables.len() as u8)?;
    for enable in enables {
        msg.insert(*enable as u8)?;
    }
    msg.complete_used(buf.len())
}

pub fn decode_set_state_effecter_enables_request(
    buf: &[u8],
) -> Result<(u16, u8, [EffecterEnable; PLDM_COMPOSITE_COUNT_MAX]), PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 3)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let effecter_id = msg.extract()?;
    let comp_effecter_count: u8 = msg.extract()?;
    check_composite_count(comp_effecter_count as usize)?;

    let mut enables = [EffecterEnable::Disable; PLDM_COMPOSITE_COUNT_MAX];
    for enable in enables.iter_mut().take(comp_effecter_count as usize) {
        let raw: u8 = msg.extract()?;
        *enable = EffecterEnable::try_from(raw)?;
    }
    msg.complete_consumed()?;
    Ok((effecter_id, comp_effecter_count, enables))
}

pub fn encode_set_state_effecter_enables_response(
    buf: &mut [u8],
    instance_id: InstanceId,
    completion_code: u8,
) -> Result<usize, PldmError> {
    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 1)?;
    let hdr = header(instance_id, PldmMsgType::Response, PlatformCmd::SetStateEffecterEnables)?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(completion_code)?;
    msg.complete_used(buf.len())
}

pub fn decode_set_state_effecter_enables_response(buf: &[u8]) -> Result<u8, PldmError> {
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
    fn test_set_state_effecter_states_roundtrip() {
        let mut buf = [0u8; 32];
        let fields = [
            SetEffecterStateField {
                set_request: 1,
                effecter_state: 3,
            },
            SetEffecterStateField {
                set_request: 0,
                effecter_state: 0,
            },
        ];
        let used =
            encode_set_state_effecter_states_request(&mut buf, 1, 42, &fields).unwrap();
        let (effecter_id, count, decoded) =
            decode_set_state_effecter_states_request(&buf[..used]).unwrap();
        assert_eq!(effecter_id, 42);
        assert_eq!(count, 2);
        assert_eq!(decoded[0], fields[0]);
        assert_eq!(decoded[1], fields[1]);
    }

    #[test]
    fn test_set_state_effecter_states_rejects_bad_count() {
        let mut buf = [0u8; 32];
        assert_eq!(
            encode_set_state_effecter_states_request(&mut buf, 1, 42, &[]).unwrap_err(),
            PldmError::InvalidData
        );
    }

    #[test]
    fn test_get_state_sensor_readings_roundtrip() {
        let mut buf = [0u8; 32];
        let used = encode_get_state_sensor_readings_request(&mut buf, 1, 7, 0, 0).unwrap();
        let (sensor_id, rearm, reserved) =
            decode_get_state_sensor_readings_request(&buf[..used]).unwrap();
        assert_eq!(sensor_id, 7);
        assert_eq!(rearm, 0);
        assert_eq!(reserved, 0);

        let fields = [GetSensorStateField {
            sensor_op_state: 1,
            present_state: 2,
            previous_state: 1,
            event_state: 0,
        }];
        let used =
            encode_get_state_sensor_readings_response(&mut buf, 1, 0, &fields).unwrap();
        let (cc, count, decoded) =
            decode_get_state_sensor_readings_response(&buf[..used]).unwrap();
        assert_eq!(cc, 0);
        assert_eq!(count, 1);
        assert_eq!(decoded[0], fields[0]);
    }

    #[test]
    fn test_get_state_sensor_readings_error_response_has_no_fields() {
        let mut buf = [0u8; 32];
        let mut msg = MsgBuf::new_write(&mut buf, PLDM_MSG_HEADER_LEN + 1).unwrap();
        let hdr = header(1, PldmMsgType::Response, PlatformCmd::GetStateSensorReadings).unwrap();
        msg.insert_array(hdr.as_bytes()).unwrap();
        msg.insert(0x02u8).unwrap();
        let used = msg.complete_used(buf.len()).unwrap();

        let (cc, count, _) = decode_get_state_sensor_readings_response(&buf[..used]).unwrap();
        assert_eq!(cc, 0x02);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_get_state_effecter_states_roundtrip() {
        let mut buf = [0u8; 32];
        let used = encode_get_state_effecter_states_request(&mut buf, 1, 9).unwrap();
        let effecter_id = decode_get_state_effecter_states_request(&buf[..used]).unwrap();
        assert_eq!(effecter_id, 9);

        let fields = [GetEffecterStateField {
            effecter_op_state: 1,
            pending_state: 4,
            present_state: 4,
        }];
        let used =
            encode_get_state_effecter_states_response(&mut buf, 1, 0, &fields).unwrap();
        let (cc, count, decoded) =
            decode_get_state_effecter_states_response(&buf[..used]).unwrap();
        assert_eq!(cc, 0);
        assert_eq!(count, 1);
        assert_eq!(decoded[0], fields[0]);
    }

    #[test]
    fn test_set_state_effecter_enables_roundtrip() {
        let mut buf = [0u8; 32];
        let enables = [EffecterEnable::EnableEventGeneration, EffecterEnable::Disable];
        let used =
            encode_set_state_effecter_enables_request(&mut buf, 1, 5, &enables).unwrap();
        let (effecter_id, count, decoded) =
            decode_set_state_effecter_enables_request(&buf[..used]).unwrap();
        assert_eq!(effecter_id, 5);
        assert_eq!(count, 2);
        assert_eq!(decoded[0], enables[0]);
        assert_eq!(decoded[1], enables[1]);
    }

    #[test]
    fn test_set_state_effecter_enables_rejects_invalid_enable() {
        let mut buf = [0u8; 32];
        let used = encode_set_state_effecter_enables_request(
            &mut buf,
            1,
            5,
            &[EffecterEnable::Disable],
        )
        .unwrap();
        buf[PLDM_MSG_HEADER_LEN + 3] = 7;
        assert_eq!(
            decode_set_state_effecter_enables_request(&buf[..used]).unwrap_err(),
            PldmError::InvalidData
        );
    }
}
