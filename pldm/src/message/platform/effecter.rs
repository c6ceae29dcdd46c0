// Licensed under the Apache-2.0 license

//! Numeric effecter commands and the numeric effecter PDR (DSP0248 §30,
//! Table 83) -- the effecter-side mirror of [`super::sensor`].

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::base::{InstanceId, PldmMsgHeader, PldmMsgType, PldmSupportedType, PLDM_MSG_HEADER_LEN};
use crate::protocol::platform::{EffecterDataSize, PlatformCmd, RangeFieldFormat};
use core::convert::TryFrom;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use super::sensor::{PdrCommonHeader, RangeFieldValue, SensorValue};

/// The numeric effecter PDR (DSP0248 Table 83). Field order mirrors
/// [`super::sensor::NumericSensorPdr`] with `effecter_id` in place of
/// `sensor_id` and an added `effecter_auxiliary_names_pdr` /
/// `composite_effecter_count` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericEffecterPdr {
    pub hdr: PdrCommonHeader,
    pub terminus_handle: u16,
    pub effecter_id: u16,
    pub entity_type: u16,
    pub entity_instance_num: u16,
    pub container_id: u16,
    pub effecter_semantic_id: u16,
    pub effecter_init: u8,
    pub effecter_auxiliary_names_pdr: bool,
    pub base_unit: u8,
    pub unit_modifier: i8,
    pub rate_unit: u8,
    pub base_oem_unit_handle: u8,
    pub aux_unit: u8,
    pub aux_unit_modifier: i8,
    pub aux_rate_unit: u8,
    pub rel: u8,
    pub aux_oem_unit_handle: u8,
    pub is_linear: bool,
    pub effecter_data_size: EffecterDataSize,
    pub resolution: f32,
    pub offset: f32,
    pub accuracy: u16,
    pub plus_tolerance: u8,
    pub minus_tolerance: u8,
    pub state_transition_interval: f32,
    pub transition_interval: f32,
    pub max_settable: SensorValue,
    pub min_settable: SensorValue,
    pub range_field_format: RangeFieldFormat,
    pub range_field_support: u8,
    pub nominal_value: RangeFieldValue,
    pub normal_max: RangeFieldValue,
    pub normal_min: RangeFieldValue,
    pub rated_max: RangeFieldValue,
    pub rated_min: RangeFieldValue,
}

pub const PLDM_PDR_NUMERIC_EFFECTER_PDR_MIN_LENGTH: usize = 57;

pub fn decode_numeric_effecter_pdr_data(pdr_data: &[u8]) -> Result<NumericEffecterPdr, PldmError> {
    let mut msg = MsgBuf::new_read(pdr_data, 10 + PLDM_PDR_NUMERIC_EFFECTER_PDR_MIN_LENGTH)?;

    let hdr = PdrCommonHeader::decode(&mut msg)?;
    let terminus_handle = msg.extract()?;
    let effecter_id = msg.extract()?;
    let entity_type = msg.extract()?;
    let entity_instance_num = msg.extract()?;
    let container_id = msg.extract()?;
    let effecter_semantic_id = msg.extract()?;
    let effecter_init = msg.extract()?;
    let effecter_auxiliary_names_pdr: u8 = msg.extract()?;
    let base_unit = msg.extract()?;
    let unit_modifier = msg.extract()?;
    let rate_unit = msg.extract()?;
    let base_oem_unit_handle = msg.extract()?;
    let aux_unit = msg.extract()?;
    let aux_unit_modifier = msg.extract()?;
    let aux_rate_unit = msg.extract()?;
    let rel = msg.extract()?;
    let aux_oem_unit_handle = msg.extract()?;
    let is_linear: u8 = msg.extract()?;

    let effecter_data_size_raw: u8 = msg.extract()?;
    let effecter_data_size = EffecterDataSize::try_from(effecter_data_size_raw)?;

    let resolution = msg.extract()?;
    let offset = msg.extract()?;
    let accuracy = msg.extract()?;
    let plus_tolerance = msg.extract()?;
    let minus_tolerance = msg.extract()?;
    let state_transition_interval = msg.extract()?;
    let transition_interval = msg.extract()?;
    let max_settable = SensorValue::extract(&mut msg, effecter_data_size)?;
    let min_settable = SensorValue::extract(&mut msg, effecter_data_size)?;

    let range_field_format_raw: u8 = msg.extract()?;
    let range_field_format = RangeFieldFormat::try_from(range_field_format_raw)?;

    let range_field_support = msg.extract()?;
    let nominal_value = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let normal_max = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let normal_min = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let rated_max = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let rated_min = RangeFieldValue::extract(&mut msg, range_field_format)?;

    msg.complete()?;

    Ok(NumericEffecterPdr {
        hdr,
        terminus_handle,
        effecter_id,
        entity_type,
        entity_instance_num,
        container_id,
        effecter_semantic_id,
        effecter_init,
        effecter_auxiliary_names_pdr: effecter_auxiliary_names_pdr != 0,
        base_unit,
        unit_modifier,
        rate_unit,
        base_oem_unit_handle,
        aux_unit,
        aux_unit_modifier,
        aux_rate_unit,
        rel,
        aux_oem_unit_handle,
        is_linear: is_linear != 0,
        effecter_data_size,
        resolution,
        offset,
        accuracy,
        plus_tolerance,
        minus_tolerance,
        state_transition_interval,
        transition_interval,
        max_settable,
        min_settable,
        range_field_format,
        range_field_support,
        nominal_value,
        normal_max,
        normal_min,
        rated_max,
        rated_min,
    })
}

/// `SetNumericEffecterValue` request. The variable-width `effecter_value`
/// trails a fixed header and is handled with [`MsgBuf`] rather than
/// zerocopy, since its size depends on `effecter_data_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable)]
#[repr(C, packed)]
pub struct SetNumericEffecterValueFixed {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub effecter_id: u16,
    pub effecter_data_size: u8,
}

pub fn encode_set_numeric_effecter_value_request(
    buf: &mut [u8],
    instance_id: InstanceId,
    effecter_id: u16,
    effecter_value: SensorValue,
) -> Result<usize, PldmError> {
    let effecter_data_size = match effecter_value {
        SensorValue::Uint8(_) => EffecterDataSize::Uint8,
        SensorValue::Sint8(_) => EffecterDataSize::Sint8,
        SensorValue::Uint16(_) => EffecterDataSize::Uint16,
        SensorValue::Sint16(_) => EffecterDataSize::Sint16,
        SensorValue::Uint32(_) => EffecterDataSize::Uint32,
        SensorValue::Sint32(_) => EffecterDataSize::Sint32,
    };

    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 3)?;
    let hdr = PldmMsgHeader::<[u8; PLDM_MSG_HEADER_LEN]>::new(
        instance_id,
        PldmMsgType::Request,
        PldmSupportedType::Platform,
        PlatformCmd::SetNumericEffecterValue as u8,
    )?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(effecter_id)?;
    msg.insert(effecter_data_size as u8)?;
    effecter_value.insert(&mut msg)?;
    msg.complete_used(buf.len())
}

pub fn decode_set_numeric_effecter_value_request(
    buf: &[u8],
) -> Result<(u16, SensorValue), PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 3)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let effecter_id = msg.extract()?;
    let effecter_data_size_raw: u8 = msg.extract()?;
    let effecter_data_size = EffecterDataSize::try_from(effecter_data_size_raw)?;
    let effecter_value = SensorValue::extract(&mut msg, effecter_data_size)?;
    msg.complete_consumed()?;
    Ok((effecter_id, effecter_value))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_numeric_effecter_value_roundtrip() {
        let mut buf = [0u8; 32];
        let used = encode_set_numeric_effecter_value_request(&mut buf, 1, 7, SensorValue::Uint16(900))
            .unwrap();
        let (effecter_id, value) =
            decode_set_numeric_effecter_value_request(&buf[..used]).unwrap();
        assert_eq!(effecter_id, 7);
        assert_eq!(value, SensorValue::Uint16(900));
    }
}
