// Licensed under the Apache-2.0 license

//! Numeric sensor commands and the numeric sensor PDR (DSP0248 §28, Table
//! 79). Sensor readings and several PDR fields share a width/signedness
//! tag (`sensor_data_size`) that must be read before the tagged field can
//! be decoded — see [`SensorValue`].

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::platform::{RangeFieldFormat, SensorDataSize};
use core::convert::TryFrom;

/// The common 10-byte PDR header every PDR record begins with (DSP0248
/// Table 21).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdrCommonHeader {
    pub record_handle: u32,
    pub version: u8,
    pub pdr_type: u8,
    pub record_change_num: u16,
    pub length: u16,
}

impl PdrCommonHeader {
    pub fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        Ok(Self {
            record_handle: msg.extract()?,
            version: msg.extract()?,
            pdr_type: msg.extract()?,
            record_change_num: msg.extract()?,
            length: msg.extract()?,
        })
    }

    pub fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.record_handle)?;
        msg.insert(self.version)?;
        msg.insert(self.pdr_type)?;
        msg.insert(self.record_change_num)?;
        msg.insert(self.length)?;
        Ok(())
    }
}

/// A sensor reading, effecter value, or threshold/hysteresis field whose
/// width is given by a [`SensorDataSize`] tag read earlier in the same
/// message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorValue {
    Uint8(u8),
    Sint8(i8),
    Uint16(u16),
    Sint16(i16),
    Uint32(u32),
    Sint32(i32),
}

impl SensorValue {
    pub fn extract(msg: &mut MsgBuf, tag: SensorDataSize) -> Result<Self, PldmError> {
        Ok(match tag {
            SensorDataSize::Uint8 => SensorValue::Uint8(msg.extract()?),
            SensorDataSize::Sint8 => SensorValue::Sint8(msg.extract()?),
            SensorDataSize::Uint16 => SensorValue::Uint16(msg.extract()?),
            SensorDataSize::Sint16 => SensorValue::Sint16(msg.extract()?),
            SensorDataSize::Uint32 => SensorValue::Uint32(msg.extract()?),
            SensorDataSize::Sint32 => SensorValue::Sint32(msg.extract()?),
        })
    }

    pub fn insert(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        match *self {
            SensorValue::Uint8(v) => msg.insert(v),
            SensorValue::Sint8(v) => msg.insert(v),
            SensorValue::Uint16(v) => msg.insert(v),
            SensorValue::Sint16(v) => msg.insert(v),
            SensorValue::Uint32(v) => msg.insert(v),
            SensorValue::Sint32(v) => msg.insert(v),
        }
    }

    /// Widen to a `u32` the way the reference `present_reading` output
    /// parameter does: sign-extended for signed tags.
    pub fn as_u32(&self) -> u32 {
        match *self {
            SensorValue::Uint8(v) => v as u32,
            SensorValue::Sint8(v) => v as i32 as u32,
            SensorValue::Uint16(v) => v as u32,
            SensorValue::Sint16(v) => v as i32 as u32,
            SensorValue::Uint32(v) => v,
            SensorValue::Sint32(v) => v as u32,
        }
    }
}

/// A PDR range-bound field (nominal/normal/warning/critical/fatal) whose
/// width is given by a [`RangeFieldFormat`] tag read earlier in the PDR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeFieldValue {
    Uint8(u8),
    Sint8(i8),
    Uint16(u16),
    Sint16(i16),
    Uint32(u32),
    Sint32(i32),
    Real32(f32),
}

impl RangeFieldValue {
    pub fn extract(msg: &mut MsgBuf, tag: RangeFieldFormat) -> Result<Self, PldmError> {
        Ok(match tag {
            RangeFieldFormat::Uint8 => RangeFieldValue::Uint8(msg.extract()?),
            RangeFieldFormat::Sint8 => RangeFieldValue::Sint8(msg.extract()?),
            RangeFieldFormat::Uint16 => RangeFieldValue::Uint16(msg.extract()?),
            RangeFieldFormat::Sint16 => RangeFieldValue::Sint16(msg.extract()?),
            RangeFieldFormat::Uint32 => RangeFieldValue::Uint32(msg.extract()?),
            RangeFieldFormat::Sint32 => RangeFieldValue::Sint32(msg.extract()?),
            RangeFieldFormat::Real32 => RangeFieldValue::Real32(msg.extract()?),
        })
    }

    pub fn insert(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        match *self {
            RangeFieldValue::Uint8(v) => msg.insert(v),
            RangeFieldValue::Sint8(v) => msg.insert(v),
            RangeFieldValue::Uint16(v) => msg.insert(v),
            RangeFieldValue::Sint16(v) => msg.insert(v),
            RangeFieldValue::Uint32(v) => msg.insert(v),
            RangeFieldValue::Sint32(v) => msg.insert(v),
            RangeFieldValue::Real32(v) => msg.insert(v),
        }
    }
}

/// The numeric sensor PDR (DSP0248 Table 79), decoded into a flat record
/// with every field mandatory -- the wire layout leaves nothing optional
/// in practice.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSensorPdr {
    pub hdr: PdrCommonHeader,
    pub terminus_handle: u16,
    pub sensor_id: u16,
    pub entity_type: u16,
    pub entity_instance_num: u16,
    pub container_id: u16,
    pub sensor_init: u8,
    pub sensor_auxiliary_names_pdr: bool,
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
    pub sensor_data_size: SensorDataSize,
    pub resolution: f32,
    pub offset: f32,
    pub accuracy: u16,
    pub plus_tolerance: u8,
    pub minus_tolerance: u8,
    pub hysteresis: SensorValue,
    pub supported_thresholds: u8,
    pub threshold_and_hysteresis_volatility: u8,
    pub state_transition_interval: f32,
    pub update_interval: f32,
    pub max_readable: SensorValue,
    pub min_readable: SensorValue,
    pub range_field_format: RangeFieldFormat,
    pub range_field_support: u8,
    pub nominal_value: RangeFieldValue,
    pub normal_max: RangeFieldValue,
    pub normal_min: RangeFieldValue,
    pub warning_high: RangeFieldValue,
    pub warning_low: RangeFieldValue,
    pub critical_high: RangeFieldValue,
    pub critical_low: RangeFieldValue,
    pub fatal_high: RangeFieldValue,
    pub fatal_low: RangeFieldValue,
}

pub const PLDM_PDR_NUMERIC_SENSOR_PDR_MIN_LENGTH: usize = 59;

pub fn decode_numeric_sensor_pdr_data(pdr_data: &[u8]) -> Result<NumericSensorPdr, PldmError> {
    let mut msg = MsgBuf::new_read(pdr_data, 10 + PLDM_PDR_NUMERIC_SENSOR_PDR_MIN_LENGTH)?;

    let hdr = PdrCommonHeader::decode(&mut msg)?;
    let terminus_handle = msg.extract()?;
    let sensor_id = msg.extract()?;
    let entity_type = msg.extract()?;
    let entity_instance_num = msg.extract()?;
    let container_id = msg.extract()?;
    let sensor_init = msg.extract()?;
    let sensor_auxiliary_names_pdr: u8 = msg.extract()?;
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

    let sensor_data_size_raw: u8 = msg.extract()?;
    let sensor_data_size = SensorDataSize::try_from(sensor_data_size_raw)?;

    let resolution = msg.extract()?;
    let offset = msg.extract()?;
    let accuracy = msg.extract()?;
    let plus_tolerance = msg.extract()?;
    let minus_tolerance = msg.extract()?;
    let hysteresis = SensorValue::extract(&mut msg, sensor_data_size)?;
    let supported_thresholds = msg.extract()?;
    let threshold_and_hysteresis_volatility = msg.extract()?;
    let state_transition_interval = msg.extract()?;
    let update_interval = msg.extract()?;
    let max_readable = SensorValue::extract(&mut msg, sensor_data_size)?;
    let min_readable = SensorValue::extract(&mut msg, sensor_data_size)?;

    let range_field_format_raw: u8 = msg.extract()?;
    let range_field_format = RangeFieldFormat::try_from(range_field_format_raw)?;

    let range_field_support = msg.extract()?;
    let nominal_value = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let normal_max = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let normal_min = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let warning_high = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let warning_low = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let critical_high = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let critical_low = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let fatal_high = RangeFieldValue::extract(&mut msg, range_field_format)?;
    let fatal_low = RangeFieldValue::extract(&mut msg, range_field_format)?;

    msg.complete()?;

    Ok(NumericSensorPdr {
        hdr,
        terminus_handle,
        sensor_id,
        entity_type,
        entity_instance_num,
        container_id,
        sensor_init,
        sensor_auxiliary_names_pdr: sensor_auxiliary_names_pdr != 0,
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
        sensor_data_size,
        resolution,
        offset,
        accuracy,
        plus_tolerance,
        minus_tolerance,
        hysteresis,
        supported_thresholds,
        threshold_and_hysteresis_volatility,
        state_transition_interval,
        update_interval,
        max_readable,
        min_readable,
        range_field_format,
        range_field_support,
        nominal_value,
        normal_max,
        normal_min,
        warning_high,
        warning_low,
        critical_high,
        critical_low,
        fatal_high,
        fatal_low,
    })
}

/// Decodes `sensorEvent` numeric-sensor-state event data: `{event_state,
/// previous_event_state, sensor_data_size, present_reading}`.
pub fn decode_numeric_sensor_data(
    sensor_data: &[u8],
) -> Result<(u8, u8, SensorDataSize, SensorValue), PldmError> {
    let mut msg = MsgBuf::new_read(sensor_data, 3)?;
    let event_state = msg.extract()?;
    let previous_event_state = msg.extract()?;
    let sensor_data_size_raw: u8 = msg.extract()?;
    let sensor_data_size = SensorDataSize::try_from(sensor_data_size_raw)?;
    let present_reading = SensorValue::extract(&mut msg, sensor_data_size)?;
    msg.complete_consumed()?;
    Ok((
        event_state,
        previous_event_state,
        sensor_data_size,
        present_reading,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::protocol::platform::PdrType;

    /// Byte-for-byte the uint8 numeric sensor PDR fixture: record_handle=1,
    /// sensor_id=1, entity_type=POWER_SUPPLY(120), sensor_data_size=UINT8,
    /// hysteresis=3, nominal=50, warning_high=70, fatal_low=10.
    fn uint8_fixture() -> [u8; 69] {
        [
            0x1, 0x0, 0x0, 0x0, // record handle
            0x1, // PDRHeaderVersion
            PdrType::NumericSensorPdr as u8, // PDRType
            0x0, 0x0, // recordChangeNumber
            PLDM_PDR_NUMERIC_SENSOR_PDR_MIN_LENGTH as u8, 0, // dataLength
            0, 0, // terminusHandle
            0x1, 0x0, // sensorID=1
            120, 0, // entityType=Power Supply
            1, 0, // entityInstanceNumber
            1, 0, // containerID=1
            0, // sensorInit = NO_INIT
            0, // sensorAuxiliaryNamesPDR = false
            2, // baseUnit = degrees C
            0, // unitModifier
            0, // rateUnit
            0, // baseOEMUnitHandle
            0, // auxUnit
            0, // auxUnitModifier
            0, // auxRateUnit
            0, // rel
            0, // auxOEMUnitHandle
            1, // isLinear = true
            SensorDataSize::Uint8 as u8, // sensorDataSize
            0, 0, 0xc0, 0x3f, // resolution=1.5
            0, 0, 0x80, 0x3f, // offset=1.0
            0, 0, // accuracy
            0, // plusTolerance
            0, // minusTolerance
            3, // hysteresis = 3
            0, // supportedThresholds
            0, // thresholdAndHysteresisVolatility
            0, 0, 0x80, 0x3f, // stateTransitionInterval=1.0
            0, 0, 0x80, 0x3f, // updateInterval=1.0
            255, // maxReadable
            0,   // minReadable
            RangeFieldFormat::Uint8 as u8, // rangeFieldFormat
            0,   // rangeFieldSupport
            50,  // nominalValue
            60,  // normalMax
            40,  // normalMin
            70,  // warningHigh
            30,  // warningLow
            80,  // criticalHigh
            20,  // criticalLow
            90,  // fatalHigh
            10,  // fatalLow
        ]
    }

    #[test]
    fn test_decode_numeric_sensor_pdr_uint8() {
        let fixture = uint8_fixture();
        let pdr = decode_numeric_sensor_pdr_data(&fixture).unwrap();
        assert_eq!(pdr.hdr.record_handle, 1);
        assert_eq!(pdr.sensor_id, 1);
        assert_eq!(pdr.entity_type, 120);
        assert_eq!(pdr.sensor_data_size, SensorDataSize::Uint8);
        assert_eq!(pdr.hysteresis, SensorValue::Uint8(3));
        assert_eq!(pdr.nominal_value, RangeFieldValue::Uint8(50));
        assert_eq!(pdr.warning_high, RangeFieldValue::Uint8(70));
        assert_eq!(pdr.fatal_low, RangeFieldValue::Uint8(10));
        assert!((pdr.resolution - 1.5).abs() < f32::EPSILON);
        assert!((pdr.offset - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decode_numeric_sensor_pdr_rejects_bad_sensor_data_size() {
        let mut fixture = uint8_fixture();
        fixture[32] = 6; // sensorDataSize out of range
        assert_eq!(
            decode_numeric_sensor_pdr_data(&fixture).unwrap_err(),
            PldmError::InvalidDataSize
        );
    }

    #[test]
    fn test_decode_numeric_sensor_data_roundtrip() {
        let mut buf = [0u8; 8];
        {
            let mut w = MsgBuf::new_write(&mut buf, 3).unwrap();
            w.insert::<u8>(1).unwrap(); // event_state
            w.insert::<u8>(0).unwrap(); // previous_event_state
            w.insert::<u8>(SensorDataSize::Uint16 as u8).unwrap();
            w.insert::<u16>(4242).unwrap();
            w.complete_used(8).unwrap();
        }
        let (event_state, previous, size, reading) =
            decode_numeric_sensor_data(&buf[..5]).unwrap();
        assert_eq!(event_state, 1);
        assert_eq!(previous, 0);
        assert_eq!(size, SensorDataSize::Uint16);
        assert_eq!(reading, SensorValue::Uint16(4242));
    }
}
