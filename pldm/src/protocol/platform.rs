// Licensed under the Apache-2.0 license

//! Wire tags and PDR type codes for DSP0248 Platform Monitoring and Control:
//! sensor/effecter commands, PDR repository access, and the platform event
//! message family.

use crate::error::PldmError;
use core::convert::TryFrom;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCmd {
    SetStateEffecterStates = 0x39,
    GetStateSensorReadings = 0x21,
    SetNumericEffecterValue = 0x31,
    GetNumericEffecterValue = 0x32,
    SetStateEffecterEnables = 0x3A,
    GetSensorReading = 0x11,
    GetStateEffecterStates = 0x33,
    SetNumericSensorEnable = 0x0E,
    GetPdrRepositoryInfo = 0x50,
    GetPdr = 0x51,
    GetPdrRepositorySignature = 0x53,
    PlatformEventMessage = 0x0A,
    PollForPlatformEventMessage = 0x0B,
    EventMessageSupported = 0x0C,
    EventMessageBufferSize = 0x0D,
    SetEventReceiver = 0x04,
}

impl TryFrom<u8> for PlatformCmd {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0x39 => Ok(Self::SetStateEffecterStates),
            0x21 => Ok(Self::GetStateSensorReadings),
            0x31 => Ok(Self::SetNumericEffecterValue),
            0x32 => Ok(Self::GetNumericEffecterValue),
            0x3A => Ok(Self::SetStateEffecterEnables),
            0x11 => Ok(Self::GetSensorReading),
            0x33 => Ok(Self::GetStateEffecterStates),
            0x0E => Ok(Self::SetNumericSensorEnable),
            0x50 => Ok(Self::GetPdrRepositoryInfo),
            0x51 => Ok(Self::GetPdr),
            0x53 => Ok(Self::GetPdrRepositorySignature),
            0x0A => Ok(Self::PlatformEventMessage),
            0x0B => Ok(Self::PollForPlatformEventMessage),
            0x0C => Ok(Self::EventMessageSupported),
            0x0D => Ok(Self::EventMessageBufferSize),
            0x04 => Ok(Self::SetEventReceiver),
            _ => Err(PldmError::UnsupportedCmd),
        }
    }
}

/// `eventMessageGlobalEnable` values for `SetEventReceiver` (DSP0248 Table
/// 10). `AsyncKeepAlive` is the only one carrying a trailing
/// `heartbeatTimer` field.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMessageGlobalEnable {
    Disable = 0x00,
    AsyncOnly = 0x01,
    AsyncKeepAlive = 0x02,
}

impl TryFrom<u8> for EventMessageGlobalEnable {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0x00 => Ok(Self::Disable),
            0x01 => Ok(Self::AsyncOnly),
            0x02 => Ok(Self::AsyncKeepAlive),
            _ => Err(PldmError::InvalidData),
        }
    }
}

/// `transportProtocolType` values for `SetEventReceiver` (DSP0248 Table 10);
/// this stack only ever runs PLDM over MCTP.
pub const PLDM_TRANSPORT_PROTOCOL_TYPE_MCTP: u8 = 0x00;

/// Width/signedness tag shared by sensor readings, effecter values, and
/// threshold/hysteresis fields.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDataSize {
    Uint8 = 0,
    Sint8 = 1,
    Uint16 = 2,
    Sint16 = 3,
    Uint32 = 4,
    Sint32 = 5,
}

pub const PLDM_SENSOR_DATA_SIZE_MAX: u8 = SensorDataSize::Sint32 as u8;

impl TryFrom<u8> for SensorDataSize {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0 => Ok(Self::Uint8),
            1 => Ok(Self::Sint8),
            2 => Ok(Self::Uint16),
            3 => Ok(Self::Sint16),
            4 => Ok(Self::Uint32),
            5 => Ok(Self::Sint32),
            _ => Err(PldmError::InvalidDataSize),
        }
    }
}

/// Same tag space as [`SensorDataSize`], used for effecter values.
pub type EffecterDataSize = SensorDataSize;
pub const PLDM_EFFECTER_DATA_SIZE_MAX: u8 = PLDM_SENSOR_DATA_SIZE_MAX;

/// Width/signedness tag for PDR range-bound fields (nominal, normal,
/// warning/critical/fatal high-low); a superset of [`SensorDataSize`] that
/// also allows an IEEE-754 `real32` encoding.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFieldFormat {
    Uint8 = 0,
    Sint8 = 1,
    Uint16 = 2,
    Sint16 = 3,
    Uint32 = 4,
    Sint32 = 5,
    Real32 = 6,
}

pub const PLDM_RANGE_FIELD_FORMAT_MAX: u8 = RangeFieldFormat::Real32 as u8;

impl TryFrom<u8> for RangeFieldFormat {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0 => Ok(Self::Uint8),
            1 => Ok(Self::Sint8),
            2 => Ok(Self::Uint16),
            3 => Ok(Self::Sint16),
            4 => Ok(Self::Uint32),
            5 => Ok(Self::Sint32),
            6 => Ok(Self::Real32),
            _ => Err(PldmError::InvalidDataSize),
        }
    }
}

/// PDR type codes (DSP0248 Table 22).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdrType {
    TerminusLocatorPdr = 1,
    NumericSensorPdr = 2,
    NumericSensorInitPdr = 3,
    StateSensorPdr = 4,
    StateSensorInitPdr = 5,
    SensorAuxiliaryNamesPdr = 6,
    OemUnitPdr = 7,
    OemStateSetPdr = 8,
    NumericEffecterPdr = 9,
    NumericEffecterInitPdr = 10,
    StateEffecterPdr = 11,
    StateEffecterInitPdr = 12,
    EffecterAuxiliaryNamesPdr = 13,
    EffecterOemSemanticPdr = 14,
    EntityAssociationPdr = 15,
    EntityAuxiliaryNamesPdr = 16,
    OemEntityIdPdr = 17,
    InterruptAssociationPdr = 18,
    EventLogPdr = 19,
    FruRecordSetPdr = 20,
    FileDescriptorPdr = 21,
    OemDevicePdr = 126,
    OemPdr = 127,
}

impl TryFrom<u8> for PdrType {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            1 => Ok(Self::TerminusLocatorPdr),
            2 => Ok(Self::NumericSensorPdr),
            3 => Ok(Self::NumericSensorInitPdr),
            4 => Ok(Self::StateSensorPdr),
            5 => Ok(Self::StateSensorInitPdr),
            6 => Ok(Self::SensorAuxiliaryNamesPdr),
            7 => Ok(Self::OemUnitPdr),
            8 => Ok(Self::OemStateSetPdr),
            9 => Ok(Self::NumericEffecterPdr),
            10 => Ok(Self::NumericEffecterInitPdr),
            11 => Ok(Self::StateEffecterPdr),
            12 => Ok(Self::StateEffecterInitPdr),
            13 => Ok(Self::EffecterAuxiliaryNamesPdr),
            14 => Ok(Self::EffecterOemSemanticPdr),
            15 => Ok(Self::EntityAssociationPdr),
            16 => Ok(Self::EntityAuxiliaryNamesPdr),
            17 => Ok(Self::OemEntityIdPdr),
            18 => Ok(Self::InterruptAssociationPdr),
            19 => Ok(Self::EventLogPdr),
            20 => Ok(Self::FruRecordSetPdr),
            21 => Ok(Self::FileDescriptorPdr),
            126 => Ok(Self::OemDevicePdr),
            127 => Ok(Self::OemPdr),
            _ => Err(PldmError::InvalidData),
        }
    }
}

/// `event_class` values for `PlatformEventMessage` (DSP0248 Table 13).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    SensorEvent = 0x00,
    EffecterEvent = 0x01,
    RedfishTaskExecutedEvent = 0x02,
    RedfishMessageEvent = 0x03,
    PldmMessagePollEvent = 0x04,
    PdrRepositoryChgEvent = 0x05,
    CperEvent = 0x07,
}

pub const PLDM_CPER_EVENT: u8 = EventClass::CperEvent as u8;
pub const PLDM_OEM_EVENT_CLASS_MIN: u8 = 0xF0;
pub const PLDM_OEM_EVENT_CLASS_MAX: u8 = 0xFE;

/// True iff `event_class` is a legal `PlatformEventMessage` class: any of
/// the named classes up to and including `CPER_EVENT`, or an
/// OEM-reserved class in `[0xF0, 0xFE]`.
pub fn is_legal_event_class(event_class: u8) -> bool {
    event_class <= PLDM_CPER_EVENT
        || (PLDM_OEM_EVENT_CLASS_MIN..=PLDM_OEM_EVENT_CLASS_MAX).contains(&event_class)
}

/// `sensor_event_class_type` tag inside a `sensorEvent` class's event data.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEventClass {
    SensorOpState = 0,
    StateSensorState = 1,
    NumericSensorState = 2,
}

impl TryFrom<u8> for SensorEventClass {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0 => Ok(Self::SensorOpState),
            1 => Ok(Self::StateSensorState),
            2 => Ok(Self::NumericSensorState),
            _ => Err(PldmError::InvalidData),
        }
    }
}

/// Transfer-operation flags legal on `PollForPlatformEventMessage`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEventTransferOperationFlag {
    GetFirstPart = 0x01,
    GetNextPart = 0x02,
    AckOnly = 0x03,
}

impl TryFrom<u8> for PollEventTransferOperationFlag {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0x01 => Ok(Self::GetFirstPart),
            0x02 => Ok(Self::GetNextPart),
            0x03 => Ok(Self::AckOnly),
            _ => Err(PldmError::InvalidTransferOpFlag),
        }
    }
}

pub const PLDM_EVENT_ID_NULL: u16 = 0x0000;
pub const PLDM_EVENT_ID_FRAGMENT: u16 = 0xFFFF;

/// Validates the joint `(transfer_operation_flag, event_id_to_acknowledge)`
/// constraint for a `PollForPlatformEventMessage` request.
pub fn validate_poll_ack(
    flag: PollEventTransferOperationFlag,
    event_id_to_acknowledge: u16,
) -> Result<(), PldmError> {
    let ok = match flag {
        PollEventTransferOperationFlag::GetFirstPart => {
            event_id_to_acknowledge == PLDM_EVENT_ID_NULL
        }
        PollEventTransferOperationFlag::GetNextPart => {
            event_id_to_acknowledge == PLDM_EVENT_ID_FRAGMENT
        }
        PollEventTransferOperationFlag::AckOnly => {
            event_id_to_acknowledge != PLDM_EVENT_ID_NULL
                && event_id_to_acknowledge != PLDM_EVENT_ID_FRAGMENT
        }
    };
    if ok {
        Ok(())
    } else {
        Err(PldmError::InvalidData)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sensor_data_size_roundtrip() {
        for raw in 0..=5u8 {
            assert!(SensorDataSize::try_from(raw).is_ok());
        }
        assert_eq!(
            SensorDataSize::try_from(6).unwrap_err(),
            PldmError::InvalidDataSize
        );
    }

    #[test]
    fn test_range_field_format_roundtrip() {
        for raw in 0..=6u8 {
            assert!(RangeFieldFormat::try_from(raw).is_ok());
        }
        assert_eq!(
            RangeFieldFormat::try_from(7).unwrap_err(),
            PldmError::InvalidDataSize
        );
    }

    #[test]
    fn test_is_legal_event_class() {
        assert!(is_legal_event_class(0x00));
        assert!(is_legal_event_class(PLDM_CPER_EVENT));
        assert!(!is_legal_event_class(PLDM_CPER_EVENT + 1));
        assert!(is_legal_event_class(0xF0));
        assert!(is_legal_event_class(0xFE));
        assert!(!is_legal_event_class(0xFF));
    }

    #[test]
    fn test_event_message_global_enable_roundtrip() {
        for raw in 0..=2u8 {
            assert!(EventMessageGlobalEnable::try_from(raw).is_ok());
        }
        assert_eq!(
            EventMessageGlobalEnable::try_from(3).unwrap_err(),
            PldmError::InvalidData
        );
    }

    #[test]
    fn test_validate_poll_ack() {
        assert!(validate_poll_ack(
            PollEventTransferOperationFlag::GetFirstPart,
            PLDM_EVENT_ID_NULL
        )
        .is_ok());
        assert!(validate_poll_ack(
            PollEventTransferOperationFlag::GetFirstPart,
            1
        )
        .is_err());
        assert!(validate_poll_ack(
            PollEventTransferOperationFlag::GetNextPart,
            PLDM_EVENT_ID_FRAGMENT
        )
        .is_ok());
        assert!(validate_poll_ack(PollEventTransferOperationFlag::AckOnly, 5).is_ok());
        assert!(validate_poll_ack(
            PollEventTransferOperationFlag::AckOnly,
            PLDM_EVENT_ID_NULL
        )
        .is_err());
    }
}
