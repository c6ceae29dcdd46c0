// Licensed under the Apache-2.0 license

//! `QueryDownstreamDevices` / `QueryDownstreamIdentifiers` /
//! `GetDownstreamFirmwareParameters` — the bridge-device trio that extends
//! the base firmware-update command set (DSP0267 §5.1) to devices that sit
//! behind the update agent rather than answering PLDM requests themselves.

use crate::codec::{PldmCodec, PldmCodecError};
use crate::error::PldmError;
use crate::protocol::base::{
    InstanceId, PldmMsgHeader, PldmMsgType, PldmSupportedType, PLDM_MSG_HEADER_LEN,
};
use crate::protocol::firmware_update::{Descriptor, FwUpdateCmd, MAX_DOWNSTREAM_DEVICE_COUNT};
use zerocopy::{FromBytes, Immutable, IntoBytes};

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, PartialEq)]
#[repr(C, packed)]
pub struct QueryDownstreamDevicesRequest {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
}

impl QueryDownstreamDevicesRequest {
    pub fn new(instance_id: InstanceId, message_type: PldmMsgType) -> Result<Self, PldmError> {
        Ok(Self {
            hdr: PldmMsgHeader::new(
                instance_id,
                message_type,
                PldmSupportedType::FwUpdate,
                FwUpdateCmd::QueryDownstreamDevices as u8,
            )?,
        })
    }
}

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, PartialEq)]
#[repr(C, packed)]
pub struct QueryDownstreamDevicesResponse {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub completion_code: u8,
    pub downstream_device_update_supported: u8,
    pub number_of_downstream_devices: u16,
    pub max_number_of_downstream_devices: u16,
}

impl QueryDownstreamDevicesResponse {
    pub fn new(
        instance_id: InstanceId,
        completion_code: u8,
        downstream_device_update_supported: bool,
        number_of_downstream_devices: u16,
        max_number_of_downstream_devices: u16,
    ) -> Result<Self, PldmError> {
        Ok(Self {
            hdr: PldmMsgHeader::new(
                instance_id,
                PldmMsgType::Response,
                PldmSupportedType::FwUpdate,
                FwUpdateCmd::QueryDownstreamDevices as u8,
            )?,
            completion_code,
            downstream_device_update_supported: downstream_device_update_supported as u8,
            number_of_downstream_devices,
            max_number_of_downstream_devices,
        })
    }
}

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, PartialEq)]
#[repr(C, packed)]
pub struct QueryDownstreamIdentifiersRequest {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub data_transfer_handle: u32,
    pub transfer_operation_flag: u8,
}

impl QueryDownstreamIdentifiersRequest {
    pub fn new(
        instance_id: InstanceId,
        message_type: PldmMsgType,
        data_transfer_handle: u32,
        transfer_operation_flag: u8,
    ) -> Result<Self, PldmError> {
        Ok(Self {
            hdr: PldmMsgHeader::new(
                instance_id,
                message_type,
                PldmSupportedType::FwUpdate,
                FwUpdateCmd::QueryDownstreamIdentifiers as u8,
            )?,
            data_transfer_handle,
            transfer_operation_flag,
        })
    }
}

/// One `downstream_device` entry: `{ downstream_device_index, downstream_descriptor_count, descriptors[] }`.
/// Descriptor count and bytes are carried inline, so the response as a whole
/// is walked with [`crate::msgbuf`] rather than decoded field-by-field here;
/// this struct is the per-entry accumulator the caller fills in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownstreamDeviceEntry {
    pub downstream_device_index: u8,
    pub descriptor_count: u8,
    pub descriptors: [Descriptor; MAX_DOWNSTREAM_DEVICE_COUNT],
}

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, PartialEq)]
#[repr(C, packed)]
pub struct QueryDownstreamIdentifiersResponseFixed {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub completion_code: u8,
    pub next_data_transfer_handle: u32,
    pub transfer_flag: u8,
    pub downstream_devices_length: u32,
    pub number_of_downstream_devices: u16,
}

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, PartialEq)]
#[repr(C, packed)]
pub struct GetDownstreamFirmwareParametersRequest {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub data_transfer_handle: u32,
    pub transfer_operation_flag: u8,
}

impl GetDownstreamFirmwareParametersRequest {
    pub fn new(
        instance_id: InstanceId,
        message_type: PldmMsgType,
        data_transfer_handle: u32,
        transfer_operation_flag: u8,
    ) -> Result<Self, PldmError> {
        Ok(Self {
            hdr: PldmMsgHeader::new(
                instance_id,
                message_type,
                PldmSupportedType::FwUpdate,
                FwUpdateCmd::GetDownstreamFirmwareParameters as u8,
            )?,
            data_transfer_handle,
            transfer_operation_flag,
        })
    }
}

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, PartialEq)]
#[repr(C, packed)]
pub struct GetDownstreamFirmwareParametersResponseFixed {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub completion_code: u8,
    pub next_data_transfer_handle: u32,
    pub transfer_flag: u8,
    pub fdp_count: u16,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_query_downstream_devices_roundtrip() {
        let request = QueryDownstreamDevicesRequest::new(1, PldmMsgType::Request).unwrap();
        let mut buffer = [0u8; PLDM_MSG_HEADER_LEN];
        request.encode(&mut buffer).unwrap();
        let decoded = QueryDownstreamDevicesRequest::decode(&buffer).unwrap();
        assert_eq!(request, decoded);

        let response = QueryDownstreamDevicesResponse::new(1, 0, true, 2, 4).unwrap();
        let mut buffer = [0u8; core::mem::size_of::<QueryDownstreamDevicesResponse>()];
        response.encode(&mut buffer).unwrap();
        let decoded = QueryDownstreamDevicesResponse::decode(&buffer).unwrap();
        assert_eq!(response, decoded);
    }

    #[test]
    fn test_query_downstream_identifiers_request() {
        let request =
            QueryDownstreamIdentifiersRequest::new(1, PldmMsgType::Request, 0, 1 /* FIRST_PART */)
                .unwrap();
        let mut buffer = [0u8; core::mem::size_of::<QueryDownstreamIdentifiersRequest>()];
        request.encode(&mut buffer).unwrap();
        let decoded = QueryDownstreamIdentifiersRequest::decode(&buffer).unwrap();
        assert_eq!(request, decoded);
    }
}
