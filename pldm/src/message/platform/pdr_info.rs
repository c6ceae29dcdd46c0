// Licensed under the Apache-2.0 license

//! `GetPdrRepositoryInfo` / `GetPdr` (DSP0248 §23-24), and the two PDR
//! kinds whose payload shape depends on repository contents rather than
//! a fixed struct: entity auxiliary names and file descriptors.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::base::{InstanceId, PldmMsgHeader, PldmMsgType, PldmSupportedType, PLDM_MSG_HEADER_LEN};
use crate::protocol::platform::PlatformCmd;
use core::convert::TryFrom;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use super::sensor::PdrCommonHeader;

/// `repository_state` values for `GetPdrRepositoryInfo` (DSP0248 Table 24).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdrRepositoryState {
    Available = 0x00,
    UpdateInProgress = 0x01,
    Failed = 0x02,
}

impl TryFrom<u8> for PdrRepositoryState {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0x00 => Ok(Self::Available),
            0x01 => Ok(Self::UpdateInProgress),
            0x02 => Ok(Self::Failed),
            _ => Err(PldmError::InvalidData),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable)]
#[repr(C, packed)]
pub struct GetPdrRepositoryInfoRequest {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
}

impl GetPdrRepositoryInfoRequest {
    pub fn new(instance_id: InstanceId) -> Result<Self, PldmError> {
        Ok(Self {
            hdr: PldmMsgHeader::new(
                instance_id,
                PldmMsgType::Request,
                PldmSupportedType::Platform,
                PlatformCmd::GetPdrRepositoryInfo as u8,
            )?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable)]
#[repr(C, packed)]
pub struct GetPdrRepositoryInfoResponse {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub completion_code: u8,
    pub repository_state: u8,
    pub update_time: [u8; 13],
    pub oem_update_time: [u8; 13],
    pub record_count: u32,
    pub repository_size: u32,
    pub largest_record_size: u32,
    pub data_transfer_handle_timeout: u8,
}

#[allow(clippy::too_many_arguments)]
impl GetPdrRepositoryInfoResponse {
    pub fn new(
        instance_id: InstanceId,
        completion_code: u8,
        repository_state: PdrRepositoryState,
        update_time: [u8; 13],
        oem_update_time: [u8; 13],
        record_count: u32,
        repository_size: u32,
        largest_record_size: u32,
        data_transfer_handle_timeout: u8,
    ) -> Result<Self, PldmError> {
        Ok(Self {
            hdr: PldmMsgHeader::new(
                instance_id,
                PldmMsgType::Response,
                PldmSupportedType::Platform,
                PlatformCmd::GetPdrRepositoryInfo as u8,
            )?,
            completion_code,
            repository_state: repository_state as u8,
            update_time,
            oem_update_time,
            record_count,
            repository_size,
            largest_record_size,
            data_transfer_handle_timeout,
        })
    }
}

/// `transfer_op_flag` values legal on `GetPdr` (shared with the Base
/// multipart transfer family, DSP0248 Table 26).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetPdrTransferOpFlag {
    GetFirstPart = 0x00,
    GetNextPart = 0x01,
}

impl TryFrom<u8> for GetPdrTransferOpFlag {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, PldmError> {
        match value {
            0x00 => Ok(Self::GetFirstPart),
            0x01 => Ok(Self::GetNextPart),
            _ => Err(PldmError::InvalidTransferOpFlag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable)]
#[repr(C, packed)]
pub struct GetPdrRequestFixed {
    pub hdr: PldmMsgHeader<[u8; PLDM_MSG_HEADER_LEN]>,
    pub record_handle: u32,
    pub data_transfer_handle: u32,
    pub transfer_op_flag: u8,
    pub request_count: u16,
    pub record_change_number: u16,
}

impl GetPdrRequestFixed {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instance_id: InstanceId,
        record_handle: u32,
        data_transfer_handle: u32,
        transfer_op_flag: GetPdrTransferOpFlag,
        request_count: u16,
        record_change_number: u16,
    ) -> Result<Self, PldmError> {
        Ok(Self {
            hdr: PldmMsgHeader::new(
                instance_id,
                PldmMsgType::Request,
                PldmSupportedType::Platform,
                PlatformCmd::GetPdr as u8,
            )?,
            record_handle,
            data_transfer_handle,
            transfer_op_flag: transfer_op_flag as u8,
            request_count,
            record_change_number,
        })
    }
}

/// Decoded `GetPdr` response header; `record_data` is the (possibly
/// partial) PDR bytes trailing the fixed fields, up to `response_count`.
#[derive(Debug, PartialEq)]
pub struct GetPdrResponse<'a> {
    pub completion_code: u8,
    pub next_record_handle: u32,
    pub next_data_transfer_handle: u32,
    pub transfer_flag: u8,
    pub response_count: u16,
    pub record_data: &'a [u8],
}

pub fn decode_get_pdr_response(buf: &[u8]) -> Result<GetPdrResponse<'_>, PldmError> {
    let mut msg = MsgBuf::new_read(buf, PLDM_MSG_HEADER_LEN + 13)?;
    msg.span_required(PLDM_MSG_HEADER_LEN)?;
    let completion_code = msg.extract()?;
    let next_record_handle = msg.extract()?;
    let next_data_transfer_handle = msg.extract()?;
    let transfer_flag = msg.extract()?;
    let response_count: u16 = msg.extract()?;
    let record_data = msg.span_required(response_count as usize)?;
    msg.complete()?;
    Ok(GetPdrResponse {
        completion_code,
        next_record_handle,
        next_data_transfer_handle,
        transfer_flag,
        response_count,
        record_data,
    })
}

/// `encode_get_pdr_resp` in the reference rejects `record_data == NULL`
/// with `resp_cnt > 0` as an internal consistency check, not a protocol
/// requirement -- dead code duplicating what the caller's own record
/// lookup already guarantees. This builder trusts its caller instead.
pub fn encode_get_pdr_response(
    buf: &mut [u8],
    instance_id: InstanceId,
    completion_code: u8,
    next_record_handle: u32,
    next_data_transfer_handle: u32,
    transfer_flag: u8,
    record_data: &[u8],
) -> Result<usize, PldmError> {
    let mut msg = MsgBuf::new_write(buf, PLDM_MSG_HEADER_LEN + 13 + record_data.len())?;
    let hdr = PldmMsgHeader::<[u8; PLDM_MSG_HEADER_LEN]>::new(
        instance_id,
        PldmMsgType::Response,
        PldmSupportedType::Platform,
        PlatformCmd::GetPdr as u8,
    )?;
    msg.insert_array(hdr.as_bytes())?;
    msg.insert(completion_code)?;
    msg.insert(next_record_handle)?;
    msg.insert(next_data_transfer_handle)?;
    msg.insert(transfer_flag)?;
    msg.insert(record_data.len() as u16)?;
    msg.insert_array(record_data)?;
    msg.complete_used(buf.len())
}

/// A single `(name_language_tag, entity_name)` pair inside an entity
/// auxiliary names PDR (DSP0248 Table 88).
#[derive(Debug, PartialEq)]
pub struct EntityName<'a> {
    pub name_language_tag: &'a [u8],
    pub entity_name: &'a [u8],
}

/// Entity auxiliary names PDR: a shared name count, then that many
/// `(language tag, name)` pairs, each NUL-terminated UTF-16. Decoded as a
/// two-pass walk: the first pass only counts entries so the caller can
/// size an output array; `decode_entity_auxiliary_names_pdr_into` does
/// the actual extraction given a caller-sized buffer.
pub fn count_entity_auxiliary_names(pdr_data: &[u8]) -> Result<usize, PldmError> {
    let mut msg = MsgBuf::new_read(pdr_data, 10 + 7)?;
    PdrCommonHeader::decode(&mut msg)?;
    let _entity_type: u16 = msg.extract()?;
    let _entity_instance: u16 = msg.extract()?;
    let _container_id: u16 = msg.extract()?;
    let _shared_name_count: u8 = msg.extract()?;
    let name_count: u8 = msg.extract()?;
    let mut count = 0usize;
    for _ in 0..name_count {
        msg.span_string_ascii()?;
        msg.span_string_utf16()?;
        count += 1;
    }
    msg.complete()?;
    Ok(count)
}

pub fn decode_entity_auxiliary_names_pdr_into<'a>(
    pdr_data: &'a [u8],
    out: &mut [Option<EntityName<'a>>],
) -> Result<(PdrCommonHeader, u16, u16, u16, bool, usize), PldmError> {
    let mut msg = MsgBuf::new_read(pdr_data, 10 + 7)?;
    let hdr = PdrCommonHeader::decode(&mut msg)?;
    let entity_type = msg.extract()?;
    let entity_instance: u16 = msg.extract()?;
    let container_id = msg.extract()?;
    let shared_name_count: u8 = msg.extract()?;
    let name_count: u8 = msg.extract()?;
    if name_count as usize > out.len() {
        return Err(PldmError::OutOfMemory);
    }
    let mut written = 0usize;
    for slot in out.iter_mut().take(name_count as usize) {
        let name_language_tag = msg.span_string_ascii()?;
        let entity_name = msg.span_string_utf16()?;
        *slot = Some(EntityName {
            name_language_tag,
            entity_name,
        });
        written += 1;
    }
    msg.complete()?;
    Ok((
        hdr,
        entity_type,
        entity_instance,
        container_id,
        shared_name_count != 0,
        written,
    ))
}

/// File descriptor PDR (DSP0248 Table 97). `oem_file_classification_name`
/// is only present when `file_classification == OEM_FILE`.
#[derive(Debug, PartialEq)]
pub struct FileDescriptorPdr<'a> {
    pub hdr: PdrCommonHeader,
    pub terminus_handle: u16,
    pub file_identifier: u16,
    pub entity_type: u16,
    pub entity_instance_num: u16,
    pub container_id: u16,
    pub superior_directory_file_identifier: u16,
    pub file_classification: u16,
    pub oem_file_classification_name: Option<&'a [u8]>,
    pub file_caption: &'a [u8],
    pub file_version: &'a [u8],
    pub file_size: u32,
    pub file_traits: u32,
}

pub const PLDM_FILE_CLASSIFICATION_OEM_FILE: u16 = 0x8000;

pub fn decode_file_descriptor_pdr(pdr_data: &[u8]) -> Result<FileDescriptorPdr<'_>, PldmError> {
    let mut msg = MsgBuf::new_read(pdr_data, 10 + 22)?;
    let hdr = PdrCommonHeader::decode(&mut msg)?;
    let terminus_handle = msg.extract()?;
    let file_identifier = msg.extract()?;
    let entity_type = msg.extract()?;
    let entity_instance_num = msg.extract()?;
    let container_id = msg.extract()?;
    let superior_directory_file_identifier = msg.extract()?;
    let file_classification: u16 = msg.extract()?;

    let oem_file_classification_name = if file_classification == PLDM_FILE_CLASSIFICATION_OEM_FILE
    {
        Some(msg.span_string_ascii()?)
    } else {
        None
    };

    let file_caption = msg.span_string_ascii()?;
    let file_version = msg.span_string_ascii()?;
    let file_size = msg.extract()?;
    let file_traits = msg.extract()?;
    msg.complete()?;

    Ok(FileDescriptorPdr {
        hdr,
        terminus_handle,
        file_identifier,
        entity_type,
        entity_instance_num,
        container_id,
        superior_directory_file_identifier,
        file_classification,
        oem_file_classification_name,
        file_caption,
        file_version,
        file_size,
        file_traits,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::PldmCodec;

    #[test]
    fn test_get_pdr_repository_info_roundtrip() {
        let request = GetPdrRepositoryInfoRequest::new(3).unwrap();
        let mut buf = [0u8; 16];
        let used = request.encode(&mut buf).unwrap();
        let decoded = GetPdrRepositoryInfoRequest::decode(&buf[..used]).unwrap();
        assert_eq!(request, decoded);
    }

    #[test]
    fn test_get_pdr_response_roundtrip() {
        let mut buf = [0u8; 64];
        let record = [1u8, 2, 3, 4, 5];
        let used =
            encode_get_pdr_response(&mut buf, 1, 0, 0, 0, 4, &record).unwrap();
        let decoded = decode_get_pdr_response(&buf[..used]).unwrap();
        assert_eq!(decoded.record_data, &record);
        assert_eq!(decoded.response_count, 5);
    }

    #[test]
    fn test_file_descriptor_pdr_without_oem_name() {
        let mut buf = [0u8; 64];
        let mut w = MsgBuf::new_write(&mut buf, 10 + 22).unwrap();
        w.insert::<u32>(1).unwrap(); // record handle
        w.insert::<u8>(1).unwrap(); // version
        w.insert::<u8>(21).unwrap(); // pdr type = FileDescriptorPdr
        w.insert::<u16>(0).unwrap(); // record change num
        w.insert::<u16>(0).unwrap(); // length (placeholder)
        w.insert::<u16>(0).unwrap(); // terminus_handle
        w.insert::<u16>(1).unwrap(); // file_identifier
        w.insert::<u16>(0).unwrap(); // entity_type
        w.insert::<u16>(0).unwrap(); // entity_instance_num
        w.insert::<u16>(0).unwrap(); // container_id
        w.insert::<u16>(0).unwrap(); // superior_directory_file_identifier
        w.insert::<u16>(1).unwrap(); // file_classification != OEM
        w.insert_array(b"EN\0").unwrap(); // file_caption
        w.insert_array(b"1.0\0").unwrap(); // file_version
        w.insert::<u32>(1024).unwrap(); // file_size
        w.insert::<u32>(0).unwrap(); // file_traits
        let used = w.complete_used(buf.len()).unwrap();

        let decoded = decode_file_descriptor_pdr(&buf[..used]).unwrap();
        assert_eq!(decoded.oem_file_classification_name, None);
        assert_eq!(decoded.file_caption, b"EN");
        assert_eq!(decoded.file_size, 1024);
    }
}
