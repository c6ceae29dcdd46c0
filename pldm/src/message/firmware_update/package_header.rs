// Licensed under the Apache-2.0 license

//! Firmware update package parsing (DSP0267 §7): the fixed header, the
//! device-identification-record area, and the component-image-information
//! table. None of this is a PLDM request/response — it is the file format
//! the update agent reads before it starts issuing `RequestUpdate` and
//! friends — but it shares the same tag-then-dispatch decode style as the
//! rest of the firmware-update command surface, so it lives alongside it.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::firmware_update::{
    ComponentImageInformationFixed, Descriptor, DescriptorType, PackageHeaderInformationFixed,
    VersionStringType, DESCRIPTOR_DATA_MAX_LEN, MAX_COMPONENT_COUNT,
};

/// A firmware-device identification record, DSP0267 Table 12: applicable
/// component bitmap, an image-set version string, one or more descriptors,
/// and an optional vendor-defined data block.
#[derive(Debug, Clone)]
pub struct FirmwareDeviceIdRecord {
    pub descriptor_count: u8,
    pub device_update_option_flags: u32,
    pub comp_image_set_ver_str_type: u8,
    pub applicable_components: [u8; 32],
    pub applicable_components_len: usize,
    pub descriptors: [Descriptor; 8],
}

/// Reads the fixed part of a package header and validates the two checks
/// the spec calls out explicitly: the component bitmap must be a whole
/// number of bytes, and the version-string type tag must be one of the
/// five legal encodings.
pub fn decode_pldm_package_header_info(
    buffer: &[u8],
) -> Result<(PackageHeaderInformationFixed, usize), PldmError> {
    let mut msg = MsgBuf::new_read(buffer, core::mem::size_of::<PackageHeaderInformationFixed>())?;
    let mut identifier = [0u8; 16];
    msg.extract_array(&mut identifier)?;
    let package_header_format_revision: u8 = msg.extract()?;
    let package_header_size: u16 = msg.extract()?;
    let mut release_date_time = [0u8; 13];
    msg.extract_array(&mut release_date_time)?;
    let component_bitmap_bit_length: u16 = msg.extract()?;
    let package_version_string_type: u8 = msg.extract()?;
    let package_version_string_length: u8 = msg.extract()?;

    if component_bitmap_bit_length % 8 != 0 {
        return Err(PldmError::InvalidDataSize);
    }
    if package_version_string_type > VersionStringType::Utf16Be as u8 {
        return Err(PldmError::InvalidVersionStringType);
    }

    let used = msg.complete_used(buffer.len())?;
    Ok((
        PackageHeaderInformationFixed {
            package_header_identifier: identifier,
            package_header_format_revision,
            package_header_size,
            package_release_date_time: release_date_time,
            component_bitmap_bit_length,
            package_version_string_type,
            package_version_string_length,
        },
        used,
    ))
}

/// Validates and decodes one firmware-device identification record out of
/// a package's device-id-record area.
///
/// `record_length` is the length prefix already read by the caller off the
/// wire; this function enforces the minimum-size inequality from the spec
/// before trusting any of the variable-length fields that follow it.
pub fn decode_firmware_device_id_record(
    buffer: &[u8],
    record_length: u16,
    applicable_components_bit_length: u16,
) -> Result<FirmwareDeviceIdRecord, PldmError> {
    let applicable_components_len = applicable_components_bit_length as usize / 8;

    const FIXED_HEADER_LEN: usize = 2 + 4 + 1 + 1; // record_length, device_update_option_flags, ver_str_type, ver_str_len
    const MIN_DESCRIPTOR_LEN: usize = 4; // type(2) + length(2), zero-length data
    let minimum_required = FIXED_HEADER_LEN
        + applicable_components_len
        + 1 // image-set version string, at least one byte
        + MIN_DESCRIPTOR_LEN;
    if (record_length as usize) < minimum_required {
        return Err(PldmError::InvalidLength);
    }

    let mut msg = MsgBuf::new_read(buffer, FIXED_HEADER_LEN)?;
    let _record_length: u16 = msg.extract()?;
    let device_update_option_flags: u32 = msg.extract()?;
    let comp_image_set_ver_str_type: u8 = msg.extract()?;
    let comp_image_set_ver_str_len: u8 = msg.extract()?;

    let mut applicable_components = [0u8; 32];
    msg.extract_array(&mut applicable_components[..applicable_components_len])?;

    let mut ver_str = [0u8; 255];
    msg.extract_array(&mut ver_str[..comp_image_set_ver_str_len as usize])?;

    let descriptor_count: u8 = msg.extract()?;

    let mut descriptors = core::array::from_fn(|_| Descriptor::new_empty());
    decode_descriptor_table(&mut msg, descriptor_count, &mut descriptors)?;

    msg.complete()?;

    Ok(FirmwareDeviceIdRecord {
        descriptor_count,
        device_update_option_flags,
        comp_image_set_ver_str_type,
        applicable_components,
        applicable_components_len,
        descriptors,
    })
}

fn decode_descriptor_table(
    msg: &mut MsgBuf,
    count: u8,
    out: &mut [Descriptor; 8],
) -> Result<(), PldmError> {
    for slot in out.iter_mut().take(count as usize) {
        *slot = decode_pldm_descriptor_from_iter(msg)?;
    }
    Ok(())
}

/// Decodes one `{type:u16, length:u16, data[length]}` descriptor from the
/// cursor. For `PLDM_FWUP_VENDOR_DEFINED` the declared length is trusted as
/// given (the caller follows up with a vendor-specific parse of the data);
/// for every other type the decoder enforces the published fixed length.
pub fn decode_pldm_descriptor_from_iter(msg: &mut MsgBuf) -> Result<Descriptor, PldmError> {
    let descriptor_type: u16 = msg.extract()?;
    let descriptor_length: u16 = msg.extract()?;

    if descriptor_type != DescriptorType::VendorDefined as u16 {
        if let Ok(ty) = DescriptorType::try_from(descriptor_type) {
            let expected = crate::protocol::firmware_update::get_descriptor_length(ty);
            if expected != descriptor_length as usize {
                return Err(PldmError::InvalidDescriptorLength);
            }
        }
    }

    if descriptor_length as usize > DESCRIPTOR_DATA_MAX_LEN {
        return Err(PldmError::InvalidDescriptorLength);
    }

    let mut data = [0u8; DESCRIPTOR_DATA_MAX_LEN];
    msg.extract_array(&mut data[..descriptor_length as usize])?;

    Ok(Descriptor {
        descriptor_type,
        descriptor_length,
        descriptor_data: data,
    })
}

/// Reads one `ComponentImageInformation` entry (DSP0267 Table 21) out of
/// the package's component image information table.
pub fn decode_component_image_information(
    buffer: &[u8],
) -> Result<(ComponentImageInformationFixed, [u8; 255], usize), PldmError> {
    let mut msg = MsgBuf::new_read(
        buffer,
        core::mem::size_of::<ComponentImageInformationFixed>(),
    )?;
    let comp_classification: u16 = msg.extract()?;
    let comp_identifier: u16 = msg.extract()?;
    let comp_comparison_stamp: u32 = msg.extract()?;
    let comp_options: u16 = msg.extract()?;
    let requested_comp_activation_method: u16 = msg.extract()?;
    let comp_location_offset: u32 = msg.extract()?;
    let comp_size: u32 = msg.extract()?;
    let comp_ver_str_type: u8 = msg.extract()?;
    let comp_ver_str_len: u8 = msg.extract()?;

    let mut ver_str = [0u8; 255];
    msg.extract_array(&mut ver_str[..comp_ver_str_len as usize])?;
    let used = msg.complete_used(buffer.len())?;

    Ok((
        ComponentImageInformationFixed {
            comp_classification,
            comp_identifier,
            comp_comparison_stamp,
            comp_options,
            requested_comp_activation_method,
            comp_location_offset,
            comp_size,
            comp_ver_str_type,
            comp_ver_str_len,
        },
        ver_str,
        used,
    ))
}

/// Upper bound on how many component image entries a package table may
/// carry before this crate's static storage runs out; mirrors
/// [`MAX_COMPONENT_COUNT`] used for the runtime-side component table.
pub const MAX_PACKAGE_COMPONENT_COUNT: usize = MAX_COMPONENT_COUNT;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_package_header_rejects_odd_bitmap_length() {
        let mut buffer = [0u8; 64];
        buffer[16] = 1; // format revision
        buffer[17..19].copy_from_slice(&64u16.to_le_bytes());
        buffer[32..34].copy_from_slice(&9u16.to_le_bytes()); // not a multiple of 8
        buffer[34] = VersionStringType::Ascii as u8;
        buffer[35] = 5;
        let result = decode_pldm_package_header_info(&buffer);
        assert_eq!(result.unwrap_err(), PldmError::InvalidDataSize);
    }

    #[test]
    fn test_package_header_rejects_bad_version_string_type() {
        let mut buffer = [0u8; 64];
        buffer[32..34].copy_from_slice(&0u16.to_le_bytes());
        buffer[34] = 0xFF;
        buffer[35] = 5;
        let result = decode_pldm_package_header_info(&buffer);
        assert_eq!(result.unwrap_err(), PldmError::InvalidVersionStringType);
    }

    #[test]
    fn test_descriptor_iter_roundtrip() {
        let mut write_buf = [0u8; 32];
        {
            let mut w = MsgBuf::new_write(&mut write_buf, 4).unwrap();
            w.insert::<u16>(DescriptorType::PciVendorId as u16).unwrap();
            w.insert::<u16>(2).unwrap();
            w.insert_array(&[0xAB, 0xCD]).unwrap();
            w.complete().unwrap();
        }
        let mut r = MsgBuf::new_read(&write_buf, 4).unwrap();
        let descriptor = decode_pldm_descriptor_from_iter(&mut r).unwrap();
        assert_eq!(descriptor.descriptor_type, DescriptorType::PciVendorId as u16);
        assert_eq!(descriptor.descriptor_length, 2);
        assert_eq!(&descriptor.descriptor_data[..2], &[0xAB, 0xCD]);
    }

    #[test]
    fn test_descriptor_iter_rejects_mismatched_length() {
        let mut write_buf = [0u8; 32];
        {
            let mut w = MsgBuf::new_write(&mut write_buf, 4).unwrap();
            w.insert::<u16>(DescriptorType::Uuid as u16).unwrap();
            w.insert::<u16>(2).unwrap(); // UUID must be 16 bytes
            w.insert_array(&[0xAB, 0xCD]).unwrap();
            w.complete().unwrap();
        }
        let mut r = MsgBuf::new_read(&write_buf, 4).unwrap();
        assert_eq!(
            decode_pldm_descriptor_from_iter(&mut r).unwrap_err(),
            PldmError::InvalidDescriptorLength
        );
    }
}
