// Licensed under the Apache-2.0 license

//! Tags and constants for the DSP0247 BIOS table codecs (C5): attribute
//! type tags (shared between the attribute table and the attribute-value
//! table), the BIOS command set, and string-type tags for free-form BIOS
//! strings.

use crate::error::PldmError;
use core::convert::TryFrom;

/// Maximum length of a BIOS string table entry's name, or an attribute's
/// default string -- chosen generously enough for any realistic BIOS
/// setting while keeping every entry a fixed-capacity stack value.
pub const PLDM_BIOS_STRING_MAX_LEN: usize = 256;
/// Maximum number of possible-value handles an enumeration attribute may
/// carry, and the maximum number of default-value indices.
pub const PLDM_BIOS_ENUM_MAX_VALUES: usize = 32;

pub const PLDM_STRING_TYPE_MAX: u8 = 5;
pub const PLDM_STRING_TYPE_VENDOR: u8 = 0xff;

/// BIOS command codes (DSP0247 Table 1).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiosCmd {
    GetBiosTable = 0x01,
    GetBiosAttributeCurrentValueByHandle = 0x05,
    SetBiosAttributeCurrentValue = 0x07,
    GetBiosTableBaseline = 0x09,
}

/// Which of the three BIOS tables a record belongs to (DSP0247 §5.1).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiosTableType {
    StringTable = 0,
    AttrTable = 1,
    AttrValTable = 2,
}

impl TryFrom<u8> for BiosTableType {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BiosTableType::StringTable),
            1 => Ok(BiosTableType::AttrTable),
            2 => Ok(BiosTableType::AttrValTable),
            _ => Err(PldmError::InvalidData),
        }
    }
}

/// Attribute type tag shared by the attribute table and the
/// attribute-value table. The read-only variants are the base type with
/// bit 7 set; [`BiosAttrType::is_read_only`] and
/// [`BiosAttrType::base_type`] peel that apart.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiosAttrType {
    Enumeration = 0x00,
    String = 0x01,
    Password = 0x02,
    Integer = 0x03,
    EnumerationReadOnly = 0x80,
    StringReadOnly = 0x81,
    PasswordReadOnly = 0x82,
    IntegerReadOnly = 0x83,
}

impl BiosAttrType {
    pub fn is_read_only(self) -> bool {
        (self as u8) & 0x80 != 0
    }

    /// The read/write attribute type this tag shares encode/decode layout
    /// with (i.e. with the read-only bit cleared).
    pub fn base_type(self) -> BiosAttrType {
        match self {
            BiosAttrType::Enumeration | BiosAttrType::EnumerationReadOnly => {
                BiosAttrType::Enumeration
            }
            BiosAttrType::String | BiosAttrType::StringReadOnly => BiosAttrType::String,
            BiosAttrType::Password | BiosAttrType::PasswordReadOnly => BiosAttrType::Password,
            BiosAttrType::Integer | BiosAttrType::IntegerReadOnly => BiosAttrType::Integer,
        }
    }
}

impl TryFrom<u8> for BiosAttrType {
    type Error = PldmError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(BiosAttrType::Enumeration),
            0x01 => Ok(BiosAttrType::String),
            0x02 => Ok(BiosAttrType::Password),
            0x03 => Ok(BiosAttrType::Integer),
            0x80 => Ok(BiosAttrType::EnumerationReadOnly),
            0x81 => Ok(BiosAttrType::StringReadOnly),
            0x82 => Ok(BiosAttrType::PasswordReadOnly),
            0x83 => Ok(BiosAttrType::IntegerReadOnly),
            _ => Err(PldmError::InvalidData),
        }
    }
}

/// Validates a string-type tag against DSP0247's legal set (the five
/// standard charsets, or the vendor-defined escape value).
pub fn is_legal_string_type(string_type: u8) -> bool {
    string_type <= PLDM_STRING_TYPE_MAX || string_type == PLDM_STRING_TYPE_VENDOR
}
