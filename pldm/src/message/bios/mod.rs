// Licensed under the Apache-2.0 license

//! DSP0247 BIOS table codecs (C5): the string table, the attribute table,
//! and the attribute-value table, plus the iterator and CRC32 finaliser
//! that assemble/consume a complete table.
//!
//! Each table is a packed sequence of variable-length entries followed by
//! 0-3 bytes of zero padding (so the checksum always starts on a 4-byte
//! boundary) and a trailing little-endian CRC32 covering everything
//! before it. Unlike the table this was distilled from, the iterator
//! here validates that trailing checksum up front (see
//! [`BiosTableIter::new`]) rather than guessing where the table ends from
//! a "7 bytes or fewer left" heuristic -- a short but corrupt tail reads
//! as a decode error instead of a silently truncated table.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::protocol::bios::{
    BiosAttrType, BiosTableType, PLDM_BIOS_ENUM_MAX_VALUES, PLDM_BIOS_STRING_MAX_LEN,
};

/// Monotonic 16-bit handle allocator for BIOS string/attribute handles.
/// The reference keeps one of these as a function-local static per
/// process; here it is caller-owned so multiple tables (or repeated
/// table builds in tests) don't share hidden global state.
#[derive(Debug, Default)]
pub struct BiosHandleAllocator {
    next: u16,
    exhausted: bool,
}

impl BiosHandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> Result<u16, PldmError> {
        if self.exhausted {
            return Err(PldmError::HandleExhausted);
        }
        let handle = self.next;
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
        Ok(handle)
    }
}

fn copy_into_fixed(src: &[u8], dst: &mut [u8; PLDM_BIOS_STRING_MAX_LEN]) -> Result<u16, PldmError> {
    if src.len() > dst.len() {
        return Err(PldmError::InvalidLength);
    }
    dst[..src.len()].copy_from_slice(src);
    Ok(src.len() as u16)
}

/// A BIOS string table entry: `{handle, length, name}` (DSP0247 Table 85).
#[derive(Debug, Clone, Copy)]
pub struct BiosStringEntry {
    pub handle: u16,
    pub name_len: u16,
    pub name: [u8; PLDM_BIOS_STRING_MAX_LEN],
}

impl BiosStringEntry {
    pub fn new(handle: u16, name: &[u8]) -> Result<Self, PldmError> {
        if name.is_empty() {
            return Err(PldmError::InvalidData);
        }
        let mut buf = [0u8; PLDM_BIOS_STRING_MAX_LEN];
        let name_len = copy_into_fixed(name, &mut buf)?;
        Ok(Self {
            handle,
            name_len,
            name: buf,
        })
    }

    pub fn name(&self) -> &[u8] {
        &self.name[..self.name_len as usize]
    }

    pub fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.handle)?;
        msg.insert(self.name_len)?;
        msg.insert_array(self.name())
    }

    pub fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        let handle = msg.extract()?;
        let name_len: u16 = msg.extract()?;
        let mut buf = [0u8; PLDM_BIOS_STRING_MAX_LEN];
        if name_len as usize > buf.len() {
            return Err(PldmError::InvalidLength);
        }
        msg.extract_array(&mut buf[..name_len as usize])?;
        Ok(Self {
            handle,
            name_len,
            name: buf,
        })
    }
}

/// Type-specific fields of an attribute table entry (DSP0247 Table 87-90),
/// tagged by the [`BiosAttrType::base_type`] read from the entry header.
#[derive(Debug, Clone, Copy)]
pub enum BiosAttrFields {
    Enumeration {
        pv_num: u8,
        pv_handles: [u16; PLDM_BIOS_ENUM_MAX_VALUES],
        def_num: u8,
        def_indices: [u8; PLDM_BIOS_ENUM_MAX_VALUES],
    },
    String {
        string_type: u8,
        min_length: u16,
        max_length: u16,
        def_length: u16,
        def_string: [u8; PLDM_BIOS_STRING_MAX_LEN],
    },
    /// DSP0247 deliberately omits a default value from the wire format of
    /// a password attribute.
    Password {
        string_type: u8,
        min_length: u16,
        max_length: u16,
        def_length: u16,
    },
    Integer {
        lower_bound: u64,
        upper_bound: u64,
        scalar_increment: u32,
        default_value: u64,
    },
}

/// One entry of the BIOS attribute table: `{attr_handle, attr_type,
/// string_handle, <type-specific fields>}`.
#[derive(Debug, Clone, Copy)]
pub struct BiosAttrEntry {
    pub attr_handle: u16,
    pub attr_type: BiosAttrType,
    pub string_handle: u16,
    pub fields: BiosAttrFields,
}

impl BiosAttrEntry {
    /// Validates an integer attribute's bounds the way DSP0247 requires:
    /// a fixed (`lower == upper`) attribute must have `scalar_increment
    /// == 0` and `default == lower`; otherwise the default must lie in
    /// range and be reachable from `lower_bound` in whole
    /// `scalar_increment` steps.
    pub fn integer_info_check(
        lower_bound: u64,
        upper_bound: u64,
        scalar_increment: u32,
        default_value: u64,
    ) -> Result<(), PldmError> {
        if lower_bound == upper_bound {
            if default_value != lower_bound || scalar_increment != 0 {
                return Err(PldmError::InvalidData);
            }
            return Ok(());
        }
        if lower_bound > upper_bound {
            return Err(PldmError::InvalidData);
        }
        if default_value < lower_bound || default_value > upper_bound {
            return Err(PldmError::InvalidData);
        }
        if scalar_increment == 0 {
            return Err(PldmError::InvalidData);
        }
        if (default_value - lower_bound) % scalar_increment as u64 != 0 {
            return Err(PldmError::InvalidData);
        }
        Ok(())
    }

    /// Validates a string attribute's length bounds.
    pub fn string_info_check(
        min_length: u16,
        max_length: u16,
        def_length: u16,
    ) -> Result<(), PldmError> {
        if min_length > max_length {
            return Err(PldmError::InvalidData);
        }
        if def_length < min_length || def_length > max_length {
            return Err(PldmError::InvalidData);
        }
        Ok(())
    }

    pub fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.attr_handle)?;
        msg.insert(self.attr_type as u8)?;
        msg.insert(self.string_handle)?;
        match &self.fields {
            BiosAttrFields::Enumeration {
                pv_num,
                pv_handles,
                def_num,
                def_indices,
            } => {
                msg.insert(*pv_num)?;
                for h in &pv_handles[..*pv_num as usize] {
                    msg.insert(*h)?;
                }
                msg.insert(*def_num)?;
                for i in &def_indices[..*def_num as usize] {
                    msg.insert(*i)?;
                }
            }
            BiosAttrFields::String {
                string_type,
                min_length,
                max_length,
                def_length,
                def_string,
            } => {
                Self::string_info_check(*min_length, *max_length, *def_length)?;
                msg.insert(*string_type)?;
                msg.insert(*min_length)?;
                msg.insert(*max_length)?;
                msg.insert(*def_length)?;
                msg.insert_array(&def_string[..*def_length as usize])?;
            }
            BiosAttrFields::Password {
                string_type,
                min_length,
                max_length,
                def_length,
            } => {
                Self::string_info_check(*min_length, *max_length, *def_length)?;
                msg.insert(*string_type)?;
                msg.insert(*min_length)?;
                msg.insert(*max_length)?;
                msg.insert(*def_length)?;
            }
            BiosAttrFields::Integer {
                lower_bound,
                upper_bound,
                scalar_increment,
                default_value,
            } => {
                Self::integer_info_check(
                    *lower_bound,
                    *upper_bound,
                    *scalar_increment,
                    *default_value,
                )?;
                msg.insert(*lower_bound)?;
                msg.insert(*upper_bound)?;
                msg.insert(*scalar_increment)?;
                msg.insert(*default_value)?;
            }
        }
        Ok(())
    }

    pub fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        let attr_handle = msg.extract()?;
        let raw_type: u8 = msg.extract()?;
        let attr_type = BiosAttrType::try_from(raw_type).map_err(|_| PldmError::InvalidBiosAttrType)?;
        let string_handle = msg.extract()?;

        let fields = match attr_type.base_type() {
            BiosAttrType::Enumeration => {
                let pv_num: u8 = msg.extract()?;
                if pv_num as usize > PLDM_BIOS_ENUM_MAX_VALUES {
                    return Err(PldmError::InvalidLength);
                }
                let mut pv_handles = [0u16; PLDM_BIOS_ENUM_MAX_VALUES];
                for h in pv_handles.iter_mut().take(pv_num as usize) {
                    *h = msg.extract()?;
                }
                let def_num: u8 = msg.extract()?;
                if def_num as usize > PLDM_BIOS_ENUM_MAX_VALUES {
                    return Err(PldmError::InvalidLength);
                }
                let mut def_indices = [0u8; PLDM_BIOS_ENUM_MAX_VALUES];
                for i in def_indices.iter_mut().take(def_num as usize) {
                    *i = msg.extract()?;
                }
                BiosAttrFields::Enumeration {
                    pv_num,
                    pv_handles,
                    def_num,
                    def_indices,
                }
            }
            BiosAttrType::String => {
                let string_type = msg.extract()?;
                let min_length = msg.extract()?;
                let max_length = msg.extract()?;
                let def_length: u16 = msg.extract()?;
                if def_length as usize > PLDM_BIOS_STRING_MAX_LEN {
                    return Err(PldmError::InvalidLength);
                }
                let mut def_string = [0u8; PLDM_BIOS_STRING_MAX_LEN];
                msg.extract_array(&mut def_string[..def_length as usize])?;
                BiosAttrFields::String {
                    string_type,
                    min_length,
                    max_length,
                    def_length,
                    def_string,
                }
            }
            BiosAttrType::Password => BiosAttrFields::Password {
                string_type: msg.extract()?,
                min_length: msg.extract()?,
                max_length: msg.extract()?,
                def_length: msg.extract()?,
            },
            BiosAttrType::Integer => BiosAttrFields::Integer {
                lower_bound: msg.extract()?,
                upper_bound: msg.extract()?,
                scalar_increment: msg.extract()?,
                default_value: msg.extract()?,
            },
            _ => unreachable!("base_type only returns the four RW variants"),
        };

        Ok(Self {
            attr_handle,
            attr_type,
            string_handle,
            fields,
        })
    }
}

/// Type-specific value of an attribute-value table entry (DSP0247 Table
/// 91). Enumeration values are indices into the owning attribute's
/// possible-value list, not attribute-table handles.
#[derive(Debug, Clone, Copy)]
pub enum BiosAttrValue {
    Enumeration {
        count: u8,
        indices: [u8; PLDM_BIOS_ENUM_MAX_VALUES],
    },
    String {
        length: u16,
        data: [u8; PLDM_BIOS_STRING_MAX_LEN],
    },
    /// Covers both `Password` and `Integer`: DSP0247 encodes a password's
    /// current value the same way as an integer's, as an opaque u64
    /// whose interpretation is attribute-specific.
    Integer(u64),
}

#[derive(Debug, Clone, Copy)]
pub struct BiosAttrValueEntry {
    pub attr_handle: u16,
    pub attr_type: BiosAttrType,
    pub value: BiosAttrValue,
}

impl BiosAttrValueEntry {
    pub fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.attr_handle)?;
        msg.insert(self.attr_type as u8)?;
        match &self.value {
            BiosAttrValue::Enumeration { count, indices } => {
                msg.insert(*count)?;
                msg.insert_array(&indices[..*count as usize])?;
            }
            BiosAttrValue::String { length, data } => {
                msg.insert(*length)?;
                msg.insert_array(&data[..*length as usize])?;
            }
            BiosAttrValue::Integer(v) => {
                msg.insert(*v)?;
            }
        }
        Ok(())
    }

    pub fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        let attr_handle = msg.extract()?;
        let raw_type: u8 = msg.extract()?;
        let attr_type = BiosAttrType::try_from(raw_type).map_err(|_| PldmError::InvalidBiosAttrType)?;

        let value = match attr_type.base_type() {
            BiosAttrType::Enumeration => {
                let count: u8 = msg.extract()?;
                if count as usize > PLDM_BIOS_ENUM_MAX_VALUES {
                    return Err(PldmError::InvalidLength);
                }
                let mut indices = [0u8; PLDM_BIOS_ENUM_MAX_VALUES];
                msg.extract_array(&mut indices[..count as usize])?;
                BiosAttrValue::Enumeration { count, indices }
            }
            BiosAttrType::String => {
                let length: u16 = msg.extract()?;
                if length as usize > PLDM_BIOS_STRING_MAX_LEN {
                    return Err(PldmError::InvalidLength);
                }
                let mut data = [0u8; PLDM_BIOS_STRING_MAX_LEN];
                msg.extract_array(&mut data[..length as usize])?;
                BiosAttrValue::String { length, data }
            }
            BiosAttrType::Password | BiosAttrType::Integer => BiosAttrValue::Integer(msg.extract()?),
            _ => unreachable!("base_type only returns the four RW variants"),
        };

        Ok(Self {
            attr_handle,
            attr_type,
            value,
        })
    }
}

/// A decoded entry from any one of the three BIOS tables, tagged by which
/// table it came from.
#[derive(Debug, Clone, Copy)]
pub enum BiosTableEntry {
    String(BiosStringEntry),
    Attr(BiosAttrEntry),
    AttrVal(BiosAttrValueEntry),
}

/// Number of padding bytes needed so `size_without_pad + pad` is a
/// multiple of 4 -- the checksum always starts 4-byte aligned.
pub fn pad_size(size_without_pad: usize) -> usize {
    (4 - (size_without_pad % 4)) % 4
}

/// Total bytes `append_pad_checksum` will add: padding plus the 4-byte
/// CRC32.
pub fn pad_checksum_size(size_without_pad: usize) -> usize {
    pad_size(size_without_pad) + 4
}

/// Appends zero padding and a little-endian CRC32 to a table assembled
/// entry-by-entry in `table[..*size]`, growing `*size` to cover both.
/// `table`'s capacity must be at least `*size + pad_checksum_size(*size)`.
pub fn append_pad_checksum(table: &mut [u8], size: &mut usize) -> Result<(), PldmError> {
    let pad = pad_size(*size);
    let total = *size + pad + 4;
    if table.len() < total {
        return Err(PldmError::InvalidLength);
    }
    for b in &mut table[*size..*size + pad] {
        *b = 0;
    }
    let padded_len = *size + pad;
    let checksum = crc32fast::hash(&table[..padded_len]);
    table[padded_len..padded_len + 4].copy_from_slice(&checksum.to_le_bytes());
    *size = total;
    Ok(())
}

/// Validates a complete table's trailing CRC32, returning the length of
/// the entry-bearing payload (everything before the padding and
/// checksum) on success.
pub fn verify_checksum(table: &[u8]) -> Result<usize, PldmError> {
    if table.len() < 4 {
        return Err(PldmError::InvalidLength);
    }
    let split = table.len() - 4;
    let expected = u32::from_le_bytes(table[split..].try_into().unwrap());
    let actual = crc32fast::hash(&table[..split]);
    if expected != actual {
        return Err(PldmError::ChecksumMismatch);
    }
    // The payload itself ends before whatever 0-3 zero pad bytes precede
    // the checksum; walk backwards over them since the iterator needs the
    // exact entry-region length, not the padded one.
    let mut payload_len = split;
    while payload_len > 0 && table[payload_len - 1] == 0 && split - payload_len < 3 {
        payload_len -= 1;
    }
    Ok(payload_len)
}

/// Walks a checksum-validated BIOS table's entries in order. Construction
/// validates the table's CRC32 up front (see module docs); iteration then
/// only ever fails on a malformed individual entry.
pub struct BiosTableIter<'a> {
    payload: &'a [u8],
    offset: usize,
    table_type: BiosTableType,
}

impl<'a> BiosTableIter<'a> {
    pub fn new(table: &'a [u8], table_type: BiosTableType) -> Result<Self, PldmError> {
        let payload_len = verify_checksum(table)?;
        Ok(Self {
            payload: &table[..payload_len],
            offset: 0,
            table_type,
        })
    }
}

impl<'a> Iterator for BiosTableIter<'a> {
    type Item = Result<BiosTableEntry, PldmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.payload.len() {
            return None;
        }
        let mut msg = match MsgBuf::new_read(&self.payload[self.offset..], 0) {
            Ok(m) => m,
            Err(e) => return Some(Err(e)),
        };
        let entry = match self.table_type {
            BiosTableType::StringTable => BiosStringEntry::decode(&mut msg).map(BiosTableEntry::String),
            BiosTableType::AttrTable => BiosAttrEntry::decode(&mut msg).map(BiosTableEntry::Attr),
            BiosTableType::AttrValTable => {
                BiosAttrValueEntry::decode(&mut msg).map(BiosTableEntry::AttrVal)
            }
        };
        match entry {
            Ok(entry) => {
                self.offset += msg.cursor();
                Some(Ok(entry))
            }
            Err(e) => {
                // Stop iterating on a malformed entry rather than looping
                // forever at the same offset.
                self.offset = self.payload.len();
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::bios::BiosAttrType;

    fn encode_entries(entries: &[BiosTableEntry]) -> ([u8; 256], usize) {
        let mut buf = [0u8; 256];
        let mut used = 0;
        for entry in entries {
            let mut msg = MsgBuf::new_write(&mut buf[used..], 0).unwrap();
            match entry {
                BiosTableEntry::String(e) => e.encode(&mut msg).unwrap(),
                BiosTableEntry::Attr(e) => e.encode(&mut msg).unwrap(),
                BiosTableEntry::AttrVal(e) => e.encode(&mut msg).unwrap(),
            }
            used += msg.complete_used(256 - used).unwrap();
        }
        (buf, used)
    }

    #[test]
    fn string_entry_roundtrip() {
        let entry = BiosStringEntry::new(7, b"Processor Speed").unwrap();
        let mut buf = [0u8; 64];
        let mut msg = MsgBuf::new_write(&mut buf, 0).unwrap();
        entry.encode(&mut msg).unwrap();
        let used = msg.complete_used(64).unwrap();

        let mut decode_buf = MsgBuf::new_read(&buf[..used], 0).unwrap();
        let decoded = BiosStringEntry::decode(&mut decode_buf).unwrap();
        assert_eq!(decoded.handle, 7);
        assert_eq!(decoded.name(), b"Processor Speed");
    }

    #[test]
    fn handle_allocator_exhausts() {
        let mut alloc = BiosHandleAllocator {
            next: u16::MAX,
            exhausted: false,
        };
        assert_eq!(alloc.alloc().unwrap(), u16::MAX);
        assert_eq!(alloc.alloc(), Err(PldmError::HandleExhausted));
    }

    #[test]
    fn integer_attribute_rejects_bad_default() {
        assert_eq!(
            BiosAttrEntry::integer_info_check(0, 100, 10, 105),
            Err(PldmError::InvalidData)
        );
        assert_eq!(BiosAttrEntry::integer_info_check(0, 100, 10, 100), Ok(()));
    }

    #[test]
    fn table_iter_validates_checksum_and_walks_entries() {
        let string_entry = BiosTableEntry::String(BiosStringEntry::new(0, b"Enabled").unwrap());
        let attr_val_entry = BiosTableEntry::AttrVal(BiosAttrValueEntry {
            attr_handle: 1,
            attr_type: BiosAttrType::Integer,
            value: BiosAttrValue::Integer(42),
        });
        let (buf, used) = encode_entries(&[string_entry, attr_val_entry]);

        let mut table = [0u8; 256];
        table[..used].copy_from_slice(&buf[..used]);
        let mut size = used;
        append_pad_checksum(&mut table, &mut size).unwrap();

        // AttrValTable because the second entry decodes as one; in
        // practice string and attr-value entries never share a table,
        // this just exercises that the iterator stops cleanly.
        let mut iter = BiosTableIter::new(&table[..size], BiosTableType::StringTable).unwrap();
        let first = iter.next().unwrap().unwrap();
        assert!(matches!(first, BiosTableEntry::String(_)));
    }

    #[test]
    fn table_iter_rejects_corrupt_checksum() {
        let entry = BiosTableEntry::String(BiosStringEntry::new(0, b"x").unwrap());
        let (buf, used) = encode_entries(&[entry]);
        let mut table = [0u8; 64];
        table[..used].copy_from_slice(&buf[..used]);
        let mut size = used;
        append_pad_checksum(&mut table, &mut size).unwrap();
        table[size - 1] ^= 0xff;

        assert_eq!(
            BiosTableIter::new(&table[..size], BiosTableType::StringTable).err(),
            Some(PldmError::ChecksumMismatch)
        );
    }
}
