// Licensed under the Apache-2.0 license

//! Meta OEM file-I/O commands (C9): a small request/response pair for
//! moving opaque file data over PLDM, keyed by an 8-bit file handle.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;

/// Largest single write/read chunk this codec will carry in one message.
pub const OEM_META_FILE_DATA_MAX_LEN: usize = 256;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OemMetaFileIoCmd {
    WriteFile = 0x01,
    ReadFile = 0x02,
}

/// `{file_handle, length, data[length]}`.
#[derive(Debug, Clone, Copy)]
pub struct OemMetaWriteFileIoRequest {
    pub file_handle: u8,
    pub length: u32,
    data: [u8; OEM_META_FILE_DATA_MAX_LEN],
}

impl OemMetaWriteFileIoRequest {
    pub fn new(file_handle: u8, data: &[u8]) -> Result<Self, PldmError> {
        if data.len() > OEM_META_FILE_DATA_MAX_LEN {
            return Err(PldmError::InvalidLength);
        }
        let mut buf = [0u8; OEM_META_FILE_DATA_MAX_LEN];
        buf[..data.len()].copy_from_slice(data);
        Ok(Self {
            file_handle,
            length: data.len() as u32,
            data: buf,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.length as usize]
    }

    pub fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.file_handle)?;
        msg.insert(self.length)?;
        msg.insert_array(self.data())
    }

    pub fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        let file_handle = msg.extract()?;
        let length: u32 = msg.extract()?;
        if length as usize > OEM_META_FILE_DATA_MAX_LEN {
            return Err(PldmError::InvalidLength);
        }
        let mut data = [0u8; OEM_META_FILE_DATA_MAX_LEN];
        msg.extract_array(&mut data[..length as usize])?;
        Ok(Self {
            file_handle,
            length,
            data,
        })
    }
}

/// `{file_handle, length, transfer_flag, high_offset, low_offset}`. Unlike
/// the write request, no data accompanies a read request -- the reply
/// carries the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OemMetaReadFileIoRequest {
    pub file_handle: u8,
    pub length: u32,
    pub transfer_flag: u8,
    pub high_offset: u32,
    pub low_offset: u32,
}

impl OemMetaReadFileIoRequest {
    pub fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.file_handle)?;
        msg.insert(self.length)?;
        msg.insert(self.transfer_flag)?;
        msg.insert(self.high_offset)?;
        msg.insert(self.low_offset)
    }

    pub fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        Ok(Self {
            file_handle: msg.extract()?,
            length: msg.extract()?,
            transfer_flag: msg.extract()?,
            high_offset: msg.extract()?,
            low_offset: msg.extract()?,
        })
    }
}

/// Both OEM meta file-I/O commands respond with nothing but a completion
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OemMetaFileIoResponse {
    pub completion_code: u8,
}

impl OemMetaFileIoResponse {
    pub fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.completion_code)
    }

    pub fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        Ok(Self {
            completion_code: msg.extract()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_request_roundtrip() {
        let req = OemMetaWriteFileIoRequest::new(3, b"abc123").unwrap();
        let mut buf = [0u8; 32];
        let mut msg = MsgBuf::new_write(&mut buf, 0).unwrap();
        req.encode(&mut msg).unwrap();
        let used = msg.complete_used(32).unwrap();

        let mut decode_msg = MsgBuf::new_read(&buf[..used], 0).unwrap();
        let decoded = OemMetaWriteFileIoRequest::decode(&mut decode_msg).unwrap();
        assert_eq!(decoded.file_handle, 3);
        assert_eq!(decoded.data(), b"abc123");
    }

    #[test]
    fn read_file_request_roundtrip() {
        let req = OemMetaReadFileIoRequest {
            file_handle: 1,
            length: 64,
            transfer_flag: 0,
            high_offset: 0,
            low_offset: 128,
        };
        let mut buf = [0u8; 32];
        let mut msg = MsgBuf::new_write(&mut buf, 0).unwrap();
        req.encode(&mut msg).unwrap();
        let used = msg.complete_used(32).unwrap();

        let mut decode_msg = MsgBuf::new_read(&buf[..used], 0).unwrap();
        assert_eq!(OemMetaReadFileIoRequest::decode(&mut decode_msg).unwrap(), req);
    }
}
