// Licensed under the Apache-2.0 license

use zerocopy::{FromBytes, Immutable, IntoBytes};

#[derive(Debug, PartialEq, Eq)]
pub enum PldmCodecError {
    BufferTooShort,
    Unsupported,
}

/// A trait for encoding and decoding PLDM (Platform Level Data Model) messages.
///
/// This trait provides methods for encoding a PLDM message into a byte buffer
/// and decoding a PLDM message from a byte buffer. Implementers of this trait
/// must also implement the `Debug` trait and be `Sized`.
pub trait PldmCodec: core::fmt::Debug + Sized {
    /// Encodes the PLDM message into the provided byte buffer.
    ///
    /// Returns the number of bytes written on success.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, PldmCodecError>;

    /// Decodes a PLDM message from the provided byte buffer.
    fn decode(buffer: &[u8]) -> Result<Self, PldmCodecError>;
}

// Default implementation of PldmCodec for fixed-layout types that can
// leverage zerocopy directly. Variable-length messages (anything with a
// trailing string or array whose size is carried in an earlier field)
// implement PldmCodec by hand on top of `crate::msgbuf`.
impl<T> PldmCodec for T
where
    T: core::fmt::Debug + Sized + FromBytes + IntoBytes + Immutable,
{
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, PldmCodecError> {
        self.write_to_prefix(buffer)
            .map_err(|_| PldmCodecError::BufferTooShort)
            .map(|_| core::mem::size_of::<T>())
    }

    fn decode(buffer: &[u8]) -> Result<Self, PldmCodecError> {
        Ok(Self::read_from_prefix(buffer)
            .map_err(|_| PldmCodecError::BufferTooShort)?
            .0)
    }
}
