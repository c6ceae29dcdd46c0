// Licensed under the Apache-2.0 license

//! Bounded, endianness-normalising cursor over a caller-provided byte span.
//!
//! `MsgBuf` is the only primitive every codec in this crate is built on. It
//! never allocates and never touches a byte outside the slice it was
//! constructed over. Once an operation overflows the span or a strict-consume
//! check fails, the error "latches": every later call on the same `MsgBuf` is
//! a no-op that returns the same error, so a caller can chain a long sequence
//! of `extract`/`insert` calls and check the outcome once at the end with
//! [`MsgBuf::complete`] or [`MsgBuf::complete_consumed`].

use crate::error::PldmError;

enum Storage<'a> {
    Read(&'a [u8]),
    Write(&'a mut [u8]),
}

impl Storage<'_> {
    fn len(&self) -> usize {
        match self {
            Storage::Read(b) => b.len(),
            Storage::Write(b) => b.len(),
        }
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Read(b) => b,
            Storage::Write(b) => b,
        }
    }
}

/// A little-endian scalar that can be extracted/inserted by [`MsgBuf`].
///
/// Width is fixed by the type alone, never by buffer contents -- this is
/// what lets a caller place `extract`/`insert` calls inside a branch that
/// depends on a tag read earlier without the buffer's layout becoming
/// data-dependent.
pub trait WireScalar: Copy + Sized {
    const SIZE: usize;
    fn from_le_bytes(bytes: &[u8]) -> Self;
    fn write_le_bytes(self, out: &mut [u8]);
}

macro_rules! impl_wire_scalar {
    ($ty:ty, $size:expr) => {
        impl WireScalar for $ty {
            const SIZE: usize = $size;
            fn from_le_bytes(bytes: &[u8]) -> Self {
                let mut arr = [0u8; $size];
                arr.copy_from_slice(bytes);
                <$ty>::from_le_bytes(arr)
            }
            fn write_le_bytes(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_wire_scalar!(u8, 1);
impl_wire_scalar!(i8, 1);
impl_wire_scalar!(u16, 2);
impl_wire_scalar!(i16, 2);
impl_wire_scalar!(u32, 4);
impl_wire_scalar!(i32, 4);
impl_wire_scalar!(u64, 8);
impl_wire_scalar!(i64, 8);
impl_wire_scalar!(f32, 4);

pub struct MsgBuf<'a> {
    storage: Storage<'a>,
    cursor: usize,
    sticky_error: Option<PldmError>,
}

impl<'a> MsgBuf<'a> {
    /// Construct a read-only cursor over `buf`, requiring at least
    /// `min_required` bytes to be present.
    pub fn new_read(buf: &'a [u8], min_required: usize) -> Result<Self, PldmError> {
        if min_required > buf.len() {
            return Err(PldmError::Overflow);
        }
        Ok(Self {
            storage: Storage::Read(buf),
            cursor: 0,
            sticky_error: None,
        })
    }

    /// Construct a read/write cursor over `buf`, requiring at least
    /// `min_required` bytes of capacity.
    pub fn new_write(buf: &'a mut [u8], min_required: usize) -> Result<Self, PldmError> {
        if min_required > buf.len() {
            return Err(PldmError::Overflow);
        }
        Ok(Self {
            storage: Storage::Write(buf),
            cursor: 0,
            sticky_error: None,
        })
    }

    fn fail<T>(&mut self, err: PldmError) -> Result<T, PldmError> {
        self.sticky_error = Some(err);
        Err(err)
    }

    fn check(&self) -> Result<(), PldmError> {
        match self.sticky_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Bytes left between the cursor and the end of the span.
    pub fn remaining(&self) -> usize {
        self.storage.len().saturating_sub(self.cursor)
    }

    /// Bytes consumed (read cursors) or written (write cursors) so far.
    /// Used by callers that need to know an entry's on-wire length after
    /// decoding it, e.g. the BIOS table iterator.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Extract a fixed-width little-endian scalar, advancing the cursor.
    pub fn extract<T: WireScalar>(&mut self) -> Result<T, PldmError> {
        self.check()?;
        if self.remaining() < T::SIZE {
            return self.fail(PldmError::Overflow);
        }
        let start = self.cursor;
        let value = T::from_le_bytes(&self.storage.as_slice()[start..start + T::SIZE]);
        self.cursor += T::SIZE;
        Ok(value)
    }

    /// Insert a fixed-width little-endian scalar, advancing the cursor.
    pub fn insert<T: WireScalar>(&mut self, value: T) -> Result<(), PldmError> {
        self.check()?;
        if self.remaining() < T::SIZE {
            return self.fail(PldmError::Overflow);
        }
        let start = self.cursor;
        match &mut self.storage {
            Storage::Write(buf) => value.write_le_bytes(&mut buf[start..start + T::SIZE]),
            Storage::Read(_) => return self.fail(PldmError::InternalError),
        }
        self.cursor += T::SIZE;
        Ok(())
    }

    /// Copy `dst.len()` bytes from the cursor into `dst`.
    pub fn extract_array(&mut self, dst: &mut [u8]) -> Result<(), PldmError> {
        self.check()?;
        if self.remaining() < dst.len() {
            return self.fail(PldmError::Overflow);
        }
        let start = self.cursor;
        dst.copy_from_slice(&self.storage.as_slice()[start..start + dst.len()]);
        self.cursor += dst.len();
        Ok(())
    }

    /// Copy `src` into the cursor.
    pub fn insert_array(&mut self, src: &[u8]) -> Result<(), PldmError> {
        self.check()?;
        if self.remaining() < src.len() {
            return self.fail(PldmError::Overflow);
        }
        let start = self.cursor;
        match &mut self.storage {
            Storage::Write(buf) => buf[start..start + src.len()].copy_from_slice(src),
            Storage::Read(_) => return self.fail(PldmError::InternalError),
        }
        self.cursor += src.len();
        Ok(())
    }

    /// Borrow `len` bytes from the cursor without copying, advancing past
    /// them. The returned slice is only valid for the duration of this
    /// borrow of the `MsgBuf`.
    pub fn span_required(&mut self, len: usize) -> Result<&[u8], PldmError> {
        self.check()?;
        if self.remaining() < len {
            self.sticky_error = Some(PldmError::Overflow);
            return Err(PldmError::Overflow);
        }
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.storage.as_slice()[start..start + len])
    }

    /// Borrow the remainder of the span, advancing the cursor to the end.
    pub fn span_remaining(&mut self) -> Result<&[u8], PldmError> {
        let len = self.remaining();
        self.span_required(len)
    }

    /// Borrow a NUL-terminated ASCII string (the returned slice excludes the
    /// terminator). Fails with `Overflow` if no NUL is found in the
    /// remaining span.
    pub fn span_string_ascii(&mut self) -> Result<&[u8], PldmError> {
        self.check()?;
        let start = self.cursor;
        let rest = &self.storage.as_slice()[start..];
        let nul = rest.iter().position(|&b| b == 0);
        match nul {
            Some(pos) => {
                self.cursor += pos + 1;
                Ok(&self.storage.as_slice()[start..start + pos])
            }
            None => self.fail(PldmError::Overflow),
        }
    }

    /// Borrow a `u16`-NUL-terminated UTF-16 string (little-endian code
    /// units). The returned slice is the raw bytes excluding the 2-byte
    /// terminator.
    pub fn span_string_utf16(&mut self) -> Result<&[u8], PldmError> {
        self.check()?;
        let start = self.cursor;
        let rest = &self.storage.as_slice()[start..];
        let mut i = 0;
        while i + 1 < rest.len() {
            if rest[i] == 0 && rest[i + 1] == 0 {
                self.cursor += i + 2;
                return Ok(&self.storage.as_slice()[start..start + i]);
            }
            i += 2;
        }
        self.fail(PldmError::Overflow)
    }

    /// Copy the next NUL-terminated ASCII string from `self` into `dst`,
    /// including the terminator, advancing both cursors.
    pub fn copy_string_ascii(&mut self, dst: &mut MsgBuf) -> Result<usize, PldmError> {
        let s = self.span_string_ascii()?;
        let len = s.len();
        // Re-borrow is required because `s` aliases `self.storage`; copy out
        // before touching `dst`.
        let mut tmp = [0u8; 256];
        if len > tmp.len() {
            return Err(PldmError::OutOfMemory);
        }
        tmp[..len].copy_from_slice(s);
        dst.insert_array(&tmp[..len])?;
        dst.insert::<u8>(0)?;
        Ok(len + 1)
    }

    /// Copy the next `u16`-NUL-terminated UTF-16 string from `self` into
    /// `dst`, including the terminator, advancing both cursors.
    pub fn copy_string_utf16(&mut self, dst: &mut MsgBuf) -> Result<usize, PldmError> {
        let s = self.span_string_utf16()?;
        let len = s.len();
        let mut tmp = [0u8; 256];
        if len > tmp.len() {
            return Err(PldmError::OutOfMemory);
        }
        tmp[..len].copy_from_slice(s);
        dst.insert_array(&tmp[..len])?;
        dst.insert::<u16>(0)?;
        Ok(len + 2)
    }

    /// Finish the cursor. Leftover unconsumed bytes are permitted.
    pub fn complete(self) -> Result<(), PldmError> {
        self.sticky_error.map_or(Ok(()), Err)
    }

    /// Finish the cursor, requiring every byte of the span to have been
    /// consumed.
    pub fn complete_consumed(self) -> Result<(), PldmError> {
        if let Some(e) = self.sticky_error {
            return Err(e);
        }
        if self.remaining() != 0 {
            return Err(PldmError::BadMsg);
        }
        Ok(())
    }

    /// Finish a write cursor, reporting the number of bytes written and
    /// checking it does not exceed the caller's declared buffer capacity.
    pub fn complete_used(self, buf_cap: usize) -> Result<usize, PldmError> {
        if let Some(e) = self.sticky_error {
            return Err(e);
        }
        if self.cursor > buf_cap {
            return Err(PldmError::Overflow);
        }
        Ok(self.cursor)
    }

    /// Force the sticky error and drop the cursor. Used on error exit paths
    /// so every `MsgBuf` is seen to terminate through one of the `complete*`
    /// family or this method.
    pub fn discard(mut self, err: PldmError) {
        self.sticky_error = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_scalars() {
        let mut buf = [0u8; 16];
        {
            let mut mb = MsgBuf::new_write(&mut buf, 16).unwrap();
            mb.insert::<u8>(0x11).unwrap();
            mb.insert::<u16>(0x2233).unwrap();
            mb.insert::<u32>(0x4455_6677).unwrap();
            mb.insert::<f32>(1.5).unwrap();
            mb.complete_used(16).unwrap();
        }
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        assert_eq!(mb.extract::<u8>().unwrap(), 0x11);
        assert_eq!(mb.extract::<u16>().unwrap(), 0x2233);
        assert_eq!(mb.extract::<u32>().unwrap(), 0x4455_6677);
        assert_eq!(mb.extract::<f32>().unwrap(), 1.5);
        mb.complete().unwrap();
    }

    #[test]
    fn sticky_error_latches() {
        let buf = [0u8; 1];
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        assert_eq!(mb.extract::<u32>(), Err(PldmError::Overflow));
        // Further operations are no-ops returning the same latched error.
        assert_eq!(mb.extract::<u8>(), Err(PldmError::Overflow));
        assert_eq!(mb.complete(), Err(PldmError::Overflow));
    }

    #[test]
    fn complete_consumed_requires_full_consumption() {
        let buf = [1u8, 2, 3];
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        let _ = mb.extract::<u8>().unwrap();
        assert_eq!(mb.complete_consumed(), Err(PldmError::BadMsg));
    }

    #[test]
    fn complete_allows_leftover() {
        let buf = [1u8, 2, 3];
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        let _ = mb.extract::<u8>().unwrap();
        assert_eq!(mb.complete(), Ok(()));
    }

    #[test]
    fn span_required_never_escapes_bounds() {
        let buf = [1u8, 2, 3, 4];
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        assert_eq!(mb.span_required(3).unwrap(), &[1, 2, 3]);
        assert_eq!(mb.span_required(2), Err(PldmError::Overflow));
    }

    #[test]
    fn ascii_string_span() {
        let buf = *b"hello\0world";
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        assert_eq!(mb.span_string_ascii().unwrap(), b"hello");
        assert_eq!(mb.remaining(), 5);
    }

    #[test]
    fn ascii_string_missing_terminator_overflows() {
        let buf = *b"hello";
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        assert_eq!(mb.span_string_ascii(), Err(PldmError::Overflow));
    }

    #[test]
    fn utf16_string_span() {
        let buf = [b'a', 0, b'b', 0, 0, 0, 0xFF];
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        assert_eq!(mb.span_string_utf16().unwrap(), &[b'a', 0, b'b', 0]);
        assert_eq!(mb.remaining(), 1);
    }

    #[test]
    fn write_on_read_only_fails() {
        let buf = [0u8; 4];
        let mut mb = MsgBuf::new_read(&buf, 0).unwrap();
        assert_eq!(mb.insert::<u8>(1), Err(PldmError::InternalError));
    }

    #[test]
    fn init_rejects_insufficient_length() {
        let buf = [0u8; 2];
        assert_eq!(
            MsgBuf::new_read(&buf, 3).unwrap_err(),
            PldmError::Overflow
        );
    }
}
