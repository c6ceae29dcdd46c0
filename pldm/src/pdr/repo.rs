// Licensed under the Apache-2.0 license

//! PDR repository (C7): a fixed-capacity store of opaque, variable-length
//! PDR records indexed by record handle, FRU record set identifier, and
//! PDR type.
//!
//! The reference keeps records in a heap-allocated linked list; this
//! crate has no allocator, so the repository is instead a fixed-size
//! array of slots with tombstones. "Next" and "previous" in the
//! reference's sense become "next/previous populated slot by array
//! position" here, which preserves the same append-order semantics
//! without needing real pointers.

use crate::error::PldmError;
use crate::message::platform::sensor::PdrCommonHeader;
use crate::msgbuf::MsgBuf;

/// Largest single PDR record this repository can hold. Generous enough
/// for any of the fixed-layout PDRs in DSP0248; callers building large
/// entity-association PDRs should check `data.len()` against this before
/// calling [`PdrRepo::add`].
pub const PDR_MAX_RECORD_LEN: usize = 256;

#[derive(Clone, Copy)]
pub struct PdrRecord<const CAP: usize = PDR_MAX_RECORD_LEN> {
    pub record_handle: u32,
    pub pdr_type: u8,
    pub terminus_handle: u16,
    pub is_remote: bool,
    data: [u8; CAP],
    data_len: usize,
}

impl<const CAP: usize> PdrRecord<CAP> {
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data_len]
    }

    pub fn size(&self) -> usize {
        self.data_len
    }
}

/// A fixed-capacity PDR repository holding up to `N` records of at most
/// `CAP` bytes each.
pub struct PdrRepo<const N: usize, const CAP: usize = PDR_MAX_RECORD_LEN> {
    records: [Option<PdrRecord<CAP>>; N],
}

impl<const N: usize, const CAP: usize> Default for PdrRepo<N, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const CAP: usize> PdrRepo<N, CAP> {
    pub fn new() -> Self {
        Self { records: [None; N] }
    }

    pub fn record_count(&self) -> u32 {
        self.records.iter().flatten().count() as u32
    }

    pub fn repo_size(&self) -> u32 {
        self.records.iter().flatten().map(|r| r.data_len as u32).sum()
    }

    /// The highest handle currently in use, by value -- not by array slot
    /// position. `remove_by_handle` leaves holes without renumbering, and
    /// `add` reuses the first free slot, so the record with the largest
    /// handle need not sit in the last populated slot; scanning slots in
    /// reverse can otherwise hand out a handle that's already in use
    /// further up the array.
    fn last_handle(&self) -> u32 {
        self.records
            .iter()
            .flatten()
            .map(|r| r.record_handle)
            .max()
            .unwrap_or(0)
    }

    /// Appends a new record. If `*record_handle == 0` the next handle is
    /// `last.record_handle + 1` (or 1 for an empty repo); otherwise the
    /// caller's explicit handle is used verbatim and is responsible for
    /// its own uniqueness. When the repo computes the handle, the
    /// record's own header (first 4 bytes, little-endian) is rewritten
    /// to match so the outer handle and the record body never disagree.
    pub fn add(
        &mut self,
        pdr_type: u8,
        terminus_handle: u16,
        is_remote: bool,
        data: &[u8],
        record_handle: &mut u32,
    ) -> Result<(), PldmError> {
        if data.len() > CAP {
            return Err(PldmError::InvalidLength);
        }
        let slot = self
            .records
            .iter()
            .position(|r| r.is_none())
            .ok_or(PldmError::OutOfMemory)?;

        let computed = *record_handle == 0;
        let handle = if computed {
            let last = self.last_handle();
            if last == u32::MAX {
                return Err(PldmError::Overflow);
            }
            if last == 0 {
                1
            } else {
                last + 1
            }
        } else {
            *record_handle
        };

        let mut buf = [0u8; CAP];
        buf[..data.len()].copy_from_slice(data);
        if computed && data.len() >= 4 {
            buf[0..4].copy_from_slice(&handle.to_le_bytes());
        }

        self.records[slot] = Some(PdrRecord {
            record_handle: handle,
            pdr_type,
            terminus_handle,
            is_remote,
            data: buf,
            data_len: data.len(),
        });
        *record_handle = handle;
        Ok(())
    }

    pub fn find_by_handle(&self, handle: u32) -> Option<&PdrRecord<CAP>> {
        self.records
            .iter()
            .flatten()
            .find(|r| r.record_handle == handle)
    }

    /// Returns the first record of `pdr_type` whose handle is strictly
    /// greater than `after_handle` (pass 0 to start from the beginning).
    pub fn find_by_type(&self, pdr_type: u8, after_handle: u32) -> Option<&PdrRecord<CAP>> {
        self.records
            .iter()
            .flatten()
            .filter(|r| r.pdr_type == pdr_type && r.record_handle > after_handle)
            .min_by_key(|r| r.record_handle)
    }

    pub fn find_by_terminus(&self, terminus_handle: u16, after_handle: u32) -> Option<&PdrRecord<CAP>> {
        self.records
            .iter()
            .flatten()
            .filter(|r| r.terminus_handle == terminus_handle && r.record_handle > after_handle)
            .min_by_key(|r| r.record_handle)
    }

    /// FRU record set PDRs (DSP0248 Table 24) begin, after the common
    /// header, with `{terminus_handle:u16, fru_rsi:u16, ...}`.
    pub fn find_fru_record_set_by_rsi(&self, rsi: u16) -> Result<Option<&PdrRecord<CAP>>, PldmError> {
        for record in self.records.iter().flatten() {
            if record.pdr_type != crate::protocol::platform::PdrType::FruRecordSetPdr as u8 {
                continue;
            }
            let hdr_len = core::mem::size_of::<PdrCommonHeader>();
            if record.data_len < hdr_len + 4 {
                continue;
            }
            let mut msg = MsgBuf::new_read(&record.data()[hdr_len..], 4)?;
            let _terminus_handle: u16 = msg.extract()?;
            let record_rsi: u16 = msg.extract()?;
            if record_rsi == rsi {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Removes one record by handle, leaving every other handle
    /// unchanged (no renumbering).
    pub fn remove_by_handle(&mut self, handle: u32) -> Result<(), PldmError> {
        let slot = self
            .records
            .iter()
            .position(|r| matches!(r, Some(rec) if rec.record_handle == handle))
            .ok_or(PldmError::NotFound)?;
        self.records[slot] = None;
        Ok(())
    }

    /// Removes every record belonging to `terminus_handle`, then
    /// renumbers the survivors `1..=N` in their current relative order
    /// so the repo stays gap-free.
    pub fn remove_by_terminus_handle(&mut self, terminus_handle: u16) {
        for slot in self.records.iter_mut() {
            if matches!(slot, Some(r) if r.terminus_handle == terminus_handle) {
                *slot = None;
            }
        }
        self.renumber();
    }

    /// Removes every remote record, then renumbers the survivors.
    pub fn remove_remote_pdrs(&mut self) {
        for slot in self.records.iter_mut() {
            if matches!(slot, Some(r) if r.is_remote) {
                *slot = None;
            }
        }
        self.renumber();
    }

    fn renumber(&mut self) {
        let mut next = 1u32;
        for slot in self.records.iter_mut() {
            if let Some(record) = slot {
                record.record_handle = next;
                if record.data_len >= 4 {
                    record.data[0..4].copy_from_slice(&next.to_le_bytes());
                }
                next += 1;
            }
        }
    }

    /// Replaces the body of the record at `handle`, keeping its slot,
    /// handle, and metadata (`pdr_type`, `terminus_handle`, `is_remote`)
    /// unchanged. Records are fixed-capacity byte buffers, so editing one
    /// in place is never possible; every mutation -- entity-association
    /// child add/remove included -- builds a whole new body and splices it
    /// in at the same position via this method.
    pub fn replace_record_data(&mut self, handle: u32, data: &[u8]) -> Result<(), PldmError> {
        if data.len() > CAP {
            return Err(PldmError::InvalidLength);
        }
        let slot = self
            .records
            .iter()
            .position(|r| matches!(r, Some(rec) if rec.record_handle == handle))
            .ok_or(PldmError::NotFound)?;

        let (pdr_type, terminus_handle, is_remote) = {
            let record = self.records[slot].as_ref().unwrap();
            (record.pdr_type, record.terminus_handle, record.is_remote)
        };

        let mut buf = [0u8; CAP];
        buf[..data.len()].copy_from_slice(data);
        self.records[slot] = Some(PdrRecord {
            record_handle: handle,
            pdr_type,
            terminus_handle,
            is_remote,
            data: buf,
            data_len: data.len(),
        });
        Ok(())
    }

    pub fn find_fru_record_set_by_rsi_and_remove(&mut self, rsi: u16) -> Result<(), PldmError> {
        let handle = self
            .find_fru_record_set_by_rsi(rsi)?
            .map(|r| r.record_handle)
            .ok_or(PldmError::NotFound)?;
        self.remove_by_handle(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PdrRecord<CAP>> {
        self.records.iter().flatten()
    }
}
