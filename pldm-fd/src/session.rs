// Licensed under the Apache-2.0 license

use pldm::message::firmware_update::get_status::GetStatusReasonCode;
use pldm::protocol::firmware_update::{FirmwareDeviceState, UpdateOptionFlags};
use pldm::util::fw_component::FirmwareComponent;

use crate::config::{FD_MAX_XFER_SIZE, DEFAULT_FD_T1_TIMEOUT_MS, DEFAULT_FD_T2_RETRY_TIME_MS};

/// State of an FD-initiated request (`RequestFirmwareData`,
/// `TransferComplete`, `VerifyComplete`, `ApplyComplete`) awaiting a UA
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdReqState {
    /// No FD-initiated request outstanding or pending.
    Unused,
    /// Ready to send the next request.
    Ready,
    /// Sent, awaiting the UA's response.
    Sent,
    /// Retries exhausted; the update will fail.
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct FdReq {
    pub state: FdReqState,
    pub instance_id: Option<u8>,
    pub command: Option<u8>,
    pub sent_time_ms: Option<u64>,
    pub retries: u8,
}

impl Default for FdReq {
    fn default() -> Self {
        Self {
            state: FdReqState::Unused,
            instance_id: None,
            command: None,
            sent_time_ms: None,
            retries: 0,
        }
    }
}

/// Offset into the component image this device has downloaded so far.
/// Tracked separately from verify/apply progress, which is a simple
/// percent the ops layer reports back each poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadProgress {
    pub offset: u32,
}

/// Sequential (single-threaded) equivalent of the reference's
/// mutex-guarded FD internal state. No locking is needed: the state
/// machine in [`crate::fd::FirmwareDevice`] only ever runs on the one
/// thread that drives its request/response loop.
pub struct FdSession {
    pub state: FirmwareDeviceState,
    pub prev_state: FirmwareDeviceState,
    pub idle_reason: Option<GetStatusReasonCode>,
    pub update_comp: FirmwareComponent,
    pub update_flags: UpdateOptionFlags,
    pub max_xfer_size: u32,
    pub req: FdReq,
    pub download: DownloadProgress,
    pub verify_percent: u8,
    pub apply_percent: u8,
    pub fd_t1_update_ts_ms: u64,
    pub fd_t1_timeout_ms: u64,
    pub fd_t2_retry_time_ms: u64,
}

impl Default for FdSession {
    fn default() -> Self {
        Self::new(
            FD_MAX_XFER_SIZE as u32,
            DEFAULT_FD_T1_TIMEOUT_MS,
            DEFAULT_FD_T2_RETRY_TIME_MS,
        )
    }
}

impl FdSession {
    pub fn new(max_xfer_size: u32, fd_t1_timeout_ms: u64, fd_t2_retry_time_ms: u64) -> Self {
        Self {
            state: FirmwareDeviceState::Idle,
            prev_state: FirmwareDeviceState::Idle,
            idle_reason: None,
            update_comp: FirmwareComponent::default(),
            update_flags: UpdateOptionFlags(0),
            max_xfer_size,
            req: FdReq::default(),
            download: DownloadProgress::default(),
            verify_percent: 0,
            apply_percent: 0,
            fd_t1_update_ts_ms: 0,
            fd_t1_timeout_ms,
            fd_t2_retry_time_ms,
        }
    }

    pub fn is_update_mode(&self) -> bool {
        self.state != FirmwareDeviceState::Idle
    }

    pub fn set_fd_state(&mut self, state: FirmwareDeviceState) {
        if self.state != state {
            self.prev_state = self.state;
            self.state = state;
        }
    }

    /// Reverts to `Idle`, recording why (DSP0267 Table 20's
    /// `GetStatus` reason codes) for the next `GetStatus` response.
    pub fn abort_to_idle(&mut self, reason: GetStatusReasonCode) {
        self.set_fd_state(FirmwareDeviceState::Idle);
        self.idle_reason = Some(reason);
        self.req = FdReq::default();
        self.download = DownloadProgress::default();
        self.verify_percent = 0;
        self.apply_percent = 0;
    }

    pub fn touch_t1(&mut self, now_ms: u64) {
        self.fd_t1_update_ts_ms = now_ms;
    }

    /// True when the UA has gone silent longer than `FD T1` while an
    /// update is in progress.
    pub fn t1_expired(&self, now_ms: u64) -> bool {
        self.is_update_mode() && pldm::util::clock::has_elapsed(
            now_ms,
            self.fd_t1_update_ts_ms + self.fd_t1_timeout_ms,
        )
    }
}
