// Licensed under the Apache-2.0 license

//! The Firmware Device state machine (DSP0267 §9, Figure 10). Each
//! `*_rsp` method decodes one UA-initiated request, applies the state
//! machine's transition rules, calls out to [`crate::ops::FdOps`] for
//! anything platform-specific, and encodes the response in place.
//!
//! `poll` drives the FD-initiated side: once in `Download`/`Verify`/
//! `Apply`, it is responsible for emitting the next
//! `RequestFirmwareData`/`VerifyComplete`/`ApplyComplete` request and
//! for reverting to `Idle` if `FD T1` expires.

use zerocopy::FromBytes;

use pldm::codec::PldmCodec;
use pldm::message::firmware_update::activate_fw::{ActivateFirmwareRequest, ActivateFirmwareResponse};
use pldm::message::firmware_update::apply_complete::{
    ApplyCompleteRequest, ApplyCompleteResponse, ApplyResult,
};
use pldm::message::firmware_update::get_fw_params::{
    FirmwareParameters, GetFirmwareParametersRequest, GetFirmwareParametersResponse,
};
use pldm::message::firmware_update::get_status::{
    AuxState, AuxStateStatus, GetStatusReasonCode, GetStatusRequest, GetStatusResponse,
    ProgressPercent, UpdateOptionResp, PROGRESS_PERCENT_NOT_SUPPORTED,
};
use pldm::message::firmware_update::pass_component::{
    PassComponentTableRequest, PassComponentTableResponse,
};
use pldm::message::firmware_update::query_devid::{
    QueryDeviceIdentifiersRequest, QueryDeviceIdentifiersResponse, ADDITIONAL_DESCRIPTORS_MAX_COUNT,
};
use pldm::message::firmware_update::request_cancel::{
    CancelUpdateComponentRequest, CancelUpdateComponentResponse, CancelUpdateRequest,
    CancelUpdateResponse, NonFunctioningComponentBitmap, NonFunctioningComponentIndication,
};
use pldm::message::firmware_update::request_fw_data::{
    RequestFirmwareDataRequest, RequestFirmwareDataResponseFixed,
};
use pldm::message::firmware_update::request_update::{RequestUpdateRequest, RequestUpdateResponse};
use pldm::message::firmware_update::update_component::{UpdateComponentRequest, UpdateComponentResponse};
use pldm::message::firmware_update::verify_complete::{VerifyCompleteRequest, VerifyCompleteResponse, VerifyResult};
use pldm::protocol::base::{
    InstanceId, PldmBaseCompletionCode, PldmFailureResponse, PldmMsgType, PldmSupportedType,
    TransferRespFlag,
};
use pldm::protocol::firmware_update::{
    ComponentActivationMethods, ComponentCompatibilityResponse, ComponentCompatibilityResponseCode,
    ComponentResponse, ComponentResponseCode, Descriptor, FirmwareDeviceState, FwUpdateCmd,
    FwUpdateCompletionCode, PldmFirmwareString, UpdateOptionFlags, PLDM_FWUP_BASELINE_TRANSFER_SIZE,
};
use pldm::util::fw_component::FirmwareComponent;

use crate::error::MsgHandlerError;
use crate::ops::{ComponentOperation, FdOps};
use crate::session::{FdReqState, FdSession};

const MAX_DESCRIPTORS_COUNT: usize = 1 + ADDITIONAL_DESCRIPTORS_MAX_COUNT;

fn write_failure_response(
    payload: &mut [u8],
    instance_id: InstanceId,
    cmd_code: u8,
    completion_code: u8,
) -> Result<usize, MsgHandlerError> {
    let resp = PldmFailureResponse::new(instance_id, PldmSupportedType::FwUpdate, cmd_code, completion_code)?;
    resp.encode(payload).map_err(MsgHandlerError::from)
}

/// Drives the FD side of a DSP0267 update. One instance per managed
/// terminus; `O` supplies the platform-specific operations and the clock.
pub struct FirmwareDevice<O: FdOps> {
    ops: O,
    session: FdSession,
}

impl<O: FdOps> FirmwareDevice<O> {
    pub fn new(ops: O) -> Self {
        Self {
            ops,
            session: FdSession::default(),
        }
    }

    pub fn state(&self) -> FirmwareDeviceState {
        self.session.state
    }

    fn touch_t1(&mut self) {
        let now = self.ops.now_ms();
        self.session.touch_t1(now);
    }

    pub fn query_devid_rsp(&mut self, payload: &mut [u8]) -> Result<usize, MsgHandlerError> {
        let req = QueryDeviceIdentifiersRequest::decode(payload)?;

        let mut device_identifiers = [Descriptor::default(); MAX_DESCRIPTORS_COUNT];
        let descriptor_cnt = self.ops.get_device_identifiers(&mut device_identifiers)?;

        let resp = QueryDeviceIdentifiersResponse::new(
            req.hdr.instance_id(),
            PldmBaseCompletionCode::Success as u8,
            &device_identifiers[0],
            device_identifiers.get(1..descriptor_cnt),
        )?;

        resp.encode(payload).or_else(|_| {
            write_failure_response(
                payload,
                req.hdr.instance_id(),
                FwUpdateCmd::QueryDeviceIdentifiers as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            )
        })
    }

    pub fn get_firmware_parameters_rsp(
        &mut self,
        payload: &mut [u8],
    ) -> Result<usize, MsgHandlerError> {
        let req = GetFirmwareParametersRequest::decode(payload)?;

        let mut firmware_params = FirmwareParameters::default();
        self.ops.get_firmware_parms(&mut firmware_params)?;

        let resp = GetFirmwareParametersResponse::new(
            req.hdr.instance_id(),
            PldmBaseCompletionCode::Success as u8,
            &firmware_params,
        )?;

        resp.encode(payload).or_else(|_| {
            write_failure_response(
                payload,
                req.hdr.instance_id(),
                FwUpdateCmd::GetFirmwareParameters as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            )
        })
    }

    pub fn request_update_rsp(&mut self, payload: &mut [u8]) -> Result<usize, MsgHandlerError> {
        let req = RequestUpdateRequest::decode(payload)?;
        let instance_id = req.fixed.hdr.instance_id();

        if self.session.is_update_mode() {
            return write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::RequestUpdate as u8,
                FwUpdateCompletionCode::AlreadyInUpdateMode as u8,
            );
        }

        let ua_transfer_size = req.fixed.max_transfer_size as usize;
        if ua_transfer_size < PLDM_FWUP_BASELINE_TRANSFER_SIZE {
            return write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::RequestUpdate as u8,
                FwUpdateCompletionCode::InvalidTransferLength as u8,
            );
        }

        self.touch_t1();
        let fd_transfer_size = self.ops.get_xfer_size(ua_transfer_size);
        self.session.max_xfer_size = fd_transfer_size as u32;

        let resp = RequestUpdateResponse::new(instance_id, PldmBaseCompletionCode::Success as u8, 0, 0, None)?;

        match resp.encode(payload) {
            Ok(bytes) => {
                self.session.set_fd_state(FirmwareDeviceState::LearnComponents);
                Ok(bytes)
            }
            Err(_) => write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::RequestUpdate as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            ),
        }
    }

    pub fn pass_component_rsp(&mut self, payload: &mut [u8]) -> Result<usize, MsgHandlerError> {
        let req = PassComponentTableRequest::decode(payload)?;
        let instance_id = req.fixed.hdr.instance_id();

        if self.session.state != FirmwareDeviceState::LearnComponents {
            return write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::PassComponentTable as u8,
                FwUpdateCompletionCode::InvalidStateForCommand as u8,
            );
        }
        self.touch_t1();

        let transfer_flag = TransferRespFlag::try_from(req.fixed.transfer_flag)?;

        let pass_comp = FirmwareComponent::new(
            req.fixed.comp_classification,
            req.fixed.comp_identifier,
            req.fixed.comp_classification_index,
            req.fixed.comp_comparison_stamp,
            PldmFirmwareString {
                str_type: req.fixed.comp_ver_str_type,
                str_len: req.fixed.comp_ver_str_len,
                str_data: req.comp_ver_str,
            },
            None,
            None,
        );

        let mut firmware_params = FirmwareParameters::default();
        self.ops.get_firmware_parms(&mut firmware_params)?;

        let comp_resp_code =
            self.ops
                .handle_component(&pass_comp, &firmware_params, ComponentOperation::PassComponent)?;

        let resp = PassComponentTableResponse::new(
            instance_id,
            PldmBaseCompletionCode::Success as u8,
            if matches!(comp_resp_code, ComponentResponseCode::CompCanBeUpdated) {
                ComponentResponse::CompCanBeUpdated
            } else {
                ComponentResponse::CompCannotBeUpdated
            },
            comp_resp_code,
        )?;

        match resp.encode(payload) {
            Ok(bytes) => {
                if matches!(transfer_flag, TransferRespFlag::End | TransferRespFlag::StartAndEnd) {
                    self.session.set_fd_state(FirmwareDeviceState::ReadyXfer);
                }
                Ok(bytes)
            }
            Err(_) => write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::PassComponentTable as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            ),
        }
    }

    pub fn update_component_rsp(&mut self, payload: &mut [u8]) -> Result<usize, MsgHandlerError> {
        let req = UpdateComponentRequest::decode(payload)?;
        let instance_id = req.fixed.hdr.instance_id();

        if self.session.state != FirmwareDeviceState::ReadyXfer {
            return write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::UpdateComponent as u8,
                FwUpdateCompletionCode::InvalidStateForCommand as u8,
            );
        }
        self.touch_t1();

        let update_comp = FirmwareComponent::new(
            req.fixed.comp_classification,
            req.fixed.comp_identifier,
            req.fixed.comp_classification_index,
            req.fixed.comp_comparison_stamp,
            PldmFirmwareString {
                str_type: req.fixed.comp_ver_str_type,
                str_len: req.fixed.comp_ver_str_len,
                str_data: req.comp_ver_str,
            },
            Some(req.fixed.comp_image_size),
            Some(UpdateOptionFlags(req.fixed.update_option_flags)),
        );
        self.session.update_comp = update_comp.clone();
        self.session.update_flags = UpdateOptionFlags(req.fixed.update_option_flags);

        let mut firmware_params = FirmwareParameters::default();
        self.ops.get_firmware_parms(&mut firmware_params)?;

        let comp_resp_code = self.ops.handle_component(
            &update_comp,
            &firmware_params,
            ComponentOperation::UpdateComponent,
        )?;
        let can_update = matches!(comp_resp_code, ComponentResponseCode::CompCanBeUpdated);

        let resp = UpdateComponentResponse::new(
            instance_id,
            PldmBaseCompletionCode::Success as u8,
            if can_update {
                ComponentCompatibilityResponse::CompCanBeUpdated
            } else {
                ComponentCompatibilityResponse::CompCannotBeUpdated
            },
            ComponentCompatibilityResponseCode::try_from(comp_resp_code as u8)
                .unwrap_or(ComponentCompatibilityResponseCode::NoResponseCode),
            UpdateOptionFlags(req.fixed.update_option_flags),
            0,
            None,
        )?;

        match resp.encode(payload) {
            Ok(bytes) => {
                if can_update {
                    self.session.req.state = FdReqState::Ready;
                    self.session.download.offset = 0;
                    self.session.set_fd_state(FirmwareDeviceState::Download);
                }
                Ok(bytes)
            }
            Err(_) => write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::UpdateComponent as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            ),
        }
    }

    pub fn get_status_rsp(&mut self, payload: &mut [u8]) -> Result<usize, MsgHandlerError> {
        let req = GetStatusRequest::decode(payload)?;

        let reason = self.session.idle_reason.unwrap_or(GetStatusReasonCode::Initialization);
        let progress = match self.session.state {
            FirmwareDeviceState::Verify => self.session.verify_percent,
            FirmwareDeviceState::Apply => self.session.apply_percent,
            _ => PROGRESS_PERCENT_NOT_SUPPORTED,
        };

        let resp = GetStatusResponse::new(
            req.hdr.instance_id(),
            PldmBaseCompletionCode::Success as u8,
            self.session.state,
            self.session.prev_state,
            AuxState::OperationInProgress,
            AuxStateStatus::AuxStateInProgressOrSuccess as u8,
            ProgressPercent::new(progress).unwrap_or_default(),
            reason,
            if self.session.update_flags.request_force_update() {
                UpdateOptionResp::ForceUpdate
            } else {
                UpdateOptionResp::NoForceUpdate
            },
        )?;

        resp.encode(payload).or_else(|_| {
            write_failure_response(
                payload,
                req.hdr.instance_id(),
                FwUpdateCmd::GetStatus as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            )
        })
    }

    pub fn cancel_update_component_rsp(
        &mut self,
        payload: &mut [u8],
    ) -> Result<usize, MsgHandlerError> {
        let req = CancelUpdateComponentRequest::decode(payload)?;
        self.ops.cancel();
        self.session.set_fd_state(FirmwareDeviceState::ReadyXfer);
        let resp = CancelUpdateComponentResponse::new(
            req.hdr.instance_id(),
            PldmBaseCompletionCode::Success as u8,
        )?;
        resp.encode(payload).or_else(|_| {
            write_failure_response(
                payload,
                req.hdr.instance_id(),
                FwUpdateCmd::CancelUpdateComponent as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            )
        })
    }

    pub fn cancel_update_rsp(&mut self, payload: &mut [u8]) -> Result<usize, MsgHandlerError> {
        let req = CancelUpdateRequest::decode(payload)?;
        self.ops.cancel();
        self.session.abort_to_idle(GetStatusReasonCode::CancelUpdate);
        let resp = CancelUpdateResponse::new(
            req.hdr.instance_id(),
            PldmBaseCompletionCode::Success as u8,
            NonFunctioningComponentIndication::ComponentsFunctioning,
            NonFunctioningComponentBitmap::new(0),
        )?;
        resp.encode(payload).or_else(|_| {
            write_failure_response(
                payload,
                req.hdr.instance_id(),
                FwUpdateCmd::CancelUpdate as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            )
        })
    }

    pub fn activate_firmware_rsp(&mut self, payload: &mut [u8]) -> Result<usize, MsgHandlerError> {
        let req = ActivateFirmwareRequest::decode(payload)?;
        let instance_id = req.hdr.instance_id();

        if self.session.state != FirmwareDeviceState::ReadyXfer {
            return write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::ActivateFirmware as u8,
                FwUpdateCompletionCode::InvalidStateForCommand as u8,
            );
        }

        let estimated_time = self.ops.activate(req.self_contained_activation_req != 0)?;

        let resp = ActivateFirmwareResponse::new(instance_id, PldmBaseCompletionCode::Success as u8, estimated_time)?;
        match resp.encode(payload) {
            Ok(bytes) => {
                self.session.set_fd_state(FirmwareDeviceState::Idle);
                Ok(bytes)
            }
            Err(_) => write_failure_response(
                payload,
                instance_id,
                FwUpdateCmd::ActivateFirmware as u8,
                PldmBaseCompletionCode::InvalidLength as u8,
            ),
        }
    }

    /// Advances the FD-initiated request/response cycle. Call this after
    /// every `*_rsp` handler and on a regular tick; it both emits the
    /// next outbound FD request and reverts to `Idle` when `FD T1`
    /// expires with no UA activity.
    ///
    /// Returns `Some(len)` with an encoded request to send in `out`, or
    /// `None` if there is nothing to send right now.
    pub fn poll(&mut self, out: &mut [u8]) -> Option<usize> {
        let now = self.ops.now_ms();

        if self.session.t1_expired(now) {
            let reason = match self.session.state {
                FirmwareDeviceState::LearnComponents => GetStatusReasonCode::LearnComponentTimeout,
                FirmwareDeviceState::ReadyXfer => GetStatusReasonCode::ReadyXferTimeout,
                FirmwareDeviceState::Download => GetStatusReasonCode::DownloadTimeout,
                FirmwareDeviceState::Verify => GetStatusReasonCode::VerifyTimeout,
                FirmwareDeviceState::Apply => GetStatusReasonCode::ApplyTimeout,
                _ => GetStatusReasonCode::ReadyXferTimeout,
            };
            self.ops.cancel();
            self.session.abort_to_idle(reason);
            return None;
        }

        if self.session.req.state != FdReqState::Ready {
            return None;
        }

        match self.session.state {
            FirmwareDeviceState::Download => self.emit_request_firmware_data(out, now),
            FirmwareDeviceState::Verify => self.emit_verify_step(out, now),
            FirmwareDeviceState::Apply => self.emit_apply_step(out, now),
            _ => None,
        }
    }

    fn emit_request_firmware_data(&mut self, out: &mut [u8], now: u64) -> Option<usize> {
        let offset = self.session.download.offset;
        let length = self.session.max_xfer_size;
        let req = RequestFirmwareDataRequest::new(1, PldmMsgType::Request, offset, length).ok()?;
        let len = req.encode(out).ok()?;
        self.session.req.state = FdReqState::Sent;
        self.session.req.command = Some(FwUpdateCmd::RequestFirmwareData as u8);
        self.session.req.sent_time_ms = Some(now);
        Some(len)
    }

    /// Processes the UA's response to an outstanding `RequestFirmwareData`.
    /// `RequestFirmwareDataResponse` has no generic `PldmCodec::decode`
    /// (the data length isn't self-describing), so the fixed prefix and
    /// trailing data are split out here instead.
    pub fn handle_request_firmware_data_response(
        &mut self,
        payload: &[u8],
    ) -> Result<(), MsgHandlerError> {
        let fixed_len = core::mem::size_of::<RequestFirmwareDataResponseFixed>();
        let fixed = RequestFirmwareDataResponseFixed::read_from_bytes(
            payload.get(..fixed_len).ok_or(MsgHandlerError::NotReady)?,
        )
        .map_err(|_| MsgHandlerError::NotReady)?;
        let data = &payload[fixed_len..];

        if fixed.completion_code != PldmBaseCompletionCode::Success as u8 {
            self.session.req.state = FdReqState::Failed;
            return Ok(());
        }
        self.ops.download_data(self.session.download.offset, data)?;
        self.session.download.offset += data.len() as u32;
        self.session.req.state = FdReqState::Ready;

        let total = self.session.update_comp.comp_image_size.unwrap_or(0);
        if self.session.download.offset >= total {
            self.session.set_fd_state(FirmwareDeviceState::Verify);
            self.session.verify_percent = 0;
        }
        Ok(())
    }

    fn emit_verify_step(&mut self, out: &mut [u8], now: u64) -> Option<usize> {
        let percent = self.ops.verify_step().ok()?;
        self.session.verify_percent = percent;
        if percent < 100 {
            self.session.req.state = FdReqState::Ready;
            return None;
        }
        let req = VerifyCompleteRequest::new(1, PldmMsgType::Request, VerifyResult::VerifySuccess).ok()?;
        let len = req.encode(out).ok()?;
        self.session.req.state = FdReqState::Sent;
        self.session.req.sent_time_ms = Some(now);
        Some(len)
    }

    pub fn handle_verify_complete_response(&mut self, payload: &[u8]) -> Result<(), MsgHandlerError> {
        let resp = VerifyCompleteResponse::decode(payload)?;
        if resp.completion_code != PldmBaseCompletionCode::Success as u8 {
            self.session.req.state = FdReqState::Failed;
            return Ok(());
        }
        self.session.set_fd_state(FirmwareDeviceState::Apply);
        self.session.apply_percent = 0;
        self.session.req.state = FdReqState::Ready;
        Ok(())
    }

    fn emit_apply_step(&mut self, out: &mut [u8], now: u64) -> Option<usize> {
        let percent = self.ops.apply_step().ok()?;
        self.session.apply_percent = percent;
        if percent < 100 {
            self.session.req.state = FdReqState::Ready;
            return None;
        }
        let req = ApplyCompleteRequest::new(
            1,
            PldmMsgType::Request,
            ApplyResult::ApplySuccess,
            ComponentActivationMethods(0),
        )
        .ok()?;
        let len = req.encode(out).ok()?;
        self.session.req.state = FdReqState::Sent;
        self.session.req.sent_time_ms = Some(now);
        Some(len)
    }

    pub fn handle_apply_complete_response(&mut self, payload: &[u8]) -> Result<(), MsgHandlerError> {
        let resp = ApplyCompleteResponse::decode(payload)?;
        if resp.completion_code != PldmBaseCompletionCode::Success as u8 {
            self.session.req.state = FdReqState::Failed;
            return Ok(());
        }
        self.session.set_fd_state(FirmwareDeviceState::ReadyXfer);
        self.session.req.state = FdReqState::Unused;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pldm::message::firmware_update::activate_fw::SelfContainedActivationRequest;
    use pldm::message::firmware_update::get_fw_params::FirmwareParameters;
    use pldm::message::firmware_update::request_fw_data::RequestFirmwareDataResponse;
    use pldm::protocol::firmware_update::{ComponentClassification, DescriptorType};
    use pldm::util::clock::MonotonicClock;

    #[derive(Default)]
    struct FakeOps {
        now: u64,
        verify_calls: u8,
        apply_calls: u8,
        cancelled: bool,
        downloaded: Vec<u8>,
    }

    impl MonotonicClock for FakeOps {
        fn now_ms(&self) -> u64 {
            self.now
        }
    }

    impl FdOps for FakeOps {
        fn get_device_identifiers(
            &mut self,
            device_identifiers: &mut [Descriptor],
        ) -> Result<usize, crate::error::FdOpsError> {
            device_identifiers[0] = Descriptor::new(DescriptorType::PciVendorId, &[0xAB, 0xCD]).unwrap();
            Ok(1)
        }

        fn get_firmware_parms(
            &mut self,
            firmware_params: &mut FirmwareParameters,
        ) -> Result<(), crate::error::FdOpsError> {
            *firmware_params = FirmwareParameters::default();
            Ok(())
        }

        fn get_xfer_size(&mut self, ua_transfer_size: usize) -> usize {
            ua_transfer_size.min(64)
        }

        fn handle_component(
            &mut self,
            _component: &FirmwareComponent,
            _firmware_params: &FirmwareParameters,
            _operation: ComponentOperation,
        ) -> Result<pldm::protocol::firmware_update::ComponentResponseCode, crate::error::FdOpsError> {
            Ok(pldm::protocol::firmware_update::ComponentResponseCode::CompCanBeUpdated)
        }

        fn download_data(&mut self, _offset: u32, data: &[u8]) -> Result<(), crate::error::FdOpsError> {
            self.downloaded.extend_from_slice(data);
            Ok(())
        }

        fn verify_step(&mut self) -> Result<u8, crate::error::FdOpsError> {
            self.verify_calls += 1;
            Ok(if self.verify_calls >= 2 { 100 } else { 50 })
        }

        fn apply_step(&mut self) -> Result<u8, crate::error::FdOpsError> {
            self.apply_calls += 1;
            Ok(if self.apply_calls >= 2 { 100 } else { 50 })
        }

        fn activate(&mut self, _self_contained: bool) -> Result<u16, crate::error::FdOpsError> {
            Ok(5)
        }

        fn cancel(&mut self) {
            self.cancelled = true;
        }
    }

    fn pass_through_update(fd: &mut FirmwareDevice<FakeOps>, comp_image_size: u32) {
        let fw_str = PldmFirmwareString::new("ASCII", "1.0").unwrap();

        let req = RequestUpdateRequest::new(1, PldmMsgType::Request, 64, 1, 1, 0, &fw_str).unwrap();
        let mut buf = [0u8; 256];
        req.encode(&mut buf).unwrap();
        let len = fd.request_update_rsp(&mut buf).unwrap();
        RequestUpdateResponse::decode(&buf[..len]).unwrap();
        assert_eq!(fd.state(), FirmwareDeviceState::LearnComponents);

        let req = PassComponentTableRequest::new(
            1,
            PldmMsgType::Request,
            TransferRespFlag::StartAndEnd,
            ComponentClassification::Firmware,
            1,
            0,
            0,
            &fw_str,
        )
        .unwrap();
        let mut buf = [0u8; 256];
        req.encode(&mut buf).unwrap();
        let len = fd.pass_component_rsp(&mut buf).unwrap();
        PassComponentTableResponse::decode(&buf[..len]).unwrap();
        assert_eq!(fd.state(), FirmwareDeviceState::ReadyXfer);

        let req = UpdateComponentRequest::new(
            1,
            PldmMsgType::Request,
            ComponentClassification::Firmware,
            1,
            0,
            0,
            comp_image_size,
            UpdateOptionFlags(0),
            &fw_str,
        )
        .unwrap();
        let mut buf = [0u8; 256];
        req.encode(&mut buf).unwrap();
        let len = fd.update_component_rsp(&mut buf).unwrap();
        UpdateComponentResponse::decode(&buf[..len]).unwrap();
        assert_eq!(fd.state(), FirmwareDeviceState::Download);
    }

    #[test]
    fn happy_path_reaches_ready_xfer_then_idle() {
        let mut fd = FirmwareDevice::new(FakeOps::default());
        pass_through_update(&mut fd, 10);

        let mut out = [0u8; 256];
        let len = fd.poll(&mut out).expect("expected RequestFirmwareData");
        let req = RequestFirmwareDataRequest::decode(&out[..len]).unwrap();
        assert_eq!(req.offset, 0);

        let data = [0xAAu8; 10];
        let resp = RequestFirmwareDataResponse::new(req.hdr.instance_id(), 0, &data).unwrap();
        let mut resp_buf = [0u8; 32];
        let resp_len = resp.encode(&mut resp_buf).unwrap();
        fd.handle_request_firmware_data_response(&resp_buf[..resp_len]).unwrap();
        assert_eq!(fd.state(), FirmwareDeviceState::Verify);

        assert!(fd.poll(&mut out).is_none(), "verify_step not yet at 100%");
        let len = fd.poll(&mut out).expect("expected VerifyComplete");
        VerifyCompleteRequest::decode(&out[..len]).unwrap();

        let resp = VerifyCompleteResponse::new(1, PldmBaseCompletionCode::Success as u8).unwrap();
        let mut resp_buf = [0u8; 32];
        let resp_len = resp.encode(&mut resp_buf).unwrap();
        fd.handle_verify_complete_response(&resp_buf[..resp_len]).unwrap();
        assert_eq!(fd.state(), FirmwareDeviceState::Apply);

        assert!(fd.poll(&mut out).is_none(), "apply_step not yet at 100%");
        let len = fd.poll(&mut out).expect("expected ApplyComplete");
        ApplyCompleteRequest::decode(&out[..len]).unwrap();

        let resp = ApplyCompleteResponse::new(1, PldmBaseCompletionCode::Success as u8).unwrap();
        let mut resp_buf = [0u8; 32];
        let resp_len = resp.encode(&mut resp_buf).unwrap();
        fd.handle_apply_complete_response(&resp_buf[..resp_len]).unwrap();
        // Regression (#5): a successful ApplyComplete response must move
        // the FD back to ReadyXfer, not leave it stuck in Apply.
        assert_eq!(fd.state(), FirmwareDeviceState::ReadyXfer);

        let req = ActivateFirmwareRequest::new(
            1,
            PldmMsgType::Request,
            SelfContainedActivationRequest::NotActivateSelfContainedComponents,
        )
        .unwrap();
        let mut buf = [0u8; 64];
        req.encode(&mut buf).unwrap();
        let len = fd.activate_firmware_rsp(&mut buf).unwrap();
        let resp = ActivateFirmwareResponse::decode(&buf[..len]).unwrap();
        assert_eq!(resp.completion_code, PldmBaseCompletionCode::Success as u8);
        // Regression (#6): ActivateFirmware is only valid from ReadyXfer
        // and succeeds into Idle.
        assert_eq!(fd.state(), FirmwareDeviceState::Idle);

        assert_eq!(fd.ops.downloaded, data.to_vec());
    }

    #[test]
    fn activate_firmware_rejected_outside_ready_xfer() {
        let mut fd = FirmwareDevice::new(FakeOps::default());
        assert_eq!(fd.state(), FirmwareDeviceState::Idle);

        let req = ActivateFirmwareRequest::new(
            1,
            PldmMsgType::Request,
            SelfContainedActivationRequest::NotActivateSelfContainedComponents,
        )
        .unwrap();
        let mut buf = [0u8; 64];
        req.encode(&mut buf).unwrap();
        let len = fd.activate_firmware_rsp(&mut buf).unwrap();
        let resp = PldmFailureResponse::decode(&buf[..len]).unwrap();
        assert_eq!(
            resp.completion_code,
            FwUpdateCompletionCode::InvalidStateForCommand as u8
        );
        assert_eq!(fd.state(), FirmwareDeviceState::Idle);
    }

    #[test]
    fn poll_t1_expiry_reports_state_specific_reason() {
        let mut fd = FirmwareDevice::new(FakeOps {
            now: 0,
            ..Default::default()
        });
        pass_through_update(&mut fd, 10);
        assert_eq!(fd.state(), FirmwareDeviceState::Download);

        // Advance time well past FD T1 without any further UA activity.
        fd.ops.now = pldm_fd_test_t1_timeout_ms() + 1;
        let mut out = [0u8; 256];
        assert!(fd.poll(&mut out).is_none());
        assert_eq!(fd.state(), FirmwareDeviceState::Idle);
        assert_eq!(
            fd.session.idle_reason,
            Some(GetStatusReasonCode::DownloadTimeout)
        );
        assert!(fd.ops.cancelled);
    }

    fn pldm_fd_test_t1_timeout_ms() -> u64 {
        crate::config::DEFAULT_FD_T1_TIMEOUT_MS
    }

    #[test]
    fn query_devid_rsp_reports_device_identifiers() {
        let mut fd = FirmwareDevice::new(FakeOps::default());
        let req = QueryDeviceIdentifiersRequest::new(1, PldmMsgType::Request).unwrap();
        let mut buf = [0u8; 256];
        req.encode(&mut buf).unwrap();
        let len = fd.query_devid_rsp(&mut buf).unwrap();
        let resp = QueryDeviceIdentifiersResponse::decode(&buf[..len]).unwrap();
        assert_eq!(resp.completion_code, PldmBaseCompletionCode::Success as u8);
    }
}
