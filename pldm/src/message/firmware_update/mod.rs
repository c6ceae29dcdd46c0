// Licensed under the Apache-2.0 license

pub mod activate_fw;
pub mod apply_complete;
pub mod get_fw_params;
pub mod get_status;
pub mod package_header;
pub mod pass_component;
pub mod query_devid;
pub mod query_downstream;
pub mod request_cancel;
pub mod request_fw_data;
pub mod request_update;
pub mod transfer_complete;
pub mod update_component;
pub mod verify_complete;
