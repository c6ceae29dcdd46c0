// Licensed under the Apache-2.0 license

pub mod effecter;
pub mod event;
pub mod event_receiver;
pub mod pdr_info;
pub mod sensor;
pub mod state;
