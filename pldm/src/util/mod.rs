// Licensed under the Apache-2.0 license

pub mod clock;
pub mod fw_component;
