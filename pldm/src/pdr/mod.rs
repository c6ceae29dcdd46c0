// Licensed under the Apache-2.0 license

//! PDR repository and entity-association tree (C7).

pub mod entity;
pub mod repo;

pub use entity::{EntityAssociationTree, PldmEntity, ENTITY_ASSOCIAION_LOGICAL, ENTITY_ASSOCIAION_PHYSICAL};
pub use repo::{PdrRecord, PdrRepo, PDR_MAX_RECORD_LEN};
