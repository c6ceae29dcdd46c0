// Licensed under the Apache-2.0 license

//! IBM OEM PDR helper (C9): resolving a contained entity's container ID
//! by walking the repository's entity-association PDRs directly, for
//! callers that only have the entity identity and not a tree handle.

use crate::pdr::repo::PdrRepo;
use crate::protocol::platform::PdrType;

fn in_range(record_handle: u32, first: u32, last: u32) -> bool {
    record_handle >= first && record_handle <= last
}

/// Walks `repo`'s entity-association PDRs, skipping any record whose
/// handle falls in `[first_record_handle, last_record_handle]`, and
/// returns the container ID of the first remaining record whose
/// container entity matches `(entity_type, entity_instance)`. Returns 0
/// if no such record exists.
pub fn find_container_id<const N: usize, const CAP: usize>(
    repo: &PdrRepo<N, CAP>,
    entity_type: u16,
    entity_instance: u16,
    first_record_handle: u32,
    last_record_handle: u32,
) -> u16 {
    for record in repo.iter() {
        if record.pdr_type != PdrType::EntityAssociationPdr as u8 {
            continue;
        }
        if in_range(record.record_handle, first_record_handle, last_record_handle) {
            continue;
        }

        let hdr_len = core::mem::size_of::<crate::message::platform::sensor::PdrCommonHeader>();
        let data = record.data();
        if data.len() < hdr_len + 2 + 1 + 6 + 1 {
            continue;
        }
        let body = &data[hdr_len..];
        // {container_id:u16, association_type:u8, container: pldm_entity(6
        // bytes), num_children:u8, children...} -- see pdr::entity.
        let container_type = u16::from_le_bytes([body[3], body[4]]);
        let container_instance = u16::from_le_bytes([body[5], body[6]]);
        if container_type == entity_type && container_instance == entity_instance {
            return u16::from_le_bytes([body[0], body[1]]);
        }
    }
    0
}
