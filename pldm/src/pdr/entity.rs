// Licensed under the Apache-2.0 license

//! Entity-association tree (C7): the in-memory hierarchy a terminus
//! builds up before flattening it into entity-association PDRs.
//!
//! The reference links nodes with heap pointers (`first_child` /
//! `next_sibling`). Without an allocator, this crate stores nodes in a
//! fixed-capacity arena and links them with arena indices instead --
//! the same singly-linked-list-of-siblings shape, just addressed by
//! `usize` rather than `*mut`.

use crate::error::PldmError;
use crate::msgbuf::MsgBuf;
use crate::pdr::repo::{PdrRepo, PDR_MAX_RECORD_LEN};

pub const ENTITY_ASSOCIAION_PHYSICAL: u8 = 0x3;
pub const ENTITY_ASSOCIAION_LOGICAL: u8 = 0x4;

/// Largest `num_children` an entity-association PDR body can hold within
/// [`PDR_MAX_RECORD_LEN`]: `container_id + association_type +
/// container_entity + num_children` (10 bytes) leaves the rest for
/// 6-byte `pldm_entity` children.
const MAX_ASSOCIATION_PDR_CHILDREN: usize = (PDR_MAX_RECORD_LEN - 10) / 6;

/// `{entity_type, entity_instance_num, entity_container_id}` (DSP0248
/// Table 22's `pldm_entity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PldmEntity {
    pub entity_type: u16,
    pub entity_instance_num: u16,
    pub entity_container_id: u16,
}

impl PldmEntity {
    fn decode(msg: &mut MsgBuf) -> Result<Self, PldmError> {
        Ok(Self {
            entity_type: msg.extract()?,
            entity_instance_num: msg.extract()?,
            entity_container_id: msg.extract()?,
        })
    }

    fn encode(&self, msg: &mut MsgBuf) -> Result<(), PldmError> {
        msg.insert(self.entity_type)?;
        msg.insert(self.entity_instance_num)?;
        msg.insert(self.entity_container_id)
    }
}

#[derive(Clone, Copy)]
struct EntityNode {
    entity: PldmEntity,
    parent: PldmEntity,
    remote_container_id: u16,
    association_type: u8,
    first_child: Option<usize>,
    next_sibling: Option<usize>,
}

/// A fixed-capacity (`N` nodes) entity-association tree.
pub struct EntityAssociationTree<const N: usize> {
    nodes: [Option<EntityNode>; N],
    root: Option<usize>,
    last_used_container_id: u16,
}

impl<const N: usize> Default for EntityAssociationTree<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EntityAssociationTree<N> {
    pub fn new() -> Self {
        Self {
            nodes: [None; N],
            root: None,
            last_used_container_id: 0,
        }
    }

    fn alloc(&mut self, node: EntityNode) -> Result<usize, PldmError> {
        let slot = self
            .nodes
            .iter()
            .position(|n| n.is_none())
            .ok_or(PldmError::OutOfMemory)?;
        self.nodes[slot] = Some(node);
        Ok(slot)
    }

    /// Finds the sibling after which `entity_type` should be inserted so
    /// that same-typed siblings stay contiguous: the last node whose type
    /// matches, or the last sibling overall if no match exists.
    fn find_insertion_after(&self, first_child: usize, entity_type: u16) -> usize {
        let mut cur = first_child;
        loop {
            let node = self.nodes[cur].expect("arena index always populated while referenced");
            let Some(next) = node.next_sibling else {
                return cur;
            };
            let next_type = self.nodes[next].unwrap().entity.entity_type;
            if node.entity.entity_type == entity_type && next_type != entity_type {
                return cur;
            }
            cur = next;
        }
    }

    /// Adds the tree's root node. `container_id` is conventionally 0.
    pub fn add_root(&mut self, entity_type: u16) -> Result<usize, PldmError> {
        if self.root.is_some() {
            return Err(PldmError::InvalidData);
        }
        let entity = PldmEntity {
            entity_type,
            entity_instance_num: 0,
            entity_container_id: 0,
        };
        let idx = self.alloc(EntityNode {
            entity,
            parent: entity,
            remote_container_id: 0,
            association_type: ENTITY_ASSOCIAION_PHYSICAL,
            first_child: None,
            next_sibling: None,
        })?;
        self.root = Some(idx);
        Ok(idx)
    }

    /// Adds `entity_type` as a child of `parent_idx`. `container_id`
    /// picks the new node's `entity_container_id`: the caller's explicit
    /// value, the value inherited from a remote source when `is_remote`
    /// is set, or a freshly allocated one from the tree's own counter.
    /// Adds a child of `parent_idx`. All children of the same parent share
    /// one container ID -- it is assigned (from `container_id`, the
    /// remote source, or the tree's counter) only for the parent's first
    /// child and inherited by every sibling added after it, matching the
    /// wire format where one entity-association PDR carries a single
    /// `container_id` for all of its listed children. Instance numbers
    /// start at 1 and increase within each contiguous run of siblings
    /// sharing `entity_type`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_entity(
        &mut self,
        parent_idx: usize,
        entity_type: u16,
        container_id: Option<u16>,
        association_type: u8,
        is_remote: bool,
        remote_container_id: u16,
    ) -> Result<usize, PldmError> {
        let parent_entity = self
            .nodes
            .get(parent_idx)
            .and_then(|n| *n)
            .ok_or(PldmError::NotFound)?
            .entity;

        let parent_first_child = self.nodes[parent_idx].unwrap().first_child;

        let (entity_instance_num, assigned_container_id, insert_after) = match parent_first_child {
            None => {
                let assigned = match container_id {
                    Some(id) => id,
                    None if is_remote => remote_container_id,
                    None => {
                        let next = self
                            .last_used_container_id
                            .checked_add(1)
                            .ok_or(PldmError::Overflow)?;
                        self.last_used_container_id = next;
                        next
                    }
                };
                (1u16, assigned, None)
            }
            Some(first_child) => {
                let after = self.find_insertion_after(first_child, entity_type);
                let after_node = self.nodes[after].unwrap();
                let instance = if after_node.entity.entity_type == entity_type {
                    after_node
                        .entity
                        .entity_instance_num
                        .checked_add(1)
                        .ok_or(PldmError::Overflow)?
                } else {
                    1
                };
                (instance, after_node.entity.entity_container_id, Some(after))
            }
        };

        let entity = PldmEntity {
            entity_type,
            entity_instance_num,
            entity_container_id: assigned_container_id,
        };

        let idx = self.alloc(EntityNode {
            entity,
            parent: parent_entity,
            remote_container_id: if is_remote { remote_container_id } else { assigned_container_id },
            association_type,
            first_child: None,
            next_sibling: None,
        })?;

        match insert_after {
            None => self.nodes[parent_idx].as_mut().unwrap().first_child = Some(idx),
            Some(after) => {
                let after_next = self.nodes[after].unwrap().next_sibling;
                self.nodes[idx].as_mut().unwrap().next_sibling = after_next;
                self.nodes[after].as_mut().unwrap().next_sibling = Some(idx);
            }
        }

        Ok(idx)
    }

    pub fn extract(&self, idx: usize) -> Option<PldmEntity> {
        self.nodes.get(idx).and_then(|n| *n).map(|n| n.entity)
    }

    pub fn remote_container_id(&self, idx: usize) -> Option<u16> {
        self.nodes.get(idx).and_then(|n| *n).map(|n| n.remote_container_id)
    }

    fn children(&self, idx: usize, association_type: u8) -> impl Iterator<Item = usize> + '_ {
        let mut cur = self.nodes[idx].and_then(|n| n.first_child);
        core::iter::from_fn(move || {
            while let Some(i) = cur {
                let node = self.nodes[i].unwrap();
                cur = node.next_sibling;
                if node.association_type == association_type {
                    return Some(i);
                }
            }
            None
        })
    }

    fn num_children(&self, idx: usize, association_type: u8) -> u8 {
        self.children(idx, association_type).count() as u8
    }
}

impl<const N: usize> EntityAssociationTree<N> {
    /// Emits entity-association PDRs for every node in the tree that has
    /// any children: one record for its logical children, one for its
    /// physical children, each listing that association type's children
    /// only. Handles are allocated sequentially from `*next_record_handle`.
    pub fn entity_association_pdrs<const REPO_N: usize, const CAP: usize>(
        &self,
        repo: &mut PdrRepo<REPO_N, CAP>,
        terminus_handle: u16,
        is_remote: bool,
        next_record_handle: &mut u32,
    ) -> Result<(), PldmError> {
        let Some(root) = self.root else {
            return Ok(());
        };
        let mut stack = [0usize; N];
        let mut sp = 0usize;
        stack[sp] = root;
        sp += 1;

        while sp > 0 {
            sp -= 1;
            let idx = stack[sp];

            for association_type in [ENTITY_ASSOCIAION_LOGICAL, ENTITY_ASSOCIAION_PHYSICAL] {
                let count = self.num_children(idx, association_type);
                if count == 0 {
                    continue;
                }
                self.emit_association_pdr(
                    idx,
                    association_type,
                    count,
                    repo,
                    terminus_handle,
                    is_remote,
                    next_record_handle,
                )?;
            }

            for child in self.children(idx, ENTITY_ASSOCIAION_LOGICAL) {
                if sp >= stack.len() {
                    return Err(PldmError::OutOfMemory);
                }
                stack[sp] = child;
                sp += 1;
            }
            for child in self.children(idx, ENTITY_ASSOCIAION_PHYSICAL) {
                if sp >= stack.len() {
                    return Err(PldmError::OutOfMemory);
                }
                stack[sp] = child;
                sp += 1;
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_association_pdr<const REPO_N: usize, const CAP: usize>(
        &self,
        idx: usize,
        association_type: u8,
        count: u8,
        repo: &mut PdrRepo<REPO_N, CAP>,
        terminus_handle: u16,
        is_remote: bool,
        next_record_handle: &mut u32,
    ) -> Result<(), PldmError> {
        let node = self.nodes[idx].unwrap();
        let first_child = self
            .children(idx, association_type)
            .next()
            .expect("count > 0 implies at least one matching child");
        let container_id = self.nodes[first_child].unwrap().entity.entity_container_id;

        let mut buf = [0u8; PDR_MAX_RECORD_LEN];
        let hdr_len = core::mem::size_of::<crate::message::platform::sensor::PdrCommonHeader>();
        let mut msg = MsgBuf::new_write(&mut buf[hdr_len..], 0)?;
        msg.insert(container_id)?;
        msg.insert(association_type)?;
        node.entity.encode(&mut msg)?;
        msg.insert(count)?;
        for child in self.children(idx, association_type) {
            self.nodes[child].unwrap().entity.encode(&mut msg)?;
        }
        let body_len = msg.complete_used(PDR_MAX_RECORD_LEN - hdr_len)?;

        let hdr = crate::message::platform::sensor::PdrCommonHeader {
            record_handle: 0,
            version: 1,
            pdr_type: crate::protocol::platform::PdrType::EntityAssociationPdr as u8,
            record_change_num: 0,
            length: body_len as u16,
        };
        let mut hdr_msg = MsgBuf::new_write(&mut buf[..hdr_len], 0)?;
        hdr.encode(&mut hdr_msg)?;
        hdr_msg.complete_used(hdr_len)?;

        repo.add(
            crate::protocol::platform::PdrType::EntityAssociationPdr as u8,
            terminus_handle,
            is_remote,
            &buf[..hdr_len + body_len],
            next_record_handle,
        )
    }
}

/// Adds `child` to an existing entity-association PDR record, in place of
/// the original (records are fixed-capacity and can't grow in place): the
/// common header, container entity, and association type carry over
/// unchanged, `num_children` increments by one, and `child` is appended
/// after the existing children in order (S5).
pub fn add_child_to_association_pdr<const N: usize, const CAP: usize>(
    repo: &mut PdrRepo<N, CAP>,
    record_handle: u32,
    child: PldmEntity,
) -> Result<(), PldmError> {
    let record = repo.find_by_handle(record_handle).ok_or(PldmError::NotFound)?;
    if record.pdr_type != crate::protocol::platform::PdrType::EntityAssociationPdr as u8 {
        return Err(PldmError::InvalidData);
    }

    let hdr_len = core::mem::size_of::<crate::message::platform::sensor::PdrCommonHeader>();
    let data = record.data();
    if data.len() < hdr_len {
        return Err(PldmError::BadMsg);
    }

    let mut src = MsgBuf::new_read(&data[hdr_len..], 6)?;
    let container_id: u16 = src.extract()?;
    let association_type: u8 = src.extract()?;
    let container_entity = PldmEntity::decode(&mut src)?;
    let num_children: u8 = src.extract()?;
    let new_num_children = num_children.checked_add(1).ok_or(PldmError::Overflow)?;

    let mut buf = [0u8; PDR_MAX_RECORD_LEN];
    let mut dst = MsgBuf::new_write(&mut buf[hdr_len..], 0)?;
    dst.insert(container_id)?;
    dst.insert(association_type)?;
    container_entity.encode(&mut dst)?;
    dst.insert(new_num_children)?;
    for _ in 0..num_children {
        PldmEntity::decode(&mut src)?.encode(&mut dst)?;
    }
    child.encode(&mut dst)?;
    src.complete()?;
    let body_len = dst.complete_used(PDR_MAX_RECORD_LEN - hdr_len)?;

    let hdr = crate::message::platform::sensor::PdrCommonHeader {
        record_handle,
        version: 1,
        pdr_type: crate::protocol::platform::PdrType::EntityAssociationPdr as u8,
        record_change_num: 0,
        length: body_len as u16,
    };
    let mut hdr_msg = MsgBuf::new_write(&mut buf[..hdr_len], 0)?;
    hdr.encode(&mut hdr_msg)?;
    hdr_msg.complete_used(hdr_len)?;

    repo.replace_record_data(record_handle, &buf[..hdr_len + body_len])
}

/// Removes `child` from an existing entity-association PDR record.
/// Removing the last remaining child deletes the record entirely rather
/// than leaving a zero-child association PDR behind.
pub fn remove_child_from_association_pdr<const N: usize, const CAP: usize>(
    repo: &mut PdrRepo<N, CAP>,
    record_handle: u32,
    child: PldmEntity,
) -> Result<(), PldmError> {
    let record = repo.find_by_handle(record_handle).ok_or(PldmError::NotFound)?;
    if record.pdr_type != crate::protocol::platform::PdrType::EntityAssociationPdr as u8 {
        return Err(PldmError::InvalidData);
    }

    let hdr_len = core::mem::size_of::<crate::message::platform::sensor::PdrCommonHeader>();
    let data = record.data();
    if data.len() < hdr_len {
        return Err(PldmError::BadMsg);
    }

    let mut src = MsgBuf::new_read(&data[hdr_len..], 6)?;
    let container_id: u16 = src.extract()?;
    let association_type: u8 = src.extract()?;
    let container_entity = PldmEntity::decode(&mut src)?;
    let num_children: u8 = src.extract()?;
    if num_children as usize > MAX_ASSOCIATION_PDR_CHILDREN {
        return Err(PldmError::OutOfMemory);
    }

    let mut remaining = [PldmEntity {
        entity_type: 0,
        entity_instance_num: 0,
        entity_container_id: 0,
    }; MAX_ASSOCIATION_PDR_CHILDREN];
    let mut found = false;
    let mut remaining_count = 0usize;
    for _ in 0..num_children {
        let entity = PldmEntity::decode(&mut src)?;
        if !found && entity == child {
            found = true;
            continue;
        }
        remaining[remaining_count] = entity;
        remaining_count += 1;
    }
    src.complete()?;

    if !found {
        return Err(PldmError::NotFound);
    }

    if remaining_count == 0 {
        return repo.remove_by_handle(record_handle);
    }

    let mut buf = [0u8; PDR_MAX_RECORD_LEN];
    let mut dst = MsgBuf::new_write(&mut buf[hdr_len..], 0)?;
    dst.insert(container_id)?;
    dst.insert(association_type)?;
    container_entity.encode(&mut dst)?;
    dst.insert(remaining_count as u8)?;
    for entity in &remaining[..remaining_count] {
        entity.encode(&mut dst)?;
    }
    let body_len = dst.complete_used(PDR_MAX_RECORD_LEN - hdr_len)?;

    let hdr = crate::message::platform::sensor::PdrCommonHeader {
        record_handle,
        version: 1,
        pdr_type: crate::protocol::platform::PdrType::EntityAssociationPdr as u8,
        record_change_num: 0,
        length: body_len as u16,
    };
    let mut hdr_msg = MsgBuf::new_write(&mut buf[..hdr_len], 0)?;
    hdr.encode(&mut hdr_msg)?;
    hdr_msg.complete_used(hdr_len)?;

    repo.replace_record_data(record_handle, &buf[..hdr_len + body_len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_assigns_sequential_instance_numbers() {
        let mut tree: EntityAssociationTree<8> = EntityAssociationTree::new();
        let root = tree.add_root(100).unwrap();
        let c1 = tree
            .add_entity(root, 200, None, ENTITY_ASSOCIAION_PHYSICAL, false, 0)
            .unwrap();
        let c2 = tree
            .add_entity(root, 200, None, ENTITY_ASSOCIAION_PHYSICAL, false, 0)
            .unwrap();

        assert_eq!(tree.extract(c1).unwrap().entity_instance_num, 1);
        assert_eq!(tree.extract(c2).unwrap().entity_instance_num, 2);
        assert_eq!(
            tree.extract(c1).unwrap().entity_container_id,
            tree.extract(c2).unwrap().entity_container_id
        );
    }

    #[test]
    fn entity_association_pdrs_emits_one_per_association_type() {
        let mut tree: EntityAssociationTree<8> = EntityAssociationTree::new();
        let root = tree.add_root(100).unwrap();
        tree.add_entity(root, 200, None, ENTITY_ASSOCIAION_LOGICAL, false, 0)
            .unwrap();
        tree.add_entity(root, 201, None, ENTITY_ASSOCIAION_PHYSICAL, false, 0)
            .unwrap();

        let mut repo: PdrRepo<8> = PdrRepo::new();
        let mut handle = 0u32;
        tree.entity_association_pdrs(&mut repo, 1, false, &mut handle)
            .unwrap();

        assert_eq!(repo.record_count(), 2);
    }

    fn association_pdr_bytes(
        container_id: u16,
        association_type: u8,
        container_entity: PldmEntity,
        children: &[PldmEntity],
        record_handle: u32,
    ) -> [u8; PDR_MAX_RECORD_LEN] {
        let hdr_len = core::mem::size_of::<crate::message::platform::sensor::PdrCommonHeader>();
        let mut buf = [0u8; PDR_MAX_RECORD_LEN];
        let mut body = MsgBuf::new_write(&mut buf[hdr_len..], 0).unwrap();
        body.insert(container_id).unwrap();
        body.insert(association_type).unwrap();
        container_entity.encode(&mut body).unwrap();
        body.insert(children.len() as u8).unwrap();
        for child in children {
            child.encode(&mut body).unwrap();
        }
        let body_len = body.complete_used(PDR_MAX_RECORD_LEN - hdr_len).unwrap();

        let hdr = crate::message::platform::sensor::PdrCommonHeader {
            record_handle,
            version: 1,
            pdr_type: crate::protocol::platform::PdrType::EntityAssociationPdr as u8,
            record_change_num: 0,
            length: body_len as u16,
        };
        let mut hdr_msg = MsgBuf::new_write(&mut buf[..hdr_len], 0).unwrap();
        hdr.encode(&mut hdr_msg).unwrap();
        hdr_msg.complete_used(hdr_len).unwrap();
        buf
    }

    fn add_association_record<const N: usize>(
        repo: &mut PdrRepo<N>,
        container_entity: PldmEntity,
        children: &[PldmEntity],
        record_handle: u32,
    ) {
        let hdr_len = core::mem::size_of::<crate::message::platform::sensor::PdrCommonHeader>();
        let buf = association_pdr_bytes(1, ENTITY_ASSOCIAION_PHYSICAL, container_entity, children, record_handle);
        let body = &buf[..hdr_len + 10 + children.len() * 6];
        let mut handle = record_handle;
        repo.add(
            crate::protocol::platform::PdrType::EntityAssociationPdr as u8,
            1,
            false,
            body,
            &mut handle,
        )
        .unwrap();
    }

    #[test]
    fn add_child_to_association_pdr_appends_in_order_s5() {
        let container = PldmEntity {
            entity_type: 1,
            entity_instance_num: 1,
            entity_container_id: 1,
        };
        let existing_child = PldmEntity {
            entity_type: 2,
            entity_instance_num: 1,
            entity_container_id: 2,
        };
        let new_child = PldmEntity {
            entity_type: 3,
            entity_instance_num: 1,
            entity_container_id: 2,
        };

        let mut repo: PdrRepo<8> = PdrRepo::new();
        add_association_record(&mut repo, container, &[existing_child], 10);

        add_child_to_association_pdr(&mut repo, 10, new_child).unwrap();

        let record = repo.find_by_handle(10).unwrap();
        let hdr_len = core::mem::size_of::<crate::message::platform::sensor::PdrCommonHeader>();
        let mut msg = MsgBuf::new_read(&record.data()[hdr_len..], 6).unwrap();
        let _container_id: u16 = msg.extract().unwrap();
        let _association_type: u8 = msg.extract().unwrap();
        let _container_entity = PldmEntity::decode(&mut msg).unwrap();
        let num_children: u8 = msg.extract().unwrap();
        assert_eq!(num_children, 2);
        assert_eq!(PldmEntity::decode(&mut msg).unwrap(), existing_child);
        assert_eq!(PldmEntity::decode(&mut msg).unwrap(), new_child);
    }

    #[test]
    fn remove_child_from_association_pdr_deletes_last_child_record() {
        let container = PldmEntity {
            entity_type: 1,
            entity_instance_num: 1,
            entity_container_id: 1,
        };
        let only_child = PldmEntity {
            entity_type: 2,
            entity_instance_num: 1,
            entity_container_id: 2,
        };

        let mut repo: PdrRepo<8> = PdrRepo::new();
        add_association_record(&mut repo, container, &[only_child], 10);

        remove_child_from_association_pdr(&mut repo, 10, only_child).unwrap();

        assert!(repo.find_by_handle(10).is_none());
    }

    #[test]
    fn remove_child_from_association_pdr_not_found() {
        let container = PldmEntity {
            entity_type: 1,
            entity_instance_num: 1,
            entity_container_id: 1,
        };
        let only_child = PldmEntity {
            entity_type: 2,
            entity_instance_num: 1,
            entity_container_id: 2,
        };
        let other = PldmEntity {
            entity_type: 9,
            entity_instance_num: 9,
            entity_container_id: 9,
        };

        let mut repo: PdrRepo<8> = PdrRepo::new();
        add_association_record(&mut repo, container, &[only_child], 10);

        assert_eq!(
            remove_child_from_association_pdr(&mut repo, 10, other).unwrap_err(),
            PldmError::NotFound
        );
    }

    #[test]
    fn add_then_remove_child_round_trips_to_original_record() {
        let container = PldmEntity {
            entity_type: 1,
            entity_instance_num: 1,
            entity_container_id: 1,
        };
        let existing_child = PldmEntity {
            entity_type: 2,
            entity_instance_num: 1,
            entity_container_id: 2,
        };
        let new_child = PldmEntity {
            entity_type: 3,
            entity_instance_num: 1,
            entity_container_id: 2,
        };

        let mut repo: PdrRepo<8> = PdrRepo::new();
        add_association_record(&mut repo, container, &[existing_child], 10);
        let original: Vec<u8> = repo.find_by_handle(10).unwrap().data().to_vec();

        add_child_to_association_pdr(&mut repo, 10, new_child).unwrap();
        remove_child_from_association_pdr(&mut repo, 10, new_child).unwrap();

        let after: Vec<u8> = repo.find_by_handle(10).unwrap().data().to_vec();
        assert_eq!(after, original);
    }
}
