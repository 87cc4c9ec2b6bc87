//! Generation-checked node register: the structural layer mapping stable
//! identities to live nodes.

use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::id::NodeId;
use crate::node::{NodeRef, RegisterNode};
use crate::refs::Ref;

/// Slot bound used by [`NodeRegister::new`].
pub const DEFAULT_SLOT_LIMIT: usize = 65_536;

/// First signature a register issues. Non-zero, so that a zero signature
/// can mean "invalid".
pub const FIRST_SIGNATURE: u32 = 0xAAAA;

/// Errors surfaced by [`NodeRegister::insert`].
///
/// Lookup misses are not errors; [`NodeRegister::get`] returns `None` for
/// those.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Every slot up to the configured limit is occupied. The register is
    /// unchanged; the caller may free nodes and retry.
    #[error("node register is full ({limit} slots)")]
    CapacityExceeded { limit: usize },

    /// The node already carries a valid identity. Registering it again
    /// would alias two slots to one node.
    #[error("node is already registered as {id:?}")]
    AlreadyRegistered { id: NodeId },
}

/// Maps `(index, signature)` identities to live nodes while tolerating
/// slot reuse.
///
/// Slots hold non-owning references: the register never destroys a node.
/// Destruction is driven entirely by the strong-reference system;
/// [`NodeRegister::remove`] only deletes the index mapping. A node
/// destroyed while still registered simply stops resolving.
///
/// Identities are meaningful only against the register that issued them,
/// and only within one process run.
pub struct NodeRegister {
    /// One slot per index; at most one live node per slot.
    slots: Vec<Option<Weak<dyn RegisterNode>>>,
    /// Hint: no free slot exists below this index.
    first_free: usize,
    /// Next signature to issue; monotonically increasing, never reused.
    next_signature: u32,
    /// Hard bound on `slots.len()`.
    limit: usize,
    /// Registered entries (live or not-yet-removed).
    registered: usize,
}

impl NodeRegister {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_SLOT_LIMIT)
    }

    /// A register bounded to at most `limit` slots.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            slots: Vec::new(),
            first_free: 0,
            next_signature: FIRST_SIGNATURE,
            limit,
            registered: 0,
        }
    }

    /// Register `node`, issuing it a fresh identity.
    ///
    /// The lowest free slot is used, scanning forward from the free-slot
    /// hint; the backing store grows only when no registered slot is free.
    /// On success the identity is also stored on the node itself.
    ///
    /// Fails with [`RegisterError::CapacityExceeded`] when the slot limit
    /// is reached, and with [`RegisterError::AlreadyRegistered`] when the
    /// node already carries a valid identity; the latter is a lifetime bug
    /// and additionally fatal in debug builds. Neither failure mutates the
    /// register.
    pub fn insert(&mut self, node: &NodeRef) -> Result<NodeId, RegisterError> {
        let current = node.id();
        if current.is_valid() {
            debug_assert!(false, "insert: node already registered as {current:?}");
            log::error!("insert: node already registered as {current:?}");
            return Err(RegisterError::AlreadyRegistered { id: current });
        }

        let mut index = self.first_free;
        while index < self.slots.len() && self.slots[index].is_some() {
            index += 1;
        }
        if index == self.slots.len() {
            if self.slots.len() == self.limit {
                log::warn!("insert: node register is full ({} slots)", self.limit);
                return Err(RegisterError::CapacityExceeded { limit: self.limit });
            }
            self.slots.push(None);
        }

        let id = NodeId::new(index as u32, self.next_signature);
        self.next_signature = match self.next_signature.checked_add(1) {
            Some(next) => next,
            // A wrapped signature would alias the invalid sentinel and
            // break never-reissued uniqueness; stop hard.
            None => std::process::abort(),
        };

        self.slots[index] = Some(Rc::downgrade(node.as_rc()));
        self.registered += 1;
        node.id_slot().set(id);

        // Advance the hint past the filled slot to the next actually-free
        // slot. This scan is the amortized cost of slot reuse.
        self.first_free = index + 1;
        while self.first_free < self.slots.len() && self.slots[self.first_free].is_some() {
            self.first_free += 1;
        }

        Ok(id)
    }

    /// Delete the index mapping for `node` and reset its stored identity.
    ///
    /// The node's stored identity must resolve to this same node. A node
    /// that is not registered here is a lifetime bug: fatal in debug
    /// builds; in release builds the call logs and leaves the register
    /// untouched (nothing is owned here, so no double-free can result).
    ///
    /// The freed identity will never resolve again, even after the slot is
    /// reused.
    pub fn remove(&mut self, node: &NodeRef) {
        let id = node.id();
        let resolves = id.is_valid()
            && self
                .slots
                .get(id.index())
                .and_then(|slot| slot.as_ref())
                .is_some_and(|w| std::ptr::addr_eq(w.as_ptr(), Rc::as_ptr(node.as_rc())));
        if !resolves {
            debug_assert!(false, "remove: {id:?} does not resolve to the node being removed");
            log::error!("remove: {id:?} does not resolve to the node being removed; ignoring");
            return;
        }

        self.slots[id.index()] = None;
        self.registered -= 1;
        if id.index() < self.first_free {
            self.first_free = id.index();
        }
        node.id_slot().set(NodeId::INVALID);
    }

    /// Resolve an identity to its node.
    ///
    /// Never fails: `None` for the invalid sentinel, an out-of-range
    /// index, an empty slot, a node destroyed while still registered, or
    /// an occupant whose stored identity differs from `id` (a stale
    /// reference whose slot has been reused). Resolving takes a fresh
    /// strong reference for the caller.
    pub fn get(&self, id: NodeId) -> Option<NodeRef> {
        if !id.is_valid() {
            return None;
        }
        let slot = self.slots.get(id.index())?.as_ref()?;
        let node = slot.upgrade()?;
        // Self-consistency: a registered node's stored identity always
        // names its own slot.
        debug_assert_eq!(node.id().index(), id.index());
        if node.id() != id {
            return None;
        }
        Some(Ref::from_rc(node))
    }

    /// Resolve an identity to a node of a specific type.
    ///
    /// `None` when the identity does not resolve or the node is not a `T`.
    pub fn get_as<T: RegisterNode>(&self, id: NodeId) -> Option<Ref<T>> {
        self.get(id)?.downcast::<T>()
    }

    /// Number of registered entries (including any whose node has been
    /// destroyed without being removed).
    pub fn len(&self) -> usize {
        self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    /// Current size of the backing store, occupied or not.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Configured slot bound.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Iterate over the registered nodes that are still alive.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeRef)> + '_ {
        self.slots.iter().filter_map(|slot| {
            let node = slot.as_ref()?.upgrade()?;
            let id = node.id();
            Some((id, Ref::from_rc(node)))
        })
    }

    #[cfg(test)]
    pub(crate) fn first_free_hint(&self) -> usize {
        self.first_free
    }

    #[cfg(test)]
    pub(crate) fn peek_next_signature(&self) -> u32 {
        self.next_signature
    }
}

impl Default for NodeRegister {
    fn default() -> Self {
        Self::new()
    }
}
