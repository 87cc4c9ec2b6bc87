//! The capability interface registered objects implement, plus the
//! node-side identity storage the register writes through.

use core::any::Any;
use core::cell::Cell;

use crate::id::NodeId;
use crate::refs::Ref;

/// Erased strong reference to any registered node.
pub type NodeRef = Ref<dyn RegisterNode>;

/// Implemented by every object that can be registered.
///
/// The only obligation is to expose an [`IdSlot`] the register can write the
/// issued identity into; `Any` is the supertrait so typed lookup can perform
/// a checked downcast instead of an unchecked cast.
pub trait RegisterNode: Any {
    /// Storage for this node's current identity.
    fn id_slot(&self) -> &IdSlot;

    /// The identity currently stored on this node.
    ///
    /// [`NodeId::INVALID`] while unregistered.
    fn id(&self) -> NodeId {
        self.id_slot().get()
    }
}

/// Identity storage embedded in a node.
///
/// Readable by anyone; only the register assigns it. The stored value must
/// always equal the identity the register handed out for the node's slot
/// (or the invalid sentinel while unregistered) -- lookups use this as a
/// self-consistency check.
#[derive(Debug, Default)]
pub struct IdSlot {
    current: Cell<NodeId>,
}

impl IdSlot {
    pub fn new() -> Self {
        Self {
            current: Cell::new(NodeId::INVALID),
        }
    }

    #[inline]
    pub fn get(&self) -> NodeId {
        self.current.get()
    }

    #[inline]
    pub(crate) fn set(&self, id: NodeId) {
        self.current.set(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        slot: IdSlot,
    }

    impl RegisterNode for Probe {
        fn id_slot(&self) -> &IdSlot {
            &self.slot
        }
    }

    /// Invariant: a fresh slot holds the invalid sentinel and the provided
    /// `id()` accessor reads through it.
    #[test]
    fn fresh_slot_is_invalid() {
        let p = Probe {
            slot: IdSlot::new(),
        };
        assert_eq!(p.id(), NodeId::INVALID);
        assert!(!p.id().is_valid());
    }

    /// Invariant: assignment through the slot is visible via `id()`.
    #[test]
    fn assignment_reads_back() {
        let p = Probe {
            slot: IdSlot::new(),
        };
        let id = NodeId::new(5, 0xAAAA);
        p.id_slot().set(id);
        assert_eq!(p.id(), id);
        p.id_slot().set(NodeId::INVALID);
        assert_eq!(p.id(), NodeId::INVALID);
    }
}
