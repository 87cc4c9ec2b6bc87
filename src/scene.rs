//! Scene integration: ownership plus registration in one subsystem.
//!
//! A [`SceneGraph`] is the permanent owner in the object lifecycle: nodes
//! that enter it are held by a strong reference and registered; nodes that
//! exit are unregistered and handed back to the caller. Gameplay and
//! editor code keeps only [`NodeId`]s and resolves them on use, tolerating
//! the node having been destroyed in the interim.

use crate::id::NodeId;
use crate::node::{NodeRef, RegisterNode};
use crate::refs::Ref;
use crate::register::{NodeRegister, RegisterError};

pub struct SceneGraph {
    register: NodeRegister,
    nodes: Vec<NodeRef>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            register: NodeRegister::new(),
            nodes: Vec::new(),
        }
    }

    /// A graph whose register is bounded to `limit` slots.
    pub fn with_slot_limit(limit: usize) -> Self {
        Self {
            register: NodeRegister::with_limit(limit),
            nodes: Vec::new(),
        }
    }

    /// Bring a node into the scene: take ownership of the reference and
    /// register it.
    ///
    /// On failure the node is not held and ownership returns to the caller
    /// implicitly (the passed reference is dropped, releasing once).
    pub fn enter(&mut self, node: NodeRef) -> Result<NodeId, RegisterError> {
        let id = self.register.insert(&node)?;
        self.nodes.push(node);
        Ok(id)
    }

    /// Take a node out of the scene: unregister it and return the owning
    /// reference to the caller.
    ///
    /// `None` when the identity no longer resolves -- an expected outcome,
    /// not an error.
    pub fn exit(&mut self, id: NodeId) -> Option<NodeRef> {
        let node = self.register.get(id)?;
        self.register.remove(&node);
        match self
            .nodes
            .iter()
            .position(|held| Ref::ptr_eq(held, &node))
        {
            Some(i) => Some(self.nodes.swap_remove(i)),
            None => None,
        }
    }

    /// Resolve a stored identity to a live node.
    pub fn get(&self, id: NodeId) -> Option<NodeRef> {
        self.register.get(id)
    }

    /// Resolve a stored identity to a live node of a specific type.
    pub fn get_as<T: RegisterNode>(&self, id: NodeId) -> Option<Ref<T>> {
        self.register.get_as(id)
    }

    /// Iterate over the nodes currently in the scene.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeRef)> + '_ {
        self.register.iter()
    }

    /// Number of nodes in the scene.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
