//! Deferred-release scopes.
//!
//! A [`ReleaseContext`] holds a stack of pools. Factory-style code creates
//! an object with count one and hands that first reference to the current
//! scope ([`ReleaseContext::adopt`]); the caller gets back a non-owning
//! [`Transient`] and must [`Transient::retain`] before the scope flushes if
//! it wants to keep the object. Flushing releases each adopted reference
//! exactly once.
//!
//! The context is plain state to be passed where it is needed -- there is
//! no process-wide current pool. One context per engine instance is the
//! expected configuration, not a requirement.

use core::any::Any;
use core::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::node::{NodeRef, RegisterNode};
use crate::refs::Ref;

/// Stack of deferred-release pools for one logical thread of engine work.
///
/// All operations are synchronous and non-blocking. The type is
/// `!Send`/`!Sync`; guard it externally if a concurrent environment ever
/// needs to share one.
pub struct ReleaseContext {
    stack: RefCell<Vec<Pool>>,
}

/// One dynamic extent's pending releases. Each entry is the strong
/// reference the pool adopted; dropping it is the deferred release.
struct Pool {
    pending: Vec<Rc<dyn Any>>,
}

impl ReleaseContext {
    pub fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
        }
    }

    /// Push a new scope. The returned guard pops and flushes it on drop,
    /// on every exit path.
    ///
    /// Guards must be dropped in LIFO order; an out-of-order drop corrupts
    /// flush attribution for every outer scope and is a fatal error in all
    /// builds.
    pub fn scope(&self) -> PoolScope<'_> {
        let mut stack = self.stack.borrow_mut();
        let depth = stack.len();
        stack.push(Pool {
            pending: Vec::new(),
        });
        PoolScope { ctx: self, depth }
    }

    /// Number of scopes currently active.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Number of releases pending in the innermost scope (0 when no scope
    /// is active).
    pub fn pending(&self) -> usize {
        self.stack
            .borrow()
            .last()
            .map(|pool| pool.pending.len())
            .unwrap_or(0)
    }

    /// Hand a strong reference to the innermost scope.
    ///
    /// The pool adopts the reference as-is -- the count is not incremented;
    /// the moved-in `Ref` itself becomes the pending release. Returns a
    /// non-owning [`Transient`] for the caller.
    ///
    /// # Panics
    ///
    /// When no scope is active. Failing fast here is deliberate: with no
    /// scope to flush it, the deferred release would leak forever.
    pub fn adopt<T: Any>(&self, r: Ref<T>) -> Transient<T> {
        let rc = r.into_rc();
        let weak = Rc::downgrade(&rc);
        self.push_pending(rc);
        Transient { weak }
    }

    /// [`ReleaseContext::adopt`] for erased node references.
    pub fn adopt_node(&self, r: NodeRef) -> Transient<dyn RegisterNode> {
        let rc = r.into_rc();
        let weak = Rc::downgrade(&rc);
        self.push_pending(rc as Rc<dyn Any>);
        Transient { weak }
    }

    /// The factory convention: allocate `value` with count one and adopt
    /// that first reference into the innermost scope.
    ///
    /// # Panics
    ///
    /// When no scope is active.
    pub fn make<T: Any>(&self, value: T) -> Transient<T> {
        self.adopt(Ref::new(value))
    }

    fn push_pending(&self, rc: Rc<dyn Any>) {
        let mut stack = self.stack.borrow_mut();
        match stack.last_mut() {
            Some(pool) => pool.pending.push(rc),
            None => panic!("no active release scope; the deferred release would leak"),
        }
    }
}

impl Default for ReleaseContext {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for one deferred-release scope.
///
/// Dropping the guard pops the scope and flushes it: each adopted
/// reference is released exactly once, in reverse insertion order (later
/// adoptions first, so objects created later -- typically the dependents --
/// are destroyed before what they were built from). Inner scopes never
/// touch entries adopted into outer scopes.
pub struct PoolScope<'c> {
    ctx: &'c ReleaseContext,
    depth: usize,
}

impl Drop for PoolScope<'_> {
    fn drop(&mut self) {
        let mut stack = self.ctx.stack.borrow_mut();
        assert!(
            stack.len() == self.depth + 1,
            "release scopes must be dropped in LIFO order"
        );
        let pool = stack.pop();
        // Release the borrow before running entry destructors: a destructor
        // may re-enter the context (adopt into an outer scope, open and
        // close nested scopes).
        drop(stack);
        if let Some(mut pool) = pool {
            while let Some(entry) = pool.pending.pop() {
                drop(entry);
            }
        }
    }
}

/// Non-owning result of adopting a reference into a scope.
///
/// Holds the object only as long as the adopting scope (or a later owner)
/// does. Callers that want to keep the object past the flush must
/// [`Transient::retain`] first and must handle `None` -- the object is gone
/// once the scope flushed without anyone claiming it.
pub struct Transient<T: ?Sized> {
    weak: Weak<T>,
}

impl<T: ?Sized> Transient<T> {
    /// Attempt to take a strong reference to the adopted object.
    ///
    /// `None` once the object has been destroyed.
    pub fn retain(&self) -> Option<Ref<T>> {
        self.weak.upgrade().map(Ref::from_rc)
    }

    /// Whether the adopted object is still alive.
    pub fn is_alive(&self) -> bool {
        self.weak.strong_count() > 0
    }
}

impl<T: ?Sized> Clone for Transient<T> {
    fn clone(&self) -> Self {
        Self {
            weak: self.weak.clone(),
        }
    }
}
