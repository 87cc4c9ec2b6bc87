//! Strong references with engine retain/release semantics.

use core::any::Any;
use core::fmt;
use core::ops::Deref;
use std::rc::Rc;

use crate::node::{NodeRef, RegisterNode};

/// A strong reference to a shared object.
///
/// Construction yields a reference count of one: the creator holds the
/// first reference. [`Ref::retain`] (equivalently `Clone`) takes another
/// strong reference; dropping a `Ref` releases one. The object is destroyed
/// exactly once, synchronously, at the drop that brings the count to zero.
///
/// Retaining a destroyed object and releasing below zero are
/// unrepresentable: no `Ref` to a destroyed object can exist, and each
/// `Ref` releases exactly once.
///
/// Single-threaded by design (`!Send`/`!Sync`); cross-thread completion
/// work must marshal back onto the owning thread before touching one.
pub struct Ref<T: ?Sized> {
    inner: Rc<T>,
}

impl<T> Ref<T> {
    /// Allocate `value` with a reference count of one.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(value),
        }
    }
}

impl<T: ?Sized> Ref<T> {
    /// Take an additional strong reference.
    #[inline]
    pub fn retain(&self) -> Ref<T> {
        Ref {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Current strong-reference count.
    ///
    /// Diagnostics and tests only; must not drive ownership decisions.
    #[inline]
    pub fn reference_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Whether two references name the same allocation.
    #[inline]
    pub fn ptr_eq(a: &Ref<T>, b: &Ref<T>) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn from_rc(inner: Rc<T>) -> Self {
        Self { inner }
    }

    pub(crate) fn as_rc(&self) -> &Rc<T> {
        &self.inner
    }

    pub(crate) fn into_rc(self) -> Rc<T> {
        self.inner
    }
}

impl<T: RegisterNode> Ref<T> {
    /// Erase the concrete node type.
    ///
    /// The erased reference is a retain of the same allocation; stored
    /// identity and reference count are shared with `self`.
    pub fn erased(&self) -> NodeRef {
        Ref {
            inner: Rc::clone(&self.inner) as Rc<dyn RegisterNode>,
        }
    }
}

impl Ref<dyn RegisterNode> {
    /// Checked typed cast back to a concrete node type.
    ///
    /// `None` when the node is not a `T`; never an unchecked cast.
    pub fn downcast<T: RegisterNode>(&self) -> Option<Ref<T>> {
        let rc: Rc<dyn RegisterNode> = Rc::clone(&self.inner);
        let any: Rc<dyn Any> = rc;
        any.downcast::<T>().ok().map(|inner| Ref { inner })
    }
}

impl<T: ?Sized> Clone for Ref<T> {
    fn clone(&self) -> Self {
        self.retain()
    }
}

impl<T: ?Sized> Deref for Ref<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&&*self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::IdSlot;
    use core::cell::Cell;
    use std::rc::Rc;

    struct Tracked {
        drops: Rc<Cell<u32>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    /// Invariant: construction yields count one; the creator holds the
    /// first reference.
    #[test]
    fn new_starts_at_count_one() {
        let r = Ref::new(7u32);
        assert_eq!(r.reference_count(), 1);
    }

    /// Invariant: two retains bring the count to three; the third release
    /// destroys the object, exactly once.
    #[test]
    fn retain_twice_release_three_times_destroys_once() {
        let drops = Rc::new(Cell::new(0));
        let r = Ref::new(Tracked {
            drops: drops.clone(),
        });
        let r2 = r.retain();
        let r3 = r.retain();
        assert_eq!(r.reference_count(), 3);

        drop(r2);
        assert_eq!(drops.get(), 0);
        drop(r3);
        assert_eq!(drops.get(), 0);
        assert_eq!(r.reference_count(), 1);
        drop(r);
        assert_eq!(drops.get(), 1, "destroyed exactly once, on the last release");
    }

    /// Invariant: `ptr_eq` is allocation identity, not value equality.
    #[test]
    fn ptr_eq_is_identity() {
        let a = Ref::new(1u32);
        let b = Ref::new(1u32);
        assert!(Ref::ptr_eq(&a, &a.retain()));
        assert!(!Ref::ptr_eq(&a, &b));
    }

    struct Sprite {
        slot: IdSlot,
    }

    impl RegisterNode for Sprite {
        fn id_slot(&self) -> &IdSlot {
            &self.slot
        }
    }

    struct Camera {
        slot: IdSlot,
    }

    impl RegisterNode for Camera {
        fn id_slot(&self) -> &IdSlot {
            &self.slot
        }
    }

    /// Invariant: erasing shares the allocation, and the checked cast only
    /// succeeds for the actual concrete type.
    #[test]
    fn erase_then_downcast_is_checked() {
        let sprite = Ref::new(Sprite {
            slot: IdSlot::new(),
        });
        let node = sprite.erased();
        assert_eq!(sprite.reference_count(), 2);

        assert!(node.downcast::<Sprite>().is_some());
        assert!(node.downcast::<Camera>().is_none());
    }
}
