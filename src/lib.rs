//! node-register: a single-threaded node identity and reference-lifetime
//! core for retained-mode scene graphs.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: solve "safe weak reference into a pool of reused, owner-managed
//!   objects" in safe, verifiable layers so each piece can be reasoned
//!   about independently.
//! - Layers:
//!   - NodeId: the `(index, signature)` identity value type; signatures
//!     are issued monotonically per register, so a recycled slot never
//!     aliases an old identity.
//!   - Ref<T>: strong references with engine semantics -- construction is
//!     count one, retain/clone increments, drop releases, destruction
//!     happens exactly once at the release that reaches zero.
//!   - ReleaseContext: a stack of deferred-release scopes. Factories
//!     create with count one and hand that reference to the innermost
//!     scope; callers claim ownership via `Transient::retain` before the
//!     scope flushes, or the object is destroyed at the flush.
//!   - NodeRegister: a bounded, growable slot table of non-owning
//!     references. Resolution triple-checks index range, occupancy, and
//!     the occupant's stored identity, converting every dangling-reference
//!     case into a safe miss.
//!   - SceneGraph: the integration layer wiring enter/exit ownership to
//!     register bookkeeping.
//!
//! Constraints
//! - Single-threaded: every type is `!Send`/`!Sync` by construction (`Rc`,
//!   `Cell`, `RefCell`; no atomics). Background work must marshal back to
//!   the owning thread.
//! - The register never frees memory; destruction is driven only by the
//!   strong-reference count. Removing a node is pure index bookkeeping.
//! - Registration and reference counting are independent: a node may be
//!   registered at any count and unregistered before final destruction.
//! - Lookup misses are first-class `None` results, never errors; slot
//!   reuse and deletion are normal operation.
//! - No operation blocks or suspends; the only unbounded costs are the
//!   amortized free-slot scan and occasional backing-store growth.
//!
//! Why this split?
//! - Localize invariants: identity arithmetic, count lifecycle, scope
//!   discipline, and slot bookkeeping each have a small, precise contract.
//! - No unsafe: counting delegates to `Rc`, non-owning slots are `Weak`,
//!   typed lookup is a checked `Any` downcast.
//! - Clear failure boundaries: capacity exhaustion is a recoverable error
//!   that mutates nothing; lifetime misuse fails fast (fatal in debug
//!   builds, logged no-op in release where safe); a missing release scope
//!   or an out-of-order scope drop is fatal in every build.
//!
//! Notes and non-goals
//! - Identities are only meaningful against the register that issued them
//!   and within one process run; persisting them is unsupported.
//! - No built-in thread-safe variant; wrap the register and the context in
//!   a mutex each and marshal completions if concurrency is ever needed.
//! - Rendering, assets, layout, and platform concerns live elsewhere and
//!   interact with this core only through references and identities.

mod id;
mod node;
mod pool;
mod refs;
mod register;
mod register_proptest;
mod scene;

// Public surface
pub use id::NodeId;
pub use node::{IdSlot, NodeRef, RegisterNode};
pub use pool::{PoolScope, ReleaseContext, Transient};
pub use refs::Ref;
pub use register::{NodeRegister, RegisterError, DEFAULT_SLOT_LIMIT, FIRST_SIGNATURE};
pub use scene::SceneGraph;
