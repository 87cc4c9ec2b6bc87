#![cfg(test)]

// Property tests for NodeRegister kept inside the crate so they can check
// private state (the free-slot hint and the signature counter) alongside
// the public behavior.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::id::NodeId;
use crate::node::{IdSlot, NodeRef, RegisterNode};
use crate::refs::Ref;
use crate::register::{NodeRegister, RegisterError, FIRST_SIGNATURE};

struct Probe {
    slot: IdSlot,
}

impl RegisterNode for Probe {
    fn id_slot(&self) -> &IdSlot {
        &self.slot
    }
}

fn probe() -> NodeRef {
    Ref::new(Probe {
        slot: IdSlot::new(),
    })
    .erased()
}

// Index-based operations shrink well: indices shrink toward earlier
// entries and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert,
    Remove(usize),
    Lookup(usize),
    LookupStale(usize),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        3 => Just(Op::Insert),
        2 => (0usize..64).prop_map(Op::Remove),
        2 => (0usize..64).prop_map(Op::Lookup),
        1 => (0usize..64).prop_map(Op::LookupStale),
    ];
    proptest::collection::vec(op, 1..80)
}

// Property: across random insert/remove/lookup sequences,
// - the free-slot hint never exceeds the true first free slot,
// - signatures are issued strictly monotonically and never reused,
// - no two live nodes share an identity,
// - stale identities never resolve,
// - `len` tracks the number of registered nodes.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_register_invariants(ops in arb_ops()) {
        const LIMIT: usize = 16;
        let mut reg = NodeRegister::with_limit(LIMIT);
        let mut live: Vec<(NodeId, NodeRef)> = Vec::new();
        let mut stale: Vec<NodeId> = Vec::new();
        let mut issued: HashSet<u32> = HashSet::new();

        for op in ops {
            match op {
                Op::Insert => {
                    let node = probe();
                    match reg.insert(&node) {
                        Ok(id) => {
                            prop_assert!(live.len() < LIMIT);
                            prop_assert!(id.signature() >= FIRST_SIGNATURE);
                            prop_assert!(issued.insert(id.signature()), "signature reissued");
                            live.push((id, node));
                        }
                        Err(RegisterError::CapacityExceeded { limit }) => {
                            prop_assert_eq!(limit, LIMIT);
                            prop_assert_eq!(live.len(), LIMIT);
                        }
                        Err(e) => prop_assert!(false, "unexpected insert failure: {:?}", e),
                    }
                }
                Op::Remove(i) => {
                    if !live.is_empty() {
                        let (id, node) = live.swap_remove(i % live.len());
                        reg.remove(&node);
                        prop_assert_eq!(node.id(), NodeId::INVALID);
                        stale.push(id);
                    }
                }
                Op::Lookup(i) => {
                    if !live.is_empty() {
                        let (id, node) = &live[i % live.len()];
                        let got = reg.get(*id);
                        prop_assert!(got.is_some(), "live id must resolve");
                        prop_assert!(Ref::ptr_eq(&got.unwrap(), node));
                    }
                }
                Op::LookupStale(i) => {
                    if !stale.is_empty() {
                        let id = stale[i % stale.len()];
                        prop_assert!(reg.get(id).is_none(), "stale id resolved");
                    }
                }
            }

            // Post-conditions after every op.
            prop_assert_eq!(reg.len(), live.len());

            // No two live nodes share an identity.
            let mut ids: Vec<NodeId> = live.iter().map(|(id, _)| *id).collect();
            ids.sort_by_key(|id| (id.index(), id.signature()));
            ids.dedup();
            prop_assert_eq!(ids.len(), live.len());

            // The hint never exceeds the true first free slot.
            let occupied: HashSet<usize> = live.iter().map(|(id, _)| id.index()).collect();
            let true_first_free = (0..reg.slot_count())
                .find(|i| !occupied.contains(i))
                .unwrap_or(reg.slot_count());
            prop_assert!(
                reg.first_free_hint() <= true_first_free,
                "hint {} past first free {}",
                reg.first_free_hint(),
                true_first_free
            );

            // The signature counter stays ahead of everything issued.
            prop_assert!(issued
                .iter()
                .all(|sig| *sig < reg.peek_next_signature()));

            // All stale identities remain unresolvable.
            for id in &stale {
                prop_assert!(reg.get(*id).is_none());
            }
        }
    }
}
