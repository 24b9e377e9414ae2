//! Test helper factories
//!
//! Small hand-built stores with known shapes, shared by the unit tests of
//! the graph modules.
#![allow(dead_code)]

use crate::graph::models::{Node, Relationship, DEFAULT_RELATIONSHIP_TYPE};
use crate::graph::store::GraphStore;

// ============================================================================
// Store factories
// ============================================================================

fn link(store: &mut GraphStore, id: &str, from: &str, to: &str) {
    store
        .add_relationship(Relationship::new(id, from, to, DEFAULT_RELATIONSHIP_TYPE))
        .expect("endpoints exist");
}

/// "hub" (label Hub) pointing at `leaves` nodes "leaf_0".. (label Leaf).
pub fn star_store(leaves: usize) -> GraphStore {
    let mut store = GraphStore::new();
    store.add_node(Node::new("hub", "Hub"));
    for i in 0..leaves {
        let leaf = format!("leaf_{}", i);
        store.add_node(Node::new(&leaf, "Leaf"));
        link(&mut store, &format!("rel:{}", i), "hub", &leaf);
    }
    store
}

/// Path n0 → n1 → … → n{len-1}, all labelled Step.
pub fn chain_store(len: usize) -> GraphStore {
    let mut store = GraphStore::new();
    for i in 0..len {
        store.add_node(Node::new(format!("n{}", i), "Step"));
    }
    for i in 1..len {
        link(
            &mut store,
            &format!("rel:{}", i - 1),
            &format!("n{}", i - 1),
            &format!("n{}", i),
        );
    }
    store
}

/// Chain a0 → a1 → a2 → a3 plus the separate pair b0 → b1.
pub fn two_component_store() -> GraphStore {
    let mut store = GraphStore::new();
    for i in 0..4 {
        store.add_node(Node::new(format!("a{}", i), "Alpha"));
    }
    for i in 0..2 {
        store.add_node(Node::new(format!("b{}", i), "Beta"));
    }
    link(&mut store, "rel:a0", "a0", "a1");
    link(&mut store, "rel:a1", "a1", "a2");
    link(&mut store, "rel:a2", "a2", "a3");
    link(&mut store, "rel:b0", "b0", "b1");
    store
}

