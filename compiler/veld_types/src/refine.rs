//! Abstract-type refinement engine.
//!
//! A placeholder ([`Tag::Opaque`]) stands in for a type whose shape is not
//! yet known. Composites built over it are *abstract*: tracked by identity
//! only, since their structural key is not final. When the placeholder is
//! resolved, every subscribed containment edge is repointed in place, each
//! affected container re-derives its abstractness with a shallow O(arity)
//! scan, and containers whose shape just became final are inserted into
//! their uniquing table, or collapsed into a pre-existing duplicate,
//! which cascades the same repointing up the containment graph.
//!
//! # Design
//!
//! - Forwarding links with path compression resolve handles to dead nodes
//!   in near-constant time (the same link-chasing shape as unification
//!   engines use for variable links).
//! - Abstractness re-derivation is edge-local: each edge's target already
//!   carries an up-to-date flag, so no full-graph walk happens on any
//!   single operation.
//! - A self-referential shape that loses its last placeholder (for
//!   example `struct S { S* }` completed through an opaque) is detected
//!   with a strongly-connected-component check bounded to the abstract
//!   subgraph reachable from the touched container.
//! - Subscriber lists are kept in subscription order and containers are
//!   processed in first-touch order, so collapse order is reproducible
//!   within a run.

mod error;

pub use error::RefineError;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{Idx, Pool, Tag, TypeFlags};

/// A containment edge subscribed to an abstract target.
///
/// `user` is the container; `pos` is the ordinal contained position
/// (function position 0 is the return type, positions `1..=n` the
/// parameters; struct positions are field indices; sequential kinds have
/// the single position 0).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Edge {
    pub user: Idx,
    pub pos: u32,
}

impl Pool {
    /// Register an edge on an abstract target's subscriber list.
    pub(crate) fn subscribe(&mut self, target: Idx, edge: Edge) {
        debug_assert!(self.is_abstract(target));
        self.watchers.entry(target).or_default().push(edge);
    }

    // ========================================
    // Resolution
    // ========================================

    /// Resolve a handle by following forwarding links.
    ///
    /// Live handles return themselves. Handles to refined-away nodes
    /// return the survivor; intermediate links are compressed to point
    /// directly at it, giving near-constant amortized cost.
    pub fn resolve(&mut self, idx: Idx) -> Idx {
        let Some(&target) = self.forward.get(&idx) else {
            return idx;
        };
        let root = self.resolve(target);
        if root != target {
            self.forward.insert(idx, root);
        }
        root
    }

    /// Resolve without mutation (for read-only queries).
    ///
    /// Follows forwarding links but doesn't apply path compression.
    pub fn resolve_readonly(&self, idx: Idx) -> Idx {
        let mut cur = idx;
        while let Some(&target) = self.forward.get(&cur) {
            cur = target;
        }
        cur
    }

    // ========================================
    // Refinement
    // ========================================

    /// Resolve a placeholder to its actual type.
    ///
    /// Every containment edge subscribed to `placeholder` is repointed to
    /// `new_type`, every affected container re-derives its abstractness,
    /// and containers whose shape became final are uniqued or collapsed.
    /// By the time this returns, the entire transitive closure of affected
    /// containers has been updated; `placeholder` itself is dead and
    /// forwards to `new_type`.
    ///
    /// Only unresolved placeholders may be refined, and never to
    /// themselves; misuse is reported as a [`RefineError`] and leaves the
    /// pool untouched.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn refine_abstract_type_to(
        &mut self,
        placeholder: Idx,
        new_type: Idx,
    ) -> Result<(), RefineError> {
        if self.tag(placeholder) != Tag::Opaque {
            return Err(RefineError::NotAPlaceholder {
                idx: placeholder,
                tag: self.tag(placeholder),
            });
        }
        if self.is_forwarded(placeholder) {
            return Err(RefineError::AlreadyResolved { placeholder });
        }
        let new_type = self.resolve(new_type);
        if new_type == placeholder {
            return Err(RefineError::SelfRefinement { placeholder });
        }
        self.refine_to(placeholder, new_type);
        Ok(())
    }

    /// Replace `old` with `new` in place: repoint every subscribed edge,
    /// then re-derive each affected container. Also used to collapse a
    /// just-completed duplicate into its canonical twin.
    fn refine_to(&mut self, old: Idx, new: Idx) {
        debug_assert_ne!(old, new);
        debug_assert!(!self.is_forwarded(old));
        tracing::debug!(%old, %new, "refining node in place");

        // The old node dies first so cascades triggered below skip it.
        self.node_flags[old.raw() as usize].insert(TypeFlags::FORWARDED);
        self.forward.insert(old, new);

        let edges = self.watchers.remove(&old).unwrap_or_default();
        let new_is_abstract = self.is_abstract(new);

        // Group repoints per container, preserving first-subscription
        // order so the cascade below is reproducible.
        let mut order: SmallVec<[Idx; 8]> = SmallVec::new();
        let mut positions: FxHashMap<Idx, SmallVec<[u32; 4]>> = FxHashMap::default();
        for edge in edges {
            // Subscriber lists may still hold edges of containers that
            // were themselves refined away; those edges are dead.
            if self.is_forwarded(edge.user) {
                continue;
            }
            if !positions.contains_key(&edge.user) {
                order.push(edge.user);
            }
            positions.entry(edge.user).or_default().push(edge.pos);
        }

        let mut pending: SmallVec<[(Idx, bool); 8]> = SmallVec::new();
        for &user in &order {
            let was_concrete = !self.is_abstract(user);
            if was_concrete {
                // The container's key is about to change; drop the stale
                // table entry while the storage it is computed from is
                // still intact.
                if let Some(key) = self.structural_key(user) {
                    self.tables.remove(&key);
                }
            }
            for &pos in &positions[&user] {
                self.write_contained(user, pos, new);
                if new_is_abstract {
                    self.subscribe(new, Edge { user, pos });
                }
            }
            pending.push((user, was_concrete));
        }

        for (user, was_concrete) in pending {
            if self.is_forwarded(user) {
                continue;
            }
            if was_concrete {
                self.unique_concrete(user);
            } else if self.is_abstract(user) {
                // Still flagged abstract; earlier cascades in this wave
                // may already have promoted it.
                self.reconsider(user);
            }
        }
    }

    /// Re-derive a container's abstractness after one of its edges
    /// changed. Shallow scan only: each child's flag is already current.
    fn reconsider(&mut self, user: Idx) {
        debug_assert!(self.is_abstract(user) && !self.is_forwarded(user));
        let count = self.contained_count(user);
        let mut has_abstract = false;
        let mut blocked_on_placeholder = false;
        for pos in 0..count {
            let child = self.contained(user, pos);
            if self.is_abstract(child) {
                has_abstract = true;
                if self.tag(child) == Tag::Opaque {
                    blocked_on_placeholder = true;
                    break;
                }
            }
        }
        if !has_abstract {
            self.make_concrete(&[user]);
        } else if !blocked_on_placeholder {
            // Every remaining abstract child is a composite: the only way
            // this container can still be non-final is through a cycle,
            // which the component check settles.
            self.promote_component(user);
        }
        // Otherwise an unresolved placeholder is still directly contained.
    }

    /// Flip a set of containers to concrete, then unique each and notify
    /// its subscribers. `members` is a single container in the common
    /// case, or a whole cycle promoted together.
    fn make_concrete(&mut self, members: &[Idx]) {
        for &m in members {
            self.node_flags[m.raw() as usize].remove(TypeFlags::ABSTRACT);
        }
        for &m in members {
            if !self.is_forwarded(m) {
                self.unique_concrete(m);
            }
        }
        for &m in members {
            if !self.is_forwarded(m) {
                self.notify_became_concrete(m);
            }
        }
    }

    /// Insert a newly-concrete container under its now-final key, or
    /// collapse it into a pre-existing duplicate.
    fn unique_concrete(&mut self, node: Idx) {
        debug_assert!(!self.is_abstract(node) && !self.is_forwarded(node));
        let Some(key) = self.structural_key(node) else {
            tracing::error!(%node, "uniquing a kind that has no structural key");
            debug_assert!(false, "uniquing a kind that has no structural key");
            return;
        };
        match self.tables.lookup(&key) {
            Some(existing) if existing == node => {}
            Some(existing) => {
                tracing::debug!(%node, %existing, "collapsing duplicate into canonical instance");
                self.refine_to(node, existing);
            }
            None => self.tables.insert(key, node),
        }
    }

    /// Tell a newly-concrete node's subscribers that its identity is
    /// unchanged but its shape is now final. Subscriptions to it are
    /// dropped: concrete nodes are never refined.
    fn notify_became_concrete(&mut self, node: Idx) {
        let Some(edges) = self.watchers.remove(&node) else {
            return;
        };
        let mut users: SmallVec<[Idx; 8]> = SmallVec::new();
        for edge in edges {
            if !users.contains(&edge.user) {
                users.push(edge.user);
            }
        }
        for user in users {
            if self.is_forwarded(user) || !self.is_abstract(user) {
                continue;
            }
            self.reconsider(user);
        }
    }

    /// Check whether the strongly-connected component containing `start`
    /// has lost its last reason to be abstract, and promote the whole
    /// component if so.
    ///
    /// A component stays abstract if any member is itself a placeholder
    /// or any member reaches an abstract type outside the component. The
    /// walk is bounded to the abstract subgraph reachable from `start`.
    fn promote_component(&mut self, start: Idx) {
        let component = self.component_containing(start);
        let in_component: FxHashSet<Idx> = component.iter().copied().collect();
        for &m in &component {
            if self.tag(m) == Tag::Opaque {
                return;
            }
            for pos in 0..self.contained_count(m) {
                let child = self.contained(m, pos);
                if self.is_abstract(child) && !in_component.contains(&child) {
                    return;
                }
            }
        }
        tracing::trace!(members = component.len(), "promoting cycle to concrete");
        self.make_concrete(&component);
    }

    /// Strongly-connected component of `start` in the abstract subgraph,
    /// in discovery order. Iterative Tarjan; children are visited in
    /// containment order so the result is deterministic.
    fn component_containing(&self, start: Idx) -> Vec<Idx> {
        struct Frame {
            node: Idx,
            child: usize,
        }

        let mut index_of: FxHashMap<Idx, u32> = FxHashMap::default();
        let mut low: FxHashMap<Idx, u32> = FxHashMap::default();
        let mut on_stack: FxHashSet<Idx> = FxHashSet::default();
        let mut stack: Vec<Idx> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut next_index = 0u32;

        index_of.insert(start, next_index);
        low.insert(start, next_index);
        next_index += 1;
        stack.push(start);
        on_stack.insert(start);
        frames.push(Frame {
            node: start,
            child: 0,
        });

        loop {
            let Some(top) = frames.last_mut() else {
                break;
            };
            let node = top.node;
            let child_pos = top.child;
            top.child += 1;

            if child_pos < self.contained_count(node) {
                let child = self.contained(node, child_pos);
                if !self.is_abstract(child) {
                    continue;
                }
                if let Some(&child_index) = index_of.get(&child) {
                    if on_stack.contains(&child) {
                        let lowered = low[&node].min(child_index);
                        low.insert(node, lowered);
                    }
                } else {
                    index_of.insert(child, next_index);
                    low.insert(child, next_index);
                    next_index += 1;
                    stack.push(child);
                    on_stack.insert(child);
                    frames.push(Frame {
                        node: child,
                        child: 0,
                    });
                }
            } else {
                let node_low = low[&node];
                let node_index = index_of[&node];
                frames.pop();
                if let Some(parent) = frames.last() {
                    let lowered = low[&parent.node].min(node_low);
                    low.insert(parent.node, lowered);
                }
                if node_low == node_index {
                    // Root of a component: pop its members.
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack.remove(&member);
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    if component.contains(&start) {
                        component.reverse();
                        return component;
                    }
                }
            }
        }

        // Tarjan always yields the component containing the walk's root.
        tracing::error!(%start, "component walk ended without finding its root");
        debug_assert!(false, "component walk ended without finding its root");
        vec![start]
    }
}

#[cfg(test)]
mod tests;
