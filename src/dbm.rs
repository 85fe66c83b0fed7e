//! Difference-bound matrices: a weighted directed graph over variable
//! difference reference points, with a Bellman-Ford negative-cycle test
//! and a Floyd-Warshall all-pairs shortest-path closure over `Z u {+inf}`.
//!
//! Not yet wired into the fixpoint engine (spec §1); it is a self-contained
//! domain exercised directly through this module's public API and tests.

use std::collections::HashMap;
use std::hash::Hash;

/// A weight in the extended set `Z u {+inf}`. `+inf` is the identity for
/// [`Weight::min_ext`] and absorbing for [`Weight::add_ext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// A concrete bound.
    Finite(i64),
    /// No bound known; absent edge.
    Infinite,
}

impl Weight {
    pub fn min_ext(self, other: Self) -> Self {
        match (self, other) {
            (Weight::Infinite, x) | (x, Weight::Infinite) => x,
            (Weight::Finite(a), Weight::Finite(b)) => Weight::Finite(a.min(b)),
        }
    }

    pub fn add_ext(self, other: Self) -> Self {
        match (self, other) {
            (Weight::Infinite, _) | (_, Weight::Infinite) => Weight::Infinite,
            (Weight::Finite(a), Weight::Finite(b)) => Weight::Finite(a + b),
        }
    }

    fn lt(self, other: Self) -> bool {
        match (self, other) {
            (Weight::Infinite, _) => false,
            (Weight::Finite(_), Weight::Infinite) => true,
            (Weight::Finite(a), Weight::Finite(b)) => a < b,
        }
    }
}

/// A difference-bound matrix over nodes of type `N`.
///
/// Edge `s -(w)-> t` denotes the constraint `t - s <= w`. A missing edge is
/// an implicit weight of `+inf`. At most one edge exists between any
/// ordered pair of nodes; incoming and outgoing adjacency are kept in
/// lockstep by [`set_weight`](Self::set_weight), the single mutator, per
/// the invariant in spec §4.C/§9.
pub struct Dbm<N: Clone + Eq + Hash> {
    nodes: Vec<N>,
    outgoing: HashMap<N, Vec<(N, i64)>>,
    incoming: HashMap<N, Vec<(N, i64)>>,
}

impl<N: Clone + Eq + Hash> Default for Dbm<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone + Eq + Hash> Dbm<N> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }

    fn ensure_node(&mut self, n: &N) {
        if !self.outgoing.contains_key(n) {
            self.nodes.push(n.clone());
            self.outgoing.insert(n.clone(), Vec::new());
            self.incoming.insert(n.clone(), Vec::new());
        }
    }

    /// All nodes currently in the graph, in insertion order.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Insert, update, or (with `Weight::Infinite`) remove the edge
    /// `source -> target`. Auto-adds both endpoints as nodes.
    pub fn set_weight(&mut self, source: &N, weight: Weight, target: &N) {
        self.ensure_node(source);
        self.ensure_node(target);

        let out = self.outgoing.get_mut(source).unwrap();
        out.retain(|(t, _)| t != target);
        let inc = self.incoming.get_mut(target).unwrap();
        inc.retain(|(s, _)| s != source);

        if let Weight::Finite(w) = weight {
            self.outgoing.get_mut(source).unwrap().push((target.clone(), w));
            self.incoming.get_mut(target).unwrap().push((source.clone(), w));
        }
    }

    /// Stored weight for `source -> target`, or `+inf` if no such edge
    /// (or either endpoint is unknown).
    pub fn get_weight(&self, source: &N, target: &N) -> Weight {
        match self.outgoing.get(source) {
            Some(edges) => edges
                .iter()
                .find(|(t, _)| t == target)
                .map(|&(_, w)| Weight::Finite(w))
                .unwrap_or(Weight::Infinite),
            None => Weight::Infinite,
        }
    }

    /// Outgoing edges from `n` as `(target, weight)` pairs.
    pub fn outgoings(&self, n: &N) -> &[(N, i64)] {
        self.outgoing.get(n).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming edges to `n` as `(source, weight)` pairs.
    pub fn incomings(&self, n: &N) -> &[(N, i64)] {
        self.incoming.get(n).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A structural copy: same nodes and edges, independent storage.
    pub fn copy(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            outgoing: self.outgoing.clone(),
            incoming: self.incoming.clone(),
        }
    }

    /// Bellman-Ford from a synthetic source with zero-weight edges to
    /// every real node, run for `|V|-1` relaxation rounds plus one
    /// detection round. The synthetic source is added and removed within
    /// this call and never observable by the caller; the graph is
    /// otherwise unchanged on return.
    pub fn exists_negative_cycle(&self) -> bool
    where
        N: std::fmt::Debug,
    {
        if self.nodes.is_empty() {
            return false;
        }
        let mut distance: HashMap<N, Weight> =
            self.nodes.iter().map(|n| (n.clone(), Weight::Finite(0))).collect();

        for _ in 0..self.nodes.len().saturating_sub(1) {
            let mut changed = false;
            for source in &self.nodes {
                let d_source = distance[source];
                for &(ref target, w) in self.outgoings(source) {
                    let candidate = d_source.add_ext(Weight::Finite(w));
                    if candidate.lt(distance[target]) {
                        distance.insert(target.clone(), candidate);
                        changed = true;
                    }
                }
            }
            if !changed {
                return false;
            }
        }

        for source in &self.nodes {
            let d_source = distance[source];
            for &(ref target, w) in self.outgoings(source) {
                let candidate = d_source.add_ext(Weight::Finite(w));
                if candidate.lt(distance[target]) {
                    log::debug!("negative cycle detected reaching {target:?} via {source:?}");
                    return true;
                }
            }
        }
        false
    }

    /// Floyd-Warshall all-pairs shortest-path closure. Returns a fresh
    /// graph; `self` is not modified. After closure every self-loop is
    /// normalized to weight `0`.
    pub fn find_shortest_paths(&self) -> Self {
        let mut sp = self.copy();
        for node in &self.nodes {
            for source in &self.nodes {
                for target in &self.nodes {
                    let via = sp.get_weight(source, node).add_ext(sp.get_weight(node, target));
                    let direct = sp.get_weight(source, target);
                    let best = direct.min_ext(via);
                    sp.set_weight(source, best, target);
                }
            }
        }
        for node in &self.nodes {
            sp.set_weight(node, Weight::Finite(0), node);
        }
        sp
    }

    /// Textual dump for debugging, not used by the core itself.
    pub fn dump(&self) -> String
    where
        N: std::fmt::Debug,
    {
        let mut out = String::new();
        for node in &self.nodes {
            out.push_str(&format!("node: {node:?}\n"));
            for (target, w) in self.outgoings(node) {
                out.push_str(&format!("{node:?} -({w})-> {target:?}\n"));
            }
        }
        out
    }
}

impl<N: Clone + Eq + Hash> Clone for Dbm<N> {
    fn clone(&self) -> Self {
        self.copy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_edge_is_infinite() {
        let mut g: Dbm<&str> = Dbm::new();
        g.set_weight(&"a", Weight::Finite(3), &"b");
        assert_eq!(g.get_weight(&"b", &"a"), Weight::Infinite);
    }

    #[test]
    fn set_weight_replaces_existing_edge() {
        let mut g: Dbm<&str> = Dbm::new();
        g.set_weight(&"a", Weight::Finite(3), &"b");
        g.set_weight(&"a", Weight::Finite(7), &"b");
        assert_eq!(g.get_weight(&"a", &"b"), Weight::Finite(7));
        assert_eq!(g.incomings(&"b").len(), 1);
    }

    #[test]
    fn infinite_weight_removes_edge() {
        let mut g: Dbm<&str> = Dbm::new();
        g.set_weight(&"a", Weight::Finite(3), &"b");
        g.set_weight(&"a", Weight::Infinite, &"b");
        assert_eq!(g.get_weight(&"a", &"b"), Weight::Infinite);
        assert!(g.outgoings(&"a").is_empty());
        assert!(g.incomings(&"b").is_empty());
    }

    #[test]
    fn no_negative_cycle_on_acyclic_graph() {
        let mut g: Dbm<&str> = Dbm::new();
        g.set_weight(&"a", Weight::Finite(1), &"b");
        g.set_weight(&"b", Weight::Finite(1), &"c");
        assert!(!g.exists_negative_cycle());
        // original graph unchanged: still only the two edges we set.
        assert_eq!(g.nodes().len(), 3);
    }

    #[test]
    fn detects_negative_cycle() {
        let mut g: Dbm<&str> = Dbm::new();
        g.set_weight(&"a", Weight::Finite(1), &"b");
        g.set_weight(&"b", Weight::Finite(1), &"c");
        g.set_weight(&"c", Weight::Finite(-3), &"a");
        assert!(g.exists_negative_cycle());
    }

    #[test]
    fn shortest_paths_triangle_inequality_and_self_loops() {
        let mut g: Dbm<&str> = Dbm::new();
        g.set_weight(&"a", Weight::Finite(5), &"b");
        g.set_weight(&"b", Weight::Finite(2), &"c");
        g.set_weight(&"a", Weight::Finite(10), &"c");
        let sp = g.find_shortest_paths();

        assert_eq!(sp.get_weight(&"a", &"c"), Weight::Finite(7));
        for n in sp.nodes() {
            assert_eq!(sp.get_weight(n, n), Weight::Finite(0));
        }
        for &s in sp.nodes() {
            for &t in sp.nodes() {
                for &u in sp.nodes() {
                    let direct = sp.get_weight(&s, &t);
                    let via = sp.get_weight(&s, &u).add_ext(sp.get_weight(&u, &t));
                    // triangle inequality: w(s,t) <= w(s,u) + w(u,t)
                    assert!(!via.lt(direct), "{s}->{t} direct {direct:?} exceeds via {u} {via:?}");
                }
            }
        }
        assert_eq!(g.get_weight(&"a", &"c"), Weight::Finite(10));
    }
}
