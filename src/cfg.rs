//! The control-flow graph model: locations, edges carrying an optional
//! guard and an ordered assignment list, and widening-point marking.
//!
//! Mirrors the predecessor/successor bookkeeping shape of
//! `cranelift_codegen`'s `ControlFlowGraph` (`flowgraph.rs`), generalized
//! from dense `Block` keys to an arbitrary hashable location type, since a
//! driver here supplies its own location identifiers rather than the crate
//! allocating them.

use std::collections::BTreeMap;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::expr::{Assignment, Guard};

/// Payload carried by a CFG edge: an optional guard, taken unconditionally
/// when absent, followed by an ordered list of assignments. Most edges
/// carry zero or one assignment, so the list is inlined up to four entries
/// rather than heap-allocated, the same way `cranelift_codegen` inlines
/// short instruction argument lists.
#[derive(Debug, Clone, Default)]
pub struct EdgePayload {
    /// Condition gating this edge; `None` means the edge is taken
    /// unconditionally.
    pub guard: Option<Guard>,
    /// Assignments applied in order after the guard is assumed.
    pub assignments: SmallVec<[Assignment; 4]>,
}

/// A control-flow graph over locations of type `L`. At most one edge is
/// kept per ordered pair of locations — setting an edge again for the
/// same pair replaces the previous payload.
pub struct Cfg<L: Clone + Eq + Hash + Ord> {
    init: L,
    end: L,
    locations: Vec<L>,
    widen_points: Vec<L>,
    edges: BTreeMap<(L, L), EdgePayload>,
}

impl<L: Clone + Eq + Hash + Ord> Cfg<L> {
    /// Create a CFG with just its two designated locations.
    pub fn new(init: L, end: L) -> Self {
        Self {
            locations: vec![init.clone(), end.clone()],
            init,
            end,
            widen_points: Vec::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Entry location.
    pub fn init(&self) -> &L {
        &self.init
    }

    /// Exit location.
    pub fn end(&self) -> &L {
        &self.end
    }

    /// Register an additional location, optionally marking it as a
    /// widening point. Re-adding an existing location only updates its
    /// widening-point status.
    pub fn add_location(&mut self, id: L, widen: bool) {
        if !self.locations.contains(&id) {
            self.locations.push(id.clone());
        }
        if widen && !self.widen_points.contains(&id) {
            self.widen_points.push(id);
        }
    }

    /// All locations known to this CFG, including `init`/`end`.
    pub fn locations(&self) -> &[L] {
        &self.locations
    }

    /// Locations marked as widening points.
    pub fn widen_points(&self) -> &[L] {
        &self.widen_points
    }

    /// Set (or replace) the edge `s -> t`.
    pub fn set_edge(&mut self, s: L, t: L, guard: Option<Guard>, assignments: Vec<Assignment>) {
        self.add_location(s.clone(), false);
        self.add_location(t.clone(), false);
        self.edges.insert(
            (s, t),
            EdgePayload {
                guard,
                assignments: SmallVec::from_vec(assignments),
            },
        );
    }

    /// Edges targeting `loc`, as `(source, payload)` pairs.
    pub fn edges_into<'a>(&'a self, loc: &'a L) -> impl Iterator<Item = (&'a L, &'a EdgePayload)> + 'a {
        self.edges
            .iter()
            .filter(move |((_, t), _)| t == loc)
            .map(|((s, _), payload)| (s, payload))
    }

    /// Textual dump for debugging, not used by the core itself.
    pub fn dump(&self) -> String
    where
        L: std::fmt::Debug,
    {
        let mut out = String::new();
        for ((s, t), payload) in &self.edges {
            out.push_str(&format!("{s:?} -> {t:?}\n"));
            match &payload.guard {
                Some(g) => out.push_str(&format!("\t{g:?}\n")),
                None => out.push_str("\t[True]\n"),
            }
            for a in &payload.assignments {
                out.push_str(&format!("\t@<{a:?}>\n"));
            }
        }
        out
    }
}
