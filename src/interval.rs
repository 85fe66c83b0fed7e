//! Primitive operations on integer intervals `(l, r)` with `l <= r`.
//!
//! An [`Interval`] always represents a non-empty set of integers; there is
//! no interval value for the empty set — that meaning is carried by the
//! enclosing lattice's bottom element (see [`crate::box_domain::Element`]).

use std::cmp::{max, min};

/// A closed integer interval `[l, r]`.
///
/// Represents `{ k in Z : l <= k <= r }`. Well-formedness (`l <= r`) is an
/// invariant of every safe constructor; callers that can produce an
/// ill-formed pair (e.g. intersection) get `Option<Interval>` back instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    l: i64,
    r: i64,
}

impl Interval {
    /// Build `[l, r]`. Panics if `l > r` — callers that may produce an
    /// ill-formed pair must go through [`Interval::try_new`] instead.
    pub fn new(l: i64, r: i64) -> Self {
        Self::try_new(l, r).expect("interval lower bound must not exceed upper bound")
    }

    /// Build `[l, r]`, returning `None` if `l > r` (the empty interval).
    pub fn try_new(l: i64, r: i64) -> Option<Self> {
        (l <= r).then_some(Self { l, r })
    }

    /// A single-point interval `[v, v]`.
    pub fn singleton(v: i64) -> Self {
        Self { l: v, r: v }
    }

    /// Lower bound.
    pub fn lo(self) -> i64 {
        self.l
    }

    /// Upper bound.
    pub fn hi(self) -> i64 {
        self.r
    }

    /// True if this interval contains exactly one point.
    pub fn is_singleton(self) -> bool {
        self.l == self.r
    }

    /// True if `v` lies within `[l, r]`.
    pub fn contains_point(self, v: i64) -> bool {
        self.l <= v && v <= self.r
    }

    /// True if `self` is a subset of `other`.
    pub fn is_subset_of(self, other: Self) -> bool {
        other.l <= self.l && self.r <= other.r
    }

    /// Interval union (convex hull): `[min(l1,l2), max(r1,r2)]`.
    pub fn union(self, other: Self) -> Self {
        Self {
            l: min(self.l, other.l),
            r: max(self.r, other.r),
        }
    }

    /// Interval intersection, or `None` if the result would be empty.
    pub fn intersect(self, other: Self) -> Option<Self> {
        Self::try_new(max(self.l, other.l), min(self.r, other.r))
    }

    /// `[l1+l2, r1+r2]`.
    pub fn add(self, other: Self) -> Self {
        Self {
            l: self.l + other.l,
            r: self.r + other.r,
        }
    }

    /// `[l1-r2, r1-l2]`.
    ///
    /// Note: a naive port of the source formula `(l1-l2, r2-l2)` is unsound
    /// whenever `l2 != r2` (it ignores half of the subtrahend's range); see
    /// the open question in `spec.md` §9. This is the corrected formula.
    pub fn sub(self, other: Self) -> Self {
        Self {
            l: self.l - other.r,
            r: self.r - other.l,
        }
    }

    /// Enumerate the four corner products and take their min/max.
    pub fn mul(self, other: Self) -> Self {
        let corners = [
            self.l * other.l,
            self.l * other.r,
            self.r * other.l,
            self.r * other.r,
        ];
        Self {
            l: corners.into_iter().min().unwrap(),
            r: corners.into_iter().max().unwrap(),
        }
    }

    /// `self % other`, per spec §4.A.
    pub fn modulo(self, other: Self) -> ModuloResult {
        if other.l == 0 && other.r == 0 {
            return ModuloResult::DivisionByZero;
        }
        if self.is_singleton() && other.is_singleton() {
            let v = self.l % other.l;
            return ModuloResult::Ok(Self::singleton(v));
        }
        let m = max(other.l.abs(), other.r.abs()) - 1;
        let result = if self.l >= 0 {
            Self { l: 0, r: m }
        } else {
            Self { l: -m, r: m }
        };
        if other.l <= 0 && 0 <= other.r {
            ModuloResult::PossibleDivisionByZero(result)
        } else {
            ModuloResult::Ok(result)
        }
    }
}

/// Outcome of [`Interval::modulo`], distinguishing the fatal-for-the-element
/// case from the "proceed but warn" case called out in spec §4.A/§7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuloResult {
    /// Computed cleanly.
    Ok(Interval),
    /// Divisor interval contains zero but is not exactly `{0}`; the bound
    /// is still sound and is returned alongside the warning.
    PossibleDivisionByZero(Interval),
    /// Divisor interval is exactly `{0}`.
    DivisionByZero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_convex_hull() {
        let a = Interval::new(1, 3);
        let b = Interval::new(5, 7);
        assert_eq!(a.union(b), Interval::new(1, 7));
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = Interval::new(1, 3);
        let b = Interval::new(5, 7);
        assert_eq!(a.intersect(b), None);
    }

    #[test]
    fn intersect_overlapping() {
        let a = Interval::new(1, 5);
        let b = Interval::new(3, 7);
        assert_eq!(a.intersect(b), Some(Interval::new(3, 5)));
    }

    #[test]
    fn subtraction_uses_corrected_formula() {
        // [0,0] - [0,10] should be [-10, 0], not the unsound [0,10].
        let a = Interval::singleton(0);
        let b = Interval::new(0, 10);
        assert_eq!(a.sub(b), Interval::new(-10, 0));
    }

    #[test]
    fn multiplication_handles_negative_corners() {
        let a = Interval::new(-3, 2);
        let b = Interval::new(-4, 5);
        // corners: 12, -15, -8, 10 -> min -15, max 12
        assert_eq!(a.mul(b), Interval::new(-15, 12));
    }

    #[test]
    fn modulo_by_exact_zero_fails() {
        let a = Interval::new(-5, 5);
        let zero = Interval::singleton(0);
        assert_eq!(a.modulo(zero), ModuloResult::DivisionByZero);
    }

    #[test]
    fn modulo_singletons() {
        let a = Interval::singleton(7);
        let b = Interval::singleton(3);
        assert_eq!(a.modulo(b), ModuloResult::Ok(Interval::singleton(1)));
    }

    #[test]
    fn modulo_wide_divisor_nonnegative_dividend() {
        let a = Interval::new(0, 65536);
        let b = Interval::new(2, 2);
        // singleton divisor but non-singleton dividend falls to the general case
        let r = a.modulo(b);
        assert_eq!(r, ModuloResult::Ok(Interval::new(0, 1)));
    }

    #[test]
    fn modulo_straddling_zero_warns_but_proceeds() {
        let a = Interval::new(-65536, 65536);
        let b = Interval::new(-1, 1);
        match a.modulo(b) {
            ModuloResult::PossibleDivisionByZero(r) => assert_eq!(r, Interval::new(-1, 1)),
            other => panic!("expected PossibleDivisionByZero, got {other:?}"),
        }
    }

    proptest::proptest! {
        #[test]
        fn union_is_commutative(l1 in -1000i64..1000, r1 in -1000i64..1000, l2 in -1000i64..1000, r2 in -1000i64..1000) {
            let (l1, r1) = (l1.min(r1), l1.max(r1));
            let (l2, r2) = (l2.min(r2), l2.max(r2));
            let a = Interval::new(l1, r1);
            let b = Interval::new(l2, r2);
            proptest::prop_assert_eq!(a.union(b), b.union(a));
        }
    }
}
