//! The box (interval) abstract domain: a lattice of partial mappings from
//! declared variables to intervals, plus sound transformers for assignment
//! and guard conditions and a landmark-driven widening operator.

use std::collections::{BTreeMap, HashMap};

use crate::error::{AnalysisError, Diagnostic};
use crate::expr::{BinOp, Expr, Guard, Operand, RelOp};
use crate::interval::{Interval, ModuloResult};

/// Dense key for a declared variable, assigned by [`BoxFactory::add_var`]
/// in declaration order — the same "register once, refer to by a small
/// key" shape `cranelift_entity::EntityRef` gives IR values, adapted here
/// because the keys are driver-chosen names rather than crate-allocated
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u32);

struct VarDescriptor {
    name: String,
    min: i64,
    max: i64,
}

/// Owns variable declarations and the landmark set; the factory is the
/// only place that knows how to interpret a variable's top interval, so
/// every lattice operation is a method on it rather than on `Element`
/// directly.
pub struct BoxFactory {
    vars: Vec<VarDescriptor>,
    name_to_id: HashMap<String, VarId>,
    landmarks: Vec<i64>,
}

/// One element of the box lattice.
///
/// `Bottom` is the explicit empty-set variant called for in spec §9 rather
/// than a sentinel `None` threaded through every map lookup. `Entries` is
/// kept in normal form: it never stores an interval equal to that
/// variable's declared top interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// The empty set of valuations — unreachable, or the result of an
    /// infeasible guard or a division-by-zero collapse.
    Bottom,
    /// A non-empty box, given by its per-variable interval bounds. Any
    /// variable absent from the map is implicitly at its declared top
    /// interval.
    Entries(BTreeMap<VarId, Interval>),
}

impl BoxFactory {
    /// Create a factory; `default_min`/`default_max` are unused by the
    /// lattice itself (every variable must declare its own range via
    /// [`add_var`](Self::add_var)) but are accepted for driver
    /// convenience, matching spec §6's `BoxFactory(default_min,
    /// default_max)` constructor.
    pub fn new(_default_min: i64, _default_max: i64) -> Self {
        Self {
            vars: Vec::new(),
            name_to_id: HashMap::new(),
            landmarks: Vec::new(),
        }
    }

    /// Register a variable and its declared range, returning its key.
    /// Re-declaring the same name updates its range in place.
    pub fn add_var(&mut self, name: &str, min: i64, max: i64) -> VarId {
        if let Some(&id) = self.name_to_id.get(name) {
            let desc = &mut self.vars[id.0 as usize];
            desc.min = min;
            desc.max = max;
            return id;
        }
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarDescriptor {
            name: name.to_string(),
            min,
            max,
        });
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    /// Insert a landmark constant used only by [`widen`](Self::widen). The
    /// set is kept sorted so widening can binary-search it, but duplicates
    /// are harmless and not deduplicated.
    pub fn add_landmark(&mut self, c: i64) {
        let pos = self.landmarks.partition_point(|&x| x < c);
        self.landmarks.insert(pos, c);
    }

    /// The empty map, i.e. top: every variable unconstrained.
    pub fn top(&self) -> Element {
        Element::Entries(BTreeMap::new())
    }

    /// Bottom: the empty set of valuations.
    pub fn bot(&self) -> Element {
        Element::Bottom
    }

    fn var_id(&self, name: &str) -> Result<VarId, AnalysisError> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| AnalysisError::DomainMisuse(format!("undeclared variable: {name}")))
    }

    fn var_name(&self, id: VarId) -> &str {
        &self.vars[id.0 as usize].name
    }

    fn top_interval(&self, id: VarId) -> Interval {
        let desc = &self.vars[id.0 as usize];
        Interval::new(desc.min, desc.max)
    }

    /// Interval bound to `id` in `e`, falling back to its declared top
    /// interval when absent. `Bottom` has no meaningful per-variable
    /// interval; callers must not reach this for a bottom element.
    fn interval_of(&self, e: &Element, id: VarId) -> Interval {
        match e {
            Element::Bottom => self.top_interval(id),
            Element::Entries(map) => map.get(&id).copied().unwrap_or_else(|| self.top_interval(id)),
        }
    }

    /// Drop entries equal to their variable's declared top interval, so
    /// structural equality on the map coincides with lattice equality.
    fn normalize(&self, mut map: BTreeMap<VarId, Interval>) -> Element {
        map.retain(|&id, &mut iv| iv != self.top_interval(id));
        Element::Entries(map)
    }

    fn operand_interval(&self, e: &Element, op: &Operand) -> Result<Interval, AnalysisError> {
        match op {
            Operand::Lit(v) => Ok(Interval::singleton(*v)),
            Operand::Var(name) => Ok(self.interval_of(e, self.var_id(name)?)),
        }
    }

    /// `e1 <= e2`: for every variable, `interval(e1, x)` is a subset of
    /// `interval(e2, x)`. Bottom is below everything; nothing but bottom
    /// is below bottom.
    pub fn order(&self, e1: &Element, e2: &Element) -> bool {
        match (e1, e2) {
            (Element::Bottom, _) => true,
            (_, Element::Bottom) => false,
            (Element::Entries(m1), Element::Entries(m2)) => {
                m1.keys().chain(m2.keys()).all(|&id| {
                    self.interval_of(e1, id).is_subset_of(self.interval_of(e2, id))
                })
            }
        }
    }

    /// Lattice equality: `order(a,b) && order(b,a)`.
    pub fn equal(&self, e1: &Element, e2: &Element) -> bool {
        self.order(e1, e2) && self.order(e2, e1)
    }

    /// Pointwise interval union, restricted to variables present in both
    /// maps — a variable absent from one side is already at its top
    /// interval there and the join cannot constrain it further.
    pub fn join(&self, e1: &Element, e2: &Element) -> Element {
        match (e1, e2) {
            (Element::Bottom, other) | (other, Element::Bottom) => other.clone(),
            (Element::Entries(m1), Element::Entries(m2)) => {
                let mut result = BTreeMap::new();
                for (&id, &iv1) in m1 {
                    if let Some(&iv2) = m2.get(&id) {
                        result.insert(id, iv1.union(iv2));
                    }
                }
                self.normalize(result)
            }
        }
    }

    /// Pointwise interval intersection over the union of both maps'
    /// variables; collapses to bottom if any intersection is empty.
    pub fn meet(&self, e1: &Element, e2: &Element) -> Element {
        let (m1, m2) = match (e1, e2) {
            (Element::Bottom, _) | (_, Element::Bottom) => return Element::Bottom,
            (Element::Entries(m1), Element::Entries(m2)) => (m1, m2),
        };
        let mut result = m1.clone();
        for (&id, &iv2) in m2 {
            let current = result.get(&id).copied().unwrap_or_else(|| self.top_interval(id));
            match current.intersect(iv2) {
                Some(iv) => {
                    result.insert(id, iv);
                }
                None => return Element::Bottom,
            }
        }
        self.normalize(result)
    }

    /// Strongest postcondition of `target := expr`.
    pub fn assign(
        &self,
        e: &Element,
        target: &str,
        expr: &Expr,
    ) -> Result<(Element, Option<Diagnostic>), AnalysisError> {
        let Element::Entries(map) = e else {
            return Ok((Element::Bottom, None));
        };
        let target_id = self.var_id(target)?;

        let (value, diag) = match expr {
            // "Unary/constant forms evaluate as expr + 0."
            Expr::Atom(op) => (self.operand_interval(e, op)?.add(Interval::singleton(0)), None),
            Expr::Binop(op, a, b) => {
                let ia = self.operand_interval(e, a)?;
                let ib = self.operand_interval(e, b)?;
                match op {
                    BinOp::Add => (ia.add(ib), None),
                    BinOp::Sub => (ia.sub(ib), None),
                    BinOp::Mul => (ia.mul(ib), None),
                    BinOp::Mod => match ia.modulo(ib) {
                        ModuloResult::Ok(r) => (r, None),
                        ModuloResult::PossibleDivisionByZero(r) => {
                            (r, Some(Diagnostic::possible_division_by_zero(Some(target.to_string()))))
                        }
                        ModuloResult::DivisionByZero => {
                            return Ok((Element::Bottom, Some(Diagnostic::division_by_zero(Some(target.to_string())))));
                        }
                    },
                }
            }
        };

        let mut result = map.clone();
        result.insert(target_id, value);
        Ok((self.normalize(result), diag))
    }

    /// Strongest postcondition of `assume(cond)`.
    pub fn assume(&self, e: &Element, guard: &Guard) -> Result<Element, AnalysisError> {
        let Element::Entries(map) = e else {
            return Ok(Element::Bottom);
        };

        // a > b  ==  b < a ; a >= b == b <= a.
        let (op, lhs, rhs) = match guard.op {
            RelOp::Gt => (RelOp::Lt, &guard.rhs, &guard.lhs),
            RelOp::Ge => (RelOp::Le, &guard.rhs, &guard.lhs),
            other => (other, &guard.lhs, &guard.rhs),
        };

        // Validate both sides are declared, even literals-only guards would
        // be vacuous but we still want undeclared-variable misuse to surface.
        if let Operand::Var(n) = lhs {
            self.var_id(n)?;
        }
        if let Operand::Var(n) = rhs {
            self.var_id(n)?;
        }

        let il = self.operand_interval(e, lhs)?;
        let ir = self.operand_interval(e, rhs)?;
        let same_var = matches!((lhs, rhs), (Operand::Var(a), Operand::Var(b)) if a == b);

        let mut result = map.clone();
        let mut write_back = |result: &mut BTreeMap<VarId, Interval>, op: &Operand, value: Interval| {
            if let Operand::Var(name) = op {
                // Guard operands were already validated above, so this lookup
                // cannot fail.
                let id = self.name_to_id[name];
                result.insert(id, value);
            }
        };
        match op {
            RelOp::Eq => {
                let Some(refined) = il.intersect(ir) else {
                    return Ok(Element::Bottom);
                };
                write_back(&mut result, lhs, refined);
                write_back(&mut result, rhs, refined);
            }
            RelOp::Ne => {
                if same_var {
                    return Ok(Element::Bottom);
                }
                if il.is_singleton() && ir.is_singleton() && il == ir {
                    return Ok(Element::Bottom);
                }
            }
            RelOp::Le => {
                let (Some(new_l), Some(new_r)) = (
                    Interval::try_new(il.lo(), il.hi().min(ir.hi())),
                    Interval::try_new(il.lo().max(ir.lo()), ir.hi()),
                ) else {
                    return Ok(Element::Bottom);
                };
                write_back(&mut result, lhs, new_l);
                write_back(&mut result, rhs, new_r);
            }
            RelOp::Lt => {
                if same_var {
                    return Ok(Element::Bottom);
                }
                let (Some(new_l), Some(new_r)) = (
                    Interval::try_new(il.lo(), il.hi().min(ir.hi() - 1)),
                    Interval::try_new((il.lo() + 1).max(ir.lo()), ir.hi()),
                ) else {
                    return Ok(Element::Bottom);
                };
                write_back(&mut result, lhs, new_l);
                write_back(&mut result, rhs, new_r);
            }
            RelOp::Gt | RelOp::Ge => unreachable!("rewritten above"),
        }

        Ok(self.normalize(result))
    }

    /// Widen `old -> new` at a designated widening point: per variable,
    /// a bound that moved outward escapes to the nearest landmark beyond
    /// it, or to the variable's declared bound if no landmark applies.
    pub fn widen(&self, old: &Element, new: &Element) -> Element {
        let (old_map, new_map) = match (old, new) {
            (Element::Bottom, _) => return new.clone(),
            (_, Element::Bottom) => return old.clone(),
            (Element::Entries(o), Element::Entries(n)) => (o, n),
        };

        let mut result = new_map.clone();
        for &id in old_map.keys().chain(new_map.keys()) {
            let (l1, r1) = {
                let iv = self.interval_of(old, id);
                (iv.lo(), iv.hi())
            };
            let (l2, r2) = {
                let iv = self.interval_of(new, id);
                (iv.lo(), iv.hi())
            };
            let desc = &self.vars[id.0 as usize];

            let new_l = if l1 > l2 {
                self.landmarks
                    .iter()
                    .rev()
                    .find(|&&c| c < l2)
                    .copied()
                    .unwrap_or(desc.min)
            } else {
                l2
            };
            let new_r = if r2 > r1 {
                self.landmarks
                    .iter()
                    .find(|&&c| c > r2)
                    .copied()
                    .unwrap_or(desc.max)
            } else {
                r2
            };

            result.insert(id, Interval::new(new_l, new_r));
        }

        self.normalize(result)
    }

    /// Render per spec §6: `<BOT>`, `<TOP>`, or `[x in [l,r], ...]` with
    /// variables in sorted-by-name order.
    pub fn to_string(&self, e: &Element) -> String {
        let Element::Entries(map) = e else {
            return "<BOT>".to_string();
        };
        if map.is_empty() {
            return "<TOP>".to_string();
        }
        let mut pairs: Vec<(&str, Interval)> =
            map.iter().map(|(&id, &iv)| (self.var_name(id), iv)).collect();
        pairs.sort_by_key(|&(name, _)| name);
        let body = pairs
            .iter()
            .map(|(name, iv)| format!("{name} in [{}, {}]", iv.lo(), iv.hi()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{body}]")
    }
}
