//! Tagged expression/guard/assignment variants, plus a thin parser from the
//! heterogeneous list-encoded form described in spec §6.
//!
//! Per the design note in `spec.md` §9 ("Sum types over untyped lists"),
//! the engine itself only ever sees [`Expr`]/[`Guard`]/[`Operand`]; the
//! [`ListValue`] conversions exist solely for front-ends that still hand
//! over `['+', "x", 1]`-shaped data.

use crate::error::AnalysisError;

/// An operand in an arithmetic expression or guard: either a variable
/// reference or an integer literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Reference to a declared variable.
    Var(String),
    /// An integer literal.
    Lit(i64),
}

/// Binary arithmetic operator, per spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `a + b`.
    Add,
    /// `a - b`.
    Sub,
    /// `a * b`.
    Mul,
    /// `a % b`, per the divisor-straddles-zero resolution in spec §9.
    Mod,
}

impl BinOp {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "%" => Some(Self::Mod),
            _ => None,
        }
    }
}

/// An arithmetic expression: a bare operand, or a binary application of
/// two operands. No nested expressions, per spec §4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `[v]` — copy of a variable or a constant.
    Atom(Operand),
    /// `[op, a, b]`.
    Binop(BinOp, Operand, Operand),
}

/// Relational operator used in a guard, per spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    /// `a < b`.
    Lt,
    /// `a <= b`.
    Le,
    /// `a == b`.
    Eq,
    /// `a != b`.
    Ne,
    /// `a > b`, rewritten to `Lt` with swapped operands before evaluation.
    Gt,
    /// `a >= b`, rewritten to `Le` with swapped operands before evaluation.
    Ge,
}

impl RelOp {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }
}

/// A guard condition `lhs relop rhs`, taken unconditionally when absent
/// from an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    /// The relational operator comparing `lhs` to `rhs`.
    pub op: RelOp,
    /// Left-hand operand.
    pub lhs: Operand,
    /// Right-hand operand.
    pub rhs: Operand,
}

/// One assignment `target := expr`, evaluated left-to-right within an
/// edge's assignment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Name of the variable being assigned.
    pub target: String,
    /// Expression evaluated to produce the new value.
    pub expr: Expr,
}

/// A heterogeneous, list-encoded value, mirroring the untyped shape a
/// textual or JSON-like front-end would hand over: `['+', "x", 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListValue {
    /// An integer literal.
    Int(i64),
    /// A string, used for variable names and operator tokens.
    Str(String),
    /// A nested list, e.g. `['+', "x", 1]`.
    List(Vec<ListValue>),
}

impl ListValue {
    fn as_operand(&self) -> Result<Operand, AnalysisError> {
        match self {
            ListValue::Int(v) => Ok(Operand::Lit(*v)),
            ListValue::Str(s) => Ok(Operand::Var(s.clone())),
            other => Err(AnalysisError::DomainMisuse(format!(
                "expected a variable name or integer literal, got {other:?}"
            ))),
        }
    }
}

impl TryFrom<ListValue> for Expr {
    type Error = AnalysisError;

    fn try_from(value: ListValue) -> Result<Self, Self::Error> {
        match value {
            ListValue::List(items) => match items.as_slice() {
                [v] => Ok(Expr::Atom(v.as_operand()?)),
                [ListValue::Str(op), a, b] => {
                    let op = BinOp::from_str(op).ok_or_else(|| {
                        AnalysisError::DomainMisuse(format!("unknown binary operator: {op}"))
                    })?;
                    Ok(Expr::Binop(op, a.as_operand()?, b.as_operand()?))
                }
                other => Err(AnalysisError::DomainMisuse(format!(
                    "malformed expression list of length {}",
                    other.len()
                ))),
            },
            ListValue::Int(v) => Ok(Expr::Atom(Operand::Lit(v))),
            ListValue::Str(s) => Ok(Expr::Atom(Operand::Var(s))),
        }
    }
}

impl TryFrom<ListValue> for Guard {
    type Error = AnalysisError;

    fn try_from(value: ListValue) -> Result<Self, Self::Error> {
        let ListValue::List(items) = value else {
            return Err(AnalysisError::DomainMisuse(
                "guard must be a 3-element list".to_string(),
            ));
        };
        let [ListValue::Str(op), a, b] = items.as_slice() else {
            return Err(AnalysisError::DomainMisuse(
                "guard must be [relop, a, b]".to_string(),
            ));
        };
        let op = RelOp::from_str(op).ok_or_else(|| {
            AnalysisError::DomainMisuse(format!("unknown relational operator: {op}"))
        })?;
        Ok(Guard {
            op,
            lhs: a.as_operand()?,
            rhs: b.as_operand()?,
        })
    }
}

impl TryFrom<ListValue> for Assignment {
    type Error = AnalysisError;

    fn try_from(value: ListValue) -> Result<Self, Self::Error> {
        let ListValue::List(items) = value else {
            return Err(AnalysisError::DomainMisuse(
                "assignment must be a 2-element list".to_string(),
            ));
        };
        let [ListValue::Str(target), expr] = items.as_slice() else {
            return Err(AnalysisError::DomainMisuse(
                "assignment must be [target_var, expression]".to_string(),
            ));
        };
        Ok(Assignment {
            target: target.clone(),
            expr: expr.clone().try_into()?,
        })
    }
}
