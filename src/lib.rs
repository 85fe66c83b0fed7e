//! Interval (box) abstract interpretation over small imperative
//! control-flow graphs.
//!
//! A driver declares variables and their ranges with a [`BoxFactory`],
//! builds a [`Cfg`] of locations and guarded/assigning edges, and hands
//! both to [`analyze`] to compute a sound over-approximation of every
//! variable's reachable values at every location. A standalone
//! difference-bound-matrix domain ([`dbm`]) is exposed for callers that
//! need relational (`x - y <= c`) reasoning instead of independent
//! per-variable intervals.
//!
//! ```
//! use flowbox::{BoxFactory, Cfg, analyze, AnalysisConfig, Expr, Operand, Assignment};
//!
//! let mut factory = BoxFactory::new(-128, 128);
//! factory.add_var("index", -65536, 65536);
//!
//! let mut cfg = Cfg::new(1, 2);
//! cfg.set_edge(1, 2, None, vec![Assignment {
//!     target: "index".to_string(),
//!     expr: Expr::Atom(Operand::Lit(0)),
//! }]);
//!
//! let (result, diagnostics) =
//!     analyze(&cfg, &factory, factory.top(), factory.bot(), AnalysisConfig::default()).unwrap();
//! assert_eq!(factory.to_string(&result[&2]), "[index in [0, 0]]");
//! assert!(diagnostics.is_empty());
//! ```

mod box_domain;
mod cfg;
pub mod dbm;
mod error;
mod expr;
mod fixpoint;
mod interval;

pub use box_domain::{BoxFactory, Element, VarId};
pub use cfg::{Cfg, EdgePayload};
pub use error::{AnalysisError, Diagnostic, DiagnosticKind};
pub use expr::{Assignment, BinOp, Expr, Guard, ListValue, Operand, RelOp};
pub use fixpoint::{analyze, AnalysisConfig};
pub use interval::{Interval, ModuloResult};
