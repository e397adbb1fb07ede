//! Semantic binder and diagnostic engine.
//!
//! Given a parsed syntax tree and a seeded symbol table, this crate resolves
//! names, performs overload resolution, classifies conversions, folds
//! constant expressions, runs definite-assignment analysis, and reports
//! argument-rich diagnostics for every semantic error. It hands back a
//! bound tree whose every node carries its resolved symbol, type, and
//! conversion.
//!
//! Binding of independent declarations is embarrassingly parallel
//! (`bind_compilation`); binding inside one method body is strictly
//! sequential because flow state forms a dependency chain.

pub mod binder;
pub mod bound;
pub mod const_eval;
pub mod constraints;
pub mod convert;
pub mod diag;
pub mod flow;
pub mod overload;

pub use binder::{Binder, BindingContext, BoundMethod, MethodBody, bind_compilation};
pub use bound::{BoundCatch, BoundExpr, BoundExprKind, BoundStmt, BoundStmtKind, OperatorKind};
pub use const_eval::{ConstError, ConstValue, fold_binary, fold_unary};
pub use constraints::{check_constraint_cycles, check_type_arguments, check_variance};
pub use convert::{Conversion, ConversionKind, Conversions};
pub use diag::{CancelFlag, DiagnosticBag, SuppressionContext};
pub use flow::FlowAnalyzer;
pub use overload::{
    ApplicableCandidate, ArgumentInfo, InapplicableReason, ResolutionResult, delegate_compatible,
    resolve,
};
