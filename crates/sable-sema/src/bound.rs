//! The bound tree: the binder's typed output.
//!
//! Every bound expression carries its resolved type, the symbol it refers to
//! (when any), the conversion applied to reach its context's expected type,
//! and its folded constant value when one exists. A failed binding yields an
//! error node with the error type sentinel; descendants of error nodes are
//! still bound so one mistake produces one diagnostic, not a cascade.

use crate::const_eval::ConstValue;
use crate::convert::Conversion;
use sable_ast::node::{BinaryOp, UnaryOp};
use sable_common::span::Span;
use sable_symbols::{SymbolId, TypeId};

#[derive(Clone, Debug)]
pub struct BoundExpr {
    pub kind: BoundExprKind,
    pub ty: TypeId,
    /// The resolved symbol: the local/field/method/operator this node refers
    /// to. `INVALID` when the node refers to none.
    pub symbol: SymbolId,
    /// The conversion applied to this node by its context, identity when the
    /// types already matched.
    pub conversion: Conversion,
    /// Folded constant value, when the expression is a compile-time constant.
    pub constant: Option<ConstValue>,
    pub span: Span,
}

impl BoundExpr {
    pub fn new(kind: BoundExprKind, ty: TypeId, span: Span) -> Self {
        Self {
            kind,
            ty,
            symbol: SymbolId::INVALID,
            conversion: Conversion::identity(),
            constant: None,
            span,
        }
    }

    /// The recovery node: error type, no symbol, no constant. Anything that
    /// consumes it converts successfully and stays quiet.
    pub fn error(span: Span) -> Self {
        Self::new(BoundExprKind::Error, TypeId::ERROR, span)
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = symbol;
        self
    }

    #[must_use]
    pub fn with_constant(mut self, constant: ConstValue) -> Self {
        self.constant = Some(constant);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, BoundExprKind::Error) || self.ty.is_error()
    }

    /// True when the node or any descendant failed to bind. Callers use this
    /// to suppress secondary diagnostics.
    pub fn has_errors(&self) -> bool {
        if self.is_error() {
            return true;
        }
        match &self.kind {
            BoundExprKind::Error
            | BoundExprKind::Literal
            | BoundExprKind::Local
            | BoundExprKind::Parameter
            | BoundExprKind::This
            | BoundExprKind::DefaultValue => false,
            BoundExprKind::Field { receiver } | BoundExprKind::Property { receiver } => receiver
                .as_ref()
                .is_some_and(|r| r.has_errors()),
            BoundExprKind::Call { receiver, args } => {
                receiver.as_ref().is_some_and(|r| r.has_errors())
                    || args.iter().any(BoundExpr::has_errors)
            }
            BoundExprKind::New { args } => args.iter().any(BoundExpr::has_errors),
            BoundExprKind::Unary { operand, .. } => operand.has_errors(),
            BoundExprKind::Binary { lhs, rhs, .. } => lhs.has_errors() || rhs.has_errors(),
            BoundExprKind::Assign { target, value } => target.has_errors() || value.has_errors(),
            BoundExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => cond.has_errors() || then_expr.has_errors() || else_expr.has_errors(),
            BoundExprKind::Convert { operand } | BoundExprKind::Cast { operand } => {
                operand.has_errors()
            }
        }
    }
}

/// The shape of a bound expression. Name references are split by what they
/// resolved to; the `Convert` node materializes an applied conversion so the
/// lowering stage never re-runs classification.
#[derive(Clone, Debug)]
pub enum BoundExprKind {
    Error,
    Literal,
    Local,
    Parameter,
    This,
    Field { receiver: Option<Box<BoundExpr>> },
    Property { receiver: Option<Box<BoundExpr>> },
    Call {
        receiver: Option<Box<BoundExpr>>,
        /// Arguments in parameter order, conversions applied.
        args: Vec<BoundExpr>,
    },
    New { args: Vec<BoundExpr> },
    Unary {
        op: UnaryOp,
        operator: OperatorKind,
        operand: Box<BoundExpr>,
    },
    Binary {
        op: BinaryOp,
        operator: OperatorKind,
        lhs: Box<BoundExpr>,
        rhs: Box<BoundExpr>,
    },
    Assign {
        target: Box<BoundExpr>,
        value: Box<BoundExpr>,
    },
    Conditional {
        cond: Box<BoundExpr>,
        then_expr: Box<BoundExpr>,
        else_expr: Box<BoundExpr>,
    },
    /// An implicit conversion inserted by the binder; `conversion` on the
    /// node says which.
    Convert { operand: Box<BoundExpr> },
    /// An explicit source-level cast.
    Cast { operand: Box<BoundExpr> },
    DefaultValue,
}

/// Operator classification carried on bound unary/binary nodes for lowering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperatorKind {
    BuiltIn,
    /// Lifted over nullable operands.
    Lifted,
    UserDefined(SymbolId),
}

#[derive(Clone, Debug)]
pub struct BoundCatch {
    /// `None` for a catch-all clause; otherwise the caught exception type.
    pub exception_type: Option<TypeId>,
    pub local: SymbolId,
    pub body: BoundStmt,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct BoundStmt {
    pub kind: BoundStmtKind,
    pub span: Span,
}

impl BoundStmt {
    pub fn new(kind: BoundStmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Clone, Debug)]
pub enum BoundStmtKind {
    /// Local declaration; `init` already converted to the local's type.
    LocalDecl {
        local: SymbolId,
        init: Option<BoundExpr>,
    },
    Expr(BoundExpr),
    Block(Vec<BoundStmt>),
    If {
        cond: BoundExpr,
        then_branch: Box<BoundStmt>,
        else_branch: Option<Box<BoundStmt>>,
    },
    While {
        cond: BoundExpr,
        body: Box<BoundStmt>,
    },
    Return(Option<BoundExpr>),
    /// `Throw(None)` is a rethrow.
    Throw(Option<BoundExpr>),
    YieldReturn(BoundExpr),
    YieldBreak,
    Try {
        body: Box<BoundStmt>,
        catches: Vec<BoundCatch>,
        finally: Option<Box<BoundStmt>>,
    },
}
