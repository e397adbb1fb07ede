//! Expression and statement node definitions.

use crate::arena::{ExprId, StmtId};
use sable_common::interner::Atom;
use sable_common::span::Span;

/// An opaque type annotation handle.
///
/// The external declaration pass resolves type syntax (`int`, `A<B>[]`, …)
/// and annotates the tree with handles that the binder maps 1:1 onto its
/// interned type ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef(pub u32);

/// Binary operator tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    LogicalAnd,
    LogicalOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// The source token, as diagnostics print it.
    pub const fn token(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub const fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

/// Unary operator tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub const fn token(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

pub use sable_common::common::RefKind;

/// A literal value as the parser produced it.
///
/// Integer literals keep an `i128` so out-of-range values (e.g. `2147483648`
/// targeting `int`) survive until the constant evaluator can report them
/// against their declared type, citing the original `text`.
#[derive(Clone, Debug, PartialEq)]
pub enum LitValue {
    Int(i128),
    Float(f64),
    /// Decimal literals keep their text; folding them is the backend's job.
    Decimal,
    Bool(bool),
    Char(char),
    Str(Atom),
    Null,
}

/// An argument to an invocation or object creation.
#[derive(Clone, Debug)]
pub struct Argument {
    /// `Some` for named arguments (`f(x: 1)`).
    pub name: Option<Atom>,
    pub ref_kind: RefKind,
    pub expr: ExprId,
}

impl Argument {
    pub fn positional(expr: ExprId) -> Self {
        Self {
            name: None,
            ref_kind: RefKind::None,
            expr,
        }
    }

    pub fn named(name: Atom, expr: ExprId) -> Self {
        Self {
            name: Some(name),
            ref_kind: RefKind::None,
            expr,
        }
    }

    pub fn by_ref(ref_kind: RefKind, expr: ExprId) -> Self {
        Self {
            name: None,
            ref_kind,
            expr,
        }
    }
}

/// An expression node.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    /// A literal, with its original source text for diagnostics.
    Literal { value: LitValue, text: Atom },
    /// A simple name reference.
    Name { name: Atom },
    /// `this`
    This,
    /// `receiver.name`
    Member { receiver: ExprId, name: Atom },
    /// `callee(args…)`; callee is a `Name` or `Member`.
    Call { callee: ExprId, args: Vec<Argument> },
    /// `new T(args…)`
    New { ty: TypeRef, args: Vec<Argument> },
    Unary { op: UnaryOp, operand: ExprId },
    Binary { op: BinaryOp, lhs: ExprId, rhs: ExprId },
    /// `target = value`, or compound `target op= value`.
    Assign { target: ExprId, op: Option<BinaryOp>, value: ExprId },
    /// `cond ? then_expr : else_expr`
    Conditional { cond: ExprId, then_expr: ExprId, else_expr: ExprId },
    /// `(T)expr`
    Cast { ty: TypeRef, expr: ExprId },
    /// `default(T)`
    Default { ty: TypeRef },
    Paren { inner: ExprId },
}

/// A catch clause of a `try` statement.
#[derive(Clone, Debug)]
pub struct CatchClause {
    /// `None` for a catch-all clause.
    pub ty: Option<TypeRef>,
    pub name: Option<Atom>,
    pub body: StmtId,
    pub span: Span,
}

/// A statement node.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    /// Local variable declaration, optionally `const`.
    LocalDecl {
        name: Atom,
        ty: Option<TypeRef>,
        init: Option<ExprId>,
        is_const: bool,
    },
    Expr(ExprId),
    Block(Vec<StmtId>),
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    Return(Option<ExprId>),
    Throw(Option<ExprId>),
    YieldReturn(ExprId),
    YieldBreak,
    Try {
        body: StmtId,
        catches: Vec<CatchClause>,
        finally: Option<StmtId>,
    },
}
