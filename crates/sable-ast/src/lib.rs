//! The parsed syntax tree the semantic binder consumes.
//!
//! Parsing itself is an external collaborator; this crate only defines the
//! arena-allocated node shapes the parser hands over. Nodes are referenced by
//! index (`ExprId`/`StmtId`) into an `AstArena`, never by pointer, so the
//! tree is trivially `Send` and cheap to traverse.
//!
//! Type annotations in the tree (`TypeRef`) are opaque handles assigned by
//! the external declaration pass; the binder maps them onto its own interned
//! type ids.

pub mod arena;
pub mod node;

pub use arena::{AstArena, ExprId, StmtId};
pub use node::{
    Argument, BinaryOp, CatchClause, Expr, ExprKind, LitValue, RefKind, Stmt, StmtKind, TypeRef,
    UnaryOp,
};
