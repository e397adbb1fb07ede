//! Index-based storage for syntax nodes.

use crate::node::{Argument, BinaryOp, CatchClause, Expr, ExprKind, LitValue, Stmt, StmtKind};
use sable_common::interner::Atom;
use sable_common::span::Span;

/// Index of an expression node in an `AstArena`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// Index of a statement node in an `AstArena`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StmtId(pub u32);

/// Owns every node of one method body (or one standalone expression).
///
/// Nodes are appended during parsing and read-only afterwards; the binder
/// never mutates the tree.
#[derive(Default, Debug)]
pub struct AstArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { kind, span });
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn expr_span(&self, id: ExprId) -> Span {
        self.expr(id).span
    }

    pub fn stmt_span(&self, id: StmtId) -> Span {
        self.stmt(id).span
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    // ---------------------------------------------------------------------
    // Builder helpers
    //
    // Tests and hosts synthesize trees directly; these cover the common
    // shapes without spelling out `ExprKind` every time.
    // ---------------------------------------------------------------------

    pub fn lit(&mut self, value: LitValue, text: Atom, span: Span) -> ExprId {
        self.alloc_expr(ExprKind::Literal { value, text }, span)
    }

    pub fn name(&mut self, name: Atom, span: Span) -> ExprId {
        self.alloc_expr(ExprKind::Name { name }, span)
    }

    pub fn member(&mut self, receiver: ExprId, name: Atom, span: Span) -> ExprId {
        self.alloc_expr(ExprKind::Member { receiver, name }, span)
    }

    pub fn call(&mut self, callee: ExprId, args: Vec<Argument>, span: Span) -> ExprId {
        self.alloc_expr(ExprKind::Call { callee, args }, span)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, span: Span) -> ExprId {
        self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, span)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId, span: Span) -> ExprId {
        self.alloc_expr(
            ExprKind::Assign {
                target,
                op: None,
                value,
            },
            span,
        )
    }

    pub fn block(&mut self, stmts: Vec<StmtId>, span: Span) -> StmtId {
        self.alloc_stmt(StmtKind::Block(stmts), span)
    }

    pub fn expr_stmt(&mut self, expr: ExprId, span: Span) -> StmtId {
        self.alloc_stmt(StmtKind::Expr(expr), span)
    }

    pub fn local_decl(
        &mut self,
        name: Atom,
        ty: Option<crate::node::TypeRef>,
        init: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        self.alloc_stmt(
            StmtKind::LocalDecl {
                name,
                ty,
                init,
                is_const: false,
            },
            span,
        )
    }

    pub fn try_stmt(
        &mut self,
        body: StmtId,
        catches: Vec<CatchClause>,
        finally: Option<StmtId>,
        span: Span,
    ) -> StmtId {
        self.alloc_stmt(
            StmtKind::Try {
                body,
                catches,
                finally,
            },
            span,
        )
    }
}
