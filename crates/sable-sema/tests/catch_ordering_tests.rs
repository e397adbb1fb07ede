//! Throw-site type checking and catch-clause reachability ordering.

use sable_ast::arena::{AstArena, ExprId, StmtId};
use sable_ast::node::{CatchClause, ExprKind, LitValue, StmtKind, TypeRef};
use sable_common::diagnostics::diagnostic_codes as dc;
use sable_common::interner::Interner;
use sable_common::span::Span;
use sable_sema::{Binder, BindingContext, DiagnosticBag, SuppressionContext};
use sable_symbols::{Symbol, SymbolId, SymbolKind, SymbolTable, TypeId};
use std::cell::Cell;
use std::sync::Arc;

struct Fixture {
    table: SymbolTable,
    arena: AstArena,
    class: SymbolId,
    method: SymbolId,
    exception: TypeId,
    io_exception: TypeId,
    next: Cell<u32>,
}

impl Fixture {
    fn new() -> Self {
        let table = SymbolTable::new(Arc::new(Interner::new()));
        let class_name = table.names.intern("C");
        let class = table
            .symbols
            .register(Symbol::new(SymbolKind::Class, class_name, TypeId::ERROR));
        let method_name = table.names.intern("M");
        let method = table.symbols.register(
            Symbol::new(SymbolKind::Method, method_name, TypeId::VOID).with_container(class),
        );
        table.symbols.add_member(class, method);

        let exception_name = table.names.intern("Exception");
        let exception_symbol = table
            .symbols
            .register(Symbol::new(SymbolKind::Class, exception_name, TypeId::ERROR));
        let exception = table.types.named(exception_symbol, vec![]);
        let io_name = table.names.intern("IOException");
        let io_symbol = table.symbols.register(
            Symbol::new(SymbolKind::Class, io_name, TypeId::ERROR).with_base(exception),
        );
        let io_exception = table.types.named(io_symbol, vec![]);

        Self {
            table,
            arena: AstArena::new(),
            class,
            method,
            exception,
            io_exception,
            next: Cell::new(0),
        }
    }

    fn span(&self) -> Span {
        let start = self.next.get();
        self.next.set(start + 10);
        Span::new(start, 5)
    }

    fn catch(&mut self, ty: Option<TypeId>) -> CatchClause {
        let body_span = self.span();
        let body = self.arena.block(vec![], body_span);
        CatchClause {
            ty: ty.map(|t| TypeRef(t.0)),
            name: None,
            body,
            span: self.span(),
        }
    }

    fn try_with(&mut self, catches: Vec<CatchClause>) -> StmtId {
        let body_span = self.span();
        let try_body = self.arena.block(vec![], body_span);
        let span = self.span();
        let try_stmt = self.arena.try_stmt(try_body, catches, None, span);
        self.arena.block(vec![try_stmt], span)
    }

    fn throw(&mut self, value: Option<ExprId>) -> StmtId {
        let span = self.span();
        let throw = self.arena.alloc_stmt(StmtKind::Throw(value), span);
        self.arena.block(vec![throw], span)
    }

    fn new_of(&mut self, ty: TypeId) -> ExprId {
        let span = self.span();
        self.arena.alloc_expr(
            ExprKind::New {
                ty: TypeRef(ty.0),
                args: Vec::new(),
            },
            span,
        )
    }

    fn ctx(&self) -> BindingContext {
        BindingContext {
            container: Some(self.class),
            method: self.method,
            params: Vec::new(),
            is_static: false,
            checked: true,
            return_type: TypeId::VOID,
            exception_base: Some(self.exception),
            suppression: SuppressionContext::empty(),
        }
    }

    fn bind(&self, body: StmtId) -> DiagnosticBag {
        let bag = DiagnosticBag::new();
        let mut binder = Binder::new(&self.table, &self.arena, &bag, self.ctx());
        binder.bind_body(body, &[]);
        bag
    }

    fn codes(&self, body: StmtId) -> Vec<u32> {
        self.bind(body).drain_all().into_iter().map(|d| d.code).collect()
    }
}

#[test]
fn throwing_a_non_exception_value_is_rejected() {
    let mut f = Fixture::new();
    let text = f.table.names.intern("1");
    let span = f.span();
    let value = f.arena.lit(LitValue::Int(1), text, span);
    let body = f.throw(Some(value));

    assert_eq!(f.codes(body), vec![dc::THROWN_TYPE_NOT_EXCEPTION]);
}

#[test]
fn throwing_a_derived_exception_is_allowed() {
    let mut f = Fixture::new();
    let io = f.io_exception;
    let value = f.new_of(io);
    let body = f.throw(Some(value));

    assert_eq!(f.codes(body), Vec::<u32>::new());
}

#[test]
fn a_bare_rethrow_carries_no_check() {
    let mut f = Fixture::new();
    let body = f.throw(None);
    assert_eq!(f.codes(body), Vec::<u32>::new());
}

#[test]
fn catching_a_non_exception_type_is_rejected() {
    let mut f = Fixture::new();
    let clause = f.catch(Some(TypeId::STRING));
    let body = f.try_with(vec![clause]);

    assert_eq!(f.codes(body), vec![dc::THROWN_TYPE_NOT_EXCEPTION]);
}

#[test]
fn derived_catch_after_base_catch_is_unreachable() {
    let mut f = Fixture::new();
    let base = f.exception;
    let derived = f.io_exception;
    let first = f.catch(Some(base));
    let second = f.catch(Some(derived));
    let body = f.try_with(vec![first, second]);

    let diagnostics = f.bind(body).drain_all();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, dc::CATCH_CLAUSE_UNREACHABLE);
    assert_eq!(
        diagnostics[0].message_text,
        "A previous catch clause already catches all exceptions of this or of a super type \
         ('Exception')"
    );
}

#[test]
fn base_catch_after_derived_catch_is_fine() {
    let mut f = Fixture::new();
    let derived = f.io_exception;
    let base = f.exception;
    let first = f.catch(Some(derived));
    let second = f.catch(Some(base));
    let body = f.try_with(vec![first, second]);

    assert_eq!(f.codes(body), Vec::<u32>::new());
}

#[test]
fn duplicate_catch_types_are_unreachable() {
    let mut f = Fixture::new();
    let derived = f.io_exception;
    let first = f.catch(Some(derived));
    let second = f.catch(Some(derived));
    let body = f.try_with(vec![first, second]);

    assert_eq!(f.codes(body), vec![dc::CATCH_CLAUSE_UNREACHABLE]);
}

#[test]
fn anything_after_a_catch_all_is_unreachable() {
    let mut f = Fixture::new();
    let derived = f.io_exception;
    let catch_all = f.catch(None);
    let typed = f.catch(Some(derived));
    let body = f.try_with(vec![catch_all, typed]);

    assert_eq!(f.codes(body), vec![dc::CATCH_CLAUSE_UNREACHABLE]);
}

#[test]
fn catch_all_after_the_root_exception_type_is_unreachable() {
    let mut f = Fixture::new();
    let base = f.exception;
    let typed = f.catch(Some(base));
    let catch_all = f.catch(None);
    let body = f.try_with(vec![typed, catch_all]);

    assert_eq!(f.codes(body), vec![dc::CATCH_CLAUSE_UNREACHABLE]);
}

#[test]
fn unrelated_catch_types_do_not_shadow_each_other() {
    let mut f = Fixture::new();
    let other_name = f.table.names.intern("TimeoutException");
    let exception = f.exception;
    let other_symbol = f.table.symbols.register(
        Symbol::new(SymbolKind::Class, other_name, TypeId::ERROR).with_base(exception),
    );
    let other = f.table.types.named(other_symbol, vec![]);

    let io = f.io_exception;
    let first = f.catch(Some(io));
    let second = f.catch(Some(other));
    let body = f.try_with(vec![first, second]);

    assert_eq!(f.codes(body), Vec::<u32>::new());
}

#[test]
fn the_catch_local_is_typed_and_scoped_to_its_clause() {
    let mut f = Fixture::new();
    let io = f.io_exception;
    let name = f.table.names.intern("e");
    let read = {
        let atom = f.table.names.intern("e");
        let span = f.span();
        let e = f.arena.name(atom, span);
        let null_text = f.table.names.intern("null");
        let null_span = f.span();
        let null = f.arena.lit(LitValue::Null, null_text, null_span);
        let cmp_span = f.span();
        let cmp = f
            .arena
            .binary(sable_ast::node::BinaryOp::Eq, e, null, cmp_span);
        f.arena.expr_stmt(cmp, cmp_span)
    };
    let catch_body_span = f.span();
    let catch_body = f.arena.block(vec![read], catch_body_span);
    let clause = CatchClause {
        ty: Some(TypeRef(io.0)),
        name: Some(name),
        body: catch_body,
        span: f.span(),
    };
    let body = f.try_with(vec![clause]);

    // The local resolves inside the clause; comparing a reference type to
    // null is legitimate and warns nothing.
    assert_eq!(f.codes(body), Vec::<u32>::new());
}
