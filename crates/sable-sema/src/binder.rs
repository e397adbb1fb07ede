//! Expression and statement binding.
//!
//! The binder walks one method body's syntax, resolves every name against
//! the scope stack and the symbol table, classifies conversions, resolves
//! overloads, folds constants, and emits diagnostics. Its output is a bound
//! tree ready for flow analysis and lowering.
//!
//! Error recovery is sentinel based: a failed subexpression binds to an
//! error node whose type converts to everything, and operators over error
//! operands stay silent, so one mistake yields one diagnostic.

use crate::bound::{BoundCatch, BoundExpr, BoundExprKind, BoundStmt, BoundStmtKind, OperatorKind};
use crate::const_eval::{self, ConstError, ConstValue};
use crate::convert::Conversions;
use crate::diag::{CancelFlag, DiagnosticBag, SuppressionContext};
use crate::flow::FlowAnalyzer;
use crate::overload::{ArgumentInfo, InapplicableReason, ResolutionResult, resolve};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use sable_ast::arena::{AstArena, ExprId, StmtId};
use sable_ast::node::{
    Argument, BinaryOp, CatchClause, ExprKind, LitValue, StmtKind, TypeRef, UnaryOp,
};
use sable_common::common::RefKind;
use sable_common::diagnostics::diagnostic_codes as dc;
use sable_common::interner::Atom;
use sable_common::span::Span;
use sable_symbols::{
    Modifiers, PrimitiveKind, Symbol, SymbolId, SymbolKind, SymbolTable, TypeId,
};
use tracing::debug;

/// Everything the binder needs to know about the enclosing declaration.
#[derive(Clone)]
pub struct BindingContext {
    /// The enclosing type symbol, for `this`, accessibility, and implicit
    /// member lookup. `None` for free-standing code.
    pub container: Option<SymbolId>,
    pub method: SymbolId,
    /// Parameter symbols in declaration order.
    pub params: Vec<SymbolId>,
    pub is_static: bool,
    /// Constant arithmetic overflows are errors in checked mode.
    pub checked: bool,
    pub return_type: TypeId,
    /// The root exception type thrown and caught values must derive from.
    pub exception_base: Option<TypeId>,
    pub suppression: SuppressionContext,
}

/// One method body awaiting binding.
#[derive(Clone)]
pub struct MethodBody {
    pub method: SymbolId,
    pub params: Vec<SymbolId>,
    pub body: StmtId,
    /// Non-empty for struct constructors: fields that must be definitely
    /// assigned on every exit path.
    pub struct_fields: Vec<SymbolId>,
}

/// A bound method body.
pub struct BoundMethod {
    pub method: SymbolId,
    pub body: BoundStmt,
}

pub struct Binder<'a> {
    table: &'a SymbolTable,
    arena: &'a AstArena,
    bag: &'a DiagnosticBag,
    ctx: BindingContext,
    conversions: Conversions<'a>,
    /// Innermost scope last; each block pushes a frame.
    scopes: Vec<FxHashMap<Atom, SymbolId>>,
}

impl<'a> Binder<'a> {
    pub fn new(
        table: &'a SymbolTable,
        arena: &'a AstArena,
        bag: &'a DiagnosticBag,
        ctx: BindingContext,
    ) -> Self {
        Self {
            table,
            arena,
            bag,
            ctx,
            conversions: Conversions::new(table),
            scopes: vec![FxHashMap::default()],
        }
    }

    fn report(&self, code: u32, span: Span, args: &[&str]) {
        self.bag.report(&self.ctx.suppression, code, span, args);
    }

    /// Type annotations arrive as opaque handles minted by the declaration
    /// pass; their raw values are interned type ids.
    fn resolve_type(&self, r: TypeRef) -> TypeId {
        TypeId(r.0)
    }

    fn display(&self, ty: TypeId) -> String {
        self.table.display(ty)
    }

    /// The instance type of the enclosing declaration, with its own type
    /// parameters as arguments.
    fn self_type(&self) -> TypeId {
        let Some(container) = self.ctx.container else {
            return TypeId::ERROR;
        };
        let Some(decl) = self.table.get(container) else {
            return TypeId::ERROR;
        };
        if !decl.kind.is_type() {
            return TypeId::ERROR;
        }
        let args = decl
            .type_params
            .iter()
            .map(|p| self.table.types.type_param(p.symbol))
            .collect();
        self.table.types.named(container, args)
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Bind one method body and run flow analysis over the result.
    pub fn bind_body(&mut self, body: StmtId, struct_fields: &[SymbolId]) -> BoundStmt {
        debug!(method = self.ctx.method.0, "binding method body");
        let bound = self.bind_stmt(body);
        let flow = FlowAnalyzer::new(self.table, self.bag, &self.ctx.suppression);
        if struct_fields.is_empty() {
            flow.analyze_method(self.ctx.method, &self.ctx.params, &bound);
        } else {
            let end_span = self
                .table
                .get(self.ctx.method)
                .and_then(|m| m.span)
                .unwrap_or(bound.span);
            flow.analyze_struct_constructor(
                self.ctx.method,
                &self.ctx.params,
                struct_fields,
                &bound,
                end_span,
            );
        }
        bound
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn bind_stmt(&mut self, id: StmtId) -> BoundStmt {
        let stmt = self.arena.stmt(id).clone();
        let span = stmt.span;
        let kind = match stmt.kind {
            StmtKind::LocalDecl {
                name,
                ty,
                init,
                is_const,
            } => self.bind_local_decl(name, ty, init, is_const, span),
            StmtKind::Expr(expr) => BoundStmtKind::Expr(self.bind_expr(expr)),
            StmtKind::Block(stmts) => {
                self.scopes.push(FxHashMap::default());
                let bound = stmts.into_iter().map(|s| self.bind_stmt(s)).collect();
                self.scopes.pop();
                BoundStmtKind::Block(bound)
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => BoundStmtKind::If {
                cond: self.bind_condition(cond),
                then_branch: Box::new(self.bind_stmt(then_branch)),
                else_branch: else_branch.map(|s| Box::new(self.bind_stmt(s))),
            },
            StmtKind::While { cond, body } => BoundStmtKind::While {
                cond: self.bind_condition(cond),
                body: Box::new(self.bind_stmt(body)),
            },
            StmtKind::Return(value) => {
                let value = value.map(|e| {
                    let bound = self.bind_expr(e);
                    self.apply_conversion(bound, self.ctx.return_type)
                });
                BoundStmtKind::Return(value)
            }
            StmtKind::Throw(value) => {
                let value = value.map(|e| self.bind_thrown(e));
                BoundStmtKind::Throw(value)
            }
            StmtKind::YieldReturn(value) => BoundStmtKind::YieldReturn(self.bind_expr(value)),
            StmtKind::YieldBreak => BoundStmtKind::YieldBreak,
            StmtKind::Try {
                body,
                catches,
                finally,
            } => self.bind_try(body, catches, finally),
        };
        BoundStmt::new(kind, span)
    }

    fn bind_local_decl(
        &mut self,
        name: Atom,
        ty: Option<TypeRef>,
        init: Option<ExprId>,
        is_const: bool,
        span: Span,
    ) -> BoundStmtKind {
        let init = init.map(|e| self.bind_expr(e));
        let declared = match ty {
            Some(r) => self.resolve_type(r),
            // Inferred declarations take the initializer's type.
            None => init.as_ref().map_or(TypeId::ERROR, |e| e.ty),
        };
        let init = init.map(|e| self.apply_conversion(e, declared));

        let mut modifiers = Modifiers::empty();
        if is_const {
            modifiers |= Modifiers::CONST;
        }
        let local = self.table.symbols.register(
            Symbol::new(SymbolKind::Local, name, declared)
                .with_container(self.ctx.method)
                .with_modifiers(modifiers)
                .with_span(span),
        );
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, local);
        }
        BoundStmtKind::LocalDecl { local, init }
    }

    fn bind_condition(&mut self, expr: ExprId) -> BoundExpr {
        let bound = self.bind_expr(expr);
        self.apply_conversion(bound, TypeId::BOOL)
    }

    fn bind_thrown(&mut self, expr: ExprId) -> BoundExpr {
        let bound = self.bind_expr(expr);
        if let Some(base) = self.ctx.exception_base {
            let throwable = bound.is_error()
                || bound.ty == base
                || self.conversions.implicit_reference(bound.ty, base);
            if !throwable {
                self.report(dc::THROWN_TYPE_NOT_EXCEPTION, bound.span, &[]);
            }
        }
        bound
    }

    fn bind_try(
        &mut self,
        body: StmtId,
        catches: Vec<CatchClause>,
        finally: Option<StmtId>,
    ) -> BoundStmtKind {
        let body = Box::new(self.bind_stmt(body));
        let mut bound_catches: Vec<BoundCatch> = Vec::with_capacity(catches.len());
        // (type, catch-all) of each earlier clause, for the ordering check.
        let mut earlier: Vec<Option<TypeId>> = Vec::new();

        for catch in catches {
            let exception_type = catch.ty.map(|r| self.resolve_type(r));
            if let Some(ty) = exception_type {
                if let Some(base) = self.ctx.exception_base {
                    let valid = ty.is_error()
                        || ty == base
                        || self.conversions.implicit_reference(ty, base);
                    if !valid {
                        self.report(dc::THROWN_TYPE_NOT_EXCEPTION, catch.span, &[]);
                    }
                }
            }
            // A clause is dead if an earlier one catches the same type or a
            // base of it; a catch-all earlier swallows everything.
            let shadowing = earlier.iter().find_map(|prior| match (prior, exception_type) {
                (None, _) => Some(self.ctx.exception_base.map_or("object".to_string(), |b| {
                    self.display(b)
                })),
                (Some(prior), Some(ty))
                    if *prior == ty || self.conversions.implicit_reference(ty, *prior) =>
                {
                    Some(self.display(*prior))
                }
                (Some(prior), None)
                    if Some(*prior) == self.ctx.exception_base =>
                {
                    Some(self.display(*prior))
                }
                _ => None,
            });
            if let Some(shadow) = shadowing {
                self.report(dc::CATCH_CLAUSE_UNREACHABLE, catch.span, &[&shadow]);
            }
            earlier.push(exception_type);

            self.scopes.push(FxHashMap::default());
            let local = match catch.name {
                Some(name) => {
                    let ty = exception_type
                        .or(self.ctx.exception_base)
                        .unwrap_or(TypeId::ERROR);
                    let local = self.table.symbols.register(
                        Symbol::new(SymbolKind::Local, name, ty)
                            .with_container(self.ctx.method)
                            .with_span(catch.span),
                    );
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert(name, local);
                    }
                    local
                }
                None => SymbolId::INVALID,
            };
            let body = self.bind_stmt(catch.body);
            self.scopes.pop();
            bound_catches.push(BoundCatch {
                exception_type,
                local,
                body,
                span: catch.span,
            });
        }

        BoundStmtKind::Try {
            body,
            catches: bound_catches,
            finally: finally.map(|s| Box::new(self.bind_stmt(s))),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn bind_expr(&mut self, id: ExprId) -> BoundExpr {
        let expr = self.arena.expr(id).clone();
        let span = expr.span;
        match expr.kind {
            ExprKind::Literal { value, text } => self.bind_literal(&value, text, span),
            ExprKind::Name { name } => self.bind_name(name, span),
            ExprKind::This => self.bind_this(span),
            ExprKind::Member { receiver, name } => self.bind_member(receiver, name, span),
            ExprKind::Call { callee, args } => self.bind_call(callee, &args, span),
            ExprKind::New { ty, args } => self.bind_new(ty, &args, span),
            ExprKind::Unary { op, operand } => self.bind_unary(op, operand, span),
            ExprKind::Binary { op, lhs, rhs } => self.bind_binary(op, lhs, rhs, span),
            ExprKind::Assign { target, op, value } => self.bind_assign(target, op, value, span),
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => self.bind_conditional(cond, then_expr, else_expr, span),
            ExprKind::Cast { ty, expr } => self.bind_cast(ty, expr, span),
            ExprKind::Default { ty } => {
                let ty = self.resolve_type(ty);
                BoundExpr::new(BoundExprKind::DefaultValue, ty, span)
            }
            ExprKind::Paren { inner } => self.bind_expr(inner),
        }
    }

    fn bind_literal(&mut self, value: &LitValue, text: Atom, span: Span) -> BoundExpr {
        let constant = const_eval::from_literal(value, text);
        match constant {
            Some(constant) => {
                let ty = constant.ty();
                BoundExpr::new(BoundExprKind::Literal, ty, span).with_constant(constant)
            }
            None => {
                // An integer literal too large for any integral type.
                let rendered = self.table.names.resolve(text);
                self.report(dc::CONSTANT_VALUE_OUT_OF_RANGE, span, &[&rendered, "ulong"]);
                BoundExpr::error(span)
            }
        }
    }

    fn bind_name(&mut self, name: Atom, span: Span) -> BoundExpr {
        // Innermost scope wins.
        for scope in self.scopes.iter().rev() {
            if let Some(&local) = scope.get(&name) {
                let ty = self.table.get(local).map_or(TypeId::ERROR, |s| s.ty);
                return BoundExpr::new(BoundExprKind::Local, ty, span).with_symbol(local);
            }
        }
        for &param in &self.ctx.params {
            if self.table.symbols.name(param) == Some(name) {
                let ty = self.table.get(param).map_or(TypeId::ERROR, |s| s.ty);
                return BoundExpr::new(BoundExprKind::Parameter, ty, span).with_symbol(param);
            }
        }
        if self.ctx.container.is_some() {
            let self_type = self.self_type();
            if let Some(found) = self.bind_member_on(self_type, None, name, span, false) {
                return found;
            }
        }
        let rendered = self.table.names.resolve(name);
        self.report(dc::NAME_NOT_IN_CONTEXT, span, &[&rendered]);
        BoundExpr::error(span)
    }

    fn bind_this(&mut self, span: Span) -> BoundExpr {
        if self.ctx.is_static || self.ctx.container.is_none() {
            self.report(dc::THIS_IN_STATIC_CONTEXT, span, &[]);
            return BoundExpr::error(span);
        }
        let ty = self.self_type();
        BoundExpr::new(BoundExprKind::This, ty, span)
    }

    fn bind_member(&mut self, receiver: ExprId, name: Atom, span: Span) -> BoundExpr {
        let receiver = self.bind_expr(receiver);
        if receiver.is_error() {
            return BoundExpr::error(span);
        }
        let receiver_ty = receiver.ty;
        match self.bind_member_on(receiver_ty, Some(receiver), name, span, true) {
            Some(found) => found,
            None => BoundExpr::error(span),
        }
    }

    /// Bind a field or property access on `ty`. Reports when `report_missing`
    /// and returns `None` when nothing matched.
    fn bind_member_on(
        &mut self,
        ty: TypeId,
        receiver: Option<BoundExpr>,
        name: Atom,
        span: Span,
        report_missing: bool,
    ) -> Option<BoundExpr> {
        let members = self.table.lookup_members(ty, name);
        if members.is_empty() {
            if report_missing {
                let rendered = self.table.names.resolve(name);
                self.report(dc::NO_SUCH_MEMBER, span, &[&self.display(ty), &rendered]);
                return Some(BoundExpr::error(span));
            }
            return None;
        }
        let accessible: Vec<SymbolId> = members
            .iter()
            .copied()
            .filter(|&m| self.table.is_accessible(m, self.ctx.container))
            .collect();
        if accessible.is_empty() {
            let display = self.table.signature_display(members[0]);
            self.report(dc::MEMBER_INACCESSIBLE, span, &[&display]);
            return Some(BoundExpr::error(span));
        }

        let substitution = self.table.substitution_for(ty);
        for &member in &accessible {
            let Some(symbol) = self.table.get(member) else {
                continue;
            };
            let member_ty = self.table.types.substitute(symbol.ty, &substitution);
            let kind = match symbol.kind {
                SymbolKind::Field => BoundExprKind::Field {
                    receiver: receiver.clone().map(Box::new),
                },
                SymbolKind::Property => BoundExprKind::Property {
                    receiver: receiver.clone().map(Box::new),
                },
                _ => continue,
            };
            self.check_obsolete(member, span);
            return Some(BoundExpr::new(kind, member_ty, span).with_symbol(member));
        }
        // Methods resolve in call position; a bare method group here is a
        // missing-member error from the expression's point of view.
        if report_missing {
            let rendered = self.table.names.resolve(name);
            self.report(dc::NO_SUCH_MEMBER, span, &[&self.display(ty), &rendered]);
            return Some(BoundExpr::error(span));
        }
        None
    }

    fn bind_call(&mut self, callee: ExprId, args: &[Argument], span: Span) -> BoundExpr {
        let callee_node = self.arena.expr(callee).clone();
        let (receiver, receiver_ty, name) = match callee_node.kind {
            ExprKind::Name { name } => (None, self.self_type(), name),
            ExprKind::Member { receiver, name } => {
                let bound = self.bind_expr(receiver);
                if bound.is_error() {
                    return BoundExpr::error(span);
                }
                let ty = bound.ty;
                (Some(bound), ty, name)
            }
            _ => {
                self.report(dc::NAME_NOT_IN_CONTEXT, callee_node.span, &["<callee>"]);
                return BoundExpr::error(span);
            }
        };

        let members = self.table.lookup_members(receiver_ty, name);
        let rendered = self.table.names.resolve(name);
        if members.is_empty() {
            if receiver.is_some() {
                self.report(
                    dc::NO_SUCH_MEMBER,
                    span,
                    &[&self.display(receiver_ty), &rendered],
                );
            } else {
                self.report(dc::NAME_NOT_IN_CONTEXT, span, &[&rendered]);
            }
            return BoundExpr::error(span);
        }
        let candidates: Vec<SymbolId> = members
            .iter()
            .copied()
            .filter(|&m| self.table.symbols.kind(m) == Some(SymbolKind::Method))
            .filter(|&m| self.table.is_accessible(m, self.ctx.container))
            .collect();
        if candidates.is_empty() {
            self.report(
                dc::NO_ACCESSIBLE_MEMBER,
                span,
                &[&self.display(receiver_ty), &rendered],
            );
            return BoundExpr::error(span);
        }

        let (bound_args, infos) = self.bind_arguments(args);
        if bound_args.iter().any(BoundExpr::is_error) {
            return BoundExpr::error(span);
        }

        let resolution = resolve(
            self.table,
            &self.conversions,
            &candidates,
            Some(receiver_ty),
            &infos,
        );
        match resolution {
            ResolutionResult::UniqueBest(best) => {
                self.check_obsolete(best.symbol, span);
                let return_ty = self
                    .table
                    .get(best.symbol)
                    .map_or(TypeId::ERROR, |s| s.ty);
                let substitution = self.table.substitution_for(receiver_ty);
                let return_ty = self.table.types.substitute(return_ty, &substitution);
                let converted = bound_args
                    .into_iter()
                    .zip(&best.param_types)
                    .map(|(arg, &target)| self.apply_conversion(arg, target))
                    .collect();
                BoundExpr::new(
                    BoundExprKind::Call {
                        receiver: receiver.map(Box::new),
                        args: converted,
                    },
                    return_ty,
                    span,
                )
                .with_symbol(best.symbol)
            }
            ResolutionResult::Ambiguous(first, second) => {
                self.report(
                    dc::AMBIGUOUS_CALL,
                    span,
                    &[
                        &self.table.signature_display(first),
                        &self.table.signature_display(second),
                    ],
                );
                BoundExpr::error(span)
            }
            ResolutionResult::NoneApplicable(reasons) => {
                self.report_no_applicable(&rendered, &candidates, &reasons, &infos, span);
                BoundExpr::error(span)
            }
        }
    }

    fn bind_new(&mut self, ty: TypeRef, args: &[Argument], span: Span) -> BoundExpr {
        let ty = self.resolve_type(ty);
        if ty.is_error() {
            return BoundExpr::error(span);
        }
        if let Some(symbol) = self.table.symbol_of_type(ty) {
            self.check_obsolete(symbol, span);
            if let Some(sable_symbols::TypeData::Named { args: type_args, .. }) =
                self.table.types.lookup(ty)
            {
                if !type_args.is_empty() {
                    crate::constraints::check_type_arguments(
                        self.table,
                        &self.conversions,
                        self.bag,
                        &self.ctx.suppression,
                        symbol,
                        &type_args,
                        span,
                    );
                }
            }
        }

        let (bound_args, infos) = self.bind_arguments(args);
        if bound_args.iter().any(BoundExpr::is_error) {
            return BoundExpr::error(span);
        }

        let ctors: Vec<SymbolId> = self
            .table
            .symbol_of_type(ty)
            .map(|s| self.table.symbols.members(s))
            .unwrap_or_default()
            .into_iter()
            .filter(|&m| self.table.symbols.kind(m) == Some(SymbolKind::Constructor))
            .filter(|&m| self.table.is_accessible(m, self.ctx.container))
            .collect();

        if ctors.is_empty() {
            // The implicit parameterless constructor.
            if !args.is_empty() {
                self.report(
                    dc::BAD_OVERLOAD_ARGUMENTS,
                    span,
                    &[&self.display(ty)],
                );
                return BoundExpr::error(span);
            }
            return BoundExpr::new(BoundExprKind::New { args: Vec::new() }, ty, span);
        }

        let resolution = resolve(self.table, &self.conversions, &ctors, Some(ty), &infos);
        match resolution {
            ResolutionResult::UniqueBest(best) => {
                self.check_obsolete(best.symbol, span);
                let converted = bound_args
                    .into_iter()
                    .zip(&best.param_types)
                    .map(|(arg, &target)| self.apply_conversion(arg, target))
                    .collect();
                BoundExpr::new(BoundExprKind::New { args: converted }, ty, span)
                    .with_symbol(best.symbol)
            }
            ResolutionResult::Ambiguous(first, second) => {
                self.report(
                    dc::AMBIGUOUS_CALL,
                    span,
                    &[
                        &self.table.signature_display(first),
                        &self.table.signature_display(second),
                    ],
                );
                BoundExpr::error(span)
            }
            ResolutionResult::NoneApplicable(reasons) => {
                let rendered = self.display(ty);
                self.report_no_applicable(&rendered, &ctors, &reasons, &infos, span);
                BoundExpr::error(span)
            }
        }
    }

    fn bind_arguments(&mut self, args: &[Argument]) -> (Vec<BoundExpr>, Vec<ArgumentInfo>) {
        let mut bound = Vec::with_capacity(args.len());
        let mut infos = Vec::with_capacity(args.len());
        for arg in args {
            let expr = self.bind_expr(arg.expr);
            let is_variable = matches!(
                expr.kind,
                BoundExprKind::Local | BoundExprKind::Parameter | BoundExprKind::Field { .. }
            );
            if arg.ref_kind.is_by_ref() {
                let readonly = expr
                    .symbol
                    .is_valid()
                    .then(|| self.table.get(expr.symbol))
                    .flatten()
                    .is_some_and(|s| s.is_readonly());
                if readonly {
                    let name = self.table.name_of(expr.symbol);
                    self.report(
                        dc::READONLY_REF_ARGUMENT,
                        expr.span,
                        &[&name, "readonly field"],
                    );
                }
            }
            infos.push(ArgumentInfo {
                name: arg.name,
                ref_kind: arg.ref_kind,
                ty: expr.ty,
                is_null_literal: matches!(expr.constant, Some(ConstValue::Null)),
                is_variable,
                span: expr.span,
            });
            bound.push(expr);
        }
        (bound, infos)
    }

    fn report_no_applicable(
        &self,
        callee: &str,
        candidates: &[SymbolId],
        reasons: &[(SymbolId, InapplicableReason)],
        infos: &[ArgumentInfo],
        span: Span,
    ) {
        if candidates.len() > 1 {
            self.report(dc::BAD_OVERLOAD_ARGUMENTS, span, &[callee]);
            return;
        }
        let Some((candidate, reason)) = reasons.first() else {
            self.report(dc::BAD_OVERLOAD_ARGUMENTS, span, &[callee]);
            return;
        };
        match reason {
            InapplicableReason::ArgumentConversion { index, from, to } => {
                let arg_span = infos.get(*index).map_or(span, |a| a.span);
                self.report(
                    dc::ARGUMENT_CANNOT_CONVERT,
                    arg_span,
                    &[
                        &(index + 1).to_string(),
                        &self.display(*from),
                        &self.display(*to),
                    ],
                );
            }
            InapplicableReason::RefKindMismatch {
                index,
                expected,
                actual,
            } => {
                let arg_span = infos.get(*index).map_or(span, |a| a.span);
                let (code, keyword) = if *actual == RefKind::None {
                    (dc::ARGUMENT_MISSING_REF, expected.keyword())
                } else {
                    (dc::ARGUMENT_EXTRA_REF, actual.keyword())
                };
                self.report(code, arg_span, &[&(index + 1).to_string(), keyword]);
            }
            InapplicableReason::MissingParameter { param } => {
                let name = self.table.names.resolve(*param);
                self.report(
                    dc::NO_ARGUMENT_FOR_PARAMETER,
                    span,
                    &[&name, &self.table.signature_display(*candidate)],
                );
            }
            InapplicableReason::NoParameterNamed { name } => {
                let rendered = self.table.names.resolve(*name);
                self.report(dc::NO_PARAMETER_WITH_NAME, span, &[callee, &rendered]);
            }
            InapplicableReason::DuplicateParameter { name } => {
                let rendered = self.table.names.resolve(*name);
                self.report(dc::NAMED_ARGUMENT_DUPLICATES_POSITIONAL, span, &[&rendered]);
            }
            InapplicableReason::NamedOutOfPosition { name } => {
                let rendered = self.table.names.resolve(*name);
                self.report(dc::NAMED_ARGUMENT_OUT_OF_POSITION, span, &[&rendered]);
            }
            InapplicableReason::TooManyArguments => {
                self.report(dc::BAD_OVERLOAD_ARGUMENTS, span, &[callee]);
            }
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn bind_unary(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> BoundExpr {
        let operand = self.bind_expr(operand);
        if operand.is_error() {
            return BoundExpr::error(span);
        }

        let stripped = self.table.types.strip_nullable(operand.ty);
        let lifted = self.table.types.is_nullable(operand.ty);
        let kind = self.table.types.primitive_kind(stripped);

        let result = match (op, kind) {
            (UnaryOp::Not, Some(PrimitiveKind::Bool)) => Some(stripped),
            (UnaryOp::Plus | UnaryOp::Neg, Some(k)) if k.is_numeric() => {
                // -uint promotes to long; -ulong does not exist.
                match (op, k) {
                    (UnaryOp::Neg, PrimitiveKind::ULong) => None,
                    (UnaryOp::Neg, PrimitiveKind::UInt) => Some(TypeId::LONG),
                    _ if k.is_integral() => Some(self.promote_small(k)),
                    _ => Some(stripped),
                }
            }
            (UnaryOp::BitNot, Some(k)) if k.is_integral() => Some(self.promote_small(k)),
            _ => None,
        };

        let Some(result) = result else {
            if let Some(found) = self.bind_user_defined_unary(op, &operand, span) {
                return found;
            }
            self.report(
                dc::UNARY_OPERATOR_CANNOT_BE_APPLIED,
                span,
                &[op.token(), &self.display(operand.ty)],
            );
            return BoundExpr::error(span);
        };

        let result_ty = if lifted {
            self.table.types.nullable(result)
        } else {
            result
        };
        let operator = if lifted {
            OperatorKind::Lifted
        } else {
            OperatorKind::BuiltIn
        };

        let constant = match operand.constant.as_ref() {
            Some(value) if !lifted => {
                match const_eval::fold_unary(op, value, self.ctx.checked) {
                    Ok(folded) => folded,
                    Err(ConstError::Overflow) => {
                        self.report(dc::CHECKED_OVERFLOW, span, &[]);
                        None
                    }
                    Err(_) => None,
                }
            }
            _ => None,
        };

        let mut bound = BoundExpr::new(
            BoundExprKind::Unary {
                op,
                operator,
                operand: Box::new(operand),
            },
            result_ty,
            span,
        );
        if let Some(constant) = constant {
            bound = bound.with_constant(constant);
        }
        bound
    }

    /// Small integrals promote to int under unary and binary operators.
    fn promote_small(&self, kind: PrimitiveKind) -> TypeId {
        match kind {
            PrimitiveKind::SByte
            | PrimitiveKind::Byte
            | PrimitiveKind::Short
            | PrimitiveKind::UShort
            | PrimitiveKind::Char => TypeId::INT,
            PrimitiveKind::UInt => TypeId::UINT,
            PrimitiveKind::Long => TypeId::LONG,
            PrimitiveKind::ULong => TypeId::ULONG,
            PrimitiveKind::Float => TypeId::FLOAT,
            PrimitiveKind::Double => TypeId::DOUBLE,
            PrimitiveKind::Decimal => TypeId::DECIMAL,
            _ => TypeId::INT,
        }
    }

    fn operator_method_name(&self, op: BinaryOp) -> Atom {
        let name = match op {
            BinaryOp::Add => "op_Addition",
            BinaryOp::Sub => "op_Subtraction",
            BinaryOp::Mul => "op_Multiply",
            BinaryOp::Div => "op_Division",
            BinaryOp::Rem => "op_Modulus",
            BinaryOp::Shl => "op_LeftShift",
            BinaryOp::Shr => "op_RightShift",
            BinaryOp::BitAnd | BinaryOp::LogicalAnd => "op_BitwiseAnd",
            BinaryOp::BitOr | BinaryOp::LogicalOr => "op_BitwiseOr",
            BinaryOp::BitXor => "op_ExclusiveOr",
            BinaryOp::Eq => "op_Equality",
            BinaryOp::Ne => "op_Inequality",
            BinaryOp::Lt => "op_LessThan",
            BinaryOp::Le => "op_LessThanOrEqual",
            BinaryOp::Gt => "op_GreaterThan",
            BinaryOp::Ge => "op_GreaterThanOrEqual",
        };
        self.table.names.intern(name)
    }

    fn unary_operator_method_name(&self, op: UnaryOp) -> Atom {
        let name = match op {
            UnaryOp::Plus => "op_UnaryPlus",
            UnaryOp::Neg => "op_UnaryNegation",
            UnaryOp::Not => "op_LogicalNot",
            UnaryOp::BitNot => "op_OnesComplement",
        };
        self.table.names.intern(name)
    }

    fn bind_user_defined_unary(
        &mut self,
        op: UnaryOp,
        operand: &BoundExpr,
        span: Span,
    ) -> Option<BoundExpr> {
        let name = self.unary_operator_method_name(op);
        let candidates = self
            .conversions
            .operator_candidates(name, &[operand.ty]);
        if candidates.is_empty() {
            return None;
        }
        let infos = [ArgumentInfo::positional(operand.ty, operand.span)];
        let resolution = resolve(self.table, &self.conversions, &candidates, None, &infos);
        match resolution {
            ResolutionResult::UniqueBest(best) => {
                let result_ty = self.table.get(best.symbol).map_or(TypeId::ERROR, |s| s.ty);
                let converted = self.apply_conversion(operand.clone(), best.param_types[0]);
                Some(
                    BoundExpr::new(
                        BoundExprKind::Unary {
                            op,
                            operator: OperatorKind::UserDefined(best.symbol),
                            operand: Box::new(converted),
                        },
                        result_ty,
                        span,
                    )
                    .with_symbol(best.symbol),
                )
            }
            ResolutionResult::Ambiguous(first, second) => {
                self.report(
                    dc::AMBIGUOUS_CALL,
                    span,
                    &[
                        &self.table.signature_display(first),
                        &self.table.signature_display(second),
                    ],
                );
                Some(BoundExpr::error(span))
            }
            ResolutionResult::NoneApplicable(_) => None,
        }
    }

    fn bind_binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, span: Span) -> BoundExpr {
        let lhs = self.bind_expr(lhs);
        let rhs = self.bind_expr(rhs);
        // Descendant failures stay silent.
        if lhs.is_error() || rhs.is_error() {
            return BoundExpr::error(span);
        }

        if op.is_comparison() && self.same_storage(&lhs, &rhs) {
            self.report(dc::SELF_COMPARISON, span, &[]);
        }

        // Comparisons against the null literal.
        if op.is_equality() && (lhs.ty == TypeId::NULL || rhs.ty == TypeId::NULL) {
            return self.bind_null_comparison(op, lhs, rhs, span);
        }

        if let Some(found) = self.bind_builtin_binary(op, &lhs, &rhs, span) {
            return found;
        }
        if let Some(found) = self.bind_user_defined_binary(op, &lhs, &rhs, span) {
            return found;
        }

        self.report(
            dc::OPERATOR_CANNOT_BE_APPLIED,
            span,
            &[op.token(), &self.display(lhs.ty), &self.display(rhs.ty)],
        );
        BoundExpr::error(span)
    }

    /// Two reads of the same local, parameter, or own field.
    fn same_storage(&self, lhs: &BoundExpr, rhs: &BoundExpr) -> bool {
        if !lhs.symbol.is_valid() || lhs.symbol != rhs.symbol {
            return false;
        }
        matches!(
            (&lhs.kind, &rhs.kind),
            (
                BoundExprKind::Local | BoundExprKind::Parameter,
                BoundExprKind::Local | BoundExprKind::Parameter
            ) | (
                BoundExprKind::Field { receiver: None },
                BoundExprKind::Field { receiver: None }
            )
        )
    }

    fn bind_null_comparison(
        &mut self,
        op: BinaryOp,
        lhs: BoundExpr,
        rhs: BoundExpr,
        span: Span,
    ) -> BoundExpr {
        let operand = if lhs.ty == TypeId::NULL { &rhs } else { &lhs };
        let operand_ty = operand.ty;
        if operand_ty != TypeId::NULL {
            if let Some(outcome) = self
                .conversions
                .null_comparison_verdict(operand_ty, op == BinaryOp::Eq)
            {
                // Comparing a non-nullable value against null is statically
                // decided; warn rather than error, matching the original
                // compiler.
                let outcome = if outcome { "true" } else { "false" };
                let nullable_display = format!("{}?", self.display(operand_ty));
                self.report(
                    dc::EXPRESSION_ALWAYS_CONSTANT,
                    span,
                    &[outcome, &self.display(operand_ty), &nullable_display],
                );
            }
        }
        BoundExpr::new(
            BoundExprKind::Binary {
                op,
                operator: OperatorKind::BuiltIn,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            TypeId::BOOL,
            span,
        )
    }

    fn bind_builtin_binary(
        &mut self,
        op: BinaryOp,
        lhs: &BoundExpr,
        rhs: &BoundExpr,
        span: Span,
    ) -> Option<BoundExpr> {
        let types = &self.table.types;
        let lifted = types.is_nullable(lhs.ty) || types.is_nullable(rhs.ty);
        let l = types.primitive_kind(types.strip_nullable(lhs.ty));
        let r = types.primitive_kind(types.strip_nullable(rhs.ty));

        // Boolean logic.
        if l == Some(PrimitiveKind::Bool) && r == Some(PrimitiveKind::Bool) {
            let valid = matches!(
                op,
                BinaryOp::LogicalAnd
                    | BinaryOp::LogicalOr
                    | BinaryOp::BitAnd
                    | BinaryOp::BitOr
                    | BinaryOp::BitXor
                    | BinaryOp::Eq
                    | BinaryOp::Ne
            );
            if !valid {
                return None;
            }
            let result_ty = if lifted && !op.is_equality() {
                types.nullable(TypeId::BOOL)
            } else {
                TypeId::BOOL
            };
            return Some(self.finish_builtin(op, lhs, rhs, result_ty, lifted, span, None, None));
        }

        // String concatenation and equality.
        if l == Some(PrimitiveKind::String) || r == Some(PrimitiveKind::String) {
            match op {
                BinaryOp::Add => {
                    return Some(self.finish_builtin(
                        op,
                        lhs,
                        rhs,
                        TypeId::STRING,
                        false,
                        span,
                        None,
                        None,
                    ));
                }
                BinaryOp::Eq | BinaryOp::Ne
                    if l == Some(PrimitiveKind::String) && r == Some(PrimitiveKind::String) =>
                {
                    return Some(self.finish_builtin(
                        op,
                        lhs,
                        rhs,
                        TypeId::BOOL,
                        false,
                        span,
                        None,
                        None,
                    ));
                }
                _ => return None,
            }
        }

        // Numeric arithmetic, shifts, bitwise, comparisons.
        if let (Some(l), Some(r)) = (l, r) {
            if l.is_numeric() && r.is_numeric() {
                if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
                    if !l.is_integral() || !r.is_integral() {
                        return None;
                    }
                    let result = self.promote_small(l);
                    let result_ty = if lifted { types.nullable(result) } else { result };
                    return Some(self.finish_builtin(
                        op,
                        lhs,
                        rhs,
                        result_ty,
                        lifted,
                        span,
                        Some(result),
                        Some(TypeId::INT),
                    ));
                }
                if matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
                    && (!l.is_integral() || !r.is_integral())
                {
                    return None;
                }
                if matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr) {
                    return None;
                }
                let common = binary_numeric_common(l, r)?;
                let operand_ty = self.common_type_id(common);
                let result_ty = if op.is_comparison() {
                    TypeId::BOOL
                } else if lifted {
                    types.nullable(operand_ty)
                } else {
                    operand_ty
                };
                return Some(self.finish_builtin(
                    op,
                    lhs,
                    rhs,
                    result_ty,
                    lifted,
                    span,
                    Some(operand_ty),
                    Some(operand_ty),
                ));
            }
        }

        // Reference equality.
        if op.is_equality()
            && self.table.is_reference_type(lhs.ty)
            && self.table.is_reference_type(rhs.ty)
        {
            let related = self.conversions.classify(lhs.ty, rhs.ty).exists()
                || self.conversions.classify(rhs.ty, lhs.ty).exists();
            if related {
                return Some(self.finish_builtin(op, lhs, rhs, TypeId::BOOL, false, span, None, None));
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_builtin(
        &mut self,
        op: BinaryOp,
        lhs: &BoundExpr,
        rhs: &BoundExpr,
        result_ty: TypeId,
        lifted: bool,
        span: Span,
        lhs_target: Option<TypeId>,
        rhs_target: Option<TypeId>,
    ) -> BoundExpr {
        let constant = match (lhs.constant.as_ref(), rhs.constant.as_ref()) {
            (Some(l), Some(r)) if !lifted => {
                match const_eval::fold_binary(op, l, r, self.ctx.checked, &self.table.names) {
                    Ok(folded) => folded,
                    Err(ConstError::DivisionByZero) => {
                        self.report(dc::INTEGER_DIVISION_BY_ZERO, span, &[]);
                        None
                    }
                    Err(ConstError::Overflow) => {
                        self.report(dc::CHECKED_OVERFLOW, span, &[]);
                        None
                    }
                    Err(ConstError::OutOfRange) => None,
                }
            }
            _ => None,
        };

        // Operand conversions are classified against the non-lifted type;
        // the lowering of lifted operators re-wraps them.
        let lhs = match lhs_target {
            Some(target) if !lifted => self.apply_conversion(lhs.clone(), target),
            _ => lhs.clone(),
        };
        let rhs = match rhs_target {
            Some(target) if !lifted => self.apply_conversion(rhs.clone(), target),
            _ => rhs.clone(),
        };

        let operator = if lifted {
            OperatorKind::Lifted
        } else {
            OperatorKind::BuiltIn
        };
        let mut bound = BoundExpr::new(
            BoundExprKind::Binary {
                op,
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            result_ty,
            span,
        );
        if let Some(constant) = constant {
            bound = bound.with_constant(constant);
        }
        bound
    }

    fn bind_user_defined_binary(
        &mut self,
        op: BinaryOp,
        lhs: &BoundExpr,
        rhs: &BoundExpr,
        span: Span,
    ) -> Option<BoundExpr> {
        let name = self.operator_method_name(op);
        let candidates = self
            .conversions
            .operator_candidates(name, &[lhs.ty, rhs.ty]);
        if candidates.is_empty() {
            return None;
        }
        let infos = [
            ArgumentInfo::positional(lhs.ty, lhs.span),
            ArgumentInfo::positional(rhs.ty, rhs.span),
        ];
        let resolution = resolve(self.table, &self.conversions, &candidates, None, &infos);
        match resolution {
            ResolutionResult::UniqueBest(best) => {
                let result_ty = self.table.get(best.symbol).map_or(TypeId::ERROR, |s| s.ty);
                let lhs = self.apply_conversion(lhs.clone(), best.param_types[0]);
                let rhs = self.apply_conversion(rhs.clone(), best.param_types[1]);
                self.check_obsolete(best.symbol, span);
                Some(
                    BoundExpr::new(
                        BoundExprKind::Binary {
                            op,
                            operator: OperatorKind::UserDefined(best.symbol),
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        result_ty,
                        span,
                    )
                    .with_symbol(best.symbol),
                )
            }
            ResolutionResult::Ambiguous(first, second) => {
                self.report(
                    dc::AMBIGUOUS_CALL,
                    span,
                    &[
                        &self.table.signature_display(first),
                        &self.table.signature_display(second),
                    ],
                );
                Some(BoundExpr::error(span))
            }
            ResolutionResult::NoneApplicable(_) => None,
        }
    }

    // =========================================================================
    // Assignment, conditional, cast
    // =========================================================================

    fn bind_assign(
        &mut self,
        target_id: ExprId,
        op: Option<BinaryOp>,
        value: ExprId,
        span: Span,
    ) -> BoundExpr {
        let target = self.bind_expr(target_id);
        if target.is_error() {
            // Still bind the right side for its own diagnostics.
            let _ = self.bind_expr(value);
            return BoundExpr::error(span);
        }

        let assignable = match (&target.kind, target.symbol.is_valid()) {
            (BoundExprKind::Local | BoundExprKind::Parameter, true) => true,
            (BoundExprKind::Field { .. }, true) => {
                let readonly = self
                    .table
                    .get(target.symbol)
                    .is_some_and(|s| s.is_readonly());
                let in_own_ctor = self.in_constructor_of(target.symbol);
                if readonly && !in_own_ctor {
                    self.report(dc::READONLY_FIELD_ASSIGNMENT, target.span, &[]);
                    return BoundExpr::error(span);
                }
                true
            }
            (BoundExprKind::Property { .. }, true) => {
                let get_only = self
                    .table
                    .get(target.symbol)
                    .is_some_and(|s| s.modifiers.contains(Modifiers::GET_ONLY));
                if get_only {
                    let display = self.table.signature_display(target.symbol);
                    self.report(dc::READONLY_PROPERTY_ASSIGNMENT, target.span, &[&display]);
                    return BoundExpr::error(span);
                }
                true
            }
            _ => false,
        };
        if !assignable {
            self.report(dc::ASSIGNMENT_TARGET_NOT_VARIABLE, target.span, &[]);
            let _ = self.bind_expr(value);
            return BoundExpr::error(span);
        }

        // A compound assignment binds as the operator applied to target and
        // value, then converted back to the target's type. The target node
        // rebinds as the operator's left operand.
        let value = match op {
            Some(op) => self.bind_binary(op, target_id, value, span),
            None => self.bind_expr(value),
        };
        let value = self.apply_conversion(value, target.ty);
        let ty = target.ty;
        BoundExpr::new(
            BoundExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
            span,
        )
    }

    fn bind_conditional(
        &mut self,
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
        span: Span,
    ) -> BoundExpr {
        let cond = self.bind_condition(cond);
        let then_expr = self.bind_expr(then_expr);
        let else_expr = self.bind_expr(else_expr);
        if then_expr.is_error() || else_expr.is_error() {
            return BoundExpr::error(span);
        }

        let result_ty = if then_expr.ty == else_expr.ty {
            then_expr.ty
        } else if self
            .conversions
            .classify(then_expr.ty, else_expr.ty)
            .is_implicit()
            && !self
                .conversions
                .classify(else_expr.ty, then_expr.ty)
                .is_implicit()
        {
            else_expr.ty
        } else if self
            .conversions
            .classify(else_expr.ty, then_expr.ty)
            .is_implicit()
        {
            then_expr.ty
        } else {
            self.report(
                dc::CONDITIONAL_TYPE_UNDETERMINED,
                span,
                &[&self.display(then_expr.ty), &self.display(else_expr.ty)],
            );
            return BoundExpr::error(span);
        };

        let then_expr = self.apply_conversion(then_expr, result_ty);
        let else_expr = self.apply_conversion(else_expr, result_ty);
        BoundExpr::new(
            BoundExprKind::Conditional {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            result_ty,
            span,
        )
    }

    fn bind_cast(&mut self, ty: TypeRef, expr: ExprId, span: Span) -> BoundExpr {
        let target = self.resolve_type(ty);
        let operand = self.bind_expr(expr);
        if operand.is_error() || target.is_error() {
            return BoundExpr::error(span);
        }

        let conversion = self.conversions.classify(operand.ty, target);
        if let Some((first, second)) = conversion.ambiguous_operators {
            self.report(
                dc::AMBIGUOUS_USER_DEFINED_CONVERSION,
                span,
                &[
                    &self.table.signature_display(first),
                    &self.table.signature_display(second),
                    &self.display(operand.ty),
                    &self.display(target),
                ],
            );
            return BoundExpr::error(span);
        }
        if !conversion.exists() {
            self.report(
                dc::CANNOT_CONVERT,
                span,
                &[&self.display(operand.ty), &self.display(target)],
            );
            return BoundExpr::error(span);
        }

        let constant = self.convert_constant(&operand, target, span);
        let mut bound = BoundExpr::new(
            BoundExprKind::Cast {
                operand: Box::new(operand),
            },
            target,
            span,
        );
        bound.conversion = conversion;
        if let Some(constant) = constant {
            bound = bound.with_constant(constant);
        }
        bound
    }

    // =========================================================================
    // Conversion application
    // =========================================================================

    /// Convert `expr` to `target`, inserting a `Convert` node and reporting
    /// the appropriate diagnostic when no implicit conversion applies.
    fn apply_conversion(&mut self, expr: BoundExpr, target: TypeId) -> BoundExpr {
        if expr.is_error() || target.is_error() || expr.ty == target {
            return expr;
        }
        let conversion = self.conversions.classify(expr.ty, target);
        if let Some((first, second)) = conversion.ambiguous_operators {
            self.report(
                dc::AMBIGUOUS_USER_DEFINED_CONVERSION,
                expr.span,
                &[
                    &self.table.signature_display(first),
                    &self.table.signature_display(second),
                    &self.display(expr.ty),
                    &self.display(target),
                ],
            );
            return BoundExpr::error(expr.span);
        }
        if !conversion.is_implicit() {
            let span = expr.span;
            if expr.ty == TypeId::NULL {
                self.report(dc::CANNOT_CONVERT_NULL, span, &[&self.display(target)]);
            } else if conversion.exists() {
                // An unrepresentable constant gets the range diagnostic,
                // which names the value; a representable one still needs the
                // cast spelled out.
                if !self.report_constant_out_of_range(&expr, target) {
                    self.report(
                        dc::NO_IMPLICIT_CONVERSION_CAST_EXISTS,
                        span,
                        &[&self.display(expr.ty), &self.display(target)],
                    );
                }
            } else {
                self.report(
                    dc::NO_IMPLICIT_CONVERSION,
                    span,
                    &[&self.display(expr.ty), &self.display(target)],
                );
            }
            return BoundExpr::error(span);
        }

        let constant = self.convert_constant(&expr, target, expr.span);
        let span = expr.span;
        let symbol = conversion.operator.unwrap_or(SymbolId::INVALID);
        let mut bound = BoundExpr::new(
            BoundExprKind::Convert {
                operand: Box::new(expr),
            },
            target,
            span,
        )
        .with_symbol(symbol);
        bound.conversion = conversion;
        if let Some(constant) = constant {
            bound = bound.with_constant(constant);
        }
        bound
    }

    /// Fold a constant through a conversion to a primitive target, reporting
    /// out-of-range values against the target keyword.
    fn convert_constant(
        &mut self,
        expr: &BoundExpr,
        target: TypeId,
        span: Span,
    ) -> Option<ConstValue> {
        let value = expr.constant.as_ref()?;
        let kind = self.table.types.primitive_kind(target)?;
        match const_eval::convert(value, kind, &self.table.names) {
            Ok(folded) => Some(folded),
            Err(ConstError::OutOfRange) => {
                let rendered = render_const(self.table, value);
                self.report(
                    dc::CONSTANT_VALUE_OUT_OF_RANGE,
                    span,
                    &[&rendered, kind.keyword()],
                );
                None
            }
            Err(_) => None,
        }
    }

    /// When `expr` carries a constant with no representation in the primitive
    /// `target`, report the range error naming the value. Returns whether it
    /// reported.
    fn report_constant_out_of_range(&mut self, expr: &BoundExpr, target: TypeId) -> bool {
        let Some(value) = expr.constant.as_ref() else {
            return false;
        };
        let Some(kind) = self.table.types.primitive_kind(target) else {
            return false;
        };
        if const_eval::convert(value, kind, &self.table.names) != Err(ConstError::OutOfRange) {
            return false;
        }
        let rendered = render_const(self.table, value);
        self.report(
            dc::CONSTANT_VALUE_OUT_OF_RANGE,
            expr.span,
            &[&rendered, kind.keyword()],
        );
        true
    }

    /// The interned id for a promoted numeric kind.
    fn common_type_id(&self, kind: PrimitiveKind) -> TypeId {
        match kind {
            PrimitiveKind::Int => TypeId::INT,
            PrimitiveKind::UInt => TypeId::UINT,
            PrimitiveKind::Long => TypeId::LONG,
            PrimitiveKind::ULong => TypeId::ULONG,
            PrimitiveKind::Float => TypeId::FLOAT,
            PrimitiveKind::Double => TypeId::DOUBLE,
            PrimitiveKind::Decimal => TypeId::DECIMAL,
            _ => TypeId::INT,
        }
    }

    // =========================================================================
    // Symbol-use checks
    // =========================================================================

    fn check_obsolete(&self, symbol: SymbolId, span: Span) {
        let Some(info) = self.table.get(symbol).and_then(|s| s.obsolete) else {
            return;
        };
        let name = self.table.name_of(symbol);
        match info.message {
            Some(message) => {
                let message = self.table.names.resolve(message);
                let code = if info.is_error {
                    dc::OBSOLETE_SYMBOL_ERROR
                } else {
                    dc::OBSOLETE_SYMBOL_WITH_MESSAGE
                };
                self.report(code, span, &[&name, &message]);
            }
            None => self.report(dc::OBSOLETE_SYMBOL, span, &[&name]),
        }
    }

    /// Readonly fields are writable only inside a constructor of the type
    /// declaring them.
    fn in_constructor_of(&self, field: SymbolId) -> bool {
        let Some(method) = self.table.get(self.ctx.method) else {
            return false;
        };
        if method.kind != SymbolKind::Constructor {
            return false;
        }
        let field_owner = self.table.get(field).and_then(|f| f.container);
        field_owner.is_some() && field_owner == self.ctx.container
    }
}

/// Binary numeric promotion: the common type both operands convert to.
/// `None` for invalid sign mixes (`ulong` with a signed type) and for
/// decimal mixed with a floating type.
fn binary_numeric_common(l: PrimitiveKind, r: PrimitiveKind) -> Option<PrimitiveKind> {
    use PrimitiveKind::*;
    if l == Decimal || r == Decimal {
        if matches!(l, Float | Double) || matches!(r, Float | Double) {
            return None;
        }
        return Some(Decimal);
    }
    if l == Double || r == Double {
        return Some(Double);
    }
    if l == Float || r == Float {
        return Some(Float);
    }
    if l == ULong || r == ULong {
        let other = if l == ULong { r } else { l };
        if matches!(other, SByte | Short | Int | Long) {
            return None;
        }
        return Some(ULong);
    }
    if l == Long || r == Long {
        return Some(Long);
    }
    if l == UInt || r == UInt {
        let other = if l == UInt { r } else { l };
        if matches!(other, SByte | Short | Int) {
            return Some(Long);
        }
        return Some(UInt);
    }
    Some(Int)
}

/// Render a constant the way a diagnostic cites it.
fn render_const(table: &SymbolTable, value: &ConstValue) -> String {
    match value {
        ConstValue::Int(v) => v.to_string(),
        ConstValue::UInt(v) => v.to_string(),
        ConstValue::Long(v) => v.to_string(),
        ConstValue::ULong(v) => v.to_string(),
        ConstValue::Float(v) => v.to_string(),
        ConstValue::Double(v) => v.to_string(),
        ConstValue::Decimal(text) | ConstValue::Str(text) => table.names.resolve(*text),
        ConstValue::Bool(v) => v.to_string(),
        ConstValue::Char(v) => v.to_string(),
        ConstValue::Null => "null".to_string(),
    }
}

/// Build the binding context for one method from its symbol.
fn context_for(
    table: &SymbolTable,
    body: &MethodBody,
    exception_base: Option<TypeId>,
    suppression: &SuppressionContext,
) -> BindingContext {
    let symbol = table.get(body.method);
    BindingContext {
        container: symbol.as_ref().and_then(|s| s.container),
        method: body.method,
        params: body.params.clone(),
        is_static: symbol.as_ref().is_some_and(Symbol::is_static),
        checked: true,
        return_type: symbol.as_ref().map_or(TypeId::VOID, |s| s.ty),
        exception_base,
        suppression: suppression.clone(),
    }
}

/// Bind every method body of a compilation, in parallel.
///
/// Bodies are independent once declarations are seeded, so they bind on the
/// rayon pool with a private diagnostic bag each; the bags are absorbed into
/// `bag` in declaration order so output is deterministic regardless of
/// scheduling. Cancellation discards not-yet-absorbed results wholesale.
pub fn bind_compilation(
    table: &SymbolTable,
    arena: &AstArena,
    bodies: &[MethodBody],
    exception_base: Option<TypeId>,
    suppression: &SuppressionContext,
    cancel: &CancelFlag,
    bag: &DiagnosticBag,
) -> Vec<BoundMethod> {
    let bound: Vec<Option<(DiagnosticBag, BoundMethod)>> = bodies
        .par_iter()
        .map(|body| {
            if cancel.is_cancelled() {
                return None;
            }
            let local_bag = DiagnosticBag::new();
            let ctx = context_for(table, body, exception_base, suppression);
            let mut binder = Binder::new(table, arena, &local_bag, ctx);
            let tree = binder.bind_body(body.body, &body.struct_fields);
            Some((
                local_bag,
                BoundMethod {
                    method: body.method,
                    body: tree,
                },
            ))
        })
        .collect();

    if cancel.is_cancelled() {
        return Vec::new();
    }
    let mut methods = Vec::with_capacity(bound.len());
    for entry in bound {
        let Some((local_bag, method)) = entry else {
            continue;
        };
        bag.absorb(local_bag);
        methods.push(method);
    }
    methods
}

#[cfg(test)]
#[path = "../tests/binder_unit_tests.rs"]
mod tests;
