use super::{Binder, BindingContext, binary_numeric_common, render_const};
use crate::bound::{BoundExpr, BoundExprKind, OperatorKind};
use crate::const_eval::ConstValue;
use crate::diag::{DiagnosticBag, SuppressionContext};
use sable_ast::arena::{AstArena, ExprId};
use sable_ast::node::{Argument, BinaryOp, ExprKind, LitValue, TypeRef, UnaryOp};
use sable_common::diagnostics::diagnostic_codes as dc;
use sable_common::interner::Interner;
use sable_common::span::Span;
use sable_symbols::{
    Accessibility, Modifiers, ObsoleteInfo, PrimitiveKind, Symbol, SymbolId, SymbolKind,
    SymbolTable, TypeId,
};
use std::cell::Cell;
use std::sync::Arc;

struct Fixture {
    table: SymbolTable,
    arena: AstArena,
    class: SymbolId,
    method: SymbolId,
    params: Vec<SymbolId>,
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
        Self {
            table,
            arena: AstArena::new(),
            class,
            method,
            params: Vec::new(),
            next: Cell::new(0),
        }
    }

    /// Strictly increasing spans so diagnostic order is deterministic.
    fn span(&self) -> Span {
        let start = self.next.get();
        self.next.set(start + 10);
        Span::new(start, 5)
    }

    fn param(&mut self, name: &str, ty: TypeId) -> SymbolId {
        let atom = self.table.names.intern(name);
        let symbol = self.table.symbols.register(
            Symbol::new(SymbolKind::Parameter, atom, ty).with_container(self.method),
        );
        self.params.push(symbol);
        symbol
    }

    fn field(&self, name: &str, ty: TypeId, modifiers: Modifiers) -> SymbolId {
        let atom = self.table.names.intern(name);
        let field = self.table.symbols.register(
            Symbol::new(SymbolKind::Field, atom, ty)
                .with_container(self.class)
                .with_modifiers(modifiers),
        );
        self.table.symbols.add_member(self.class, field);
        field
    }

    fn int(&mut self, value: i128) -> ExprId {
        let text = self.table.names.intern(&value.to_string());
        let span = self.span();
        self.arena.lit(LitValue::Int(value), text, span)
    }

    fn double(&mut self, value: f64) -> ExprId {
        let text = self.table.names.intern(&value.to_string());
        let span = self.span();
        self.arena.lit(LitValue::Float(value), text, span)
    }

    fn string(&mut self, value: &str) -> ExprId {
        let atom = self.table.names.intern(value);
        let span = self.span();
        self.arena.lit(LitValue::Str(atom), atom, span)
    }

    fn bool_lit(&mut self, value: bool) -> ExprId {
        let text = self.table.names.intern(if value { "true" } else { "false" });
        let span = self.span();
        self.arena.lit(LitValue::Bool(value), text, span)
    }

    fn null(&mut self) -> ExprId {
        let text = self.table.names.intern("null");
        let span = self.span();
        self.arena.lit(LitValue::Null, text, span)
    }

    fn name(&mut self, name: &str) -> ExprId {
        let atom = self.table.names.intern(name);
        let span = self.span();
        self.arena.name(atom, span)
    }

    fn ctx(&self) -> BindingContext {
        BindingContext {
            container: Some(self.class),
            method: self.method,
            params: self.params.clone(),
            is_static: false,
            checked: true,
            return_type: TypeId::VOID,
            exception_base: None,
            suppression: SuppressionContext::empty(),
        }
    }

    fn bind(&self, expr: ExprId) -> (BoundExpr, Vec<u32>) {
        self.bind_in(expr, self.ctx())
    }

    fn bind_in(&self, expr: ExprId, ctx: BindingContext) -> (BoundExpr, Vec<u32>) {
        let bag = DiagnosticBag::new();
        let mut binder = Binder::new(&self.table, &self.arena, &bag, ctx);
        let bound = binder.bind_expr(expr);
        let codes = bag.drain_all().into_iter().map(|d| d.code).collect();
        (bound, codes)
    }
}

#[test]
fn numeric_promotion_follows_the_common_type_rules() {
    use PrimitiveKind::*;
    assert_eq!(binary_numeric_common(Int, Int), Some(Int));
    assert_eq!(binary_numeric_common(Byte, Short), Some(Int));
    assert_eq!(binary_numeric_common(Int, Double), Some(Double));
    assert_eq!(binary_numeric_common(Float, Long), Some(Float));
    assert_eq!(binary_numeric_common(UInt, UInt), Some(UInt));
    // uint with a small signed type goes to long, not uint.
    assert_eq!(binary_numeric_common(UInt, Int), Some(Long));
    assert_eq!(binary_numeric_common(ULong, UInt), Some(ULong));
    assert_eq!(binary_numeric_common(ULong, Long), None);
    assert_eq!(binary_numeric_common(Decimal, Long), Some(Decimal));
    assert_eq!(binary_numeric_common(Decimal, Double), None);
}

#[test]
fn constants_render_the_way_diagnostics_cite_them() {
    let f = Fixture::new();
    assert_eq!(render_const(&f.table, &ConstValue::Int(-3)), "-3");
    assert_eq!(render_const(&f.table, &ConstValue::Bool(true)), "true");
    assert_eq!(render_const(&f.table, &ConstValue::Null), "null");
    let atom = f.table.names.intern("hi");
    assert_eq!(render_const(&f.table, &ConstValue::Str(atom)), "hi");
}

#[test]
fn integer_addition_folds_to_a_constant() {
    let mut f = Fixture::new();
    let lhs = f.int(2);
    let rhs = f.int(3);
    let span = f.span();
    let sum = f.arena.binary(BinaryOp::Add, lhs, rhs, span);

    let (bound, codes) = f.bind(sum);
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");
    assert_eq!(bound.ty, TypeId::INT);
    assert_eq!(bound.constant, Some(ConstValue::Int(5)));
}

#[test]
fn division_by_constant_zero_is_reported() {
    let mut f = Fixture::new();
    let lhs = f.int(1);
    let rhs = f.int(0);
    let span = f.span();
    let div = f.arena.binary(BinaryOp::Div, lhs, rhs, span);

    let (bound, codes) = f.bind(div);
    assert_eq!(codes, vec![dc::INTEGER_DIVISION_BY_ZERO]);
    assert_eq!(bound.ty, TypeId::INT);
    assert_eq!(bound.constant, None);
}

#[test]
fn checked_overflow_is_an_error_and_unchecked_wraps() {
    let mut f = Fixture::new();
    let lhs = f.int(i128::from(i32::MAX));
    let rhs = f.int(1);
    let span = f.span();
    let sum = f.arena.binary(BinaryOp::Add, lhs, rhs, span);

    let (_, codes) = f.bind(sum);
    assert_eq!(codes, vec![dc::CHECKED_OVERFLOW]);

    let mut unchecked = f.ctx();
    unchecked.checked = false;
    let (bound, codes) = f.bind_in(sum, unchecked);
    assert!(codes.is_empty());
    assert_eq!(bound.constant, Some(ConstValue::Int(i32::MIN)));
}

#[test]
fn oversized_integer_literal_is_out_of_range() {
    let mut f = Fixture::new();
    let lit = f.int(i128::from(u64::MAX) + 1);
    let (bound, codes) = f.bind(lit);
    assert_eq!(codes, vec![dc::CONSTANT_VALUE_OUT_OF_RANGE]);
    assert!(bound.is_error());
}

#[test]
fn negating_a_uint_promotes_to_long() {
    let mut f = Fixture::new();
    let operand = f.int(3_000_000_000);
    let span = f.span();
    let neg = f.arena.alloc_expr(
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        },
        span,
    );

    let (bound, codes) = f.bind(neg);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, TypeId::LONG);
    assert_eq!(bound.constant, Some(ConstValue::Long(-3_000_000_000)));
}

#[test]
fn negating_a_ulong_has_no_operator() {
    let mut f = Fixture::new();
    let operand = f.int(10_000_000_000_000_000_000);
    let span = f.span();
    let neg = f.arena.alloc_expr(
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        },
        span,
    );

    let (bound, codes) = f.bind(neg);
    assert_eq!(codes, vec![dc::UNARY_OPERATOR_CANNOT_BE_APPLIED]);
    assert!(bound.is_error());
}

#[test]
fn logical_not_on_a_number_is_rejected() {
    let mut f = Fixture::new();
    let operand = f.int(5);
    let span = f.span();
    let not = f.arena.alloc_expr(
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        },
        span,
    );

    let (_, codes) = f.bind(not);
    assert_eq!(codes, vec![dc::UNARY_OPERATOR_CANNOT_BE_APPLIED]);
}

#[test]
fn string_concatenation_types_as_string() {
    let mut f = Fixture::new();
    let lhs = f.string("n = ");
    let rhs = f.int(1);
    let span = f.span();
    let concat = f.arena.binary(BinaryOp::Add, lhs, rhs, span);

    let (bound, codes) = f.bind(concat);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, TypeId::STRING);
}

#[test]
fn mismatched_operands_report_the_operator_and_both_types() {
    let mut f = Fixture::new();
    let lhs = f.bool_lit(true);
    let rhs = f.int(1);
    let span = f.span();
    let sum = f.arena.binary(BinaryOp::Add, lhs, rhs, span);

    let (bound, codes) = f.bind(sum);
    assert_eq!(codes, vec![dc::OPERATOR_CANNOT_BE_APPLIED]);
    assert!(bound.is_error());
}

#[test]
fn comparing_a_value_type_to_null_warns_and_types_bool() {
    let mut f = Fixture::new();
    f.param("x", TypeId::INT);
    let lhs = f.name("x");
    let rhs = f.null();
    let span = f.span();
    let cmp = f.arena.binary(BinaryOp::Eq, lhs, rhs, span);

    let (bound, codes) = f.bind(cmp);
    assert_eq!(codes, vec![dc::EXPRESSION_ALWAYS_CONSTANT]);
    assert_eq!(bound.ty, TypeId::BOOL);
}

#[test]
fn comparing_a_variable_to_itself_warns() {
    let mut f = Fixture::new();
    f.param("x", TypeId::INT);
    let lhs = f.name("x");
    let rhs = f.name("x");
    let span = f.span();
    let cmp = f.arena.binary(BinaryOp::Lt, lhs, rhs, span);

    let (bound, codes) = f.bind(cmp);
    assert_eq!(codes, vec![dc::SELF_COMPARISON]);
    assert_eq!(bound.ty, TypeId::BOOL);
}

#[test]
fn conditional_picks_the_type_both_branches_convert_to() {
    let mut f = Fixture::new();
    let cond = f.bool_lit(true);
    let then_expr = f.int(1);
    let else_expr = f.int(10_000_000_000);
    let span = f.span();
    let conditional = f.arena.alloc_expr(
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        },
        span,
    );

    let (bound, codes) = f.bind(conditional);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, TypeId::LONG);
}

#[test]
fn conditional_with_unrelated_branches_is_an_error() {
    let mut f = Fixture::new();
    let cond = f.bool_lit(true);
    let then_expr = f.string("a");
    let else_expr = f.int(1);
    let span = f.span();
    let conditional = f.arena.alloc_expr(
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        },
        span,
    );

    let (bound, codes) = f.bind(conditional);
    assert_eq!(codes, vec![dc::CONDITIONAL_TYPE_UNDETERMINED]);
    assert!(bound.is_error());
}

#[test]
fn explicit_cast_folds_its_constant() {
    let mut f = Fixture::new();
    let operand = f.int(1);
    let span = f.span();
    let cast = f.arena.alloc_expr(
        ExprKind::Cast {
            ty: TypeRef(TypeId::LONG.0),
            expr: operand,
        },
        span,
    );

    let (bound, codes) = f.bind(cast);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, TypeId::LONG);
    assert_eq!(bound.constant, Some(ConstValue::Long(1)));
}

#[test]
fn cast_between_unrelated_types_is_rejected() {
    let mut f = Fixture::new();
    let operand = f.string("a");
    let span = f.span();
    let cast = f.arena.alloc_expr(
        ExprKind::Cast {
            ty: TypeRef(TypeId::BOOL.0),
            expr: operand,
        },
        span,
    );

    let (bound, codes) = f.bind(cast);
    assert_eq!(codes, vec![dc::CANNOT_CONVERT]);
    assert!(bound.is_error());
}

#[test]
fn narrowing_assignment_cites_the_existing_cast() {
    let mut f = Fixture::new();
    f.param("x", TypeId::INT);
    let target = f.name("x");
    let value = f.double(1.5);
    let span = f.span();
    let assign = f.arena.assign(target, value, span);

    let (_, codes) = f.bind(assign);
    assert_eq!(codes, vec![dc::NO_IMPLICIT_CONVERSION_CAST_EXISTS]);
}

#[test]
fn unrelated_assignment_reports_no_conversion() {
    let mut f = Fixture::new();
    f.param("x", TypeId::INT);
    let target = f.name("x");
    let value = f.string("s");
    let span = f.span();
    let assign = f.arena.assign(target, value, span);

    let (_, codes) = f.bind(assign);
    assert_eq!(codes, vec![dc::NO_IMPLICIT_CONVERSION]);
}

#[test]
fn null_does_not_convert_to_a_value_type() {
    let mut f = Fixture::new();
    f.param("x", TypeId::INT);
    let target = f.name("x");
    let value = f.null();
    let span = f.span();
    let assign = f.arena.assign(target, value, span);

    let (_, codes) = f.bind(assign);
    assert_eq!(codes, vec![dc::CANNOT_CONVERT_NULL]);
}

#[test]
fn null_converts_to_a_nullable_type() {
    let mut f = Fixture::new();
    let nullable_int = f.table.types.nullable(TypeId::INT);
    f.param("x", nullable_int);
    let target = f.name("x");
    let value = f.null();
    let span = f.span();
    let assign = f.arena.assign(target, value, span);

    let (bound, codes) = f.bind(assign);
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");
    assert_eq!(bound.ty, nullable_int);
}

#[test]
fn assigning_to_a_literal_is_rejected() {
    let mut f = Fixture::new();
    let target = f.int(1);
    let value = f.int(2);
    let span = f.span();
    let assign = f.arena.assign(target, value, span);

    let (bound, codes) = f.bind(assign);
    assert_eq!(codes, vec![dc::ASSIGNMENT_TARGET_NOT_VARIABLE]);
    assert!(bound.is_error());
}

#[test]
fn compound_assignment_rebinds_the_operator() {
    let mut f = Fixture::new();
    f.param("x", TypeId::INT);
    let target = f.name("x");
    let value = f.int(2);
    let span = f.span();
    let assign = f.arena.alloc_expr(
        ExprKind::Assign {
            target,
            op: Some(BinaryOp::Add),
            value,
        },
        span,
    );

    let (bound, codes) = f.bind(assign);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, TypeId::INT);
    let BoundExprKind::Assign { value, .. } = &bound.kind else {
        panic!("expected an assignment, got {:?}", bound.kind);
    };
    assert!(matches!(
        value.kind,
        BoundExprKind::Binary {
            op: BinaryOp::Add,
            operator: OperatorKind::BuiltIn,
            ..
        }
    ));
}

#[test]
fn readonly_field_is_writable_only_in_its_constructor() {
    let mut f = Fixture::new();
    f.field("total", TypeId::INT, Modifiers::READONLY);
    let target = f.name("total");
    let value = f.int(1);
    let span = f.span();
    let assign = f.arena.assign(target, value, span);

    let (_, codes) = f.bind(assign);
    assert_eq!(codes, vec![dc::READONLY_FIELD_ASSIGNMENT]);

    let ctor_name = f.table.names.intern(".ctor");
    let ctor = f.table.symbols.register(
        Symbol::new(SymbolKind::Constructor, ctor_name, TypeId::VOID).with_container(f.class),
    );
    f.table.symbols.add_member(f.class, ctor);
    let mut ctx = f.ctx();
    ctx.method = ctor;
    let (_, codes) = f.bind_in(assign, ctx);
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");
}

#[test]
fn get_only_property_rejects_assignment() {
    let mut f = Fixture::new();
    let atom = f.table.names.intern("Count");
    let property = f.table.symbols.register(
        Symbol::new(SymbolKind::Property, atom, TypeId::INT)
            .with_container(f.class)
            .with_modifiers(Modifiers::GET_ONLY),
    );
    f.table.symbols.add_member(f.class, property);

    let target = f.name("Count");
    let value = f.int(1);
    let span = f.span();
    let assign = f.arena.assign(target, value, span);

    let (_, codes) = f.bind(assign);
    assert_eq!(codes, vec![dc::READONLY_PROPERTY_ASSIGNMENT]);
}

#[test]
fn unknown_name_is_reported_once() {
    let mut f = Fixture::new();
    let name = f.name("missing");
    let (bound, codes) = f.bind(name);
    assert_eq!(codes, vec![dc::NAME_NOT_IN_CONTEXT]);
    assert!(bound.is_error());
}

#[test]
fn this_is_rejected_in_a_static_method() {
    let mut f = Fixture::new();
    let span = f.span();
    let this = f.arena.alloc_expr(ExprKind::This, span);

    let mut ctx = f.ctx();
    ctx.is_static = true;
    let (bound, codes) = f.bind_in(this, ctx);
    assert_eq!(codes, vec![dc::THIS_IN_STATIC_CONTEXT]);
    assert!(bound.is_error());

    let (bound, codes) = f.bind(this);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, f.table.types.named(f.class, vec![]));
}

#[test]
fn member_access_resolves_fields_through_the_receiver() {
    let mut f = Fixture::new();
    let field = f.field("value", TypeId::INT, Modifiers::empty());
    let self_ty = f.table.types.named(f.class, vec![]);
    f.param("c", self_ty);

    let receiver = f.name("c");
    let atom = f.table.names.intern("value");
    let span = f.span();
    let access = f.arena.member(receiver, atom, span);

    let (bound, codes) = f.bind(access);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, TypeId::INT);
    assert_eq!(bound.symbol, field);
    assert!(matches!(bound.kind, BoundExprKind::Field { receiver: Some(_) }));
}

#[test]
fn missing_member_names_the_receiver_type() {
    let mut f = Fixture::new();
    let self_ty = f.table.types.named(f.class, vec![]);
    f.param("c", self_ty);
    let receiver = f.name("c");
    let atom = f.table.names.intern("nothing");
    let span = f.span();
    let access = f.arena.member(receiver, atom, span);

    let (bound, codes) = f.bind(access);
    assert_eq!(codes, vec![dc::NO_SUCH_MEMBER]);
    assert!(bound.is_error());
}

#[test]
fn private_member_is_inaccessible_from_another_type() {
    let mut f = Fixture::new();
    let atom = f.table.names.intern("secret");
    let field = f.table.symbols.register(
        Symbol::new(SymbolKind::Field, atom, TypeId::INT)
            .with_container(f.class)
            .with_accessibility(Accessibility::Private),
    );
    f.table.symbols.add_member(f.class, field);

    let other_name = f.table.names.intern("D");
    let other = f
        .table
        .symbols
        .register(Symbol::new(SymbolKind::Class, other_name, TypeId::ERROR));

    let self_ty = f.table.types.named(f.class, vec![]);
    f.param("c", self_ty);
    let receiver = f.name("c");
    let span = f.span();
    let access = f.arena.member(receiver, atom, span);

    let mut ctx = f.ctx();
    ctx.container = Some(other);
    let (bound, codes) = f.bind_in(access, ctx);
    assert_eq!(codes, vec![dc::MEMBER_INACCESSIBLE]);
    assert!(bound.is_error());
}

#[test]
fn calling_an_obsolete_method_warns_with_its_message() {
    let mut f = Fixture::new();
    let atom = f.table.names.intern("Old");
    let message = f.table.names.intern("use New instead");
    let method = f.table.symbols.register(
        Symbol::new(SymbolKind::Method, atom, TypeId::VOID)
            .with_container(f.class)
            .with_obsolete(ObsoleteInfo {
                message: Some(message),
                is_error: false,
            }),
    );
    f.table.symbols.add_member(f.class, method);

    let callee = f.name("Old");
    let span = f.span();
    let call = f.arena.call(callee, Vec::new(), span);

    let (bound, codes) = f.bind(call);
    assert_eq!(codes, vec![dc::OBSOLETE_SYMBOL_WITH_MESSAGE]);
    assert_eq!(bound.symbol, method);
}

#[test]
fn construction_without_declared_constructors_is_parameterless() {
    let mut f = Fixture::new();
    let self_ty = f.table.types.named(f.class, vec![]);
    let span = f.span();
    let empty = f.arena.alloc_expr(
        ExprKind::New {
            ty: TypeRef(self_ty.0),
            args: Vec::new(),
        },
        span,
    );
    let (bound, codes) = f.bind(empty);
    assert!(codes.is_empty());
    assert_eq!(bound.ty, self_ty);

    let arg = f.int(1);
    let span = f.span();
    let with_arg = f.arena.alloc_expr(
        ExprKind::New {
            ty: TypeRef(self_ty.0),
            args: vec![Argument::positional(arg)],
        },
        span,
    );
    let (bound, codes) = f.bind(with_arg);
    assert_eq!(codes, vec![dc::BAD_OVERLOAD_ARGUMENTS]);
    assert!(bound.is_error());
}
