use crate::constraints::{check_constraint_cycles, check_type_arguments, check_variance};
use crate::convert::Conversions;
use crate::diag::{DiagnosticBag, SuppressionContext};
use sable_common::diagnostics::diagnostic_codes as dc;
use sable_common::interner::Interner;
use sable_common::span::Span;
use sable_symbols::{
    Accessibility, ConstraintSet, Modifiers, ParamInfo, Symbol, SymbolId, SymbolKind, SymbolTable,
    TypeId, TypeParamInfo, Variance,
};
use std::sync::Arc;

fn table() -> SymbolTable {
    SymbolTable::new(Arc::new(Interner::new()))
}

fn type_param(table: &SymbolTable, name: &str) -> (SymbolId, TypeParamInfo) {
    let atom = table.names.intern(name);
    let symbol = table
        .symbols
        .register(Symbol::new(SymbolKind::TypeParameter, atom, TypeId::ERROR));
    (
        symbol,
        TypeParamInfo {
            symbol,
            name: atom,
            variance: Variance::Invariant,
            constraints: ConstraintSet::default(),
        },
    )
}

fn generic_class(table: &SymbolTable, name: &str, params: Vec<TypeParamInfo>) -> SymbolId {
    let atom = table.names.intern(name);
    table
        .symbols
        .register(Symbol::new(SymbolKind::Class, atom, TypeId::ERROR).with_type_params(params))
}

fn codes(bag: &DiagnosticBag) -> Vec<u32> {
    bag.drain_all().into_iter().map(|d| d.code).collect()
}

#[test]
fn class_constraint_rejects_value_type_argument() {
    let table = table();
    let (_, mut param) = type_param(&table, "T");
    param.constraints.reference_type = true;
    let generic = generic_class(&table, "Holder", vec![param]);

    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    let conversions = Conversions::new(&table);
    check_type_arguments(
        &table,
        &conversions,
        &bag,
        &ctx,
        generic,
        &[TypeId::INT],
        Span::new(0, 6),
    );
    assert_eq!(codes(&bag), vec![dc::CONSTRAINT_NEEDS_REFERENCE_TYPE]);

    let bag = DiagnosticBag::new();
    check_type_arguments(
        &table,
        &conversions,
        &bag,
        &ctx,
        generic,
        &[TypeId::STRING],
        Span::new(0, 6),
    );
    assert!(bag.is_empty());
}

#[test]
fn struct_constraint_rejects_references_and_nullables() {
    let table = table();
    let (_, mut param) = type_param(&table, "T");
    param.constraints.value_type = true;
    let generic = generic_class(&table, "Holder", vec![param]);

    let conversions = Conversions::new(&table);
    let ctx = SuppressionContext::empty();
    let nullable_int = table.types.nullable(TypeId::INT);

    for bad in [TypeId::STRING, nullable_int] {
        let bag = DiagnosticBag::new();
        check_type_arguments(&table, &conversions, &bag, &ctx, generic, &[bad], Span::new(0, 6));
        assert_eq!(codes(&bag), vec![dc::CONSTRAINT_NEEDS_VALUE_TYPE]);
    }

    let bag = DiagnosticBag::new();
    check_type_arguments(
        &table,
        &conversions,
        &bag,
        &ctx,
        generic,
        &[TypeId::INT],
        Span::new(0, 6),
    );
    assert!(bag.is_empty());
}

#[test]
fn new_constraint_requires_accessible_parameterless_constructor() {
    let table = table();
    let (_, mut param) = type_param(&table, "T");
    param.constraints.needs_new = true;
    let generic = generic_class(&table, "Factory", vec![param]);

    // A class with only a parameterized constructor fails.
    let bare_atom = table.names.intern("Bare");
    let bare = table
        .symbols
        .register(Symbol::new(SymbolKind::Class, bare_atom, TypeId::ERROR));
    let ctor_atom = table.names.intern(".ctor");
    let ctor = table.symbols.register(
        Symbol::new(SymbolKind::Constructor, ctor_atom, TypeId::VOID)
            .with_container(bare)
            .with_params(vec![ParamInfo::new(table.names.intern("x"), TypeId::INT)]),
    );
    table.symbols.add_member(bare, ctor);
    let bare_ty = table.types.named(bare, vec![]);

    let conversions = Conversions::new(&table);
    let ctx = SuppressionContext::empty();
    let bag = DiagnosticBag::new();
    check_type_arguments(&table, &conversions, &bag, &ctx, generic, &[bare_ty], Span::new(0, 6));
    assert_eq!(codes(&bag), vec![dc::CONSTRAINT_NEEDS_NEW]);

    // Adding a public parameterless constructor fixes it.
    let default_ctor = table.symbols.register(
        Symbol::new(SymbolKind::Constructor, ctor_atom, TypeId::VOID)
            .with_container(bare)
            .with_accessibility(Accessibility::Public),
    );
    table.symbols.add_member(bare, default_ctor);
    let bag = DiagnosticBag::new();
    check_type_arguments(&table, &conversions, &bag, &ctx, generic, &[bare_ty], Span::new(0, 6));
    assert!(bag.is_empty());

    // Value types always satisfy new().
    let bag = DiagnosticBag::new();
    check_type_arguments(&table, &conversions, &bag, &ctx, generic, &[TypeId::INT], Span::new(0, 6));
    assert!(bag.is_empty());
}

#[test]
fn base_bound_requires_implicit_reference_conversion() {
    let table = table();
    let base_atom = table.names.intern("Animal");
    let base = table
        .symbols
        .register(Symbol::new(SymbolKind::Class, base_atom, TypeId::ERROR));
    let base_ty = table.types.named(base, vec![]);
    let derived_atom = table.names.intern("Dog");
    let derived = table.symbols.register(
        Symbol::new(SymbolKind::Class, derived_atom, TypeId::ERROR).with_base(base_ty),
    );
    let derived_ty = table.types.named(derived, vec![]);
    let stranger_atom = table.names.intern("Rock");
    let stranger = table
        .symbols
        .register(Symbol::new(SymbolKind::Class, stranger_atom, TypeId::ERROR));
    let stranger_ty = table.types.named(stranger, vec![]);

    let (_, mut param) = type_param(&table, "T");
    param.constraints.bounds = vec![base_ty];
    let generic = generic_class(&table, "Pen", vec![param]);

    let conversions = Conversions::new(&table);
    let ctx = SuppressionContext::empty();

    let bag = DiagnosticBag::new();
    check_type_arguments(&table, &conversions, &bag, &ctx, generic, &[derived_ty], Span::new(0, 6));
    assert!(bag.is_empty());

    let bag = DiagnosticBag::new();
    check_type_arguments(&table, &conversions, &bag, &ctx, generic, &[stranger_ty], Span::new(0, 6));
    assert_eq!(codes(&bag), vec![dc::CONSTRAINT_NOT_SATISFIED]);
}

#[test]
fn nullable_argument_never_satisfies_interface_bound() {
    let table = table();
    let iface_atom = table.names.intern("IMeasurable");
    let iface = table
        .symbols
        .register(Symbol::new(SymbolKind::Interface, iface_atom, TypeId::ERROR));
    let iface_ty = table.types.named(iface, vec![]);

    // A struct implementing the interface.
    let struct_atom = table.names.intern("Size");
    let size = table.symbols.register(
        Symbol::new(SymbolKind::Struct, struct_atom, TypeId::ERROR)
            .with_interfaces(vec![iface_ty]),
    );
    let size_ty = table.types.named(size, vec![]);
    let nullable_size = table.types.nullable(size_ty);

    let (_, mut param) = type_param(&table, "T");
    param.constraints.bounds = vec![iface_ty];
    let generic = generic_class(&table, "Meter", vec![param]);

    let conversions = Conversions::new(&table);
    let ctx = SuppressionContext::empty();

    let bag = DiagnosticBag::new();
    check_type_arguments(&table, &conversions, &bag, &ctx, generic, &[size_ty], Span::new(0, 6));
    assert!(bag.is_empty());

    // Size? does not satisfy the bound even though Size does.
    let bag = DiagnosticBag::new();
    check_type_arguments(
        &table,
        &conversions,
        &bag,
        &ctx,
        generic,
        &[nullable_size],
        Span::new(0, 6),
    );
    assert_eq!(codes(&bag), vec![dc::CONSTRAINT_NOT_SATISFIED]);
}

#[test]
fn circular_constraints_are_reported_once() {
    let table = table();
    let (t_symbol, mut t_info) = type_param(&table, "T");
    let (u_symbol, mut u_info) = type_param(&table, "U");
    t_info.constraints.bounds = vec![table.types.type_param(u_symbol)];
    u_info.constraints.bounds = vec![table.types.type_param(t_symbol)];
    let generic = generic_class(&table, "Tangle", vec![t_info, u_info]);

    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    check_constraint_cycles(&table, &bag, &ctx, generic, Span::new(0, 10));
    assert_eq!(codes(&bag), vec![dc::CIRCULAR_CONSTRAINT]);
}

#[test]
fn acyclic_chained_constraints_pass() {
    let table = table();
    let (u_symbol, u_info) = type_param(&table, "U");
    let (_, mut t_info) = type_param(&table, "T");
    t_info.constraints.bounds = vec![table.types.type_param(u_symbol)];
    let generic = generic_class(&table, "Chain", vec![t_info, u_info]);

    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    check_constraint_cycles(&table, &bag, &ctx, generic, Span::new(0, 10));
    assert!(bag.is_empty());
}

#[test]
fn covariant_parameter_rejected_in_input_position() {
    let table = table();
    let t_atom = table.names.intern("T");
    let t_symbol = table
        .symbols
        .register(Symbol::new(SymbolKind::TypeParameter, t_atom, TypeId::ERROR));
    let t_ty = table.types.type_param(t_symbol);

    let iface_atom = table.names.intern("IProducer");
    let iface = table.symbols.register(
        Symbol::new(SymbolKind::Interface, iface_atom, TypeId::ERROR).with_type_params(vec![
            TypeParamInfo {
                symbol: t_symbol,
                name: t_atom,
                variance: Variance::Covariant,
                constraints: ConstraintSet::default(),
            },
        ]),
    );

    // T Get() is fine for out T.
    let get = table.symbols.register(
        Symbol::new(SymbolKind::Method, table.names.intern("Get"), t_ty).with_container(iface),
    );
    table.symbols.add_member(iface, get);

    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    check_variance(&table, &bag, &ctx, iface);
    assert!(bag.is_empty());

    // void Put(T item) is not.
    let put = table.symbols.register(
        Symbol::new(SymbolKind::Method, table.names.intern("Put"), TypeId::VOID)
            .with_container(iface)
            .with_params(vec![ParamInfo::new(table.names.intern("item"), t_ty)]),
    );
    table.symbols.add_member(iface, put);

    let bag = DiagnosticBag::new();
    check_variance(&table, &bag, &ctx, iface);
    let all = bag.drain_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].code, dc::INVALID_VARIANCE);
    assert!(all[0].message_text.contains("'T' must be contravariantly valid"));
    assert!(all[0].message_text.contains("'T' is covariant"));
}

#[test]
fn ref_parameter_is_an_invariant_position() {
    let table = table();
    let t_atom = table.names.intern("T");
    let t_symbol = table
        .symbols
        .register(Symbol::new(SymbolKind::TypeParameter, t_atom, TypeId::ERROR));
    let t_ty = table.types.type_param(t_symbol);

    let iface_atom = table.names.intern("ISink");
    let iface = table.symbols.register(
        Symbol::new(SymbolKind::Interface, iface_atom, TypeId::ERROR).with_type_params(vec![
            TypeParamInfo {
                symbol: t_symbol,
                name: t_atom,
                variance: Variance::Contravariant,
                constraints: ConstraintSet::default(),
            },
        ]),
    );
    // void Take(ref T value): even a contravariant T is invalid by ref.
    let take = table.symbols.register(
        Symbol::new(SymbolKind::Method, table.names.intern("Take"), TypeId::VOID)
            .with_container(iface)
            .with_params(vec![
                ParamInfo::new(table.names.intern("value"), t_ty)
                    .with_ref_kind(sable_common::common::RefKind::Ref),
            ]),
    );
    table.symbols.add_member(iface, take);

    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    check_variance(&table, &bag, &ctx, iface);
    assert_eq!(codes(&bag), vec![dc::INVALID_VARIANCE]);
}

#[test]
fn get_only_property_of_covariant_parameter_is_valid() {
    let table = table();
    let t_atom = table.names.intern("T");
    let t_symbol = table
        .symbols
        .register(Symbol::new(SymbolKind::TypeParameter, t_atom, TypeId::ERROR));
    let t_ty = table.types.type_param(t_symbol);

    let iface_atom = table.names.intern("IReadable");
    let iface = table.symbols.register(
        Symbol::new(SymbolKind::Interface, iface_atom, TypeId::ERROR).with_type_params(vec![
            TypeParamInfo {
                symbol: t_symbol,
                name: t_atom,
                variance: Variance::Covariant,
                constraints: ConstraintSet::default(),
            },
        ]),
    );
    let value = table.symbols.register(
        Symbol::new(SymbolKind::Property, table.names.intern("Value"), t_ty)
            .with_container(iface)
            .with_modifiers(Modifiers::GET_ONLY),
    );
    table.symbols.add_member(iface, value);

    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    check_variance(&table, &bag, &ctx, iface);
    assert!(bag.is_empty());

    // A read-write property of T is invariant usage and fails.
    let slot = table.symbols.register(
        Symbol::new(SymbolKind::Property, table.names.intern("Slot"), t_ty)
            .with_container(iface),
    );
    table.symbols.add_member(iface, slot);
    let bag = DiagnosticBag::new();
    check_variance(&table, &bag, &ctx, iface);
    assert_eq!(codes(&bag), vec![dc::INVALID_VARIANCE]);
}
