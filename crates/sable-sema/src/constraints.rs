//! Generic constraint and variance checking.
//!
//! Three independent checks: type arguments against their parameters'
//! declared constraints, cycles through type-parameter bounds, and
//! declaration-site variance validity of interface and delegate signatures.

use crate::convert::Conversions;
use crate::diag::{DiagnosticBag, SuppressionContext};
use rustc_hash::FxHashSet;
use sable_common::common::RefKind;
use sable_common::diagnostics::diagnostic_codes as dc;
use sable_common::span::Span;
use sable_symbols::{
    Modifiers, SymbolId, SymbolKind, SymbolTable, TypeData, TypeId, Variance,
};

/// Check one instantiation's type arguments against the generic declaration's
/// constraints. Error-typed arguments are skipped; they already carry a
/// diagnostic.
pub fn check_type_arguments(
    table: &SymbolTable,
    conversions: &Conversions<'_>,
    bag: &DiagnosticBag,
    ctx: &SuppressionContext,
    generic: SymbolId,
    args: &[TypeId],
    span: Span,
) {
    let Some(decl) = table.get(generic) else {
        return;
    };
    let generic_name = table.name_of(generic);
    let substitution = decl
        .type_params
        .iter()
        .zip(args)
        .map(|(p, a)| (p.symbol, *a))
        .collect();

    for (param, &arg) in decl.type_params.iter().zip(args) {
        if arg.is_error() {
            continue;
        }
        let param_name = table.names.resolve(param.name);
        let arg_display = table.display(arg);
        let constraints = &param.constraints;

        if constraints.reference_type && !table.is_reference_type(arg) {
            bag.report(
                ctx,
                dc::CONSTRAINT_NEEDS_REFERENCE_TYPE,
                span,
                &[&arg_display, &param_name, &generic_name],
            );
            continue;
        }
        if constraints.value_type
            && (!table.is_value_type(arg) || table.types.is_nullable(arg))
        {
            bag.report(
                ctx,
                dc::CONSTRAINT_NEEDS_VALUE_TYPE,
                span,
                &[&arg_display, &param_name, &generic_name],
            );
            continue;
        }
        if constraints.needs_new && !satisfies_new(table, arg) {
            bag.report(
                ctx,
                dc::CONSTRAINT_NEEDS_NEW,
                span,
                &[&arg_display, &param_name, &generic_name],
            );
        }
        for &bound in &constraints.bounds {
            let bound = table.types.substitute(bound, &substitution);
            if !satisfies_bound(table, conversions, arg, bound) {
                bag.report(
                    ctx,
                    dc::CONSTRAINT_NOT_SATISFIED,
                    span,
                    &[&arg_display, &param_name, &generic_name, &table.display(bound)],
                );
            }
        }
    }
}

/// `new()` requires a non-abstract type with an accessible parameterless
/// constructor. Value types always qualify.
fn satisfies_new(table: &SymbolTable, arg: TypeId) -> bool {
    if table.is_value_type(arg) && !table.types.is_nullable(arg) {
        return true;
    }
    let Some(symbol) = table.symbol_of_type(arg) else {
        return false;
    };
    let Some(decl) = table.get(symbol) else {
        return false;
    };
    if decl.kind == SymbolKind::TypeParameter {
        // A type parameter satisfies new() only through its own constraints.
        return table
            .get(decl.container.unwrap_or(SymbolId::INVALID))
            .and_then(|owner| {
                owner
                    .type_params
                    .iter()
                    .find(|p| p.symbol == symbol)
                    .map(|p| p.constraints.needs_new || p.constraints.value_type)
            })
            .unwrap_or(false);
    }
    if decl.modifiers.contains(Modifiers::ABSTRACT) || decl.kind != SymbolKind::Class {
        return false;
    }
    decl.members.iter().any(|&m| {
        table.get(m).is_some_and(|member| {
            member.kind == SymbolKind::Constructor
                && member.params.is_empty()
                && member.accessibility == sable_symbols::Accessibility::Public
        })
    })
}

/// A bound is satisfied by identity, implicit reference conversion, or
/// boxing. A nullable argument never satisfies an interface bound even when
/// its underlying type implements the interface.
fn satisfies_bound(
    table: &SymbolTable,
    conversions: &Conversions<'_>,
    arg: TypeId,
    bound: TypeId,
) -> bool {
    if arg == bound {
        return true;
    }
    if table.types.is_nullable(arg) && table.is_interface(bound) {
        return false;
    }
    if conversions.implicit_reference(arg, bound) {
        return true;
    }
    // Value-type arguments satisfy class/interface bounds through boxing.
    if table.is_value_type(arg) {
        let underlying = table.types.strip_nullable(arg);
        if table.is_interface(bound) && table.implements(underlying, bound) {
            return true;
        }
        return bound == TypeId::OBJECT;
    }
    // Type-parameter arguments satisfy a bound their own bounds imply.
    if let Some(TypeData::TypeParam { symbol }) = table.types.lookup(arg) {
        if let Some(bounds) = own_bounds(table, symbol) {
            return bounds
                .iter()
                .any(|&b| b == bound || satisfies_bound(table, conversions, b, bound));
        }
    }
    false
}

fn own_bounds(table: &SymbolTable, param: SymbolId) -> Option<Vec<TypeId>> {
    let decl = table.get(param)?;
    let owner = table.get(decl.container?)?;
    owner
        .type_params
        .iter()
        .find(|p| p.symbol == param)
        .map(|p| p.constraints.bounds.clone())
}

/// Detect cycles through type-parameter bounds (`where T : U where U : T`).
pub fn check_constraint_cycles(
    table: &SymbolTable,
    bag: &DiagnosticBag,
    ctx: &SuppressionContext,
    generic: SymbolId,
    span: Span,
) {
    let Some(decl) = table.get(generic) else {
        return;
    };
    // Edges run from a parameter to every sibling parameter in its bounds.
    let param_of = |ty: TypeId| match table.types.lookup(ty) {
        Some(TypeData::TypeParam { symbol }) => decl
            .type_params
            .iter()
            .position(|p| p.symbol == symbol),
        _ => None,
    };

    for (start, start_info) in decl.type_params.iter().enumerate() {
        let mut visited = FxHashSet::default();
        let mut stack: Vec<usize> = start_info
            .constraints
            .bounds
            .iter()
            .filter_map(|&b| param_of(b))
            .collect();
        while let Some(current) = stack.pop() {
            if current == start {
                let first = table.names.resolve(start_info.name);
                let second = table.names.resolve(decl.type_params[current].name);
                bag.report(ctx, dc::CIRCULAR_CONSTRAINT, span, &[&first, &second]);
                return;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                decl.type_params[current]
                    .constraints
                    .bounds
                    .iter()
                    .filter_map(|&b| param_of(b)),
            );
        }
    }
}

/// The direction a type is used in within a signature.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum UsePosition {
    Output,
    Input,
    Invariant,
}

impl UsePosition {
    fn flipped(self) -> Self {
        match self {
            UsePosition::Output => UsePosition::Input,
            UsePosition::Input => UsePosition::Output,
            UsePosition::Invariant => UsePosition::Invariant,
        }
    }

    fn required(self) -> &'static str {
        match self {
            UsePosition::Output => "covariantly",
            UsePosition::Input => "contravariantly",
            UsePosition::Invariant => "invariantly",
        }
    }
}

fn actual(variance: Variance) -> &'static str {
    match variance {
        Variance::Invariant => "invariant",
        Variance::Covariant => "covariant",
        Variance::Contravariant => "contravariant",
    }
}

fn variance_valid(variance: Variance, position: UsePosition) -> bool {
    match position {
        UsePosition::Output => variance != Variance::Contravariant,
        UsePosition::Input => variance != Variance::Covariant,
        UsePosition::Invariant => variance == Variance::Invariant,
    }
}

/// Declaration-site variance check for one interface or delegate symbol.
///
/// Walks every member signature; a covariant parameter may only appear in
/// output positions, a contravariant one only in input positions, and
/// `ref`/`out` parameter types are invariant positions.
pub fn check_variance(
    table: &SymbolTable,
    bag: &DiagnosticBag,
    ctx: &SuppressionContext,
    type_symbol: SymbolId,
) {
    let Some(decl) = table.get(type_symbol) else {
        return;
    };
    if decl.type_params.iter().all(|p| p.variance == Variance::Invariant) {
        return;
    }

    let check = |ty: TypeId, position: UsePosition, member: SymbolId, span: Span| {
        walk_variance(table, bag, ctx, &decl.type_params, ty, position, member, span);
    };

    if decl.kind == SymbolKind::Delegate {
        let span = decl.span.unwrap_or_default();
        check(decl.ty, UsePosition::Output, type_symbol, span);
        for param in &decl.params {
            let position = if param.ref_kind.is_by_ref() {
                UsePosition::Invariant
            } else {
                UsePosition::Input
            };
            check(param.ty, position, type_symbol, span);
        }
        return;
    }

    for &member in &decl.members {
        let Some(sym) = table.get(member) else {
            continue;
        };
        let span = sym.span.unwrap_or_default();
        match sym.kind {
            SymbolKind::Method => {
                check(sym.ty, UsePosition::Output, member, span);
                for param in &sym.params {
                    let position = if param.ref_kind != RefKind::None {
                        UsePosition::Invariant
                    } else {
                        UsePosition::Input
                    };
                    check(param.ty, position, member, span);
                }
            }
            SymbolKind::Property | SymbolKind::Indexer => {
                let position = if sym.modifiers.contains(Modifiers::GET_ONLY) {
                    UsePosition::Output
                } else if sym.modifiers.contains(Modifiers::SET_ONLY) {
                    UsePosition::Input
                } else {
                    UsePosition::Invariant
                };
                check(sym.ty, position, member, span);
                for param in &sym.params {
                    check(param.ty, UsePosition::Input, member, span);
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_variance(
    table: &SymbolTable,
    bag: &DiagnosticBag,
    ctx: &SuppressionContext,
    params: &[sable_symbols::TypeParamInfo],
    ty: TypeId,
    position: UsePosition,
    member: SymbolId,
    span: Span,
) {
    match table.types.lookup(ty) {
        Some(TypeData::TypeParam { symbol }) => {
            let Some(param) = params.iter().find(|p| p.symbol == symbol) else {
                return;
            };
            if !variance_valid(param.variance, position) {
                let name = table.names.resolve(param.name);
                bag.report(
                    ctx,
                    dc::INVALID_VARIANCE,
                    span,
                    &[
                        &name,
                        position.required(),
                        &table.signature_display(member),
                        actual(param.variance),
                    ],
                );
            }
        }
        Some(TypeData::Named { symbol, args }) => {
            let Some(generic) = table.get(symbol) else {
                return;
            };
            for (declared, arg) in generic.type_params.iter().zip(args) {
                let inner = match declared.variance {
                    Variance::Covariant => position,
                    Variance::Contravariant => position.flipped(),
                    Variance::Invariant => UsePosition::Invariant,
                };
                walk_variance(table, bag, ctx, params, arg, inner, member, span);
            }
        }
        Some(TypeData::Array { element, .. }) => {
            walk_variance(table, bag, ctx, params, element, position, member, span);
        }
        Some(TypeData::Nullable { underlying }) => {
            walk_variance(
                table,
                bag,
                ctx,
                params,
                underlying,
                UsePosition::Invariant,
                member,
                span,
            );
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "../tests/constraints_tests.rs"]
mod tests;
