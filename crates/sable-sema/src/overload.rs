//! Overload resolution.
//!
//! Applicability first, betterness second. Each candidate is tested in its
//! normal form, then in its expanded form when it has a trailing `params`
//! array and the normal form does not fit. Applicable candidates then
//! compete pairwise on the conversion ranks of their arguments; a unique
//! winner must beat every other applicable candidate.

use crate::convert::{Conversion, Conversions};
use sable_common::common::RefKind;
use sable_common::interner::Atom;
use sable_common::span::Span;
use sable_symbols::{ParamInfo, SymbolId, SymbolTable, TypeData, TypeId};
use smallvec::SmallVec;

/// What overload resolution needs to know about one argument.
#[derive(Clone, Debug)]
pub struct ArgumentInfo {
    /// `Some` for named arguments.
    pub name: Option<Atom>,
    pub ref_kind: RefKind,
    pub ty: TypeId,
    /// The argument is the `null` literal; it converts to any reference or
    /// nullable parameter.
    pub is_null_literal: bool,
    /// The argument is an assignable variable, required for `ref`/`out`.
    pub is_variable: bool,
    pub span: Span,
}

impl ArgumentInfo {
    pub fn positional(ty: TypeId, span: Span) -> Self {
        Self {
            name: None,
            ref_kind: RefKind::None,
            ty,
            is_null_literal: false,
            is_variable: false,
            span,
        }
    }
}

/// Why one candidate was rejected. Reported verbatim when every candidate
/// fails, so the user sees the nearest miss per overload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InapplicableReason {
    TooManyArguments,
    /// A required parameter got no argument.
    MissingParameter { param: Atom },
    /// A named argument matches no parameter.
    NoParameterNamed { name: Atom },
    /// A named argument targets a parameter a positional argument filled.
    DuplicateParameter { name: Atom },
    /// An out-of-position named argument is followed by a positional one.
    NamedOutOfPosition { name: Atom },
    /// Argument `index` (zero-based) has no implicit conversion.
    ArgumentConversion { index: usize, from: TypeId, to: TypeId },
    /// Argument `index` has the wrong ref/out disposition.
    RefKindMismatch {
        index: usize,
        expected: RefKind,
        actual: RefKind,
    },
}

/// An applicable candidate with its per-argument conversions.
#[derive(Clone, Debug)]
pub struct ApplicableCandidate {
    pub symbol: SymbolId,
    /// Whether the candidate applies only in its expanded `params` form.
    pub expanded: bool,
    /// For each argument, the parameter index it maps to.
    pub arg_to_param: Vec<usize>,
    /// For each argument, the effective parameter type it converts to.
    pub param_types: Vec<TypeId>,
    /// For each argument, the classified conversion.
    pub conversions: Vec<Conversion>,
}

#[derive(Clone, Debug)]
pub enum ResolutionResult {
    UniqueBest(ApplicableCandidate),
    /// Two candidates neither of which beats the other.
    Ambiguous(SymbolId, SymbolId),
    /// No candidate was applicable; one reason per candidate, in candidate
    /// order.
    NoneApplicable(Vec<(SymbolId, InapplicableReason)>),
}

/// Effective parameter list of a candidate, with the receiver's generic
/// substitution applied.
fn effective_params(
    table: &SymbolTable,
    candidate: SymbolId,
    receiver: Option<TypeId>,
) -> Vec<ParamInfo> {
    let Some(symbol) = table.get(candidate) else {
        return Vec::new();
    };
    let Some(receiver) = receiver else {
        return symbol.params;
    };
    let map = table.substitution_for(receiver);
    if map.is_empty() {
        return symbol.params;
    }
    symbol
        .params
        .into_iter()
        .map(|mut p| {
            p.ty = table.types.substitute(p.ty, &map);
            p
        })
        .collect()
}

fn element_type(table: &SymbolTable, array: TypeId) -> Option<TypeId> {
    match table.types.lookup(array)? {
        TypeData::Array { element, rank: 1 } => Some(element),
        _ => None,
    }
}

/// Map arguments onto parameters by position and name. Returns one parameter
/// index per argument, or the reason the mapping fails.
fn map_arguments(
    params: &[ParamInfo],
    args: &[ArgumentInfo],
    expanded: bool,
) -> Result<Vec<usize>, InapplicableReason> {
    let positional_limit = if expanded {
        params.len().saturating_sub(1)
    } else {
        params.len()
    };
    let mut mapping = Vec::with_capacity(args.len());
    let mut filled: SmallVec<[bool; 8]> = SmallVec::from_elem(false, params.len());
    let mut seen_out_of_position: Option<Atom> = None;

    for (index, arg) in args.iter().enumerate() {
        match arg.name {
            None => {
                if let Some(name) = seen_out_of_position {
                    return Err(InapplicableReason::NamedOutOfPosition { name });
                }
                let param = if expanded && index >= positional_limit {
                    // Everything past the fixed parameters feeds the params
                    // array.
                    params.len() - 1
                } else if index < positional_limit {
                    index
                } else {
                    return Err(InapplicableReason::TooManyArguments);
                };
                if param + 1 < params.len() || !expanded {
                    filled[param] = true;
                }
                mapping.push(param);
            }
            Some(name) => {
                let Some(param) = params.iter().position(|p| p.name == name) else {
                    return Err(InapplicableReason::NoParameterNamed { name });
                };
                if filled[param] {
                    return Err(InapplicableReason::DuplicateParameter { name });
                }
                filled[param] = true;
                if param != index {
                    seen_out_of_position = Some(name);
                }
                mapping.push(param);
            }
        }
    }

    for (param, info) in params.iter().enumerate() {
        if filled[param] || info.is_optional || (info.is_params && expanded) {
            continue;
        }
        // In normal form an unfilled params slot also lands here, pushing
        // the caller to the expanded form.
        return Err(InapplicableReason::MissingParameter { param: info.name });
    }
    Ok(mapping)
}

/// Test one candidate in one form.
fn check_candidate(
    conversions: &Conversions<'_>,
    params: &[ParamInfo],
    args: &[ArgumentInfo],
    candidate: SymbolId,
    expanded: bool,
    element: Option<TypeId>,
) -> Result<ApplicableCandidate, InapplicableReason> {
    let mapping = map_arguments(params, args, expanded)?;
    let mut param_types = Vec::with_capacity(args.len());
    let mut classified = Vec::with_capacity(args.len());

    for (index, (arg, &param)) in args.iter().zip(&mapping).enumerate() {
        let info = &params[param];
        let target = if expanded && info.is_params && arg.name.is_none() {
            element.ok_or(InapplicableReason::ArgumentConversion {
                index,
                from: arg.ty,
                to: info.ty,
            })?
        } else {
            info.ty
        };

        if arg.ref_kind != info.ref_kind {
            return Err(InapplicableReason::RefKindMismatch {
                index,
                expected: info.ref_kind,
                actual: arg.ref_kind,
            });
        }
        let conversion = conversions.classify(arg.ty, target);
        let ok = if info.ref_kind.is_by_ref() {
            // ref/out require the exact type.
            conversion.kind == crate::convert::ConversionKind::Identity
        } else {
            conversion.is_implicit()
        };
        if !ok {
            return Err(InapplicableReason::ArgumentConversion {
                index,
                from: arg.ty,
                to: target,
            });
        }
        param_types.push(target);
        classified.push(conversion);
    }

    Ok(ApplicableCandidate {
        symbol: candidate,
        expanded,
        arg_to_param: mapping,
        param_types,
        conversions: classified,
    })
}

/// Is candidate `a` better than candidate `b` for these arguments?
///
/// Better means no argument conversion is worse and at least one is strictly
/// better; a normal-form candidate beats an expanded-form one on a tie, and
/// a remaining tie goes to the more derived declaring type.
fn is_better(
    table: &SymbolTable,
    a: &ApplicableCandidate,
    b: &ApplicableCandidate,
) -> bool {
    let mut any_better = false;
    let mut any_worse = false;
    for (ca, cb) in a.conversions.iter().zip(&b.conversions) {
        let (ra, rb) = (ca.kind.rank(), cb.kind.rank());
        if ra < rb {
            any_better = true;
        } else if ra > rb {
            any_worse = true;
        }
    }
    if any_worse {
        return false;
    }
    if any_better {
        return true;
    }
    if a.expanded != b.expanded {
        return !a.expanded;
    }
    declaring_type_more_derived(table, a.symbol, b.symbol)
}

/// True when `a`'s declaring type derives from `b`'s. Breaks ties between an
/// override-style redeclaration and the base declaration it shadows.
fn declaring_type_more_derived(table: &SymbolTable, a: SymbolId, b: SymbolId) -> bool {
    let container = |s: SymbolId| table.get(s).and_then(|sym| sym.container);
    let (Some(ca), Some(cb)) = (container(a), container(b)) else {
        return false;
    };
    if ca == cb {
        return false;
    }
    let mut current = table.get(ca).and_then(|s| s.base);
    while let Some(base) = current {
        match table.symbol_of_type(base) {
            Some(s) if s == cb => return true,
            Some(s) => current = table.get(s).and_then(|sym| sym.base),
            None => return false,
        }
    }
    false
}

/// Resolve a call against a candidate set.
///
/// `receiver` carries the receiver's type so parameter types of members of
/// generic instantiations are substituted before classification.
pub fn resolve(
    table: &SymbolTable,
    conversions: &Conversions<'_>,
    candidates: &[SymbolId],
    receiver: Option<TypeId>,
    args: &[ArgumentInfo],
) -> ResolutionResult {
    let mut applicable: Vec<ApplicableCandidate> = Vec::new();
    let mut rejections: Vec<(SymbolId, InapplicableReason)> = Vec::new();

    for &candidate in candidates {
        let params = effective_params(table, candidate, receiver);
        match check_candidate(conversions, &params, args, candidate, false, None) {
            Ok(found) => {
                applicable.push(found);
                continue;
            }
            Err(normal_reason) => {
                // The expanded form is a fallback, never a preference.
                let expandable = params.last().is_some_and(|p| p.is_params);
                if expandable {
                    let element =
                        params.last().and_then(|p| element_type(table, p.ty));
                    match check_candidate(conversions, &params, args, candidate, true, element) {
                        Ok(found) => {
                            applicable.push(found);
                            continue;
                        }
                        Err(_) => rejections.push((candidate, normal_reason)),
                    }
                } else {
                    rejections.push((candidate, normal_reason));
                }
            }
        }
    }

    if applicable.is_empty() {
        return ResolutionResult::NoneApplicable(rejections);
    }
    if applicable.len() == 1 {
        return ResolutionResult::UniqueBest(applicable.swap_remove(0));
    }

    // The winner must beat every other applicable candidate.
    let mut best: Option<usize> = None;
    for i in 0..applicable.len() {
        let beats_all = (0..applicable.len())
            .filter(|&j| j != i)
            .all(|j| is_better(table, &applicable[i], &applicable[j]));
        if beats_all {
            best = Some(i);
            break;
        }
    }
    match best {
        Some(i) => ResolutionResult::UniqueBest(applicable.swap_remove(i)),
        None => {
            // Report the first two mutually unordered candidates.
            let first = applicable[0].symbol;
            let second = applicable
                .iter()
                .skip(1)
                .find(|c| !is_better(table, &applicable[0], c))
                .map_or(applicable[1].symbol, |c| c.symbol);
            ResolutionResult::Ambiguous(first, second)
        }
    }
}

/// Method-group to delegate compatibility: exact ref kinds, contravariant
/// parameter types, covariant return type.
pub fn delegate_compatible(
    table: &SymbolTable,
    conversions: &Conversions<'_>,
    method: SymbolId,
    delegate: SymbolId,
) -> bool {
    let (Some(method), Some(delegate)) = (table.get(method), table.get(delegate)) else {
        return false;
    };
    if method.params.len() != delegate.params.len() {
        return false;
    }
    for (m, d) in method.params.iter().zip(&delegate.params) {
        if m.ref_kind != d.ref_kind {
            return false;
        }
        let widened = d.ty == m.ty || conversions.implicit_reference(d.ty, m.ty);
        if !widened {
            return false;
        }
    }
    if delegate.ty == TypeId::VOID {
        return method.ty == TypeId::VOID;
    }
    method.ty == delegate.ty || conversions.implicit_reference(method.ty, delegate.ty)
}

#[cfg(test)]
#[path = "../tests/overload_tests.rs"]
mod tests;
