//! Conversion classification.
//!
//! `Conversions::classify` is the single entry point deciding, for a
//! (source, target) pair, which conversion kind applies and whether it needs
//! an explicit cast. It is pure and deterministic: the whole lattice is one
//! priority-ordered match, so every rule is auditable in one place.
//!
//! Priority order: identity, implicit numeric widening, reference
//! conversions (with array covariance for reference elements only), boxing/
//! unboxing, nullable lifting composed recursively, then a single applicable
//! user-defined operator. Anything else is `None`.

use sable_common::interner::Atom;
use sable_symbols::{Modifiers, PrimitiveKind, SymbolId, SymbolTable, TypeData, TypeId};
use smallvec::SmallVec;

/// Closed classification of how a value of one type can be used where
/// another is expected. Ordered roughly from best to worst; only the
/// implicit kinds participate in betterness ranking.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Identity,
    ImplicitNumeric,
    ImplicitReference,
    Boxing,
    ImplicitUserDefined,
    ImplicitNullable,
    ExplicitNumeric,
    ExplicitReference,
    Unboxing,
    ExplicitUserDefined,
    ExplicitNullable,
    PointerConversion,
    None,
}

impl ConversionKind {
    pub const fn is_implicit(self) -> bool {
        matches!(
            self,
            ConversionKind::Identity
                | ConversionKind::ImplicitNumeric
                | ConversionKind::ImplicitReference
                | ConversionKind::Boxing
                | ConversionKind::ImplicitUserDefined
                | ConversionKind::ImplicitNullable
                | ConversionKind::PointerConversion
        )
    }

    pub const fn exists(self) -> bool {
        !matches!(self, ConversionKind::None)
    }

    /// Betterness rank; lower is better. Only meaningful for implicit kinds.
    pub const fn rank(self) -> u8 {
        match self {
            ConversionKind::Identity => 0,
            ConversionKind::ImplicitNumeric => 1,
            ConversionKind::ImplicitReference | ConversionKind::Boxing => 2,
            ConversionKind::ImplicitUserDefined => 3,
            ConversionKind::ImplicitNullable => 4,
            _ => u8::MAX,
        }
    }
}

/// The result of classifying one (source, target) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub kind: ConversionKind,
    /// The chosen operator for user-defined conversions.
    pub operator: Option<SymbolId>,
    /// Set when more than one user-defined operator was applicable; the
    /// conversion is then illegal with a dedicated ambiguity diagnostic.
    pub ambiguous_operators: Option<(SymbolId, SymbolId)>,
}

impl Conversion {
    pub const fn of(kind: ConversionKind) -> Self {
        Self {
            kind,
            operator: None,
            ambiguous_operators: None,
        }
    }

    pub const fn identity() -> Self {
        Self::of(ConversionKind::Identity)
    }

    pub const fn none() -> Self {
        Self::of(ConversionKind::None)
    }

    fn user_defined(kind: ConversionKind, operator: SymbolId) -> Self {
        Self {
            kind,
            operator: Some(operator),
            ambiguous_operators: None,
        }
    }

    fn ambiguous(first: SymbolId, second: SymbolId) -> Self {
        Self {
            kind: ConversionKind::None,
            operator: None,
            ambiguous_operators: Some((first, second)),
        }
    }

    pub const fn exists(&self) -> bool {
        self.kind.exists()
    }

    pub const fn is_implicit(&self) -> bool {
        self.kind.is_implicit()
    }

    /// Legal, but only with a cast.
    pub const fn needs_explicit(&self) -> bool {
        self.exists() && !self.is_implicit()
    }
}

/// Implicit numeric widening per the fixed pairwise table. Never the
/// narrowing direction.
fn implicit_numeric(source: PrimitiveKind, target: PrimitiveKind) -> bool {
    use PrimitiveKind::*;
    match source {
        SByte => matches!(target, Short | Int | Long | Float | Double | Decimal),
        Byte => matches!(
            target,
            Short | UShort | Int | UInt | Long | ULong | Float | Double | Decimal
        ),
        Short => matches!(target, Int | Long | Float | Double | Decimal),
        UShort => matches!(target, Int | UInt | Long | ULong | Float | Double | Decimal),
        Int => matches!(target, Long | Float | Double | Decimal),
        UInt => matches!(target, Long | ULong | Float | Double | Decimal),
        Long | ULong => matches!(target, Float | Double | Decimal),
        Char => matches!(
            target,
            UShort | Int | UInt | Long | ULong | Float | Double | Decimal
        ),
        Float => matches!(target, Double),
        _ => false,
    }
}

/// Conversion classifier over a read-only symbol table.
pub struct Conversions<'a> {
    table: &'a SymbolTable,
}

impl<'a> Conversions<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Classify the conversion from `source` to `target`.
    pub fn classify(&self, source: TypeId, target: TypeId) -> Conversion {
        // Error sentinels satisfy everything so one failure does not cascade.
        if source.is_error() || target.is_error() {
            return Conversion::identity();
        }
        if source == target {
            return Conversion::identity();
        }
        // `dynamic` is assignable in both directions without diagnostics.
        if source == TypeId::DYNAMIC || target == TypeId::DYNAMIC {
            return Conversion::of(ConversionKind::ImplicitReference);
        }
        if source == TypeId::NULL {
            return self.classify_null_literal(target);
        }

        let types = &self.table.types;
        if let (Some(s), Some(t)) = (types.primitive_kind(source), types.primitive_kind(target)) {
            if s.is_numeric() && t.is_numeric() {
                return if implicit_numeric(s, t) {
                    Conversion::of(ConversionKind::ImplicitNumeric)
                } else {
                    Conversion::of(ConversionKind::ExplicitNumeric)
                };
            }
        }

        if self.implicit_reference(source, target) {
            return Conversion::of(ConversionKind::ImplicitReference);
        }
        if self.explicit_reference(source, target) {
            return Conversion::of(ConversionKind::ExplicitReference);
        }

        if let Some(conversion) = self.classify_boxing(source, target) {
            return conversion;
        }
        if let Some(conversion) = self.classify_nullable(source, target) {
            return conversion;
        }
        if let Some(conversion) = self.classify_user_defined(source, target) {
            return conversion;
        }
        if let (Some(TypeData::Pointer { .. }), Some(TypeData::Pointer { .. })) =
            (types.lookup(source), types.lookup(target))
        {
            return Conversion::of(ConversionKind::PointerConversion);
        }
        Conversion::none()
    }

    /// `null` converts only to reference types, nullable value types, and
    /// pointer types. The binder distinguishes the "cannot convert null"
    /// diagnostic from a plain missing conversion by checking the source.
    fn classify_null_literal(&self, target: TypeId) -> Conversion {
        match self.table.types.lookup(target) {
            Some(TypeData::Nullable { .. }) => Conversion::of(ConversionKind::ImplicitNullable),
            Some(TypeData::Pointer { .. }) => Conversion::of(ConversionKind::PointerConversion),
            _ if self.table.is_reference_type(target) => {
                Conversion::of(ConversionKind::ImplicitReference)
            }
            _ => Conversion::none(),
        }
    }

    /// Implicit reference conversion along the base/interface lattice,
    /// including array covariance for reference element types only and
    /// declared variance on generic instantiations.
    pub fn implicit_reference(&self, source: TypeId, target: TypeId) -> bool {
        if !self.table.is_reference_type(source) {
            return false;
        }
        if target == TypeId::OBJECT {
            return true;
        }
        if self.table.is_base_of(target, source) {
            return true;
        }
        if self.table.is_interface(target) && self.table.implements(source, target) {
            return true;
        }
        let types = &self.table.types;
        match (types.lookup(source), types.lookup(target)) {
            (
                Some(TypeData::Array {
                    element: s_element,
                    rank: s_rank,
                }),
                Some(TypeData::Array {
                    element: t_element,
                    rank: t_rank,
                }),
            ) => {
                // Covariance applies to reference elements only; int[] is
                // not object[].
                s_rank == t_rank
                    && self.table.is_reference_type(s_element)
                    && self.table.is_reference_type(t_element)
                    && (s_element == t_element || self.implicit_reference(s_element, t_element))
            }
            (
                Some(TypeData::Named {
                    symbol: s_symbol,
                    args: s_args,
                }),
                Some(TypeData::Named {
                    symbol: t_symbol,
                    args: t_args,
                }),
            ) if s_symbol == t_symbol && s_args.len() == t_args.len() => {
                self.variance_convertible(s_symbol, &s_args, &t_args)
            }
            _ => false,
        }
    }

    /// Variance-aware comparison of two instantiations of the same generic
    /// type: covariant slots may widen, contravariant slots may narrow,
    /// invariant slots must match exactly.
    fn variance_convertible(&self, symbol: SymbolId, s_args: &[TypeId], t_args: &[TypeId]) -> bool {
        let Some(decl) = self.table.get(symbol) else {
            return false;
        };
        decl.type_params
            .iter()
            .zip(s_args.iter().zip(t_args))
            .all(|(param, (s, t))| {
                use sable_symbols::Variance;
                match param.variance {
                    Variance::Invariant => s == t,
                    Variance::Covariant => s == t || self.implicit_reference(*s, *t),
                    Variance::Contravariant => s == t || self.implicit_reference(*t, *s),
                }
            })
    }

    /// Explicit (downcast-style) reference conversion.
    fn explicit_reference(&self, source: TypeId, target: TypeId) -> bool {
        if !self.table.is_reference_type(source) || !self.table.is_reference_type(target) {
            return false;
        }
        // The reverse of any implicit reference conversion is explicit, and
        // any interface type can be cast to/from any non-sealed reference.
        self.implicit_reference(target, source)
            || self.table.is_interface(source)
            || self.table.is_interface(target)
    }

    fn classify_boxing(&self, source: TypeId, target: TypeId) -> Option<Conversion> {
        let source_value = self.table.is_value_type(source);
        let target_value = self.table.is_value_type(target);

        if source_value && self.table.is_reference_type(target) {
            let underlying = self.table.types.strip_nullable(source);
            let boxable = target == TypeId::OBJECT
                || (self.table.is_interface(target) && self.table.implements(underlying, target));
            if boxable {
                return Some(Conversion::of(ConversionKind::Boxing));
            }
        }
        if self.table.is_reference_type(source) && target_value {
            let underlying = self.table.types.strip_nullable(target);
            let unboxable = source == TypeId::OBJECT
                || (self.table.is_interface(source) && self.table.implements(underlying, source));
            if unboxable {
                return Some(Conversion::of(ConversionKind::Unboxing));
            }
        }
        None
    }

    /// Nullable wrapping/unwrapping, composed recursively with the
    /// underlying conversion and downgraded to explicit when the underlying
    /// conversion is.
    fn classify_nullable(&self, source: TypeId, target: TypeId) -> Option<Conversion> {
        let types = &self.table.types;
        let source_nullable = types.is_nullable(source);
        let target_nullable = types.is_nullable(target);
        if !source_nullable && !target_nullable {
            return None;
        }

        // T? -> T is always explicit unwrapping.
        if source_nullable && !target_nullable {
            let underlying = self.classify(types.strip_nullable(source), target);
            return underlying
                .exists()
                .then_some(Conversion::of(ConversionKind::ExplicitNullable));
        }

        // S -> T? and S? -> T? lift the underlying conversion.
        let underlying = self.classify(types.strip_nullable(source), types.strip_nullable(target));
        if !underlying.exists() {
            return None;
        }
        let kind = if underlying.is_implicit() {
            ConversionKind::ImplicitNullable
        } else {
            ConversionKind::ExplicitNullable
        };
        Some(Conversion::of(kind))
    }

    /// Exactly one applicable user-defined conversion operator on either
    /// type, chosen by an outer built-in pre/post conversion. Two applicable
    /// operators are an ambiguity error, never a silent pick.
    fn classify_user_defined(&self, source: TypeId, target: TypeId) -> Option<Conversion> {
        let mut implicit: SmallVec<[SymbolId; 2]> = SmallVec::new();
        let mut explicit: SmallVec<[SymbolId; 2]> = SmallVec::new();

        for operator in self
            .conversion_operators(source)
            .into_iter()
            .chain(self.conversion_operators(target))
        {
            let Some(decl) = self.table.get(operator) else {
                continue;
            };
            let Some(param) = decl.params.first() else {
                continue;
            };
            // Outer conversions around the operator must be built-in and
            // implicit; user-defined conversions never chain.
            if !self.builtin_implicit(source, param.ty) || !self.builtin_implicit(decl.ty, target) {
                continue;
            }
            if decl.modifiers.contains(Modifiers::IMPLICIT_OPERATOR) {
                implicit.push(operator);
            } else {
                explicit.push(operator);
            }
        }

        match (implicit.as_slice(), explicit.as_slice()) {
            ([only], _) => Some(Conversion::user_defined(
                ConversionKind::ImplicitUserDefined,
                *only,
            )),
            ([first, second, ..], _) => Some(Conversion::ambiguous(*first, *second)),
            ([], [only]) => Some(Conversion::user_defined(
                ConversionKind::ExplicitUserDefined,
                *only,
            )),
            ([], [first, second, ..]) => Some(Conversion::ambiguous(*first, *second)),
            ([], []) => None,
        }
    }

    fn builtin_implicit(&self, source: TypeId, target: TypeId) -> bool {
        if source == target {
            return true;
        }
        let types = &self.table.types;
        if let (Some(s), Some(t)) = (types.primitive_kind(source), types.primitive_kind(target)) {
            if s.is_numeric() && t.is_numeric() {
                return implicit_numeric(s, t);
            }
        }
        self.implicit_reference(source, target)
    }

    fn conversion_operators(&self, ty: TypeId) -> Vec<SymbolId> {
        let underlying = self.table.types.strip_nullable(ty);
        let Some(symbol) = self.table.symbol_of_type(underlying) else {
            return Vec::new();
        };
        self.table
            .symbols
            .members(symbol)
            .into_iter()
            .filter(|m| {
                self.table
                    .get(*m)
                    .is_some_and(|s| s.is_conversion_operator())
            })
            .collect()
    }

    /// Members named `name` usable as user-defined operator candidates on
    /// either operand's type.
    pub fn operator_candidates(&self, name: Atom, operands: &[TypeId]) -> Vec<SymbolId> {
        let mut result = Vec::new();
        for ty in operands {
            let underlying = self.table.types.strip_nullable(*ty);
            if let Some(symbol) = self.table.symbol_of_type(underlying) {
                for member in self.table.members_named(symbol, name) {
                    let is_operator = self
                        .table
                        .get(member)
                        .is_some_and(|s| s.modifiers.contains(Modifiers::OPERATOR));
                    if is_operator && !result.contains(&member) {
                        result.push(member);
                    }
                }
            }
        }
        result
    }

    /// Advisory verdict for `operand == null` / `operand != null`: `Some`
    /// when the comparison is statically decided because the operand is a
    /// non-nullable value type. Nullable and reference operands compare to
    /// null legitimately and get no verdict.
    pub fn null_comparison_verdict(&self, operand: TypeId, is_equality: bool) -> Option<bool> {
        if operand == TypeId::NULL || operand.is_error() {
            return None;
        }
        if self.table.types.is_nullable(operand) || !self.table.is_value_type(operand) {
            return None;
        }
        // A non-nullable value is never null: `==` is always false, `!=`
        // always true.
        Some(!is_equality)
    }
}

#[cfg(test)]
#[path = "../tests/convert_tests.rs"]
mod tests;
