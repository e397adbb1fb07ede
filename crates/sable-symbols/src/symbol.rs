//! Declared-entity descriptors and their write-once arena.
//!
//! Symbols form a DAG rooted at namespaces; a container exclusively owns its
//! member symbols and both live for the whole compilation. The arena hands
//! out stable integer ids (`SymbolId`) so types and bound nodes can refer to
//! symbols without lifetimes.

use crate::types::TypeId;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use sable_common::common::RefKind;
use sable_common::interner::Atom;
use sable_common::span::Span;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

/// Arena id of a declared symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Sentinel for "no symbol" in bound nodes; never present in the arena.
    pub const INVALID: SymbolId = SymbolId(u32::MAX);

    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Kind of declared entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Method,
    Constructor,
    Property,
    Indexer,
    Field,
    Event,
    Parameter,
    Local,
    TypeParameter,
}

impl SymbolKind {
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Delegate
        )
    }

    pub const fn is_callable(self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Constructor | SymbolKind::Indexer)
    }
}

/// Declared accessibility.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Private,
    PrivateProtected,
    Internal,
    Protected,
    ProtectedInternal,
    Public,
}

bitflags::bitflags! {
    /// Declaration modifiers.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const STATIC            = 1 << 0;
        const READONLY          = 1 << 1;
        const VIRTUAL           = 1 << 2;
        const OVERRIDE          = 1 << 3;
        const ABSTRACT          = 1 << 4;
        const SEALED            = 1 << 5;
        const CONST             = 1 << 6;
        /// `implicit operator` declaration
        const IMPLICIT_OPERATOR = 1 << 7;
        /// `explicit operator` declaration
        const EXPLICIT_OPERATOR = 1 << 8;
        /// user-defined binary/unary operator declaration
        const OPERATOR          = 1 << 9;
        /// property/indexer with no setter
        const GET_ONLY          = 1 << 10;
        /// property/indexer with no getter
        const SET_ONLY          = 1 << 11;
    }
}

/// Variance tag on a type parameter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variance {
    #[default]
    Invariant,
    /// `out T`
    Covariant,
    /// `in T`
    Contravariant,
}

impl Variance {
    /// What the 1961-style diagnostic calls this direction.
    pub const fn describe(self) -> &'static str {
        match self {
            Variance::Invariant => "invariantly",
            Variance::Covariant => "covariantly",
            Variance::Contravariant => "contravariantly",
        }
    }
}

/// Constraint set declared on a type parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    /// `where T : class`
    pub reference_type: bool,
    /// `where T : struct`
    pub value_type: bool,
    /// `where T : new()`
    pub needs_new: bool,
    /// Base class and/or interface bounds, in declaration order.
    pub bounds: Vec<TypeId>,
}

/// A type parameter as declared on a generic type or method.
#[derive(Clone, Debug)]
pub struct TypeParamInfo {
    pub symbol: SymbolId,
    pub name: Atom,
    pub variance: Variance,
    pub constraints: ConstraintSet,
}

/// A formal parameter of a method, constructor, indexer, or delegate.
#[derive(Clone, Debug)]
pub struct ParamInfo {
    pub name: Atom,
    pub ty: TypeId,
    pub ref_kind: RefKind,
    /// `params T[]` trailing parameter
    pub is_params: bool,
    /// Has a default value, so callers may omit it.
    pub is_optional: bool,
}

impl ParamInfo {
    pub fn new(name: Atom, ty: TypeId) -> Self {
        Self {
            name,
            ty,
            ref_kind: RefKind::None,
            is_params: false,
            is_optional: false,
        }
    }

    #[must_use]
    pub fn with_ref_kind(mut self, ref_kind: RefKind) -> Self {
        self.ref_kind = ref_kind;
        self
    }

    #[must_use]
    pub fn as_params_array(mut self) -> Self {
        self.is_params = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// Obsolete marking carried over from the declaration pass.
#[derive(Clone, Debug)]
pub struct ObsoleteInfo {
    pub message: Option<Atom>,
    /// Use is an error rather than a warning.
    pub is_error: bool,
}

/// An immutable declared-entity descriptor.
///
/// The `ty` field is the declared type: field/property/local/parameter type,
/// method return type, or the self type for type symbols.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: Atom,
    pub accessibility: Accessibility,
    pub container: Option<SymbolId>,
    pub modifiers: Modifiers,
    pub ty: TypeId,
    /// Parameters, for callable symbols and delegates.
    pub params: Vec<ParamInfo>,
    /// Type parameters, for generic types and methods.
    pub type_params: Vec<TypeParamInfo>,
    /// Base class, for class symbols.
    pub base: Option<TypeId>,
    /// Directly implemented/extended interfaces.
    pub interfaces: Vec<TypeId>,
    /// Member symbols, in declaration order.
    pub members: Vec<SymbolId>,
    /// True for symbols loaded from referenced metadata (another assembly).
    pub external: bool,
    pub obsolete: Option<ObsoleteInfo>,
    pub span: Option<Span>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: Atom, ty: TypeId) -> Self {
        Self {
            kind,
            name,
            accessibility: Accessibility::Public,
            container: None,
            modifiers: Modifiers::empty(),
            ty,
            params: Vec::new(),
            type_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            external: false,
            obsolete: None,
            span: None,
        }
    }

    #[must_use]
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    #[must_use]
    pub fn with_container(mut self, container: SymbolId) -> Self {
        self.container = Some(container);
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<ParamInfo>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: Vec<TypeParamInfo>) -> Self {
        self.type_params = type_params;
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn with_interfaces(mut self, interfaces: Vec<TypeId>) -> Self {
        self.interfaces = interfaces;
        self
    }

    #[must_use]
    pub fn with_obsolete(mut self, obsolete: ObsoleteInfo) -> Self {
        self.obsolete = Some(obsolete);
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_readonly(&self) -> bool {
        self.modifiers.contains(Modifiers::READONLY)
    }

    /// True for `implicit operator` and `explicit operator` declarations.
    pub fn is_conversion_operator(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::IMPLICIT_OPERATOR | Modifiers::EXPLICIT_OPERATOR)
    }
}

/// Thread-safe, write-once storage for symbols.
///
/// The declaration pass registers symbols; semantic analysis only reads. The
/// single permitted late mutation is `add_member`, used while the declaration
/// pass wires containers to members it registered afterwards.
pub struct SymbolArena {
    symbols: DashMap<SymbolId, Symbol, FxBuildHasher>,
    next_id: AtomicU32,
}

impl Default for SymbolArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolArena {
    pub fn new() -> Self {
        Self {
            symbols: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU32::new(0),
        }
    }

    fn allocate(&self) -> SymbolId {
        SymbolId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a new symbol and return its id.
    pub fn register(&self, symbol: Symbol) -> SymbolId {
        let id = self.allocate();
        trace!(symbol_id = id.0, kind = ?symbol.kind, "SymbolArena::register");
        self.symbols.insert(id, symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<Symbol> {
        self.symbols.get(&id).map(|r| r.clone())
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.symbols.contains_key(&id)
    }

    pub fn kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.symbols.get(&id).map(|r| r.kind)
    }

    pub fn name(&self, id: SymbolId) -> Option<Atom> {
        self.symbols.get(&id).map(|r| r.name)
    }

    /// Wire a member into its container. Declaration pass only.
    pub fn add_member(&self, container: SymbolId, member: SymbolId) {
        if let Some(mut entry) = self.symbols.get_mut(&container) {
            entry.members.push(member);
        }
    }

    pub fn members(&self, container: SymbolId) -> Vec<SymbolId> {
        self.symbols
            .get(&container)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/symbol_tests.rs"]
mod tests;
