//! Read-only symbol and type queries for the binder.
//!
//! `SymbolTable` is the query interface of the semantic core: member lookup
//! along base chains, accessibility checks, base/interface walks with generic
//! substitution, and the type/signature display used in diagnostics. It
//! never resolves metadata itself; everything it serves was seeded by the
//! external declaration pass.

use crate::symbol::{Accessibility, Symbol, SymbolArena, SymbolId, SymbolKind};
use crate::types::{PrimitiveKind, TypeData, TypeId, TypeInterner};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use sable_common::common::RefKind;
use sable_common::interner::{Atom, Interner};
use std::sync::Arc;

pub struct SymbolTable {
    pub symbols: SymbolArena,
    pub types: TypeInterner,
    pub names: Arc<Interner>,
}

impl SymbolTable {
    pub fn new(names: Arc<Interner>) -> Self {
        Self {
            symbols: SymbolArena::new(),
            types: TypeInterner::new(),
            names,
        }
    }

    // =========================================================================
    // Member lookup
    // =========================================================================

    /// The type symbol behind a named/delegate type, if any.
    pub fn symbol_of_type(&self, ty: TypeId) -> Option<SymbolId> {
        match self.types.lookup(ty)? {
            TypeData::Named { symbol, .. } | TypeData::Delegate { symbol } => Some(symbol),
            TypeData::TypeParam { symbol } => Some(symbol),
            _ => None,
        }
    }

    /// Direct members of `container` with the given name.
    pub fn members_named(&self, container: SymbolId, name: Atom) -> Vec<SymbolId> {
        self.symbols
            .members(container)
            .into_iter()
            .filter(|m| self.symbols.name(*m) == Some(name))
            .collect()
    }

    /// Members named `name` on `ty` or any of its base types, nearest first.
    ///
    /// Stops adding methods from further bases once a non-virtual slot of the
    /// same name was found closer (shadowing); overload candidates from the
    /// same type all survive.
    pub fn lookup_members(&self, ty: TypeId, name: Atom) -> Vec<SymbolId> {
        let mut result = Vec::new();
        let mut current = Some(ty);
        while let Some(t) = current {
            if let Some(symbol) = self.symbol_of_type(t) {
                let found = self.members_named(symbol, name);
                let stop = !found.is_empty();
                result.extend(found);
                if stop {
                    break;
                }
            }
            current = self.base_type(t);
        }
        result
    }

    /// The full member surface of `ty`: declared and inherited members,
    /// grouped by name in first-sighting order walking up the base chain.
    /// A name declared on a nearer type hides the same name further up,
    /// mirroring `lookup_members`; the grouping is deterministic so callers
    /// can render member lists in diagnostics.
    pub fn all_members(&self, ty: TypeId) -> Vec<SymbolId> {
        let mut by_name: IndexMap<Atom, Vec<SymbolId>> = IndexMap::new();
        let mut sealed: FxHashSet<Atom> = FxHashSet::default();
        let mut current = Some(ty);
        while let Some(t) = current {
            let mut seen_here: Vec<Atom> = Vec::new();
            if let Some(symbol) = self.symbol_of_type(t) {
                for member in self.symbols.members(symbol) {
                    let Some(name) = self.symbols.name(member) else {
                        continue;
                    };
                    if sealed.contains(&name) {
                        continue;
                    }
                    by_name.entry(name).or_default().push(member);
                    seen_here.push(name);
                }
            }
            sealed.extend(seen_here);
            current = self.base_type(t);
        }
        by_name.into_values().flatten().collect()
    }

    /// The substitution mapping a generic instantiation's type parameters to
    /// its arguments. Empty for non-generic types.
    pub fn substitution_for(&self, ty: TypeId) -> FxHashMap<SymbolId, TypeId> {
        let mut map = FxHashMap::default();
        if let Some(TypeData::Named { symbol, args }) = self.types.lookup(ty) {
            if let Some(decl) = self.symbols.get(symbol) {
                for (param, arg) in decl.type_params.iter().zip(args) {
                    map.insert(param.symbol, arg);
                }
            }
        }
        map
    }

    // =========================================================================
    // Type classification and hierarchy
    // =========================================================================

    pub fn is_value_type(&self, ty: TypeId) -> bool {
        match self.types.lookup(ty) {
            Some(TypeData::Primitive(kind)) => !matches!(
                kind,
                PrimitiveKind::Object | PrimitiveKind::String | PrimitiveKind::Void
            ),
            Some(TypeData::Named { symbol, .. }) => matches!(
                self.symbols.kind(symbol),
                Some(SymbolKind::Struct | SymbolKind::Enum)
            ),
            Some(TypeData::Nullable { .. }) => true,
            Some(TypeData::TypeParam { symbol }) => self
                .type_param_constraints(symbol)
                .is_some_and(|c| c.value_type),
            _ => false,
        }
    }

    pub fn is_reference_type(&self, ty: TypeId) -> bool {
        match self.types.lookup(ty) {
            Some(TypeData::Primitive(kind)) => {
                matches!(kind, PrimitiveKind::Object | PrimitiveKind::String)
            }
            Some(TypeData::Named { symbol, .. }) => matches!(
                self.symbols.kind(symbol),
                Some(SymbolKind::Class | SymbolKind::Interface | SymbolKind::Delegate)
            ),
            Some(TypeData::Delegate { .. } | TypeData::Array { .. } | TypeData::Dynamic) => true,
            Some(TypeData::TypeParam { symbol }) => self
                .type_param_constraints(symbol)
                .is_some_and(|c| c.reference_type),
            _ => false,
        }
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        self.symbol_of_type(ty)
            .and_then(|s| self.symbols.kind(s))
            == Some(SymbolKind::Interface)
    }

    fn type_param_constraints(&self, symbol: SymbolId) -> Option<crate::symbol::ConstraintSet> {
        let decl = self.symbols.get(symbol)?;
        let owner = self.symbols.get(decl.container?)?;
        owner
            .type_params
            .iter()
            .find(|p| p.symbol == symbol)
            .map(|p| p.constraints.clone())
    }

    /// Immediate base type, with generic substitution applied.
    pub fn base_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.types.lookup(ty)? {
            TypeData::Primitive(PrimitiveKind::String) => Some(TypeId::OBJECT),
            TypeData::Primitive(_) => None,
            TypeData::Array { .. } | TypeData::Delegate { .. } => Some(TypeId::OBJECT),
            TypeData::Named { symbol, .. } => {
                let decl = self.symbols.get(symbol)?;
                match decl.kind {
                    SymbolKind::Class => {
                        let map = self.substitution_for(ty);
                        decl.base
                            .map(|b| self.types.substitute(b, &map))
                            .or(Some(TypeId::OBJECT))
                    }
                    // Value types and interfaces have no reference base; boxing
                    // and interface inheritance are handled separately.
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Is `base` on `derived`'s base-class chain (reflexive is false)?
    pub fn is_base_of(&self, base: TypeId, derived: TypeId) -> bool {
        let mut current = self.base_type(derived);
        while let Some(t) = current {
            if t == base {
                return true;
            }
            current = self.base_type(t);
        }
        false
    }

    /// All interfaces `ty` implements or extends, transitively, with generic
    /// substitution applied.
    pub fn all_interfaces(&self, ty: TypeId) -> Vec<TypeId> {
        let mut result = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![ty];
        while let Some(t) = stack.pop() {
            if let Some(symbol) = self.symbol_of_type(t) {
                if let Some(decl) = self.symbols.get(symbol) {
                    let map = self.substitution_for(t);
                    for iface in &decl.interfaces {
                        let instantiated = self.types.substitute(*iface, &map);
                        if seen.insert(instantiated) {
                            result.push(instantiated);
                            stack.push(instantiated);
                        }
                    }
                }
            }
            if let Some(base) = self.base_type(t) {
                stack.push(base);
            }
        }
        result
    }

    pub fn implements(&self, ty: TypeId, iface: TypeId) -> bool {
        self.all_interfaces(ty).contains(&iface)
    }

    // =========================================================================
    // Accessibility
    // =========================================================================

    /// The nearest enclosing type symbol of `id`, or `id` itself if it is one.
    pub fn containing_type(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = Some(id);
        while let Some(s) = current {
            let symbol = self.symbols.get(s)?;
            if symbol.kind.is_type() {
                return Some(s);
            }
            current = symbol.container;
        }
        None
    }

    fn derives_from(&self, derived: SymbolId, base: SymbolId) -> bool {
        if derived == base {
            return true;
        }
        let Some(symbol) = self.symbols.get(derived) else {
            return false;
        };
        let mut current = symbol.base;
        while let Some(t) = current {
            match self.symbol_of_type(t) {
                Some(s) if s == base => return true,
                Some(s) => current = self.symbols.get(s).and_then(|sym| sym.base),
                None => return false,
            }
        }
        false
    }

    /// Whether `member` is accessible from code lexically inside `from_type`
    /// (`None` means top-level code outside any type).
    pub fn is_accessible(&self, member: SymbolId, from_type: Option<SymbolId>) -> bool {
        let Some(symbol) = self.symbols.get(member) else {
            return false;
        };
        let Some(container) = symbol.container.and_then(|c| self.containing_type(c).or(Some(c)))
        else {
            // Top-level symbols: only internal visibility applies.
            return match symbol.accessibility {
                Accessibility::Public => true,
                Accessibility::Internal => !symbol.external,
                _ => true,
            };
        };

        let inside_container = from_type.is_some_and(|f| {
            // Walk nesting: code in a nested type sees its outer type's privates.
            let mut current = Some(f);
            while let Some(s) = current {
                if s == container {
                    return true;
                }
                current = self.symbols.get(s).and_then(|sym| sym.container);
            }
            false
        });
        let in_derived = from_type.is_some_and(|f| self.derives_from(f, container));
        let same_assembly = !symbol.external;

        match symbol.accessibility {
            Accessibility::Public => true,
            Accessibility::Private => inside_container,
            Accessibility::Internal => same_assembly,
            Accessibility::Protected => inside_container || in_derived,
            Accessibility::ProtectedInternal => same_assembly || inside_container || in_derived,
            Accessibility::PrivateProtected => same_assembly && (inside_container || in_derived),
        }
    }

    // =========================================================================
    // Display
    // =========================================================================

    /// Render a type the way diagnostics print it (`int?`, `A<B>[]`, …).
    pub fn display(&self, ty: TypeId) -> String {
        match self.types.lookup(ty) {
            None | Some(TypeData::Error) => "?".to_string(),
            Some(TypeData::Dynamic) => "dynamic".to_string(),
            Some(TypeData::Null) => "<null>".to_string(),
            Some(TypeData::Primitive(kind)) => kind.keyword().to_string(),
            Some(TypeData::Named { symbol, args }) => {
                let name = self.symbol_name(symbol);
                if args.is_empty() {
                    name
                } else {
                    let rendered: Vec<String> = args.iter().map(|a| self.display(*a)).collect();
                    format!("{}<{}>", name, rendered.join(", "))
                }
            }
            Some(TypeData::Delegate { symbol }) => self.symbol_name(symbol),
            Some(TypeData::Array { element, rank }) => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                format!("{}[{}]", self.display(element), commas)
            }
            Some(TypeData::Pointer { pointee }) => format!("{}*", self.display(pointee)),
            Some(TypeData::Nullable { underlying }) => format!("{}?", self.display(underlying)),
            Some(TypeData::TypeParam { symbol }) => self.symbol_name(symbol),
        }
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        self.symbols
            .name(symbol)
            .map(|n| self.names.resolve(n))
            .unwrap_or_else(|| "?".to_string())
    }

    /// Render a callable's signature for diagnostics: `C.f(int, ref double)`.
    pub fn signature_display(&self, member: SymbolId) -> String {
        let Some(symbol) = self.symbols.get(member) else {
            return "?".to_string();
        };
        let qualifier = symbol
            .container
            .and_then(|c| self.containing_type(c).or(Some(c)))
            .map(|c| format!("{}.", self.symbol_name(c)))
            .unwrap_or_default();
        let name = self.names.resolve(symbol.name);
        if !symbol.kind.is_callable() && !matches!(symbol.kind, SymbolKind::Delegate) {
            return format!("{qualifier}{name}");
        }
        let params: Vec<String> = symbol
            .params
            .iter()
            .map(|p| {
                let keyword = match p.ref_kind {
                    RefKind::None if p.is_params => "params ".to_string(),
                    RefKind::None => String::new(),
                    other => format!("{} ", other.keyword()),
                };
                format!("{}{}", keyword, self.display(p.ty))
            })
            .collect();
        format!("{qualifier}{name}({})", params.join(", "))
    }

    /// Convenience used everywhere a diagnostic needs a symbol's bare name.
    pub fn name_of(&self, symbol: SymbolId) -> String {
        self.symbol_name(symbol)
    }

    pub fn get(&self, id: SymbolId) -> Option<Symbol> {
        self.symbols.get(id)
    }
}
