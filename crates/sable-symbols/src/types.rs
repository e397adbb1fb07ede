//! Structural type representation with interning.
//!
//! Types are a tagged union (`TypeData`) interned to integer ids, so type
//! equality is an id compare and the conversion classifier can dispatch over
//! one exhaustive `match`. Intrinsic types are pre-registered at fixed ids.

use crate::symbol::SymbolId;
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::sync::RwLock;

/// Interned type id. Equal ids mean structurally identical types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const ERROR: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
    pub const OBJECT: TypeId = TypeId(2);
    pub const STRING: TypeId = TypeId(3);
    pub const BOOL: TypeId = TypeId(4);
    pub const CHAR: TypeId = TypeId(5);
    pub const SBYTE: TypeId = TypeId(6);
    pub const BYTE: TypeId = TypeId(7);
    pub const SHORT: TypeId = TypeId(8);
    pub const USHORT: TypeId = TypeId(9);
    pub const INT: TypeId = TypeId(10);
    pub const UINT: TypeId = TypeId(11);
    pub const LONG: TypeId = TypeId(12);
    pub const ULONG: TypeId = TypeId(13);
    pub const FLOAT: TypeId = TypeId(14);
    pub const DOUBLE: TypeId = TypeId(15);
    pub const DECIMAL: TypeId = TypeId(16);
    pub const DYNAMIC: TypeId = TypeId(17);
    /// The type of the `null` literal before any conversion applies.
    pub const NULL: TypeId = TypeId(18);

    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }
}

/// Built-in primitive kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Void,
    Object,
    String,
    Bool,
    Char,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
}

impl PrimitiveKind {
    /// The language keyword, as diagnostics print it.
    pub const fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Object => "object",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::SByte => "sbyte",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::UShort => "ushort",
            PrimitiveKind::Int => "int",
            PrimitiveKind::UInt => "uint",
            PrimitiveKind::Long => "long",
            PrimitiveKind::ULong => "ulong",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Decimal => "decimal",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::SByte
                | PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::UShort
                | PrimitiveKind::Int
                | PrimitiveKind::UInt
                | PrimitiveKind::Long
                | PrimitiveKind::ULong
                | PrimitiveKind::Float
                | PrimitiveKind::Double
                | PrimitiveKind::Decimal
                | PrimitiveKind::Char
        )
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::SByte
                | PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::UShort
                | PrimitiveKind::Int
                | PrimitiveKind::UInt
                | PrimitiveKind::Long
                | PrimitiveKind::ULong
                | PrimitiveKind::Char
        )
    }
}

/// The structural shape of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// Sentinel for a failed binding; compares equal to nothing downstream.
    Error,
    Dynamic,
    /// Type of the `null` literal.
    Null,
    Primitive(PrimitiveKind),
    /// Class, struct, interface, or enum, possibly generic-instantiated.
    Named { symbol: SymbolId, args: Vec<TypeId> },
    /// A delegate type; signature lives on the symbol.
    Delegate { symbol: SymbolId },
    Array { element: TypeId, rank: u8 },
    Pointer { pointee: TypeId },
    /// `T?` for a value type `T`.
    Nullable { underlying: TypeId },
    TypeParam { symbol: SymbolId },
}

/// Structural type interner.
///
/// Same `TypeData` always yields the same `TypeId`. Intrinsics are registered
/// in `new()` at the ids the `TypeId` constants name.
pub struct TypeInterner {
    map: DashMap<TypeData, TypeId, FxBuildHasher>,
    types: RwLock<Vec<TypeData>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = Self {
            map: DashMap::with_hasher(FxBuildHasher),
            types: RwLock::new(Vec::new()),
        };
        // Registration order must match the TypeId constants.
        let intrinsics = [
            TypeData::Error,
            TypeData::Primitive(PrimitiveKind::Void),
            TypeData::Primitive(PrimitiveKind::Object),
            TypeData::Primitive(PrimitiveKind::String),
            TypeData::Primitive(PrimitiveKind::Bool),
            TypeData::Primitive(PrimitiveKind::Char),
            TypeData::Primitive(PrimitiveKind::SByte),
            TypeData::Primitive(PrimitiveKind::Byte),
            TypeData::Primitive(PrimitiveKind::Short),
            TypeData::Primitive(PrimitiveKind::UShort),
            TypeData::Primitive(PrimitiveKind::Int),
            TypeData::Primitive(PrimitiveKind::UInt),
            TypeData::Primitive(PrimitiveKind::Long),
            TypeData::Primitive(PrimitiveKind::ULong),
            TypeData::Primitive(PrimitiveKind::Float),
            TypeData::Primitive(PrimitiveKind::Double),
            TypeData::Primitive(PrimitiveKind::Decimal),
            TypeData::Dynamic,
            TypeData::Null,
        ];
        for data in intrinsics {
            interner.intern(data);
        }
        debug_assert_eq!(interner.intern(TypeData::Null), TypeId::NULL);
        interner
    }

    /// Intern a type, returning its stable id.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(existing) = self.map.get(&data) {
            return *existing;
        }
        *self
            .map
            .entry(data.clone())
            .or_insert_with(|| {
                let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
                let id = TypeId(types.len() as u32);
                types.push(data);
                id
            })
            .value()
    }

    /// Look up the structural shape of an interned type.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.get(id.0 as usize).cloned()
    }

    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    pub fn named(&self, symbol: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.intern(TypeData::Named { symbol, args })
    }

    pub fn delegate(&self, symbol: SymbolId) -> TypeId {
        self.intern(TypeData::Delegate { symbol })
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Array { element, rank: 1 })
    }

    pub fn array_of_rank(&self, element: TypeId, rank: u8) -> TypeId {
        self.intern(TypeData::Array { element, rank })
    }

    pub fn pointer(&self, pointee: TypeId) -> TypeId {
        self.intern(TypeData::Pointer { pointee })
    }

    /// Wrap a value type in `Nullable`. Wrapping an already-nullable type is
    /// a declaration-pass bug, not a user error.
    pub fn nullable(&self, underlying: TypeId) -> TypeId {
        debug_assert!(!matches!(
            self.lookup(underlying),
            Some(TypeData::Nullable { .. })
        ));
        self.intern(TypeData::Nullable { underlying })
    }

    pub fn type_param(&self, symbol: SymbolId) -> TypeId {
        self.intern(TypeData::TypeParam { symbol })
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn is_nullable(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::Nullable { .. }))
    }

    /// For `T?` returns `T`, otherwise the type itself.
    pub fn strip_nullable(&self, id: TypeId) -> TypeId {
        match self.lookup(id) {
            Some(TypeData::Nullable { underlying }) => underlying,
            _ => id,
        }
    }

    pub fn primitive_kind(&self, id: TypeId) -> Option<PrimitiveKind> {
        match self.lookup(id) {
            Some(TypeData::Primitive(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.primitive_kind(id).is_some_and(PrimitiveKind::is_numeric)
    }

    /// Replace type parameters according to `map`, recursively.
    ///
    /// Used when walking base/interface lists of generic instantiations.
    pub fn substitute(&self, id: TypeId, map: &FxHashMap<SymbolId, TypeId>) -> TypeId {
        match self.lookup(id) {
            Some(TypeData::TypeParam { symbol }) => map.get(&symbol).copied().unwrap_or(id),
            Some(TypeData::Named { symbol, args }) => {
                let new_args: Vec<TypeId> =
                    args.iter().map(|a| self.substitute(*a, map)).collect();
                if new_args == args { id } else { self.named(symbol, new_args) }
            }
            Some(TypeData::Array { element, rank }) => {
                let new_element = self.substitute(element, map);
                if new_element == element {
                    id
                } else {
                    self.array_of_rank(new_element, rank)
                }
            }
            Some(TypeData::Nullable { underlying }) => {
                let new_underlying = self.substitute(underlying, map);
                if new_underlying == underlying {
                    id
                } else {
                    self.intern(TypeData::Nullable {
                        underlying: new_underlying,
                    })
                }
            }
            Some(TypeData::Pointer { pointee }) => {
                let new_pointee = self.substitute(pointee, map);
                if new_pointee == pointee {
                    id
                } else {
                    self.pointer(new_pointee)
                }
            }
            _ => id,
        }
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
