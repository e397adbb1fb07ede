//! Symbol and type model for the sable compiler.
//!
//! This crate owns the two arenas everything downstream reads:
//!
//! - `SymbolArena`: write-once storage of declared entities (`SymbolId`)
//! - `TypeInterner`: structural type interning (`TypeId`, O(1) equality)
//!
//! Both are populated by the external declaration pass, then read-only for
//! the duration of semantic analysis, which is what makes per-declaration
//! binding embarrassingly parallel.

pub mod symbol;
pub mod table;
pub mod types;

pub use symbol::{
    Accessibility, ConstraintSet, Modifiers, ObsoleteInfo, ParamInfo, Symbol, SymbolArena,
    SymbolId, SymbolKind, TypeParamInfo, Variance,
};
pub use table::SymbolTable;
pub use types::{PrimitiveKind, TypeData, TypeId, TypeInterner};
