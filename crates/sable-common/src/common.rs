//! Shared enums used by both the syntax tree and the symbol model.
//!
//! Kept here to break what would otherwise be a circular dependency between
//! `sable-ast` and `sable-symbols`.

/// By-ref-ness of a parameter or argument.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
}

impl RefKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            RefKind::None => "",
            RefKind::Ref => "ref",
            RefKind::Out => "out",
        }
    }

    pub const fn is_by_ref(self) -> bool {
        !matches!(self, RefKind::None)
    }
}
