//! Common types and utilities for the sable compiler.
//!
//! This crate provides foundational types used across all sable crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`) and line/column mapping (`LineMap`)
//! - The closed diagnostic code/message table and rendered `Diagnostic`

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Common types - Shared enums to break circular dependencies
pub mod common;
pub use common::RefKind;

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{LineMap, Position, Span};

// Diagnostic codes, templates, and rendered diagnostics
pub mod diagnostics;
