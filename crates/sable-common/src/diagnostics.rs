//! Diagnostic codes, message templates, and the rendered `Diagnostic`.
//!
//! The code table is a closed, versioned enumeration: once a code is
//! assigned a meaning it is never renumbered or repurposed, only its message
//! wording may evolve. Templates use `{0}`-style positional placeholders
//! filled in by `format_message`.

use crate::span::Span;
use serde::Serialize;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Info = 2,
    /// Retained in the stream but excluded from default rendering.
    Hidden = 3,
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Related information for a diagnostic (e.g., "see declaration here").
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub span: Span,
    pub message_text: String,
}

/// A rendered semantic diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub span: Span,
    pub message_text: String,
    /// Related spans (e.g., where a conflicting candidate was declared)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn new(code: u32, category: DiagnosticCategory, span: Span, message: String) -> Self {
        Self {
            code,
            category,
            span,
            message_text: message,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            span,
            message_text: message.into(),
        });
        self
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the category for a diagnostic code.
///
/// Unknown codes default to `Error`; the table is closed, so this only
/// happens for codes added by a newer producer than this table.
#[must_use]
pub fn category_for(code: u32) -> DiagnosticCategory {
    get_diagnostic_message(code).map_or(DiagnosticCategory::Error, |m| m.category)
}

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Stable numeric codes for every diagnostic this compiler emits.
///
/// Numbering follows the reference compiler for the source language so that
/// fixture suites pinning exact codes keep passing.
pub mod diagnostic_codes {
    pub const OPERATOR_CANNOT_BE_APPLIED: u32 = 19;
    pub const UNARY_OPERATOR_CANNOT_BE_APPLIED: u32 = 23;
    pub const THIS_IN_STATIC_CONTEXT: u32 = 26;
    pub const CANNOT_CONVERT: u32 = 30;
    pub const NO_IMPLICIT_CONVERSION: u32 = 29;
    pub const CONSTANT_VALUE_OUT_OF_RANGE: u32 = 31;
    pub const AMBIGUOUS_USER_DEFINED_CONVERSION: u32 = 34;
    pub const CANNOT_CONVERT_NULL: u32 = 37;
    pub const NAME_NOT_IN_CONTEXT: u32 = 103;
    pub const NO_SUCH_MEMBER: u32 = 117;
    pub const AMBIGUOUS_CALL: u32 = 121;
    pub const MEMBER_INACCESSIBLE: u32 = 122;
    pub const ASSIGNMENT_TARGET_NOT_VARIABLE: u32 = 131;
    pub const THROWN_TYPE_NOT_EXCEPTION: u32 = 155;
    pub const CONTROL_CANNOT_LEAVE_FINALLY: u32 = 157;
    pub const CATCH_CLAUSE_UNREACHABLE: u32 = 160;
    pub const CONDITIONAL_TYPE_UNDETERMINED: u32 = 173;
    pub const UNREACHABLE_CODE: u32 = 162;
    pub const USE_OF_UNASSIGNED_LOCAL: u32 = 165;
    pub const USE_OF_UNASSIGNED_FIELD: u32 = 170;
    pub const STRUCT_FIELDS_UNASSIGNED: u32 = 171;
    pub const UNUSED_VARIABLE: u32 = 168;
    pub const READONLY_FIELD_ASSIGNMENT: u32 = 191;
    pub const READONLY_PROPERTY_ASSIGNMENT: u32 = 200;
    pub const VARIABLE_ASSIGNED_NEVER_USED: u32 = 219;
    pub const CHECKED_OVERFLOW: u32 = 220;
    pub const INTEGER_DIVISION_BY_ZERO: u32 = 20;
    pub const NO_IMPLICIT_CONVERSION_CAST_EXISTS: u32 = 266;
    pub const CONSTRAINT_NEEDS_NEW: u32 = 310;
    pub const CONSTRAINT_NOT_SATISFIED: u32 = 311;
    pub const CONSTRAINT_NEEDS_REFERENCE_TYPE: u32 = 452;
    pub const CONSTRAINT_NEEDS_VALUE_TYPE: u32 = 453;
    pub const CIRCULAR_CONSTRAINT: u32 = 454;
    pub const EXPRESSION_ALWAYS_CONSTANT: u32 = 472;
    pub const OBSOLETE_SYMBOL: u32 = 612;
    pub const OBSOLETE_SYMBOL_WITH_MESSAGE: u32 = 618;
    pub const OBSOLETE_SYMBOL_ERROR: u32 = 619;
    pub const NO_ACCESSIBLE_MEMBER: u32 = 1061;
    pub const BAD_OVERLOAD_ARGUMENTS: u32 = 1502;
    pub const ARGUMENT_CANNOT_CONVERT: u32 = 1503;
    pub const ARGUMENT_EXTRA_REF: u32 = 1615;
    pub const ARGUMENT_MISSING_REF: u32 = 1620;
    pub const YIELD_IN_FINALLY: u32 = 1625;
    pub const YIELD_IN_CATCH: u32 = 1631;
    pub const READONLY_REF_ARGUMENT: u32 = 1657;
    pub const SELF_COMPARISON: u32 = 1718;
    pub const NAMED_ARGUMENT_DUPLICATES_POSITIONAL: u32 = 1736;
    pub const NO_PARAMETER_WITH_NAME: u32 = 1739;
    pub const NAMED_ARGUMENT_OUT_OF_POSITION: u32 = 1744;
    pub const INVALID_VARIANCE: u32 = 1961;
    pub const NO_ARGUMENT_FOR_PARAMETER: u32 = 7036;
    pub const UNNECESSARY_IMPORT: u32 = 8019;
}

use DiagnosticCategory::{Error, Hidden, Warning};
use diagnostic_codes as dc;

/// The closed message table.
pub const DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: dc::OPERATOR_CANNOT_BE_APPLIED,
        category: Error,
        message: "Operator '{0}' cannot be applied to operands of type '{1}' and '{2}'",
    },
    DiagnosticMessage {
        code: dc::UNARY_OPERATOR_CANNOT_BE_APPLIED,
        category: Error,
        message: "Operator '{0}' cannot be applied to operand of type '{1}'",
    },
    DiagnosticMessage {
        code: dc::THIS_IN_STATIC_CONTEXT,
        category: Error,
        message: "Keyword 'this' is not valid in a static property, static method, or static field initializer",
    },
    DiagnosticMessage {
        code: dc::CANNOT_CONVERT,
        category: Error,
        message: "Cannot convert type '{0}' to '{1}'",
    },
    DiagnosticMessage {
        code: dc::THROWN_TYPE_NOT_EXCEPTION,
        category: Error,
        message: "The type caught or thrown must be derived from System.Exception",
    },
    DiagnosticMessage {
        code: dc::CONTROL_CANNOT_LEAVE_FINALLY,
        category: Error,
        message: "Control cannot leave the body of a finally clause",
    },
    DiagnosticMessage {
        code: dc::CONDITIONAL_TYPE_UNDETERMINED,
        category: Error,
        message: "Type of conditional expression cannot be determined because there is no implicit conversion between '{0}' and '{1}'",
    },
    DiagnosticMessage {
        code: dc::INTEGER_DIVISION_BY_ZERO,
        category: Error,
        message: "Division by constant zero",
    },
    DiagnosticMessage {
        code: dc::NO_IMPLICIT_CONVERSION,
        category: Error,
        message: "Cannot implicitly convert type '{0}' to '{1}'",
    },
    DiagnosticMessage {
        code: dc::CONSTANT_VALUE_OUT_OF_RANGE,
        category: Error,
        message: "Constant value '{0}' cannot be converted to a '{1}'",
    },
    DiagnosticMessage {
        code: dc::AMBIGUOUS_USER_DEFINED_CONVERSION,
        category: Error,
        message: "Ambiguous user defined conversions '{0}' and '{1}' when converting from '{2}' to '{3}'",
    },
    DiagnosticMessage {
        code: dc::CANNOT_CONVERT_NULL,
        category: Error,
        message: "Cannot convert null to '{0}' because it is a non-nullable value type",
    },
    DiagnosticMessage {
        code: dc::NAME_NOT_IN_CONTEXT,
        category: Error,
        message: "The name '{0}' does not exist in the current context",
    },
    DiagnosticMessage {
        code: dc::NO_SUCH_MEMBER,
        category: Error,
        message: "'{0}' does not contain a definition for '{1}'",
    },
    DiagnosticMessage {
        code: dc::AMBIGUOUS_CALL,
        category: Error,
        message: "The call is ambiguous between the following methods or properties: '{0}' and '{1}'",
    },
    DiagnosticMessage {
        code: dc::MEMBER_INACCESSIBLE,
        category: Error,
        message: "'{0}' is inaccessible due to its protection level",
    },
    DiagnosticMessage {
        code: dc::ASSIGNMENT_TARGET_NOT_VARIABLE,
        category: Error,
        message: "The left-hand side of an assignment must be a variable, property or indexer",
    },
    DiagnosticMessage {
        code: dc::CATCH_CLAUSE_UNREACHABLE,
        category: Error,
        message: "A previous catch clause already catches all exceptions of this or of a super type ('{0}')",
    },
    DiagnosticMessage {
        code: dc::UNREACHABLE_CODE,
        category: Warning,
        message: "Unreachable code detected",
    },
    DiagnosticMessage {
        code: dc::USE_OF_UNASSIGNED_LOCAL,
        category: Error,
        message: "Use of unassigned local variable '{0}'",
    },
    DiagnosticMessage {
        code: dc::UNUSED_VARIABLE,
        category: Warning,
        message: "The variable '{0}' is declared but never used",
    },
    DiagnosticMessage {
        code: dc::USE_OF_UNASSIGNED_FIELD,
        category: Error,
        message: "Use of possibly unassigned field '{0}'",
    },
    DiagnosticMessage {
        code: dc::STRUCT_FIELDS_UNASSIGNED,
        category: Error,
        message: "Field '{0}' must be fully assigned before control is returned to the caller",
    },
    DiagnosticMessage {
        code: dc::READONLY_FIELD_ASSIGNMENT,
        category: Error,
        message: "A readonly field cannot be assigned to (except in a constructor or init-only setter of the type in which the field is defined or a variable initializer)",
    },
    DiagnosticMessage {
        code: dc::READONLY_PROPERTY_ASSIGNMENT,
        category: Error,
        message: "Property or indexer '{0}' cannot be assigned to -- it is read only",
    },
    DiagnosticMessage {
        code: dc::VARIABLE_ASSIGNED_NEVER_USED,
        category: Warning,
        message: "The variable '{0}' is assigned but its value is never used",
    },
    DiagnosticMessage {
        code: dc::CHECKED_OVERFLOW,
        category: Error,
        message: "The operation overflows at compile time in checked mode",
    },
    DiagnosticMessage {
        code: dc::NO_IMPLICIT_CONVERSION_CAST_EXISTS,
        category: Error,
        message: "Cannot implicitly convert type '{0}' to '{1}'. An explicit conversion exists (are you missing a cast?)",
    },
    DiagnosticMessage {
        code: dc::CONSTRAINT_NEEDS_NEW,
        category: Error,
        message: "'{0}' must be a non-abstract type with a public parameterless constructor in order to use it as parameter '{1}' in the generic type or method '{2}'",
    },
    DiagnosticMessage {
        code: dc::CONSTRAINT_NOT_SATISFIED,
        category: Error,
        message: "The type '{0}' cannot be used as type parameter '{1}' in the generic type or method '{2}'. There is no implicit reference conversion from '{0}' to '{3}'",
    },
    DiagnosticMessage {
        code: dc::CONSTRAINT_NEEDS_REFERENCE_TYPE,
        category: Error,
        message: "The type '{0}' must be a reference type in order to use it as parameter '{1}' in the generic type or method '{2}'",
    },
    DiagnosticMessage {
        code: dc::CONSTRAINT_NEEDS_VALUE_TYPE,
        category: Error,
        message: "The type '{0}' must be a non-nullable value type in order to use it as parameter '{1}' in the generic type or method '{2}'",
    },
    DiagnosticMessage {
        code: dc::CIRCULAR_CONSTRAINT,
        category: Error,
        message: "Circular constraint dependency involving '{0}' and '{1}'",
    },
    DiagnosticMessage {
        code: dc::EXPRESSION_ALWAYS_CONSTANT,
        category: Warning,
        message: "The result of the expression is always '{0}' since a value of type '{1}' is never equal to 'null' of type '{2}'",
    },
    DiagnosticMessage {
        code: dc::OBSOLETE_SYMBOL,
        category: Warning,
        message: "'{0}' is obsolete",
    },
    DiagnosticMessage {
        code: dc::OBSOLETE_SYMBOL_WITH_MESSAGE,
        category: Warning,
        message: "'{0}' is obsolete: '{1}'",
    },
    DiagnosticMessage {
        code: dc::OBSOLETE_SYMBOL_ERROR,
        category: Error,
        message: "'{0}' is obsolete: '{1}'",
    },
    DiagnosticMessage {
        code: dc::NO_ACCESSIBLE_MEMBER,
        category: Error,
        message: "'{0}' does not contain an accessible definition for '{1}'",
    },
    DiagnosticMessage {
        code: dc::BAD_OVERLOAD_ARGUMENTS,
        category: Error,
        message: "The best overloaded method match for '{0}' has some invalid arguments",
    },
    DiagnosticMessage {
        code: dc::ARGUMENT_CANNOT_CONVERT,
        category: Error,
        message: "Argument {0}: cannot convert from '{1}' to '{2}'",
    },
    DiagnosticMessage {
        code: dc::ARGUMENT_EXTRA_REF,
        category: Error,
        message: "Argument {0} should not be passed with the '{1}' keyword",
    },
    DiagnosticMessage {
        code: dc::ARGUMENT_MISSING_REF,
        category: Error,
        message: "Argument {0} must be passed with the '{1}' keyword",
    },
    DiagnosticMessage {
        code: dc::YIELD_IN_FINALLY,
        category: Error,
        message: "Cannot yield in the body of a finally clause",
    },
    DiagnosticMessage {
        code: dc::YIELD_IN_CATCH,
        category: Error,
        message: "Cannot yield a value in the body of a catch clause",
    },
    DiagnosticMessage {
        code: dc::READONLY_REF_ARGUMENT,
        category: Error,
        message: "Cannot use '{0}' as a ref or out value because it is a '{1}'",
    },
    DiagnosticMessage {
        code: dc::SELF_COMPARISON,
        category: Warning,
        message: "Comparison made to same variable; did you mean to compare something else?",
    },
    DiagnosticMessage {
        code: dc::NAMED_ARGUMENT_DUPLICATES_POSITIONAL,
        category: Error,
        message: "Named argument '{0}' specifies a parameter for which a positional argument has already been given",
    },
    DiagnosticMessage {
        code: dc::NO_PARAMETER_WITH_NAME,
        category: Error,
        message: "The best overload for '{0}' does not have a parameter named '{1}'",
    },
    DiagnosticMessage {
        code: dc::NAMED_ARGUMENT_OUT_OF_POSITION,
        category: Error,
        message: "Named argument '{0}' is used out-of-position but is followed by an unnamed argument",
    },
    DiagnosticMessage {
        code: dc::INVALID_VARIANCE,
        category: Error,
        message: "Invalid variance: The type parameter '{0}' must be {1} valid on '{2}'. '{0}' is {3}.",
    },
    DiagnosticMessage {
        code: dc::NO_ARGUMENT_FOR_PARAMETER,
        category: Error,
        message: "There is no argument given that corresponds to the required formal parameter '{0}' of '{1}'",
    },
    DiagnosticMessage {
        code: dc::UNNECESSARY_IMPORT,
        category: Hidden,
        message: "Unnecessary using directive",
    },
];
