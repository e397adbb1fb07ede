//! Compile-time constant folding.
//!
//! Folds literals and operators over them into `ConstValue`s, with two
//! arithmetic modes: checked (overflow is a compile error) and unchecked
//! (integral arithmetic wraps). Integer division by a constant zero is an
//! error in both modes. Floating-point folding follows IEEE semantics and
//! never errors.

use sable_ast::node::{BinaryOp, LitValue, UnaryOp};
use sable_common::interner::{Atom, Interner};
use sable_symbols::{PrimitiveKind, TypeId};

/// A folded compile-time constant.
///
/// Small integral types (`byte`, `short`, `char`, …) are range-checked at
/// conversion time but stored in the widest matching variant; the declared
/// type lives on the bound node, not here.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    /// Decimal constants stay textual; folding them is out of scope here.
    Decimal(Atom),
    Bool(bool),
    Char(char),
    Str(Atom),
    Null,
}

/// Why a fold or conversion failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstError {
    /// Checked-mode integral overflow.
    Overflow,
    /// Integer division or remainder by a constant zero.
    DivisionByZero,
    /// The value does not fit the conversion's target type.
    OutOfRange,
}

impl ConstValue {
    /// The natural type of this constant.
    pub fn ty(&self) -> TypeId {
        match self {
            ConstValue::Int(_) => TypeId::INT,
            ConstValue::UInt(_) => TypeId::UINT,
            ConstValue::Long(_) => TypeId::LONG,
            ConstValue::ULong(_) => TypeId::ULONG,
            ConstValue::Float(_) => TypeId::FLOAT,
            ConstValue::Double(_) => TypeId::DOUBLE,
            ConstValue::Decimal(_) => TypeId::DECIMAL,
            ConstValue::Bool(_) => TypeId::BOOL,
            ConstValue::Char(_) => TypeId::CHAR,
            ConstValue::Str(_) => TypeId::STRING,
            ConstValue::Null => TypeId::NULL,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Widen to `i128` when integral (including `char`).
    fn as_i128(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(i128::from(*v)),
            ConstValue::UInt(v) => Some(i128::from(*v)),
            ConstValue::Long(v) => Some(i128::from(*v)),
            ConstValue::ULong(v) => Some(i128::from(*v)),
            ConstValue::Char(c) => Some(i128::from(u32::from(*c))),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Float(v) => Some(f64::from(*v)),
            ConstValue::Double(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }
}

/// Type an integer literal the way the language does: the first of
/// `int`, `uint`, `long`, `ulong` the value fits.
fn type_integer_literal(value: i128) -> Option<ConstValue> {
    if let Ok(v) = i32::try_from(value) {
        Some(ConstValue::Int(v))
    } else if let Ok(v) = u32::try_from(value) {
        Some(ConstValue::UInt(v))
    } else if let Ok(v) = i64::try_from(value) {
        Some(ConstValue::Long(v))
    } else if let Ok(v) = u64::try_from(value) {
        Some(ConstValue::ULong(v))
    } else {
        None
    }
}

/// Fold a literal node. `None` means the literal has no folded form; an
/// integer literal too large even for `ulong` also lands here and the caller
/// reports it against the declared type.
pub fn from_literal(value: &LitValue, text: Atom) -> Option<ConstValue> {
    match value {
        LitValue::Int(v) => type_integer_literal(*v),
        LitValue::Float(v) => Some(ConstValue::Double(*v)),
        LitValue::Decimal => Some(ConstValue::Decimal(text)),
        LitValue::Bool(v) => Some(ConstValue::Bool(*v)),
        LitValue::Char(v) => Some(ConstValue::Char(*v)),
        LitValue::Str(v) => Some(ConstValue::Str(*v)),
        LitValue::Null => Some(ConstValue::Null),
    }
}

fn integral_range(kind: PrimitiveKind) -> Option<(i128, i128)> {
    match kind {
        PrimitiveKind::SByte => Some((i128::from(i8::MIN), i128::from(i8::MAX))),
        PrimitiveKind::Byte => Some((0, i128::from(u8::MAX))),
        PrimitiveKind::Short => Some((i128::from(i16::MIN), i128::from(i16::MAX))),
        PrimitiveKind::UShort | PrimitiveKind::Char => Some((0, i128::from(u16::MAX))),
        PrimitiveKind::Int => Some((i128::from(i32::MIN), i128::from(i32::MAX))),
        PrimitiveKind::UInt => Some((0, i128::from(u32::MAX))),
        PrimitiveKind::Long => Some((i128::from(i64::MIN), i128::from(i64::MAX))),
        PrimitiveKind::ULong => Some((0, i128::from(u64::MAX))),
        _ => None,
    }
}

/// Numeric value of a decimal literal's text for range decisions. Precision
/// beyond `f64` does not matter here; only the magnitude does.
fn parse_decimal(text: &str) -> Option<f64> {
    text.trim_end_matches(['m', 'M']).replace('_', "").parse().ok()
}

fn numeric_value(value: &ConstValue, names: &Interner) -> Option<f64> {
    match value {
        ConstValue::Decimal(text) => parse_decimal(&names.resolve(*text)),
        other => other.as_f64(),
    }
}

/// An integral view of `value` for a target with the given bounds. Real
/// sources (float, double, decimal) truncate toward zero first, as the
/// explicit conversion does at run time.
fn integral_source(
    value: &ConstValue,
    names: &Interner,
    min: i128,
    max: i128,
) -> Result<i128, ConstError> {
    let raw = match value.as_i128() {
        Some(raw) => raw,
        None => {
            let real = numeric_value(value, names).ok_or(ConstError::OutOfRange)?;
            let truncated = real.trunc();
            if !truncated.is_finite() || truncated < min as f64 || truncated > max as f64 {
                return Err(ConstError::OutOfRange);
            }
            truncated as i128
        }
    };
    if raw < min || raw > max {
        return Err(ConstError::OutOfRange);
    }
    Ok(raw)
}

/// Convert a constant to a primitive target type, checking range. The result
/// keeps the widest matching representation; small integral targets only
/// range-check. `OutOfRange` means the value has no representation in the
/// target, which callers surface as the constant-range diagnostic.
pub fn convert(
    value: &ConstValue,
    target: PrimitiveKind,
    names: &Interner,
) -> Result<ConstValue, ConstError> {
    match target {
        PrimitiveKind::Bool => value
            .as_bool()
            .map(ConstValue::Bool)
            .ok_or(ConstError::OutOfRange),
        PrimitiveKind::String => match value {
            ConstValue::Str(s) => Ok(ConstValue::Str(*s)),
            _ => Err(ConstError::OutOfRange),
        },
        PrimitiveKind::Float => numeric_value(value, names)
            .map(|v| ConstValue::Float(v as f32))
            .ok_or(ConstError::OutOfRange),
        PrimitiveKind::Double => numeric_value(value, names)
            .map(ConstValue::Double)
            .ok_or(ConstError::OutOfRange),
        PrimitiveKind::Char => {
            let code = integral_source(value, names, 0, i128::from(u16::MAX))? as u32;
            char::from_u32(code)
                .map(ConstValue::Char)
                .ok_or(ConstError::OutOfRange)
        }
        _ => {
            let (min, max) = integral_range(target).ok_or(ConstError::OutOfRange)?;
            let raw = integral_source(value, names, min, max)?;
            Ok(match target {
                PrimitiveKind::UInt => ConstValue::UInt(raw as u32),
                PrimitiveKind::Long => ConstValue::Long(raw as i64),
                PrimitiveKind::ULong => ConstValue::ULong(raw as u64),
                // Small signed/unsigned targets are stored as int after the
                // range check.
                _ => ConstValue::Int(raw as i32),
            })
        }
    }
}

/// The common type two numeric constants promote to before folding.
fn promoted(lhs: &ConstValue, rhs: &ConstValue) -> Option<PrimitiveKind> {
    let rank = |v: &ConstValue| match v {
        ConstValue::Int(_) | ConstValue::Char(_) => Some(0u8),
        ConstValue::UInt(_) => Some(1),
        ConstValue::Long(_) => Some(2),
        ConstValue::ULong(_) => Some(3),
        ConstValue::Float(_) => Some(4),
        ConstValue::Double(_) => Some(5),
        _ => None,
    };
    let promoted = rank(lhs)?.max(rank(rhs)?);
    Some(match promoted {
        0 => PrimitiveKind::Int,
        1 => PrimitiveKind::UInt,
        2 => PrimitiveKind::Long,
        3 => PrimitiveKind::ULong,
        4 => PrimitiveKind::Float,
        _ => PrimitiveKind::Double,
    })
}

fn fold_i64(op: BinaryOp, l: i64, r: i64, checked: bool, shift_mask: u32) -> Result<i64, ConstError> {
    let checked_result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => {
            if r == 0 {
                return Err(ConstError::DivisionByZero);
            }
            l.checked_div(r)
        }
        BinaryOp::Rem => {
            if r == 0 {
                return Err(ConstError::DivisionByZero);
            }
            l.checked_rem(r)
        }
        BinaryOp::BitAnd => Some(l & r),
        BinaryOp::BitOr => Some(l | r),
        BinaryOp::BitXor => Some(l ^ r),
        BinaryOp::Shl => Some(l << (r as u32 & shift_mask)),
        BinaryOp::Shr => Some(l >> (r as u32 & shift_mask)),
        _ => return Err(ConstError::OutOfRange),
    };
    match checked_result {
        Some(v) => Ok(v),
        None if checked => Err(ConstError::Overflow),
        None => Ok(match op {
            BinaryOp::Add => l.wrapping_add(r),
            BinaryOp::Sub => l.wrapping_sub(r),
            BinaryOp::Mul => l.wrapping_mul(r),
            BinaryOp::Div => l.wrapping_div(r),
            BinaryOp::Rem => l.wrapping_rem(r),
            _ => 0,
        }),
    }
}

fn fold_u64(op: BinaryOp, l: u64, r: u64, checked: bool, shift_mask: u32) -> Result<u64, ConstError> {
    let checked_result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => {
            if r == 0 {
                return Err(ConstError::DivisionByZero);
            }
            l.checked_div(r)
        }
        BinaryOp::Rem => {
            if r == 0 {
                return Err(ConstError::DivisionByZero);
            }
            l.checked_rem(r)
        }
        BinaryOp::BitAnd => Some(l & r),
        BinaryOp::BitOr => Some(l | r),
        BinaryOp::BitXor => Some(l ^ r),
        BinaryOp::Shl => Some(l << (r as u32 & shift_mask)),
        BinaryOp::Shr => Some(l >> (r as u32 & shift_mask)),
        _ => return Err(ConstError::OutOfRange),
    };
    match checked_result {
        Some(v) => Ok(v),
        None if checked => Err(ConstError::Overflow),
        None => Ok(match op {
            BinaryOp::Add => l.wrapping_add(r),
            BinaryOp::Sub => l.wrapping_sub(r),
            BinaryOp::Mul => l.wrapping_mul(r),
            _ => 0,
        }),
    }
}

fn fold_f64(op: BinaryOp, l: f64, r: f64) -> Option<f64> {
    Some(match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Rem => l % r,
        _ => return None,
    })
}

fn compare_numeric(op: BinaryOp, l: f64, r: f64) -> Option<bool> {
    Some(match op {
        BinaryOp::Eq => l == r,
        BinaryOp::Ne => l != r,
        BinaryOp::Lt => l < r,
        BinaryOp::Le => l <= r,
        BinaryOp::Gt => l > r,
        BinaryOp::Ge => l >= r,
        _ => return None,
    })
}

/// Fold a binary operation over two constants.
///
/// `Ok(None)` means the operand shapes do not fold (the expression simply is
/// not a constant); `Err` means the fold itself is a compile error.
pub fn fold_binary(
    op: BinaryOp,
    lhs: &ConstValue,
    rhs: &ConstValue,
    checked: bool,
    names: &Interner,
) -> Result<Option<ConstValue>, ConstError> {
    // Boolean logic.
    if let (ConstValue::Bool(l), ConstValue::Bool(r)) = (lhs, rhs) {
        return Ok(match op {
            BinaryOp::LogicalAnd | BinaryOp::BitAnd => Some(ConstValue::Bool(*l && *r)),
            BinaryOp::LogicalOr | BinaryOp::BitOr => Some(ConstValue::Bool(*l || *r)),
            BinaryOp::BitXor | BinaryOp::Ne => Some(ConstValue::Bool(l != r)),
            BinaryOp::Eq => Some(ConstValue::Bool(l == r)),
            _ => None,
        });
    }

    // String concatenation and equality.
    if let (ConstValue::Str(l), ConstValue::Str(r)) = (lhs, rhs) {
        return Ok(match op {
            BinaryOp::Add => {
                let joined = format!("{}{}", names.resolve(*l), names.resolve(*r));
                Some(ConstValue::Str(names.intern(&joined)))
            }
            BinaryOp::Eq => Some(ConstValue::Bool(l == r)),
            BinaryOp::Ne => Some(ConstValue::Bool(l != r)),
            _ => None,
        });
    }

    let Some(common) = promoted(lhs, rhs) else {
        return Ok(None);
    };

    if op.is_comparison() {
        let (Some(l), Some(r)) = (lhs.as_f64(), rhs.as_f64()) else {
            return Ok(None);
        };
        return Ok(compare_numeric(op, l, r).map(ConstValue::Bool));
    }

    match common {
        PrimitiveKind::Float | PrimitiveKind::Double => {
            let (Some(l), Some(r)) = (lhs.as_f64(), rhs.as_f64()) else {
                return Ok(None);
            };
            let Some(folded) = fold_f64(op, l, r) else {
                return Ok(None);
            };
            Ok(Some(if common == PrimitiveKind::Float {
                ConstValue::Float(folded as f32)
            } else {
                ConstValue::Double(folded)
            }))
        }
        PrimitiveKind::ULong => {
            let (Some(l), Some(r)) = (lhs.as_i128(), rhs.as_i128()) else {
                return Ok(None);
            };
            // A negative operand cannot promote to ulong.
            let (Ok(l), Ok(r)) = (u64::try_from(l), u64::try_from(r)) else {
                return Err(ConstError::OutOfRange);
            };
            fold_u64(op, l, r, checked, 63).map(|v| Some(ConstValue::ULong(v)))
        }
        _ => {
            let (Some(l), Some(r)) = (lhs.as_i128(), rhs.as_i128()) else {
                return Ok(None);
            };
            // The shift count masks by the operand width, 31 for the
            // 32-bit types and 63 for long.
            let shift_mask = if common == PrimitiveKind::Long { 63 } else { 31 };
            let folded = fold_i64(op, l as i64, r as i64, checked, shift_mask)?;
            // Shifts truncate to the operand width and never overflow-check.
            let truncating = matches!(op, BinaryOp::Shl | BinaryOp::Shr);
            Ok(Some(match common {
                PrimitiveKind::Int => {
                    if checked && !truncating {
                        i32::try_from(folded)
                            .map(ConstValue::Int)
                            .map_err(|_| ConstError::Overflow)?
                    } else {
                        ConstValue::Int(folded as i32)
                    }
                }
                PrimitiveKind::UInt => {
                    if checked && !truncating {
                        u32::try_from(folded)
                            .map(ConstValue::UInt)
                            .map_err(|_| ConstError::Overflow)?
                    } else {
                        ConstValue::UInt(folded as u32)
                    }
                }
                _ => ConstValue::Long(folded),
            }))
        }
    }
}

/// Fold a unary operation over a constant. Same result contract as
/// `fold_binary`.
pub fn fold_unary(
    op: UnaryOp,
    operand: &ConstValue,
    checked: bool,
) -> Result<Option<ConstValue>, ConstError> {
    match (op, operand) {
        (UnaryOp::Not, ConstValue::Bool(v)) => Ok(Some(ConstValue::Bool(!v))),
        (UnaryOp::Plus, v) if promoted(v, v).is_some() => Ok(Some(v.clone())),
        (UnaryOp::Neg, ConstValue::Int(v)) => match v.checked_neg() {
            Some(n) => Ok(Some(ConstValue::Int(n))),
            None if checked => Err(ConstError::Overflow),
            None => Ok(Some(ConstValue::Int(v.wrapping_neg()))),
        },
        (UnaryOp::Neg, ConstValue::Long(v)) => match v.checked_neg() {
            Some(n) => Ok(Some(ConstValue::Long(n))),
            None if checked => Err(ConstError::Overflow),
            None => Ok(Some(ConstValue::Long(v.wrapping_neg()))),
        },
        // -uint promotes to long; -ulong has no representation.
        (UnaryOp::Neg, ConstValue::UInt(v)) => Ok(Some(ConstValue::Long(-i64::from(*v)))),
        (UnaryOp::Neg, ConstValue::ULong(_)) => Err(ConstError::OutOfRange),
        (UnaryOp::Neg, ConstValue::Float(v)) => Ok(Some(ConstValue::Float(-v))),
        (UnaryOp::Neg, ConstValue::Double(v)) => Ok(Some(ConstValue::Double(-v))),
        (UnaryOp::BitNot, ConstValue::Int(v)) => Ok(Some(ConstValue::Int(!v))),
        (UnaryOp::BitNot, ConstValue::UInt(v)) => Ok(Some(ConstValue::UInt(!v))),
        (UnaryOp::BitNot, ConstValue::Long(v)) => Ok(Some(ConstValue::Long(!v))),
        (UnaryOp::BitNot, ConstValue::ULong(v)) => Ok(Some(ConstValue::ULong(!v))),
        _ => Ok(None),
    }
}

#[cfg(test)]
#[path = "../tests/const_eval_tests.rs"]
mod tests;
