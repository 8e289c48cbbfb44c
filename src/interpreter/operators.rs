// SyntaxLang operators
// Binary, unary, and index operations on primitives, with objects
// dispatched to their hooks

use super::{value_of, Evaluated, Interpreter, Outcome};
use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{ErrorKind, Span, SyntaxLangResult};
use crate::instruction::{BinaryInstruction, Instruction};
use crate::runtime::value::{format_number, from_integer, to_integer};
use crate::runtime::{BigComplex, Hook, Scope, Value, ValueKind};
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};
use smallvec::smallvec;
use std::rc::Rc;

pub const ARITHMETIC_EXCEPTION: &str = "ArithmeticException";
pub const INDEX_EXCEPTION: &str = "IndexOutOfBoundsException";

/// Largest integer a left shift may produce, in bits
const MAX_SHIFT_BITS: u64 = 1 << 24;

/// Largest exact power, in decimal digits of the operands' product
const MAX_POWER_DIGITS: u64 = 1 << 20;

/// Why a primitive operation produced no value
#[derive(Debug, PartialEq)]
enum Fault {
    /// Operator not defined for these operand tags
    Unsupported,
    /// Catchable exception kind and message
    Exception(&'static str, String),
    Fatal(ErrorKind, String),
}

fn division_by_zero() -> Fault {
    Fault::Exception(ARITHMETIC_EXCEPTION, "Division by zero".to_string())
}

fn primitive_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Fault> {
    match op {
        BinaryOp::Equal => return Ok(Value::boolean(left.loosely_equals(right))),
        BinaryOp::NotEqual => return Ok(Value::boolean(!left.loosely_equals(right))),
        BinaryOp::Identical => return Ok(Value::boolean(left.identical(right))),
        BinaryOp::NotIdentical => return Ok(Value::boolean(!left.identical(right))),
        _ => {}
    }
    match (left.kind(), right.kind()) {
        (ValueKind::Number(a), ValueKind::Number(b)) => number_binary(op, a, b),
        (
            ValueKind::Number(_) | ValueKind::Complex(_),
            ValueKind::Number(_) | ValueKind::Complex(_),
        ) => complex_binary(op, &to_complex(left), &to_complex(right)),
        (ValueKind::String(a), _) => string_binary(op, a, right),
        (ValueKind::Boolean(a), ValueKind::Boolean(b)) => boolean_binary(op, *a, *b),
        (ValueKind::List(a), ValueKind::List(b)) if op == BinaryOp::Add => {
            Ok(Value::list(a.iter().chain(b.iter()).cloned().collect()))
        }
        _ => Err(Fault::Unsupported),
    }
}

fn to_complex(value: &Value) -> BigComplex {
    match value.kind() {
        ValueKind::Complex(c) => (**c).clone(),
        ValueKind::Number(n) => BigComplex::new(n.clone(), BigDecimal::zero()),
        _ => BigComplex::new(BigDecimal::zero(), BigDecimal::zero()),
    }
}

fn number_binary(op: BinaryOp, a: &BigDecimal, b: &BigDecimal) -> Result<Value, Fault> {
    let value = match op {
        BinaryOp::Add => Value::number(a + b),
        BinaryOp::Sub => Value::number(a - b),
        BinaryOp::Mul => Value::number(a * b),
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(division_by_zero());
            }
            Value::number(a / b)
        }
        BinaryOp::Mod => {
            if b.is_zero() {
                return Err(division_by_zero());
            }
            Value::number(a % b)
        }
        BinaryOp::Power => Value::number(power(a, b)?),
        BinaryOp::Less => Value::boolean(a < b),
        BinaryOp::LessEqual => Value::boolean(a <= b),
        BinaryOp::Greater => Value::boolean(a > b),
        BinaryOp::GreaterEqual => Value::boolean(a >= b),
        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => integer_binary(op, a, b)?,
        _ => return Err(Fault::Unsupported),
    };
    Ok(value)
}

fn integer_binary(op: BinaryOp, a: &BigDecimal, b: &BigDecimal) -> Result<Value, Fault> {
    let (Some(x), Some(y)) = (to_integer(a), to_integer(b)) else {
        return Err(Fault::Fatal(
            ErrorKind::TypeMismatch,
            format!("Operator {} requires integer operands", op),
        ));
    };
    let result = match op {
        BinaryOp::BitAnd => &x & &y,
        BinaryOp::BitOr => &x | &y,
        BinaryOp::BitXor => &x ^ &y,
        _ => {
            let Some(shift) = y.to_usize() else {
                return Err(Fault::Fatal(
                    ErrorKind::InvalidOperation,
                    format!("Shift amount must be a non-negative integer, got {}", y),
                ));
            };
            if op == BinaryOp::RightShift {
                if shift as u64 >= x.bits() {
                    // all magnitude bits shifted out; sign extends
                    if x.sign() == Sign::Minus {
                        -BigInt::one()
                    } else {
                        BigInt::zero()
                    }
                } else {
                    x >> shift
                }
            } else if !x.is_zero() && x.bits().saturating_add(shift as u64) > MAX_SHIFT_BITS {
                return Err(Fault::Exception(
                    ARITHMETIC_EXCEPTION,
                    format!("Shift amount {} out of range", y),
                ));
            } else {
                x << shift
            }
        }
    };
    Ok(Value::number(from_integer(result)))
}

/// Exact for integral exponents, through f64 otherwise
fn power(base: &BigDecimal, exponent: &BigDecimal) -> Result<BigDecimal, Fault> {
    if let Some(exponent) = to_integer(exponent).and_then(|e| e.to_i64()) {
        let trivial = base.is_zero() || base.abs() == BigDecimal::one();
        if !trivial && base.digits().saturating_mul(exponent.unsigned_abs()) > MAX_POWER_DIGITS {
            return Err(Fault::Exception(
                ARITHMETIC_EXCEPTION,
                format!(
                    "Power {} ** {} is too large",
                    format_number(base),
                    exponent
                ),
            ));
        }
        let mut result = BigDecimal::one();
        let mut factor = base.clone();
        let mut remaining = exponent.unsigned_abs();
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = &result * &factor;
            }
            remaining >>= 1;
            if remaining > 0 {
                factor = &factor * &factor;
            }
        }
        if exponent < 0 {
            if result.is_zero() {
                return Err(division_by_zero());
            }
            result = BigDecimal::one() / result;
        }
        return Ok(result);
    }
    base.to_f64()
        .zip(exponent.to_f64())
        .map(|(b, e)| b.powf(e))
        .and_then(BigDecimal::from_f64)
        .ok_or_else(|| {
            Fault::Exception(
                ARITHMETIC_EXCEPTION,
                format!(
                    "Invalid power {} ** {}",
                    format_number(base),
                    format_number(exponent)
                ),
            )
        })
}

fn complex_binary(op: BinaryOp, a: &BigComplex, b: &BigComplex) -> Result<Value, Fault> {
    let value = match op {
        BinaryOp::Add => a.clone() + b.clone(),
        BinaryOp::Sub => a.clone() - b.clone(),
        BinaryOp::Mul => a.clone() * b.clone(),
        BinaryOp::Div => {
            if b.re.is_zero() && b.im.is_zero() {
                return Err(division_by_zero());
            }
            a.clone() / b.clone()
        }
        _ => return Err(Fault::Unsupported),
    };
    Ok(Value::complex(value))
}

fn string_binary(op: BinaryOp, a: &Rc<str>, right: &Value) -> Result<Value, Fault> {
    if op == BinaryOp::Add {
        let joined = match right.as_string() {
            Some(b) => format!("{}{}", a, b),
            None => format!("{}{}", a, right),
        };
        return Ok(Value::string(joined));
    }
    let Some(b) = right.as_string() else {
        return Err(Fault::Unsupported);
    };
    let ordering = a.as_ref().cmp(b.as_ref());
    let result = match op {
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEqual => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::GreaterEqual => ordering.is_ge(),
        _ => return Err(Fault::Unsupported),
    };
    Ok(Value::boolean(result))
}

fn boolean_binary(op: BinaryOp, a: bool, b: bool) -> Result<Value, Fault> {
    let result = match op {
        BinaryOp::And => a && b,
        BinaryOp::Or => a || b,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        _ => return Err(Fault::Unsupported),
    };
    Ok(Value::boolean(result))
}

impl Interpreter {
    /// Evaluate a binary node. Constant nodes fold on first evaluation;
    /// `&&`/`||` with a Boolean left operand short-circuit.
    pub(crate) fn binary(&mut self, binary: &BinaryInstruction, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        if let Some(value) = binary.folded() {
            return Ok(Outcome::Done(value.clone()));
        }
        let left = value_of!(self.evaluate(&binary.left, scope));
        let short_circuit = match (binary.op, left.as_boolean()) {
            (BinaryOp::And, Some(false)) => Some(false),
            (BinaryOp::Or, Some(true)) => Some(true),
            _ => None,
        };
        let result = match short_circuit {
            Some(b) => Value::boolean(b).with_position(binary.span),
            None => {
                let right = value_of!(self.evaluate(&binary.right, scope));
                value_of!(self.apply_binary(binary.op, left, right, binary.span, scope))
            }
        };
        if binary.is_constant() {
            return Ok(Outcome::Done(binary.fold(result).clone()));
        }
        Ok(Outcome::Done(result))
    }

    /// Apply `op` to evaluated operands
    pub(crate) fn apply_binary(
        &mut self,
        op: BinaryOp,
        left: Value,
        right: Value,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        let equality = matches!(
            op,
            BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::Identical | BinaryOp::NotIdentical
        );
        let negated = matches!(op, BinaryOp::NotEqual | BinaryOp::NotIdentical);
        if equality && (left.is_null() || right.is_null()) {
            let same = left.is_null() && right.is_null();
            return Ok(Outcome::Done(Value::boolean(same != negated).with_position(span)));
        }
        for operand in [&left, &right] {
            if operand.is_null() || operand.is_function() {
                return Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Operator {} cannot be applied to {}", op, operand.type_name()),
                    span,
                ));
            }
        }

        if let Some(instance) = left.as_object() {
            let hook = Hook::for_binary(op);
            return match self.call_hook(instance, hook, smallvec![right.clone()], span, scope)? {
                Some(Outcome::Done(result)) if equality => match result.as_boolean() {
                    Some(b) => Ok(Outcome::Done(Value::boolean(b != negated).with_position(span))),
                    None => Err(scope.error(
                        ErrorKind::HookReturnType,
                        format!(
                            "{} of {} must return Boolean, got {}",
                            hook.name(),
                            instance.ty().full_name(),
                            result.type_name()
                        ),
                        span,
                    )),
                },
                Some(outcome) => Ok(outcome),
                None if equality => Ok(Outcome::Done(
                    Value::boolean(left.identical(&right) != negated).with_position(span),
                )),
                None => Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Operator {} is not defined for {}", op, instance.ty().full_name()),
                    span,
                )),
            };
        }

        let right = match right.as_object() {
            Some(instance) => {
                let hook = match left.kind() {
                    ValueKind::Number(_) => Hook::Number,
                    ValueKind::Complex(_) => Hook::Complex,
                    ValueKind::Boolean(_) => Hook::Boolean,
                    ValueKind::String(_) => {
                        let text = value_of!(self.to_text(&right, span, scope));
                        return self.finish_binary(op, &left, &Value::string(text), span, scope);
                    }
                    _ if equality => {
                        return Ok(Outcome::Done(Value::boolean(negated).with_position(span)))
                    }
                    _ => {
                        return Err(scope.error(
                            ErrorKind::InvalidOperation,
                            format!(
                                "Operator {} cannot be applied to {} and {}",
                                op,
                                left.type_name(),
                                right.type_name()
                            ),
                            span,
                        ))
                    }
                };
                match self.convert(instance, hook, span, scope)? {
                    Some(Outcome::Done(converted)) => converted,
                    Some(interrupted) => return Ok(interrupted),
                    None if equality => {
                        return Ok(Outcome::Done(Value::boolean(negated).with_position(span)))
                    }
                    None => {
                        return Err(scope.error(
                            ErrorKind::InvalidOperation,
                            format!("{} does not define {}", instance.ty().full_name(), hook.name()),
                            span,
                        ))
                    }
                }
            }
            None => right,
        };
        self.finish_binary(op, &left, &right, span, scope)
    }

    fn finish_binary(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        match primitive_binary(op, left, right) {
            Ok(value) => Ok(Outcome::Done(value.with_position(span))),
            Err(Fault::Unsupported) => Err(scope.error(
                ErrorKind::InvalidOperation,
                format!(
                    "Operator {} cannot be applied to {} and {}",
                    op,
                    left.type_name(),
                    right.type_name()
                ),
                span,
            )),
            Err(Fault::Exception(kind, message)) => Ok(self.exception(kind, message, span, scope).into()),
            Err(Fault::Fatal(kind, message)) => Err(scope.error(kind, message, span)),
        }
    }

    pub(crate) fn unary(
        &mut self,
        op: UnaryOp,
        prefix: bool,
        operand: &Instruction,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        if op.is_update() {
            return self.update(op, prefix, operand, span, scope);
        }
        let value = value_of!(self.evaluate(operand, scope));
        if let Some(instance) = value.as_object() {
            return match self.call_hook(instance, Hook::for_unary(op), smallvec![], span, scope)? {
                Some(outcome) => Ok(outcome),
                None => Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Operator {} is not defined for {}", op.symbol(), instance.ty().full_name()),
                    span,
                )),
            };
        }
        let result = match (op, value.kind()) {
            (UnaryOp::Plus, ValueKind::Number(_) | ValueKind::Complex(_)) => value.clone(),
            (UnaryOp::Minus, ValueKind::Number(n)) => Value::number(-(n.clone())),
            (UnaryOp::Minus, ValueKind::Complex(c)) => Value::complex(-((**c).clone())),
            (UnaryOp::Not, ValueKind::Boolean(b)) => Value::boolean(!b),
            (UnaryOp::Complement, ValueKind::Number(n)) => match to_integer(n) {
                Some(integer) => Value::number(from_integer(!integer)),
                None => {
                    return Err(scope.error(
                        ErrorKind::TypeMismatch,
                        "Operator ~ requires an integer operand",
                        span,
                    ))
                }
            },
            _ => {
                return Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Operator {} cannot be applied to {}", op.symbol(), value.type_name()),
                    span,
                ))
            }
        };
        Ok(Outcome::Done(result.with_position(span)))
    }

    /// `++`/`--`: store the updated value back into the operand
    fn update(
        &mut self,
        op: UnaryOp,
        prefix: bool,
        operand: &Instruction,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        if !matches!(
            operand,
            Instruction::Identifier { .. } | Instruction::Member { .. } | Instruction::Index { .. }
        ) {
            return Err(scope.error(
                ErrorKind::InvalidOperation,
                format!("Operand of {} must be assignable", op.symbol()),
                span,
            ));
        }
        let current = value_of!(self.evaluate(operand, scope));
        let updated = match current.kind() {
            ValueKind::Number(n) => Value::number(if op == UnaryOp::Increment {
                n + BigDecimal::one()
            } else {
                n - BigDecimal::one()
            }),
            ValueKind::Object(instance) => {
                match self.call_hook(instance, Hook::for_unary(op), smallvec![], span, scope)? {
                    Some(Outcome::Done(value)) => value,
                    Some(interrupted) => return Ok(interrupted),
                    None => {
                        return Err(scope.error(
                            ErrorKind::InvalidOperation,
                            format!("Operator {} is not defined for {}", op.symbol(), instance.ty().full_name()),
                            span,
                        ))
                    }
                }
            }
            _ => {
                return Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Operator {} cannot be applied to {}", op.symbol(), current.type_name()),
                    span,
                ))
            }
        };
        value_of!(self.store(operand, updated.clone(), span, scope));
        let result = if prefix { updated } else { current };
        Ok(Outcome::Done(result.with_position(span)))
    }

    /// `target[index]`
    pub(crate) fn index(&mut self, target: Value, index: Value, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        match target.kind() {
            ValueKind::Object(instance) => {
                match self.call_hook(instance, Hook::Idx, smallvec![index], span, scope)? {
                    Some(outcome) => Ok(outcome),
                    None => Err(scope.error(
                        ErrorKind::InvalidOperation,
                        format!("{} does not support indexing", instance.ty().full_name()),
                        span,
                    )),
                }
            }
            ValueKind::List(values) => match self.position(&index, values.len(), span, scope)? {
                Some(position) => Ok(Outcome::Done(values[position].clone())),
                None => Ok(self.out_of_bounds(&index, values.len(), span, scope).into()),
            },
            ValueKind::String(text) => {
                let length = text.chars().count();
                match self.position(&index, length, span, scope)? {
                    Some(position) => {
                        let c = text.chars().nth(position).map(String::from).unwrap_or_default();
                        Ok(Outcome::Done(Value::string(c).with_position(span)))
                    }
                    None => Ok(self.out_of_bounds(&index, length, span, scope).into()),
                }
            }
            ValueKind::Map(map) => Ok(Outcome::Done(map.get(&index).cloned().unwrap_or_else(Value::null))),
            _ => Err(scope.error(
                ErrorKind::TypeMismatch,
                format!("Cannot index {}", target.type_name()),
                span,
            )),
        }
    }

    /// Checked position of an integral index; none when out of range
    pub(crate) fn position(&self, index: &Value, length: usize, span: Span, scope: &Scope) -> SyntaxLangResult<Option<usize>> {
        let integer = index.as_number().and_then(to_integer).ok_or_else(|| {
            scope.error(
                ErrorKind::TypeMismatch,
                format!("Index must be an integer, got {}", index),
                span,
            )
        })?;
        Ok(integer.to_usize().filter(|&position| position < length))
    }

    pub(crate) fn out_of_bounds(&self, index: &Value, length: usize, span: Span, scope: &Scope) -> crate::runtime::Signal {
        self.exception(
            INDEX_EXCEPTION,
            format!("Index {} out of bounds for length {}", index, length),
            span,
            scope,
        )
    }
}
