// SyntaxLang Value Types

use super::instance::Instance;
use super::member::Function;
use crate::error::{Span, SyntaxLangError, SyntaxLangResult};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_complex::Complex;
use num_traits::{ToPrimitive, Zero};
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;

pub type BigComplex = Complex<BigDecimal>;

/// Payload of a runtime value. Exactly one tag is active.
#[derive(Clone)]
pub enum ValueKind {
    String(Rc<str>),
    Number(BigDecimal),
    Complex(Rc<BigComplex>),
    Boolean(bool),
    List(Rc<[Value]>),
    Map(Rc<ValueMap>),
    Null,
    Function(Rc<Function>),
    Object(Rc<Instance>),
}

/// Immutable runtime datum plus the position it was produced at.
/// The position never takes part in equality or hashing.
#[derive(Clone)]
pub struct Value {
    kind: ValueKind,
    span: Span,
}

impl Value {
    pub fn new(kind: ValueKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn null() -> Self {
        Self::new(ValueKind::Null, Span::default())
    }

    pub fn string(text: impl Into<Rc<str>>) -> Self {
        Self::new(ValueKind::String(text.into()), Span::default())
    }

    pub fn number(number: BigDecimal) -> Self {
        Self::new(ValueKind::Number(number), Span::default())
    }

    pub fn integer(number: i64) -> Self {
        Self::number(BigDecimal::from(number))
    }

    pub fn complex(complex: BigComplex) -> Self {
        Self::new(ValueKind::Complex(Rc::new(complex)), Span::default())
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(ValueKind::Boolean(value), Span::default())
    }

    pub fn list(values: Vec<Value>) -> Self {
        Self::new(ValueKind::List(values.into()), Span::default())
    }

    pub fn map(map: ValueMap) -> Self {
        Self::new(ValueKind::Map(Rc::new(map)), Span::default())
    }

    pub fn function(function: Rc<Function>) -> Self {
        Self::new(ValueKind::Function(function), Span::default())
    }

    pub fn object(instance: Rc<Instance>) -> Self {
        Self::new(ValueKind::Object(instance), Span::default())
    }

    /// Copy of this value rebound to another source position
    pub fn with_position(&self, span: Span) -> Self {
        Self {
            kind: self.kind.clone(),
            span,
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Tag name; objects report their type's qualified name
    pub fn type_name(&self) -> String {
        match &self.kind {
            ValueKind::String(_) => "String".to_string(),
            ValueKind::Number(_) => "Number".to_string(),
            ValueKind::Complex(_) => "Complex".to_string(),
            ValueKind::Boolean(_) => "Boolean".to_string(),
            ValueKind::List(_) => "List".to_string(),
            ValueKind::Map(_) => "Map".to_string(),
            ValueKind::Null => "Null".to_string(),
            ValueKind::Function(_) => "Function".to_string(),
            ValueKind::Object(instance) => instance.ty().full_name(),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, ValueKind::String(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind, ValueKind::Number(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, ValueKind::Complex(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, ValueKind::Boolean(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, ValueKind::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self.kind, ValueKind::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, ValueKind::Function(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, ValueKind::Object(_))
    }

    pub fn as_string(&self) -> Option<&Rc<str>> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match &self.kind {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&BigComplex> {
        match &self.kind {
            ValueKind::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.kind {
            ValueKind::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match &self.kind {
            ValueKind::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match &self.kind {
            ValueKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<Instance>> {
        match &self.kind {
            ValueKind::Object(instance) => Some(instance),
            _ => None,
        }
    }

    fn mismatch(&self, expected: &str, file: &str) -> SyntaxLangError {
        SyntaxLangError::type_error(
            format!("Expected {}, got {}", expected, self.type_name()),
            self.span,
            file,
        )
    }

    pub fn expect_string(&self, file: &str) -> SyntaxLangResult<&Rc<str>> {
        self.as_string().ok_or_else(|| self.mismatch("String", file))
    }

    pub fn expect_number(&self, file: &str) -> SyntaxLangResult<&BigDecimal> {
        self.as_number().ok_or_else(|| self.mismatch("Number", file))
    }

    pub fn expect_complex(&self, file: &str) -> SyntaxLangResult<&BigComplex> {
        self.as_complex().ok_or_else(|| self.mismatch("Complex", file))
    }

    pub fn expect_boolean(&self, file: &str) -> SyntaxLangResult<bool> {
        self.as_boolean().ok_or_else(|| self.mismatch("Boolean", file))
    }

    pub fn expect_list(&self, file: &str) -> SyntaxLangResult<&[Value]> {
        self.as_list().ok_or_else(|| self.mismatch("List", file))
    }

    pub fn expect_map(&self, file: &str) -> SyntaxLangResult<&ValueMap> {
        self.as_map().ok_or_else(|| self.mismatch("Map", file))
    }

    pub fn expect_function(&self, file: &str) -> SyntaxLangResult<&Rc<Function>> {
        self.as_function().ok_or_else(|| self.mismatch("Function", file))
    }

    pub fn expect_object(&self, file: &str) -> SyntaxLangResult<&Rc<Instance>> {
        self.as_object().ok_or_else(|| self.mismatch("Object", file))
    }

    /// Same tag and equal payload. Unlike `==`, Number 1 and Complex 1+0i differ.
    pub fn identical(&self, other: &Value) -> bool {
        self == other
    }

    /// Value equality used by `==` on primitives: numbers compare across
    /// Number and Complex when the imaginary part is zero
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Complex(b))
            | (ValueKind::Complex(b), ValueKind::Number(a)) => b.im.is_zero() && &b.re == a,
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Null, ValueKind::Null) => true,
            (ValueKind::Boolean(a), ValueKind::Boolean(b)) => a == b,
            (ValueKind::Number(a), ValueKind::Number(b)) => a == b,
            (ValueKind::Complex(a), ValueKind::Complex(b)) => a == b,
            (ValueKind::String(a), ValueKind::String(b)) => Rc::ptr_eq(a, b) || a == b,
            (ValueKind::List(a), ValueKind::List(b)) => Rc::ptr_eq(a, b) || a == b,
            (ValueKind::Map(a), ValueKind::Map(b)) => Rc::ptr_eq(a, b) || a == b,
            (ValueKind::Function(a), ValueKind::Function(b)) => Rc::ptr_eq(a, b),
            (ValueKind::Object(a), ValueKind::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.kind).hash(state);
        match &self.kind {
            ValueKind::Null => {}
            ValueKind::Boolean(b) => b.hash(state),
            // 1 and 1.0 must land in the same slot
            ValueKind::Number(n) => n.normalized().hash(state),
            ValueKind::Complex(c) => {
                c.re.normalized().hash(state);
                c.im.normalized().hash(state);
            }
            ValueKind::String(s) => s.hash(state),
            ValueKind::List(values) => values.hash(state),
            ValueKind::Map(map) => {
                // order-independent, consistent with ValueMap equality
                map.len().hash(state);
            }
            ValueKind::Function(f) => (Rc::as_ptr(f) as usize).hash(state),
            ValueKind::Object(o) => (Rc::as_ptr(o) as usize).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean(b) => write!(f, "{}", b),
            ValueKind::Number(n) => write!(f, "{}", format_number(n)),
            ValueKind::Complex(c) => write!(f, "{}", format_complex(c)),
            ValueKind::String(s) => write!(f, "{}", s),
            ValueKind::List(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            ValueKind::Map(map) => {
                let items: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            ValueKind::Function(function) => write!(f, "<function {}>", function.name()),
            ValueKind::Object(instance) => {
                write!(f, "{}@{:x}", instance.ty().full_name(), instance.identity_hash())
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::String(s) => write!(f, "{:?}", s),
            _ => write!(f, "{}", self),
        }
    }
}

/// Insertion-ordered map keyed by value equality
#[derive(Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
    index: FxHashMap<Value, usize>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous value for the key
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(&slot) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

// Number helpers

pub fn parse_number(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text.trim()).ok()
}

/// Integral value of a number, if it has no fractional part
pub fn to_integer(number: &BigDecimal) -> Option<BigInt> {
    if !number.is_integer() {
        return None;
    }
    Some(number.with_scale(0).into_bigint_and_exponent().0)
}

pub fn from_integer(integer: BigInt) -> BigDecimal {
    BigDecimal::new(integer, 0)
}

pub fn to_index(number: &BigDecimal) -> Option<usize> {
    to_integer(number)?.to_usize()
}

pub fn format_number(number: &BigDecimal) -> String {
    if number.is_integer() {
        number.with_scale(0).to_string()
    } else {
        number.normalized().to_string()
    }
}

pub fn format_complex(complex: &BigComplex) -> String {
    if complex.im < BigDecimal::zero() {
        format!(
            "{}-{}i",
            format_number(&complex.re),
            format_number(&-complex.im.clone())
        )
    } else {
        format!("{}+{}i", format_number(&complex.re), format_number(&complex.im))
    }
}
