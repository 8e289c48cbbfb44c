// SyntaxLang operator hooks
// Reserved member names that overload operators and built-in conversions

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{ErrorKind, SyntaxLangError};
use crate::instruction::FunctionTemplate;
use super::scope::Scope;

/// Members reserved on every enum
pub const ENUM_RESERVED: [&str; 4] = ["name", "ordinal", "values", "valueOf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    // binary
    Equ,
    Ieq,
    And,
    Or,
    Lss,
    Leq,
    Gtr,
    Geq,
    Idx,
    BitAnd,
    Xor,
    BitOr,
    Lsh,
    Rsh,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // unary
    Inc,
    Dec,
    Plus,
    Minus,
    Not,
    Compl,
    // conversions
    Clone,
    Hashcode,
    String,
    Number,
    Complex,
    Boolean,
}

/// Result tag a conversion hook must produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    String,
    Number,
    Complex,
    Boolean,
    Object,
}

const ALL: [Hook; 32] = [
    Hook::Equ,
    Hook::Ieq,
    Hook::And,
    Hook::Or,
    Hook::Lss,
    Hook::Leq,
    Hook::Gtr,
    Hook::Geq,
    Hook::Idx,
    Hook::BitAnd,
    Hook::Xor,
    Hook::BitOr,
    Hook::Lsh,
    Hook::Rsh,
    Hook::Add,
    Hook::Sub,
    Hook::Mul,
    Hook::Div,
    Hook::Mod,
    Hook::Pow,
    Hook::Inc,
    Hook::Dec,
    Hook::Plus,
    Hook::Minus,
    Hook::Not,
    Hook::Compl,
    Hook::Clone,
    Hook::Hashcode,
    Hook::String,
    Hook::Number,
    Hook::Complex,
    Hook::Boolean,
];

impl Hook {
    pub fn name(&self) -> &'static str {
        match self {
            Hook::Equ => "__equ",
            Hook::Ieq => "__ieq",
            Hook::And => "__and",
            Hook::Or => "__or",
            Hook::Lss => "__lss",
            Hook::Leq => "__leq",
            Hook::Gtr => "__gtr",
            Hook::Geq => "__geq",
            Hook::Idx => "__idx",
            Hook::BitAnd => "__bitand",
            Hook::Xor => "__xor",
            Hook::BitOr => "__bitor",
            Hook::Lsh => "__lsh",
            Hook::Rsh => "__rsh",
            Hook::Add => "__add",
            Hook::Sub => "__sub",
            Hook::Mul => "__mul",
            Hook::Div => "__div",
            Hook::Mod => "__mod",
            Hook::Pow => "__pow",
            Hook::Inc => "__inc",
            Hook::Dec => "__dec",
            Hook::Plus => "__plus",
            Hook::Minus => "__minus",
            Hook::Not => "__not",
            Hook::Compl => "__compl",
            Hook::Clone => "__clone",
            Hook::Hashcode => "__hashcode",
            Hook::String => "__string",
            Hook::Number => "__number",
            Hook::Complex => "__complex",
            Hook::Boolean => "__boolean",
        }
    }

    pub fn from_name(name: &str) -> Option<Hook> {
        ALL.iter().copied().find(|hook| hook.name() == name)
    }

    /// Binary hooks take the right operand, all others take nothing
    pub fn arity(&self) -> usize {
        match self {
            Hook::Equ
            | Hook::Ieq
            | Hook::And
            | Hook::Or
            | Hook::Lss
            | Hook::Leq
            | Hook::Gtr
            | Hook::Geq
            | Hook::Idx
            | Hook::BitAnd
            | Hook::Xor
            | Hook::BitOr
            | Hook::Lsh
            | Hook::Rsh
            | Hook::Add
            | Hook::Sub
            | Hook::Mul
            | Hook::Div
            | Hook::Mod
            | Hook::Pow => 1,
            _ => 0,
        }
    }

    /// Result type enforced for conversion hooks
    pub fn conversion(&self) -> Option<Conversion> {
        match self {
            Hook::String => Some(Conversion::String),
            Hook::Number | Hook::Hashcode => Some(Conversion::Number),
            Hook::Complex => Some(Conversion::Complex),
            Hook::Boolean => Some(Conversion::Boolean),
            Hook::Clone => Some(Conversion::Object),
            _ => None,
        }
    }

    /// Hook overloading a binary operator. `!=`/`!==` negate `__equ`/`__ieq`.
    pub fn for_binary(op: BinaryOp) -> Hook {
        match op {
            BinaryOp::Equal | BinaryOp::NotEqual => Hook::Equ,
            BinaryOp::Identical | BinaryOp::NotIdentical => Hook::Ieq,
            BinaryOp::And => Hook::And,
            BinaryOp::Or => Hook::Or,
            BinaryOp::Less => Hook::Lss,
            BinaryOp::LessEqual => Hook::Leq,
            BinaryOp::Greater => Hook::Gtr,
            BinaryOp::GreaterEqual => Hook::Geq,
            BinaryOp::BitAnd => Hook::BitAnd,
            BinaryOp::BitXor => Hook::Xor,
            BinaryOp::BitOr => Hook::BitOr,
            BinaryOp::LeftShift => Hook::Lsh,
            BinaryOp::RightShift => Hook::Rsh,
            BinaryOp::Add => Hook::Add,
            BinaryOp::Sub => Hook::Sub,
            BinaryOp::Mul => Hook::Mul,
            BinaryOp::Div => Hook::Div,
            BinaryOp::Mod => Hook::Mod,
            BinaryOp::Power => Hook::Pow,
        }
    }

    pub fn for_unary(op: UnaryOp) -> Hook {
        match op {
            UnaryOp::Increment => Hook::Inc,
            UnaryOp::Decrement => Hook::Dec,
            UnaryOp::Plus => Hook::Plus,
            UnaryOp::Minus => Hook::Minus,
            UnaryOp::Not => Hook::Not,
            UnaryOp::Complement => Hook::Compl,
        }
    }
}

impl Conversion {
    pub fn type_name(&self) -> &'static str {
        match self {
            Conversion::String => "String",
            Conversion::Number => "Number",
            Conversion::Complex => "Complex",
            Conversion::Boolean => "Boolean",
            Conversion::Object => "Object",
        }
    }
}

/// Declaration-time checks for a function declared in a type body
pub fn check_declaration(
    function: &FunctionTemplate,
    owner: &str,
    cloneable: bool,
    is_enum: bool,
    scope: &Scope,
) -> Result<(), SyntaxLangError> {
    if is_enum && ENUM_RESERVED.contains(&function.name.as_ref()) {
        return Err(scope.error(
            ErrorKind::InvalidHook,
            format!("{} is reserved in enum {}", function.name, owner),
            function.span,
        ));
    }
    let Some(hook) = Hook::from_name(&function.name) else {
        return Ok(());
    };
    if function.is_static {
        return Err(scope.error(
            ErrorKind::InvalidHook,
            format!("Hook {} in {} cannot be static", hook.name(), owner),
            function.span,
        ));
    }
    if function.arity() != hook.arity() || function.variadic.is_some() {
        return Err(scope.error(
            ErrorKind::InvalidHook,
            format!(
                "Hook {} in {} must take exactly {} parameter{}",
                hook.name(),
                owner,
                hook.arity(),
                if hook.arity() == 1 { "" } else { "s" }
            ),
            function.span,
        ));
    }
    if hook == Hook::Clone && !cloneable {
        return Err(scope.error(
            ErrorKind::InvalidHook,
            format!("{} is not cloneable and cannot declare __clone", owner),
            function.span,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_names_round_trip() {
        for hook in ALL {
            assert_eq!(Hook::from_name(hook.name()), Some(hook));
        }
        assert_eq!(Hook::from_name("__unknown"), None);
    }

    #[test]
    fn test_arity_split() {
        assert_eq!(Hook::Add.arity(), 1);
        assert_eq!(Hook::Idx.arity(), 1);
        assert_eq!(Hook::Inc.arity(), 0);
        assert_eq!(Hook::String.arity(), 0);
    }

    #[test]
    fn test_negated_operators_share_hooks() {
        assert_eq!(Hook::for_binary(BinaryOp::NotEqual), Hook::Equ);
        assert_eq!(Hook::for_binary(BinaryOp::NotIdentical), Hook::Ieq);
        assert_eq!(Hook::for_unary(UnaryOp::Complement), Hook::Compl);
    }

    #[test]
    fn test_conversion_targets() {
        assert_eq!(Hook::Hashcode.conversion(), Some(Conversion::Number));
        assert_eq!(Hook::Clone.conversion(), Some(Conversion::Object));
        assert_eq!(Hook::Add.conversion(), None);
    }
}
