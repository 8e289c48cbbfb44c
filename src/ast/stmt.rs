// SyntaxLang Statement AST Nodes

use super::expr::{Expr, FieldDef, TypeRef};
use super::AccessModifier;
use crate::error::Span;
use serde::{Deserialize, Serialize};

/// Function parameter with optional default value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub default: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionModifier {
    Abstract,
    Final,
    Default,
}

/// Named function definition (free function or type member)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    #[serde(default)]
    pub access: AccessModifier,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub modifier: Option<FunctionModifier>,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    /// Name of the trailing `...rest` parameter
    #[serde(default)]
    pub variadic: Option<String>,
    /// None for bodyless (abstract or interface) functions
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassModifier {
    Abstract,
    Final,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(default)]
    pub access: AccessModifier,
    #[serde(default)]
    pub cloneable: bool,
    #[serde(default)]
    pub modifier: Option<ClassModifier>,
    pub name: String,
    #[serde(default)]
    pub extends: Option<TypeRef>,
    #[serde(default)]
    pub implements: Vec<TypeRef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    #[serde(default)]
    pub span: Span,
}

/// Enum constant: NAME(args)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumConstantDef {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    #[serde(default)]
    pub access: AccessModifier,
    pub name: String,
    #[serde(default)]
    pub implements: Vec<TypeRef>,
    pub constants: Vec<EnumConstantDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDef {
    #[serde(default)]
    pub access: AccessModifier,
    pub name: String,
    #[serde(default)]
    pub extends: Vec<TypeRef>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    #[serde(default)]
    pub span: Span,
}

/// One `if`/`elif` arm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

/// Statement nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Stmt {
    /// Expression statement: foo()
    Expression { expr: Expr },

    /// Block: { statements }
    Block {
        statements: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },

    /// Empty statement: ;
    Empty {
        #[serde(default)]
        span: Span,
    },

    If {
        branches: Vec<IfBranch>,
        #[serde(default)]
        else_branch: Option<Vec<Stmt>>,
        #[serde(default)]
        span: Span,
    },

    /// for (init; condition; update) body
    For {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        init: Vec<FieldDef>,
        #[serde(default)]
        condition: Option<Expr>,
        #[serde(default)]
        update: Vec<Expr>,
        body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },

    /// for (variable : iterable) body
    Foreach {
        #[serde(default)]
        label: Option<String>,
        variable: String,
        iterable: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },

    While {
        #[serde(default)]
        label: Option<String>,
        condition: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },

    DoWhile {
        #[serde(default)]
        label: Option<String>,
        body: Vec<Stmt>,
        condition: Expr,
        #[serde(default)]
        span: Span,
    },

    TryCatch {
        body: Vec<Stmt>,
        variable: String,
        handler: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },

    Return {
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        span: Span,
    },

    Yield {
        value: Expr,
        #[serde(default)]
        span: Span,
    },

    Break {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        span: Span,
    },

    Continue {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        span: Span,
    },

    Namespace {
        name: String,
        #[serde(default)]
        span: Span,
    },

    Import {
        path: String,
        #[serde(default)]
        span: Span,
    },

    /// use namespace as alias
    UseAs {
        namespace: String,
        alias: String,
        #[serde(default)]
        span: Span,
    },

    Function(FunctionDef),
    Class(ClassDef),
    Enum(EnumDef),
    Interface(InterfaceDef),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expression { expr } => expr.span(),
            Stmt::Block { span, .. } => *span,
            Stmt::Empty { span } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::For { span, .. } => *span,
            Stmt::Foreach { span, .. } => *span,
            Stmt::While { span, .. } => *span,
            Stmt::DoWhile { span, .. } => *span,
            Stmt::TryCatch { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::Yield { span, .. } => *span,
            Stmt::Break { span, .. } => *span,
            Stmt::Continue { span, .. } => *span,
            Stmt::Namespace { span, .. } => *span,
            Stmt::Import { span, .. } => *span,
            Stmt::UseAs { span, .. } => *span,
            Stmt::Function(def) => def.span,
            Stmt::Class(def) => def.span,
            Stmt::Enum(def) => def.span,
            Stmt::Interface(def) => def.span,
        }
    }
}

/// One parsed source unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    /// Raw source text, when the front end ships it, for diagnostics
    #[serde(default)]
    pub source: Option<String>,
}
