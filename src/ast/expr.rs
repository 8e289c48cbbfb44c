// SyntaxLang Expression AST Nodes

use super::stmt::{Param, Stmt};
use crate::error::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "===")]
    Identical,
    #[serde(rename = "!==")]
    NotIdentical,

    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,

    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterEqual,

    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "<<")]
    LeftShift,
    #[serde(rename = ">>")]
    RightShift,

    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Power,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Power => "**",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    Complement,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Increment => "++",
            UnaryOp::Decrement => "--",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::Complement => "~",
        }
    }

    /// `++` and `--` write back to their operand
    pub fn is_update(&self) -> bool {
        matches!(self, UnaryOp::Increment | UnaryOp::Decrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    ModAssign,
    #[serde(rename = "**=")]
    PowerAssign,
    #[serde(rename = "<<=")]
    LeftShiftAssign,
    #[serde(rename = ">>=")]
    RightShiftAssign,
    #[serde(rename = "&=")]
    BitAndAssign,
    #[serde(rename = "^=")]
    BitXorAssign,
    #[serde(rename = "|=")]
    BitOrAssign,
}

impl AssignOp {
    pub fn is_compound(&self) -> bool {
        !matches!(self, AssignOp::Assign)
    }

    /// The binary operator a compound assignment applies
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::ModAssign => Some(BinaryOp::Mod),
            AssignOp::PowerAssign => Some(BinaryOp::Power),
            AssignOp::LeftShiftAssign => Some(BinaryOp::LeftShift),
            AssignOp::RightShiftAssign => Some(BinaryOp::RightShift),
            AssignOp::BitAndAssign => Some(BinaryOp::BitAnd),
            AssignOp::BitXorAssign => Some(BinaryOp::BitXor),
            AssignOp::BitOrAssign => Some(BinaryOp::BitOr),
        }
    }
}

/// Literal tokens. Numbers stay textual until the instruction builder
/// parses them into arbitrary-precision decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Number(String),
    /// Imaginary literal such as `2i`, holding the imaginary part
    Imaginary(String),
    Boolean(bool),
    Null,
}

/// Reference to a type, optionally qualified: `ns\Name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}\\{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Map literal entry: `key: value`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

/// Body of a switch case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum CaseBody {
    /// `case x: statements` (falls through)
    Statements { statements: Vec<Stmt> },
    /// `case x -> expr`
    Value { value: Expr },
}

/// Switch case; a missing guard marks the `default` case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub guard: Option<Expr>,
    pub body: CaseBody,
    #[serde(default)]
    pub span: Span,
}

/// Expression nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
        #[serde(default)]
        span: Span,
    },

    Identifier {
        name: String,
        #[serde(default)]
        span: Span,
    },

    /// Namespace-qualified name: `ns\Name`
    Scoped {
        namespace: String,
        name: String,
        #[serde(default)]
        span: Span,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    Unary {
        op: UnaryOp,
        #[serde(default = "default_prefix")]
        prefix: bool,
        operand: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    /// cond ? a : b
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    InstanceOf {
        value: Box<Expr>,
        type_ref: TypeRef,
        #[serde(default)]
        span: Span,
    },

    /// new Name(args)
    New {
        type_ref: TypeRef,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },

    /// clone expr
    Clone {
        value: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    Call {
        callee: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },

    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    Member {
        target: Box<Expr>,
        name: String,
        #[serde(default)]
        span: Span,
    },

    List {
        #[serde(default)]
        elements: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },

    Map {
        #[serde(default)]
        entries: Vec<MapEntry>,
        #[serde(default)]
        span: Span,
    },

    /// Anonymous function: fun(a, b) { ... }
    Function {
        #[serde(default)]
        params: Vec<Param>,
        #[serde(default)]
        variadic: Option<String>,
        body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },

    Switch {
        discriminant: Box<Expr>,
        cases: Vec<SwitchCase>,
        #[serde(default)]
        span: Span,
    },

    Throw {
        value: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    /// Declaration: [modifiers] name = value
    VarDecl { def: FieldDef },

    /// Assignment to a variable or member: target op= value
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
}

fn default_prefix() -> bool {
    true
}

/// Variable declaration; also used for class and enum fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(default)]
    pub access: super::AccessModifier,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    pub name: String,
    pub value: Box<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl FieldDef {
    /// Declarations without modifiers may assign to an existing variable
    pub fn has_modifiers(&self) -> bool {
        self.access != super::AccessModifier::Default || self.is_static || self.is_final
    }
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. } => *span,
            Expr::Identifier { span, .. } => *span,
            Expr::Scoped { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Ternary { span, .. } => *span,
            Expr::InstanceOf { span, .. } => *span,
            Expr::New { span, .. } => *span,
            Expr::Clone { span, .. } => *span,
            Expr::Call { span, .. } => *span,
            Expr::Index { span, .. } => *span,
            Expr::Member { span, .. } => *span,
            Expr::List { span, .. } => *span,
            Expr::Map { span, .. } => *span,
            Expr::Function { span, .. } => *span,
            Expr::Switch { span, .. } => *span,
            Expr::Throw { span, .. } => *span,
            Expr::VarDecl { def } => def.span,
            Expr::Assign { span, .. } => *span,
        }
    }

    /// Short node name used by tree dumps and diagnostics
    pub fn node_name(&self) -> &'static str {
        match self {
            Expr::Literal { .. } => "Literal",
            Expr::Identifier { .. } => "Identifier",
            Expr::Scoped { .. } => "Scoped",
            Expr::Binary { .. } => "Binary",
            Expr::Unary { .. } => "Unary",
            Expr::Ternary { .. } => "Ternary",
            Expr::InstanceOf { .. } => "InstanceOf",
            Expr::New { .. } => "New",
            Expr::Clone { .. } => "Clone",
            Expr::Call { .. } => "Call",
            Expr::Index { .. } => "Index",
            Expr::Member { .. } => "Member",
            Expr::List { .. } => "List",
            Expr::Map { .. } => "Map",
            Expr::Function { .. } => "Function",
            Expr::Switch { .. } => "Switch",
            Expr::Throw { .. } => "Throw",
            Expr::VarDecl { .. } => "VarDecl",
            Expr::Assign { .. } => "Assign",
        }
    }
}
