// SyntaxLang Instruction Module
// Executable nodes built 1:1 from the statement tree

mod builder;

pub use builder::build_program;

use crate::ast::{
    AccessModifier, AssignOp, BinaryOp, ClassModifier, FunctionModifier, TypeRef, UnaryOp,
};
use crate::error::Span;
use crate::runtime::Value;
use std::cell::OnceCell;
use std::rc::Rc;

/// Ordered instruction list executed in its own child scope
#[derive(Debug)]
pub struct Block {
    pub instructions: Vec<Instruction>,
    pub span: Span,
}

/// Binary operation. Literal-literal nodes fold once and keep the result.
#[derive(Debug)]
pub struct BinaryInstruction {
    pub left: Instruction,
    pub op: BinaryOp,
    pub right: Instruction,
    pub span: Span,
    folded: OnceCell<Value>,
}

impl BinaryInstruction {
    pub fn new(left: Instruction, op: BinaryOp, right: Instruction, span: Span) -> Self {
        Self {
            left,
            op,
            right,
            span,
            folded: OnceCell::new(),
        }
    }

    /// Both operands are literals, so the result never changes
    pub fn is_constant(&self) -> bool {
        matches!(self.left, Instruction::Literal { .. })
            && matches!(self.right, Instruction::Literal { .. })
    }

    /// Cached result of a constant operation, once computed
    pub fn folded(&self) -> Option<&Value> {
        self.folded.get()
    }

    pub(crate) fn fold(&self, value: Value) -> &Value {
        self.folded.get_or_init(|| value)
    }
}

#[derive(Debug)]
pub struct ParamTemplate {
    pub name: Rc<str>,
    pub default: Option<Instruction>,
    pub span: Span,
}

/// Declaration of a free function, method, or anonymous function
#[derive(Debug)]
pub struct FunctionTemplate {
    pub name: Rc<str>,
    pub access: AccessModifier,
    pub is_static: bool,
    pub modifier: Option<FunctionModifier>,
    pub params: Vec<ParamTemplate>,
    pub variadic: Option<Rc<str>>,
    pub body: Option<Block>,
    pub span: Span,
}

impl FunctionTemplate {
    pub const ANONYMOUS: &'static str = "<anonymous>";

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_abstract(&self) -> bool {
        self.modifier == Some(FunctionModifier::Abstract)
    }

    pub fn is_final(&self) -> bool {
        self.modifier == Some(FunctionModifier::Final)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.as_ref() == Self::ANONYMOUS
    }

    /// Declared parameter count; a variadic tail is not counted
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Variable declaration or type field
#[derive(Debug)]
pub struct FieldTemplate {
    pub name: Rc<str>,
    pub access: AccessModifier,
    pub is_static: bool,
    pub is_final: bool,
    pub value: Instruction,
    pub span: Span,
}

impl FieldTemplate {
    pub fn has_modifiers(&self) -> bool {
        self.access != AccessModifier::Default || self.is_static || self.is_final
    }
}

#[derive(Debug)]
pub struct ConstantTemplate {
    pub name: Rc<str>,
    pub args: Vec<Instruction>,
    pub span: Span,
}

/// Variant-specific part of a type declaration
#[derive(Debug)]
pub enum TypeShape {
    Class {
        cloneable: bool,
        modifier: Option<ClassModifier>,
        extends: Option<TypeRef>,
        implements: Vec<TypeRef>,
    },
    Interface {
        extends: Vec<TypeRef>,
    },
    Enum {
        implements: Vec<TypeRef>,
        constants: Vec<ConstantTemplate>,
    },
}

/// Class, interface, or enum declaration
#[derive(Debug)]
pub struct TypeTemplate {
    pub name: Rc<str>,
    pub access: AccessModifier,
    pub fields: Vec<Rc<FieldTemplate>>,
    pub functions: Vec<Rc<FunctionTemplate>>,
    pub shape: TypeShape,
    pub span: Span,
}

#[derive(Debug)]
pub enum CaseInstruction {
    Statements(Vec<Instruction>),
    Value(Instruction),
}

#[derive(Debug)]
pub struct SwitchCaseInstruction {
    pub guard: Option<Instruction>,
    pub body: CaseInstruction,
    pub span: Span,
}

#[derive(Debug)]
pub struct SwitchInstruction {
    pub discriminant: Instruction,
    pub cases: Vec<SwitchCaseInstruction>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ForInstruction {
    pub label: Option<Rc<str>>,
    pub init: Vec<Rc<FieldTemplate>>,
    pub condition: Option<Instruction>,
    pub update: Vec<Instruction>,
    pub body: Block,
    pub span: Span,
}

/// `while` and `do ... while`
#[derive(Debug)]
pub struct WhileInstruction {
    pub label: Option<Rc<str>>,
    pub condition: Instruction,
    pub body: Block,
    pub test_first: bool,
    pub span: Span,
}

#[derive(Debug)]
pub struct ForeachInstruction {
    pub label: Option<Rc<str>>,
    pub variable: Rc<str>,
    pub iterable: Instruction,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug)]
pub struct TryCatchInstruction {
    pub body: Block,
    pub variable: Rc<str>,
    pub handler: Block,
    pub span: Span,
}

#[derive(Debug)]
pub enum Instruction {
    Empty {
        span: Span,
    },
    Literal {
        value: Value,
        span: Span,
    },
    Identifier {
        name: Rc<str>,
        span: Span,
    },
    Scoped {
        namespace: Rc<str>,
        name: Rc<str>,
        span: Span,
    },
    Block(Block),
    Binary(Box<BinaryInstruction>),
    Unary {
        op: UnaryOp,
        prefix: bool,
        operand: Box<Instruction>,
        span: Span,
    },
    Ternary {
        condition: Box<Instruction>,
        then_branch: Box<Instruction>,
        else_branch: Box<Instruction>,
        span: Span,
    },
    InstanceOf {
        value: Box<Instruction>,
        type_ref: TypeRef,
        span: Span,
    },
    New {
        type_ref: TypeRef,
        args: Vec<Instruction>,
        span: Span,
    },
    Clone {
        value: Box<Instruction>,
        span: Span,
    },
    Call {
        callee: Box<Instruction>,
        args: Vec<Instruction>,
        span: Span,
    },
    Index {
        target: Box<Instruction>,
        index: Box<Instruction>,
        span: Span,
    },
    Member {
        target: Box<Instruction>,
        name: Rc<str>,
        span: Span,
    },
    List {
        elements: Vec<Instruction>,
        span: Span,
    },
    Map {
        entries: Vec<(Instruction, Instruction)>,
        span: Span,
    },
    /// Anonymous function expression
    Function(Rc<FunctionTemplate>),
    Switch(Box<SwitchInstruction>),
    Throw {
        value: Box<Instruction>,
        span: Span,
    },
    Declare(Rc<FieldTemplate>),
    Assign {
        target: Box<Instruction>,
        op: AssignOp,
        value: Box<Instruction>,
        span: Span,
    },
    If {
        branches: Vec<(Instruction, Block)>,
        otherwise: Option<Block>,
        span: Span,
    },
    For(Box<ForInstruction>),
    While(Box<WhileInstruction>),
    Foreach(Box<ForeachInstruction>),
    TryCatch(Box<TryCatchInstruction>),
    Return {
        value: Option<Box<Instruction>>,
        span: Span,
    },
    Yield {
        value: Box<Instruction>,
        span: Span,
    },
    Break {
        label: Option<Rc<str>>,
        span: Span,
    },
    Continue {
        label: Option<Rc<str>>,
        span: Span,
    },
    Namespace {
        name: Rc<str>,
        span: Span,
    },
    Import {
        path: Rc<str>,
        span: Span,
    },
    UseAs {
        namespace: Rc<str>,
        alias: Rc<str>,
        span: Span,
    },
    DeclareFunction(Rc<FunctionTemplate>),
    DeclareType(Rc<TypeTemplate>),
}

impl Instruction {
    pub fn span(&self) -> Span {
        match self {
            Instruction::Empty { span }
            | Instruction::Literal { span, .. }
            | Instruction::Identifier { span, .. }
            | Instruction::Scoped { span, .. }
            | Instruction::Unary { span, .. }
            | Instruction::Ternary { span, .. }
            | Instruction::InstanceOf { span, .. }
            | Instruction::New { span, .. }
            | Instruction::Clone { span, .. }
            | Instruction::Call { span, .. }
            | Instruction::Index { span, .. }
            | Instruction::Member { span, .. }
            | Instruction::List { span, .. }
            | Instruction::Map { span, .. }
            | Instruction::Throw { span, .. }
            | Instruction::Assign { span, .. }
            | Instruction::If { span, .. }
            | Instruction::Return { span, .. }
            | Instruction::Yield { span, .. }
            | Instruction::Break { span, .. }
            | Instruction::Continue { span, .. }
            | Instruction::Namespace { span, .. }
            | Instruction::Import { span, .. }
            | Instruction::UseAs { span, .. } => *span,
            Instruction::Block(block) => block.span,
            Instruction::Binary(binary) => binary.span,
            Instruction::Function(template) | Instruction::DeclareFunction(template) => {
                template.span
            }
            Instruction::Switch(switch) => switch.span,
            Instruction::Declare(field) => field.span,
            Instruction::For(for_loop) => for_loop.span,
            Instruction::While(while_loop) => while_loop.span,
            Instruction::Foreach(foreach) => foreach.span,
            Instruction::TryCatch(try_catch) => try_catch.span,
            Instruction::DeclareType(template) => template.span,
        }
    }

    /// Declarations hoisted before the statements of their block run
    pub fn is_hoisted(&self) -> bool {
        matches!(
            self,
            Instruction::DeclareFunction(_) | Instruction::DeclareType(_)
        )
    }
}
