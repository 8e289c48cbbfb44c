// SyntaxLang AST construction helpers
// Shorthand for hosts and tests that assemble statement trees in code.
// Every node gets a default span.

use super::*;
use crate::error::Span;

pub fn program(statements: Vec<Stmt>) -> Program {
    Program {
        statements,
        source: None,
    }
}

pub fn num(text: &str) -> Expr {
    literal(Literal::Number(text.to_string()))
}

pub fn imaginary(text: &str) -> Expr {
    literal(Literal::Imaginary(text.to_string()))
}

pub fn string(text: &str) -> Expr {
    literal(Literal::String(text.to_string()))
}

pub fn boolean(value: bool) -> Expr {
    literal(Literal::Boolean(value))
}

pub fn null() -> Expr {
    literal(Literal::Null)
}

fn literal(value: Literal) -> Expr {
    Expr::Literal {
        value,
        span: Span::default(),
    }
}

pub fn ident(name: &str) -> Expr {
    Expr::Identifier {
        name: name.to_string(),
        span: Span::default(),
    }
}

pub fn scoped(namespace: &str, name: &str) -> Expr {
    Expr::Scoped {
        namespace: namespace.to_string(),
        name: name.to_string(),
        span: Span::default(),
    }
}

pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span: Span::default(),
    }
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        prefix: true,
        operand: Box::new(operand),
        span: Span::default(),
    }
}

pub fn postfix(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        prefix: false,
        operand: Box::new(operand),
        span: Span::default(),
    }
}

pub fn ternary(condition: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
    Expr::Ternary {
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
        span: Span::default(),
    }
}

pub fn type_ref(name: &str) -> TypeRef {
    TypeRef {
        namespace: None,
        name: name.to_string(),
        span: Span::default(),
    }
}

pub fn scoped_type_ref(namespace: &str, name: &str) -> TypeRef {
    TypeRef {
        namespace: Some(namespace.to_string()),
        name: name.to_string(),
        span: Span::default(),
    }
}

pub fn instance_of(value: Expr, type_ref: TypeRef) -> Expr {
    Expr::InstanceOf {
        value: Box::new(value),
        type_ref,
        span: Span::default(),
    }
}

pub fn new(type_ref: TypeRef, args: Vec<Expr>) -> Expr {
    Expr::New {
        type_ref,
        args,
        span: Span::default(),
    }
}

pub fn clone(value: Expr) -> Expr {
    Expr::Clone {
        value: Box::new(value),
        span: Span::default(),
    }
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
        span: Span::default(),
    }
}

pub fn member(target: Expr, name: &str) -> Expr {
    Expr::Member {
        target: Box::new(target),
        name: name.to_string(),
        span: Span::default(),
    }
}

/// target.name(args)
pub fn method(target: Expr, name: &str, args: Vec<Expr>) -> Expr {
    call(member(target, name), args)
}

pub fn index(target: Expr, index: Expr) -> Expr {
    Expr::Index {
        target: Box::new(target),
        index: Box::new(index),
        span: Span::default(),
    }
}

pub fn list(elements: Vec<Expr>) -> Expr {
    Expr::List {
        elements,
        span: Span::default(),
    }
}

pub fn map(entries: Vec<(Expr, Expr)>) -> Expr {
    Expr::Map {
        entries: entries
            .into_iter()
            .map(|(key, value)| MapEntry { key, value })
            .collect(),
        span: Span::default(),
    }
}

pub fn lambda(params: &[&str], body: Vec<Stmt>) -> Expr {
    Expr::Function {
        params: params.iter().map(|name| param(name)).collect(),
        variadic: None,
        body,
        span: Span::default(),
    }
}

pub fn throw(value: Expr) -> Expr {
    Expr::Throw {
        value: Box::new(value),
        span: Span::default(),
    }
}

/// name = value
pub fn declare(name: &str, value: Expr) -> Expr {
    Expr::VarDecl {
        def: field(name, value),
    }
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    assign_op(target, AssignOp::Assign, value)
}

pub fn assign_op(target: Expr, op: AssignOp, value: Expr) -> Expr {
    Expr::Assign {
        target: Box::new(target),
        op,
        value: Box::new(value),
        span: Span::default(),
    }
}

pub fn switch(discriminant: Expr, cases: Vec<SwitchCase>) -> Expr {
    Expr::Switch {
        discriminant: Box::new(discriminant),
        cases,
        span: Span::default(),
    }
}

/// case guard: statements
pub fn case(guard: Expr, statements: Vec<Stmt>) -> SwitchCase {
    SwitchCase {
        guard: Some(guard),
        body: CaseBody::Statements { statements },
        span: Span::default(),
    }
}

/// default: statements
pub fn default_case(statements: Vec<Stmt>) -> SwitchCase {
    SwitchCase {
        guard: None,
        body: CaseBody::Statements { statements },
        span: Span::default(),
    }
}

/// case guard -> value (None guard for `default ->`)
pub fn arrow(guard: Option<Expr>, value: Expr) -> SwitchCase {
    SwitchCase {
        guard,
        body: CaseBody::Value { value },
        span: Span::default(),
    }
}

// Statements

pub fn expr(expr: Expr) -> Stmt {
    Stmt::Expression { expr }
}

pub fn block(statements: Vec<Stmt>) -> Stmt {
    Stmt::Block {
        statements,
        span: Span::default(),
    }
}

pub fn if_else(condition: Expr, body: Vec<Stmt>, else_branch: Option<Vec<Stmt>>) -> Stmt {
    Stmt::If {
        branches: vec![IfBranch { condition, body }],
        else_branch,
        span: Span::default(),
    }
}

pub fn while_loop(label: Option<&str>, condition: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While {
        label: label.map(String::from),
        condition,
        body,
        span: Span::default(),
    }
}

pub fn do_while(label: Option<&str>, body: Vec<Stmt>, condition: Expr) -> Stmt {
    Stmt::DoWhile {
        label: label.map(String::from),
        body,
        condition,
        span: Span::default(),
    }
}

pub fn for_loop(
    label: Option<&str>,
    init: Vec<FieldDef>,
    condition: Option<Expr>,
    update: Vec<Expr>,
    body: Vec<Stmt>,
) -> Stmt {
    Stmt::For {
        label: label.map(String::from),
        init,
        condition,
        update,
        body,
        span: Span::default(),
    }
}

pub fn foreach(label: Option<&str>, variable: &str, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::Foreach {
        label: label.map(String::from),
        variable: variable.to_string(),
        iterable,
        body,
        span: Span::default(),
    }
}

pub fn try_catch(body: Vec<Stmt>, variable: &str, handler: Vec<Stmt>) -> Stmt {
    Stmt::TryCatch {
        body,
        variable: variable.to_string(),
        handler,
        span: Span::default(),
    }
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return {
        value,
        span: Span::default(),
    }
}

pub fn yield_value(value: Expr) -> Stmt {
    Stmt::Yield {
        value,
        span: Span::default(),
    }
}

pub fn brk(label: Option<&str>) -> Stmt {
    Stmt::Break {
        label: label.map(String::from),
        span: Span::default(),
    }
}

pub fn cont(label: Option<&str>) -> Stmt {
    Stmt::Continue {
        label: label.map(String::from),
        span: Span::default(),
    }
}

pub fn namespace(name: &str) -> Stmt {
    Stmt::Namespace {
        name: name.to_string(),
        span: Span::default(),
    }
}

pub fn import(path: &str) -> Stmt {
    Stmt::Import {
        path: path.to_string(),
        span: Span::default(),
    }
}

pub fn use_as(namespace: &str, alias: &str) -> Stmt {
    Stmt::UseAs {
        namespace: namespace.to_string(),
        alias: alias.to_string(),
        span: Span::default(),
    }
}

// Declarations

pub fn param(name: &str) -> Param {
    Param {
        name: name.to_string(),
        default: None,
        span: Span::default(),
    }
}

pub fn field(name: &str, value: Expr) -> FieldDef {
    FieldDef {
        access: AccessModifier::Default,
        is_static: false,
        is_final: false,
        name: name.to_string(),
        value: Box::new(value),
        span: Span::default(),
    }
}

pub fn function(name: &str, params: &[&str], body: Vec<Stmt>) -> FunctionDef {
    FunctionDef {
        access: AccessModifier::Default,
        is_static: false,
        modifier: None,
        name: name.to_string(),
        params: params.iter().map(|name| param(name)).collect(),
        variadic: None,
        body: Some(body),
        span: Span::default(),
    }
}

/// Bodyless function, as declared in interfaces
pub fn signature(name: &str, params: &[&str]) -> FunctionDef {
    FunctionDef {
        body: None,
        ..function(name, params, Vec::new())
    }
}

pub fn class(name: &str) -> ClassDef {
    ClassDef {
        access: AccessModifier::Default,
        cloneable: false,
        modifier: None,
        name: name.to_string(),
        extends: None,
        implements: Vec::new(),
        fields: Vec::new(),
        functions: Vec::new(),
        span: Span::default(),
    }
}

pub fn interface(name: &str) -> InterfaceDef {
    InterfaceDef {
        access: AccessModifier::Default,
        name: name.to_string(),
        extends: Vec::new(),
        functions: Vec::new(),
        span: Span::default(),
    }
}

pub fn enumeration(name: &str, constants: Vec<EnumConstantDef>) -> EnumDef {
    EnumDef {
        access: AccessModifier::Default,
        name: name.to_string(),
        implements: Vec::new(),
        constants,
        fields: Vec::new(),
        functions: Vec::new(),
        span: Span::default(),
    }
}

pub fn constant(name: &str, args: Vec<Expr>) -> EnumConstantDef {
    EnumConstantDef {
        name: name.to_string(),
        args,
        span: Span::default(),
    }
}
