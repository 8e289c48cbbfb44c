// Statement tree -> instruction translation

use super::*;
use crate::ast::{
    CaseBody, ClassDef, EnumDef, Expr, FieldDef, FunctionDef, InterfaceDef, Literal, Param,
    Program, Stmt, SwitchCase,
};
use crate::error::{ErrorKind, SyntaxLangError, SyntaxLangResult};
use crate::runtime::value::{parse_number, BigComplex};
use bigdecimal::BigDecimal;
use num_traits::Zero;

/// Build the instruction list for one source unit
pub fn build_program(program: &Program, file: &str) -> SyntaxLangResult<Vec<Instruction>> {
    let builder = Builder { file };
    builder.statements(&program.statements)
}

struct Builder<'a> {
    file: &'a str,
}

impl<'a> Builder<'a> {
    fn error(&self, message: impl Into<String>, span: Span) -> SyntaxLangError {
        SyntaxLangError::new(ErrorKind::InvalidLiteral, message, span, self.file)
    }

    fn statements(&self, statements: &[Stmt]) -> SyntaxLangResult<Vec<Instruction>> {
        statements.iter().map(|stmt| self.statement(stmt)).collect()
    }

    fn block(&self, statements: &[Stmt], span: Span) -> SyntaxLangResult<Block> {
        Ok(Block {
            instructions: self.statements(statements)?,
            span,
        })
    }

    fn statement(&self, stmt: &Stmt) -> SyntaxLangResult<Instruction> {
        let instruction = match stmt {
            Stmt::Expression { expr } => self.expression(expr)?,
            Stmt::Block { statements, span } => Instruction::Block(self.block(statements, *span)?),
            Stmt::Empty { span } => Instruction::Empty { span: *span },
            Stmt::If {
                branches,
                else_branch,
                span,
            } => {
                let branches = branches
                    .iter()
                    .map(|branch| {
                        Ok((
                            self.expression(&branch.condition)?,
                            self.block(&branch.body, *span)?,
                        ))
                    })
                    .collect::<SyntaxLangResult<Vec<_>>>()?;
                let otherwise = match else_branch {
                    Some(body) => Some(self.block(body, *span)?),
                    None => None,
                };
                Instruction::If {
                    branches,
                    otherwise,
                    span: *span,
                }
            }
            Stmt::For {
                label,
                init,
                condition,
                update,
                body,
                span,
            } => Instruction::For(Box::new(ForInstruction {
                label: label.as_deref().map(Rc::from),
                init: init
                    .iter()
                    .map(|def| self.field(def).map(Rc::new))
                    .collect::<SyntaxLangResult<_>>()?,
                condition: self.optional(condition.as_ref())?,
                update: update
                    .iter()
                    .map(|expr| self.expression(expr))
                    .collect::<SyntaxLangResult<_>>()?,
                body: self.block(body, *span)?,
                span: *span,
            })),
            Stmt::Foreach {
                label,
                variable,
                iterable,
                body,
                span,
            } => Instruction::Foreach(Box::new(ForeachInstruction {
                label: label.as_deref().map(Rc::from),
                variable: Rc::from(variable.as_str()),
                iterable: self.expression(iterable)?,
                body: self.block(body, *span)?,
                span: *span,
            })),
            Stmt::While {
                label,
                condition,
                body,
                span,
            } => self.while_loop(label, condition, body, true, *span)?,
            Stmt::DoWhile {
                label,
                body,
                condition,
                span,
            } => self.while_loop(label, condition, body, false, *span)?,
            Stmt::TryCatch {
                body,
                variable,
                handler,
                span,
            } => Instruction::TryCatch(Box::new(TryCatchInstruction {
                body: self.block(body, *span)?,
                variable: Rc::from(variable.as_str()),
                handler: self.block(handler, *span)?,
                span: *span,
            })),
            Stmt::Return { value, span } => Instruction::Return {
                value: self.optional(value.as_ref())?.map(Box::new),
                span: *span,
            },
            Stmt::Yield { value, span } => Instruction::Yield {
                value: Box::new(self.expression(value)?),
                span: *span,
            },
            Stmt::Break { label, span } => Instruction::Break {
                label: label.as_deref().map(Rc::from),
                span: *span,
            },
            Stmt::Continue { label, span } => Instruction::Continue {
                label: label.as_deref().map(Rc::from),
                span: *span,
            },
            Stmt::Namespace { name, span } => Instruction::Namespace {
                name: Rc::from(name.as_str()),
                span: *span,
            },
            Stmt::Import { path, span } => Instruction::Import {
                path: Rc::from(path.as_str()),
                span: *span,
            },
            Stmt::UseAs {
                namespace,
                alias,
                span,
            } => Instruction::UseAs {
                namespace: Rc::from(namespace.as_str()),
                alias: Rc::from(alias.as_str()),
                span: *span,
            },
            Stmt::Function(def) => Instruction::DeclareFunction(Rc::new(self.function(def)?)),
            Stmt::Class(def) => Instruction::DeclareType(Rc::new(self.class(def)?)),
            Stmt::Enum(def) => Instruction::DeclareType(Rc::new(self.enumeration(def)?)),
            Stmt::Interface(def) => Instruction::DeclareType(Rc::new(self.interface(def)?)),
        };
        Ok(instruction)
    }

    fn while_loop(
        &self,
        label: &Option<String>,
        condition: &Expr,
        body: &[Stmt],
        test_first: bool,
        span: Span,
    ) -> SyntaxLangResult<Instruction> {
        Ok(Instruction::While(Box::new(WhileInstruction {
            label: label.as_deref().map(Rc::from),
            condition: self.expression(condition)?,
            body: self.block(body, span)?,
            test_first,
            span,
        })))
    }

    fn optional(&self, expr: Option<&Expr>) -> SyntaxLangResult<Option<Instruction>> {
        expr.map(|expr| self.expression(expr)).transpose()
    }

    fn boxed(&self, expr: &Expr) -> SyntaxLangResult<Box<Instruction>> {
        Ok(Box::new(self.expression(expr)?))
    }

    fn expressions(&self, exprs: &[Expr]) -> SyntaxLangResult<Vec<Instruction>> {
        exprs.iter().map(|expr| self.expression(expr)).collect()
    }

    fn literal(&self, literal: &Literal, span: Span) -> SyntaxLangResult<Value> {
        let value = match literal {
            Literal::String(text) => Value::string(text.as_str()),
            Literal::Number(text) => Value::number(
                parse_number(text)
                    .ok_or_else(|| self.error(format!("Invalid number literal '{}'", text), span))?,
            ),
            Literal::Imaginary(text) => {
                let imaginary = parse_number(text).ok_or_else(|| {
                    self.error(format!("Invalid complex literal '{}i'", text), span)
                })?;
                Value::complex(BigComplex::new(BigDecimal::zero(), imaginary))
            }
            Literal::Boolean(b) => Value::boolean(*b),
            Literal::Null => Value::null(),
        };
        Ok(value.with_position(span))
    }

    fn expression(&self, expr: &Expr) -> SyntaxLangResult<Instruction> {
        let instruction = match expr {
            Expr::Literal { value, span } => Instruction::Literal {
                value: self.literal(value, *span)?,
                span: *span,
            },
            Expr::Identifier { name, span } => Instruction::Identifier {
                name: Rc::from(name.as_str()),
                span: *span,
            },
            Expr::Scoped {
                namespace,
                name,
                span,
            } => Instruction::Scoped {
                namespace: Rc::from(namespace.as_str()),
                name: Rc::from(name.as_str()),
                span: *span,
            },
            Expr::Binary {
                left,
                op,
                right,
                span,
            } => Instruction::Binary(Box::new(BinaryInstruction::new(
                self.expression(left)?,
                *op,
                self.expression(right)?,
                *span,
            ))),
            Expr::Unary {
                op,
                prefix,
                operand,
                span,
            } => Instruction::Unary {
                op: *op,
                prefix: *prefix,
                operand: self.boxed(operand)?,
                span: *span,
            },
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                span,
            } => Instruction::Ternary {
                condition: self.boxed(condition)?,
                then_branch: self.boxed(then_expr)?,
                else_branch: self.boxed(else_expr)?,
                span: *span,
            },
            Expr::InstanceOf {
                value,
                type_ref,
                span,
            } => Instruction::InstanceOf {
                value: self.boxed(value)?,
                type_ref: type_ref.clone(),
                span: *span,
            },
            Expr::New {
                type_ref,
                args,
                span,
            } => Instruction::New {
                type_ref: type_ref.clone(),
                args: self.expressions(args)?,
                span: *span,
            },
            Expr::Clone { value, span } => Instruction::Clone {
                value: self.boxed(value)?,
                span: *span,
            },
            Expr::Call { callee, args, span } => Instruction::Call {
                callee: self.boxed(callee)?,
                args: self.expressions(args)?,
                span: *span,
            },
            Expr::Index {
                target,
                index,
                span,
            } => Instruction::Index {
                target: self.boxed(target)?,
                index: self.boxed(index)?,
                span: *span,
            },
            Expr::Member { target, name, span } => Instruction::Member {
                target: self.boxed(target)?,
                name: Rc::from(name.as_str()),
                span: *span,
            },
            Expr::List { elements, span } => Instruction::List {
                elements: self.expressions(elements)?,
                span: *span,
            },
            Expr::Map { entries, span } => {
                let entries = entries
                    .iter()
                    .map(|entry| Ok((self.map_key(&entry.key)?, self.expression(&entry.value)?)))
                    .collect::<SyntaxLangResult<_>>()?;
                Instruction::Map {
                    entries,
                    span: *span,
                }
            }
            Expr::Function {
                params,
                variadic,
                body,
                span,
            } => Instruction::Function(Rc::new(FunctionTemplate {
                name: Rc::from(FunctionTemplate::ANONYMOUS),
                access: AccessModifier::Default,
                is_static: false,
                modifier: None,
                params: self.params(params)?,
                variadic: variadic.as_deref().map(Rc::from),
                body: Some(self.block(body, *span)?),
                span: *span,
            })),
            Expr::Switch {
                discriminant,
                cases,
                span,
            } => Instruction::Switch(Box::new(SwitchInstruction {
                discriminant: self.expression(discriminant)?,
                cases: cases
                    .iter()
                    .map(|case| self.switch_case(case))
                    .collect::<SyntaxLangResult<_>>()?,
                span: *span,
            })),
            Expr::Throw { value, span } => Instruction::Throw {
                value: self.boxed(value)?,
                span: *span,
            },
            Expr::VarDecl { def } => Instruction::Declare(Rc::new(self.field(def)?)),
            Expr::Assign {
                target,
                op,
                value,
                span,
            } => Instruction::Assign {
                target: self.boxed(target)?,
                op: *op,
                value: self.boxed(value)?,
                span: *span,
            },
        };
        Ok(instruction)
    }

    /// Bare identifiers used as map keys are string keys
    fn map_key(&self, key: &Expr) -> SyntaxLangResult<Instruction> {
        match key {
            Expr::Identifier { name, span } => Ok(Instruction::Literal {
                value: Value::string(name.as_str()).with_position(*span),
                span: *span,
            }),
            Expr::Literal {
                value: Literal::Null,
                span,
            } => Err(SyntaxLangError::type_error(
                "Map key must not be null",
                *span,
                self.file,
            )),
            other => self.expression(other),
        }
    }

    fn switch_case(&self, case: &SwitchCase) -> SyntaxLangResult<SwitchCaseInstruction> {
        let body = match &case.body {
            CaseBody::Statements { statements } => {
                CaseInstruction::Statements(self.statements(statements)?)
            }
            CaseBody::Value { value } => CaseInstruction::Value(self.expression(value)?),
        };
        Ok(SwitchCaseInstruction {
            guard: self.optional(case.guard.as_ref())?,
            body,
            span: case.span,
        })
    }

    fn params(&self, params: &[Param]) -> SyntaxLangResult<Vec<ParamTemplate>> {
        params
            .iter()
            .map(|param| {
                Ok(ParamTemplate {
                    name: Rc::from(param.name.as_str()),
                    default: self.optional(param.default.as_ref())?,
                    span: param.span,
                })
            })
            .collect()
    }

    fn field(&self, def: &FieldDef) -> SyntaxLangResult<FieldTemplate> {
        Ok(FieldTemplate {
            name: Rc::from(def.name.as_str()),
            access: def.access,
            is_static: def.is_static,
            is_final: def.is_final,
            value: self.expression(&def.value)?,
            span: def.span,
        })
    }

    fn fields(&self, defs: &[FieldDef]) -> SyntaxLangResult<Vec<Rc<FieldTemplate>>> {
        defs.iter().map(|def| self.field(def).map(Rc::new)).collect()
    }

    fn function(&self, def: &FunctionDef) -> SyntaxLangResult<FunctionTemplate> {
        let body = match &def.body {
            Some(body) => Some(self.block(body, def.span)?),
            None => None,
        };
        Ok(FunctionTemplate {
            name: Rc::from(def.name.as_str()),
            access: def.access,
            is_static: def.is_static,
            modifier: def.modifier,
            params: self.params(&def.params)?,
            variadic: def.variadic.as_deref().map(Rc::from),
            body,
            span: def.span,
        })
    }

    fn functions(&self, defs: &[FunctionDef]) -> SyntaxLangResult<Vec<Rc<FunctionTemplate>>> {
        defs.iter()
            .map(|def| self.function(def).map(Rc::new))
            .collect()
    }

    fn class(&self, def: &ClassDef) -> SyntaxLangResult<TypeTemplate> {
        Ok(TypeTemplate {
            name: Rc::from(def.name.as_str()),
            access: def.access,
            fields: self.fields(&def.fields)?,
            functions: self.functions(&def.functions)?,
            shape: TypeShape::Class {
                cloneable: def.cloneable,
                modifier: def.modifier,
                extends: def.extends.clone(),
                implements: def.implements.clone(),
            },
            span: def.span,
        })
    }

    fn enumeration(&self, def: &EnumDef) -> SyntaxLangResult<TypeTemplate> {
        let constants = def
            .constants
            .iter()
            .map(|constant| {
                Ok(ConstantTemplate {
                    name: Rc::from(constant.name.as_str()),
                    args: self.expressions(&constant.args)?,
                    span: constant.span,
                })
            })
            .collect::<SyntaxLangResult<_>>()?;
        Ok(TypeTemplate {
            name: Rc::from(def.name.as_str()),
            access: def.access,
            fields: self.fields(&def.fields)?,
            functions: self.functions(&def.functions)?,
            shape: TypeShape::Enum {
                implements: def.implements.clone(),
                constants,
            },
            span: def.span,
        })
    }

    fn interface(&self, def: &InterfaceDef) -> SyntaxLangResult<TypeTemplate> {
        Ok(TypeTemplate {
            name: Rc::from(def.name.as_str()),
            access: def.access,
            fields: Vec::new(),
            functions: self.functions(&def.functions)?,
            shape: TypeShape::Interface {
                extends: def.extends.clone(),
            },
            span: def.span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    #[test]
    fn test_literal_numbers_are_parsed() {
        let program = program(vec![expr(num("12.50"))]);
        let instructions = build_program(&program, "main.sl").unwrap();
        match &instructions[0] {
            Instruction::Literal { value, .. } => assert_eq!(value.to_string(), "12.5"),
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn test_invalid_number_literal_is_rejected() {
        let program = program(vec![expr(num("1.2.3"))]);
        let err = build_program(&program, "main.sl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLiteral);
    }

    #[test]
    fn test_imaginary_literal_has_zero_real_part() {
        let program = program(vec![expr(imaginary("2"))]);
        let instructions = build_program(&program, "main.sl").unwrap();
        let Instruction::Literal { value, .. } = &instructions[0] else {
            panic!("expected literal");
        };
        assert_eq!(value.to_string(), "0+2i");
    }

    #[test]
    fn test_identifier_map_keys_become_strings() {
        let program = program(vec![expr(map(vec![(ident("a"), num("1"))]))]);
        let instructions = build_program(&program, "main.sl").unwrap();
        let Instruction::Map { entries, .. } = &instructions[0] else {
            panic!("expected map");
        };
        assert!(matches!(
            &entries[0].0,
            Instruction::Literal { value, .. } if value.as_string().map(|s| s.as_ref()) == Some("a")
        ));
    }

    #[test]
    fn test_null_map_key_is_rejected() {
        let program = program(vec![expr(map(vec![(null(), num("1"))]))]);
        let err = build_program(&program, "main.sl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_binary_of_literals_is_constant() {
        let program = program(vec![expr(binary(num("1"), BinaryOp::Add, num("2")))]);
        let instructions = build_program(&program, "main.sl").unwrap();
        let Instruction::Binary(binary) = &instructions[0] else {
            panic!("expected binary");
        };
        assert!(binary.is_constant());
        assert!(binary.folded().is_none());
    }
}
