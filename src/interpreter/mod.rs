// SyntaxLang Interpreter
// Tree-walking evaluator: every instruction consumes a Scope and yields a
// Signal; expressions yield a Value unless a signal interrupts them

mod call;
mod control;
mod declare;
mod dispatch;
mod operators;
mod stack;

use crate::ast::Program;
use crate::config::Config;
use crate::error::{ErrorKind, Span, SyntaxLangResult};
use crate::instruction::{build_program, Instruction};
use crate::loader::SourceLoader;
use crate::runtime::{RuntimeError, Scope, Signal, SourceFile, Value};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Result of evaluating an expression: a value, or a signal that cut the
/// evaluation short and must propagate
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    Done(T),
    Interrupted(Signal),
}

pub(crate) type Evaluated = Outcome<Value>;

impl<T> From<Signal> for Outcome<T> {
    fn from(signal: Signal) -> Self {
        Outcome::Interrupted(signal)
    }
}

/// Unwrap an `Outcome`, returning the interrupting signal from the
/// enclosing function
macro_rules! value_of {
    ($outcome:expr) => {
        match $outcome? {
            $crate::interpreter::Outcome::Done(value) => value,
            $crate::interpreter::Outcome::Interrupted(signal) => return Ok(signal.into()),
        }
    };
}
pub(crate) use value_of;

/// A finished top-level run
#[derive(Debug)]
pub struct Execution {
    /// Root scope of the executed file, for inspection by hosts
    pub scope: Rc<Scope>,
    /// Exception that reached the top level, if any
    pub uncaught: Option<RuntimeError>,
}

pub struct Interpreter {
    config: Config,
    loader: Box<dyn SourceLoader>,
    /// Files currently executing through imports, outermost first
    loading: Vec<PathBuf>,
}

impl Interpreter {
    pub fn new(config: Config, loader: impl SourceLoader + 'static) -> Self {
        Self {
            config,
            loader: Box::new(loader),
            loading: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the tree for `path` through the loader and run it
    pub fn run_file(&mut self, path: &Path) -> SyntaxLangResult<Execution> {
        let path = self.loader.canonicalize(path).map_err(|e| {
            crate::error::SyntaxLangError::import_error(
                format!("Cannot load file: {}", e),
                Span::default(),
                path.display().to_string(),
            )
        })?;
        let program = self.loader.load(&path).map_err(|e| {
            crate::error::SyntaxLangError::import_error(
                format!("Cannot load file: {}", e),
                Span::default(),
                path.display().to_string(),
            )
        })?;
        self.run_program(&program, path)
    }

    /// Run an already loaded program as the file at `path`
    pub fn run_program(&mut self, program: &Program, path: impl Into<PathBuf>) -> SyntaxLangResult<Execution> {
        let path = path.into();
        let file = SourceFile::new(path.clone(), program.source.as_deref());
        let scope = Scope::root(file);
        let instructions = build_program(program, scope.file_name())?;
        tracing::debug!(path = %path.display(), instructions = instructions.len(), "running program");

        self.loading.push(path);
        let result = self.execute_program(&instructions, &scope);
        self.loading.pop();

        Ok(Execution {
            uncaught: result?,
            scope,
        })
    }

    /// Run top-level instructions. A throw that escapes is returned as the
    /// uncaught exception; any other escaping signal is malformed.
    pub fn execute_program(
        &mut self,
        instructions: &[Instruction],
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Option<RuntimeError>> {
        match self.execute_statements(instructions, scope)? {
            Signal::Throw(error) => Ok(Some(*error)),
            signal if signal.is_fallthrough() => Ok(None),
            signal => Err(scope.error(
                ErrorKind::MalformedProgram,
                format!("Unexpected {} at top level", signal.describe()),
                instructions
                    .last()
                    .map(Instruction::span)
                    .unwrap_or_default(),
            )),
        }
    }

    /// Run a block in a fresh child scope
    pub(crate) fn execute_block(
        &mut self,
        block: &crate::instruction::Block,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Signal> {
        let child = scope.build_child();
        self.execute_statements(&block.instructions, &child)
    }

    /// Run a statement list in `scope`: the file header (namespace, imports,
    /// aliases) first, then hoisted declarations, then everything else in
    /// order. The first non-fallthrough signal stops the list.
    pub(crate) fn execute_statements(
        &mut self,
        instructions: &[Instruction],
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Signal> {
        let mut start = 0;
        while let Some(
            instruction @ (Instruction::Namespace { .. }
            | Instruction::Import { .. }
            | Instruction::UseAs { .. }),
        ) = instructions.get(start)
        {
            let signal = self.process(instruction, scope)?;
            if !matches!(instruction, Instruction::Namespace { .. }) {
                scope.close_namespace_window();
            }
            if !signal.is_fallthrough() {
                return Ok(signal);
            }
            start += 1;
        }
        scope.close_namespace_window();

        let body = &instructions[start..];
        let signal = self.hoist(body, scope)?;
        if !signal.is_fallthrough() {
            return Ok(signal);
        }
        for instruction in body {
            if instruction.is_hoisted() {
                continue;
            }
            let signal = self.process(instruction, scope)?;
            if !signal.is_fallthrough() {
                return Ok(signal);
            }
        }
        Ok(Signal::None)
    }

    /// Execute one instruction
    pub(crate) fn process(&mut self, instruction: &Instruction, scope: &Rc<Scope>) -> SyntaxLangResult<Signal> {
        stack::ensure_sufficient_stack(|| self.process_instruction(instruction, scope))
    }

    fn process_instruction(&mut self, instruction: &Instruction, scope: &Rc<Scope>) -> SyntaxLangResult<Signal> {
        match instruction {
            Instruction::Empty { .. } => Ok(Signal::None),
            Instruction::Block(block) => self.execute_block(block, scope),
            Instruction::If {
                branches,
                otherwise,
                ..
            } => self.if_chain(branches, otherwise.as_ref(), scope),
            Instruction::For(for_loop) => self.for_loop(for_loop, scope),
            Instruction::While(while_loop) => self.while_loop(while_loop, scope),
            Instruction::Foreach(foreach) => self.foreach(foreach, scope),
            Instruction::TryCatch(try_catch) => self.try_catch(try_catch, scope),
            Instruction::Return { value, .. } => match value {
                Some(value) => Ok(Signal::ReturnValue(value_of!(self.evaluate(value, scope)))),
                None => Ok(Signal::Return),
            },
            Instruction::Yield { value, .. } => Ok(Signal::Yield(value_of!(self.evaluate(value, scope)))),
            Instruction::Break { label, .. } => Ok(match label {
                Some(label) => Signal::BreakLabel(label.clone()),
                None => Signal::Break,
            }),
            Instruction::Continue { label, .. } => Ok(match label {
                Some(label) => Signal::ContinueLabel(label.clone()),
                None => Signal::Continue,
            }),
            Instruction::Namespace { name, span } => {
                scope.set_namespace(name.clone(), *span)?;
                Ok(Signal::None)
            }
            Instruction::Import { path, span } => self.import(path, *span, scope),
            Instruction::UseAs {
                namespace,
                alias,
                span,
            } => {
                scope.use_namespace_as(namespace.clone(), alias.clone(), *span)?;
                Ok(Signal::None)
            }
            Instruction::DeclareFunction(template) => {
                self.declare_functions(&[template], scope)?;
                Ok(Signal::None)
            }
            Instruction::DeclareType(template) => self.declare_types(&[template], scope),
            expression => Ok(match self.evaluate(expression, scope)? {
                Outcome::Done(value) => Signal::Value(value),
                Outcome::Interrupted(signal) => signal,
            }),
        }
    }

    /// Evaluate an expression instruction to a value
    pub(crate) fn evaluate(&mut self, instruction: &Instruction, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        stack::ensure_sufficient_stack(|| self.evaluate_instruction(instruction, scope))
    }

    fn evaluate_instruction(&mut self, instruction: &Instruction, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        let value = match instruction {
            Instruction::Literal { value, .. } => value.clone(),
            Instruction::Identifier { name, span } => self.resolve_identifier(name, *span, scope)?,
            Instruction::Scoped {
                namespace,
                name,
                span,
            } => self.resolve_scoped(namespace, name, *span, scope)?,
            Instruction::Binary(binary) => return self.binary(binary, scope),
            Instruction::Unary {
                op,
                prefix,
                operand,
                span,
            } => return self.unary(*op, *prefix, operand, *span, scope),
            Instruction::Ternary {
                condition,
                then_branch,
                else_branch,
                span,
            } => {
                let branch = if value_of!(self.condition(condition, *span, scope)) {
                    then_branch
                } else {
                    else_branch
                };
                return self.evaluate(branch, scope);
            }
            Instruction::InstanceOf {
                value,
                type_ref,
                span,
            } => {
                let value = value_of!(self.evaluate(value, scope));
                let target = self.resolve_type_ref(type_ref, *span, scope)?;
                let matches = value
                    .as_object()
                    .is_some_and(|instance| instance.ty().is_instance_of(&target));
                Value::boolean(matches)
            }
            Instruction::New {
                type_ref,
                args,
                span,
            } => {
                let ty = self.resolve_type_ref(type_ref, *span, scope)?;
                let args = value_of!(self.arguments(args, scope));
                return self.instantiate(&ty, args, *span, scope);
            }
            Instruction::Clone { value, span } => {
                let value = value_of!(self.evaluate(value, scope));
                return self.clone_value(value, *span, scope);
            }
            Instruction::Call { callee, args, span } => return self.call(callee, args, *span, scope),
            Instruction::Index {
                target,
                index,
                span,
            } => {
                let target = value_of!(self.evaluate(target, scope));
                let index = value_of!(self.evaluate(index, scope));
                return self.index(target, index, *span, scope);
            }
            Instruction::Member { target, name, span } => {
                return self.member(target, name, *span, scope)
            }
            Instruction::List { elements, span } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(value_of!(self.collection_element(element, *span, scope)));
                }
                Value::list(values)
            }
            Instruction::Map { entries, span } => return self.map_literal(entries, *span, scope),
            Instruction::Function(template) => Value::function(Rc::new(
                crate::runtime::Function::new(template.clone(), scope.clone()),
            )),
            Instruction::Switch(switch) => return self.switch(switch, scope),
            Instruction::Throw { value, span } => {
                let value = value_of!(self.evaluate(value, scope));
                return self.throw(value, *span, scope);
            }
            Instruction::Declare(field) => return self.declare_variable(field, scope),
            Instruction::Assign {
                target,
                op,
                value,
                span,
            } => return self.assign(target, *op, value, *span, scope),
            statement => {
                return match self.process(statement, scope)? {
                    Signal::Value(value) => Ok(Outcome::Done(value)),
                    Signal::None => Err(scope.error(
                        ErrorKind::MalformedProgram,
                        "Invalid expression",
                        statement.span(),
                    )),
                    signal => Ok(signal.into()),
                }
            }
        };
        Ok(Outcome::Done(value.with_position(instruction.span())))
    }

    /// Element of a list or map literal; must produce a value
    fn collection_element(
        &mut self,
        element: &Instruction,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        match self.process(element, scope)? {
            Signal::Value(value) => Ok(Outcome::Done(value)),
            Signal::None => Err(scope.error(
                ErrorKind::MalformedProgram,
                "Invalid expression in collection literal",
                span,
            )),
            signal => Ok(signal.into()),
        }
    }

    fn map_literal(
        &mut self,
        entries: &[(Instruction, Instruction)],
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        let mut map = crate::runtime::ValueMap::new();
        for (key, value) in entries {
            let key = value_of!(self.collection_element(key, span, scope));
            if key.is_null() {
                return Err(scope.error(ErrorKind::TypeMismatch, "Map key must not be null", key.span()));
            }
            let value = value_of!(self.collection_element(value, span, scope));
            map.insert(key, value);
        }
        Ok(Outcome::Done(Value::map(map).with_position(span)))
    }
}

#[cfg(test)]
mod tests;
