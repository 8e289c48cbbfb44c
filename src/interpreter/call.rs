// SyntaxLang calls, construction, and cloning

use super::dispatch::Args;
use super::{value_of, Evaluated, Interpreter, Outcome};
use crate::error::{ErrorKind, Span, SyntaxLangResult};
use crate::instruction::Instruction;
use crate::runtime::{
    AccessContext, EnumConstant, Function, Hook, Instance, Scope, Signal, TypeEntity,
    Value, Variable,
};
use smallvec::SmallVec;
use std::rc::Rc;

impl Interpreter {
    /// Evaluate call arguments left to right
    pub(crate) fn arguments(&mut self, args: &[Instruction], scope: &Rc<Scope>) -> SyntaxLangResult<Outcome<Args>> {
        let mut values: Args = SmallVec::with_capacity(args.len());
        for arg in args {
            values.push(value_of!(self.evaluate(arg, scope)));
        }
        Ok(Outcome::Done(values))
    }

    pub(crate) fn call(
        &mut self,
        callee: &Instruction,
        args: &[Instruction],
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        if let Instruction::Member { target, name, .. } = callee {
            if let Some(ty) = self.static_target(target, scope) {
                if ty.is_enum() && matches!(name.as_ref(), "values" | "valueOf") {
                    let args = value_of!(self.arguments(args, scope));
                    return self.enum_static(&ty, name, args, span, scope);
                }
            } else {
                let receiver = value_of!(self.evaluate(target, scope));
                if let Some(constant) = receiver.as_object().and_then(|o| o.enum_constant()) {
                    let builtin = match name.as_ref() {
                        "name" => Some(Value::string(constant.name.clone())),
                        "ordinal" => Some(Value::integer(constant.ordinal as i64)),
                        _ => None,
                    };
                    if let Some(value) = builtin {
                        self.expect_arity(name, 0, args.len(), span, scope)?;
                        return Ok(Outcome::Done(value.with_position(span)));
                    }
                }
                let function = self.method(&receiver, name, span, scope)?;
                let args = value_of!(self.arguments(args, scope));
                return self.invoke(&function, args, span, scope);
            }
        }

        let callee_value = value_of!(self.evaluate(callee, scope));
        let Some(function) = callee_value.as_function().cloned() else {
            return Err(scope.error(
                ErrorKind::TypeMismatch,
                format!("{} is not callable", callee_value.type_name()),
                span,
            ));
        };
        let args = value_of!(self.arguments(args, scope));
        self.invoke(&function, args, span, scope)
    }

    /// Function a member call on `receiver` runs, bound to the receiver
    fn method(&mut self, receiver: &Value, name: &str, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Rc<Function>> {
        let Some(instance) = receiver.as_object() else {
            return Err(scope.error(
                ErrorKind::TypeMismatch,
                format!("Cannot call member {} of {}", name, receiver.type_name()),
                span,
            ));
        };
        let member = instance
            .ty()
            .resolve_member(&scope.access_context(), name)
            .ok_or_else(|| self.unknown_member(instance.ty(), name, span, scope))?;
        let value = self.member_value(member, Some(instance), name, span, scope)?;
        value.as_function().cloned().ok_or_else(|| {
            scope.error(
                ErrorKind::TypeMismatch,
                format!("Member {} of {} is not callable", name, instance.ty().full_name()),
                span,
            )
        })
    }

    fn expect_arity(&self, name: &str, expected: usize, got: usize, span: Span, scope: &Scope) -> SyntaxLangResult<()> {
        if expected == got {
            return Ok(());
        }
        Err(scope.error(
            ErrorKind::ArgumentError,
            format!("{}() expects {} argument(s), got {}", name, expected, got),
            span,
        ))
    }

    /// `E.values()` and `E.valueOf(name)`
    fn enum_static(
        &mut self,
        ty: &Rc<TypeEntity>,
        name: &str,
        args: Args,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        if name == "values" {
            self.expect_arity(name, 0, args.len(), span, scope)?;
            let constants = ty.constants().into_iter().map(Value::object).collect();
            return Ok(Outcome::Done(Value::list(constants).with_position(span)));
        }
        self.expect_arity(name, 1, args.len(), span, scope)?;
        let requested = args[0].expect_string(scope.file_name())?;
        match ty.constant(requested) {
            Some(constant) => Ok(Outcome::Done(Value::object(constant).with_position(span))),
            None => Ok(self
                .exception(
                    "IllegalArgumentException",
                    format!("Unknown enum constant {}", requested),
                    span,
                    scope,
                )
                .into()),
        }
    }

    /// Run `function` with `args` in a new call scope. The body consumes
    /// `Return`; break, continue, and yield may not escape it.
    pub(crate) fn invoke(
        &mut self,
        function: &Rc<Function>,
        args: Args,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        let template = function.template();
        if scope.depth() >= self.config.max_call_depth {
            return Err(scope.error(
                ErrorKind::StackOverflow,
                format!(
                    "Maximum call depth of {} exceeded in {}",
                    self.config.max_call_depth, template.name
                ),
                span,
            ));
        }
        let Some(body) = &template.body else {
            return Err(scope.error(
                ErrorKind::InvalidOperation,
                format!("Cannot call abstract function {}", template.name),
                span,
            ));
        };

        let owner = function.owner().or_else(|| function.closure().owner());
        let call_scope = function.closure().build_call(
            scope,
            owner.as_ref().map(Rc::downgrade),
            template.name.clone(),
            span,
        );
        if let Some(receiver) = function.receiver() {
            call_scope.declare_variable(Rc::new(Variable::new(
                Rc::from("this"),
                Value::object(receiver.clone()),
                true,
                span,
            )))?;
        }

        if args.len() > template.params.len() && template.variadic.is_none() {
            return Err(scope.error(
                ErrorKind::ArgumentError,
                format!(
                    "{} expects at most {} argument(s), got {}",
                    template.name,
                    template.params.len(),
                    args.len()
                ),
                span,
            ));
        }
        let mut args = args.into_iter();
        for param in &template.params {
            let value = match args.next() {
                Some(value) => value,
                None => match &param.default {
                    Some(default) => value_of!(self.evaluate(default, &call_scope)),
                    None => {
                        return Err(scope.error(
                            ErrorKind::ArgumentError,
                            format!("Missing argument {} for {}", param.name, template.name),
                            span,
                        ))
                    }
                },
            };
            call_scope.declare_variable(Rc::new(Variable::new(
                param.name.clone(),
                value,
                false,
                param.span,
            )))?;
        }
        if let Some(variadic) = &template.variadic {
            call_scope.declare_variable(Rc::new(Variable::new(
                variadic.clone(),
                Value::list(args.collect()),
                false,
                template.span,
            )))?;
        }

        tracing::trace!(function = %template.name, depth = call_scope.depth(), "call");
        match self.execute_statements(&body.instructions, &call_scope)? {
            Signal::None | Signal::Value(_) | Signal::Return => Ok(Outcome::Done(Value::null())),
            Signal::ReturnValue(value) => Ok(Outcome::Done(value)),
            signal @ Signal::Throw(_) => Ok(signal.into()),
            signal => Err(call_scope.error(
                ErrorKind::MalformedProgram,
                format!("Unexpected {} outside of loop or switch in {}", signal.describe(), template.name),
                body.span,
            )),
        }
    }

    /// `new T(args)`: allocate, run field initializers base-first, then the
    /// constructor (the function named after the type) with `this` bound
    pub(crate) fn instantiate(
        &mut self,
        ty: &Rc<TypeEntity>,
        args: Args,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        let instance = Instance::new(ty, span, scope.file_name())
            .map_err(|e| scope.error(e.kind, e.message, span))?;
        let constructor = self.constructor(ty);
        if constructor.is_none() && ty.is_class() {
            return Err(scope.error(
                ErrorKind::Instantiation,
                format!("{} has no constructor", ty.full_name()),
                span,
            ));
        }
        value_of!(self.construct(&instance, constructor, args, span, scope));
        Ok(Outcome::Done(Value::object(instance).with_position(span)))
    }

    fn constructor(&self, ty: &TypeEntity) -> Option<Rc<Function>> {
        ty.resolve_member(&AccessContext::full(), ty.name())
            .and_then(|member| member.as_function().cloned())
    }

    /// Initialize fields and run the constructor on a fresh instance
    fn construct(
        &mut self,
        instance: &Rc<Instance>,
        constructor: Option<Rc<Function>>,
        args: Args,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Outcome<()>> {
        for ty in instance.ty().class_chain() {
            let init_scope = ty.scope().build_child();
            init_scope.declare_variable(Rc::new(Variable::new(
                Rc::from("this"),
                Value::object(instance.clone()),
                true,
                span,
            )))?;
            for field in ty.template().fields.iter().filter(|field| !field.is_static) {
                let value = value_of!(self.evaluate(&field.value, &init_scope));
                instance.set_field(field.name.clone(), value);
            }
        }
        match constructor {
            Some(constructor) => {
                let bound = Rc::new(constructor.bind(instance.clone()));
                value_of!(self.invoke(&bound, args, span, scope));
            }
            None if !args.is_empty() => {
                return Err(scope.error(
                    ErrorKind::Instantiation,
                    format!("{} has no constructor taking arguments", instance.ty().full_name()),
                    span,
                ))
            }
            None => {}
        }
        Ok(Outcome::Done(()))
    }

    /// Create one enum constant; only valid while the constructor window
    /// of `ty` is open
    pub(crate) fn create_constant(
        &mut self,
        ty: &Rc<TypeEntity>,
        constant: EnumConstant,
        args: Args,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Outcome<Rc<Instance>>> {
        let instance = Instance::new(ty, span, scope.file_name())
            .map_err(|e| scope.error(e.kind, e.message, span))?;
        instance.mark_constant(constant);
        let constructor = self.constructor(ty);
        value_of!(self.construct(&instance, constructor, args, span, scope));
        Ok(Outcome::Done(instance))
    }

    /// `clone x`: cloneable objects copy through `__clone` or field by
    /// field; primitives are immutable and clone to themselves
    pub(crate) fn clone_value(&mut self, value: Value, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        let Some(instance) = value.as_object() else {
            return Ok(Outcome::Done(value));
        };
        if !instance.ty().is_cloneable() {
            return Err(scope.error(
                ErrorKind::InvalidOperation,
                format!("{} is not cloneable", instance.ty().full_name()),
                span,
            ));
        }
        if let Some(outcome) = self.convert(instance, Hook::Clone, span, scope)? {
            return Ok(outcome);
        }
        Ok(Outcome::Done(Value::object(instance.shallow_copy()).with_position(span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::Stmt;
    use crate::config::Config;
    use crate::loader::MemoryLoader;

    fn interpreter(depth: usize) -> Interpreter {
        Interpreter::new(Config::default().with_max_call_depth(depth), MemoryLoader::new())
    }

    #[test]
    fn test_runaway_recursion_is_stack_overflow() {
        let program = program(vec![
            Stmt::Function(function(
                "down",
                &["n"],
                vec![ret(Some(call(ident("down"), vec![ident("n")])))],
            )),
            expr(call(ident("down"), vec![num("1")])),
        ]);
        let err = interpreter(32).run_program(&program, "/main.sl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackOverflow);
        assert!(err.stack_trace.len() > 30);
    }

    #[test]
    fn test_default_depth_fits_an_ordinary_thread_stack() {
        let worker = std::thread::Builder::new()
            .stack_size(8 * 1024 * 1024)
            .spawn(|| {
                let program = program(vec![
                    Stmt::Function(function(
                        "forever",
                        &[],
                        vec![ret(Some(call(ident("forever"), vec![])))],
                    )),
                    expr(call(ident("forever"), vec![])),
                ]);
                Interpreter::new(Config::default(), MemoryLoader::new())
                    .run_program(&program, "/main.sl")
                    .err()
                    .map(|err| err.kind)
            })
            .unwrap();
        assert_eq!(worker.join().unwrap(), Some(ErrorKind::StackOverflow));
    }

    #[test]
    fn test_missing_and_extra_arguments() {
        let declare = Stmt::Function(function("pair", &["a", "b"], vec![ret(Some(ident("a")))]));

        let missing = program(vec![declare.clone(), expr(call(ident("pair"), vec![num("1")]))]);
        let err = interpreter(64).run_program(&missing, "/main.sl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgumentError);

        let extra = program(vec![
            declare,
            expr(call(ident("pair"), vec![num("1"), num("2"), num("3")])),
        ]);
        let err = interpreter(64).run_program(&extra, "/main.sl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgumentError);
    }

    #[test]
    fn test_break_escaping_function_is_fatal() {
        let program = program(vec![
            Stmt::Function(function("f", &[], vec![brk(None)])),
            expr(call(ident("f"), vec![])),
        ]);
        let err = interpreter(64).run_program(&program, "/main.sl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedProgram);
    }

    #[test]
    fn test_class_without_constructor_cannot_be_created() {
        let program = program(vec![
            Stmt::Class(class("Plain")),
            expr(new(type_ref("Plain"), vec![])),
        ]);
        let err = interpreter(64).run_program(&program, "/main.sl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Instantiation);
    }
}
