// SyntaxLang name resolution and operator-hook dispatch

use super::{value_of, Evaluated, Interpreter, Outcome};
use crate::ast::TypeRef;
use crate::error::{ErrorKind, Span, SyntaxLangResult};
use crate::instruction::Instruction;
use crate::runtime::{
    AccessContext, Conversion, Hook, Instance, Member, RuntimeError, Scope, Signal, TypeEntity,
    Value, ValueKind,
};
use smallvec::{smallvec, SmallVec};
use std::rc::Rc;

pub(crate) type Args = SmallVec<[Value; 4]>;

impl Interpreter {
    /// Variables, then functions along the scope chain, then members of the
    /// type whose code is running, then files imported without a namespace
    pub(crate) fn resolve_identifier(&mut self, name: &str, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Value> {
        if let Some(variable) = scope.lookup_variable(name) {
            return Ok(variable.get().with_position(span));
        }
        if let Some(function) = scope.lookup_function(name) {
            return Ok(Value::function(function).with_position(span));
        }
        if let Some(owner) = scope.owner() {
            if let Some(member) = owner.resolve_member(&scope.access_context(), name) {
                return self.member_value(member, scope.receiver().as_ref(), name, span, scope);
            }
        }
        if let Some(value) = scope.lookup_imported(None, name) {
            return Ok(value.with_position(span));
        }
        Err(scope.error(
            ErrorKind::UnknownIdentifier,
            format!("Undefined variable '{}'", name),
            span,
        ))
    }

    /// `ns\name`: a top-level declaration of a file imported under `ns`
    pub(crate) fn resolve_scoped(
        &mut self,
        namespace: &str,
        name: &str,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Value> {
        match scope.unmap_namespace(namespace) {
            None => self.resolve_identifier(name, span, scope),
            Some(ns) => scope
                .lookup_imported(Some(ns.as_ref()), name)
                .map(|value| value.with_position(span))
                .ok_or_else(|| {
                    scope.error(
                        ErrorKind::UnknownIdentifier,
                        format!("Undefined variable '{}\\{}'", namespace, name),
                        span,
                    )
                }),
        }
    }

    pub(crate) fn resolve_type_ref(
        &self,
        type_ref: &TypeRef,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Rc<TypeEntity>> {
        scope
            .resolve_type(type_ref.namespace.as_deref(), &type_ref.name)
            .filter(|ty| ty.can_access(&scope.access_context()))
            .ok_or_else(|| {
                scope.error(
                    ErrorKind::UnknownType,
                    format!("Unknown type {}", type_ref),
                    span,
                )
            })
    }

    /// Type named by the target of a member access, when the target is a
    /// bare or namespaced name that denotes a type rather than a value
    pub(crate) fn static_target(&self, target: &Instruction, scope: &Rc<Scope>) -> Option<Rc<TypeEntity>> {
        let ty = match target {
            Instruction::Identifier { name, .. } => {
                if scope.lookup_variable(name).is_some() || scope.lookup_function(name).is_some() {
                    return None;
                }
                scope.resolve_type(None, name)?
            }
            Instruction::Scoped { namespace, name, .. } => scope.resolve_type(Some(namespace.as_ref()), name)?,
            _ => return None,
        };
        ty.can_access(&scope.access_context()).then_some(ty)
    }

    /// Value of a resolved member: static variables and functions directly,
    /// instance members through `receiver`
    pub(crate) fn member_value(
        &mut self,
        member: Member,
        receiver: Option<&Rc<Instance>>,
        name: &str,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Value> {
        let value = match member {
            Member::Variable(field) if field.is_static() => field.static_value().unwrap_or_else(Value::null),
            Member::Function(function) if function.is_static() => Value::function(function),
            member => {
                let Some(receiver) = receiver else {
                    return Err(scope.error(
                        ErrorKind::InvalidOperation,
                        format!("Cannot access instance member {} without an instance", name),
                        span,
                    ));
                };
                match member {
                    Member::Variable(_) => receiver.get_field(name).unwrap_or_else(Value::null),
                    Member::Function(function) => {
                        Value::function(Rc::new(function.bind(receiver.clone())))
                    }
                }
            }
        };
        Ok(value.with_position(span))
    }

    /// `target.name` read access
    pub(crate) fn member(
        &mut self,
        target: &Instruction,
        name: &Rc<str>,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        if let Some(ty) = self.static_target(target, scope) {
            if let Some(constant) = ty.constant(name) {
                return Ok(Outcome::Done(Value::object(constant).with_position(span)));
            }
            let member = ty
                .resolve_member(&scope.access_context(), name)
                .ok_or_else(|| self.unknown_member(&ty, name, span, scope))?;
            let is_static = match &member {
                Member::Variable(field) => field.is_static(),
                Member::Function(function) => function.is_static(),
            };
            if !is_static {
                return Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Cannot access instance member {} of {} statically", name, ty.full_name()),
                    span,
                ));
            }
            return Ok(Outcome::Done(self.member_value(member, None, name, span, scope)?));
        }

        let value = value_of!(self.evaluate(target, scope));
        let Some(instance) = value.as_object() else {
            return Err(scope.error(
                ErrorKind::TypeMismatch,
                format!("Cannot access member {} of {}", name, value.type_name()),
                span,
            ));
        };
        let member = instance
            .ty()
            .resolve_member(&scope.access_context(), name)
            .ok_or_else(|| self.unknown_member(instance.ty(), name, span, scope))?;
        Ok(Outcome::Done(self.member_value(member, Some(instance), name, span, scope)?))
    }

    pub(crate) fn unknown_member(
        &self,
        ty: &TypeEntity,
        name: &str,
        span: Span,
        scope: &Scope,
    ) -> crate::error::SyntaxLangError {
        scope.error(
            ErrorKind::UnknownMember,
            format!("{} has no accessible member {}", ty.full_name(), name),
            span,
        )
    }

    // Hooks

    /// Call `hook` on `instance` when its type declares it. Hooks resolve
    /// with full access; a variable found in place of the hook is fatal.
    pub(crate) fn call_hook(
        &mut self,
        instance: &Rc<Instance>,
        hook: Hook,
        args: Args,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Option<Evaluated>> {
        match instance.ty().resolve_member(&AccessContext::full(), hook.name()) {
            None => Ok(None),
            Some(Member::Variable(_)) => Err(scope.error(
                ErrorKind::InvalidHook,
                format!(
                    "{} of {} is a variable, not a hook",
                    hook.name(),
                    instance.ty().full_name()
                ),
                span,
            )),
            Some(Member::Function(function)) => {
                tracing::trace!(hook = hook.name(), ty = %instance.ty().full_name(), "dispatch hook");
                let bound = Rc::new(function.bind(instance.clone()));
                self.invoke(&bound, args, span, scope).map(Some)
            }
        }
    }

    /// Convert through a conversion hook and check the result tag
    pub(crate) fn convert(
        &mut self,
        instance: &Rc<Instance>,
        hook: Hook,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Option<Evaluated>> {
        let Some(outcome) = self.call_hook(instance, hook, SmallVec::new(), span, scope)? else {
            return Ok(None);
        };
        let value = match outcome {
            Outcome::Done(value) => value,
            interrupted => return Ok(Some(interrupted)),
        };
        if let Some(conversion) = hook.conversion() {
            let matches = match conversion {
                Conversion::String => value.is_string(),
                Conversion::Number => value.is_number(),
                Conversion::Complex => value.is_complex(),
                Conversion::Boolean => value.is_boolean(),
                Conversion::Object => value.is_object(),
            };
            if !matches {
                return Err(scope.error(
                    ErrorKind::HookReturnType,
                    format!(
                        "{} of {} must return {}, got {}",
                        hook.name(),
                        instance.ty().full_name(),
                        conversion.type_name(),
                        value.type_name()
                    ),
                    span,
                ));
            }
        }
        Ok(Some(Outcome::Done(value)))
    }

    /// Like `convert`, but a missing hook is fatal
    pub(crate) fn require_conversion(
        &mut self,
        instance: &Rc<Instance>,
        hook: Hook,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        match self.convert(instance, hook, span, scope)? {
            Some(outcome) => Ok(outcome),
            None => Err(scope.error(
                ErrorKind::InvalidOperation,
                format!("{} does not define {}", instance.ty().full_name(), hook.name()),
                span,
            )),
        }
    }

    /// String form of a value; objects go through `__string` when they
    /// declare it
    pub(crate) fn to_text(&mut self, value: &Value, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Outcome<Rc<str>>> {
        if let Some(instance) = value.as_object() {
            match self.convert(instance, Hook::String, span, scope)? {
                Some(Outcome::Done(text)) => {
                    return Ok(Outcome::Done(text.as_string().cloned().unwrap_or_else(|| Rc::from(""))))
                }
                Some(Outcome::Interrupted(signal)) => return Ok(signal.into()),
                None => {}
            }
        }
        match value.kind() {
            ValueKind::String(text) => Ok(Outcome::Done(text.clone())),
            _ => Ok(Outcome::Done(Rc::from(value.to_string()))),
        }
    }

    pub(crate) fn truthy(&mut self, value: &Value, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Outcome<bool>> {
        if let Some(b) = value.as_boolean() {
            return Ok(Outcome::Done(b));
        }
        if let Some(instance) = value.as_object() {
            match self.convert(instance, Hook::Boolean, span, scope)? {
                Some(Outcome::Done(converted)) => return Ok(Outcome::Done(converted.as_boolean() == Some(true))),
                Some(Outcome::Interrupted(signal)) => return Ok(signal.into()),
                None => {}
            }
        }
        Err(scope.error(
            ErrorKind::TypeMismatch,
            format!("Condition must be Boolean, got {}", value.type_name()),
            span,
        ))
    }

    /// Catchable built-in exception, thrown as a string value
    pub(crate) fn exception(&self, kind: &str, message: String, span: Span, scope: &Scope) -> Signal {
        Signal::throw(scope.build_error(
            Value::string(message.as_str()).with_position(span),
            Rc::from(kind),
            Some(message),
            span,
        ))
    }

    /// Wrap a thrown value. Objects describe themselves through
    /// `getMessage()`; primitives are generic exceptions carrying their text.
    pub(crate) fn throw(&mut self, value: Value, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        let (kind, message) = match value.as_object() {
            Some(instance) => {
                let get_message = instance
                    .ty()
                    .resolve_member(&AccessContext::full(), "getMessage")
                    .and_then(|member| member.as_function().cloned());
                let Some(get_message) = get_message else {
                    return Err(scope.error(
                        ErrorKind::InvalidOperation,
                        format!(
                            "Thrown object {} must define getMessage()",
                            instance.ty().full_name()
                        ),
                        span,
                    ));
                };
                let bound = Rc::new(get_message.bind(instance.clone()));
                let message = value_of!(self.invoke(&bound, smallvec![], span, scope));
                let message = if message.is_null() {
                    None
                } else {
                    Some(value_of!(self.to_text(&message, span, scope)).to_string())
                };
                (Rc::from(instance.ty().full_name().as_str()), message)
            }
            None => {
                let text = value_of!(self.to_text(&value, span, scope));
                (Rc::from(RuntimeError::GENERIC_KIND), Some(text.to_string()))
            }
        };
        let error = scope.build_error(value, kind, message, span);
        tracing::trace!(kind = %error.kind, "throw");
        Ok(Signal::throw(error).into())
    }
}
