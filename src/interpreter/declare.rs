// SyntaxLang declarations, assignment, and imports

use super::{value_of, Evaluated, Interpreter, Outcome};
use crate::ast::AssignOp;
use crate::error::{ErrorKind, Span, SyntaxLangResult};
use crate::instruction::{
    build_program, ConstantTemplate, FieldTemplate, FunctionTemplate, Instruction, TypeShape,
    TypeTemplate,
};
use crate::loader;
use crate::runtime::{
    EnumConstant, Field, Function, Instance, Member, Scope, Signal, TypeEntity, Value, ValueKind,
    Variable,
};
use std::path::Path;
use std::rc::Rc;

impl Interpreter {
    /// Declare the functions and types of a statement list before any of
    /// its statements run, so declarations may refer to each other in any
    /// order
    pub(crate) fn hoist(&mut self, instructions: &[Instruction], scope: &Rc<Scope>) -> SyntaxLangResult<Signal> {
        let mut functions = Vec::new();
        let mut types = Vec::new();
        for instruction in instructions {
            match instruction {
                Instruction::DeclareFunction(template) => functions.push(template),
                Instruction::DeclareType(template) => types.push(template),
                _ => {}
            }
        }
        self.declare_functions(&functions, scope)?;
        if types.is_empty() {
            return Ok(Signal::None);
        }
        self.declare_types(&types, scope)
    }

    pub(crate) fn declare_functions(
        &mut self,
        templates: &[&Rc<FunctionTemplate>],
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<()> {
        for template in templates {
            if !template.has_body() {
                return Err(scope.error(
                    ErrorKind::InvalidModifier,
                    format!("Function {} must have a body", template.name),
                    template.span,
                ));
            }
            let function = Function::new((*template).clone(), scope.clone());
            scope.declare_function(Rc::new(function), template.span)?;
        }
        Ok(())
    }

    /// Register every type first, then link, verify, and initialize them.
    /// Initialization materializes enum constants and evaluates static
    /// fields; a throw there stops the declaration.
    pub(crate) fn declare_types(
        &mut self,
        templates: &[&Rc<TypeTemplate>],
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Signal> {
        let mut entities = Vec::with_capacity(templates.len());
        for template in templates {
            let entity = TypeEntity::declare((*template).clone(), scope)?;
            scope.declare_type(entity.clone())?;
            entities.push(entity);
        }
        for entity in &entities {
            entity.link()?;
        }
        for entity in &entities {
            entity.verify()?;
        }
        for entity in &entities {
            let signal = self.materialize(entity)?;
            if !signal.is_fallthrough() {
                return Ok(signal);
            }
            let signal = self.initialize_statics(entity)?;
            if !signal.is_fallthrough() {
                return Ok(signal);
            }
        }
        Ok(Signal::None)
    }

    /// Create the constants of an enum, in declaration order, with its
    /// constructor window open
    fn materialize(&mut self, ty: &Rc<TypeEntity>) -> SyntaxLangResult<Signal> {
        let TypeShape::Enum { constants, .. } = &ty.template().shape else {
            return Ok(Signal::None);
        };
        ty.set_constructor_callable(true);
        let result = self.create_constants(ty, constants);
        ty.set_constructor_callable(false);
        if result.is_ok() {
            tracing::debug!(name = %ty.name(), constants = constants.len(), "materialized enum");
        }
        result
    }

    fn create_constants(&mut self, ty: &Rc<TypeEntity>, constants: &[ConstantTemplate]) -> SyntaxLangResult<Signal> {
        let scope = ty.scope().clone();
        for (ordinal, template) in constants.iter().enumerate() {
            let args = value_of!(self.arguments(&template.args, &scope));
            let constant = EnumConstant {
                name: template.name.clone(),
                ordinal,
            };
            let instance = value_of!(self.create_constant(ty, constant, args, template.span, &scope));
            ty.push_constant(instance);
        }
        Ok(Signal::None)
    }

    fn initialize_statics(&mut self, ty: &Rc<TypeEntity>) -> SyntaxLangResult<Signal> {
        let scope = ty.scope().clone();
        for template in ty.template().fields.iter().filter(|field| field.is_static) {
            let value = value_of!(self.evaluate(&template.value, &scope));
            if let Some(field) = ty.fields().get(&template.name) {
                field.set_static_value(value);
            }
        }
        Ok(Signal::None)
    }

    /// `[modifiers] name = value`. Without modifiers an already visible
    /// name is assigned instead of declared.
    pub(crate) fn declare_variable(&mut self, field: &Rc<FieldTemplate>, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        let value = value_of!(self.evaluate(&field.value, scope));
        if !field.has_modifiers() && self.is_assignable(&field.name, scope) {
            self.store_identifier(&field.name, value.clone(), field.span, scope)?;
            return Ok(Outcome::Done(value));
        }
        scope.declare_variable(Rc::new(Variable::new(
            field.name.clone(),
            value.clone(),
            field.is_final,
            field.span,
        )))?;
        Ok(Outcome::Done(value))
    }

    fn is_assignable(&self, name: &str, scope: &Rc<Scope>) -> bool {
        if scope.lookup_variable(name).is_some() {
            return true;
        }
        scope.owner().is_some_and(|owner| {
            matches!(
                owner.resolve_member(&scope.access_context(), name),
                Some(Member::Variable(_))
            )
        })
    }

    /// `target = value` and the compound forms. A compound assignment reads
    /// the target before evaluating the right side.
    pub(crate) fn assign(
        &mut self,
        target: &Instruction,
        op: AssignOp,
        value: &Instruction,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Evaluated> {
        let value = match op.binary_op() {
            Some(binary) => {
                let current = value_of!(self.evaluate(target, scope));
                let right = value_of!(self.evaluate(value, scope));
                value_of!(self.apply_binary(binary, current, right, span, scope))
            }
            None => value_of!(self.evaluate(value, scope)),
        };
        value_of!(self.store(target, value.clone(), span, scope));
        Ok(Outcome::Done(value))
    }

    /// Write `value` into an assignable target. Lists and maps are values,
    /// so an indexed store rebuilds the container and stores it back.
    pub(crate) fn store(
        &mut self,
        target: &Instruction,
        value: Value,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Outcome<()>> {
        match target {
            Instruction::Identifier { name, .. } => {
                self.store_identifier(name, value, span, scope)?;
            }
            Instruction::Member {
                target: receiver,
                name,
                ..
            } => {
                if let Some(ty) = self.static_target(receiver, scope) {
                    let field = self.field(&ty, name, span, scope)?;
                    self.write_field(&field, None, value, span, scope)?;
                    return Ok(Outcome::Done(()));
                }
                let receiver = value_of!(self.evaluate(receiver, scope));
                let Some(instance) = receiver.as_object() else {
                    return Err(scope.error(
                        ErrorKind::TypeMismatch,
                        format!("Cannot assign member {} of {}", name, receiver.type_name()),
                        span,
                    ));
                };
                let field = self.field(instance.ty(), name, span, scope)?;
                self.write_field(&field, Some(instance), value, span, scope)?;
            }
            Instruction::Index {
                target: container,
                index,
                ..
            } => {
                let current = value_of!(self.evaluate(container, scope));
                let key = value_of!(self.evaluate(index, scope));
                let updated = match current.kind() {
                    ValueKind::List(values) => {
                        let Some(position) = self.position(&key, values.len(), span, scope)? else {
                            return Ok(self.out_of_bounds(&key, values.len(), span, scope).into());
                        };
                        let mut values = values.to_vec();
                        values[position] = value;
                        Value::list(values)
                    }
                    ValueKind::Map(map) => {
                        if key.is_null() {
                            return Err(scope.error(ErrorKind::TypeMismatch, "Map key must not be null", span));
                        }
                        let mut map = (**map).clone();
                        map.insert(key, value);
                        Value::map(map)
                    }
                    _ => {
                        return Err(scope.error(
                            ErrorKind::InvalidOperation,
                            format!("Cannot assign to an index of {}", current.type_name()),
                            span,
                        ))
                    }
                };
                return self.store(container, updated, span, scope);
            }
            Instruction::Scoped { namespace, name, .. } => {
                return Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Cannot assign to imported name {}\\{}", namespace, name),
                    span,
                ))
            }
            _ => {
                return Err(scope.error(
                    ErrorKind::InvalidOperation,
                    "Invalid assignment target",
                    target.span(),
                ))
            }
        }
        Ok(Outcome::Done(()))
    }

    /// Assign a visible variable, or a field of the type whose code is running
    fn store_identifier(&mut self, name: &str, value: Value, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<()> {
        if let Some(variable) = scope.lookup_variable(name) {
            if variable.is_final() {
                return Err(scope.error(
                    ErrorKind::InvalidOperation,
                    format!("Cannot assign to final variable {}", name),
                    span,
                ));
            }
            variable.set(value);
            return Ok(());
        }
        if let Some(owner) = scope.owner() {
            if let Some(Member::Variable(field)) = owner.resolve_member(&scope.access_context(), name) {
                return self.write_field(&field, scope.receiver().as_ref(), value, span, scope);
            }
        }
        Err(scope.error(
            ErrorKind::UnknownIdentifier,
            format!("Undefined variable '{}'", name),
            span,
        ))
    }

    /// Accessible variable member `name` of `ty`
    fn field(&self, ty: &TypeEntity, name: &str, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Rc<Field>> {
        match ty.resolve_member(&scope.access_context(), name) {
            Some(Member::Variable(field)) => Ok(field),
            Some(Member::Function(_)) => Err(scope.error(
                ErrorKind::InvalidOperation,
                format!("Cannot assign to function {} of {}", name, ty.full_name()),
                span,
            )),
            None => Err(self.unknown_member(ty, name, span, scope)),
        }
    }

    fn write_field(
        &self,
        field: &Field,
        receiver: Option<&Rc<Instance>>,
        value: Value,
        span: Span,
        scope: &Scope,
    ) -> SyntaxLangResult<()> {
        if field.is_final() {
            return Err(scope.error(
                ErrorKind::InvalidOperation,
                format!("Cannot assign to final field {}", field.name()),
                span,
            ));
        }
        if field.is_static() {
            field.set_static_value(value);
            return Ok(());
        }
        let Some(receiver) = receiver else {
            return Err(scope.error(
                ErrorKind::InvalidOperation,
                format!("Cannot access instance member {} without an instance", field.name()),
                span,
            ));
        };
        receiver.set_field(field.name().clone(), value);
        Ok(())
    }

    /// `import "path"`: resolve against the importing file, run the file in
    /// its sibling scope, then make its declarations visible
    pub(crate) fn import(&mut self, path: &str, span: Span, scope: &Rc<Scope>) -> SyntaxLangResult<Signal> {
        let base = scope.file().path().parent().unwrap_or_else(|| Path::new(""));
        let requested = loader::normalize(&base.join(path));
        if let Ok(canonical) = self.loader.canonicalize(&requested) {
            if self.loading.contains(&canonical) {
                return Err(scope.error(
                    ErrorKind::InvalidImport,
                    format!("Cyclic import of {}", canonical.display()),
                    span,
                ));
            }
        }

        let imported = scope.import_file(
            &requested,
            self.loader.as_ref(),
            &self.config.source_extension,
            span,
        )?;
        let instructions = build_program(&imported.program, imported.scope.file_name())?;
        self.loading.push(imported.path.clone());
        let result = self.execute_statements(&instructions, &imported.scope);
        self.loading.pop();

        match result? {
            signal @ Signal::Throw(_) => return Ok(signal),
            signal if signal.is_fallthrough() => {}
            signal => {
                return Err(imported.scope.error(
                    ErrorKind::MalformedProgram,
                    format!("Unexpected {} at top level", signal.describe()),
                    instructions.last().map(Instruction::span).unwrap_or_default(),
                ))
            }
        }
        scope.register_import(&imported);
        Ok(Signal::None)
    }
}
