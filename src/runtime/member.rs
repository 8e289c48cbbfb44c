// SyntaxLang functions, variables, and access control

use super::instance::Instance;
use super::scope::{Scope, SourceFile};
use super::types::TypeEntity;
use super::value::Value;
use crate::ast::AccessModifier;
use crate::error::Span;
use crate::instruction::{FieldTemplate, FunctionTemplate};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Where a lookup originates: the accessing file and, inside a method,
/// the type whose code is running
#[derive(Clone)]
pub struct AccessContext {
    file: Option<Rc<SourceFile>>,
    within: Option<Rc<TypeEntity>>,
}

impl AccessContext {
    pub fn new(file: Rc<SourceFile>, within: Option<Rc<TypeEntity>>) -> Self {
        Self {
            file: Some(file),
            within,
        }
    }

    /// Unrestricted lookups (operator hooks, constructors)
    pub fn full() -> Self {
        Self {
            file: None,
            within: None,
        }
    }

    pub fn within(&self) -> Option<&Rc<TypeEntity>> {
        self.within.as_ref()
    }

    /// Visibility of something declared with `access` inside `declaring`
    pub fn permits(&self, access: AccessModifier, declaring: &TypeEntity) -> bool {
        let Some(file) = &self.file else {
            return true;
        };
        let same_file = file.path() == declaring.file().path();
        match access {
            AccessModifier::Public | AccessModifier::Default => true,
            AccessModifier::Private => same_file,
            AccessModifier::Protected => {
                same_file
                    || self
                        .within
                        .as_ref()
                        .is_some_and(|within| within.is_instance_of(declaring))
            }
        }
    }
}

/// A function closed over its defining scope
pub struct Function {
    template: Rc<FunctionTemplate>,
    closure: Rc<Scope>,
    owner: Option<Weak<TypeEntity>>,
    receiver: Option<Rc<Instance>>,
}

impl Function {
    pub fn new(template: Rc<FunctionTemplate>, closure: Rc<Scope>) -> Self {
        Self {
            template,
            closure,
            owner: None,
            receiver: None,
        }
    }

    /// Function declared in a type body
    pub fn member(template: Rc<FunctionTemplate>, closure: Rc<Scope>, owner: Weak<TypeEntity>) -> Self {
        Self {
            template,
            closure,
            owner: Some(owner),
            receiver: None,
        }
    }

    /// Copy of this method with `this` bound to `receiver`
    pub fn bind(&self, receiver: Rc<Instance>) -> Self {
        Self {
            template: self.template.clone(),
            closure: self.closure.clone(),
            owner: self.owner.clone(),
            receiver: Some(receiver),
        }
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn template(&self) -> &Rc<FunctionTemplate> {
        &self.template
    }

    pub fn closure(&self) -> &Rc<Scope> {
        &self.closure
    }

    pub fn owner(&self) -> Option<Rc<TypeEntity>> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    pub fn receiver(&self) -> Option<&Rc<Instance>> {
        self.receiver.as_ref()
    }

    pub fn access(&self) -> AccessModifier {
        self.template.access
    }

    pub fn is_static(&self) -> bool {
        self.template.is_static
    }
}

/// Scope-level variable
pub struct Variable {
    name: Rc<str>,
    is_final: bool,
    value: RefCell<Value>,
    span: Span,
}

impl Variable {
    pub fn new(name: Rc<str>, value: Value, is_final: bool, span: Span) -> Self {
        Self {
            name,
            is_final,
            value: RefCell::new(value),
            span,
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Overwrite the value; callers enforce `final`
    pub fn set(&self, value: Value) {
        *self.value.borrow_mut() = value;
    }
}

/// Variable declared in a class or enum body. Static fields keep their
/// value here, instance fields live on each `Instance`.
pub struct Field {
    template: Rc<FieldTemplate>,
    static_value: RefCell<Option<Value>>,
}

impl Field {
    pub fn new(template: Rc<FieldTemplate>) -> Self {
        Self {
            template,
            static_value: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.template.name
    }

    pub fn template(&self) -> &Rc<FieldTemplate> {
        &self.template
    }

    pub fn access(&self) -> AccessModifier {
        self.template.access
    }

    pub fn is_static(&self) -> bool {
        self.template.is_static
    }

    pub fn is_final(&self) -> bool {
        self.template.is_final
    }

    pub fn static_value(&self) -> Option<Value> {
        self.static_value.borrow().clone()
    }

    pub fn set_static_value(&self, value: Value) {
        *self.static_value.borrow_mut() = Some(value);
    }
}

/// Result of member resolution
#[derive(Clone)]
pub enum Member {
    Function(Rc<Function>),
    Variable(Rc<Field>),
}

impl Member {
    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Member::Function(function) => Some(function),
            Member::Variable(_) => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Rc<Field>> {
        match self {
            Member::Variable(field) => Some(field),
            Member::Function(_) => None,
        }
    }
}
