// SyntaxLang type entities
// Classes, interfaces, and enums: registration, linking, member
// resolution, and subtype tests

use super::hooks::{self, ENUM_RESERVED};
use super::instance::Instance;
use super::member::{AccessContext, Field, Function, Member};
use super::scope::{Scope, SourceFile};
use crate::ast::{AccessModifier, ClassModifier, FunctionModifier, TypeRef};
use crate::error::{ErrorKind, Span, SyntaxLangResult};
use crate::instruction::{TypeShape, TypeTemplate};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub struct ClassType {
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_cloneable: bool,
    extended: RefCell<Option<Rc<TypeEntity>>>,
    interfaces: RefCell<Vec<Rc<TypeEntity>>>,
}

impl ClassType {
    pub fn extended(&self) -> Option<Rc<TypeEntity>> {
        self.extended.borrow().clone()
    }
}

pub struct InterfaceType {
    extended: RefCell<Vec<Rc<TypeEntity>>>,
}

pub struct EnumType {
    interfaces: RefCell<Vec<Rc<TypeEntity>>>,
    constant_names: Vec<Rc<str>>,
    constants: RefCell<Vec<Rc<Instance>>>,
    constructor_callable: Cell<bool>,
}

impl EnumType {
    /// Open only while constants are being materialized
    pub fn constructor_callable(&self) -> bool {
        self.constructor_callable.get()
    }

    pub fn constant_names(&self) -> &[Rc<str>] {
        &self.constant_names
    }
}

pub enum TypeKind {
    Class(ClassType),
    Interface(InterfaceType),
    Enum(EnumType),
}

/// Declared class, interface, or enum
pub struct TypeEntity {
    template: Rc<TypeTemplate>,
    scope: Rc<Scope>,
    functions: FxHashMap<Rc<str>, Rc<Function>>,
    fields: FxHashMap<Rc<str>, Rc<Field>>,
    kind: TypeKind,
}

/// Outcome of a member search along one branch of the hierarchy
enum Lookup {
    Missing,
    Denied,
    Found(Member),
}

impl TypeEntity {
    /// Build a type skeleton inside `declaring`. No other type is looked up
    /// here; extends/implements are resolved by `link`.
    pub fn declare(template: Rc<TypeTemplate>, declaring: &Rc<Scope>) -> SyntaxLangResult<Rc<TypeEntity>> {
        Self::validate(&template, declaring)?;
        Ok(Rc::new_cyclic(|weak| {
            let scope = declaring.build_type_body(weak.clone());
            let functions = template
                .functions
                .iter()
                .map(|function| {
                    let member = Function::member(function.clone(), scope.clone(), weak.clone());
                    (function.name.clone(), Rc::new(member))
                })
                .collect();
            let fields = template
                .fields
                .iter()
                .map(|field| (field.name.clone(), Rc::new(Field::new(field.clone()))))
                .collect();
            let kind = match &template.shape {
                TypeShape::Class {
                    cloneable,
                    modifier,
                    ..
                } => TypeKind::Class(ClassType {
                    is_abstract: *modifier == Some(ClassModifier::Abstract),
                    is_final: *modifier == Some(ClassModifier::Final),
                    is_cloneable: *cloneable,
                    extended: RefCell::new(None),
                    interfaces: RefCell::new(Vec::new()),
                }),
                TypeShape::Interface { .. } => TypeKind::Interface(InterfaceType {
                    extended: RefCell::new(Vec::new()),
                }),
                TypeShape::Enum { constants, .. } => TypeKind::Enum(EnumType {
                    interfaces: RefCell::new(Vec::new()),
                    constant_names: constants.iter().map(|c| c.name.clone()).collect(),
                    constants: RefCell::new(Vec::new()),
                    constructor_callable: Cell::new(false),
                }),
            };
            TypeEntity {
                template: template.clone(),
                scope,
                functions,
                fields,
                kind,
            }
        }))
    }

    fn validate(template: &TypeTemplate, scope: &Scope) -> SyntaxLangResult<()> {
        let name = &template.name;
        let (is_enum, is_interface, cloneable, is_abstract) = match &template.shape {
            TypeShape::Class {
                cloneable,
                modifier,
                ..
            } => (false, false, *cloneable, *modifier == Some(ClassModifier::Abstract)),
            TypeShape::Interface { .. } => (false, true, false, false),
            TypeShape::Enum { .. } => (true, false, false, false),
        };

        let mut taken: FxHashSet<&str> = FxHashSet::default();
        if let TypeShape::Enum { constants, .. } = &template.shape {
            for constant in constants {
                if !taken.insert(constant.name.as_ref()) {
                    return Err(scope.error(
                        ErrorKind::DuplicateDeclaration,
                        format!("Enum constant {} is already declared in {}", constant.name, name),
                        constant.span,
                    ));
                }
            }
        }

        for field in &template.fields {
            if is_enum && ENUM_RESERVED.contains(&field.name.as_ref()) {
                return Err(scope.error(
                    ErrorKind::InvalidModifier,
                    format!("{} is reserved in enum {}", field.name, name),
                    field.span,
                ));
            }
            if !taken.insert(field.name.as_ref()) {
                return Err(scope.error(
                    ErrorKind::DuplicateDeclaration,
                    format!("Variable {} is already defined in {}", field.name, name),
                    field.span,
                ));
            }
        }

        for function in &template.functions {
            if !taken.insert(function.name.as_ref()) {
                return Err(scope.error(
                    ErrorKind::DuplicateDeclaration,
                    format!("Function {} is already declared in {}", function.name, name),
                    function.span,
                ));
            }
            hooks::check_declaration(function, name, cloneable, is_enum, scope)?;

            let invalid = |message: String| -> SyntaxLangResult<()> {
                Err(scope.error(ErrorKind::InvalidModifier, message, function.span))
            };
            if is_interface {
                if matches!(
                    function.modifier,
                    Some(FunctionModifier::Abstract | FunctionModifier::Final)
                ) {
                    return invalid(format!(
                        "Interface function {} cannot be abstract or final",
                        function.name
                    ));
                }
                if matches!(
                    function.access,
                    AccessModifier::Private | AccessModifier::Protected
                ) {
                    return invalid(format!(
                        "Interface function {} cannot be private or protected",
                        function.name
                    ));
                }
                if function.modifier == Some(FunctionModifier::Default) && !function.has_body() {
                    return invalid(format!("Default function {} needs a body", function.name));
                }
                continue;
            }
            if function.modifier == Some(FunctionModifier::Default) {
                return invalid(format!(
                    "Only interface functions can be default: {}",
                    function.name
                ));
            }
            if function.is_abstract() {
                if function.has_body() {
                    return invalid(format!("Abstract function {} cannot have a body", function.name));
                }
                if !is_abstract {
                    return invalid(format!(
                        "Abstract function {} in non-abstract {} {}",
                        function.name,
                        if is_enum { "enum" } else { "class" },
                        name
                    ));
                }
            } else if !function.has_body() {
                return invalid(format!(
                    "Function {} must have a body or be abstract",
                    function.name
                ));
            }
        }
        Ok(())
    }

    // Linking

    fn resolve_ref(&self, type_ref: &TypeRef, what: &str) -> SyntaxLangResult<Rc<TypeEntity>> {
        let found = self
            .scope
            .resolve_type(type_ref.namespace.as_deref(), &type_ref.name)
            .filter(|entity| entity.can_access(&self.scope.access_context()));
        found.ok_or_else(|| {
            self.scope.error(
                ErrorKind::UnknownType,
                format!("Cannot {} {}", what, type_ref),
                type_ref.span,
            )
        })
    }

    /// Second registration pass: resolve extends/implements against the
    /// fully populated scope
    pub fn link(&self) -> SyntaxLangResult<()> {
        match &self.template.shape {
            TypeShape::Class {
                extends,
                implements,
                ..
            } => {
                let extended = match extends {
                    Some(type_ref) => Some(self.link_superclass(type_ref)?),
                    None => None,
                };
                let interfaces = self.link_interfaces(implements, "implement")?;
                if let TypeKind::Class(class) = &self.kind {
                    *class.extended.borrow_mut() = extended;
                    *class.interfaces.borrow_mut() = interfaces;
                }
            }
            TypeShape::Interface { extends } => {
                let extended = self.link_interfaces(extends, "extend")?;
                if let TypeKind::Interface(interface) = &self.kind {
                    *interface.extended.borrow_mut() = extended;
                }
            }
            TypeShape::Enum { implements, .. } => {
                let interfaces = self.link_interfaces(implements, "implement")?;
                if let TypeKind::Enum(enumeration) = &self.kind {
                    *enumeration.interfaces.borrow_mut() = interfaces;
                }
            }
        }
        tracing::debug!(name = %self.name(), "linked type");
        Ok(())
    }

    fn link_superclass(&self, type_ref: &TypeRef) -> SyntaxLangResult<Rc<TypeEntity>> {
        let parent = self.resolve_ref(type_ref, "extend unknown class")?;
        match parent.kind() {
            TypeKind::Class(class) if class.is_final => Err(self.scope.error(
                ErrorKind::InvalidModifier,
                format!("Cannot extend final class {}", parent.full_name()),
                type_ref.span,
            )),
            TypeKind::Class(_) => Ok(parent),
            _ => Err(self.scope.error(
                ErrorKind::TypeMismatch,
                format!("Can only extend classes, {} is not a class", type_ref),
                type_ref.span,
            )),
        }
    }

    fn link_interfaces(&self, refs: &[TypeRef], verb: &str) -> SyntaxLangResult<Vec<Rc<TypeEntity>>> {
        refs.iter()
            .map(|type_ref| {
                let entity = self.resolve_ref(type_ref, &format!("{} unknown interface", verb))?;
                if !entity.is_interface() {
                    return Err(self.scope.error(
                        ErrorKind::TypeMismatch,
                        format!("Can only {} interfaces, {} is not an interface", verb, type_ref),
                        type_ref.span,
                    ));
                }
                Ok(entity)
            })
            .collect()
    }

    /// Post-link checks: inheritance cycles, then abstract coverage of
    /// concrete classes and enums
    pub fn verify(self: &Rc<Self>) -> SyntaxLangResult<()> {
        let mut visited: FxHashSet<*const TypeEntity> = FxHashSet::default();
        let mut pending = self.direct_supertypes();
        while let Some(entity) = pending.pop() {
            if Rc::ptr_eq(&entity, self) {
                return Err(self.scope.error(
                    ErrorKind::CyclicInheritance,
                    format!("Cyclic inheritance involving {}", self.full_name()),
                    self.span(),
                ));
            }
            if visited.insert(Rc::as_ptr(&entity)) {
                pending.extend(entity.direct_supertypes());
            }
        }

        let concrete = match &self.kind {
            TypeKind::Class(class) => !class.is_abstract,
            TypeKind::Enum(_) => true,
            TypeKind::Interface(_) => false,
        };
        if !concrete {
            return Ok(());
        }
        for required in self.required_functions() {
            let implemented = self
                .resolve_member(&AccessContext::full(), &required)
                .and_then(|member| member.as_function().cloned())
                .is_some_and(|function| function.template().has_body());
            if !implemented {
                return Err(self.scope.error(
                    ErrorKind::InvalidModifier,
                    format!(
                        "{} must implement abstract function {}",
                        self.full_name(),
                        required
                    ),
                    self.span(),
                ));
            }
        }
        Ok(())
    }

    /// Abstract class functions and bodyless interface functions along the
    /// whole hierarchy
    fn required_functions(self: &Rc<Self>) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = Vec::new();
        let mut visited: FxHashSet<*const TypeEntity> = FxHashSet::default();
        let mut pending = vec![self.clone()];
        while let Some(entity) = pending.pop() {
            if !visited.insert(Rc::as_ptr(&entity)) {
                continue;
            }
            for function in entity.functions.values() {
                let template = function.template();
                let required = template.is_abstract() || (entity.is_interface() && !template.has_body());
                if required && !names.contains(&template.name) {
                    names.push(template.name.clone());
                }
            }
            pending.extend(entity.direct_supertypes());
        }
        names
    }

    // Accessors

    pub fn name(&self) -> &Rc<str> {
        &self.template.name
    }

    /// Name qualified with the declaring file's namespace
    pub fn full_name(&self) -> String {
        match self.scope.namespace() {
            Some(ns) => format!("{}\\{}", ns, self.template.name),
            None => self.template.name.to_string(),
        }
    }

    pub fn access(&self) -> AccessModifier {
        self.template.access
    }

    pub fn span(&self) -> Span {
        self.template.span
    }

    pub fn template(&self) -> &Rc<TypeTemplate> {
        &self.template
    }

    /// Body scope; methods close over it
    pub fn scope(&self) -> &Rc<Scope> {
        &self.scope
    }

    pub fn file(&self) -> &Rc<SourceFile> {
        self.scope.file()
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn functions(&self) -> &FxHashMap<Rc<str>, Rc<Function>> {
        &self.functions
    }

    pub fn fields(&self) -> &FxHashMap<Rc<str>, Rc<Field>> {
        &self.fields
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    pub fn is_cloneable(&self) -> bool {
        matches!(&self.kind, TypeKind::Class(class) if class.is_cloneable)
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match &self.kind {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.kind {
            TypeKind::Enum(enumeration) => Some(enumeration),
            _ => None,
        }
    }

    /// Extended class first, then implemented (or extended) interfaces
    pub fn direct_supertypes(&self) -> Vec<Rc<TypeEntity>> {
        match &self.kind {
            TypeKind::Class(class) => {
                let mut supertypes: Vec<Rc<TypeEntity>> = class.extended().into_iter().collect();
                supertypes.extend(class.interfaces.borrow().iter().cloned());
                supertypes
            }
            TypeKind::Interface(interface) => interface.extended.borrow().clone(),
            TypeKind::Enum(enumeration) => enumeration.interfaces.borrow().clone(),
        }
    }

    /// Class chain from the root base class down to this type
    pub fn class_chain(self: &Rc<Self>) -> Vec<Rc<TypeEntity>> {
        let mut chain = vec![self.clone()];
        let mut visited: FxHashSet<*const TypeEntity> = FxHashSet::default();
        visited.insert(Rc::as_ptr(self));
        loop {
            let next = chain
                .last()
                .and_then(|entity| entity.as_class())
                .and_then(ClassType::extended);
            match next {
                Some(parent) if visited.insert(Rc::as_ptr(&parent)) => chain.push(parent),
                _ => break,
            }
        }
        chain.reverse();
        chain
    }

    // Enum constants

    pub fn constants(&self) -> Vec<Rc<Instance>> {
        self.as_enum()
            .map(|enumeration| enumeration.constants.borrow().clone())
            .unwrap_or_default()
    }

    pub fn constant(&self, name: &str) -> Option<Rc<Instance>> {
        let enumeration = self.as_enum()?;
        let constants = enumeration.constants.borrow();
        constants
            .iter()
            .find(|instance| {
                instance
                    .enum_constant()
                    .is_some_and(|constant| constant.name.as_ref() == name)
            })
            .cloned()
    }

    pub(crate) fn set_constructor_callable(&self, callable: bool) {
        if let Some(enumeration) = self.as_enum() {
            enumeration.constructor_callable.set(callable);
        }
    }

    pub(crate) fn push_constant(&self, instance: Rc<Instance>) {
        if let Some(enumeration) = self.as_enum() {
            enumeration.constants.borrow_mut().push(instance);
        }
    }

    // Access and resolution

    pub fn can_access(&self, ctx: &AccessContext) -> bool {
        ctx.permits(self.template.access, self)
    }

    /// First accessible member named `name`: own functions, own variables,
    /// then the supertypes in order. A match that is not accessible ends
    /// the search with nothing.
    pub fn resolve_member(&self, ctx: &AccessContext, name: &str) -> Option<Member> {
        let mut visited: FxHashSet<*const TypeEntity> = FxHashSet::default();
        match self.lookup(ctx, name, &mut visited) {
            Lookup::Found(member) => Some(member),
            Lookup::Missing | Lookup::Denied => None,
        }
    }

    fn lookup(&self, ctx: &AccessContext, name: &str, visited: &mut FxHashSet<*const TypeEntity>) -> Lookup {
        if !visited.insert(self as *const TypeEntity) || !self.can_access(ctx) {
            return Lookup::Missing;
        }
        if let TypeKind::Enum(enumeration) = &self.kind {
            if name == self.name().as_ref() && !enumeration.constructor_callable() {
                return Lookup::Denied;
            }
        }
        if let Some(function) = self.functions.get(name) {
            return if ctx.permits(function.access(), self) {
                Lookup::Found(Member::Function(function.clone()))
            } else {
                Lookup::Denied
            };
        }
        if let Some(field) = self.fields.get(name) {
            return if ctx.permits(field.access(), self) {
                Lookup::Found(Member::Variable(field.clone()))
            } else {
                Lookup::Denied
            };
        }
        for supertype in self.direct_supertypes() {
            match supertype.lookup(ctx, name, visited) {
                Lookup::Missing => continue,
                found => return found,
            }
        }
        Lookup::Missing
    }

    /// Reflexive, transitive subtype test
    pub fn is_instance_of(&self, target: &TypeEntity) -> bool {
        if std::ptr::eq(self, target) {
            return true;
        }
        let mut visited: FxHashSet<*const TypeEntity> = FxHashSet::default();
        let mut pending = self.direct_supertypes();
        while let Some(entity) = pending.pop() {
            if std::ptr::eq(Rc::as_ptr(&entity), target) {
                return true;
            }
            if visited.insert(Rc::as_ptr(&entity)) {
                pending.extend(entity.direct_supertypes());
            }
        }
        false
    }
}
