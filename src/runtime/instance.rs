// SyntaxLang object instances

use super::types::{TypeEntity, TypeKind};
use super::value::Value;
use crate::error::{ErrorKind, Span, SyntaxLangError, SyntaxLangResult};
use rustc_hash::FxHashMap;
use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

/// Name and position of an enum constant
#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub name: Rc<str>,
    pub ordinal: usize,
}

/// Object bound to exactly one type
pub struct Instance {
    ty: Rc<TypeEntity>,
    fields: RefCell<FxHashMap<Rc<str>, Value>>,
    constant: OnceCell<EnumConstant>,
}

impl Instance {
    /// Allocate an instance, rejecting interfaces, abstract classes, and
    /// enums outside their constant-materialization window
    pub fn new(ty: &Rc<TypeEntity>, span: Span, file: &str) -> SyntaxLangResult<Rc<Instance>> {
        let rejection = match ty.kind() {
            TypeKind::Interface(_) => Some("interface"),
            TypeKind::Class(class) if class.is_abstract => Some("abstract class"),
            TypeKind::Enum(enumeration) if !enumeration.constructor_callable() => Some("enum"),
            _ => None,
        };
        if let Some(what) = rejection {
            return Err(SyntaxLangError::new(
                ErrorKind::Instantiation,
                format!("Cannot instantiate {} {}", what, ty.full_name()),
                span,
                file,
            ));
        }
        Ok(Rc::new(Self::allocate(ty.clone())))
    }

    fn allocate(ty: Rc<TypeEntity>) -> Self {
        Self {
            ty,
            fields: RefCell::new(FxHashMap::default()),
            constant: OnceCell::new(),
        }
    }

    pub fn ty(&self) -> &Rc<TypeEntity> {
        &self.ty
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: Rc<str>, value: Value) {
        self.fields.borrow_mut().insert(name, value);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(name)
    }

    /// Identity hash, stable for the lifetime of the instance
    pub fn identity_hash(&self) -> usize {
        self as *const Instance as usize
    }

    /// New instance of the same type with the same field values
    pub fn shallow_copy(&self) -> Rc<Instance> {
        let copy = Self::allocate(self.ty.clone());
        *copy.fields.borrow_mut() = self.fields.borrow().clone();
        Rc::new(copy)
    }

    pub fn enum_constant(&self) -> Option<&EnumConstant> {
        self.constant.get()
    }

    pub(crate) fn mark_constant(&self, constant: EnumConstant) {
        let _ = self.constant.set(constant);
    }
}
