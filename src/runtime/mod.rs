// SyntaxLang Runtime Module
// Values, signals, scopes, and the type system the interpreter operates on

pub mod hooks;
mod instance;
mod member;
mod scope;
mod signal;
mod types;
pub mod value;

pub use hooks::{Conversion, Hook};
pub use instance::{EnumConstant, Instance};
pub use member::{AccessContext, Field, Function, Member, Variable};
pub use scope::{ImportedFile, Scope, SourceFile};
pub use signal::{RuntimeError, Signal, TraceElement};
pub use types::{ClassType, EnumType, InterfaceType, TypeEntity, TypeKind};
pub use value::{BigComplex, Value, ValueKind, ValueMap};
