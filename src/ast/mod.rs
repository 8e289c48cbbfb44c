// SyntaxLang AST Module
// Statement tree handed over by the front end

pub mod build;
mod expr;
mod stmt;

pub use expr::*;
pub use stmt::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared visibility of a type or member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessModifier {
    #[default]
    Default,
    Public,
    Private,
    Protected,
}

impl fmt::Display for AccessModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessModifier::Default => "default",
            AccessModifier::Public => "public",
            AccessModifier::Private => "private",
            AccessModifier::Protected => "protected",
        };
        f.write_str(name)
    }
}
