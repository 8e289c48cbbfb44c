// SyntaxLang Programming Language
// Runtime core: a tree-walking interpreter for statement trees produced by
// the SyntaxLang front end

pub mod ast;
pub mod config;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod loader;
pub mod runtime;

pub use config::Config;
pub use error::{ErrorKind, SyntaxLangError, SyntaxLangResult};
pub use interpreter::{Execution, Interpreter};
pub use loader::{JsonTreeLoader, LoadError, MemoryLoader, SourceLoader};
pub use runtime::{RuntimeError, Value};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber when `RUST_LOG` is set. Safe to call
/// more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
