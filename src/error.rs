// SyntaxLang Error Handling Module
// Fatal diagnostics with positions, source excerpts, and stack traces

use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a position in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

/// Represents a span in the source code (start to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn single(line: usize, column: usize, offset: usize) -> Self {
        let pos = Position::new(line, column, offset);
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Line the span starts on
    pub fn line(&self) -> usize {
        self.start.line
    }
}

/// Kinds of fatal diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateDeclaration,
    InvalidNamespacePlacement,
    InvalidImport,
    ImportError,
    UnknownType,
    UnknownIdentifier,
    UnknownMember,
    CyclicInheritance,
    InvalidModifier,
    InvalidHook,
    HookReturnType,
    InvalidOperation,
    Instantiation,
    TypeMismatch,
    ArgumentError,
    MalformedProgram,
    StackOverflow,
    InvalidLiteral,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DuplicateDeclaration => "DuplicateDeclarationError",
            ErrorKind::InvalidNamespacePlacement => "InvalidNamespacePlacementError",
            ErrorKind::InvalidImport => "InvalidImportError",
            ErrorKind::ImportError => "ImportError",
            ErrorKind::UnknownType => "UnknownTypeError",
            ErrorKind::UnknownIdentifier => "NameError",
            ErrorKind::UnknownMember => "AttributeError",
            ErrorKind::CyclicInheritance => "CyclicInheritanceError",
            ErrorKind::InvalidModifier => "ModifierError",
            ErrorKind::InvalidHook => "HookError",
            ErrorKind::HookReturnType => "HookReturnTypeError",
            ErrorKind::InvalidOperation => "OperationError",
            ErrorKind::Instantiation => "InstantiationError",
            ErrorKind::TypeMismatch => "TypeError",
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::MalformedProgram => "MalformedProgramError",
            ErrorKind::StackOverflow => "StackOverflowError",
            ErrorKind::InvalidLiteral => "LiteralError",
        };
        write!(f, "{}", name)
    }
}

/// A stack frame for error traces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function_name: String,
    pub file: String,
    pub line: usize,
}

impl StackFrame {
    pub fn new(function_name: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            function_name: function_name.into(),
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  at {} ({}:{})",
            self.function_name,
            self.file.trim_start_matches(r"\\?\"),
            self.line
        )
    }
}

/// Fatal diagnostic. Never observable by program-level try/catch.
#[derive(Debug, Clone)]
pub struct SyntaxLangError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub file: String,
    pub help: Option<String>,
    pub stack_trace: Vec<StackFrame>,
    source_lines: Vec<String>,
}

impl SyntaxLangError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Span,
        file: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            file: file.into(),
            help: None,
            stack_trace: Vec::new(),
            source_lines: Vec::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source_lines = source.lines().map(String::from).collect();
        self
    }

    pub fn with_stack_trace(mut self, trace: Vec<StackFrame>) -> Self {
        self.stack_trace = trace;
        self
    }

    /// Format the error for display
    pub fn format(&self) -> String {
        self.format_with_options(false)
    }

    /// Format the error, optionally keeping every stack frame
    pub fn format_with_options(&self, full_trace: bool) -> String {
        let mut output = String::new();

        // Error header: Kind: message at file:line:column
        let header = format!(
            "{}: {} at {}:{}:{}",
            self.kind.to_string().red().bold(),
            self.message.white().bold(),
            self.file.trim_start_matches(r"\\?\"),
            self.span.start.line,
            self.span.start.column
        );
        output.push_str(&header);
        output.push('\n');

        // Source context (show 3 lines: before, error line, after)
        if !self.source_lines.is_empty() {
            let error_line = self.span.start.line;
            let start_line = if error_line > 1 { error_line - 1 } else { 1 };
            let end_line = (error_line + 1).min(self.source_lines.len());

            output.push('\n');

            for line_num in start_line..=end_line {
                let Some(line_content) = self.source_lines.get(line_num - 1) else {
                    continue;
                };
                let line_num_str = format!("{:>4} |", line_num);

                if line_num == error_line {
                    output.push_str(&format!("{} {}\n", line_num_str.red(), line_content));

                    let spaces = " ".repeat(6 + self.span.start.column);
                    let caret_len = if self.span.end.line == self.span.start.line
                        && self.span.end.column > self.span.start.column
                    {
                        self.span.end.column - self.span.start.column + 1
                    } else {
                        1
                    };
                    let carets = "^".repeat(caret_len);
                    output.push_str(&format!("{}{}\n", spaces, carets.red().bold()));
                } else {
                    output.push_str(&format!("{} {}\n", line_num_str.dimmed(), line_content));
                }
            }
        }

        if let Some(ref help) = self.help {
            output.push_str(&format!("\n      {}: {}\n", "Help".cyan().bold(), help));
        }

        // Stack trace (innermost first, limited to 10 frames unless asked otherwise)
        if !self.stack_trace.is_empty() {
            output.push_str(&format!("\n{}:\n", "Stack trace".yellow().bold()));
            let limit = if full_trace { usize::MAX } else { 10 };
            for frame in self.stack_trace.iter().take(limit) {
                output.push_str(&format!("{}\n", frame));
            }
            if self.stack_trace.len() > limit {
                output.push_str(&format!(
                    "  ... {} more\n",
                    self.stack_trace.len() - limit
                ));
            }
        }

        output
    }
}

impl fmt::Display for SyntaxLangError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for SyntaxLangError {}

/// Result type for fatal diagnostics
pub type SyntaxLangResult<T> = Result<T, SyntaxLangError>;

// Constructors for the kinds raised outside the interpreter's own scope helper
impl SyntaxLangError {
    pub fn type_error(message: impl Into<String>, span: Span, file: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message, span, file)
    }

    pub fn import_error(message: impl Into<String>, span: Span, file: impl Into<String>) -> Self {
        Self::new(ErrorKind::ImportError, message, span, file)
    }
}
