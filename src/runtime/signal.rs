// SyntaxLang control signals and catchable exceptions

use super::value::Value;
use crate::error::StackFrame;
use std::fmt;
use std::rc::Rc;

/// One frame of the program-level call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceElement {
    pub file: Rc<str>,
    pub namespace: Option<Rc<str>>,
    pub class: Option<Rc<str>>,
    pub function: Option<Rc<str>>,
    pub line: usize,
}

impl TraceElement {
    fn qualified(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Same frame as a diagnostic stack frame
    pub fn to_stack_frame(&self) -> StackFrame {
        let function = match (&self.class, &self.function) {
            (Some(class), Some(function)) => format!("{}.{}", self.qualified(class), function),
            (None, Some(function)) => self.qualified(function),
            (Some(class), None) => self.qualified(class),
            (None, None) => "<top>".to_string(),
        };
        StackFrame::new(function, self.file.to_string(), self.line)
    }
}

impl fmt::Display for TraceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.class, &self.function) {
            (Some(class), Some(function)) => write!(
                f,
                "{}@{}#{}:{}",
                self.file,
                self.qualified(class),
                function,
                self.line
            ),
            (Some(class), None) => {
                write!(f, "{}@{}:{}", self.file, self.qualified(class), self.line)
            }
            (None, Some(function)) => {
                write!(f, "{}#{}:{}", self.file, self.qualified(function), self.line)
            }
            (None, None) => match &self.namespace {
                Some(ns) => write!(f, "{}@{}:{}", self.file, ns, self.line),
                None => write!(f, "{}:{}", self.file, self.line),
            },
        }
    }
}

/// A thrown program value together with its derived description
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub value: Value,
    pub kind: Rc<str>,
    pub message: Option<String>,
    /// Outermost frame first; the throw site is last
    pub trace: Vec<TraceElement>,
}

impl RuntimeError {
    pub const GENERIC_KIND: &'static str = "GenericException";

    /// Header line as printed for uncaught exceptions
    pub fn headline(&self) -> String {
        match &self.message {
            Some(message) => format!("Uncaught exception {}: {}", self.kind, message),
            None => format!("Uncaught exception {}", self.kind),
        }
    }

    /// Header plus one `\tat` line per frame, innermost first
    pub fn render(&self) -> String {
        let mut output = self.headline();
        for element in self.trace.iter().rev() {
            output.push_str(&format!("\n\tat {}", element));
        }
        output
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Result of processing one instruction.
///
/// `None` and `Value` fall through; every other variant propagates upward
/// until a construct that handles it.
#[derive(Debug, Clone)]
pub enum Signal {
    None,
    Value(Value),
    Return,
    ReturnValue(Value),
    Yield(Value),
    Break,
    BreakLabel(Rc<str>),
    Continue,
    ContinueLabel(Rc<str>),
    Throw(Box<RuntimeError>),
}

impl Signal {
    pub fn throw(error: RuntimeError) -> Self {
        Signal::Throw(Box::new(error))
    }

    pub fn has_value(&self) -> bool {
        matches!(
            self,
            Signal::Value(_) | Signal::ReturnValue(_) | Signal::Yield(_)
        )
    }

    pub fn has_label(&self) -> bool {
        matches!(self, Signal::BreakLabel(_) | Signal::ContinueLabel(_))
    }

    pub fn has_exception(&self) -> bool {
        matches!(self, Signal::Throw(_))
    }

    pub fn is_fallthrough(&self) -> bool {
        matches!(self, Signal::None | Signal::Value(_))
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Signal::Return | Signal::ReturnValue(_))
    }

    pub fn is_yield(&self) -> bool {
        matches!(self, Signal::Yield(_))
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Signal::Break | Signal::BreakLabel(_))
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Signal::Continue | Signal::ContinueLabel(_))
    }

    pub fn is_throw(&self) -> bool {
        self.has_exception()
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Signal::Value(v) | Signal::ReturnValue(v) | Signal::Yield(v) => Some(v),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&Rc<str>> {
        match self {
            Signal::BreakLabel(label) | Signal::ContinueLabel(label) => Some(label),
            _ => None,
        }
    }

    pub fn exception(&self) -> Option<&RuntimeError> {
        match self {
            Signal::Throw(error) => Some(error),
            _ => None,
        }
    }

    /// Short name for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Signal::None => "nothing",
            Signal::Value(_) => "value",
            Signal::Return | Signal::ReturnValue(_) => "return",
            Signal::Yield(_) => "yield",
            Signal::Break | Signal::BreakLabel(_) => "break",
            Signal::Continue | Signal::ContinueLabel(_) => "continue",
            Signal::Throw(_) => "throw",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(
        namespace: Option<&str>,
        class: Option<&str>,
        function: Option<&str>,
    ) -> TraceElement {
        TraceElement {
            file: Rc::from("main.sl"),
            namespace: namespace.map(Rc::from),
            class: class.map(Rc::from),
            function: function.map(Rc::from),
            line: 3,
        }
    }

    #[test]
    fn test_trace_element_formats() {
        assert_eq!(element(None, None, None).to_string(), "main.sl:3");
        assert_eq!(element(None, None, Some("run")).to_string(), "main.sl#run:3");
        assert_eq!(
            element(None, Some("Box"), Some("get")).to_string(),
            "main.sl@Box#get:3"
        );
        assert_eq!(element(Some("util"), None, None).to_string(), "main.sl@util:3");
        assert_eq!(
            element(Some("util"), None, Some("run")).to_string(),
            "main.sl#util\\run:3"
        );
        assert_eq!(
            element(Some("util"), Some("Box"), Some("get")).to_string(),
            "main.sl@util\\Box#get:3"
        );
    }

    #[test]
    fn test_signal_predicates() {
        let value = Signal::Value(Value::boolean(true));
        assert!(value.is_fallthrough() && value.has_value());
        assert!(Signal::None.is_fallthrough() && !Signal::None.has_value());

        let labeled = Signal::BreakLabel(Rc::from("outer"));
        assert!(labeled.is_break() && labeled.has_label() && !labeled.is_fallthrough());
        assert_eq!(labeled.label().map(|l| l.as_ref()), Some("outer"));

        let ret = Signal::ReturnValue(Value::null());
        assert!(ret.is_return() && ret.has_value());
        assert!(Signal::Return.is_return() && !Signal::Return.has_value());
        assert!(Signal::Yield(Value::null()).is_yield());
        assert!(Signal::ContinueLabel(Rc::from("l")).is_continue());
    }

    #[test]
    fn test_render_uncaught_exception() {
        let error = RuntimeError {
            value: Value::string("boom"),
            kind: Rc::from(RuntimeError::GENERIC_KIND),
            message: Some("boom".to_string()),
            trace: vec![element(None, None, None), element(None, None, Some("f"))],
        };
        let signal = Signal::throw(error);
        assert!(signal.is_throw());
        assert_eq!(
            signal.exception().unwrap().render(),
            "Uncaught exception GenericException: boom\n\tat main.sl#f:3\n\tat main.sl:3"
        );
    }
}
