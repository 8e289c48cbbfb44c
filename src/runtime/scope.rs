// SyntaxLang Scope
// Lexical environment: declarations, namespace, imports, and the
// call-stack snapshot used for traces

use super::instance::Instance;
use super::member::{AccessContext, Function, Variable};
use super::signal::{RuntimeError, TraceElement};
use super::types::TypeEntity;
use super::value::Value;
use crate::ast::Program;
use crate::error::{ErrorKind, Span, StackFrame, SyntaxLangError, SyntaxLangResult};
use crate::loader::SourceLoader;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// A loaded source unit
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    name: Rc<str>,
    source: Option<Rc<str>>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, source: Option<&str>) -> Rc<Self> {
        let path = path.into();
        let name = Rc::from(path.to_string_lossy().as_ref());
        Rc::new(Self {
            path,
            name,
            source: source.map(Rc::from),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Code location a scope executes in: the owning type and function, if any
#[derive(Default)]
struct Frame {
    owner: Option<Weak<TypeEntity>>,
    function: Option<Rc<str>>,
}

/// A file that passed import validation and is ready to run
#[derive(Debug)]
pub struct ImportedFile {
    pub path: PathBuf,
    pub program: Program,
    pub scope: Rc<Scope>,
}

pub struct Scope {
    file: Rc<SourceFile>,
    parent: Option<Rc<Scope>>,
    functions: RefCell<FxHashMap<Rc<str>, Rc<Function>>>,
    variables: RefCell<FxHashMap<Rc<str>, Rc<Variable>>>,
    types: RefCell<FxHashMap<Rc<str>, Rc<TypeEntity>>>,
    namespace: RefCell<Option<Rc<str>>>,
    aliases: RefCell<FxHashMap<Rc<str>, Rc<str>>>,
    imported_files: RefCell<FxHashSet<PathBuf>>,
    /// Imported sibling scopes in import order, keyed by their namespace
    imports: RefCell<Vec<(Option<Rc<str>>, Rc<Scope>)>>,
    trace: Rc<[TraceElement]>,
    frame: Rc<Frame>,
    may_declare_namespace: Cell<bool>,
    may_manage_imports: bool,
}

impl Scope {
    fn with(
        file: Rc<SourceFile>,
        parent: Option<Rc<Scope>>,
        trace: Rc<[TraceElement]>,
        frame: Rc<Frame>,
        top_level: bool,
    ) -> Rc<Scope> {
        Rc::new(Scope {
            file,
            parent,
            functions: RefCell::new(FxHashMap::default()),
            variables: RefCell::new(FxHashMap::default()),
            types: RefCell::new(FxHashMap::default()),
            namespace: RefCell::new(None),
            aliases: RefCell::new(FxHashMap::default()),
            imported_files: RefCell::new(FxHashSet::default()),
            imports: RefCell::new(Vec::new()),
            trace,
            frame,
            may_declare_namespace: Cell::new(top_level),
            may_manage_imports: top_level,
        })
    }

    /// Root scope of a source file
    pub fn root(file: Rc<SourceFile>) -> Rc<Scope> {
        Self::with(file, None, Rc::from(Vec::new()), Rc::default(), true)
    }

    /// Nested scope for a block; cannot declare a namespace or manage imports
    pub fn build_child(self: &Rc<Self>) -> Rc<Scope> {
        Self::with(
            self.file.clone(),
            Some(self.clone()),
            self.trace.clone(),
            self.frame.clone(),
            false,
        )
    }

    /// Body scope of a type declaration
    pub fn build_type_body(self: &Rc<Self>, owner: Weak<TypeEntity>) -> Rc<Scope> {
        let frame = Frame {
            owner: Some(owner),
            function: None,
        };
        Self::with(
            self.file.clone(),
            Some(self.clone()),
            self.trace.clone(),
            Rc::new(frame),
            false,
        )
    }

    /// Scope for one function invocation. `self` is the function's closure;
    /// the trace continues from the caller at the call site.
    pub fn build_call(
        self: &Rc<Self>,
        caller: &Scope,
        owner: Option<Weak<TypeEntity>>,
        function: Rc<str>,
        call_site: Span,
    ) -> Rc<Scope> {
        let mut trace = caller.trace.to_vec();
        trace.push(caller.element_at(call_site.line()));
        let frame = Frame {
            owner,
            function: Some(function),
        };
        Self::with(
            self.file.clone(),
            Some(self.clone()),
            Rc::from(trace),
            Rc::new(frame),
            false,
        )
    }

    /// Root scope for an imported file, sharing this scope's permissions
    fn build_sibling(&self, file: Rc<SourceFile>, import_site: Span) -> Rc<Scope> {
        let mut trace = self.trace.to_vec();
        trace.push(self.element_at(import_site.line()));
        Self::with(
            file,
            self.parent.clone(),
            Rc::from(trace),
            Rc::default(),
            self.may_manage_imports,
        )
    }

    pub fn file(&self) -> &Rc<SourceFile> {
        &self.file
    }

    pub fn file_name(&self) -> &str {
        self.file.name()
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Type whose code runs in this scope
    pub fn owner(&self) -> Option<Rc<TypeEntity>> {
        self.frame.owner.as_ref().and_then(Weak::upgrade)
    }

    pub fn access_context(&self) -> AccessContext {
        AccessContext::new(self.file.clone(), self.owner())
    }

    /// Number of frames on the program call stack
    pub fn depth(&self) -> usize {
        self.trace.len()
    }

    fn file_root(&self) -> &Scope {
        let mut scope = self;
        while let Some(parent) = &scope.parent {
            if !Rc::ptr_eq(&parent.file, &self.file) {
                break;
            }
            scope = parent;
        }
        scope
    }

    // Declarations

    pub fn declare_function(&self, function: Rc<Function>, span: Span) -> SyntaxLangResult<()> {
        let name: Rc<str> = Rc::from(function.name());
        self.check_free(&name, span)?;
        self.functions.borrow_mut().insert(name, function);
        Ok(())
    }

    pub fn declare_variable(&self, variable: Rc<Variable>) -> SyntaxLangResult<()> {
        self.check_free(variable.name(), variable.span())?;
        self.variables
            .borrow_mut()
            .insert(variable.name().clone(), variable);
        Ok(())
    }

    // Functions and variables share one namespace
    fn check_free(&self, name: &str, span: Span) -> SyntaxLangResult<()> {
        if self.functions.borrow().contains_key(name) {
            return Err(self.error(
                ErrorKind::DuplicateDeclaration,
                format!("Function {} is already declared", name),
                span,
            ));
        }
        if self.variables.borrow().contains_key(name) {
            return Err(self.error(
                ErrorKind::DuplicateDeclaration,
                format!("Variable {} is already defined", name),
                span,
            ));
        }
        Ok(())
    }

    pub fn declare_type(&self, entity: Rc<TypeEntity>) -> SyntaxLangResult<()> {
        let name = entity.name().clone();
        if self.types.borrow().contains_key(&name) {
            return Err(self.error(
                ErrorKind::DuplicateDeclaration,
                format!("Class {} is already declared", name),
                entity.span(),
            ));
        }
        tracing::debug!(name = %name, file = %self.file_name(), "registered type");
        self.types.borrow_mut().insert(name, entity);
        Ok(())
    }

    pub fn lookup_variable(&self, name: &str) -> Option<Rc<Variable>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(variable) = current.variables.borrow().get(name) {
                return Some(variable.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    pub fn lookup_function(&self, name: &str) -> Option<Rc<Function>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(function) = current.functions.borrow().get(name) {
                return Some(function.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Top-level variable or function of a file imported under `namespace`
    /// (already unmapped; none is the default namespace)
    pub fn lookup_imported(&self, namespace: Option<&str>, name: &str) -> Option<Value> {
        let root = self.file_root();
        let imports = root.imports.borrow();
        imports
            .iter()
            .filter(|(imported, _)| imported.as_deref() == namespace)
            .find_map(|(_, scope)| {
                if let Some(variable) = scope.variables.borrow().get(name) {
                    return Some(variable.get());
                }
                scope
                    .functions
                    .borrow()
                    .get(name)
                    .map(|function| Value::function(function.clone()))
            })
    }

    pub fn local_type(&self, name: &str) -> Option<Rc<TypeEntity>> {
        self.types.borrow().get(name).cloned()
    }

    fn enclosing_type(&self, name: &str) -> Option<Rc<TypeEntity>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(entity) = current.local_type(name) {
                return Some(entity);
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Find a type by optional namespace and name. Unqualified names look in
    /// enclosing scopes, then in files imported into the default namespace.
    pub fn resolve_type(&self, namespace: Option<&str>, name: &str) -> Option<Rc<TypeEntity>> {
        let root = self.file_root();
        let namespace = match namespace {
            Some(ns) => root.unmap_namespace(ns),
            None => None,
        };
        match namespace {
            None => self.enclosing_type(name).or_else(|| {
                root.imports
                    .borrow()
                    .iter()
                    .filter(|(ns, _)| ns.is_none())
                    .find_map(|(_, scope)| scope.local_type(name))
            }),
            Some(ns) => root
                .imports
                .borrow()
                .iter()
                .filter(|(imported, _)| imported.as_deref() == Some(ns.as_ref()))
                .find_map(|(_, scope)| scope.local_type(name)),
        }
    }

    // Namespaces

    pub fn namespace(&self) -> Option<Rc<str>> {
        self.file_root().namespace.borrow().clone()
    }

    pub fn set_namespace(&self, name: Rc<str>, span: Span) -> SyntaxLangResult<()> {
        if !self.may_declare_namespace.get() || self.namespace.borrow().is_some() {
            return Err(self.error(
                ErrorKind::InvalidNamespacePlacement,
                "Invalid location for namespace statement",
                span,
            ));
        }
        *self.namespace.borrow_mut() = Some(name);
        self.may_declare_namespace.set(false);
        Ok(())
    }

    /// Called once the first non-namespace statement of a file has run
    pub fn close_namespace_window(&self) {
        self.may_declare_namespace.set(false);
    }

    /// Alias or namespace name to the namespace it denotes; this file's own
    /// namespace maps to none
    pub fn unmap_namespace(&self, name: &str) -> Option<Rc<str>> {
        let root = self.file_root();
        if root.namespace.borrow().as_deref() == Some(name) {
            return None;
        }
        match root.aliases.borrow().get(name) {
            Some(ns) => Some(ns.clone()),
            None => Some(Rc::from(name)),
        }
    }

    pub fn use_namespace_as(&self, namespace: Rc<str>, alias: Rc<str>, span: Span) -> SyntaxLangResult<()> {
        self.check_may_manage_imports("use", span)?;
        let mut aliases = self.aliases.borrow_mut();
        if aliases.contains_key(&alias) {
            return Err(self.error(
                ErrorKind::DuplicateDeclaration,
                format!("Alias {} is already defined", alias),
                span,
            ));
        }
        aliases.insert(alias, namespace);
        Ok(())
    }

    // Imports

    fn check_may_manage_imports(&self, statement: &str, span: Span) -> SyntaxLangResult<()> {
        if self.may_manage_imports {
            return Ok(());
        }
        Err(self.error(
            ErrorKind::InvalidImport,
            format!("Invalid location for {} statement", statement),
            span,
        ))
    }

    /// Validate and load an import, building the sibling scope it will run in.
    /// The caller executes it and then hands it to `register_import`.
    pub fn import_file(
        &self,
        requested: &Path,
        loader: &dyn SourceLoader,
        extension: &str,
        span: Span,
    ) -> SyntaxLangResult<ImportedFile> {
        self.check_may_manage_imports("import", span)?;
        if loader.is_directory(requested) {
            return Err(self.error(
                ErrorKind::InvalidImport,
                format!("Cannot import directory {}", requested.display()),
                span,
            ));
        }
        if requested.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            return Err(self.error(
                ErrorKind::InvalidImport,
                format!(
                    "Cannot import file with unsupported extension: {}",
                    requested.display()
                ),
                span,
            ));
        }
        let path = loader.canonicalize(requested).map_err(|e| {
            self.error(ErrorKind::ImportError, format!("Cannot import file: {}", e), span)
        })?;
        if !self.imported_files.borrow_mut().insert(path.clone()) {
            return Err(self.error(
                ErrorKind::InvalidImport,
                format!("File already imported: {}", path.display()),
                span,
            ));
        }
        let program = loader.load(&path).map_err(|e| {
            self.error(ErrorKind::ImportError, format!("Cannot import file: {}", e), span)
        })?;
        let file = SourceFile::new(path.clone(), program.source.as_deref());
        let scope = self.build_sibling(file, span);
        tracing::debug!(path = %path.display(), "imported file");
        Ok(ImportedFile {
            path,
            program,
            scope,
        })
    }

    /// Make an executed import visible under its namespace
    pub fn register_import(&self, imported: &ImportedFile) {
        let namespace = imported.scope.namespace();
        self.imports
            .borrow_mut()
            .push((namespace, imported.scope.clone()));
    }

    // Diagnostics

    /// Trace element for the current frame at `line`
    pub fn element_at(&self, line: usize) -> TraceElement {
        TraceElement {
            file: self.file.name().clone(),
            namespace: self.namespace(),
            class: self.owner().map(|owner| owner.name().clone()),
            function: self.frame.function.clone(),
            line,
        }
    }

    /// Wrap a thrown value with the current call stack and the throw site
    pub fn build_error(
        &self,
        value: Value,
        kind: Rc<str>,
        message: Option<String>,
        span: Span,
    ) -> RuntimeError {
        let mut trace = self.trace.to_vec();
        trace.push(self.element_at(span.line()));
        RuntimeError {
            value,
            kind,
            message,
            trace,
        }
    }

    /// Fatal diagnostic at `span`, carrying source text and the call stack
    pub fn error(&self, kind: ErrorKind, message: impl Into<String>, span: Span) -> SyntaxLangError {
        let mut frames: Vec<StackFrame> = self
            .trace
            .iter()
            .map(TraceElement::to_stack_frame)
            .collect();
        frames.push(self.element_at(span.line()).to_stack_frame());
        frames.reverse();
        let error = SyntaxLangError::new(kind, message, span, self.file_name().to_string())
            .with_stack_trace(frames);
        match self.file.source() {
            Some(source) => error.with_source(source),
            None => error,
        }
    }

    /// `this` of the enclosing method call, if any
    pub fn receiver(&self) -> Option<Rc<Instance>> {
        self.lookup_variable("this")
            .and_then(|variable| variable.get().as_object().cloned())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("file", &self.file.path())
            .field("namespace", &self.namespace())
            .field("depth", &self.depth())
            .field("variables", &self.variables.borrow().len())
            .field("functions", &self.functions.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{Block, FunctionTemplate};
    use crate::loader::MemoryLoader;
    use crate::ast::{AccessModifier, build};

    fn root() -> Rc<Scope> {
        Scope::root(SourceFile::new("/src/main.sl", None))
    }

    fn function(name: &str, scope: &Rc<Scope>) -> Rc<Function> {
        let template = FunctionTemplate {
            name: Rc::from(name),
            access: AccessModifier::Default,
            is_static: false,
            modifier: None,
            params: Vec::new(),
            variadic: None,
            body: Some(Block {
                instructions: Vec::new(),
                span: Span::default(),
            }),
            span: Span::default(),
        };
        Rc::new(Function::new(Rc::new(template), scope.clone()))
    }

    fn variable(name: &str) -> Rc<Variable> {
        Rc::new(Variable::new(Rc::from(name), Value::null(), false, Span::default()))
    }

    #[test]
    fn test_duplicate_function_is_rejected() {
        let scope = root();
        scope.declare_function(function("f", &scope), Span::default()).unwrap();
        let err = scope
            .declare_function(function("f", &scope), Span::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
    }

    #[test]
    fn test_functions_and_variables_share_names() {
        let scope = root();
        scope.declare_function(function("f", &scope), Span::default()).unwrap();
        let err = scope.declare_variable(variable("f")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);

        scope.declare_variable(variable("x")).unwrap();
        let err = scope
            .declare_function(function("x", &scope), Span::default())
            .unwrap_err();
        assert_eq!(err.message, "Variable x is already defined");
    }

    #[test]
    fn test_child_sees_parent_variables() {
        let scope = root();
        scope.declare_variable(variable("x")).unwrap();
        let child = scope.build_child();
        assert!(child.lookup_variable("x").is_some());
        child.declare_variable(variable("y")).unwrap();
        assert!(scope.lookup_variable("y").is_none());
    }

    #[test]
    fn test_namespace_only_once_and_only_at_root() {
        let scope = root();
        scope.set_namespace(Rc::from("util"), Span::default()).unwrap();
        let err = scope
            .set_namespace(Rc::from("other"), Span::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidNamespacePlacement);

        let child = root().build_child();
        assert!(child.set_namespace(Rc::from("x"), Span::default()).is_err());

        let late = root();
        late.close_namespace_window();
        assert!(late.set_namespace(Rc::from("x"), Span::default()).is_err());
    }

    #[test]
    fn test_alias_cannot_be_redefined() {
        let scope = root();
        scope
            .use_namespace_as(Rc::from("util"), Rc::from("u"), Span::default())
            .unwrap();
        assert_eq!(scope.unmap_namespace("u").as_deref(), Some("util"));
        assert_eq!(scope.unmap_namespace("plain").as_deref(), Some("plain"));
        let err = scope
            .use_namespace_as(Rc::from("other"), Rc::from("u"), Span::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
    }

    #[test]
    fn test_own_namespace_unmaps_to_none() {
        let scope = root();
        scope.set_namespace(Rc::from("app"), Span::default()).unwrap();
        assert_eq!(scope.unmap_namespace("app"), None);
    }

    #[test]
    fn test_import_validation() {
        let mut loader = MemoryLoader::new();
        loader.insert("/src/lib.sl", build::program(Vec::new()));
        loader.insert("/src/pkg/inner.sl", build::program(Vec::new()));
        let scope = root();

        let imported = scope
            .import_file(Path::new("/src/lib.sl"), &loader, "sl", Span::default())
            .unwrap();
        assert_eq!(imported.path, PathBuf::from("/src/lib.sl"));

        let again = scope
            .import_file(Path::new("/src/lib.sl"), &loader, "sl", Span::default())
            .unwrap_err();
        assert!(again.message.starts_with("File already imported"));

        let dir = scope
            .import_file(Path::new("/src/pkg"), &loader, "sl", Span::default())
            .unwrap_err();
        assert!(dir.message.starts_with("Cannot import directory"));

        let ext = scope
            .import_file(Path::new("/src/lib.txt"), &loader, "sl", Span::default())
            .unwrap_err();
        assert!(ext.message.contains("unsupported extension"));

        let missing = scope
            .import_file(Path::new("/src/missing.sl"), &loader, "sl", Span::default())
            .unwrap_err();
        assert_eq!(missing.kind, ErrorKind::ImportError);

        let child = scope.build_child();
        let nested = child
            .import_file(Path::new("/src/pkg/inner.sl"), &loader, "sl", Span::default())
            .unwrap_err();
        assert_eq!(nested.kind, ErrorKind::InvalidImport);
    }

    #[test]
    fn test_build_error_appends_throw_site() {
        let scope = root();
        let error = scope.build_error(
            Value::integer(5),
            Rc::from(RuntimeError::GENERIC_KIND),
            Some("5".to_string()),
            Span::single(7, 1, 0),
        );
        assert_eq!(error.trace.len(), 1);
        assert_eq!(error.trace[0].to_string(), "/src/main.sl:7");
    }
}
