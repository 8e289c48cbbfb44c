// SyntaxLang CLI - Command Line Interface
// Usage: syntaxlang FILE [OPTIONS]

use clap::Parser;
use colored::*;
use std::path::PathBuf;

use syntaxlang_core::ast::{CaseBody, Expr, FieldDef, FunctionDef, Literal, Program, Stmt};
use syntaxlang_core::instruction::build_program;
use syntaxlang_core::{Config, Interpreter, JsonTreeLoader, SourceLoader};

/// SyntaxLang - run statement trees dumped by the SyntaxLang front end
#[derive(Parser)]
#[command(name = "syntaxlang")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A tree-walking interpreter for SyntaxLang", long_about = None)]
struct Cli {
    /// Source file to run (.sl); its tree is read from FILE.json
    file: PathBuf,

    /// Debug options: tree (comma-separated)
    #[arg(short = 'd', long = "debug", value_delimiter = ',')]
    debug: Option<Vec<String>>,

    /// Check the tree for errors without running
    #[arg(long = "check")]
    check: bool,

    /// Maximum call depth before a stack overflow is reported
    #[arg(long = "max-depth", default_value_t = Config::DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Show every frame of a diagnostic's stack trace
    #[arg(long = "full-trace")]
    full_trace: bool,
}

fn main() {
    syntaxlang_core::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[derive(Default, Clone)]
struct DebugFlags {
    tree: bool,
}

impl DebugFlags {
    fn from_options(opts: &Option<Vec<String>>) -> Self {
        let mut flags = Self::default();
        if let Some(opts) = opts {
            for opt in opts {
                match opt.as_str() {
                    "tree" => flags.tree = true,
                    _ => eprintln!("{} Unknown debug option: {}", "!".yellow(), opt),
                }
            }
        }
        flags
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let debug = DebugFlags::from_options(&cli.debug);
    let config = Config {
        max_call_depth: cli.max_depth,
        full_trace: cli.full_trace,
        ..Config::default()
    };

    if debug.tree || cli.check {
        return handle_check(&cli, &config, debug);
    }

    let mut interpreter = Interpreter::new(config.clone(), JsonTreeLoader);
    let execution = interpreter
        .run_file(&cli.file)
        .map_err(|e| e.format_with_options(config.full_trace))?;
    match execution.uncaught {
        Some(error) => Err(error.render()),
        None => Ok(()),
    }
}

/// Load the tree and build instructions without running anything
fn handle_check(cli: &Cli, config: &Config, debug: DebugFlags) -> Result<(), String> {
    let loader = JsonTreeLoader;
    let path = loader.canonicalize(&cli.file).map_err(|e| e.to_string())?;
    let program = loader.load(&path).map_err(|e| e.to_string())?;

    if debug.tree {
        print_tree(&program)?;
    }
    if cli.check {
        build_program(&program, &path.display().to_string())
            .map_err(|e| e.format_with_options(config.full_trace))?;
        println!("{} No errors found in {}", "✓".green(), cli.file.display());
    }
    Ok(())
}

fn print_tree(program: &Program) -> Result<(), String> {
    let mut tree = ptree::TreeBuilder::new("Program".to_string());
    for stmt in &program.statements {
        build_stmt_tree(&mut tree, stmt);
    }
    let tree = tree.build();
    ptree::print_tree(&tree).map_err(|e| e.to_string())
}

fn build_body_tree(tree: &mut ptree::TreeBuilder, label: &str, body: &[Stmt]) {
    tree.begin_child(label.to_string());
    for stmt in body {
        build_stmt_tree(tree, stmt);
    }
    tree.end_child();
}

fn build_labelled(tree: &mut ptree::TreeBuilder, kind: &str, label: &Option<String>) {
    match label {
        Some(label) => tree.begin_child(format!("{} '{}'", kind, label)),
        None => tree.begin_child(kind.to_string()),
    };
}

fn build_stmt_tree(tree: &mut ptree::TreeBuilder, stmt: &Stmt) {
    match stmt {
        Stmt::Expression { expr } => build_expr_tree(tree, expr),
        Stmt::Block { statements, .. } => build_body_tree(tree, "Block", statements),
        Stmt::Empty { .. } => {
            tree.add_empty_child("Empty".to_string());
        }
        Stmt::If {
            branches,
            else_branch,
            ..
        } => {
            tree.begin_child("If".to_string());
            for branch in branches {
                tree.begin_child("condition".to_string());
                build_expr_tree(tree, &branch.condition);
                tree.end_child();
                build_body_tree(tree, "then", &branch.body);
            }
            if let Some(else_branch) = else_branch {
                build_body_tree(tree, "else", else_branch);
            }
            tree.end_child();
        }
        Stmt::For {
            label,
            init,
            condition,
            update,
            body,
            ..
        } => {
            build_labelled(tree, "For", label);
            for field in init {
                build_field_tree(tree, field);
            }
            if let Some(condition) = condition {
                tree.begin_child("condition".to_string());
                build_expr_tree(tree, condition);
                tree.end_child();
            }
            for expr in update {
                build_expr_tree(tree, expr);
            }
            build_body_tree(tree, "body", body);
            tree.end_child();
        }
        Stmt::Foreach {
            label,
            variable,
            iterable,
            body,
            ..
        } => {
            build_labelled(tree, &format!("Foreach '{}'", variable), label);
            build_expr_tree(tree, iterable);
            build_body_tree(tree, "body", body);
            tree.end_child();
        }
        Stmt::While {
            label,
            condition,
            body,
            ..
        } => {
            build_labelled(tree, "While", label);
            build_expr_tree(tree, condition);
            build_body_tree(tree, "body", body);
            tree.end_child();
        }
        Stmt::DoWhile {
            label,
            body,
            condition,
            ..
        } => {
            build_labelled(tree, "DoWhile", label);
            build_body_tree(tree, "body", body);
            build_expr_tree(tree, condition);
            tree.end_child();
        }
        Stmt::TryCatch {
            body,
            variable,
            handler,
            ..
        } => {
            tree.begin_child("TryCatch".to_string());
            build_body_tree(tree, "try", body);
            build_body_tree(tree, &format!("catch '{}'", variable), handler);
            tree.end_child();
        }
        Stmt::Return { value, .. } => {
            tree.begin_child("Return".to_string());
            if let Some(value) = value {
                build_expr_tree(tree, value);
            }
            tree.end_child();
        }
        Stmt::Yield { value, .. } => {
            tree.begin_child("Yield".to_string());
            build_expr_tree(tree, value);
            tree.end_child();
        }
        Stmt::Break { label, .. } => {
            build_labelled(tree, "Break", label);
            tree.end_child();
        }
        Stmt::Continue { label, .. } => {
            build_labelled(tree, "Continue", label);
            tree.end_child();
        }
        Stmt::Namespace { name, .. } => {
            tree.add_empty_child(format!("Namespace '{}'", name));
        }
        Stmt::Import { path, .. } => {
            tree.add_empty_child(format!("Import \"{}\"", path));
        }
        Stmt::UseAs {
            namespace, alias, ..
        } => {
            tree.add_empty_child(format!("Use '{}' as '{}'", namespace, alias));
        }
        Stmt::Function(def) => build_function_tree(tree, def),
        Stmt::Class(def) => {
            let mut header = format!("Class '{}'", def.name);
            if let Some(parent) = &def.extends {
                header.push_str(&format!(" extends {}", parent));
            }
            if !def.implements.is_empty() {
                let names: Vec<String> = def.implements.iter().map(|i| i.to_string()).collect();
                header.push_str(&format!(" implements {}", names.join(", ")));
            }
            tree.begin_child(header);
            for field in &def.fields {
                build_field_tree(tree, field);
            }
            for function in &def.functions {
                build_function_tree(tree, function);
            }
            tree.end_child();
        }
        Stmt::Enum(def) => {
            tree.begin_child(format!("Enum '{}'", def.name));
            for constant in &def.constants {
                tree.begin_child(format!("Constant '{}'", constant.name));
                for arg in &constant.args {
                    build_expr_tree(tree, arg);
                }
                tree.end_child();
            }
            for field in &def.fields {
                build_field_tree(tree, field);
            }
            for function in &def.functions {
                build_function_tree(tree, function);
            }
            tree.end_child();
        }
        Stmt::Interface(def) => {
            tree.begin_child(format!("Interface '{}'", def.name));
            for function in &def.functions {
                build_function_tree(tree, function);
            }
            tree.end_child();
        }
    }
}

fn build_field_tree(tree: &mut ptree::TreeBuilder, field: &FieldDef) {
    let mut header = format!("{} '{}'", field.access, field.name);
    if field.is_static {
        header.push_str(" static");
    }
    if field.is_final {
        header.push_str(" final");
    }
    tree.begin_child(header);
    build_expr_tree(tree, &field.value);
    tree.end_child();
}

fn build_function_tree(tree: &mut ptree::TreeBuilder, def: &FunctionDef) {
    let mut params: Vec<String> = def.params.iter().map(|p| p.name.clone()).collect();
    if let Some(variadic) = &def.variadic {
        params.push(format!("...{}", variadic));
    }
    let header = format!("Function '{}'({})", def.name, params.join(", "));
    match &def.body {
        Some(body) => build_body_tree(tree, &header, body),
        None => {
            tree.add_empty_child(format!("{} abstract", header));
        }
    }
}

fn build_expr_tree(tree: &mut ptree::TreeBuilder, expr: &Expr) {
    match expr {
        Expr::Literal { value, .. } => {
            let text = match value {
                Literal::String(s) => format!("\"{}\"", s),
                Literal::Number(n) => n.clone(),
                Literal::Imaginary(n) => format!("{}i", n),
                Literal::Boolean(b) => b.to_string(),
                Literal::Null => "null".to_string(),
            };
            tree.add_empty_child(format!("Literal {}", text));
        }
        Expr::Identifier { name, .. } => {
            tree.add_empty_child(format!("Identifier '{}'", name));
        }
        Expr::Scoped {
            namespace, name, ..
        } => {
            tree.add_empty_child(format!("Scoped '{}\\{}'", namespace, name));
        }
        Expr::Binary {
            left, op, right, ..
        } => {
            tree.begin_child(format!("Binary {}", op));
            build_expr_tree(tree, left);
            build_expr_tree(tree, right);
            tree.end_child();
        }
        Expr::Unary {
            op, prefix, operand, ..
        } => {
            let position = if *prefix { "prefix" } else { "postfix" };
            tree.begin_child(format!("Unary {} ({})", op.symbol(), position));
            build_expr_tree(tree, operand);
            tree.end_child();
        }
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
            ..
        } => {
            tree.begin_child("Ternary".to_string());
            build_expr_tree(tree, condition);
            build_expr_tree(tree, then_expr);
            build_expr_tree(tree, else_expr);
            tree.end_child();
        }
        Expr::InstanceOf {
            value, type_ref, ..
        } => {
            tree.begin_child(format!("InstanceOf {}", type_ref));
            build_expr_tree(tree, value);
            tree.end_child();
        }
        Expr::New { type_ref, args, .. } => {
            tree.begin_child(format!("New {}", type_ref));
            for arg in args {
                build_expr_tree(tree, arg);
            }
            tree.end_child();
        }
        Expr::Clone { value, .. } | Expr::Throw { value, .. } => {
            tree.begin_child(expr.node_name().to_string());
            build_expr_tree(tree, value);
            tree.end_child();
        }
        Expr::Call { callee, args, .. } => {
            tree.begin_child("Call".to_string());
            build_expr_tree(tree, callee);
            for arg in args {
                build_expr_tree(tree, arg);
            }
            tree.end_child();
        }
        Expr::Index { target, index, .. } => {
            tree.begin_child("Index".to_string());
            build_expr_tree(tree, target);
            build_expr_tree(tree, index);
            tree.end_child();
        }
        Expr::Member { target, name, .. } => {
            tree.begin_child(format!("Member '{}'", name));
            build_expr_tree(tree, target);
            tree.end_child();
        }
        Expr::List { elements, .. } => {
            tree.begin_child("List".to_string());
            for element in elements {
                build_expr_tree(tree, element);
            }
            tree.end_child();
        }
        Expr::Map { entries, .. } => {
            tree.begin_child("Map".to_string());
            for entry in entries {
                tree.begin_child("entry".to_string());
                build_expr_tree(tree, &entry.key);
                build_expr_tree(tree, &entry.value);
                tree.end_child();
            }
            tree.end_child();
        }
        Expr::Function {
            params,
            variadic,
            body,
            ..
        } => {
            let mut names: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
            if let Some(variadic) = variadic {
                names.push(format!("...{}", variadic));
            }
            build_body_tree(tree, &format!("Function ({})", names.join(", ")), body);
        }
        Expr::Switch {
            discriminant,
            cases,
            ..
        } => {
            tree.begin_child("Switch".to_string());
            build_expr_tree(tree, discriminant);
            for case in cases {
                match &case.guard {
                    Some(guard) => {
                        tree.begin_child("case".to_string());
                        build_expr_tree(tree, guard);
                    }
                    None => {
                        tree.begin_child("default".to_string());
                    }
                }
                match &case.body {
                    CaseBody::Statements { statements } => build_body_tree(tree, ":", statements),
                    CaseBody::Value { value } => {
                        tree.begin_child("->".to_string());
                        build_expr_tree(tree, value);
                        tree.end_child();
                    }
                }
                tree.end_child();
            }
            tree.end_child();
        }
        Expr::VarDecl { def } => build_field_tree(tree, def),
        Expr::Assign {
            target, op, value, ..
        } => {
            let symbol = match op.binary_op() {
                Some(binary) => format!("{}=", binary),
                None => "=".to_string(),
            };
            tree.begin_child(format!("Assign {}", symbol));
            build_expr_tree(tree, target);
            build_expr_tree(tree, value);
            tree.end_child();
        }
    }
}
