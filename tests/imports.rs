// SyntaxLang file-import tests
// Trees are dumped next to their sources (`x.sl.json`) and run from disk

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use syntaxlang_core::ast::build::*;
use syntaxlang_core::ast::{BinaryOp, Program, Stmt};
use syntaxlang_core::runtime::value::parse_number;
use syntaxlang_core::{Config, ErrorKind, Execution, Interpreter, JsonTreeLoader, Value};

fn dump(path: &Path, program: &Program) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut tree = path.as_os_str().to_owned();
    tree.push(".json");
    fs::write(tree, serde_json::to_string_pretty(program).unwrap()).unwrap();
}

fn run_file(path: &Path) -> Execution {
    Interpreter::new(Config::default(), JsonTreeLoader)
        .run_file(path)
        .unwrap()
}

fn global(execution: &Execution, name: &str) -> Value {
    execution
        .scope
        .lookup_variable(name)
        .unwrap_or_else(|| panic!("{} is not declared", name))
        .get()
}

fn number(text: &str) -> Value {
    Value::number(parse_number(text).unwrap())
}

#[test]
fn test_handwritten_tree_runs() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.sl");
    fs::write(
        dir.path().join("main.sl.json"),
        r#"{
            "statements": [
                {"node": "expression", "expr": {"node": "var_decl", "def": {
                    "name": "answer",
                    "value": {"node": "literal", "value": {"kind": "number", "value": "42"}}
                }}}
            ]
        }"#,
    )
    .unwrap();
    let run = run_file(&main);
    assert_eq!(global(&run, "answer"), number("42"));
}

#[test]
fn test_imports_resolve_relative_to_importing_file() {
    let dir = tempfile::tempdir().unwrap();
    dump(
        &dir.path().join("lib/shapes.sl"),
        &program(vec![
            import("../util/math.sl"),
            Stmt::Function(function(
                "area",
                &["side"],
                vec![ret(Some(call(ident("square"), vec![ident("side")])))],
            )),
        ]),
    );
    dump(
        &dir.path().join("util/math.sl"),
        &program(vec![Stmt::Function(function(
            "square",
            &["x"],
            vec![ret(Some(binary(ident("x"), BinaryOp::Mul, ident("x"))))],
        ))]),
    );
    let main = dir.path().join("main.sl");
    dump(
        &main,
        &program(vec![
            import("lib/shapes.sl"),
            expr(declare("a", call(ident("area"), vec![num("1.5")]))),
        ]),
    );

    let run = run_file(&main);
    assert_eq!(global(&run, "a"), number("2.25"));
    assert!(run.uncaught.is_none());
}

#[test]
fn test_imported_namespace_through_alias() {
    let dir = tempfile::tempdir().unwrap();
    let mut counter = class("Counter");
    counter.fields = vec![field("count", num("0"))];
    counter.functions = vec![
        function("Counter", &[], vec![]),
        function(
            "tick",
            &[],
            vec![
                expr(unary(
                    syntaxlang_core::ast::UnaryOp::Increment,
                    member(ident("this"), "count"),
                )),
                ret(Some(member(ident("this"), "count"))),
            ],
        ),
    ];
    dump(
        &dir.path().join("counters.sl"),
        &program(vec![namespace("counters"), Stmt::Class(counter)]),
    );
    let main = dir.path().join("main.sl");
    dump(
        &main,
        &program(vec![
            import("counters.sl"),
            use_as("counters", "c"),
            expr(declare(
                "counter",
                new(scoped_type_ref("c", "Counter"), vec![]),
            )),
            expr(method(ident("counter"), "tick", vec![])),
            expr(declare("n", method(ident("counter"), "tick", vec![]))),
        ]),
    );

    let run = run_file(&main);
    assert_eq!(global(&run, "n"), number("2"));
}

#[test]
fn test_exception_thrown_in_imported_file_is_catchable() {
    let dir = tempfile::tempdir().unwrap();
    dump(
        &dir.path().join("checks.sl"),
        &program(vec![Stmt::Function(function(
            "require_positive",
            &["n"],
            vec![
                if_else(
                    binary(ident("n"), BinaryOp::LessEqual, num("0")),
                    vec![expr(throw(string("not positive")))],
                    None,
                ),
                ret(Some(ident("n"))),
            ],
        ))]),
    );
    let main = dir.path().join("main.sl");
    dump(
        &main,
        &program(vec![
            import("checks.sl"),
            expr(declare("caught", null())),
            try_catch(
                vec![expr(call(ident("require_positive"), vec![num("0")]))],
                "e",
                vec![expr(assign(ident("caught"), ident("e")))],
            ),
        ]),
    );

    let run = run_file(&main);
    assert_eq!(global(&run, "caught"), Value::string("not positive"));
}

#[test]
fn test_missing_tree_is_import_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Interpreter::new(Config::default(), JsonTreeLoader)
        .run_file(&dir.path().join("absent.sl"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImportError);

    let main = dir.path().join("main.sl");
    dump(&main, &program(vec![import("absent.sl")]));
    let err = Interpreter::new(Config::default(), JsonTreeLoader)
        .run_file(&main)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImportError);
}
