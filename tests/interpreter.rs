// SyntaxLang integration tests
// Whole programs built through `ast::build` and run via the public API

use pretty_assertions::assert_eq;
use syntaxlang_core::ast::build::*;
use syntaxlang_core::ast::{BinaryOp, ClassDef, FunctionDef, Param, Stmt};
use syntaxlang_core::runtime::value::parse_number;
use syntaxlang_core::{Config, ErrorKind, Execution, Interpreter, MemoryLoader, Value};

fn run(statements: Vec<Stmt>) -> Execution {
    Interpreter::new(Config::default(), MemoryLoader::new())
        .run_program(&program(statements), "/app/main.sl")
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

fn this_field(name: &str) -> syntaxlang_core::ast::Expr {
    member(ident("this"), name)
}

/// class NAME { message = null; NAME(message) { this.message = message } getMessage() { return this.message } }
fn exception_class(name: &str) -> ClassDef {
    let mut class = class(name);
    class.fields = vec![field("message", null())];
    class.functions = vec![
        function(
            name,
            &["message"],
            vec![expr(assign(this_field("message"), ident("message")))],
        ),
        function("getMessage", &[], vec![ret(Some(this_field("message")))]),
    ];
    class
}

#[test]
fn test_recursive_factorial_is_exact() {
    let fact = function(
        "fact",
        &["n"],
        vec![
            if_else(
                binary(ident("n"), BinaryOp::LessEqual, num("1")),
                vec![ret(Some(num("1")))],
                None,
            ),
            ret(Some(binary(
                ident("n"),
                BinaryOp::Mul,
                call(ident("fact"), vec![binary(ident("n"), BinaryOp::Sub, num("1"))]),
            ))),
        ],
    );
    let run = run(vec![
        expr(declare("result", call(ident("fact"), vec![num("25")]))),
        Stmt::Function(fact),
    ]);
    assert_eq!(global(&run, "result"), number("15511210043330985984000000"));
}

#[test]
fn test_default_and_variadic_parameters() {
    let greet = FunctionDef {
        params: vec![
            param("name"),
            Param {
                default: Some(string("Hello")),
                ..param("greeting")
            },
        ],
        ..function(
            "greet",
            &[],
            vec![ret(Some(binary(
                binary(ident("greeting"), BinaryOp::Add, string(", ")),
                BinaryOp::Add,
                ident("name"),
            )))],
        )
    };
    let count = FunctionDef {
        variadic: Some("rest".to_string()),
        ..function(
            "count",
            &["first"],
            vec![
                expr(declare("total", num("0"))),
                foreach(
                    None,
                    "item",
                    ident("rest"),
                    vec![expr(assign(
                        ident("total"),
                        binary(ident("total"), BinaryOp::Add, ident("item")),
                    ))],
                ),
                ret(Some(ident("total"))),
            ],
        )
    };
    let run = run(vec![
        Stmt::Function(greet),
        Stmt::Function(count),
        expr(declare("a", call(ident("greet"), vec![string("Ada")]))),
        expr(declare("b", call(ident("greet"), vec![string("Bob"), string("Hi")]))),
        expr(declare(
            "c",
            call(ident("count"), vec![num("0"), num("1"), num("2"), num("3")]),
        )),
        expr(declare("d", call(ident("count"), vec![num("9")]))),
    ]);
    assert_eq!(global(&run, "a"), Value::string("Hello, Ada"));
    assert_eq!(global(&run, "b"), Value::string("Hi, Bob"));
    assert_eq!(global(&run, "c"), number("6"));
    assert_eq!(global(&run, "d"), number("0"));
}

#[test]
fn test_missing_argument_is_fatal() {
    let err = Interpreter::new(Config::default(), MemoryLoader::new())
        .run_program(
            &program(vec![
                Stmt::Function(function("pair", &["a", "b"], vec![ret(Some(ident("a")))])),
                expr(call(ident("pair"), vec![num("1")])),
            ]),
            "/app/main.sl",
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArgumentError);
}

#[test]
fn test_thrown_object_caught_by_handler() {
    let mut checker = class("Checker");
    checker.functions = vec![
        function("Checker", &[], vec![]),
        function(
            "validate",
            &["n"],
            vec![
                if_else(
                    binary(ident("n"), BinaryOp::Less, num("0")),
                    vec![expr(throw(new(
                        type_ref("Failure"),
                        vec![string("negative input")],
                    )))],
                    None,
                ),
                ret(Some(ident("n"))),
            ],
        ),
    ];
    let run = run(vec![
        Stmt::Class(exception_class("Failure")),
        Stmt::Class(checker),
        expr(declare("checker", new(type_ref("Checker"), vec![]))),
        expr(declare("seen", null())),
        try_catch(
            vec![expr(method(ident("checker"), "validate", vec![num("-1")]))],
            "e",
            vec![expr(assign(ident("seen"), method(ident("e"), "getMessage", vec![])))],
        ),
        expr(declare(
            "ok",
            method(ident("checker"), "validate", vec![num("4")]),
        )),
    ]);
    assert_eq!(global(&run, "seen"), Value::string("negative input"));
    assert_eq!(global(&run, "ok"), number("4"));
    assert!(run.uncaught.is_none());
}

#[test]
fn test_uncaught_exception_carries_call_trace() {
    let mut checker = class("Checker");
    checker.functions = vec![
        function("Checker", &[], vec![]),
        function(
            "validate",
            &[],
            vec![expr(throw(new(type_ref("Failure"), vec![string("bad input")])))],
        ),
    ];
    let run = run(vec![
        Stmt::Class(exception_class("Failure")),
        Stmt::Class(checker),
        expr(method(new(type_ref("Checker"), vec![]), "validate", vec![])),
        expr(declare("unreached", boolean(true))),
    ]);

    let error = run.uncaught.expect("exception should escape");
    assert_eq!(&*error.kind, "Failure");
    assert_eq!(error.headline(), "Uncaught exception Failure: bad input");
    let rendered = error.render();
    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("Uncaught exception Failure: bad input"));
    let innermost = lines.next().unwrap();
    assert!(innermost.starts_with("\tat "), "{}", innermost);
    assert!(innermost.contains("Checker#validate"), "{}", innermost);
    assert!(run.scope.lookup_variable("unreached").is_none());
}

#[test]
fn test_operator_hooks_drive_arithmetic_and_text() {
    let mut money = class("Money");
    money.fields = vec![field("cents", num("0"))];
    money.functions = vec![
        function(
            "Money",
            &["cents"],
            vec![expr(assign(this_field("cents"), ident("cents")))],
        ),
        function(
            "__add",
            &["other"],
            vec![ret(Some(new(
                type_ref("Money"),
                vec![binary(
                    this_field("cents"),
                    BinaryOp::Add,
                    member(ident("other"), "cents"),
                )],
            )))],
        ),
        function(
            "__string",
            &[],
            vec![ret(Some(binary(
                binary(string(""), BinaryOp::Add, this_field("cents")),
                BinaryOp::Add,
                string("c"),
            )))],
        ),
    ];
    let run = run(vec![
        Stmt::Class(money),
        expr(declare(
            "sum",
            binary(
                new(type_ref("Money"), vec![num("150")]),
                BinaryOp::Add,
                new(type_ref("Money"), vec![num("75")]),
            ),
        )),
        expr(declare("cents", member(ident("sum"), "cents"))),
        expr(declare("label", binary(string("total: "), BinaryOp::Add, ident("sum")))),
    ]);
    assert_eq!(global(&run, "cents"), number("225"));
    assert_eq!(global(&run, "label"), Value::string("total: 225c"));
}

#[test]
fn test_runaway_recursion_respects_configured_depth() {
    let forever = function("forever", &[], vec![ret(Some(call(ident("forever"), vec![])))]);
    let err = Interpreter::new(
        Config::default().with_max_call_depth(32),
        MemoryLoader::new(),
    )
    .run_program(
        &program(vec![
            Stmt::Function(forever),
            expr(call(ident("forever"), vec![])),
        ]),
        "/app/main.sl",
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackOverflow);
    assert!(!err.stack_trace.is_empty());
}

#[test]
fn test_fatal_errors_render_kind_and_message() {
    let err = Interpreter::new(Config::default(), MemoryLoader::new())
        .run_program(&program(vec![expr(ident("nowhere"))]), "/app/main.sl")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownIdentifier);
    let rendered = err.format_with_options(true);
    assert!(rendered.contains("nowhere"), "{}", rendered);
}
