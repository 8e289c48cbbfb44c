// SyntaxLang interpreter tests

use super::*;
use crate::ast::build::*;
use crate::ast::{
    AccessModifier, AssignOp, BinaryOp, ClassDef, ClassModifier, Expr, FieldDef, FunctionDef,
    FunctionModifier, Stmt, UnaryOp,
};
use crate::error::SyntaxLangError;
use crate::loader::MemoryLoader;
use crate::runtime::value::parse_number;
use pretty_assertions::assert_eq;

fn interpreter(loader: MemoryLoader) -> Interpreter {
    Interpreter::new(Config::default().with_max_call_depth(64), loader)
}

fn run(statements: Vec<Stmt>) -> Execution {
    run_with(MemoryLoader::new(), statements)
}

fn run_with(loader: MemoryLoader, statements: Vec<Stmt>) -> Execution {
    interpreter(loader)
        .run_program(&program(statements), "/main.sl")
        .unwrap()
}

fn fail(statements: Vec<Stmt>) -> SyntaxLangError {
    interpreter(MemoryLoader::new())
        .run_program(&program(statements), "/main.sl")
        .unwrap_err()
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

fn set(name: &str, value: Expr) -> Stmt {
    expr(declare(name, value))
}

fn static_field(access: AccessModifier, name: &str, value: Expr) -> FieldDef {
    FieldDef {
        access,
        is_static: true,
        ..field(name, value)
    }
}

fn static_function(name: &str, body: Vec<Stmt>) -> FunctionDef {
    FunctionDef {
        is_static: true,
        ..function(name, &[], body)
    }
}

#[test]
fn test_precedence_tree_evaluates() {
    let run = run(vec![set(
        "x",
        binary(num("1"), BinaryOp::Add, binary(num("2"), BinaryOp::Mul, num("3"))),
    )]);
    assert_eq!(global(&run, "x"), number("7"));
    let shown = format!("{:?}", run);
    assert!(shown.contains("/main.sl") && shown.contains("uncaught: None"), "{}", shown);
}

#[test]
fn test_literal_binary_folds_once() {
    let instructions = build_program(
        &program(vec![expr(binary(num("1"), BinaryOp::Add, num("2")))]),
        "/main.sl",
    )
    .unwrap();
    let Instruction::Binary(node) = &instructions[0] else {
        panic!("expected a binary node");
    };
    assert!(node.is_constant());
    assert!(node.folded().is_none());

    let scope = Scope::root(SourceFile::new("/main.sl", None));
    let mut interpreter = interpreter(MemoryLoader::new());
    interpreter.execute_program(&instructions, &scope).unwrap();
    assert_eq!(node.folded(), Some(&number("3")));
    interpreter.execute_program(&instructions, &scope).unwrap();
    assert_eq!(node.folded(), Some(&number("3")));

    // short-circuited literal operations are cached too
    let instructions = build_program(
        &program(vec![
            expr(binary(boolean(false), BinaryOp::And, boolean(true))),
            expr(binary(boolean(true), BinaryOp::Or, boolean(false))),
        ]),
        "/main.sl",
    )
    .unwrap();
    interpreter.execute_program(&instructions, &scope).unwrap();
    let folded: Vec<Option<&Value>> = instructions
        .iter()
        .map(|instruction| match instruction {
            Instruction::Binary(node) => node.folded(),
            _ => None,
        })
        .collect();
    assert_eq!(
        folded,
        vec![Some(&Value::boolean(false)), Some(&Value::boolean(true))]
    );
}

#[test]
fn test_equality_without_conversion_hook_keeps_position() {
    let mut plain = class("Plain");
    plain.functions = vec![function("Plain", &[], vec![])];
    let run = run(vec![Stmt::Class(plain), set("p", new(type_ref("Plain"), vec![]))]);
    let object = global(&run, "p");
    let span = Span::single(4, 9, 31);
    let mut interpreter = interpreter(MemoryLoader::new());
    for left in [number("5"), Value::list(vec![])] {
        let Outcome::Done(result) = interpreter
            .apply_binary(BinaryOp::NotEqual, left, object.clone(), span, &run.scope)
            .unwrap()
        else {
            panic!("comparison was interrupted");
        };
        assert_eq!(result, Value::boolean(true));
        assert_eq!(result.span(), span);
    }
}

#[test]
fn test_logical_operators_short_circuit() {
    let run = run(vec![
        Stmt::Function(function(
            "side",
            &[],
            vec![
                expr(assign_op(ident("calls"), AssignOp::AddAssign, num("1"))),
                ret(Some(boolean(true))),
            ],
        )),
        set("calls", num("0")),
        set("a", binary(boolean(false), BinaryOp::And, call(ident("side"), vec![]))),
        set("b", binary(boolean(true), BinaryOp::Or, call(ident("side"), vec![]))),
        set("skipped", ident("calls")),
        set("c", binary(boolean(true), BinaryOp::And, call(ident("side"), vec![]))),
    ]);
    assert_eq!(global(&run, "a"), Value::boolean(false));
    assert_eq!(global(&run, "b"), Value::boolean(true));
    assert_eq!(global(&run, "skipped"), number("0"));
    assert_eq!(global(&run, "c"), Value::boolean(true));
    assert_eq!(global(&run, "calls"), number("1"));
}

#[test]
fn test_member_resolution_prefers_class_chain() {
    let mut greeter = interface("Greeter");
    greeter.functions = vec![
        function("shared", &[], vec![ret(Some(string("I")))]),
        function("extra", &[], vec![ret(Some(string("I")))]),
    ];
    let mut base = class("Base");
    base.functions = vec![
        function("shared", &[], vec![ret(Some(string("A")))]),
        function("greet", &[], vec![ret(Some(string("A")))]),
    ];
    let mut derived = class("Derived");
    derived.extends = Some(type_ref("Base"));
    derived.implements = vec![type_ref("Greeter")];
    derived.functions = vec![
        function("Derived", &[], vec![]),
        function("greet", &[], vec![ret(Some(string("B")))]),
    ];

    // Derived is declared before the types it refers to
    let run = run(vec![
        Stmt::Class(derived),
        Stmt::Class(base),
        Stmt::Interface(greeter),
        set("d", new(type_ref("Derived"), vec![])),
        set("greet", method(ident("d"), "greet", vec![])),
        set("shared", method(ident("d"), "shared", vec![])),
        set("extra", method(ident("d"), "extra", vec![])),
        set("is_base", instance_of(ident("d"), type_ref("Base"))),
        set("is_greeter", instance_of(ident("d"), type_ref("Greeter"))),
    ]);
    assert_eq!(global(&run, "greet"), Value::string("B"));
    assert_eq!(global(&run, "shared"), Value::string("A"));
    assert_eq!(global(&run, "extra"), Value::string("I"));
    assert_eq!(global(&run, "is_base"), Value::boolean(true));
    assert_eq!(global(&run, "is_greeter"), Value::boolean(true));
}

#[test]
fn test_private_members_stay_in_their_file() {
    let mut vault = class("Vault");
    vault.fields = vec![static_field(AccessModifier::Private, "code", num("42"))];
    vault.functions = vec![static_function("peek", vec![ret(Some(ident("code")))])];
    let mut loader = MemoryLoader::new();
    loader.insert("/lib.sl", program(vec![Stmt::Class(vault)]));

    let run = run_with(
        loader.clone(),
        vec![
            import("lib.sl"),
            set("peeked", method(ident("Vault"), "peek", vec![])),
        ],
    );
    assert_eq!(global(&run, "peeked"), number("42"));

    let err = interpreter(loader)
        .run_program(
            &program(vec![import("lib.sl"), expr(member(ident("Vault"), "code"))]),
            "/main.sl",
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownMember);
}

#[test]
fn test_protected_members_reach_subclasses_only() {
    let mut base = class("Base");
    base.fields = vec![static_field(AccessModifier::Protected, "code", num("7"))];
    let mut loader = MemoryLoader::new();
    loader.insert("/lib.sl", program(vec![Stmt::Class(base)]));
    let peeking = |name: &str, extends: Option<&str>| {
        let mut peeker = class(name);
        peeker.extends = extends.map(type_ref);
        peeker.functions = vec![static_function(
            "peek",
            vec![ret(Some(member(ident("Base"), "code")))],
        )];
        Stmt::Class(peeker)
    };

    let run = run_with(
        loader.clone(),
        vec![
            import("lib.sl"),
            peeking("Child", Some("Base")),
            set("peeked", method(ident("Child"), "peek", vec![])),
        ],
    );
    assert_eq!(global(&run, "peeked"), number("7"));

    let unrelated = interpreter(loader.clone())
        .run_program(
            &program(vec![
                import("lib.sl"),
                peeking("Stranger", None),
                expr(method(ident("Stranger"), "peek", vec![])),
            ]),
            "/main.sl",
        )
        .unwrap_err();
    assert_eq!(unrelated.kind, ErrorKind::UnknownMember);

    let top_level = interpreter(loader)
        .run_program(
            &program(vec![import("lib.sl"), expr(member(ident("Base"), "code"))]),
            "/main.sl",
        )
        .unwrap_err();
    assert_eq!(top_level.kind, ErrorKind::UnknownMember);
}

#[test]
fn test_enum_constants_in_declaration_order() {
    let color = enumeration(
        "Color",
        vec![
            constant("RED", vec![]),
            constant("GREEN", vec![]),
            constant("BLUE", vec![]),
        ],
    );
    let run = run(vec![
        Stmt::Enum(color),
        set("names", string("")),
        foreach(
            None,
            "c",
            method(ident("Color"), "values", vec![]),
            vec![expr(assign_op(
                ident("names"),
                AssignOp::AddAssign,
                method(ident("c"), "name", vec![]),
            ))],
        ),
        set("last", method(member(ident("Color"), "BLUE"), "ordinal", vec![])),
        set(
            "same",
            binary(member(ident("Color"), "RED"), BinaryOp::Identical, member(ident("Color"), "RED")),
        ),
        set(
            "different",
            binary(member(ident("Color"), "RED"), BinaryOp::Equal, member(ident("Color"), "GREEN")),
        ),
        set("parsed", method(ident("Color"), "valueOf", vec![string("GREEN")])),
    ]);
    assert_eq!(global(&run, "names"), Value::string("REDGREENBLUE"));
    assert_eq!(global(&run, "last"), number("2"));
    assert_eq!(global(&run, "same"), Value::boolean(true));
    assert_eq!(global(&run, "different"), Value::boolean(false));
    let parsed = global(&run, "parsed");
    let constant = parsed.as_object().and_then(|instance| instance.enum_constant().cloned());
    assert_eq!(constant.map(|c| c.ordinal), Some(1));
}

#[test]
fn test_enum_constructor_only_runs_during_declaration() {
    let mut planet = enumeration("Planet", vec![constant("EARTH", vec![num("3")])]);
    planet.fields = vec![field("mass", num("0"))];
    planet.functions = vec![function(
        "Planet",
        &["m"],
        vec![expr(assign(ident("mass"), ident("m")))],
    )];
    let run = run(vec![
        Stmt::Enum(planet.clone()),
        set("earth_mass", member(member(ident("Planet"), "EARTH"), "mass")),
    ]);
    assert_eq!(global(&run, "earth_mass"), number("3"));

    let err = fail(vec![
        Stmt::Enum(planet),
        expr(new(type_ref("Planet"), vec![num("1")])),
    ]);
    assert_eq!(err.kind, ErrorKind::Instantiation);
}

#[test]
fn test_unknown_enum_constant_is_catchable() {
    let run = run(vec![
        Stmt::Enum(enumeration("Mode", vec![constant("ON", vec![])])),
        set("message", null()),
        try_catch(
            vec![expr(method(ident("Mode"), "valueOf", vec![string("OFF")]))],
            "e",
            vec![expr(assign(ident("message"), ident("e")))],
        ),
    ]);
    assert_eq!(global(&run, "message"), Value::string("Unknown enum constant OFF"));
}

#[test]
fn test_duplicate_declarations_fail() {
    let twice = fail(vec![
        Stmt::Function(function("f", &[], vec![])),
        Stmt::Function(function("f", &[], vec![])),
    ]);
    assert_eq!(twice.kind, ErrorKind::DuplicateDeclaration);

    let shadowed = fail(vec![
        Stmt::Function(function("f", &[], vec![])),
        set("f", num("1")),
    ]);
    assert_eq!(shadowed.kind, ErrorKind::DuplicateDeclaration);

    let types = fail(vec![Stmt::Class(class("A")), Stmt::Class(class("A"))]);
    assert_eq!(types.kind, ErrorKind::DuplicateDeclaration);
}

#[test]
fn test_map_keys() {
    let err = fail(vec![set("k", null()), set("m", map(vec![(ident("k"), num("1"))]))]);
    assert_eq!(err.kind, ErrorKind::TypeMismatch);

    let run = run(vec![
        set(
            "m",
            map(vec![(num("1"), string("a")), (num("1.0"), string("b"))]),
        ),
        set("hit", index(ident("m"), num("1.00"))),
        set("miss", index(ident("m"), num("2"))),
    ]);
    assert_eq!(global(&run, "m").as_map().map(|m| m.len()), Some(1));
    assert_eq!(global(&run, "hit"), Value::string("b"));
    assert_eq!(global(&run, "miss"), Value::null());
}

#[test]
fn test_catch_binds_thrown_value() {
    let run = run(vec![
        set("caught", null()),
        try_catch(
            vec![expr(throw(num("5")))],
            "e",
            vec![expr(assign(ident("caught"), ident("e")))],
        ),
    ]);
    assert_eq!(global(&run, "caught"), number("5"));
    assert!(run.uncaught.is_none());
}

#[test]
fn test_uncaught_throw_stops_the_program() {
    let run = run(vec![
        set("before", num("1")),
        expr(throw(string("boom"))),
        set("after", num("2")),
    ]);
    let error = run.uncaught.expect("throw should escape");
    assert_eq!(error.kind.as_ref(), RuntimeError::GENERIC_KIND);
    assert_eq!(error.message.as_deref(), Some("boom"));
    assert!(error.render().starts_with("Uncaught exception GenericException: boom"));
    assert!(run.scope.lookup_variable("after").is_none());
}

#[test]
fn test_arithmetic_exceptions_are_catchable() {
    let run = run(vec![
        set("message", null()),
        try_catch(
            vec![set("x", binary(num("1"), BinaryOp::Div, num("0")))],
            "e",
            vec![expr(assign(ident("message"), ident("e")))],
        ),
        set("oob", null()),
        try_catch(
            vec![expr(index(list(vec![num("1"), num("2")]), num("5")))],
            "e",
            vec![expr(assign(ident("oob"), ident("e")))],
        ),
    ]);
    assert_eq!(global(&run, "message"), Value::string("Division by zero"));
    assert_eq!(
        global(&run, "oob"),
        Value::string("Index 5 out of bounds for length 2")
    );
}

fn text_class() -> Stmt {
    let mut text = class("Text");
    text.fields = vec![field("value", string(""))];
    text.functions = vec![
        function("Text", &["v"], vec![expr(assign(ident("value"), ident("v")))]),
        function(
            "__add",
            &["other"],
            vec![ret(Some(new(
                type_ref("Text"),
                vec![binary(ident("value"), BinaryOp::Add, member(ident("other"), "value"))],
            )))],
        ),
        function("__string", &[], vec![ret(Some(ident("value")))]),
    ];
    Stmt::Class(text)
}

#[test]
fn test_object_hooks() {
    let run = run(vec![
        text_class(),
        set(
            "joined",
            member(
                binary(
                    new(type_ref("Text"), vec![string("ab")]),
                    BinaryOp::Add,
                    new(type_ref("Text"), vec![string("cd")]),
                ),
                "value",
            ),
        ),
        set("t", new(type_ref("Text"), vec![string("x")])),
        set("same", binary(ident("t"), BinaryOp::Equal, ident("t"))),
        set(
            "other",
            binary(ident("t"), BinaryOp::Equal, new(type_ref("Text"), vec![string("x")])),
        ),
        set("label", binary(string("t="), BinaryOp::Add, ident("t"))),
    ]);
    assert_eq!(global(&run, "joined"), Value::string("abcd"));
    assert_eq!(global(&run, "same"), Value::boolean(true));
    assert_eq!(global(&run, "other"), Value::boolean(false));
    assert_eq!(global(&run, "label"), Value::string("t=x"));
}

#[test]
fn test_null_equality_needs_no_hooks() {
    let run = run(vec![
        text_class(),
        set("both", binary(null(), BinaryOp::Equal, null())),
        set("one", binary(null(), BinaryOp::NotEqual, num("5"))),
        set(
            "object",
            binary(new(type_ref("Text"), vec![string("x")]), BinaryOp::Equal, null()),
        ),
    ]);
    assert_eq!(global(&run, "both"), Value::boolean(true));
    assert_eq!(global(&run, "one"), Value::boolean(true));
    assert_eq!(global(&run, "object"), Value::boolean(false));

    let err = fail(vec![expr(binary(null(), BinaryOp::Add, num("1")))]);
    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}

#[test]
fn test_switch_falls_through_and_yields() {
    let run = run(vec![
        set("r", string("")),
        expr(switch(
            num("2"),
            vec![
                case(num("1"), vec![expr(assign(ident("r"), string("one")))]),
                case(num("2"), vec![expr(assign(ident("r"), string("two")))]),
                case(
                    num("3"),
                    vec![
                        expr(assign_op(ident("r"), AssignOp::AddAssign, string("three"))),
                        brk(None),
                    ],
                ),
                default_case(vec![expr(assign(ident("r"), string("none")))]),
            ],
        )),
        set(
            "v",
            switch(
                num("3"),
                vec![
                    case(num("3"), vec![yield_value(num("30"))]),
                    default_case(vec![yield_value(num("0"))]),
                ],
            ),
        ),
        set(
            "w",
            switch(
                string("b"),
                vec![
                    arrow(Some(string("a")), num("1")),
                    arrow(Some(string("b")), num("2")),
                    arrow(None, num("3")),
                ],
            ),
        ),
        set(
            "fallback",
            switch(num("9"), vec![arrow(Some(num("1")), num("1")), arrow(None, num("0"))]),
        ),
    ]);
    assert_eq!(global(&run, "r"), Value::string("twothree"));
    assert_eq!(global(&run, "v"), number("30"));
    assert_eq!(global(&run, "w"), number("2"));
    assert_eq!(global(&run, "fallback"), number("0"));
}

#[test]
fn test_switch_cases_declare_in_separate_scopes() {
    let run = run(vec![
        set("total", num("0")),
        expr(switch(
            num("1"),
            vec![
                case(
                    num("1"),
                    vec![
                        set("step", num("1")),
                        expr(assign_op(ident("total"), AssignOp::AddAssign, ident("step"))),
                    ],
                ),
                case(
                    num("2"),
                    vec![
                        set("step", num("10")),
                        expr(assign_op(ident("total"), AssignOp::AddAssign, ident("step"))),
                    ],
                ),
            ],
        )),
    ]);
    assert_eq!(global(&run, "total"), number("11"));
    assert!(run.scope.lookup_variable("step").is_none());
}

#[test]
fn test_labelled_continue_and_break() {
    let run = run(vec![
        set("count", num("0")),
        for_loop(
            Some("outer"),
            vec![field("i", num("0"))],
            Some(binary(ident("i"), BinaryOp::Less, num("3"))),
            vec![assign_op(ident("i"), AssignOp::AddAssign, num("1"))],
            vec![for_loop(
                None,
                vec![field("j", num("0"))],
                Some(binary(ident("j"), BinaryOp::Less, num("3"))),
                vec![assign_op(ident("j"), AssignOp::AddAssign, num("1"))],
                vec![
                    if_else(
                        binary(ident("j"), BinaryOp::Equal, num("1")),
                        vec![cont(Some("outer"))],
                        None,
                    ),
                    expr(assign_op(ident("count"), AssignOp::AddAssign, num("1"))),
                ],
            )],
        ),
        set("n", num("0")),
        while_loop(
            Some("spin"),
            boolean(true),
            vec![while_loop(
                None,
                boolean(true),
                vec![
                    expr(assign_op(ident("n"), AssignOp::AddAssign, num("1"))),
                    if_else(
                        binary(ident("n"), BinaryOp::Equal, num("5")),
                        vec![brk(Some("spin"))],
                        None,
                    ),
                ],
            )],
        ),
        set("d", num("0")),
        do_while(
            None,
            vec![expr(assign_op(ident("d"), AssignOp::AddAssign, num("1")))],
            boolean(false),
        ),
    ]);
    assert_eq!(global(&run, "count"), number("3"));
    assert_eq!(global(&run, "n"), number("5"));
    assert_eq!(global(&run, "d"), number("1"));
}

#[test]
fn test_foreach_over_strings_and_map_keys() {
    let run = run(vec![
        set("s", string("")),
        foreach(
            None,
            "ch",
            string("abc"),
            vec![expr(assign(ident("s"), binary(ident("ch"), BinaryOp::Add, ident("s"))))],
        ),
        set("total", num("0")),
        foreach(
            None,
            "k",
            map(vec![(num("1"), string("x")), (num("2"), string("y"))]),
            vec![expr(assign_op(ident("total"), AssignOp::AddAssign, ident("k")))],
        ),
    ]);
    assert_eq!(global(&run, "s"), Value::string("cba"));
    assert_eq!(global(&run, "total"), number("3"));
}

#[test]
fn test_conditions_must_be_boolean() {
    let err = fail(vec![if_else(num("1"), vec![], None)]);
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.message, "Condition must be Boolean, got Number");
}

#[test]
fn test_update_operators() {
    let run = run(vec![
        set("i", num("5")),
        set("a", postfix(UnaryOp::Increment, ident("i"))),
        set("b", unary(UnaryOp::Increment, ident("i"))),
        set("c", unary(UnaryOp::Minus, ident("i"))),
        set("s", string("a")),
        expr(assign_op(ident("s"), AssignOp::AddAssign, num("1"))),
    ]);
    assert_eq!(global(&run, "a"), number("5"));
    assert_eq!(global(&run, "b"), number("7"));
    assert_eq!(global(&run, "i"), number("7"));
    assert_eq!(global(&run, "c"), number("-7"));
    assert_eq!(global(&run, "s"), Value::string("a1"));
}

#[test]
fn test_indexed_assignment_rebuilds_containers() {
    let run = run(vec![
        set("l", list(vec![num("1"), num("2")])),
        expr(assign(index(ident("l"), num("0")), num("9"))),
        set("m", map(vec![(string("a"), num("1"))])),
        expr(assign(index(ident("m"), string("b")), num("2"))),
    ]);
    assert_eq!(global(&run, "l"), Value::list(vec![number("9"), number("2")]));
    assert_eq!(global(&run, "m").as_map().map(|m| m.len()), Some(2));
}

#[test]
fn test_final_variables_reject_assignment() {
    let constant = Expr::VarDecl {
        def: FieldDef {
            is_final: true,
            ..field("k", num("1"))
        },
    };
    let err = fail(vec![expr(constant), expr(assign(ident("k"), num("2")))]);
    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}

#[test]
fn test_closures_capture_their_scope() {
    let make = lambda(
        &["n"],
        vec![ret(Some(lambda(
            &["x"],
            vec![ret(Some(binary(ident("x"), BinaryOp::Add, ident("n"))))],
        )))],
    );
    let run = run(vec![
        set("make", make),
        set("add5", call(ident("make"), vec![num("5")])),
        set("r", call(ident("add5"), vec![num("3")])),
    ]);
    assert_eq!(global(&run, "r"), number("8"));
}

#[test]
fn test_clone_copies_fields() {
    let mut point = class("Point");
    point.cloneable = true;
    point.fields = vec![field("x", num("0"))];
    point.functions = vec![function("Point", &[], vec![])];
    let run = run(vec![
        Stmt::Class(point),
        set("p", new(type_ref("Point"), vec![])),
        set("q", clone(ident("p"))),
        expr(assign(member(ident("q"), "x"), num("9"))),
        set("px", member(ident("p"), "x")),
        set("qx", member(ident("q"), "x")),
    ]);
    assert_eq!(global(&run, "px"), number("0"));
    assert_eq!(global(&run, "qx"), number("9"));
}

#[test]
fn test_namespaced_import_with_alias() {
    let mut loader = MemoryLoader::new();
    loader.insert(
        "/lib/math.sl",
        program(vec![
            namespace("math"),
            Stmt::Function(function(
                "square",
                &["x"],
                vec![ret(Some(binary(ident("x"), BinaryOp::Mul, ident("x"))))],
            )),
        ]),
    );
    let run = run_with(
        loader.clone(),
        vec![
            import("lib/math.sl"),
            use_as("math", "m"),
            set("r", call(scoped("m", "square"), vec![num("4")])),
        ],
    );
    assert_eq!(global(&run, "r"), number("16"));

    // a namespaced file is not visible without its namespace
    let err = interpreter(loader)
        .run_program(
            &program(vec![import("lib/math.sl"), expr(call(ident("square"), vec![num("4")]))]),
            "/main.sl",
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownIdentifier);
}

#[test]
fn test_import_rules() {
    let mut loader = MemoryLoader::new();
    loader.insert("/a.sl", program(vec![import("b.sl")]));
    loader.insert("/b.sl", program(vec![import("a.sl")]));
    let cyclic = interpreter(loader.clone())
        .run_program(&program(vec![import("b.sl")]), "/a.sl")
        .unwrap_err();
    assert_eq!(cyclic.kind, ErrorKind::InvalidImport);

    let wrong_extension = interpreter(loader.clone())
        .run_program(&program(vec![import("notes.txt")]), "/main.sl")
        .unwrap_err();
    assert_eq!(wrong_extension.kind, ErrorKind::InvalidImport);

    let missing = interpreter(loader)
        .run_program(&program(vec![import("gone.sl")]), "/main.sl")
        .unwrap_err();
    assert_eq!(missing.kind, ErrorKind::ImportError);
}

#[test]
fn test_inheritance_rules_are_checked_at_declaration() {
    let mut a = class("A");
    a.extends = Some(type_ref("B"));
    let mut b = class("B");
    b.extends = Some(type_ref("A"));
    let err = fail(vec![Stmt::Class(a), Stmt::Class(b)]);
    assert_eq!(err.kind, ErrorKind::CyclicInheritance);

    let sealed = ClassDef {
        modifier: Some(ClassModifier::Final),
        ..class("Sealed")
    };
    let mut child = class("Child");
    child.extends = Some(type_ref("Sealed"));
    let err = fail(vec![Stmt::Class(sealed), Stmt::Class(child)]);
    assert_eq!(err.kind, ErrorKind::InvalidModifier);

    let mut shape = class("Shape");
    shape.modifier = Some(ClassModifier::Abstract);
    shape.functions = vec![FunctionDef {
        modifier: Some(FunctionModifier::Abstract),
        ..signature("area", &[])
    }];
    let mut square = class("Square");
    square.extends = Some(type_ref("Shape"));
    let err = fail(vec![Stmt::Class(shape.clone()), Stmt::Class(square)]);
    assert_eq!(err.kind, ErrorKind::InvalidModifier);

    let err = fail(vec![
        Stmt::Class(shape),
        expr(new(type_ref("Shape"), vec![])),
    ]);
    assert_eq!(err.kind, ErrorKind::Instantiation);
}

#[test]
fn test_unknown_supertype_is_reported() {
    let mut orphan = class("Orphan");
    orphan.extends = Some(type_ref("Missing"));
    let err = fail(vec![Stmt::Class(orphan)]);
    assert_eq!(err.kind, ErrorKind::UnknownType);
}

#[test]
fn test_interface_functions_cannot_be_private() {
    let mut shape = interface("Shape");
    shape.functions = vec![FunctionDef {
        access: AccessModifier::Private,
        ..signature("area", &[])
    }];
    let err = fail(vec![Stmt::Interface(shape)]);
    assert_eq!(err.kind, ErrorKind::InvalidModifier);
}

#[test]
fn test_hook_declarations_are_validated() {
    let mut wrong_arity = class("Pair");
    wrong_arity.functions = vec![function("__add", &[], vec![ret(None)])];
    assert_eq!(fail(vec![Stmt::Class(wrong_arity)]).kind, ErrorKind::InvalidHook);

    let mut not_cloneable = class("Plain");
    not_cloneable.functions = vec![function("__clone", &[], vec![ret(Some(ident("this")))])];
    assert_eq!(fail(vec![Stmt::Class(not_cloneable)]).kind, ErrorKind::InvalidHook);

    let mut reserved = enumeration("Color", vec![constant("RED", vec![])]);
    reserved.functions = vec![function("ordinal", &[], vec![ret(Some(num("0")))])];
    assert_eq!(fail(vec![Stmt::Enum(reserved)]).kind, ErrorKind::InvalidHook);
}

#[test]
fn test_conversion_hook_result_is_type_checked() {
    let mut flag = class("Flag");
    flag.functions = vec![
        function("Flag", &[], vec![]),
        function("__boolean", &[], vec![ret(Some(num("1")))]),
    ];
    let err = fail(vec![
        Stmt::Class(flag),
        if_else(new(type_ref("Flag"), vec![]), vec![], None),
    ]);
    assert_eq!(err.kind, ErrorKind::HookReturnType);
}
