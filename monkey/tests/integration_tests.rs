use monkey::{evaluate, interpret, Error};

/// Runs `source` on the VM and returns the rendering of its result.
fn run(source: &str) -> String {
    interpret(source).unwrap().to_string()
}

/// Runs `source` on the tree-walking backend and returns the rendering
/// of its result.
fn eval(source: &str) -> String {
    evaluate(source).unwrap().to_string()
}

/// Both backends must agree on every legal program.
fn run_both(source: &str) -> String {
    let compiled = run(source);
    let evaluated = eval(source);
    assert_eq!(compiled, evaluated, "backends disagree on {:?}", source);
    compiled
}

#[test]
fn arithmetic() {
    assert_eq!(run_both("50 / 2 * 2 + 10 - 5"), "55");
    assert_eq!(run_both("-(5 + 5)"), "-10");
    assert_eq!(run_both("5 * 2 + 10 == 10 + 5 * 2"), "true");
}

#[test]
fn conditionals() {
    assert_eq!(run_both("if (1 > 2) { 10 }"), "null");
    assert_eq!(run_both("if (1 < 2) { 10 } else { 20 }"), "10");
}

#[test]
fn bindings() {
    assert_eq!(run_both("let x = 5; let y = x * 2; x + y"), "15");
    assert_eq!(run_both("let x = 5; let x = x + 1; x"), "6");
}

#[test]
fn closures() {
    assert_eq!(
        run_both(
            "let newAdder = fn(a) { fn(b) { a + b } };
             let addTwo = newAdder(2);
             addTwo(3)"
        ),
        "5"
    );
}

#[test]
fn recursion() {
    assert_eq!(
        run_both(
            "let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } };
             fib(10)"
        ),
        "55"
    );
}

#[test]
fn hashes() {
    assert_eq!(run_both("let m = {1: 2, 2: 3}; m[1] + m[2]"), "5");
    assert_eq!(
        run_both(r#"let m = {"a": 1, true: 2, 3: 4}; m["a"] + m[true] + m[3]"#),
        "7"
    );
    assert_eq!(run_both("{1: 2}[5]"), "null");
}

#[test]
fn arrays_and_builtins() {
    assert_eq!(
        run_both(
            "let map = fn(arr, f) {
                 let iter = fn(a, acc) {
                     if (len(a) == 0) { acc }
                     else { iter(rest(a), push(acc, f(first(a)))) }
                 };
                 iter(arr, [])
             };
             map([1, 2, 3], fn(x) { x * 2 })"
        ),
        "[2, 4, 6]"
    );
    assert_eq!(
        run_both(
            "let reduce = fn(arr, initial, f) {
                 let iter = fn(a, result) {
                     if (len(a) == 0) { result }
                     else { iter(rest(a), f(result, first(a))) }
                 };
                 iter(arr, initial)
             };
             reduce([1, 2, 3, 4], 0, fn(sum, el) { sum + el })"
        ),
        "10"
    );
    assert_eq!(run_both(r#"len("") + len("four") + len([1, 2, 3])"#), "7");
    assert_eq!(run_both("first([])"), "null");
    assert_eq!(run_both("last([])"), "null");
    assert_eq!(run_both("rest([])"), "null");
    assert_eq!(run_both("push([1], 2)"), "[1, 2]");
}

#[test]
fn strings() {
    assert_eq!(run_both(r#""Hello" + " " + "World!""#), "Hello World!");
}

#[test]
fn macros() {
    assert_eq!(
        run_both(
            "let unless = macro(condition, consequence, alternative) {
                 quote(if (!(unquote(condition))) {
                     unquote(consequence);
                 } else {
                     unquote(alternative);
                 });
             };
             unless(10 > 5, 1, 2)"
        ),
        "2"
    );
}

#[test]
fn parse_errors_abort() {
    match interpret("let = 5;") {
        Err(Error::Parse(rendered)) => assert!(rendered.contains("unexpected token `=`")),
        other => panic!("expected a parse error, got {:?}", other.map(|v| v.to_string())),
    }
}

#[test]
fn compile_errors_surface() {
    match interpret("foobar") {
        Err(Error::Compile(err)) => {
            assert_eq!(err.to_string(), "undefined variable foobar");
        }
        other => panic!("expected a compile error, got {:?}", other.map(|v| v.to_string())),
    }
}

#[test]
fn runtime_errors_surface() {
    match interpret("5 + true") {
        Err(Error::Runtime(err)) => {
            assert_eq!(
                err.to_string(),
                "unsupported types for binary operation: INTEGER BOOLEAN"
            );
        }
        other => panic!("expected a runtime error, got {:?}", other.map(|v| v.to_string())),
    }
}
