// ABOUTME: End-to-end interpreter tests running the whole pipeline per case

use rustle::interp::eval_program;

struct TestCase {
    code: &'static str,
    result: &'static str,
    err: &'static str,
}

fn case(code: &'static str, result: &'static str, err: &'static str) -> TestCase {
    TestCase { code, result, err }
}

fn run_cases(cases: &[TestCase]) {
    for (i, tc) in cases.iter().enumerate() {
        let mut out = Vec::new();
        match eval_program("<test>", tc.code, &mut out) {
            Ok(value) => {
                assert!(
                    tc.err.is_empty(),
                    "{i}: expected error [{}] for code: {}",
                    tc.err,
                    tc.code
                );
                assert_eq!(
                    value.to_string(),
                    tc.result,
                    "{i}: wrong result for code: {}",
                    tc.code
                );
            }
            Err(err) => {
                let text = err.to_string();
                assert!(
                    !tc.err.is_empty(),
                    "{i}: unexpected error [{text}] for code: {}",
                    tc.code
                );
                assert!(
                    text.starts_with(tc.err),
                    "{i}: wrong error [{text}] != [{}] for code: {}",
                    tc.err,
                    tc.code
                );
            }
        }
    }
}

#[test]
fn test_basic() {
    run_cases(&[
        case("1", "1", ""),
        case("1\n\t", "1", ""),
        case("0", "0", ""),
        case("-1", "-1", ""),
        case("+1", "1", ""),
        case("(+ 1 1)", "2", ""),
        case("(- 1 1)", "0", ""),
        case("(- 1 2)", "-1", ""),
        case("(- 5)", "-5", ""),
        case("(* 2 3 4)", "24", ""),
        case("(+ (+ 1 2) (+ 2 3))", "8", ""),
        case("(zero? 0)", "#t", ""),
        case("(zero? 3)", "#f", ""),
        case("\"hello world\"", "hello world", ""),
        case("\"hello \\\" world\"", "hello \" world", ""),
        case("#t", "#t", ""),
        case("#f", "#f", ""),
        case("(progn 1 2 3)", "3", ""),
        case("(progn)", "()", ""),
        case("(progn 1)", "1", ""),
        case("(progn 1 2 (+ 1 2))", "3", ""),
        case("(progn \"foo\" \"bar\")", "bar", ""),
        case("(if #t 2 3)", "2", ""),
        case("(if #f 2 3)", "3", ""),
        case("(if #t 2 (error \"no\"))", "2", ""),
        case("(= 1 1 1)", "#t", ""),
        case("(= 1 1 2)", "#f", ""),
    ]);
}

#[test]
fn test_let_and_lambda() {
    run_cases(&[
        case("(let ((x 1)) x)", "1", ""),
        case("(let ((x (- 1 2))) x)", "-1", ""),
        case("(let ((- +)) (let ((x (- 1 2))) x))", "3", ""),
        case("(let ((x 1)) 3 2 x)", "1", ""),
        case("(letrec ((x 2)) x)", "2", ""),
        case("((lambda (x) (+ 1 x)) 1)", "2", ""),
        case("((lambda (x y) (+ y x)) 1 3)", "4", ""),
        case("((lambda () 2))", "2", ""),
        case("((lambda (x) (+ 1 x) (+ 2 x)) 2)", "4", ""),
        case(
            "(let ((f (lambda (x) (+ 1 x)))) (f (+ 1 2)))",
            "4",
            "",
        ),
        case("((lambda (x) x) 1 2)", "", "arity mismatch"),
        case("(let ((x 1)) missing)", "", "identifier not found [missing]"),
    ]);
}

#[test]
fn test_define() {
    run_cases(&[
        case("(define a 2) a", "2", ""),
        case("(define a 2) (define a 3) a", "3", ""),
        case("(define f (lambda (x) (+ 1 x))) (+ 1 3)", "4", ""),
        case("(define f (lambda (x) (+ 1 x))) (f 3)", "4", ""),
        case("(define f (lambda () 2)) (f)", "2", ""),
        case("(define (f) 2) (f)", "2", ""),
        case("(define (f x) (+ 1 x)) (f 3)", "4", ""),
        case("(define (f x) 1) (f 3)", "1", ""),
        case("(define (f x) (+ 1 x) (+ 2 x) (+ 3 x)) (f 7)", "10", ""),
        case("(define (fact x) 6) (fact 3)", "6", ""),
        case(
            "
(define (fact-helper x res)
  (if (= x 0)
      res
      (fact-helper (- x 1) (* res x))))

(define (fact x)
  (fact-helper x 1))

(fact 3)
",
            "6",
            "",
        ),
        // A closure created before a define still sees it at call time,
        // because lookup goes through the shared top-level frame.
        case("(define (call-it) (f 1)) (define (f x) (+ 10 x)) (call-it)", "11", ""),
    ]);
}

#[test]
fn test_set() {
    run_cases(&[
        case("(define a 1) (set! a 2) a", "2", ""),
        case("(let ((x 1)) (set! x 5) x)", "5", ""),
        case(
            "(define x 1) (let ((x 2)) (set! x 9)) x",
            "1",
            "",
        ),
        case("(set! ghost 1)", "", "identifier not found in set! [ghost]"),
    ]);
}

#[test]
fn test_quoting() {
    run_cases(&[
        case("'1", "1", ""),
        case("'()", "()", ""),
        case("'(+ 1 2)", "(+ 1 2)", ""),
        case("`1", "1", ""),
        case("`()", "()", ""),
        case("`(+ 1 2)", "(+ 1 2)", ""),
        case("`,(+ 1 2)", "3", ""),
        case("`(+ ,(+ 2 3) ,(+ 3 4))", "(+ 5 7)", ""),
        case("(quote 1)", "1", ""),
        case("(quote ())", "()", ""),
        case("(quote (+ 1 2))", "(+ 1 2)", ""),
        case("(quasiquote 1)", "1", ""),
        case("(quasiquote ())", "()", ""),
        case("(quasiquote (+ 1 2))", "(+ 1 2)", ""),
        case("(quasiquote (unquote (+ 1 2)))", "3", ""),
        case("(quote (unquote (+ 1 2)))", ",(+ 1 2)", ""),
        case("'(unquote (+ 1 2))", ",(+ 1 2)", ""),
        case("`(if ,(+ 0 1) 2 3)", "(if 1 2 3)", ""),
        case(",(+ 1 2)", "", "unquote outside quasiquote"),
        case("(list 1 2 3)", "(1 2 3)", ""),
        case("(list (+ 1 1) 2 3)", "(2 2 3)", ""),
    ]);
}

#[test]
fn test_list_builtins() {
    run_cases(&[
        case("(length (list 1 2 3))", "3", ""),
        case("(length (list))", "0", ""),
        case("(reverse (list 1 2 3))", "(3 2 1)", ""),
        case("(reverse (reverse (list 1 2 3)))", "(1 2 3)", ""),
        case("(append (list 1 2) (list 3 4))", "(1 2 3 4)", ""),
        case(
            "(length (append (list 1 2) (list 3 4 5)))",
            "5",
            "",
        ),
        case("(apply + 1 2 (list 3 4))", "10", ""),
        case("(apply + (list 1 2 3))", "6", ""),
        case("(length 1)", "", "non-list argument to length"),
    ]);
}

#[test]
fn test_errors() {
    run_cases(&[
        case("()", "", "empty application"),
        case("(error \"time to die\")", "", "time to die"),
        case("(+ (error \"foo\") 1)", "", "foo"),
        case("(+ 1 (error \"foo\"))", "", "foo"),
        case("(progn (error \"foo\") \"bar\")", "", "foo"),
        case("(1 2 3)", "", "cannot apply non-procedure"),
        case("(if 1 2 3)", "", "non-boolean condition in if"),
        case("undefined-name", "", "identifier not found [undefined-name]"),
        case("(+ 1 #t)", "", "non-integer argument to +"),
    ]);
}

#[test]
fn test_prelude() {
    run_cases(&[
        case("(car (cons 1 2))", "1", ""),
        case("(cdr (cons 1 2))", "2", ""),
        case("(car (cons (+ 1 1) 9))", "2", ""),
        case("(car (cdr (cons 1 (cons 2 3))))", "2", ""),
    ]);
}

#[test]
fn test_display_writes_to_stdout() {
    let mut out = Vec::new();
    let value = eval_program("<test>", "(display \"hello, world\\n\")", &mut out)
        .expect("display should succeed");
    assert_eq!(value.to_string(), "()");
    assert_eq!(String::from_utf8(out).unwrap(), "hello, world\n");
}

#[test]
fn test_prelude_write_and_newline() {
    let mut out = Vec::new();
    eval_program("<test>", "(write \"abc\") (newline) (write 42)", &mut out)
        .expect("write should succeed");
    assert_eq!(String::from_utf8(out).unwrap(), "abc\n42");
}

#[test]
fn test_error_message_carries_position() {
    let mut out = Vec::new();
    let err = eval_program("<test>", "(error \"time to die\")", &mut out).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("time to die: <test> line 1:1"), "got: {text}");
}
