// ABOUTME: The source-dialect prelude evaluated before every user program

/// Prelude definitions written in the dialect itself, run in the same
/// environment the program will then use. `cons`, `car` and `cdr` are the
/// classic selector-closure encoding, so pairs built here are procedures
/// rather than native pair nodes.
pub const PRELUDE: &str = r#"
(define (write x) (display x))
(define (newline) (display "\n"))

(define (cons a b)
  (lambda (x)
    (if (= x 1)
        a
        b)))

(define (car p)
  (p 1))

(define (cdr p)
  (p 2))
"#;

/// File label used in diagnostics for errors raised inside the prelude.
pub const PRELUDE_FILE: &str = "<prelude>";
