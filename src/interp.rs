// ABOUTME: Pipeline assembly: lex, parse, transform, then evaluate

use std::io::Write;

use log::debug;

use crate::builtins;
use crate::env::Environment;
use crate::error::Error;
use crate::eval::Evaluator;
use crate::lexer::Lexer;
use crate::node::Node;
use crate::parser::Parser;
use crate::stdlib;
use crate::transform::transform;

/// Lex, parse and transform `source` into an evaluable tree. The lexer
/// runs on its worker; after parsing, it is joined deterministically so a
/// lex failure is surfaced in preference to the parse error it caused
/// downstream.
pub fn parse_source(file: &str, source: &str) -> Result<Node, Error> {
    let (tokens, lexer) = Lexer::spawn(file, source);
    let mut parser = Parser::new(file, tokens);
    let parsed = parser.parse_program();
    // Close the stream so a still-running lexer can exit.
    drop(parser);
    lexer.join().expect("lexer thread panicked")?;
    let parsed = parsed?;
    transform(&parsed).map_err(Error::Transform)
}

/// Evaluate `source` in `env`, writing `display` output to `out`.
pub fn eval_source(
    file: &str,
    source: &str,
    env: &Environment,
    out: &mut dyn Write,
) -> Result<Node, Error> {
    let tree = parse_source(file, source)?;
    debug!("evaluating {file}");
    Evaluator::new(out).eval(&tree, env).map_err(Error::Eval)
}

/// The default top level: every builtin plus the interpreted prelude.
pub fn default_environment(out: &mut dyn Write) -> Result<Environment, Error> {
    let env = builtins::default_environment();
    eval_source(stdlib::PRELUDE_FILE, stdlib::PRELUDE, &env, out)?;
    Ok(env)
}

/// One-shot convenience: fresh environment, prelude, then the program.
pub fn eval_program(file: &str, source: &str, out: &mut dyn Write) -> Result<Node, Error> {
    let env = default_environment(out)?;
    eval_source(file, source, &env, out)
}
