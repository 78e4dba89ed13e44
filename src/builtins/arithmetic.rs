//! Integer operations: =, +, -, *, zero?
//!
//! All arithmetic is 64-bit signed.
//!
//! - `=`: All-equal over two or more integers
//! - `+`: Sum of all arguments (identity: 0)
//! - `-`: Subtract subsequent args from first, or negate if single arg
//! - `*`: Product of all arguments (identity: 1)
//! - `zero?`: Test a single integer against zero

use crate::env::Environment;
use crate::error::NodeError;
use crate::eval::Evaluator;
use crate::list::List;
use crate::node::{Kind, Node};

use super::define_builtin;

fn int_value(node: &Node, who: &str) -> Result<i64, NodeError> {
    match node.kind() {
        Kind::Int(v) => Ok(*v),
        _ => Err(NodeError::new(node, format!("non-integer argument to {who}"))),
    }
}

/// All-equal comparison over two or more integers.
pub fn builtin_num_eq(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    if args.len() < 2 {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "= expects at least two arguments",
        ));
    }
    let first = int_value(&args.first().expect("checked length"), "=")?;
    for node in args.rest().iter() {
        if int_value(&node, "=")? != first {
            return Ok(Node::boolean(false));
        }
    }
    Ok(Node::boolean(true))
}

/// Sum of all arguments.
pub fn builtin_add(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    let mut sum = 0i64;
    for node in args.iter() {
        sum += int_value(&node, "+")?;
    }
    Ok(Node::int(sum))
}

/// Subtract subsequent arguments from the first; negate a single argument.
pub fn builtin_sub(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    let Some(first) = args.first() else {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "- expects at least one argument",
        ));
    };
    let mut result = int_value(&first, "-")?;
    if args.len() == 1 {
        return Ok(Node::int(-result));
    }
    for node in args.rest().iter() {
        result -= int_value(&node, "-")?;
    }
    Ok(Node::int(result))
}

/// Product of all arguments.
pub fn builtin_mul(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    let mut product = 1i64;
    for node in args.iter() {
        product *= int_value(&node, "*")?;
    }
    Ok(Node::int(product))
}

/// Test a single integer against zero.
pub fn builtin_zero_p(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    if args.len() != 1 {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "zero? expects exactly one argument",
        ));
    }
    let value = int_value(&args.first().expect("checked length"), "zero?")?;
    Ok(Node::boolean(value == 0))
}

/// Register all arithmetic builtins in the environment.
pub fn register(env: &Environment) {
    define_builtin(env, "=", builtin_num_eq);
    define_builtin(env, "+", builtin_add);
    define_builtin(env, "-", builtin_sub);
    define_builtin(env, "*", builtin_mul);
    define_builtin(env, "zero?", builtin_zero_p);
}
