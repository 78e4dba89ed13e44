//! List operations: list, length, reverse, append, apply
//!
//! - `list`: Collect the arguments into a fresh list
//! - `length`: Number of elements in a list
//! - `reverse`: Reversed copy of a list
//! - `append`: Concatenate lists, left to right
//! - `apply`: Apply a procedure to leading args plus a trailing list

use crate::env::Environment;
use crate::error::NodeError;
use crate::eval::Evaluator;
use crate::list::List;
use crate::node::{Kind, Node};

use super::define_builtin;

fn list_value<'n>(node: &'n Node, who: &str) -> Result<&'n List, NodeError> {
    match node.kind() {
        Kind::List(list) => Ok(list),
        _ => Err(NodeError::new(node, format!("non-list argument to {who}"))),
    }
}

/// Collect the evaluated arguments into a list.
pub fn builtin_list(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    Ok(Node::from_list(args.clone()))
}

/// Number of elements in a single list argument.
pub fn builtin_length(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    if args.len() != 1 {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "length expects exactly one argument",
        ));
    }
    let arg = args.first().expect("checked length");
    let list = list_value(&arg, "length")?;
    Ok(Node::int(list.len() as i64))
}

/// Reversed copy of a single list argument.
pub fn builtin_reverse(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    if args.len() != 1 {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "reverse expects exactly one argument",
        ));
    }
    let arg = args.first().expect("checked length");
    let list = list_value(&arg, "reverse")?;
    Ok(Node::from_list(list.reverse()))
}

/// Concatenate every list argument into one fresh list.
pub fn builtin_append(_e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    if args.is_empty() {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "append expects at least one argument",
        ));
    }
    let mut items = Vec::new();
    for arg in args.iter() {
        items.extend(list_value(&arg, "append")?.iter());
    }
    Ok(Node::from_list(items.into_iter().collect()))
}

/// `(apply f a b lst)` conses the leading arguments onto `lst` and applies
/// `f` to the result.
pub fn builtin_apply(e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    if args.len() < 2 {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "apply expects a procedure and an argument list",
        ));
    }
    let items: Vec<Node> = args.iter().collect();
    let (last, front) = items.split_last().expect("checked length");
    let Kind::List(tail) = last.kind() else {
        return Err(NodeError::new(
            last,
            "non-list as the final argument to apply",
        ));
    };
    let call: List = front.iter().cloned().chain(tail.iter()).collect();
    e.apply(&Node::from_list(call))
}

/// Register all list builtins in the environment.
pub fn register(env: &Environment) {
    define_builtin(env, "list", builtin_list);
    define_builtin(env, "length", builtin_length);
    define_builtin(env, "reverse", builtin_reverse);
    define_builtin(env, "append", builtin_append);
    define_builtin(env, "apply", builtin_apply);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Node {
        Node::from_list(values.iter().map(|v| Node::int(*v)).collect())
    }

    #[test]
    fn test_list_collects_arguments() {
        let mut out = Vec::new();
        let mut e = Evaluator::new(&mut out);
        let args: List = vec![Node::int(1), Node::int(2)].into_iter().collect();
        let result = builtin_list(&mut e, &args).unwrap();
        assert_eq!(result.to_string(), "(1 2)");
    }

    #[test]
    fn test_length_and_reverse() {
        let mut out = Vec::new();
        let mut e = Evaluator::new(&mut out);
        let args: List = vec![ints(&[1, 2, 3])].into_iter().collect();
        let len = builtin_length(&mut e, &args).unwrap();
        assert_eq!(len.to_string(), "3");
        let rev = builtin_reverse(&mut e, &args).unwrap();
        assert_eq!(rev.to_string(), "(3 2 1)");
    }

    #[test]
    fn test_append_concatenates_in_order() {
        let mut out = Vec::new();
        let mut e = Evaluator::new(&mut out);
        let args: List = vec![ints(&[1, 2]), ints(&[3]), ints(&[4, 5])]
            .into_iter()
            .collect();
        let result = builtin_append(&mut e, &args).unwrap();
        assert_eq!(result.to_string(), "(1 2 3 4 5)");
    }

    #[test]
    fn test_length_rejects_non_lists() {
        let mut out = Vec::new();
        let mut e = Evaluator::new(&mut out);
        let args: List = vec![Node::int(9)].into_iter().collect();
        let err = builtin_length(&mut e, &args).unwrap_err();
        assert!(err.to_string().starts_with("non-list argument to length"));
    }

    #[test]
    fn test_apply_conses_onto_the_trailing_list() {
        let mut out = Vec::new();
        let mut e = Evaluator::new(&mut out);
        let add = Node::builtin("+", crate::builtins::arithmetic::builtin_add);
        let args: List = vec![add, Node::int(1), ints(&[2, 3])].into_iter().collect();
        let result = builtin_apply(&mut e, &args).unwrap();
        assert_eq!(result.to_string(), "6");
    }
}
