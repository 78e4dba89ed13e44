//! Console output: display
//!
//! `display` writes its one argument to the evaluator's output sink
//! without a trailing newline and evaluates to `()`. Strings render
//! decoded, without surrounding quotes. The prelude builds `write` and
//! `newline` on top of it.

use crate::env::Environment;
use crate::error::NodeError;
use crate::eval::Evaluator;
use crate::list::List;
use crate::node::Node;

use super::define_builtin;

/// Write a single value to the output sink. Returns `()`.
pub fn builtin_display(e: &mut Evaluator, args: &List) -> Result<Node, NodeError> {
    if args.len() != 1 {
        return Err(NodeError::new(
            &Node::from_list(args.clone()),
            "display expects exactly one argument",
        ));
    }
    let arg = args.first().expect("checked length");
    e.write_out(&arg.to_string())
        .map_err(|err| NodeError::new(&arg, format!("display failed to write [{err}]")))?;
    Ok(Node::nil())
}

/// Register all console builtins in the environment.
pub fn register(env: &Environment) {
    define_builtin(env, "display", builtin_display);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Kind;
    use crate::position::Position;

    #[test]
    fn test_display_writes_decoded_text() {
        let text = Node::new(
            Kind::Str("hello, world\n".to_string()),
            Position::internal("<test>"),
        );
        let args: List = vec![text].into_iter().collect();
        let mut out = Vec::new();
        let result = {
            let mut evaluator = Evaluator::new(&mut out);
            builtin_display(&mut evaluator, &args).unwrap()
        };
        assert!(result.is_nil());
        assert_eq!(String::from_utf8(out).unwrap(), "hello, world\n");
    }

    #[test]
    fn test_display_arity() {
        let mut out = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        let err = builtin_display(&mut evaluator, &List::new()).unwrap_err();
        assert!(err.to_string().starts_with("display expects exactly one"));
    }
}
