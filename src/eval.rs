// ABOUTME: Tree-walking evaluator with lexical closures and quasiquote nesting

use std::io::Write;

use crate::env::{Environment, Frame};
use crate::error::NodeError;
use crate::list::List;
use crate::node::{Define, If, Kind, Let, Node, Procedure, Progn, Quote, Set, Unquote};

/// Reduces transformed nodes to values. The evaluator is a pure function
/// of (node, environment) apart from its output sink and the top-level
/// mutations `define` and `set!` make through the environment.
pub struct Evaluator<'w> {
    out: &'w mut dyn Write,
    /// Quasiquote nesting depth. Zero means normal evaluation; above zero
    /// structure is preserved and only unquote holes are evaluated.
    nesting: u32,
}

impl<'w> Evaluator<'w> {
    pub fn new(out: &'w mut dyn Write) -> Self {
        Evaluator { out, nesting: 0 }
    }

    fn quoting(&self) -> bool {
        self.nesting > 0
    }

    pub(crate) fn write_out(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    pub fn eval(&mut self, node: &Node, env: &Environment) -> Result<Node, NodeError> {
        match node.kind() {
            Kind::Error(err) => Err(err.clone()),
            Kind::Int(_) | Kind::Bool(_) | Kind::Str(_) | Kind::Symbol(_) => Ok(node.clone()),
            // Pairs, closures and builtins are already values.
            Kind::Pair(_) | Kind::Procedure(_) | Kind::Builtin(_) => Ok(node.clone()),
            Kind::Identifier(name) => {
                if self.quoting() {
                    return Ok(node.clone());
                }
                env.lookup(name)
                    .ok_or_else(|| NodeError::new(node, format!("identifier not found [{name}]")))
            }
            Kind::Quote(q) => self.eval_quote(q, env),
            Kind::Unquote(u) => self.eval_unquote(node, u, env),
            Kind::List(list) => self.eval_list(node, list, env),
            Kind::Lambda(l) => {
                if self.quoting() {
                    return self.eval_form(node, &l.form, env);
                }
                Ok(Node::new(
                    Kind::Procedure(Procedure {
                        lambda: l.clone(),
                        env: env.clone(),
                    }),
                    node.pos().clone(),
                ))
            }
            Kind::If(form) => {
                if self.quoting() {
                    return self.eval_form(node, &form.form, env);
                }
                self.eval_if(form, env)
            }
            Kind::Set(form) => {
                if self.quoting() {
                    return self.eval_form(node, &form.form, env);
                }
                self.eval_set(node, form, env)
            }
            Kind::Let(form) => {
                if self.quoting() {
                    return self.eval_form(node, &form.form, env);
                }
                self.eval_let(form, env)
            }
            Kind::Define(form) => {
                if self.quoting() {
                    return self.eval_form(node, &form.form, env);
                }
                self.eval_define(form, env)
            }
            Kind::Progn(p) => {
                if self.quoting() {
                    return self.eval_progn_quoted(node, p, env);
                }
                self.eval_progn(p, env)
            }
        }
    }

    /// `quote` returns its argument untouched; `quasiquote` evaluates it
    /// one nesting level deeper.
    fn eval_quote(&mut self, q: &Quote, env: &Environment) -> Result<Node, NodeError> {
        if !q.quasi {
            return Ok(q.arg.clone());
        }
        self.nesting += 1;
        let value = self.eval(&q.arg, env);
        self.nesting -= 1;
        value
    }

    fn eval_unquote(
        &mut self,
        node: &Node,
        u: &Unquote,
        env: &Environment,
    ) -> Result<Node, NodeError> {
        if self.nesting == 0 {
            return Err(NodeError::new(node, "unquote outside quasiquote"));
        }
        self.nesting -= 1;
        let value = self.eval(&u.arg, env);
        self.nesting += 1;
        value
    }

    /// Evaluate every child; in quoting mode the rebuilt list is the
    /// result, otherwise the head is applied to the tail.
    fn eval_list(&mut self, node: &Node, list: &List, env: &Environment) -> Result<Node, NodeError> {
        let mut items = Vec::with_capacity(list.len());
        for child in list.iter() {
            items.push(self.eval(&child, env)?);
        }
        let evaled = Node::new(Kind::List(items.into_iter().collect()), node.pos().clone());
        if self.quoting() {
            return Ok(evaled);
        }
        self.apply(&evaled)
    }

    /// Evaluate a special form's source list; only reachable in quoting
    /// mode, where the form keeps its written shape.
    fn eval_form(&mut self, node: &Node, form: &List, env: &Environment) -> Result<Node, NodeError> {
        self.eval_list(node, form, env)
    }

    fn eval_progn_quoted(
        &mut self,
        node: &Node,
        progn: &Progn,
        env: &Environment,
    ) -> Result<Node, NodeError> {
        let mut items = vec![Node::new(
            Kind::Identifier("progn".to_string()),
            node.pos().clone(),
        )];
        items.extend(progn.body.iter());
        let form: List = items.into_iter().collect();
        self.eval_form(node, &form, env)
    }

    /// Apply the head of an already-evaluated list to its tail.
    pub fn apply(&mut self, call: &Node) -> Result<Node, NodeError> {
        let Kind::List(list) = call.kind() else {
            return Err(NodeError::new(call, "cannot apply a non-list"));
        };
        let Some(head) = list.first() else {
            return Err(NodeError::new(call, "empty application"));
        };
        let args = list.rest();
        match head.kind() {
            Kind::Procedure(procedure) => self.apply_procedure(procedure, &args, call),
            Kind::Builtin(builtin) => (builtin.func)(self, &args),
            _ => Err(NodeError::new(
                call,
                format!("cannot apply non-procedure [{head}]"),
            )),
        }
    }

    fn apply_procedure(
        &mut self,
        procedure: &Procedure,
        args: &List,
        call: &Node,
    ) -> Result<Node, NodeError> {
        let params = &procedure.lambda.params;
        if params.len() != args.len() {
            return Err(NodeError::new(
                call,
                format!(
                    "arity mismatch, expected {} arguments, got {}",
                    params.len(),
                    args.len()
                ),
            ));
        }
        let mut frame = Frame::new();
        for (param, value) in params.iter().zip(args.iter()) {
            let Kind::Identifier(name) = param.kind() else {
                return Err(NodeError::new(&param, "lambda parameter is not an identifier"));
            };
            frame.insert(name.clone(), value);
        }
        let env = procedure.env.with_frame(frame);
        self.eval(&procedure.lambda.body, &env)
    }

    fn eval_if(&mut self, form: &If, env: &Environment) -> Result<Node, NodeError> {
        let cond = self.eval(&form.cond, env)?;
        match cond.kind() {
            Kind::Bool(true) => self.eval(&form.then_branch, env),
            Kind::Bool(false) => self.eval(&form.else_branch, env),
            _ => Err(NodeError::new(
                &form.cond,
                "non-boolean condition in if",
            )),
        }
    }

    fn eval_set(&mut self, node: &Node, form: &Set, env: &Environment) -> Result<Node, NodeError> {
        let value = self.eval(&form.value, env)?;
        if !env.set(&form.name, value.clone()) {
            return Err(NodeError::new(
                node,
                format!("identifier not found in set! [{}]", form.name),
            ));
        }
        Ok(value)
    }

    /// All keys are preinitialized to the empty list, then each binding is
    /// evaluated in the enlarged environment before the body runs. The
    /// pushed frame is a local view, so it pops on every exit path.
    fn eval_let(&mut self, form: &Let, env: &Environment) -> Result<Node, NodeError> {
        let mut frame = Frame::new();
        for (name, _) in &form.bindings {
            frame.insert(name.clone(), Node::nil());
        }
        let inner = env.with_frame(frame);
        for (name, expr) in &form.bindings {
            let value = self.eval(expr, &inner)?;
            inner.define(name.clone(), value);
        }
        self.eval(&form.body, &inner)
    }

    /// The defined value lands in the outermost frame; the result is the
    /// unevaluated value expression.
    fn eval_define(&mut self, form: &Define, env: &Environment) -> Result<Node, NodeError> {
        let value = self.eval(&form.value, env)?;
        env.add_define(form.name.clone(), value);
        Ok(form.value.clone())
    }

    fn eval_progn(&mut self, progn: &Progn, env: &Environment) -> Result<Node, NodeError> {
        let mut last = Node::nil();
        for child in progn.body.iter() {
            last = self.eval(&child, env)?;
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::error::Error;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::transform::transform;

    fn eval_str(source: &str) -> Result<Node, Error> {
        let (tokens, lexer) = Lexer::spawn("<test>", source);
        let mut parser = Parser::new("<test>", tokens);
        let parsed = parser.parse_program();
        drop(parser);
        lexer.join().expect("lexer thread panicked")?;
        let tree = transform(&parsed?).map_err(Error::Transform)?;
        let env = builtins::default_environment();
        let mut out = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        evaluator.eval(&tree, &env).map_err(Error::Eval)
    }

    fn eval_printed(source: &str) -> String {
        eval_str(source)
            .expect("evaluation should succeed")
            .to_string()
    }

    #[test]
    fn test_atoms_self_evaluate() {
        assert_eq!(eval_printed("1"), "1");
        assert_eq!(eval_printed("#t"), "#t");
        assert_eq!(eval_printed("\"hi\""), "hi");
    }

    #[test]
    fn test_lambda_application() {
        assert_eq!(eval_printed("((lambda (x y) (+ y x)) 1 3)"), "4");
    }

    #[test]
    fn test_let_does_not_leak() {
        let err = eval_str("(progn (let ((x 1)) x) x)").unwrap_err();
        assert!(err.to_string().starts_with("identifier not found [x]"));
    }

    #[test]
    fn test_quasiquote_expands_unquote() {
        assert_eq!(eval_printed("`(+ ,(+ 2 3) ,(+ 3 4))"), "(+ 5 7)");
    }

    #[test]
    fn test_quoted_identifiers_are_preserved() {
        assert_eq!(eval_printed("`(frob 1 2)"), "(frob 1 2)");
    }

    #[test]
    fn test_unquote_outside_quasiquote_is_an_error() {
        let err = eval_str(",(+ 1 2)").unwrap_err();
        assert!(err.to_string().starts_with("unquote outside quasiquote"));
    }

    #[test]
    fn test_define_returns_the_value_expression() {
        assert_eq!(eval_printed("(define a (+ 1 1))"), "(+ 1 1)");
    }

    #[test]
    fn test_if_requires_a_boolean() {
        let err = eval_str("(if 1 2 3)").unwrap_err();
        assert!(err.to_string().starts_with("non-boolean condition in if"));
    }
}
