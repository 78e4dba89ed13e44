// ABOUTME: Fixpoint type inference over the transformed AST

use std::collections::HashMap;

use log::{debug, trace};

use crate::error::NodeError;
use crate::node::{Kind, Node};
use crate::types::{Type, TypeEnv, VarStore};

/// Inference walks the tree repeatedly, unifying the local constraints of
/// each form, until a full pass records no new substitution.
const MAX_PASSES: usize = 100;

/// Infer types for a transformed program, returning the substitution
/// store the emitter resolves node types through.
pub fn infer_types(tree: &Node) -> Result<VarStore, NodeError> {
    let mut vars = VarStore::new();
    let env = default_type_env();
    for pass in 0..MAX_PASSES {
        let before = vars.bindings_len();
        infer_node(tree, &env, &mut vars, 0)?;
        let after = vars.bindings_len();
        debug!("inference pass {pass}: {} new substitutions", after - before);
        if after == before {
            return Ok(vars);
        }
    }
    Err(NodeError::new(
        tree,
        format!("type inference did not converge after {MAX_PASSES} passes"),
    ))
}

/// Types for the builtin procedures. List builtins traffic in `Any`, the
/// dynamic surface, until the universe grows a proper list type.
pub fn default_type_env() -> TypeEnv {
    let env = TypeEnv::new();
    let builtins = [
        ("+", Type::func(vec![Type::variadic(Type::Int)], Type::Int)),
        ("*", Type::func(vec![Type::variadic(Type::Int)], Type::Int)),
        (
            "-",
            Type::func(vec![Type::Int, Type::variadic(Type::Int)], Type::Int),
        ),
        (
            "=",
            Type::func(
                vec![Type::Int, Type::Int, Type::variadic(Type::Int)],
                Type::Bool,
            ),
        ),
        ("zero?", Type::func(vec![Type::Int], Type::Bool)),
        ("display", Type::func(vec![Type::Str], Type::Void)),
        ("list", Type::func(vec![Type::variadic(Type::Any)], Type::Any)),
        ("length", Type::func(vec![Type::Any], Type::Int)),
        ("reverse", Type::func(vec![Type::Any], Type::Any)),
        (
            "append",
            Type::func(vec![Type::Any, Type::variadic(Type::Any)], Type::Any),
        ),
        (
            "apply",
            Type::func(vec![Type::Any, Type::variadic(Type::Any)], Type::Any),
        ),
    ];
    for (name, t) in builtins {
        env.add_top_level(name.to_string(), t);
    }
    env
}

fn unify_node(node: &Node, t: &Type, vars: &mut VarStore) -> Result<(), NodeError> {
    let handle = node.type_handle(vars);
    vars.unify(&handle, t)
        .map_err(|err| NodeError::new(node, err.to_string()))
}

fn infer_node(
    node: &Node,
    env: &TypeEnv,
    vars: &mut VarStore,
    depth: usize,
) -> Result<(), NodeError> {
    trace!("infer: {:indent$}{node}", "", indent = depth);
    match node.kind() {
        Kind::Int(_) => unify_node(node, &Type::Int, vars),
        Kind::Bool(_) => unify_node(node, &Type::Bool, vars),
        Kind::Str(_) => unify_node(node, &Type::Str, vars),
        Kind::Symbol(_) => unify_node(node, &Type::Symbol, vars),
        Kind::Identifier(name) => match env.lookup(name) {
            Some(t) => unify_node(node, &t, vars),
            // Unresolved names stay open; a later pass may bind them.
            None => Ok(()),
        },
        Kind::Progn(progn) => {
            let len = progn.body.len();
            if len == 0 {
                return unify_node(node, &Type::Void, vars);
            }
            for (i, child) in progn.body.iter().enumerate() {
                infer_node(&child, env, vars, depth + 1)?;
                if i + 1 == len {
                    // The last child's type is the progn's type.
                    let t = node.type_handle(vars);
                    unify_node(&child, &t, vars)?;
                } else {
                    unify_node(&child, &Type::Void, vars)?;
                }
            }
            Ok(())
        }
        Kind::List(list) => {
            if list.is_empty() {
                return Err(NodeError::new(
                    node,
                    "cannot infer the type of an empty application",
                ));
            }
            for child in list.iter() {
                infer_node(&child, env, vars, depth + 1)?;
            }
            // The head must be a function from the argument types to the
            // type of the application itself.
            let head = list.first().expect("non-empty list");
            let args = list
                .rest()
                .iter()
                .map(|child| child.type_handle(vars))
                .collect();
            let wanted = Type::func(args, node.type_handle(vars));
            let head_type = head.type_handle(vars);
            vars.unify(&head_type, &wanted)
                .map_err(|err| NodeError::new(node, err.to_string()))
        }
        Kind::Lambda(lambda) => {
            let mut frame = HashMap::new();
            let mut arg_types = Vec::new();
            for param in lambda.params.iter() {
                let Kind::Identifier(name) = param.kind() else {
                    return Err(NodeError::new(
                        &param,
                        "lambda parameter is not an identifier",
                    ));
                };
                let t = param.type_handle(vars);
                frame.insert(name.clone(), t.clone());
                arg_types.push(t);
            }
            let inner = env.with_frame(frame);
            infer_node(&lambda.body, &inner, vars, depth + 1)?;
            let calculated = Type::func(arg_types, lambda.body.type_handle(vars));
            unify_node(node, &calculated, vars)
        }
        Kind::Let(let_node) => {
            let mut frame = HashMap::new();
            for (name, value) in &let_node.bindings {
                frame.insert(name.clone(), value.type_handle(vars));
                infer_node(value, env, vars, depth + 1)?;
            }
            let inner = env.with_frame(frame);
            infer_node(&let_node.body, &inner, vars, depth + 1)?;
            let t = let_node.body.type_handle(vars);
            unify_node(node, &t, vars)
        }
        Kind::If(if_node) => {
            infer_node(&if_node.cond, env, vars, depth + 1)?;
            infer_node(&if_node.then_branch, env, vars, depth + 1)?;
            infer_node(&if_node.else_branch, env, vars, depth + 1)?;
            unify_node(&if_node.cond, &Type::Bool, vars)?;
            let t = node.type_handle(vars);
            unify_node(&if_node.then_branch, &t, vars)?;
            unify_node(&if_node.else_branch, &t, vars)
        }
        Kind::Define(define) => {
            let t = define.value.type_handle(vars);
            env.add_top_level(define.name.clone(), t);
            infer_node(&define.value, env, vars, depth + 1)
        }
        Kind::Error(_) => Ok(()),
        // Open holes: better to warn than to infer something wrong.
        Kind::Quote(_) | Kind::Unquote(_) | Kind::Set(_) | Kind::Pair(_) => Err(NodeError::new(
            node,
            "form is not handled by type inference",
        )),
        Kind::Procedure(_) | Kind::Builtin(_) => Err(NodeError::new(
            node,
            "unexpected runtime value in type inference",
        )),
    }
}
