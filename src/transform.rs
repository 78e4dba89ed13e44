// ABOUTME: Rewrites raw lists into tagged special-form nodes and desugars define

use crate::error::NodeError;
use crate::list::List;
use crate::node::{Define, If, Kind, Lambda, Let, Node, Progn, Quote, Set, Unquote};
use crate::position::Position;

/// Rewrite the raw AST into tagged nodes. Only lists whose head is an
/// identifier naming a special form are rewritten; everything else is an
/// application whose children are transformed recursively. Quote and
/// unquote markers from the parser are treated exactly like their
/// `(quote ...)` spellings.
pub fn transform(node: &Node) -> Result<Node, NodeError> {
    match node.kind() {
        Kind::List(list) => transform_list(node, list),
        Kind::Quote(q) => Ok(Node::new(
            Kind::Quote(Quote {
                arg: transform(&q.arg)?,
                quasi: q.quasi,
            }),
            node.pos().clone(),
        )),
        Kind::Unquote(u) => Ok(Node::new(
            Kind::Unquote(Unquote {
                arg: transform(&u.arg)?,
            }),
            node.pos().clone(),
        )),
        _ => Ok(node.clone()),
    }
}

fn transform_nodes(list: &List) -> Result<List, NodeError> {
    list.iter().map(|n| transform(&n)).collect()
}

fn transform_list(node: &Node, list: &List) -> Result<Node, NodeError> {
    let head = match list.first() {
        Some(head) => head,
        None => return Ok(node.clone()),
    };
    if let Kind::Identifier(name) = head.kind() {
        match name.as_str() {
            "define" => return transform_define(node, list),
            "let" | "letrec" => return transform_let(node, list),
            "progn" => return transform_progn(node, list),
            "lambda" => return transform_lambda(node, list),
            "if" => return transform_if(node, list),
            "set!" => return transform_set(node, list),
            "quote" => return transform_quote(node, list, false),
            "quasiquote" => return transform_quote(node, list, true),
            "unquote" => return transform_unquote(node, list),
            "error" => return transform_error(node, list),
            _ => {}
        }
    }
    Ok(Node::new(
        Kind::List(transform_nodes(list)?),
        node.pos().clone(),
    ))
}

/// Wrap a transformed body sequence in an implicit progn.
fn make_progn(body: Vec<Node>, pos: Position) -> Node {
    Node::new(
        Kind::Progn(Progn {
            body: body.into_iter().collect(),
        }),
        pos,
    )
}

fn transform_body(node: &Node, list: &List, skip: usize) -> Result<Node, NodeError> {
    let body = list
        .iter()
        .skip(skip)
        .map(|n| transform(&n))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(make_progn(body, node.pos().clone()))
}

fn transform_progn(node: &Node, list: &List) -> Result<Node, NodeError> {
    let body = transform_nodes(&list.rest())?;
    Ok(Node::new(Kind::Progn(Progn { body }), node.pos().clone()))
}

fn transform_define(node: &Node, list: &List) -> Result<Node, NodeError> {
    if list.len() < 3 {
        return Err(NodeError::new(
            node,
            "bad define expression, missing name or value",
        ));
    }
    let target = list.nth(1).expect("define has a second element");
    match target.kind() {
        Kind::Identifier(name) => {
            let value = if list.len() == 3 {
                transform(&list.nth(2).expect("define has a third element"))?
            } else {
                transform_body(node, list, 2)?
            };
            Ok(Node::new(
                Kind::Define(Define {
                    name: name.clone(),
                    value,
                    form: list.clone(),
                }),
                node.pos().clone(),
            ))
        }
        // (define (f a ...) body ...) desugars to
        // (define f (lambda (a ...) body ...)).
        Kind::List(signature) => {
            let fname = match signature.first() {
                Some(first) => match first.kind() {
                    Kind::Identifier(name) => name.clone(),
                    _ => {
                        return Err(NodeError::new(
                            node,
                            "bad define expression, function name must be an identifier",
                        ))
                    }
                },
                None => {
                    return Err(NodeError::new(
                        node,
                        "bad define expression, empty function signature",
                    ))
                }
            };
            let params = Node::new(
                Kind::List(signature.rest()),
                target.pos().clone(),
            );
            let mut lambda_items = vec![
                Node::new(
                    Kind::Identifier("lambda".to_string()),
                    target.pos().clone(),
                ),
                params,
            ];
            lambda_items.extend(list.iter().skip(2));
            let lambda_list = Node::new(
                Kind::List(lambda_items.into_iter().collect()),
                node.pos().clone(),
            );
            let value = transform(&lambda_list)?;
            Ok(Node::new(
                Kind::Define(Define {
                    name: fname,
                    value,
                    form: list.clone(),
                }),
                node.pos().clone(),
            ))
        }
        _ => Err(NodeError::new(
            node,
            "bad define expression, name must be an identifier",
        )),
    }
}

fn transform_let(node: &Node, list: &List) -> Result<Node, NodeError> {
    if list.len() < 3 {
        return Err(NodeError::new(
            node,
            "bad let expression, missing bindings or body",
        ));
    }
    let bindings_node = list.nth(1).expect("let has a second element");
    let Kind::List(binding_list) = bindings_node.kind() else {
        return Err(NodeError::new(
            node,
            "bad let expression, bindings must be a list",
        ));
    };

    let mut bindings: Vec<(String, Node)> = Vec::new();
    for pair in binding_list.iter() {
        let Kind::List(pair_list) = pair.kind() else {
            return Err(NodeError::new(
                node,
                "bad let expression, bindings must be pairs",
            ));
        };
        if pair_list.len() != 2 {
            return Err(NodeError::new(
                node,
                "bad let expression, bindings must be pairs",
            ));
        }
        let key = pair_list.first().expect("binding pair has a key");
        let Kind::Identifier(name) = key.kind() else {
            return Err(NodeError::new(
                node,
                "bad let expression, binding name must be an identifier",
            ));
        };
        let value = transform(&pair_list.nth(1).expect("binding pair has a value"))?;
        match bindings.iter_mut().find(|(k, _)| k == name) {
            // Duplicate keys: last value wins, first position is kept.
            Some(existing) => existing.1 = value,
            None => bindings.push((name.clone(), value)),
        }
    }

    let body = transform_body(node, list, 2)?;
    Ok(Node::new(
        Kind::Let(Let {
            bindings,
            body,
            form: list.clone(),
        }),
        node.pos().clone(),
    ))
}

fn transform_lambda(node: &Node, list: &List) -> Result<Node, NodeError> {
    if list.len() < 3 {
        return Err(NodeError::new(
            node,
            "bad lambda expression, missing args or body",
        ));
    }
    let args = list.nth(1).expect("lambda has a second element");
    let Kind::List(params) = args.kind() else {
        return Err(NodeError::new(
            node,
            "bad lambda expression, args must be a list",
        ));
    };
    for param in params.iter() {
        if !matches!(param.kind(), Kind::Identifier(_)) {
            return Err(NodeError::new(
                node,
                "bad lambda expression, every parameter must be an identifier",
            ));
        }
    }
    let body = transform_body(node, list, 2)?;
    Ok(Node::new(
        Kind::Lambda(Lambda {
            params: params.clone(),
            body,
            form: list.clone(),
        }),
        node.pos().clone(),
    ))
}

fn transform_if(node: &Node, list: &List) -> Result<Node, NodeError> {
    if list.len() != 4 {
        return Err(NodeError::new(
            node,
            "bad if expression, expected a condition and two branches",
        ));
    }
    Ok(Node::new(
        Kind::If(If {
            cond: transform(&list.nth(1).expect("if has a condition"))?,
            then_branch: transform(&list.nth(2).expect("if has a then branch"))?,
            else_branch: transform(&list.nth(3).expect("if has an else branch"))?,
            form: list.clone(),
        }),
        node.pos().clone(),
    ))
}

fn transform_set(node: &Node, list: &List) -> Result<Node, NodeError> {
    if list.len() != 3 {
        return Err(NodeError::new(
            node,
            "bad set! expression, expected a name and a value",
        ));
    }
    let target = list.nth(1).expect("set! has a target");
    let Kind::Identifier(name) = target.kind() else {
        return Err(NodeError::new(
            node,
            "bad set! expression, target must be an identifier",
        ));
    };
    Ok(Node::new(
        Kind::Set(Set {
            name: name.clone(),
            value: transform(&list.nth(2).expect("set! has a value"))?,
            form: list.clone(),
        }),
        node.pos().clone(),
    ))
}

fn transform_quote(node: &Node, list: &List, quasi: bool) -> Result<Node, NodeError> {
    if list.len() != 2 {
        let which = if quasi { "quasiquote" } else { "quote" };
        return Err(NodeError::new(
            node,
            format!("bad {which} expression, expected exactly one argument"),
        ));
    }
    Ok(Node::new(
        Kind::Quote(Quote {
            arg: transform(&list.nth(1).expect("quote has an argument"))?,
            quasi,
        }),
        node.pos().clone(),
    ))
}

fn transform_unquote(node: &Node, list: &List) -> Result<Node, NodeError> {
    if list.len() != 2 {
        return Err(NodeError::new(
            node,
            "bad unquote expression, expected exactly one argument",
        ));
    }
    Ok(Node::new(
        Kind::Unquote(Unquote {
            arg: transform(&list.nth(1).expect("unquote has an argument"))?,
        }),
        node.pos().clone(),
    ))
}

fn transform_error(node: &Node, list: &List) -> Result<Node, NodeError> {
    if list.len() != 2 {
        return Err(NodeError::new(
            node,
            "bad error expression, expected exactly one string argument",
        ));
    }
    let arg = list.nth(1).expect("error has an argument");
    let Kind::Str(message) = arg.kind() else {
        return Err(NodeError::new(
            node,
            "bad error expression, argument must be a string",
        ));
    };
    Ok(Node::new(
        Kind::Error(NodeError {
            message: message.clone(),
            position: node.pos().clone(),
            context: node.to_string(),
        }),
        node.pos().clone(),
    ))
}
