// ABOUTME: The polymorphic AST/value node shared by every pipeline stage

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::env::Environment;
use crate::error::NodeError;
use crate::eval::Evaluator;
use crate::list::{List, Pair};
use crate::position::Position;
use crate::types::{Type, VarStore};

/// A single AST node or runtime value. Every variant shares one shell
/// carrying the source position and the lazily acquired type handle, so
/// evaluator, transformer and inferencer all dispatch on the same type.
/// Nodes are immutable once built; cloning shares the allocation.
#[derive(Debug, Clone)]
pub struct Node(Rc<Inner>);

#[derive(Debug)]
struct Inner {
    kind: Kind,
    pos: Position,
    // Assigned by the inferencer on the compile path; inert when interpreting.
    ty: RefCell<Option<Type>>,
}

#[derive(Debug, Clone)]
pub enum Kind {
    Int(i64),
    Bool(bool),
    Str(String),
    Symbol(String),
    Identifier(String),
    Pair(Pair),
    List(List),
    Lambda(Lambda),
    Procedure(Procedure),
    Builtin(Builtin),
    Quote(Quote),
    Unquote(Unquote),
    If(If),
    Set(Set),
    Let(Let),
    Define(Define),
    Progn(Progn),
    Error(NodeError),
}

/// The syntactic form; closing over an environment makes it a `Procedure`.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: List,
    pub body: Node,
    /// The list this form was written as, kept for printing and for
    /// structure-preserving evaluation under quasiquote.
    pub form: List,
}

/// A lambda together with the environment captured at its creation.
/// Only the evaluator produces these.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub lambda: Lambda,
    pub env: Environment,
}

pub type BuiltinFn = fn(&mut Evaluator<'_>, &List) -> Result<Node, NodeError>;

#[derive(Debug, Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

#[derive(Debug, Clone)]
pub struct Quote {
    pub arg: Node,
    pub quasi: bool,
}

#[derive(Debug, Clone)]
pub struct Unquote {
    pub arg: Node,
}

#[derive(Debug, Clone)]
pub struct If {
    pub cond: Node,
    pub then_branch: Node,
    pub else_branch: Node,
    pub form: List,
}

#[derive(Debug, Clone)]
pub struct Set {
    pub name: String,
    pub value: Node,
    pub form: List,
}

#[derive(Debug, Clone)]
pub struct Let {
    /// Source order, duplicates already collapsed (last value wins).
    pub bindings: Vec<(String, Node)>,
    pub body: Node,
    pub form: List,
}

#[derive(Debug, Clone)]
pub struct Define {
    pub name: String,
    pub value: Node,
    pub form: List,
}

#[derive(Debug, Clone)]
pub struct Progn {
    pub body: List,
}

impl Node {
    pub fn new(kind: Kind, pos: Position) -> Node {
        Node(Rc::new(Inner {
            kind,
            pos,
            ty: RefCell::new(None),
        }))
    }

    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn pos(&self) -> &Position {
        &self.0.pos
    }

    /// The node's type variable, created on first use. Many nodes may end
    /// up sharing a representative through unification.
    pub fn type_handle(&self, vars: &mut VarStore) -> Type {
        let mut slot = self.0.ty.borrow_mut();
        slot.get_or_insert_with(|| vars.fresh()).clone()
    }

    /// The canonical empty list.
    pub fn nil() -> Node {
        Node::new(Kind::List(List::new()), Position::internal("<empty list>"))
    }

    pub fn is_nil(&self) -> bool {
        match self.kind() {
            Kind::List(list) => list.is_empty(),
            Kind::Pair(pair) => pair.is_nil(),
            _ => false,
        }
    }

    pub fn int(value: i64) -> Node {
        Node::new(Kind::Int(value), Position::internal("<builtin>"))
    }

    pub fn boolean(value: bool) -> Node {
        Node::new(Kind::Bool(value), Position::internal("<builtin>"))
    }

    pub fn builtin(name: &'static str, func: BuiltinFn) -> Node {
        Node::new(
            Kind::Builtin(Builtin { name, func }),
            Position::internal("<builtin>"),
        )
    }

    /// A cons of two values; the position follows the car.
    pub fn pair(car: Node, cdr: Node) -> Node {
        let pos = car.pos().clone();
        Node::new(Kind::Pair(Pair::new(car, cdr)), pos)
    }

    /// Wrap a raw pair (a link in a list chain) back into a node.
    pub(crate) fn from_pair(pair: Pair) -> Node {
        let pos = match &pair.car {
            Some(car) => car.pos().clone(),
            None => Position::internal("<empty list>"),
        };
        Node::new(Kind::Pair(pair), pos)
    }

    /// A list node positioned at its first element.
    pub fn from_list(list: List) -> Node {
        let pos = match list.first() {
            Some(first) => first.pos().clone(),
            None => Position::internal("<empty list>"),
        };
        Node::new(Kind::List(list), pos)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Kind::Int(v) => write!(f, "{}", v),
            Kind::Bool(true) => write!(f, "#t"),
            Kind::Bool(false) => write!(f, "#f"),
            Kind::Str(s) => write!(f, "{}", s),
            Kind::Symbol(name) | Kind::Identifier(name) => write!(f, "{}", name),
            Kind::Pair(pair) => match (&pair.car, &pair.cdr) {
                (Some(car), Some(cdr)) => write!(f, "({} . {})", car, cdr),
                _ => write!(f, "()"),
            },
            Kind::List(list) => write!(f, "{}", list),
            Kind::Lambda(l) => write!(f, "{}", l.form),
            Kind::Procedure(p) => write!(f, "{}", p.lambda.form),
            Kind::Builtin(b) => write!(f, "{}", b.name),
            Kind::Quote(q) if q.quasi => write!(f, "`{}", q.arg),
            Kind::Quote(q) => write!(f, "'{}", q.arg),
            Kind::Unquote(u) => write!(f, ",{}", u.arg),
            Kind::If(form) => write!(f, "{}", form.form),
            Kind::Set(form) => write!(f, "{}", form.form),
            Kind::Let(form) => write!(f, "{}", form.form),
            Kind::Define(form) => write!(f, "{}", form.form),
            Kind::Progn(p) => {
                write!(f, "(progn")?;
                for child in p.body.iter() {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
            Kind::Error(err) => write!(f, "{}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_display() {
        assert_eq!(format!("{}", Node::int(42)), "42");
        assert_eq!(format!("{}", Node::int(-7)), "-7");
    }

    #[test]
    fn test_bool_display() {
        assert_eq!(format!("{}", Node::boolean(true)), "#t");
        assert_eq!(format!("{}", Node::boolean(false)), "#f");
    }

    #[test]
    fn test_string_displays_decoded() {
        let s = Node::new(
            Kind::Str("say \"hi\"\n".to_string()),
            Position::internal("<test>"),
        );
        assert_eq!(format!("{}", s), "say \"hi\"\n");
    }

    #[test]
    fn test_nil_is_empty_list() {
        let nil = Node::nil();
        assert!(nil.is_nil());
        assert_eq!(format!("{}", nil), "()");
    }

    #[test]
    fn test_pair_display_is_dotted() {
        let p = Node::pair(Node::int(1), Node::int(2));
        assert_eq!(format!("{}", p), "(1 . 2)");
    }

    #[test]
    fn test_quote_display() {
        let arg = Node::int(1);
        let quoted = Node::new(
            Kind::Quote(Quote {
                arg: arg.clone(),
                quasi: false,
            }),
            Position::internal("<test>"),
        );
        let quasi = Node::new(
            Kind::Quote(Quote { arg, quasi: true }),
            Position::internal("<test>"),
        );
        assert_eq!(format!("{}", quoted), "'1");
        assert_eq!(format!("{}", quasi), "`1");
    }
}
