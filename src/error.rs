// ABOUTME: Error types for every pipeline stage, all tagged with source positions

use crate::node::Node;
use crate::position::Position;
use thiserror::Error;

/// Failures raised while tokenizing. These surface through the lexer
/// thread's join handle after the token stream has closed.
#[derive(Error, Debug, Clone)]
pub enum LexError {
    #[error("unrecognised character {ch:?}: {pos}")]
    UnknownChar { ch: char, pos: Position },

    #[error("unterminated string literal: {pos}")]
    UnterminatedString { pos: Position },
}

/// Failures raised while building the untyped AST from tokens.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("unexpected end of input: {pos}")]
    UnexpectedEof { pos: Position },

    #[error("unexpected token [{lexeme}]: {pos}")]
    UnexpectedToken { lexeme: String, pos: Position },

    #[error("malformed boolean literal [{lexeme}]: {pos}")]
    MalformedBool { lexeme: String, pos: Position },

    #[error("integer out of range [{lexeme}]: {pos}")]
    BadInteger { lexeme: String, pos: Position },

    #[error("invalid string escape [{lexeme}]: {pos}")]
    BadEscape { lexeme: String, pos: Position },
}

/// An error raised against a specific node. Transformation, evaluation and
/// type inference all report through this shape so diagnostics read
/// uniformly: `<message>: <file> line <L>:<C> [<offending form>]`.
#[derive(Error, Debug, Clone)]
#[error("{message}: {position} [{context}]")]
pub struct NodeError {
    pub message: String,
    pub position: Position,
    pub context: String,
}

impl NodeError {
    pub fn new(node: &Node, message: impl Into<String>) -> Self {
        NodeError {
            message: message.into(),
            position: node.pos().clone(),
            context: node.to_string(),
        }
    }
}

/// Any failure the pipeline can produce, tagged by stage.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transform(NodeError),

    #[error(transparent)]
    Eval(NodeError),

    #[error(transparent)]
    Infer(NodeError),
}
