// ABOUTME: Recursive-descent parser that pulls lexer tokens into an untyped AST

use std::sync::mpsc::Receiver;

use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};
use crate::node::{Kind, Node, Quote, Unquote};
use crate::position::Position;

/// Consumes the lexer's token stream with one token of lookahead. When the
/// parser bails out early the receiver is dropped, which cancels the lexer.
pub struct Parser {
    tokens: Receiver<Token>,
    peeked: Option<Token>,
    exhausted: bool,
    file: String,
    last_pos: Position,
}

impl Parser {
    pub fn new(file: impl Into<String>, tokens: Receiver<Token>) -> Self {
        let file = file.into();
        let last_pos = Position::start(&file);
        Parser {
            tokens,
            peeked: None,
            exhausted: false,
            file,
            last_pos,
        }
    }

    /// Parse a whole program: zero or more top-level forms wrapped in an
    /// implicit `(progn ...)`.
    pub fn parse_program(&mut self) -> Result<Node, ParseError> {
        let pos = Position::start(&self.file);
        let mut forms = vec![Node::new(
            Kind::Identifier("progn".to_string()),
            pos.clone(),
        )];
        while self.peek_token().is_some() {
            forms.push(self.parse_sexp()?);
        }
        Ok(Node::new(Kind::List(forms.into_iter().collect()), pos))
    }

    fn peek_token(&mut self) -> Option<&Token> {
        if self.peeked.is_none() && !self.exhausted {
            match self.tokens.recv() {
                Ok(token) => self.peeked = Some(token),
                Err(_) => self.exhausted = true,
            }
        }
        self.peeked.as_ref()
    }

    fn next_token(&mut self) -> Option<Token> {
        self.peek_token();
        let token = self.peeked.take();
        if let Some(token) = &token {
            self.last_pos = token.pos.clone();
        }
        token
    }

    fn eof_error(&self) -> ParseError {
        ParseError::UnexpectedEof {
            pos: self.last_pos.clone(),
        }
    }

    fn parse_sexp(&mut self) -> Result<Node, ParseError> {
        let token = self.next_token().ok_or_else(|| self.eof_error())?;
        match token.kind {
            TokenKind::Quote => {
                let arg = self.parse_sexp()?;
                Ok(Node::new(Kind::Quote(Quote { arg, quasi: false }), token.pos))
            }
            TokenKind::BackQuote => {
                let arg = self.parse_sexp()?;
                Ok(Node::new(Kind::Quote(Quote { arg, quasi: true }), token.pos))
            }
            TokenKind::Comma => {
                let arg = self.parse_sexp()?;
                Ok(Node::new(Kind::Unquote(Unquote { arg }), token.pos))
            }
            TokenKind::LParen => self.parse_list(token),
            TokenKind::RParen => Err(ParseError::UnexpectedToken {
                lexeme: token.lexeme,
                pos: token.pos,
            }),
            _ => self.parse_atom(token),
        }
    }

    fn parse_list(&mut self, open: Token) -> Result<Node, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek_token() {
                None => return Err(self.eof_error()),
                Some(token) if token.kind == TokenKind::RParen => {
                    self.next_token();
                    return Ok(Node::new(
                        Kind::List(items.into_iter().collect()),
                        open.pos,
                    ));
                }
                Some(_) => items.push(self.parse_sexp()?),
            }
        }
    }

    fn parse_atom(&mut self, token: Token) -> Result<Node, ParseError> {
        match token.kind {
            TokenKind::Int => match token.lexeme.parse::<i64>() {
                Ok(value) => Ok(Node::new(Kind::Int(value), token.pos)),
                // A sign with no digits is an identifier, not a number.
                Err(_) if token.lexeme == "+" || token.lexeme == "-" => {
                    Ok(Node::new(Kind::Identifier(token.lexeme), token.pos))
                }
                Err(_) => Err(ParseError::BadInteger {
                    lexeme: token.lexeme,
                    pos: token.pos,
                }),
            },
            TokenKind::Bool => match token.lexeme.as_str() {
                "#t" => Ok(Node::new(Kind::Bool(true), token.pos)),
                "#f" => Ok(Node::new(Kind::Bool(false), token.pos)),
                _ => Err(ParseError::MalformedBool {
                    lexeme: token.lexeme,
                    pos: token.pos,
                }),
            },
            TokenKind::Str => match unescape::unescape(&token.lexeme) {
                Some(decoded) => Ok(Node::new(Kind::Str(decoded), token.pos)),
                None => Err(ParseError::BadEscape {
                    lexeme: token.lexeme,
                    pos: token.pos,
                }),
            },
            TokenKind::Identifier => Ok(Node::new(Kind::Identifier(token.lexeme), token.pos)),
            TokenKind::Symbol => Ok(Node::new(Kind::Symbol(token.lexeme), token.pos)),
            TokenKind::LParen
            | TokenKind::RParen
            | TokenKind::Quote
            | TokenKind::BackQuote
            | TokenKind::Comma => {
                unreachable!("delimiter tokens are handled before parse_atom")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Result<Node, Error> {
        let (tokens, lexer) = Lexer::spawn("<test>", source);
        let mut parser = Parser::new("<test>", tokens);
        let parsed = parser.parse_program();
        drop(parser);
        lexer.join().expect("lexer thread panicked")?;
        Ok(parsed?)
    }

    fn printed(source: &str) -> String {
        parse(source).expect("parse should succeed").to_string()
    }

    #[test]
    fn test_parse_atoms() {
        assert_eq!(printed("1"), "(progn 1)");
        assert_eq!(printed("-1"), "(progn -1)");
        assert_eq!(printed("#t"), "(progn #t)");
        assert_eq!(printed("foo"), "(progn foo)");
        assert_eq!(printed("\"hi\""), "(progn hi)");
    }

    #[test]
    fn test_bare_sign_is_an_identifier() {
        let program = parse("+").expect("parse should succeed");
        let Kind::List(forms) = program.kind() else {
            panic!("program should be a list");
        };
        let form = forms.nth(1).expect("one top-level form");
        assert!(matches!(form.kind(), Kind::Identifier(name) if name == "+"));
    }

    #[test]
    fn test_parse_nested_lists() {
        assert_eq!(printed("(+ 1 (+ 2 3))"), "(progn (+ 1 (+ 2 3)))");
        assert_eq!(printed("()"), "(progn ())");
    }

    #[test]
    fn test_parse_multiple_top_level_forms() {
        assert_eq!(printed("1 2 3"), "(progn 1 2 3)");
    }

    #[test]
    fn test_parse_quote_sugar() {
        assert_eq!(printed("'x"), "(progn 'x)");
        assert_eq!(printed("`(a ,b)"), "(progn `(a ,b))");
    }

    #[test]
    fn test_string_escapes_decode() {
        let program = parse(r#""a\nb""#).expect("parse should succeed");
        let Kind::List(forms) = program.kind() else {
            panic!("program should be a list");
        };
        let form = forms.nth(1).expect("one top-level form");
        assert!(matches!(form.kind(), Kind::Str(s) if s == "a\nb"));
    }

    #[test]
    fn test_unmatched_close_paren() {
        assert!(matches!(
            parse(")"),
            Err(Error::Parse(ParseError::UnexpectedToken { .. }))
        ));
    }

    #[test]
    fn test_eof_inside_list() {
        assert!(matches!(
            parse("(1 2"),
            Err(Error::Parse(ParseError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_malformed_bool() {
        assert!(matches!(
            parse("#x"),
            Err(Error::Parse(ParseError::MalformedBool { .. }))
        ));
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(matches!(
            parse("99999999999999999999"),
            Err(Error::Parse(ParseError::BadInteger { .. }))
        ));
    }

    #[test]
    fn test_print_parse_roundtrip_is_stable() {
        fn form_printed(source: &str) -> String {
            let program = parse(source).expect("parse should succeed");
            let Kind::List(forms) = program.kind() else {
                panic!("program should be a list");
            };
            forms.nth(1).expect("one top-level form").to_string()
        }

        let sources = [
            "(define (f x) (+ 1 x))",
            "`(+ ,(+ 2 3) 4)",
            "(let ((x 1)) x)",
            "'(1 2 (3 4))",
        ];
        for source in sources {
            let once = form_printed(source);
            let twice = form_printed(&once);
            assert_eq!(once, twice, "printer fixed point for {source}");
        }
    }
}
