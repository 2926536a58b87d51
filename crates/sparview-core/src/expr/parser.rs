//! Recursive-descent parser for the method-chain grammar
//!
//! ```text
//! program  := stmt (SEP stmt)*
//! stmt     := expr
//! expr     := term (('+' | '-') term)*
//! term     := power (('*' | '/') power)*
//! power    := unary ('**' power)?          (right associative)
//! unary    := ('-' | '~') unary | postfix
//! postfix  := primary ('.' ident '(' args ')')*
//! primary  := number | string | ident | ident '(' args ')' | '(' expr ')'
//! args     := (arg (',' arg)*)? ; arg := (ident '=')? expr
//! ```

use super::lexer::{lex, Token, TokenKind};
use super::ExprError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Invert,
}

#[derive(Debug, Clone)]
pub(crate) struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Number(f64),
    Str(String),
    Ident(String),
    Call {
        name: String,
        args: Vec<Arg>,
    },
    Method {
        recv: Box<Expr>,
        name: String,
        args: Vec<Arg>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// One parsed statement with its source line for error reporting.
#[derive(Debug, Clone)]
pub(crate) struct Statement {
    pub expr: Expr,
    pub line: usize,
}

pub(crate) fn parse(text: &str) -> Result<Vec<Statement>, ExprError> {
    let tokens = lex(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        let tok = self.peek();
        ExprError::Syntax {
            line: tok.line,
            col: tok.col,
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ExprError> {
        if &self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek().kind, TokenKind::StatementEnd) {
            self.advance();
        }
    }

    fn program(&mut self) -> Result<Vec<Statement>, ExprError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek().kind, TokenKind::Eof) {
                break;
            }
            let line = self.peek().line;
            let expr = self.expr()?;
            statements.push(Statement { expr, line });

            match self.peek().kind {
                TokenKind::StatementEnd => continue,
                TokenKind::Eof => break,
                _ => return Err(self.error("expected end of statement")),
            }
        }
        Ok(statements)
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.power()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.power()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.unary()?;
        if matches!(self.peek().kind, TokenKind::DoubleStar) {
            self.advance();
            let rhs = self.power()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Tilde => Some(UnaryOp::Invert),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        while matches!(self.peek().kind, TokenKind::Dot) {
            self.advance();
            let name = match &self.peek().kind {
                TokenKind::Ident(name) => name.clone(),
                _ => return Err(self.error("expected method name after '.'")),
            };
            self.advance();
            self.expect(&TokenKind::LParen, "'(' after method name")?;
            let args = self.args()?;
            expr = Expr::Method {
                recv: Box::new(expr),
                name,
                args,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek().kind.clone() {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::Number(value))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::Str(value))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if matches!(self.peek().kind, TokenKind::LParen) {
                    self.advance();
                    let args = self.args()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    /// Argument list; the opening paren is already consumed.
    fn args(&mut self) -> Result<Vec<Arg>, ExprError> {
        let mut args = Vec::new();
        if matches!(self.peek().kind, TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            // a named argument is `ident '=' expr`
            let name = if let TokenKind::Ident(name) = self.peek().kind.clone() {
                if matches!(self.tokens[self.pos + 1].kind, TokenKind::Equals) {
                    self.advance();
                    self.advance();
                    Some(name)
                } else {
                    None
                }
            } else {
                None
            };
            let value = self.expr()?;
            args.push(Arg { name, value });

            match self.peek().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.error("expected ',' or ')' in argument list")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_chain() {
        let stmts = parse("nws(\"amp*\").s(2,1).db().plot()").unwrap();
        assert_eq!(stmts.len(), 1);
        let Expr::Method { name, .. } = &stmts[0].expr else {
            panic!("expected a method call at the top");
        };
        assert_eq!(name, "plot");
    }

    #[test]
    fn test_parse_precedence() {
        // a + b * c parses the product first
        let stmts = parse("1 + 2 * 3").unwrap();
        let Expr::Binary { op, rhs, .. } = &stmts[0].expr else {
            panic!();
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            **rhs,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_power_right_assoc() {
        let stmts = parse("a ** b ** c").unwrap();
        let Expr::Binary { op, rhs, .. } = &stmts[0].expr else {
            panic!();
        };
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(
            **rhs,
            Expr::Binary {
                op: BinaryOp::Pow,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_named_args() {
        let stmts = parse("tline(delay=1e-9)").unwrap();
        let Expr::Call { name, args } = &stmts[0].expr else {
            panic!();
        };
        assert_eq!(name, "tline");
        assert_eq!(args[0].name.as_deref(), Some("delay"));
    }

    #[test]
    fn test_parse_multiple_statements() {
        let stmts = parse("a()\nb(); c()\n\n").unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[1].line, 2);
    }

    #[test]
    fn test_parse_unary() {
        let stmts = parse("~nws()").unwrap();
        assert!(matches!(
            stmts[0].expr,
            Expr::Unary {
                op: UnaryOp::Invert,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("nws(").is_err());
        assert!(parse("a..b()").is_err());
        assert!(parse("a b").is_err());
    }
}
