//! Tokenizer for the expression language

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    LParen,
    RParen,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleStar,
    Tilde,
    Equals,
    /// `;` or newline
    StatementEnd,
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

pub(crate) fn lex(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    macro_rules! push {
        ($kind:expr) => {
            tokens.push(Token {
                kind: $kind,
                line,
                col,
            })
        };
    }

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' => {
                i += 1;
                col += 1;
            }
            '\n' => {
                push!(TokenKind::StatementEnd);
                i += 1;
                line += 1;
                col = 1;
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ';' => {
                push!(TokenKind::StatementEnd);
                i += 1;
                col += 1;
            }
            '(' => {
                push!(TokenKind::LParen);
                i += 1;
                col += 1;
            }
            ')' => {
                push!(TokenKind::RParen);
                i += 1;
                col += 1;
            }
            ',' => {
                push!(TokenKind::Comma);
                i += 1;
                col += 1;
            }
            '+' => {
                push!(TokenKind::Plus);
                i += 1;
                col += 1;
            }
            '-' => {
                push!(TokenKind::Minus);
                i += 1;
                col += 1;
            }
            '/' => {
                push!(TokenKind::Slash);
                i += 1;
                col += 1;
            }
            '~' => {
                push!(TokenKind::Tilde);
                i += 1;
                col += 1;
            }
            '=' => {
                push!(TokenKind::Equals);
                i += 1;
                col += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    push!(TokenKind::DoubleStar);
                    i += 2;
                    col += 2;
                } else {
                    push!(TokenKind::Star);
                    i += 1;
                    col += 1;
                }
            }
            '.' => {
                // a dot starting a number literal like `.5`
                if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                    let (tok, consumed) = lex_number(&chars[i..], line, col)?;
                    tokens.push(tok);
                    i += consumed;
                    col += consumed;
                } else {
                    push!(TokenKind::Dot);
                    i += 1;
                    col += 1;
                }
            }
            '"' | '\'' => {
                let quote = c;
                let start_col = col;
                let mut value = String::new();
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None | Some('\n') => {
                            return Err(ExprError::Syntax {
                                line,
                                col: start_col,
                                message: "unterminated string".into(),
                            });
                        }
                        Some('\\') => {
                            match chars.get(j + 1) {
                                Some(&e) if e == quote || e == '\\' => value.push(e),
                                Some(&other) => {
                                    value.push('\\');
                                    value.push(other);
                                }
                                None => {
                                    return Err(ExprError::Syntax {
                                        line,
                                        col: start_col,
                                        message: "unterminated string".into(),
                                    });
                                }
                            }
                            j += 2;
                        }
                        Some(&e) if e == quote => {
                            j += 1;
                            break;
                        }
                        Some(&e) => {
                            value.push(e);
                            j += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    line,
                    col: start_col,
                });
                col += j - i;
                i = j;
            }
            _ if c.is_ascii_digit() => {
                let (tok, consumed) = lex_number(&chars[i..], line, col)?;
                tokens.push(tok);
                i += consumed;
                col += consumed;
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(name),
                    line,
                    col,
                });
                col += i - start;
            }
            _ => {
                return Err(ExprError::Syntax {
                    line,
                    col,
                    message: format!("unexpected character '{}'", c),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        col,
    });
    Ok(tokens)
}

fn lex_number(chars: &[char], line: usize, col: usize) -> Result<(Token, usize), ExprError> {
    let mut j = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while j < chars.len() {
        let c = chars[j];
        if c.is_ascii_digit() {
            j += 1;
        } else if c == '.' && !seen_dot && !seen_exp {
            // a trailing dot followed by an identifier is a method
            // call on an integer literal; leave the dot alone then
            if chars.get(j + 1).is_some_and(|n| n.is_ascii_alphabetic()) {
                break;
            }
            seen_dot = true;
            j += 1;
        } else if (c == 'e' || c == 'E') && !seen_exp && j > 0 {
            seen_exp = true;
            j += 1;
            if chars.get(j) == Some(&'+') || chars.get(j) == Some(&'-') {
                j += 1;
            }
        } else {
            break;
        }
    }

    let text: String = chars[..j].iter().collect();
    let value: f64 = text.parse().map_err(|_| ExprError::Syntax {
        line,
        col,
        message: format!("bad number literal '{}'", text),
    })?;
    Ok((
        Token {
            kind: TokenKind::Number(value),
            line,
            col,
        },
        j,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        lex(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_call_chain() {
        let toks = kinds("nws(\"amp*\").s(2,1).db()");
        assert_eq!(toks[0], TokenKind::Ident("nws".into()));
        assert_eq!(toks[1], TokenKind::LParen);
        assert_eq!(toks[2], TokenKind::Str("amp*".into()));
        assert!(toks.contains(&TokenKind::Dot));
        assert_eq!(*toks.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(kinds("1.5e9")[0], TokenKind::Number(1.5e9));
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
        assert_eq!(kinds("2e-3")[0], TokenKind::Number(2e-3));
    }

    #[test]
    fn test_lex_operators() {
        let toks = kinds("a ** b * c ~d");
        assert!(toks.contains(&TokenKind::DoubleStar));
        assert!(toks.contains(&TokenKind::Star));
        assert!(toks.contains(&TokenKind::Tilde));
    }

    #[test]
    fn test_comments_and_statements() {
        let toks = kinds("a # comment\nb; c");
        let idents: Vec<_> = toks
            .iter()
            .filter(|t| matches!(t, TokenKind::Ident(_)))
            .collect();
        assert_eq!(idents.len(), 3);
        let seps = toks
            .iter()
            .filter(|t| matches!(t, TokenKind::StatementEnd))
            .count();
        assert_eq!(seps, 2);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(lex("\"abc").is_err());
    }
}
