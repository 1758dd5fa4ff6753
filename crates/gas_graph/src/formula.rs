//! Formula evaluation for magnitude fields
//!
//! Grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | atom
//! atom   := number | ident | '(' expr ')'
//! ```

use crate::error::FormulaError;

/// Evaluate `expr`, resolving identifiers through `lookup`
pub fn evaluate<F>(expr: &str, lookup: F) -> Result<f32, FormulaError>
where
    F: Fn(&str) -> Option<f32>,
{
    let mut parser = Parser {
        chars: expr.char_indices().collect(),
        pos: 0,
        lookup: &lookup,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(value),
        Some((idx, ch)) => Err(FormulaError::UnexpectedChar(ch, idx)),
    }
}

/// Evaluate a formula that may only reference `level`/`lv`
pub fn evaluate_with_level(expr: &str, level: f32) -> Result<f32, FormulaError> {
    evaluate(expr, |name| match name {
        "level" | "lv" | "Level" | "LV" => Some(level),
        _ => None,
    })
}

/// Evaluate a constant formula, falling back to `default` on any error
pub fn evaluate_simple(expr: &str, default: f32) -> f32 {
    if expr.trim().is_empty() {
        return default;
    }
    match evaluate(expr, |_| None) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Formula '{}' failed ({}), using {}", expr, e, default);
            default
        }
    }
}

struct Parser<'a> {
    chars: Vec<(usize, char)>,
    pos: usize,
    lookup: &'a dyn Fn(&str) -> Option<f32>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> Result<f32, FormulaError> {
        let mut value = self.term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some((_, '+')) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some((_, '-')) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f32, FormulaError> {
        let mut value = self.unary()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some((_, '*')) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some((_, '/')) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f32, FormulaError> {
        self.skip_ws();
        if let Some((_, '-')) = self.peek() {
            self.pos += 1;
            return Ok(-self.unary()?);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<f32, FormulaError> {
        self.skip_ws();
        let (idx, ch) = self.peek().ok_or(FormulaError::UnexpectedEnd)?;
        if ch == '(' {
            self.pos += 1;
            let value = self.expr()?;
            self.skip_ws();
            return match self.peek() {
                Some((_, ')')) => {
                    self.pos += 1;
                    Ok(value)
                }
                Some((i, c)) => Err(FormulaError::UnexpectedChar(c, i)),
                None => Err(FormulaError::UnexpectedEnd),
            };
        }
        if ch.is_ascii_digit() || ch == '.' {
            let text = self.take_while(|c| c.is_ascii_digit() || c == '.');
            return text
                .parse::<f32>()
                .map_err(|_| FormulaError::InvalidNumber(text));
        }
        if ch.is_alphabetic() || ch == '_' {
            let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
            return (self.lookup)(&name).ok_or(FormulaError::UnknownVariable(name));
        }
        Err(FormulaError::UnexpectedChar(ch, idx))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some((_, c)) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_and_parens() {
        assert_eq!(evaluate("1 + 2 * 3", |_| None), Ok(7.0));
        assert_eq!(evaluate("(1 + 2) * 3", |_| None), Ok(9.0));
        assert_eq!(evaluate("-4 + 10 / 2", |_| None), Ok(1.0));
        assert_eq!(evaluate("  2.5 ", |_| None), Ok(2.5));
    }

    #[test]
    fn test_level_variable() {
        assert_eq!(evaluate_with_level("10 + level * 5", 3.0), Ok(25.0));
        assert_eq!(evaluate_with_level("lv * 2", 4.0), Ok(8.0));
        assert_eq!(
            evaluate_with_level("power * 2", 1.0),
            Err(FormulaError::UnknownVariable("power".into()))
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate("1 / 0", |_| None), Err(FormulaError::DivisionByZero));
        assert_eq!(evaluate("(1 + 2", |_| None), Err(FormulaError::UnexpectedEnd));
        assert_eq!(evaluate("1 + 2)", |_| None), Err(FormulaError::UnexpectedChar(')', 5)));
        assert!(matches!(evaluate("1..2", |_| None), Err(FormulaError::InvalidNumber(_))));
    }

    #[test]
    fn test_evaluate_simple_falls_back() {
        assert_eq!(evaluate_simple("30", 1.0), 30.0);
        assert_eq!(evaluate_simple("", 10.0), 10.0);
        assert_eq!(evaluate_simple("oops", 10.0), 10.0);
    }
}
