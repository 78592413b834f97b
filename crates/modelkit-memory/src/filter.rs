//! Filter expression language for the in-memory evaluator.
//!
//! ```text
//! expr    := and ("or" and)*
//! and     := term ("and" term)*
//! term    := "(" expr ")" | ident op literal
//! op      := "=" | "!=" | "<" | "<=" | ">" | ">="
//! literal := 'text' | "text" | number | true | false | null
//! ```
//!
//! Keywords are case-insensitive. `= null` and `!= null` test for NULL.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use modelkit_core::{Error, Record, Result, Value};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*(?:(?P<paren>[()])|(?P<op><=|>=|!=|=|<|>)|'(?P<single>(?:[^'\\]|\\.)*)'|"(?P<double>(?:[^"\\]|\\.)*)"|(?P<num>-?\d+(?:\.\d+)?)|(?P<word>[A-Za-z_][A-Za-z0-9_]*))"#,
    )
    .unwrap_or_else(|e| panic!("filter token pattern: {e}"))
});

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn test(self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Eq if right.is_null() => left.is_null(),
            Self::Ne if right.is_null() => !left.is_null(),
            Self::Eq => left.matches(right),
            Self::Ne => !left.is_null() && !left.matches(right),
            Self::Lt => left.compare(right) == Some(Ordering::Less),
            Self::Le => matches!(left.compare(right), Some(Ordering::Less | Ordering::Equal)),
            Self::Gt => left.compare(right) == Some(Ordering::Greater),
            Self::Ge => matches!(
                left.compare(right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
}

impl Filter {
    /// Parse an expression.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let filter = parser.or_expr()?;
        match parser.peek() {
            None => Ok(filter),
            Some(tok) => Err(invalid(format!("unexpected {tok} after expression"))),
        }
    }

    /// Every field name the expression refers to.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare { field, .. } => out.push(field),
            Self::And(l, r) | Self::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
        }
    }

    /// Evaluate against one row. Missing fields read as NULL.
    pub fn test(&self, row: &Record) -> bool {
        match self {
            Self::Compare { field, op, value } => {
                op.test(row.get(field).unwrap_or(&Value::Null), value)
            }
            Self::And(l, r) => l.test(row) && r.test(row),
            Self::Or(l, r) => l.test(row) || r.test(row),
        }
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Op(CompareOp),
    Word(String),
    Literal(Value),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("'('"),
            Token::Close => f.write_str("')'"),
            Token::Op(op) => write!(f, "operator '{}'", op.as_str()),
            Token::Word(w) => write!(f, "'{w}'"),
            Token::Literal(v) => write!(f, "literal {v}"),
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidQuery(message.into())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    loop {
        if rest.trim_start().is_empty() {
            return Ok(tokens);
        }
        let caps = TOKEN.captures(rest).ok_or_else(|| {
            let offset = text.len() - rest.trim_start().len();
            invalid(format!("unrecognized input at offset {offset}"))
        })?;

        let token = if let Some(m) = caps.name("paren") {
            if m.as_str() == "(" { Token::Open } else { Token::Close }
        } else if let Some(m) = caps.name("op") {
            CompareOp::parse(m.as_str())
                .map(Token::Op)
                .ok_or_else(|| invalid(format!("unknown operator {}", m.as_str())))?
        } else if let Some(m) = caps.name("single").or_else(|| caps.name("double")) {
            Token::Literal(Value::Text(unescape(m.as_str())))
        } else if let Some(m) = caps.name("num") {
            let s = m.as_str();
            let value = if s.contains('.') {
                s.parse().map(Value::Double).ok()
            } else {
                s.parse().map(Value::BigInt).ok()
            };
            Token::Literal(value.ok_or_else(|| invalid(format!("bad number {s}")))?)
        } else if let Some(m) = caps.name("word") {
            match m.as_str().to_ascii_lowercase().as_str() {
                "true" => Token::Literal(Value::Bool(true)),
                "false" => Token::Literal(Value::Bool(false)),
                "null" => Token::Literal(Value::Null),
                _ => Token::Word(m.as_str().to_string()),
            }
        } else {
            return Err(invalid("unrecognized input"));
        };

        tokens.push(token);
        rest = &rest[caps.get(0).map_or(rest.len(), |m| m.end())..];
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn keyword(&mut self, kw: &str) -> bool {
        match self.peek() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case(kw) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn or_expr(&mut self) -> Result<Filter> {
        let mut left = self.and_expr()?;
        while self.keyword("or") {
            let right = self.and_expr()?;
            left = Filter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Filter> {
        let mut left = self.term()?;
        while self.keyword("and") {
            let right = self.term()?;
            left = Filter::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Filter> {
        match self.next() {
            Some(Token::Open) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    Some(tok) => Err(invalid(format!("expected ')', found {tok}"))),
                    None => Err(invalid("unclosed '('")),
                }
            }
            Some(Token::Word(field)) => {
                let op = match self.next() {
                    Some(Token::Op(op)) => op,
                    Some(tok) => {
                        return Err(invalid(format!(
                            "expected operator after '{field}', found {tok}"
                        )));
                    }
                    None => return Err(invalid(format!("expected operator after '{field}'"))),
                };
                match self.next() {
                    Some(Token::Literal(value)) => Ok(Filter::Compare { field, op, value }),
                    Some(tok) => Err(invalid(format!("expected literal, found {tok}"))),
                    None => Err(invalid("expected literal at end of input")),
                }
            }
            Some(tok) => Err(invalid(format!("expected field name or '(', found {tok}"))),
            None => Err(invalid("empty filter expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Record {
        Record::new()
            .with("id", 3)
            .with("backend", "east")
            .with("ram", 4.5)
            .with("active", true)
            .with("parent", Value::Null)
    }

    #[test]
    fn test_simple_compare() {
        let f = Filter::parse("backend = 'east'").unwrap();
        assert_eq!(
            f,
            Filter::Compare {
                field: "backend".into(),
                op: CompareOp::Eq,
                value: Value::Text("east".into()),
            }
        );
        assert!(f.test(&row()));
    }

    #[test]
    fn test_precedence_and_parens() {
        // and binds tighter than or
        assert!(Filter::parse("id = 9 or id = 3 and active = true").unwrap().test(&row()));
        assert!(!Filter::parse("(id = 9 or id = 3) and active = false").unwrap().test(&row()));
        assert!(Filter::parse("id >= 3 AND ram < 5").unwrap().test(&row()));
    }

    #[test]
    fn test_null_literal() {
        assert!(Filter::parse("parent = null").unwrap().test(&row()));
        assert!(Filter::parse("backend != NULL").unwrap().test(&row()));
        // missing field reads as NULL
        assert!(Filter::parse("missing = null").unwrap().test(&row()));
        assert!(!Filter::parse("parent != 1").unwrap().test(&row()));
    }

    #[test]
    fn test_incomparable_is_false() {
        assert!(!Filter::parse("backend > 1").unwrap().test(&row()));
        assert!(!Filter::parse("backend < 1").unwrap().test(&row()));
    }

    #[test]
    fn test_escapes_and_double_quotes() {
        let f = Filter::parse(r#"name = "it\"s""#).unwrap();
        assert!(f.test(&Record::new().with("name", "it\"s")));
        let f = Filter::parse(r"name = 'a\'b'").unwrap();
        assert!(f.test(&Record::new().with("name", "a'b")));
    }

    #[test]
    fn test_fields() {
        let f = Filter::parse("a = 1 and (b = 2 or c = 3)").unwrap();
        assert_eq!(f.fields(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "id =", "id 3", "(id = 3", "id = 3)", "= 3", "id = 3 and", "id ~ 3", "id = bare"] {
            assert!(
                matches!(Filter::parse(bad), Err(Error::InvalidQuery(_))),
                "expected failure for {bad:?}"
            );
        }
    }
}
