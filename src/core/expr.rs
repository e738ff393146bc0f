//! The condition and value expression language.
//!
//! Expressions are short infix strings such as `gold >= 3 && tags << "brave"`.
//! Evaluation runs in four stages: tokenize, resolve identifiers against the
//! live state, reorder to postfix with a shunting-yard pass, then run the
//! postfix on a value stack. Malformed input never fails; it degrades to
//! `Value::Null` with a warning.

use tracing::warn;

use crate::core::random::RandomSource;
use crate::schema::value::{Expression, Value};

/// Read access to the state an expression is evaluated against.
pub trait StateView {
    /// Current (preview) value of a resource, or `None` if no such resource.
    fn resource_value(&self, id: &str) -> Option<Value>;
    fn tags(&self) -> Vec<String>;
    fn items(&self) -> Vec<String>;
    /// Whether every customization category has its required selections.
    fn requirements_met(&self) -> bool;
}

/// Identifiers with a fixed meaning.
pub const KEYWORDS: [&str; 6] = ["true", "false", "tags", "items", "random", "required"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Or,
    Xor,
    And,
    /// `<<`: the left list contains the right value.
    Contains,
    /// `>>`: the left value is in the right list.
    ContainedIn,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// Prefix `-`.
    Neg,
}

impl Operator {
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => 2,
            Self::Xor => 3,
            Self::And => 4,
            Self::Contains | Self::ContainedIn => 5,
            Self::Eq | Self::Ne | Self::Gt | Self::Lt | Self::Ge | Self::Le => 6,
            Self::Add | Self::Sub => 7,
            Self::Mul | Self::Div | Self::Rem => 8,
            Self::Neg => 9,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::Xor => "^^",
            Self::And => "&&",
            Self::Contains => "<<",
            Self::ContainedIn => ">>",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Add => "+",
            Self::Sub | Self::Neg => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    fn is_unary(&self) -> bool {
        matches!(self, Self::Neg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// Double-quoted literal, quotes stripped.
    Text(String),
    Ident(String),
    Op(Operator),
    LParen,
    RParen,
    Unknown(char),
}

const TWO_CHAR_OPS: [(&str, Operator); 9] = [
    ("==", Operator::Eq),
    ("!=", Operator::Ne),
    (">=", Operator::Ge),
    ("<=", Operator::Le),
    ("<<", Operator::Contains),
    (">>", Operator::ContainedIn),
    ("||", Operator::Or),
    ("&&", Operator::And),
    ("^^", Operator::Xor),
];

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split source text into tokens.
pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if let Some(&next) = chars.get(i + 1) {
            let pair: String = [c, next].iter().collect();
            if let Some((_, op)) = TWO_CHAR_OPS.iter().find(|(s, _)| *s == pair) {
                tokens.push(Token::Op(*op));
                i += 2;
                continue;
            }
        }

        match c {
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '+' => tokens.push(Token::Op(Operator::Add)),
            '-' => {
                let prefix = matches!(tokens.last(), None | Some(Token::Op(_)) | Some(Token::LParen));
                tokens.push(Token::Op(if prefix { Operator::Neg } else { Operator::Sub }));
            }
            '*' => tokens.push(Token::Op(Operator::Mul)),
            '/' => tokens.push(Token::Op(Operator::Div)),
            '%' => tokens.push(Token::Op(Operator::Rem)),
            '<' => tokens.push(Token::Op(Operator::Lt)),
            '>' => tokens.push(Token::Op(Operator::Gt)),
            '"' => match chars[i + 1..].iter().position(|&ch| ch == '"') {
                Some(len) => {
                    tokens.push(Token::Text(chars[i + 1..i + 1 + len].iter().collect()));
                    i += len + 2;
                    continue;
                }
                None => tokens.push(Token::Unknown(c)),
            },
            _ if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(text.parse().unwrap_or(f64::NAN)));
                continue;
            }
            _ if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                continue;
            }
            _ => tokens.push(Token::Unknown(c)),
        }
        i += 1;
    }

    tokens
}

/// A token after identifiers have been resolved to values.
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Operand(Value),
    Op(Operator),
    LParen,
    RParen,
    Unknown(char),
}

fn resolve<V: StateView + ?Sized>(
    tokens: Vec<Token>,
    view: &V,
    rng: &mut dyn RandomSource,
) -> Vec<Resolved> {
    tokens
        .into_iter()
        .map(|token| match token {
            Token::Number(n) => Resolved::Operand(Value::Number(n)),
            Token::Text(s) => Resolved::Operand(Value::Text(s)),
            Token::Ident(name) => Resolved::Operand(resolve_ident(name, view, rng)),
            Token::Op(op) => Resolved::Op(op),
            Token::LParen => Resolved::LParen,
            Token::RParen => Resolved::RParen,
            Token::Unknown(c) => Resolved::Unknown(c),
        })
        .collect()
}

fn resolve_ident<V: StateView + ?Sized>(name: String, view: &V, rng: &mut dyn RandomSource) -> Value {
    match name.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "tags" => Value::List(view.tags()),
        "items" => Value::List(view.items()),
        "random" => Value::Number(rng.next_unit()),
        "required" => Value::Bool(view.requirements_met()),
        _ => view.resource_value(&name).unwrap_or(Value::Text(name)),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Postfix {
    Operand(Value),
    Op(Operator),
}

fn to_postfix(tokens: Vec<Resolved>, source: &str) -> Vec<Postfix> {
    let mut output = Vec::new();
    let mut stack: Vec<Resolved> = Vec::new();

    for token in tokens {
        match token {
            Resolved::Operand(v) => output.push(Postfix::Operand(v)),
            Resolved::LParen => stack.push(Resolved::LParen),
            Resolved::RParen => {
                while let Some(top) = stack.pop() {
                    match top {
                        Resolved::Op(op) => output.push(Postfix::Op(op)),
                        _ => break,
                    }
                }
            }
            Resolved::Op(op) => {
                if !op.is_unary() {
                    while let Some(Resolved::Op(top)) = stack.last() {
                        if top.precedence() < op.precedence() {
                            break;
                        }
                        output.push(Postfix::Op(*top));
                        stack.pop();
                    }
                }
                stack.push(Resolved::Op(op));
            }
            Resolved::Unknown(c) => {
                warn!(token = %c, expression = source, "expression_unknown_token");
            }
        }
    }

    while let Some(top) = stack.pop() {
        if let Resolved::Op(op) = top {
            output.push(Postfix::Op(op));
        }
    }

    output
}

fn evaluate_postfix(postfix: Vec<Postfix>, source: &str) -> Value {
    let mut stack: Vec<Value> = Vec::new();
    let pop = |stack: &mut Vec<Value>, op: Operator| {
        stack.pop().unwrap_or_else(|| {
            warn!(operator = op.symbol(), expression = source, "expression_missing_operand");
            Value::Null
        })
    };

    for item in postfix {
        match item {
            Postfix::Operand(v) => stack.push(v),
            Postfix::Op(Operator::Neg) => {
                let a = pop(&mut stack, Operator::Neg);
                stack.push(Value::Number(-a.as_number()));
            }
            Postfix::Op(op) => {
                let b = pop(&mut stack, op);
                let a = pop(&mut stack, op);
                stack.push(apply(op, a, b));
            }
        }
    }

    stack.into_iter().next().unwrap_or_default()
}

fn apply(op: Operator, a: Value, b: Value) -> Value {
    use std::cmp::Ordering;

    match op {
        Operator::Add => match (&a, &b) {
            (Value::Text(_) | Value::List(_), _) | (_, Value::Text(_) | Value::List(_)) => {
                Value::Text(format!("{}{}", a, b))
            }
            _ => Value::Number(a.as_number() + b.as_number()),
        },
        Operator::Sub => Value::Number(a.as_number() - b.as_number()),
        Operator::Mul => Value::Number(a.as_number() * b.as_number()),
        Operator::Div => Value::Number((a.as_number() / b.as_number()).floor()),
        Operator::Rem => Value::Number(a.as_number() % b.as_number()),
        Operator::Eq => Value::Bool(a.loose_eq(&b)),
        Operator::Ne => Value::Bool(!a.loose_eq(&b)),
        Operator::Gt => Value::Bool(a.loose_cmp(&b) == Some(Ordering::Greater)),
        Operator::Lt => Value::Bool(a.loose_cmp(&b) == Some(Ordering::Less)),
        Operator::Ge => Value::Bool(matches!(
            a.loose_cmp(&b),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        Operator::Le => Value::Bool(matches!(
            a.loose_cmp(&b),
            Some(Ordering::Less | Ordering::Equal)
        )),
        Operator::Contains => Value::Bool(a.list_contains(&b)),
        Operator::ContainedIn => Value::Bool(b.list_contains(&a)),
        Operator::And => {
            if a.truthy() {
                b
            } else {
                a
            }
        }
        Operator::Or => {
            if a.truthy() {
                a
            } else {
                b
            }
        }
        Operator::Xor => Value::Bool(a.truthy() != b.truthy()),
        Operator::Neg => Value::Number(-b.as_number()),
    }
}

/// Evaluate an expression. A numeric result is floored.
pub fn evaluate<V: StateView + ?Sized>(source: &str, view: &V, rng: &mut dyn RandomSource) -> Value {
    if source.trim().is_empty() {
        return Value::Null;
    }
    let resolved = resolve(tokenize(source), view, rng);
    let postfix = to_postfix(resolved, source);
    match evaluate_postfix(postfix, source) {
        Value::Number(n) => Value::Number(n.floor()),
        other => other,
    }
}

/// Evaluate an optional guard. An absent or blank condition passes.
pub fn condition_holds<V: StateView + ?Sized>(
    condition: Option<&Expression>,
    view: &V,
    rng: &mut dyn RandomSource,
) -> bool {
    match condition {
        Some(expr) if !expr.is_empty() => evaluate(expr.as_str(), view, rng).truthy(),
        _ => true,
    }
}

/// Identifiers in an expression that are not keywords. Used by the linter
/// to find references to resources that do not exist.
pub fn identifiers(source: &str) -> Vec<String> {
    tokenize(source)
        .into_iter()
        .filter_map(|token| match token {
            Token::Ident(name) if !KEYWORDS.contains(&name.as_str()) => Some(name),
            _ => None,
        })
        .collect()
}

/// Characters the tokenizer could not place.
pub fn unknown_characters(source: &str) -> Vec<char> {
    tokenize(source)
        .into_iter()
        .filter_map(|token| match token {
            Token::Unknown(c) => Some(c),
            _ => None,
        })
        .collect()
}
