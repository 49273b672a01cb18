//! Built-in expression language: lexer, AST, parser, and evaluator.
//!
//! This is the default [`Evaluator`] implementation, small enough to embed
//! anywhere: numbers, strings, booleans, scoped variables, and the usual
//! operator ladder. Hosts wanting a full scripting runtime swap in their own
//! evaluator (see the optional Lua one).
//!
//! Operator precedence (lowest → highest):
//!   sequence (`;` / newline)  →  assign  →  ternary  →  or  →  and  →
//!   comparison  →  additive  →  multiplicative  →  unary  →  primary
//!
//! Variables are addressed as `tmp.name`, `session.name`, `system.name`, or
//! `param.name`; a bare `name` reads and writes the temporary scope. Reading
//! an unset variable yields the empty string. `+` concatenates when either
//! side is a string. Statements separated by `;` or newlines evaluate in
//! order; the last value wins.

use crate::error::EvalError;
use crate::resource::Evaluator;
use crate::tag::Value;
use crate::vars::{Scope, VarScopes};

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Str(String),
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    Eq, // ==
    Ne, // !=
    Lt,
    Le,
    Gt,
    Ge,

    And, // &&
    Or,  // ||

    Assign, // =
    Question,
    Colon,
    Dot,
    Semi, // ';' or newline
    LParen,
    RParen,

    /// Unrecognised input character, reported as a diagnostic.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        // Newlines are statement separators, not whitespace.
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut s = String::new();
        s.push(first);
        while matches!(self.peek(), Some('0'..='9')) {
            s.push(self.advance().unwrap_or('0'));
        }
        if self.peek() == Some('.') && matches!(self.src.get(self.pos + 1), Some('0'..='9')) {
            s.push(self.advance().unwrap_or('.'));
            while matches!(self.peek(), Some('0'..='9')) {
                s.push(self.advance().unwrap_or('0'));
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            s.push(self.advance().unwrap_or('e'));
            if matches!(self.peek(), Some('+' | '-')) {
                s.push(self.advance().unwrap_or('+'));
            }
            while matches!(self.peek(), Some('0'..='9')) {
                s.push(self.advance().unwrap_or('0'));
            }
        }
        Token::Num(s.parse().unwrap_or(0.0))
    }

    /// Strings close at the matching quote, end of line, or end of input.
    fn read_string(&mut self, quote: char) -> Token {
        let mut s = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => break,
                },
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
            }
        }
        Token::Str(s)
    }

    fn read_ident(&mut self, first: char) -> Token {
        let mut s = String::new();
        s.push(first);
        while matches!(self.peek(), Some('a'..='z' | 'A'..='Z' | '0'..='9' | '_')) {
            s.push(self.advance().unwrap_or('_'));
        }
        Token::Ident(s)
    }

    fn next_token(&mut self) -> Token {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Token::Eof,
            Some(c) => c,
        };

        match ch {
            '\n' => Token::Semi,
            ';' => Token::Semi,
            '0'..='9' => self.read_number(ch),
            '"' => self.read_string('"'),
            '\'' => self.read_string('\''),
            'a'..='z' | 'A'..='Z' | '_' => self.read_ident(ch),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '!' => {
                if self.eat('=') {
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::Eq
                } else {
                    Token::Assign
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    Token::And
                } else {
                    Token::Unknown('&')
                }
            }
            '|' => {
                if self.eat('|') {
                    Token::Or
                } else {
                    Token::Unknown('|')
                }
            }
            '?' => Token::Question,
            ':' => Token::Colon,
            '.' => Token::Dot,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c => Token::Unknown(c),
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone)]
enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Var(Scope, String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Assign(Scope, String, Box<Expr>),
    Seq(Vec<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Expr, String> {
        while self.eat(&Token::Semi) {}
        if matches!(self.peek(), Token::Eof) {
            return Err("empty expression".into());
        }
        let expr = self.parse_seq()?;
        match self.peek() {
            Token::Eof => Ok(expr),
            other => Err(format!("unexpected token {other:?}")),
        }
    }

    fn parse_seq(&mut self) -> Result<Expr, String> {
        let first = self.parse_assign()?;
        if self.peek() != &Token::Semi {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(&Token::Semi) {
            if matches!(self.peek(), Token::Semi | Token::Eof) {
                continue;
            }
            exprs.push(self.parse_assign()?);
        }
        Ok(Expr::Seq(exprs))
    }

    /// Look-ahead for `name =` and `scope.name =` shapes; anything else
    /// falls through to the ternary level.
    fn parse_assign(&mut self) -> Result<Expr, String> {
        if let Token::Ident(first) = self.peek().clone() {
            if self.peek_at(1) == &Token::Assign {
                self.pos += 2;
                let rhs = self.parse_assign()?;
                return Ok(Expr::Assign(Scope::Temp, first, Box::new(rhs)));
            }
            if self.peek_at(1) == &Token::Dot {
                if let Token::Ident(name) = self.peek_at(2).clone() {
                    if self.peek_at(3) == &Token::Assign {
                        let scope = Scope::from_keyword(&first)
                            .ok_or_else(|| format!("unknown scope `{first}`"))?;
                        self.pos += 4;
                        let rhs = self.parse_assign()?;
                        return Ok(Expr::Assign(scope, name, Box::new(rhs)));
                    }
                }
            }
        }
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, String> {
        let cond = self.parse_or()?;
        if self.eat(&Token::Question) {
            let then = self.parse_or()?;
            if !self.eat(&Token::Colon) {
                return Err("expected ':' in ternary".into());
            }
            let else_ = self.parse_ternary()?;
            Ok(Expr::Ternary(
                Box::new(cond),
                Box::new(then),
                Box::new(else_),
            ))
        } else {
            Ok(cond)
        }
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Token::Minus => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            Token::Bang => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let tok = self.advance();
        match tok {
            Token::Num(x) => Ok(Expr::Literal(Value::Num(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                _ => {
                    if self.eat(&Token::Dot) {
                        let scope = Scope::from_keyword(&name)
                            .ok_or_else(|| format!("unknown scope `{name}`"))?;
                        match self.advance() {
                            Token::Ident(field) => Ok(Expr::Var(scope, field)),
                            other => Err(format!("expected name after `{name}.`, got {other:?}")),
                        }
                    } else {
                        // Bare names live in the temporary scope.
                        Ok(Expr::Var(Scope::Temp, name))
                    }
                }
            },
            Token::LParen => {
                let inner = self.parse_seq()?;
                if !self.eat(&Token::RParen) {
                    return Err("expected ')'".into());
                }
                Ok(inner)
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

// ── Evaluation ────────────────────────────────────────────────────────────────

fn eval(expr: &Expr, vars: &mut VarScopes) -> Result<Value, String> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Var(scope, name) => {
            if !vars.is_bound(*scope) {
                return Err("macro parameters are not bound".into());
            }
            Ok(vars.get(*scope, name).cloned().unwrap_or_default())
        }

        Expr::Unary(op, inner) => {
            let v = eval(inner, vars)?;
            Ok(match op {
                UnaryOp::Neg => Value::Num(-v.as_num()),
                UnaryOp::Not => Value::Bool(!v.as_bool()),
            })
        }

        Expr::Binary(op, lhs, rhs) => {
            // Short-circuit before touching the right-hand side.
            match op {
                BinOp::And => {
                    let l = eval(lhs, vars)?;
                    if !l.as_bool() {
                        return Ok(Value::Bool(false));
                    }
                    return Ok(Value::Bool(eval(rhs, vars)?.as_bool()));
                }
                BinOp::Or => {
                    let l = eval(lhs, vars)?;
                    if l.as_bool() {
                        return Ok(Value::Bool(true));
                    }
                    return Ok(Value::Bool(eval(rhs, vars)?.as_bool()));
                }
                _ => {}
            }
            let l = eval(lhs, vars)?;
            let r = eval(rhs, vars)?;
            eval_binop(op, l, r)
        }

        Expr::Ternary(cond, then, else_) => {
            if eval(cond, vars)?.as_bool() {
                eval(then, vars)
            } else {
                eval(else_, vars)
            }
        }

        Expr::Assign(scope, name, rhs) => {
            let value = eval(rhs, vars)?;
            if !vars.set(*scope, name.clone(), value.clone()) {
                return Err("macro parameters are not bound".into());
            }
            Ok(value)
        }

        Expr::Seq(exprs) => {
            let mut last = Value::default();
            for e in exprs {
                last = eval(e, vars)?;
            }
            Ok(last)
        }
    }
}

fn eval_binop(op: &BinOp, l: Value, r: Value) -> Result<Value, String> {
    use std::cmp::Ordering;
    match op {
        BinOp::Add => {
            // String on either side means concatenation.
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                Ok(Value::Str(format!("{l}{r}")))
            } else {
                Ok(Value::Num(l.as_num() + r.as_num()))
            }
        }
        BinOp::Sub => Ok(Value::Num(l.as_num() - r.as_num())),
        BinOp::Mul => Ok(Value::Num(l.as_num() * r.as_num())),
        BinOp::Div => {
            if r.as_num() == 0.0 {
                return Err("division by zero".into());
            }
            Ok(Value::Num(l.as_num() / r.as_num()))
        }
        BinOp::Rem => {
            if r.as_num() == 0.0 {
                return Err("modulo by zero".into());
            }
            Ok(Value::Num(l.as_num() % r.as_num()))
        }

        BinOp::Eq => Ok(Value::Bool(compare(&l, &r) == Ordering::Equal)),
        BinOp::Ne => Ok(Value::Bool(compare(&l, &r) != Ordering::Equal)),
        BinOp::Lt => Ok(Value::Bool(compare(&l, &r) == Ordering::Less)),
        BinOp::Le => Ok(Value::Bool(matches!(
            compare(&l, &r),
            Ordering::Less | Ordering::Equal
        ))),
        BinOp::Gt => Ok(Value::Bool(compare(&l, &r) == Ordering::Greater)),
        BinOp::Ge => Ok(Value::Bool(matches!(
            compare(&l, &r),
            Ordering::Greater | Ordering::Equal
        ))),

        BinOp::And | BinOp::Or => Err("unreachable logical op".into()),
    }
}

/// Two strings compare numerically when both parse as numbers, otherwise
/// lexicographically; any other pairing compares numerically.
fn compare(l: &Value, r: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        }
    } else {
        l.as_num()
            .partial_cmp(&r.as_num())
            .unwrap_or(Ordering::Equal)
    }
}

/// Parse and evaluate an expression string against the given scopes.
pub fn eval_str(src: &str, vars: &mut VarScopes) -> Result<Value, String> {
    let tokens = Lexer::new(src).tokenize();
    let expr = Parser::new(tokens).parse_program()?;
    eval(&expr, vars)
}

// ── ExprEvaluator ─────────────────────────────────────────────────────────────

/// The built-in expression language as an [`Evaluator`].
#[derive(Debug, Default)]
pub struct ExprEvaluator;

impl ExprEvaluator {
    pub fn new() -> Self {
        ExprEvaluator
    }
}

impl Evaluator for ExprEvaluator {
    fn evaluate(&mut self, expr: &str, vars: &mut VarScopes) -> Result<Value, EvalError> {
        eval_str(expr, vars).map_err(|message| EvalError::new(expr, message))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Value {
        eval_str(src, &mut VarScopes::new()).expect("eval failed")
    }

    fn eval_with(src: &str, vars: &mut VarScopes) -> Value {
        eval_str(src, vars).expect("eval failed")
    }

    fn eval_err(src: &str) -> String {
        eval_str(src, &mut VarScopes::new()).expect_err("eval unexpectedly succeeded")
    }

    #[test]
    fn literals() {
        assert_eq!(eval("42"), Value::Num(42.0));
        assert_eq!(eval("2.5"), Value::Num(2.5));
        assert_eq!(eval("1e3"), Value::Num(1000.0));
        assert_eq!(eval("\"hello\""), Value::Str("hello".into()));
        assert_eq!(eval("'single'"), Value::Str("single".into()));
        assert_eq!(eval("true"), Value::Bool(true));
        assert_eq!(eval("false"), Value::Bool(false));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(eval("\"a\\nb\""), Value::Str("a\nb".into()));
        assert_eq!(eval("\"a\\tb\""), Value::Str("a\tb".into()));
        assert_eq!(eval("\"say \\\"hi\\\"\""), Value::Str("say \"hi\"".into()));
    }

    #[test]
    fn multibyte_string_literal() {
        assert_eq!(eval("\"こんにちは\""), Value::Str("こんにちは".into()));
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("1+1"), Value::Num(2.0));
        assert_eq!(eval("2 + 3 * 4"), Value::Num(14.0));
        assert_eq!(eval("(2 + 3) * 4"), Value::Num(20.0));
        assert_eq!(eval("10 / 4"), Value::Num(2.5));
        assert_eq!(eval("10 % 3"), Value::Num(1.0));
        assert_eq!(eval("-5 + 2"), Value::Num(-3.0));
    }

    #[test]
    fn division_by_zero() {
        assert!(eval_err("1 / 0").contains("division"));
        assert!(eval_err("1 % 0").contains("modulo"));
    }

    #[test]
    fn string_concat() {
        assert_eq!(eval("\"a\" + \"b\""), Value::Str("ab".into()));
        assert_eq!(eval("\"a\" + 1"), Value::Str("a1".into()));
        assert_eq!(eval("\"n=\" + 2.5"), Value::Str("n=2.5".into()));
        // Integral numbers render without a decimal point.
        assert_eq!(eval("\"n=\" + (4 / 2)"), Value::Str("n=2".into()));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("1 < 2"), Value::Bool(true));
        assert_eq!(eval("2 <= 2"), Value::Bool(true));
        assert_eq!(eval("3 == 3"), Value::Bool(true));
        assert_eq!(eval("3 != 3"), Value::Bool(false));
        assert_eq!(eval("\"abc\" == \"abc\""), Value::Bool(true));
        assert_eq!(eval("\"abc\" < \"abd\""), Value::Bool(true));
        // Numeric-looking strings compare as numbers.
        assert_eq!(eval("\"10\" > \"9\""), Value::Bool(true));
    }

    #[test]
    fn logic_and_short_circuit() {
        assert_eq!(eval("true && false"), Value::Bool(false));
        assert_eq!(eval("false || true"), Value::Bool(true));
        assert_eq!(eval("!0"), Value::Bool(true));
        // The right side must not be evaluated when the left decides.
        assert_eq!(eval("false && 1 / 0"), Value::Bool(false));
        assert_eq!(eval("true || 1 / 0"), Value::Bool(true));
    }

    #[test]
    fn ternary() {
        assert_eq!(eval("1 < 2 ? \"yes\" : \"no\""), Value::Str("yes".into()));
        assert_eq!(eval("0 ? 10 : 20"), Value::Num(20.0));
    }

    #[test]
    fn bare_names_use_temp_scope() {
        let mut vars = VarScopes::new();
        eval_with("x = 5", &mut vars);
        assert_eq!(vars.get(Scope::Temp, "x"), Some(&Value::Num(5.0)));
        assert_eq!(eval_with("x + 1", &mut vars), Value::Num(6.0));
        assert_eq!(eval_with("tmp.x", &mut vars), Value::Num(5.0));
    }

    #[test]
    fn scoped_reads_and_writes() {
        let mut vars = VarScopes::new();
        eval_with("session.flag = true", &mut vars);
        eval_with("system.volume = 0.5", &mut vars);
        assert_eq!(vars.get(Scope::Session, "flag"), Some(&Value::Bool(true)));
        assert_eq!(vars.get(Scope::System, "volume"), Some(&Value::Num(0.5)));
        assert_eq!(eval_with("session.flag", &mut vars), Value::Bool(true));
    }

    #[test]
    fn unset_variable_reads_empty() {
        assert_eq!(eval("tmp.nothing"), Value::Str(String::new()));
        assert_eq!(eval("ghost"), Value::Str(String::new()));
    }

    #[test]
    fn unknown_scope_is_an_error() {
        assert!(eval_err("global.x").contains("unknown scope"));
        assert!(eval_err("global.x = 1").contains("unknown scope"));
    }

    #[test]
    fn params_require_a_bound_frame() {
        assert!(eval_err("param.face").contains("macro parameters"));
        assert!(eval_err("param.face = 1").contains("macro parameters"));

        let mut vars = VarScopes::new();
        let mut frame = std::collections::BTreeMap::new();
        frame.insert("face".to_owned(), Value::from("smile"));
        vars.set_macro_params(frame);
        assert_eq!(eval_with("param.face", &mut vars), Value::Str("smile".into()));
    }

    #[test]
    fn assignment_returns_and_chains() {
        let mut vars = VarScopes::new();
        assert_eq!(eval_with("x = y = 3", &mut vars), Value::Num(3.0));
        assert_eq!(vars.get(Scope::Temp, "x"), Some(&Value::Num(3.0)));
        assert_eq!(vars.get(Scope::Temp, "y"), Some(&Value::Num(3.0)));
    }

    #[test]
    fn statement_sequences() {
        let mut vars = VarScopes::new();
        assert_eq!(
            eval_with("x = 1; y = x + 1; y * 10", &mut vars),
            Value::Num(20.0)
        );
    }

    #[test]
    fn newlines_separate_statements() {
        let mut vars = VarScopes::new();
        let program = "count = 0\ncount = count + 1\ncount = count + 1\ncount\n";
        assert_eq!(eval_with(program, &mut vars), Value::Num(2.0));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let mut vars = VarScopes::new();
        assert_eq!(eval_with("\n\nx = 7\n\n\nx\n", &mut vars), Value::Num(7.0));
    }

    #[test]
    fn parse_errors() {
        assert!(eval_err("").contains("empty"));
        assert!(eval_err("   ").contains("empty"));
        assert!(eval_err("1 +").contains("unexpected"));
        assert!(eval_err("(1").contains("')'"));
        assert!(eval_err("1 ? 2").contains("ternary"));
        assert!(eval_err("@").contains("unexpected"));
    }

    #[test]
    fn evaluator_trait_maps_errors() {
        let mut vars = VarScopes::new();
        let mut ev = ExprEvaluator::new();
        assert_eq!(ev.evaluate("1+1", &mut vars), Ok(Value::Num(2.0)));
        let err = ev.evaluate("1/0", &mut vars).unwrap_err();
        assert_eq!(err.expr, "1/0");
        assert!(err.message.contains("division"));
    }
}
