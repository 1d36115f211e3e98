//! Source expressions: parsing, evaluation and assignment.
//!
//! Compiled instructions carry expressions as source text; the renderer runs
//! them through an [`ExpressionParser`] when it links a binding. The grammar
//! is deliberately small: property access, literals, and method calls with
//! literal or property arguments. Interpolation strings (`"pos: ${x}"`)
//! parse into a part/expression zipper that always evaluates to text.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::binding::flags::BindingFlags;
use crate::binding::scope::Scope;
use crate::error::{Result, ScenaError};
use crate::scene::PropertyValue;

/// What an expression string is being parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    /// A property source: must evaluate, may be assignable.
    Property,
    /// A call source: listener and call bindings.
    Call,
    /// Literal text with `${...}` holes.
    Interpolation,
}

/// A parsed, evaluatable expression.
pub trait Expression {
    fn evaluate(&self, scope: &mut Scope<'_>, flags: BindingFlags) -> Result<PropertyValue>;

    /// Write `value` back through the expression. Only plain property
    /// accesses accept this.
    fn assign(&self, scope: &mut Scope<'_>, value: PropertyValue, flags: BindingFlags)
        -> Result<()>;

    /// The original source text.
    fn text(&self) -> &str;

    /// Whether [`Expression::assign`] can succeed.
    fn is_assignable(&self) -> bool {
        false
    }
}

/// Turns source text into shareable parsed expressions.
pub trait ExpressionParser {
    fn parse(&self, text: &str, kind: ExpressionKind) -> Result<Rc<dyn Expression>>;
}

/// A binding source as an instruction carries it: raw text, or an
/// expression the template compiler already parsed. Precompiled
/// definitions hand over the parsed form and never touch the parser at
/// render time.
#[derive(Clone)]
pub enum SourceExpression {
    Raw(String),
    Parsed(Rc<dyn Expression>),
}

impl SourceExpression {
    /// The parsed expression, reading through the parser only for the raw
    /// form.
    pub fn ensure_parsed(
        &self,
        parser: &dyn ExpressionParser,
        kind: ExpressionKind,
    ) -> Result<Rc<dyn Expression>> {
        match self {
            SourceExpression::Raw(text) => parser.parse(text, kind),
            SourceExpression::Parsed(expression) => Ok(Rc::clone(expression)),
        }
    }

    /// The source text, for logs and diagnostics.
    pub fn text(&self) -> &str {
        match self {
            SourceExpression::Raw(text) => text,
            SourceExpression::Parsed(expression) => expression.text(),
        }
    }
}

impl std::fmt::Debug for SourceExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceExpression::Raw(text) => f.debug_tuple("Raw").field(text).finish(),
            SourceExpression::Parsed(expression) => {
                f.debug_tuple("Parsed").field(&expression.text()).finish()
            }
        }
    }
}

impl From<&str> for SourceExpression {
    fn from(text: &str) -> Self {
        SourceExpression::Raw(text.to_string())
    }
}

impl From<String> for SourceExpression {
    fn from(text: String) -> Self {
        SourceExpression::Raw(text)
    }
}

impl From<Rc<dyn Expression>> for SourceExpression {
    fn from(expression: Rc<dyn Expression>) -> Self {
        SourceExpression::Parsed(expression)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Ast {
    Access(String),
    Literal(PropertyValue),
    Call { method: String, args: Vec<Ast> },
}

impl Ast {
    fn evaluate(&self, scope: &mut Scope<'_>, flags: BindingFlags) -> Result<PropertyValue> {
        match self {
            Ast::Access(name) => Ok(scope.read(name)),
            Ast::Literal(value) => Ok(value.clone()),
            Ast::Call { method, args } => {
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(arg.evaluate(scope, flags)?);
                }
                scope.vm.invoke(method, &evaluated, flags)
            }
        }
    }
}

struct ParsedExpression {
    text: String,
    ast: Ast,
}

impl Expression for ParsedExpression {
    fn evaluate(&self, scope: &mut Scope<'_>, flags: BindingFlags) -> Result<PropertyValue> {
        self.ast.evaluate(scope, flags)
    }

    fn assign(
        &self,
        scope: &mut Scope<'_>,
        value: PropertyValue,
        flags: BindingFlags,
    ) -> Result<()> {
        match &self.ast {
            Ast::Access(name) => {
                scope.write(name, value, flags);
                Ok(())
            }
            _ => Err(ScenaError::NotAssignable(self.text.clone())),
        }
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn is_assignable(&self) -> bool {
        matches!(self.ast, Ast::Access(_))
    }
}

/// `"score: ${points} of ${total}"`: n+1 literal parts around n expressions.
struct Interpolation {
    text: String,
    parts: Vec<String>,
    exprs: Vec<Ast>,
}

impl Expression for Interpolation {
    fn evaluate(&self, scope: &mut Scope<'_>, flags: BindingFlags) -> Result<PropertyValue> {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            out.push_str(part);
            if let Some(expr) = self.exprs.get(i) {
                out.push_str(&display(&expr.evaluate(scope, flags)?));
            }
        }
        Ok(PropertyValue::Text(out))
    }

    fn assign(
        &self,
        _scope: &mut Scope<'_>,
        _value: PropertyValue,
        _flags: BindingFlags,
    ) -> Result<()> {
        Err(ScenaError::NotAssignable(self.text.clone()))
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Text form of a value inside an interpolation hole.
fn display(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => String::new(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        PropertyValue::Text(s) => s.clone(),
        PropertyValue::Color(c) => format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
        PropertyValue::Node(_) => "[node]".to_string(),
    }
}

struct Cursor<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> ScenaError {
        ScenaError::Parse(format!("{} in \"{}\"", message.into(), self.src))
    }

    fn parse_operand(&mut self) -> Result<Ast> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '-' => self.parse_number(),
            Some('\'') | Some('"') => self.parse_string(),
            Some(c) if is_ident_start(c) => self.parse_ident(),
            Some(c) => Err(self.error(format!("unexpected character {:?}", c))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn parse_number(&mut self) -> Result<Ast> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let value: f64 = raw
            .parse()
            .map_err(|_| self.error(format!("malformed number {:?}", raw)))?;
        Ok(Ast::Literal(PropertyValue::Number(value)))
    }

    fn parse_string(&mut self) -> Result<Ast> {
        let quote = match self.bump() {
            Some(q) => q,
            None => return Err(self.error("unexpected end of expression")),
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => break,
                Some('\\') => match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(Ast::Literal(PropertyValue::Text(out)))
    }

    fn parse_ident(&mut self) -> Result<Ast> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        self.skip_ws();
        if self.eat('(') {
            let mut args = Vec::new();
            self.skip_ws();
            if !self.eat(')') {
                loop {
                    args.push(self.parse_operand()?);
                    self.skip_ws();
                    if self.eat(')') {
                        break;
                    }
                    if !self.eat(',') {
                        return Err(self.error("expected ',' or ')' in argument list"));
                    }
                }
            }
            return Ok(Ast::Call { method: name, args });
        }

        Ok(match name.as_str() {
            "true" => Ast::Literal(PropertyValue::Bool(true)),
            "false" => Ast::Literal(PropertyValue::Bool(false)),
            "null" => Ast::Literal(PropertyValue::Null),
            _ => Ast::Access(name),
        })
    }

    fn expect_end(&mut self) -> Result<()> {
        self.skip_ws();
        if self.pos < self.chars.len() {
            Err(self.error("trailing characters"))
        } else {
            Ok(())
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn parse_source(text: &str, kind: ExpressionKind) -> Result<Rc<dyn Expression>> {
    match kind {
        ExpressionKind::Property | ExpressionKind::Call => {
            let mut cursor = Cursor::new(text);
            let ast = cursor.parse_operand()?;
            cursor.expect_end()?;
            if kind == ExpressionKind::Call && !matches!(ast, Ast::Call { .. }) {
                return Err(ScenaError::Parse(format!(
                    "expected a call expression, got \"{}\"",
                    text
                )));
            }
            Ok(Rc::new(ParsedExpression {
                text: text.to_string(),
                ast,
            }))
        }
        ExpressionKind::Interpolation => parse_interpolation(text),
    }
}

fn parse_interpolation(text: &str) -> Result<Rc<dyn Expression>> {
    let mut parts = Vec::new();
    let mut exprs = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("${") {
        let close = rest[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| {
                ScenaError::Parse(format!("unterminated interpolation in \"{}\"", text))
            })?;
        parts.push(rest[..open].to_string());
        let inner = &rest[open + 2..close];
        let mut cursor = Cursor::new(inner);
        let ast = cursor.parse_operand()?;
        cursor.expect_end()?;
        exprs.push(ast);
        rest = &rest[close + 1..];
    }
    parts.push(rest.to_string());

    Ok(Rc::new(Interpolation {
        text: text.to_string(),
        parts,
        exprs,
    }))
}

/// The default parser. Parsed expressions are cached by kind and source
/// text so repeated renders of the same template share one AST.
pub struct CachingParser {
    cache: RefCell<HashMap<(ExpressionKind, String), Rc<dyn Expression>>>,
}

impl CachingParser {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl Default for CachingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionParser for CachingParser {
    fn parse(&self, text: &str, kind: ExpressionKind) -> Result<Rc<dyn Expression>> {
        if let Some(parsed) = self.cache.borrow().get(&(kind, text.to_string())) {
            return Ok(Rc::clone(parsed));
        }
        let parsed = parse_source(text, kind)?;
        self.cache
            .borrow_mut()
            .insert((kind, text.to_string()), Rc::clone(&parsed));
        Ok(parsed)
    }
}
