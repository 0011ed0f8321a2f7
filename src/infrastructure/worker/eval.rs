//! Operator `eval` snippets.
//!
//! A deliberately small language evaluated against the host's live
//! context. A snippet is a sequence of statements separated by newlines or
//! `;`. Each statement is `print <expr>` or a bare expression.
//!
//! Expressions:
//!
//! - JSON literals, single-quoted strings, `True`/`False`/`None`
//! - `_`: the last non-`None` result of a previous snippet
//! - context names with `.field` and `[index]` access
//! - `len(<expr>)` and parentheses
//!
//! The reply is the printed output followed by the value of the final
//! statement. Errors are reported as `<Kind>: <message>` after any output
//! printed before the failure.

use std::fmt;

use serde_json::Value;

use crate::port::HostContext;

/// Deepest nesting of parentheses, calls and subscripts in one expression.
const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ErrorKind {
    Syntax,
    Name,
    Key,
    Index,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EvalError {
    kind: ErrorKind,
    message: String,
}

impl EvalError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Name => "NameError",
            ErrorKind::Key => "KeyError",
            ErrorKind::Index => "IndexError",
            ErrorKind::Type => "TypeError",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

/// Strip a surrounding code fence (with optional language tag) or inline
/// backticks.
#[must_use]
pub fn cleanup_code(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        let inner = &trimmed[3..trimmed.len() - 3];
        // The fence line may carry a language tag.
        return match inner.split_once('\n') {
            Some((_, body)) => body.to_owned(),
            None => inner.to_owned(),
        };
    }
    trimmed.trim_matches('`').trim().to_owned()
}

/// Evaluates snippets, remembering the last result as `_`.
#[derive(Debug, Default)]
pub struct Evaluator {
    last: Option<Value>,
}

impl Evaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `code` against `context` and render the reply.
    pub fn run(&mut self, code: &str, context: &HostContext) -> String {
        let code = cleanup_code(code);
        let mut output = String::new();
        let mut result = Value::Null;

        for statement in split_statements(&code) {
            match self.statement(statement, context, &mut output) {
                Ok(value) => result = value,
                Err(e) => return format!("{output}{e}"),
            }
        }

        if result.is_null() {
            return if output.is_empty() {
                "None".into()
            } else {
                output
            };
        }
        let reply = format!("{output}{}", repr(&result));
        self.last = Some(result);
        reply
    }

    fn statement(
        &self,
        statement: &str,
        context: &HostContext,
        output: &mut String,
    ) -> Result<Value, EvalError> {
        if let Some(rest) = print_argument(statement) {
            if !rest.trim().is_empty() {
                let value = self.expression(rest, context)?;
                output.push_str(&display(&value));
            }
            output.push('\n');
            return Ok(Value::Null);
        }
        self.expression(statement, context)
    }

    fn expression(&self, source: &str, context: &HostContext) -> Result<Value, EvalError> {
        let mut parser = Parser {
            src: source,
            pos: 0,
            context,
            last: self.last.as_ref(),
            depth: 0,
        };
        let value = parser.expr()?;
        parser.skip_ws();
        if parser.pos < source.len() {
            return Err(EvalError::syntax("invalid syntax"));
        }
        Ok(value)
    }
}

/// The argument of a `print` statement, if `statement` is one.
fn print_argument(statement: &str) -> Option<&str> {
    let rest = statement.strip_prefix("print")?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '(' => Some(rest),
        Some(_) => None,
    }
}

/// Split on newlines and `;` outside string literals.
fn split_statements(code: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in code.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            ';' | '\n' => {
                statements.push(&code[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    statements.push(&code[start..]);
    statements
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Rendering used by `print`: strings bare.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr(other),
    }
}

/// Rendering of a result value.
fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".into(),
        Value::Bool(true) => "True".into(),
        Value::Bool(false) => "False".into(),
        other => other.to_string(),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    context: &'a HostContext,
    last: Option<&'a Value>,
    depth: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), EvalError> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(EvalError::syntax(format!("expected '{expected}'")))
        }
    }

    fn expr(&mut self) -> Result<Value, EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::syntax("nesting too deep"));
        }
        self.depth += 1;
        let value = self.operand();
        self.depth -= 1;
        value
    }

    fn operand(&mut self) -> Result<Value, EvalError> {
        self.skip_ws();
        let value = match self.peek() {
            None => return Err(EvalError::syntax("unexpected end of input")),
            Some('(') => {
                self.bump();
                let value = self.expr()?;
                self.expect(')')?;
                value
            }
            Some('\'') => self.single_quoted()?,
            Some('"' | '[' | '{') => self.json_literal()?,
            Some(c) if c == '-' || c.is_ascii_digit() => self.number()?,
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name = self.ident();
                self.name(&name)?
            }
            Some(_) => return Err(EvalError::syntax("invalid syntax")),
        };
        self.postfix(value)
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        self.src[start..self.pos].to_owned()
    }

    fn name(&mut self, name: &str) -> Result<Value, EvalError> {
        match name {
            "True" | "true" => return Ok(Value::Bool(true)),
            "False" | "false" => return Ok(Value::Bool(false)),
            "None" | "null" => return Ok(Value::Null),
            "_" => {
                return self
                    .last
                    .cloned()
                    .ok_or_else(|| EvalError::new(ErrorKind::Name, "name '_' is not defined"));
            }
            _ => {}
        }

        self.skip_ws();
        if name == "len" && self.peek() == Some('(') {
            self.bump();
            let value = self.expr()?;
            self.expect(')')?;
            return len(&value);
        }

        self.context.get(name).cloned().ok_or_else(|| {
            EvalError::new(ErrorKind::Name, format!("name '{name}' is not defined"))
        })
    }

    fn single_quoted(&mut self) -> Result<Value, EvalError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(EvalError::syntax("unterminated string literal")),
                Some('\'') => {
                    self.bump();
                    return Ok(Value::String(text));
                }
                Some('\\') => {
                    self.bump();
                    let escaped = self
                        .peek()
                        .ok_or_else(|| EvalError::syntax("unterminated string literal"))?;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    self.bump();
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn json_literal(&mut self) -> Result<Value, EvalError> {
        let src: &str = self.src;
        let mut stream = serde_json::Deserializer::from_str(&src[self.pos..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                let consumed = stream.byte_offset();
                self.pos += consumed;
                Ok(value)
            }
            _ => Err(EvalError::syntax("invalid literal")),
        }
    }

    fn number(&mut self) -> Result<Value, EvalError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            self.bump();
        }
        serde_json::from_str(&self.src[start..self.pos])
            .map_err(|_| EvalError::syntax("invalid number literal"))
    }

    fn postfix(&mut self, mut value: Value) -> Result<Value, EvalError> {
        loop {
            self.skip_ws();
            match self.peek() {
                Some('.') => {
                    self.bump();
                    let field = self.ident();
                    if field.is_empty() {
                        return Err(EvalError::syntax("invalid syntax"));
                    }
                    value = attribute(value, &field)?;
                }
                Some('[') => {
                    self.bump();
                    let key = self.expr()?;
                    self.expect(']')?;
                    value = index(value, &key)?;
                }
                _ => return Ok(value),
            }
        }
    }
}

fn len(value: &Value) -> Result<Value, EvalError> {
    let n = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(EvalError::new(
                ErrorKind::Type,
                format!("object of type '{}' has no len()", type_name(other)),
            ))
        }
    };
    Ok(Value::from(n))
}

fn attribute(value: Value, field: &str) -> Result<Value, EvalError> {
    match value {
        Value::Object(mut map) => map
            .remove(field)
            .ok_or_else(|| EvalError::new(ErrorKind::Key, format!("'{field}'"))),
        other => Err(EvalError::new(
            ErrorKind::Type,
            format!("'{}' object has no attribute '{field}'", type_name(&other)),
        )),
    }
}

fn index(value: Value, key: &Value) -> Result<Value, EvalError> {
    match (value, key) {
        (Value::Object(mut map), Value::String(k)) => map
            .remove(k)
            .ok_or_else(|| EvalError::new(ErrorKind::Key, format!("'{k}'"))),
        (Value::Array(mut items), Value::Number(n)) => {
            let i = position(n.as_i64(), items.len())?;
            Ok(items.swap_remove(i))
        }
        (Value::String(s), Value::Number(n)) => {
            let chars: Vec<char> = s.chars().collect();
            let i = position(n.as_i64(), chars.len())?;
            Ok(Value::String(chars[i].to_string()))
        }
        (value, key) => Err(EvalError::new(
            ErrorKind::Type,
            format!(
                "'{}' object is not subscriptable by '{}'",
                type_name(&value),
                type_name(key)
            ),
        )),
    }
}

/// Resolve a possibly negative index against `len`.
fn position(index: Option<i64>, len: usize) -> Result<usize, EvalError> {
    let out_of_range = || EvalError::new(ErrorKind::Index, "index out of range");
    let index = index.ok_or_else(|| EvalError::new(ErrorKind::Type, "indices must be integers"))?;
    let len = i64::try_from(len).map_err(|_| out_of_range())?;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| out_of_range())
    } else {
        Err(out_of_range())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn context() -> HostContext {
        let mut ctx = HostContext::new();
        ctx.insert("cluster".into(), json!("Arbok"));
        ctx.insert("shards".into(), json!([0, 1, 2, 3]));
        ctx.insert("bot".into(), json!({"latency": 0.25, "guilds": 12}));
        ctx
    }

    #[test]
    fn strips_code_fences() {
        assert_eq!(cleanup_code("```py\nprint 1\n```"), "print 1\n");
        assert_eq!(cleanup_code("`len(shards)`"), "len(shards)");
        assert_eq!(cleanup_code("  shards "), "shards");
    }

    #[test]
    fn returns_final_expression_value() {
        let mut eval = Evaluator::new();
        assert_eq!(eval.run("len(shards)", &context()), "4");
        assert_eq!(eval.run("bot.guilds", &context()), "12");
        assert_eq!(eval.run("shards[-1]", &context()), "3");
        assert_eq!(eval.run("cluster", &context()), "\"Arbok\"");
    }

    #[test]
    fn captures_printed_output() {
        let mut eval = Evaluator::new();
        assert_eq!(eval.run("print cluster; print(len(shards))", &context()), "Arbok\n4\n");
        assert_eq!(eval.run("print 'a;b'\nbot.latency", &context()), "a;b\n0.25");
    }

    #[test]
    fn empty_result_is_none() {
        let mut eval = Evaluator::new();
        assert_eq!(eval.run("None", &context()), "None");
    }

    #[test]
    fn underscore_holds_previous_result() {
        let mut eval = Evaluator::new();
        assert!(eval.run("_", &context()).starts_with("NameError"));
        eval.run("bot", &context());
        assert_eq!(eval.run("_.guilds", &context()), "12");
    }

    #[test]
    fn formats_errors_after_output() {
        let mut eval = Evaluator::new();
        assert_eq!(
            eval.run("print 1; missing", &context()),
            "1\nNameError: name 'missing' is not defined"
        );
        assert_eq!(eval.run("bot.owner", &context()), "KeyError: 'owner'");
        assert_eq!(
            eval.run("len(4)", &context()),
            "TypeError: object of type 'int' has no len()"
        );
        assert!(eval.run("len(shards", &context()).starts_with("SyntaxError"));
        assert_eq!(eval.run("shards[9]", &context()), "IndexError: index out of range");
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let mut eval = Evaluator::new();
        let nested = |depth: usize, open: &str| {
            format!("{}1{}", open.repeat(depth), ")".repeat(depth))
        };

        assert_eq!(eval.run(&nested(40, "("), &context()), "1");
        assert_eq!(
            eval.run(&nested(200_000, "("), &context()),
            "SyntaxError: nesting too deep"
        );
        assert_eq!(
            eval.run(&nested(10_000, "len("), &context()),
            "SyntaxError: nesting too deep"
        );
        // The worker keeps evaluating afterwards.
        assert_eq!(eval.run("len(shards)", &context()), "4");
    }

    #[test]
    fn literals_evaluate() {
        let mut eval = Evaluator::new();
        assert_eq!(eval.run(r#"{"a": [1, 2]}.a[0]"#, &context()), "1");
        assert_eq!(eval.run("True", &context()), "True");
        assert_eq!(eval.run("len('abc')", &context()), "3");
    }
}
