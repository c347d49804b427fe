//! Expression evaluation against a context value.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::function::FunctionRegistry;
use super::parser::parse_expression;
use crate::error::{Error, Result};
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Custom property lookup, consulted before the built-in map access.
///
/// Return `None` to let the next accessor (or the default lookup) handle
/// the property.
pub trait PropertyAccessor: Send + Sync {
    /// Read `name` from `target`.
    fn read(&self, target: &Value, name: &str) -> Option<Value>;
}

/// Evaluates expression text against a scope value.
#[derive(Clone, Default)]
pub struct Evaluator {
    accessors: Vec<Arc<dyn PropertyAccessor>>,
    functions: FunctionRegistry,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("accessors", &self.accessors.len())
            .field("functions", &self.functions)
            .finish()
    }
}

impl Evaluator {
    /// Create an evaluator with no accessors or functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given function registry.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Add a property accessor. Accessors are consulted in the order added.
    pub fn with_accessor(mut self, accessor: Arc<dyn PropertyAccessor>) -> Self {
        self.accessors.push(accessor);
        self
    }

    /// Registered functions.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Parse and evaluate `text` with `scope` as the root object.
    pub fn evaluate(&self, scope: &Value, text: &str) -> Result<Value> {
        let expr = parse_expression(text)?;
        self.eval(&expr, scope).map_err(|err| match err {
            Error::Evaluation { message, .. } => Error::Evaluation {
                expression: text.trim().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Evaluate a parsed expression.
    pub fn eval(&self, expr: &Expr, scope: &Value) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Scope => Ok(scope.clone()),
            Expr::Ident(name) => self.property(expr, scope, name),
            Expr::Member {
                target,
                name,
                null_safe,
            } => {
                let receiver = self.eval(target, scope)?;
                if receiver.is_null() {
                    if *null_safe {
                        return Ok(Value::Null);
                    }
                    return Err(fail(expr, format!("cannot read property '{}' of null", name)));
                }
                self.property(expr, &receiver, name)
            }
            Expr::Index { target, index } => {
                let receiver = self.eval(target, scope)?;
                let key = self.eval(index, scope)?;
                index_into(expr, &receiver, &key)
            }
            Expr::Call { name, args } => {
                let function = self
                    .functions
                    .get(name)
                    .ok_or_else(|| fail(expr, format!("unknown function '{}'", name)))?;
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>>>()?;
                function.call(values)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                match (op, value) {
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, Value::Int(i)) => i
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| fail(expr, "integer overflow")),
                    (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
                    (op, value) => Err(fail(
                        expr,
                        format!("operator {:?} does not apply to {}", op, value.kind()),
                    )),
                }
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    let lhs = self.condition(left, scope)?;
                    match (op, lhs) {
                        (BinaryOp::And, false) => Ok(Value::Bool(false)),
                        (BinaryOp::Or, true) => Ok(Value::Bool(true)),
                        _ => Ok(Value::Bool(self.condition(right, scope)?)),
                    }
                }
                _ => {
                    let lhs = self.eval(left, scope)?;
                    let rhs = self.eval(right, scope)?;
                    binary(expr, *op, lhs, rhs)
                }
            },
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.condition(condition, scope)? {
                    self.eval(then, scope)
                } else {
                    self.eval(otherwise, scope)
                }
            }
        }
    }

    fn condition(&self, expr: &Expr, scope: &Value) -> Result<bool> {
        match self.eval(expr, scope)? {
            Value::Bool(b) => Ok(b),
            other => Err(fail(
                expr,
                format!("expected a boolean, got {}", other.kind()),
            )),
        }
    }

    fn property(&self, expr: &Expr, target: &Value, name: &str) -> Result<Value> {
        for accessor in &self.accessors {
            if let Some(value) = accessor.read(target, name) {
                return Ok(value);
            }
        }

        match target {
            Value::Map(map) => map
                .get(name)
                .cloned()
                .ok_or_else(|| fail(expr, format!("property '{}' not found", name))),
            Value::List(items) if is_length(name) => Ok(Value::Int(items.len() as i64)),
            Value::String(s) if is_length(name) => Ok(Value::Int(s.chars().count() as i64)),
            Value::Table(table) if name == "headers" => Ok(Value::list(table.headers.clone())),
            other => Err(fail(
                expr,
                format!("property '{}' not found on {}", name, other.kind()),
            )),
        }
    }
}

fn is_length(name: &str) -> bool {
    name == "size" || name == "length"
}

fn fail(expr: &Expr, message: impl Into<String>) -> Error {
    Error::evaluation(expr.to_string(), message)
}

fn index_into(expr: &Expr, receiver: &Value, key: &Value) -> Result<Value> {
    match (receiver, key) {
        (Value::List(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| fail(expr, format!("index {} out of bounds for length {}", i, items.len()))),
        (Value::Map(map), Value::String(k)) => map
            .get(k)
            .cloned()
            .ok_or_else(|| fail(expr, format!("key '{}' not found", k))),
        (receiver, key) => Err(fail(
            expr,
            format!("cannot index {} with {}", receiver.kind(), key.kind()),
        )),
    }
}

fn binary(expr: &Expr, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equals(&lhs, &rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| {
                fail(expr, format!("cannot compare {} with {}", lhs.kind(), rhs.kind()))
            })?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) => {
            Ok(Value::String(format!("{}{}", lhs, rhs)))
        }
        _ => arithmetic(op, &lhs, &rhs).map_err(|message| fail(expr, message)),
    }
}

fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            lhs.as_f64() == rhs.as_f64()
        }
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> std::result::Result<Value, String> {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let (a, b) = (*a, *b);
        if b == 0 && matches!(op, BinaryOp::Div | BinaryOp::Rem) {
            return Err("division by zero".to_string());
        }
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div(b),
            BinaryOp::Rem => a.checked_rem(b),
            _ => return Err(format!("'{}' is not an arithmetic operator", op)),
        };
        return result.map(Value::Int).ok_or_else(|| "integer overflow".to_string());
    }

    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => {
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => return Err(format!("'{}' is not an arithmetic operator", op)),
            };
            Ok(Value::Float(result))
        }
        _ => Err(format!(
            "cannot apply '{}' to {} and {}",
            op,
            lhs.kind(),
            rhs.kind()
        )),
    }
}
