//! Expression syntax tree.

use crate::value::Value;
use std::fmt;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// The evaluation scope itself (`#this`)
    Scope,
    /// Property of the scope
    Ident(String),
    /// Property of another value; `null_safe` for `?.`
    Member {
        /// Receiver
        target: Box<Expr>,
        /// Property name
        name: String,
        /// Yield `null` instead of failing on a `null` receiver
        null_safe: bool,
    },
    /// `target[index]`
    Index {
        /// Indexed value
        target: Box<Expr>,
        /// Index or key
        index: Box<Expr>,
    },
    /// Named function call
    Call {
        /// Function or directive name
        name: String,
        /// Positional arguments
        args: Vec<Expr>,
    },
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `condition ? then : otherwise`
    Conditional {
        /// Condition
        condition: Box<Expr>,
        /// Value when true
        then: Box<Expr>,
        /// Value when false
        otherwise: Box<Expr>,
    },
}

impl Expr {
    pub(crate) fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!` / `not`
    Not,
    /// `-`
    Neg,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `||` / `or`
    Or,
    /// `&&` / `and`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            Expr::Literal(Value::Null) => f.write_str("null"),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Scope => f.write_str("#this"),
            Expr::Ident(name) => f.write_str(name),
            Expr::Member {
                target,
                name,
                null_safe,
            } => write!(f, "{}{}{}", target, if *null_safe { "?." } else { "." }, name),
            Expr::Index { target, index } => write!(f, "{}[{}]", target, index),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Neg => write!(f, "-{}", operand),
            },
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", condition, then, otherwise),
        }
    }
}
