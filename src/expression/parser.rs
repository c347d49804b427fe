//! Expression parser.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! sequence    := expr ((';' | newline) expr)* ';'?
//! expr        := or ('?' expr ':' expr)?
//! or          := and (('||' | 'or') and)*
//! and         := equality (('&&' | 'and') equality)*
//! equality    := comparison (('==' | '!=') comparison)*
//! comparison  := additive (('<=' | '>=' | '<' | '>') additive)*
//! additive    := term (('+' | '-') term)*
//! term        := unary (('*' | '/' | '%') unary)*
//! unary       := ('!' | 'not' | '-') unary | postfix
//! postfix     := primary ('.' ident | '?.' ident | '[' expr ']')*
//! primary     := number | string | 'true' | 'false' | 'null' | '#this'
//!              | ident '(' (expr (',' expr)*)? ')' | ident | '(' expr ')'
//! ```
//!
//! Strings may be single-quoted (`''` escapes a quote), double-quoted
//! (backslash escapes) or use typographic quotes, which word processors
//! substitute for straight quotes as users type.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, multispace1, none_of, satisfy},
    combinator::{all_consuming, cut, map, map_res, not, opt, recognize, value},
    error::{convert_error, VerboseError},
    multi::{fold_many0, many0_count, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, Result};
use crate::value::Value;

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

// ============================================================================
// Public API
// ============================================================================

/// Parse a single expression.
pub fn parse_expression(input: &str) -> Result<Expr> {
    let result = all_consuming(delimited(multispace0, expr, multispace0))(input);
    finish(input, result)
}

/// Parse a sequence of expressions separated by `;` or line breaks.
pub fn parse_sequence(input: &str) -> Result<Vec<Expr>> {
    let separator = alt((
        value((), preceded(multispace0, char(';'))),
        value((), multispace1),
    ));
    let result = all_consuming(delimited(
        multispace0,
        separated_list1(separator, preceded(multispace0, expr)),
        pair(opt(preceded(multispace0, char(';'))), multispace0),
    ))(input);
    finish(input, result)
}

fn finish<T>(input: &str, result: Res<'_, T>) -> Result<T> {
    match result {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Error::ExpressionSyntax {
            expression: input.to_string(),
            message: convert_error(input, e),
        }),
        Err(nom::Err::Incomplete(_)) => Err(Error::ExpressionSyntax {
            expression: input.to_string(),
            message: "incomplete input".to_string(),
        }),
    }
}

// ============================================================================
// Operators
// ============================================================================

fn expr(i: &str) -> Res<'_, Expr> {
    let (i, condition) = or_expr(i)?;
    let (i, branches) = opt(pair(
        preceded(token(char('?')), cut(preceded(multispace0, expr))),
        cut(preceded(token(char(':')), preceded(multispace0, expr))),
    ))(i)?;
    let expr = match branches {
        Some((then, otherwise)) => Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        },
        None => condition,
    };
    Ok((i, expr))
}

/// Parse `operand (operator operand)*` into a left-associative chain.
fn left_assoc<'a>(
    operand: fn(&'a str) -> Res<'a, Expr>,
    operator: fn(&'a str) -> Res<'a, BinaryOp>,
) -> impl FnMut(&'a str) -> Res<'a, Expr> {
    move |i| {
        let (i, first) = operand(i)?;
        fold_many0(
            pair(token(operator), preceded(multispace0, operand)),
            move || first.clone(),
            |acc, (op, rhs)| Expr::binary(op, acc, rhs),
        )(i)
    }
}

fn or_expr(i: &str) -> Res<'_, Expr> {
    left_assoc(and_expr, or_op)(i)
}

fn and_expr(i: &str) -> Res<'_, Expr> {
    left_assoc(equality, and_op)(i)
}

fn equality(i: &str) -> Res<'_, Expr> {
    left_assoc(comparison, equality_op)(i)
}

fn comparison(i: &str) -> Res<'_, Expr> {
    left_assoc(additive, comparison_op)(i)
}

fn additive(i: &str) -> Res<'_, Expr> {
    left_assoc(term, additive_op)(i)
}

fn term(i: &str) -> Res<'_, Expr> {
    left_assoc(unary, term_op)(i)
}

fn or_op(i: &str) -> Res<'_, BinaryOp> {
    value(BinaryOp::Or, alt((tag("||"), keyword("or"))))(i)
}

fn and_op(i: &str) -> Res<'_, BinaryOp> {
    value(BinaryOp::And, alt((tag("&&"), keyword("and"))))(i)
}

fn equality_op(i: &str) -> Res<'_, BinaryOp> {
    alt((value(BinaryOp::Eq, tag("==")), value(BinaryOp::Ne, tag("!="))))(i)
}

fn comparison_op(i: &str) -> Res<'_, BinaryOp> {
    alt((
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
    ))(i)
}

fn additive_op(i: &str) -> Res<'_, BinaryOp> {
    alt((value(BinaryOp::Add, char('+')), value(BinaryOp::Sub, char('-'))))(i)
}

fn term_op(i: &str) -> Res<'_, BinaryOp> {
    alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
        value(BinaryOp::Rem, char('%')),
    ))(i)
}

fn unary(i: &str) -> Res<'_, Expr> {
    alt((
        map(
            preceded(alt((tag("!"), keyword("not"))), preceded(multispace0, unary)),
            |e| Expr::unary(UnaryOp::Not, e),
        ),
        map(preceded(char('-'), preceded(multispace0, unary)), |e| {
            Expr::unary(UnaryOp::Neg, e)
        }),
        postfix,
    ))(i)
}

// ============================================================================
// Postfix and primary expressions
// ============================================================================

enum Suffix {
    Member(String, bool),
    Index(Expr),
}

fn postfix(i: &str) -> Res<'_, Expr> {
    let (i, base) = primary(i)?;
    fold_many0(
        preceded(
            multispace0,
            alt((
                map(preceded(tag("?."), cut(preceded(multispace0, identifier))), |n| {
                    Suffix::Member(n.to_string(), true)
                }),
                map(preceded(char('.'), cut(preceded(multispace0, identifier))), |n| {
                    Suffix::Member(n.to_string(), false)
                }),
                map(
                    delimited(
                        char('['),
                        cut(delimited(multispace0, expr, multispace0)),
                        cut(char(']')),
                    ),
                    Suffix::Index,
                ),
            )),
        ),
        move || base.clone(),
        |target, suffix| match suffix {
            Suffix::Member(name, null_safe) => Expr::Member {
                target: Box::new(target),
                name,
                null_safe,
            },
            Suffix::Index(index) => Expr::Index {
                target: Box::new(target),
                index: Box::new(index),
            },
        },
    )(i)
}

fn primary(i: &str) -> Res<'_, Expr> {
    alt((
        map(number, Expr::Literal),
        map(string_literal, |s| Expr::Literal(Value::String(s))),
        value(Expr::Literal(Value::Bool(true)), keyword("true")),
        value(Expr::Literal(Value::Bool(false)), keyword("false")),
        value(Expr::Literal(Value::Null), keyword("null")),
        value(Expr::Scope, tag("#this")),
        call,
        map(identifier, |name| Expr::Ident(name.to_string())),
        delimited(
            char('('),
            cut(delimited(multispace0, expr, multispace0)),
            cut(char(')')),
        ),
    ))(i)
}

fn call(i: &str) -> Res<'_, Expr> {
    let (i, name) = identifier(i)?;
    let (i, _) = preceded(multispace0, char('('))(i)?;
    let (i, args) = cut(terminated(
        separated_list0(preceded(multispace0, char(',')), preceded(multispace0, expr)),
        preceded(multispace0, char(')')),
    ))(i)?;
    Ok((
        i,
        Expr::Call {
            name: name.to_string(),
            args,
        },
    ))
}

// ============================================================================
// Lexical pieces
// ============================================================================

fn identifier(i: &str) -> Res<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(i)
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    terminated(tag(kw), not(satisfy(|c: char| c.is_alphanumeric() || c == '_')))
}

/// Skip leading whitespace before `inner`.
fn token<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> Res<'a, O>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    preceded(multispace0, inner)
}

fn number(i: &str) -> Res<'_, Value> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |s: &str| {
            if s.contains('.') {
                s.parse::<f64>().map(Value::Float).map_err(|e| e.to_string())
            } else {
                s.parse::<i64>().map(Value::Int).map_err(|e| e.to_string())
            }
        },
    )(i)
}

fn string_literal(i: &str) -> Res<'_, String> {
    alt((
        quoted('\'', '\''),
        quoted('\u{2018}', '\u{2019}'),
        quoted('\u{201C}', '\u{201D}'),
        double_quoted,
    ))(i)
}

fn quoted<'a>(open: char, close: char) -> impl FnMut(&'a str) -> Res<'a, String> {
    move |i| {
        let (i, _) = char(open)(i)?;
        let (i, text) = fold_many0(
            alt((
                value(close, pair(char(close), char(close))),
                satisfy(move |c| c != close),
            )),
            String::new,
            |mut acc, c| {
                acc.push(c);
                acc
            },
        )(i)?;
        let (i, _) = cut(char(close))(i)?;
        Ok((i, text))
    }
}

fn double_quoted(i: &str) -> Res<'_, String> {
    let (i, _) = char('"')(i)?;
    let (i, text) = fold_many0(
        alt((
            preceded(
                char('\\'),
                alt((
                    value('"', char('"')),
                    value('\\', char('\\')),
                    value('\n', char('n')),
                    value('\t', char('t')),
                )),
            ),
            none_of("\"\\"),
        )),
        String::new,
        |mut acc, c| {
            acc.push(c);
            acc
        },
    )(i)?;
    let (i, _) = cut(char('"'))(i)?;
    Ok((i, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    #[test]
    fn test_parse_member_chain() {
        let expr = parse_expression("customer.address?.city").unwrap();
        assert_eq!(expr.to_string(), "customer.address?.city");
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expression("a + b * 2 > 10 && !done").unwrap();
        assert_eq!(expr.to_string(), "(((a + (b * 2)) > 10) && !done)");
    }

    #[test]
    fn test_parse_call_and_index() {
        let expr = parse_expression("format(items[0].price, 'EUR')").unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, "format");
                assert_eq!(args.len(), 2);
                assert_eq!(args[1], Expr::Literal(Value::from("EUR")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_call() {
        let expr = parse_expression("today( )").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                name: "today".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_expression("42").unwrap(), Expr::Literal(Value::Int(42)));
        assert_eq!(parse_expression("4.5").unwrap(), Expr::Literal(Value::Float(4.5)));
        assert_eq!(
            parse_expression("'it''s'").unwrap(),
            Expr::Literal(Value::from("it's"))
        );
        assert_eq!(
            parse_expression("\"a\\\"b\"").unwrap(),
            Expr::Literal(Value::from("a\"b"))
        );
        assert_eq!(
            parse_expression("\u{2018}curly\u{2019}").unwrap(),
            Expr::Literal(Value::from("curly"))
        );
        assert_eq!(parse_expression("null").unwrap(), Expr::Literal(Value::Null));
        assert_eq!(parse_expression("#this").unwrap(), Expr::Scope);
        // Only the current scope is addressable
        assert!(matches!(
            parse_expression("#root"),
            Err(Error::ExpressionSyntax { .. })
        ));
    }

    #[test]
    fn test_keywords_need_boundaries() {
        assert_eq!(parse_expression("trueValue").unwrap(), ident("trueValue"));
        assert_eq!(parse_expression("notes").unwrap(), ident("notes"));
        let expr = parse_expression("a or b and not c").unwrap();
        assert_eq!(expr.to_string(), "(a || (b && !c))");
    }

    #[test]
    fn test_parse_conditional() {
        let expr = parse_expression("paid ? 'yes' : 'no'").unwrap();
        assert!(matches!(expr, Expr::Conditional { .. }));
    }

    #[test]
    fn test_parse_sequence() {
        let exprs = parse_sequence("displayParagraphIf(a); replaceWordWith(b);").unwrap();
        assert_eq!(exprs.len(), 2);

        let exprs = parse_sequence("  repeatParagraph(items)\n displayParagraphIf(x > 1)\n").unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[1].to_string(), "displayParagraphIf((x > 1))");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_expression("a +"),
            Err(Error::ExpressionSyntax { .. })
        ));
        assert!(parse_expression("f(a, ").is_err());
        assert!(parse_expression("'unterminated").is_err());
        assert!(parse_expression("").is_err());
        assert!(parse_sequence("").is_err());
    }
}
