//! Token sub-grammars for directives and filter atoms, written as nom
//! combinators. Each grammar consumes one whitespace-delimited token; a
//! token that does not parse completely is rejected and the caller drops it
//! with a diagnostic.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{map, opt, rest},
    sequence::preceded,
    IResult,
};

use crate::ast::{Directive, FilterAtom, FilterOp, Literal};

/// Parse one `\key` or `\key=value` directive token.
pub fn parse_directive(token: &str) -> Option<Directive> {
    match directive(token) {
        Ok(("", d)) => Some(d),
        _ => None,
    }
}

fn directive(input: &str) -> IResult<&str, Directive> {
    let (input, _) = char('\\')(input)?;
    let (input, key) = take_while1(|c: char| c != '=')(input)?;
    let (input, value) = opt(preceded(char('='), rest))(input)?;

    Ok((
        input,
        Directive {
            key: key.to_ascii_lowercase(),
            value: value.map(Literal::coerce),
        },
    ))
}

/// Parse one `?`-prefixed filter token into an atom:
/// `?key`, `?!key`, `?key=value`, `?key[value`, `?key>value`, `?key<value`.
pub fn parse_filter_atom(token: &str) -> Option<FilterAtom> {
    match filter_atom(token) {
        Ok(("", atom)) => Some(atom),
        _ => None,
    }
}

fn filter_atom(input: &str) -> IResult<&str, FilterAtom> {
    let (input, _) = char('?')(input)?;
    let (input, negated) = opt(char('!'))(input)?;
    let (input, key) = parse_key(input)?;
    let (input, op_value) = opt(operator_and_value)(input)?;

    let (op, value) = match op_value {
        Some((op, raw)) => (op, Some(Literal::coerce(strip_bracket_suffix(op, raw)))),
        None => (FilterOp::Presence, None),
    };

    Ok((
        input,
        FilterAtom {
            negated: negated.is_some(),
            key: key.to_ascii_lowercase(),
            op,
            value,
        },
    ))
}

/// Key characters run until an operator or end of token.
fn parse_key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !matches!(c, '=' | '[' | '<' | '>'))(input)
}

/// Operator character plus the raw value text after it.
fn operator_and_value(input: &str) -> IResult<&str, (FilterOp, &str)> {
    alt((
        map(preceded(char('='), rest), |v| (FilterOp::Eq, v)),
        map(preceded(char('['), rest), |v| (FilterOp::Contains, v)),
        map(preceded(char('>'), rest), |v| (FilterOp::Gt, v)),
        map(preceded(char('<'), rest), |v| (FilterOp::Lt, v)),
    ))(input)
}

/// `?key[value]` keeps the closing bracket out of the coerced value.
fn strip_bracket_suffix(op: FilterOp, raw: &str) -> &str {
    if op == FilterOp::Contains {
        raw.strip_suffix(']').unwrap_or(raw)
    } else {
        raw
    }
}
