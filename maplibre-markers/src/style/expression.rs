//! Expression language for dynamic style values.
//!
//! Expressions use the JSON array syntax of the MapLibre style specification, for example
//! `["interpolate", ["linear"], ["zoom"], 10, 1, 15, 4]`. They are compiled once into an
//! [`Expression`] tree and evaluated against an [`EvaluationContext`] on every build.

use std::cmp::Ordering;

use serde_json::{Number, Value};
use thiserror::Error;

use crate::{geometry::Properties, style::param::parse_color};

#[derive(Error, Debug, PartialEq)]
pub enum ExpressionError {
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("`{op}` expects {expected}")]
    Arity { op: String, expected: &'static str },
    #[error("`{op}`: {reason}")]
    InvalidArgument { op: String, reason: &'static str },
}

/// Values an expression can read.
pub struct EvaluationContext<'a> {
    pub zoom: f32,
    pub properties: &'a Properties,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Min,
    Max,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Interpolation {
    Linear,
    Exponential(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Literal(Value),
    Zoom,
    Get(String),
    Has(String),
    Not(Box<Expression>),
    All(Vec<Expression>),
    Any(Vec<Expression>),
    Compare(CompareOp, Box<Expression>, Box<Expression>),
    Arithmetic(ArithmeticOp, Vec<Expression>),
    Case {
        branches: Vec<(Expression, Expression)>,
        fallback: Box<Expression>,
    },
    Match {
        input: Box<Expression>,
        arms: Vec<(Vec<Value>, Expression)>,
        fallback: Box<Expression>,
    },
    Coalesce(Vec<Expression>),
    Step {
        input: Box<Expression>,
        base: Box<Expression>,
        stops: Vec<(f64, Expression)>,
    },
    Interpolate {
        interpolation: Interpolation,
        input: Box<Expression>,
        stops: Vec<(f64, Expression)>,
    },
}

impl Expression {
    /// Returns `true` if `value` looks like an expression rather than a constant.
    pub fn is_expression(value: &Value) -> bool {
        value
            .as_array()
            .and_then(|arr| arr.first())
            .map_or(false, Value::is_string)
    }

    pub fn parse_str(source: &str) -> Result<Expression, ExpressionError> {
        let value: Value =
            serde_json::from_str(source).map_err(|_| ExpressionError::InvalidArgument {
                op: source.to_string(),
                reason: "not valid JSON",
            })?;
        Expression::parse(&value)
    }

    pub fn parse(value: &Value) -> Result<Expression, ExpressionError> {
        let Some(arr) = value.as_array() else {
            return Ok(Expression::Literal(value.clone()));
        };
        let Some(op) = arr.first().and_then(Value::as_str) else {
            return Ok(Expression::Literal(value.clone()));
        };
        let args = &arr[1..];

        let expression = match op {
            "literal" => Expression::Literal(exactly(op, args, 1)?[0].clone()),
            "zoom" => {
                exactly(op, args, 0)?;
                Expression::Zoom
            }
            "get" => Expression::Get(string_arg(op, exactly(op, args, 1)?)?),
            "has" => Expression::Has(string_arg(op, exactly(op, args, 1)?)?),
            "!" => Expression::Not(Box::new(Expression::parse(&exactly(op, args, 1)?[0])?)),
            "all" => Expression::All(parse_all(args)?),
            "any" => Expression::Any(parse_all(args)?),
            "==" | "!=" | "<" | "<=" | ">" | ">=" => {
                let args = exactly(op, args, 2)?;
                let compare = match op {
                    "==" => CompareOp::Eq,
                    "!=" => CompareOp::Ne,
                    "<" => CompareOp::Lt,
                    "<=" => CompareOp::Le,
                    ">" => CompareOp::Gt,
                    _ => CompareOp::Ge,
                };
                Expression::Compare(
                    compare,
                    Box::new(Expression::parse(&args[0])?),
                    Box::new(Expression::parse(&args[1])?),
                )
            }
            "+" | "-" | "*" | "/" | "%" | "^" | "min" | "max" => {
                let arithmetic = match op {
                    "+" => ArithmeticOp::Add,
                    "-" => ArithmeticOp::Sub,
                    "*" => ArithmeticOp::Mul,
                    "/" => ArithmeticOp::Div,
                    "%" => ArithmeticOp::Rem,
                    "^" => ArithmeticOp::Pow,
                    "min" => ArithmeticOp::Min,
                    _ => ArithmeticOp::Max,
                };
                let valid = match arithmetic {
                    ArithmeticOp::Sub => args.len() == 1 || args.len() == 2,
                    ArithmeticOp::Div | ArithmeticOp::Rem | ArithmeticOp::Pow => args.len() == 2,
                    _ => !args.is_empty(),
                };
                if !valid {
                    return Err(ExpressionError::Arity {
                        op: op.to_string(),
                        expected: "a valid number of operands",
                    });
                }
                Expression::Arithmetic(arithmetic, parse_all(args)?)
            }
            "case" => {
                if args.len() < 3 || args.len() % 2 == 0 {
                    return Err(ExpressionError::Arity {
                        op: op.to_string(),
                        expected: "condition/output pairs and a fallback",
                    });
                }
                let (pairs, fallback) = args.split_at(args.len() - 1);
                let branches = pairs
                    .chunks(2)
                    .map(|pair| Ok((Expression::parse(&pair[0])?, Expression::parse(&pair[1])?)))
                    .collect::<Result<Vec<_>, ExpressionError>>()?;
                Expression::Case {
                    branches,
                    fallback: Box::new(Expression::parse(&fallback[0])?),
                }
            }
            "match" => {
                if args.len() < 4 || args.len() % 2 != 0 {
                    return Err(ExpressionError::Arity {
                        op: op.to_string(),
                        expected: "an input, label/output pairs and a fallback",
                    });
                }
                let input = Expression::parse(&args[0])?;
                let (pairs, fallback) = args[1..].split_at(args.len() - 2);
                let arms = pairs
                    .chunks(2)
                    .map(|pair| {
                        let labels = match &pair[0] {
                            Value::Array(labels) => labels.clone(),
                            label => vec![label.clone()],
                        };
                        Ok((labels, Expression::parse(&pair[1])?))
                    })
                    .collect::<Result<Vec<_>, ExpressionError>>()?;
                Expression::Match {
                    input: Box::new(input),
                    arms,
                    fallback: Box::new(Expression::parse(&fallback[0])?),
                }
            }
            "coalesce" => Expression::Coalesce(parse_all(args)?),
            "step" => {
                if args.len() < 2 || args.len() % 2 != 0 {
                    return Err(ExpressionError::Arity {
                        op: op.to_string(),
                        expected: "an input, a base output and stop/output pairs",
                    });
                }
                Expression::Step {
                    input: Box::new(Expression::parse(&args[0])?),
                    base: Box::new(Expression::parse(&args[1])?),
                    stops: parse_stops(op, &args[2..])?,
                }
            }
            "interpolate" => {
                if args.len() < 4 || args.len() % 2 != 0 {
                    return Err(ExpressionError::Arity {
                        op: op.to_string(),
                        expected: "an interpolation type, an input and stop/output pairs",
                    });
                }
                Expression::Interpolate {
                    interpolation: parse_interpolation(&args[0])?,
                    input: Box::new(Expression::parse(&args[1])?),
                    stops: parse_stops(op, &args[2..])?,
                }
            }
            _ => return Err(ExpressionError::UnknownOperator(op.to_string())),
        };

        Ok(expression)
    }

    /// Evaluates the expression. `None` means the expression produced no usable value,
    /// e.g. arithmetic on a missing property.
    pub fn evaluate(&self, context: &EvaluationContext) -> Option<Value> {
        match self {
            Expression::Literal(value) => Some(value.clone()),
            Expression::Zoom => number(context.zoom as f64),
            Expression::Get(name) => Some(
                context
                    .properties
                    .get(name)
                    .cloned()
                    .unwrap_or(Value::Null),
            ),
            Expression::Has(name) => Some(Value::Bool(context.properties.contains_key(name))),
            Expression::Not(inner) => Some(Value::Bool(!truthy(&inner.evaluate(context)?))),
            Expression::All(all) => {
                for expression in all {
                    if !truthy(&expression.evaluate(context)?) {
                        return Some(Value::Bool(false));
                    }
                }
                Some(Value::Bool(true))
            }
            Expression::Any(any) => {
                for expression in any {
                    if truthy(&expression.evaluate(context)?) {
                        return Some(Value::Bool(true));
                    }
                }
                Some(Value::Bool(false))
            }
            Expression::Compare(op, lhs, rhs) => {
                let lhs = lhs.evaluate(context)?;
                let rhs = rhs.evaluate(context)?;
                let result = match op {
                    CompareOp::Eq => values_equal(&lhs, &rhs),
                    CompareOp::Ne => !values_equal(&lhs, &rhs),
                    _ => {
                        let ordering = compare_values(&lhs, &rhs)?;
                        match op {
                            CompareOp::Lt => ordering == Ordering::Less,
                            CompareOp::Le => ordering != Ordering::Greater,
                            CompareOp::Gt => ordering == Ordering::Greater,
                            _ => ordering != Ordering::Less,
                        }
                    }
                };
                Some(Value::Bool(result))
            }
            Expression::Arithmetic(op, operands) => {
                let values = operands
                    .iter()
                    .map(|operand| operand.evaluate(context)?.as_f64())
                    .collect::<Option<Vec<f64>>>()?;
                let result = match (op, values.as_slice()) {
                    (ArithmeticOp::Sub, [a]) => -a,
                    (ArithmeticOp::Sub, [a, b]) => a - b,
                    (ArithmeticOp::Div, [a, b]) => a / b,
                    (ArithmeticOp::Rem, [a, b]) => a % b,
                    (ArithmeticOp::Pow, [a, b]) => a.powf(*b),
                    (ArithmeticOp::Add, values) => values.iter().sum(),
                    (ArithmeticOp::Mul, values) => values.iter().product(),
                    (ArithmeticOp::Min, values) => values.iter().copied().fold(f64::INFINITY, f64::min),
                    (ArithmeticOp::Max, values) => {
                        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                    }
                    _ => return None,
                };
                number(result)
            }
            Expression::Case { branches, fallback } => {
                for (condition, output) in branches {
                    if truthy(&condition.evaluate(context)?) {
                        return output.evaluate(context);
                    }
                }
                fallback.evaluate(context)
            }
            Expression::Match {
                input,
                arms,
                fallback,
            } => {
                let input = input.evaluate(context)?;
                arms.iter()
                    .find(|(labels, _)| labels.iter().any(|label| values_equal(label, &input)))
                    .map_or(fallback.as_ref(), |(_, output)| output)
                    .evaluate(context)
            }
            Expression::Coalesce(expressions) => expressions
                .iter()
                .filter_map(|expression| expression.evaluate(context))
                .find(|value| !value.is_null()),
            Expression::Step { input, base, stops } => {
                let input = input.evaluate(context)?.as_f64()?;
                stops
                    .iter()
                    .rev()
                    .find(|(stop, _)| *stop <= input)
                    .map_or(base.as_ref(), |(_, output)| output)
                    .evaluate(context)
            }
            Expression::Interpolate {
                interpolation,
                input,
                stops,
            } => {
                let input = input.evaluate(context)?.as_f64()?;
                let upper = stops.partition_point(|(stop, _)| *stop <= input);
                if upper == 0 {
                    return stops[0].1.evaluate(context);
                }
                if upper == stops.len() {
                    return stops[upper - 1].1.evaluate(context);
                }
                let (z0, lower_output) = &stops[upper - 1];
                let (z1, upper_output) = &stops[upper];
                let t = interpolation_factor(*interpolation, input, *z0, *z1);
                interpolate_values(
                    &lower_output.evaluate(context)?,
                    &upper_output.evaluate(context)?,
                    t,
                )
            }
        }
    }
}

fn exactly<'a>(op: &str, args: &'a [Value], n: usize) -> Result<&'a [Value], ExpressionError> {
    if args.len() == n {
        Ok(args)
    } else {
        Err(ExpressionError::Arity {
            op: op.to_string(),
            expected: match n {
                0 => "no arguments",
                1 => "one argument",
                _ => "two arguments",
            },
        })
    }
}

fn string_arg(op: &str, args: &[Value]) -> Result<String, ExpressionError> {
    args[0]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ExpressionError::InvalidArgument {
            op: op.to_string(),
            reason: "expected a property name",
        })
}

fn parse_all(args: &[Value]) -> Result<Vec<Expression>, ExpressionError> {
    args.iter().map(Expression::parse).collect()
}

fn parse_stops(op: &str, args: &[Value]) -> Result<Vec<(f64, Expression)>, ExpressionError> {
    let mut stops = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks(2) {
        let stop = pair[0].as_f64().ok_or_else(|| ExpressionError::InvalidArgument {
            op: op.to_string(),
            reason: "stop inputs must be numbers",
        })?;
        if stops.last().map_or(false, |(previous, _)| *previous >= stop) {
            return Err(ExpressionError::InvalidArgument {
                op: op.to_string(),
                reason: "stop inputs must be strictly ascending",
            });
        }
        stops.push((stop, Expression::parse(&pair[1])?));
    }
    Ok(stops)
}

fn parse_interpolation(value: &Value) -> Result<Interpolation, ExpressionError> {
    let invalid = || ExpressionError::InvalidArgument {
        op: "interpolate".to_string(),
        reason: "expected [\"linear\"] or [\"exponential\", base]",
    };
    let arr = value.as_array().ok_or_else(invalid)?;
    match (arr.first().and_then(Value::as_str), arr.get(1)) {
        (Some("linear"), None) => Ok(Interpolation::Linear),
        (Some("exponential"), Some(base)) => {
            Ok(Interpolation::Exponential(base.as_f64().ok_or_else(invalid)?))
        }
        _ => Err(invalid()),
    }
}

fn interpolation_factor(interpolation: Interpolation, input: f64, z0: f64, z1: f64) -> f64 {
    let difference = z1 - z0;
    let progress = input - z0;
    match interpolation {
        Interpolation::Exponential(base) if base != 1.0 => {
            (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
        }
        _ => progress / difference,
    }
}

fn interpolate_values(a: &Value, b: &Value, t: f64) -> Option<Value> {
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return number(a + (b - a) * t);
    }

    // Colors interpolate as RGBA arrays.
    let a = parse_color(a)?;
    let b = parse_color(b)?;
    let components = a
        .iter()
        .zip(b.iter())
        .map(|(a, b)| number(*a as f64 + (*b as f64 - *a as f64) * t))
        .collect::<Option<Vec<_>>>()?;
    Some(Value::Array(components))
}

fn number(n: f64) -> Option<Value> {
    Number::from_f64(n).map(Value::Number)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use serde_json::{json, Value};

    use super::*;

    fn eval(expression: Value, zoom: f32, properties: &Properties) -> Option<Value> {
        Expression::parse(&expression)
            .unwrap()
            .evaluate(&EvaluationContext { zoom, properties })
    }

    fn eval_f64(expression: Value, zoom: f32) -> f64 {
        eval(expression, zoom, &Properties::new())
            .unwrap()
            .as_f64()
            .unwrap()
    }

    #[test]
    fn test_constants_are_literals() {
        assert_eq!(
            Expression::parse(&json!(3)).unwrap(),
            Expression::Literal(json!(3))
        );
        assert_eq!(
            Expression::parse(&json!([1, 0, 0])).unwrap(),
            Expression::Literal(json!([1, 0, 0]))
        );
        assert!(!Expression::is_expression(&json!([1, 0, 0])));
        assert!(Expression::is_expression(&json!(["zoom"])));
    }

    #[test]
    fn test_linear_interpolation_over_zoom() {
        let expr = json!(["interpolate", ["linear"], ["zoom"], 10, 1, 15, 4]);
        assert_abs_diff_eq!(eval_f64(expr.clone(), 5.0), 1.0);
        assert_abs_diff_eq!(eval_f64(expr.clone(), 12.5), 2.5);
        assert_abs_diff_eq!(eval_f64(expr, 18.0), 4.0);
    }

    #[test]
    fn test_exponential_interpolation() {
        let expr = json!(["interpolate", ["exponential", 2], ["zoom"], 0, 0, 2, 3]);
        // (2^1 - 1) / (2^2 - 1) = 1/3
        assert_abs_diff_eq!(eval_f64(expr, 1.0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_color_interpolation() {
        let expr = json!(["interpolate", ["linear"], ["zoom"], 0, "#000000", 10, "#ffffff"]);
        let color = eval(expr, 5.0, &Properties::new()).unwrap();
        assert_eq!(color, json!([0.5, 0.5, 0.5, 1.0]));
    }

    #[test]
    fn test_step() {
        let expr = json!(["step", ["zoom"], 1, 10, 2, 14, 3]);
        assert_abs_diff_eq!(eval_f64(expr.clone(), 9.0), 1.0);
        assert_abs_diff_eq!(eval_f64(expr.clone(), 10.0), 2.0);
        assert_abs_diff_eq!(eval_f64(expr, 20.0), 3.0);
    }

    #[test]
    fn test_match_on_property() {
        let mut properties = Properties::new();
        properties.insert("kind".to_string(), json!("ARM"));

        let expr = json!(["match", ["get", "kind"], ["ARM", "ATG"], "red", "blue"]);
        assert_eq!(eval(expr.clone(), 0.0, &properties), Some(json!("red")));
        assert_eq!(eval(expr, 0.0, &Properties::new()), Some(json!("blue")));
    }

    #[test]
    fn test_filter_on_zoom() {
        let expr = json!(["all", [">=", ["zoom"], 10], ["<", ["zoom"], 15]]);
        assert_eq!(eval(expr.clone(), 12.0, &Properties::new()), Some(json!(true)));
        assert_eq!(eval(expr, 16.0, &Properties::new()), Some(json!(false)));
    }

    #[test]
    fn test_arithmetic() {
        assert_abs_diff_eq!(eval_f64(json!(["*", ["zoom"], 2]), 3.0), 6.0);
        assert_abs_diff_eq!(eval_f64(json!(["-", 5]), 0.0), -5.0);
        assert_abs_diff_eq!(eval_f64(json!(["max", 1, 7, 3]), 0.0), 7.0);
    }

    #[test]
    fn test_arithmetic_on_missing_property_fails() {
        assert_eq!(
            eval(json!(["+", ["get", "missing"], 1]), 0.0, &Properties::new()),
            None
        );
    }

    #[test]
    fn test_case_and_coalesce() {
        let mut properties = Properties::new();
        properties.insert("rank".to_string(), json!(3));

        let case = json!(["case", [">", ["get", "rank"], 2], "big", "small"]);
        assert_eq!(eval(case, 0.0, &properties), Some(json!("big")));

        let coalesce = json!(["coalesce", ["get", "name"], "unnamed"]);
        assert_eq!(eval(coalesce, 0.0, &properties), Some(json!("unnamed")));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Expression::parse(&json!(["frobnicate", 1])),
            Err(ExpressionError::UnknownOperator("frobnicate".to_string()))
        );
        assert!(Expression::parse(&json!(["get"])).is_err());
        assert!(Expression::parse(&json!(["interpolate", ["cubic"], ["zoom"], 0, 1])).is_err());
        assert!(Expression::parse(&json!(["step", ["zoom"], 0, 5, 1, 3, 2])).is_err());
        assert!(Expression::parse_str("not json").is_err());
    }
}
