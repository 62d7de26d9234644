use evalexpr::{
    ContextWithMutableFunctions, ContextWithMutableVariables, EvalexprError, Function,
    HashMapContext, Value as EvalValue, eval_with_context,
};
use regex::Regex;

use crate::{
    data::{HostVars, VarValue, value_from_evalexpr, value_to_evalexpr},
    error::{InventoryError, Result},
};

/// Evaluates `compose`, `groups` and `keyed_groups` expressions against a
/// host's variables.
pub trait Evaluator {
    fn evaluate(&self, expression: &str, vars: &HostVars) -> Result<VarValue>;
}

/// [`Evaluator`] backed by `evalexpr`.
///
/// Host variables are bound by name; `null` values are bound as the empty
/// value. The helpers `lowercase`, `uppercase`, `trim` and `regex_replace` are
/// available in every expression.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExprEvaluator;

impl Evaluator for ExprEvaluator {
    fn evaluate(&self, expression: &str, vars: &HostVars) -> Result<VarValue> {
        let context = build_context(vars).map_err(|err| expression_error(expression, err))?;
        let value =
            eval_with_context(expression, &context).map_err(|err| expression_error(expression, err))?;
        Ok(value_from_evalexpr(value))
    }
}

fn expression_error(expression: &str, err: EvalexprError) -> InventoryError {
    InventoryError::Expression {
        expression: expression.to_string(),
        message: err.to_string(),
    }
}

pub fn build_context(vars: &HostVars) -> std::result::Result<HashMapContext, EvalexprError> {
    let mut context: HashMapContext = HashMapContext::new();
    register_string_functions(&mut context)?;
    for (name, value) in vars {
        context.set_value(name.clone(), value_to_evalexpr(value))?;
    }
    Ok(context)
}

fn register_string_functions(context: &mut HashMapContext) -> std::result::Result<(), EvalexprError> {
    context.set_function(
        "lowercase".into(),
        Function::new(|arguments| {
            let args = expect_args(arguments, 1, "lowercase")?;
            let value = expect_string(&args[0], "value")?;
            Ok(EvalValue::String(value.to_lowercase()))
        }),
    )?;

    context.set_function(
        "uppercase".into(),
        Function::new(|arguments| {
            let args = expect_args(arguments, 1, "uppercase")?;
            let value = expect_string(&args[0], "value")?;
            Ok(EvalValue::String(value.to_uppercase()))
        }),
    )?;

    context.set_function(
        "trim".into(),
        Function::new(|arguments| {
            let args = expect_args(arguments, 1, "trim")?;
            let value = expect_string(&args[0], "value")?;
            Ok(EvalValue::String(value.trim().to_string()))
        }),
    )?;

    context.set_function(
        "regex_replace".into(),
        Function::new(|arguments| {
            let args = expect_args(arguments, 3, "regex_replace")?;
            let value = expect_string(&args[0], "value")?;
            let pattern = expect_string(&args[1], "pattern")?;
            let replacement = expect_string(&args[2], "replacement")?;
            let regex = Regex::new(pattern)
                .map_err(|err| eval_error(&format!("Invalid regex: {err}")))?;
            Ok(EvalValue::String(
                regex.replace_all(value, replacement).into_owned(),
            ))
        }),
    )?;

    Ok(())
}

fn expect_args(
    arguments: &EvalValue,
    expected: usize,
    name: &str,
) -> std::result::Result<Vec<EvalValue>, EvalexprError> {
    match arguments {
        value if expected == 1 && !matches!(value, EvalValue::Tuple(_)) => Ok(vec![value.clone()]),
        EvalValue::Tuple(values) => {
            if values.len() != expected {
                return Err(EvalexprError::wrong_function_argument_amount(
                    values.len(),
                    expected,
                ));
            }
            Ok(values.clone())
        }
        _ => Err(eval_error(&format!(
            "{name} expects {expected} arguments provided as a tuple"
        ))),
    }
}

fn eval_error(message: &str) -> EvalexprError {
    EvalexprError::CustomMessage(message.to_string())
}

fn expect_string<'a>(value: &'a EvalValue, name: &str) -> std::result::Result<&'a str, EvalexprError> {
    if let EvalValue::String(s) = value {
        Ok(s)
    } else {
        Err(eval_error(&format!("Expected string for {name}")))
    }
}
