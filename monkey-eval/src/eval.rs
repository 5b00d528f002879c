//! The tree-walking backend.
//!
//! Runtime failures are first-class `Error` values. Internally they
//! travel on the `Err` side of [`EvalResult`] so every sub-evaluation
//! short-circuits with `?`; [`eval_program`] folds them back into the
//! result value.

use monkey_parser::ast::{Expr, Stmt};
use monkey_parser::lexer::Token;
use monkey_value::builtins;
use monkey_value::env::{Env, Environment};
use monkey_value::object::{Function, HashPair, ObjKind};
use monkey_value::Value;
use std::collections::HashMap;
use std::rc::Rc;

use crate::quote::quote;

pub(crate) type EvalResult = Result<Value, Value>;

/// Evaluates a program and returns its result: the value of the final
/// expression statement, an early `return`, or the first error raised.
pub fn eval_program(program: &[Stmt], env: &Env) -> Value {
    let mut result = Value::Null;
    for stmt in program {
        result = match eval_stmt(stmt, env) {
            Ok(val) => val,
            Err(err) => return err,
        };
        if let Value::Object(obj) = &result {
            if let ObjKind::ReturnValue(val) = &obj.kind {
                return val.clone();
            }
        }
    }
    result
}

fn eval_stmt(stmt: &Stmt, env: &Env) -> EvalResult {
    match stmt {
        Stmt::Let { ident, initializer } => {
            let val = eval_expr(initializer, env)?;
            env.borrow_mut().set(ident.clone(), val);
            Ok(Value::Null)
        }
        Stmt::Return(expr) => {
            let val = eval_expr(expr, env)?;
            Ok(Value::return_value(val))
        }
        Stmt::ExprStmt(expr) => eval_expr(expr, env),
        Stmt::Error => unreachable!("the driver aborts evaluation on parse errors"),
    }
}

/// Evaluates the statements of a block. A `ReturnValue` wrapper is
/// passed through untouched so it unwinds up to the enclosing function.
pub(crate) fn eval_block(block: &[Stmt], env: &Env) -> EvalResult {
    let mut result = Value::Null;
    for stmt in block {
        result = eval_stmt(stmt, env)?;
        if let Value::Object(obj) = &result {
            if matches!(obj.kind, ObjKind::ReturnValue(_)) {
                return Ok(result);
            }
        }
    }
    Ok(result)
}

pub(crate) fn eval_expr(expr: &Expr, env: &Env) -> EvalResult {
    match expr {
        Expr::IntLit(val) => Ok(Value::Int(*val)),
        Expr::BoolLit(val) => Ok(Value::Bool(*val)),
        Expr::StringLit(val) => Ok(Value::string(val.clone())),
        Expr::Identifier(ident) => eval_identifier(ident, env),
        Expr::Prefix { op, arg } => {
            let arg = eval_expr(arg, env)?;
            eval_prefix_expr(op, arg)
        }
        Expr::Infix { lhs, op, rhs } => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            eval_infix_expr(op, lhs, rhs)
        }
        Expr::If {
            cond,
            consequence,
            alternative,
        } => {
            let cond = eval_expr(cond, env)?;
            if cond.is_truthy() {
                eval_block(consequence, env)
            } else {
                match alternative {
                    Some(alternative) => eval_block(alternative, env),
                    None => Ok(Value::Null),
                }
            }
        }
        Expr::Fn { params, body } => Ok(Value::function(Function {
            params: params.clone(),
            body: body.clone(),
            env: env.clone(),
        })),
        // a macro literal outside of `let` never survives expansion
        // usefully; it evaluates to nothing
        Expr::Macro { .. } => Ok(Value::Null),
        Expr::Call { callee, args } => {
            if let Expr::Identifier(ident) = callee.as_ref() {
                if ident == "quote" {
                    if args.len() != 1 {
                        return Err(new_error(format!(
                            "wrong number of arguments. got={}, want=1",
                            args.len()
                        )));
                    }
                    return quote(&args[0], env);
                }
            }
            let function = eval_expr(callee, env)?;
            let args = eval_exprs(args, env)?;
            apply_function(function, args)
        }
        Expr::ArrayLit(elems) => {
            let elems = eval_exprs(elems, env)?;
            Ok(Value::array(elems))
        }
        Expr::HashLit(pairs) => eval_hash_literal(pairs, env),
        Expr::Index { obj, index } => {
            let obj = eval_expr(obj, env)?;
            let index = eval_expr(index, env)?;
            eval_index_expr(obj, index)
        }
        Expr::Error => unreachable!("the driver aborts evaluation on parse errors"),
    }
}

fn eval_exprs(exprs: &[Expr], env: &Env) -> Result<Vec<Value>, Value> {
    exprs.iter().map(|expr| eval_expr(expr, env)).collect()
}

fn eval_identifier(ident: &str, env: &Env) -> EvalResult {
    if let Some(val) = env.borrow().get(ident) {
        return Ok(val);
    }
    if let Some(builtin) = builtins::lookup(ident) {
        return Ok(Value::native_fn(builtin));
    }
    Err(new_error(format!("identifier not found: {}", ident)))
}

fn eval_prefix_expr(op: &Token, arg: Value) -> EvalResult {
    match op {
        Token::LogicalNot => Ok(Value::Bool(!arg.is_truthy())),
        Token::Minus => match arg {
            Value::Int(val) => Ok(Value::Int(-val)),
            _ => Err(new_error(format!(
                "unknown operator: -{}",
                arg.type_name()
            ))),
        },
        _ => Err(new_error(format!(
            "unknown operator: {}{}",
            op,
            arg.type_name()
        ))),
    }
}

fn eval_infix_expr(op: &Token, lhs: Value, rhs: Value) -> EvalResult {
    match (&lhs, &rhs) {
        (Value::Int(l), Value::Int(r)) => eval_integer_infix_expr(op, *l, *r),
        (Value::Object(lo), Value::Object(ro))
            if matches!(lo.kind, ObjKind::Str(_)) && matches!(ro.kind, ObjKind::Str(_)) =>
        {
            eval_string_infix_expr(op, &lhs, &rhs)
        }
        _ => match op {
            // non-integers compare by identity
            Token::EqualsEquals => Ok(Value::Bool(object_identity(&lhs, &rhs))),
            Token::NotEquals => Ok(Value::Bool(!object_identity(&lhs, &rhs))),
            _ if lhs.type_name() != rhs.type_name() => Err(new_error(format!(
                "type mismatch: {} {} {}",
                lhs.type_name(),
                op,
                rhs.type_name()
            ))),
            _ => Err(new_error(format!(
                "unknown operator: {} {} {}",
                lhs.type_name(),
                op,
                rhs.type_name()
            ))),
        },
    }
}

fn eval_integer_infix_expr(op: &Token, lhs: i64, rhs: i64) -> EvalResult {
    match op {
        Token::Plus => Ok(Value::Int(lhs + rhs)),
        Token::Minus => Ok(Value::Int(lhs - rhs)),
        Token::Asterisk => Ok(Value::Int(lhs * rhs)),
        Token::Slash => Ok(Value::Int(lhs / rhs)),
        Token::LessThan => Ok(Value::Bool(lhs < rhs)),
        Token::GreaterThan => Ok(Value::Bool(lhs > rhs)),
        Token::EqualsEquals => Ok(Value::Bool(lhs == rhs)),
        Token::NotEquals => Ok(Value::Bool(lhs != rhs)),
        _ => Err(new_error(format!(
            "unknown operator: INTEGER {} INTEGER",
            op
        ))),
    }
}

fn eval_string_infix_expr(op: &Token, lhs: &Value, rhs: &Value) -> EvalResult {
    if *op != Token::Plus {
        return Err(new_error(format!("unknown operator: STRING {} STRING", op)));
    }
    let concatenated = format!(
        "{}{}",
        lhs.cast_to_str().unwrap(),
        rhs.cast_to_str().unwrap()
    );
    Ok(Value::string(concatenated))
}

fn object_identity(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Null, Value::Null) => true,
        (Value::Object(l), Value::Object(r)) => Rc::ptr_eq(l, r),
        _ => false,
    }
}

pub(crate) fn apply_function(function: Value, args: Vec<Value>) -> EvalResult {
    let obj = match &function {
        Value::Object(obj) => obj,
        _ => {
            return Err(new_error(format!(
                "not a function: {}",
                function.type_name()
            )))
        }
    };
    match &obj.kind {
        ObjKind::Fn(function) => {
            if args.len() != function.params.len() {
                return Err(new_error(format!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    function.params.len()
                )));
            }
            let env = Environment::new_enclosed(function.env.clone());
            for (param, arg) in function.params.iter().zip(args) {
                env.borrow_mut().set(param.clone(), arg);
            }
            let evaluated = eval_block(&function.body, &env)?;
            Ok(unwrap_return_value(evaluated))
        }
        ObjKind::NativeFn(native) => {
            let result = (native.func)(&args);
            if result.is_error() {
                Err(result)
            } else {
                Ok(result)
            }
        }
        _ => Err(new_error(format!(
            "not a function: {}",
            function.type_name()
        ))),
    }
}

fn unwrap_return_value(val: Value) -> Value {
    if let Value::Object(obj) = &val {
        if let ObjKind::ReturnValue(inner) = &obj.kind {
            return inner.clone();
        }
    }
    val
}

fn eval_hash_literal(pairs: &[(Expr, Expr)], env: &Env) -> EvalResult {
    let mut hash = HashMap::new();
    for (key_expr, value_expr) in pairs {
        let key = eval_expr(key_expr, env)?;
        let hash_key = key
            .hash_key()
            .ok_or_else(|| new_error(format!("unusable as hash key: {}", key.type_name())))?;
        let value = eval_expr(value_expr, env)?;
        hash.insert(hash_key, HashPair { key, value });
    }
    Ok(Value::hash(hash))
}

fn eval_index_expr(obj: Value, index: Value) -> EvalResult {
    if let Value::Object(o) = &obj {
        match &o.kind {
            ObjKind::Array(elems) => {
                if let Value::Int(i) = index {
                    let elem = if i < 0 || i as usize >= elems.len() {
                        Value::Null
                    } else {
                        elems[i as usize].clone()
                    };
                    return Ok(elem);
                }
            }
            ObjKind::Hash(pairs) => {
                let hash_key = index.hash_key().ok_or_else(|| {
                    new_error(format!("unusable as hash key: {}", index.type_name()))
                })?;
                return Ok(pairs
                    .get(&hash_key)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Value::Null));
            }
            _ => {}
        }
    }
    Err(new_error(format!(
        "index operator not supported: {}",
        obj.type_name()
    )))
}

pub(crate) fn new_error(message: String) -> Value {
    Value::error(message)
}
