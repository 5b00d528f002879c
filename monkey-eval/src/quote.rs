//! `quote` / `unquote` support.

use crate::eval::{eval_expr, EvalResult};
use monkey_parser::ast::Expr;
use monkey_parser::visitor::{walk_expr, Visitor};
use monkey_value::env::Env;
use monkey_value::object::ObjKind;
use monkey_value::Value;

/// Evaluates `quote(expr)`: the argument is left unevaluated except for
/// `unquote(inner)` calls, each of which is replaced by the AST of its
/// evaluated inner expression.
pub(crate) fn quote(expr: &Expr, env: &Env) -> EvalResult {
    let mut node = expr.clone();
    let mut rewriter = UnquoteRewriter { env };
    rewriter.visit_expr(&mut node);
    Ok(Value::quote(node))
}

struct UnquoteRewriter<'a> {
    env: &'a Env,
}

impl Visitor for UnquoteRewriter<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);

        let arg = match unquote_call_arg(expr) {
            Some(arg) => arg,
            None => return,
        };
        if let Ok(val) = eval_expr(&arg, self.env) {
            if let Some(node) = value_to_ast(&val) {
                *expr = node;
            }
        }
    }
}

fn unquote_call_arg(expr: &Expr) -> Option<Expr> {
    if let Expr::Call { callee, args } = expr {
        if matches!(callee.as_ref(), Expr::Identifier(ident) if ident == "unquote")
            && args.len() == 1
        {
            return Some(args[0].clone());
        }
    }
    None
}

/// Converts an evaluated object back into syntax. Only integers,
/// booleans and quotes have an AST form.
fn value_to_ast(val: &Value) -> Option<Expr> {
    match val {
        Value::Int(v) => Some(Expr::IntLit(*v)),
        Value::Bool(v) => Some(Expr::BoolLit(*v)),
        Value::Object(obj) => match &obj.kind {
            ObjKind::Quote(node) => Some(node.clone()),
            _ => None,
        },
        _ => None,
    }
}
