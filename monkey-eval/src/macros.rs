//! Macro definition collection and expansion.
//!
//! Both passes run between parsing and the chosen backend, rewriting the
//! AST in place.

use crate::eval::eval_block;
use monkey_parser::ast::{Expr, Stmt};
use monkey_parser::visitor::{walk_expr, Visitor};
use monkey_value::env::{Env, Environment};
use monkey_value::object::{MacroObj, ObjKind};
use monkey_value::Value;

/// Removes every top-level `let NAME = macro(...) {...};` statement from
/// the program and binds the macro under NAME in `env`.
pub fn define_macros(program: &mut Vec<Stmt>, env: &Env) {
    program.retain(|stmt| {
        let (ident, params, body) = match stmt {
            Stmt::Let {
                ident,
                initializer: Expr::Macro { params, body },
            } => (ident, params, body),
            _ => return true,
        };
        env.borrow_mut().set(
            ident.clone(),
            Value::macro_obj(MacroObj {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }),
        );
        false
    });
}

/// Walks the program and replaces every call to a defined macro with the
/// AST its body evaluates to.
pub fn expand_macros(program: &mut [Stmt], env: &Env) {
    let mut expander = MacroExpander { env };
    for stmt in program {
        expander.visit_stmt(stmt);
    }
}

struct MacroExpander<'a> {
    env: &'a Env,
}

impl Visitor for MacroExpander<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);

        if let Some(expansion) = self.expand_call(expr) {
            *expr = expansion;
        }
    }
}

impl MacroExpander<'_> {
    fn expand_call(&self, expr: &Expr) -> Option<Expr> {
        let (callee, args) = match expr {
            Expr::Call { callee, args } => (callee, args),
            _ => return None,
        };
        let ident = match callee.as_ref() {
            Expr::Identifier(ident) => ident,
            _ => return None,
        };
        let macro_obj = self.lookup_macro(ident)?;

        if args.len() != macro_obj.params.len() {
            panic!(
                "wrong number of arguments to macro {}. got={}, want={}",
                ident,
                args.len(),
                macro_obj.params.len()
            );
        }

        // bind each parameter to the QUOTED, unevaluated argument
        let eval_env = Environment::new_enclosed(macro_obj.env.clone());
        for (param, arg) in macro_obj.params.iter().zip(args) {
            eval_env
                .borrow_mut()
                .set(param.clone(), Value::quote(arg.clone()));
        }

        let evaluated = match eval_block(&macro_obj.body, &eval_env) {
            Ok(val) => val,
            Err(err) => panic!("macro evaluation failed: {}", err),
        };
        if let Value::Object(obj) = &evaluated {
            if let ObjKind::Quote(node) = &obj.kind {
                return Some(node.clone());
            }
        }
        panic!("we only support returning AST-nodes from macros");
    }

    /// Resolves `ident` to a macro. A name bound to anything other than
    /// a macro is not a macro call.
    fn lookup_macro(&self, ident: &str) -> Option<MacroObj> {
        match self.env.borrow().get(ident)? {
            Value::Object(obj) => match &obj.kind {
                ObjKind::Macro(macro_obj) => Some(macro_obj.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monkey_parser::parser::Parser;

    fn parse(source: &str) -> Vec<Stmt> {
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        assert!(parser.errors().is_empty());
        program
    }

    fn expand(source: &str) -> Vec<Stmt> {
        let mut program = parse(source);
        let env = Environment::new();
        define_macros(&mut program, &env);
        expand_macros(&mut program, &env);
        program
    }

    fn render(program: &[Stmt]) -> String {
        program
            .iter()
            .map(|stmt| stmt.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_define_macros() {
        let mut program = parse(
            "let number = 1;
             let function = fn(x, y) { x + y };
             let mymacro = macro(x, y) { x + y; };",
        );
        let env = Environment::new();
        define_macros(&mut program, &env);

        assert_eq!(program.len(), 2);
        assert!(env.borrow().get("number").is_none());
        assert!(env.borrow().get("function").is_none());

        let mymacro = env.borrow().get("mymacro").unwrap();
        match mymacro {
            Value::Object(obj) => match &obj.kind {
                ObjKind::Macro(macro_obj) => {
                    assert_eq!(macro_obj.params, vec!["x", "y"]);
                    assert_eq!(render(&macro_obj.body), "(x + y)");
                }
                other => panic!("expected macro, got {}", other),
            },
            other => panic!("expected macro, got {}", other),
        }
    }

    #[test]
    fn test_expand_macros() {
        let program = expand(
            "let infixExpression = macro() { quote(1 + 2); };
             infixExpression();",
        );
        assert_eq!(render(&program), "(1 + 2)");

        let program = expand(
            "let reverse = macro(a, b) { quote(unquote(b) - unquote(a)); };
             reverse(2 + 2, 10 - 5);",
        );
        assert_eq!(render(&program), "((10 - 5) - (2 + 2))");
    }

    #[test]
    fn test_expand_unless_macro() {
        let program = expand(
            r#"let unless = macro(condition, consequence, alternative) {
                   quote(if (!(unquote(condition))) {
                       unquote(consequence);
                   } else {
                       unquote(alternative);
                   });
               };
               unless(10 > 5, puts("not greater"), puts("greater"));"#,
        );
        assert_eq!(
            render(&program),
            r#"if ((!(10 > 5))) { puts(not greater) } else { puts(greater) }"#
        );
    }

    #[test]
    fn test_non_macro_binding_is_not_expanded() {
        let program = expand("let double = fn(x) { x * 2 }; double(2);");
        assert_eq!(render(&program), "let double = fn(x) { (x * 2) }; double(2)");
    }

    #[test]
    fn test_macro_arguments_are_not_evaluated() {
        // the argument would error if evaluated; the macro discards it
        let program = expand(
            "let ignore = macro(x) { quote(1); };
             ignore(undefinedIdentifier + 1);",
        );
        assert_eq!(render(&program), "1");
    }
}
