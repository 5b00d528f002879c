//! Visitor pattern for AST nodes.
//!
//! Nodes are visited mutably so a visitor may rewrite the tree in place
//! (the macro expander replaces whole call expressions this way).

use crate::ast::{Expr, Stmt};

pub trait Visitor: Sized {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }
}

pub fn walk_expr(visitor: &mut impl Visitor, expr: &mut Expr) {
    match expr {
        Expr::IntLit(_) => {}
        Expr::BoolLit(_) => {}
        Expr::StringLit(_) => {}
        Expr::Identifier(_) => {}
        Expr::Prefix { op: _, arg } => visitor.visit_expr(arg),
        Expr::Infix { lhs, op: _, rhs } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        Expr::If {
            cond,
            consequence,
            alternative,
        } => {
            visitor.visit_expr(cond);
            for stmt in consequence {
                visitor.visit_stmt(stmt);
            }
            if let Some(alternative) = alternative {
                for stmt in alternative {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Expr::Fn { params: _, body } | Expr::Macro { params: _, body } => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        Expr::Call { callee, args } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Expr::ArrayLit(elems) => {
            for elem in elems {
                visitor.visit_expr(elem);
            }
        }
        Expr::HashLit(pairs) => {
            for (key, value) in pairs {
                visitor.visit_expr(key);
                visitor.visit_expr(value);
            }
        }
        Expr::Index { obj, index } => {
            visitor.visit_expr(obj);
            visitor.visit_expr(index);
        }
        Expr::Error => {}
    }
}

pub fn walk_stmt(visitor: &mut impl Visitor, stmt: &mut Stmt) {
    match stmt {
        Stmt::Let {
            ident: _,
            initializer,
        } => visitor.visit_expr(initializer),
        Stmt::Return(expr) => visitor.visit_expr(expr),
        Stmt::ExprStmt(expr) => visitor.visit_expr(expr),
        Stmt::Error => {}
    }
}
