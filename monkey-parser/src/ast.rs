use crate::lexer::Token;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    BoolLit(bool),
    StringLit(String),
    /// An identifier (e.g. `foo`).
    Identifier(String),
    /// A unary expression (e.g. `-1`, `!ok`).
    Prefix {
        op: Token,
        arg: Box<Expr>,
    },
    /// A binary expression (e.g. `1 + 1`).
    Infix {
        lhs: Box<Expr>,
        op: Token,
        rhs: Box<Expr>,
    },
    /// An `if` expression. Both branches are blocks and the whole
    /// expression produces the value of the taken branch.
    If {
        cond: Box<Expr>,
        consequence: Vec<Stmt>,
        alternative: Option<Vec<Stmt>>,
    },
    /// A function literal (e.g. `fn(a, b) { a + b }`).
    Fn {
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    /// A macro literal (e.g. `macro(x) { quote(unquote(x) + 1) }`).
    Macro {
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    /// A call expression. The callee is an arbitrary expression
    /// (e.g. `foo(1)`, `fn(x) { x }(2)`).
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    ArrayLit(Vec<Expr>),
    /// A hash literal. Entries keep their source order; any ordering
    /// needed downstream is imposed there.
    HashLit(Vec<(Expr, Expr)>),
    Index {
        obj: Box<Expr>,
        index: Box<Expr>,
    },
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let { ident: String, initializer: Expr },
    Return(Expr),
    ExprStmt(Expr),
    Error,
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    sep: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, body: &[Stmt]) -> fmt::Result {
    write!(f, "{{ ")?;
    write_joined(f, body, " ")?;
    write!(f, " }}")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLit(val) => write!(f, "{}", val),
            Expr::BoolLit(val) => write!(f, "{}", val),
            Expr::StringLit(val) => write!(f, "{}", val),
            Expr::Identifier(ident) => write!(f, "{}", ident),
            Expr::Prefix { op, arg } => write!(f, "({}{})", op, arg),
            Expr::Infix { lhs, op, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) ", cond)?;
                write_block(f, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else ")?;
                    write_block(f, alternative)?;
                }
                Ok(())
            }
            Expr::Fn { params, body } => {
                write!(f, "fn(")?;
                write_joined(f, params, ", ")?;
                write!(f, ") ")?;
                write_block(f, body)
            }
            Expr::Macro { params, body } => {
                write!(f, "macro(")?;
                write_joined(f, params, ", ")?;
                write!(f, ") ")?;
                write_block(f, body)
            }
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_joined(f, args, ", ")?;
                write!(f, ")")
            }
            Expr::ArrayLit(elems) => {
                write!(f, "[")?;
                write_joined(f, elems, ", ")?;
                write!(f, "]")
            }
            Expr::HashLit(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Expr::Index { obj, index } => write!(f, "({}[{}])", obj, index),
            Expr::Error => write!(f, "<error>"),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { ident, initializer } => write!(f, "let {} = {};", ident, initializer),
            Stmt::Return(expr) => write!(f, "return {};", expr),
            Stmt::ExprStmt(expr) => write!(f, "{}", expr),
            Stmt::Error => write!(f, "<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_let() {
        let stmt = Stmt::Let {
            ident: "myVar".to_string(),
            initializer: Expr::Identifier("anotherVar".to_string()),
        };
        assert_eq!(stmt.to_string(), "let myVar = anotherVar;");
    }

    #[test]
    fn test_render_nested_expr() {
        let expr = Expr::Infix {
            lhs: Box::new(Expr::Prefix {
                op: Token::Minus,
                arg: Box::new(Expr::IntLit(1)),
            }),
            op: Token::Plus,
            rhs: Box::new(Expr::IntLit(2)),
        };
        assert_eq!(expr.to_string(), "((-1) + 2)");
    }
}
