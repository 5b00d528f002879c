use super::*;
use crate::ast::Expr;
use crate::lexer::PREFIX_BP;

impl<'a> Parser<'a> {
    /* Expressions */
    /// Parses any expression.
    /// This is equivalent to calling [`Self::parse_expr_bp`] with `min_bp = 0`.
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0) // 0 to accept any expression
    }

    /// Parses a primary (atom) expression.
    fn parse_primary_expr(&mut self) -> Expr {
        // NOTE: prefix operators are handled here
        match self.current_token {
            Token::IntLit(_) | Token::BoolLit(_) | Token::StringLit(_) => {
                self.parse_literal_expr()
            }
            Token::Identifier(_) => self.parse_identifier_expr(),
            Token::LogicalNot => {
                self.next();
                Expr::Prefix {
                    op: Token::LogicalNot,
                    arg: Box::new(self.parse_expr_bp(PREFIX_BP)),
                }
            }
            Token::Minus => {
                self.next();
                Expr::Prefix {
                    op: Token::Minus,
                    arg: Box::new(self.parse_expr_bp(PREFIX_BP)),
                }
            }
            Token::OpenParen => {
                self.next();
                let expr = self.parse_expr();
                self.expect(Token::CloseParen);
                expr
            }
            Token::If => self.parse_if_expr(),
            Token::Fn => self.parse_fn_expr(),
            Token::Macro => self.parse_macro_expr(),
            Token::OpenBracket => self.parse_array_expr(),
            Token::OpenBrace => self.parse_hash_expr(),
            _ => {
                self.unexpected();
                self.next(); // eat the offending token to guarantee progress
                Expr::Error
            }
        }
    }

    /// Parses an expression with the specified `min_bp`.
    /// To parse any expression use, [`Self::parse_expr`].
    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_primary_expr();

        loop {
            // postfix operators: call and index
            if let Some(l_bp) = self.current_token.postfix_bp() {
                if l_bp < min_bp {
                    break;
                }
                lhs = match self.current_token {
                    Token::OpenParen => Expr::Call {
                        callee: Box::new(lhs),
                        args: self.parse_call_args(),
                    },
                    Token::OpenBracket => {
                        self.next();
                        let index = self.parse_expr();
                        self.expect(Token::CloseBracket);
                        Expr::Index {
                            obj: Box::new(lhs),
                            index: Box::new(index),
                        }
                    }
                    _ => unreachable!(),
                };
                continue;
            }

            let (l_bp, r_bp) = match self.current_token.binop_bp() {
                Some(bp) => bp,
                None => break, // not a valid binop, stop parsing
            };
            if l_bp < min_bp {
                break; // less than the min_bp, stop parsing
            }

            // self.current_token is a valid binop
            let binop = self.current_token.clone();
            self.next();

            let rhs = self.parse_expr_bp(r_bp);

            lhs = Expr::Infix {
                lhs: Box::new(lhs),
                op: binop,
                rhs: Box::new(rhs),
            }
        }

        lhs
    }

    /* Expressions.Literals */
    /// Parses a literal expression.
    /// A literal can be an integer, a bool or a string literal.
    fn parse_literal_expr(&mut self) -> Expr {
        let val = match self.current_token {
            Token::IntLit(val) => Expr::IntLit(val),
            Token::BoolLit(val) => Expr::BoolLit(val),
            Token::StringLit(ref val) => Expr::StringLit(val.clone()),
            _ => {
                self.unexpected();
                Expr::Error
            }
        };
        if val != Expr::Error {
            self.next(); // eat parsed token if not error
        }
        val
    }

    /* Expressions.Identifier */
    fn parse_identifier_expr(&mut self) -> Expr {
        match self.current_token.clone() {
            Token::Identifier(ident) => {
                self.next();
                Expr::Identifier(ident)
            }
            _ => {
                self.unexpected();
                Expr::Error
            }
        }
    }

    /* Expressions.Call */
    /// Parses the parenthesized argument list of a call expression.
    fn parse_call_args(&mut self) -> Vec<Expr> {
        self.expect(Token::OpenParen);
        let mut args = Vec::new();

        if !self.eat(Token::CloseParen) {
            loop {
                args.push(self.parse_expr());

                if self.eat(Token::CloseParen) {
                    break;
                } else if !self.eat(Token::Comma) {
                    self.unexpected();
                    break;
                }
            }
        }

        args
    }

    /* Expressions.If */
    fn parse_if_expr(&mut self) -> Expr {
        self.expect(Token::If);
        self.expect(Token::OpenParen);
        let cond = self.parse_expr();
        self.expect(Token::CloseParen);
        let consequence = self.parse_block();
        let alternative = if self.eat(Token::Else) {
            Some(self.parse_block())
        } else {
            None
        };

        Expr::If {
            cond: Box::new(cond),
            consequence,
            alternative,
        }
    }

    /* Expressions.Fn */
    fn parse_fn_expr(&mut self) -> Expr {
        self.expect(Token::Fn);
        let params = self.parse_params();
        let body = self.parse_block();
        Expr::Fn { params, body }
    }

    /* Expressions.Macro */
    fn parse_macro_expr(&mut self) -> Expr {
        self.expect(Token::Macro);
        let params = self.parse_params();
        let body = self.parse_block();
        Expr::Macro { params, body }
    }

    /// Parses a parenthesized, comma-separated parameter list.
    fn parse_params(&mut self) -> Vec<String> {
        self.expect(Token::OpenParen);
        let mut params = Vec::new();
        if !self.eat(Token::CloseParen) {
            loop {
                params.push(if let Token::Identifier(ref ident) = self.current_token {
                    let ident = ident.clone();
                    self.next();
                    ident
                } else {
                    self.unexpected();
                    return params;
                });

                if self.eat(Token::CloseParen) {
                    break;
                } else if !self.eat(Token::Comma) {
                    self.unexpected();
                    break;
                }
            }
        }
        params
    }

    /* Expressions.Array */
    fn parse_array_expr(&mut self) -> Expr {
        self.expect(Token::OpenBracket);
        let mut elems = Vec::new();

        if !self.eat(Token::CloseBracket) {
            loop {
                elems.push(self.parse_expr());

                if self.eat(Token::CloseBracket) {
                    break;
                } else if !self.eat(Token::Comma) {
                    self.unexpected();
                    break;
                }
            }
        }

        Expr::ArrayLit(elems)
    }

    /* Expressions.Hash */
    fn parse_hash_expr(&mut self) -> Expr {
        self.expect(Token::OpenBrace);
        let mut pairs = Vec::new();

        if !self.eat(Token::CloseBrace) {
            loop {
                let key = self.parse_expr();
                self.expect(Token::Colon);
                let value = self.parse_expr();
                pairs.push((key, value));

                if self.eat(Token::CloseBrace) {
                    break;
                } else if !self.eat(Token::Comma) {
                    self.unexpected();
                    break;
                }
            }
        }

        Expr::HashLit(pairs)
    }
}
