use super::*;

impl<'a> Parser<'a> {
    /// Parses a single statement.
    pub fn parse_declaration(&mut self) -> Stmt {
        match self.current_token {
            Token::Let => self.parse_let_declaration(),
            Token::Return => self.parse_return_stmt(),
            _ => {
                // expression statement
                let expr = self.parse_expr();
                let stmt = Stmt::ExprStmt(expr);
                self.eat(Token::Semi); // trailing semicolon is optional
                stmt
            }
        }
    }

    /// Parses a brace-delimited block of statements.
    pub fn parse_block(&mut self) -> Vec<Stmt> {
        self.expect(Token::OpenBrace);

        let mut body = Vec::new();
        if !self.eat(Token::CloseBrace) {
            loop {
                body.push(self.parse_declaration());

                if self.eat(Token::CloseBrace) {
                    break;
                } else if self.current_token == Token::Eof {
                    self.unexpected();
                    break;
                }
            }
        }

        body
    }

    fn parse_let_declaration(&mut self) -> Stmt {
        self.expect(Token::Let);
        let ident = if let Token::Identifier(ref ident) = self.current_token {
            let ident = ident.clone();
            self.next();
            ident
        } else {
            self.unexpected();
            return Stmt::Error;
        };
        self.expect(Token::Equals);
        let initializer = self.parse_expr();
        self.eat(Token::Semi); // trailing semicolon is optional
        Stmt::Let { ident, initializer }
    }

    fn parse_return_stmt(&mut self) -> Stmt {
        self.expect(Token::Return);
        let expr = self.parse_expr();
        self.eat(Token::Semi); // trailing semicolon is optional
        Stmt::Return(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn stmt(source: &str) -> Stmt {
        let mut parser = Parser::new(source);
        let ast = parser.parse_declaration();
        assert!(parser.errors().is_empty());
        ast
    }

    fn program(source: &str) -> Vec<Stmt> {
        let mut parser = Parser::new(source);
        let ast = parser.parse_program();
        assert!(parser.errors().is_empty());
        ast
    }

    #[test]
    fn test_let_declaration() {
        assert_snapshot!(stmt("let x = 2;"), @"let x = 2;");
        assert_snapshot!(stmt("let x = 1 + 2;"), @"let x = (1 + 2);");
        assert_snapshot!(stmt("let x = 2"), @"let x = 2;"); // semicolon optional
        assert_snapshot!(stmt("let f = fn(a) { a };"), @"let f = fn(a) { a };");
    }

    #[test]
    fn test_return_stmt() {
        assert_snapshot!(stmt("return 1;"), @"return 1;");
        assert_snapshot!(stmt("return 1 + 2;"), @"return (1 + 2);");
        assert_snapshot!(stmt("return x"), @"return x;");
    }

    #[test]
    fn test_expr_stmt() {
        assert_snapshot!(stmt("1 + 2;"), @"(1 + 2)");
        assert_snapshot!(stmt("foo"), @"foo");
    }

    #[test]
    fn test_program() {
        let program = program("let x = 1; let y = 2; x + y;");
        assert_eq!(program.len(), 3);
        assert_snapshot!(program[2], @"(x + y)");
    }

    #[test]
    fn test_parse_errors_are_accumulated() {
        let mut parser = Parser::new("let = 1; let y = 2;");
        let program = parser.parse_program();
        assert_eq!(
            parser.errors()[0].to_string(),
            "unexpected token `=` at position 4"
        );
        // parsing continued past the error
        assert_snapshot!(program.last().unwrap(), @"let y = 2;");
    }

    #[test]
    fn test_expect_errors_name_both_tokens() {
        let mut parser = Parser::new("if (true { 1 }");
        parser.parse_program();
        assert_eq!(
            parser.errors()[0].message(),
            "expected `)`, got `{`"
        );
    }

    #[test]
    fn test_illegal_token_is_not_fatal() {
        let mut parser = Parser::new("let x = 1; @ let y = 2;");
        let program = parser.parse_program();
        assert_eq!(
            parser.errors()[0].message(),
            "unexpected token `ILLEGAL`"
        );
        assert_snapshot!(program.last().unwrap(), @"let y = 2;");
    }
}
