//! Lowers AST into [`Bytecode`] in a single pass.

use monkey_parser::ast::{Expr, Stmt};
use monkey_parser::lexer::Token;
use monkey_passes::resolve::{Symbol, SymbolScope, SymbolTable};
use monkey_value::builtins::BUILTINS;
use monkey_value::code::{Instructions, OpCode};
use monkey_value::object::CompiledFunction;
use monkey_value::Value;
use num_traits::FromPrimitive;
use std::mem;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("undefined variable {0}")]
    UndefinedVariable(String),
    #[error("unknown operator {0}")]
    UnknownOperator(Token),
}

/// The output of a compilation: the top-level instructions plus the
/// constant pool shared by every function compiled from the input.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: OpCode,
    position: usize,
}

/// Per-function compilation state. The compiler pushes one of these for
/// every function literal it enters and pops it when the function's
/// bytecode is complete.
#[derive(Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, builtin.ident);
        }

        Self {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Creates a compiler that continues from previous state. The REPL
    /// uses this to compile each line against the accumulated symbol
    /// table and constant pool.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Self {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Hands back the symbol table and constant pool for the next
    /// incremental compilation.
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_scope().instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    pub fn compile(&mut self, program: &[Stmt]) -> Result<(), CompileError> {
        for stmt in program {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Let { ident, initializer } => {
                // A function literal bound by `let` knows its own name so
                // its body can refer to itself.
                if let Expr::Fn { params, body } = initializer {
                    self.compile_function(Some(ident.as_str()), params, body)?;
                } else {
                    self.compile_expr(initializer)?;
                }
                // The name is defined only after the value is compiled;
                // `let x = x;` is an undefined variable.
                let symbol = self.symbol_table.define(ident);
                match symbol.scope {
                    SymbolScope::Global => self.emit(OpCode::SetGlobal, &[symbol.index]),
                    _ => self.emit(OpCode::SetLocal, &[symbol.index]),
                };
            }
            Stmt::Return(expr) => {
                self.compile_expr(expr)?;
                self.emit(OpCode::ReturnValue, &[]);
            }
            Stmt::ExprStmt(expr) => {
                self.compile_expr(expr)?;
                self.emit(OpCode::Pop, &[]);
            }
            Stmt::Error => unreachable!("the driver aborts compilation on parse errors"),
        }
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::IntLit(val) => {
                let constant = self.add_constant(Value::Int(*val));
                self.emit(OpCode::Constant, &[constant]);
            }
            Expr::BoolLit(val) => {
                match val {
                    true => self.emit(OpCode::True, &[]),
                    false => self.emit(OpCode::False, &[]),
                };
            }
            Expr::StringLit(val) => {
                let constant = self.add_constant(Value::string(val.clone()));
                self.emit(OpCode::Constant, &[constant]);
            }
            Expr::Identifier(ident) => {
                let symbol = self
                    .symbol_table
                    .resolve(ident)
                    .ok_or_else(|| CompileError::UndefinedVariable(ident.clone()))?;
                self.load_symbol(&symbol);
            }
            Expr::Prefix { op, arg } => {
                self.compile_expr(arg)?;
                match op {
                    Token::LogicalNot => self.emit(OpCode::Bang, &[]),
                    Token::Minus => self.emit(OpCode::Minus, &[]),
                    _ => return Err(CompileError::UnknownOperator(op.clone())),
                };
            }
            Expr::Infix { lhs, op, rhs } => {
                // there is no less-than opcode; `a < b` is `b > a`
                if *op == Token::LessThan {
                    self.compile_expr(rhs)?;
                    self.compile_expr(lhs)?;
                    self.emit(OpCode::GreaterThan, &[]);
                    return Ok(());
                }
                self.compile_expr(lhs)?;
                self.compile_expr(rhs)?;
                match op {
                    Token::Plus => self.emit(OpCode::Add, &[]),
                    Token::Minus => self.emit(OpCode::Sub, &[]),
                    Token::Asterisk => self.emit(OpCode::Mul, &[]),
                    Token::Slash => self.emit(OpCode::Div, &[]),
                    Token::GreaterThan => self.emit(OpCode::GreaterThan, &[]),
                    Token::EqualsEquals => self.emit(OpCode::Equal, &[]),
                    Token::NotEquals => self.emit(OpCode::NotEqual, &[]),
                    _ => return Err(CompileError::UnknownOperator(op.clone())),
                };
            }
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                self.compile_expr(cond)?;

                // operand is patched once the consequence is compiled
                let jump_not_truthy_pos = self.emit(OpCode::JumpNotTruthy, &[9999]);
                self.compile_block(consequence)?;
                if self.last_instruction_is(OpCode::Pop) {
                    self.remove_last_instruction();
                }
                let jump_pos = self.emit(OpCode::Jump, &[9999]);

                let after_consequence = self.current_scope().instructions.len();
                self.change_operand(jump_not_truthy_pos, after_consequence);

                match alternative {
                    None => {
                        self.emit(OpCode::Null, &[]);
                    }
                    Some(alternative) => {
                        self.compile_block(alternative)?;
                        if self.last_instruction_is(OpCode::Pop) {
                            self.remove_last_instruction();
                        }
                    }
                }

                let after_alternative = self.current_scope().instructions.len();
                self.change_operand(jump_pos, after_alternative);
            }
            Expr::Fn { params, body } => {
                self.compile_function(None, params, body)?;
            }
            Expr::Macro { .. } => {
                unreachable!("macros are expanded before compilation")
            }
            Expr::Call { callee, args } => {
                self.compile_expr(callee)?;
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(OpCode::Call, &[args.len()]);
            }
            Expr::ArrayLit(elems) => {
                for elem in elems {
                    self.compile_expr(elem)?;
                }
                self.emit(OpCode::Array, &[elems.len()]);
            }
            Expr::HashLit(pairs) => {
                // the source order of hash entries carries no meaning;
                // sort by the keys' textual rendering for determinism
                let mut pairs: Vec<&(Expr, Expr)> = pairs.iter().collect();
                pairs.sort_by_key(|(key, _)| key.to_string());

                for (key, value) in &pairs {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(OpCode::Hash, &[pairs.len() * 2]);
            }
            Expr::Index { obj, index } => {
                self.compile_expr(obj)?;
                self.compile_expr(index)?;
                self.emit(OpCode::Index, &[]);
            }
            Expr::Error => unreachable!("the driver aborts compilation on parse errors"),
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &[Stmt]) -> Result<(), CompileError> {
        for stmt in block {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_function(
        &mut self,
        name: Option<&str>,
        params: &[String],
        body: &[Stmt],
    ) -> Result<(), CompileError> {
        self.enter_scope();

        if let Some(name) = name {
            self.symbol_table.define_function_name(name);
        }
        for param in params {
            self.symbol_table.define(param);
        }

        self.compile_block(body)?;

        // the final expression statement is the implicit return value
        if self.last_instruction_is(OpCode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(OpCode::ReturnValue) {
            self.emit(OpCode::Return, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols().to_vec();
        let num_locals = self.symbol_table.num_definitions();
        let instructions = self.leave_scope();

        // prime the closure: push every captured value in capture order
        for free in &free_symbols {
            self.load_symbol(free);
        }

        let func = CompiledFunction {
            instructions,
            num_locals,
            num_parameters: params.len(),
        };
        let constant = self.add_constant(Value::compiled_fn(func));
        self.emit(OpCode::Closure, &[constant, free_symbols.len()]);
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(OpCode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(OpCode::GetLocal, &[symbol.index]),
            SymbolScope::Free => self.emit(OpCode::GetFree, &[symbol.index]),
            SymbolScope::Builtin => self.emit(OpCode::GetBuiltin, &[symbol.index]),
            SymbolScope::Function => self.emit(OpCode::CurrentClosure, &[]),
        };
    }
}

/// Scope and emission plumbing.
impl Compiler {
    fn current_scope(&self) -> &CompilationScope {
        self.scopes.last().unwrap()
    }

    fn current_scope_mut(&mut self) -> &mut CompilationScope {
        self.scopes.last_mut().unwrap()
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.symbol_table = SymbolTable::new_enclosed(mem::take(&mut self.symbol_table));
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().unwrap();
        self.symbol_table = mem::take(&mut self.symbol_table).into_outer().unwrap();
        scope.instructions
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        let instruction = op.make(operands);
        let position = self.current_scope_mut().instructions.push(&instruction);

        let scope = self.current_scope_mut();
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction {
            opcode: op,
            position,
        });

        position
    }

    fn last_instruction_is(&self, op: OpCode) -> bool {
        matches!(
            self.current_scope().last_instruction,
            Some(EmittedInstruction { opcode, .. }) if opcode == op
        )
    }

    fn remove_last_instruction(&mut self) {
        let scope = self.current_scope_mut();
        let last = scope.last_instruction.unwrap();
        scope.instructions.truncate(last.position);
        scope.last_instruction = scope.previous_instruction;
    }

    fn replace_last_pop_with_return(&mut self) {
        let position = self.current_scope().last_instruction.unwrap().position;
        let instruction = OpCode::ReturnValue.make(&[]);
        let scope = self.current_scope_mut();
        scope.instructions.replace(position, &instruction);
        scope.last_instruction = Some(EmittedInstruction {
            opcode: OpCode::ReturnValue,
            position,
        });
    }

    /// Re-encodes the operand of the instruction at `position`.
    /// Used to patch jump targets once they are known.
    fn change_operand(&mut self, position: usize, operand: usize) {
        let op = OpCode::from_u8(self.current_scope().instructions.read_u8(position)).unwrap();
        let instruction = op.make(&[operand]);
        self.current_scope_mut()
            .instructions
            .replace(position, &instruction);
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monkey_parser::parser::Parser;
    use monkey_value::object::ObjKind;

    fn parse(source: &str) -> Vec<Stmt> {
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        assert!(parser.errors().is_empty());
        program
    }

    fn compile(source: &str) -> Bytecode {
        let program = parse(source);
        let mut compiler = Compiler::new();
        compiler.compile(&program).unwrap();
        compiler.bytecode()
    }

    fn compile_error(source: &str) -> CompileError {
        let program = parse(source);
        let mut compiler = Compiler::new();
        compiler.compile(&program).unwrap_err()
    }

    fn concat(instructions: Vec<Vec<u8>>) -> Instructions {
        instructions.into_iter().collect()
    }

    fn assert_instructions(bytecode: &Bytecode, expected: Vec<Vec<u8>>) {
        let expected = concat(expected);
        assert_eq!(
            bytecode.instructions,
            expected,
            "wrong instructions.\ngot:\n{}want:\n{}",
            bytecode.instructions,
            expected
        );
    }

    fn fn_instructions(constant: &Value) -> &Instructions {
        match constant {
            Value::Object(obj) => match &obj.kind {
                ObjKind::CompiledFn(func) => &func.instructions,
                other => panic!("constant is not a function: {}", other),
            },
            other => panic!("constant is not a function: {}", other),
        }
    }

    fn assert_fn_constant(constant: &Value, expected: Vec<Vec<u8>>) {
        let expected = concat(expected);
        let actual = fn_instructions(constant);
        assert_eq!(
            *actual, expected,
            "wrong function instructions.\ngot:\n{}want:\n{}",
            actual, expected
        );
    }

    #[test]
    fn test_integer_arithmetic() {
        let bytecode = compile("1 + 2");
        assert_eq!(bytecode.constants, vec![Value::Int(1), Value::Int(2)]);
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Add.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("1; 2");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Pop.make(&[]),
                OpCode::Constant.make(&[1]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("1 - 2");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Sub.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("1 * 2");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Mul.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("2 / 1");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Div.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("-1");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Minus.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_boolean_expressions() {
        let bytecode = compile("true");
        assert_instructions(
            &bytecode,
            vec![OpCode::True.make(&[]), OpCode::Pop.make(&[])],
        );

        let bytecode = compile("1 > 2");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::GreaterThan.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        // `<` compiles to GreaterThan with swapped operands
        let bytecode = compile("1 < 2");
        assert_eq!(bytecode.constants, vec![Value::Int(2), Value::Int(1)]);
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::GreaterThan.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("1 == 2");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Equal.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("true != false");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::True.make(&[]),
                OpCode::False.make(&[]),
                OpCode::NotEqual.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("!true");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::True.make(&[]),
                OpCode::Bang.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_conditionals() {
        let bytecode = compile("if (true) { 10 }; 3333;");
        assert_instructions(
            &bytecode,
            vec![
                // 0000
                OpCode::True.make(&[]),
                // 0001
                OpCode::JumpNotTruthy.make(&[10]),
                // 0004
                OpCode::Constant.make(&[0]),
                // 0007
                OpCode::Jump.make(&[11]),
                // 0010
                OpCode::Null.make(&[]),
                // 0011
                OpCode::Pop.make(&[]),
                // 0012
                OpCode::Constant.make(&[1]),
                // 0015
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("if (true) { 10 } else { 20 }; 3333;");
        assert_instructions(
            &bytecode,
            vec![
                // 0000
                OpCode::True.make(&[]),
                // 0001
                OpCode::JumpNotTruthy.make(&[10]),
                // 0004
                OpCode::Constant.make(&[0]),
                // 0007
                OpCode::Jump.make(&[13]),
                // 0010
                OpCode::Constant.make(&[1]),
                // 0013
                OpCode::Pop.make(&[]),
                // 0014
                OpCode::Constant.make(&[2]),
                // 0017
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_global_let_statements() {
        let bytecode = compile("let one = 1; let two = 2;");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::SetGlobal.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::SetGlobal.make(&[1]),
            ],
        );

        let bytecode = compile("let one = 1; one;");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::SetGlobal.make(&[0]),
                OpCode::GetGlobal.make(&[0]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            compile_error("undefined_name"),
            CompileError::UndefinedVariable("undefined_name".to_string())
        );
        assert_eq!(
            compile_error("let x = x;"),
            CompileError::UndefinedVariable("x".to_string())
        );
    }

    #[test]
    fn test_string_expressions() {
        let bytecode = compile(r#""monkey""#);
        assert_eq!(bytecode.constants, vec![Value::string("monkey")]);
        assert_instructions(
            &bytecode,
            vec![OpCode::Constant.make(&[0]), OpCode::Pop.make(&[])],
        );

        let bytecode = compile(r#""mon" + "key""#);
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Add.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_array_literals() {
        let bytecode = compile("[]");
        assert_instructions(
            &bytecode,
            vec![OpCode::Array.make(&[0]), OpCode::Pop.make(&[])],
        );

        let bytecode = compile("[1, 2, 3]");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Constant.make(&[2]),
                OpCode::Array.make(&[3]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_hash_literals() {
        let bytecode = compile("{}");
        assert_instructions(
            &bytecode,
            vec![OpCode::Hash.make(&[0]), OpCode::Pop.make(&[])],
        );

        let bytecode = compile("{1: 2, 3: 4, 5: 6}");
        assert_eq!(
            bytecode.constants,
            vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4),
                Value::Int(5),
                Value::Int(6),
            ]
        );
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Constant.make(&[2]),
                OpCode::Constant.make(&[3]),
                OpCode::Constant.make(&[4]),
                OpCode::Constant.make(&[5]),
                OpCode::Hash.make(&[6]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_hash_literal_keys_are_sorted_textually() {
        // keys arrive in source order 3, 1, 2 but compile sorted
        let bytecode = compile("{3: 30, 1: 10, 2: 20}");
        assert_eq!(
            bytecode.constants,
            vec![
                Value::Int(1),
                Value::Int(10),
                Value::Int(2),
                Value::Int(20),
                Value::Int(3),
                Value::Int(30),
            ]
        );
    }

    #[test]
    fn test_index_expressions() {
        let bytecode = compile("[1, 2][1 + 1]");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Array.make(&[2]),
                OpCode::Constant.make(&[2]),
                OpCode::Constant.make(&[3]),
                OpCode::Add.make(&[]),
                OpCode::Index.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("{1: 2}[2 - 1]");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Hash.make(&[2]),
                OpCode::Constant.make(&[2]),
                OpCode::Constant.make(&[3]),
                OpCode::Sub.make(&[]),
                OpCode::Index.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_functions() {
        let bytecode = compile("fn() { return 5 + 10 }");
        assert_fn_constant(
            &bytecode.constants[2],
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Add.make(&[]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
        assert_instructions(
            &bytecode,
            vec![OpCode::Closure.make(&[2, 0]), OpCode::Pop.make(&[])],
        );

        // the implicit return: the trailing Pop becomes ReturnValue
        let bytecode = compile("fn() { 5 + 10 }");
        assert_fn_constant(
            &bytecode.constants[2],
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Add.make(&[]),
                OpCode::ReturnValue.make(&[]),
            ],
        );

        let bytecode = compile("fn() { 1; 2 }");
        assert_fn_constant(
            &bytecode.constants[2],
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::Pop.make(&[]),
                OpCode::Constant.make(&[1]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
    }

    #[test]
    fn test_functions_without_return_value() {
        let bytecode = compile("fn() { }");
        assert_fn_constant(&bytecode.constants[0], vec![OpCode::Return.make(&[])]);
    }

    #[test]
    fn test_function_calls() {
        let bytecode = compile("fn() { 24 }();");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Closure.make(&[1, 0]),
                OpCode::Call.make(&[0]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("let oneArg = fn(a) { a }; oneArg(24);");
        assert_fn_constant(
            &bytecode.constants[0],
            vec![
                OpCode::GetLocal.make(&[0]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Closure.make(&[0, 0]),
                OpCode::SetGlobal.make(&[0]),
                OpCode::GetGlobal.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::Call.make(&[1]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("let manyArg = fn(a, b, c) { a; b; c }; manyArg(24, 25, 26);");
        assert_fn_constant(
            &bytecode.constants[0],
            vec![
                OpCode::GetLocal.make(&[0]),
                OpCode::Pop.make(&[]),
                OpCode::GetLocal.make(&[1]),
                OpCode::Pop.make(&[]),
                OpCode::GetLocal.make(&[2]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
    }

    #[test]
    fn test_let_statement_scopes() {
        let bytecode = compile("let num = 55; fn() { num }");
        assert_fn_constant(
            &bytecode.constants[1],
            vec![
                OpCode::GetGlobal.make(&[0]),
                OpCode::ReturnValue.make(&[]),
            ],
        );

        let bytecode = compile("fn() { let num = 55; num }");
        assert_fn_constant(
            &bytecode.constants[1],
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::SetLocal.make(&[0]),
                OpCode::GetLocal.make(&[0]),
                OpCode::ReturnValue.make(&[]),
            ],
        );

        let bytecode = compile("fn() { let a = 55; let b = 77; a + b }");
        assert_fn_constant(
            &bytecode.constants[2],
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::SetLocal.make(&[0]),
                OpCode::Constant.make(&[1]),
                OpCode::SetLocal.make(&[1]),
                OpCode::GetLocal.make(&[0]),
                OpCode::GetLocal.make(&[1]),
                OpCode::Add.make(&[]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
    }

    #[test]
    fn test_builtins() {
        let bytecode = compile("len([]); push([], 1);");
        assert_instructions(
            &bytecode,
            vec![
                OpCode::GetBuiltin.make(&[0]),
                OpCode::Array.make(&[0]),
                OpCode::Call.make(&[1]),
                OpCode::Pop.make(&[]),
                OpCode::GetBuiltin.make(&[5]),
                OpCode::Array.make(&[0]),
                OpCode::Constant.make(&[0]),
                OpCode::Call.make(&[2]),
                OpCode::Pop.make(&[]),
            ],
        );

        let bytecode = compile("fn() { len([]) }");
        assert_fn_constant(
            &bytecode.constants[0],
            vec![
                OpCode::GetBuiltin.make(&[0]),
                OpCode::Array.make(&[0]),
                OpCode::Call.make(&[1]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
    }

    #[test]
    fn test_closures() {
        let bytecode = compile("fn(a) { fn(b) { a + b } }");
        // inner function: `a` is free, `b` is local
        assert_fn_constant(
            &bytecode.constants[0],
            vec![
                OpCode::GetFree.make(&[0]),
                OpCode::GetLocal.make(&[0]),
                OpCode::Add.make(&[]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
        // outer function primes the closure with its local `a`
        assert_fn_constant(
            &bytecode.constants[1],
            vec![
                OpCode::GetLocal.make(&[0]),
                OpCode::Closure.make(&[0, 1]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
        assert_instructions(
            &bytecode,
            vec![OpCode::Closure.make(&[1, 0]), OpCode::Pop.make(&[])],
        );
    }

    #[test]
    fn test_nested_closures_capture_transitively() {
        let bytecode = compile("fn(a) { fn(b) { fn(c) { a + b + c } } }");
        assert_fn_constant(
            &bytecode.constants[0],
            vec![
                OpCode::GetFree.make(&[0]),
                OpCode::GetFree.make(&[1]),
                OpCode::Add.make(&[]),
                OpCode::GetLocal.make(&[0]),
                OpCode::Add.make(&[]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
        // the middle function forwards its own free `a` and local `b`
        assert_fn_constant(
            &bytecode.constants[1],
            vec![
                OpCode::GetFree.make(&[0]),
                OpCode::GetLocal.make(&[0]),
                OpCode::Closure.make(&[0, 2]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
        assert_fn_constant(
            &bytecode.constants[2],
            vec![
                OpCode::GetLocal.make(&[0]),
                OpCode::Closure.make(&[1, 1]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
    }

    #[test]
    fn test_recursive_functions_use_current_closure() {
        let bytecode = compile("let countDown = fn(x) { countDown(x - 1) }; countDown(1);");
        assert_fn_constant(
            &bytecode.constants[1],
            vec![
                OpCode::CurrentClosure.make(&[]),
                OpCode::GetLocal.make(&[0]),
                OpCode::Constant.make(&[0]),
                OpCode::Sub.make(&[]),
                OpCode::Call.make(&[1]),
                OpCode::ReturnValue.make(&[]),
            ],
        );
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Closure.make(&[1, 0]),
                OpCode::SetGlobal.make(&[0]),
                OpCode::GetGlobal.make(&[0]),
                OpCode::Constant.make(&[2]),
                OpCode::Call.make(&[1]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_compilation_scopes_are_isolated() {
        let bytecode = compile("let a = 1; fn() { let b = 2; b }; a;");
        // the function body must not leak into the top-level scope
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[0]),
                OpCode::SetGlobal.make(&[0]),
                OpCode::Closure.make(&[2, 0]),
                OpCode::Pop.make(&[]),
                OpCode::GetGlobal.make(&[0]),
                OpCode::Pop.make(&[]),
            ],
        );
    }

    #[test]
    fn test_new_with_state_resumes_numbering() {
        let program = parse("let one = 1;");
        let mut compiler = Compiler::new();
        compiler.compile(&program).unwrap();
        let (symbol_table, constants) = compiler.into_state();

        let program = parse("let two = 2; one + two");
        let mut compiler = Compiler::new_with_state(symbol_table, constants);
        compiler.compile(&program).unwrap();
        let bytecode = compiler.bytecode();

        assert_eq!(bytecode.constants, vec![Value::Int(1), Value::Int(2)]);
        assert_instructions(
            &bytecode,
            vec![
                OpCode::Constant.make(&[1]),
                OpCode::SetGlobal.make(&[1]),
                OpCode::GetGlobal.make(&[0]),
                OpCode::GetGlobal.make(&[1]),
                OpCode::Add.make(&[]),
                OpCode::Pop.make(&[]),
            ],
        );
    }
}
