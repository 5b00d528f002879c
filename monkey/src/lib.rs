use monkey_eval::{define_macros, expand_macros};
use monkey_parser::ast::Stmt;
use monkey_parser::parser::Parser;
use monkey_value::env::Environment;
use monkey_value::Value;
use monkey_vm::compiler::{CompileError, Compiler};
use monkey_vm::vm::{RuntimeError, Vm};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The parser's accumulated diagnostics, one per line.
    #[error("{0}")]
    Parse(String),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn parse_and_expand(input: &str) -> Result<Vec<Stmt>, Error> {
    let mut parser = Parser::new(input);
    let mut program = parser.parse_program();
    if !parser.errors().is_empty() {
        let rendered = parser
            .errors()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        return Err(Error::Parse(rendered));
    }

    let macro_env = Environment::new();
    define_macros(&mut program, &macro_env);
    expand_macros(&mut program, &macro_env);
    Ok(program)
}

/// Compiles and runs `source` on the VM, returning the value of the
/// final expression statement (or `null`).
pub fn interpret(source: &str) -> Result<Value, Error> {
    let program = parse_and_expand(source)?;

    let mut compiler = Compiler::new();
    compiler.compile(&program)?;

    let mut vm = Vm::new(compiler.bytecode());
    vm.run()?;
    Ok(vm.last_popped_stack_element())
}

/// Runs `source` through the tree-walking backend. Runtime failures
/// come back as first-class `Error` values.
pub fn evaluate(source: &str) -> Result<Value, Error> {
    let program = parse_and_expand(source)?;

    let env = Environment::new();
    Ok(monkey_eval::eval_program(&program, &env))
}
