use monkey_eval::{define_macros, expand_macros};
use monkey_parser::parser::Parser;
use monkey_passes::resolve::SymbolTable;
use monkey_value::builtins::BUILTINS;
use monkey_value::env::Environment;
use monkey_value::Value;
use monkey_vm::compiler::Compiler;
use monkey_vm::vm::{Vm, GLOBALS_SIZE};
use std::io::{self, BufRead, Write};

const PROMPT: &str = ">> ";

/// Dump the disassembly of each line before running it.
const DUMP_BYTECODE: bool = false;

fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // compilation and VM state shared by all lines of the session
    let mut symbol_table = SymbolTable::new();
    for (index, builtin) in BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(index, builtin.ident);
    }
    let mut constants: Vec<Value> = Vec::new();
    let mut globals: Vec<Value> = vec![Value::Null; GLOBALS_SIZE];
    let macro_env = Environment::new();

    loop {
        print!("{}", PROMPT);
        stdout.flush().unwrap();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap() == 0 {
            return; // EOF
        }

        let mut parser = Parser::new(&line);
        let mut program = parser.parse_program();
        if !parser.errors().is_empty() {
            for err in parser.errors() {
                eprintln!("ERROR: {}", err);
            }
            continue;
        }

        define_macros(&mut program, &macro_env);
        expand_macros(&mut program, &macro_env);

        let mut compiler = Compiler::new_with_state(symbol_table, constants);
        let compiled = compiler.compile(&program);
        let bytecode = compiler.bytecode();
        (symbol_table, constants) = compiler.into_state();
        if let Err(err) = compiled {
            eprintln!("Compilation failed:\n {}", err);
            continue;
        }

        if DUMP_BYTECODE {
            eprintln!("{}", bytecode.instructions);
        }

        let mut vm = Vm::new_with_globals(bytecode, globals);
        let ran = vm.run();
        let result = vm.last_popped_stack_element();
        globals = vm.into_globals();
        match ran {
            Ok(()) => println!("{}", result),
            Err(err) => eprintln!("Executing bytecode failed:\n {}", err),
        }
    }
}
