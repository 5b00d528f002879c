//! The stack-based virtual machine.

use crate::compiler::Bytecode;
use monkey_value::builtins::BUILTINS;
use monkey_value::code::OpCode;
use monkey_value::object::{Closure, CompiledFunction, HashPair, Obj, ObjKind};
use monkey_value::Value;
use num_traits::FromPrimitive;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65536;
pub const MAX_FRAMES: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("stack overflow")]
    StackOverflow,
    #[error("frames overflow")]
    FramesOverflow,
    #[error("opcode {0} undefined")]
    UndefinedOpcode(u8),
    #[error("unsupported types for binary operation: {0} {1}")]
    UnsupportedBinaryTypes(&'static str, &'static str),
    #[error("unknown operator: {0} ({1} {2})")]
    UnknownOperator(u8, &'static str, &'static str),
    #[error("unsupported type for negation: {0}")]
    UnsupportedNegation(&'static str),
    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),
    #[error("index operator not supported: {0}")]
    IndexNotSupported(&'static str),
    #[error("calling non-function and non-built-in")]
    CallingNonFunction,
    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongArgumentCount { want: usize, got: usize },
    #[error("not a function: {0}")]
    NotAFunction(String),
}

/// A call record: the executing closure, its instruction pointer and the
/// operand-stack slot where its locals begin.
struct Frame {
    /// Always an `ObjKind::Closure`; kept as the shared object so
    /// `CurrentClosure` pushes the identical value.
    closure: Rc<Obj>,
    /// Pre-incremented before each fetch, hence the -1 start.
    ip: isize,
    base_pointer: usize,
}

impl Frame {
    fn new(closure: Rc<Obj>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    fn closure(&self) -> &Closure {
        match &self.closure.kind {
            ObjKind::Closure(closure) => closure,
            _ => unreachable!("frames only execute closures"),
        }
    }
}

pub struct Vm {
    constants: Vec<Value>,
    /// Operand stack. `sp` points one past the top; the backing storage
    /// never shrinks, slots above `sp` are simply dead.
    stack: Vec<Value>,
    sp: usize,
    globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::new_with_globals(bytecode, vec![Value::Null; GLOBALS_SIZE])
    }

    /// Creates a VM reusing an existing globals store. The REPL threads
    /// the store through successive lines.
    pub fn new_with_globals(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        let main_fn = CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        };
        let main_closure = Rc::new(Obj {
            kind: ObjKind::Closure(Closure {
                func: Rc::new(main_fn),
                free: Vec::new(),
            }),
        });

        Self {
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals,
            frames: vec![Frame::new(main_closure, 0)],
        }
    }

    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// The slot just above the stack top: the value most recently
    /// discarded by `Pop`. This is what the REPL prints.
    pub fn last_popped_stack_element(&self) -> Value {
        self.stack[self.sp].clone()
    }

    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while self.has_next_instruction() {
            let op = self.fetch_opcode()?;

            match op {
                OpCode::Constant => {
                    let index = self.read_u16_operand();
                    self.push(self.constants[index].clone())?;
                }
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    self.execute_binary_operation(op)?;
                }
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::True => self.push(Value::Bool(true))?,
                OpCode::False => self.push(Value::Bool(false))?,
                OpCode::Null => self.push(Value::Null)?,
                OpCode::Equal | OpCode::NotEqual | OpCode::GreaterThan => {
                    self.execute_comparison(op)?;
                }
                OpCode::Minus => {
                    let operand = self.pop();
                    match operand {
                        Value::Int(val) => self.push(Value::Int(-val))?,
                        _ => {
                            return Err(RuntimeError::UnsupportedNegation(operand.type_name()));
                        }
                    }
                }
                OpCode::Bang => {
                    let operand = self.pop();
                    self.push(Value::Bool(!operand.is_truthy()))?;
                }
                OpCode::JumpNotTruthy => {
                    let target = self.read_u16_operand();
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.set_ip(target as isize - 1);
                    }
                }
                OpCode::Jump => {
                    let target = self.read_u16_operand();
                    self.set_ip(target as isize - 1);
                }
                OpCode::GetGlobal => {
                    let index = self.read_u16_operand();
                    self.push(self.globals[index].clone())?;
                }
                OpCode::SetGlobal => {
                    let index = self.read_u16_operand();
                    self.globals[index] = self.pop();
                }
                OpCode::GetLocal => {
                    let index = self.read_u8_operand();
                    let base_pointer = self.current_frame().base_pointer;
                    self.push(self.stack[base_pointer + index].clone())?;
                }
                OpCode::SetLocal => {
                    let index = self.read_u8_operand();
                    let base_pointer = self.current_frame().base_pointer;
                    self.stack[base_pointer + index] = self.pop();
                }
                OpCode::GetBuiltin => {
                    let index = self.read_u8_operand();
                    self.push(Value::native_fn(&BUILTINS[index]))?;
                }
                OpCode::GetFree => {
                    let index = self.read_u8_operand();
                    let free = self.current_frame().closure().free[index].clone();
                    self.push(free)?;
                }
                OpCode::CurrentClosure => {
                    let closure = self.current_frame().closure.clone();
                    self.push(Value::Object(closure))?;
                }
                OpCode::Array => {
                    let count = self.read_u16_operand();
                    let elems = self.stack[self.sp - count..self.sp].to_vec();
                    self.sp -= count;
                    self.push(Value::array(elems))?;
                }
                OpCode::Hash => {
                    let count = self.read_u16_operand();
                    let hash = self.build_hash(self.sp - count, self.sp)?;
                    self.sp -= count;
                    self.push(hash)?;
                }
                OpCode::Index => {
                    let index = self.pop();
                    let obj = self.pop();
                    self.execute_index_expression(obj, index)?;
                }
                OpCode::Closure => {
                    let constant = self.read_u16_operand();
                    let free_count = self.read_u8_operand();
                    self.push_closure(constant, free_count)?;
                }
                OpCode::Call => {
                    let argc = self.read_u8_operand();
                    self.execute_call(argc)?;
                }
                OpCode::ReturnValue => {
                    let return_value = self.pop();
                    let frame = self.frames.pop().unwrap();
                    self.sp = frame.base_pointer - 1;
                    self.push(return_value)?;
                }
                OpCode::Return => {
                    let frame = self.frames.pop().unwrap();
                    self.sp = frame.base_pointer - 1;
                    self.push(Value::Null)?;
                }
            }
        }
        Ok(())
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().unwrap()
    }

    fn has_next_instruction(&self) -> bool {
        let frame = self.current_frame();
        ((frame.ip + 1) as usize) < frame.closure().func.instructions.len()
    }

    fn fetch_opcode(&mut self) -> Result<OpCode, RuntimeError> {
        let frame = self.frames.last_mut().unwrap();
        frame.ip += 1;
        let byte = match &frame.closure.kind {
            ObjKind::Closure(closure) => closure.func.instructions.read_u8(frame.ip as usize),
            _ => unreachable!("frames only execute closures"),
        };
        OpCode::from_u8(byte).ok_or(RuntimeError::UndefinedOpcode(byte))
    }

    fn read_u16_operand(&mut self) -> usize {
        let frame = self.frames.last_mut().unwrap();
        let operand = match &frame.closure.kind {
            ObjKind::Closure(closure) => closure
                .func
                .instructions
                .read_u16(frame.ip as usize + 1),
            _ => unreachable!("frames only execute closures"),
        };
        frame.ip += 2;
        operand as usize
    }

    fn read_u8_operand(&mut self) -> usize {
        let frame = self.frames.last_mut().unwrap();
        let operand = match &frame.closure.kind {
            ObjKind::Closure(closure) => {
                closure.func.instructions.read_u8(frame.ip as usize + 1)
            }
            _ => unreachable!("frames only execute closures"),
        };
        frame.ip += 1;
        operand as usize
    }

    fn set_ip(&mut self, ip: isize) {
        self.frames.last_mut().unwrap().ip = ip;
    }

    fn push(&mut self, val: Value) -> Result<(), RuntimeError> {
        if self.sp >= STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack[self.sp] = val;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Value {
        self.sp -= 1;
        self.stack[self.sp].clone()
    }

    fn execute_binary_operation(&mut self, op: OpCode) -> Result<(), RuntimeError> {
        let rhs = self.pop();
        let lhs = self.pop();
        match (&lhs, &rhs) {
            (Value::Int(lhs), Value::Int(rhs)) => {
                let result = match op {
                    OpCode::Add => lhs + rhs,
                    OpCode::Sub => lhs - rhs,
                    OpCode::Mul => lhs * rhs,
                    OpCode::Div => lhs / rhs,
                    _ => unreachable!(),
                };
                self.push(Value::Int(result))
            }
            (Value::Object(l), Value::Object(r)) => match (&l.kind, &r.kind) {
                (ObjKind::Str(l), ObjKind::Str(r)) => {
                    if op != OpCode::Add {
                        return Err(RuntimeError::UnknownOperator(
                            op as u8,
                            lhs.type_name(),
                            rhs.type_name(),
                        ));
                    }
                    let concatenated = format!("{}{}", l, r);
                    self.push(Value::string(concatenated))
                }
                _ => Err(RuntimeError::UnsupportedBinaryTypes(
                    lhs.type_name(),
                    rhs.type_name(),
                )),
            },
            _ => Err(RuntimeError::UnsupportedBinaryTypes(
                lhs.type_name(),
                rhs.type_name(),
            )),
        }
    }

    fn execute_comparison(&mut self, op: OpCode) -> Result<(), RuntimeError> {
        let rhs = self.pop();
        let lhs = self.pop();

        if let (Value::Int(lhs), Value::Int(rhs)) = (&lhs, &rhs) {
            let result = match op {
                OpCode::Equal => lhs == rhs,
                OpCode::NotEqual => lhs != rhs,
                OpCode::GreaterThan => lhs > rhs,
                _ => unreachable!(),
            };
            return self.push(Value::Bool(result));
        }

        // non-integers compare by identity; booleans and null are
        // singleton-like variants, so value equality is identity
        match op {
            OpCode::Equal => self.push(Value::Bool(object_identity(&lhs, &rhs))),
            OpCode::NotEqual => self.push(Value::Bool(!object_identity(&lhs, &rhs))),
            _ => Err(RuntimeError::UnknownOperator(
                op as u8,
                lhs.type_name(),
                rhs.type_name(),
            )),
        }
    }

    fn build_hash(&self, start: usize, end: usize) -> Result<Value, RuntimeError> {
        let mut pairs = HashMap::new();
        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();
            let hash_key = key
                .hash_key()
                .ok_or(RuntimeError::UnusableHashKey(key.type_name()))?;
            pairs.insert(hash_key, HashPair { key, value });
            i += 2;
        }
        Ok(Value::hash(pairs))
    }

    fn execute_index_expression(
        &mut self,
        obj: Value,
        index: Value,
    ) -> Result<(), RuntimeError> {
        if let Value::Object(o) = &obj {
            match &o.kind {
                ObjKind::Array(elems) => {
                    if let Value::Int(i) = index {
                        let elem = if i < 0 || i as usize >= elems.len() {
                            Value::Null
                        } else {
                            elems[i as usize].clone()
                        };
                        return self.push(elem);
                    }
                }
                ObjKind::Hash(pairs) => {
                    let hash_key = index
                        .hash_key()
                        .ok_or(RuntimeError::UnusableHashKey(index.type_name()))?;
                    let value = pairs
                        .get(&hash_key)
                        .map(|pair| pair.value.clone())
                        .unwrap_or(Value::Null);
                    return self.push(value);
                }
                _ => {}
            }
        }
        Err(RuntimeError::IndexNotSupported(obj.type_name()))
    }

    fn execute_call(&mut self, argc: usize) -> Result<(), RuntimeError> {
        let callee = self.stack[self.sp - 1 - argc].clone();
        let obj = match &callee {
            Value::Object(obj) => obj,
            _ => return Err(RuntimeError::CallingNonFunction),
        };
        match &obj.kind {
            ObjKind::Closure(closure) => {
                if argc != closure.func.num_parameters {
                    return Err(RuntimeError::WrongArgumentCount {
                        want: closure.func.num_parameters,
                        got: argc,
                    });
                }
                if self.frames.len() >= MAX_FRAMES {
                    return Err(RuntimeError::FramesOverflow);
                }
                let base_pointer = self.sp - argc;
                let new_sp = base_pointer + closure.func.num_locals;
                if new_sp > STACK_SIZE {
                    return Err(RuntimeError::StackOverflow);
                }
                self.frames.push(Frame::new(obj.clone(), base_pointer));
                self.sp = new_sp;
                Ok(())
            }
            ObjKind::NativeFn(native) => {
                let args = self.stack[self.sp - argc..self.sp].to_vec();
                let result = (native.func)(&args);
                // drop the arguments and the builtin itself
                self.sp = self.sp - argc - 1;
                self.push(result)
            }
            _ => Err(RuntimeError::CallingNonFunction),
        }
    }

    fn push_closure(&mut self, constant: usize, free_count: usize) -> Result<(), RuntimeError> {
        let constant = self.constants[constant].clone();
        let func = match &constant {
            Value::Object(obj) => match &obj.kind {
                ObjKind::CompiledFn(func) => func.clone(),
                _ => return Err(RuntimeError::NotAFunction(constant.to_string())),
            },
            _ => return Err(RuntimeError::NotAFunction(constant.to_string())),
        };

        let free = self.stack[self.sp - free_count..self.sp].to_vec();
        self.sp -= free_count;
        self.push(Value::closure(Closure { func, free }))
    }
}

fn object_identity(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Null, Value::Null) => true,
        (Value::Object(l), Value::Object(r)) => Rc::ptr_eq(l, r),
        _ => false,
    }
}
