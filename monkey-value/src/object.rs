//! Heap-allocated object kinds and hash keys.

use crate::code::Instructions;
use crate::env::Env;
use crate::Value;
use monkey_parser::ast::{Expr, Stmt};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A natively implemented builtin function.
///
/// Builtins validate their own argument lists and report failures as
/// `Error` values rather than unwinding.
pub struct NativeFn {
    pub ident: &'static str,
    pub func: fn(&[Value]) -> Value,
}

/// A function value of the tree-walking backend: it closes over the
/// environment it was created in.
#[derive(Clone)]
pub struct Function {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub env: Env,
}

/// A macro definition, bound in the dedicated macro environment.
#[derive(Clone)]
pub struct MacroObj {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub env: Env,
}

/// A unit of compiled bytecode together with the stack space its
/// invocation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A function value of the VM backend: a [`CompiledFunction`] plus the
/// free values captured when the closure was built. Closures hold a flat
/// vector of captured values instead of an environment chain.
#[derive(Clone)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

/// A key into a hash value: the kind tag of the original key plus a
/// 64-bit payload derived from its value. Strings hash with FNV-1a so
/// equal contents always produce equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKey {
    Int(i64),
    Bool(bool),
    Str(u64),
}

impl HashKey {
    pub fn str(content: &str) -> Self {
        HashKey::Str(fnv1a(content.as_bytes()))
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// An entry of a hash value. The original key object is retained so the
/// hash can render itself.
#[derive(Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

#[derive(Clone)]
pub enum ObjKind {
    Str(String),
    Array(Vec<Value>),
    Hash(HashMap<HashKey, HashPair>),
    Fn(Function),
    CompiledFn(Rc<CompiledFunction>),
    Closure(Closure),
    NativeFn(&'static NativeFn),
    ReturnValue(Value),
    Error(String),
    Quote(Expr),
    Macro(MacroObj),
}

impl ObjKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjKind::Str(_) => "STRING",
            ObjKind::Array(_) => "ARRAY",
            ObjKind::Hash(_) => "HASH",
            ObjKind::Fn(_) => "FUNCTION",
            ObjKind::CompiledFn(_) => "COMPILED_FUNCTION",
            ObjKind::Closure(_) => "CLOSURE",
            ObjKind::NativeFn(_) => "BUILTIN",
            ObjKind::ReturnValue(_) => "RETURN_VALUE",
            ObjKind::Error(_) => "ERROR",
            ObjKind::Quote(_) => "QUOTE",
            ObjKind::Macro(_) => "MACRO",
        }
    }
}

impl PartialEq for ObjKind {
    fn eq(&self, other: &ObjKind) -> bool {
        match (self, other) {
            (Self::Str(l), Self::Str(r)) => l == r,
            (Self::Error(l), Self::Error(r)) => l == r,
            (Self::Array(l), Self::Array(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for ObjKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjKind::Str(string) => write!(f, "{}", string),
            ObjKind::Array(elems) => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, "]")
            }
            ObjKind::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            ObjKind::Fn(function) => {
                write!(f, "fn({}) {{...}}", function.params.join(", "))
            }
            ObjKind::CompiledFn(_) => write!(f, "<compiled fn>"),
            ObjKind::Closure(_) => write!(f, "<closure>"),
            ObjKind::NativeFn(native) => write!(f, "<native fn {}>", native.ident),
            ObjKind::ReturnValue(val) => write!(f, "{}", val),
            ObjKind::Error(message) => write!(f, "ERROR: {}", message),
            ObjKind::Quote(node) => write!(f, "QUOTE({})", node),
            ObjKind::Macro(macro_obj) => {
                write!(f, "macro({}) {{...}}", macro_obj.params.join(", "))
            }
        }
    }
}

pub struct Obj {
    pub kind: ObjKind,
}
