pub mod builtins;
pub mod code;
pub mod disassemble;
pub mod env;
pub mod object;

use object::{Closure, CompiledFunction, Function, HashKey, HashPair, MacroObj, NativeFn, Obj, ObjKind};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use monkey_parser::ast::Expr;

/// A runtime value.
///
/// Integers, booleans and `null` are unboxed; everything else lives behind
/// an [`Rc`], so cloning a `Value` is cheap. Because booleans and `null`
/// are plain variants, comparing them by value is the same as comparing
/// the interned singletons of a boxed representation by identity.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Null,
    Object(Rc<Obj>),
}

impl Value {
    pub fn string(val: impl Into<String>) -> Self {
        Self::object(ObjKind::Str(val.into()))
    }

    pub fn array(elems: Vec<Value>) -> Self {
        Self::object(ObjKind::Array(elems))
    }

    pub fn hash(pairs: HashMap<HashKey, HashPair>) -> Self {
        Self::object(ObjKind::Hash(pairs))
    }

    pub fn function(function: Function) -> Self {
        Self::object(ObjKind::Fn(function))
    }

    pub fn compiled_fn(func: CompiledFunction) -> Self {
        Self::object(ObjKind::CompiledFn(Rc::new(func)))
    }

    pub fn closure(closure: Closure) -> Self {
        Self::object(ObjKind::Closure(closure))
    }

    pub fn native_fn(native: &'static NativeFn) -> Self {
        Self::object(ObjKind::NativeFn(native))
    }

    pub fn return_value(val: Value) -> Self {
        Self::object(ObjKind::ReturnValue(val))
    }

    pub fn error(message: impl ToString) -> Self {
        Self::object(ObjKind::Error(message.to_string()))
    }

    pub fn quote(node: Expr) -> Self {
        Self::object(ObjKind::Quote(node))
    }

    pub fn macro_obj(macro_obj: MacroObj) -> Self {
        Self::object(ObjKind::Macro(macro_obj))
    }

    pub fn object(kind: ObjKind) -> Self {
        Value::Object(Rc::new(Obj { kind }))
    }

    /// The type tag used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Bool(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Object(obj) => obj.kind.type_name(),
        }
    }

    /// `null` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Value::Object(obj) if matches!(obj.kind, ObjKind::Error(_))
        )
    }

    /// Attempts to cast the `Value` into a `&str` or `None` if wrong type.
    pub fn cast_to_str(&self) -> Option<&str> {
        match self {
            Self::Object(obj) => match &obj.kind {
                ObjKind::Str(string) => Some(string),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn cast_to_int(&self) -> Option<i64> {
        match self {
            Self::Int(val) => Some(*val),
            _ => None,
        }
    }

    /// The key this value hashes to, or `None` for unhashable kinds.
    /// Only integers, booleans and strings are hashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int(val) => Some(HashKey::Int(*val)),
            Value::Bool(val) => Some(HashKey::Bool(*val)),
            Value::Object(obj) => match &obj.kind {
                ObjKind::Str(string) => Some(HashKey::str(string)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(val) => write!(f, "{}", val),
            Value::Bool(val) => write!(f, "{}", val),
            Value::Null => write!(f, "null"),
            Value::Object(obj) => write!(f, "{}", obj.kind),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(l), Value::Int(r)) => l == r,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Null, Value::Null) => true,
            (Value::Object(l), Value::Object(r)) => Rc::ptr_eq(l, r) || l.kind == r.kind,
            _ => false,
        }
    }
}
