//! The builtin function table.
//!
//! The order of [`BUILTINS`] defines the operand of `GetBuiltin`
//! instructions. Both the compiler and the VM index into this table, so
//! reordering it is a breaking change.

use crate::object::NativeFn;
use crate::Value;

pub static BUILTINS: &[NativeFn] = &[
    NativeFn {
        ident: "len",
        func: len,
    },
    NativeFn {
        ident: "puts",
        func: puts,
    },
    NativeFn {
        ident: "first",
        func: first,
    },
    NativeFn {
        ident: "last",
        func: last,
    },
    NativeFn {
        ident: "rest",
        func: rest,
    },
    NativeFn {
        ident: "push",
        func: push,
    },
];

pub fn lookup(name: &str) -> Option<&'static NativeFn> {
    BUILTINS.iter().find(|builtin| builtin.ident == name)
}

fn wrong_argument_count(got: usize, want: usize) -> Value {
    Value::error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

fn as_array(val: &Value) -> Option<&[Value]> {
    match val {
        Value::Object(obj) => match &obj.kind {
            crate::object::ObjKind::Array(elems) => Some(elems),
            _ => None,
        },
        _ => None,
    }
}

fn len(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_argument_count(args.len(), 1);
    }
    if let Some(string) = args[0].cast_to_str() {
        return Value::Int(string.len() as i64);
    }
    if let Some(elems) = as_array(&args[0]) {
        return Value::Int(elems.len() as i64);
    }
    Value::error(format!(
        "argument to `len` not supported, got {}",
        args[0].type_name()
    ))
}

fn puts(args: &[Value]) -> Value {
    for arg in args {
        println!("{}", arg);
    }
    Value::Null
}

fn first(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_argument_count(args.len(), 1);
    }
    match as_array(&args[0]) {
        Some(elems) => elems.first().cloned().unwrap_or(Value::Null),
        None => Value::error(format!(
            "argument to `first` must be ARRAY, got {}",
            args[0].type_name()
        )),
    }
}

fn last(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_argument_count(args.len(), 1);
    }
    match as_array(&args[0]) {
        Some(elems) => elems.last().cloned().unwrap_or(Value::Null),
        None => Value::error(format!(
            "argument to `last` must be ARRAY, got {}",
            args[0].type_name()
        )),
    }
}

fn rest(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_argument_count(args.len(), 1);
    }
    match as_array(&args[0]) {
        Some(elems) if !elems.is_empty() => Value::array(elems[1..].to_vec()),
        Some(_) => Value::Null,
        None => Value::error(format!(
            "argument to `rest` must be ARRAY, got {}",
            args[0].type_name()
        )),
    }
}

fn push(args: &[Value]) -> Value {
    if args.len() != 2 {
        return wrong_argument_count(args.len(), 2);
    }
    match as_array(&args[0]) {
        Some(elems) => {
            let mut elems = elems.to_vec();
            elems.push(args[1].clone());
            Value::array(elems)
        }
        None => Value::error(format!(
            "argument to `push` must be ARRAY, got {}",
            args[0].type_name()
        )),
    }
}
