//! Variable resolution.
//!
//! Symbol tables form a chain mirroring the nesting of function
//! literals. Resolving a name through the chain may *promote* it: an
//! outer local observed from an inner function becomes a free variable
//! of the inner table, which is how the compiler detects closure
//! captures.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    /// A captured variable of an enclosing function.
    Free,
    Builtin,
    /// The name a function is bound to inside its own body.
    Function,
}

/// Represents a resolved symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    /// The symbols this table captures from enclosing tables, in capture
    /// order. Each entry is the *original* symbol of the outer table
    /// (scope `Local` or `Free`), so the enclosing compile can emit the
    /// matching load to prime the closure.
    free_symbols: Vec<Symbol>,
    num_definitions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        Self {
            outer: Some(Box::new(outer)),
            ..Self::default()
        }
    }

    /// Discards this table and hands back the enclosing one.
    pub fn into_outer(self) -> Option<SymbolTable> {
        self.outer.map(|outer| *outer)
    }

    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    /// The number of `define`d symbols; free and function-self symbols
    /// do not count. This is what the compiler uses for `num_locals`.
    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    pub fn free_symbols(&self) -> &[Symbol] {
        &self.free_symbols
    }

    /// Defines `name` in this table. Globals in the outermost table,
    /// locals everywhere else; indices are dense and monotonic.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Registers a builtin under its table index. Only meaningful on the
    /// outermost table; inner tables resolve builtins through the chain.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Registers the name a function is bound to so its body can refer
    /// to itself. A later `define` of the same name shadows it.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Resolves `name` through the chain.
    ///
    /// A hit in this table is returned as-is. A hit in an outer table is
    /// returned unchanged for `Global`, `Builtin` and `Function` scopes;
    /// outer `Local` and `Free` symbols are promoted to `Free` symbols
    /// of this table.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        match symbol.scope {
            SymbolScope::Global | SymbolScope::Builtin | SymbolScope::Function => Some(symbol),
            SymbolScope::Local | SymbolScope::Free => Some(self.define_free(symbol)),
        }
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name,
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }
}
