//! Scoped symbol table.
//!
//! A stack of per-scope maps: entering a scope pushes a map, exiting pops
//! it, so every binding of the dying scope disappears at once. Lookup walks
//! from the innermost scope outward, which makes shadowing work and keeps
//! the contract observable from outside: innermost binding wins, and a
//! redeclaration is rejected only when it collides at the same level.

use tellc_util::FxIndexMap;

use crate::types::{DataType, SymbolKind};

/// A declared name.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub data_type: DataType,
    pub is_initialized: bool,
    /// Lexical depth at declaration; 0 is the top level.
    pub scope_level: usize,
}

/// Stack of lexical scopes. The root scope is always present.
pub struct ScopeStack {
    scopes: Vec<FxIndexMap<String, Symbol>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxIndexMap::default()],
        }
    }

    /// Current lexical depth; 0 at the top level.
    pub fn scope_level(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(FxIndexMap::default());
    }

    /// Pops the current scope and every binding in it. The root scope is
    /// never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declares a name in the current scope. Returns `false` if the name
    /// is already bound at this level; shadowing an outer binding is fine.
    pub fn insert(&mut self, name: &str, kind: SymbolKind, data_type: DataType) -> bool {
        let level = self.scope_level();
        let scope = self
            .scopes
            .last_mut()
            .expect("root scope is always present");
        if scope.contains_key(name) {
            return false;
        }
        scope.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind,
                data_type,
                is_initialized: false,
                scope_level: level,
            },
        );
        true
    }

    /// Finds the innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    /// Marks the innermost binding of `name` as initialized.
    pub fn set_initialized(&mut self, name: &str) {
        if let Some(symbol) = self.lookup_mut(name) {
            symbol.is_initialized = true;
        }
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
