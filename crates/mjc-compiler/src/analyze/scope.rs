//! Lexical scopes for method bodies.
//!
//! A stack of name→type frames. Lookup walks from the innermost frame
//! outward; class fields and the superclass chain are a separate walk owned
//! by the registry.

use indexmap::IndexMap;

use super::types::MjType;

#[derive(Debug, Default)]
pub struct ScopedSymbolTable {
    frames: Vec<IndexMap<String, MjType>>,
}

impl ScopedSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.frames.push(IndexMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.frames.pop();
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: MjType) {
        self.frames
            .last_mut()
            .expect("no open scope")
            .insert(name.into(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<&MjType> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Only the innermost frame; redeclaration checks look here.
    pub fn lookup_current(&self, name: &str) -> Option<&MjType> {
        self.frames.last().and_then(|frame| frame.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_frames_shadow_outer() {
        let mut scope = ScopedSymbolTable::new();
        scope.push_scope();
        scope.insert("x", MjType::Int);
        scope.push_scope();
        scope.insert("x", MjType::Boolean);
        assert_eq!(scope.lookup("x"), Some(&MjType::Boolean));
        scope.pop_scope();
        assert_eq!(scope.lookup("x"), Some(&MjType::Int));
    }

    #[test]
    fn lookup_current_ignores_outer_frames() {
        let mut scope = ScopedSymbolTable::new();
        scope.push_scope();
        scope.insert("x", MjType::Int);
        scope.push_scope();
        assert!(scope.lookup_current("x").is_none());
        assert_eq!(scope.lookup("x"), Some(&MjType::Int));
    }
}
