use fel_common::Span;
use rustc_hash::FxHashMap;

use crate::type_info::TypeInfo;

/// A lexical scope. Parent links are owned, not borrowed -- `child`/`pop`
/// move the whole chain instead of juggling `&mut` borrows of a tree, which
/// keeps the checker's recursive-descent walk free of lifetime parameters
/// (spec.md §4.4's Scope Data Model, adapted: the source keeps a pointer to
/// its parent and mutates in place, which Rust's borrow checker won't allow
/// for a tree walked both downward and back upward).
///
/// Each binding also keeps the span of its declaration, so a later
/// redeclaration in the same scope can point a diagnostic back at the
/// original (spec.md §8's "exactly two diagnostics, one per occurrence").
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Box<Scope>>,
    identifiers: FxHashMap<String, (TypeInfo, Span)>,
}

impl Scope {
    pub fn root() -> Self {
        Self::default()
    }

    /// Enter a nested scope, taking ownership of `self` as its parent.
    pub fn child(self) -> Scope {
        Scope {
            parent: Some(Box::new(self)),
            identifiers: FxHashMap::default(),
        }
    }

    /// Leave the current scope, returning ownership of its parent.
    ///
    /// # Panics
    /// Panics if called on the root scope; callers only ever `pop` a scope
    /// they themselves created with [`child`](Scope::child).
    pub fn pop(self) -> Scope {
        *self.parent.expect("popped the root scope")
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: TypeInfo, span: Span) {
        self.identifiers.insert(name.into(), (ty, span));
    }

    /// Look up `name`, walking outward through parents.
    pub fn lookup(&self, name: &str) -> Option<&TypeInfo> {
        self.identifiers
            .get(name)
            .map(|(ty, _)| ty)
            .or_else(|| self.parent.as_deref().and_then(|p| p.lookup(name)))
    }

    /// The span of `name`'s declaration in this exact scope, if any --
    /// `Some` means `name` is already declared locally (not just in an
    /// ancestor), and the span is what a duplicate-declaration diagnostic
    /// points back at.
    pub fn local_span(&self, name: &str) -> Option<Span> {
        self.identifiers.get(name).map(|(_, span)| *span)
    }
}
