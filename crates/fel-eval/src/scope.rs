use rustc_hash::FxHashMap;

use crate::value::Value;

/// The runtime counterpart of [`fel_typeck::Scope`]: same owned
/// parent-chain shape, but binding names to evaluated [`Value`]s instead of
/// types. Kept as a separate type (rather than a generic `Scope<T>` shared
/// with `fel-typeck`) because the two crates check/evaluate at different
/// pipeline stages and gain nothing from sharing the definition.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Box<Scope>>,
    identifiers: FxHashMap<String, Value>,
}

impl Scope {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(self) -> Scope {
        Scope {
            parent: Some(Box::new(self)),
            identifiers: FxHashMap::default(),
        }
    }

    pub fn pop(self) -> Scope {
        *self.parent.expect("popped the root scope")
    }

    pub fn declare(&mut self, name: impl Into<String>, value: Value) {
        self.identifiers.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.identifiers
            .get(name)
            .or_else(|| self.parent.as_deref().and_then(|p| p.lookup(name)))
    }

    /// Assigns to an already-declared name, walking outward through
    /// parents, without creating a new binding (used by `=`/`+=`/`[]=`
    /// statements, which always target an existing variable).
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.identifiers.contains_key(name) {
            self.identifiers.insert(name.to_string(), value);
            true
        } else if let Some(parent) = self.parent.as_deref_mut() {
            parent.assign(name, value)
        } else {
            false
        }
    }
}
