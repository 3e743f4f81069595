use std::collections::HashMap;

use crate::error::BrimleyError;

/// Name-keyed store with aliases and quarantine, used for both the entity
/// registry and the function registry.
///
/// Invariant: a name is present in at most one of `items`, `aliases`,
/// `quarantined` at any time. `register`/`register_alias` enforce this on
/// insertion; nothing downstream needs to re-check it.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    items: HashMap<String, T>,
    aliases: HashMap<String, String>,
    quarantined: HashMap<String, String>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            items: HashMap::new(),
            aliases: HashMap::new(),
            quarantined: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.items.contains_key(name) || self.aliases.contains_key(name) || self.quarantined.contains_key(name)
    }

    /// Register a single item under `name`. Fails if `name` is already a
    /// canonical item, an alias, or quarantined.
    pub fn register(&mut self, name: impl Into<String>, item: T) -> Result<(), BrimleyError> {
        let name = name.into();
        if self.name_taken(&name) {
            return Err(BrimleyError::DuplicateName { name });
        }
        self.items.insert(name, item);
        Ok(())
    }

    /// Register many `(name, item)` pairs; stops and returns the first failure.
    pub fn register_all(&mut self, items: impl IntoIterator<Item = (String, T)>) -> Result<(), BrimleyError> {
        for (name, item) in items {
            self.register(name, item)?;
        }
        Ok(())
    }

    /// Register `alias` as pointing at `target`. Fails on chains (target must
    /// already be a canonical item, not itself an alias), self-alias, or
    /// shadowing an existing name.
    pub fn register_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) -> Result<(), BrimleyError> {
        let alias = alias.into();
        let target = target.into();
        if alias == target {
            return Err(BrimleyError::InvalidName { name: alias });
        }
        if !self.items.contains_key(&target) {
            return Err(BrimleyError::NotFound { name: target });
        }
        if self.name_taken(&alias) {
            return Err(BrimleyError::DuplicateName { name: alias });
        }
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Mark `name` quarantined with `reason`. The item is removed from the
    /// live item map (if present) but the name is retained as quarantined, so
    /// it cannot be silently re-registered under a different meaning this
    /// cycle and lookups surface the reason rather than "not found".
    pub fn mark_quarantined(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        let name = name.into();
        self.items.remove(&name);
        self.aliases.retain(|_, target| target != &name);
        self.quarantined.insert(name, reason.into());
    }

    /// Resolve `name` through at most one alias hop, then return the item.
    /// Raises with the stored reason if the resolved name is quarantined.
    pub fn get(&self, name: &str) -> Result<&T, BrimleyError> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        if let Some(reason) = self.quarantined.get(canonical) {
            return Err(BrimleyError::Quarantined { name: canonical.to_string(), reason: reason.clone() });
        }
        self.items.get(canonical).ok_or_else(|| BrimleyError::NotFound { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.items.contains_key(canonical)
    }

    pub fn is_quarantined(&self, name: &str) -> bool {
        self.quarantined.contains_key(name)
    }

    pub fn iterate(&self) -> impl Iterator<Item = (&String, &T)> {
        self.items.iter()
    }

    pub fn length(&self) -> usize {
        self.items.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_duplicate_canonical_name() {
        let mut reg: Registry<i32> = Registry::new();
        reg.register("a", 1).unwrap();
        let err = reg.register("a", 2).unwrap_err();
        assert_eq!(err.code(), "ERR_DUPLICATE_NAME");
    }

    #[test]
    fn alias_resolves_one_hop_to_target() {
        let mut reg: Registry<i32> = Registry::new();
        reg.register("a", 1).unwrap();
        reg.register_alias("b", "a").unwrap();
        assert_eq!(*reg.get("b").unwrap(), 1);
    }

    #[test]
    fn alias_cannot_chain_through_another_alias() {
        let mut reg: Registry<i32> = Registry::new();
        reg.register("a", 1).unwrap();
        reg.register_alias("b", "a").unwrap();
        // "b" is an alias, not a canonical item, so aliasing "c" -> "b" must fail.
        let err = reg.register_alias("c", "b").unwrap_err();
        assert_eq!(err.code(), "ERR_NOT_FOUND");
    }

    #[test]
    fn alias_cannot_shadow_existing_name() {
        let mut reg: Registry<i32> = Registry::new();
        reg.register("a", 1).unwrap();
        reg.register("b", 2).unwrap();
        let err = reg.register_alias("b", "a").unwrap_err();
        assert_eq!(err.code(), "ERR_DUPLICATE_NAME");
    }

    #[test]
    fn self_alias_rejected() {
        let mut reg: Registry<i32> = Registry::new();
        reg.register("a", 1).unwrap();
        let err = reg.register_alias("a", "a").unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_NAME");
    }

    #[test]
    fn quarantined_lookup_surfaces_reason() {
        let mut reg: Registry<i32> = Registry::new();
        reg.register("hello", 1).unwrap();
        reg.mark_quarantined("hello", "invalid frontmatter: missing return_shape");
        let err = reg.get("hello").unwrap_err();
        assert!(err.to_string().contains("invalid frontmatter"));
    }

    #[test]
    fn quarantine_is_cleared_by_re_registering_in_a_fresh_registry() {
        // Quarantine lives on a specific Registry instance, not permanently on
        // a name — the reload engine rebuilds a fresh Registry per swap.
        let mut old: Registry<i32> = Registry::new();
        old.register("hello", 1).unwrap();
        old.mark_quarantined("hello", "broken");
        assert!(old.get("hello").is_err());

        let mut fresh: Registry<i32> = Registry::new();
        fresh.register("hello", 2).unwrap();
        assert_eq!(*fresh.get("hello").unwrap(), 2);
    }

    #[test]
    fn name_exclusivity_across_items_aliases_and_quarantine() {
        let mut reg: Registry<i32> = Registry::new();
        reg.register("a", 1).unwrap();
        assert!(reg.register_alias("a", "a").is_err());
        reg.mark_quarantined("a", "broken");
        assert!(reg.register("a", 2).is_err());
    }
}
