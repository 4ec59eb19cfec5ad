//! Plugin-registered sub-results, retrievable by string key

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

pub const TAINT_FLOWS: &str = "taint-flows";
pub const EXCEPTION: &str = "exception";
pub const SOUNDNESS_WARNINGS: &str = "soundness-warnings";

#[derive(Default)]
pub struct NamedResults {
    entries: BTreeMap<String, Box<dyn Any>>,
}

impl NamedResults {
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// Typed lookup; `None` if absent or stored under another type
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for NamedResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookup() {
        let mut results = NamedResults::default();
        results.insert(SOUNDNESS_WARNINGS, vec!["w1".to_string()]);
        assert_eq!(
            results.get::<Vec<String>>(SOUNDNESS_WARNINGS).map(Vec::len),
            Some(1)
        );
        assert!(results.get::<u32>(SOUNDNESS_WARNINGS).is_none());
        assert!(results.get::<Vec<String>>(TAINT_FLOWS).is_none());
        assert_eq!(results.keys().collect::<Vec<_>>(), vec![SOUNDNESS_WARNINGS]);
    }
}
