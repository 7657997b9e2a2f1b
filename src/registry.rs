//! Keyed lookup of processors by file kind, with a default fallback.

use std::collections::HashMap;
use std::sync::Arc;

/// Case-insensitive registry mapping a kind key (usually a file extension
/// or language name) to a shared processor. Registering the same key twice
/// replaces the earlier entry.
pub struct ProcessorRegistry<P: ?Sized> {
    processors: HashMap<String, Arc<P>>,
    default: Option<Arc<P>>,
}

impl<P: ?Sized> Default for ProcessorRegistry<P> {
    fn default() -> Self {
        Self {
            processors: HashMap::new(),
            default: None,
        }
    }
}

impl<P: ?Sized> ProcessorRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, processor: Arc<P>) {
        self.processors.insert(key.trim().to_lowercase(), processor);
    }

    pub fn register_default(&mut self, processor: Arc<P>) {
        self.default = Some(processor);
    }

    /// Exact-key lookup, ignoring case. No fallback.
    pub fn try_get(&self, key: &str) -> Option<Arc<P>> {
        self.processors.get(&key.trim().to_lowercase()).cloned()
    }

    /// Keyed lookup falling back to the default processor, if one is set.
    pub fn get_or_default(&self, key: &str) -> Option<Arc<P>> {
        self.try_get(key).or_else(|| self.default.clone())
    }

    pub fn default_processor(&self) -> Option<Arc<P>> {
        self.default.clone()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry: ProcessorRegistry<str> = ProcessorRegistry::new();
        registry.register("CS", Arc::from("csharp"));
        assert_eq!(registry.try_get("cs").as_deref(), Some("csharp"));
        assert_eq!(registry.try_get(" Cs ").as_deref(), Some("csharp"));
    }

    #[test]
    fn missing_key_falls_back_to_default() {
        let mut registry: ProcessorRegistry<str> = ProcessorRegistry::new();
        registry.register("rs", Arc::from("rust"));
        registry.register_default(Arc::from("plain"));

        assert_eq!(registry.get_or_default("rs").as_deref(), Some("rust"));
        assert_eq!(registry.get_or_default("md").as_deref(), Some("plain"));
        assert_eq!(registry.try_get("md"), None);
    }

    #[test]
    fn no_default_yields_none() {
        let registry: ProcessorRegistry<str> = ProcessorRegistry::new();
        assert!(registry.get_or_default("anything").is_none());
    }

    #[test]
    fn re_registering_replaces_the_entry() {
        let mut registry: ProcessorRegistry<str> = ProcessorRegistry::new();
        registry.register("cs", Arc::from("first"));
        registry.register("CS", Arc::from("second"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.try_get("cs").as_deref(), Some("second"));
    }
}
