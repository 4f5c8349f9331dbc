use ahash::AHashMap;

/// Per-source-id values that do not change between targets.
///
/// Entries are written once, on first encounter, and never overwritten.
#[derive(Debug, Default)]
pub(crate) struct SourceCache {
    areas: AHashMap<String, f64>,
    values: AHashMap<String, Vec<f64>>,
}

impl SourceCache {
    /// Full polygon area of source `id`, computing it on first use.
    pub(crate) fn area_or_insert_with(&mut self, id: &str, area: impl FnOnce() -> f64) -> f64 {
        if let Some(&cached) = self.areas.get(id) {
            return cached;
        }
        *self.areas.entry(id.to_string()).or_insert_with(area)
    }

    #[inline] pub(crate) fn has_values(&self, id: &str) -> bool { self.values.contains_key(id) }

    /// Store attribute values for `id` unless already present.
    pub(crate) fn insert_values(&mut self, id: &str, values: Vec<f64>) {
        self.values.entry(id.to_string()).or_insert(values);
    }

    #[inline] pub(crate) fn values(&self, id: &str) -> Option<&[f64]> {
        self.values.get(id).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::SourceCache;

    #[test]
    fn area_is_computed_once() {
        let mut cache = SourceCache::default();
        let mut calls = 0;
        assert_eq!(cache.area_or_insert_with("a", || { calls += 1; 100.0 }), 100.0);
        assert_eq!(cache.area_or_insert_with("a", || { calls += 1; 5.0 }), 100.0);
        assert_eq!(calls, 1);
    }

    #[test]
    fn values_are_never_overwritten() {
        let mut cache = SourceCache::default();
        assert!(!cache.has_values("a"));
        cache.insert_values("a", vec![1.0, 2.0]);
        cache.insert_values("a", vec![9.0, 9.0]);
        assert!(cache.has_values("a"));
        assert_eq!(cache.values("a"), Some(&[1.0, 2.0][..]));
        assert_eq!(cache.values("b"), None);
    }
}
