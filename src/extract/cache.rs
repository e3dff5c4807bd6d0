//! Per-path memoization of extraction results.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::error::{Error, Result};
use crate::model::DocumentContext;

/// Extraction results keyed by path, kept for the lifetime of the process.
///
/// Failures are cached too (as empty contexts): a path is extracted at most
/// once no matter how the first attempt ended.
#[derive(Debug, Default)]
pub struct ExtractionCache {
    entries: Mutex<HashMap<PathBuf, Arc<DocumentContext>>>,
}

impl ExtractionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static ExtractionCache {
        static GLOBAL: OnceLock<ExtractionCache> = OnceLock::new();
        GLOBAL.get_or_init(ExtractionCache::new)
    }

    /// Return the cached context for `path`, running `load` on first request.
    ///
    /// Paths naming the same existing file share one entry. Whatever `load`
    /// produced first (including its options) is what every later caller
    /// gets. The error from a failed first load is returned only once; later
    /// calls get the cached empty context and `None`. The lock is held while
    /// loading so concurrent callers never extract the same path twice.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> (Arc<DocumentContext>, Option<Error>)
    where
        F: FnOnce(&Path) -> Result<DocumentContext>,
    {
        let key = cache_key(path);
        let mut entries = self.lock();
        if let Some(context) = entries.get(&key) {
            log::debug!("Extraction cache hit for {}", path.display());
            return (Arc::clone(context), None);
        }

        let (context, error) = match load(path) {
            Ok(context) => (context, None),
            Err(e) => {
                log::warn!("Continuing with an empty document: {}", e);
                (DocumentContext::empty(), Some(e))
            }
        };
        let context = Arc::new(context);
        entries.insert(key, Arc::clone(&context));
        (context, error)
    }

    /// Cached context for `path`, if it was loaded before.
    pub fn get(&self, path: &Path) -> Option<Arc<DocumentContext>> {
        self.lock().get(&cache_key(path)).cloned()
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<DocumentContext>>> {
        // Entries are only inserted whole, so a poisoned map is still consistent
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Canonical form of `path` when it exists, the path itself otherwise.
fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_loads_once_per_path() {
        let cache = ExtractionCache::new();
        let calls = Cell::new(0);
        let load = |_: &Path| {
            calls.set(calls.get() + 1);
            let mut ctx = DocumentContext::empty();
            ctx.full_text.push_str("text");
            Ok(ctx)
        };

        let (first, err) = cache.get_or_load(Path::new("a.pdf"), load);
        assert!(err.is_none());
        let (second, _) = cache.get_or_load(Path::new("a.pdf"), load);
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        cache.get_or_load(Path::new("b.pdf"), load);
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_equivalent_paths_share_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.pdf"), b"%PDF-1.7\n").unwrap();
        let direct = dir.path().join("doc.pdf");
        let dotted = dir.path().join(".").join("doc.pdf");

        let cache = ExtractionCache::new();
        let calls = Cell::new(0);
        let load = |_: &Path| {
            calls.set(calls.get() + 1);
            Ok(DocumentContext::empty())
        };

        let (first, _) = cache.get_or_load(&direct, load);
        let (second, _) = cache.get_or_load(&dotted, load);
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get(&dotted).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failure_cached_and_reported_once() {
        let cache = ExtractionCache::new();
        let path = Path::new("NoSuchFile.pdf");

        let (ctx, err) = cache.get_or_load(path, |p| Err(Error::SourceNotFound(p.to_path_buf())));
        assert!(ctx.is_empty());
        assert!(matches!(err, Some(Error::SourceNotFound(_))));

        let (ctx, err) = cache.get_or_load(path, |_| panic!("must not reload"));
        assert!(ctx.is_empty());
        assert!(err.is_none());
    }
}
