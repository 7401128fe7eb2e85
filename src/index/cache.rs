use crate::error::ResolveError;
use crate::links::Link;
use crate::prelude::*;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};

/// How many parsed project pages to keep around. Should be reasonable?
pub const DEFAULT_CAPACITY: usize = 64;

type Fetched = std::result::Result<Arc<Vec<Link>>, Arc<anyhow::Error>>;
type Entry = Arc<OnceCell<Fetched>>;

/// Bounded cache of parsed project pages, keyed by package name.
///
/// Two jobs in one structure. The `IndexMap` gives LRU bookkeeping: hits
/// move an entry to the back, eviction pops populated entries off the front.
/// The per-entry `OnceCell` gives the singleflight guarantee: concurrent
/// misses on one name all land on the same cell, exactly one caller runs
/// the fetch, and the rest block until they can share the result.
///
/// Populated entries are immutable; eviction only drops the mapping. The
/// cell holds the fetch *outcome*, so when a collapsed fetch fails, every
/// waiter blocked on it observes that one failure; the placeholder is then
/// removed so the next caller starts fresh -- failures are never cached.
pub struct PageCache {
    capacity: usize,
    entries: Mutex<IndexMap<PackageName, Entry>>,
}

impl PageCache {
    pub fn new(capacity: usize) -> PageCache {
        assert!(capacity > 0, "page cache needs room for at least one page");
        PageCache {
            capacity,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn get_or_fetch<F>(&self, package: &PackageName, fetch: F) -> Result<Arc<Vec<Link>>>
    where
        F: FnOnce() -> Result<Vec<Link>>,
    {
        let cell = self.touch(package);
        let outcome = cell
            .get_or_init(|| fetch().map(Arc::new).map_err(Arc::new))
            .clone();
        match outcome {
            Ok(links) => {
                self.evict_over_capacity();
                Ok(links)
            }
            Err(err) => {
                self.remove_placeholder(package, &cell);
                Err(shared_error(&err))
            }
        }
    }

    /// Look up (or insert a pending placeholder for) `package`, moving it to
    /// the most-recently-used position.
    fn touch(&self, package: &PackageName) -> Entry {
        let mut entries = self.entries.lock().unwrap();
        match entries.shift_remove(package) {
            Some(cell) => {
                entries.insert(package.clone(), cell.clone());
                cell
            }
            None => {
                let cell: Entry = Arc::new(OnceCell::new());
                entries.insert(package.clone(), cell.clone());
                cell
            }
        }
    }

    fn evict_over_capacity(&self) {
        let mut entries = self.entries.lock().unwrap();
        while entries.len() > self.capacity {
            // Oldest first, but never a cell some thread is still filling.
            let victim = entries
                .iter()
                .position(|(_, cell)| cell.get().is_some())
                .map(|idx| entries.get_index(idx).map(|(name, _)| name.clone()))
                .flatten();
            match victim {
                Some(name) => {
                    entries.shift_remove(&name);
                }
                None => break,
            }
        }
    }

    fn remove_placeholder(&self, package: &PackageName, cell: &Entry) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(current) = entries.get(package) {
            // Don't clobber a successful entry that raced in after us.
            if Arc::ptr_eq(current, cell) && !matches!(cell.get(), Some(Ok(_))) {
                entries.shift_remove(package);
            }
        }
    }

    #[cfg(test)]
    pub fn cached_packages(&self) -> Vec<PackageName> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

/// An `anyhow` chain can't be cloned out of its `Arc`, so each waiter on a
/// failed collapsed fetch gets a reconstruction: typed errors keep their
/// type (callers match on those), anything else keeps its rendered chain.
fn shared_error(err: &anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ResolveError>() {
        Some(resolve) => resolve.clone().into(),
        None => anyhow!("{:#}", err),
    }
}

impl Default for PageCache {
    fn default() -> Self {
        PageCache::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn name(s: &str) -> PackageName {
        s.try_into().unwrap()
    }

    fn fill(cache: &PageCache, s: &str) -> Arc<Vec<Link>> {
        cache.get_or_fetch(&name(s), || Ok(vec![])).unwrap()
    }

    #[test]
    fn test_hit_skips_fetch() {
        let cache = PageCache::new(4);
        fill(&cache, "pkg");
        let result = cache.get_or_fetch(&name("pkg"), || panic!("should not fetch"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_failure_is_not_cached() {
        let cache = PageCache::new(4);
        let err = cache.get_or_fetch(&name("pkg"), || Err(anyhow!("boom")));
        assert!(err.is_err());
        assert!(cache.cached_packages().is_empty());
        // and the next call gets to retry
        fill(&cache, "pkg");
        assert_eq!(cache.cached_packages(), vec![name("pkg")]);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = PageCache::new(2);
        fill(&cache, "a");
        fill(&cache, "b");
        // touch "a" so "b" becomes the eviction candidate
        fill(&cache, "a");
        fill(&cache, "c");
        assert_eq!(cache.cached_packages(), vec![name("a"), name("c")]);
    }

    #[test]
    fn test_shared_result() {
        let cache = PageCache::new(4);
        let first = fill(&cache, "pkg");
        let second = fill(&cache, "pkg");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_collapsed_failure_fails_waiters_together() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;
        use std::time::Duration;

        let cache = Arc::new(PageCache::new(4));
        let fetches = Arc::new(AtomicUsize::new(0));
        let threads = 4;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::new();
        for _ in 0..threads {
            let cache = cache.clone();
            let fetches = fetches.clone();
            let barrier = barrier.clone();
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                cache.get_or_fetch(&name("pkg"), || {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    // long enough that the other threads are all waiting on
                    // the cell, not arriving after the placeholder is gone
                    std::thread::sleep(Duration::from_millis(100));
                    Err(ResolveError::IndexApi {
                        status: 503,
                        reason: "index is down".into(),
                    }
                    .into())
                })
            }));
        }
        for handle in handles {
            let err = handle.join().unwrap().unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ResolveError>(),
                Some(ResolveError::IndexApi { status: 503, .. })
            ));
        }
        // one fetch for all four callers, and the failure was not cached
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(cache.cached_packages().is_empty());

        fill(&cache, "pkg");
        assert_eq!(cache.cached_packages(), vec![name("pkg")]);
    }
}
