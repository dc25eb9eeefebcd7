use std::{
	collections::HashMap,
	sync::{PoisonError, RwLock},
	time::{Duration, Instant},
};

use bytes::Bytes;

/// Identifies one rendered page of a cacheable listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	view: &'static str,
	page: i64,
	size: i64,
}

impl CacheKey {
	pub fn index(page: i64, size: i64) -> Self {
		Self {
			view: "index",
			page,
			size,
		}
	}
}

#[derive(Debug)]
struct Entry {
	body: Bytes,
	stored_at: Instant,
}

/// A time-based cache for rendered response bodies.
///
/// Entries are served as-is until their TTL elapses; writes do not touch the
/// cache, so a listing may lag behind the table by up to one TTL.
#[derive(Debug)]
pub struct PageCache {
	ttl: Duration,
	entries: RwLock<HashMap<CacheKey, Entry>>,
}

impl PageCache {
	pub fn new(ttl: Duration) -> Self {
		Self {
			ttl,
			entries: RwLock::new(HashMap::new()),
		}
	}

	/// Returns the cached body for `key`, dropping it first if it has expired.
	pub fn get(&self, key: &CacheKey) -> Option<Bytes> {
		let mut entries = self
			.entries
			.write()
			.unwrap_or_else(PoisonError::into_inner);

		match entries.get(key) {
			Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.body.clone()),
			Some(..) => {
				entries.remove(key);
				None
			}
			None => None,
		}
	}

	pub fn put(&self, key: CacheKey, body: Bytes) {
		let mut entries = self
			.entries
			.write()
			.unwrap_or_else(PoisonError::into_inner);

		entries.insert(
			key,
			Entry {
				body,
				stored_at: Instant::now(),
			},
		);
	}

	pub fn invalidate(&self, key: &CacheKey) {
		self.entries
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(key);
	}

	pub fn clear(&self) {
		self.entries
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.clear();
	}

	pub fn len(&self) -> usize {
		self.entries
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn key(page: i64) -> CacheKey {
		CacheKey::index(page, 10)
	}

	#[test]
	fn test_put_then_get() {
		let cache = PageCache::new(Duration::from_secs(60));

		cache.put(key(1), Bytes::from_static(b"page one"));

		assert_eq!(cache.get(&key(1)), Some(Bytes::from_static(b"page one")));
		assert_eq!(cache.get(&key(2)), None);
	}

	#[test]
	fn test_expiry() {
		let cache = PageCache::new(Duration::from_millis(10));

		cache.put(key(1), Bytes::from_static(b"stale"));
		std::thread::sleep(Duration::from_millis(20));

		assert_eq!(cache.get(&key(1)), None);
		assert!(cache.is_empty());
	}

	#[test]
	fn test_invalidate_and_clear() {
		let cache = PageCache::new(Duration::from_secs(60));

		cache.put(key(1), Bytes::from_static(b"one"));
		cache.put(key(2), Bytes::from_static(b"two"));

		cache.invalidate(&key(1));
		assert_eq!(cache.get(&key(1)), None);
		assert_eq!(cache.len(), 1);

		cache.clear();
		assert!(cache.is_empty());
	}

	#[test]
	fn test_recovers_from_poisoned_lock() {
		let cache = std::sync::Arc::new(PageCache::new(Duration::from_secs(60)));
		cache.put(key(1), Bytes::from_static(b"one"));

		let inner = cache.clone();
		let _ = std::thread::spawn(move || {
			let _guard = inner
				.entries
				.write()
				.unwrap_or_else(PoisonError::into_inner);

			panic!("poison the lock");
		})
		.join();

		assert_eq!(cache.get(&key(1)), Some(Bytes::from_static(b"one")));
	}
}
