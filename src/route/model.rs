use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn one() -> i64 {
	1
}

#[inline]
fn ten() -> i64 {
	10
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed). Out-of-range pages are clamped
	/// to the nearest valid page rather than rejected.
	#[serde(default = "one")]
	pub page: i64,
	/// The number of items to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten")]
	pub size: i64,
}

impl Paginate {
	/// Resolves the request against the row count. A page past the end becomes
	/// the last page, anything below one becomes the first. An empty listing
	/// still has one (empty) page.
	pub fn resolve(&self, total: i64) -> Window {
		let pages = ((total + self.size - 1) / self.size).max(1);

		Window {
			page: self.page.clamp(1, pages),
			size: self.size,
			pages,
			total,
		}
	}
}

/// A page window resolved against a concrete row count.
#[derive(Debug, Clone, Copy)]
pub struct Window {
	pub page: i64,
	pub size: i64,
	pub pages: i64,
	pub total: i64,
}

impl Window {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * self.size
	}

	pub fn limit(&self) -> i64 {
		self.size
	}
}

/// One page of a listing.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub page: i64,
	pub pages: i64,
	pub total: i64,
	pub has_next: bool,
	pub has_previous: bool,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, window: Window) -> Self {
		Self {
			items,
			page: window.page,
			pages: window.pages,
			total: window.total,
			has_next: window.page < window.pages,
			has_previous: window.page > 1,
		}
	}
}

#[cfg(test)]
mod test {
	use super::Paginate;

	#[test]
	fn test_resolve_offset() {
		let mut paginate = Paginate { page: 1, size: 10 };

		assert_eq!(paginate.resolve(25).offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.resolve(25).offset(), 10);

		paginate.size = 5;

		assert_eq!(paginate.resolve(25).offset(), 5);
	}

	#[test]
	fn test_resolve_clamps_page() {
		let paginate = Paginate { page: 99, size: 10 };
		let window = paginate.resolve(25);

		assert_eq!(window.pages, 3);
		assert_eq!(window.page, 3);
		assert_eq!(window.offset(), 20);

		let paginate = Paginate { page: -3, size: 10 };

		assert_eq!(paginate.resolve(25).page, 1);
	}

	#[test]
	fn test_resolve_empty_listing() {
		let paginate = Paginate { page: 4, size: 10 };
		let window = paginate.resolve(0);

		assert_eq!(window.pages, 1);
		assert_eq!(window.page, 1);
		assert_eq!(window.offset(), 0);
	}

	#[test]
	fn test_page_flags() {
		let paginate = Paginate { page: 2, size: 10 };
		let page = super::Page::new(vec![0; 10], paginate.resolve(25));

		assert!(page.has_next);
		assert!(page.has_previous);

		let page = super::Page::new(vec![0; 5], Paginate { page: 3, size: 10 }.resolve(25));

		assert!(!page.has_next);
		assert!(page.has_previous);
	}
}
