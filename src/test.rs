pub use axum_test::TestServer;
pub use serde_json::json;

pub use crate::Database;

use std::{sync::Arc, time::Duration};

use argon2::Argon2;

use crate::{cache::PageCache, router, State};

/// A tiny valid PNG (one transparent pixel) for image upload tests.
pub const PNG_1X1: &[u8] = &[
	0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
	0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
	0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x62, 0x00,
	0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
	0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Creates an application state over the test pool, with a cache TTL long
/// enough that tests control expiry themselves.
pub fn state(pool: Database) -> State {
	State {
		database: pool,
		hasher: Argon2::default(),
		cache: Arc::new(PageCache::new(Duration::from_secs(60))),
	}
}

pub fn server(state: State) -> TestServer {
	let mut server = TestServer::new(router(state)).unwrap();

	server.do_save_cookies();
	server
}

pub fn app(pool: Database) -> TestServer {
	server(state(pool))
}

/// Registers a fresh account, keeping its session cookie on the server.
pub async fn register(server: &TestServer, username: &str) {
	let response = server
		.post("/auth/register")
		.json(&json!({
			"email": format!("{username}@example.com"),
			"username": username,
			"password": "hunter2hunter",
		}))
		.await;

	assert_eq!(response.status_code(), 200);
}
