use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(String),
	#[error("not following {0}")]
	NotFollowing(String),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/follow", get_with(get_feed, get_feed_docs))
		.api_route("/:username", get_with(get_profile, get_profile_docs))
		.api_route("/:username/follow", post_with(follow, follow_docs))
		.api_route("/:username/unfollow", post_with(unfollow, unfollow_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) | Self::NotFollowing(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		vec![error::Message {
			content: self.to_string().into(),
			field: None,
			details: None,
		}]
	}
}

#[cfg(test)]
mod test {
	use axum_test::multipart::MultipartForm;

	use crate::test::*;

	async fn publish(app: &TestServer, text: &str) {
		let response = app
			.post("/new")
			.multipart(MultipartForm::new().add_text("text", text))
			.await;

		assert_eq!(response.status_code(), 303);
	}

	#[sqlx::test]
	async fn test_follow_and_feed(pool: Database) {
		let mut app = app(pool);

		register(&app, "alice").await;
		publish(&app, "from alice").await;

		app.clear_cookies();
		register(&app, "bob").await;

		let feed = app.get("/follow").await.json::<serde_json::Value>();

		assert_eq!(feed["total"], 0);

		let response = app.post("/alice/follow").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location").to_str().unwrap(), "/alice");

		let feed = app.get("/follow").await.json::<serde_json::Value>();

		assert_eq!(feed["total"], 1);
		assert_eq!(feed["items"][0]["author"], "alice");

		let profile = app.get("/alice").await.json::<serde_json::Value>();

		assert_eq!(profile["followers"], 1);
		assert_eq!(profile["following"], 0);
		assert_eq!(profile["is_following"], true);

		let response = app.post("/alice/unfollow").await;

		assert_eq!(response.status_code(), 303);

		let feed = app.get("/follow").await.json::<serde_json::Value>();

		assert_eq!(feed["total"], 0);
	}

	#[sqlx::test]
	async fn test_follow_is_idempotent(pool: Database) {
		let mut app = app(pool);

		register(&app, "alice").await;

		app.clear_cookies();
		register(&app, "bob").await;

		app.post("/alice/follow").await;

		let response = app.post("/alice/follow").await;

		assert_eq!(response.status_code(), 303);

		let profile = app.get("/alice").await.json::<serde_json::Value>();

		assert_eq!(profile["followers"], 1);
	}

	#[sqlx::test]
	async fn test_self_follow_is_ignored(pool: Database) {
		let app = app(pool);

		register(&app, "alice").await;

		let response = app.post("/alice/follow").await;

		assert_eq!(response.status_code(), 303);

		let profile = app.get("/alice").await.json::<serde_json::Value>();

		assert_eq!(profile["followers"], 0);
	}

	#[sqlx::test]
	async fn test_unfollow_without_follow_404s(pool: Database) {
		let mut app = app(pool);

		register(&app, "alice").await;

		app.clear_cookies();
		register(&app, "bob").await;

		let response = app.post("/alice/unfollow").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_anonymous_profile_has_no_follow_flag(pool: Database) {
		let mut app = app(pool);

		register(&app, "alice").await;
		publish(&app, "hello").await;

		app.clear_cookies();

		let response = app.get("/alice").await;

		assert_eq!(response.status_code(), 200);

		let profile = app.get("/alice").await.json::<serde_json::Value>();

		assert_eq!(profile["username"], "alice");
		assert_eq!(profile["posts"]["total"], 1);
		assert!(profile.get("is_following").is_none());
	}

	#[sqlx::test]
	async fn test_unknown_profile_404s(pool: Database) {
		let app = app(pool);

		let response = app.get("/nobody").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_feed_excludes_unfollowed_authors(pool: Database) {
		let mut app = app(pool);

		register(&app, "alice").await;
		publish(&app, "from alice").await;

		app.clear_cookies();
		register(&app, "carol").await;
		publish(&app, "from carol").await;

		app.clear_cookies();
		register(&app, "bob").await;
		app.post("/alice/follow").await;

		let feed = app.get("/follow").await.json::<serde_json::Value>();

		assert_eq!(feed["total"], 1);
		assert_eq!(feed["items"][0]["text"], "from alice");
	}
}
