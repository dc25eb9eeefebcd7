use std::borrow::Cow;

use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown group {0}")]
	UnknownGroup(Uuid),
	#[error("attachment is not an image")]
	NotAnImage,
	#[error("post {0} has no image")]
	NoImage(Uuid),
	#[error("not the author of post {post_id}")]
	NotAuthor { username: String, post_id: Uuid },
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
		.api_route("/", get_with(get_index, get_index_docs))
		.api_route("/new", post_with(create_post, create_post_docs))
		.api_route("/:username/:post_id", get_with(get_post, get_post_docs))
		.api_route(
			"/:username/:post_id/image",
			get_with(get_post_image, get_post_image_docs),
		)
		.api_route(
			"/:username/:post_id/edit",
			post_with(edit_post, edit_post_docs),
		)
		.api_route(
			"/:username/:post_id/comment",
			post_with(add_comment, add_comment_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::NoImage(..) => StatusCode::NOT_FOUND,
			Self::UnknownGroup(..) | Self::NotAnImage => StatusCode::UNPROCESSABLE_ENTITY,
			Self::NotAuthor { .. } => StatusCode::SEE_OTHER,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(post) | Self::NoImage(post) => vec![error::Message {
				content: self.to_string().into(),
				field: None,
				details: Some(Cow::Owned({
					let mut map = error::Map::new();
					map.insert("post".into(), json!(post));
					map
				})),
			}],
			Self::UnknownGroup(..) => vec![error::Message {
				content: self.to_string().into(),
				field: Some("group_id".into()),
				details: None,
			}],
			Self::NotAnImage => vec![error::Message {
				content: self.to_string().into(),
				field: Some("image".into()),
				details: None,
			}],
			Self::NotAuthor { .. } => vec![error::Message {
				content: self.to_string().into(),
				field: None,
				details: None,
			}],
		}
	}

	fn location(&self) -> Option<String> {
		match self {
			Self::NotAuthor { username, post_id } => Some(format!("/{username}/{post_id}")),
			_ => None,
		}
	}
}

#[cfg(test)]
mod test {
	use axum_test::multipart::{MultipartForm, Part};

	use crate::test::*;

	fn post_form(text: &str) -> MultipartForm {
		MultipartForm::new().add_text("text", text.to_owned())
	}

	#[sqlx::test]
	async fn test_create_post_flow(pool: Database) {
		let app = app(pool);

		register(&app, "john").await;

		let response = app.post("/new").multipart(post_form("hello world")).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location").to_str().unwrap(), "/");

		let response = app.get("/").await;

		assert_eq!(response.status_code(), 200);

		let page = response.json::<serde_json::Value>();

		assert_eq!(page["total"], 1);
		assert_eq!(page["items"][0]["text"], "hello world");
		assert_eq!(page["items"][0]["author"], "john");
	}

	#[sqlx::test]
	async fn test_unauthenticated_create_redirects_to_login(pool: Database) {
		let app = app(pool);

		let response = app.post("/new").multipart(post_form("hello world")).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(
			response.header("location").to_str().unwrap(),
			"/auth/login?next=/new"
		);

		let response = app.get("/").await;

		assert_eq!(response.json::<serde_json::Value>()["total"], 0);
	}

	#[sqlx::test]
	async fn test_unparseable_session_cookie_is_anonymous(pool: Database) {
		let mut app = app(pool);

		app.add_cookie(cookie::Cookie::new("session", "garbage"));

		let response = app.post("/new").multipart(post_form("hello world")).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(
			response.header("location").to_str().unwrap(),
			"/auth/login?next=/new"
		);
	}

	#[sqlx::test]
	async fn test_stale_session_cookie_is_anonymous(pool: Database) {
		let mut app = app(pool);

		// A well-formed cookie whose session row no longer exists.
		app.add_cookie(cookie::Cookie::new(
			"session",
			uuid::Uuid::new_v4().to_string(),
		));

		let response = app.post("/new").multipart(post_form("hello world")).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(
			response.header("location").to_str().unwrap(),
			"/auth/login?next=/new"
		);

		let response = app.get("/").await;

		assert_eq!(response.json::<serde_json::Value>()["total"], 0);
	}

	#[sqlx::test]
	async fn test_author_edit_reflected_everywhere(pool: Database) {
		let state = state(pool);
		let app = server(state.clone());

		register(&app, "john").await;
		app.post("/new").multipart(post_form("first draft")).await;

		let page = app.get("/").await.json::<serde_json::Value>();
		let id = page["items"][0]["id"].as_str().unwrap().to_owned();

		let response = app
			.post(&format!("/john/{id}/edit"))
			.multipart(post_form("final copy"))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(
			response.header("location").to_str().unwrap(),
			format!("/john/{id}")
		);

		// The index page was cached by the read above.
		state.cache.clear();

		let index = app.get("/").await.json::<serde_json::Value>();

		assert_eq!(index["items"][0]["text"], "final copy");

		let profile = app.get("/john").await.json::<serde_json::Value>();

		assert_eq!(profile["posts"]["items"][0]["text"], "final copy");

		let detail = app
			.get(&format!("/john/{id}"))
			.await
			.json::<serde_json::Value>();

		assert_eq!(detail["post"]["text"], "final copy");
	}

	#[sqlx::test]
	async fn test_non_author_edit_is_dropped(pool: Database) {
		let mut app = app(pool);

		register(&app, "john").await;
		app.post("/new").multipart(post_form("john's words")).await;

		let page = app.get("/").await.json::<serde_json::Value>();
		let id = page["items"][0]["id"].as_str().unwrap().to_owned();

		app.clear_cookies();
		register(&app, "jane").await;

		let response = app
			.post(&format!("/john/{id}/edit"))
			.multipart(post_form("jane's words"))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(
			response.header("location").to_str().unwrap(),
			format!("/john/{id}")
		);

		let detail = app
			.get(&format!("/john/{id}"))
			.await
			.json::<serde_json::Value>();

		assert_eq!(detail["post"]["text"], "john's words");
	}

	#[sqlx::test]
	async fn test_rejects_non_image_upload(pool: Database) {
		let app = app(pool);

		register(&app, "john").await;

		let form = post_form("with attachment").add_part(
			"image",
			Part::bytes(b"definitely not an image".as_slice()).file_name("note.txt"),
		);

		let response = app.post("/new").multipart(form).await;

		assert_eq!(response.status_code(), 422);

		let response = app.get("/").await;

		assert_eq!(response.json::<serde_json::Value>()["total"], 0);
	}

	#[sqlx::test]
	async fn test_image_roundtrip(pool: Database) {
		let app = app(pool);

		register(&app, "john").await;

		let form = post_form("look at this").add_part(
			"image",
			Part::bytes(PNG_1X1).file_name("pixel.png"),
		);

		app.post("/new").multipart(form).await;

		let page = app.get("/").await.json::<serde_json::Value>();
		let id = page["items"][0]["id"].as_str().unwrap().to_owned();

		assert_eq!(page["items"][0]["image_type"], "image/png");

		let response = app.get(&format!("/john/{id}/image")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header("content-type").to_str().unwrap(), "image/png");
		assert_eq!(response.as_bytes().as_ref(), PNG_1X1);
	}

	#[sqlx::test]
	async fn test_image_of_plain_post_404s(pool: Database) {
		let app = app(pool);

		register(&app, "john").await;
		app.post("/new").multipart(post_form("no image here")).await;

		let page = app.get("/").await.json::<serde_json::Value>();
		let id = page["items"][0]["id"].as_str().unwrap().to_owned();

		let response = app.get(&format!("/john/{id}/image")).await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_comment_flow(pool: Database) {
		let mut app = app(pool);

		register(&app, "john").await;
		app.post("/new").multipart(post_form("discuss")).await;

		let page = app.get("/").await.json::<serde_json::Value>();
		let id = page["items"][0]["id"].as_str().unwrap().to_owned();

		app.clear_cookies();
		register(&app, "jane").await;

		let response = app
			.post(&format!("/john/{id}/comment"))
			.json(&json!({ "text": "well put" }))
			.await;

		assert_eq!(response.status_code(), 303);

		let detail = app
			.get(&format!("/john/{id}"))
			.await
			.json::<serde_json::Value>();

		assert_eq!(detail["comments"][0]["text"], "well put");
		assert_eq!(detail["comments"][0]["author"], "jane");
	}

	#[sqlx::test]
	async fn test_index_is_cached_until_cleared(pool: Database) {
		let state = state(pool);
		let app = server(state.clone());

		let page = app.get("/").await.json::<serde_json::Value>();

		assert_eq!(page["total"], 0);

		register(&app, "john").await;
		app.post("/new").multipart(post_form("fresh post")).await;

		// Still the cached empty page.
		let page = app.get("/").await.json::<serde_json::Value>();

		assert_eq!(page["total"], 0);

		state.cache.clear();

		let page = app.get("/").await.json::<serde_json::Value>();

		assert_eq!(page["total"], 1);
	}
}
