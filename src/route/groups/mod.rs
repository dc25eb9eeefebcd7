use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown group {0}")]
	UnknownGroup(String),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/group/:slug", get_with(get_group, get_group_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownGroup(..) => StatusCode::NOT_FOUND,
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

	async fn seed_group(pool: &Database, title: &str, slug: &str) -> uuid::Uuid {
		sqlx::query_scalar::<_, uuid::Uuid>(
			r#"INSERT INTO "group" (title, slug, description) VALUES ($1, $2, $3) RETURNING id"#,
		)
		.bind(title)
		.bind(slug)
		.bind(format!("all about {title}"))
		.fetch_one(pool)
		.await
		.unwrap()
	}

	#[sqlx::test]
	async fn test_unknown_group_404s(pool: Database) {
		let app = app(pool);

		let response = app.get("/group/nope").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_group_lists_only_its_posts(pool: Database) {
		let trains = seed_group(&pool, "Trains", "trains").await;
		seed_group(&pool, "Boats", "boats").await;

		let app = app(pool);

		register(&app, "john").await;

		app.post("/new")
			.multipart(
				MultipartForm::new()
					.add_text("text", "steam engines")
					.add_text("group_id", trains.to_string()),
			)
			.await;
		app.post("/new")
			.multipart(MultipartForm::new().add_text("text", "no group here"))
			.await;

		let response = app.get("/group/trains").await;

		assert_eq!(response.status_code(), 200);

		let page = response.json::<serde_json::Value>();

		assert_eq!(page["group"]["title"], "Trains");
		assert_eq!(page["posts"]["total"], 1);
		assert_eq!(page["posts"]["items"][0]["text"], "steam engines");

		let page = app.get("/group/boats").await.json::<serde_json::Value>();

		assert_eq!(page["posts"]["total"], 0);
	}

	#[sqlx::test]
	async fn test_post_into_unknown_group_rejected(pool: Database) {
		let app = app(pool);

		register(&app, "john").await;

		let response = app
			.post("/new")
			.multipart(
				MultipartForm::new()
					.add_text("text", "lost post")
					.add_text("group_id", uuid::Uuid::new_v4().to_string()),
			)
			.await;

		assert_eq!(response.status_code(), 422);
	}
}
