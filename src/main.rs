#![warn(clippy::pedantic)]

mod cache;
mod error;
mod extract;
mod openapi;
mod ratelimit;
mod route;
mod session;
#[cfg(test)]
mod test;
mod trace;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{Extension, Router};
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use cache::PageCache;

pub use error::AppError;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as a database connection pool, a hash configuration (if it's expensive
/// to create), or a cache.
///
/// For dependencies only used by a single handler, you can combine states instead.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub cache: Arc<PageCache>,
}

fn router(state: State) -> Router {
	let mut api = OpenApi::default();

	let secure = ratelimit::secure();
	let default = ratelimit::default();

	ratelimit::cleanup_old_limits(&[&secure, &default]);

	aide::axum::ApiRouter::new()
		.nest(
			"/auth",
			route::auth::routes().layer(GovernorLayer { config: secure }),
		)
		.nest("/docs", route::docs::routes())
		.merge(route::groups::routes())
		.merge(route::users::routes())
		.merge(route::posts::routes())
		.finish_api_with(&mut api, openapi::docs)
		.fallback(not_found)
		.layer(Extension(Arc::new(api)))
		.layer(GovernorLayer { config: default })
		.layer(TraceLayer::new_for_http())
		.layer(CompressionLayer::new())
		.layer(CorsLayer::permissive())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.layer(PropagateRequestIdLayer::x_request_id())
		.with_state(state)
}

async fn not_found() -> impl axum::response::IntoResponse {
	(
		axum::http::StatusCode::NOT_FOUND,
		axum::Json(error::Payload {
			success: false,
			errors: vec![error::Message {
				content: "not found".into(),
				field: None,
				details: None,
			}],
		}),
	)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let _guard = trace::init_tracing_subscriber();

	let database =
		Database::connect(&std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"))
			.await
			.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let ttl = std::env::var("CACHE_TTL_SECONDS").map_or(20, |ttl| {
		ttl.parse().expect("CACHE_TTL_SECONDS must be a number")
	});

	let state = State {
		database,
		hasher: Argon2::default(),
		cache: Arc::new(PageCache::new(Duration::from_secs(ttl))),
	};

	let app = router(state);

	let port = std::env::var("PORT").map_or_else(
		|_| 3000,
		|port| port.parse().expect("PORT must be a number"),
	);

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await
	.unwrap();
}
