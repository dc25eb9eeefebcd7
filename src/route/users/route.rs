use aide::axum::IntoApiResponse;
use axum::{
	extract::State,
	response::{IntoResponse, Redirect},
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Path, Query, Session},
	openapi::tag,
	route::posts::{
		self,
		route::{post_page, PostFilter},
	},
	AppState, Database,
};

use super::{model, Error, RouteError};

async fn fetch_author(database: &Database, username: &str) -> Result<Uuid, RouteError> {
	sqlx::query_scalar::<_, Uuid>(r#"SELECT id FROM "user" WHERE username = $1"#)
		.bind(username)
		.fetch_optional(database)
		.await?
		.ok_or_else(|| Error::UnknownUser(username.to_owned()).into())
}

/// Read profile
/// Returns an author's profile: a page of their posts, follower and following
/// counts, and whether the requesting user follows them when a session is
/// present.
#[route(tag = tag::PROFILE, response(status = 200, description = "The profile.", shape = "Json<model::Profile>"), response(status = 404, description = "No such user."))]
pub async fn get_profile(
	State(state): State<AppState>,
	session: Option<Session>,
	Path(path): Path<model::UsernamePath>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::Profile>, RouteError> {
	let author_id = fetch_author(&state.database, &path.username).await?;

	let posts = post_page(
		&state.database,
		&paginate,
		&PostFilter::Author(&path.username),
	)
	.await?;

	let (followers, following) = sqlx::query_as::<_, (i64, i64)>(
		r#"
			SELECT
				(SELECT COUNT(*) FROM follow WHERE author_id = $1),
				(SELECT COUNT(*) FROM follow WHERE user_id = $1)
		"#,
	)
	.bind(author_id)
	.fetch_one(&state.database)
	.await?;

	let is_following = match &session {
		Some(session) => Some(
			sqlx::query_scalar::<_, bool>(
				"SELECT EXISTS (SELECT 1 FROM follow WHERE user_id = $1 AND author_id = $2)",
			)
			.bind(session.user.id)
			.bind(author_id)
			.fetch_one(&state.database)
			.await?,
		),
		None => None,
	};

	Ok(Json(model::Profile {
		username: path.username,
		posts,
		followers,
		following,
		is_following,
	}))
}

/// Follow author
/// Starts following the author, then redirects to their profile. Following
/// yourself, or someone you already follow, changes nothing.
#[route(tag = tag::PROFILE, response(status = 303, description = "Redirecting to the profile."), response(status = 404, description = "No such user."))]
pub async fn follow(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::UsernamePath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let author_id = fetch_author(&state.database, &path.username).await?;

	if author_id != session.user.id {
		sqlx::query(
			"INSERT INTO follow (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
		)
		.bind(session.user.id)
		.bind(author_id)
		.execute(&state.database)
		.await?;
	}

	Ok(Redirect::to(&format!("/{}", path.username)).into_response())
}

/// Unfollow author
/// Stops following the author, then redirects to their profile.
#[route(tag = tag::PROFILE, response(status = 303, description = "Redirecting to the profile."), response(status = 404, description = "No such user, or not following them."))]
pub async fn unfollow(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::UsernamePath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let author_id = fetch_author(&state.database, &path.username).await?;

	let result = sqlx::query("DELETE FROM follow WHERE user_id = $1 AND author_id = $2")
		.bind(session.user.id)
		.bind(author_id)
		.execute(&state.database)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFollowing(path.username).into());
	}

	Ok(Redirect::to(&format!("/{}", path.username)).into_response())
}

/// Personal feed
/// Returns the most recent posts from the authors the user follows, newest
/// first.
#[route(tag = tag::PROFILE, response(status = 200, description = "A page of posts from followed authors.", shape = "Json<model::Page<posts::model::Post>>"))]
pub async fn get_feed(
	State(state): State<AppState>,
	session: Session,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::Page<posts::model::Post>>, RouteError> {
	let page = post_page(
		&state.database,
		&paginate,
		&PostFilter::FollowedBy(session.user.id),
	)
	.await?;

	Ok(Json(page))
}
