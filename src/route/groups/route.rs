use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Query},
	openapi::tag,
	route::posts::route::{post_page, PostFilter},
	AppState,
};

use super::{model, Error, RouteError};

/// Read group
/// Returns the group and the most recent posts filed under it, newest first.
#[route(tag = tag::GROUP, response(status = 200, description = "The group and a page of its posts.", shape = "Json<model::GroupPage>"), response(status = 404, description = "No such group."))]
pub async fn get_group(
	State(state): State<AppState>,
	Path(path): Path<model::SlugPath>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::GroupPage>, RouteError> {
	let group = sqlx::query_as::<_, model::Group>(
		r#"SELECT id, title, slug, description FROM "group" WHERE slug = $1"#,
	)
	.bind(&path.slug)
	.fetch_optional(&state.database)
	.await?;

	let Some(group) = group else {
		return Err(Error::UnknownGroup(path.slug).into());
	};

	let posts = post_page(&state.database, &paginate, &PostFilter::Group(group.id)).await?;

	Ok(Json(model::GroupPage { group, posts }))
}
