use aide::axum::IntoApiResponse;
use axum::{
	extract::State,
	http::header,
	response::{IntoResponse, Redirect, Response},
};
use bytes::Bytes;
use macros::route;
use serde_json::Value;
use sqlx::QueryBuilder;
use uuid::Uuid;
use validator::Validate;

use crate::{
	cache::CacheKey,
	error::Map,
	extract::{Json, Multipart, Path, Query, Session},
	openapi::tag,
	AppState, Database,
};

use super::{model, Error, RouteError};

/// An image attached to a post form.
pub struct ImageUpload {
	pub bytes: Bytes,
	pub media_type: &'static str,
}

/// Determines the media type from the image header, rejecting anything
/// that cannot be identified as an image.
fn sniff_image(bytes: &[u8]) -> Result<&'static str, Error> {
	let kind = imagesize::image_type(bytes).map_err(|_| Error::NotAnImage)?;

	Ok(match kind {
		imagesize::ImageType::Png => "image/png",
		imagesize::ImageType::Jpeg => "image/jpeg",
		imagesize::ImageType::Gif => "image/gif",
		imagesize::ImageType::Webp => "image/webp",
		imagesize::ImageType::Bmp => "image/bmp",
		imagesize::ImageType::Tiff => "image/tiff",
		_ => return Err(Error::NotAnImage),
	})
}

/// A multipart post form, collected into a JSON object plus the optional
/// image part.
pub struct PostForm {
	pub fields: Map,
	pub image: Option<ImageUpload>,
}

/// Drains a multipart submission. An image part with an empty body counts as
/// absent, which is how browsers submit an untouched file input.
async fn read_form(mut multipart: axum::extract::Multipart) -> Result<PostForm, RouteError> {
	let mut fields = Map::new();
	let mut image = None;

	while let Some(field) = multipart.next_field().await? {
		let Some(name) = field.name().map(str::to_owned) else {
			continue;
		};

		if name == "image" {
			let bytes = field.bytes().await?;

			if !bytes.is_empty() {
				let media_type = sniff_image(&bytes)?;

				image = Some(ImageUpload { bytes, media_type });
			}
		} else {
			fields.insert(name, Value::String(field.text().await?));
		}
	}

	Ok(PostForm { fields, image })
}

/// Which posts a listing should cover.
pub enum PostFilter<'a> {
	All,
	Group(Uuid),
	Author(&'a str),
	FollowedBy(Uuid),
}

fn push_filter<'args>(query: &mut QueryBuilder<'args, sqlx::Postgres>, filter: &PostFilter<'args>) {
	match filter {
		PostFilter::All => {}
		PostFilter::Group(id) => {
			query.push(" WHERE p.group_id = ");
			query.push_bind(*id);
		}
		PostFilter::Author(username) => {
			query.push(r#" WHERE p.author_id = (SELECT id FROM "user" WHERE username = "#);
			query.push_bind(*username);
			query.push(")");
		}
		PostFilter::FollowedBy(id) => {
			query.push(" WHERE p.author_id IN (SELECT author_id FROM follow WHERE user_id = ");
			query.push_bind(*id);
			query.push(")");
		}
	}
}

/// Fetches one page of posts matching `filter`, newest first. The page number
/// is clamped against the matching row count.
pub async fn post_page(
	database: &Database,
	paginate: &model::Paginate,
	filter: &PostFilter<'_>,
) -> Result<model::Page<model::Post>, sqlx::Error> {
	let mut count = QueryBuilder::new("SELECT COUNT(*) FROM post p");
	push_filter(&mut count, filter);

	let total: i64 = count.build_query_scalar().fetch_one(database).await?;
	let window = paginate.resolve(total);

	let mut query = QueryBuilder::new(
		r#"
			SELECT p.id, p.author_id, u.username AS author, p.group_id, p.text, p.image_type, p.pub_date
			FROM post p
			JOIN "user" u ON u.id = p.author_id
		"#,
	);
	push_filter(&mut query, filter);
	query.push(" ORDER BY p.pub_date DESC, p.id LIMIT ");
	query.push_bind(window.limit());
	query.push(" OFFSET ");
	query.push_bind(window.offset());

	let items = query.build_query_as().fetch_all(database).await?;

	Ok(model::Page::new(items, window))
}

async fn fetch_post(database: &Database, path: &model::PostPath) -> Result<model::Post, RouteError> {
	sqlx::query_as::<_, model::Post>(
		r#"
			SELECT p.id, p.author_id, u.username AS author, p.group_id, p.text, p.image_type, p.pub_date
			FROM post p
			JOIN "user" u ON u.id = p.author_id
			WHERE p.id = $1 AND u.username = $2
		"#,
	)
	.bind(path.post_id)
	.bind(&path.username)
	.fetch_optional(database)
	.await?
	.ok_or_else(|| Error::UnknownPost(path.post_id).into())
}

fn json_body(body: Bytes) -> Response {
	([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// List posts
/// Returns the most recent posts across all authors, newest first. Pages are
/// served from a short-lived cache, so a fresh post can take a few seconds to
/// show up here.
#[route(tag = tag::POST, response(status = 200, description = "A page of posts.", shape = "Json<model::Page<model::Post>>"))]
pub async fn get_index(
	State(state): State<AppState>,
	Query(paginate): Query<model::Paginate>,
) -> Result<impl IntoApiResponse, RouteError> {
	let key = CacheKey::index(paginate.page, paginate.size);

	if let Some(body) = state.cache.get(&key) {
		return Ok(json_body(body));
	}

	let page = post_page(&state.database, &paginate, &PostFilter::All).await?;
	let body = Bytes::from(serde_json::to_vec(&page)?);

	state.cache.put(key, body.clone());

	Ok(json_body(body))
}

/// Publish post
/// Publishes a new post, optionally filed under a group and with an attached
/// image, then redirects to the index.
#[route(tag = tag::POST, response(status = 303, description = "Published, redirecting to the index."), response(status = 422, description = "Empty text, unknown group or a non-image attachment."))]
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	Multipart(multipart): Multipart,
) -> Result<impl IntoApiResponse, RouteError> {
	let form = read_form(multipart).await?;
	let mut fields = form.fields;

	fields
		.entry("text")
		.or_insert_with(|| Value::String(String::new()));

	// An empty select submits an empty string, meaning no group at all.
	if matches!(fields.get("group_id"), Some(Value::String(s)) if s.is_empty()) {
		fields.remove("group_id");
	}

	let input: model::CreatePost = serde_json::from_value(Value::Object(fields))?;

	input.validate()?;

	let (image, image_type) = match &form.image {
		Some(upload) => (Some(&upload.bytes[..]), Some(upload.media_type)),
		None => (None, None),
	};

	sqlx::query(
		"INSERT INTO post (author_id, group_id, text, image, image_type) VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(session.user.id)
	.bind(input.group_id)
	.bind(&input.text)
	.bind(image)
	.bind(image_type)
	.execute(&state.database)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) => match (d.constraint(), input.group_id) {
			(Some("post_group_id_fkey"), Some(group_id)) => Error::UnknownGroup(group_id).into(),
			_ => RouteError::from(e),
		},
		e => RouteError::from(e),
	})?;

	Ok(Redirect::to("/").into_response())
}

/// Read post
/// Returns a single post with its comments and the author's total post count.
#[route(tag = tag::POST, response(status = 200, description = "The post.", shape = "Json<model::PostDetail>"), response(status = 404, description = "No such post."))]
pub async fn get_post(
	State(database): State<Database>,
	Path(path): Path<model::PostPath>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let post = fetch_post(&database, &path).await?;

	let comments = sqlx::query_as::<_, model::Comment>(
		r#"
			SELECT c.id, c.post_id, c.author_id, u.username AS author, c.text, c.created
			FROM comment c
			JOIN "user" u ON u.id = c.author_id
			WHERE c.post_id = $1
			ORDER BY c.created
		"#,
	)
	.bind(post.id)
	.fetch_all(&database)
	.await?;

	let author_posts =
		sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post WHERE author_id = $1")
			.bind(post.author_id)
			.fetch_one(&database)
			.await?;

	Ok(Json(model::PostDetail {
		post,
		comments,
		author_posts,
	}))
}

/// Read post image
/// Returns the raw image attached to the post, with its original media type.
#[route(tag = tag::POST, response(status = 200, description = "The image bytes."), response(status = 404, description = "No such post, or the post has no image."))]
pub async fn get_post_image(
	State(database): State<Database>,
	Path(path): Path<model::PostPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let row = sqlx::query_as::<_, (Option<Vec<u8>>, Option<String>)>(
		r#"
			SELECT p.image, p.image_type
			FROM post p
			JOIN "user" u ON u.id = p.author_id
			WHERE p.id = $1 AND u.username = $2
		"#,
	)
	.bind(path.post_id)
	.bind(&path.username)
	.fetch_optional(&database)
	.await?;

	let Some(row) = row else {
		return Err(Error::UnknownPost(path.post_id).into());
	};

	let (Some(image), Some(image_type)) = row else {
		return Err(Error::NoImage(path.post_id).into());
	};

	Ok(([(header::CONTENT_TYPE, image_type)], image).into_response())
}

/// Edit post
/// Applies changes from the post's author, then redirects to the post. A
/// submission from anyone else is dropped and answered with the same
/// redirect. The publication date never changes.
#[route(tag = tag::POST, response(status = 303, description = "Redirecting to the post."), response(status = 404, description = "No such post."))]
pub async fn edit_post(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::PostPath>,
	Multipart(multipart): Multipart,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = fetch_post(&state.database, &path).await?;

	if post.author_id != session.user.id {
		return Err(Error::NotAuthor {
			username: path.username,
			post_id: path.post_id,
		}
		.into());
	}

	let form = read_form(multipart).await?;
	let mut fields = form.fields;

	// An empty select on the edit form clears the group.
	if matches!(fields.get("group_id"), Some(Value::String(s)) if s.is_empty()) {
		fields.insert("group_id".to_owned(), Value::Null);
	}

	// Deserializing cannot tell a missing group from an explicit null, so
	// remember which one it was before handing the object to serde.
	let group_set = fields.contains_key("group_id");

	let input: model::UpdatePost = serde_json::from_value(Value::Object(fields))?;

	input.validate()?;

	let group_id = input.group_id.flatten();
	let (image, image_type) = match &form.image {
		Some(upload) => (Some(&upload.bytes[..]), Some(upload.media_type)),
		None => (None, None),
	};

	sqlx::query(
		r#"
			UPDATE post SET
				text = COALESCE($1, text),
				group_id = CASE WHEN $2 THEN $3 ELSE group_id END,
				image = CASE WHEN $4 THEN $5 ELSE image END,
				image_type = CASE WHEN $4 THEN $6 ELSE image_type END
			WHERE id = $7
		"#,
	)
	.bind(&input.text)
	.bind(group_set)
	.bind(group_id)
	.bind(form.image.is_some())
	.bind(image)
	.bind(image_type)
	.bind(post.id)
	.execute(&state.database)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) => match (d.constraint(), group_id) {
			(Some("post_group_id_fkey"), Some(group_id)) => Error::UnknownGroup(group_id).into(),
			_ => RouteError::from(e),
		},
		e => RouteError::from(e),
	})?;

	Ok(Redirect::to(&format!("/{}/{}", post.author, post.id)).into_response())
}

/// Comment on post
/// Adds a comment to the post, then redirects to it.
#[route(tag = tag::POST, response(status = 303, description = "Comment added, redirecting to the post."), response(status = 404, description = "No such post."))]
pub async fn add_comment(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::PostPath>,
	Json(input): Json<model::CommentInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = fetch_post(&state.database, &path).await?;

	sqlx::query("INSERT INTO comment (post_id, author_id, text) VALUES ($1, $2, $3)")
		.bind(post.id)
		.bind(session.user.id)
		.bind(&input.text)
		.execute(&state.database)
		.await?;

	Ok(Redirect::to(&format!("/{}/{}", post.author, post.id)).into_response())
}
