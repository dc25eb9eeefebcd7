pub use crate::route::model::{Page, Paginate};

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single post, written by a user and optionally filed under a group.
#[model]
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that wrote the post.
	#[serde(skip_deserializing)]
	pub author_id: Uuid,
	/// The author's public username.
	#[serde(skip_deserializing)]
	pub author: String,
	/// The group the post is filed under, if any.
	pub group_id: Option<Uuid>,
	/// The post body.
	#[validate(length(min = 1))]
	pub text: String,
	/// The media type of the attached image, if any.
	#[serde(skip_deserializing)]
	pub image_type: Option<String>,
	/// The publication time of the post. Fixed at creation, edits do not
	/// move a post back to the top of the listings.
	#[serde(skip_deserializing)]
	pub pub_date: chrono::DateTime<chrono::Utc>,
}

/// A comment on a post.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Comment {
	/// The unique identifier of the comment.
	pub id: Uuid,
	/// The post the comment is attached to.
	pub post_id: Uuid,
	/// The user that wrote the comment.
	pub author_id: Uuid,
	/// The comment author's public username.
	pub author: String,
	/// The comment body.
	pub text: String,
	/// The creation time of the comment.
	pub created: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CommentInput {
	/// The comment body.
	#[validate(length(min = 1))]
	pub text: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PostPath {
	pub username: String,
	pub post_id: Uuid,
}

/// A post together with its comments and the author's running post count.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetail {
	pub post: Post,
	pub comments: Vec<Comment>,
	pub author_posts: i64,
}
