pub use crate::route::model::{Page, Paginate};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::posts;

/// A topic group posts can be filed under.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Group {
	/// The unique identifier of the group.
	pub id: Uuid,
	/// The display title of the group.
	pub title: String,
	/// The URL-friendly name of the group.
	pub slug: String,
	/// What the group is about.
	pub description: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SlugPath {
	pub slug: String,
}

/// A group page: the group itself plus one page of its posts.
#[derive(Debug, Serialize, JsonSchema)]
pub struct GroupPage {
	pub group: Group,
	pub posts: Page<posts::model::Post>,
}
