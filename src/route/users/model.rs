pub use crate::route::model::{Page, Paginate};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::posts;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UsernamePath {
	pub username: String,
}

/// An author profile: their posts plus follow counts. The follow flag is only
/// present when the request carries a session.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Profile {
	/// The author's public username.
	pub username: String,
	/// One page of the author's posts, newest first.
	pub posts: Page<posts::model::Post>,
	/// How many users follow this author.
	pub followers: i64,
	/// How many authors this user follows.
	pub following: i64,
	/// Whether the requesting user follows this author.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_following: Option<bool>,
}
