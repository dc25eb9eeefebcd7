use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use uuid::Uuid;

use crate::{
	error::RouteError, openapi::SECURITY_SCHEME_SESSION, route::auth, session, Database,
};

/// Extracts the session and related user from the request.
///
/// Any request that cannot be resolved to a live session, whether the cookie
/// is missing, unparseable, or pointing at a deleted session row, is treated
/// as anonymous: the rejection is a redirect to the login page carrying the
/// requested path so the client can come back afterwards.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let anonymous = || auth::Error::AuthenticationRequired {
			next: parts.uri.path().to_owned(),
		};

		let cookies = parts
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.filter_map(|value| value.to_str().ok());

		let session_id = cookies
			.flat_map(cookie::Cookie::split_parse)
			.filter_map(Result::ok)
			.find(|cookie| cookie.name() == session::COOKIE_NAME)
			.ok_or_else(anonymous)?;

		let Ok(session_id) = Uuid::parse_str(session_id.value()) else {
			return Err(anonymous().into());
		};

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, auth::model::User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&database)
		.await?;

		let user = user.ok_or_else(anonymous)?;

		Ok(Session {
			user,
			id: session_id,
		})
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([[(
			SECURITY_SCHEME_SESSION.to_string(),
			Vec::new(),
		)]
		.into_iter()
		.collect()]);
	}
}
