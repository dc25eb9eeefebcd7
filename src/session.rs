use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// How long browsers keep the session cookie. The session row itself only
/// goes away on logout, so coming back within this window stays logged in.
const COOKIE_MAX_AGE: cookie::time::Duration = cookie::time::Duration::days(30);

/// Creates a session cookie.
pub fn create_cookie(session_id: Uuid) -> cookie::Cookie<'static> {
	cookie::Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.path("/")
		.max_age(COOKIE_MAX_AGE)
		.into()
}

/// Creates an expired session cookie used to invalidate a previous one.
pub fn clear_cookie() -> cookie::Cookie<'static> {
	cookie::Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}
