use std::borrow::Cow;
use std::fmt;

use axum::{
	body::Body,
	extract::rejection::{PathRejection, QueryRejection},
	http::{header, Response, StatusCode},
	response::IntoResponse,
};
use axum_jsonschema::JsonSchemaRejection;
use serde::Serialize;
use tower_governor::GovernorError;

/// Detail payload attached to a [`Message`].
pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error presented to the client.
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct Message<'e> {
	pub content: Cow<'e, str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'e, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'e, Map>>,
}

/// Response body for failed requests.
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct Payload<'e> {
	pub success: bool,
	pub errors: Vec<Message<'e>>,
}

/// How an error family maps onto HTTP.
pub trait ErrorShape: fmt::Display {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message<'_>>;

	/// Redirect target for errors answered with a `Location` header instead
	/// of a body (the silent-redirect arms of the handler state machine).
	fn location(&self) -> Option<String> {
		None
	}
}

fn respond<E: ErrorShape + ?Sized>(error: &E) -> Response<Body> {
	let status = error.status();

	if status.is_server_error() {
		tracing::error!(%error, "request failed");
	}

	if let Some(location) = error.location() {
		return (status, [(header::LOCATION, location)]).into_response();
	}

	(
		status,
		axum::Json(Payload {
			success: false,
			errors: error.errors(),
		}),
	)
		.into_response()
}

/// Failures any route can produce.
///
/// The Display output is logged, never sent to the client, so it can carry
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json body error")]
	Json(JsonSchemaRejection),
	#[error("query string error: {0}")]
	Query(#[from] QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] axum::extract::multipart::MultipartRejection),
	#[error("multipart field error: {0}")]
	MultipartField(#[from] axum::extract::multipart::MultipartError),
	#[error("form decode error: {0}")]
	Form(#[from] serde_json::Error),
	#[error("rate limited: {0}")]
	RateLimit(#[from] GovernorError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl ErrorShape for AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Json(..)
			| Self::Query(..)
			| Self::Path(..)
			| Self::Multipart(..)
			| Self::MultipartField(..)
			| Self::Form(..) => StatusCode::BAD_REQUEST,
			Self::RateLimit(error) => match error {
				GovernorError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
				GovernorError::UnableToExtractKey => StatusCode::INTERNAL_SERVER_ERROR,
				GovernorError::Other { code, .. } => *code,
			},
			Self::Database(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| Message {
						content: error.message.clone().unwrap_or_else(|| error.code.clone()),
						field: Some(field.to_string().into()),
						details: None,
					})
				})
				.collect(),
			Self::Json(rejection) => vec![json_message(rejection)],
			Self::Query(error) => vec![plain(error.to_string())],
			Self::Path(error) => vec![plain(error.to_string())],
			Self::Multipart(error) => vec![plain(error.to_string())],
			Self::MultipartField(error) => vec![plain(error.to_string())],
			Self::Form(error) => vec![plain(error.to_string())],
			Self::RateLimit(..) => vec![plain("too many requests".to_owned())],
			// Database details stay server-side.
			Self::Database(..) => Vec::new(),
		}
	}
}

fn plain(content: String) -> Message<'static> {
	Message {
		content: content.into(),
		field: None,
		details: None,
	}
}

fn json_message(rejection: &JsonSchemaRejection) -> Message<'_> {
	match rejection {
		JsonSchemaRejection::Json(error) => plain(error.to_string()),
		JsonSchemaRejection::Serde(error) => Message {
			content: "invalid request body".into(),
			field: Some(error.path().to_string().into()),
			details: None,
		},
		JsonSchemaRejection::Schema(..) => plain("request body does not match the schema".to_owned()),
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		respond(&self)
	}
}

/// Error type for a route module: either the module's own error or a
/// cross-cutting [`AppError`].
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: fmt::Display> fmt::Display for RouteError<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::App(error) => error.fmt(f),
			Self::Route(error) => error.fmt(f),
		}
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(errors: validator::ValidationErrors) -> Self {
		Self::App(AppError::Validation(errors))
	}
}

impl<E> From<sqlx::Error> for RouteError<E> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<E> From<serde_json::Error> for RouteError<E> {
	fn from(error: serde_json::Error) -> Self {
		Self::App(AppError::Form(error))
	}
}

impl<E> From<axum::extract::multipart::MultipartError> for RouteError<E> {
	fn from(error: axum::extract::multipart::MultipartError) -> Self {
		Self::App(AppError::MultipartField(error))
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => respond(&error),
			Self::Route(error) => respond(&error),
		}
	}
}

impl<E> aide::OperationOutput for RouteError<E> {
	type Inner = Self;
}
