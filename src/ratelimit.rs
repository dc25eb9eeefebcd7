use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	sync::Arc,
	time::Duration,
};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::KeyExtractor,
	GovernorError,
};

/// Buckets requests by peer address, falling back to a shared bucket when the
/// transport never attached a [`ConnectInfo`], as the in-process test client
/// does not.
///
/// [`ConnectInfo`]: axum::extract::ConnectInfo
#[derive(Debug, Clone, Copy)]
pub struct LenientIpKeyExtractor;

impl KeyExtractor for LenientIpKeyExtractor {
	type Key = IpAddr;

	fn extract<B>(&self, req: &axum::http::Request<B>) -> Result<Self::Key, GovernorError> {
		Ok(req
			.extensions()
			.get::<axum::extract::ConnectInfo<SocketAddr>>()
			.map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip()))
	}
}

pub fn default() -> Arc<GovernorConfig<LenientIpKeyExtractor, StateInformationMiddleware>> {
	Arc::new(
		GovernorConfigBuilder::default()
			.key_extractor(LenientIpKeyExtractor)
			.per_second(10)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.unwrap(),
	)
}

pub fn secure() -> Arc<GovernorConfig<LenientIpKeyExtractor, StateInformationMiddleware>> {
	Arc::new(
		GovernorConfigBuilder::default()
			.key_extractor(LenientIpKeyExtractor)
			.per_second(1)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.unwrap(),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	crate::AppError::from(error).into_response()
}

pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}
