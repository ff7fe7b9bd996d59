use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
    GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::utils::jwt::Claims;

/// Keys the limiter on the user id placed in the request by `auth_middleware`
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type RoleGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Roles with a per-user limit. Admin routes only sit behind the global limiter.
#[derive(Debug, Clone, Copy)]
pub enum RateLimitedRole {
    Customer,
    Driver,
}

impl RateLimitedRole {
    /// (milliseconds per token, burst)
    fn quota(self) -> (u64, u32) {
        match self {
            RateLimitedRole::Driver => (240, 250),   // 250 per minute
            RateLimitedRole::Customer => (1200, 50), // 50 per minute
        }
    }
}

pub fn create_role_governor(role: RateLimitedRole) -> AppResult<RoleGovernorLayer> {
    let (per_ms, burst) = role.quota();

    let config = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(UserIdExtractor)
        .finish()
        .ok_or_else(|| AppError::Internal("Invalid rate limit configuration".to_string()))?;

    Ok(GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_error_handler))
}
