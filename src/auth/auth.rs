use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// Caller identity taken from the bearer token. Handlers pass the employee id
/// into the leave engine explicitly.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing token".into()))?;

    let config = req.app_data::<Data<Config>>().ok_or_else(|| {
        tracing::error!("Config missing from app data");
        ApiError::Internal
    })?;

    let claims = verify_access_token(token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    let role = Role::from_id(claims.role)
        .ok_or_else(|| ApiError::Unauthorized("Invalid role".into()))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

impl AuthUser {
    /// Employee id for self-service endpoints.
    pub fn require_employee(&self) -> Result<u64, ApiError> {
        self.employee_id
            .ok_or_else(|| ApiError::Forbidden("No employee profile".into()))
    }

    pub fn require_hr_or_admin(&self) -> Result<(), ApiError> {
        if self.role.can_review_leave() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("HR/Admin only".into()))
        }
    }
}
