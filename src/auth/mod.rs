use axum::http::HeaderMap;

use crate::{
    config::AuthConfig,
    domain::Role,
    error::{AppError, Result},
    repository::MemberRepository,
};

/// Synthetic id for the development owner account configured via
/// `auth.owner_email`, which has no member row.
pub const DEV_OWNER_ID: &str = "owner";

/// The resolved identity acting on a request. Credential validation happens
/// upstream; this crate only maps a session email onto a member and a role.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub role: Role,
    pub email: String,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            email: email.into(),
        }
    }
}

/// Where the current session's email comes from. The implementation is
/// external to the core; the default reads the header the auth proxy sets.
pub trait SessionProvider: Send + Sync {
    fn current_email(&self, headers: &HeaderMap) -> Option<String>;
}

pub const SESSION_EMAIL_HEADER: &str = "x-session-email";

/// Reads the verified session email from `x-session-email`, which the
/// fronting auth proxy strips from inbound traffic and re-adds itself.
pub struct HeaderSessionProvider;

impl SessionProvider for HeaderSessionProvider {
    fn current_email(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(SESSION_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    }
}

/// Resolve a session email to a caller by matching against the member
/// table. Fails closed: no email or no matching member is `Unauthorized`.
pub async fn resolve_caller(
    repo: &dyn MemberRepository,
    auth: &AuthConfig,
    email: Option<&str>,
) -> Result<Caller> {
    let email = email.ok_or(AppError::Unauthorized)?;

    if auth.owner_email.as_deref() == Some(email) {
        return Ok(Caller::new(DEV_OWNER_ID, Role::Owner, email));
    }

    let member = repo
        .find_by_email(email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Caller::new(member.id, member.role, email))
}
