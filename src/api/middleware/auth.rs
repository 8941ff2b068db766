use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    api::state::AppState,
    auth::{resolve_caller, Caller},
    error::AppError,
};

/// Resolve the session email to a caller and require officer tier or
/// above. The resolved `Caller` lands in request extensions so handlers
/// thread an explicit identity into the services instead of re-resolving.
pub async fn require_officer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let email = state.session_provider.current_email(request.headers());

    let caller = resolve_caller(
        state.service_context.member_repo.as_ref(),
        &state.settings.auth,
        email.as_deref(),
    )
    .await?;

    if !caller.role.is_reviewer() {
        tracing::warn!(caller = %caller.id, "Portal access rejected: not an officer");
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert::<Caller>(caller);

    Ok(next.run(request).await)
}
