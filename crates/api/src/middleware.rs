use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use stockroom_core::{Role, UserId};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

/// Attach a [`PrincipalContext`] built from the principal headers.
///
/// Authentication happens upstream; this only refuses requests that arrive
/// without an identity.
pub async fn principal_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let principal = extract_principal(req.headers())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn extract_principal(headers: &HeaderMap) -> Result<PrincipalContext, Response> {
    let id = header_value(headers, PRINCIPAL_ID_HEADER)?;
    let id: UserId = id.parse().map_err(|_| {
        json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            format!("{PRINCIPAL_ID_HEADER} must be a UUID"),
        )
    })?;
    let role = header_value(headers, PRINCIPAL_ROLE_HEADER)?;

    Ok(PrincipalContext::new(id, Role::new(role.to_string())))
}

fn header_value<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<&'h str, Response> {
    let missing = || {
        json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            format!("missing {name} header"),
        )
    };

    let value = headers
        .get(name)
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| missing())?
        .trim();
    if value.is_empty() {
        return Err(missing());
    }
    Ok(value)
}
