use axum::{extract::{Request, State}, http::StatusCode, middleware::Next, response::Response, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::errors::AuthError;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::storage::StorageSigner;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub site: configs::SiteConfig,
    pub storage_signer: StorageSigner,
    pub lead_webhook_url: Option<String>,
}

/// Authenticated caller, decoded from the session token by the bearer
/// middleware and injected as a request extension.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub partner_id: Uuid,
    pub email: String,
    pub role: String,
    pub admin_view: bool,
}

impl AuthContext {
    pub fn has_admin_access(&self) -> bool {
        self.role == models::partner::ROLE_ADMIN || self.admin_view
    }
}

#[derive(Serialize)]
pub struct RegisterOutput {
    pub partner_id: Uuid,
}

#[derive(Serialize)]
pub struct MeOutput {
    pub partner_id: Uuid,
    pub email: String,
    pub role: String,
    pub admin_view: bool,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub partner_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub token: String,
}

fn auth_service(state: &ServerState) -> AuthService<SeaOrmAuthRepository> {
    let repo = Arc::new(SeaOrmAuthRepository { db: state.db.clone() });
    AuthService::new(
        repo,
        AuthConfig {
            jwt_secret: Some(state.auth.jwt_secret.clone()),
            password_algorithm: "argon2".into(),
        },
    )
}

fn map_auth_error(e: AuthError) -> (StatusCode, String) {
    match e {
        AuthError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        AuthError::Conflict => (StatusCode::CONFLICT, e.to_string()),
        AuthError::Unauthorized | AuthError::NotFound => (StatusCode::UNAUTHORIZED, "invalid credentials".into()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<RegisterOutput>, (StatusCode, String)> {
    let svc = auth_service(&state);
    let user = svc.register(input).await.map_err(map_auth_error)?;
    Ok(Json(RegisterOutput { partner_id: user.id }))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), (StatusCode, String)> {
    let svc = auth_service(&state);
    let session = svc.login(input).await.map_err(map_auth_error)?;
    let user = session.user;
    if let Some(token) = session.token {
        let mut cookie = Cookie::new("auth_token", token.clone());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(false);
        cookie.set_same_site(axum_extra::extract::cookie::SameSite::Lax);
        let jar = jar.add(cookie);
        let out = LoginOutput {
            partner_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            token,
        };
        return Ok((jar, Json(out)));
    }
    Err((StatusCode::INTERNAL_SERVER_ERROR, "token generation failed".into()))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::from("auth_token"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "OK"), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<MeOutput> {
    Json(MeOutput {
        partner_id: ctx.partner_id,
        email: ctx.email,
        role: ctx.role,
        admin_view: ctx.admin_view,
    })
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    pid: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    admin_view: bool,
    #[allow(dead_code)]
    exp: usize,
}

/// Paths reachable without a session: health/docs/metrics, the auth
/// endpoints, and the public lead-capture funnel.
fn is_public_path(path: &str) -> bool {
    path == "/health"
        || path == "/metrics"
        || path == "/auth/login"
        || path == "/auth/register"
        || path == "/auth/logout"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || path.starts_with("/r/")
        || path == "/services"
        || path.starts_with("/services/")
        || path == "/leads"
        || path.starts_with("/leads/")
}

/// Global middleware: outside the public allow-list, require a valid
/// bearer token (Authorization header, cookie fallback) and stash the
/// decoded caller in request extensions.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if is_public_path(&path) || method == axum::http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let token = {
        let authz = req
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        if let Some(h) = authz {
            let prefix = "Bearer ";
            if !h.starts_with(prefix) {
                tracing::warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(StatusCode::UNAUTHORIZED);
            }
            h[prefix.len()..].to_string()
        } else {
            // cookie fallback: parse the Cookie header for auth_token
            let cookie_header = req
                .headers()
                .get(axum::http::header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");

            let mut token_val: Option<String> = None;
            for part in cookie_header.split(';') {
                let kv = part.trim();
                if let Some(rest) = kv.strip_prefix("auth_token=") {
                    token_val = Some(rest.to_string());
                    break;
                }
            }

            match token_val {
                Some(t) if !t.is_empty() => t,
                _ => {
                    tracing::warn!(path = %path, "missing Authorization header and auth_token cookie");
                    return Err(StatusCode::UNAUTHORIZED);
                }
            }
        }
    };

    let key = DecodingKey::from_secret(state.auth.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    match decode::<Claims>(&token, &key, &validation) {
        Ok(data) => {
            let claims = data.claims;
            let partner_id = match Uuid::parse_str(&claims.pid) {
                Ok(id) => id,
                Err(_) => {
                    tracing::error!(path = %path, "token carries malformed partner id");
                    return Err(StatusCode::UNAUTHORIZED);
                }
            };
            req.extensions_mut().insert(AuthContext {
                partner_id,
                email: claims.sub,
                role: claims.role,
                admin_view: claims.admin_view,
            });
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::error!(path = %path, err = %e, "token validation failed");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Route-level middleware for `/admin/*`: role `admin`, or a partner whose
/// account carries the admin-view flag.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(ctx) = req.extensions().get::<AuthContext>() else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if !ctx.has_admin_access() {
        tracing::warn!(partner_id = %ctx.partner_id, "admin surface denied");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::is_public_path;

    #[test]
    fn public_allowlist_covers_funnel_but_not_admin() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/r/pats-roofing-a1b2c3"));
        assert!(is_public_path("/services"));
        assert!(is_public_path("/leads/123/submit"));
        assert!(!is_public_path("/admin/leads"));
        assert!(!is_public_path("/dashboard/links"));
        assert!(!is_public_path("/auth/me"));
    }
}
