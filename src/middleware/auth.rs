// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// Guarda das rotas protegidas: valida o Bearer token e injeta o `User`
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let reject = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>() else {
        return Err(reject(AppError::InvalidToken));
    };

    let user = app_state
        .auth_service
        .validate_token(bearer.token())
        .await
        .map_err(|e| match e {
            // Token válido de um usuário removido
            AppError::UserNotFound => reject(AppError::InvalidToken),
            other => reject(other),
        })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<User>() {
            Some(user) => Ok(AuthenticatedUser(user.clone())),
            None => {
                let app_state = AppState::from_ref(state);
                let locale = Locale::from_parts(parts);
                Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
            }
        }
    }
}
