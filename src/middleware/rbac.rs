// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{Permission, User},
};

/// O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn permission() -> Permission;
}

/// O Extractor (Guardião): exige que o papel do usuário conceda `T`.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_parts(parts);
        let required = T::permission();

        let Some(user) = parts.extensions.get::<User>() else {
            return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
        };

        if !user.role.allows(required) {
            tracing::warn!("{} sem a permissão '{}'", user.email, required.slug());
            return Err(AppError::PermissionDenied(required).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission_types {
    ($($name:ident => $perm:ident),* $(,)?) => {
        $(
            pub struct $name;
            impl PermissionDef for $name {
                fn permission() -> Permission { Permission::$perm }
            }
        )*
    };
}

permission_types! {
    PermManageClients => ManageClients,
    PermDeleteClients => DeleteClients,
    PermViewOwnMetrics => ViewOwnMetrics,
    PermSyncMetrics => SyncMetrics,
    PermManageAgents => ManageAgents,
    PermManageBonusRules => ManageBonusRules,
    PermViewBonuses => ViewBonuses,
    PermManageUsers => ManageUsers,
}
