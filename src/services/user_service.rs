// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{CreateUserPayload, UpdateUserPayload, User},
    services::auth::hash_password,
};

// Gestão de usuários pelo administrador
#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.repo.list_users().await
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        let password_hash = hash_password(&payload.password).await?;

        // Credenciais, perfil e papel: tudo ou nada
        let mut tx = self.pool.begin().await?;
        let user_id = self
            .repo
            .insert_credentials(&mut *tx, &payload.email, &password_hash)
            .await?;
        self.repo
            .insert_profile(&mut *tx, user_id, &payload.full_name, payload.phone.as_deref())
            .await?;
        self.repo.set_role(&mut *tx, user_id, payload.role).await?;
        let user = self
            .repo
            .find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        tx.commit().await?;

        tracing::info!("👤 Usuário {} criado com papel {:?}", user.email, user.role);
        Ok(user)
    }

    pub async fn update_user(&self, user_id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let updated = self
            .repo
            .update_profile(&mut *tx, user_id, payload.full_name.as_deref(), payload.phone.as_deref())
            .await?;
        if updated == 0 {
            return Err(AppError::UserNotFound);
        }
        if let Some(role) = payload.role {
            self.repo.set_role(&mut *tx, user_id, role).await?;
        }
        if let Some(hash) = password_hash.as_deref() {
            self.repo.update_password(&mut *tx, user_id, hash).await?;
        }
        let user = self
            .repo
            .find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        tx.commit().await?;

        Ok(user)
    }

    pub async fn delete_user(&self, acting: &User, user_id: Uuid) -> Result<(), AppError> {
        if acting.id == user_id {
            return Err(AppError::CannotDeleteSelf);
        }
        if self.repo.delete_user(user_id).await? == 0 {
            return Err(AppError::UserNotFound);
        }
        tracing::info!("🗑️ Usuário {} removido por {}", user_id, acting.email);
        Ok(())
    }
}
