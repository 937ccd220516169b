// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, Role, User},
};

/// bcrypt é caro: roda fora das threads do runtime.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, pool }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!("Tentativa de login com senha inválida para {}", email);
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de {}", user.email);
        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(&self.pool, token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Cria o primeiro administrador se a base ainda não tem usuários.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<bool, AppError> {
        if self.user_repo.count_users().await? > 0 {
            return Ok(false);
        }

        let password_hash = hash_password(password).await?;

        let mut tx = self.pool.begin().await?;
        let user_id = self
            .user_repo
            .insert_credentials(&mut *tx, email, &password_hash)
            .await?;
        self.user_repo
            .insert_profile(&mut *tx, user_id, "Administrador", None)
            .await?;
        self.user_repo.set_role(&mut *tx, user_id, Role::Admin).await?;
        tx.commit().await?;

        tracing::info!("👤 Administrador inicial criado: {}", email);
        Ok(true)
    }

    pub(crate) fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), secret.into(), pool)
    }

    #[tokio::test]
    async fn token_round_trips_subject() {
        let svc = service("segredo-de-teste");
        let user_id = Uuid::new_v4();
        let token = svc.create_token(user_id).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"segredo-de-teste"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, user_id);
        assert!(data.claims.exp > data.claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("outro-segredo").create_token(Uuid::new_v4()).unwrap();
        let result = service("segredo-de-teste").validate_token(&token).await;
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("senha-forte-123").await.unwrap();
        assert!(verify("senha-forte-123", &hashed).unwrap());
        assert!(!verify("errada", &hashed).unwrap());
    }
}
