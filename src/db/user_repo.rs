// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

// users + profiles + user_roles montam o `User` completo
const USER_SELECT: &str = r#"
    SELECT u.id, u.email, u.password_hash,
           p.full_name, p.phone,
           r.role,
           u.created_at, u.updated_at
    FROM users u
    JOIN profiles p ON p.user_id = u.id
    JOIN user_roles r ON r.user_id = u.id
"#;

// O repositório de usuários, responsável pelas tabelas 'users', 'profiles' e 'user_roles'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("{} WHERE u.email = $1", USER_SELECT);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE u.id = $1", USER_SELECT);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("{} ORDER BY p.full_name ASC", USER_SELECT);
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>, AppError> {
        let sql = format!("{} WHERE r.role = $1 ORDER BY p.full_name ASC", USER_SELECT);
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // Cria as credenciais; perfil e papel são gravados na mesma transação pelo serviço
    pub async fn insert_credentials<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Converte erro de violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn insert_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO profiles (user_id, full_name, phone) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(full_name)
            .bind(phone)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Um papel por usuário: UPSERT
    pub async fn set_role<'e, E>(&self, executor: E, user_id: Uuid, role: Role) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(user_id)
        .bind(role)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        full_name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(phone)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // Ainda referenciado por clients.employee_id / agents.employee_id
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_foreign_key_violation() {
                        return AppError::UserInUse;
                    }
                }
                AppError::from(e)
            })?;
        Ok(result.rows_affected())
    }
}
