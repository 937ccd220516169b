// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

// --- PAPÉIS E PERMISSÕES ---

// Mapeia o CREATE TYPE app_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

/// Operações protegidas. O conjunto é fechado: toda checagem de acesso passa
/// por `Role::allows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    ManageClients,
    ReassignClients,
    DeleteClients,
    ViewCompanyMetrics,
    ViewOwnMetrics,
    SyncMetrics,
    ManageAgents,
    ManageBonusRules,
    ViewBonuses,
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::ManageClients,
        Permission::ReassignClients,
        Permission::DeleteClients,
        Permission::ViewCompanyMetrics,
        Permission::ViewOwnMetrics,
        Permission::SyncMetrics,
        Permission::ManageAgents,
        Permission::ManageBonusRules,
        Permission::ViewBonuses,
        Permission::ManageUsers,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Permission::ManageClients => "clients:manage",
            Permission::ReassignClients => "clients:reassign",
            Permission::DeleteClients => "clients:delete",
            Permission::ViewCompanyMetrics => "metrics:company",
            Permission::ViewOwnMetrics => "metrics:own",
            Permission::SyncMetrics => "metrics:sync",
            Permission::ManageAgents => "agents:manage",
            Permission::ManageBonusRules => "bonuses:rules",
            Permission::ViewBonuses => "bonuses:read",
            Permission::ManageUsers => "users:manage",
        }
    }
}

impl Role {
    pub fn allows(self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::Employee => matches!(
                permission,
                Permission::ManageClients
                    | Permission::ViewOwnMetrics
                    | Permission::ManageAgents
                    | Permission::ViewBonuses
            ),
        }
    }

    pub fn permissions(self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.allows(*p))
            .collect()
    }
}

// Representa um usuário vindo do banco (users + profiles + user_roles)
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Ana Souza")]
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Recorte de visibilidade dos dados: admin vê tudo, funcionário só o que é dele.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    All,
    Employee(Uuid),
}

impl AccessScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Admin => AccessScope::All,
            Role::Employee => AccessScope::Employee(user.id),
        }
    }

    /// Filtro de `employee_id` para as queries (`None` = sem filtro).
    pub fn employee_filter(&self) -> Option<Uuid> {
        match self {
            AccessScope::All => None,
            AccessScope::Employee(id) => Some(*id),
        }
    }

    /// Aplica um filtro pedido pelo cliente HTTP. Funcionários nunca escapam do próprio recorte.
    pub fn narrow(&self, requested: Option<Uuid>) -> Option<Uuid> {
        match self {
            AccessScope::All => requested,
            AccessScope::Employee(id) => Some(*id),
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "admin@empresa.com")]
    pub email: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "funcionario@empresa.com")]
    pub email: String,
    #[validate(length(min = 8, message = "password_too_short"))]
    pub password: String,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Carlos Lima")]
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 8, message = "password_too_short"))]
    pub password: Option<String>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_every_permission() {
        assert_eq!(Role::Admin.permissions().len(), Permission::ALL.len());
    }

    #[test]
    fn employee_cannot_touch_company_wide_operations() {
        for p in [
            Permission::ReassignClients,
            Permission::DeleteClients,
            Permission::ViewCompanyMetrics,
            Permission::SyncMetrics,
            Permission::ManageBonusRules,
            Permission::ManageUsers,
        ] {
            assert!(!Role::Employee.allows(p), "{:?}", p);
        }
        assert!(Role::Employee.allows(Permission::ManageClients));
        assert!(Role::Employee.allows(Permission::ViewOwnMetrics));
    }

    #[test]
    fn employee_scope_ignores_requested_filter() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(AccessScope::Employee(me).narrow(Some(other)), Some(me));
        assert_eq!(AccessScope::All.narrow(Some(other)), Some(other));
        assert_eq!(AccessScope::All.narrow(None), None);
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<_> = Permission::ALL.iter().map(|p| p.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), Permission::ALL.len());
    }
}
