// src/services/agent_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AgentRepository,
    models::{
        agent::{AgentView, CreateAgentPayload, ToggleAgentInstallmentPayload, UpdateAgentPayload},
        auth::{AccessScope, Permission, User},
    },
};

#[derive(Clone)]
pub struct AgentService {
    repo: AgentRepository,
}

impl AgentService {
    pub fn new(repo: AgentRepository) -> Self {
        Self { repo }
    }

    /// Mesmo critério dos contratos: funcionário só responde pelos próprios agentes.
    fn resolve_owner(user: &User, requested: Option<Uuid>) -> Result<Option<Uuid>, AppError> {
        match (AccessScope::for_user(user), requested) {
            (AccessScope::All, requested) => Ok(requested),
            (AccessScope::Employee(id), Some(other)) if other != id => {
                Err(AppError::PermissionDenied(Permission::ReassignClients))
            }
            (AccessScope::Employee(_), _) => Ok(None),
        }
    }

    pub async fn create_agent(&self, user: &User, payload: &CreateAgentPayload) -> Result<AgentView, AppError> {
        let owner = Self::resolve_owner(user, payload.employee_id)?.unwrap_or(user.id);
        let agent = self.repo.create(payload, owner).await?;
        tracing::info!("🤝 Agente {} cadastrado por {}", agent.full_name, user.email);
        Ok(agent.into())
    }

    pub async fn list_agents(&self, user: &User) -> Result<Vec<AgentView>, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        let agents = self.repo.list(filter).await?;
        Ok(agents.into_iter().map(AgentView::from).collect())
    }

    pub async fn get_agent(&self, user: &User, agent_id: Uuid) -> Result<AgentView, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        self.repo
            .find_by_id(agent_id, filter)
            .await?
            .map(AgentView::from)
            .ok_or(AppError::AgentNotFound)
    }

    pub async fn update_agent(
        &self,
        user: &User,
        agent_id: Uuid,
        payload: &UpdateAgentPayload,
    ) -> Result<AgentView, AppError> {
        let owner = Self::resolve_owner(user, payload.employee_id)?;
        let filter = AccessScope::for_user(user).employee_filter();
        self.repo
            .update(agent_id, payload, owner, filter)
            .await?
            .map(AgentView::from)
            .ok_or(AppError::AgentNotFound)
    }

    pub async fn toggle_installment(
        &self,
        user: &User,
        agent_id: Uuid,
        payload: &ToggleAgentInstallmentPayload,
    ) -> Result<AgentView, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        self.repo
            .set_installment(agent_id, payload.kind, payload.index, payload.completed, filter)
            .await?
            .map(AgentView::from)
            .ok_or(AppError::AgentNotFound)
    }

    pub async fn delete_agent(&self, user: &User, agent_id: Uuid) -> Result<(), AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        if self.repo.delete(agent_id, filter).await? == 0 {
            return Err(AppError::AgentNotFound);
        }
        Ok(())
    }
}
