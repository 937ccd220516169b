// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        AgentRepository, BonusRepository, ClientRepository, PaymentRepository, ReceiptRepository,
        UserRepository,
    },
    services::{
        agent_service::AgentService, auth::AuthService, bonus_service::BonusService,
        client_service::ClientService, dashboard_service::DashboardService,
        document_service::DocumentService, payment_service::PaymentService,
        user_service::UserService, webhook::WebhookDispatcher,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub company_name: String,
    pub webhook_url: Option<String>,
    pub bootstrap_admin: Option<(String, String)>,
    pub fonts_dir: PathBuf,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match optional("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            None => 5,
        };

        let bootstrap_admin = optional("BOOTSTRAP_ADMIN_EMAIL").zip(optional("BOOTSTRAP_ADMIN_PASSWORD"));

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            company_name: optional("COMPANY_NAME").unwrap_or_else(|| "Back Office".to_string()),
            webhook_url: optional("WEBHOOK_URL"),
            bootstrap_admin,
            fonts_dir: optional("FONTS_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./fonts")),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub client_service: ClientService,
    pub payment_service: PaymentService,
    pub agent_service: AgentService,
    pub dashboard_service: DashboardService,
    pub bonus_service: BonusService,
    pub document_service: DocumentService,
}

impl AppState {
    /// Conecta ao banco e monta o estado.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(&config, db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: &Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);
        let webhook = WebhookDispatcher::from_config(config.webhook_url.as_deref(), config.company_name.clone())?;

        let user_repo = UserRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());
        let receipt_repo = ReceiptRepository::new(db_pool.clone());
        let agent_repo = AgentRepository::new(db_pool.clone());
        let bonus_repo = BonusRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone(), db_pool.clone());
        let user_service = UserService::new(user_repo.clone(), db_pool.clone());
        let client_service = ClientService::new(
            client_repo.clone(),
            payment_repo.clone(),
            webhook.clone(),
            db_pool.clone(),
        );
        let payment_service = PaymentService::new(
            client_repo.clone(),
            payment_repo.clone(),
            receipt_repo,
            db_pool.clone(),
        );
        let agent_service = AgentService::new(agent_repo);
        let dashboard_service = DashboardService::new(client_repo.clone(), payment_repo.clone(), webhook);
        let bonus_service = BonusService::new(
            bonus_repo,
            user_repo,
            client_repo.clone(),
            payment_repo.clone(),
            db_pool.clone(),
        );
        let document_service = DocumentService::new(
            client_repo,
            payment_repo,
            config.company_name.clone(),
            config.fonts_dir.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            i18n_store,
            auth_service,
            user_service,
            client_service,
            payment_service,
            agent_service,
            dashboard_service,
            bonus_service,
            document_service,
        })
    }
}
