//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG sobrescreve; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let bootstrap_admin = config.bootstrap_admin.clone();

    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Primeiro administrador, só quando a tabela de usuários está vazia
    if let Some((email, password)) = bootstrap_admin {
        app_state
            .auth_service
            .bootstrap_admin(&email, &password)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar o administrador inicial: {}", e))?;
    }

    let app = routes::build_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
