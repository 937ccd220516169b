// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/{id}",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        );

    let client_routes = Router::new()
        .route(
            "/",
            post(handlers::clients::create_client).get(handlers::clients::list_clients),
        )
        .route("/history", get(handlers::clients::client_history))
        .route(
            "/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/{id}/reset-schedule", post(handlers::clients::reset_schedule))
        .route("/{id}/terminate", post(handlers::clients::terminate_client))
        .route("/{id}/suspend", post(handlers::clients::suspend_client))
        .route("/{id}/reactivate", post(handlers::clients::reactivate_client))
        // Parcelas
        .route(
            "/{id}/payments",
            get(handlers::payments::list_payments).post(handlers::payments::add_payment),
        )
        .route(
            "/{id}/payments/{payment_id}",
            put(handlers::payments::update_payment).delete(handlers::payments::delete_payment),
        )
        .route(
            "/{id}/payments/{payment_id}/completion",
            post(handlers::payments::set_completion),
        )
        .route(
            "/{id}/payments/{payment_id}/receipts",
            get(handlers::payments::list_receipts).post(handlers::payments::attach_receipt),
        )
        .route(
            "/{id}/payments/{payment_id}/receipt.pdf",
            get(handlers::documents::generate_receipt_pdf),
        );

    let agent_routes = Router::new()
        .route(
            "/",
            post(handlers::agents::create_agent).get(handlers::agents::list_agents),
        )
        .route(
            "/{id}",
            get(handlers::agents::get_agent)
                .put(handlers::agents::update_agent)
                .delete(handlers::agents::delete_agent),
        )
        .route("/{id}/installments", post(handlers::agents::toggle_installment));

    let dashboard_routes = Router::new()
        .route("/metrics", get(handlers::dashboard::get_monthly_metrics))
        .route("/year", get(handlers::dashboard::get_year_overview))
        .route("/sync", post(handlers::dashboard::sync_metrics));

    let bonus_routes = Router::new()
        .route("/", get(handlers::bonuses::list_bonuses))
        .route(
            "/rules",
            post(handlers::bonuses::create_rule).get(handlers::bonuses::list_rules),
        )
        .route("/rules/{id}", delete(handlers::bonuses::delete_rule))
        .route("/compute", post(handlers::bonuses::compute_bonuses));

    // Tudo abaixo exige Bearer token
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/clients", client_routes)
        .nest("/api/agents", agent_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/bonuses", bonus_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use std::path::PathBuf;
    use tower::ServiceExt;

    // Pool preguiçoso: nenhuma rota testada aqui chega ao banco
    fn app() -> Router {
        let config = Config {
            database_url: "postgres://localhost/backoffice_test".into(),
            jwt_secret: "segredo-de-teste".into(),
            bind_addr: "127.0.0.1:0".into(),
            db_max_connections: 1,
            company_name: "Escritório Teste".into(),
            webhook_url: None,
            bootstrap_admin: None,
            fonts_dir: PathBuf::from("./fonts"),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState::with_pool(&config, pool).unwrap())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let response = app()
            .oneshot(Request::get("/api/clients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_in_requested_language() {
        let response = app()
            .oneshot(
                Request::get("/api/dashboard/metrics")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn login_validates_payload_before_touching_the_database() {
        let response = app()
            .oneshot(
                Request::post("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"nao-e-email","password":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["details"].is_object());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/api/clients"].is_object());
    }
}
