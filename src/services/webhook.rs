// src/services/webhook.rs
//
// Eventos enviados ao sistema de automação externo. Entrega "fire-and-forget":
// falhas são logadas e nunca chegam ao usuário.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub event_type: String,
    pub company: String,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub data: Value,
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &WebhookEvent) -> anyhow::Result<()>;
}

/// POST JSON para a URL configurada.
pub struct HttpEventSink {
    client: reqwest::Client,
    url: String,
}

impl HttpEventSink {
    pub fn new(url: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn deliver(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        let response = self.client.post(&self.url).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("webhook respondeu {}", status);
        }
        Ok(())
    }
}

/// Sem URL configurada: descarta o evento.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn deliver(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        tracing::debug!("Webhook desativado; evento {} descartado", event.event_type);
        Ok(())
    }
}

#[derive(Clone)]
pub struct WebhookDispatcher {
    sink: Arc<dyn EventSink>,
    company: String,
}

impl WebhookDispatcher {
    pub fn new(sink: Arc<dyn EventSink>, company: String) -> Self {
        Self { sink, company }
    }

    /// Escolhe o destino conforme a configuração.
    pub fn from_config(url: Option<&str>, company: String) -> anyhow::Result<Self> {
        let sink: Arc<dyn EventSink> = match url {
            Some(url) => Arc::new(HttpEventSink::new(url.to_owned())?),
            None => Arc::new(NoopEventSink),
        };
        Ok(Self::new(sink, company))
    }

    pub fn dispatch(&self, event_type: &str, user_id: Uuid, data: Value) -> JoinHandle<()> {
        let event = WebhookEvent {
            event_type: event_type.to_owned(),
            company: self.company.clone(),
            user_id,
            date: Utc::now(),
            data,
        };
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            match sink.deliver(&event).await {
                Ok(()) => tracing::debug!("📤 Webhook {} entregue", event.event_type),
                Err(e) => tracing::warn!("Falha ao entregar webhook {}: {}", event.event_type, e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<WebhookEvent>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn deliver(&self, event: &WebhookEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        async fn deliver(&self, _event: &WebhookEvent) -> anyhow::Result<()> {
            anyhow::bail!("fora do ar")
        }
    }

    #[tokio::test]
    async fn dispatch_delivers_flattened_payload() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = WebhookDispatcher::new(sink.clone(), "Escritório".into());
        let user_id = Uuid::new_v4();

        dispatcher
            .dispatch("client_created", user_id, json!({ "client_count": 1 }))
            .await
            .unwrap();

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let body = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(body["event_type"], "client_created");
        assert_eq!(body["company"], "Escritório");
        assert_eq!(body["user_id"], user_id.to_string());
        assert_eq!(body["client_count"], 1);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_panic_the_task() {
        let dispatcher = WebhookDispatcher::new(Arc::new(FailingSink), "X".into());
        let handle = dispatcher.dispatch("metrics_sync", Uuid::new_v4(), json!({}));
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn missing_url_uses_noop_sink() {
        let dispatcher = WebhookDispatcher::from_config(None, "X".into()).unwrap();
        assert!(dispatcher.dispatch("metrics_sync", Uuid::new_v4(), json!({})).await.is_ok());
    }
}
