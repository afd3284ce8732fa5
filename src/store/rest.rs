use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, instrument};

use crate::config::StoreSettings;

use super::{entities::StudyRecord, RemoteStore, StoreError};

/// [RemoteStore] on top of a PostgREST endpoint, which is what Supabase exposes for its tables.
/// Rows are addressed through `{url}/rest/v1/{table}`. No timeout is set on the client, a hung
/// request keeps only its own operation waiting.
pub struct RestStore {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl RestStore {
    pub fn new(settings: &StoreSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(http: Client, settings: &StoreSettings) -> Self {
        Self {
            http,
            endpoint: format!(
                "{}/rest/v1/{}",
                settings.url.trim_end_matches('/'),
                settings.table
            ),
            api_key: settings.api_key.clone(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        // Body usually carries PostgREST's explanation of the failure.
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status, message })
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<StudyRecord>, StoreError> {
        let response = self
            .send(self.http.get(&self.endpoint).query(&[("select", "*")]))
            .await?;
        let body = response.bytes().await?;
        let records: Vec<StudyRecord> = serde_json::from_slice(&body)?;
        debug!("Fetched {} records", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn insert(&self, record: StudyRecord) -> Result<(), StoreError> {
        self.send(
            self.http
                .post(&self.endpoint)
                .header("Prefer", "return=minimal")
                .json(&[record]),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_matching(&self, target: StudyRecord) -> Result<(), StoreError> {
        self.send(self.http.delete(&self.endpoint).query(&[
            ("title", format!("eq.{}", target.title)),
            ("time", format!("eq.{}", target.time)),
        ]))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use anyhow::Result;
    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use reqwest::Client;
    use tokio::net::TcpListener;

    use crate::{
        config::StoreSettings,
        store::{entities::StudyRecord, RemoteStore, StoreError},
    };

    use super::RestStore;

    const TEST_KEY: &str = "anon-key";

    #[derive(Clone, Default)]
    struct TestTable {
        rows: Arc<Mutex<Vec<StudyRecord>>>,
    }

    fn authorized(headers: &HeaderMap) -> Result<(), StatusCode> {
        let api_key = headers.get("apikey").and_then(|v| v.to_str().ok());
        let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
        let expected_bearer = format!("Bearer {TEST_KEY}");
        if api_key == Some(TEST_KEY) && bearer == Some(expected_bearer.as_str()) {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }

    async fn list_rows(
        State(table): State<TestTable>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        authorized(&headers)?;
        assert_eq!(query.get("select").map(String::as_str), Some("*"));
        let rows = table.rows.lock().unwrap().clone();
        // Mimic store-managed columns that the client is expected to ignore.
        let rows = rows
            .iter()
            .enumerate()
            .map(|(id, v)| serde_json::json!({ "id": id, "title": v.title, "time": v.time }))
            .collect();
        Ok(Json(serde_json::Value::Array(rows)))
    }

    async fn insert_rows(
        State(table): State<TestTable>,
        headers: HeaderMap,
        Json(records): Json<Vec<StudyRecord>>,
    ) -> Result<StatusCode, StatusCode> {
        authorized(&headers)?;
        assert_eq!(
            headers.get("prefer").and_then(|v| v.to_str().ok()),
            Some("return=minimal")
        );
        table.rows.lock().unwrap().extend(records);
        Ok(StatusCode::CREATED)
    }

    async fn delete_rows(
        State(table): State<TestTable>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> Result<StatusCode, StatusCode> {
        authorized(&headers)?;
        let title = query
            .get("title")
            .and_then(|v| v.strip_prefix("eq."))
            .ok_or(StatusCode::BAD_REQUEST)?;
        let time = query
            .get("time")
            .and_then(|v| v.strip_prefix("eq."))
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or(StatusCode::BAD_REQUEST)?;
        table
            .rows
            .lock()
            .unwrap()
            .retain(|v| !v.matches(title, time));
        Ok(StatusCode::NO_CONTENT)
    }

    async fn spawn_table(table: TestTable) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new()
            .route(
                "/rest/v1/study_records",
                get(list_rows).post(insert_rows).delete(delete_rows),
            )
            .with_state(table);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{addr}"))
    }

    fn rest_store(url: String, api_key: &str) -> Result<RestStore> {
        let settings = StoreSettings {
            url,
            api_key: api_key.into(),
            table: "study_records".into(),
        };
        Ok(RestStore::with_client(
            Client::builder().no_proxy().build()?,
            &settings,
        ))
    }

    #[tokio::test]
    async fn test_rest_store_crud() -> Result<()> {
        let table = TestTable::default();
        let url = spawn_table(table.clone()).await?;
        let store = rest_store(url, TEST_KEY)?;

        store.insert(StudyRecord::new("Math", 3.)).await?;
        store.insert(StudyRecord::new("Rust book", 1.5)).await?;
        store.insert(StudyRecord::new("Math", 3.)).await?;

        assert_eq!(store.list_all().await?.len(), 3);

        store.delete_matching(StudyRecord::new("Math", 3.)).await?;

        assert_eq!(
            store.list_all().await?,
            vec![StudyRecord::new("Rust book", 1.5)]
        );
        assert_eq!(table.rows.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rest_store_trailing_slash_in_url() -> Result<()> {
        let url = spawn_table(TestTable::default()).await?;
        let store = rest_store(format!("{url}/"), TEST_KEY)?;
        assert!(store.list_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_rest_store_reports_status() -> Result<()> {
        let url = spawn_table(TestTable::default()).await?;
        let store = rest_store(url, "wrong-key")?;

        let error = store.list_all().await.unwrap_err();
        assert!(matches!(
            error,
            StoreError::Status { status, .. } if status == reqwest::StatusCode::UNAUTHORIZED
        ));

        let error = store.insert(StudyRecord::new("Math", 3.)).await.unwrap_err();
        assert!(matches!(error, StoreError::Status { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_rest_store_unreachable() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let store = rest_store(format!("http://{addr}"), TEST_KEY)?;
        let error = store.list_all().await.unwrap_err();
        assert!(matches!(error, StoreError::Transport(_)));
        Ok(())
    }
}
