use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::store::{CapacityGuard, Document, DocumentStore, Filter, StoreError};

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Requests run with the project key; row access is enforced by the database.
    fn service_token(&self) -> &str {
        &self.anon_key
    }
}

/// Directory store backed by the hosted PostgREST API. Guarded writes are
/// delegated to the `guarded_insert` / `guarded_update` database functions,
/// which count and write inside one serializable transaction.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    fn table_path(collection: &str, filters: &[Filter]) -> String {
        let mut path = format!("/rest/v1/{}?select=*", collection);
        for filter in filters {
            path.push('&');
            path.push_str(&filter.to_query());
        }
        path
    }

    fn id_path(collection: &str, id: &str) -> String {
        format!("/rest/v1/{}?id=eq.{}", collection, urlencoding::encode(id))
    }

    async fn rows(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<Value>, StoreError> {
        self.supabase
            .request::<Vec<Value>>(method, path, Some(self.supabase.service_token()), body)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<String, StoreError> {
        let path = format!("/rest/v1/rpc/{}", function);
        self.supabase
            .request::<String>(Method::POST, &path, Some(self.supabase.service_token()), Some(params))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn into_documents(rows: Vec<Value>) -> Result<Vec<Document>, StoreError> {
        rows.into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(map),
                other => Err(StoreError::Malformed(format!("expected a row object, got {}", other))),
            })
            .collect()
    }

    fn guards_json(guards: &[CapacityGuard]) -> Value {
        Value::Array(
            guards
                .iter()
                .map(|guard| {
                    json!({
                        "name": guard.name,
                        "filters": filters_json(&guard.filters),
                        "limit": guard.limit,
                    })
                })
                .collect(),
        )
    }

    /// The database functions answer `ok`, `precondition_failed`, `not_found`
    /// or `capacity_exceeded:<guard name>`.
    fn guarded_outcome(outcome: &str, collection: &str, id: &str, guards: &[CapacityGuard]) -> Result<(), StoreError> {
        if let Some(name) = outcome.strip_prefix("capacity_exceeded") {
            let name = name.trim_start_matches(':');
            let full = guards
                .iter()
                .find(|guard| guard.name == name)
                .or_else(|| guards.first());
            return Err(match full {
                Some(guard) => guard.exceeded(),
                None => StoreError::CapacityExceeded {
                    guard: name.to_string(),
                    limit: 0,
                },
            });
        }

        match outcome {
            "ok" => Ok(()),
            "precondition_failed" => Err(StoreError::PreconditionFailed { id: id.to_string() }),
            "not_found" => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            other => {
                warn!("Unexpected guarded write outcome '{}'", other);
                Err(StoreError::Malformed(format!("unexpected guarded write outcome: {}", other)))
            }
        }
    }
}

fn filters_json(filters: &[Filter]) -> Value {
    Value::Array(
        filters
            .iter()
            .map(|filter| {
                let (op, value) = match filter {
                    Filter::Eq(_, v) => ("eq", v),
                    Filter::Gte(_, v) => ("gte", v),
                    Filter::Lte(_, v) => ("lte", v),
                };
                json!({ "field": filter.field(), "op": op, "value": value })
            })
            .collect(),
    )
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn find(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError> {
        let rows = self.rows(Method::GET, &Self::table_path(collection, filters), None).await?;
        Self::into_documents(rows)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let rows = self.rows(Method::GET, &Self::id_path(collection, id), None).await?;
        Ok(Self::into_documents(rows)?.into_iter().next())
    }

    async fn create(&self, collection: &str, mut fields: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        fields.insert("id".to_string(), Value::String(id.clone()));

        let path = format!("/rest/v1/{}", collection);
        self.rows(Method::POST, &path, Some(Value::Object(fields))).await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, mut partial: Document) -> Result<(), StoreError> {
        partial.remove("id");
        let rows = self
            .rows(Method::PATCH, &Self::id_path(collection, id), Some(Value::Object(partial)))
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let rows = self.rows(Method::DELETE, &Self::id_path(collection, id), None).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn create_guarded(
        &self,
        collection: &str,
        mut fields: Document,
        guards: &[CapacityGuard],
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        fields.insert("id".to_string(), Value::String(id.clone()));

        let outcome = self
            .rpc(
                "guarded_insert",
                json!({
                    "collection": collection,
                    "document": fields,
                    "guards": Self::guards_json(guards),
                }),
            )
            .await?;

        Self::guarded_outcome(&outcome, collection, &id, guards)?;
        Ok(id)
    }

    async fn update_guarded(
        &self,
        collection: &str,
        id: &str,
        expected: &[Filter],
        mut partial: Document,
        guards: &[CapacityGuard],
    ) -> Result<(), StoreError> {
        partial.remove("id");
        let outcome = self
            .rpc(
                "guarded_update",
                json!({
                    "collection": collection,
                    "id": id,
                    "expected": filters_json(expected),
                    "patch": partial,
                    "guards": Self::guards_json(guards),
                }),
            )
            .await?;

        Self::guarded_outcome(&outcome, collection, id, guards)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use shared_config::StoreBackend;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(url: &str) -> AppConfig {
        AppConfig {
            supabase_url: url.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            store_backend: StoreBackend::Supabase,
            sms_gateway_url: String::new(),
            sms_api_token: String::new(),
            sms_sender_name: "CAMPUS".to_string(),
            sms_country_code: "63".to_string(),
            campus_utc_offset_hours: 8,
            port: 3000,
        }
    }

    fn store(server: &MockServer) -> SupabaseStore {
        SupabaseStore::new(SupabaseClient::new(&config(&server.uri())))
    }

    #[tokio::test]
    async fn find_translates_filters_to_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("status", "eq.approved"))
            .and(query_param("office", "eq.Cashier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a1", "status": "approved", "office": "Cashier"}
            ])))
            .mount(&server)
            .await;

        let docs = store(&server)
            .find("appointments", &[Filter::eq("status", "approved"), Filter::eq("office", "Cashier")])
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], json!("a1"));
    }

    #[tokio::test]
    async fn update_on_missing_row_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/offices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let result = store(&server).update("offices", "missing", Document::new()).await;
        assert_matches!(result, Err(StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn guarded_insert_maps_capacity_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/guarded_insert"))
            .and(body_partial_json(json!({
                "collection": "appointments",
                "guards": [{"name": "slot", "limit": 4}, {"name": "requester", "limit": 1}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("capacity_exceeded:requester")))
            .mount(&server)
            .await;

        let guards = [
            CapacityGuard::new("slot", vec![Filter::eq("status", "approved")], 4),
            CapacityGuard::new("requester", vec![Filter::eq("requester_id", "u1")], 1),
        ];
        let result = store(&server)
            .create_guarded("appointments", Document::new(), &guards)
            .await;
        assert_matches!(result, Err(StoreError::CapacityExceeded { guard, limit: 1 }) if guard == "requester");
    }

    #[tokio::test]
    async fn server_errors_surface_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/holidays"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let result = store(&server).find("holidays", &[]).await;
        assert_matches!(result, Err(StoreError::Unavailable(_)));
    }
}
