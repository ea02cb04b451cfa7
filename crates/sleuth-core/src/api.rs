//! HTTP client for the remote workspace service.
//!
//! All resources live under `{base_url}/workspace/{workspace_id}/...`; every
//! request carries the bearer credential. Reads are GETs with JSON bodies,
//! the one mutation (label assignment) is a PUT.
//!
//! [`WorkspaceBackend`] is the seam the session executor works against, so
//! scenario tests can substitute a recording fake for the wire client.

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::model::{
    CategoriesResponse, Category, Document, DocumentsResponse, Element, ElementsResponse,
    LabelingStatus, ModelsResponse, PutLabelRequest,
};

/// Every remote read and mutation the client core needs.
#[async_trait]
pub trait WorkspaceBackend: Send + Sync {
    /// `GET /documents` — the workspace corpus listing.
    async fn fetch_documents(&self) -> Result<Vec<Document>>;

    /// `GET /categories` — the category listing.
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    /// `GET /document/{id}` — one document's elements.
    async fn fetch_document_elements(&self, document_id: &str) -> Result<Vec<Element>>;

    /// `GET /active_learning` — the recommendation queue for a category.
    async fn fetch_recommendations(&self, category: &str) -> Result<Vec<Element>>;

    /// `GET /positive_predictions` — elements predicted positive.
    async fn fetch_positive_predictions(&self, category: &str) -> Result<Vec<Element>>;

    /// `GET /suspicious_elements` — labels the model flags as suspicious.
    async fn fetch_suspicious_labels(&self, category: &str) -> Result<Vec<Element>>;

    /// `GET /contradiction_elements` — mutually contradicting labels.
    async fn fetch_contradicting_labels(&self, category: &str) -> Result<Vec<Element>>;

    /// `GET /positive_elements` — the full positive-label set.
    async fn fetch_positive_labels(&self, category: &str) -> Result<Vec<Element>>;

    /// `GET /query` — keyword search over the workspace.
    async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<Element>>;

    /// `GET /models` — latest usable classifier version, if any.
    async fn latest_model_version(&self, category: &str) -> Result<Option<i64>>;

    /// `GET /status` — labeling progress for a category.
    async fn fetch_status(&self, category: &str) -> Result<LabelingStatus>;

    /// `PUT /element/{id}` — assign a label value to one element.
    async fn put_label(&self, element_id: &str, category: &str, value: &str) -> Result<()>;
}

/// `reqwest`-backed implementation of [`WorkspaceBackend`].
pub struct HttpBackend {
    client: Client,
    base_url: String,
    workspace_id: String,
    token: String,
}

impl HttpBackend {
    /// Build a client for one workspace.
    pub fn new(
        base_url: impl Into<String>,
        workspace_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder().default_headers(headers).build()?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            workspace_id: workspace_id.into(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/workspace/{}/{}", self.base_url, self.workspace_id, path)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Map the response per the error taxonomy: non-success status first,
    /// then body decode — so a malformed body is distinguishable from a
    /// transport failure.
    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| Error::Malformed {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn get_elements(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Element>> {
        let response: ElementsResponse = self.get_json(path, query).await?;
        Ok(response.elements)
    }
}

#[async_trait]
impl WorkspaceBackend for HttpBackend {
    async fn fetch_documents(&self) -> Result<Vec<Document>> {
        let response: DocumentsResponse = self.get_json("documents", &[]).await?;
        Ok(response.documents)
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let response: CategoriesResponse = self.get_json("categories", &[]).await?;
        Ok(response.categories)
    }

    async fn fetch_document_elements(&self, document_id: &str) -> Result<Vec<Element>> {
        self.get_elements(&format!("document/{document_id}"), &[])
            .await
    }

    async fn fetch_recommendations(&self, category: &str) -> Result<Vec<Element>> {
        self.get_elements("active_learning", &[("category_name", category)])
            .await
    }

    async fn fetch_positive_predictions(&self, category: &str) -> Result<Vec<Element>> {
        self.get_elements("positive_predictions", &[("category_name", category)])
            .await
    }

    async fn fetch_suspicious_labels(&self, category: &str) -> Result<Vec<Element>> {
        self.get_elements("suspicious_elements", &[("category_name", category)])
            .await
    }

    async fn fetch_contradicting_labels(&self, category: &str) -> Result<Vec<Element>> {
        self.get_elements("contradiction_elements", &[("category_name", category)])
            .await
    }

    async fn fetch_positive_labels(&self, category: &str) -> Result<Vec<Element>> {
        self.get_elements("positive_elements", &[("category_name", category)])
            .await
    }

    async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<Element>> {
        let mut params = vec![("qry_string", query), ("sample_start_idx", "0")];
        if let Some(category) = category {
            params.push(("category_name", category));
        }
        self.get_elements("query", &params).await
    }

    async fn latest_model_version(&self, category: &str) -> Result<Option<i64>> {
        let response: ModelsResponse = self
            .get_json("models", &[("category_name", category)])
            .await?;
        Ok(response.models.iter().map(|m| m.model_version).max())
    }

    async fn fetch_status(&self, category: &str) -> Result<LabelingStatus> {
        self.get_json("status", &[("category_name", category)])
            .await
    }

    async fn put_label(&self, element_id: &str, category: &str, value: &str) -> Result<()> {
        let path = format!("element/{element_id}");
        let body = PutLabelRequest {
            category_name: category.to_string(),
            value: value.to_string(),
            update_counter: true,
        };
        let response = self
            .client
            .put(self.url(&path))
            .query(&[("category_name", category)])
            .header(header::AUTHORIZATION, self.auth_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                endpoint: path,
            });
        }
        tracing::debug!(element_id, category, value, "label stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(server.uri(), "w1", "tok-123").expect("client builds")
    }

    #[tokio::test]
    async fn documents_fetch_sends_bearer_and_decodes_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspace/w1/documents"))
            .and(header("Authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [{"document_id": "d0"}, {"document_id": "d1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let docs = backend(&server).fetch_documents().await.expect("fetch");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].document_id, "d0");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspace/w1/categories"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = backend(&server)
            .fetch_categories()
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::Status { status: 503, .. }));
        assert_eq!(err.code(), "E1002");
    }

    #[tokio::test]
    async fn malformed_body_maps_to_malformed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspace/w1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .fetch_documents()
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[tokio::test]
    async fn recommendations_pass_category_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspace/w1/active_learning"))
            .and(query_param("category_name", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "elements": [{"id": "d0-0", "docid": "d0", "text": "t"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let elements = backend(&server)
            .fetch_recommendations("c1")
            .await
            .expect("fetch");
        assert_eq!(elements.len(), 1);
    }

    #[tokio::test]
    async fn search_passes_query_and_start_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspace/w1/query"))
            .and(query_param("qry_string", "fraud"))
            .and(query_param("sample_start_idx", "0"))
            .and(query_param("category_name", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
            .expect(1)
            .mount(&server)
            .await;

        let hits = backend(&server)
            .search("fraud", Some("c1"))
            .await
            .expect("search");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn put_label_carries_the_mutation_contract() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/workspace/w1/element/d0-3"))
            .and(query_param("category_name", "c1"))
            .and(body_json(json!({
                "category_name": "c1",
                "value": "true",
                "update_counter": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .put_label("d0-3", "c1", "true")
            .await
            .expect("put");
    }

    #[tokio::test]
    async fn latest_model_version_takes_the_newest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspace/w1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"model_version": 1}, {"model_version": 4}, {"model_version": 3}]
            })))
            .mount(&server)
            .await;

        let version = backend(&server)
            .latest_model_version("c1")
            .await
            .expect("fetch");
        assert_eq!(version, Some(4));
    }

    #[tokio::test]
    async fn no_models_yet_means_no_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspace/w1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .mount(&server)
            .await;

        let version = backend(&server)
            .latest_model_version("c1")
            .await
            .expect("fetch");
        assert_eq!(version, None);
    }
}
