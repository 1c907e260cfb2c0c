//! Endpoint methods layered over [`Client::execute`].

use super::{Client, RequestOptions};
use crate::error::Result;
use crate::types::*;
use reqwest::Method;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::json;

impl Client {
    /// Extract structured data from a single web page.
    pub async fn extract(&self, request: ExtractRequest) -> Result<ExtractResponse> {
        self.post("/api/v1/extract", &request).await
    }

    /// Start an asynchronous crawl job.
    pub async fn crawl(&self, request: CrawlRequest) -> Result<CrawlJobCreated> {
        self.post("/api/v1/crawl", &request).await
    }

    /// Analyze a website to detect structure and suggest schemas.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse> {
        self.post("/api/v1/analyze", &request).await
    }

    /// Get usage statistics for the current billing period.
    pub async fn get_usage(&self) -> Result<UsageResponse> {
        self.get("/api/v1/usage").await
    }

    /// Crawl and extraction jobs.
    pub fn jobs(&self) -> Jobs<'_> {
        Jobs { client: self }
    }

    /// Saved extraction schemas.
    pub fn schemas(&self) -> Schemas<'_> {
        Schemas { client: self }
    }

    /// Saved sites.
    pub fn sites(&self) -> Sites<'_> {
        Sites { client: self }
    }

    /// API key management.
    pub fn keys(&self) -> Keys<'_> {
        Keys { client: self }
    }

    /// LLM provider keys, models and fallback chain.
    pub fn llm(&self) -> Llm<'_> {
        Llm { client: self }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(Method::GET, path, None::<&()>, RequestOptions::new())
            .await
    }

    async fn get_fresh<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(
            Method::GET,
            path,
            None::<&()>,
            RequestOptions::new().with_skip_cache(),
        )
        .await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body), RequestOptions::new())
            .await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::PUT, path, Some(body), RequestOptions::new())
            .await
    }

    // Endpoints that answer with no meaningful body.
    async fn put_discard<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.put::<B, IgnoredAny>(path, body).await.map(|_| ())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.execute::<(), IgnoredAny>(Method::DELETE, path, None, RequestOptions::new())
            .await
            .map(|_| ())
    }
}

/// Job endpoints. Job state changes while a job runs, so reads skip the cache.
#[derive(Debug, Clone, Copy)]
pub struct Jobs<'a> {
    client: &'a Client,
}

impl Jobs<'_> {
    /// List jobs.
    pub async fn list(&self, options: ListOptions) -> Result<JobList> {
        self.client
            .get(&format!("/api/v1/jobs{}", options.to_query()))
            .await
    }

    /// Get a job by ID.
    pub async fn get(&self, id: &str) -> Result<Job> {
        self.client.get_fresh(&format!("/api/v1/jobs/{id}")).await
    }

    /// Get a job's results, optionally merged into a single object.
    pub async fn results(&self, id: &str, merge: bool) -> Result<JobResults> {
        let query = if merge { "?merge=true" } else { "" };
        self.client
            .get_fresh(&format!("/api/v1/jobs/{id}/results{query}"))
            .await
    }
}

/// Schema endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Schemas<'a> {
    client: &'a Client,
}

impl Schemas<'_> {
    pub async fn list(&self) -> Result<SchemaList> {
        self.client.get("/api/v1/schemas").await
    }

    pub async fn get(&self, id: &str) -> Result<Schema> {
        self.client.get(&format!("/api/v1/schemas/{id}")).await
    }

    pub async fn create(&self, input: SchemaInput) -> Result<Schema> {
        self.client.post("/api/v1/schemas", &input).await
    }

    pub async fn update(&self, id: &str, input: SchemaInput) -> Result<Schema> {
        self.client
            .put(&format!("/api/v1/schemas/{id}"), &input)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/api/v1/schemas/{id}")).await
    }
}

/// Saved site endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Sites<'a> {
    client: &'a Client,
}

impl Sites<'_> {
    pub async fn list(&self) -> Result<SiteList> {
        self.client.get("/api/v1/sites").await
    }

    pub async fn get(&self, id: &str) -> Result<Site> {
        self.client.get(&format!("/api/v1/sites/{id}")).await
    }

    pub async fn create(&self, input: SiteInput) -> Result<Site> {
        self.client.post("/api/v1/sites", &input).await
    }

    pub async fn update(&self, id: &str, input: SiteInput) -> Result<Site> {
        self.client.put(&format!("/api/v1/sites/{id}"), &input).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/api/v1/sites/{id}")).await
    }
}

/// API key endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Keys<'a> {
    client: &'a Client,
}

impl Keys<'_> {
    pub async fn list(&self) -> Result<ApiKeyList> {
        self.client.get("/api/v1/keys").await
    }

    /// Create a key. The secret is only returned here.
    pub async fn create(&self, name: &str) -> Result<ApiKeyCreated> {
        self.client
            .post("/api/v1/keys", &json!({ "name": name }))
            .await
    }

    pub async fn revoke(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/api/v1/keys/{id}")).await
    }
}

/// LLM configuration endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Llm<'a> {
    client: &'a Client,
}

impl Llm<'_> {
    pub async fn list_providers(&self) -> Result<ProvidersResponse> {
        self.client.get("/api/v1/llm/providers").await
    }

    pub async fn list_models(&self, provider: &str) -> Result<ModelList> {
        self.client
            .get(&format!("/api/v1/llm/models/{provider}"))
            .await
    }

    pub async fn list_keys(&self) -> Result<LlmKeyList> {
        self.client.get("/api/v1/llm/keys").await
    }

    pub async fn upsert_key(&self, request: UpsertLlmKeyRequest) -> Result<LlmKey> {
        self.client.put("/api/v1/llm/keys", &request).await
    }

    pub async fn delete_key(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/api/v1/llm/keys/{id}")).await
    }

    pub async fn get_chain(&self) -> Result<LlmChain> {
        self.client.get("/api/v1/llm/chain").await
    }

    pub async fn set_chain(&self, chain: Vec<LlmChainEntry>) -> Result<()> {
        self.client
            .put_discard("/api/v1/llm/chain", &json!({ "chain": chain }))
            .await
    }
}
