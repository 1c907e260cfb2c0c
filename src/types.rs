//! Request and response shapes for the Refyne endpoints.
//!
//! Requests serialize in camelCase and skip unset optional fields. Responses
//! tolerate missing optional fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// === Extraction ===

/// Request for single-page extraction.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Page to extract from.
    pub url: String,
    /// Shape of the data to extract.
    pub schema: Value,
    /// How the page should be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_mode: Option<FetchMode>,
    /// Override the LLM used for extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_config: Option<LlmConfig>,
}

/// Page fetch strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Let the service decide.
    #[default]
    Auto,
    /// Plain HTTP fetch.
    Static,
    /// Render JavaScript in a browser.
    Dynamic,
}

/// Extraction result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    /// Data matching the requested schema.
    pub data: Value,
    /// URL that was extracted.
    pub url: String,
    /// When the page was fetched.
    pub fetched_at: String,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<TokenUsage>,
    /// Timing and model details.
    #[serde(default)]
    pub metadata: Option<ExtractionMetadata>,
}

/// Token usage for an extraction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Amount charged in USD.
    pub cost_usd: f64,
    /// Raw provider cost in USD.
    pub llm_cost_usd: f64,
    /// True when the caller's own provider key was used.
    pub is_byok: bool,
}

/// Timing and model details for an extraction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionMetadata {
    pub fetch_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub model: String,
    pub provider: String,
}

/// LLM override for a single request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

// === Crawling ===

/// Request to start an asynchronous crawl job.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    /// Seed URL.
    pub url: String,
    /// Shape of the data to extract from each page.
    pub schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<CrawlOptions>,
    /// Called when the job finishes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_config: Option<LlmConfig>,
}

/// Crawl limits and link-following rules.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CrawlOptions {
    /// CSS selector for links to follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_selector: Option<String>,
    /// Regex that followed URLs must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    /// CSS selector for the pagination link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_urls: Option<u32>,
    /// Delay between requests, e.g. `"500ms"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_domain_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_from_seeds: Option<bool>,
}

/// Returned when a crawl job is accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJobCreated {
    pub job_id: String,
    pub status: JobStatus,
    /// Where to poll for progress.
    #[serde(default)]
    pub status_url: Option<String>,
}

// === Jobs ===

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A crawl or extraction job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    /// Seed URL.
    pub url: String,
    #[serde(default)]
    pub urls_queued: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub token_usage_input: u64,
    #[serde(default)]
    pub token_usage_output: u64,
    #[serde(default)]
    pub cost_usd: f64,
    /// Set when the job failed.
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    pub created_at: String,
}

/// Page of jobs.
#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    pub jobs: Vec<Job>,
}

/// Pagination for list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListOptions {
    /// Render as a query string, including the leading `?`, or an empty
    /// string when nothing is set.
    pub fn to_query(&self) -> String {
        let params: Vec<String> = [("limit", self.limit), ("offset", self.offset)]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| format!("{name}={v}")))
            .collect();
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

/// Extraction results for a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResults {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub page_count: u32,
    /// One result per page.
    #[serde(default)]
    pub results: Option<Vec<Value>>,
    /// All pages merged into one object, when requested.
    #[serde(default)]
    pub merged: Option<Value>,
}

// === Analysis ===

/// Request for website analysis.
#[derive(Debug, Clone, Serialize, Default)]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

/// Suggested schema and crawl patterns for a site.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub url: String,
    pub suggested_schema: Value,
    #[serde(default)]
    pub follow_patterns: Vec<String>,
}

// === Schemas ===

/// A saved extraction schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Schema body in YAML.
    pub schema_yaml: String,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaList {
    pub schemas: Vec<Schema>,
}

/// Body for creating or replacing a schema.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInput {
    pub name: String,
    pub schema_yaml: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// === Sites ===

/// A saved site with default crawl settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub schema_id: Option<String>,
    #[serde(default)]
    pub crawl_options: Option<CrawlOptions>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteList {
    pub sites: Vec<Site>,
}

/// Body for creating or replacing a site.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteInput {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawl_options: Option<CrawlOptions>,
}

// === API keys ===

/// An API key. The secret is never returned after creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    /// Leading characters of the key, for identification.
    pub prefix: String,
    pub created_at: String,
    #[serde(default)]
    pub last_used_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyList {
    pub keys: Vec<ApiKey>,
}

/// A freshly created API key, including its secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyCreated {
    pub id: String,
    pub name: String,
    /// Full key. Shown only once.
    pub key: String,
}

// === Usage ===

/// Usage for the current billing period.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UsageResponse {
    pub total_jobs: u64,
    pub total_charged_usd: f64,
    /// Jobs run on the caller's own provider keys, which are not charged.
    pub byok_jobs: u64,
}

// === LLM configuration ===

/// A stored LLM provider key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmKey {
    pub id: String,
    pub provider: String,
    pub default_model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    pub is_enabled: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmKeyList {
    pub keys: Vec<LlmKey>,
}

/// Body for adding or replacing a provider key.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpsertLlmKeyRequest {
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

/// One step of the LLM fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmChainEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmChain {
    pub chain: Vec<LlmChainEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<String>,
}
