//! Basic extraction demo.
//!
//! Extracts structured data from a web page, logging the client's retry and
//! cache activity through `tracing`.
//!
//! Run with: `REFYNE_API_KEY=your-key RUST_LOG=refyne=debug cargo run --example basic_extraction`

use refyne_client::{
    CancellationToken, Client, ExtractRequest, ExtractResponse, Method, RequestOptions,
    TracingLogger,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_key = std::env::var("REFYNE_API_KEY").map_err(|_| "REFYNE_API_KEY must be set")?;
    let client = Client::builder(api_key)
        .timeout(Duration::from_secs(60))
        .logger(Arc::new(TracingLogger))
        .user_agent_suffix("basic-extraction-demo")
        .build()?;

    let schema = json!({
        "title": "string",
        "description": "string",
        "price": {
            "amount": "number",
            "currency": "string"
        }
    });

    let result = client
        .extract(ExtractRequest {
            url: "https://example.com/product".into(),
            schema: schema.clone(),
            ..Default::default()
        })
        .await?;

    println!("Extracted data: {:#}", result.data);
    if let Some(usage) = &result.usage {
        println!(
            "Tokens used: {} input, {} output",
            usage.input_tokens, usage.output_tokens
        );
        println!("Cost: ${:.6}", usage.cost_usd);
    }

    // Usage reads are cached when the server allows it; the second call is
    // served locally if the response carried a max-age.
    let usage = client.get_usage().await?;
    let _ = client.get_usage().await?;
    println!("Jobs this period: {}", usage.total_jobs);

    // Any call can be abandoned through a cancellation token.
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        canceller.cancel();
    });
    let outcome = client
        .execute::<_, ExtractResponse>(
            Method::POST,
            "/api/v1/extract",
            Some(&ExtractRequest {
                url: "https://example.com/slow-page".into(),
                schema,
                ..Default::default()
            }),
            RequestOptions::new().with_cancellation(token),
        )
        .await;
    match outcome {
        Ok(result) => println!("Slow page: {:#}", result.data),
        Err(err) if err.is_cancelled() => println!("Slow page extraction cancelled"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
