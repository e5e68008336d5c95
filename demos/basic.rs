use std::time::Duration;

use outbound_http::{CallContext, Headers, HttpClient, RetryPolicy};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Ip {
    origin: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outbound_http=debug".into()),
        )
        .init();

    let base_url =
        std::env::var("OUTBOUND_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());

    let client = HttpClient::builder()
        .base_url(base_url)
        .timeout(Duration::from_secs(10))
        .header("User-Agent", "outbound-http-demo/0.1")
        .retry_policy(RetryPolicy::default())
        .build()?;

    let ctx = CallContext::new();
    let ip: Ip = client.get_json(&ctx, "/ip", &Headers::new()).await?;
    println!("origin: {}", ip.origin);

    let response = client.get(&ctx, "/status/503", &Headers::new()).await?;
    println!("after retries: {}", response.status());

    Ok(())
}
