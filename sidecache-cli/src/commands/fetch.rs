//! `fetch` subcommand: resolve one request through the strategy engine.

use sidecache::agent::Agent;
use sidecache::net::InterceptedRequest;
use sidecache::store::Method;

use crate::error::CliError;

pub async fn run(
    agent: &Agent,
    url: &str,
    method: &str,
    body: Option<String>,
) -> Result<(), CliError> {
    let method =
        Method::parse(method).ok_or_else(|| CliError::InvalidMethod(method.to_string()))?;

    let mut request = InterceptedRequest::new(method, url);
    if let Some(body) = body {
        request = request.with_body(body.into_bytes());
    }

    match agent.on_intercept(request).await {
        Some(response) => {
            println!("HTTP {}", response.status);
            for (name, value) in &response.headers {
                println!("{name}: {value}");
            }
            println!();
            println!("{}", String::from_utf8_lossy(&response.body));
        }
        None => {
            println!("no response: offline and no cached fallback available");
        }
    }

    let stats = agent.strategy_stats();
    println!(
        "-- hits {} / misses {} / fallbacks {} / absent {}",
        stats.store_hits, stats.store_misses, stats.fallback_served, stats.absent
    );

    Ok(())
}
