use anyhow::{Context, Result, ensure};
use clap::Parser;
use serde_json::{Value, json};

#[derive(Parser, Debug)]
#[clap(about = "End-to-end exerciser for a running webhook relay server.", version)]
struct Args {
    /// Base URL of the webhook relay under test.
    #[clap(long, env = "WEBHOOK_BASE_URL", default_value = "http://localhost:5000")]
    url: String,
}

#[tokio::main]
/// # Signal Flow Integration Test
///
/// Exercises a live webhook relay end to end:
/// 1.  Verifies the `/health` probe.
/// 2.  Drains any leftover signals so the run starts from a clean buffer.
/// 3.  Posts a canonical trading signal and a raw-text alert.
/// 4.  Drains them via `/signals` and checks ordering, the injected
///     timestamp fields, and the raw-text wrapping.
/// 5.  Drains again and asserts emptiness (exactly-once delivery).
/// 6.  Checks the 400 paths: empty body and negative limit.
///
/// Run `server_webhook` first, then this binary (optionally with `--url`).
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();
    let base = args.url.trim_end_matches('/').to_string();

    // --- 1. Health probe ---
    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .with_context(|| format!("Is the relay running at {}?", base))?
        .json()
        .await?;
    ensure!(health["status"] == "healthy", "unexpected health: {health}");
    println!("health OK ({} signal(s) buffered)", health["signals_count"]);

    // --- 2. Start from a clean buffer ---
    let drained: Value = client
        .get(format!("{}/signals?limit=10000", base))
        .send()
        .await?
        .json()
        .await?;
    println!("drained {} leftover signal(s)", drained["count"]);

    // --- 3. Ingest a JSON signal and a raw-text alert ---
    let resp = client
        .post(format!("{}/webhook", base))
        .json(&json!({
            "action": "BUY",
            "symbol": "BTCUSDT",
            "price": 45000,
            "strategy": "test_flow"
        }))
        .send()
        .await?;
    ensure!(resp.status() == reqwest::StatusCode::OK, "webhook POST failed: {}", resp.status());
    let body: Value = resp.json().await?;
    ensure!(body["status"] == "success", "unexpected webhook response: {body}");
    ensure!(body["timestamp"].is_string(), "missing timestamp in {body}");
    println!("posted JSON signal, server timestamp {}", body["timestamp"]);

    let resp = client
        .post(format!("{}/webhook", base))
        .body("ALERT: not json at all")
        .send()
        .await?;
    ensure!(resp.status() == reqwest::StatusCode::OK, "raw-text POST failed: {}", resp.status());
    println!("posted raw-text signal");

    // --- 4. Drain and verify ordering + injected fields ---
    let body: Value = client
        .get(format!("{}/signals?limit=10", base))
        .send()
        .await?
        .json()
        .await?;
    ensure!(body["count"] == 2, "expected 2 signals, got {}", body["count"]);
    let signals = body["signals"].as_array().context("signals is not an array")?;

    // Most recent first: the raw-text alert was posted last.
    ensure!(signals[0]["raw"] == true, "newest signal should be the raw one: {:?}", signals[0]);
    ensure!(
        signals[0]["message"] == "ALERT: not json at all",
        "raw text was not preserved: {:?}",
        signals[0]
    );
    ensure!(signals[1]["action"] == "BUY", "JSON signal lost: {:?}", signals[1]);
    ensure!(signals[1]["symbol"] == "BTCUSDT", "JSON signal mangled: {:?}", signals[1]);
    for signal in signals {
        // Every drained signal must deserialize back into a typed record
        // with both injected fields populated.
        let record: lib_common::SignalRecord = serde_json::from_value(signal.clone())
            .with_context(|| format!("signal does not parse as a SignalRecord: {signal}"))?;
        ensure!(!record.timestamp.is_empty(), "missing timestamp: {signal}");
        ensure!(!record.received_at.is_empty(), "missing received_at: {signal}");
    }
    println!("drained both signals, newest first, timestamps injected");

    // --- 5. Exactly-once: a second drain must be empty ---
    let body: Value = client
        .get(format!("{}/signals?limit=10", base))
        .send()
        .await?
        .json()
        .await?;
    ensure!(body["count"] == 0, "drain was not destructive: {body}");
    println!("second drain empty (exactly-once delivery)");

    // --- 6. Validation paths ---
    let resp = client.post(format!("{}/webhook", base)).send().await?;
    ensure!(
        resp.status() == reqwest::StatusCode::BAD_REQUEST,
        "empty body should be 400, got {}",
        resp.status()
    );
    let body: Value = resp.json().await?;
    ensure!(body["error"].is_string(), "missing error body: {body}");

    let resp = client
        .get(format!("{}/signals?limit=-1", base))
        .send()
        .await?;
    ensure!(
        resp.status() == reqwest::StatusCode::BAD_REQUEST,
        "negative limit should be 400, got {}",
        resp.status()
    );
    println!("validation paths return 400 with JSON errors");

    println!("\nAll signal flow checks passed against {}", base);
    Ok(())
}
