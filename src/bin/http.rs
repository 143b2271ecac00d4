#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use capacity_forecast::{EngineConfig, Snapshot, http_api, load_snapshot_from_json, logging};

    logging::init();

    let addr: SocketAddr = std::env::var("CAPACITY_FORECAST_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let config = match std::env::var("CAPACITY_FORECAST_CONFIG") {
        Ok(path) => EngineConfig::load_from_json(path)?,
        Err(_) => EngineConfig::default(),
    };
    config.validate()?;
    let snapshot = match std::env::var("CAPACITY_FORECAST_SNAPSHOT") {
        Ok(path) => load_snapshot_from_json(path)?,
        Err(_) => Snapshot::default(),
    };

    println!("capacity-forecast HTTP API listening on http://{addr}");
    http_api::serve(addr, snapshot, config).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
