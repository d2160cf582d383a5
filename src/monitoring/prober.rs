use crate::db::entities::{check_result, monitor};
use crate::db::models::ProbeError;
use crate::db::services::check_result_service;
use once_cell::sync::Lazy;
use reqwest::{Client, Method};
use sea_orm::{DatabaseConnection, DbErr};
use std::time::{Duration, Instant};
use tracing::debug;

static PROBE_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// What one probe of one region produced.
#[derive(Debug, Clone)]
pub struct RegionOutcome {
    pub is_up: bool,
    pub latency_ms: Option<i32>,
    pub status_code: Option<i32>,
    pub error: Option<ProbeError>,
}

/// An empty expectation list means "any 2xx".
pub fn status_matches(code: u16, expected: &[u16]) -> bool {
    if expected.is_empty() {
        (200..300).contains(&code)
    } else {
        expected.contains(&code)
    }
}

/// Probes the monitor's endpoint once. Never fails: every transport or
/// protocol problem is folded into the outcome as a classified error.
pub async fn probe(monitor: &monitor::Model) -> RegionOutcome {
    let method =
        Method::from_bytes(monitor.method.to_uppercase().as_bytes()).unwrap_or(Method::GET);
    let timeout = Duration::from_secs(monitor.timeout_seconds.max(1) as u64);

    let mut request = PROBE_CLIENT
        .request(method, &monitor.url)
        .timeout(timeout);
    for (name, value) in monitor.header_map() {
        request = request.header(name, value);
    }
    if let Some(body) = &monitor.body {
        request = request.body(body.clone());
    }

    let started = Instant::now();
    match request.send().await {
        Ok(response) => {
            let latency_ms = started.elapsed().as_millis() as i32;
            let code = response.status().as_u16();
            if status_matches(code, &monitor.expected_codes()) {
                RegionOutcome {
                    is_up: true,
                    latency_ms: Some(latency_ms),
                    status_code: Some(code as i32),
                    error: None,
                }
            } else {
                RegionOutcome {
                    is_up: false,
                    latency_ms: Some(latency_ms),
                    status_code: Some(code as i32),
                    error: Some(ProbeError {
                        kind: "status".to_string(),
                        message: format!("Unexpected status code {}", code),
                    }),
                }
            }
        }
        Err(e) => {
            let kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connect"
            } else {
                "request"
            };
            RegionOutcome {
                is_up: false,
                latency_ms: None,
                status_code: None,
                error: Some(ProbeError {
                    kind: kind.to_string(),
                    message: e.to_string(),
                }),
            }
        }
    }
}

/// Probes one region and persists the result row for it.
pub async fn check_region(
    db: &DatabaseConnection,
    monitor: &monitor::Model,
    region: &str,
) -> Result<check_result::Model, DbErr> {
    let outcome = probe(monitor).await;
    debug!(
        monitor_id = monitor.id,
        region = region,
        is_up = outcome.is_up,
        status_code = ?outcome.status_code,
        "Probe finished."
    );
    check_result_service::record_result(
        db,
        monitor.id,
        region,
        outcome.is_up,
        outcome.latency_ms,
        outcome.status_code,
        outcome.error.as_ref(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_expectation_accepts_any_2xx() {
        assert!(status_matches(200, &[]));
        assert!(status_matches(204, &[]));
        assert!(status_matches(299, &[]));
        assert!(!status_matches(301, &[]));
        assert!(!status_matches(404, &[]));
        assert!(!status_matches(500, &[]));
    }

    #[test]
    fn explicit_expectation_is_exact() {
        assert!(status_matches(301, &[301, 302]));
        assert!(!status_matches(200, &[301, 302]));
        assert!(status_matches(404, &[404]));
    }
}
