//! assets/fetch: загрузка байтов GIF по URL (ureq, синхронно, с таймаутом и лимитом тела).

use std::time::Duration;

use crate::consts::{DEFAULT_FETCH_MAX_BYTES, DEFAULT_FETCH_TIMEOUT_MS};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Общий таймаут запроса (connect + чтение тела).
    pub timeout: Duration,
    /// Максимальный размер тела ответа.
    pub max_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            max_bytes: DEFAULT_FETCH_MAX_BYTES,
        }
    }
}

/// Скачать тело ответа целиком. HTTP-статусы 4xx/5xx: ошибка.
pub fn fetch_bytes(url: &str, opts: &FetchOptions) -> StoreResult<Vec<u8>> {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(opts.timeout))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let mut response = agent.get(url).call().map_err(|e| network(url, e))?;

    let bytes = response
        .body_mut()
        .with_config()
        .limit(opts.max_bytes)
        .read_to_vec()
        .map_err(|e| network(url, e))?;

    Ok(bytes)
}

fn network(url: &str, e: ureq::Error) -> StoreError {
    StoreError::Network {
        url: url.to_string(),
        reason: e.to_string(),
    }
}
