use crate::CoreError;

/// POST a JSON payload to an external webhook endpoint.
///
/// Used for best-effort notifications (e.g. a new submitted lead); callers
/// decide whether a failure is fatal.
pub async fn post_json(url: &str, payload: &serde_json::Value) -> Result<(), CoreError> {
    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| CoreError::Network(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(CoreError::Network(format!("webhook returned {}", resp.status())));
    }
    Ok(())
}
