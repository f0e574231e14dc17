use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static REFERRAL_CLICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "referral_clicks_total",
        "Referral clicks recorded (counted against a link)"
    )
    .expect("register referral_clicks_total")
});

pub static REFERRAL_CLICKS_DEDUPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "referral_clicks_deduped_total",
        "Referral clicks suppressed by the dedup window"
    )
    .expect("register referral_clicks_deduped_total")
});

pub static LEADS_SUBMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "leads_submitted_total",
        "Leads that completed the submit step"
    )
    .expect("register leads_submitted_total")
});

pub static LEAD_WEBHOOK_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "lead_webhook_failures_total",
        "Lead notification webhook calls that failed"
    )
    .expect("register lead_webhook_failures_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
