use metrics::{counter, Counter};
use once_cell::sync::Lazy;

pub struct AdminLogMetrics {
    pub invocations_total: Counter,
    pub missing_context_total: Counter,
    pub argument_serialization_failures_total: Counter,
    pub response_serialization_failures_total: Counter,
}

pub static ADMIN_LOG_METRICS: Lazy<AdminLogMetrics> = Lazy::new(|| AdminLogMetrics {
    invocations_total: counter!("admin_log_invocations_total"),
    missing_context_total: counter!("admin_log_missing_context_total"),
    argument_serialization_failures_total: counter!(
        "admin_log_argument_serialization_failures_total"
    ),
    response_serialization_failures_total: counter!(
        "admin_log_response_serialization_failures_total"
    ),
});
