
use prometheus::{Encoder, TextEncoder, Registry, IntCounterVec, IntGauge};
use lazy_static::lazy_static;
use std::sync::OnceLock;
use axum::response::IntoResponse;
use axum::http::StatusCode;
lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}
static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static ACTIVE_SESSIONS: OnceLock<IntGauge> = OnceLock::new();
static DISPATCH_OUTCOMES: OnceLock<IntCounterVec> = OnceLock::new();
static PARSER_STRATEGY_WINS: OnceLock<IntCounterVec> = OnceLock::new();
static VALIDATION_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();
static PERSISTENCE_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let req_counter = REQ_COUNTER.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("requests_total", "Total requests per route"),
            &["route", "status"],
        ).unwrap()
    });

    let active_sessions = ACTIVE_SESSIONS.get_or_init(|| {
        IntGauge::new("active_sessions", "Sessions currently held by the context manager").unwrap()
    });

    let dispatch_outcomes = DISPATCH_OUTCOMES.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("dispatch_outcomes_total", "Model dispatch outcomes per provider"),
            &["provider", "outcome"],
        ).unwrap()
    });

    let parser_strategy_wins = PARSER_STRATEGY_WINS.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("parser_strategy_wins_total", "Which recovery parser strategy produced the accepted result"),
            &["strategy"],
        ).unwrap()
    });

    let validation_failures = VALIDATION_FAILURES.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("validation_failures_total", "Safety validator rule failures"),
            &["rule"],
        ).unwrap()
    });

    let persistence_errors = PERSISTENCE_ERRORS.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("persistence_errors_total", "Context manager persistence write failures"),
            &["op"],
        ).unwrap()
    });

    REGISTRY.register(Box::new(req_counter.clone())).ok();
    REGISTRY.register(Box::new(active_sessions.clone())).ok();
    REGISTRY.register(Box::new(dispatch_outcomes.clone())).ok();
    REGISTRY.register(Box::new(parser_strategy_wins.clone())).ok();
    REGISTRY.register(Box::new(validation_failures.clone())).ok();
    REGISTRY.register(Box::new(persistence_errors.clone())).ok();
}

pub fn inc_request(route: &str, status: &str) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, status]).inc();
    }
}
pub fn set_active_sessions(count: i64) {
    if let Some(gauge) = ACTIVE_SESSIONS.get() {
        gauge.set(count);
    }
}
pub fn inc_dispatch_outcome(provider: &str, outcome: &str) {
    if let Some(counter) = DISPATCH_OUTCOMES.get() {
        counter.with_label_values(&[provider, outcome]).inc();
    }
}
pub fn inc_parser_strategy_win(strategy: &str) {
    if let Some(counter) = PARSER_STRATEGY_WINS.get() {
        counter.with_label_values(&[strategy]).inc();
    }
}
pub fn inc_validation_failure(rule: &str) {
    if let Some(counter) = VALIDATION_FAILURES.get() {
        counter.with_label_values(&[rule]).inc();
    }
}
pub fn inc_persistence_error(op: &str) {
    if let Some(counter) = PERSISTENCE_ERRORS.get() {
        counter.with_label_values(&[op]).inc();
    }
}

pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}
