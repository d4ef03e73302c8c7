// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::StoreErrorCode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub request_count: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub latency_ms_total: u128,
    pub requests_by_operation: BTreeMap<String, u64>,
    pub failures_by_class: BTreeMap<String, u64>,
}

/// Hook invoked once per remote request.
pub trait StoreInstrumentation: Send + Sync + 'static {
    fn observe_request(
        &self,
        _operation: &str,
        _bytes_sent: usize,
        _bytes_received: usize,
        _latency: Duration,
    ) {
    }
    fn observe_error(&self, _operation: &str, _code: StoreErrorCode) {}
}

#[derive(Default)]
pub struct NoopInstrumentation;

impl StoreInstrumentation for NoopInstrumentation {}

#[derive(Default)]
pub struct StoreMetricsCollector {
    inner: Mutex<StoreMetrics>,
}

impl StoreMetricsCollector {
    #[must_use]
    pub fn snapshot(&self) -> StoreMetrics {
        self.inner.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl StoreInstrumentation for StoreMetricsCollector {
    fn observe_request(
        &self,
        operation: &str,
        bytes_sent: usize,
        bytes_received: usize,
        latency: Duration,
    ) {
        if let Ok(mut m) = self.inner.lock() {
            m.request_count = m.request_count.saturating_add(1);
            m.bytes_sent = m.bytes_sent.saturating_add(bytes_sent as u64);
            m.bytes_received = m.bytes_received.saturating_add(bytes_received as u64);
            m.latency_ms_total = m.latency_ms_total.saturating_add(latency.as_millis());
            *m.requests_by_operation
                .entry(operation.to_string())
                .or_insert(0) += 1;
        }
    }

    fn observe_error(&self, _operation: &str, code: StoreErrorCode) {
        if let Ok(mut m) = self.inner.lock() {
            *m.failures_by_class
                .entry(code.as_str().to_string())
                .or_insert(0) += 1;
        }
    }
}
