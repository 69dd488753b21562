use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, IntCounter, TextEncoder, opts, register_histogram, register_int_counter,
};

pub static MESSAGES_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_messages_sent_total",
        "Total number of text messages enqueued by the producer"
    ))
    .expect("Failed to register relay_messages_sent_total metric")
});

pub static MESSAGES_SEND_FAILURE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_messages_send_failure_total",
        "Total number of failed producer sends"
    ))
    .expect("Failed to register relay_messages_send_failure_total metric")
});

pub static MESSAGES_RECEIVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_messages_received_total",
        "Total number of text messages appended by the consumer worker"
    ))
    .expect("Failed to register relay_messages_received_total metric")
});

pub static MESSAGES_MALFORMED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_messages_malformed_total",
        "Total number of received messages that were not text"
    ))
    .expect("Failed to register relay_messages_malformed_total metric")
});

pub static SEND_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "relay_send_latency_seconds",
        "Producer send latency (connect + publish + close) in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register relay_send_latency_seconds metric")
});

pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_exported() {
        MESSAGES_SENT_TOTAL.inc();
        MESSAGES_SEND_FAILURE_TOTAL.inc();
        MESSAGES_RECEIVED_TOTAL.inc();
        MESSAGES_MALFORMED_TOTAL.inc();
        SEND_LATENCY.observe(0.01);

        let exported = gather_metrics().unwrap();
        assert!(exported.contains("relay_messages_sent_total"));
        assert!(exported.contains("relay_send_latency_seconds"));
    }
}
