// 設定管理の具象実装

use crate::core::RelayConfig;
use std::time::Duration;

/// デフォルト設定実装
#[derive(Debug, Clone)]
pub struct DefaultRelayConfig {
    producer_count: usize,
    consumer_count: usize,
    record_max_bytes: usize,
    queue_capacity: Option<usize>,
    records_per_producer: Option<usize>,
    source_retry_delay: Duration,
    drain_on_shutdown: bool,
    enable_progress: bool,
}

impl DefaultRelayConfig {
    /// CPU数からプール規模を導出して作成
    pub fn new(cpu_count: usize) -> Self {
        Self {
            producer_count: cpu_count.max(1),
            consumer_count: cpu_count.max(1) * 2,
            record_max_bytes: 20,
            queue_capacity: None,
            records_per_producer: None,
            source_retry_delay: Duration::from_millis(50),
            drain_on_shutdown: true,
            enable_progress: true,
        }
    }

    pub fn with_producers(mut self, producer_count: usize) -> Self {
        self.producer_count = producer_count;
        self
    }

    pub fn with_consumers(mut self, consumer_count: usize) -> Self {
        self.consumer_count = consumer_count;
        self
    }

    pub fn with_record_max_bytes(mut self, record_max_bytes: usize) -> Self {
        self.record_max_bytes = record_max_bytes;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn with_records_per_producer(mut self, records: usize) -> Self {
        self.records_per_producer = Some(records);
        self
    }

    pub fn with_source_retry_delay(mut self, delay: Duration) -> Self {
        self.source_retry_delay = delay;
        self
    }

    pub fn with_drain_on_shutdown(mut self, drain: bool) -> Self {
        self.drain_on_shutdown = drain;
        self
    }

    pub fn with_progress_reporting(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }
}

impl Default for DefaultRelayConfig {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl RelayConfig for DefaultRelayConfig {
    fn producer_count(&self) -> usize {
        self.producer_count
    }

    fn consumer_count(&self) -> usize {
        self.consumer_count
    }

    fn record_max_bytes(&self) -> usize {
        self.record_max_bytes
    }

    fn queue_capacity(&self) -> Option<usize> {
        self.queue_capacity
    }

    fn records_per_producer(&self) -> Option<usize> {
        self.records_per_producer
    }

    fn source_retry_delay(&self) -> Duration {
        self.source_retry_delay
    }

    fn drain_on_shutdown(&self) -> bool {
        self.drain_on_shutdown
    }

    fn enable_progress_reporting(&self) -> bool {
        self.enable_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_relay_config() {
        let config = DefaultRelayConfig::default();

        assert!(config.producer_count() > 0);
        assert_eq!(config.consumer_count(), config.producer_count() * 2);
        assert_eq!(config.record_max_bytes(), 20);
        assert_eq!(config.queue_capacity(), None);
        assert_eq!(config.records_per_producer(), None);
        assert!(config.drain_on_shutdown());
        assert!(config.enable_progress_reporting());
    }

    #[test]
    fn test_relay_config_builder() {
        let config = DefaultRelayConfig::new(4)
            .with_producers(10)
            .with_consumers(20)
            .with_record_max_bytes(64)
            .with_queue_capacity(128)
            .with_records_per_producer(1000)
            .with_source_retry_delay(Duration::from_millis(5))
            .with_drain_on_shutdown(false)
            .with_progress_reporting(false);

        assert_eq!(config.producer_count(), 10);
        assert_eq!(config.consumer_count(), 20);
        assert_eq!(config.record_max_bytes(), 64);
        assert_eq!(config.queue_capacity(), Some(128));
        assert_eq!(config.records_per_producer(), Some(1000));
        assert_eq!(config.source_retry_delay(), Duration::from_millis(5));
        assert!(!config.drain_on_shutdown());
        assert!(!config.enable_progress_reporting());
    }

    #[test]
    fn test_cpu_derived_pool_sizes() {
        let config = DefaultRelayConfig::new(0);

        // CPU数0でも最低1タスクは確保される
        assert_eq!(config.producer_count(), 1);
        assert_eq!(config.consumer_count(), 2);
    }
}
