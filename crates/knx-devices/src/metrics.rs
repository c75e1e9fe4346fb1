use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct DeviceMetrics {
    pub telegrams_processed: IntCounter,
    pub callback_failures: IntCounter,
    pub devices_loaded: IntGauge,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub dev: DeviceMetrics,
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let telegrams_processed = IntCounter::new(
            "knx_telegrams_processed",
            "Group telegrams routed to at least one device",
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let callback_failures = IntCounter::new(
            "knx_callback_failures",
            "Device update callbacks that returned an error or panicked",
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let devices_loaded = IntGauge::new("knx_devices_loaded", "Number of devices configured")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let dev = DeviceMetrics {
            telegrams_processed,
            callback_failures,
            devices_loaded,
        };
        for collector in [
            Box::new(dev.telegrams_processed.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(dev.callback_failures.clone()),
            Box::new(dev.devices_loaded.clone()),
        ] {
            registry
                .register(collector)
                .map_err(|e| format!("metrics register error: {e}"))?;
        }
        Ok(Self { registry, dev })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposition_names() {
        let hub = MetricsHub::new().unwrap();
        hub.dev.telegrams_processed.inc();
        hub.dev.devices_loaded.set(3);
        let text = hub.encode_text();
        assert!(text.contains("knx_telegrams_processed 1"));
        assert!(text.contains("knx_callback_failures 0"));
        assert!(text.contains("knx_devices_loaded 3"));
    }
}
