//! Fire-and-forget analytics. Pixel and tag-manager integrations live behind
//! [`EventSink`] so nothing else names a specific provider.

use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::info;

pub type Props = Map<String, Value>;

pub trait EventSink {
    fn track(&self, event: &str, props: &Props);
}

/// Logs every tracked event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn track(&self, event: &str, props: &Props) {
        let props = Value::Object(props.clone());
        info!(event, props = %props, "track");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn track(&self, _event: &str, _props: &Props) {}
}

/// Keeps tracked events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(String, Props)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Props)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }
}

impl EventSink for MemorySink {
    fn track(&self, event: &str, props: &Props) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.to_string(), props.clone()));
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn track(&self, event: &str, props: &Props) {
        (**self).track(event, props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        let mut props = Props::new();
        props.insert("value".into(), Value::from(1.0));
        sink.track("lead_submitted", &Props::new());
        sink.track("conversion", &props);

        assert_eq!(sink.names(), vec!["lead_submitted", "conversion"]);
        assert_eq!(sink.events()[1].1.get("value"), Some(&Value::from(1.0)));
    }

    #[test]
    fn test_tracing_sink_accepts_props() {
        let mut props = Props::new();
        props.insert("currency".into(), Value::from("BRL"));
        TracingSink.track("conversion", &props);
        std::sync::Arc::new(TracingSink).track("conversion", &Props::new());
    }
}
