use std::collections::HashMap;
use std::sync::Mutex;

use bravo_common::GeoLocation;
use tracing::{debug, warn};

/// Stored in place of an address the visitor's browser could not report.
pub const UNKNOWN_IP: &str = "IP não disponível";

pub trait GeoLocator {
    fn locate(&self, ip: &str) -> Option<GeoLocation>;
}

impl<L: GeoLocator + ?Sized> GeoLocator for Box<L> {
    fn locate(&self, ip: &str) -> Option<GeoLocation> {
        (**self).locate(ip)
    }
}

/// Trims and keeps only digits and dots. `None` for the sentinel or when
/// nothing is left.
pub fn clean_ip(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == UNKNOWN_IP {
        return None;
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Remembers successful lookups per cleaned IP. Misses are retried.
pub struct CachedLocator<L> {
    inner: L,
    cache: Mutex<HashMap<String, GeoLocation>>,
}

impl<L: GeoLocator> CachedLocator<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl<L: GeoLocator> GeoLocator for CachedLocator<L> {
    fn locate(&self, ip: &str) -> Option<GeoLocation> {
        let ip = clean_ip(ip)?;

        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&ip) {
                return Some(hit.clone());
            }
        }

        let Some(location) = self.inner.locate(&ip) else {
            debug!(ip = %ip, "no location for ip");
            return None;
        };
        match self.cache.lock() {
            Ok(mut cache) => {
                cache.insert(ip, location.clone());
            }
            Err(_) => warn!("geolocation cache poisoned, skipping insert"),
        }
        Some(location)
    }
}

/// Lookup table, for tests and offline runs.
#[derive(Debug, Default, Clone)]
pub struct StaticLocator {
    table: HashMap<String, GeoLocation>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ip: &str, location: GeoLocation) -> Self {
        self.table.insert(ip.to_string(), location);
        self
    }
}

impl GeoLocator for StaticLocator {
    fn locate(&self, ip: &str) -> Option<GeoLocation> {
        self.table.get(ip).cloned()
    }
}
