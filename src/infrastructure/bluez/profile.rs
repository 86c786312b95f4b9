//! `org.bluez.Profile1` object exported at the registered path.
//!
//! BlueZ calls back into this object for as long as the registration is
//! alive. The HID channels themselves are not driven from here: incoming
//! sockets are logged and closed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use zbus::interface;
use zbus::zvariant::{OwnedFd, OwnedObjectPath, OwnedValue};

/// Callback counters shared between the exported object and its owner
#[derive(Debug, Default)]
pub struct ProfileStats {
    connections: AtomicUsize,
    disconnections: AtomicUsize,
    released: AtomicBool,
}

impl ProfileStats {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn disconnections(&self) -> usize {
        self.disconnections.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_released(&self) {
        self.released.store(true, Ordering::Relaxed);
    }
}

pub struct HidProfile {
    stats: Arc<ProfileStats>,
}

impl HidProfile {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(ProfileStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<ProfileStats> {
        Arc::clone(&self.stats)
    }

    fn on_new_connection(&self, device: &str, mut property_keys: Vec<&str>) {
        property_keys.sort_unstable();
        let count = self.stats.connections.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "NewConnection #{} from {} (properties: {:?})",
            count, device, property_keys
        );
    }

    fn on_request_disconnection(&self, device: &str) {
        self.stats.disconnections.fetch_add(1, Ordering::Relaxed);
        info!("RequestDisconnection from {}", device);
    }

    fn on_release(&self) {
        self.stats.mark_released();
        warn!("Profile released by BlueZ");
    }
}

impl Default for HidProfile {
    fn default() -> Self {
        Self::new()
    }
}

#[interface(name = "org.bluez.Profile1")]
impl HidProfile {
    async fn release(&self) {
        self.on_release();
    }

    async fn new_connection(
        &self,
        device: OwnedObjectPath,
        fd: OwnedFd,
        fd_properties: HashMap<String, OwnedValue>,
    ) {
        self.on_new_connection(
            device.as_str(),
            fd_properties.keys().map(String::as_str).collect(),
        );
        // Closes the socket
        drop(fd);
    }

    async fn request_disconnection(&self, device: OwnedObjectPath) {
        self.on_request_disconnection(device.as_str());
    }
}
