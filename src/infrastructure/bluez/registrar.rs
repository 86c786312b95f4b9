//! Profile Registrar
//!
//! Reads the service record, registers it with the BlueZ profile manager and
//! keeps the registration alive until shutdown.

use crate::domain::profile::{
    RegistrationOptions, ServiceRecord, HID_PROFILE_UUID, PROFILE_PATH,
};
use crate::error::{describe_remote, RegistrarError};
use crate::infrastructure::bluez::profile::{HidProfile, ProfileStats};
use crate::infrastructure::bluez::proxy::{Adapter1Proxy, ProfileManager1Proxy};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};
use zbus::proxy::CacheProperties;
use zbus::zvariant::ObjectPath;
use zbus::Connection;

/// The remote side of `org.bluez.ProfileManager1`
#[allow(async_fn_in_trait)]
pub trait ProfileManager {
    async fn register_profile(
        &self,
        path: &ObjectPath<'_>,
        uuid: &str,
        options: &RegistrationOptions,
    ) -> Result<(), RegistrarError>;

    async fn unregister_profile(&self, path: &ObjectPath<'_>) -> Result<(), RegistrarError>;
}

impl ProfileManager for ProfileManager1Proxy<'_> {
    async fn register_profile(
        &self,
        path: &ObjectPath<'_>,
        uuid: &str,
        options: &RegistrationOptions,
    ) -> Result<(), RegistrarError> {
        let dict = options.to_dict();
        let dict = dict.iter().map(|(key, value)| (*key, value)).collect();
        ProfileManager1Proxy::register_profile(self, path, uuid, dict)
            .await
            .map_err(|e| {
                let (name, message) = describe_remote(&e);
                RegistrarError::Registration { name, message }
            })
    }

    async fn unregister_profile(&self, path: &ObjectPath<'_>) -> Result<(), RegistrarError> {
        ProfileManager1Proxy::unregister_profile(self, path)
            .await
            .map_err(|e| {
                let (name, message) = describe_remote(&e);
                RegistrarError::Unregistration { name, message }
            })
    }
}

/// Read the whole record until end of stream
pub async fn read_service_record<R>(mut reader: R) -> Result<ServiceRecord, RegistrarError>
where
    R: AsyncRead + Unpin,
{
    let mut xml = String::new();
    reader
        .read_to_string(&mut xml)
        .await
        .map_err(RegistrarError::StdinRead)?;
    debug!("Read service record ({} bytes)", xml.len());
    Ok(ServiceRecord::new(xml))
}

/// Connect to the system bus, or to `address` when one is configured
pub async fn connect_system_bus(address: Option<&str>) -> Result<Connection, RegistrarError> {
    match address {
        Some(address) => connect_bus(address).await,
        None => Connection::system().await.map_err(RegistrarError::BusConnect),
    }
}

/// Connect to the bus at a D-Bus address such as `unix:path=/run/dbus/system_bus_socket`
pub async fn connect_bus(address: &str) -> Result<Connection, RegistrarError> {
    zbus::connection::Builder::address(address)
        .map_err(RegistrarError::BusConnect)?
        .build()
        .await
        .map_err(RegistrarError::BusConnect)
}

/// Export the `Profile1` object at the profile path.
///
/// Must happen before `RegisterProfile` so early callbacks find the object.
pub async fn export_profile(connection: &Connection) -> Result<Arc<ProfileStats>, RegistrarError> {
    let profile = HidProfile::new();
    let stats = profile.stats();
    let added = connection
        .object_server()
        .at(PROFILE_PATH, profile)
        .await
        .map_err(|source| RegistrarError::Export {
            path: PROFILE_PATH.to_string(),
            source,
        })?;
    if !added {
        warn!("Profile object already exported at {}", PROFILE_PATH);
    }
    Ok(stats)
}

/// Proxy for BlueZ's profile manager on `connection`
pub async fn profile_manager(
    connection: &Connection,
) -> Result<ProfileManager1Proxy<'_>, RegistrarError> {
    ProfileManager1Proxy::builder(connection)
        .cache_properties(CacheProperties::No)
        .build()
        .await
        .map_err(RegistrarError::BusConnect)
}

/// Make `adapter` (e.g. `hci0`) discoverable without timeout and pairable,
/// so hosts can find the record.
pub async fn make_discoverable(connection: &Connection, adapter: &str) -> Result<(), RegistrarError> {
    let adapter_error = |source: zbus::Error| RegistrarError::Adapter {
        adapter: adapter.to_string(),
        source,
    };

    let proxy = Adapter1Proxy::builder(connection)
        .path(format!("/org/bluez/{}", adapter))
        .map_err(adapter_error)?
        .cache_properties(CacheProperties::No)
        .build()
        .await
        .map_err(adapter_error)?;

    proxy
        .set_discoverable_timeout(0)
        .await
        .map_err(adapter_error)?;
    proxy.set_pairable(true).await.map_err(adapter_error)?;
    proxy.set_discoverable(true).await.map_err(adapter_error)?;

    info!("Adapter {} is discoverable and pairable", adapter);
    Ok(())
}

/// Registers the HID profile at the fixed path with a [`ProfileManager`]
pub struct ProfileRegistrar<M> {
    manager: M,
    path: ObjectPath<'static>,
    stats: Option<Arc<ProfileStats>>,
}

impl<M: ProfileManager> ProfileRegistrar<M> {
    pub fn new(manager: M) -> Self {
        Self {
            manager,
            path: ObjectPath::from_static_str_unchecked(PROFILE_PATH),
            stats: None,
        }
    }

    /// Track callbacks of the exported profile; a released profile is not
    /// unregistered on shutdown.
    pub fn with_stats(mut self, stats: Arc<ProfileStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Issue exactly one `RegisterProfile` call. Failures are not retried.
    pub async fn register(&self, record: ServiceRecord) -> Result<(), RegistrarError> {
        let options = RegistrationOptions::hid_server(record);
        info!(
            "Registering profile {} (uuid {}, record {} bytes)",
            self.path,
            HID_PROFILE_UUID,
            options.service_record.byte_len()
        );
        self.manager
            .register_profile(&self.path, HID_PROFILE_UUID, &options)
            .await?;
        info!("Profile registered");
        Ok(())
    }

    pub async fn unregister(&self) -> Result<(), RegistrarError> {
        self.manager.unregister_profile(&self.path).await?;
        info!("Profile {} unregistered", self.path);
        Ok(())
    }

    /// Register, then hold the registration until `shutdown` resolves.
    ///
    /// With a shutdown future that never resolves this never returns. Once
    /// `shutdown` resolves the result is `Ok`: a failed `UnregisterProfile`
    /// is only logged, the daemon drops the profile with the connection.
    pub async fn run_until<F>(
        &self,
        record: ServiceRecord,
        shutdown: F,
        unregister_on_shutdown: bool,
    ) -> Result<(), RegistrarError>
    where
        F: Future<Output = ()>,
    {
        self.register(record).await?;

        info!("Holding registration; waiting for shutdown signal");
        shutdown.await;
        info!("Shutdown requested");

        if !unregister_on_shutdown {
            return Ok(());
        }
        if self.stats.as_ref().is_some_and(|stats| stats.is_released()) {
            info!("Profile already released by BlueZ, not unregistering");
            return Ok(());
        }
        if let Err(e) = self.unregister().await {
            warn!("{}", e);
        }
        Ok(())
    }
}

/// How a registration session starts and ends
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub unregister_on_shutdown: bool,
    /// Adapter made discoverable before registering, if any
    pub discoverable_adapter: Option<String>,
}

/// Full registration session against BlueZ on `connection`
pub async fn run<F>(
    connection: &Connection,
    record: ServiceRecord,
    shutdown: F,
    options: &SessionOptions,
) -> Result<Arc<ProfileStats>, RegistrarError>
where
    F: Future<Output = ()>,
{
    if let Some(adapter) = options.discoverable_adapter.as_deref() {
        make_discoverable(connection, adapter).await?;
    }

    let stats = export_profile(connection).await?;
    let proxy = profile_manager(connection).await?;

    ProfileRegistrar::new(proxy)
        .with_stats(Arc::clone(&stats))
        .run_until(record, shutdown, options.unregister_on_shutdown)
        .await?;

    info!(
        "Session ended after {} connection(s), {} disconnection request(s), released: {}",
        stats.connections(),
        stats.disconnections(),
        stats.is_released()
    );
    Ok(stats)
}
