//! Host detection and backend selection.

use std::sync::Arc;

use crate::{
    FileStorage, FlatStoreBackend, PlatformPreference, SqliteTaskBackend, StoreConfig, TaskBackend,
};

/// The kind of host the application is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    /// Packaged native mobile container with an embedded SQL engine.
    NativeContainer,
    /// Plain web host with only key-value storage.
    WebHost,
}

impl HostPlatform {
    /// Reads the host capability flag.
    pub fn detect() -> Self {
        Self::from_capability(cfg!(any(target_os = "android", target_os = "ios")))
    }

    /// Maps the "is a packaged native container" flag to a platform.
    pub fn from_capability(is_native_container: bool) -> Self {
        if is_native_container {
            Self::NativeContainer
        } else {
            Self::WebHost
        }
    }

    /// Resolves a configured preference, falling back to detection for
    /// [`PlatformPreference::Auto`].
    pub fn resolve(preference: PlatformPreference) -> Self {
        match preference {
            PlatformPreference::Auto => Self::detect(),
            PlatformPreference::Native => Self::NativeContainer,
            PlatformPreference::Web => Self::WebHost,
        }
    }
}

/// Builds the backend for `platform`. Nothing is opened here; the returned
/// backend is set up by its `initialize`.
pub fn select_backend(platform: HostPlatform, config: &StoreConfig) -> Arc<dyn TaskBackend> {
    match platform {
        HostPlatform::NativeContainer => {
            tracing::info!(
                "Using relational task backend at {}",
                config.database_path().display()
            );
            Arc::new(SqliteTaskBackend::new(config.database_path()))
        }
        HostPlatform::WebHost => {
            tracing::info!(
                "Using flat-store task backend at {}",
                config.storage_path().display()
            );
            let storage = FileStorage::new(config.storage_path());
            Arc::new(FlatStoreBackend::new(storage))
        }
    }
}
