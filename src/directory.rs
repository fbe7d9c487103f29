//! Connection to the remote directory.
//!
//! The directory client itself is opaque: the realm only needs the three
//! operations of [`DirectoryClient`] and a factory able to build one from
//! [`ClientProperties`].

pub mod memory;

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::config::{ClientProperties, RealmSettings};
use crate::error::DirectoryResult;

/// Group record as returned by the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

/// Blocking client to a Crowd-compatible directory.
///
/// Implementations must be safe to call from several threads at once.
pub trait DirectoryClient: Send + Sync {
    /// Verify a user password.
    fn authenticate(&self, username: &str, password: &str) -> DirectoryResult<()>;

    /// Names of the groups `username` belongs to, starting at `start`, at
    /// most `max_results` entries.
    fn group_names_for_user(
        &self,
        username: &str,
        start: usize,
        max_results: usize,
    ) -> DirectoryResult<Vec<String>>;

    /// Fetch a single group.
    fn group(&self, name: &str) -> DirectoryResult<Group>;
}

/// Builds directory clients.
///
/// Construction does not touch the network, hence cannot fail.
pub trait DirectoryClientFactory: Send + Sync {
    fn create(&self, properties: &ClientProperties) -> Arc<dyn DirectoryClient>;
}

/// Lazily created, shared directory client.
pub struct DirectoryConnection {
    settings: RealmSettings,
    factory: Box<dyn DirectoryClientFactory>,
    client: OnceLock<Arc<dyn DirectoryClient>>,
}

impl DirectoryConnection {
    /// Create a new [`DirectoryConnection`]. No client is built yet.
    pub fn new(
        settings: RealmSettings,
        factory: Box<dyn DirectoryClientFactory>,
    ) -> Self {
        Self {
            settings,
            factory,
            client: OnceLock::new(),
        }
    }

    /// Return the cached client, building it on first call.
    ///
    /// Concurrent first calls block until the single client is built, then
    /// all observe the same instance.
    pub fn get(&self) -> Arc<dyn DirectoryClient> {
        Arc::clone(self.client.get_or_init(|| {
            if !self.settings.is_complete() {
                tracing::warn!(settings = ?self.settings, "incomplete realm settings, directory calls will fail");
            }

            let properties = ClientProperties::from_settings(&self.settings);
            tracing::debug!(
                url = %properties.server_url,
                application = %properties.application_name,
                "creating directory client"
            );
            self.factory.create(&properties)
        }))
    }

    /// Whether the client has been built.
    pub fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    pub fn settings(&self) -> &RealmSettings {
        &self.settings
    }
}

impl std::fmt::Debug for DirectoryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConnection")
            .field("settings", &self.settings)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{MemoryDirectory, MemoryDirectoryFactory};
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn connection() -> (DirectoryConnection, MemoryDirectoryFactory) {
        let factory = MemoryDirectoryFactory::new(MemoryDirectory::new());
        let connection = DirectoryConnection::new(
            RealmSettings::new("https://crowd.example.com", "jenkins", "s3cret"),
            Box::new(factory.clone()),
        );
        (connection, factory)
    }

    #[test]
    fn test_lazy_creation() {
        let (connection, factory) = connection();
        assert!(!connection.is_connected());
        assert_eq!(factory.created(), 0);

        let first = connection.get();
        let second = connection.get();
        assert!(connection.is_connected());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn test_factory_receives_properties() {
        let (connection, factory) = connection();
        connection.get();

        let properties = factory.last_properties().unwrap();
        assert_eq!(properties.server_url, "https://crowd.example.com");
        assert_eq!(properties.application_name, "jenkins");
        assert_eq!(properties.application_password, "s3cret");
        assert_eq!(properties.session_validation_interval, 5);
    }

    #[test]
    fn test_concurrent_creation() {
        const THREADS: usize = 16;

        let (connection, factory) = connection();
        let barrier = Barrier::new(THREADS);

        let clients: Vec<Arc<dyn DirectoryClient>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        connection.get()
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(factory.created(), 1);
        assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    }
}
