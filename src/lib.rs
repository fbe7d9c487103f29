//! Crowd realm is a password-based security realm delegating credential
//! checks and group resolution to a Crowd directory.
//!
//! ```
//! use crowd_realm::config::RealmSettings;
//! use crowd_realm::directory::memory::{MemoryDirectory, MemoryDirectoryFactory};
//! use crowd_realm::{CrowdRealm, SecurityRealm};
//!
//! let directory = MemoryDirectory::new()
//!     .with_user("alice", "wonderland")
//!     .with_membership("alice", "admins");
//! let realm = CrowdRealm::new(
//!     RealmSettings::new("https://crowd.example.com", "jenkins", "s3cret"),
//!     Box::new(MemoryDirectoryFactory::new(directory)),
//! );
//!
//! let identity = realm.authenticate("alice", "wonderland").unwrap();
//! assert!(identity.has_authority("admins"));
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod realm;
pub mod telemetry;

pub use config::RealmSettings;
pub use directory::{DirectoryClient, DirectoryClientFactory, DirectoryConnection, Group};
pub use error::{AuthError, DirectoryError, LookupError};
pub use identity::{Authority, GroupIdentity, Identity};
pub use realm::{CrowdRealm, SecurityRealm};
