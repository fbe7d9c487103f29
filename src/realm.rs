//! Password-based security realm backed by a Crowd directory.

use crate::config::RealmSettings;
use crate::directory::{DirectoryClientFactory, DirectoryConnection};
use crate::error::{AuthError, DirectoryError, LookupError, LookupResult, Result};
use crate::identity::{GroupIdentity, Identity};
use crate::telemetry;

/// Label shown by the host when listing available realms.
pub const DISPLAY_NAME: &str =
    "Crowd Security Realm uses Crowd as the user database";

/// Upper bound on group memberships fetched per user.
///
/// Memberships past this bound are silently dropped.
pub const MAX_GROUP_MEMBERSHIPS: usize = 1000;

/// Contract a host security framework consumes.
pub trait SecurityRealm: Send + Sync {
    /// Verify a password then resolve the full identity.
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity>;

    /// Resolve an identity without checking any credential.
    fn resolve_identity(&self, username: &str) -> LookupResult<Identity>;

    fn resolve_group(&self, name: &str) -> LookupResult<GroupIdentity>;

    /// Whether users may create their own account.
    fn allows_signup(&self) -> bool;

    fn display_name(&self) -> &'static str;
}

/// Realm delegating every check to a Crowd directory.
#[derive(Debug)]
pub struct CrowdRealm {
    connection: DirectoryConnection,
}

impl CrowdRealm {
    /// Create a new [`CrowdRealm`].
    ///
    /// No connection is made until the first call.
    pub fn new(
        settings: RealmSettings,
        factory: Box<dyn DirectoryClientFactory>,
    ) -> Self {
        Self {
            connection: DirectoryConnection::new(settings, factory),
        }
    }

    pub fn settings(&self) -> &RealmSettings {
        self.connection.settings()
    }

    pub fn connection(&self) -> &DirectoryConnection {
        &self.connection
    }

    fn check_credentials(&self, username: &str, password: &str) -> Result<()> {
        self.connection
            .get()
            .authenticate(username, password)
            .map_err(|err| match err {
                DirectoryError::UserNotFound(_) => {
                    tracing::info!(%username, "login failed due to unknown username");
                    AuthError::InvalidCredentials
                },
                DirectoryError::InvalidAuthentication(_) => {
                    tracing::info!(%username, "login failed due to invalid password");
                    AuthError::InvalidCredentials
                },
                DirectoryError::InactiveAccount(_) => {
                    tracing::info!(%username, "login failed due to blocked account");
                    AuthError::AccountDisabled
                },
                DirectoryError::ExpiredCredential(_) => {
                    tracing::info!(%username, "login failed due to expired credentials");
                    AuthError::CredentialsExpired
                },
                DirectoryError::ApplicationPermission(ref details) => {
                    tracing::error!(%username, %details, "application permission error");
                    AuthError::service(err.condition())
                },
                DirectoryError::OperationFailed(ref details)
                | DirectoryError::GroupNotFound(ref details) => {
                    tracing::error!(%username, %details, "application operation failed");
                    AuthError::service(err.condition())
                },
            })
    }

    fn lookup_identity(&self, username: &str) -> LookupResult<Identity> {
        self.connection
            .get()
            .group_names_for_user(username, 0, MAX_GROUP_MEMBERSHIPS)
            .map(|group_names| Identity::new(username, group_names))
            .map_err(|err| match err {
                DirectoryError::UserNotFound(_) => LookupError::UnknownUser {
                    username: username.to_owned(),
                },
                other => LookupError::service(other.condition()),
            })
    }
}

impl SecurityRealm for CrowdRealm {
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        let outcome = self
            .check_credentials(username, password)
            .and_then(|()| {
                self.lookup_identity(username).map_err(|err| {
                    let err = AuthError::from(err);
                    match &err {
                        AuthError::InvalidCredentials => tracing::info!(
                            %username,
                            "login failed due to unknown username"
                        ),
                        _ => tracing::error!(
                            %username,
                            error = %err,
                            "cannot load user after login"
                        ),
                    }
                    err
                })
            });

        match &outcome {
            Ok(_) => {
                tracing::info!(%username, "user successfully logged in");
                telemetry::record_authentication("success");
            },
            Err(err) => telemetry::record_authentication(err.kind()),
        }

        outcome
    }

    fn resolve_identity(&self, username: &str) -> LookupResult<Identity> {
        let outcome = self.lookup_identity(username);

        if let Err(err @ LookupError::ServiceLookupFailure { .. }) = &outcome {
            tracing::warn!(%username, error = %err, "user lookup failed");
        }
        telemetry::record_lookup(
            "user",
            outcome.as_ref().map_or_else(LookupError::kind, |_| "found"),
        );

        outcome
    }

    fn resolve_group(&self, name: &str) -> LookupResult<GroupIdentity> {
        let outcome = self
            .connection
            .get()
            .group(name)
            .map(GroupIdentity::from)
            .map_err(|err| match err {
                DirectoryError::GroupNotFound(_) => LookupError::GroupNotFound {
                    group: name.to_owned(),
                },
                other => LookupError::service(other.condition()),
            });

        if let Err(err @ LookupError::ServiceLookupFailure { .. }) = &outcome {
            tracing::warn!(group = %name, error = %err, "group lookup failed");
        }
        telemetry::record_lookup(
            "group",
            outcome.as_ref().map_or_else(LookupError::kind, |_| "found"),
        );

        outcome
    }

    fn allows_signup(&self) -> bool {
        false
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }
}
