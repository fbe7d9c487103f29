//! Error handler for the Crowd realm.
//!
//! Directory clients report [`DirectoryError`]. The realm never lets it
//! cross its boundary: every condition is re-expressed as an [`AuthError`]
//! or a [`LookupError`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;
pub type LookupResult<T> = std::result::Result<T, LookupError>;
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Named conditions a directory client may fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("account is inactive: {0}")]
    InactiveAccount(String),
    #[error("credential has expired: {0}")]
    ExpiredCredential(String),
    #[error("invalid authentication: {0}")]
    InvalidAuthentication(String),
    #[error("application permission denied: {0}")]
    ApplicationPermission(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl DirectoryError {
    /// Name of the condition, without the remote message.
    pub fn condition(&self) -> &'static str {
        match self {
            DirectoryError::UserNotFound(_) => "UserNotFound",
            DirectoryError::GroupNotFound(_) => "GroupNotFound",
            DirectoryError::InactiveAccount(_) => "InactiveAccount",
            DirectoryError::ExpiredCredential(_) => "ExpiredCredential",
            DirectoryError::InvalidAuthentication(_) => "InvalidAuthentication",
            DirectoryError::ApplicationPermission(_) => "ApplicationPermission",
            DirectoryError::OperationFailed(_) => "OperationFailed",
        }
    }
}

/// Outcome of a failed authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown user or wrong password. Never says which.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("credentials have expired")]
    CredentialsExpired,
    /// Realm misconfiguration or directory failure, not a user error.
    #[error("authentication service error, {reason}")]
    ServiceError { reason: String },
}

impl AuthError {
    /// Stable label of the outcome, used by logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::CredentialsExpired => "credentials_expired",
            AuthError::ServiceError { .. } => "service_error",
        }
    }

    pub(crate) fn service(reason: impl Into<String>) -> Self {
        AuthError::ServiceError {
            reason: reason.into(),
        }
    }
}

/// Outcome of a failed user or group lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown user: {username}")]
    UnknownUser { username: String },
    #[error("group not found: {group}")]
    GroupNotFound { group: String },
    /// Directory is unreachable or misconfigured.
    #[error("directory lookup failed, {reason}")]
    ServiceLookupFailure { reason: String },
}

impl LookupError {
    /// Stable label of the outcome, used by logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::UnknownUser { .. } => "unknown_user",
            LookupError::GroupNotFound { .. } => "group_not_found",
            LookupError::ServiceLookupFailure { .. } => "service_lookup_failure",
        }
    }

    /// Whether the host may cache this result as a negative identity.
    ///
    /// A service failure says nothing about the identity itself.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, LookupError::ServiceLookupFailure { .. })
    }

    pub(crate) fn service(reason: impl Into<String>) -> Self {
        LookupError::ServiceLookupFailure {
            reason: reason.into(),
        }
    }
}

impl From<LookupError> for AuthError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::UnknownUser { .. } => AuthError::InvalidCredentials,
            LookupError::GroupNotFound { .. } => AuthError::service("GroupNotFound"),
            LookupError::ServiceLookupFailure { reason } => {
                AuthError::ServiceError { reason }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_cacheability() {
        assert!(
            LookupError::UnknownUser {
                username: "ghost".into()
            }
            .is_cacheable()
        );
        assert!(
            LookupError::GroupNotFound {
                group: "nobody".into()
            }
            .is_cacheable()
        );
        assert!(!LookupError::service("OperationFailed").is_cacheable());
    }

    #[test]
    fn test_lookup_into_auth_error() {
        let unknown = LookupError::UnknownUser {
            username: "ghost".into(),
        };
        assert_eq!(AuthError::from(unknown), AuthError::InvalidCredentials);

        let failure = LookupError::service("OperationFailed");
        assert_eq!(
            AuthError::from(failure),
            AuthError::ServiceError {
                reason: "OperationFailed".into()
            }
        );
    }

    #[test]
    fn test_invalid_credentials_hides_factor() {
        let message = AuthError::InvalidCredentials.to_string();
        assert!(!message.contains("not found"));
        assert_eq!(AuthError::InvalidCredentials.kind(), "invalid_credentials");
    }
}
