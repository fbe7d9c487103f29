//! In-memory directory.
//!
//! Useful for tests and local development, when no Crowd server is
//! reachable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::{DirectoryClient, DirectoryClientFactory, Group};
use crate::config::ClientProperties;
use crate::error::{DirectoryError, DirectoryResult};

#[derive(Clone)]
struct MemoryUser {
    password: String,
    active: bool,
    credential_expired: bool,
}

#[derive(Default)]
struct State {
    users: HashMap<String, MemoryUser>,
    groups: HashMap<String, Group>,
    memberships: HashMap<String, Vec<String>>,
    failure: Option<DirectoryError>,
    lookup_failure: Option<DirectoryError>,
}

/// Directory holding users, groups and memberships in memory.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<RwLock<State>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active user.
    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.write().users.insert(
            username.to_owned(),
            MemoryUser {
                password: password.to_owned(),
                active: true,
                credential_expired: false,
            },
        );
        self
    }

    /// Add an active group.
    pub fn with_group(self, name: &str) -> Self {
        self.write().groups.insert(
            name.to_owned(),
            Group {
                name: name.to_owned(),
                description: None,
                active: true,
            },
        );
        self
    }

    /// Make `username` a member of `group`. Order of calls is kept.
    pub fn with_membership(self, username: &str, group: &str) -> Self {
        self.write()
            .memberships
            .entry(username.to_owned())
            .or_default()
            .push(group.to_owned());
        self
    }

    /// Mark an account as inactive.
    pub fn deactivate(&self, username: &str) {
        if let Some(user) = self.write().users.get_mut(username) {
            user.active = false;
        }
    }

    /// Mark the password of an account as expired.
    pub fn expire_credential(&self, username: &str) {
        if let Some(user) = self.write().users.get_mut(username) {
            user.credential_expired = true;
        }
    }

    /// Make every following call fail with `err`.
    pub fn fail_with(&self, err: DirectoryError) {
        self.write().failure = Some(err);
    }

    /// Make group and membership lookups fail with `err`, while password
    /// checks keep working.
    pub fn fail_lookups_with(&self, err: DirectoryError) {
        self.write().lookup_failure = Some(err);
    }

    /// Undo [`MemoryDirectory::fail_with`] and
    /// [`MemoryDirectory::fail_lookups_with`].
    pub fn recover(&self) {
        let mut state = self.write();
        state.failure = None;
        state.lookup_failure = None;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn check(&self) -> DirectoryResult<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn check_lookup(&self) -> DirectoryResult<()> {
        self.check()?;
        match &self.lookup_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl DirectoryClient for MemoryDirectory {
    fn authenticate(&self, username: &str, password: &str) -> DirectoryResult<()> {
        let state = self.read();
        state.check()?;

        let user = state
            .users
            .get(username)
            .ok_or_else(|| DirectoryError::UserNotFound(username.to_owned()))?;

        if user.password != password {
            return Err(DirectoryError::InvalidAuthentication(format!(
                "failed to authenticate principal {username}, password was invalid"
            )));
        }
        if !user.active {
            return Err(DirectoryError::InactiveAccount(username.to_owned()));
        }
        if user.credential_expired {
            return Err(DirectoryError::ExpiredCredential(username.to_owned()));
        }

        Ok(())
    }

    fn group_names_for_user(
        &self,
        username: &str,
        start: usize,
        max_results: usize,
    ) -> DirectoryResult<Vec<String>> {
        let state = self.read();
        state.check_lookup()?;

        if !state.users.contains_key(username) {
            return Err(DirectoryError::UserNotFound(username.to_owned()));
        }

        Ok(state
            .memberships
            .get(username)
            .map(|groups| {
                groups.iter().skip(start).take(max_results).cloned().collect()
            })
            .unwrap_or_default())
    }

    fn group(&self, name: &str) -> DirectoryResult<Group> {
        let state = self.read();
        state.check_lookup()?;

        state
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::GroupNotFound(name.to_owned()))
    }
}

/// Factory handing out clients over one shared [`MemoryDirectory`].
///
/// Every `create` call returns a fresh handle and is counted.
#[derive(Clone)]
pub struct MemoryDirectoryFactory {
    directory: MemoryDirectory,
    created: Arc<AtomicUsize>,
    last_properties: Arc<Mutex<Option<ClientProperties>>>,
}

impl MemoryDirectoryFactory {
    pub fn new(directory: MemoryDirectory) -> Self {
        Self {
            directory,
            created: Arc::new(AtomicUsize::new(0)),
            last_properties: Arc::new(Mutex::new(None)),
        }
    }

    /// Number of clients built so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Properties received by the latest `create` call.
    pub fn last_properties(&self) -> Option<ClientProperties> {
        self.last_properties
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DirectoryClientFactory for MemoryDirectoryFactory {
    fn create(&self, properties: &ClientProperties) -> Arc<dyn DirectoryClient> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self
            .last_properties
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(properties.clone());

        Arc::new(self.directory.clone())
    }
}
