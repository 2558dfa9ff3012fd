//! Anonymous, per-installation identity.
//!
//! The identity is created once, persisted, and never rotated. When the
//! store cannot be used the provider degrades to an identity that lives only
//! as long as the process; callers can tell from [`IdentitySource::Ephemeral`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;
use topicscope_types::Identity;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Identity storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of the identity token
pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Result<Option<Identity>, IdentityError>;

    fn save(&self, identity: &Identity) -> Result<(), IdentityError>;
}

impl<T: IdentityStore + ?Sized> IdentityStore for &T {
    fn load(&self) -> Result<Option<Identity>, IdentityError> {
        (**self).load()
    }

    fn save(&self, identity: &Identity) -> Result<(), IdentityError> {
        (**self).save(identity)
    }
}

/// Stores the identity as a single line in a file
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/topicscope/identity`, falling back to the working directory
    pub fn default_location() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        Self::new(base.join("topicscope").join("identity"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<Identity>, IdentityError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Identity::from(token)))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, identity: &Identity) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, identity.as_str())?;
        Ok(())
    }
}

/// In-process store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    slot: Mutex<Option<Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self {
            slot: Mutex::new(Some(identity)),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<Identity>, IdentityError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| IdentityError::Unavailable("memory store poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, identity: &Identity) -> Result<(), IdentityError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| IdentityError::Unavailable("memory store poisoned".to_string()))?;
        *slot = Some(identity.clone());
        Ok(())
    }
}

/// Where a resolved identity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Read back from the store
    Stored,
    /// Newly minted and persisted
    Created,
    /// Newly minted but not persisted; valid for this process only
    Ephemeral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub source: IdentitySource,
}

impl ResolvedIdentity {
    pub fn is_persistent(&self) -> bool {
        self.source != IdentitySource::Ephemeral
    }
}

pub struct IdentityProvider<S> {
    store: S,
}

impl<S: IdentityStore> IdentityProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Return the stored identity, creating and persisting one on first use.
    ///
    /// Never fails: storage problems yield an ephemeral identity.
    pub fn get_or_create(&self) -> ResolvedIdentity {
        match self.store.load() {
            Ok(Some(identity)) => {
                tracing::debug!("Loaded stored identity");
                return ResolvedIdentity {
                    identity,
                    source: IdentitySource::Stored,
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "Identity storage unreadable, using a process-only identity: {}",
                    e
                );
                return ResolvedIdentity {
                    identity: Identity::generate(),
                    source: IdentitySource::Ephemeral,
                };
            }
        }

        let identity = Identity::generate();
        match self.store.save(&identity) {
            Ok(()) => {
                tracing::info!("Created new anonymous identity");
                ResolvedIdentity {
                    identity,
                    source: IdentitySource::Created,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Could not persist identity, it will not survive this process: {}",
                    e
                );
                ResolvedIdentity {
                    identity,
                    source: IdentitySource::Ephemeral,
                }
            }
        }
    }
}

static GLOBAL_IDENTITY: OnceLock<ResolvedIdentity> = OnceLock::new();

/// Process-wide identity, resolved from `store` on the first call only.
///
/// Later calls return the same value and never touch a store again.
pub fn global_identity(store: &dyn IdentityStore) -> &'static ResolvedIdentity {
    GLOBAL_IDENTITY.get_or_init(|| IdentityProvider::new(store).get_or_create())
}
