//! Trust checks on the solver executable.
//!
//! The engine refuses to start unless a [`TrustPolicy`] accepts the
//! executable. Ownership and permission models differ per platform, so the
//! rule sits behind a trait; [`default_policy`] picks the strictest one the
//! platform supports.

use std::fs::Metadata;
use std::path::Path;

use crate::error::ConfigError;

/// Decides whether an executable may be run by the engine.
pub trait TrustPolicy: Send + Sync {
    fn verify(&self, path: &Path) -> Result<(), ConfigError>;
}

/// Requires only that the path is an existing regular file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegularFilePolicy;

impl TrustPolicy for RegularFilePolicy {
    fn verify(&self, path: &Path) -> Result<(), ConfigError> {
        regular_file(path).map(|_| ())
    }
}

fn regular_file(path: &Path) -> Result<Metadata, ConfigError> {
    let meta = std::fs::metadata(path).map_err(|source| ConfigError::ExecMissing {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        return Err(ConfigError::NotRegularFile {
            path: path.to_path_buf(),
        });
    }
    Ok(meta)
}

#[cfg(unix)]
pub use unix::OwnerPolicy;

#[cfg(unix)]
mod unix {
    use std::os::unix::fs::MetadataExt;
    use std::path::Path;

    use super::{TrustPolicy, regular_file};
    use crate::error::ConfigError;

    /// Most permissive mode accepted: rwxr-xr-x.
    const MAX_MODE: u32 = 0o755;

    /// Permission and special bits (setuid, setgid, sticky included).
    const MODE_MASK: u32 = 0o7777;

    /// Requires a regular file, mode 0755 or stricter, owned by a fixed
    /// uid and gid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OwnerPolicy {
        uid: u32,
        gid: u32,
    }

    impl OwnerPolicy {
        pub fn new(uid: u32, gid: u32) -> Self {
            Self { uid, gid }
        }

        /// Owned by root:root. The production default.
        pub fn root() -> Self {
            Self::new(0, 0)
        }
    }

    impl TrustPolicy for OwnerPolicy {
        fn verify(&self, path: &Path) -> Result<(), ConfigError> {
            let meta = regular_file(path)?;

            let mode = meta.mode() & MODE_MASK;
            if mode & !MAX_MODE != 0 {
                return Err(ConfigError::TooPermissive {
                    path: path.to_path_buf(),
                    mode,
                });
            }

            if meta.uid() != self.uid || meta.gid() != self.gid {
                return Err(ConfigError::WrongOwner {
                    path: path.to_path_buf(),
                    uid: meta.uid(),
                    gid: meta.gid(),
                    want_uid: self.uid,
                    want_gid: self.gid,
                });
            }

            Ok(())
        }
    }
}

/// The policy used when none is supplied.
pub fn default_policy() -> Box<dyn TrustPolicy> {
    #[cfg(unix)]
    {
        Box::new(OwnerPolicy::root())
    }
    #[cfg(not(unix))]
    {
        Box::new(RegularFilePolicy)
    }
}
