use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};

use super::{BackendError, ImagingBackend, ImagingSession};

/// Scoped ownership of an open imaging session.
///
/// The session is closed exactly once: either explicitly through
/// [`SessionGuard::close`], which reports close errors, or on drop, which
/// logs them.
pub struct SessionGuard {
    session: Box<dyn ImagingSession>,
    path: PathBuf,
    closed: bool,
}

impl SessionGuard {
    /// Open a session through `backend`
    pub fn open(
        backend: &dyn ImagingBackend,
        path: &Path,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        info!("Opening session {} (timeout {:?})", path.display(), timeout);
        let session = backend.open(path, timeout)?;
        Ok(Self {
            session,
            path: path.to_path_buf(),
            closed: false,
        })
    }

    /// Path the session was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the session and report any error
    pub fn close(mut self) -> Result<(), BackendError> {
        self.closed = true;
        debug!("Closing session {}", self.path.display());
        self.session.close()
    }
}

impl Deref for SessionGuard {
    type Target = dyn ImagingSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        debug!("Closing session {} on drop", self.path.display());
        if let Err(e) = self.session.close() {
            warn!("Failed to close session {}: {}", self.path.display(), e);
        }
    }
}
