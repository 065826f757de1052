//! Certificate file cache.
//!
//! CA bundles and client certificates are read once per path for the lifetime
//! of the cache. Concurrent dispatches needing the same file share one read.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::single_flight::SingleFlight;

/// Where certificate files are read from.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads certificates from the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCertificateSource;

#[async_trait]
impl CertificateSource for FsCertificateSource {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Memoized certificate bytes keyed by path.
pub struct CertificateCache {
    source: Arc<dyn CertificateSource>,
    entries: SingleFlight<PathBuf, Bytes, Arc<io::Error>>,
}

impl CertificateCache {
    pub fn new(source: Arc<dyn CertificateSource>) -> Self {
        Self {
            source,
            entries: SingleFlight::new("certificate"),
        }
    }

    /// Returns the contents of `path`, reading it at most once while successful.
    ///
    /// # Errors
    ///
    /// The read error is shared by every caller waiting on that read. It is not
    /// cached; the next call reads the file again.
    pub async fn get(&self, path: &Path) -> Result<Bytes, Arc<io::Error>> {
        let source = Arc::clone(&self.source);
        let owned = path.to_path_buf();
        self.entries
            .get_or_load(path.to_path_buf(), move || async move {
                source.read(&owned).await.map(Bytes::from).map_err(Arc::new)
            })
            .await
    }

    /// Returns true if `path` has been read successfully.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.entries.is_ready(&path.to_path_buf())
    }
}

impl Default for CertificateCache {
    fn default() -> Self {
        Self::new(Arc::new(FsCertificateSource))
    }
}

impl std::fmt::Debug for CertificateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateCache")
            .field("entries", &self.entries)
            .finish()
    }
}
