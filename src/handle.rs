//! Transient, revocable handles to in-memory image bytes.
//!
//! A browser host would mint an object URL for a blob and revoke it later;
//! [`HandleRegistry`] plays that role for any host. Each [`ObjectHandle`]
//! registers its bytes on creation and revokes the registration when
//! dropped, so ownership of the handle is ownership of the resource. The
//! controller ties preview handles to the artifact they show and delivery
//! handles to a single `download()` call.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Scheme prefix of every handle URL.
pub const HANDLE_URL_PREFIX: &str = "heic-convert://object/";

struct Entry {
    mime: &'static str,
    bytes: Arc<[u8]>,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, Entry>>,
}

impl Inner {
    fn live(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Shared table of live handles. Cloning shares the table.
#[derive(Clone, Default)]
pub struct HandleRegistry {
    inner: Arc<Inner>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return the owning handle.
    pub fn create(&self, bytes: Arc<[u8]>, mime: &'static str) -> ObjectHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("{HANDLE_URL_PREFIX}{id}");
        self.inner.live().insert(
            id,
            Entry {
                mime,
                bytes: Arc::clone(&bytes),
            },
        );
        debug!("Created handle {} ({} bytes, {})", url, bytes.len(), mime);
        ObjectHandle {
            id,
            url,
            mime,
            bytes,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Bytes and mime type behind a live handle URL.
    pub fn resolve(&self, url: &str) -> Option<(Arc<[u8]>, &'static str)> {
        let id: u64 = url.strip_prefix(HANDLE_URL_PREFIX)?.parse().ok()?;
        self.inner
            .live()
            .get(&id)
            .map(|e| (Arc::clone(&e.bytes), e.mime))
    }

    /// Number of handles not yet revoked.
    pub fn live_count(&self) -> usize {
        self.inner.live().len()
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

/// A live registration; revoked on drop.
pub struct ObjectHandle {
    id: u64,
    url: String,
    mime: &'static str,
    bytes: Arc<[u8]>,
    registry: Arc<Inner>,
}

impl ObjectHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:` URI for hosts that embed the image inline.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Serializable reference for the render surface.
    pub fn to_ref(&self) -> PreviewRef {
        PreviewRef {
            url: self.url.clone(),
            mime: self.mime.to_string(),
        }
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        if self.registry.live().remove(&self.id).is_some() {
            debug!("Revoked handle {}", self.url);
        }
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("url", &self.url)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// What the host needs to display a handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRef {
    pub url: String,
    pub mime: String,
}
