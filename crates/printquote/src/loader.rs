//! Hands uploaded bytes to the kernel through a scoped temporary file.

use std::io::Write;

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::error::{QuoteError, Result};
use crate::kernel::CadKernel;

/// Loads shapes from in-memory uploads.
#[derive(Debug, Clone, Copy)]
pub struct ShapeLoader<'k, K> {
    kernel: &'k K,
}

impl<'k, K: CadKernel> ShapeLoader<'k, K> {
    /// Loader over `kernel`.
    pub fn new(kernel: &'k K) -> Self {
        Self { kernel }
    }

    /// Write `bytes` to a `.step` temporary file and parse it.
    ///
    /// The file is removed before returning, on success and failure alike.
    /// A removal failure is logged and does not affect the result.
    pub fn load(&self, bytes: &[u8]) -> Result<K::Shape> {
        let file = write_temp(bytes)?;
        let parsed = self.kernel.read_file(file.path());
        let path = file.path().to_path_buf();
        if let Err(e) = file.close() {
            warn!(path = %path.display(), error = %e, "failed to remove temporary upload");
        }
        parsed.map_err(|e| QuoteError::GeometryParse(e.to_string()))
    }
}

fn write_temp(bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = Builder::new()
        .prefix("printquote-")
        .suffix(".step")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    debug!(path = %file.path().display(), bytes = bytes.len(), "wrote temporary upload");
    Ok(file)
}
