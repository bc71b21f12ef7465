//! On-disk layout of downloaded files.
//!
//! Files land at `<output>/<user>/<group>/<artifact>/<version>/<filename>`.
//! Every component is sanitized so that no metadata value can escape the
//! output directory.

use std::path::{Path, PathBuf};

use crate::download::filename::sanitize_filename;
use crate::identifier::DatabusIdentifier;

/// Directory a resolved version is written into.
#[must_use]
pub fn destination_dir(output_dir: &Path, id: &DatabusIdentifier, version: &str) -> PathBuf {
    [id.user(), id.group(), id.artifact(), version]
        .into_iter()
        .fold(output_dir.to_path_buf(), |dir, component| {
            dir.join(sanitize_filename(component))
        })
}
