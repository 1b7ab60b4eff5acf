//! Container files on disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::codec::compression;
use crate::error::Result;

/// Replace `path` with `data` by writing `{path}.tmp`, syncing it and
/// renaming it over the target. A crash leaves the old file untouched.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Path the decompressed payload of `path` is written to
pub fn decompressed_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".decomp");
    PathBuf::from(name)
}

/// Decompress a save container to `<path>.decomp` and return that path
pub fn decompress_file(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let payload = compression::decompress(&fs::read(path)?)?;
    let output = decompressed_path(path);
    atomic_write(&output, &payload)?;
    info!(input = %path.display(), output = %output.display(), bytes = payload.len(), "decompressed save");
    Ok(output)
}

/// Compress a payload file into a save container at `output`
pub fn compress_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let payload = fs::read(input)?;
    let container = compression::compress(&payload)?;
    atomic_write(output, &container)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        payload = payload.len(),
        compressed = container.len(),
        "compressed save"
    );
    Ok(())
}
