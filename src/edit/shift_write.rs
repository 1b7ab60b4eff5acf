//! In-place patching of a decompressed save file.
//!
//! A region is replaced by re-decoding the file to learn where it sits,
//! then rewriting the new bytes followed by everything that came after the
//! old region. Writes are not transactional.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::offsets::RegionKey;
use crate::save::SaveModel;

/// What a region patch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Byte range of the old region
    pub range: Range<u64>,
    pub new_len: usize,
}

impl PatchOutcome {
    pub fn old_len(&self) -> u64 {
        self.range.end - self.range.start
    }
}

/// Overwrite `start..end` with `new_bytes` and shift the rest of the file
/// after them. The file is never truncated, so a shrinking region leaves
/// stale bytes at the end; use [`replace_region`] for that case.
pub fn patch_region(
    path: &Path,
    start: RegionKey,
    end: RegionKey,
    new_bytes: &[u8],
) -> Result<PatchOutcome> {
    let model = SaveModel::read_file(path)?;
    let range = model.offsets().span(start, end)?;

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    file.seek(SeekFrom::Start(range.end))?;
    let mut remainder = Vec::new();
    file.read_to_end(&mut remainder)?;

    file.seek(SeekFrom::Start(range.start))?;
    file.write_all(new_bytes)?;
    file.write_all(&remainder)?;
    file.flush()?;

    debug!(
        %start,
        %end,
        old_len = range.end - range.start,
        new_len = new_bytes.len(),
        remainder = remainder.len(),
        "patched region"
    );

    Ok(PatchOutcome { range, new_len: new_bytes.len() })
}

/// [`patch_region`], then cut the file down when the region shrank
pub fn replace_region(
    path: &Path,
    start: RegionKey,
    end: RegionKey,
    new_bytes: &[u8],
) -> Result<PatchOutcome> {
    let old_file_len = fs::metadata(path)?.len();
    let outcome = patch_region(path, start, end, new_bytes)?;

    let new_len = new_bytes.len() as u64;
    if new_len < outcome.old_len() {
        let shrink = outcome.old_len() - new_len;
        OpenOptions::new().write(true).open(path)?.set_len(old_file_len - shrink)?;
        debug!(shrink, "truncated after shrinking region");
    }
    Ok(outcome)
}

/// A fixed-width little-endian field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8(u8),
    U16(u16),
    U32(u32),
}

impl Scalar {
    pub fn write_to(self, out: &mut impl Write) -> Result<()> {
        match self {
            Scalar::U8(v) => out.write_u8(v)?,
            Scalar::U16(v) => out.write_u16::<LittleEndian>(v)?,
            Scalar::U32(v) => out.write_u32::<LittleEndian>(v)?,
        }
        Ok(())
    }

    pub fn to_bytes(self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(4);
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// Overwrite `bytes.len()` bytes at `offset` without shifting anything
pub fn write_scalar_at(path: &Path, offset: u64, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    let file_len = file.metadata()?.len();
    if offset + bytes.len() as u64 > file_len {
        return Err(Error::InvalidRecord(format!(
            "scalar write of {} bytes at {} runs past the end of a {} byte file",
            bytes.len(),
            offset,
            file_len
        )));
    }
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

pub fn patch_scalar(path: &Path, offset: u64, value: Scalar) -> Result<()> {
    debug!(offset, ?value, "patching scalar");
    write_scalar_at(path, offset, &value.to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offsets::Region;
    use crate::test_support::sample_file;

    fn tile_keys(x: usize, y: usize) -> (RegionKey, RegionKey) {
        (Region::TileStart { x, y }.current(), Region::TileEnd { x, y }.current())
    }

    #[test]
    fn test_grow_region() {
        let (_dir, path) = sample_file();
        let before = fs::read(&path).unwrap();
        let model = SaveModel::read_file(&path).unwrap();

        let mut tile = model.tiles_current().get(0, 0).unwrap().clone();
        tile.visibility.extend([2, 3]);
        let bytes = tile.to_bytes(model.format_version()).unwrap();

        let (start, end) = tile_keys(0, 0);
        let outcome = replace_region(&path, start, end, &bytes).unwrap();
        assert_eq!(outcome.new_len as u64, outcome.old_len() + 2);

        let after = fs::read(&path).unwrap();
        assert_eq!(after.len(), before.len() + 2);
        let patched = SaveModel::decode(&after).unwrap();
        assert_eq!(patched.tiles_current().get(0, 0).unwrap(), &tile);
        assert_eq!(patched.current.players, model.current.players);
        assert_eq!(patched.initial, model.initial);
    }

    #[test]
    fn test_same_size_region() {
        let (_dir, path) = sample_file();
        let before = fs::read(&path).unwrap();
        let model = SaveModel::read_file(&path).unwrap();

        let mut tile = model.tiles_current().get(3, 0).unwrap().clone();
        tile.terrain = 4;
        tile.altitude = 2;
        let bytes = tile.to_bytes(model.format_version()).unwrap();
        let (start, end) = tile_keys(3, 0);
        let span = model.offsets().span(start, end).unwrap();
        let outcome = replace_region(&path, start, end, &bytes).unwrap();
        assert_eq!(outcome, PatchOutcome { range: span, new_len: bytes.len() });

        let after = fs::read(&path).unwrap();
        assert_eq!(after.len(), before.len());
        let patched = SaveModel::decode(&after).unwrap();
        assert_eq!(patched.tiles_current().get(3, 0).unwrap().terrain, 4);
    }

    #[test]
    fn test_shrink_region_truncates() {
        let (_dir, path) = sample_file();
        let before = fs::read(&path).unwrap();
        let model = SaveModel::read_file(&path).unwrap();

        let mut tile = model.tiles_current().get(1, 1).unwrap().clone();
        tile.improvement = None;
        tile.unit = None;
        let bytes = tile.to_bytes(model.format_version()).unwrap();

        let (start, end) = tile_keys(1, 1);
        let outcome = replace_region(&path, start, end, &bytes).unwrap();
        let shrink = (outcome.old_len() - bytes.len() as u64) as usize;

        let after = fs::read(&path).unwrap();
        assert_eq!(after.len(), before.len() - shrink);
        let patched = SaveModel::decode(&after).unwrap();
        assert!(patched.trailer.is_empty());
        assert_eq!(patched.tiles_current().get(1, 1).unwrap(), &tile);
    }

    #[test]
    fn test_patch_without_truncation_leaves_tail() {
        let (_dir, path) = sample_file();
        let before = fs::read(&path).unwrap();
        let model = SaveModel::read_file(&path).unwrap();

        let mut tile = model.tiles_current().get(1, 1).unwrap().clone();
        tile.improvement = None;
        let bytes = tile.to_bytes(model.format_version()).unwrap();

        let (start, end) = tile_keys(1, 1);
        let outcome = patch_region(&path, start, end, &bytes).unwrap();
        let shrink = (outcome.old_len() - bytes.len() as u64) as usize;

        let after = fs::read(&path).unwrap();
        assert_eq!(after.len(), before.len());
        let patched = SaveModel::decode(&after).unwrap();
        assert_eq!(patched.trailer, before[before.len() - shrink..].to_vec());
    }

    #[test]
    fn test_missing_key_writes_nothing() {
        let (_dir, path) = sample_file();
        let before = fs::read(&path).unwrap();

        let (start, end) = tile_keys(9, 9);
        match replace_region(&path, start, end, &[1, 2, 3]) {
            Err(Error::MissingOffset(key)) => assert_eq!(key, start),
            other => panic!("expected missing offset, got {:?}", other),
        }
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_patch_scalar() {
        let (_dir, path) = sample_file();
        let model = SaveModel::read_file(&path).unwrap();
        let offset = model.offsets().require(Region::PlayerCurrency(2).current()).unwrap();

        patch_scalar(&path, offset, Scalar::U32(999)).unwrap();
        let patched = SaveModel::read_file(&path).unwrap();
        assert_eq!(patched.current.player(2).unwrap().currency, 999);
        assert_eq!(patched.initial.player(2).unwrap().currency, 12);

        assert_eq!(Scalar::U16(0x0102).to_bytes().unwrap(), vec![2, 1]);
        assert_eq!(Scalar::U8(7).to_bytes().unwrap(), vec![7]);
    }

    #[test]
    fn test_scalar_past_end() {
        let (_dir, path) = sample_file();
        let len = fs::metadata(&path).unwrap().len();
        assert!(matches!(
            patch_scalar(&path, len - 1, Scalar::U16(1)),
            Err(Error::InvalidRecord(_))
        ));
    }
}
