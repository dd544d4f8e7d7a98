//! Reconstructs the current byte contents of a regular file, symlink
//! target, or device number by applying every inode revision of an object
//! in ascending version order.

use crate::compress::decompress;
use crate::error::Result;
use crate::image::Image;
use crate::reconcile::find_latest_inode;

/// Materializes the full, current content of `ino` by walking every
/// revision from version 1 forward and decompressing each one's payload
/// into the right offset of a buffer that is kept zero-filled up to the
/// revision's declared `isize`. The final revision's `isize` is
/// authoritative for the result length, even if it is smaller than a
/// previous revision's (spec §4.5).
pub fn materialize(img: Image<'_>, ino: u32) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    let mut vcur = 0u32;

    while let Some(revision) = find_latest_inode(img, ino, vcur)? {
        let isize_ = revision.isize_()? as usize;
        let offset = revision.offset()? as usize;
        let dsize = revision.dsize()? as usize;

        if buf.len() < isize_ {
            buf.resize(isize_, 0);
        }
        let end = offset + dsize;
        if buf.len() < end {
            buf.resize(end, 0);
        }
        decompress(revision.compr()?, revision.payload()?, &mut buf[offset..end], ino)?;
        buf.truncate(isize_);

        vcur = revision.version()?;
    }

    Ok(buf)
}
