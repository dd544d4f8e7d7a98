//! The four payload transforms a JFFS2 inode revision's `compr` tag selects.

use crate::error::{Error, Result};
use crate::node::{COMPR_NONE, COMPR_RTIME, COMPR_ZERO, COMPR_ZLIB};

/// Decompresses `src` (exactly `csize` bytes, already the node's `payload()`
/// slice) into `dst`, which must be exactly `dsize` bytes long. `ino` is
/// only used to annotate errors.
pub fn decompress(compr: u8, src: &[u8], dst: &mut [u8], ino: u32) -> Result<()> {
    match compr {
        COMPR_NONE => decompress_none(src, dst, ino),
        COMPR_ZERO => {
            dst.fill(0);
            Ok(())
        }
        COMPR_RTIME => decompress_rtime(src, dst),
        COMPR_ZLIB => decompress_zlib(src, dst, ino),
        other => Err(Error::UnknownCompression(other)),
    }
}

fn decompress_none(src: &[u8], dst: &mut [u8], ino: u32) -> Result<()> {
    if src.len() < dst.len() {
        return Err(Error::DecompressionFailed {
            ino,
            reason: "short payload for compr=none",
        });
    }
    dst.copy_from_slice(&src[..dst.len()]);
    Ok(())
}

/// Dictionary-style back-reference scheme with a 256-entry per-byte-value
/// position table (see spec §4.3). Writes exactly `dst.len()` bytes;
/// `src.len()` (`csize`) is advisory and not checked against consumption.
fn decompress_rtime(src: &[u8], dst: &mut [u8]) -> Result<()> {
    let mut positions = [0usize; 256];
    let mut outpos = 0usize;
    let mut pos = 0usize;
    let destlen = dst.len();

    while outpos < destlen {
        let value = *src.get(pos).ok_or(Error::DecompressionFailed {
            ino: 0,
            reason: "rtime: source exhausted reading literal byte",
        })?;
        pos += 1;
        dst[outpos] = value;
        outpos += 1;

        let repeat = *src.get(pos).ok_or(Error::DecompressionFailed {
            ino: 0,
            reason: "rtime: source exhausted reading repeat count",
        })? as usize;
        pos += 1;

        let backoffs = positions[value as usize];
        positions[value as usize] = outpos;

        if repeat == 0 {
            continue;
        }
        if backoffs + repeat >= outpos {
            // Overlapping copy: source and destination windows intersect,
            // so each byte must be copied one at a time as it is produced.
            let mut from = backoffs;
            for _ in 0..repeat {
                if outpos >= destlen {
                    break;
                }
                dst[outpos] = dst[from];
                from += 1;
                outpos += 1;
            }
        } else {
            let end = (outpos + repeat).min(destlen);
            let n = end - outpos;
            dst.copy_within(backoffs..backoffs + n, outpos);
            outpos += n;
        }
    }
    Ok(())
}

fn decompress_zlib(src: &[u8], dst: &mut [u8], ino: u32) -> Result<()> {
    use miniz_oxide::inflate::core::inflate_flags::TINFL_FLAG_PARSE_ZLIB_HEADER;
    use miniz_oxide::inflate::core::{decompress, DecompressorOxide};
    use miniz_oxide::inflate::TINFLStatus;

    let mut state = DecompressorOxide::new();
    let (status, _consumed, produced) =
        decompress(&mut state, src, dst, 0, TINFL_FLAG_PARSE_ZLIB_HEADER);
    match status {
        TINFLStatus::Done if produced == dst.len() => Ok(()),
        TINFLStatus::Done => Err(Error::DecompressionFailed {
            ino,
            reason: "zlib: inflate finished short of dsize",
        }),
        _ => Err(Error::DecompressionFailed {
            ino,
            reason: "zlib: inflate failed",
        }),
    }
}
