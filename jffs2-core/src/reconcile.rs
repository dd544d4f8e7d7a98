//! The version reconciler: the two-watermark streaming algorithm that
//! replays nodes in ascending version order without ever sorting them.
//!
//! Ported from `find_raw_inode`/`collectdir` in the original C tool (see
//! `examples/original_source/jffs2extract.c` in the retrieval pack this
//! crate was written against) -- the teacher workspace has nothing
//! resembling a log-structured reconciliation pass, so this module follows
//! the original algorithm directly, expressed as safe Rust over the
//! bounds-checked [`Image`] accessors instead of raw pointer arithmetic.

use crate::dirstate::DirState;
use crate::error::Result;
use crate::image::{Image, NodeHeader, NODETYPE_DIRENT, NODETYPE_INODE};
use crate::node::{RawDirent, RawInode};

/// Finds the inode revision for `ino` with the smallest version strictly
/// greater than `after_version`. Repeated calls, each passing the
/// previous call's returned version, walk every revision of `ino` in
/// ascending order (the materializer's access pattern).
///
/// Each call re-scans the image from offset 0, exactly as the original
/// `find_raw_inode` does -- it has no state to resume from between calls.
pub fn find_latest_inode<'a>(
    img: Image<'a>,
    ino: u32,
    after_version: u32,
) -> Result<Option<RawInode<'a>>> {
    let mut pos = 0usize;
    let lr = 0usize;
    let mut mp: Option<NodeHeader> = None;
    let mut vmint = u32::MAX;
    let mut vmaxt = 0u32;
    let mut vmax = u32::MAX;
    let vcur = after_version;

    loop {
        match img.next_header_bounded(pos) {
            Some(h) if h.node_type == NODETYPE_INODE => {
                let ri = RawInode::at(img, &h);
                if ri.ino()? == ino {
                    let v = ri.version()?;
                    if v > vcur {
                        if vmaxt < v {
                            vmaxt = v;
                        }
                        if vmint > v {
                            vmint = v;
                            mp = Some(h);
                        }
                        if v == vcur + 1 {
                            return Ok(Some(ri));
                        }
                    }
                }
                pos = h.end();
            }
            Some(h) => pos = h.end(),
            None => pos = 0,
        }

        if pos == lr {
            vmax = vmaxt;
            let vmin = vmint;
            vmint = u32::MAX;
            if vcur < vmax && vcur < vmin {
                log::debug!("find_latest_inode(ino={ino}): accepting minimum candidate after full revolution");
                return Ok(mp.map(|h| RawInode::at(img, &h)));
            }
        }
        if vcur >= vmax {
            return Ok(None);
        }
    }
}

/// Replays every dirent revision whose parent inode is `parent_ino`, in
/// ascending version order, into a fresh [`DirState`].
///
/// Unlike [`find_latest_inode`], this does not restart from offset 0 on
/// every accepted revision -- it resumes the scan from the position right
/// after the node it just accepted, the same optimization the original
/// `collectdir` makes over `find_raw_inode`.
pub fn collect_directory(img: Image<'_>, parent_ino: u32) -> Result<DirState> {
    let mut state = DirState::new();

    let mut pos = 0usize;
    let mut lr = 0usize;
    let mut mp: Option<NodeHeader> = None;
    let mut vmint = u32::MAX;
    let mut vmaxt = 0u32;
    let mut vmax = u32::MAX;
    let mut vcur = 0u32;

    loop {
        match img.next_header_bounded(pos) {
            Some(h) if h.node_type == NODETYPE_DIRENT => {
                let rd = RawDirent::at(img, &h);
                if rd.pino()? == parent_ino {
                    let v = rd.version()?;
                    if v > vcur {
                        if vmaxt < v {
                            vmaxt = v;
                        }
                        if vmint > v {
                            vmint = v;
                            mp = Some(h);
                        }
                        if v == vcur + 1 {
                            apply_dirent(&mut state, &rd)?;
                            lr = h.end();
                            vcur += 1;
                            vmint = u32::MAX;
                        }
                    }
                }
                pos = h.end();
            }
            Some(h) => pos = h.end(),
            None => pos = 0,
        }

        if pos == lr {
            vmax = vmaxt;
            let vmin = vmint;
            vmint = u32::MAX;
            if vcur < vmax && vcur < vmin {
                if let Some(mp_header) = mp {
                    let rd = RawDirent::at(img, &mp_header);
                    apply_dirent(&mut state, &rd)?;
                    lr = mp_header.end();
                    pos = lr;
                    vcur = vmin;
                    log::debug!(
                        "collect_directory(parent={parent_ino}): accepted minimum candidate, vcur now {vcur}"
                    );
                }
            }
        }
        if vcur >= vmax {
            break;
        }
    }

    Ok(state)
}

fn apply_dirent(state: &mut DirState, rd: &RawDirent<'_>) -> Result<()> {
    let name = rd.name()?;
    let file_type = rd.type_()?;
    let ino = rd.ino()?;
    state.apply(name, file_type, ino);
    Ok(())
}
