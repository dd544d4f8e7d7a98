//! Depth-first traversal of the reconstructed tree, invoking a visitor
//! once per directory entry.

use crate::dirstate::DirEntryRecord;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::node::{RawInode, DT_BLK, DT_CHR, DT_DIR, DT_FIFO, DT_LNK, DT_REG, DT_SOCK};
use crate::path::resolve_path;
use crate::reconcile::{collect_directory, find_latest_inode};

/// The marker character a long listing prints after the name, and that the
/// extract visitor switches on (spec §4.7).
pub fn type_marker(file_type: u8) -> char {
    match file_type {
        DT_REG => ' ',
        DT_FIFO => '|',
        DT_CHR => ' ',
        DT_BLK => ' ',
        DT_DIR => '/',
        DT_LNK => ' ',
        DT_SOCK => '=',
        _ => '?',
    }
}

/// Callback invoked once per directory entry during a walk, in the
/// insertion order of the replayed directory state. `len` is the entry's
/// cumulative size: `offset + dsize` of its last inode revision.
pub trait Visitor {
    fn visit(
        &mut self,
        img: Image<'_>,
        record: &DirEntryRecord,
        marker: char,
        inode: &RawInode<'_>,
        len: u32,
        path: &str,
    ) -> Result<()>;
}

/// Resolves `path`, verifies it names a directory, and walks it
/// depth-first, emitting one visitor call per entry before descending into
/// any subdirectories.
pub fn visit(img: Image<'_>, path: Option<&str>, visitor: &mut dyn Visitor) -> Result<()> {
    let display_path = path.unwrap_or("/");
    let resolved = resolve_path(img, 1, display_path)?;

    let is_dir = match &resolved.dirent {
        None => resolved.ino == 1, // root
        Some(d) => d.type_()? == DT_DIR,
    };
    if !resolved.found() || !is_dir {
        return Err(Error::PathNotFound(display_path.to_string()));
    }

    let dir = collect_directory(img, resolved.ino)?;
    visit_dir(img, &dir, display_path, visitor)
}

fn visit_dir(img: Image<'_>, dir: &crate::dirstate::DirState, path: &str, visitor: &mut dyn Visitor) -> Result<()> {
    for record in dir.records() {
        let marker = type_marker(record.file_type);

        let first = match find_latest_inode(img, record.ino, 0)? {
            Some(ri) => ri,
            None => {
                log::warn!("skipping {}: {}", String::from_utf8_lossy(&record.name), Error::MissingInode { ino: record.ino });
                continue;
            }
        };

        // chase every later revision purely to compute the cumulative length.
        let mut len = 0u32;
        let mut cursor = Some(first);
        while let Some(ri) = cursor {
            len = ri.dsize()? + ri.offset()?;
            cursor = find_latest_inode(img, record.ino, ri.version()?)?;
        }

        visitor.visit(img, record, marker, &first, len, path)?;

        if record.file_type == DT_DIR {
            let child_path = format!("{path}/{}", String::from_utf8_lossy(&record.name));
            let child_dir = collect_directory(img, record.ino)?;
            visit_dir(img, &child_dir, &child_path, visitor)?;
        }
    }
    Ok(())
}
