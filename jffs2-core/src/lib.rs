//! Read-only log reconciliation and extraction engine for JFFS2 images.
//!
//! An image is a flat, append-only log of fixed-format nodes (inode
//! revisions and directory-entry revisions) written in roughly
//! chronological order but not necessarily physical order. This crate
//! never builds an in-memory tree of the whole image; every directory and
//! every file's content is reconstructed on demand by replaying the
//! relevant slice of the log in version order (see [`reconcile`]).

pub mod compress;
pub mod dirstate;
pub mod error;
pub mod image;
pub mod materialize;
pub mod node;
pub mod path;
pub mod reconcile;
pub mod visit;
pub mod walk;

pub use error::{Error, Result};
pub use image::Image;

use std::path::Path;

/// Lists `path` (the image root if `None`) to stdout, `ls -l` style.
pub fn list(img: Image<'_>, path: Option<&str>, now: u32, verbose: bool) -> Result<()> {
    let mut visitor = visit::ListVisitor { now, verbose };
    walk::visit(img, path, &mut visitor)
}

/// Extracts `path` (the image root if `None`) into `dest` on the host
/// filesystem, creating `dest` itself if it does not already exist.
pub fn extract(img: Image<'_>, path: Option<&str>, dest: &Path, verbose: bool) -> Result<()> {
    match std::fs::create_dir(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.into()),
    }
    let mut visitor = visit::ExtractVisitor { dest: dest.to_path_buf(), verbose };
    walk::visit(img, path, &mut visitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::MAGIC;
    use crate::node::{COMMON_HEADER_LEN, COMPR_NONE, DT_REG};

    #[test]
    fn extract_creates_destination_directory() {
        let dir = std::env::temp_dir().join(format!("jffs2-core-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let img = Image::new(&[]);
        extract(img, None, &dir, false).unwrap();
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn dirent_node(pino: u32, version: u32, ino: u32, type_: u8, name: &[u8]) -> Vec<u8> {
        let totlen = (COMMON_HEADER_LEN + 28 + name.len()) as u32;
        let mut v = Vec::new();
        v.extend_from_slice(&MAGIC.to_le_bytes());
        v.extend_from_slice(&crate::image::NODETYPE_DIRENT.to_le_bytes());
        v.extend_from_slice(&totlen.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&pino.to_le_bytes());
        v.extend_from_slice(&version.to_le_bytes());
        v.extend_from_slice(&ino.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.push(name.len() as u8);
        v.push(type_);
        v.extend_from_slice(&0u16.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(name);
        while v.len() % 4 != 0 {
            v.push(0);
        }
        v
    }

    fn inode_node(ino: u32, version: u32, isize_: u32, offset: u32, dsize: u32, payload: &[u8]) -> Vec<u8> {
        let csize = payload.len() as u32;
        let totlen = (COMMON_HEADER_LEN + 56 + payload.len()) as u32;
        let mut v = Vec::new();
        v.extend_from_slice(&MAGIC.to_le_bytes());
        v.extend_from_slice(&crate::image::NODETYPE_INODE.to_le_bytes());
        v.extend_from_slice(&totlen.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&ino.to_le_bytes());
        v.extend_from_slice(&version.to_le_bytes());
        v.extend_from_slice(&0o100644u32.to_le_bytes());
        v.extend_from_slice(&0u16.to_le_bytes());
        v.extend_from_slice(&0u16.to_le_bytes());
        v.extend_from_slice(&isize_.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&offset.to_le_bytes());
        v.extend_from_slice(&csize.to_le_bytes());
        v.extend_from_slice(&dsize.to_le_bytes());
        v.push(COMPR_NONE);
        v.push(0);
        v.extend_from_slice(&0u16.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(payload);
        while v.len() % 4 != 0 {
            v.push(0);
        }
        v
    }

    #[test]
    fn extract_writes_regular_file_contents() {
        // spec §8 scenario 1's extraction half: root/a (reg) containing "hello".
        let mut buf = dirent_node(1, 1, 2, DT_REG, b"a");
        buf.extend(inode_node(2, 1, 5, 0, 5, b"hello"));
        let img = Image::new(&buf);

        let dir = std::env::temp_dir().join(format!("jffs2-core-test-extract-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        extract(img, None, &dir, false).unwrap();
        assert_eq!(std::fs::read(dir.join("a")).unwrap(), b"hello");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
