//! Resolves a slash-delimited path to an (inode, dirent) pair, honoring
//! `.`, `..`, and symlinks with a recursion cap of 16.
//!
//! Ported from `resolvepath0`/`resolvedirent` in the original C tool --
//! including one quirk worth calling out: a bare `/..` (parent of root,
//! with no preceding component) resolves to inode 0, because the
//! original never special-cases "already at root" for `..`. This is
//! preserved rather than "fixed", since spec's testable properties only
//! assert `/foo/..` (not bare `/..`) resolves to the root.

use crate::error::Result;
use crate::image::{Image, NODETYPE_DIRENT};
use crate::materialize::materialize;
use crate::node::{RawDirent, DT_DIR, DT_LNK};

const MAX_SYMLINK_DEPTH: u32 = 16;

/// The result of resolving a path: the dirent naming the final component
/// (`None` if the path resolved to the root, which has no dirent of its
/// own) and its inode (0 on failure).
pub struct Resolved<'a> {
    pub dirent: Option<RawDirent<'a>>,
    pub ino: u32,
}

impl Resolved<'_> {
    pub fn found(&self) -> bool {
        self.ino != 0
    }
}

pub fn resolve_path<'a>(img: Image<'a>, start_ino: u32, path: &str) -> Result<Resolved<'a>> {
    resolve_path0(img, start_ino, path, 0)
}

fn resolve_path0<'a>(img: Image<'a>, mut ino: u32, path: &str, recc: u32) -> Result<Resolved<'a>> {
    if recc > MAX_SYMLINK_DEPTH {
        return Ok(Resolved { dirent: None, ino: 0 });
    }

    let mut dir: Option<RawDirent<'a>> = None;
    let mut p = path;
    if let Some(rest) = p.strip_prefix('/') {
        p = rest;
        ino = 1;
    }

    if ino > 1 {
        dir = resolve_by_ino(img, ino)?;
        ino = dirent_ino(&dir)?;
    }

    let components: Vec<&str> = p.split('/').filter(|c| !c.is_empty()).collect();
    let last_idx = components.len().saturating_sub(1);

    for (i, comp) in components.iter().enumerate() {
        if ino == 0 {
            break;
        }
        let is_last = i == last_idx;

        if *comp == "." {
            continue;
        }
        if *comp == ".." {
            let pino = dirent_pino(&dir)?;
            if pino == 1 {
                ino = 1;
                dir = None;
            } else {
                dir = resolve_by_ino(img, pino)?;
                ino = dirent_ino(&dir)?;
            }
            continue;
        }

        let found = resolve_by_name(img, ino, comp.as_bytes())?;
        let found_ino = dirent_ino(&found)?;
        if found_ino == 0 {
            return Ok(Resolved { dirent: None, ino: 0 });
        }
        let found_type = found.as_ref().expect("found_ino != 0 implies Some").type_()?;
        if !is_last && !(found_type == DT_DIR || found_type == DT_LNK) {
            return Ok(Resolved { dirent: None, ino: 0 });
        }

        dir = found;

        if found_type == DT_LNK {
            let target_bytes = materialize(img, found_ino)?;
            let target = String::from_utf8_lossy(&target_bytes).into_owned();
            let tino = ino;
            let resolved = resolve_path0(img, tino, &target, recc + 1)?;
            dir = resolved.dirent;
            ino = resolved.ino;
            if let Some(d) = &dir {
                ino = d.ino()?;
            }
            if let Some(d) = &dir {
                if !is_last {
                    let t = d.type_()?;
                    if !(t == DT_DIR || t == DT_LNK) {
                        return Ok(Resolved { dirent: None, ino: 0 });
                    }
                }
            }
        } else {
            ino = dir.as_ref().expect("just assigned").ino()?;
        }
    }

    Ok(Resolved { dirent: dir, ino })
}

fn dirent_ino(d: &Option<RawDirent<'_>>) -> Result<u32> {
    match d {
        Some(rd) => rd.ino(),
        None => Ok(0),
    }
}

fn dirent_pino(d: &Option<RawDirent<'_>>) -> Result<u32> {
    match d {
        Some(rd) => rd.pino(),
        None => Ok(0),
    }
}

/// Resolves the dirent that names inode `ino` under any parent, taking the
/// highest version among matches (`resolveinode` in the original).
fn resolve_by_ino<'a>(img: Image<'a>, ino: u32) -> Result<Option<RawDirent<'a>>> {
    if ino <= 1 {
        return Ok(None);
    }
    scan_latest_dirent(img, |rd| Ok(rd.ino()? == ino))
}

/// Resolves the dirent named `name` directly under `pino`, taking the
/// highest version among matches (`resolvename` in the original).
fn resolve_by_name<'a>(img: Image<'a>, pino: u32, name: &[u8]) -> Result<Option<RawDirent<'a>>> {
    if pino == 0 {
        return Ok(None);
    }
    scan_latest_dirent(img, |rd| Ok(rd.pino()? == pino && rd.name()? == name))
}

fn scan_latest_dirent<'a>(
    img: Image<'a>,
    pred: impl Fn(&RawDirent<'a>) -> Result<bool>,
) -> Result<Option<RawDirent<'a>>> {
    let mut pos = 0usize;
    let mut vmax = 0u32;
    let mut best: Option<RawDirent<'a>> = None;

    loop {
        match img.next_header_bounded(pos) {
            Some(h) if h.node_type == NODETYPE_DIRENT => {
                let rd = RawDirent::at(img, &h);
                if pred(&rd)? {
                    let v = rd.version()?;
                    if v > vmax {
                        vmax = v;
                        best = Some(rd);
                    }
                }
                pos = h.end();
            }
            Some(h) => pos = h.end(),
            None => break,
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::MAGIC;
    use crate::node::{COMMON_HEADER_LEN, COMPR_NONE, DT_REG};

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
    fn root_resolves_to_inode_one_with_no_dirent() {
        let img = Image::new(&[]);
        let r = resolve_path(img, 1, "/").unwrap();
        assert_eq!(r.ino, 1);
        assert!(r.dirent.is_none());
    }

    #[test]
    fn dot_and_dotdot_resolve_to_root() {
        let mut buf = dirent_node(1, 1, 2, crate::node::DT_DIR, b"foo");
        buf.extend(inode_node(2, 1, 0, 0, 0, b""));
        let img = Image::new(&buf);

        let dot = resolve_path(img, 1, "/.").unwrap();
        assert_eq!(dot.ino, 1);

        let dotdot = resolve_path(img, 1, "/foo/..").unwrap();
        assert_eq!(dotdot.ino, 1);
        assert!(dotdot.dirent.is_none());
    }

    #[test]
    fn symlink_resolves_to_target_inode() {
        // scenario 4: root/a (reg, ino=2), root/l -> "a" (symlink, ino=3)
        let mut buf = dirent_node(1, 1, 2, DT_REG, b"a");
        buf.extend(inode_node(2, 1, 5, 0, 5, b"hello"));
        buf.extend(dirent_node(1, 2, 3, crate::node::DT_LNK, b"l"));
        buf.extend(inode_node(3, 1, 1, 0, 1, b"a"));
        let img = Image::new(&buf);

        let via_a = resolve_path(img, 1, "/a").unwrap();
        let via_l = resolve_path(img, 1, "/l").unwrap();
        assert_eq!(via_a.ino, via_l.ino);
        assert_eq!(via_a.ino, 2);
    }

    /// Builds a chain of `hops` symlinks `l0 -> l1 -> ... -> l{hops-1}`, where
    /// the last one points at a real regular file `"target"`.
    fn build_symlink_chain(hops: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(dirent_node(1, 1, 900, DT_REG, b"target"));
        buf.extend(inode_node(900, 1, 1, 0, 1, b"x"));
        for i in 0..hops {
            let this_name = format!("l{i}");
            let points_at = if i + 1 == hops {
                "target".to_string()
            } else {
                format!("l{}", i + 1)
            };
            buf.extend(dirent_node(1, 2 + i, 800 + i, crate::node::DT_LNK, this_name.as_bytes()));
            buf.extend(inode_node(
                800 + i,
                1,
                points_at.len() as u32,
                0,
                points_at.len() as u32,
                points_at.as_bytes(),
            ));
        }
        buf
    }

    #[test]
    fn symlink_chain_of_depth_sixteen_resolves() {
        let buf = build_symlink_chain(16);
        let img = Image::new(&buf);
        let r = resolve_path(img, 1, "/l0").unwrap();
        assert_eq!(r.ino, 900, "a 16-hop chain is within the cap");
    }

    #[test]
    fn symlink_chain_of_depth_seventeen_fails() {
        let buf = build_symlink_chain(17);
        let img = Image::new(&buf);
        let r = resolve_path(img, 1, "/l0").unwrap();
        assert_eq!(r.ino, 0, "a 17-hop chain exceeds the depth-16 cap");
    }
}
