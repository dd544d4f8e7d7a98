//! Immutable byte-buffer view over a JFFS2 image and the 4-byte-aligned
//! node scan that everything else in this crate is built on.

use crate::error::{Error, Result};

/// Node marks the start of a valid record.
pub const MAGIC: u16 = 0x1985;

pub const NODETYPE_INODE: u16 = 0xE001;
pub const NODETYPE_DIRENT: u16 = 0xE002;

/// Common 12-byte header shared by every node: magic, nodetype, totlen,
/// hdr_crc (crc is read but never validated, per spec).
#[derive(Debug, Clone, Copy)]
pub struct NodeHeader {
    pub offset: usize,
    pub node_type: u16,
    pub totlen: u32,
}

impl NodeHeader {
    /// Rounds `totlen` up to a multiple of 4, the distance to the next record.
    pub fn advance(&self) -> usize {
        ((self.totlen as usize) + 3) & !3
    }

    pub fn end(&self) -> usize {
        self.offset + self.advance()
    }
}

/// A borrowed, length-checked view over the raw image bytes.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    buf: &'a [u8],
}

impl<'a> Image<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Image { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn u8_at(&self, at: usize) -> Result<u8> {
        self.buf.get(at).copied().ok_or(Error::Truncated { at, needed: 1 })
    }

    pub fn u16_at(&self, at: usize) -> Result<u16> {
        let s = self
            .buf
            .get(at..at + 2)
            .ok_or(Error::Truncated { at, needed: 2 })?;
        Ok(u16::from_le_bytes([s[0], s[1]]))
    }

    pub fn u32_at(&self, at: usize) -> Result<u32> {
        let s = self
            .buf
            .get(at..at + 4)
            .ok_or(Error::Truncated { at, needed: 4 })?;
        Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub fn slice_at(&self, at: usize, len: usize) -> Result<&'a [u8]> {
        self.buf
            .get(at..at + len)
            .ok_or(Error::Truncated { at, needed: len })
    }

    /// Reads the common header at `offset`, if `offset` carries the node magic.
    /// Returns `None` (not an error) when the word at `offset` is not the
    /// magic -- the caller is expected to be mid-scan over padding.
    fn header_if_magic(&self, offset: usize) -> Option<NodeHeader> {
        if self.u16_at(offset).ok()? != MAGIC {
            return None;
        }
        let node_type = self.u16_at(offset + 2).ok()?;
        let totlen = self.u32_at(offset + 4).ok()?;
        Some(NodeHeader { offset, node_type, totlen })
    }

    /// Scans 4-byte-aligned offsets starting at `from`, up to (not including)
    /// `self.len()`, returning the header of the first node found. Does not
    /// wrap -- callers that need the reconciler's full-revolution wraparound
    /// use [`Image::scan`].
    pub fn next_header_bounded(&self, from: usize) -> Option<NodeHeader> {
        let mut pos = from & !3;
        while pos + 4 <= self.len() {
            if let Some(h) = self.header_if_magic(pos) {
                return Some(h);
            }
            pos += 4;
        }
        None
    }

    /// A wrapping node scanner: starts at `from`, advances node-by-node, and
    /// wraps to offset 0 once it runs past the end of the image. Mirrors the
    /// original `find_raw_inode`/`collectdir` loop structure, where the scan
    /// has no natural end and termination is the reconciler's job.
    pub fn scan(&self, from: usize) -> Scan<'a> {
        Scan { img: *self, pos: from & !3 }
    }
}

/// Iterator-like cursor that wraps around the image indefinitely. The
/// reconciler is responsible for detecting a full revolution and stopping.
pub struct Scan<'a> {
    img: Image<'a>,
    pos: usize,
}

impl<'a> Scan<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Advances to and returns the next node header, wrapping to 0 if the
    /// image is exhausted. Returns `None` only for a zero-length image.
    pub fn next(&mut self) -> Option<NodeHeader> {
        if self.img.is_empty() {
            return None;
        }
        loop {
            if self.pos + 4 > self.img.len() {
                self.pos = 0;
                continue;
            }
            match self.img.header_if_magic(self.pos) {
                Some(h) => {
                    self.pos = h.end();
                    return Some(h);
                }
                None => self.pos += 4,
            }
        }
    }
}
