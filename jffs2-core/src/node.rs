//! Typed views over inode-revision and dirent-revision nodes. Every field
//! is read on demand from the borrowed image -- no eager copying, so these
//! views stay cheap through the reconciler's repeated scans.

use crate::error::Result;
use crate::image::{Image, NodeHeader};

pub const COMMON_HEADER_LEN: usize = 12; // magic(2) + nodetype(2) + totlen(4) + hdr_crc(4)

pub const COMPR_NONE: u8 = 0x00;
pub const COMPR_ZERO: u8 = 0x01;
pub const COMPR_RTIME: u8 = 0x02;
pub const COMPR_ZLIB: u8 = 0x06;

/// Conventional `dirent` file-type tags (matches `DT_*` from `<dirent.h>`).
pub const DT_FIFO: u8 = 1;
pub const DT_CHR: u8 = 2;
pub const DT_DIR: u8 = 4;
pub const DT_BLK: u8 = 6;
pub const DT_REG: u8 = 8;
pub const DT_LNK: u8 = 10;
pub const DT_SOCK: u8 = 12;

/// A borrowed view over an inode-revision node (`JFFS2_NODETYPE_INODE`).
///
/// Field order matches `jffs2_raw_inode` on disk: ino, version, mode, uid,
/// gid, isize, atime, mtime, ctime, offset, csize, dsize, compr,
/// usercompr, flags, data_crc, node_crc, then `csize` bytes of payload.
#[derive(Clone, Copy)]
pub struct RawInode<'a> {
    img: Image<'a>,
    base: usize,
}

impl<'a> RawInode<'a> {
    /// Builds a view over the inode revision whose common header starts at
    /// `header.offset`. Does not validate that `header.node_type` is
    /// `NODETYPE_INODE` -- callers filter by node type before constructing.
    pub fn at(img: Image<'a>, header: &NodeHeader) -> Self {
        RawInode { img, base: header.offset + COMMON_HEADER_LEN }
    }

    pub fn offset_in_image(&self) -> usize {
        self.base - COMMON_HEADER_LEN
    }

    pub fn ino(&self) -> Result<u32> {
        self.img.u32_at(self.base)
    }
    pub fn version(&self) -> Result<u32> {
        self.img.u32_at(self.base + 4)
    }
    pub fn mode(&self) -> Result<u32> {
        self.img.u32_at(self.base + 8)
    }
    pub fn uid(&self) -> Result<u16> {
        self.img.u16_at(self.base + 12)
    }
    pub fn gid(&self) -> Result<u16> {
        self.img.u16_at(self.base + 14)
    }
    pub fn isize_(&self) -> Result<u32> {
        self.img.u32_at(self.base + 16)
    }
    pub fn atime(&self) -> Result<u32> {
        self.img.u32_at(self.base + 20)
    }
    pub fn mtime(&self) -> Result<u32> {
        self.img.u32_at(self.base + 24)
    }
    pub fn ctime(&self) -> Result<u32> {
        self.img.u32_at(self.base + 28)
    }
    pub fn offset(&self) -> Result<u32> {
        self.img.u32_at(self.base + 32)
    }
    pub fn csize(&self) -> Result<u32> {
        self.img.u32_at(self.base + 36)
    }
    pub fn dsize(&self) -> Result<u32> {
        self.img.u32_at(self.base + 40)
    }
    pub fn compr(&self) -> Result<u8> {
        self.img.u8_at(self.base + 44)
    }
    pub fn usercompr(&self) -> Result<u8> {
        self.img.u8_at(self.base + 45)
    }
    pub fn flags(&self) -> Result<u16> {
        self.img.u16_at(self.base + 46)
    }

    const PAYLOAD_OFFSET: usize = 48 + 4 + 4; // uid..flags (48) + data_crc + node_crc

    pub fn payload(&self) -> Result<&'a [u8]> {
        let csize = self.csize()? as usize;
        self.img.slice_at(self.base + Self::PAYLOAD_OFFSET, csize)
    }
}

/// A borrowed view over a dirent-revision node (`JFFS2_NODETYPE_DIRENT`).
///
/// spec.md's on-disk table omits the target-inode field that its own data
/// model (and every reconciliation rule) requires; the real
/// `jffs2_raw_dirent` layout carries it as `ino` directly after `version`,
/// ahead of `mctime`. This view follows that corrected order: pino,
/// version, ino, mctime, nsize, type, unused(2), node_crc, name_crc, name.
#[derive(Clone, Copy)]
pub struct RawDirent<'a> {
    img: Image<'a>,
    base: usize,
}

impl<'a> RawDirent<'a> {
    pub fn at(img: Image<'a>, header: &NodeHeader) -> Self {
        RawDirent { img, base: header.offset + COMMON_HEADER_LEN }
    }

    pub fn offset_in_image(&self) -> usize {
        self.base - COMMON_HEADER_LEN
    }

    pub fn pino(&self) -> Result<u32> {
        self.img.u32_at(self.base)
    }
    pub fn version(&self) -> Result<u32> {
        self.img.u32_at(self.base + 4)
    }
    pub fn ino(&self) -> Result<u32> {
        self.img.u32_at(self.base + 8)
    }
    pub fn mctime(&self) -> Result<u32> {
        self.img.u32_at(self.base + 12)
    }
    pub fn nsize(&self) -> Result<u8> {
        self.img.u8_at(self.base + 16)
    }
    pub fn type_(&self) -> Result<u8> {
        self.img.u8_at(self.base + 17)
    }

    const NAME_OFFSET: usize = 28; // pino,version,ino,mctime(16) + nsize,type,unused(4) + node_crc,name_crc(8)

    pub fn name(&self) -> Result<&'a [u8]> {
        let nsize = self.nsize()? as usize;
        self.img.slice_at(self.base + Self::NAME_OFFSET, nsize)
    }
}
