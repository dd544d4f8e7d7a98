use core::fmt;

/// Errors raised while reconciling or extracting a JFFS2 image.
///
/// Modeled on `rcore_fs::vfs::FsError`: a flat enum, a `Display` that
/// delegates to `{:?}`, and a blanket `std::error::Error` impl. Recoverable
/// per-entry conditions (missing inode, host I/O failure during extraction,
/// unsupported special file) are *not* represented here -- they are logged
/// via `log::warn!` and surfaced as counts, per spec.
#[derive(Debug)]
pub enum Error {
    /// The image ended before a node header or its payload could be read.
    Truncated { at: usize, needed: usize },
    /// An inode revision carries a compression tag outside {none, zero, rtime, zlib}.
    UnknownCompression(u8),
    /// zlib/rtime decompression could not produce `dsize` bytes.
    DecompressionFailed { ino: u32, reason: &'static str },
    /// Path resolution reached a dead end (inode 0) or the target is not a directory.
    PathNotFound(String),
    /// Symlink recursion exceeded the depth cap of 16.
    SymlinkLoop,
    /// A dirent names an inode with no revision in the log. Recoverable:
    /// the walker logs this detail and skips the entry rather than
    /// propagating it as a hard failure.
    MissingInode { ino: u32 },
    /// I/O error reading the image or, for the CLI, writing extracted output.
    Io(std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated { at, needed } => {
                write!(f, "image truncated at offset {at}, needed {needed} more bytes")
            }
            Error::UnknownCompression(tag) => write!(f, "unsupported compression method 0x{tag:02x}"),
            Error::DecompressionFailed { ino, reason } => {
                write!(f, "decompression failed for inode {ino}: {reason}")
            }
            Error::PathNotFound(path) => write!(f, "{path}: No such file or directory"),
            Error::SymlinkLoop => write!(f, "too many levels of symbolic links"),
            Error::MissingInode { ino } => write!(f, "no inode revision found for ino {ino}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
