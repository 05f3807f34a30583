//! The file-system registry's common interface (`spec.md` §4.3/§4.6).
//!
//! Exactly one file system is registered in this design (FAT16), but the
//! registry itself is generic: boot tries each registered `Filesystem` in
//! turn and the first whose `resolve` succeeds claims the disk.

use crate::error::KernelResult;
use crate::file::fat16;
use crate::file::path::Path;

/// The mode bits `open`'s mode string parses into (`spec.md` §4.6).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
	pub read: bool,
	pub write: bool,
	pub append: bool,
}

impl OpenMode {
	/// Parses one of `r, w, a, r+, w+, a+`.
	pub fn parse(s: &str) -> KernelResult<Self> {
		use crate::error::KernelError;
		let mode = match s {
			"r" => Self { read: true, write: false, append: false },
			"w" => Self { read: false, write: true, append: false },
			"a" => Self { read: false, write: false, append: true },
			"r+" => Self { read: true, write: true, append: false },
			"w+" => Self { read: true, write: true, append: false },
			"a+" => Self { read: true, write: false, append: true },
			_ => return Err(KernelError::InvalidArgument),
		};
		Ok(mode)
	}
}

/// Seek origin. `End` exists only to be rejected: this design supports
/// `SET` and `CUR` only (`spec.md` §4.4).
pub enum SeekFrom {
	Set(u32),
	Current(i32),
	End,
}

pub struct Stat {
	pub file_size: u32,
	pub read_only: bool,
}

/// Every registered file system's open handle, one variant per
/// implementation. A `enum` rather than a boxed trait object: this kernel
/// has no general-purpose heap allocator to put a `dyn` handle behind.
pub enum HandleData {
	Fat16(fat16::Handle),
}

/// One registered file system.
pub trait Filesystem: Sync {
	/// Attempts to claim the disk. Returns whether resolution succeeded.
	fn resolve(&self) -> bool;
	fn open(&self, path: &Path, mode: OpenMode) -> KernelResult<HandleData>;
	fn read(&self, handle: &mut HandleData, buf: &mut [u8]) -> KernelResult<usize>;
	fn seek(&self, handle: &mut HandleData, whence: SeekFrom) -> KernelResult<()>;
	fn stat(&self, handle: &HandleData) -> KernelResult<Stat>;
	fn close(&self, handle: HandleData);
}
