//! The file-system registry and the descriptor table (`spec.md` §4.6).
//!
//! Two fixed-size arrays, installed once at boot: a registry of file
//! systems (only FAT16 in this design) and a table of open descriptors.
//! `open` parses the path, asks the registry-resolved file system to open
//! it, and hands back a 1-based descriptor id — id `0` is never valid
//! (`spec.md` §8's invariant).

pub mod fat16;
pub mod filesystem;
pub mod path;

use crate::config::{MAX_FILESYSTEMS, MAX_FILE_DESCRIPTORS};
use crate::error::{KernelError, KernelResult};
use crate::util::lock::IntMutex;
use filesystem::{Filesystem, HandleData, OpenMode, SeekFrom, Stat};
use path::Path;

struct Descriptor {
	filesystem: &'static dyn Filesystem,
	handle: HandleData,
}

static REGISTRY: IntMutex<[Option<&'static dyn Filesystem>; MAX_FILESYSTEMS]> =
	IntMutex::new([None; MAX_FILESYSTEMS]);

struct DescriptorTable {
	slots: [Option<Descriptor>; MAX_FILE_DESCRIPTORS],
}

static DESCRIPTORS: IntMutex<DescriptorTable> = IntMutex::new(DescriptorTable {
	slots: {
		const NONE: Option<Descriptor> = None;
		[NONE; MAX_FILE_DESCRIPTORS]
	},
});

/// Installs a file system into the registry. Called once per system at
/// boot, in the order `resolve` should be tried.
pub fn register(fs: &'static dyn Filesystem) {
	let mut registry = REGISTRY.lock();
	if let Some(slot) = registry.iter_mut().find(|s| s.is_none()) {
		*slot = Some(fs);
	}
}

/// Installs the file systems this kernel knows about. FAT16 is the only
/// one (`spec.md` §1).
pub fn init() {
	register(&fat16::FAT16);
}

/// Tries each registered file system's `resolve` in registration order;
/// the first success claims the disk (`spec.md` §4.3).
pub fn resolve_disk() -> Option<&'static dyn Filesystem> {
	let registry = REGISTRY.lock();
	registry.iter().flatten().find(|fs| fs.resolve()).copied()
}

fn lowest_free_descriptor(table: &DescriptorTable) -> KernelResult<usize> {
	table
		.slots
		.iter()
		.position(Option::is_none)
		.ok_or(KernelError::Busy)
}

/// Parses `path`, resolves it against the file system that claimed the
/// disk, and installs a new descriptor. Returns the descriptor's 1-based
/// id.
pub fn open(path_str: &str, mode_str: &str) -> KernelResult<u32> {
	let path = Path::parse(path_str)?;
	let mode = OpenMode::parse(mode_str)?;

	let fs = crate::device::storage::filesystem().ok_or(KernelError::NotFound)?;
	let handle = fs.open(&path, mode)?;

	let mut table = DESCRIPTORS.lock();
	let slot = lowest_free_descriptor(&table)?;
	table.slots[slot] = Some(Descriptor { filesystem: fs, handle });
	Ok(slot as u32 + 1)
}

fn with_descriptor<R>(fd: u32, f: impl FnOnce(&mut Descriptor) -> KernelResult<R>) -> KernelResult<R> {
	if fd == 0 {
		return Err(KernelError::BadFd);
	}
	let mut table = DESCRIPTORS.lock();
	let slot = table
		.slots
		.get_mut(fd as usize - 1)
		.and_then(Option::as_mut)
		.ok_or(KernelError::BadFd)?;
	f(slot)
}

pub fn read(fd: u32, buf: &mut [u8]) -> KernelResult<usize> {
	with_descriptor(fd, |d| d.filesystem.read(&mut d.handle, buf))
}

pub fn seek(fd: u32, whence: SeekFrom) -> KernelResult<()> {
	with_descriptor(fd, |d| d.filesystem.seek(&mut d.handle, whence))
}

pub fn stat(fd: u32) -> KernelResult<Stat> {
	with_descriptor(fd, |d| d.filesystem.stat(&d.handle))
}

pub fn close(fd: u32) -> KernelResult<()> {
	if fd == 0 {
		return Err(KernelError::BadFd);
	}
	let mut table = DESCRIPTORS.lock();
	let slot = table
		.slots
		.get_mut(fd as usize - 1)
		.ok_or(KernelError::BadFd)?;
	let descriptor = slot.take().ok_or(KernelError::BadFd)?;
	descriptor.filesystem.close(descriptor.handle);
	Ok(())
}

/// Reads a whole file's bytes into a freshly allocated heap buffer. Used
/// by `process_load` (`spec.md` §4.9).
pub fn read_whole_file(path: &str) -> KernelResult<(*mut u8, usize)> {
	let fd = open(path, "r")?;
	let size = stat(fd)?.file_size as usize;
	let buffer = crate::memory::heap::malloc(size)?;
	let slice = unsafe { core::slice::from_raw_parts_mut(buffer, size) };

	let mut done = 0;
	while done < size {
		let n = read(fd, &mut slice[done..])?;
		if n == 0 {
			break;
		}
		done += n;
	}

	close(fd)?;
	Ok((buffer, size))
}
