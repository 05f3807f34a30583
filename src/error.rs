//! Kernel error kinds.
//!
//! Every fallible kernel API returns a [`KernelResult`] instead of the
//! negative-integer-as-error convention of the system this kernel descends
//! from. The only places a raw negative integer is still produced are the
//! syscall return value placed in `eax` and legacy FAT16 failure codes,
//! both via [`KernelError::as_errno`].

use core::fmt;

/// The kind of failure a kernel operation ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum KernelError {
	/// A caller-supplied argument was invalid (misaligned pointer, bad path
	/// syntax, unaligned virtual address, out-of-range seek, ...).
	InvalidArgument = 1,
	/// A hardware or streamer I/O operation failed.
	Io = 2,
	/// An allocation could not be satisfied.
	OutOfMemory = 3,
	/// A path, file or directory entry does not exist.
	NotFound = 4,
	/// A path component that should name a directory does not.
	NotDirectory = 5,
	/// A read ran past the end of available data.
	NoData = 6,
	/// A file descriptor id was invalid or unallocated.
	BadFd = 7,
	/// A resource is currently in use.
	Busy = 8,
	/// A fault occurred that the kernel chose to report rather than panic on.
	Fault = 9,
}

impl KernelError {
	/// Returns the legacy negative-integer error code for this kind, as used
	/// by the syscall ABI's `eax` return convention and the FAT16 failure
	/// taxonomy in `spec.md` §7.
	pub const fn as_errno(self) -> i32 {
		-(self as i32)
	}
}

impl fmt::Display for KernelError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let msg = match self {
			Self::InvalidArgument => "invalid argument",
			Self::Io => "I/O error",
			Self::OutOfMemory => "out of memory",
			Self::NotFound => "not found",
			Self::NotDirectory => "not a directory",
			Self::NoData => "no data",
			Self::BadFd => "bad file descriptor",
			Self::Busy => "busy",
			Self::Fault => "fault",
		};
		f.write_str(msg)
	}
}

/// Result alias used at every fallible kernel API boundary.
pub type KernelResult<T> = Result<T, KernelError>;
