//! The single supported disk (`spec.md` §1/§4.3: one ATA disk, no
//! partitions beyond what the design admits).

pub mod ata;

use crate::file::filesystem::Filesystem;
use crate::util::lock::IntMutex;

/// The boot-time disk record: the probed disk plus whichever file system
/// claimed it during [`init`].
pub struct DiskRecord {
	pub disk: ata::Disk,
	pub filesystem: Option<&'static dyn Filesystem>,
}

static DISK: IntMutex<Option<DiskRecord>> = IntMutex::new(None);

/// Probes the (single) ATA disk and runs the file-system registry against
/// it: each registered file system's `resolve` is tried in registration
/// order, and the first success claims the disk (`spec.md` §4.3).
pub fn init() {
	let disk = ata::Disk {
		sector_size: ata::SECTOR_SIZE,
		sector_limit: 0xffff_ffff,
	};

	let filesystem = crate::file::resolve_disk();

	*DISK.lock() = Some(DiskRecord { disk, filesystem });
}

/// Returns the file system that claimed the disk, if any.
pub fn filesystem() -> Option<&'static dyn Filesystem> {
	DISK.lock().as_ref().and_then(|d| d.filesystem)
}
