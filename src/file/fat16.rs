//! FAT16 reader: superblock resolution, directory traversal, and
//! cluster-chain reads (`spec.md` §4.4).
//!
//! The only file system this kernel registers. A directory is snapshotted
//! into a heap-allocated buffer of raw 32-byte entries — the root
//! directory's size is known from the BPB; a subdirectory's is computed by
//! first walking its cluster chain to a size, then reading it in one pass
//! (`spec.md` §4.4: "building a new directory snapshot of exactly the
//! right size").

use crate::device::storage::ata::{Streamer, SECTOR_SIZE};
use crate::error::{KernelError, KernelResult};
use crate::file::filesystem::{Filesystem, HandleData, OpenMode, SeekFrom, Stat};
use crate::file::path::Path;
use crate::memory::heap;
use crate::util::lock::IntMutex;
use core::mem::size_of;

const BOOT_SIGNATURE: u8 = 0x29;
const ENTRY_SIZE: usize = 32;
const ATTR_LONG_NAME: u8 = 0x0f;
const ATTR_DIRECTORY: u8 = 0x10;
const ATTR_READ_ONLY: u8 = 0x01;
const NAME_FREE: u8 = 0x00;
const NAME_DELETED: u8 = 0xe5;

const FAT_FREE: u16 = 0x0000;
const FAT_BAD: u16 = 0xfff7;
const FAT_TERMINAL_MIN: u16 = 0xfff8;

#[repr(C, packed)]
#[derive(Clone, Copy)]
struct CommonHeader {
	jump_boot: [u8; 3],
	oem_name: [u8; 8],
	bytes_per_sector: u16,
	sectors_per_cluster: u8,
	reserved_sector_count: u16,
	num_fats: u8,
	root_entry_count: u16,
	total_sectors_16: u16,
	media: u8,
	fat_size_16: u16,
	sectors_per_track: u16,
	num_heads: u16,
	hidden_sectors: u32,
	total_sectors_32: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy)]
struct ExtendedHeader16 {
	drive_number: u8,
	reserved1: u8,
	boot_signature: u8,
	volume_id: u32,
	volume_label: [u8; 11],
	file_system_type: [u8; 8],
}

/// On-disk FAT16 short-file-name directory entry, 32 bytes, packed.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct DirEntry {
	pub name: [u8; 8],
	pub ext: [u8; 3],
	pub attributes: u8,
	reserved: u8,
	creation_time_tenths: u8,
	creation_time: u16,
	creation_date: u16,
	last_access_date: u16,
	first_cluster_high: u16,
	last_mod_time: u16,
	last_mod_date: u16,
	pub first_cluster_low: u16,
	pub file_size: u32,
}

impl DirEntry {
	fn is_end_marker(&self) -> bool {
		self.name[0] == NAME_FREE
	}

	fn is_deleted(&self) -> bool {
		self.name[0] == NAME_DELETED
	}

	fn is_long_name(&self) -> bool {
		self.attributes & ATTR_LONG_NAME == ATTR_LONG_NAME
	}

	fn is_directory(&self) -> bool {
		self.attributes & ATTR_DIRECTORY != 0
	}

	/// Reconstructs the 8.3 short name as `NAME.EXT` (or `NAME` with no
	/// extension), stopping at space padding (`spec.md` §4.4).
	fn short_name(&self, out: &mut [u8; 13]) -> usize {
		let mut len = 0;
		for &b in self.name.iter() {
			if b == b' ' {
				break;
			}
			out[len] = b;
			len += 1;
		}
		let ext_len = self.ext.iter().take_while(|&&b| b != b' ').count();
		if ext_len > 0 {
			out[len] = b'.';
			len += 1;
			for &b in self.ext[..ext_len].iter() {
				out[len] = b;
				len += 1;
			}
		}
		len
	}

	fn matches(&self, name: &[u8]) -> bool {
		let mut buf = [0u8; 13];
		let len = self.short_name(&mut buf);
		if len != name.len() {
			return false;
		}
		buf[..len]
			.iter()
			.zip(name.iter())
			.all(|(a, b)| a.eq_ignore_ascii_case(b))
	}
}

/// A heap-backed snapshot of one directory's entries.
struct DirectorySnapshot {
	entries: *mut DirEntry,
	count: usize,
}

impl DirectorySnapshot {
	fn as_slice(&self) -> &[DirEntry] {
		unsafe { core::slice::from_raw_parts(self.entries, self.count) }
	}
}

enum Node {
	File { entry: DirEntry },
	Directory { snapshot: DirectorySnapshot },
}

/// An open FAT16 file or directory.
pub struct Handle {
	node: Node,
	pos: u32,
}

struct State {
	common: CommonHeader,
	extended: ExtendedHeader16,
	root: DirectorySnapshot,
	cluster_streamer: Streamer,
	fat_streamer: Streamer,
	directory_streamer: Streamer,
}

impl State {
	fn sector_size(&self) -> u32 {
		self.common.bytes_per_sector as u32
	}

	fn cluster_size(&self) -> u32 {
		self.common.sectors_per_cluster as u32 * self.sector_size()
	}

	fn root_dir_start_sector(&self) -> u32 {
		self.common.reserved_sector_count as u32
			+ self.common.num_fats as u32 * self.common.fat_size_16 as u32
	}

	fn root_dir_sectors(&self) -> u32 {
		let bytes = self.common.root_entry_count as u32 * ENTRY_SIZE as u32;
		(bytes + self.sector_size() - 1) / self.sector_size()
	}

	fn first_data_sector(&self) -> u32 {
		self.root_dir_start_sector() + self.root_dir_sectors()
	}

	fn cluster_start_sector(&self, cluster: u32) -> u32 {
		self.first_data_sector() + (cluster - 2) * self.common.sectors_per_cluster as u32
	}

	/// Reads the FAT16 entry for `cluster` (`spec.md` §4.4).
	fn fat_entry(&mut self, cluster: u32) -> KernelResult<u16> {
		let offset = self.common.reserved_sector_count as u32 * self.sector_size() + cluster * 2;
		self.fat_streamer.seek(offset);
		let mut bytes = [0u8; 2];
		self.fat_streamer.read(&mut bytes).map_err(|_| KernelError::Io)?;
		Ok(u16::from_le_bytes(bytes))
	}

	/// Reads one whole cluster's bytes starting at FAT chain position
	/// `cluster`.
	fn read_cluster(&mut self, cluster: u32, out: &mut [u8]) -> KernelResult<()> {
		let sector = self.cluster_start_sector(cluster);
		self.cluster_streamer.seek(sector * self.sector_size());
		self.cluster_streamer.read(out).map_err(|_| KernelError::Io)
	}

	/// Loads a subdirectory by walking `first_cluster`'s chain, first to
	/// count clusters and then to read them into a freshly sized buffer.
	fn load_directory(&mut self, first_cluster: u32) -> KernelResult<DirectorySnapshot> {
		let cluster_size = self.cluster_size();
		let mut clusters = 0usize;
		let mut c = first_cluster;
		loop {
			clusters += 1;
			let next = self.fat_entry(c)?;
			if next == FAT_FREE || next == FAT_BAD || next >= FAT_TERMINAL_MIN {
				break;
			}
			c = next as u32;
		}

		let total = clusters * cluster_size as usize;
		let buffer = heap::malloc(total)?;

		let mut c = first_cluster;
		for i in 0..clusters {
			let dest = unsafe {
				core::slice::from_raw_parts_mut(buffer.add(i * cluster_size as usize), cluster_size as usize)
			};
			self.read_cluster(c, dest)?;
			if i + 1 < clusters {
				c = self.fat_entry(c)? as u32;
			}
		}

		Ok(DirectorySnapshot {
			entries: buffer as *mut DirEntry,
			count: total / ENTRY_SIZE,
		})
	}

	/// Linearly searches `dir`'s in-use entries for `name`, per `spec.md`
	/// §4.4: long-file-name and free/deleted entries are skipped.
	fn find(&self, dir: &DirectorySnapshot, name: &[u8]) -> Option<DirEntry> {
		for entry in dir.as_slice() {
			if entry.is_end_marker() {
				break;
			}
			if entry.is_deleted() || entry.is_long_name() {
				continue;
			}
			if entry.matches(name) {
				return Some(*entry);
			}
		}
		None
	}
}

static STATE: IntMutex<Option<State>> = IntMutex::new(None);

/// The singleton FAT16 filesystem instance, registered into the file
/// system table.
pub static FAT16: Fat16 = Fat16;

pub struct Fat16;

impl Filesystem for Fat16 {
	fn resolve(&self) -> bool {
		let mut boot_sector = [0u8; SECTOR_SIZE];
		let mut streamer = Streamer::new();
		if streamer.read(&mut boot_sector).is_err() {
			return false;
		}

		let common = unsafe { (boot_sector.as_ptr() as *const CommonHeader).read_unaligned() };
		let extended = unsafe {
			(boot_sector.as_ptr().add(size_of::<CommonHeader>()) as *const ExtendedHeader16)
				.read_unaligned()
		};
		if extended.boot_signature != BOOT_SIGNATURE {
			return false;
		}

		let mut state = State {
			common,
			extended,
			root: DirectorySnapshot {
				entries: core::ptr::null_mut(),
				count: 0,
			},
			cluster_streamer: Streamer::new(),
			fat_streamer: Streamer::new(),
			directory_streamer: Streamer::new(),
		};

		let root_start = state.root_dir_start_sector();
		let root_bytes = state.common.root_entry_count as usize * ENTRY_SIZE;
		let buffer = match heap::malloc(root_bytes) {
			Ok(p) => p,
			Err(_) => return false,
		};
		state.directory_streamer.seek(root_start * state.sector_size());
		let slice = unsafe { core::slice::from_raw_parts_mut(buffer, root_bytes) };
		if state.directory_streamer.read(slice).is_err() {
			let _ = heap::free(buffer);
			return false;
		}

		state.root = DirectorySnapshot {
			entries: buffer as *mut DirEntry,
			count: state.common.root_entry_count as usize,
		};

		*STATE.lock() = Some(state);
		true
	}

	fn open(&self, path: &Path, _mode: OpenMode) -> KernelResult<HandleData> {
		let mut guard = STATE.lock();
		let state = guard.as_mut().ok_or(KernelError::NotFound)?;

		let components = path.components();
		if components.is_empty() {
			return Err(KernelError::InvalidArgument);
		}

		// Directory snapshots loaded while descending; `current` always
		// borrows either the root snapshot or the most recently loaded one.
		let mut owned: Option<DirectorySnapshot> = None;
		let mut found: Option<DirEntry> = None;

		for (i, component) in components.iter().enumerate() {
			let dir_ref = owned.as_ref().unwrap_or(&state.root);
			let entry = state
				.find(dir_ref, component.as_bytes())
				.ok_or(KernelError::NotFound)?;

			let is_leaf = i + 1 == components.len();
			if !is_leaf {
				if !entry.is_directory() {
					return Err(KernelError::NotDirectory);
				}
				let next = state.load_directory(entry.first_cluster_low as u32)?;
				owned = Some(next);
			} else {
				found = Some(entry);
			}
		}

		let entry = found.unwrap();
		if entry.is_directory() {
			let snapshot = state.load_directory(entry.first_cluster_low as u32)?;
			Ok(HandleData::Fat16(Handle {
				node: Node::Directory { snapshot },
				pos: 0,
			}))
		} else {
			Ok(HandleData::Fat16(Handle {
				node: Node::File { entry },
				pos: 0,
			}))
		}
	}

	fn read(&self, handle_data: &mut HandleData, buf: &mut [u8]) -> KernelResult<usize> {
		let HandleData::Fat16(handle) = handle_data;
		let Node::File { entry } = &handle.node else {
			return Err(KernelError::NotDirectory);
		};
		let file_size = entry.file_size;
		let first_cluster = entry.first_cluster_low as u32;

		if handle.pos >= file_size {
			return Err(KernelError::NoData);
		}

		let mut guard = STATE.lock();
		let state = guard.as_mut().ok_or(KernelError::Fault)?;
		let cluster_size = state.cluster_size();

		let want = (file_size - handle.pos).min(buf.len() as u32) as usize;
		let mut done = 0;
		let mut cluster_buffer = [0u8; 4096];
		debug_assert!(cluster_size as usize <= cluster_buffer.len());

		while done < want {
			let cluster_index = handle.pos / cluster_size;
			let offset_in_cluster = (handle.pos % cluster_size) as usize;

			let mut cluster = first_cluster;
			for _ in 0..cluster_index {
				let next = state.fat_entry(cluster)?;
				if next == FAT_FREE || next == FAT_BAD || next >= FAT_TERMINAL_MIN {
					return Err(KernelError::NoData);
				}
				cluster = next as u32;
			}

			let region = &mut cluster_buffer[..cluster_size as usize];
			state.read_cluster(cluster, region)?;

			let chunk = (cluster_size as usize - offset_in_cluster).min(want - done);
			buf[done..done + chunk].copy_from_slice(&region[offset_in_cluster..offset_in_cluster + chunk]);

			done += chunk;
			handle.pos += chunk as u32;
		}

		Ok(done)
	}

	fn seek(&self, handle_data: &mut HandleData, whence: SeekFrom) -> KernelResult<()> {
		let HandleData::Fat16(handle) = handle_data;
		let new_pos = match whence {
			SeekFrom::Set(p) => p as i64,
			SeekFrom::Current(delta) => handle.pos as i64 + delta as i64,
			SeekFrom::End => return Err(KernelError::InvalidArgument),
		};
		if new_pos < 0 {
			return Err(KernelError::InvalidArgument);
		}
		handle.pos = new_pos as u32;
		Ok(())
	}

	fn stat(&self, handle_data: &HandleData) -> KernelResult<Stat> {
		let HandleData::Fat16(handle) = handle_data;
		match &handle.node {
			Node::File { entry } => Ok(Stat {
				file_size: entry.file_size,
				read_only: true,
			}),
			Node::Directory { .. } => Ok(Stat {
				file_size: 0,
				read_only: true,
			}),
		}
	}

	fn close(&self, handle_data: HandleData) {
		let HandleData::Fat16(handle) = handle_data;
		if let Node::Directory { snapshot } = handle.node {
			let _ = heap::free(snapshot.entries as *mut u8);
		}
	}
}
