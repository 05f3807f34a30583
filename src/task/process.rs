//! Processes: a loaded program image plus its one task (`spec.md` §4.9).
//!
//! A process owns the heap buffer its program image was read into, the
//! heap buffer backing its user stack, and its keyboard ring buffer
//! (`spec.md` §4.10). The process table is a fixed slot array, same shape
//! as the task table it sits beside, and a process's slot index is its
//! pid — shared with its (single) task's own slot index in this design.

use crate::config;
use crate::device::keyboard::RingBuffer;
use crate::error::{KernelError, KernelResult};
use crate::memory::heap;
use crate::util::lock::IntMutex;

/// A loaded process. `spec.md` §4.9 describes one task per process, so
/// `main_task` is that task's pid and happens to equal this process's own
/// slot index.
pub struct Process {
	pub pid: usize,
	pub main_task: usize,
	file_ptr: *mut u8,
	file_size: usize,
	stack: *mut u8,
	pub keyboard: RingBuffer,
}

unsafe impl Send for Process {}

struct ProcessTable {
	slots: [Option<Process>; config::MAX_PROCESSES],
}

static PROCESSES: IntMutex<ProcessTable> = IntMutex::new(ProcessTable {
	slots: {
		const NONE: Option<Process> = None;
		[NONE; config::MAX_PROCESSES]
	},
});

fn free_slot(table: &ProcessTable) -> KernelResult<usize> {
	table.slots.iter().position(Option::is_none).ok_or(KernelError::Busy)
}

/// Loads the program image at `path` into a freshly allocated process:
/// reads the whole file into a heap buffer, allocates a
/// [`config::PROGRAM_STACK_SIZE`] kernel stack buffer, creates a task for
/// it, and maps both into the task's address space (`spec.md` §4.9).
///
/// Open Question (decided): process termination and slot reclamation are
/// out of scope (`spec.md` §4.9's Open Questions) — slots are never
/// freed once taken.
pub fn load(path: &str) -> KernelResult<usize> {
	let mut table = PROCESSES.lock();
	let pid = free_slot(&table)?;
	drop(table);

	let (file_ptr, file_size) = crate::file::read_whole_file(path)?;
	let stack = match heap::zmalloc(config::PROGRAM_STACK_SIZE) {
		Ok(p) => p,
		Err(e) => {
			let _ = heap::free(file_ptr);
			return Err(e);
		}
	};

	let main_task = match super::new(pid) {
		Ok(t) => t,
		Err(e) => {
			let _ = heap::free(file_ptr);
			let _ = heap::free(stack);
			return Err(e);
		}
	};

	if let Err(e) = super::map_program(main_task, file_ptr, file_size, stack) {
		let _ = heap::free(file_ptr);
		let _ = heap::free(stack);
		return Err(e);
	}

	let process = Process {
		pid,
		main_task,
		file_ptr,
		file_size,
		stack,
		keyboard: RingBuffer::new(),
	};

	table = PROCESSES.lock();
	table.slots[pid] = Some(process);
	Ok(pid)
}

/// Pushes a scancode-translated character onto `pid`'s keyboard ring
/// buffer. No-op if the buffer is full (`spec.md` §4.10: overflow drops
/// the newest key).
pub fn push_key(pid: usize, c: u8) {
	let mut table = PROCESSES.lock();
	if let Some(process) = table.slots[pid].as_mut() {
		process.keyboard.push(c);
	}
}

/// Pops the oldest buffered character for `pid`, or `None` if empty.
pub fn pop_key(pid: usize) -> Option<u8> {
	let mut table = PROCESSES.lock();
	table.slots[pid].as_mut().and_then(|p| p.keyboard.pop())
}

/// Returns `(file_ptr, file_size)` of `pid`'s loaded program image.
pub fn image_of(pid: usize) -> Option<(*mut u8, usize)> {
	let table = PROCESSES.lock();
	table.slots[pid].as_ref().map(|p| (p.file_ptr, p.file_size))
}
