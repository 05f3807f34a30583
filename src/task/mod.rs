//! Task control blocks and the task list.
//!
//! A task owns a [`PagingChunk`] and a saved register snapshot; tasks are
//! linked in insertion order with a `current` cursor, per `spec.md` §3 and
//! §9's "prefer a slot array indexed by small integer ids" guidance — the
//! list lives in a fixed `[Option<Task>; MAX_PROCESSES]` array rather than
//! an intrusive pointer-linked structure, with `prev`/`next` stored as
//! indices into that array.
//!
//! This design implements exactly one task per process (`spec.md` §4.9
//! does not describe threads), so the task table is sized to
//! [`config::MAX_PROCESSES`] and a task's slot index doubles as its pid.

pub mod process;

use crate::config;
use crate::error::{KernelError, KernelResult};
use crate::idt::TrapFrame;
use crate::memory::heap;
use crate::memory::paging::{self, PagingChunk, PRESENT, USER, WRITABLE};
use crate::util::lock::IntMutex;
use core::arch::asm;

/// The subset of CPU state a task carries across interrupts, matching the
/// field order `pusha` plus the CPU's own ring-crossing pushes produce
/// (`spec.md` §3).
#[derive(Clone, Copy, Default)]
pub struct Registers {
	pub edi: u32,
	pub esi: u32,
	pub ebp: u32,
	pub ebx: u32,
	pub edx: u32,
	pub ecx: u32,
	pub eax: u32,
	pub eip: u32,
	pub cs: u32,
	pub eflags: u32,
	pub user_esp: u32,
	pub ss: u32,
}

/// A task control block.
pub struct Task {
	pub pid: usize,
	pub paging_chunk: PagingChunk,
	pub registers: Registers,
	pub process: usize,
	prev: Option<usize>,
	next: Option<usize>,
}

struct TaskList {
	slots: [Option<Task>; config::MAX_PROCESSES],
	head: Option<usize>,
	tail: Option<usize>,
	current: Option<usize>,
}

impl TaskList {
	const fn new() -> Self {
		const NONE: Option<Task> = None;
		Self {
			slots: [NONE; config::MAX_PROCESSES],
			head: None,
			tail: None,
			current: None,
		}
	}

	fn free_slot(&self) -> Option<usize> {
		self.slots.iter().position(Option::is_none)
	}
}

static TASKS: IntMutex<TaskList> = IntMutex::new(TaskList::new());

/// Creates a task for `process`, identity-... no: allocates a *fresh*
/// user-flagged paging chunk, seeds the entry point and stack pointer per
/// `spec.md` §4.9, links it at the list tail, and becomes `current` if the
/// list was empty. Returns the new task's slot index (its pid).
pub fn new(process: usize) -> KernelResult<usize> {
	let paging_chunk = PagingChunk::new(PRESENT | USER | WRITABLE)?;

	let mut registers = Registers::default();
	registers.eip = config::PROGRAM_VIRTUAL_ADDRESS as u32;
	registers.cs = config::USER_CODE_SELECTOR as u32;
	registers.ss = config::USER_DATA_SELECTOR as u32;
	registers.user_esp = config::PROGRAM_VIRTUAL_STACK_TOP as u32;

	let mut list = TASKS.lock();
	let pid = list.free_slot().ok_or(KernelError::Busy)?;

	let task = Task {
		pid,
		paging_chunk,
		registers,
		process,
		prev: list.tail,
		next: None,
	};

	if let Some(tail) = list.tail {
		list.slots[tail].as_mut().unwrap().next = Some(pid);
	} else {
		list.head = Some(pid);
		list.current = Some(pid);
	}
	list.tail = Some(pid);
	list.slots[pid] = Some(task);

	Ok(pid)
}

/// Returns the pid of the currently running task.
pub fn current() -> Option<usize> {
	TASKS.lock().current
}

/// Loads `pid`'s paging chunk into CR3 and makes it current.
pub fn switch(pid: usize) -> KernelResult<()> {
	let list = TASKS.lock();
	let task = list.slots[pid].as_ref().ok_or(KernelError::Fault)?;
	task.paging_chunk.switch();
	drop(list);
	TASKS.lock().current = Some(pid);
	Ok(())
}

/// Restores the fixed user data segment selector into `ds/es/fs/gs`, the
/// same constant for every task (`spec.md` §4.9: "fixed as
/// USER_DATA_SELECTOR"), not the task's own saved `ss`.
fn restore_user_data_segment() {
	unsafe {
		asm!(
			"mov ds, {sel:x}",
			"mov es, {sel:x}",
			"mov fs, {sel:x}",
			"mov gs, {sel:x}",
			sel = in(reg) config::USER_DATA_SELECTOR as u32,
			options(nostack),
		);
	}
}

/// Switches to the current task's own paging chunk. Called after a trap
/// handler body has finished touching kernel state, restoring the
/// kernel↔user round trip invariant (`spec.md` §5).
pub fn page_current() {
	restore_user_data_segment();
	let pid = current().expect("no current task to page back to");
	switch(pid).expect("current task vanished from the task list");
}

/// Switches to `pid`'s paging chunk without changing which task is
/// current. Used by [`get_stack_item`] and [`copy_string_from_task`] to
/// briefly look into a task's user address space.
fn page_task(pid: usize) -> KernelResult<()> {
	restore_user_data_segment();
	switch(pid)
}

/// Switches to the kernel's own paging chunk (`spec.md` §5: every trap
/// handler runs with kernel paging active).
pub fn kernel_page() {
	paging::switch_to_kernel();
}

/// Copies the current task's register snapshot out of a trap frame
/// (`spec.md` §4.7: "register save precedes handler invocation").
pub fn save_current_state(frame: &TrapFrame) {
	let Some(pid) = current() else { return };
	let mut list = TASKS.lock();
	if let Some(task) = list.slots[pid].as_mut() {
		task.registers = frame.registers();
	}
}

/// Reads the `index`-th word above the task's saved user stack pointer by
/// briefly switching to its paging, per `spec.md` §4.8: syscall arguments
/// are pushed on the user stack in right-to-left order and read back by
/// index.
pub fn get_stack_item(pid: usize, index: usize) -> KernelResult<u32> {
	let stack_base = {
		let list = TASKS.lock();
		let task = list.slots[pid].as_ref().ok_or(KernelError::Fault)?;
		task.registers.user_esp as *const u32
	};

	page_task(pid)?;
	let value = unsafe { stack_base.add(index).read_volatile() };
	kernel_page();
	Ok(value)
}

/// Maps a freshly loaded program image and its kernel-allocated stack into
/// `pid`'s address space at the fixed program addresses (`spec.md` §4.9).
/// The stack grows down, so the mapping spans
/// `[PROGRAM_VIRTUAL_STACK_BOTTOM, PROGRAM_VIRTUAL_STACK_TOP)` even though
/// the initial `esp` is seeded (in [`new`]) at the top of that range.
pub fn map_program(pid: usize, image: *mut u8, image_len: usize, stack: *mut u8) -> KernelResult<()> {
	let mut list = TASKS.lock();
	let task = list.slots[pid].as_mut().ok_or(KernelError::Fault)?;
	task.paging_chunk.map_virtual_range(
		config::PROGRAM_VIRTUAL_ADDRESS,
		image as usize,
		image_len,
		PRESENT | USER | WRITABLE,
	)?;
	task.paging_chunk.map_virtual_range(
		config::PROGRAM_VIRTUAL_STACK_BOTTOM,
		stack as usize,
		config::PROGRAM_STACK_SIZE,
		PRESENT | USER | WRITABLE,
	)?;
	Ok(())
}

/// Guards a temporary re-mapping of one virtual page inside a task's
/// paging chunk, restoring the original leaf entry on drop so the restore
/// runs even if the body above it returns early (`spec.md` §9: "wrap it in
/// a scope guard so the restore always runs").
struct AliasGuard {
	pid: usize,
	virt: usize,
	original: u32,
}

impl Drop for AliasGuard {
	fn drop(&mut self) {
		let mut list = TASKS.lock();
		if let Some(task) = list.slots[self.pid].as_mut() {
			let _ = task.paging_chunk.map_virtual(self.virt, self.original);
		}
	}
}

/// Copies a NUL-terminated, `max_length`-bounded string out of `pid`'s
/// address space at `src_virt` into `dest`, by aliasing a kernel buffer
/// into the task's own chunk, flipping to user paging to read through it,
/// then flipping back (`spec.md` §9).
pub fn copy_string_from_task(pid: usize, src_virt: usize, dest: &mut [u8]) -> KernelResult<usize> {
	if dest.is_empty() {
		return Err(KernelError::InvalidArgument);
	}

	let buffer = heap::zmalloc(dest.len())?;
	let buffer_virt = buffer as usize;

	let mut list = TASKS.lock();
	let task = list.slots[pid].as_mut().ok_or(KernelError::Fault)?;
	let original = task.paging_chunk.get_entry(buffer_virt);
	if original == 0 {
		let _ = heap::free(buffer);
		return Err(KernelError::NotFound);
	}

	task.paging_chunk
		.map_virtual(buffer_virt, buffer as u32 | PRESENT | USER | WRITABLE)?;
	drop(list);
	let guard = AliasGuard {
		pid,
		virt: buffer_virt,
		original,
	};

	page_task(pid)?;
	let len = unsafe { copy_nul_terminated(src_virt as *const u8, buffer, dest.len()) };
	kernel_page();

	drop(guard);

	unsafe {
		core::ptr::copy_nonoverlapping(buffer, dest.as_mut_ptr(), len);
	}
	let _ = heap::free(buffer);
	Ok(len)
}

unsafe fn copy_nul_terminated(src: *const u8, dest: *mut u8, max: usize) -> usize {
	let mut i = 0;
	while i < max {
		let b = src.add(i).read_volatile();
		dest.add(i).write_volatile(b);
		if b == 0 {
			break;
		}
		i += 1;
	}
	i
}

/// Asserts the task list is non-empty, makes the head task current,
/// switches to its paging chunk, and tail-jumps into ring 3
/// (`spec.md` §4.9's "first-ever run").
pub fn run_first_ever_task() -> ! {
	let pid = {
		let list = TASKS.lock();
		list.head.expect("no tasks available to run")
	};
	switch(pid).expect("head task has no valid paging chunk");

	let registers = {
		let list = TASKS.lock();
		list.slots[pid].as_ref().unwrap().registers
	};
	unsafe {
		return_to_user_mode(&registers);
	}
}

/// Restores the user data segment, pushes `ss, user_esp, eflags, cs, eip`
/// in IRET order, and executes `iretd` (`spec.md` §4.9).
unsafe fn return_to_user_mode(regs: &Registers) -> ! {
	restore_user_data_segment();
	asm!(
		"push {ss:e}",
		"push {esp:e}",
		"push {eflags:e}",
		"push {cs:e}",
		"push {eip:e}",
		"iretd",
		ss = in(reg) regs.ss,
		esp = in(reg) regs.user_esp,
		eflags = in(reg) regs.eflags,
		cs = in(reg) regs.cs,
		eip = in(reg) regs.eip,
		options(noreturn),
	);
}
