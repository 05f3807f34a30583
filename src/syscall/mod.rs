//! ISR-0x80: the system-call dispatcher (`spec.md` §4.8).
//!
//! A separate Rust-side trampoline from the generic IRQ path
//! ([`crate::idt::general_handler_trampoline`]): the command number comes
//! from the user's `eax` at the time of the trap, not the vector, and
//! arguments are read off the user stack by index rather than passed in
//! registers.

use crate::config::ISR80H_MAX_COMMANDS;
use crate::device::keyboard;
use crate::idt::TrapFrame;
use crate::task;
use crate::util::lock::IntMutex;

type Handler = fn(pid: usize) -> u32;

static HANDLERS: IntMutex<[Option<Handler>; ISR80H_MAX_COMMANDS]> =
	IntMutex::new([None; ISR80H_MAX_COMMANDS]);

const SUM: usize = 0;
const PRINT: usize = 1;
const GET_KEYBOARD_CHAR: usize = 2;
const PUT_CHAR: usize = 3;

fn sum(pid: usize) -> u32 {
	let a = task::get_stack_item(pid, 0).unwrap_or(0);
	let b = task::get_stack_item(pid, 1).unwrap_or(0);
	a.wrapping_add(b)
}

/// Copies a NUL-terminated, bounded string out of the caller and prints
/// it (`spec.md` §4.8: `PRINT(str)` "copies and prints a bounded
/// string").
fn print(pid: usize) -> u32 {
	const MAX_LEN: usize = 256;
	let Ok(src_virt) = task::get_stack_item(pid, 0) else {
		return 0;
	};

	let mut buf = [0u8; MAX_LEN];
	let Ok(len) = task::copy_string_from_task(pid, src_virt as usize, &mut buf) else {
		return 0;
	};

	if let Ok(s) = core::str::from_utf8(&buf[..len]) {
		crate::print!("{s}");
	}
	0
}

fn get_keyboard_char(_pid: usize) -> u32 {
	keyboard::pop_for_current() as u32
}

fn put_char(pid: usize) -> u32 {
	let c = task::get_stack_item(pid, 0).unwrap_or(0) as u8 as char;
	crate::print!("{c}");
	0
}

/// Installs the fixed command table (`spec.md` §4.8: `SUM`, `PRINT`,
/// `GET_KEYBOARD_CHAR`, `PUT_CHAR`). Called once during boot, after the
/// IDT and before the keyboard driver (`spec.md` §4.11).
pub fn init() {
	let mut handlers = HANDLERS.lock();
	handlers[SUM] = Some(sum);
	handlers[PRINT] = Some(print);
	handlers[GET_KEYBOARD_CHAR] = Some(get_keyboard_char);
	handlers[PUT_CHAR] = Some(put_char);
}

/// The syscall-path Rust trampoline (`spec.md` §4.7): switches to kernel
/// paging, saves the caller's registers, dispatches on the command number
/// in the saved `eax`, then restores the caller's paging before
/// returning. Every unimplemented command returns `0` (`spec.md` §4.8).
#[no_mangle]
pub extern "C" fn isr80h_entry_trampoline(_vector: u32, frame: *mut TrapFrame) -> u32 {
	task::kernel_page();
	task::save_current_state(unsafe { &*frame });

	let cmd = unsafe { (*frame).eax } as usize;
	let pid = task::current().expect("syscall trap with no current task");

	let result = if cmd < ISR80H_MAX_COMMANDS {
		HANDLERS.lock()[cmd].map(|h| h(pid)).unwrap_or(0)
	} else {
		0
	};

	task::page_current();
	result
}
