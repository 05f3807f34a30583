//! The keyboard subsystem: a per-process ring buffer fed by whichever
//! driver is registered, and `GET_KEYBOARD_CHAR`'s non-blocking read
//! (`spec.md` §5: "keyboard reads return immediately with `'\0'` when
//! empty").
//!
//! Only one driver exists (PS/2), but the registration point mirrors the
//! file-system registry's shape in case a second ever needs to probe
//! alongside it.

pub mod ps2;

use crate::config;

/// A fixed-capacity FIFO of undelivered keystrokes, one per process
/// (`spec.md` §3's process layout: `keyboard ring {buffer[N], head, tail}`).
/// Pushing into a full ring is a no-op (`spec.md` §8): the newest key is
/// dropped, not the oldest.
pub struct RingBuffer {
	buffer: [u8; config::KEYBOARD_BUFFER_SIZE],
	head: usize,
	tail: usize,
	len: usize,
}

impl RingBuffer {
	pub const fn new() -> Self {
		Self {
			buffer: [0; config::KEYBOARD_BUFFER_SIZE],
			head: 0,
			tail: 0,
			len: 0,
		}
	}

	/// Pushes `c` onto the tail. No-op if the ring is already full.
	pub fn push(&mut self, c: u8) {
		if self.len == self.buffer.len() {
			return;
		}
		self.buffer[self.tail] = c;
		self.tail = (self.tail + 1) % self.buffer.len();
		self.len += 1;
	}

	/// Pops the oldest character, or `None` if the ring is empty.
	pub fn pop(&mut self) -> Option<u8> {
		if self.len == 0 {
			return None;
		}
		let c = self.buffer[self.head];
		self.head = (self.head + 1) % self.buffer.len();
		self.len -= 1;
		Some(c)
	}
}

/// Initializes whichever keyboard driver this kernel carries
/// (`spec.md` §4.11's boot order: keyboard init follows ISR-0x80
/// registration, before the first process loads).
pub fn init() {
	ps2::init();
}

/// Delivers a decoded character to the currently running process's ring
/// buffer. Called by a driver's IRQ handler after scancode translation.
pub fn push_for_current(c: u8) {
	if let Some(pid) = crate::task::current() {
		crate::task::process::push_key(pid, c);
	}
}

/// Pops the current process's oldest buffered character, or `'\0'` if
/// empty — the exact `GET_KEYBOARD_CHAR` contract (`spec.md` §4.8).
pub fn pop_for_current() -> u8 {
	crate::task::current()
		.and_then(crate::task::process::pop_key)
		.unwrap_or(0)
}
