//! The classic PS/2 (i8042) keyboard driver.
//!
//! Ported from the original `classic.c`: enables the first PS/2 port,
//! then on every IRQ1 reads one scancode from the data port, drops the
//! high bit (key-release events, which this driver ignores), and looks
//! the result up in the scancode-set-1 table.

use crate::idt;
use crate::idt::pic;
use crate::io;

const DATA_PORT: u16 = 0x60;
const COMMAND_PORT: u16 = 0x64;
const ENABLE_FIRST_PORT: u8 = 0xae;

const KEY_RELEASED: u8 = 0x80;

/// Scancode-set-1 mapping, index = scancode. `0x00` marks an unmapped key.
const SCANCODE_SET_1: [u8; 83] = [
	0x00, 0x1b, b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'-', b'=', 0x08, b'\t',
	b'Q', b'W', b'E', b'R', b'T', b'Y', b'U', b'I', b'O', b'P', b'[', b']', 0x0d, 0x00, b'A', b'S',
	b'D', b'F', b'G', b'H', b'J', b'K', b'L', b';', b'\'', b'`', 0x00, b'\\', b'Z', b'X', b'C', b'V',
	b'B', b'N', b'M', b',', b'.', b'/', 0x00, b'*', 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
	0x00, 0x00, 0x00, 0x00, 0x00, b'7', b'8', b'9', b'-', b'4', b'5', b'6', b'+', b'1', b'2', b'3',
	b'0', b'.',
];

fn scancode_to_ascii(scancode: u8) -> u8 {
	SCANCODE_SET_1.get(scancode as usize).copied().unwrap_or(0)
}

const IRQ1_VECTOR: u8 = pic::MASTER_OFFSET + 1;

/// Enables the first PS/2 port and registers the IRQ1 handler
/// (`spec.md` §4.11's "initialize keyboard" boot step).
pub fn init() {
	unsafe {
		io::outb(COMMAND_PORT, ENABLE_FIRST_PORT);
	}
	idt::register_handler(IRQ1_VECTOR, handle_interrupt);
}

fn handle_interrupt(_frame: &mut idt::TrapFrame) {
	let scancode = unsafe { io::inb(DATA_PORT) };
	if scancode & KEY_RELEASED != 0 {
		return;
	}

	let c = scancode_to_ascii(scancode);
	if c != 0 {
		super::push_for_current(c);
	}
}
