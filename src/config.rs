//! Kernel-wide configuration constants.
//!
//! These mirror the values a `config.h` would hold in the original C
//! sources this design is derived from: segment selectors, the program
//! load address and stack geometry, and the various fixed-size table
//! bounds the kernel is built around. Centralizing them here keeps every
//! module's "why 0x400000" answerable in one place.

use crate::gdt;

/// Virtual address every user program image is mapped at.
pub const PROGRAM_VIRTUAL_ADDRESS: usize = 0x0040_0000;

/// Size, in bytes, of a user program's stack.
pub const PROGRAM_STACK_SIZE: usize = 16 * 1024;

/// Top of a user program's stack (the initial `esp`); the stack grows down
/// from here.
pub const PROGRAM_VIRTUAL_STACK_TOP: usize = 0x003f_f000;

/// Bottom (lowest address) of a user program's stack mapping.
pub const PROGRAM_VIRTUAL_STACK_BOTTOM: usize = PROGRAM_VIRTUAL_STACK_TOP - PROGRAM_STACK_SIZE;

/// `cs` selector loaded into a fresh task, ring 3.
pub const USER_CODE_SELECTOR: u16 = gdt::ring3(gdt::USER_CODE_SELECTOR);
/// `ss` selector loaded into a fresh task, ring 3.
pub const USER_DATA_SELECTOR: u16 = gdt::ring3(gdt::USER_DATA_SELECTOR);

/// Maximum number of live processes (`spec.md` §3: `pid ∈ [0, MAX_PROCESSES)`).
pub const MAX_PROCESSES: usize = 12;

/// Per-process keyboard ring buffer capacity.
pub const KEYBOARD_BUFFER_SIZE: usize = 1024;

/// Maximum path components (`spec.md` §4.5/§6).
pub const MAX_PATH_COMPONENTS: usize = 32;
/// Maximum bytes in one path component (`spec.md` §4.5/§6).
pub const MAX_PATH_COMPONENT_LEN: usize = 64;

/// Size of the file-system registry (only FAT16 is installed, but the table
/// is sized for headroom the same way the descriptor table is).
pub const MAX_FILESYSTEMS: usize = 4;
/// Size of the file descriptor table.
pub const MAX_FILE_DESCRIPTORS: usize = 512;

/// Highest legal ISR-0x80 command number, exclusive (`spec.md` §4.8).
pub const ISR80H_MAX_COMMANDS: usize = 8;
