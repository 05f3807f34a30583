//! Kernel crate root: module wiring and the boot sequence.
//!
//! No bootloader-supplied boot-information structure is consulted here —
//! unlike the Multiboot2 handoff this kernel's ancestor expected, this
//! design's bootloader jumps straight into `kernel_main` with the CPU
//! already in protected mode and nothing else guaranteed (`spec.md` §6).

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![deny(warnings)]
#![allow(dead_code)]
#![test_runner(crate::selftest::runner)]
#![reexport_test_harness_main = "test_main"]

#[macro_use]
mod panic;
#[macro_use]
mod print;

mod cmdline;
mod config;
mod device;
mod error;
mod file;
mod gdt;
mod idt;
mod io;
mod logger;
mod memory;
mod selftest;
mod syscall;
mod task;
mod util;
mod vga;

const KERNEL_VERSION: &str = "1.0";

/// The kernel's entry point. `cmdline_ptr`/`cmdline_len` describe the boot
/// command line this kernel's bootloader places in memory before jumping
/// here; pass `cmdline_len == 0` if the bootloader supplies none.
///
/// Runs the one correct boot order (`spec.md` §4.11): clear the screen,
/// program and load the GDT, initialize the heap, program the IDT and
/// enable interrupts, initialize the file-system registry, probe the
/// disk, configure and load the TSS, construct and switch to the kernel
/// paging chunk and enable paging, register the ISR-0x80 commands,
/// initialize the keyboard, load the first user process, and jump to
/// user mode.
#[no_mangle]
pub extern "C" fn kernel_main(cmdline_ptr: *const u8, cmdline_len: usize) -> ! {
	vga::CONSOLE.lock().clear();

	let raw_cmdline = if cmdline_ptr.is_null() {
		&[][..]
	} else {
		unsafe { core::slice::from_raw_parts(cmdline_ptr, cmdline_len) }
	};
	let args = cmdline::ArgsParser::parse(raw_cmdline).unwrap_or_else(|e| {
		println!("{e}");
		cmdline::ArgsParser::parse(b"").unwrap()
	});
	logger::init(args.is_silent());

	println!("Welcome to the kernel, version {KERNEL_VERSION}.");

	gdt::init();
	memory::heap::init();

	idt::init();
	idt::enable();

	file::init();
	device::storage::init();

	gdt::set_kernel_stack(memory::heap::KERNEL_STACK_TOP as u32);

	let kernel_chunk = memory::paging::PagingChunk::new(
		memory::paging::PRESENT | memory::paging::WRITABLE | memory::paging::USER,
	)
	.unwrap_or_else(|e| kernel_panic!("failed to build the kernel paging chunk: {e}"));
	kernel_chunk.switch();
	memory::paging::set_kernel_chunk(&kernel_chunk);
	memory::paging::enable();

	syscall::init();
	device::keyboard::init();

	let mut path_buf = *b"0:/programs/blank.bin";
	path_buf[0] = b'0' + args.root_drive();
	let path = core::str::from_utf8(&path_buf).expect("boot path is pure ASCII by construction");

	println!("Loading user program '{path}'...");
	match task::process::load(path) {
		Ok(pid) => println!("User program loaded successfully with pid {pid}."),
		Err(e) => kernel_panic!("failed to load the first user program: {e}"),
	}

	task::run_first_ever_task();
}

