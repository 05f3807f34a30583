//! Hand-written assembly entry points for every IDT vector.
//!
//! x86 gives a handler no way to know which vector fired unless the stub
//! pushes it itself, so every vector needs its own tiny trampoline. Rather
//! than hand-writing 256 near-identical blocks, this uses GNU `as`'s
//! `.altmacro`/`.rept` to generate them, the assembler-level equivalent of
//! the per-vector stub tables hand-rolled NASM kernels use. `isr_stub_table`
//! is the resulting array of stub addresses, installed into the IDT by
//! [`super::init`].
//!
//! Every generic stub pushes the vector number then falls into
//! [`isr_common_stub`], which saves `pusha` plus the vector on the stack,
//! calls the Rust-side [`general_handler_trampoline`], restores, and
//! `iret`s. Vector `0x80` (the syscall gate) instead falls into
//! [`isr80h_common_stub`], a separate assembly entry point and a separate
//! Rust trampoline ([`isr80h_entry_trampoline`]) per `spec.md` §4.7/§4.8:
//! the syscall path is a distinct dispatcher from the generic IRQ path, not
//! a special case inside it.

use core::arch::global_asm;

global_asm!(
	".intel_syntax noprefix",
	".altmacro",
	// Generic per-vector stub: push a dummy error code placeholder is not
	// needed here (CPU pushes its own for the few vectors that have one;
	// this kernel does not rely on it), just the vector number.
	".macro isr_stub_gen i",
	".global isr_stub_\\i",
	"isr_stub_\\i:",
	"    push \\i",
	"    jmp isr_common_stub",
	".endm",
	".set i, 0",
	".rept 128",
	"isr_stub_gen %i",
	".set i, i+1",
	".endr",
	// Vector 0x80 (128): the syscall gate, routed to its own trampoline.
	".global isr_stub_128",
	"isr_stub_128:",
	"    push 128",
	"    jmp isr80h_common_stub",
	".set i, 129",
	".rept 127",
	"isr_stub_gen %i",
	".set i, i+1",
	".endr",
	// Table of stub addresses, indexed by vector, consumed from Rust.
	".section .rodata",
	".global isr_stub_table",
	"isr_stub_table:",
	".set i, 0",
	".rept 256",
	".long isr_stub_%i",
	".set i, i+1",
	".endr",
	".text",
	"isr_common_stub:",
	"    pusha",
	"    mov eax, [esp+32]",
	"    push esp",
	"    push eax",
	"    call general_handler_trampoline",
	"    add esp, 8",
	"    popa",
	"    add esp, 4",
	"    iretd",
	"isr80h_common_stub:",
	"    pusha",
	"    mov eax, [esp+32]",
	"    push esp",
	"    push eax",
	"    call isr80h_entry_trampoline",
	// isr80h_entry_trampoline returns the syscall's result in eax. Overwrite
	// the `pusha`-saved eax slot with it so that `popa` below loads this
	// return value into eax instead of the user's original eax.
	"    mov [esp+36], eax",
	"    add esp, 8",
	"    popa",
	"    add esp, 4",
	"    iretd",
);

extern "C" {
	/// Address table of the 256 generated per-vector stubs, in vector order.
	pub static isr_stub_table: [u32; 256];
}
