//! Under the x86 architecture, the GDT (Global Descriptor Table) is a table
//! of structures that describes the segments of memory.
//!
//! It is a deprecated structure that still must be used in order to switch
//! to protected mode, handle protection rings, and load the Task State
//! Segment (TSS). `spec.md` §6 fixes the layout: six 8-byte descriptors —
//! null, kernel code (access `0x9a`), kernel data (`0x92`), user code
//! (`0xfa`), user data (`0xf2`), TSS (`0xe9`) — at selectors
//! `0x08`/`0x10`/`0x18`/`0x20`/`0x28`.

use core::arch::asm;
use core::mem::size_of;

/// Selector of the kernel code segment.
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;
/// Selector of the kernel data segment.
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;
/// Selector of the user code segment. The RPL (ring 3) must be OR'd in by
/// the caller, matching the original's `USER_CODE_SELECTOR | 0x3` use.
pub const USER_CODE_SELECTOR: u16 = 0x18;
/// Selector of the user data segment.
pub const USER_DATA_SELECTOR: u16 = 0x20;
/// Selector of the TSS descriptor.
pub const TSS_SELECTOR: u16 = 0x28;

const ENTRY_COUNT: usize = 6;

/// Structure representing a raw GDT entry.
#[repr(transparent)]
#[derive(Clone, Copy, Default)]
struct Entry(u64);

impl Entry {
	/// Encodes a segment descriptor the way `gdt_encode_entry` in the
	/// original does: `base`/`limit` split across the packed fields,
	/// `access` as given, granularity always 4KiB-page/32-bit (`0xc0`
	/// OR'd into the high limit nibble).
	const fn new(base: u32, limit: u32, access: u8) -> Self {
		let low = (limit & 0xffff) as u64
			| ((base as u64 & 0xffffff) << 16)
			| ((access as u64) << 40)
			| ((((limit >> 16) & 0xf) as u64 | 0xc0) << 48)
			| (((base >> 24) as u64 & 0xff) << 56);
		Self(low)
	}
}

#[repr(C, packed)]
struct DescriptorTablePointer {
	limit: u16,
	base: u32,
}

static mut GDT: [Entry; ENTRY_COUNT] = [Entry(0); ENTRY_COUNT];

/// The Task State Segment. Only `ss0`/`esp0` are meaningful on this kernel:
/// they are what the CPU loads automatically on a ring3->ring0 privilege
/// change (an interrupt or `int 0x80` from user mode), giving the kernel a
/// known-good stack without having to save/restore `esp` by hand.
#[repr(C, packed)]
pub struct Tss {
	pub prev_tss: u32,
	pub esp0: u32,
	pub ss0: u32,
	_reserved: [u32; 23],
	pub iomap_base: u16,
}

impl Tss {
	const fn new() -> Self {
		Self {
			prev_tss: 0,
			esp0: 0,
			ss0: 0,
			_reserved: [0; 23],
			iomap_base: size_of::<Tss>() as u16,
		}
	}
}

static mut TSS: Tss = Tss::new();

/// Initializes the GDT entries and the TSS descriptor, then loads the GDT
/// with `lgdt` and the task register with `ltr`.
///
/// Per `spec.md` §4.11, this must run before the kernel ever performs a
/// ring transition (the first `iret` to ring 3 at the end of boot).
pub fn init() {
	unsafe {
		GDT[0] = Entry::new(0, 0, 0);
		GDT[1] = Entry::new(0, 0xfffff, 0x9a); // kernel code
		GDT[2] = Entry::new(0, 0xfffff, 0x92); // kernel data
		GDT[3] = Entry::new(0, 0xfffff, 0xfa); // user code, ring 3
		GDT[4] = Entry::new(0, 0xfffff, 0xf2); // user data, ring 3

		let tss_base = core::ptr::addr_of!(TSS) as u32;
		let tss_limit = (size_of::<Tss>() - 1) as u32;
		GDT[5] = Entry::new(tss_base, tss_limit, 0xe9); // TSS, ring 3 accessible

		let ptr = DescriptorTablePointer {
			limit: (size_of::<[Entry; ENTRY_COUNT]>() - 1) as u16,
			base: core::ptr::addr_of!(GDT) as u32,
		};
		asm!("lgdt [{0}]", in(reg) &ptr, options(readonly, nostack));

		asm!(
			"mov ax, {sel:x}",
			"ltr ax",
			sel = in(reg) TSS_SELECTOR,
			out("ax") _,
		);
	}
}

/// Sets the kernel stack the CPU switches to on a ring3->ring0 transition.
pub fn set_kernel_stack(esp0: u32) {
	unsafe {
		TSS.esp0 = esp0;
		TSS.ss0 = KERNEL_DATA_SELECTOR as u32;
	}
}

/// Creates a ring-3 selector by OR-ing in RPL 3, matching
/// `USER_CODE_SELECTOR | RPL3` / `USER_DATA_SELECTOR | RPL3` from `spec.md`
/// §4.9.
#[inline(always)]
pub const fn ring3(selector: u16) -> u16 {
	selector | 3
}
