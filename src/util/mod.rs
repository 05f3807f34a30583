//! Small utilities shared across kernel modules.

pub mod lock;

use core::fmt;

/// Wraps a byte slice to display it as a lossy ASCII string, used to render
/// non-UTF8 kernel-internal byte buffers (command line, 8.3 filenames) in
/// log output without pulling in an allocator-backed `String`.
pub struct DisplayableStr<'s>(pub &'s [u8]);

impl fmt::Display for DisplayableStr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for b in self.0 {
			let c = *b as char;
			if c.is_ascii_graphic() || c == ' ' {
				write!(f, "{c}")?;
			} else {
				write!(f, "\u{fffd}")?;
			}
		}
		Ok(())
	}
}
