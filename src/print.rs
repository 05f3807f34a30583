//! Implementation of the printing/logging macros.
//!
//! Unlike the print macros from Rust's standard library, these log
//! information instead of only printing it. Printing can be silenced at
//! boot with the `-silent` command line argument, but logs remain in
//! memory (see [`crate::logger`]).

use crate::logger::LOGGER;
use core::fmt;

/// Prints/logs the given message.
///
/// This function is meant to be used through the [`print!`] and
/// [`println!`] macros only.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
	let mut logger = LOGGER.lock();
	fmt::write(&mut *logger, args).ok();
}

/// Prints the given formatted string with the given values.
#[macro_export]
macro_rules! print {
	($($arg:tt)*) => {{
		$crate::print::_print(format_args!($($arg)*));
	}};
}

/// Same as [`crate::print!`], except it appends a newline at the end.
#[macro_export]
macro_rules! println {
	() => ($crate::print!("\n"));
	($($arg:tt)*) => {{
		$crate::print::_print(format_args!("{}\n", format_args!($($arg)*)));
	}};
}
