//! List the source files that an ELF binary was built from, using its DWARF
//! debugging information.
//!
//! Every compilation unit in `.debug_info` refers to a line number program in
//! `.debug_line`. The header of that program holds the unit's directory and
//! file tables. This crate reads those tables for every unit and returns the
//! file names as one sorted list without duplicates.
//!
//! * **Zero-copy:** sections are memory mapped and strings are borrowed from
//!   the mapping until they are returned.
//!
//! * **Header only:** the line number programs themselves (the address to
//!   line mapping) are never executed.
//!
//! * **DWARF 2 to 5:** both 32- and 64-bit DWARF, in little or big endian
//!   containers.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! let files = dwsrc::source_files("/usr/local/bin/server")?;
//! for file in files {
//!     println!("{}", file);
//! }
//! # Ok::<(), dwsrc::ExtractError>(())
//! ```
//!
//! ## API Structure
//!
//! * [`source_files`], [`source_files_with`] and [`source_files_from_bytes`]
//!   run the whole pipeline and return `Result<Vec<String>, ExtractError>`.
//!
//! * The [`container`] module maps files and finds sections.
//!
//! * The [`read`] module decodes the DWARF sections. It can be used on its own
//!   with any object file loader.
//!
//! * The [`files`] module aggregates names across units.
//!
//! ## Cargo Features
//!
//! * `fallible-iterator` (default): implement `FallibleIterator` for the unit
//!   header iterator.
//!
//! * `parallel`: decode units on a `rayon` thread pool when
//!   [`ExtractOptions::parallel`] is set.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![warn(elided_lifetimes_in_paths)]
// False positives with `fallible_iterator`.
#![allow(clippy::should_implement_trait)]

mod common;
pub use crate::common::*;

pub mod constants;
pub use crate::constants::*;

mod endianity;
pub use crate::endianity::*;

pub mod leb128;

pub mod read;

pub mod container;
pub use crate::container::{Container, ContainerError, ContainerFile};

pub mod files;
pub use crate::files::{aggregate, FileSet};

mod extract;
pub use crate::extract::{
    source_files, source_files_from_bytes, source_files_with, ExtractError, ExtractOptions,
};

#[cfg(test)]
mod test_util;
