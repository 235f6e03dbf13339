//! Read DWARF debugging information.
//!
//! Only the parts of DWARF that are needed to recover the source file table of
//! each compilation unit are decoded: unit headers, abbreviations, entries,
//! string sections and the header of the line number program.
//!
//! ## Example Usage
//!
//! Print the file names of every unit's line program:
//!
//! ```rust,no_run
//! # fn example() -> Result<(), dwsrc::read::Error> {
//! # type R = dwsrc::read::EndianSlice<'static, dwsrc::LittleEndian>;
//! # let get_file_section_reader = |name| -> Result<R, dwsrc::read::Error> { unimplemented!() };
//! // Read the DWARF sections with whatever object loader you're using.
//! let loader = |section: dwsrc::SectionId| get_file_section_reader(section.name());
//! let dwarf = dwsrc::read::Dwarf::load(loader)?;
//!
//! let mut iter = dwarf.units();
//! while let Some(header) = iter.next()? {
//!     let unit = dwarf.unit(header)?;
//!     if let Some(offset) = unit.line_program_offset {
//!         let program = dwarf.line_program(&unit, offset)?;
//!         for file in program.file_names() {
//!             let name = dwarf.attr_string(&unit, file.path_name())?;
//!             println!("{}", name.to_string_lossy());
//!         }
//!     }
//! }
//! # unreachable!()
//! # }
//! ```
//!
//! ## API Structure
//!
//! * The [`Dwarf`](./struct.Dwarf.html) type contains the sections this crate
//!   reads, and has the methods that need more than one of them.
//!
//! * Each section gets its own type: [`DebugAbbrev`](./struct.DebugAbbrev.html),
//!   [`DebugInfo`](./struct.DebugInfo.html), [`DebugLine`](./struct.DebugLine.html),
//!   [`DebugLineStr`](./struct.DebugLineStr.html), [`DebugStr`](./struct.DebugStr.html)
//!   and [`DebugStrOffsets`](./struct.DebugStrOffsets.html).
//!
//! * Offsets into a section are strongly typed: an offset into `.debug_info` is
//!   the [`DebugInfoOffset`](../struct.DebugInfoOffset.html) type. It cannot be
//!   used to index into the [`DebugLine`](./struct.DebugLine.html) type because
//!   `DebugLine` represents the `.debug_line` section.
//!
//! ## Using with `FallibleIterator`
//!
//! `UnitHeadersIter` has an inherent `next` method returning
//! `Result<Option<_>>`. With the default `fallible-iterator` feature it also
//! implements `fallible_iterator::FallibleIterator`, so the usual
//! combinators (`map`, `filter`, `collect`, ...) are available.

use core::fmt;
use core::result;
use std::error;

use crate::common::SectionId;
use crate::constants;

mod abbrev;
pub use self::abbrev::*;

mod dwarf;
pub use self::dwarf::*;

mod endian_slice;
pub use self::endian_slice::*;

mod line;
pub use self::line::*;

mod reader;
pub(crate) use self::reader::u64_to_offset;
pub use self::reader::Reader;

mod str;
pub use self::str::*;

/// An offset into the current compilation or type unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct UnitOffset(pub usize);

mod unit;
pub use self::unit::*;

/// A decoding failure.
///
/// Variants name the structure that was wrong, and carry the offending value
/// where there is one. Offsets of the enclosing unit or table are added by
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An unsigned LEB128 value does not fit in 64 bits.
    BadUnsignedLeb128,
    /// A signed LEB128 value does not fit in 64 bits.
    BadSignedLeb128,
    /// An abbreviation has tag 0.
    AbbreviationTagZero,
    /// An attribute spec has name 0 but a non-zero form.
    AttributeNameZero,
    /// An attribute spec has form 0 but a non-zero name.
    AttributeFormZero,
    /// The has-children byte of an abbreviation is neither 0 nor 1.
    InvalidAbbreviationChildren(constants::DwChildren),
    /// A `DW_FORM_*` value this reader does not know.
    UnknownForm(constants::DwForm),
    /// Two abbreviations in one table share a code.
    DuplicateAbbreviationCode(u64),
    /// An initial length in the reserved range `0xffff_fff0..0xffff_ffff`.
    UnknownReservedLength(u32),
    /// A unit or line program version outside 2..=5.
    UnknownVersion(u64),
    /// A version 5 unit type this reader does not know.
    UnknownUnitType(constants::DwUt),
    /// An entry uses a code that its unit's abbreviation table lacks.
    InvalidAbbreviationCode(u64),
    /// A read ran past the end of the section, unit or header.
    UnexpectedEof,
    /// An address size other than 1, 2, 4 or 8.
    UnsupportedAddressSize(u8),
    /// An offset size other than 1, 2, 4 or 8.
    UnsupportedOffsetSize(u8),
    /// A line program with a non-zero segment selector size.
    UnsupportedSegmentSize(u8),
    /// A line program with zero maximum operations per instruction.
    MaximumOperationsPerInstructionZero,
    /// A line program with a zero line range.
    LineRangeZero,
    /// A line program with a zero opcode base.
    OpcodeBaseZero,
    /// An offset that does not fit in `usize`.
    UnsupportedOffset,
    /// An offset past the end of its section.
    OffsetOutOfBounds(u64),
    /// `DW_FORM_indirect` resolved to `DW_FORM_implicit_const`.
    InvalidImplicitConst,
    /// A line program file entry format without a `DW_LNCT_path`, or with
    /// more than one.
    MissingFileEntryFormatPath,
    /// A line program's `header_length` disagrees with its tables.
    HeaderLengthMismatch {
        /// The declared length.
        expected: u64,
        /// The length of the fields as read.
        found: u64,
    },
    /// A file entry's directory index is past the end of the directory table.
    InvalidDirectoryIndex {
        /// The index in the file entry.
        index: u64,
        /// The number of directories, counting the implicit one before
        /// version 5.
        count: u64,
    },
    /// An attribute that should name a string has a non-string form.
    ExpectedStringAttributeValue,
    /// A string lives in a supplementary object file.
    MissingSupplementaryFile,
    /// A unit with no entries at all.
    MissingUnitDie,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::BadUnsignedLeb128 => f.write_str("unsigned LEB128 overflow"),
            Error::BadSignedLeb128 => f.write_str("signed LEB128 overflow"),
            Error::AbbreviationTagZero => f.write_str("abbreviation with tag 0"),
            Error::AttributeNameZero => f.write_str("attribute spec with name 0"),
            Error::AttributeFormZero => f.write_str("attribute spec with form 0"),
            Error::InvalidAbbreviationChildren(val) => {
                write!(f, "bad has-children byte 0x{:x}", val.0)
            }
            Error::UnknownForm(val) => write!(f, "unknown attribute form: 0x{:x}", val.0),
            Error::DuplicateAbbreviationCode(code) => {
                write!(f, "abbreviation code {code} defined twice")
            }
            Error::UnknownReservedLength(val) => write!(f, "reserved initial length 0x{val:x}"),
            Error::UnknownVersion(version) => write!(f, "unknown DWARF version: {version}"),
            Error::UnknownUnitType(val) => write!(f, "unknown unit type 0x{:x}", val.0),
            Error::InvalidAbbreviationCode(code) => {
                write!(f, "undefined abbreviation code {code}")
            }
            Error::UnexpectedEof => f.write_str("unexpected end of input"),
            Error::UnsupportedAddressSize(size) => write!(f, "address size {size}"),
            Error::UnsupportedOffsetSize(size) => write!(f, "offset size {size}"),
            Error::UnsupportedSegmentSize(size) => write!(f, "segment selector size {size}"),
            Error::MaximumOperationsPerInstructionZero => {
                f.write_str("zero maximum operations per instruction")
            }
            Error::LineRangeZero => f.write_str("zero line range"),
            Error::OpcodeBaseZero => f.write_str("zero opcode base"),
            Error::UnsupportedOffset => f.write_str("offset overflows usize"),
            Error::OffsetOutOfBounds(val) => write!(f, "offset 0x{val:x} past end of section"),
            Error::InvalidImplicitConst => f.write_str("indirect DW_FORM_implicit_const"),
            Error::MissingFileEntryFormatPath => {
                f.write_str("file entry format needs exactly one DW_LNCT_path")
            }
            Error::HeaderLengthMismatch { expected, found } => write!(
                f,
                "line program header length mismatch: expected {expected} bytes, found {found}"
            ),
            Error::InvalidDirectoryIndex { index, count } => write!(
                f,
                "invalid directory index {index}: directory table has {count} entries"
            ),
            Error::ExpectedStringAttributeValue => f.write_str("attribute is not a string"),
            Error::MissingSupplementaryFile => f.write_str("string in supplementary file"),
            Error::MissingUnitDie => f.write_str("unit has no entries"),
        }
    }
}

impl error::Error for Error {}

/// The result of a parse.
pub type Result<T> = result::Result<T, Error>;

/// A convenience trait for loading DWARF sections from object files.  To be
/// used like:
///
/// ```
/// use dwsrc::read::{DebugInfo, EndianSlice, Section};
/// use dwsrc::LittleEndian;
///
/// let buf = [0x00, 0x01, 0x02, 0x03];
/// let reader = EndianSlice::new(&buf, LittleEndian);
/// let loader = |name| -> Result<_, ()> { Ok(reader) };
///
/// let debug_info: DebugInfo<_> = Section::load(loader).unwrap();
/// ```
pub trait Section<R>: From<R> {
    /// Returns the section id for this type.
    fn id() -> SectionId;

    /// Returns the ELF section name for this type.
    fn section_name() -> &'static str {
        Self::id().name()
    }

    /// Try to load the section using the given loader function.
    fn load<F, E>(f: F) -> core::result::Result<Self, E>
    where
        F: FnOnce(SectionId) -> core::result::Result<R, E>,
    {
        f(Self::id()).map(From::from)
    }

    /// Returns the `Reader` for this section.
    fn reader(&self) -> &R
    where
        R: Reader;
}
