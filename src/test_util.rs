#![allow(missing_docs)]

use std::io;

use test_assembler::{Label, Section};

use crate::common::Format;
use crate::leb128;

/// Helpers for assembling DWARF sections in tests.
pub trait DwarfSectionMethods: Sized {
    fn sleb(self, val: i64) -> Self;
    fn uleb(self, val: u64) -> Self;
    /// Emit a 32- or 64-bit initial length holding `length`, and mark the
    /// first byte it covers as `start`.
    fn initial_length(self, format: Format, length: &Label, start: &Label) -> Self;
    /// A 4 or 8 byte offset.
    fn word(self, size: u8, val: u64) -> Self;
    fn word_label(self, size: u8, val: &Label) -> Self;
    fn cstr(self, s: &str) -> Self;
}

fn encoded(write: impl FnOnce(&mut Vec<u8>) -> io::Result<usize>) -> Vec<u8> {
    let mut buf = Vec::new();
    let len = write(&mut buf).unwrap();
    assert_eq!(len, buf.len());
    buf
}

impl DwarfSectionMethods for Section {
    fn sleb(self, val: i64) -> Self {
        self.append_bytes(&encoded(|buf| leb128::write::signed(buf, val)))
    }

    fn uleb(self, val: u64) -> Self {
        self.append_bytes(&encoded(|buf| leb128::write::unsigned(buf, val)))
    }

    fn initial_length(self, format: Format, length: &Label, start: &Label) -> Self {
        let section = match format {
            Format::Dwarf32 => self.D32(length),
            Format::Dwarf64 => self.D32(0xffff_ffff).D64(length),
        };
        section.mark(start)
    }

    fn word(self, size: u8, val: u64) -> Self {
        match size {
            4 => self.D32(u32::try_from(val).unwrap()),
            8 => self.D64(val),
            size => panic!("no {}-byte words in DWARF", size),
        }
    }

    fn word_label(self, size: u8, val: &Label) -> Self {
        match size {
            4 => self.D32(val),
            8 => self.D64(val),
            size => panic!("no {}-byte words in DWARF", size),
        }
    }

    fn cstr(self, s: &str) -> Self {
        self.append_bytes(s.as_bytes()).D8(0)
    }
}
