use crate::common::{DebugLineOffset, Encoding, Format, SectionId};
use crate::constants;
use crate::endianity::Endianity;
use crate::read::unit::parse_attribute_value;
use crate::read::{AttributeValue, EndianSlice, Error, Reader, Result, Section};

/// The `DebugLine` struct contains the source location to instruction mapping
/// found in the `.debug_line` section.
///
/// Only the header of each line number program is decoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugLine<R> {
    debug_line_section: R,
}

impl<'input, Endian> DebugLine<EndianSlice<'input, Endian>>
where
    Endian: Endianity,
{
    /// Construct a new `DebugLine` instance from the data in the `.debug_line`
    /// section.
    ///
    /// ```
    /// use dwsrc::read::DebugLine;
    /// use dwsrc::LittleEndian;
    ///
    /// # let buf = [0x00, 0x01, 0x02, 0x03];
    /// # let read_debug_line_section_somehow = || &buf;
    /// let debug_line = DebugLine::new(read_debug_line_section_somehow(), LittleEndian);
    /// ```
    pub fn new(debug_line_section: &'input [u8], endian: Endian) -> Self {
        Self::from(EndianSlice::new(debug_line_section, endian))
    }
}

impl<R: Reader> DebugLine<R> {
    /// Parse the line number program header whose header is at the given
    /// `offset` in the `.debug_line` section.
    ///
    /// The `address_size` must match the compilation unit that the lines
    /// apply to. The `comp_dir` should be from the `DW_AT_comp_dir` attribute
    /// of the compilation unit.
    ///
    /// ```rust,no_run
    /// use dwsrc::read::DebugLine;
    /// use dwsrc::{DebugLineOffset, LittleEndian};
    ///
    /// # let buf = [];
    /// # let read_debug_line_section_somehow = || &buf;
    /// let debug_line = DebugLine::new(read_debug_line_section_somehow(), LittleEndian);
    ///
    /// // In a real example, we'd grab the offset via a compilation unit
    /// // entry's `DW_AT_stmt_list` attribute, and the address size from that
    /// // unit directly.
    /// let offset = DebugLineOffset(0);
    /// let address_size = 8;
    ///
    /// let header = debug_line.program_header(offset, address_size, None)
    ///     .expect("should have found a header at that offset, and parsed it OK");
    /// ```
    pub fn program_header(
        &self,
        offset: DebugLineOffset,
        address_size: u8,
        comp_dir: Option<R>,
    ) -> Result<LineProgramHeader<R>> {
        let input = &mut self.debug_line_section.clone();
        if offset.0 > input.len() {
            return Err(Error::OffsetOutOfBounds(offset.0 as u64));
        }
        input.skip(offset.0)?;
        LineProgramHeader::parse(input, offset, address_size, comp_dir)
    }
}

impl<R> Section<R> for DebugLine<R> {
    fn id() -> SectionId {
        SectionId::DebugLine
    }

    fn reader(&self) -> &R {
        &self.debug_line_section
    }
}

impl<R> From<R> for DebugLine<R> {
    fn from(debug_line_section: R) -> Self {
        DebugLine { debug_line_section }
    }
}

/// The fixed fields of a line number program header that control how the
/// program's opcodes are decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEncoding {
    /// "The size in bytes of the smallest target machine instruction."
    pub minimum_instruction_length: u8,

    /// "The maximum number of individual operations that may be encoded in an
    /// instruction." Always 1 before version 4.
    pub maximum_operations_per_instruction: u8,

    /// "The initial value of the `is_stmt` register."
    pub default_is_stmt: bool,

    /// "This parameter affects the meaning of the special opcodes."
    pub line_base: i8,

    /// "This parameter affects the meaning of the special opcodes."
    pub line_range: u8,
}

/// A header for a line number program in the `.debug_line` section, as defined
/// in section 6.2.4 of the standard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineProgramHeader<R: Reader> {
    encoding: Encoding,
    offset: DebugLineOffset,
    unit_length: usize,
    header_length: usize,
    line_encoding: LineEncoding,
    opcode_base: u8,
    standard_opcode_lengths: R,
    tables: FileTables<R>,
    comp_dir: Option<R>,
}

impl<R: Reader> LineProgramHeader<R> {
    /// Return the offset of the line number program header in the `.debug_line` section.
    pub fn offset(&self) -> DebugLineOffset {
        self.offset
    }

    /// Return the length of the line number program and header, not including
    /// the length of the encoded length itself.
    pub fn unit_length(&self) -> usize {
        self.unit_length
    }

    /// Return the encoding parameters for this header's line program.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Get the version of this header's line program.
    pub fn version(&self) -> u16 {
        self.encoding.version
    }

    /// Whether this line program is encoded in 64- or 32-bit DWARF.
    pub fn format(&self) -> Format {
        self.encoding.format
    }

    /// Get the address size of this header's line program.
    pub fn address_size(&self) -> u8 {
        self.encoding.address_size
    }

    /// Get the number of bytes following the `header_length` field to the
    /// beginning of the first byte of the line number program itself.
    pub fn header_length(&self) -> usize {
        self.header_length
    }

    /// Get the line encoding parameters for this header's line program.
    pub fn line_encoding(&self) -> LineEncoding {
        self.line_encoding
    }

    /// Get the minimum instruction length any instruction in this header's line
    /// program may have.
    pub fn minimum_instruction_length(&self) -> u8 {
        self.line_encoding.minimum_instruction_length
    }

    /// Get the maximum number of operations each instruction in this header's
    /// line program may have.
    pub fn maximum_operations_per_instruction(&self) -> u8 {
        self.line_encoding.maximum_operations_per_instruction
    }

    /// Get the default value of the `is_stmt` register for this header's line
    /// program.
    pub fn default_is_stmt(&self) -> bool {
        self.line_encoding.default_is_stmt
    }

    /// Get the line base for this header's line program.
    pub fn line_base(&self) -> i8 {
        self.line_encoding.line_base
    }

    /// Get the line range for this header's line program.
    pub fn line_range(&self) -> u8 {
        self.line_encoding.line_range
    }

    /// Get opcode base for this header's line program.
    pub fn opcode_base(&self) -> u8 {
        self.opcode_base
    }

    /// An array of `u8` that specifies the number of LEB128 operands for
    /// each of the standard opcodes.
    pub fn standard_opcode_lengths(&self) -> &R {
        &self.standard_opcode_lengths
    }

    /// The directory and file tables, in the layout used by this header's version.
    pub fn tables(&self) -> &FileTables<R> {
        &self.tables
    }

    /// The compilation directory of the unit that refers to this header.
    pub fn comp_dir(&self) -> Option<&R> {
        self.comp_dir.as_ref()
    }

    /// Get the list of source files that appear in this header's line program.
    pub fn file_names(&self) -> &[FileEntry<R>] {
        match self.tables {
            FileTables::Legacy { ref file_names, .. } => file_names,
            FileTables::Modern { ref file_names, .. } => file_names,
        }
    }

    /// The source file with the given file number.
    ///
    /// Files are numbered from 1 before version 5, and from 0 after.
    pub fn file(&self, file: u64) -> Option<&FileEntry<R>> {
        let index = match self.tables {
            FileTables::Legacy { .. } => file.checked_sub(1)?,
            FileTables::Modern { .. } => file,
        };
        self.file_names().get(usize::try_from(index).ok()?)
    }

    /// Get the include directory with the given directory index.
    ///
    /// Before version 5, index 0 is the compilation directory and the
    /// directory table starts at index 1.
    pub fn directory(&self, directory: u64) -> Option<AttributeValue<R>> {
        match self.tables {
            FileTables::Legacy {
                ref include_directories,
                ..
            } => {
                if directory == 0 {
                    self.comp_dir.clone().map(AttributeValue::String)
                } else {
                    let index = usize::try_from(directory - 1).ok()?;
                    include_directories
                        .get(index)
                        .cloned()
                        .map(AttributeValue::String)
                }
            }
            FileTables::Modern {
                ref include_directories,
                ..
            } => include_directories
                .get(usize::try_from(directory).ok()?)
                .cloned(),
        }
    }

    fn parse(
        input: &mut R,
        offset: DebugLineOffset,
        mut address_size: u8,
        comp_dir: Option<R>,
    ) -> Result<LineProgramHeader<R>> {
        let (unit_length, format) = input.read_initial_length()?;
        let rest = &mut input.split(unit_length)?;

        let version = rest.read_u16()?;
        if !(2..=5).contains(&version) {
            return Err(Error::UnknownVersion(u64::from(version)));
        }

        if version >= 5 {
            address_size = rest.read_address_size()?;
            let segment_selector_size = rest.read_u8()?;
            if segment_selector_size != 0 {
                return Err(Error::UnsupportedSegmentSize(segment_selector_size));
            }
        }

        let encoding = Encoding {
            format,
            version,
            address_size,
        };

        let header_length = rest.read_length(format)?;
        let header_start = rest.clone();

        // Only needed to advance addresses, which a header-only read never does.
        let minimum_instruction_length = rest.read_u8()?;

        // This field did not exist before DWARF 4, but is specified to be 1 for
        // non-VLIW architectures, which makes it a no-op.
        let maximum_operations_per_instruction = if version >= 4 {
            rest.read_u8()?
        } else {
            1
        };
        if maximum_operations_per_instruction == 0 {
            return Err(Error::MaximumOperationsPerInstructionZero);
        }

        let default_is_stmt = rest.read_u8()? != 0;
        let line_base = rest.read_i8()?;
        let line_range = rest.read_u8()?;
        if line_range == 0 {
            return Err(Error::LineRangeZero);
        }
        let line_encoding = LineEncoding {
            minimum_instruction_length,
            maximum_operations_per_instruction,
            default_is_stmt,
            line_base,
            line_range,
        };

        let opcode_base = rest.read_u8()?;
        if opcode_base == 0 {
            return Err(Error::OpcodeBaseZero);
        }

        let standard_opcode_count = usize::from(opcode_base - 1);
        let standard_opcode_lengths = rest.split(standard_opcode_count)?;

        let tables = if version <= 4 {
            FileTables::parse_legacy(rest)?
        } else {
            FileTables::parse_modern(rest, encoding)?
        };

        let found = rest.offset_from(&header_start);
        if found != header_length {
            return Err(Error::HeaderLengthMismatch {
                expected: header_length as u64,
                found: found as u64,
            });
        }

        tables.check_directory_indices()?;

        Ok(LineProgramHeader {
            encoding,
            offset,
            unit_length,
            header_length,
            line_encoding,
            opcode_base,
            standard_opcode_lengths,
            tables,
            comp_dir,
        })
    }
}

/// The directory and file tables of a line program header.
///
/// Version 5 replaced the fixed layout of these tables with self-describing
/// entry formats, and changed how directories and files are numbered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileTables<R: Reader> {
    /// The tables used by versions 2 to 4.
    Legacy {
        /// The directory table. Index 0 is implicitly the compilation
        /// directory, so the first entry here is directory 1.
        include_directories: Vec<R>,
        /// The file table. The first entry is file 1.
        file_names: Vec<FileEntry<R>>,
    },
    /// The tables used by version 5.
    Modern {
        /// The format of each directory entry.
        directory_entry_format: Vec<FileEntryFormat>,
        /// The path of each directory. Entry 0 is the compilation directory.
        include_directories: Vec<AttributeValue<R>>,
        /// The format of each file entry.
        file_name_entry_format: Vec<FileEntryFormat>,
        /// The file table. Entry 0 is the primary source file.
        file_names: Vec<FileEntry<R>>,
    },
}

impl<R: Reader> FileTables<R> {
    fn parse_legacy(input: &mut R) -> Result<Self> {
        let mut include_directories = Vec::new();
        loop {
            let directory = input.read_null_terminated_slice()?;
            if directory.is_empty() {
                break;
            }
            include_directories.push(directory);
        }

        let mut file_names = Vec::new();
        loop {
            let path_name = input.read_null_terminated_slice()?;
            if path_name.is_empty() {
                break;
            }
            let directory_index = input.read_uleb128()?;
            let timestamp = input.read_uleb128()?;
            let size = input.read_uleb128()?;
            file_names.push(FileEntry {
                path_name: AttributeValue::String(path_name),
                directory_index,
                timestamp,
                size,
                md5: None,
            });
        }

        Ok(FileTables::Legacy {
            include_directories,
            file_names,
        })
    }

    fn parse_modern(input: &mut R, encoding: Encoding) -> Result<Self> {
        let directory_entry_format = FileEntryFormat::parse(input)?;
        let count = input.read_uleb128()?;
        let mut include_directories = Vec::new();
        for _ in 0..count {
            let entry = FileEntry::parse(input, encoding, &directory_entry_format)?;
            include_directories.push(entry.path_name);
        }

        let file_name_entry_format = FileEntryFormat::parse(input)?;
        let count = input.read_uleb128()?;
        let mut file_names = Vec::new();
        for _ in 0..count {
            file_names.push(FileEntry::parse(input, encoding, &file_name_entry_format)?);
        }

        Ok(FileTables::Modern {
            directory_entry_format,
            include_directories,
            file_name_entry_format,
            file_names,
        })
    }

    fn check_directory_indices(&self) -> Result<()> {
        let (count, file_names) = match *self {
            FileTables::Legacy {
                ref include_directories,
                ref file_names,
            } => (include_directories.len() as u64 + 1, file_names),
            FileTables::Modern {
                ref include_directories,
                ref file_name_entry_format,
                ref file_names,
                ..
            } => {
                let has_index = file_name_entry_format
                    .iter()
                    .any(|format| format.content_type == constants::DW_LNCT_directory_index);
                if !has_index {
                    return Ok(());
                }
                (include_directories.len() as u64, file_names)
            }
        };
        match file_names
            .iter()
            .find(|file| file.directory_index >= count)
        {
            Some(file) => Err(Error::InvalidDirectoryIndex {
                index: file.directory_index,
                count,
            }),
            None => Ok(()),
        }
    }
}

/// An entry in the `LineProgramHeader`'s `file_names` set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry<R: Reader> {
    path_name: AttributeValue<R>,
    directory_index: u64,
    timestamp: u64,
    size: u64,
    md5: Option<[u8; 16]>,
}

impl<R: Reader> FileEntry<R> {
    fn parse(input: &mut R, encoding: Encoding, formats: &[FileEntryFormat]) -> Result<Self> {
        let mut path_name = None;
        let mut directory_index = 0;
        let mut timestamp = 0;
        let mut size = 0;
        let mut md5 = None;

        for format in formats {
            let value = parse_attribute_value(input, encoding, format.form, None)?;
            match format.content_type {
                constants::DW_LNCT_path => path_name = Some(value),
                constants::DW_LNCT_directory_index => {
                    if let Some(value) = value.udata_value() {
                        directory_index = value;
                    }
                }
                constants::DW_LNCT_timestamp => {
                    if let Some(value) = value.udata_value() {
                        timestamp = value;
                    }
                }
                constants::DW_LNCT_size => {
                    if let Some(value) = value.udata_value() {
                        size = value;
                    }
                }
                constants::DW_LNCT_MD5 => match value {
                    AttributeValue::Data16(bytes) => md5 = Some(bytes),
                    AttributeValue::Block(mut block) if block.len() == 16 => {
                        md5 = Some(block.read_u8_array()?);
                    }
                    _ => {}
                },
                // Vendor content types have been decoded and are ignored.
                _ => {}
            }
        }

        Ok(FileEntry {
            path_name: path_name.ok_or(Error::MissingFileEntryFormatPath)?,
            directory_index,
            timestamp,
            size,
            md5,
        })
    }

    /// > A slash-terminated string containing the full or relative path name of
    /// > a source file.
    ///
    /// The value may be inline, or a reference into one of the string sections.
    pub fn path_name(&self) -> AttributeValue<R> {
        self.path_name.clone()
    }

    /// > An unsigned LEB128 number representing the directory index of the
    /// > directory in which the file was found.
    pub fn directory_index(&self) -> u64 {
        self.directory_index
    }

    /// Get this file's directory.
    ///
    /// A directory index of 0 corresponds to the compilation unit directory.
    pub fn directory(&self, header: &LineProgramHeader<R>) -> Option<AttributeValue<R>> {
        header.directory(self.directory_index)
    }

    /// The implementation-defined time of last modification of the file,
    /// or 0 if not available.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The size of the file in bytes, or 0 if not available.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// A 16-byte MD5 digest of the file contents, if present.
    pub fn md5(&self) -> Option<&[u8; 16]> {
        self.md5.as_ref()
    }
}

/// The format of a component of an include directory or file name entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileEntryFormat {
    /// The type of information that is represented by the component.
    pub content_type: constants::DwLnct,

    /// The encoding form of the component value.
    pub form: constants::DwForm,
}

impl FileEntryFormat {
    fn parse<R: Reader>(input: &mut R) -> Result<Vec<FileEntryFormat>> {
        let format_count = input.read_u8()?;
        let mut format = Vec::with_capacity(usize::from(format_count));
        let mut path_count = 0;
        for _ in 0..format_count {
            let content_type = input.read_uleb128()?;
            let content_type = if content_type > u64::from(u16::MAX) {
                constants::DwLnct(u16::MAX)
            } else {
                constants::DwLnct(content_type as u16)
            };
            if content_type == constants::DW_LNCT_path {
                path_count += 1;
            }

            let form = constants::DwForm(input.read_uleb128_u16()?);

            format.push(FileEntryFormat { content_type, form });
        }
        if path_count != 1 {
            return Err(Error::MissingFileEntryFormatPath);
        }
        Ok(format)
    }
}
