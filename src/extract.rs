//! Listing the source files of an ELF binary.
//!
//! The pipeline is: map the container, load its DWARF sections, then for each
//! compilation unit read its abbreviations, walk its entries and decode the
//! header of its line program. The file names of every unit are merged into a
//! [`FileSet`].

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use thiserror::Error;

use crate::common::{DebugAbbrevOffset, DebugInfoOffset, DebugLineOffset, SectionId};
use crate::constants;
use crate::container::{Container, ContainerError, ContainerFile};
use crate::files::FileSet;
use crate::read::{self, AttributeValue, Dwarf, DwarfSections, EndianSlice, Reader, Unit, UnitHeader};

/// Options that control how file names are reported.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Prefix relative file names with their directory entry.
    ///
    /// When unset, files with the same name in different directories are
    /// reported once.
    ///
    /// Before DWARF 5, directory 0 is the unit's `DW_AT_comp_dir`; a file in
    /// directory 0 of a unit without one is left alone. Absolute names are
    /// never joined.
    pub join_directories: bool,

    /// Decode units on the `rayon` thread pool.
    ///
    /// Only has an effect when the `parallel` feature is enabled.
    pub parallel: bool,
}

/// An error while listing source files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The container could not be opened, mapped or parsed.
    #[error("{}{source}", path_prefix(.path))]
    Container {
        /// The path of the container, if it was read from a file.
        path: Option<PathBuf>,
        /// The underlying error.
        #[source]
        source: ContainerError,
    },

    /// The container is an object file, but not an ELF file.
    #[error("unsupported container format {0:?}: only ELF is supported")]
    UnsupportedFormat(object::BinaryFormat),

    /// The container has no `.debug_info` or `.debug_abbrev` data.
    #[error("no DWARF debugging information found")]
    NoDebugInfo,

    /// An abbreviation table could not be decoded.
    #[error(
        "malformed abbreviation table at .debug_abbrev+0x{:x} for unit at .debug_info+0x{:x}: {source}",
        .offset.0,
        .unit.0
    )]
    MalformedAbbrev {
        /// The offset of the abbreviation table.
        offset: DebugAbbrevOffset,
        /// The offset of the unit that uses the table.
        unit: DebugInfoOffset,
        /// What was wrong with the table.
        #[source]
        source: read::Error,
    },

    /// A unit header or debugging information entry could not be decoded.
    #[error(
        "malformed debugging information at .debug_info+0x{:x} in unit at .debug_info+0x{:x}: {source}",
        .offset.0,
        .unit.0
    )]
    MalformedEntry {
        /// The offset of the entry, or of the unit if its header is bad.
        offset: DebugInfoOffset,
        /// The offset of the unit.
        unit: DebugInfoOffset,
        /// What was wrong with the entry.
        #[source]
        source: read::Error,
    },

    /// A line program header could not be decoded, or one of its paths could
    /// not be resolved.
    #[error(
        "malformed line program header at .debug_line+0x{:x} for unit at .debug_info+0x{:x}: {source}",
        .offset.0,
        .unit.0
    )]
    MalformedLineHeader {
        /// The offset of the line program.
        offset: DebugLineOffset,
        /// The offset of the unit that refers to the line program.
        unit: DebugInfoOffset,
        /// What was wrong with the header.
        #[source]
        source: read::Error,
    },
}

fn path_prefix(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!("{}: ", path.display()),
        None => String::new(),
    }
}

impl ExtractError {
    fn container(path: Option<&Path>, source: ContainerError) -> Self {
        match source {
            ContainerError::UnsupportedFormat(format) => ExtractError::UnsupportedFormat(format),
            source => ExtractError::Container {
                path: path.map(Path::to_owned),
                source,
            },
        }
    }
}

/// List the source files recorded in the DWARF of the ELF file at `path`.
///
/// The result is sorted and contains no duplicates.
///
/// ```no_run
/// for file in dwsrc::source_files("target/debug/dwsrc")? {
///     println!("{}", file);
/// }
/// # Ok::<(), dwsrc::ExtractError>(())
/// ```
pub fn source_files<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ExtractError> {
    source_files_with(path, &ExtractOptions::default())
}

/// List the source files of the ELF file at `path`, with options.
pub fn source_files_with<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<Vec<String>, ExtractError> {
    let path = path.as_ref();
    let file = ContainerFile::open(path).map_err(|e| ExtractError::container(Some(path), e))?;
    let container = file
        .parse()
        .map_err(|e| ExtractError::container(Some(path), e))?;
    extract(&container, Some(path), options)
}

/// List the source files of an ELF file that is already in memory.
pub fn source_files_from_bytes(
    data: &[u8],
    options: &ExtractOptions,
) -> Result<Vec<String>, ExtractError> {
    let container = Container::parse(data).map_err(|e| ExtractError::container(None, e))?;
    extract(&container, None, options)
}

fn extract(
    container: &Container<'_>,
    path: Option<&Path>,
    options: &ExtractOptions,
) -> Result<Vec<String>, ExtractError> {
    let sections: DwarfSections<Cow<'_, [u8]>> = DwarfSections::load(|id| {
        container
            .section_data(id)
            .map_err(|e| ExtractError::container(path, e))
    })?;
    for (id, data) in [
        (SectionId::DebugInfo, &sections.debug_info),
        (SectionId::DebugAbbrev, &sections.debug_abbrev),
    ] {
        if data.is_empty() {
            debug!("{} is missing or empty", id.name());
            return Err(ExtractError::NoDebugInfo);
        }
    }

    let endian = container.endian();
    let dwarf = sections.borrow(|section| EndianSlice::new(section, endian));

    let files = if options.parallel {
        parallel_files(&dwarf, options)?
    } else {
        sequential_files(&dwarf, options)?
    };
    debug!("found {} distinct source files", files.len());
    Ok(files.into_sorted_vec())
}

fn header_error(offset: DebugInfoOffset, source: read::Error) -> ExtractError {
    ExtractError::MalformedEntry {
        offset,
        unit: offset,
        source,
    }
}

fn sequential_files<R: Reader>(
    dwarf: &Dwarf<R>,
    options: &ExtractOptions,
) -> Result<FileSet, ExtractError> {
    let mut files = FileSet::new();
    let mut units = dwarf.units();
    loop {
        let offset = units.offset();
        let header = match units.next() {
            Ok(Some(header)) => header,
            Ok(None) => break,
            Err(source) => return Err(header_error(offset, source)),
        };
        files.extend(unit_files(dwarf, header, options)?);
    }
    Ok(files)
}

#[cfg(feature = "parallel")]
fn parallel_files<R>(dwarf: &Dwarf<R>, options: &ExtractOptions) -> Result<FileSet, ExtractError>
where
    R: Reader + Send + Sync,
{
    use rayon::prelude::*;

    // Finding where each unit starts requires reading the headers in order.
    let mut headers = Vec::new();
    let mut header_err = None;
    let mut units = dwarf.units();
    loop {
        let offset = units.offset();
        match units.next() {
            Ok(Some(header)) => headers.push(header),
            Ok(None) => break,
            Err(source) => {
                header_err = Some(header_error(offset, source));
                break;
            }
        }
    }
    debug!("decoding {} units in parallel", headers.len());

    let results: Vec<_> = headers
        .into_par_iter()
        .map(|header| unit_files(dwarf, header, options))
        .collect();

    // Report the same error as a sequential pass would.
    let mut files = FileSet::new();
    for result in results {
        files.extend(result?);
    }
    match header_err {
        Some(err) => Err(err),
        None => Ok(files),
    }
}

#[cfg(not(feature = "parallel"))]
fn parallel_files<R: Reader>(
    dwarf: &Dwarf<R>,
    options: &ExtractOptions,
) -> Result<FileSet, ExtractError> {
    debug!("built without the parallel feature, decoding units sequentially");
    sequential_files(dwarf, options)
}

/// Return the file names of the line program of every compilation unit entry
/// in the unit.
fn unit_files<R: Reader>(
    dwarf: &Dwarf<R>,
    header: UnitHeader<R>,
    options: &ExtractOptions,
) -> Result<Vec<String>, ExtractError> {
    let unit_offset = header.offset();
    let abbrev_offset = header.debug_abbrev_offset();
    debug!(
        "unit at .debug_info+0x{:x}: version {}, {:?}, address size {}, abbreviations at .debug_abbrev+0x{:x}",
        unit_offset.0,
        header.version(),
        header.format(),
        header.address_size(),
        abbrev_offset.0
    );

    let abbreviations =
        dwarf
            .abbreviations(&header)
            .map_err(|source| ExtractError::MalformedAbbrev {
                offset: abbrev_offset,
                unit: unit_offset,
                source,
            })?;
    let root_offset = DebugInfoOffset(unit_offset.0 + header.header_size());
    let unit = Unit::new_with_abbreviations(dwarf, header, abbreviations).map_err(|source| {
        ExtractError::MalformedEntry {
            offset: root_offset,
            unit: unit_offset,
            source,
        }
    })?;

    let mut files = Vec::new();
    let mut entries = unit.entries();
    let mut depth = 0;
    loop {
        let entry_offset = DebugInfoOffset(unit_offset.0 + entries.next_offset().0);
        let (delta_depth, entry) = match entries.next_dfs() {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(source) => {
                return Err(ExtractError::MalformedEntry {
                    offset: entry_offset,
                    unit: unit_offset,
                    source,
                })
            }
        };
        depth += delta_depth;
        trace!("<{}><0x{:x}> {}", depth, entry_offset.0, entry.tag());

        if entry.tag() != constants::DW_TAG_compile_unit {
            continue;
        }
        match entry.attr_value(constants::DW_AT_stmt_list) {
            Some(AttributeValue::DebugLineRef(offset)) => {
                files.extend(line_files(dwarf, &unit, offset, options)?);
            }
            _ => debug!(
                "compilation unit at .debug_info+0x{:x} has no line program, so it contributes no files",
                entry_offset.0
            ),
        }
    }
    Ok(files)
}

fn line_files<R: Reader>(
    dwarf: &Dwarf<R>,
    unit: &Unit<R>,
    offset: DebugLineOffset,
    options: &ExtractOptions,
) -> Result<Vec<String>, ExtractError> {
    let unit_offset = unit.header.offset();
    let line_error = |source| ExtractError::MalformedLineHeader {
        offset,
        unit: unit_offset,
        source,
    };

    let header = dwarf.line_program(unit, offset).map_err(line_error)?;
    debug!(
        "line program at .debug_line+0x{:x}: version {}, {} files",
        offset.0,
        header.version(),
        header.file_names().len()
    );

    let mut names = Vec::with_capacity(header.file_names().len());
    for file in header.file_names() {
        let name = dwarf
            .attr_string(unit, file.path_name())
            .map_err(line_error)?;
        let mut name = name.to_string_lossy().into_owned();
        if options.join_directories && !is_absolute(&name) {
            if let Some(directory) = file.directory(&header) {
                let directory = dwarf.attr_string(unit, directory).map_err(line_error)?;
                name = join(&directory.to_string_lossy(), &name);
            }
        }
        trace!("file {:?}", name);
        names.push(name);
    }
    Ok(names)
}

/// Return true for names starting with a separator or a drive letter.
fn is_absolute(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes {
        [b'/' | b'\\', ..] => true,
        [drive, b':', b'/' | b'\\', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

fn join(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_string()
    } else if directory.ends_with('/') {
        format!("{directory}{name}")
    } else {
        format!("{directory}/{name}")
    }
}
