//! Locating the DWARF sections inside an ELF container.
//!
//! Files are memory mapped with `memmap2` and parsed with `object`. Only ELF
//! containers are accepted; other formats that `object` recognises are
//! rejected with [`ContainerError::UnsupportedFormat`].

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use memmap2::Mmap;
use object::{BinaryFormat, Object, ObjectSection};
use thiserror::Error;

use crate::common::SectionId;
use crate::endianity::RunTimeEndian;

/// An error while opening a container or reading its sections.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The file could not be opened or mapped.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// The path that was opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The data is not an object file that can be parsed.
    #[error("failed to parse object file: {0}")]
    Parse(#[from] object::Error),

    /// The data is an object file, but not an ELF file.
    #[error("unsupported container format {0:?}: only ELF is supported")]
    UnsupportedFormat(BinaryFormat),

    /// A section exists but its data could not be read or decompressed.
    #[error("failed to read section {name}: {source}")]
    Section {
        /// The name of the section.
        name: &'static str,
        /// The underlying object error.
        #[source]
        source: object::Error,
    },
}

/// A container file mapped into memory.
///
/// The file handle is only held while the mapping is created. The mapping
/// itself is released when this value is dropped.
#[derive(Debug)]
pub struct ContainerFile {
    path: PathBuf,
    mmap: Mmap,
}

impl ContainerFile {
    /// Open and map the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let open_error = |source| ContainerError::Open {
            path: path.to_owned(),
            source,
        };
        let file = fs::File::open(path).map_err(open_error)?;
        // SAFETY: the mapping is read only, and the data is treated as
        // untrusted bytes by every parser that reads it.
        let mmap = unsafe { Mmap::map(&file) }.map_err(open_error)?;
        debug!("mapped {} ({} bytes)", path.display(), mmap.len());
        Ok(ContainerFile {
            path: path.to_owned(),
            mmap,
        })
    }

    /// The path that this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The mapped contents of the file.
    pub fn data(&self) -> &[u8] {
        &self.mmap
    }

    /// Parse the mapped contents as an ELF container.
    pub fn parse(&self) -> Result<Container<'_>, ContainerError> {
        Container::parse(self.data())
    }
}

/// A section read from a container.
#[derive(Debug, Clone)]
pub struct ContainerSection<'data> {
    /// The section that was requested.
    pub id: SectionId,
    /// The file offset of the section's data, if it has any in the file.
    pub file_offset: Option<u64>,
    /// The section data, decompressed if necessary.
    pub data: Cow<'data, [u8]>,
}

/// A parsed ELF container.
#[derive(Debug)]
pub struct Container<'data> {
    object: object::File<'data>,
}

impl<'data> Container<'data> {
    /// Parse `data` as an ELF container.
    pub fn parse(data: &'data [u8]) -> Result<Self, ContainerError> {
        let object = object::File::parse(data)?;
        match object.format() {
            BinaryFormat::Elf => Ok(Container { object }),
            format => Err(ContainerError::UnsupportedFormat(format)),
        }
    }

    /// The byte order of the container, which is also the byte order of its
    /// DWARF sections.
    pub fn endian(&self) -> RunTimeEndian {
        if self.object.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        }
    }

    /// Look up a section by its role.
    ///
    /// Returns `Ok(None)` if the container has no such section. A section
    /// that exists but is empty is returned with empty data.
    pub fn section(&self, id: SectionId) -> Result<Option<ContainerSection<'data>>, ContainerError> {
        let Some(section) = self.object.section_by_name(id.name()) else {
            debug!("no {} section", id.name());
            return Ok(None);
        };
        let data = section
            .uncompressed_data()
            .map_err(|source| ContainerError::Section {
                name: id.name(),
                source,
            })?;
        let file_offset = section.file_range().map(|(offset, _)| offset);
        debug!("found {} section ({} bytes)", id.name(), data.len());
        Ok(Some(ContainerSection {
            id,
            file_offset,
            data,
        }))
    }

    /// Return the data of a section, or an empty slice if the container has
    /// no such section.
    pub fn section_data(&self, id: SectionId) -> Result<Cow<'data, [u8]>, ContainerError> {
        Ok(self
            .section(id)?
            .map(|section| section.data)
            .unwrap_or(Cow::Borrowed(&[][..])))
    }
}
