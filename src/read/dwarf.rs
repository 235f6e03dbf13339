use crate::common::{DebugLineOffset, DebugStrOffsetsBase, Encoding, SectionId};
use crate::constants;
use crate::read::{
    Abbreviations, AttributeValue, DebugAbbrev, DebugInfo, DebugLine, DebugLineStr, DebugStr,
    DebugStrOffsets, EntriesCursor, Error, LineProgramHeader, Reader, Result, Section, UnitHeader,
    UnitHeadersIter,
};

/// All of the DWARF sections that are read, before they are wrapped in a
/// `Reader`.
///
/// This is useful when the section data needs to be owned somewhere (for
/// example, after decompression) while `Dwarf` borrows it.
#[derive(Debug, Default)]
pub struct DwarfSections<T> {
    /// The `.debug_abbrev` section.
    pub debug_abbrev: T,
    /// The `.debug_info` section.
    pub debug_info: T,
    /// The `.debug_line` section.
    pub debug_line: T,
    /// The `.debug_line_str` section.
    pub debug_line_str: T,
    /// The `.debug_str` section.
    pub debug_str: T,
    /// The `.debug_str_offsets` section.
    pub debug_str_offsets: T,
}

impl<T> DwarfSections<T> {
    /// Try to load the DWARF sections using the given loader function.
    ///
    /// `section` loads a DWARF section from the object file.
    /// It should return an empty section if the section does not exist.
    pub fn load<F, E>(mut section: F) -> core::result::Result<Self, E>
    where
        F: FnMut(SectionId) -> core::result::Result<T, E>,
    {
        Ok(DwarfSections {
            debug_abbrev: section(SectionId::DebugAbbrev)?,
            debug_info: section(SectionId::DebugInfo)?,
            debug_line: section(SectionId::DebugLine)?,
            debug_line_str: section(SectionId::DebugLineStr)?,
            debug_str: section(SectionId::DebugStr)?,
            debug_str_offsets: section(SectionId::DebugStrOffsets)?,
        })
    }

    /// Create a `Dwarf` structure that references the data in `self`.
    pub fn borrow<'a, F, R>(&'a self, mut borrow: F) -> Dwarf<R>
    where
        F: FnMut(&'a T) -> R,
    {
        Dwarf {
            debug_abbrev: borrow(&self.debug_abbrev).into(),
            debug_info: borrow(&self.debug_info).into(),
            debug_line: borrow(&self.debug_line).into(),
            debug_line_str: borrow(&self.debug_line_str).into(),
            debug_str: borrow(&self.debug_str).into(),
            debug_str_offsets: borrow(&self.debug_str_offsets).into(),
        }
    }
}

/// All of the commonly used DWARF sections.
#[derive(Debug, Default)]
pub struct Dwarf<R> {
    /// The `.debug_abbrev` section.
    pub debug_abbrev: DebugAbbrev<R>,

    /// The `.debug_info` section.
    pub debug_info: DebugInfo<R>,

    /// The `.debug_line` section.
    pub debug_line: DebugLine<R>,

    /// The `.debug_line_str` section.
    pub debug_line_str: DebugLineStr<R>,

    /// The `.debug_str` section.
    pub debug_str: DebugStr<R>,

    /// The `.debug_str_offsets` section.
    pub debug_str_offsets: DebugStrOffsets<R>,
}

impl<R: Reader> Dwarf<R> {
    /// Try to load the DWARF sections using the given loader function.
    ///
    /// `section` loads a DWARF section from the object file.
    /// It should return an empty section if the section does not exist.
    pub fn load<F, E>(mut section: F) -> core::result::Result<Self, E>
    where
        F: FnMut(SectionId) -> core::result::Result<R, E>,
    {
        Ok(Dwarf {
            debug_abbrev: Section::load(&mut section)?,
            debug_info: Section::load(&mut section)?,
            debug_line: Section::load(&mut section)?,
            debug_line_str: Section::load(&mut section)?,
            debug_str: Section::load(&mut section)?,
            debug_str_offsets: Section::load(&mut section)?,
        })
    }

    /// Iterate the unit headers in the `.debug_info` section.
    ///
    /// Can be [used with
    /// `FallibleIterator`](./index.html#using-with-fallibleiterator).
    #[inline]
    pub fn units(&self) -> UnitHeadersIter<R> {
        self.debug_info.units()
    }

    /// Construct a new `Unit` from the given unit header.
    #[inline]
    pub fn unit(&self, header: UnitHeader<R>) -> Result<Unit<R>> {
        Unit::new(self, header)
    }

    /// Parse the abbreviations for a compilation unit.
    #[inline]
    pub fn abbreviations(&self, unit: &UnitHeader<R>) -> Result<Abbreviations> {
        unit.abbreviations(&self.debug_abbrev)
    }

    /// Parse the header of the line number program at `offset`, using the
    /// address size and compilation directory of `unit`.
    pub fn line_program(
        &self,
        unit: &Unit<R>,
        offset: DebugLineOffset,
    ) -> Result<LineProgramHeader<R>> {
        self.debug_line
            .program_header(offset, unit.header.address_size(), unit.comp_dir.clone())
    }

    /// Return an attribute value as a string slice.
    ///
    /// If the attribute value is one of:
    ///
    /// - an inline `DW_FORM_string` string
    /// - a `DW_FORM_strp` reference to an offset into the `.debug_str` section
    /// - a `DW_FORM_line_strp` reference to an offset into the `.debug_line_str` section
    /// - a `DW_FORM_strx` index into the `.debug_str_offsets` entries for the unit
    ///
    /// then return the attribute's string value. Returns an error if the attribute
    /// value does not have a string form, or if a string form has an invalid value.
    pub fn attr_string(&self, unit: &Unit<R>, attr: AttributeValue<R>) -> Result<R> {
        match attr {
            AttributeValue::String(string) => Ok(string),
            AttributeValue::DebugStrRef(offset) => self.debug_str.get_str(offset),
            AttributeValue::DebugStrRefSup(_) => Err(Error::MissingSupplementaryFile),
            AttributeValue::DebugLineStrRef(offset) => self.debug_line_str.get_str(offset),
            AttributeValue::DebugStrOffsetsIndex(index) => {
                let offset = self.debug_str_offsets.get_str_offset(
                    unit.header.format(),
                    unit.str_offsets_base,
                    index,
                )?;
                self.debug_str.get_str(offset)
            }
            _ => Err(Error::ExpectedStringAttributeValue),
        }
    }
}

/// All of the commonly used information for a unit in the `.debug_info` section.
#[derive(Debug)]
pub struct Unit<R: Reader> {
    /// The header of the unit.
    pub header: UnitHeader<R>,

    /// The parsed abbreviations for the unit.
    pub abbreviations: Abbreviations,

    /// The `DW_AT_name` attribute of the unit.
    pub name: Option<R>,

    /// The `DW_AT_comp_dir` attribute of the unit.
    pub comp_dir: Option<R>,

    /// The `DW_AT_str_offsets_base` attribute of the unit. Defaults to 0.
    pub str_offsets_base: DebugStrOffsetsBase,

    /// The `DW_AT_stmt_list` attribute of the unit, if any.
    pub line_program_offset: Option<DebugLineOffset>,
}

impl<R: Reader> Unit<R> {
    /// Construct a new `Unit` from the given unit header.
    ///
    /// Reads the unit DIE for the attributes that the rest of the unit
    /// depends on. A name or compilation directory that cannot be resolved
    /// is an error.
    pub fn new(dwarf: &Dwarf<R>, header: UnitHeader<R>) -> Result<Self> {
        let abbreviations = dwarf.abbreviations(&header)?;
        Self::new_with_abbreviations(dwarf, header, abbreviations)
    }

    /// Construct a new `Unit` from the given unit header and abbreviations.
    ///
    /// The abbreviations for this call can be obtained using `dwarf.abbreviations(&header)`.
    pub fn new_with_abbreviations(
        dwarf: &Dwarf<R>,
        header: UnitHeader<R>,
        abbreviations: Abbreviations,
    ) -> Result<Self> {
        let mut unit = Unit {
            header,
            abbreviations,
            name: None,
            comp_dir: None,
            str_offsets_base: DebugStrOffsetsBase(0),
            line_program_offset: None,
        };

        let mut name = None;
        let mut comp_dir = None;
        let mut str_offsets_base = None;
        let mut line_program_offset = None;
        {
            let mut entries = unit.entries();
            let (_, entry) = entries.next_dfs()?.ok_or(Error::MissingUnitDie)?;
            for attr in entry.attrs() {
                match attr.name() {
                    constants::DW_AT_name => name = Some(attr.value()),
                    constants::DW_AT_comp_dir => comp_dir = Some(attr.value()),
                    constants::DW_AT_str_offsets_base => {
                        if let AttributeValue::DebugStrOffsetsBase(base) = attr.value() {
                            str_offsets_base = Some(base);
                        }
                    }
                    constants::DW_AT_stmt_list => {
                        if let AttributeValue::DebugLineRef(offset) = attr.value() {
                            line_program_offset = Some(offset);
                        }
                    }
                    _ => {}
                }
            }
        }
        if let Some(base) = str_offsets_base {
            unit.str_offsets_base = base;
        }
        unit.line_program_offset = line_program_offset;

        // Strings may be `DW_FORM_strx`, which needs the base from above.
        unit.name = name.map(|name| dwarf.attr_string(&unit, name)).transpose()?;
        unit.comp_dir = comp_dir.map(|dir| dwarf.attr_string(&unit, dir)).transpose()?;
        Ok(unit)
    }

    /// Return the encoding parameters for this unit.
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.header.encoding()
    }

    /// Navigate this unit's `DebuggingInformationEntry`s.
    #[inline]
    pub fn entries(&self) -> EntriesCursor<'_, '_, R> {
        self.header.entries(&self.abbreviations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DebugInfoOffset, DebugLineStrOffset, DebugStrOffset, Format};
    use crate::constants::*;
    use crate::endianity::{Endianity, LittleEndian};
    use crate::read::abbrev::tests::AbbrevSectionMethods;
    use crate::read::{EndianSlice, Section as _};
    use crate::test_util::DwarfSectionMethods;
    use test_assembler::{Endian, Label, LabelMaker, Section};

    /// Ensure that `Dwarf<R>` is covariant wrt R.
    #[test]
    fn test_dwarf_variance() {
        /// This only needs to compile.
        #[allow(dead_code)]
        fn f<'a: 'b, 'b, E: Endianity>(x: Dwarf<EndianSlice<'a, E>>) -> Dwarf<EndianSlice<'b, E>> {
            x
        }
    }

    struct Sections {
        debug_abbrev: Vec<u8>,
        debug_info: Vec<u8>,
        debug_line_str: Vec<u8>,
        debug_str: Vec<u8>,
        debug_str_offsets: Vec<u8>,
    }

    impl Sections {
        fn load(&self, id: SectionId) -> core::result::Result<&[u8], ()> {
            let data: &[u8] = match id {
                SectionId::DebugAbbrev => &self.debug_abbrev,
                SectionId::DebugInfo => &self.debug_info,
                SectionId::DebugLineStr => &self.debug_line_str,
                SectionId::DebugStr => &self.debug_str,
                SectionId::DebugStrOffsets => &self.debug_str_offsets,
                _ => &[],
            };
            Ok(data)
        }
    }

    /// A version 5 unit whose name is a `DW_FORM_strx1` index and whose
    /// compilation directory is a `DW_FORM_strp` reference.
    fn v5_sections() -> Sections {
        #[rustfmt::skip]
        let debug_abbrev = Section::with_endian(Endian::Little)
            .abbrev(1, DW_TAG_compile_unit, DW_CHILDREN_yes)
                .abbrev_attr(DW_AT_str_offsets_base, DW_FORM_sec_offset)
                .abbrev_attr(DW_AT_name, DW_FORM_strx1)
                .abbrev_attr(DW_AT_comp_dir, DW_FORM_strp)
                .abbrev_attr(DW_AT_stmt_list, DW_FORM_sec_offset)
                .abbrev_attr_null()
            .abbrev(2, DW_TAG_subprogram, DW_CHILDREN_no)
                .abbrev_attr(DW_AT_name, DW_FORM_line_strp)
                .abbrev_attr_null()
            .abbrev_null()
            .get_contents()
            .unwrap();

        let debug_str = b"\0main.go\0/home/gopher\0".to_vec();
        let debug_line_str = b"\0helper\0".to_vec();

        // The offsets follow an 8 byte header.
        let str_offsets_base = 8;
        let length = Label::new();
        let start = Label::new();
        let end = Label::new();
        let debug_str_offsets = Section::with_endian(Endian::Little)
            .initial_length(Format::Dwarf32, &length, &start)
            .D16(5)
            .D16(0)
            .D32(0)
            .D32(1)
            .D32(9)
            .mark(&end);
        length.set_const((&end - &start) as u64);
        let debug_str_offsets = debug_str_offsets.get_contents().unwrap();

        let length = Label::new();
        let start = Label::new();
        let end = Label::new();
        let debug_info = Section::with_endian(Endian::Little)
            .initial_length(Format::Dwarf32, &length, &start)
            .D16(5)
            .D8(DW_UT_compile.0)
            .D8(8)
            .D32(0)
            // Unit DIE.
            .uleb(1)
            .D32(str_offsets_base)
            .D8(1)
            .D32(9)
            .D32(0x40)
            // Child DIE.
            .uleb(2)
            .D32(1)
            .D8(0)
            .mark(&end);
        length.set_const((&end - &start) as u64);
        let debug_info = debug_info.get_contents().unwrap();

        Sections {
            debug_abbrev,
            debug_info,
            debug_line_str,
            debug_str,
            debug_str_offsets,
        }
    }

    #[test]
    fn test_unit_attributes() {
        let sections = v5_sections();
        let dwarf = Dwarf::load(|id| {
            sections
                .load(id)
                .map(|data| EndianSlice::new(data, LittleEndian))
        })
        .unwrap();

        let header = dwarf.units().next().unwrap().unwrap();
        let unit = dwarf.unit(header).unwrap();
        assert_eq!(unit.encoding().version, 5);
        assert_eq!(unit.str_offsets_base, DebugStrOffsetsBase(8));
        assert_eq!(unit.line_program_offset, Some(DebugLineOffset(0x40)));
        assert_eq!(unit.name.map(|s| s.slice()), Some(&b"main.go"[..]));
        assert_eq!(unit.comp_dir.map(|s| s.slice()), Some(&b"/home/gopher"[..]));

        // The cursor starts at the unit DIE again.
        let mut entries = unit.entries();
        let (delta, root) = entries.next_dfs().unwrap().unwrap();
        assert_eq!(delta, 0);
        assert_eq!(root.tag(), DW_TAG_compile_unit);
        let (delta, child) = entries.next_dfs().unwrap().unwrap();
        assert_eq!(delta, 1);
        let name = dwarf
            .attr_string(&unit, child.attr_value(DW_AT_name).unwrap())
            .unwrap();
        assert_eq!(name.slice(), b"helper");
        assert!(entries.next_dfs().unwrap().is_none());
    }

    #[test]
    fn test_dwarf_sections_borrow() {
        let sections = v5_sections();
        let owned: DwarfSections<Vec<u8>> =
            DwarfSections::load(|id| sections.load(id).map(|data| data.to_vec())).unwrap();
        let dwarf = owned.borrow(|section| EndianSlice::new(section, LittleEndian));
        let header = dwarf.units().next().unwrap().unwrap();
        let unit = dwarf.unit(header).unwrap();
        assert_eq!(unit.name.map(|s| s.slice()), Some(&b"main.go"[..]));
        assert!(dwarf.debug_line.reader().is_empty());
    }

    #[test]
    fn test_attr_string() {
        let sections = v5_sections();
        let dwarf = Dwarf::load(|id| {
            sections
                .load(id)
                .map(|data| EndianSlice::new(data, LittleEndian))
        })
        .unwrap();
        let header = dwarf.units().next().unwrap().unwrap();
        let unit = dwarf.unit(header).unwrap();

        let inline = EndianSlice::new(b"inline.go", LittleEndian);
        assert_eq!(
            dwarf.attr_string(&unit, AttributeValue::String(inline)),
            Ok(inline)
        );
        assert_eq!(
            dwarf
                .attr_string(&unit, AttributeValue::DebugStrRef(DebugStrOffset(1)))
                .map(|s| s.slice()),
            Ok(&b"main.go"[..])
        );
        assert_eq!(
            dwarf
                .attr_string(
                    &unit,
                    AttributeValue::DebugLineStrRef(DebugLineStrOffset(1))
                )
                .map(|s| s.slice()),
            Ok(&b"helper"[..])
        );
        assert_eq!(
            dwarf.attr_string(&unit, AttributeValue::DebugStrRefSup(DebugStrOffset(1))),
            Err(Error::MissingSupplementaryFile)
        );
        assert_eq!(
            dwarf.attr_string(&unit, AttributeValue::Udata(1)),
            Err(Error::ExpectedStringAttributeValue)
        );
        assert_eq!(
            dwarf.attr_string(
                &unit,
                AttributeValue::DebugStrOffsetsIndex(crate::DebugStrOffsetsIndex(3))
            ),
            Err(Error::UnexpectedEof)
        );
    }

    #[test]
    fn test_unresolved_unit_strings() {
        fn load(sections: &Sections) -> Result<DebugInfoOffset> {
            let dwarf = Dwarf::load(|id| {
                sections
                    .load(id)
                    .map(|data| EndianSlice::new(data, LittleEndian))
            })
            .unwrap();
            let header = dwarf.units().next().unwrap().unwrap();
            dwarf.unit(header).map(|unit| unit.header.offset())
        }

        // The name index points past the end of `.debug_str_offsets`.
        let mut sections = v5_sections();
        sections.debug_str_offsets.truncate(12);
        assert_eq!(load(&sections), Err(Error::UnexpectedEof));

        // The compilation directory points past the end of `.debug_str`.
        let mut sections = v5_sections();
        sections.debug_str = b"\0main.go\0".to_vec();
        assert_eq!(load(&sections), Err(Error::UnexpectedEof));
    }

    #[test]
    fn test_missing_unit_die() {
        let length = Label::new();
        let start = Label::new();
        let end = Label::new();
        let debug_info = Section::with_endian(Endian::Little)
            .initial_length(Format::Dwarf32, &length, &start)
            .D16(4)
            .D32(0)
            .D8(8)
            .D8(0)
            .mark(&end);
        length.set_const((&end - &start) as u64);
        let debug_info = debug_info.get_contents().unwrap();
        let debug_abbrev = [0u8];

        let dwarf = Dwarf {
            debug_abbrev: DebugAbbrev::new(&debug_abbrev, LittleEndian),
            debug_info: DebugInfo::new(&debug_info, LittleEndian),
            ..Default::default()
        };
        let header = dwarf.units().next().unwrap().unwrap();
        assert_eq!(dwarf.unit(header).err(), Some(Error::MissingUnitDie));
    }
}
