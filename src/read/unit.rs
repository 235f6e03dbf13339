//! Functions for parsing DWARF `.debug_info` sections.

#[cfg(feature = "fallible-iterator")]
use fallible_iterator::FallibleIterator;

use crate::common::{
    DebugAbbrevOffset, DebugAddrIndex, DebugInfoOffset, DebugLineOffset, DebugLineStrOffset,
    DebugStrOffset, DebugStrOffsetsBase, DebugStrOffsetsIndex, DebugTypeSignature, DwoId,
    Encoding, Format, SectionId,
};
use crate::constants;
use crate::endianity::Endianity;
use crate::read::abbrev::{Abbreviation, Abbreviations, AttributeSpecification, DebugAbbrev};
use crate::read::{EndianSlice, Error, Reader, Result, Section, UnitOffset};

/// The `DebugInfo` struct represents the DWARF debugging information found in
/// the `.debug_info` section.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugInfo<R> {
    debug_info_section: R,
}

impl<'input, Endian> DebugInfo<EndianSlice<'input, Endian>>
where
    Endian: Endianity,
{
    /// Construct a new `DebugInfo` instance from the data in the `.debug_info`
    /// section.
    ///
    /// ```
    /// use dwsrc::read::DebugInfo;
    /// use dwsrc::LittleEndian;
    ///
    /// # let buf = [0x00, 0x01, 0x02, 0x03];
    /// # let read_debug_info_section_somehow = || &buf;
    /// let debug_info = DebugInfo::new(read_debug_info_section_somehow(), LittleEndian);
    /// ```
    pub fn new(debug_info_section: &'input [u8], endian: Endian) -> Self {
        Self::from(EndianSlice::new(debug_info_section, endian))
    }
}

impl<R: Reader> DebugInfo<R> {
    /// Iterate the units in this `.debug_info` section.
    ///
    /// ```
    /// use dwsrc::read::DebugInfo;
    /// use dwsrc::LittleEndian;
    ///
    /// # let buf = [];
    /// # let read_debug_info_section_somehow = || &buf;
    /// let debug_info = DebugInfo::new(read_debug_info_section_somehow(), LittleEndian);
    ///
    /// let mut iter = debug_info.units();
    /// while let Some(unit) = iter.next().unwrap() {
    ///     println!("unit's length is {}", unit.unit_length());
    /// }
    /// ```
    ///
    /// Can be used with `FallibleIterator` when the `fallible-iterator`
    /// feature is enabled.
    pub fn units(&self) -> UnitHeadersIter<R> {
        UnitHeadersIter {
            input: self.debug_info_section.clone(),
            offset: DebugInfoOffset(0),
        }
    }

    /// Get the UnitHeader located at offset from this .debug_info section.
    pub fn header_from_offset(&self, offset: DebugInfoOffset) -> Result<UnitHeader<R>> {
        let input = &mut self.debug_info_section.clone();
        if offset.0 > input.len() {
            return Err(Error::OffsetOutOfBounds(offset.0 as u64));
        }
        input.skip(offset.0)?;
        parse_unit_header(input, offset)
    }
}

impl<R> Section<R> for DebugInfo<R> {
    fn id() -> SectionId {
        SectionId::DebugInfo
    }

    fn reader(&self) -> &R {
        &self.debug_info_section
    }
}

impl<R> From<R> for DebugInfo<R> {
    fn from(debug_info_section: R) -> Self {
        DebugInfo { debug_info_section }
    }
}

/// An iterator over the units of a .debug_info section.
///
/// See the [documentation on
/// `DebugInfo::units`](./struct.DebugInfo.html#method.units) for more detail.
#[derive(Clone, Debug)]
pub struct UnitHeadersIter<R: Reader> {
    input: R,
    offset: DebugInfoOffset,
}

impl<R: Reader> UnitHeadersIter<R> {
    /// Advance the iterator to the next unit header.
    ///
    /// After an error the iterator is exhausted: there is no way to find the
    /// next unit once a unit's length can't be trusted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<UnitHeader<R>>> {
        if self.input.is_empty() {
            Ok(None)
        } else {
            let len = self.input.len();
            match parse_unit_header(&mut self.input, self.offset) {
                Ok(header) => {
                    self.offset.0 += len - self.input.len();
                    Ok(Some(header))
                }
                Err(e) => {
                    self.input.empty();
                    Err(e)
                }
            }
        }
    }

    /// The `.debug_info` offset of the next unit header.
    pub fn offset(&self) -> DebugInfoOffset {
        self.offset
    }
}

#[cfg(feature = "fallible-iterator")]
impl<R: Reader> FallibleIterator for UnitHeadersIter<R> {
    type Item = UnitHeader<R>;
    type Error = Error;

    fn next(&mut self) -> ::core::result::Result<Option<Self::Item>, Self::Error> {
        UnitHeadersIter::next(self)
    }
}

/// This enum specifies the type of the unit and any type
/// specific data carried in the header (e.g. the type
/// signature/type offset of a type unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitType {
    /// In DWARF5, a unit with type `DW_UT_compile`. In previous DWARF versions,
    /// any unit appearing in the .debug_info section.
    Compilation,
    /// In DWARF5, a unit with type `DW_UT_type`.
    Type {
        /// The unique type signature for this type unit.
        type_signature: DebugTypeSignature,
        /// The offset within this type unit where the type is defined.
        type_offset: UnitOffset,
    },
    /// A unit with type `DW_UT_partial`. The root DIE of this unit should be a
    /// `DW_TAG_partial_unit`.
    Partial,
    /// A unit with type `DW_UT_skeleton`. The enclosed dwo_id can be used to
    /// link this with the corresponding `SplitCompilation` unit in a dwo file.
    Skeleton(DwoId),
    /// A unit with type `DW_UT_split_compile`.
    SplitCompilation(DwoId),
    /// A unit with type `DW_UT_split_type`.
    SplitType {
        /// The unique type signature for this type unit.
        type_signature: DebugTypeSignature,
        /// The offset within this type unit where the type is defined.
        type_offset: UnitOffset,
    },
}

impl UnitType {
    /// Return the `DW_UT_*` constant for this unit type.
    pub fn dw_ut(&self) -> constants::DwUt {
        match self {
            UnitType::Compilation => constants::DW_UT_compile,
            UnitType::Type { .. } => constants::DW_UT_type,
            UnitType::Partial => constants::DW_UT_partial,
            UnitType::Skeleton(_) => constants::DW_UT_skeleton,
            UnitType::SplitCompilation(_) => constants::DW_UT_split_compile,
            UnitType::SplitType { .. } => constants::DW_UT_split_type,
        }
    }
}

/// The common fields for the headers of compilation units and
/// type units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitHeader<R: Reader> {
    encoding: Encoding,
    unit_length: usize,
    unit_type: UnitType,
    debug_abbrev_offset: DebugAbbrevOffset,
    unit_offset: DebugInfoOffset,
    entries_buf: R,
}

impl<R: Reader> UnitHeader<R> {
    /// Construct a new `UnitHeader`.
    pub(crate) fn new(
        encoding: Encoding,
        unit_length: usize,
        unit_type: UnitType,
        debug_abbrev_offset: DebugAbbrevOffset,
        unit_offset: DebugInfoOffset,
        entries_buf: R,
    ) -> Self {
        UnitHeader {
            encoding,
            unit_length,
            unit_type,
            debug_abbrev_offset,
            unit_offset,
            entries_buf,
        }
    }

    /// Return the serialized size of the common unit header for the given
    /// DWARF format.
    pub fn size_of_header(&self) -> usize {
        let unit_length_size = self.encoding.format.initial_length_size() as usize;
        let version_size = 2;
        let debug_abbrev_offset_size = self.encoding.format.word_size() as usize;
        let address_size_size = 1;
        let unit_type_size = if self.encoding.version == 5 { 1 } else { 0 };
        let type_specific_size = match self.unit_type {
            UnitType::Compilation | UnitType::Partial => 0,
            UnitType::Type { .. } | UnitType::SplitType { .. } => {
                let type_signature_size = 8;
                let type_offset_size = self.encoding.format.word_size() as usize;
                type_signature_size + type_offset_size
            }
            UnitType::Skeleton(_) | UnitType::SplitCompilation(_) => 8,
        };

        unit_length_size
            + version_size
            + debug_abbrev_offset_size
            + address_size_size
            + unit_type_size
            + type_specific_size
    }

    /// Get the offset of this unit within the `.debug_info` section.
    pub fn offset(&self) -> DebugInfoOffset {
        self.unit_offset
    }

    /// Get the length of the debugging info for this compilation unit, not
    /// including the byte length of the encoded length itself.
    pub fn unit_length(&self) -> usize {
        self.unit_length
    }

    /// Get the length of the debugging info for this compilation unit,
    /// including the byte length of the encoded length itself.
    pub fn length_including_self(&self) -> usize {
        self.encoding.format.initial_length_size() as usize + self.unit_length
    }

    /// Return the encoding parameters for this unit.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Get the DWARF version of the debugging info for this compilation unit.
    pub fn version(&self) -> u16 {
        self.encoding.version
    }

    /// Get the UnitType of this unit.
    pub fn type_(&self) -> UnitType {
        self.unit_type
    }

    /// The offset into the `.debug_abbrev` section for this compilation unit's
    /// debugging information entries' abbreviations.
    pub fn debug_abbrev_offset(&self) -> DebugAbbrevOffset {
        self.debug_abbrev_offset
    }

    /// The size of addresses (in bytes) in this compilation unit.
    pub fn address_size(&self) -> u8 {
        self.encoding.address_size
    }

    /// Whether this compilation unit is encoded in 64- or 32-bit DWARF.
    pub fn format(&self) -> Format {
        self.encoding.format
    }

    /// The serialized size of the header for this compilation unit.
    pub fn header_size(&self) -> usize {
        self.length_including_self() - self.entries_buf.len()
    }

    /// Navigate this unit's `DebuggingInformationEntry`s.
    pub fn entries<'me, 'abbrev>(
        &'me self,
        abbreviations: &'abbrev Abbreviations,
    ) -> EntriesCursor<'abbrev, 'me, R> {
        EntriesCursor {
            unit: self,
            input: self.entries_buf.clone(),
            abbreviations,
            delta_depth: 0,
        }
    }

    /// Parse this unit's abbreviations.
    pub fn abbreviations(&self, debug_abbrev: &DebugAbbrev<R>) -> Result<Abbreviations> {
        debug_abbrev.abbreviations(self.debug_abbrev_offset())
    }
}

/// Parse a unit header.
fn parse_unit_header<R: Reader>(input: &mut R, unit_offset: DebugInfoOffset) -> Result<UnitHeader<R>> {
    let (unit_length, format) = input.read_initial_length()?;
    let mut rest = input.split(unit_length)?;

    let version = rest.read_u16()?;
    let abbrev_offset;
    let address_size;
    let unit_type;
    // DWARF 1 was very different, and is obsolete, so isn't supported by this
    // reader.
    if 2 <= version && version <= 4 {
        abbrev_offset = rest.read_offset(format)?;
        address_size = rest.read_address_size()?;
        // Before DWARF5, all units in the .debug_info section are compilation
        // units.
        unit_type = constants::DW_UT_compile;
    } else if version == 5 {
        unit_type = constants::DwUt(rest.read_u8()?);
        address_size = rest.read_address_size()?;
        abbrev_offset = rest.read_offset(format)?;
    } else {
        return Err(Error::UnknownVersion(u64::from(version)));
    }
    let encoding = Encoding {
        format,
        version,
        address_size,
    };

    // Parse any data specific to this type of unit.
    let unit_type = match unit_type {
        constants::DW_UT_compile => UnitType::Compilation,
        constants::DW_UT_type => {
            let type_signature = DebugTypeSignature(rest.read_u64()?);
            let type_offset = UnitOffset(rest.read_offset(format)?);
            UnitType::Type {
                type_signature,
                type_offset,
            }
        }
        constants::DW_UT_partial => UnitType::Partial,
        constants::DW_UT_skeleton => UnitType::Skeleton(DwoId(rest.read_u64()?)),
        constants::DW_UT_split_compile => UnitType::SplitCompilation(DwoId(rest.read_u64()?)),
        constants::DW_UT_split_type => {
            let type_signature = DebugTypeSignature(rest.read_u64()?);
            let type_offset = UnitOffset(rest.read_offset(format)?);
            UnitType::SplitType {
                type_signature,
                type_offset,
            }
        }
        _ => return Err(Error::UnknownUnitType(unit_type)),
    };

    Ok(UnitHeader::new(
        encoding,
        unit_length,
        unit_type,
        DebugAbbrevOffset(abbrev_offset),
        unit_offset,
        rest,
    ))
}

/// A Debugging Information Entry (DIE).
///
/// DIEs have a set of attributes and optionally have children DIEs as well.
/// The attributes are decoded when the entry is read, so an entry holds no
/// borrow of the cursor that produced it.
#[derive(Clone, Debug)]
pub struct DebuggingInformationEntry<'abbrev, R: Reader> {
    offset: UnitOffset,
    abbrev: &'abbrev Abbreviation,
    attrs: Vec<Attribute<R>>,
}

impl<'abbrev, R: Reader> DebuggingInformationEntry<'abbrev, R> {
    /// Get this entry's code.
    pub fn code(&self) -> u64 {
        self.abbrev.code()
    }

    /// Get this entry's offset.
    pub fn offset(&self) -> UnitOffset {
        self.offset
    }

    /// Get this entry's `DW_TAG_whatever` tag.
    pub fn tag(&self) -> constants::DwTag {
        self.abbrev.tag()
    }

    /// Return true if this entry's type can have children, false otherwise.
    pub fn has_children(&self) -> bool {
        self.abbrev.has_children()
    }

    /// Get this entry's attributes, in the order the abbreviation lists them.
    pub fn attrs(&self) -> &[Attribute<R>] {
        &self.attrs
    }

    /// Find the first attribute in this entry which has the given name,
    /// and return it. Returns `None` if no attribute is found.
    pub fn attr(&self, name: constants::DwAt) -> Option<&Attribute<R>> {
        self.attrs.iter().find(|attr| attr.name() == name)
    }

    /// Find the first attribute in this entry which has the given name,
    /// and return its normalized value.  Returns `None` if no attribute is found.
    pub fn attr_value(&self, name: constants::DwAt) -> Option<AttributeValue<R>> {
        self.attr(name).map(|attr| attr.value())
    }
}

/// The value of an attribute in a `DebuggingInformationEntry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeValue<R: Reader> {
    /// "Refers to some location in the address space of the described
    /// program."
    Addr(u64),

    /// A slice of an arbitrary number of bytes.
    Block(R),

    /// A one byte constant data value. How to interpret the byte depends on context.
    Data1(u8),

    /// A two byte constant data value. How to interpret the bytes depends on context.
    Data2(u16),

    /// A four byte constant data value. How to interpret the bytes depends on context.
    Data4(u32),

    /// An eight byte constant data value. How to interpret the bytes depends on context.
    Data8(u64),

    /// A sixteen byte constant data value, as stored.
    Data16([u8; 16]),

    /// A signed integer constant.
    Sdata(i64),

    /// An unsigned integer constant.
    Udata(u64),

    /// "The information bytes contain a DWARF expression (see Section 2.5) or
    /// location description (see Section 2.6)."
    Exprloc(R),

    /// A boolean that indicates presence or absence of the attribute.
    Flag(bool),

    /// An offset into another section. Which section this is an offset into
    /// depends on context.
    SecOffset(usize),

    /// An index into the `.debug_addr` section.
    DebugAddrIndex(DebugAddrIndex),

    /// A slice of bytes representing a string. Does not include a final null byte.
    /// Not guaranteed to be UTF-8 or anything like that.
    String(R),

    /// An offset into the `.debug_str` section.
    DebugStrRef(DebugStrOffset),

    /// An offset into the `.debug_str` section of the supplementary object file.
    DebugStrRefSup(DebugStrOffset),

    /// An offset into the `.debug_line_str` section.
    DebugLineStrRef(DebugLineStrOffset),

    /// An index into the `.debug_str_offsets` section.
    DebugStrOffsetsIndex(DebugStrOffsetsIndex),

    /// An offset to a set of entries in the `.debug_str_offsets` section.
    DebugStrOffsetsBase(DebugStrOffsetsBase),

    /// An offset into the current compilation unit.
    UnitRef(UnitOffset),

    /// An offset into the current `.debug_info` section, but possibly a
    /// different compilation unit from the current one.
    DebugInfoRef(DebugInfoOffset),

    /// An offset into the `.debug_info` section of the supplementary object file.
    DebugInfoRefSup(DebugInfoOffset),

    /// A type signature.
    DebugTypesRef(DebugTypeSignature),

    /// An offset into the `.debug_line` section.
    DebugLineRef(DebugLineOffset),

    /// An index into the location lists of the unit.
    DebugLocListsIndex(u64),

    /// An index into the range lists of the unit.
    DebugRngListsIndex(u64),
}

impl<R: Reader> AttributeValue<R> {
    /// Try to convert this attribute's value to a u64.
    pub fn udata_value(&self) -> Option<u64> {
        Some(match *self {
            AttributeValue::Data1(data) => u64::from(data),
            AttributeValue::Data2(data) => u64::from(data),
            AttributeValue::Data4(data) => u64::from(data),
            AttributeValue::Data8(data) => data,
            AttributeValue::Udata(data) => data,
            AttributeValue::Sdata(data) => {
                if data < 0 {
                    // Maybe we should emit a warning here
                    return None;
                }
                data as u64
            }
            _ => return None,
        })
    }
}

/// An attribute in a `DebuggingInformationEntry`, consisting of a name and
/// associated value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute<R: Reader> {
    name: constants::DwAt,
    value: AttributeValue<R>,
}

impl<R: Reader> Attribute<R> {
    /// Get this attribute's name.
    pub fn name(&self) -> constants::DwAt {
        self.name
    }

    /// Get this attribute's raw value.
    pub fn raw_value(&self) -> AttributeValue<R> {
        self.value.clone()
    }

    /// Get this attribute's normalized value.
    ///
    /// Attribute values can potentially be encoded in multiple equivalent forms,
    /// and may have special meaning depending on the attribute name.  This method
    /// converts the attribute value to a normalized form based on the attribute
    /// name.
    ///
    /// Only the section references this crate follows are normalized:
    /// `DW_AT_stmt_list` becomes `DebugLineRef` and `DW_AT_str_offsets_base`
    /// becomes `DebugStrOffsetsBase`.
    pub fn value(&self) -> AttributeValue<R> {
        match self.name {
            constants::DW_AT_stmt_list => {
                // DWARF version 2/3 use a constant class of data4 or data8
                // for this offset.
                let offset = match self.value {
                    AttributeValue::SecOffset(offset) => Some(offset),
                    AttributeValue::Data4(data) => Some(data as usize),
                    AttributeValue::Data8(data) => usize::try_from(data).ok(),
                    _ => None,
                };
                if let Some(offset) = offset {
                    return AttributeValue::DebugLineRef(DebugLineOffset(offset));
                }
            }
            constants::DW_AT_str_offsets_base => {
                if let AttributeValue::SecOffset(offset) = self.value {
                    return AttributeValue::DebugStrOffsetsBase(DebugStrOffsetsBase(offset));
                }
            }
            _ => {}
        }
        self.value.clone()
    }
}

fn length_u8_value<R: Reader>(input: &mut R) -> Result<R> {
    let len = input.read_u8()?;
    input.split(usize::from(len))
}

fn length_u16_value<R: Reader>(input: &mut R) -> Result<R> {
    let len = input.read_u16()?;
    input.split(usize::from(len))
}

fn length_u32_value<R: Reader>(input: &mut R) -> Result<R> {
    let len = input.read_u32()?;
    input.split(len as usize)
}

fn length_uleb_value<R: Reader>(input: &mut R) -> Result<R> {
    let len = input.read_uleb128().and_then(crate::read::u64_to_offset)?;
    input.split(len)
}

fn read_uleb_offset<R: Reader>(input: &mut R) -> Result<usize> {
    input.read_uleb128().and_then(crate::read::u64_to_offset)
}

/// Parse an attribute's value according to its form.
///
/// This is shared by debugging information entries and the entry formats of
/// version 5 line program headers. `implicit_const` is the constant stored in
/// the abbreviation, if any; line program entry formats never have one.
pub(crate) fn parse_attribute_value<R: Reader>(
    input: &mut R,
    encoding: Encoding,
    form: constants::DwForm,
    implicit_const: Option<i64>,
) -> Result<AttributeValue<R>> {
    let mut form = form;
    loop {
        let value = match form {
            constants::DW_FORM_indirect => {
                let dynamic_form = input.read_uleb128_u16()?;
                form = constants::DwForm(dynamic_form);
                if form == constants::DW_FORM_implicit_const {
                    return Err(Error::InvalidImplicitConst);
                }
                continue;
            }
            constants::DW_FORM_addr => {
                let addr = input.read_address(encoding.address_size)?;
                AttributeValue::Addr(addr)
            }
            constants::DW_FORM_block1 => {
                let block = length_u8_value(input)?;
                AttributeValue::Block(block)
            }
            constants::DW_FORM_block2 => {
                let block = length_u16_value(input)?;
                AttributeValue::Block(block)
            }
            constants::DW_FORM_block4 => {
                let block = length_u32_value(input)?;
                AttributeValue::Block(block)
            }
            constants::DW_FORM_block => {
                let block = length_uleb_value(input)?;
                AttributeValue::Block(block)
            }
            constants::DW_FORM_data1 => {
                let data = input.read_u8()?;
                AttributeValue::Data1(data)
            }
            constants::DW_FORM_data2 => {
                let data = input.read_u16()?;
                AttributeValue::Data2(data)
            }
            constants::DW_FORM_data4 => {
                let data = input.read_u32()?;
                AttributeValue::Data4(data)
            }
            constants::DW_FORM_data8 => {
                let data = input.read_u64()?;
                AttributeValue::Data8(data)
            }
            constants::DW_FORM_data16 => {
                let data = input.read_u8_array()?;
                AttributeValue::Data16(data)
            }
            constants::DW_FORM_udata => {
                let data = input.read_uleb128()?;
                AttributeValue::Udata(data)
            }
            constants::DW_FORM_sdata => {
                let data = input.read_sleb128()?;
                AttributeValue::Sdata(data)
            }
            constants::DW_FORM_exprloc => {
                let block = length_uleb_value(input)?;
                AttributeValue::Exprloc(block)
            }
            constants::DW_FORM_flag => {
                let present = input.read_u8()?;
                AttributeValue::Flag(present != 0)
            }
            constants::DW_FORM_flag_present => {
                // FlagPresent is this weird compile time always true thing that
                // isn't actually present in the serialized DIEs, only in the abbreviation.
                AttributeValue::Flag(true)
            }
            constants::DW_FORM_implicit_const => match implicit_const {
                Some(data) => AttributeValue::Sdata(data),
                None => return Err(Error::InvalidImplicitConst),
            },
            constants::DW_FORM_sec_offset => {
                let offset = input.read_offset(encoding.format)?;
                AttributeValue::SecOffset(offset)
            }
            constants::DW_FORM_ref1 => {
                let reference = input.read_u8()?;
                AttributeValue::UnitRef(UnitOffset(usize::from(reference)))
            }
            constants::DW_FORM_ref2 => {
                let reference = input.read_u16()?;
                AttributeValue::UnitRef(UnitOffset(usize::from(reference)))
            }
            constants::DW_FORM_ref4 => {
                let reference = input.read_u32()?;
                AttributeValue::UnitRef(UnitOffset(reference as usize))
            }
            constants::DW_FORM_ref8 => {
                let reference = input.read_u64().and_then(crate::read::u64_to_offset)?;
                AttributeValue::UnitRef(UnitOffset(reference))
            }
            constants::DW_FORM_ref_udata => {
                let reference = read_uleb_offset(input)?;
                AttributeValue::UnitRef(UnitOffset(reference))
            }
            constants::DW_FORM_ref_addr => {
                // This is an offset, but DWARF version 2 specifies that DW_FORM_ref_addr
                // has the same size as an address on the target system.  This was changed
                // in DWARF version 3.
                let offset = if encoding.version <= 2 {
                    input.read_sized_offset(encoding.address_size)?
                } else {
                    input.read_offset(encoding.format)?
                };
                AttributeValue::DebugInfoRef(DebugInfoOffset(offset))
            }
            constants::DW_FORM_ref_sig8 => {
                let signature = input.read_u64()?;
                AttributeValue::DebugTypesRef(DebugTypeSignature(signature))
            }
            constants::DW_FORM_ref_sup4 => {
                let offset = input.read_u32()?;
                AttributeValue::DebugInfoRefSup(DebugInfoOffset(offset as usize))
            }
            constants::DW_FORM_ref_sup8 => {
                let offset = input.read_u64().and_then(crate::read::u64_to_offset)?;
                AttributeValue::DebugInfoRefSup(DebugInfoOffset(offset))
            }
            constants::DW_FORM_GNU_ref_alt => {
                let offset = input.read_offset(encoding.format)?;
                AttributeValue::DebugInfoRefSup(DebugInfoOffset(offset))
            }
            constants::DW_FORM_string => {
                let string = input.read_null_terminated_slice()?;
                AttributeValue::String(string)
            }
            constants::DW_FORM_strp => {
                let offset = input.read_offset(encoding.format)?;
                AttributeValue::DebugStrRef(DebugStrOffset(offset))
            }
            constants::DW_FORM_strp_sup | constants::DW_FORM_GNU_strp_alt => {
                let offset = input.read_offset(encoding.format)?;
                AttributeValue::DebugStrRefSup(DebugStrOffset(offset))
            }
            constants::DW_FORM_line_strp => {
                let offset = input.read_offset(encoding.format)?;
                AttributeValue::DebugLineStrRef(DebugLineStrOffset(offset))
            }
            constants::DW_FORM_strx | constants::DW_FORM_GNU_str_index => {
                let index = read_uleb_offset(input)?;
                AttributeValue::DebugStrOffsetsIndex(DebugStrOffsetsIndex(index))
            }
            constants::DW_FORM_strx1 => {
                let index = input.read_u8()?;
                AttributeValue::DebugStrOffsetsIndex(DebugStrOffsetsIndex(usize::from(index)))
            }
            constants::DW_FORM_strx2 => {
                let index = input.read_u16()?;
                AttributeValue::DebugStrOffsetsIndex(DebugStrOffsetsIndex(usize::from(index)))
            }
            constants::DW_FORM_strx3 => {
                let index = input.read_uint(3)?;
                AttributeValue::DebugStrOffsetsIndex(DebugStrOffsetsIndex(index as usize))
            }
            constants::DW_FORM_strx4 => {
                let index = input.read_u32()?;
                AttributeValue::DebugStrOffsetsIndex(DebugStrOffsetsIndex(index as usize))
            }
            constants::DW_FORM_addrx | constants::DW_FORM_GNU_addr_index => {
                let index = read_uleb_offset(input)?;
                AttributeValue::DebugAddrIndex(DebugAddrIndex(index))
            }
            constants::DW_FORM_addrx1 => {
                let index = input.read_u8()?;
                AttributeValue::DebugAddrIndex(DebugAddrIndex(usize::from(index)))
            }
            constants::DW_FORM_addrx2 => {
                let index = input.read_u16()?;
                AttributeValue::DebugAddrIndex(DebugAddrIndex(usize::from(index)))
            }
            constants::DW_FORM_addrx3 => {
                let index = input.read_uint(3)?;
                AttributeValue::DebugAddrIndex(DebugAddrIndex(index as usize))
            }
            constants::DW_FORM_addrx4 => {
                let index = input.read_u32()?;
                AttributeValue::DebugAddrIndex(DebugAddrIndex(index as usize))
            }
            constants::DW_FORM_loclistx => {
                let index = input.read_uleb128()?;
                AttributeValue::DebugLocListsIndex(index)
            }
            constants::DW_FORM_rnglistx => {
                let index = input.read_uleb128()?;
                AttributeValue::DebugRngListsIndex(index)
            }
            _ => {
                return Err(Error::UnknownForm(form));
            }
        };
        return Ok(value);
    }
}

fn parse_attribute<R: Reader>(
    input: &mut R,
    encoding: Encoding,
    spec: AttributeSpecification,
) -> Result<Attribute<R>> {
    let value = parse_attribute_value(input, encoding, spec.form(), spec.implicit_const_value())?;
    Ok(Attribute {
        name: spec.name(),
        value,
    })
}

/// A cursor into the Debugging Information Entries tree for a compilation unit.
///
/// The `EntriesCursor` walks the entries in depth-first pre-order. Each call
/// to `next_dfs` decodes exactly one entry, so at most one entry's attributes
/// are held at a time.
#[derive(Clone, Debug)]
pub struct EntriesCursor<'abbrev, 'unit, R: Reader> {
    input: R,
    unit: &'unit UnitHeader<R>,
    abbreviations: &'abbrev Abbreviations,
    delta_depth: isize,
}

impl<'abbrev, 'unit, R: Reader> EntriesCursor<'abbrev, 'unit, R> {
    /// The offset within the unit of the next entry to be read.
    pub fn next_offset(&self) -> UnitOffset {
        UnitOffset(self.unit.header_size() + self.input.offset_from(&self.unit.entries_buf))
    }

    /// Move the cursor to the next DIE in the tree in DFS order.
    ///
    /// Upon successful movement of the cursor, return the delta traversal
    /// depth and the entry:
    ///
    ///   * If we moved down into the previous entry's children, we get
    ///     `Some((1, entry))`.
    ///
    ///   * If we moved to the previous entry's sibling, we get
    ///     `Some((0, entry))`.
    ///
    ///   * If the previous entry does not have any siblings and we move up to
    ///     its parent's next sibling, then we get `Some((-1, entry))`. Note that
    ///     if the parent doesn't have a next sibling, then it could go up to the
    ///     parent's parent's next sibling and return `Some((-2, entry))`, etc.
    ///
    /// If there is no next entry, then `None` is returned.
    ///
    /// After an error the cursor is exhausted.
    pub fn next_dfs(&mut self) -> Result<Option<(isize, DebuggingInformationEntry<'abbrev, R>)>> {
        match self.read_entry() {
            Ok(entry) => Ok(entry),
            Err(e) => {
                self.input.empty();
                self.delta_depth = 0;
                Err(e)
            }
        }
    }

    fn read_entry(&mut self) -> Result<Option<(isize, DebuggingInformationEntry<'abbrev, R>)>> {
        let mut delta_depth = self.delta_depth;
        loop {
            if self.input.is_empty() {
                self.delta_depth = 0;
                return Ok(None);
            }

            let offset = self.next_offset();
            let code = self.input.read_uleb128()?;
            if code == 0 {
                // A null entry ends the current sibling list.
                delta_depth -= 1;
                continue;
            }

            let abbrev = self
                .abbreviations
                .get(code)
                .ok_or(Error::InvalidAbbreviationCode(code))?;
            let mut attrs = Vec::with_capacity(abbrev.attributes().len());
            for spec in abbrev.attributes() {
                attrs.push(parse_attribute(&mut self.input, self.unit.encoding(), *spec)?);
            }

            self.delta_depth = abbrev.has_children() as isize;
            let entry = DebuggingInformationEntry {
                offset,
                abbrev,
                attrs,
            };
            return Ok(Some((delta_depth, entry)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::endianity::{BigEndian, LittleEndian};
    use crate::read::abbrev::tests::AbbrevSectionMethods;
    use crate::test_util::DwarfSectionMethods;
    use test_assembler::{Endian, Label, LabelMaker, Section};

    fn encoding(version: u16, format: Format) -> Encoding {
        Encoding {
            format,
            version,
            address_size: 8,
        }
    }

    /// Build a unit with the given header fields and entry bytes, setting the
    /// unit length to cover everything after the initial length.
    fn unit(
        endian: Endian,
        encoding: Encoding,
        unit_type: constants::DwUt,
        extra: &[u8],
        entries: &[u8],
    ) -> Vec<u8> {
        let length = Label::new();
        let start = Label::new();
        let end = Label::new();
        let section = Section::with_endian(endian)
            .initial_length(encoding.format, &length, &start)
            .D16(encoding.version);
        let section = if encoding.version >= 5 {
            section
                .D8(unit_type.0)
                .D8(encoding.address_size)
                .word(encoding.format.word_size(), 0)
        } else {
            section
                .word(encoding.format.word_size(), 0)
                .D8(encoding.address_size)
        };
        let section = section.append_bytes(extra).append_bytes(entries).mark(&end);
        length.set_const((&end - &start) as u64);
        section.get_contents().unwrap()
    }

    fn test_abbrevs() -> Vec<u8> {
        #[rustfmt::skip]
        let abbrevs = Section::with_endian(Endian::Little)
            .abbrev(1, DW_TAG_compile_unit, DW_CHILDREN_yes)
                .abbrev_attr(DW_AT_name, DW_FORM_string)
                .abbrev_attr(DW_AT_stmt_list, DW_FORM_sec_offset)
                .abbrev_attr_null()
            .abbrev(2, DW_TAG_subprogram, DW_CHILDREN_yes)
                .abbrev_attr(DW_AT_name, DW_FORM_string)
                .abbrev_attr_null()
            .abbrev(3, DW_TAG_variable, DW_CHILDREN_no)
                .abbrev_attr(DW_AT_name, DW_FORM_string)
                .abbrev_attr_null()
            .abbrev_null()
            .get_contents()
            .unwrap();
        abbrevs
    }

    #[test]
    fn test_parse_v4_unit_header() {
        let entries = [0u8];
        let buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &entries,
        );
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let header = debug_info.units().next().unwrap().unwrap();
        assert_eq!(header.version(), 4);
        assert_eq!(header.format(), Format::Dwarf32);
        assert_eq!(header.address_size(), 8);
        assert_eq!(header.type_(), UnitType::Compilation);
        assert_eq!(header.offset(), DebugInfoOffset(0));
        assert_eq!(header.header_size(), 11);
        assert_eq!(header.size_of_header(), 11);
        assert_eq!(header.length_including_self(), buf.len());
    }

    #[test]
    fn test_parse_v5_unit_header_dwarf64() {
        let entries = [0u8];
        let buf = unit(
            Endian::Big,
            encoding(5, Format::Dwarf64),
            DW_UT_skeleton,
            &[0, 0, 0, 0, 0, 0, 0x12, 0x34],
            &entries,
        );
        let debug_info = DebugInfo::new(&buf, BigEndian);
        let header = debug_info.units().next().unwrap().unwrap();
        assert_eq!(header.version(), 5);
        assert_eq!(header.format(), Format::Dwarf64);
        assert_eq!(header.type_(), UnitType::Skeleton(DwoId(0x1234)));
        assert_eq!(header.type_().dw_ut(), DW_UT_skeleton);
        assert_eq!(header.header_size(), header.size_of_header());
    }

    #[test]
    fn test_parse_unit_header_unknown_version() {
        let buf = unit(
            Endian::Little,
            encoding(6, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &[0],
        );
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let mut units = debug_info.units();
        assert_eq!(units.next().unwrap_err(), Error::UnknownVersion(6));
        // The iterator stops after an error.
        assert_eq!(units.next(), Ok(None));
    }

    #[test]
    fn test_parse_unit_header_unknown_unit_type() {
        let buf = unit(
            Endian::Little,
            encoding(5, Format::Dwarf32),
            DwUt(0x7f),
            &[],
            &[0],
        );
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        assert_eq!(
            debug_info.units().next().unwrap_err(),
            Error::UnknownUnitType(DwUt(0x7f))
        );
    }

    #[test]
    fn test_parse_unit_header_bad_address_size() {
        let mut enc = encoding(4, Format::Dwarf32);
        enc.address_size = 3;
        let buf = unit(Endian::Little, enc, DW_UT_compile, &[], &[0]);
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        assert_eq!(
            debug_info.units().next().unwrap_err(),
            Error::UnsupportedAddressSize(3)
        );
    }

    #[test]
    fn test_unit_length_exceeds_section() {
        let mut buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &[1, 0],
        );
        buf.truncate(buf.len() - 1);
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        assert_eq!(debug_info.units().next().unwrap_err(), Error::UnexpectedEof);
    }

    #[test]
    fn test_units_iter_offsets() {
        let mut buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &[0],
        );
        let first_len = buf.len();
        buf.extend(unit(
            Endian::Little,
            encoding(5, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &[0],
        ));

        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let mut units = debug_info.units();
        let first = units.next().unwrap().unwrap();
        let second = units.next().unwrap().unwrap();
        assert_eq!(first.offset(), DebugInfoOffset(0));
        assert_eq!(second.offset(), DebugInfoOffset(first_len));
        assert_eq!(units.offset(), DebugInfoOffset(buf.len()));
        assert_eq!(units.next(), Ok(None));

        let header = debug_info.header_from_offset(DebugInfoOffset(first_len)).unwrap();
        assert_eq!(header, second);
    }

    #[cfg(feature = "fallible-iterator")]
    #[test]
    fn test_units_fallible_iterator() {
        let mut buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &[0],
        );
        buf.extend(buf.clone());
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let count = FallibleIterator::count(debug_info.units()).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_next_dfs() {
        #[rustfmt::skip]
        let entries = Section::with_endian(Endian::Little)
            .uleb(1).cstr("root").D32(0x40)
                .uleb(2).cstr("main")
                    .uleb(3).cstr("x")
                    .uleb(3).cstr("y")
                .D8(0)
                .uleb(2).cstr("helper")
                .D8(0)
            .D8(0)
            .get_contents()
            .unwrap();
        let buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &entries,
        );
        let abbrev_buf = test_abbrevs();

        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let debug_abbrev = DebugAbbrev::new(&abbrev_buf, LittleEndian);
        let header = debug_info.units().next().unwrap().unwrap();
        let abbrevs = header.abbreviations(&debug_abbrev).unwrap();

        let mut cursor = header.entries(&abbrevs);
        let mut seen = Vec::new();
        while let Some((delta, entry)) = cursor.next_dfs().unwrap() {
            let name = match entry.attr_value(DW_AT_name) {
                Some(AttributeValue::String(s)) => s.to_string_lossy().into_owned(),
                otherwise => panic!("Unexpected name: {:?}", otherwise),
            };
            seen.push((delta, entry.tag(), name));
        }
        assert_eq!(
            seen,
            vec![
                (0, DW_TAG_compile_unit, "root".to_string()),
                (1, DW_TAG_subprogram, "main".to_string()),
                (1, DW_TAG_variable, "x".to_string()),
                (0, DW_TAG_variable, "y".to_string()),
                (-1, DW_TAG_subprogram, "helper".to_string()),
            ]
        );
    }

    #[test]
    fn test_entry_offsets_and_stmt_list() {
        #[rustfmt::skip]
        let entries = Section::with_endian(Endian::Little)
            .uleb(1).cstr("a.c").D32(0x1234)
            .D8(0)
            .get_contents()
            .unwrap();
        let buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &entries,
        );
        let abbrev_buf = test_abbrevs();
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let debug_abbrev = DebugAbbrev::new(&abbrev_buf, LittleEndian);
        let header = debug_info.units().next().unwrap().unwrap();
        let abbrevs = header.abbreviations(&debug_abbrev).unwrap();

        let mut cursor = header.entries(&abbrevs);
        assert_eq!(cursor.next_offset(), UnitOffset(11));
        let (_, root) = cursor.next_dfs().unwrap().unwrap();
        assert_eq!(root.offset(), UnitOffset(11));
        assert_eq!(root.code(), 1);
        assert!(root.has_children());
        assert_eq!(root.attrs().len(), 2);
        assert_eq!(
            root.attr(DW_AT_stmt_list).unwrap().raw_value(),
            AttributeValue::SecOffset(0x1234)
        );
        assert_eq!(
            root.attr_value(DW_AT_stmt_list),
            Some(AttributeValue::DebugLineRef(DebugLineOffset(0x1234)))
        );
        assert_eq!(root.attr_value(DW_AT_comp_dir), None);
        assert!(cursor.next_dfs().unwrap().is_none());
    }

    #[test]
    fn test_next_dfs_invalid_abbreviation_code() {
        let entries = [1, b'a', 0, 0, 0, 0, 0, 9, 0];
        let buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &entries,
        );
        let abbrev_buf = test_abbrevs();
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let debug_abbrev = DebugAbbrev::new(&abbrev_buf, LittleEndian);
        let header = debug_info.units().next().unwrap().unwrap();
        let abbrevs = header.abbreviations(&debug_abbrev).unwrap();

        let mut cursor = header.entries(&abbrevs);
        assert!(cursor.next_dfs().unwrap().is_some());
        assert_eq!(
            cursor.next_dfs().unwrap_err(),
            Error::InvalidAbbreviationCode(9)
        );
        // The cursor is exhausted after an error.
        assert!(cursor.next_dfs().unwrap().is_none());
    }

    #[test]
    fn test_next_dfs_attribute_past_unit_end() {
        // The string attribute is missing its terminator.
        let entries = [1, b'a', b'b'];
        let buf = unit(
            Endian::Little,
            encoding(4, Format::Dwarf32),
            DW_UT_compile,
            &[],
            &entries,
        );
        let abbrev_buf = test_abbrevs();
        let debug_info = DebugInfo::new(&buf, LittleEndian);
        let debug_abbrev = DebugAbbrev::new(&abbrev_buf, LittleEndian);
        let header = debug_info.units().next().unwrap().unwrap();
        let abbrevs = header.abbreviations(&debug_abbrev).unwrap();

        let mut cursor = header.entries(&abbrevs);
        assert_eq!(cursor.next_dfs().unwrap_err(), Error::UnexpectedEof);
    }

    fn parse_value(
        buf: &[u8],
        encoding: Encoding,
        form: DwForm,
        implicit_const: Option<i64>,
    ) -> (Result<AttributeValue<EndianSlice<'_, LittleEndian>>>, usize) {
        let input = &mut EndianSlice::new(buf, LittleEndian);
        let value = parse_attribute_value(input, encoding, form, implicit_const);
        (value, input.len())
    }

    #[test]
    fn test_parse_attribute_value_fixed_forms() {
        let enc = encoding(4, Format::Dwarf32);
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];

        let tests: Vec<(DwForm, AttributeValue<EndianSlice<'_, LittleEndian>>, usize)> = vec![
            (DW_FORM_addr, AttributeValue::Addr(0x0807_0605_0403_0201), 1),
            (DW_FORM_data1, AttributeValue::Data1(0x01), 8),
            (DW_FORM_data2, AttributeValue::Data2(0x0201), 7),
            (DW_FORM_data4, AttributeValue::Data4(0x0403_0201), 5),
            (DW_FORM_data8, AttributeValue::Data8(0x0807_0605_0403_0201), 1),
            (DW_FORM_flag, AttributeValue::Flag(true), 8),
            (DW_FORM_flag_present, AttributeValue::Flag(true), 9),
            (DW_FORM_sec_offset, AttributeValue::SecOffset(0x0403_0201), 5),
            (DW_FORM_ref1, AttributeValue::UnitRef(UnitOffset(0x01)), 8),
            (DW_FORM_ref2, AttributeValue::UnitRef(UnitOffset(0x0201)), 7),
            (DW_FORM_ref4, AttributeValue::UnitRef(UnitOffset(0x0403_0201)), 5),
            (
                DW_FORM_ref_addr,
                AttributeValue::DebugInfoRef(DebugInfoOffset(0x0403_0201)),
                5,
            ),
            (
                DW_FORM_ref_sig8,
                AttributeValue::DebugTypesRef(DebugTypeSignature(0x0807_0605_0403_0201)),
                1,
            ),
            (
                DW_FORM_strp,
                AttributeValue::DebugStrRef(DebugStrOffset(0x0403_0201)),
                5,
            ),
            (
                DW_FORM_line_strp,
                AttributeValue::DebugLineStrRef(DebugLineStrOffset(0x0403_0201)),
                5,
            ),
            (
                DW_FORM_GNU_strp_alt,
                AttributeValue::DebugStrRefSup(DebugStrOffset(0x0403_0201)),
                5,
            ),
            (
                DW_FORM_strx1,
                AttributeValue::DebugStrOffsetsIndex(DebugStrOffsetsIndex(0x01)),
                8,
            ),
            (
                DW_FORM_strx3,
                AttributeValue::DebugStrOffsetsIndex(DebugStrOffsetsIndex(0x03_0201)),
                6,
            ),
            (
                DW_FORM_addrx2,
                AttributeValue::DebugAddrIndex(DebugAddrIndex(0x0201)),
                7,
            ),
            (DW_FORM_udata, AttributeValue::Udata(0x01), 8),
            (DW_FORM_loclistx, AttributeValue::DebugLocListsIndex(0x01), 8),
        ];

        for (form, expected, rest) in tests {
            let (value, remaining) = parse_value(&buf, enc, form, None);
            assert_eq!(value, Ok(expected), "form {}", form);
            assert_eq!(remaining, rest, "form {}", form);
        }
    }

    #[test]
    fn test_parse_attribute_value_version_dependent() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

        // DWARF 2 uses the address size for DW_FORM_ref_addr.
        let mut v2 = encoding(2, Format::Dwarf32);
        v2.address_size = 8;
        let (value, remaining) = parse_value(&buf, v2, DW_FORM_ref_addr, None);
        assert_eq!(
            value,
            Ok(AttributeValue::DebugInfoRef(DebugInfoOffset(
                0x0807_0605_0403_0201
            )))
        );
        assert_eq!(remaining, 0);

        let dwarf64 = encoding(4, Format::Dwarf64);
        let (value, remaining) = parse_value(&buf, dwarf64, DW_FORM_strp, None);
        assert_eq!(
            value,
            Ok(AttributeValue::DebugStrRef(DebugStrOffset(
                0x0807_0605_0403_0201
            )))
        );
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_parse_attribute_value_blocks_and_strings() {
        let enc = encoding(4, Format::Dwarf32);

        let buf = [0x02, 0xaa, 0xbb, 0xcc];
        let (value, remaining) = parse_value(&buf, enc, DW_FORM_block1, None);
        assert_eq!(
            value,
            Ok(AttributeValue::Block(EndianSlice::new(
                &buf[1..3],
                LittleEndian
            )))
        );
        assert_eq!(remaining, 1);

        let (value, _) = parse_value(&buf, enc, DW_FORM_exprloc, None);
        assert_eq!(
            value,
            Ok(AttributeValue::Exprloc(EndianSlice::new(
                &buf[1..3],
                LittleEndian
            )))
        );

        let buf = b"util.c\0x";
        let (value, remaining) = parse_value(buf, enc, DW_FORM_string, None);
        assert_eq!(
            value,
            Ok(AttributeValue::String(EndianSlice::new(
                b"util.c",
                LittleEndian
            )))
        );
        assert_eq!(remaining, 1);

        let buf = [0x05, 0xaa];
        let (value, _) = parse_value(&buf, enc, DW_FORM_block1, None);
        assert_eq!(value, Err(Error::UnexpectedEof));
    }

    #[test]
    fn test_parse_attribute_value_indirect_and_implicit_const() {
        let enc = encoding(5, Format::Dwarf32);

        // DW_FORM_indirect followed by DW_FORM_udata and its value.
        let buf = [DW_FORM_udata.0 as u8, 0x2a];
        let (value, remaining) = parse_value(&buf, enc, DW_FORM_indirect, None);
        assert_eq!(value, Ok(AttributeValue::Udata(42)));
        assert_eq!(remaining, 0);

        let buf = [DW_FORM_implicit_const.0 as u8];
        let (value, _) = parse_value(&buf, enc, DW_FORM_indirect, None);
        assert_eq!(value, Err(Error::InvalidImplicitConst));

        let (value, remaining) = parse_value(&[], enc, DW_FORM_implicit_const, Some(-3));
        assert_eq!(value, Ok(AttributeValue::Sdata(-3)));
        assert_eq!(remaining, 0);

        let (value, _) = parse_value(&[], enc, DW_FORM_implicit_const, None);
        assert_eq!(value, Err(Error::InvalidImplicitConst));
    }

    #[test]
    fn test_parse_attribute_value_unknown_form() {
        let enc = encoding(4, Format::Dwarf32);
        let (value, _) = parse_value(&[0; 8], enc, DwForm(0x7f), None);
        assert_eq!(value, Err(Error::UnknownForm(DwForm(0x7f))));
    }

    #[test]
    fn test_attribute_value_normalization() {
        let attr: Attribute<EndianSlice<'_, LittleEndian>> = Attribute {
            name: DW_AT_stmt_list,
            value: AttributeValue::Data4(0x40),
        };
        assert_eq!(
            attr.value(),
            AttributeValue::DebugLineRef(DebugLineOffset(0x40))
        );

        let attr: Attribute<EndianSlice<'_, LittleEndian>> = Attribute {
            name: DW_AT_str_offsets_base,
            value: AttributeValue::SecOffset(8),
        };
        assert_eq!(
            attr.value(),
            AttributeValue::DebugStrOffsetsBase(DebugStrOffsetsBase(8))
        );

        let attr: Attribute<EndianSlice<'_, LittleEndian>> = Attribute {
            name: DW_AT_name,
            value: AttributeValue::Data4(0x40),
        };
        assert_eq!(attr.value(), AttributeValue::Data4(0x40));
    }
}
