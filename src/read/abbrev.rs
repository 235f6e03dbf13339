//! Functions for parsing DWARF debugging abbreviations.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::vec::Vec;

use crate::common::{DebugAbbrevOffset, SectionId};
use crate::constants;
use crate::endianity::Endianity;
use crate::read::{EndianSlice, Error, Reader, Result, Section};

/// The `DebugAbbrev` struct represents the abbreviations describing
/// `DebuggingInformationEntry`s' attribute names and forms found in the
/// `.debug_abbrev` section.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugAbbrev<R> {
    debug_abbrev_section: R,
}

impl<'input, Endian> DebugAbbrev<EndianSlice<'input, Endian>>
where
    Endian: Endianity,
{
    /// Construct a new `DebugAbbrev` instance from the data in the `.debug_abbrev`
    /// section.
    ///
    /// It is the caller's responsibility to read the `.debug_abbrev` section and
    /// present it as a `&[u8]` slice. The container reader in this crate does
    /// this for ELF files.
    ///
    /// ```
    /// use dwsrc::read::DebugAbbrev;
    /// use dwsrc::LittleEndian;
    ///
    /// # let buf = [0x00, 0x01, 0x02, 0x03];
    /// # let read_debug_abbrev_section_somehow = || &buf;
    /// let debug_abbrev = DebugAbbrev::new(read_debug_abbrev_section_somehow(), LittleEndian);
    /// ```
    pub fn new(debug_abbrev_section: &'input [u8], endian: Endian) -> Self {
        Self::from(EndianSlice::new(debug_abbrev_section, endian))
    }
}

impl<R: Reader> DebugAbbrev<R> {
    /// Parse the abbreviations at the given `offset` within this
    /// `.debug_abbrev` section.
    ///
    /// The `offset` should generally be retrieved from a unit header.
    pub fn abbreviations(&self, debug_abbrev_offset: DebugAbbrevOffset) -> Result<Abbreviations> {
        let input = &mut self.debug_abbrev_section.clone();
        if debug_abbrev_offset.0 > input.len() {
            return Err(Error::OffsetOutOfBounds(debug_abbrev_offset.0 as u64));
        }
        input.skip(debug_abbrev_offset.0)?;
        Abbreviations::parse(input)
    }
}

impl<R> Section<R> for DebugAbbrev<R> {
    fn id() -> SectionId {
        SectionId::DebugAbbrev
    }

    fn reader(&self) -> &R {
        &self.debug_abbrev_section
    }
}

impl<R> From<R> for DebugAbbrev<R> {
    fn from(debug_abbrev_section: R) -> Self {
        DebugAbbrev {
            debug_abbrev_section,
        }
    }
}

/// A set of type abbreviations.
///
/// Construct an `Abbreviations` instance with the
/// [`abbreviations()`](struct.DebugAbbrev.html#method.abbreviations)
/// method.
#[derive(Debug, Default, Clone)]
pub struct Abbreviations {
    vec: Vec<Abbreviation>,
    map: BTreeMap<u64, Abbreviation>,
}

impl Abbreviations {
    /// Construct a new, empty set of abbreviations.
    fn empty() -> Abbreviations {
        Abbreviations {
            vec: Vec::new(),
            map: BTreeMap::new(),
        }
    }

    /// Insert an abbreviation into the set.
    ///
    /// Returns `Ok` if it is the first abbreviation in the set with its code,
    /// `Err` if the code is a duplicate and there already exists an
    /// abbreviation in the set with the given abbreviation's code.
    fn insert(&mut self, abbrev: Abbreviation) -> ::core::result::Result<(), ()> {
        let code_usize = abbrev.code as usize;
        if code_usize as u64 == abbrev.code {
            // Optimize for sequential abbreviation codes by storing them
            // in a Vec, as long as the map doesn't already contain them.
            // A potential further optimization would be to allow some
            // holes in the Vec, but there's no need for that yet.
            if code_usize - 1 < self.vec.len() {
                return Err(());
            } else if code_usize - 1 == self.vec.len() {
                if !self.map.is_empty() && self.map.contains_key(&abbrev.code) {
                    return Err(());
                } else {
                    self.vec.push(abbrev);
                    return Ok(());
                }
            }
        }
        match self.map.entry(abbrev.code) {
            btree_map::Entry::Occupied(_) => Err(()),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(abbrev);
                Ok(())
            }
        }
    }

    /// Get the abbreviation associated with the given code.
    #[inline]
    pub fn get(&self, code: u64) -> Option<&Abbreviation> {
        if let Ok(code) = usize::try_from(code) {
            let index = code.checked_sub(1)?;
            if index < self.vec.len() {
                return Some(&self.vec[index]);
            }
        }

        self.map.get(&code)
    }

    /// The number of abbreviations in the set.
    pub fn len(&self) -> usize {
        self.vec.len() + self.map.len()
    }

    /// Return true if the set holds no abbreviations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a series of abbreviations, terminated by a null abbreviation.
    fn parse<R: Reader>(input: &mut R) -> Result<Abbreviations> {
        let mut abbrevs = Abbreviations::empty();

        while let Some(abbrev) = Abbreviation::parse(input)? {
            let code = abbrev.code;
            if abbrevs.insert(abbrev).is_err() {
                return Err(Error::DuplicateAbbreviationCode(code));
            }
        }

        Ok(abbrevs)
    }
}

/// An abbreviation describes the shape of a `DebuggingInformationEntry`'s type:
/// its code, tag type, whether it has children, and its set of attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    code: u64,
    tag: constants::DwTag,
    has_children: constants::DwChildren,
    attributes: Vec<AttributeSpecification>,
}

impl Abbreviation {
    /// Construct a new `Abbreviation`.
    ///
    /// ### Panics
    ///
    /// Panics if `code` is `0`.
    pub(crate) fn new(
        code: u64,
        tag: constants::DwTag,
        has_children: constants::DwChildren,
        attributes: Vec<AttributeSpecification>,
    ) -> Abbreviation {
        assert_ne!(code, 0);
        Abbreviation {
            code,
            tag,
            has_children,
            attributes,
        }
    }

    /// Get this abbreviation's code.
    #[inline]
    pub fn code(&self) -> u64 {
        self.code
    }

    /// Get this abbreviation's tag.
    #[inline]
    pub fn tag(&self) -> constants::DwTag {
        self.tag
    }

    /// Return true if this abbreviation's type has children, false otherwise.
    #[inline]
    pub fn has_children(&self) -> bool {
        self.has_children == constants::DW_CHILDREN_yes
    }

    /// Get this abbreviation's attributes.
    #[inline]
    pub fn attributes(&self) -> &[AttributeSpecification] {
        &self.attributes[..]
    }

    /// Parse an abbreviation's tag.
    fn parse_tag<R: Reader>(input: &mut R) -> Result<constants::DwTag> {
        let val = input.read_uleb128_u16()?;
        if val == 0 {
            Err(Error::AbbreviationTagZero)
        } else {
            Ok(constants::DwTag(val))
        }
    }

    /// Parse an abbreviation's "does the type have children?" byte.
    fn parse_has_children<R: Reader>(input: &mut R) -> Result<constants::DwChildren> {
        let val = input.read_u8()?;
        let val = constants::DwChildren(val);
        if val == constants::DW_CHILDREN_no || val == constants::DW_CHILDREN_yes {
            Ok(val)
        } else {
            Err(Error::InvalidAbbreviationChildren(val))
        }
    }

    /// Parse a series of attribute specifications, terminated by a null attribute
    /// specification.
    fn parse_attributes<R: Reader>(input: &mut R) -> Result<Vec<AttributeSpecification>> {
        let mut attrs = Vec::new();

        while let Some(attr) = AttributeSpecification::parse(input)? {
            attrs.push(attr);
        }

        Ok(attrs)
    }

    /// Parse an abbreviation. Return `None` for the null abbreviation, `Some`
    /// for an actual abbreviation.
    fn parse<R: Reader>(input: &mut R) -> Result<Option<Abbreviation>> {
        let code = input.read_uleb128()?;
        if code == 0 {
            return Ok(None);
        }

        let tag = Self::parse_tag(input)?;
        let has_children = Self::parse_has_children(input)?;
        let attributes = Self::parse_attributes(input)?;
        let abbrev = Abbreviation::new(code, tag, has_children, attributes);
        Ok(Some(abbrev))
    }
}

/// The description of an attribute in an abbreviated type. It is a pair of name
/// and form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpecification {
    name: constants::DwAt,
    form: constants::DwForm,
    implicit_const_value: i64,
}

impl AttributeSpecification {
    /// Construct a new `AttributeSpecification` from the given name and form
    /// and implicit const value.
    #[inline]
    pub(crate) fn new(
        name: constants::DwAt,
        form: constants::DwForm,
        implicit_const_value: Option<i64>,
    ) -> AttributeSpecification {
        debug_assert!(
            (form == constants::DW_FORM_implicit_const && implicit_const_value.is_some())
                || (form != constants::DW_FORM_implicit_const && implicit_const_value.is_none())
        );
        AttributeSpecification {
            name,
            form,
            implicit_const_value: implicit_const_value.unwrap_or(0),
        }
    }

    /// Get the attribute's name.
    #[inline]
    pub fn name(&self) -> constants::DwAt {
        self.name
    }

    /// Get the attribute's form.
    #[inline]
    pub fn form(&self) -> constants::DwForm {
        self.form
    }

    /// Get the attribute's implicit const value.
    #[inline]
    pub fn implicit_const_value(&self) -> Option<i64> {
        if self.form == constants::DW_FORM_implicit_const {
            Some(self.implicit_const_value)
        } else {
            None
        }
    }

    /// Parse an attribute specification. Returns `None` for the null attribute
    /// specification, `Some` for an actual attribute specification.
    fn parse<R: Reader>(input: &mut R) -> Result<Option<AttributeSpecification>> {
        let name = input.read_uleb128_u16()?;
        let form = input.read_uleb128_u16()?;
        match (name, form) {
            (0, 0) => return Ok(None),
            (0, _) => return Err(Error::AttributeNameZero),
            (_, 0) => return Err(Error::AttributeFormZero),
            _ => {}
        }

        let name = constants::DwAt(name);
        let form = constants::DwForm(form);
        let implicit_const_value = if form == constants::DW_FORM_implicit_const {
            Some(input.read_sleb128()?)
        } else {
            None
        };
        Ok(Some(AttributeSpecification::new(
            name,
            form,
            implicit_const_value,
        )))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants;
    use crate::endianity::LittleEndian;
    use crate::test_util::DwarfSectionMethods;
    use test_assembler::Section;

    pub(crate) trait AbbrevSectionMethods {
        fn abbrev(self, code: u64, tag: constants::DwTag, children: constants::DwChildren) -> Self;
        fn abbrev_null(self) -> Self;
        fn abbrev_attr(self, name: constants::DwAt, form: constants::DwForm) -> Self;
        fn abbrev_attr_implicit_const(self, name: constants::DwAt, value: i64) -> Self;
        fn abbrev_attr_null(self) -> Self;
    }

    impl AbbrevSectionMethods for Section {
        fn abbrev(self, code: u64, tag: constants::DwTag, children: constants::DwChildren) -> Self {
            self.uleb(code).uleb(tag.0.into()).D8(children.0)
        }

        fn abbrev_null(self) -> Self {
            self.D8(0)
        }

        fn abbrev_attr(self, name: constants::DwAt, form: constants::DwForm) -> Self {
            self.uleb(name.0.into()).uleb(form.0.into())
        }

        fn abbrev_attr_implicit_const(self, name: constants::DwAt, value: i64) -> Self {
            self.uleb(name.0.into())
                .uleb(constants::DW_FORM_implicit_const.0.into())
                .sleb(value)
        }

        fn abbrev_attr_null(self) -> Self {
            self.D8(0).D8(0)
        }
    }

    fn compile_unit_and_subprogram() -> (Abbreviation, Abbreviation) {
        let abbrev1 = Abbreviation::new(
            1,
            constants::DW_TAG_compile_unit,
            constants::DW_CHILDREN_yes,
            vec![
                AttributeSpecification::new(
                    constants::DW_AT_producer,
                    constants::DW_FORM_strp,
                    None,
                ),
                AttributeSpecification::new(
                    constants::DW_AT_stmt_list,
                    constants::DW_FORM_sec_offset,
                    None,
                ),
            ],
        );

        let abbrev2 = Abbreviation::new(
            2,
            constants::DW_TAG_subprogram,
            constants::DW_CHILDREN_no,
            vec![AttributeSpecification::new(
                constants::DW_AT_name,
                constants::DW_FORM_string,
                None,
            )],
        );
        (abbrev1, abbrev2)
    }

    #[test]
    fn test_debug_abbrev_ok() {
        let extra_start = [1, 2, 3, 4];
        let expected_rest = [5, 6, 7, 8];
        #[rustfmt::skip]
        let buf = Section::new()
            .append_bytes(&extra_start)
            .abbrev(2, constants::DW_TAG_subprogram, constants::DW_CHILDREN_no)
                .abbrev_attr(constants::DW_AT_name, constants::DW_FORM_string)
                .abbrev_attr_null()
            .abbrev(1, constants::DW_TAG_compile_unit, constants::DW_CHILDREN_yes)
                .abbrev_attr(constants::DW_AT_producer, constants::DW_FORM_strp)
                .abbrev_attr(constants::DW_AT_stmt_list, constants::DW_FORM_sec_offset)
                .abbrev_attr_null()
            .abbrev_null()
            .append_bytes(&expected_rest)
            .get_contents()
            .unwrap();

        let (abbrev1, abbrev2) = compile_unit_and_subprogram();

        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        let debug_abbrev_offset = DebugAbbrevOffset(extra_start.len());
        let abbrevs = debug_abbrev
            .abbreviations(debug_abbrev_offset)
            .expect("Should parse abbreviations");
        assert_eq!(abbrevs.get(1), Some(&abbrev1));
        assert_eq!(abbrevs.get(2), Some(&abbrev2));
        assert_eq!(abbrevs.get(3), None);
        assert_eq!(abbrevs.len(), 2);
    }

    #[test]
    fn test_abbreviations_sparse_codes() {
        #[rustfmt::skip]
        let buf = Section::new()
            .abbrev(1, constants::DW_TAG_compile_unit, constants::DW_CHILDREN_yes)
                .abbrev_attr_null()
            .abbrev(300, constants::DW_TAG_variable, constants::DW_CHILDREN_no)
                .abbrev_attr(constants::DW_AT_name, constants::DW_FORM_strp)
                .abbrev_attr_null()
            .abbrev_null()
            .get_contents()
            .unwrap();

        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        let abbrevs = debug_abbrev.abbreviations(DebugAbbrevOffset(0)).unwrap();
        assert_eq!(abbrevs.get(300).map(|a| a.tag()), Some(constants::DW_TAG_variable));
        assert_eq!(abbrevs.get(0), None);
        assert_eq!(abbrevs.get(2), None);
    }

    #[test]
    fn test_abbreviations_duplicate() {
        #[rustfmt::skip]
        let buf = Section::new()
            .abbrev(1, constants::DW_TAG_subprogram, constants::DW_CHILDREN_no)
                .abbrev_attr(constants::DW_AT_name, constants::DW_FORM_string)
                .abbrev_attr_null()
            .abbrev(1, constants::DW_TAG_compile_unit, constants::DW_CHILDREN_yes)
                .abbrev_attr(constants::DW_AT_producer, constants::DW_FORM_strp)
                .abbrev_attr_null()
            .abbrev_null()
            .get_contents()
            .unwrap();

        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        match debug_abbrev.abbreviations(DebugAbbrevOffset(0)) {
            Err(Error::DuplicateAbbreviationCode(1)) => {}
            otherwise => panic!("Unexpected result: {:?}", otherwise),
        };
    }

    #[test]
    fn test_abbreviation_tag_zero() {
        let buf = Section::new()
            .abbrev(1, constants::DwTag(0), constants::DW_CHILDREN_no)
            .get_contents()
            .unwrap();

        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        match debug_abbrev.abbreviations(DebugAbbrevOffset(0)) {
            Err(Error::AbbreviationTagZero) => {}
            otherwise => panic!("Unexpected result: {:?}", otherwise),
        };
    }

    #[test]
    fn test_abbreviation_has_children() {
        let buf = Section::new()
            .abbrev(1, constants::DW_TAG_compile_unit, constants::DwChildren(2))
            .get_contents()
            .unwrap();

        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        match debug_abbrev.abbreviations(DebugAbbrevOffset(0)) {
            Err(Error::InvalidAbbreviationChildren(constants::DwChildren(2))) => {}
            otherwise => panic!("Unexpected result: {:?}", otherwise),
        };
    }

    #[test]
    fn test_attribute_specification_zero_partner() {
        let name_zero = Section::new()
            .abbrev(1, constants::DW_TAG_compile_unit, constants::DW_CHILDREN_no)
            .abbrev_attr(constants::DwAt(0), constants::DW_FORM_strp)
            .get_contents()
            .unwrap();
        let debug_abbrev = DebugAbbrev::new(&name_zero, LittleEndian);
        assert_eq!(
            debug_abbrev.abbreviations(DebugAbbrevOffset(0)).unwrap_err(),
            Error::AttributeNameZero
        );

        let form_zero = Section::new()
            .abbrev(1, constants::DW_TAG_compile_unit, constants::DW_CHILDREN_no)
            .abbrev_attr(constants::DW_AT_name, constants::DwForm(0))
            .get_contents()
            .unwrap();
        let debug_abbrev = DebugAbbrev::new(&form_zero, LittleEndian);
        assert_eq!(
            debug_abbrev.abbreviations(DebugAbbrevOffset(0)).unwrap_err(),
            Error::AttributeFormZero
        );
    }

    #[test]
    fn test_abbreviations_truncated() {
        // No null attribute specification and no null abbreviation.
        let buf = Section::new()
            .abbrev(1, constants::DW_TAG_compile_unit, constants::DW_CHILDREN_yes)
            .abbrev_attr(constants::DW_AT_name, constants::DW_FORM_string)
            .get_contents()
            .unwrap();

        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        assert_eq!(
            debug_abbrev.abbreviations(DebugAbbrevOffset(0)).unwrap_err(),
            Error::UnexpectedEof
        );
    }

    #[test]
    fn test_abbreviations_offset_out_of_bounds() {
        let buf = [0u8; 4];
        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        assert_eq!(
            debug_abbrev.abbreviations(DebugAbbrevOffset(5)).unwrap_err(),
            Error::OffsetOutOfBounds(5)
        );
    }

    #[test]
    fn test_abbreviation_implicit_const() {
        #[rustfmt::skip]
        let buf = Section::new()
            .abbrev(1, constants::DW_TAG_subprogram, constants::DW_CHILDREN_no)
                .abbrev_attr_implicit_const(constants::DW_AT_decl_file, -42)
                .abbrev_attr_null()
            .abbrev_null()
            .get_contents()
            .unwrap();

        let debug_abbrev = DebugAbbrev::new(&buf, LittleEndian);
        let abbrevs = debug_abbrev.abbreviations(DebugAbbrevOffset(0)).unwrap();
        let attrs = abbrevs.get(1).unwrap().attributes();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].form(), constants::DW_FORM_implicit_const);
        assert_eq!(attrs[0].implicit_const_value(), Some(-42));
    }
}
