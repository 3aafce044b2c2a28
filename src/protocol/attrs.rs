//! Server attribute set and its wire encoding.
//!
//! Attributes configure the database job backing a session. The set is
//! sparse: only attributes the caller actually sets are negotiated —
//! absence means "leave the server default alone", not "send zero".
//! Each attribute has a fixed 2-byte identifier and one of a small
//! number of payload shapes:
//!
//! | Shape                  | Layout                                   |
//! |------------------------|------------------------------------------|
//! | 16-bit value           | LL(4) id(2) value(2)                     |
//! | byte flag              | LL(4) id(2) value(1)                     |
//! | 32-bit value           | LL(4) id(2) value(4)                     |
//! | fixed EBCDIC           | LL(4) id(2) ccsid(2) text(4 or 10)       |
//! | variable EBCDIC        | LL(4) id(2) ccsid(2) len(2) text         |
//! | NLSS sort identifier   | LL(4) id(2) mode(2) mode-specific        |
//! | decimal precision      | LL(4) id(2) three 16-bit values          |
//! | opaque bytes           | LL(4) id(2) bytes                        |
//!
//! Every LL counts the whole entry, its own four bytes included.

#![allow(missing_docs)]

use bytes::Bytes;

use crate::ebcdic::CCSID;
use crate::error::{DbHostError, Result};
use crate::wire::RequestBuffer;

/// Attribute identifiers, one per negotiable server attribute.
///
/// The discriminant is the wire code point, so the enum doubles as the
/// identifier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum AttributeId {
    DefaultClientCcsid = 0x3801,
    LanguageFeatureCode = 0x3802,
    ClientFunctionalLevel = 0x3803,
    NlssIdentifier = 0x3804,
    TranslateIndicator = 0x3805,
    DrdaPackageSize = 0x3806,
    DateFormat = 0x3807,
    DateSeparator = 0x3808,
    TimeFormat = 0x3809,
    TimeSeparator = 0x380A,
    DecimalSeparator = 0x380B,
    NamingConvention = 0x380C,
    IgnoreDecimalDataError = 0x380D,
    CommitmentControlLevel = 0x380E,
    DefaultSqlLibraryName = 0x380F,
    AsciiCcsidForTranslationTable = 0x3810,
    AmbiguousSelectOption = 0x3811,
    PackageAddStatementAllowed = 0x3812,
    UseExtendedFormats = 0x3821,
    LobFieldThreshold = 0x3822,
    DataCompressionParameter = 0x3823,
    TrueAutoCommitIndicator = 0x3824,
    ClientSupportInformation = 0x3825,
    RdbName = 0x3826,
    DecimalFloatingPointRoundingMode = 0x3827,
    DecimalFloatingPointErrorReporting = 0x3828,
    ClientAccountingInformation = 0x3829,
    ClientApplicationName = 0x382A,
    ClientUserIdentifier = 0x382B,
    ClientWorkstationName = 0x382C,
    ClientProgramIdentifier = 0x382D,
    InterfaceType = 0x382E,
    InterfaceName = 0x382F,
    InterfaceLevel = 0x3830,
    MaximumDecimalPrecision = 0x3831,
    HexadecimalConstantParserOption = 0x3832,
    InputLocatorType = 0x3833,
    LocatorPersistence = 0x3834,
    EwlmCorrelator = 0x3835,
    RleCompression = 0x3836,
    OptimizationGoalIndicator = 0x3837,
    QueryStorageLimit = 0x3838,
    CloseOnEof = 0x3839,
}

impl AttributeId {
    /// The 2-byte wire identifier.
    pub fn code_point(self) -> u16 {
        self as u16
    }

    /// Reverse lookup from a wire identifier.
    pub fn from_code_point(cp: u16) -> Option<Self> {
        use AttributeId::*;
        Some(match cp {
            0x3801 => DefaultClientCcsid,
            0x3802 => LanguageFeatureCode,
            0x3803 => ClientFunctionalLevel,
            0x3804 => NlssIdentifier,
            0x3805 => TranslateIndicator,
            0x3806 => DrdaPackageSize,
            0x3807 => DateFormat,
            0x3808 => DateSeparator,
            0x3809 => TimeFormat,
            0x380A => TimeSeparator,
            0x380B => DecimalSeparator,
            0x380C => NamingConvention,
            0x380D => IgnoreDecimalDataError,
            0x380E => CommitmentControlLevel,
            0x380F => DefaultSqlLibraryName,
            0x3810 => AsciiCcsidForTranslationTable,
            0x3811 => AmbiguousSelectOption,
            0x3812 => PackageAddStatementAllowed,
            0x3821 => UseExtendedFormats,
            0x3822 => LobFieldThreshold,
            0x3823 => DataCompressionParameter,
            0x3824 => TrueAutoCommitIndicator,
            0x3825 => ClientSupportInformation,
            0x3826 => RdbName,
            0x3827 => DecimalFloatingPointRoundingMode,
            0x3828 => DecimalFloatingPointErrorReporting,
            0x3829 => ClientAccountingInformation,
            0x382A => ClientApplicationName,
            0x382B => ClientUserIdentifier,
            0x382C => ClientWorkstationName,
            0x382D => ClientProgramIdentifier,
            0x382E => InterfaceType,
            0x382F => InterfaceName,
            0x3830 => InterfaceLevel,
            0x3831 => MaximumDecimalPrecision,
            0x3832 => HexadecimalConstantParserOption,
            0x3833 => InputLocatorType,
            0x3834 => LocatorPersistence,
            0x3835 => EwlmCorrelator,
            0x3836 => RleCompression,
            0x3837 => OptimizationGoalIndicator,
            0x3838 => QueryStorageLimit,
            0x3839 => CloseOnEof,
            _ => return None,
        })
    }
}

/// National language sort sequence selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NlssIdentifier {
    /// Mode 1: sort by the shared-weight table of a language.
    SharedWeight { language_id: String },
    /// Mode 2: sort by the unique-weight table of a language.
    UniqueWeight { language_id: String },
    /// Mode 3: sort by a user sort table.
    SortTable { name: String, library: String },
}

impl NlssIdentifier {
    fn mode(&self) -> u16 {
        match self {
            NlssIdentifier::SharedWeight { .. } => 1,
            NlssIdentifier::UniqueWeight { .. } => 2,
            NlssIdentifier::SortTable { .. } => 3,
        }
    }
}

/// Decimal arithmetic limits, negotiated only as a complete bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalPrecision {
    pub maximum_precision: u16,
    pub maximum_scale: u16,
    pub minimum_divide_scale: u16,
}

/// The sparse server attribute set.
///
/// `None` everywhere by default; set only what the session should
/// negotiate. Zero is a legitimate present value — presence and value
/// are independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerAttributes {
    // 16-bit parser and encoding options.
    pub default_client_ccsid: Option<u16>,
    pub drda_package_size: Option<u16>,
    pub date_format: Option<u16>,
    pub date_separator: Option<u16>,
    pub time_format: Option<u16>,
    pub time_separator: Option<u16>,
    pub decimal_separator: Option<u16>,
    pub naming_convention: Option<u16>,
    pub ignore_decimal_data_error: Option<u16>,
    pub commitment_control_level: Option<u16>,
    pub ascii_ccsid_for_translation_table: Option<u16>,
    pub ambiguous_select_option: Option<u16>,
    pub package_add_statement_allowed: Option<u16>,
    pub data_compression_parameter: Option<u16>,
    pub locator_persistence: Option<u16>,
    pub decimal_floating_point_rounding_mode: Option<u16>,
    pub decimal_floating_point_error_reporting: Option<u16>,

    // Fixed-width EBCDIC identifiers.
    pub language_feature_code: Option<String>,
    pub client_functional_level: Option<String>,

    pub nlss_identifier: Option<NlssIdentifier>,

    // Single-byte flags.
    pub translate_indicator: Option<u8>,
    pub use_extended_formats: Option<u8>,
    pub true_auto_commit_indicator: Option<u8>,
    pub hexadecimal_constant_parser_option: Option<u8>,
    pub input_locator_type: Option<u8>,
    pub optimization_goal_indicator: Option<u8>,
    pub close_on_eof: Option<u8>,

    // 32-bit values.
    pub lob_field_threshold: Option<u32>,
    pub client_support_information: Option<u32>,
    pub query_storage_limit: Option<u32>,

    pub rdb_name: Option<String>,

    pub decimal_precision: Option<DecimalPrecision>,

    pub ewlm_correlator: Option<Vec<u8>>,

    // Variable-length EBCDIC names and identifiers.
    pub default_sql_library_name: Option<String>,
    pub rle_compression: Option<String>,
    pub client_accounting_information: Option<String>,
    pub client_application_name: Option<String>,
    pub client_user_identifier: Option<String>,
    pub client_workstation_name: Option<String>,
    pub client_program_identifier: Option<String>,
    pub interface_type: Option<String>,
    pub interface_name: Option<String>,
    pub interface_level: Option<String>,
}

impl ServerAttributes {
    /// Encode every present attribute.
    ///
    /// Returns the concatenated entry bytes and the entry count for the
    /// request template. The number of bytes always equals the sum of
    /// the entries' leading LL values.
    pub fn encode(&self) -> Result<(Bytes, u16)> {
        let mut buf = RequestBuffer::new();
        let mut count: u16 = 0;

        let shorts = [
            (AttributeId::DefaultClientCcsid, self.default_client_ccsid),
            (AttributeId::DrdaPackageSize, self.drda_package_size),
            (AttributeId::DateFormat, self.date_format),
            (AttributeId::DateSeparator, self.date_separator),
            (AttributeId::TimeFormat, self.time_format),
            (AttributeId::TimeSeparator, self.time_separator),
            (AttributeId::DecimalSeparator, self.decimal_separator),
            (AttributeId::NamingConvention, self.naming_convention),
            (AttributeId::IgnoreDecimalDataError, self.ignore_decimal_data_error),
            (AttributeId::CommitmentControlLevel, self.commitment_control_level),
            (AttributeId::AsciiCcsidForTranslationTable, self.ascii_ccsid_for_translation_table),
            (AttributeId::AmbiguousSelectOption, self.ambiguous_select_option),
            (AttributeId::PackageAddStatementAllowed, self.package_add_statement_allowed),
            (AttributeId::DataCompressionParameter, self.data_compression_parameter),
            (AttributeId::LocatorPersistence, self.locator_persistence),
            (AttributeId::DecimalFloatingPointRoundingMode, self.decimal_floating_point_rounding_mode),
            (AttributeId::DecimalFloatingPointErrorReporting, self.decimal_floating_point_error_reporting),
        ];
        for (id, value) in shorts {
            if let Some(value) = value {
                put_short(&mut buf, id, value);
                count += 1;
            }
        }

        if let Some(code) = &self.language_feature_code {
            put_fixed_ebcdic(&mut buf, AttributeId::LanguageFeatureCode, code, 4)?;
            count += 1;
        }
        if let Some(level) = &self.client_functional_level {
            put_fixed_ebcdic(&mut buf, AttributeId::ClientFunctionalLevel, level, 10)?;
            count += 1;
        }

        if let Some(nlss) = &self.nlss_identifier {
            put_nlss(&mut buf, nlss)?;
            count += 1;
        }

        let flags = [
            (AttributeId::TranslateIndicator, self.translate_indicator),
            (AttributeId::UseExtendedFormats, self.use_extended_formats),
            (AttributeId::TrueAutoCommitIndicator, self.true_auto_commit_indicator),
            (AttributeId::HexadecimalConstantParserOption, self.hexadecimal_constant_parser_option),
            (AttributeId::InputLocatorType, self.input_locator_type),
            (AttributeId::OptimizationGoalIndicator, self.optimization_goal_indicator),
            (AttributeId::CloseOnEof, self.close_on_eof),
        ];
        for (id, value) in flags {
            if let Some(value) = value {
                put_byte(&mut buf, id, value);
                count += 1;
            }
        }

        let ints = [
            (AttributeId::LobFieldThreshold, self.lob_field_threshold),
            (AttributeId::ClientSupportInformation, self.client_support_information),
            (AttributeId::QueryStorageLimit, self.query_storage_limit),
        ];
        for (id, value) in ints {
            if let Some(value) = value {
                put_int(&mut buf, id, value);
                count += 1;
            }
        }

        if let Some(name) = &self.rdb_name {
            put_variable_ebcdic(&mut buf, AttributeId::RdbName, name)?;
            count += 1;
        }

        if let Some(precision) = &self.decimal_precision {
            buf.write_u32(12);
            buf.write_u16(AttributeId::MaximumDecimalPrecision.code_point());
            buf.write_u16(precision.maximum_precision);
            buf.write_u16(precision.maximum_scale);
            buf.write_u16(precision.minimum_divide_scale);
            count += 1;
        }

        if let Some(correlator) = &self.ewlm_correlator {
            buf.write_u32(6 + correlator.len() as u32);
            buf.write_u16(AttributeId::EwlmCorrelator.code_point());
            buf.write_bytes(correlator);
            count += 1;
        }

        let strings = [
            (AttributeId::DefaultSqlLibraryName, &self.default_sql_library_name),
            (AttributeId::RleCompression, &self.rle_compression),
            (AttributeId::ClientAccountingInformation, &self.client_accounting_information),
            (AttributeId::ClientApplicationName, &self.client_application_name),
            (AttributeId::ClientUserIdentifier, &self.client_user_identifier),
            (AttributeId::ClientWorkstationName, &self.client_workstation_name),
            (AttributeId::ClientProgramIdentifier, &self.client_program_identifier),
            (AttributeId::InterfaceType, &self.interface_type),
            (AttributeId::InterfaceName, &self.interface_name),
            (AttributeId::InterfaceLevel, &self.interface_level),
        ];
        for (id, value) in strings {
            if let Some(value) = value {
                put_variable_ebcdic(&mut buf, id, value)?;
                count += 1;
            }
        }

        Ok((buf.freeze(), count))
    }
}

fn put_short(buf: &mut RequestBuffer, id: AttributeId, value: u16) {
    buf.write_u32(8);
    buf.write_u16(id.code_point());
    buf.write_u16(value);
}

fn put_byte(buf: &mut RequestBuffer, id: AttributeId, value: u8) {
    buf.write_u32(7);
    buf.write_u16(id.code_point());
    buf.write_u8(value);
}

fn put_int(buf: &mut RequestBuffer, id: AttributeId, value: u32) {
    buf.write_u32(10);
    buf.write_u16(id.code_point());
    buf.write_u32(value);
}

fn put_fixed_ebcdic(buf: &mut RequestBuffer, id: AttributeId, text: &str, width: u32) -> Result<()> {
    buf.write_u32(8 + width);
    buf.write_u16(id.code_point());
    buf.write_u16(CCSID);
    buf.write_ebcdic_pad(text, width as usize)
}

fn put_variable_ebcdic(buf: &mut RequestBuffer, id: AttributeId, text: &str) -> Result<()> {
    let encoded = crate::ebcdic::from_str(text)?;
    if encoded.len() > u16::MAX as usize {
        return Err(DbHostError::Protocol(format!(
            "attribute {id:?} text exceeds the 2-byte length field"
        )));
    }
    buf.write_u32(10 + encoded.len() as u32);
    buf.write_u16(id.code_point());
    buf.write_u16(CCSID);
    buf.write_u16(encoded.len() as u16);
    buf.write_bytes(&encoded);
    Ok(())
}

fn put_nlss(buf: &mut RequestBuffer, nlss: &NlssIdentifier) -> Result<()> {
    match nlss {
        NlssIdentifier::SharedWeight { language_id } | NlssIdentifier::UniqueWeight { language_id } => {
            buf.write_u32(13);
            buf.write_u16(AttributeId::NlssIdentifier.code_point());
            buf.write_u16(nlss.mode());
            buf.write_u16(CCSID);
            buf.write_ebcdic_pad(language_id, 3)
        }
        NlssIdentifier::SortTable { name, library } => {
            let name_bytes = crate::ebcdic::from_str(name)?;
            let library_bytes = crate::ebcdic::from_str(library)?;
            let ll = 14 + name_bytes.len() + library_bytes.len();
            buf.write_u32(ll as u32);
            buf.write_u16(AttributeId::NlssIdentifier.code_point());
            buf.write_u16(nlss.mode());
            buf.write_u16(CCSID);
            buf.write_u16(name_bytes.len() as u16);
            buf.write_bytes(&name_bytes);
            buf.write_u16(library_bytes.len() as u16);
            buf.write_bytes(&library_bytes);
            Ok(())
        }
    }
}
