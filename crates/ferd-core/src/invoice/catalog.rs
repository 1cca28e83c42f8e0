//! Static field catalog: ordered location candidates per field and schema generation.
//!
//! The two generations rename and relocate most elements, so each field
//! owns a short list of structurally distinct candidates. The first one
//! that yields a non-empty value wins. `SchemaVersion::Unknown` uses the
//! generation 1 tables.

use crate::models::invoice::{FieldName, SchemaVersion};

use super::path::NamespaceTable;

/// Generation 1 (ZUGFeRD 1.0) root namespace identifier.
pub const V1_IDENTIFIER: &str = "urn:ferd:CrossIndustryDocument:invoice:1p0";

/// Generation 2 (ZUGFeRD 2.x / Factur-X) root namespace identifier.
pub const V2_IDENTIFIER: &str = "CrossIndustryInvoice:100";

const V1_NAMESPACES: NamespaceTable = NamespaceTable::new(&[
    ("rsm", "urn:ferd:CrossIndustryDocument:invoice:1p0"),
    (
        "ram",
        "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:12",
    ),
    ("udt", "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:15"),
]);

const V2_NAMESPACES: NamespaceTable = NamespaceTable::new(&[
    ("rsm", "urn:un:unece:uncefact:data:standard:CrossIndustryInvoice:100"),
    (
        "ram",
        "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100",
    ),
    ("udt", "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:100"),
    ("qdt", "urn:un:unece:uncefact:data:standard:QualifiedDataType:100"),
]);

/// What to read from the element a candidate selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Trimmed text content.
    Text,
    /// Trimmed text content, with the named attribute attached as metadata.
    TextWithAttribute(&'static str),
    /// The named attribute is the value.
    Attribute(&'static str),
    /// A `PostalTradeAddress`: address lines followed by "postcode city".
    Address,
}

/// One ordered, version-scoped location for a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationCandidate {
    /// Path expression, see [`super::path`].
    pub path: &'static str,
    /// What to take from the selected element.
    pub source: ValueSource,
}

// Candidate lists are built from plain struct literals so that `&[...]`
// is promoted to a `'static` slice.
macro_rules! text {
    ($path:expr $(,)?) => {
        LocationCandidate { path: $path, source: ValueSource::Text }
    };
}

macro_rules! amount {
    ($path:expr $(,)?) => {
        LocationCandidate {
            path: $path,
            source: ValueSource::TextWithAttribute("currencyID"),
        }
    };
}

macro_rules! currency_of {
    ($path:expr $(,)?) => {
        LocationCandidate {
            path: $path,
            source: ValueSource::Attribute("currencyID"),
        }
    };
}

macro_rules! address {
    ($path:expr $(,)?) => {
        LocationCandidate { path: $path, source: ValueSource::Address }
    };
}

/// Which candidate table a schema version resolves against.
pub fn table_version(version: SchemaVersion) -> SchemaVersion {
    match version {
        SchemaVersion::V2 => SchemaVersion::V2,
        SchemaVersion::V1 | SchemaVersion::Unknown => SchemaVersion::V1,
    }
}

/// Namespace prefixes used by the candidate paths of `version`.
pub fn namespaces_for(version: SchemaVersion) -> NamespaceTable {
    match table_version(version) {
        SchemaVersion::V2 => V2_NAMESPACES,
        _ => V1_NAMESPACES,
    }
}

/// Ordered location candidates for `field` under `version`.
pub fn candidates_for(field: FieldName, version: SchemaVersion) -> &'static [LocationCandidate] {
    match table_version(version) {
        SchemaVersion::V2 => v2_candidates(field),
        _ => v1_candidates(field),
    }
}

fn v1_candidates(field: FieldName) -> &'static [LocationCandidate] {
    use FieldName::*;

    match field {
        // Profile namespaces (`...:1p0:comfort`) put the header under a URI
        // the `rsm` prefix does not bind, hence the unprefixed fallbacks.
        InvoiceNumber => &[
            text!(".//rsm:HeaderExchangedDocument/ram:ID"),
            text!(".//HeaderExchangedDocument/ram:ID"),
            text!(".//ram:ExchangedDocument/ram:ID"),
            text!(".//ram:InvoiceNumber"),
        ],
        InvoiceType => &[
            text!(".//rsm:HeaderExchangedDocument/ram:TypeCode"),
            text!(".//HeaderExchangedDocument/ram:TypeCode"),
            text!(".//ram:ExchangedDocument/ram:TypeCode"),
        ],
        IssueDate => &[
            text!(".//rsm:HeaderExchangedDocument/ram:IssueDateTime/udt:DateTimeString"),
            text!(".//HeaderExchangedDocument/ram:IssueDateTime/udt:DateTimeString"),
            text!(".//ram:ExchangedDocument/ram:IssueDateTime/udt:DateTimeString"),
            text!(".//ram:IssueDateTime/udt:DateTimeString"),
        ],
        DeliveryDate => &[text!(
            ".//ram:ActualDeliverySupplyChainEvent/ram:OccurrenceDateTime/udt:DateTimeString",
        )],
        DueDate => &[text!(
            ".//ram:SpecifiedTradePaymentTerms/ram:DueDateDateTime/udt:DateTimeString",
        )],
        Currency => &[
            currency_of!(".//ram:GrandTotalAmount"),
            currency_of!(".//ram:TotalAmount"),
            text!(".//ram:ApplicableSupplyChainTradeSettlement/ram:InvoiceCurrencyCode"),
            text!(".//ram:InvoiceCurrencyCode"),
        ],
        GrandTotal => &[
            amount!(".//ram:SpecifiedTradeSettlementMonetarySummation/ram:GrandTotalAmount"),
            amount!(".//ram:GrandTotalAmount"),
            amount!(".//ram:TotalAmount"),
        ],
        // Line items reuse SpecifiedTradeSettlementMonetarySummation.
        NetAmount => &[amount!(
            ".//ram:ApplicableSupplyChainTradeSettlement/ram:SpecifiedTradeSettlementMonetarySummation/ram:LineTotalAmount",
        )],
        TaxBasisAmount => &[amount!(
            ".//ram:SpecifiedTradeSettlementMonetarySummation/ram:TaxBasisTotalAmount",
        )],
        TaxAmount => &[
            amount!(".//ram:SpecifiedTradeSettlementMonetarySummation/ram:TaxTotalAmount"),
            amount!(".//ram:TaxTotalAmount"),
        ],
        SellerName => &[text!(".//ram:SellerTradeParty/ram:Name")],
        SellerAddress => &[address!(".//ram:SellerTradeParty/ram:PostalTradeAddress")],
        SellerCountry => &[text!(".//ram:SellerTradeParty/ram:PostalTradeAddress/ram:CountryID")],
        SellerTaxId => &[text!(".//ram:SellerTradeParty/ram:SpecifiedTaxRegistration/ram:ID")],
        SellerEmail => &[
            text!(
                ".//ram:SellerTradeParty/ram:DefinedTradeContact/ram:EmailURIUniversalCommunication/ram:URIID",
            ),
            text!(".//ram:SellerTradeParty/ram:EmailURIUniversalCommunication/ram:URIID"),
        ],
        BuyerName => &[text!(".//ram:BuyerTradeParty/ram:Name")],
        BuyerAddress => &[address!(".//ram:BuyerTradeParty/ram:PostalTradeAddress")],
        BuyerCountry => &[text!(".//ram:BuyerTradeParty/ram:PostalTradeAddress/ram:CountryID")],
        PaymentType => &[text!(".//ram:SpecifiedTradeSettlementPaymentMeans/ram:TypeCode")],
        PaymentTerms => &[
            text!(".//ram:SpecifiedTradePaymentTerms/ram:Description"),
            text!(".//ram:SpecifiedTradeSettlementPaymentMeans/ram:Information"),
        ],
        Iban => &[
            text!(".//ram:PayeePartyCreditorFinancialAccount/ram:IBANID"),
            text!(".//ram:PayerPartyDebtorFinancialAccount/ram:IBANID"),
        ],
        Bic => &[text!(".//ram:PayeeSpecifiedCreditorFinancialInstitution/ram:BICID")],
    }
}

fn v2_candidates(field: FieldName) -> &'static [LocationCandidate] {
    use FieldName::*;

    match field {
        InvoiceNumber => &[
            text!(".//rsm:ExchangedDocument/ram:ID"),
            text!(".//ram:InvoiceNumber"),
            text!(".//ram:ID"),
        ],
        InvoiceType => &[text!(".//rsm:ExchangedDocument/ram:TypeCode")],
        IssueDate => &[
            text!(".//rsm:ExchangedDocument/ram:IssueDateTime/udt:DateTimeString"),
            text!(".//ram:IssueDateTime/udt:DateTimeString"),
        ],
        DeliveryDate => &[text!(
            ".//ram:ActualDeliverySupplyChainEvent/ram:OccurrenceDateTime/udt:DateTimeString",
        )],
        DueDate => &[text!(
            ".//ram:SpecifiedTradePaymentTerms/ram:DueDateDateTime/udt:DateTimeString",
        )],
        Currency => &[
            currency_of!(".//ram:GrandTotalAmount"),
            currency_of!(".//ram:TotalAmount"),
            text!(".//ram:ApplicableHeaderTradeSettlement/ram:InvoiceCurrencyCode"),
            currency_of!(".//ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:TaxTotalAmount"),
        ],
        GrandTotal => &[
            amount!(".//ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:GrandTotalAmount"),
            amount!(".//ram:GrandTotalAmount"),
            amount!(".//ram:TotalAmount"),
        ],
        NetAmount => &[
            amount!(".//ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:LineTotalAmount"),
            amount!(
                ".//ram:ApplicableHeaderTradeSettlement/ram:SpecifiedTradeSettlementMonetarySummation/ram:LineTotalAmount",
            ),
        ],
        TaxBasisAmount => &[amount!(
            ".//ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:TaxBasisTotalAmount",
        )],
        TaxAmount => &[
            amount!(".//ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:TaxTotalAmount"),
            amount!(".//ram:TaxTotalAmount"),
        ],
        SellerName => &[text!(".//ram:SellerTradeParty/ram:Name")],
        SellerAddress => &[address!(".//ram:SellerTradeParty/ram:PostalTradeAddress")],
        SellerCountry => &[text!(".//ram:SellerTradeParty/ram:PostalTradeAddress/ram:CountryID")],
        SellerTaxId => &[text!(".//ram:SellerTradeParty/ram:SpecifiedTaxRegistration/ram:ID")],
        SellerEmail => &[
            text!(".//ram:SellerTradeParty/ram:URIUniversalCommunication/ram:URIID"),
            text!(
                ".//ram:SellerTradeParty/ram:DefinedTradeContact/ram:EmailURIUniversalCommunication/ram:URIID",
            ),
        ],
        BuyerName => &[text!(".//ram:BuyerTradeParty/ram:Name")],
        BuyerAddress => &[address!(".//ram:BuyerTradeParty/ram:PostalTradeAddress")],
        BuyerCountry => &[text!(".//ram:BuyerTradeParty/ram:PostalTradeAddress/ram:CountryID")],
        PaymentType => &[text!(".//ram:SpecifiedTradeSettlementPaymentMeans/ram:TypeCode")],
        PaymentTerms => &[
            text!(".//ram:SpecifiedTradePaymentTerms/ram:Description"),
            text!(".//ram:SpecifiedTradeSettlementPaymentMeans/ram:Information"),
        ],
        Iban => &[
            text!(".//ram:PayeePartyCreditorFinancialAccount/ram:IBANID"),
            text!(".//ram:PayerPartyDebtorFinancialAccount/ram:IBANID"),
        ],
        Bic => &[text!(".//ram:PayeeSpecifiedCreditorFinancialInstitution/ram:BICID")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::path::CompiledPath;

    #[test]
    fn test_every_field_has_candidates() {
        for version in [SchemaVersion::V1, SchemaVersion::V2, SchemaVersion::Unknown] {
            for field in FieldName::ALL {
                assert!(
                    !candidates_for(field, version).is_empty(),
                    "{field} has no candidates for {version}"
                );
            }
        }
    }

    #[test]
    fn test_catalog_paths_compile() {
        for version in [SchemaVersion::V1, SchemaVersion::V2] {
            let namespaces = namespaces_for(version);
            for field in FieldName::ALL {
                for candidate in candidates_for(field, version) {
                    assert!(
                        CompiledPath::compile(candidate.path, &namespaces).is_ok(),
                        "{} does not compile for {version}",
                        candidate.path
                    );
                }
            }
        }
    }

    #[test]
    fn test_unknown_uses_v1_tables() {
        for field in FieldName::ALL {
            assert_eq!(
                candidates_for(field, SchemaVersion::Unknown),
                candidates_for(field, SchemaVersion::V1)
            );
        }
        assert_eq!(
            namespaces_for(SchemaVersion::Unknown).uri("ram"),
            namespaces_for(SchemaVersion::V1).uri("ram")
        );
    }

    #[test]
    fn test_generations_use_distinct_namespaces() {
        assert_ne!(
            namespaces_for(SchemaVersion::V1).uri("ram"),
            namespaces_for(SchemaVersion::V2).uri("ram")
        );
        assert!(namespaces_for(SchemaVersion::V2).uri("rsm").unwrap().contains(V2_IDENTIFIER));
        assert!(namespaces_for(SchemaVersion::V1).uri("rsm").unwrap().starts_with(V1_IDENTIFIER));
    }

    #[test]
    fn test_v1_net_amount_is_anchored_to_header_settlement() {
        for candidate in candidates_for(FieldName::NetAmount, SchemaVersion::V1) {
            assert!(
                candidate.path.starts_with(".//ram:ApplicableSupplyChainTradeSettlement/"),
                "{} can match line items",
                candidate.path
            );
        }
    }

    #[test]
    fn test_grand_total_carries_currency() {
        for version in [SchemaVersion::V1, SchemaVersion::V2] {
            let first = candidates_for(FieldName::GrandTotal, version)[0];
            assert_eq!(first.source, ValueSource::TextWithAttribute("currencyID"));
        }
    }
}
