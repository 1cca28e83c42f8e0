//! Invoice data extracted from a ZUGFeRD / Factur-X XML attachment.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Schema generation of an invoice document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    /// ZUGFeRD 1.0 (`urn:ferd:CrossIndustryDocument:invoice:1p0`).
    V1,
    /// ZUGFeRD 2.x / Factur-X (`CrossIndustryInvoice:100`).
    V2,
    /// Neither generation could be recognized.
    Unknown,
}

impl SchemaVersion {
    /// Human readable version label.
    pub fn label(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "1.0",
            SchemaVersion::V2 => "2.0",
            SchemaVersion::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Invoice facts the engine extracts.
///
/// The set is closed; declaration order is the iteration order of
/// [`FieldName::ALL`] and of [`ExtractedInvoice::fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    InvoiceNumber,
    InvoiceType,
    IssueDate,
    DeliveryDate,
    DueDate,
    Currency,
    GrandTotal,
    NetAmount,
    TaxBasisAmount,
    TaxAmount,
    SellerName,
    SellerAddress,
    SellerCountry,
    SellerTaxId,
    SellerEmail,
    BuyerName,
    BuyerAddress,
    BuyerCountry,
    PaymentType,
    PaymentTerms,
    Iban,
    Bic,
}

impl FieldName {
    /// Every field, in declaration order.
    pub const ALL: [FieldName; 22] = [
        FieldName::InvoiceNumber,
        FieldName::InvoiceType,
        FieldName::IssueDate,
        FieldName::DeliveryDate,
        FieldName::DueDate,
        FieldName::Currency,
        FieldName::GrandTotal,
        FieldName::NetAmount,
        FieldName::TaxBasisAmount,
        FieldName::TaxAmount,
        FieldName::SellerName,
        FieldName::SellerAddress,
        FieldName::SellerCountry,
        FieldName::SellerTaxId,
        FieldName::SellerEmail,
        FieldName::BuyerName,
        FieldName::BuyerAddress,
        FieldName::BuyerCountry,
        FieldName::PaymentType,
        FieldName::PaymentTerms,
        FieldName::Iban,
        FieldName::Bic,
    ];

    /// Stable machine key, matching the serialized form.
    pub fn key(&self) -> &'static str {
        match self {
            FieldName::InvoiceNumber => "invoice_number",
            FieldName::InvoiceType => "invoice_type",
            FieldName::IssueDate => "issue_date",
            FieldName::DeliveryDate => "delivery_date",
            FieldName::DueDate => "due_date",
            FieldName::Currency => "currency",
            FieldName::GrandTotal => "grand_total",
            FieldName::NetAmount => "net_amount",
            FieldName::TaxBasisAmount => "tax_basis_amount",
            FieldName::TaxAmount => "tax_amount",
            FieldName::SellerName => "seller_name",
            FieldName::SellerAddress => "seller_address",
            FieldName::SellerCountry => "seller_country",
            FieldName::SellerTaxId => "seller_tax_id",
            FieldName::SellerEmail => "seller_email",
            FieldName::BuyerName => "buyer_name",
            FieldName::BuyerAddress => "buyer_address",
            FieldName::BuyerCountry => "buyer_country",
            FieldName::PaymentType => "payment_type",
            FieldName::PaymentTerms => "payment_terms",
            FieldName::Iban => "iban",
            FieldName::Bic => "bic",
        }
    }

    /// Label for human readable output.
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::InvoiceNumber => "Invoice number",
            FieldName::InvoiceType => "Invoice type",
            FieldName::IssueDate => "Issue date",
            FieldName::DeliveryDate => "Delivery date",
            FieldName::DueDate => "Due date",
            FieldName::Currency => "Currency",
            FieldName::GrandTotal => "Grand total",
            FieldName::NetAmount => "Net amount",
            FieldName::TaxBasisAmount => "Tax basis",
            FieldName::TaxAmount => "Tax amount",
            FieldName::SellerName => "Seller",
            FieldName::SellerAddress => "Seller address",
            FieldName::SellerCountry => "Seller country",
            FieldName::SellerTaxId => "Seller VAT ID",
            FieldName::SellerEmail => "Seller e-mail",
            FieldName::BuyerName => "Buyer",
            FieldName::BuyerAddress => "Buyer address",
            FieldName::BuyerCountry => "Buyer country",
            FieldName::PaymentType => "Payment type",
            FieldName::PaymentTerms => "Payment terms",
            FieldName::Iban => "IBAN",
            FieldName::Bic => "BIC",
        }
    }

    /// Look a field up by its machine key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An attribute carried alongside a field value (e.g. `currencyID` on an amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// Outcome of resolving one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    /// Which field this is.
    pub name: FieldName,

    /// The resolved value; `None` when no candidate matched.
    pub value: Option<String>,

    /// Structured metadata taken from the matched element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<FieldAttribute>,

    /// Index of the winning location candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<usize>,
}

impl ResolvedField {
    /// A field for which no candidate matched.
    pub fn missing(name: FieldName) -> Self {
        Self {
            name,
            value: None,
            attribute: None,
            candidate: None,
        }
    }

    /// Whether a value was found.
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// The value, or `marker` when the field is not available.
    pub fn display_value<'a>(&'a self, marker: &'a str) -> &'a str {
        self.value.as_deref().unwrap_or(marker)
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedInvoice {
    version: SchemaVersion,
    attachment_name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    raw_xml: String,
    fields: BTreeMap<FieldName, ResolvedField>,
}

impl ExtractedInvoice {
    pub(crate) fn new(
        version: SchemaVersion,
        attachment_name: String,
        raw_xml: String,
        fields: BTreeMap<FieldName, ResolvedField>,
    ) -> Self {
        Self {
            version,
            attachment_name,
            raw_xml,
            fields,
        }
    }

    /// Detected schema generation.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Name of the attachment the data was read from.
    pub fn attachment_name(&self) -> &str {
        &self.attachment_name
    }

    /// Decoded XML text of the attachment.
    pub fn raw_xml(&self) -> &str {
        &self.raw_xml
    }

    /// All fields, one entry per [`FieldName`].
    pub fn fields(&self) -> &BTreeMap<FieldName, ResolvedField> {
        &self.fields
    }

    /// The resolved entry for `name`.
    pub fn field(&self, name: FieldName) -> Option<&ResolvedField> {
        self.fields.get(&name)
    }

    /// The value for `name`, if resolved.
    pub fn value(&self, name: FieldName) -> Option<&str> {
        self.fields.get(&name).and_then(|f| f.value.as_deref())
    }

    /// Parse the value for `name` as a decimal amount.
    pub fn amount(&self, name: FieldName) -> Option<Decimal> {
        self.value(name).and_then(|v| Decimal::from_str(v.trim()).ok())
    }

    /// Parse the value for `name` as a date.
    ///
    /// Accepts UN/CEFACT format `102` (`YYYYMMDD`) and ISO `YYYY-MM-DD`.
    pub fn date(&self, name: FieldName) -> Option<NaiveDate> {
        self.value(name).and_then(parse_invoice_date)
    }

    /// Fields for which no value was found, in declaration order.
    pub fn missing_fields(&self) -> Vec<FieldName> {
        self.fields
            .values()
            .filter(|f| !f.is_resolved())
            .map(|f| f.name)
            .collect()
    }

    /// Number of fields that resolved to a value.
    pub fn resolved_count(&self) -> usize {
        self.fields.values().filter(|f| f.is_resolved()).count()
    }

    /// Drop the raw XML, e.g. before serializing a compact result.
    pub fn without_raw_xml(mut self) -> Self {
        self.raw_xml.clear();
        self
    }
}

/// Parse a date string as used in invoice documents.
pub fn parse_invoice_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice_with(values: &[(FieldName, &str)]) -> ExtractedInvoice {
        let fields = FieldName::ALL
            .into_iter()
            .map(|name| {
                let mut field = ResolvedField::missing(name);
                if let Some((_, v)) = values.iter().find(|(n, _)| *n == name) {
                    field.value = Some(v.to_string());
                    field.candidate = Some(0);
                }
                (name, field)
            })
            .collect();
        ExtractedInvoice::new(SchemaVersion::V2, "invoice.xml".into(), String::new(), fields)
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in FieldName::ALL {
            assert_eq!(FieldName::from_key(field.key()), Some(field));
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
        assert_eq!(FieldName::from_key("nope"), None);
    }

    #[test]
    fn test_all_is_sorted_by_declaration() {
        let mut sorted = FieldName::ALL;
        sorted.sort();
        assert_eq!(sorted, FieldName::ALL);
    }

    #[test]
    fn test_parse_invoice_date() {
        assert_eq!(parse_invoice_date("20240115"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(parse_invoice_date("2024-01-15"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(parse_invoice_date("15.01.2024"), None);
    }

    #[test]
    fn test_typed_accessors() {
        let invoice = invoice_with(&[
            (FieldName::GrandTotal, "123.45"),
            (FieldName::IssueDate, "20240301"),
        ]);

        assert_eq!(invoice.amount(FieldName::GrandTotal), Some(Decimal::new(12345, 2)));
        assert_eq!(invoice.date(FieldName::IssueDate), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(invoice.amount(FieldName::NetAmount), None);
        assert_eq!(invoice.resolved_count(), 2);
        assert_eq!(invoice.missing_fields().len(), FieldName::ALL.len() - 2);
    }

    #[test]
    fn test_display_value_uses_marker() {
        let field = ResolvedField::missing(FieldName::Bic);
        assert_eq!(field.display_value("not available"), "not available");
    }
}
