//! Field resolution: first matching location candidate wins.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};
use tracing::{debug, trace};

use crate::error::CandidateError;
use crate::models::invoice::{FieldAttribute, FieldName, ResolvedField, SchemaVersion};

use super::catalog::{LocationCandidate, ValueSource, candidates_for, namespaces_for};
use super::path::{CompiledPath, NamespaceTable};

const ADDRESS_LINES: [&str; 3] = ["LineOne", "LineTwo", "LineThree"];

/// Resolves invoice fields against one parsed document.
///
/// The schema version is fixed at construction and never re-derived.
pub struct FieldResolver<'a, 'input> {
    root: Node<'a, 'input>,
    version: SchemaVersion,
    namespaces: NamespaceTable,
}

/// Value read from a matched element.
struct Found {
    value: String,
    attribute: Option<FieldAttribute>,
}

impl<'a, 'input> FieldResolver<'a, 'input> {
    /// Create a resolver for `doc`, classified as `version`.
    pub fn new(doc: &'a Document<'input>, version: SchemaVersion) -> Self {
        Self {
            root: doc.root_element(),
            version,
            namespaces: namespaces_for(version),
        }
    }

    /// The schema version this resolver was created with.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Resolve `field` using the catalog candidates for this version.
    pub fn resolve(&self, field: FieldName) -> ResolvedField {
        self.resolve_with(field, candidates_for(field, self.version))
    }

    /// Resolve every field, keyed in declaration order.
    pub fn resolve_all(&self) -> BTreeMap<FieldName, ResolvedField> {
        FieldName::ALL
            .into_iter()
            .map(|field| (field, self.resolve(field)))
            .collect()
    }

    /// Resolve `field` against an explicit candidate list.
    ///
    /// Candidates are tried in order and evaluation stops at the first one
    /// yielding a non-empty value. A candidate that fails to compile counts
    /// as no match.
    pub fn resolve_with(&self, field: FieldName, candidates: &[LocationCandidate]) -> ResolvedField {
        for (index, candidate) in candidates.iter().enumerate() {
            match self.evaluate(candidate) {
                Ok(Some(found)) => {
                    trace!("{} <- candidate {} ({})", field, index, candidate.path);
                    return ResolvedField {
                        name: field,
                        value: Some(found.value),
                        attribute: found.attribute,
                        candidate: Some(index),
                    };
                }
                Ok(None) => trace!("{}: no match for {}", field, candidate.path),
                Err(e) => debug!("{}: skipping candidate {}: {}", field, candidate.path, e),
            }
        }

        debug!("{}: not available", field);
        ResolvedField::missing(field)
    }

    fn evaluate(&self, candidate: &LocationCandidate) -> Result<Option<Found>, CandidateError> {
        let path = CompiledPath::compile(candidate.path, &self.namespaces)?;
        Ok(path
            .find(self.root)
            .and_then(|node| read_value(node, candidate.source)))
    }
}

fn read_value(node: Node<'_, '_>, source: ValueSource) -> Option<Found> {
    match source {
        ValueSource::Text => non_empty(node.text()).map(|value| Found {
            value,
            attribute: None,
        }),
        ValueSource::TextWithAttribute(name) => non_empty(node.text()).map(|value| Found {
            value,
            attribute: non_empty(node.attribute(name)).map(|attr| FieldAttribute {
                name: name.to_string(),
                value: attr,
            }),
        }),
        ValueSource::Attribute(name) => non_empty(node.attribute(name)).map(|value| Found {
            value,
            attribute: None,
        }),
        ValueSource::Address => read_address(node).map(|value| Found {
            value,
            attribute: None,
        }),
    }
}

/// Compose a postal address from the children of a `PostalTradeAddress`.
fn read_address(node: Node<'_, '_>) -> Option<String> {
    let namespace = node.tag_name().namespace();
    let child_text = |local: &str| {
        node.children()
            .find(|c| {
                c.is_element()
                    && c.tag_name().name() == local
                    && c.tag_name().namespace() == namespace
            })
            .and_then(|c| non_empty(c.text()))
    };

    let mut parts: Vec<String> = ADDRESS_LINES.into_iter().filter_map(|l| child_text(l)).collect();

    let locality = [child_text("PostcodeCode"), child_text("CityName")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !locality.is_empty() {
        parts.push(locality);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const V2_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rsm:CrossIndustryInvoice
    xmlns:rsm="urn:un:unece:uncefact:data:standard:CrossIndustryInvoice:100"
    xmlns:ram="urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100"
    xmlns:udt="urn:un:unece:uncefact:data:standard:UnqualifiedDataType:100">
  <rsm:ExchangedDocument>
    <ram:ID>  RE-2024-001 </ram:ID>
  </rsm:ExchangedDocument>
  <rsm:SupplyChainTradeTransaction>
    <ram:ApplicableHeaderTradeAgreement>
      <ram:SellerTradeParty>
        <ram:Name>Lieferant GmbH</ram:Name>
        <ram:PostalTradeAddress>
          <ram:PostcodeCode>80333</ram:PostcodeCode>
          <ram:LineOne>Lieferantenstraße 20</ram:LineOne>
          <ram:LineTwo>   </ram:LineTwo>
          <ram:CityName>München</ram:CityName>
          <ram:CountryID>DE</ram:CountryID>
        </ram:PostalTradeAddress>
      </ram:SellerTradeParty>
      <ram:BuyerTradeParty>
        <ram:Name></ram:Name>
      </ram:BuyerTradeParty>
    </ram:ApplicableHeaderTradeAgreement>
    <ram:ApplicableHeaderTradeSettlement>
      <ram:SpecifiedTradeSettlementHeaderMonetarySummation>
        <ram:GrandTotalAmount currencyID="EUR">123.45</ram:GrandTotalAmount>
        <ram:TotalAmount currencyID="USD">99.00</ram:TotalAmount>
      </ram:SpecifiedTradeSettlementHeaderMonetarySummation>
    </ram:ApplicableHeaderTradeSettlement>
  </rsm:SupplyChainTradeTransaction>
</rsm:CrossIndustryInvoice>"#;

    fn text(path: &'static str) -> LocationCandidate {
        LocationCandidate {
            path,
            source: ValueSource::Text,
        }
    }

    fn with_resolver<T>(f: impl FnOnce(&FieldResolver<'_, '_>) -> T) -> T {
        let doc = Document::parse(V2_DOC).unwrap();
        let resolver = FieldResolver::new(&doc, SchemaVersion::V2);
        f(&resolver)
    }

    #[test]
    fn test_resolves_trimmed_text() {
        let field = with_resolver(|r| r.resolve(FieldName::InvoiceNumber));
        assert_eq!(field.value.as_deref(), Some("RE-2024-001"));
        assert_eq!(field.candidate, Some(0));
    }

    #[test]
    fn test_amount_carries_currency_attribute() {
        let field = with_resolver(|r| r.resolve(FieldName::GrandTotal));
        assert_eq!(
            field,
            ResolvedField {
                name: FieldName::GrandTotal,
                value: Some("123.45".into()),
                attribute: Some(FieldAttribute {
                    name: "currencyID".into(),
                    value: "EUR".into(),
                }),
                candidate: Some(0),
            }
        );
    }

    #[test]
    fn test_currency_read_from_attribute() {
        let field = with_resolver(|r| r.resolve(FieldName::Currency));
        assert_eq!(field.value.as_deref(), Some("EUR"));
        assert_eq!(field.attribute, None);
    }

    #[test]
    fn test_address_is_composed() {
        let field = with_resolver(|r| r.resolve(FieldName::SellerAddress));
        assert_eq!(
            field.value.as_deref(),
            Some("Lieferantenstraße 20, 80333 München")
        );
    }

    #[test]
    fn test_first_match_wins() {
        let candidates = [text(".//ram:GrandTotalAmount"), text(".//ram:TotalAmount")];
        let field = with_resolver(|r| r.resolve_with(FieldName::GrandTotal, &candidates));
        assert_eq!(field.value.as_deref(), Some("123.45"));
        assert_eq!(field.candidate, Some(0));
    }

    #[test]
    fn test_falls_back_to_later_candidate() {
        let candidates = [text(".//ram:DuePayableAmount"), text(".//ram:TotalAmount")];
        let field = with_resolver(|r| r.resolve_with(FieldName::GrandTotal, &candidates));
        assert_eq!(field.value.as_deref(), Some("99.00"));
        assert_eq!(field.candidate, Some(1));
    }

    #[test]
    fn test_empty_element_does_not_match() {
        let field = with_resolver(|r| r.resolve(FieldName::BuyerName));
        assert_eq!(field, ResolvedField::missing(FieldName::BuyerName));
    }

    #[test]
    fn test_bad_candidate_is_contained() {
        let candidates = [
            text(".//xyz:GrandTotalAmount"),
            text("ram:/broken"),
            text(".//ram:GrandTotalAmount"),
        ];
        let field = with_resolver(|r| r.resolve_with(FieldName::GrandTotal, &candidates));
        assert_eq!(field.value.as_deref(), Some("123.45"));
        assert_eq!(field.candidate, Some(2));
    }

    #[test]
    fn test_all_bad_candidates_yield_missing() {
        let candidates = [text(".//xyz:A"), text("")];
        let field = with_resolver(|r| r.resolve_with(FieldName::Iban, &candidates));
        assert_eq!(field, ResolvedField::missing(FieldName::Iban));
    }

    #[test]
    fn test_resolve_all_covers_every_field() {
        let fields = with_resolver(|r| r.resolve_all());
        assert_eq!(fields.len(), FieldName::ALL.len());
        assert!(fields.keys().copied().eq(FieldName::ALL));
        assert!(fields.values().all(|f| fields[&f.name] == *f));
    }
}
