//! Location-candidate path expressions.
//!
//! A small subset of the ElementTree path language, enough for the
//! candidate tables:
//!
//! - `.//rsm:ExchangedDocument/ram:ID` - `ExchangedDocument` anywhere below
//!   the root, then its `ID` child
//! - `ram:SellerTradeParty/ram:Name` - path starting at the root's children
//! - `Name` - an unprefixed step matches the local name in any namespace
//!
//! Like `Element.find`, evaluation returns the first element the path
//! selects in document order.

use roxmltree::Node;

use crate::error::CandidateError;

/// Prefix to namespace URI mapping used to resolve qualified steps.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceTable(&'static [(&'static str, &'static str)]);

impl NamespaceTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self(entries)
    }

    /// Look up the URI bound to `prefix`.
    pub fn uri(&self, prefix: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| *uri)
    }

    /// All registered prefixes.
    pub fn prefixes(&self) -> impl Iterator<Item = &'static str> {
        self.0.iter().map(|(p, _)| *p)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step<'p> {
    namespace: Option<&'static str>,
    local: &'p str,
}

impl Step<'_> {
    fn matches(&self, node: &Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }
        let tag = node.tag_name();
        tag.name() == self.local
            && match self.namespace {
                Some(uri) => tag.namespace() == Some(uri),
                None => true,
            }
    }
}

/// A parsed path with its prefixes resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath<'p> {
    descendant: bool,
    steps: Vec<Step<'p>>,
}

impl<'p> CompiledPath<'p> {
    /// Parse `expr` and resolve its prefixes against `namespaces`.
    pub fn compile(expr: &'p str, namespaces: &NamespaceTable) -> Result<Self, CandidateError> {
        let syntax = |reason: &str| CandidateError::Syntax {
            path: expr.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = expr.trim();
        let (descendant, body) = if let Some(rest) = trimmed.strip_prefix(".//") {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix("./") {
            (false, rest)
        } else if trimmed.starts_with('/') {
            return Err(syntax("absolute paths are not supported"));
        } else {
            (false, trimmed)
        };

        if body.is_empty() {
            return Err(syntax("empty path"));
        }

        let mut steps = Vec::new();
        for raw in body.split('/') {
            if raw.is_empty() {
                return Err(syntax("empty step"));
            }
            let step = match raw.split_once(':') {
                Some((prefix, local)) => {
                    if prefix.is_empty() || local.is_empty() || local.contains(':') {
                        return Err(syntax("malformed qualified name"));
                    }
                    let uri = namespaces
                        .uri(prefix)
                        .ok_or_else(|| CandidateError::UnknownPrefix(prefix.to_string()))?;
                    Step {
                        namespace: Some(uri),
                        local,
                    }
                }
                None => Step {
                    namespace: None,
                    local: raw,
                },
            };
            if !is_name(step.local) {
                return Err(syntax("unsupported step"));
            }
            steps.push(step);
        }

        Ok(Self { descendant, steps })
    }

    /// First element selected by this path, starting at `root`.
    pub fn find<'a, 'input>(&self, root: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
        let (first, rest) = self.steps.split_first()?;
        if self.descendant {
            root.descendants()
                .skip(1)
                .filter(|n| first.matches(n))
                .find_map(|n| walk(n, rest))
        } else {
            root.children()
                .filter(|n| first.matches(n))
                .find_map(|n| walk(n, rest))
        }
    }
}

fn walk<'a, 'input>(node: Node<'a, 'input>, steps: &[Step<'_>]) -> Option<Node<'a, 'input>> {
    match steps.split_first() {
        None => Some(node),
        Some((step, rest)) => node
            .children()
            .filter(|c| step.matches(c))
            .find_map(|c| walk(c, rest)),
    }
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
