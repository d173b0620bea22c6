//! Field schema of an action card

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SchemaError;

/// One choice of an option-select field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        SelectOption {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Input kind; only `OptionSelect` carries options
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Number,
    /// Picks one of the configured networks
    Network,
    /// Multi-line text parsed as JSON when the action runs
    StructuredJson,
    OptionSelect { options: Vec<SelectOption> },
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Network => "network",
            FieldKind::StructuredJson => "json",
            FieldKind::OptionSelect { .. } => "select",
        }
    }

    /// Selection fields cycle through values instead of being typed into
    pub fn is_selection(&self) -> bool {
        matches!(self, FieldKind::Network | FieldKind::OptionSelect { .. })
    }
}

/// Declaration of one input field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub default: Option<String>,
    pub kind: FieldKind,
}

impl FieldSpec {
    fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        FieldSpec {
            id: id.into(),
            label: None,
            placeholder: None,
            default: None,
            kind,
        }
    }

    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Text)
    }

    pub fn number(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Number)
    }

    pub fn network(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Network)
    }

    pub fn json(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::StructuredJson)
    }

    pub fn select(id: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(id, FieldKind::OptionSelect { options })
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Label shown next to the input, falling back to the id
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn options(&self) -> &[SelectOption] {
        match &self.kind {
            FieldKind::OptionSelect { options } => options,
            _ => &[],
        }
    }
}

/// Validated, ordered list of fields
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Validate ids and options. `networks` is the configured network list
    /// that network fields select from.
    pub fn new(fields: Vec<FieldSpec>, networks: &[String]) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.id.is_empty() {
                return Err(SchemaError::EmptyId);
            }
            if !seen.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateId(field.id.clone()));
            }
            match &field.kind {
                FieldKind::OptionSelect { options } if options.is_empty() => {
                    return Err(SchemaError::MissingOptions(field.id.clone()));
                }
                FieldKind::Network if networks.is_empty() => {
                    return Err(SchemaError::NoNetworks(field.id.clone()));
                }
                _ => {}
            }
        }
        Ok(Schema { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn networks() -> Vec<String> {
        vec!["ethereum".to_string()]
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Schema::new(
            vec![FieldSpec::text("walletId"), FieldSpec::number("walletId")],
            &networks(),
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateId("walletId".into()));
    }

    #[test]
    fn test_empty_options_rejected() {
        let err = Schema::new(vec![FieldSpec::select("scope", vec![])], &networks()).unwrap_err();
        assert_eq!(err, SchemaError::MissingOptions("scope".into()));
    }

    #[test]
    fn test_network_field_needs_networks() {
        let err = Schema::new(vec![FieldSpec::network("network")], &[]).unwrap_err();
        assert_eq!(err, SchemaError::NoNetworks("network".into()));
        assert!(Schema::new(vec![FieldSpec::text("memo")], &[]).is_ok());
    }

    #[test]
    fn test_builder_and_lookup() {
        let schema = Schema::new(
            vec![
                FieldSpec::network("network").label("Select Network"),
                FieldSpec::text("assetId").placeholder("e.g. ethereum-native"),
            ],
            &networks(),
        )
        .unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field("network").unwrap().display_label(), "Select Network");
        assert_eq!(schema.field("assetId").unwrap().display_label(), "assetId");
        assert!(schema.field("network").unwrap().kind.is_selection());
        assert!(schema.field("missing").is_none());
    }
}
