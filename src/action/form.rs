//! Form state - current field values of one action card

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::action::schema::{FieldKind, Schema};
use crate::error::FormError;

/// Raw field values as edited, keyed by field id
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<String, String>,
}

impl FormState {
    /// Initial values: the field default, else the first network / first
    /// option for selection fields, else empty
    pub fn new(schema: &Schema, networks: &[String]) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|field| {
                let initial = match (&field.default, &field.kind) {
                    (Some(default), _) => default.clone(),
                    (None, FieldKind::Network) => networks.first().cloned().unwrap_or_default(),
                    (None, FieldKind::OptionSelect { options }) => options
                        .first()
                        .map(|o| o.value.clone())
                        .unwrap_or_default(),
                    (None, _) => String::new(),
                };
                (field.id.clone(), initial)
            })
            .collect();
        FormState { values }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    /// Replace the value of one field
    pub fn set(&mut self, id: &str, value: impl Into<String>) -> Result<(), FormError> {
        match self.values.get_mut(id) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(FormError::UnknownField(id.to_string())),
        }
    }

    /// Values handed to the operation: numbers and JSON parsed where they parse
    pub fn to_values(&self, schema: &Schema) -> FormValues {
        let values = schema
            .fields()
            .iter()
            .map(|field| {
                let raw = self.values.get(&field.id).cloned().unwrap_or_default();
                let value = match field.kind {
                    FieldKind::StructuredJson => {
                        serde_json::from_str(&raw).unwrap_or(Value::String(raw))
                    }
                    FieldKind::Number => parse_number(&raw).unwrap_or(Value::String(raw)),
                    _ => Value::String(raw),
                };
                (field.id.clone(), value)
            })
            .collect();
        FormValues(values)
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

/// Processed values mapping passed to an operation
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, Value>);

impl FormValues {
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.0.get(id)
    }

    /// String value, `None` when absent or blank
    pub fn text(&self, id: &str) -> Option<&str> {
        match self.0.get(id) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Non-negative integer value, accepting numbers or numeric text
    pub fn index(&self, id: &str) -> Option<u32> {
        match self.0.get(id)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromIterator<(String, Value)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        FormValues(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::schema::{FieldSpec, SelectOption};
    use serde_json::json;

    fn networks() -> Vec<String> {
        vec!["ethereum".to_string(), "polygon".to_string()]
    }

    fn schema() -> Schema {
        Schema::new(
            vec![
                FieldSpec::network("network"),
                FieldSpec::number("index").default_value("0"),
                FieldSpec::text("walletId"),
                FieldSpec::json("indices"),
                FieldSpec::select(
                    "scope",
                    vec![
                        SelectOption::new("Single asset", "asset"),
                        SelectOption::new("Whole wallet", "wallet"),
                    ],
                ),
            ],
            &networks(),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_values() {
        let form = FormState::new(&schema(), &networks());
        assert_eq!(form.get("network"), Some("ethereum"));
        assert_eq!(form.get("index"), Some("0"));
        assert_eq!(form.get("walletId"), Some(""));
        assert_eq!(form.get("indices"), Some(""));
        assert_eq!(form.get("scope"), Some("asset"));
    }

    #[test]
    fn test_set_touches_only_target() {
        let mut form = FormState::new(&schema(), &networks());
        let before = form.clone();
        form.set("walletId", "user@example.com").unwrap();

        assert_eq!(form.get("walletId"), Some("user@example.com"));
        for id in ["network", "index", "indices", "scope"] {
            assert_eq!(form.get(id), before.get(id));
        }
        assert_eq!(
            form.set("nope", "x"),
            Err(FormError::UnknownField("nope".into()))
        );
    }

    #[test]
    fn test_values_parse_json_and_numbers() {
        let schema = schema();
        let mut form = FormState::new(&schema, &networks());
        form.set("indices", "[0, 1, 2]").unwrap();
        form.set("index", "7").unwrap();

        let values = form.to_values(&schema);
        assert_eq!(values.get("indices"), Some(&json!([0, 1, 2])));
        assert_eq!(values.get("index"), Some(&json!(7)));
        assert_eq!(values.index("index"), Some(7));
        assert_eq!(values.text("network"), Some("ethereum"));
        assert_eq!(values.text("walletId"), None);
    }

    #[test]
    fn test_unparseable_json_kept_as_text() {
        let schema = schema();
        let mut form = FormState::new(&schema, &networks());
        form.set("indices", "word1 word2 word3").unwrap();
        form.set("index", "abc").unwrap();

        let values = form.to_values(&schema);
        assert_eq!(values.get("indices"), Some(&json!("word1 word2 word3")));
        assert_eq!(values.get("index"), Some(&json!("abc")));
        assert_eq!(values.index("index"), None);
    }
}
