use crate::client::BEditaApiClient;
use crate::error::ClientError;
use crate::interceptor::ResponseInterceptor;
use crate::response::ApiResponse;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;

/// The relationship name carrying object translations.
const TRANSLATIONS_RELATION: &str = "translations";

/// Maps `included` resources inline into the relationships that reference
/// them.
///
/// Every relationship whose `data` holds identifier stubs gets the stubs
/// replaced by the matching full resource objects from `included`, matched by
/// `id`; a stub with no matching included entry resolves to `null`. Works
/// uniformly on a single resource or an array, each element independently.
/// The mapped document lands in [`ApiResponse::formatted_data`] as
/// `{"data": ...}`; with no `included` the data passes through unchanged.
///
/// When built with [`replace_with_translation`](Self::replace_with_translation),
/// matched resources of the `translations` relation whose `lang` equals the
/// target language additionally have their non-empty `translated_fields`
/// merged into the owning resource's attributes; empty fields never overwrite
/// a present value.
#[derive(Default)]
pub struct MapIncludedInterceptor {
    replace_with_translation: Option<String>,
}

impl MapIncludedInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map includes and substitute translated fields for `lang`.
    #[must_use]
    pub fn replace_with_translation(lang: impl Into<String>) -> Self {
        Self {
            replace_with_translation: Some(lang.into()),
        }
    }

    fn prepare_data(&self, data: Value, included: &[Value]) -> Value {
        let index = build_index(included);
        match data {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.map_included(item, &index))
                    .collect(),
            ),
            other => self.map_included(other, &index),
        }
    }

    /// Resolve every relationship stub of one resource against the index.
    fn map_included(&self, mut resource: Value, index: &HashMap<String, &Value>) -> Value {
        // Translated fields are collected first and merged after the
        // relationship walk, since both borrow into the resource.
        let mut translated_fields: Vec<(String, Value)> = Vec::new();

        if let Some(relationships) = resource
            .get_mut("relationships")
            .and_then(Value::as_object_mut)
        {
            for (rel_name, rel) in relationships.iter_mut() {
                let Some(rel) = rel.as_object_mut() else {
                    continue;
                };

                let resolved = match rel.get("data") {
                    Some(Value::Array(stubs)) if !stubs.is_empty() => Value::Array(
                        stubs
                            .iter()
                            .map(|stub| resolve(stub, index).cloned().unwrap_or(Value::Null))
                            .collect(),
                    ),
                    Some(stub @ Value::Object(_)) => {
                        resolve(stub, index).cloned().unwrap_or(Value::Null)
                    }
                    _ => continue,
                };

                if rel_name == TRANSLATIONS_RELATION {
                    if let Some(lang) = &self.replace_with_translation {
                        collect_translated_fields(&resolved, lang, &mut translated_fields);
                    }
                }

                rel.insert("data".to_owned(), resolved);
            }
        }

        if !translated_fields.is_empty() {
            if let Some(attributes) = resource
                .get_mut("attributes")
                .and_then(Value::as_object_mut)
            {
                for (field, value) in translated_fields {
                    attributes.insert(field, value);
                }
            }
        }

        resource
    }
}

/// Index included resources by id once per response.
fn build_index(included: &[Value]) -> HashMap<String, &Value> {
    let mut index = HashMap::with_capacity(included.len());
    for item in included {
        if let Some(key) = item.get("id").and_then(id_key) {
            // First match wins.
            index.entry(key).or_insert(item);
        }
    }
    index
}

/// Canonical map key for a JSON:API id, which backends emit as either a
/// string or a bare number.
fn id_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn resolve<'a>(stub: &Value, index: &HashMap<String, &'a Value>) -> Option<&'a Value> {
    stub.get("id")
        .and_then(id_key)
        .and_then(|key| index.get(&key).copied())
}

/// Gather non-empty `translated_fields` of resolved translation resources
/// whose `lang` matches the target language.
fn collect_translated_fields(resolved: &Value, lang: &str, out: &mut Vec<(String, Value)>) {
    let items = match resolved {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };

    for item in items {
        if item.pointer("/attributes/lang").and_then(Value::as_str) != Some(lang) {
            continue;
        }
        let Some(fields) = item
            .pointer("/attributes/translated_fields")
            .and_then(Value::as_object)
        else {
            continue;
        };
        for (field, value) in fields {
            if is_truthy(value) {
                out.push((field.clone(), value.clone()));
            }
        }
    }
}

/// Empty-string and falsy values are dropped before merging so they never
/// overwrite a present attribute.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[async_trait]
impl ResponseInterceptor for MapIncludedInterceptor {
    fn name(&self) -> &'static str {
        "map-included"
    }

    async fn on_response(
        &self,
        _client: &BEditaApiClient,
        mut response: ApiResponse,
    ) -> Result<ApiResponse, ClientError> {
        let Some(body) = &response.body else {
            return Ok(response);
        };

        let data = body.get("data").cloned().unwrap_or(Value::Null);
        let included = body.get("included").and_then(Value::as_array);

        let mapped = match included {
            Some(included) if !included.is_empty() => self.prepare_data(data, included),
            _ => data,
        };

        response.formatted_data = Some(json!({"data": mapped}));

        Ok(response)
    }
}
