use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Formats Gemini accepts on `responseSchema` fields; anything else is dropped.
const SUPPORTED_FORMATS: &[&str] = &["int32", "int64", "float", "double", "enum", "date-time"];

/// Keys of a JSON Schema object that the Gemini OpenAPI subset understands.
const SUPPORTED_KEYS: &[&str] = &[
    "type",
    "format",
    "description",
    "nullable",
    "enum",
    "properties",
    "required",
    "items",
    "minimum",
    "maximum",
    "minItems",
    "maxItems",
];

/// Types usable as Gemini structured output.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a Gemini-compatible `responseSchema` for this type.
    ///
    /// Gemini takes an OpenAPI 3.0 subset:
    /// 1. no `$ref`: every definition is inlined
    /// 2. `Option<T>` is `nullable: true`, not a `["T", "null"]` type union
    /// 3. type names are upper-case (`OBJECT`, `STRING`, ...)
    /// 4. unknown keywords (`title`, `additionalProperties`, `$schema`) are rejected
    fn gemini_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => map.remove("definitions").unwrap_or(Value::Null),
            _ => Value::Null,
        };

        to_gemini(&mut value, &definitions);
        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn to_gemini(value: &mut Value, definitions: &Value) {
    let Value::Object(map) = value else {
        return;
    };

    if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
        let name = ref_path.trim_start_matches("#/definitions/");
        if let Some(def) = definitions.get(name) {
            *value = def.clone();
            to_gemini(value, definitions);
            return;
        }
    }

    // `allOf: [X]` is how schemars wraps a documented reference.
    if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
        if let [single] = all_of.as_slice() {
            let description = map.get("description").cloned();
            *value = single.clone();
            to_gemini(value, definitions);
            if let (Value::Object(inner), Some(d)) = (&mut *value, description) {
                inner.insert("description".to_string(), d);
            }
            return;
        }
    }

    // `anyOf: [X, {type: null}]` is an Option<X> around a reference.
    if let Some(Value::Array(any_of)) = map.get("anyOf").cloned() {
        let non_null: Vec<&Value> = any_of
            .iter()
            .filter(|v| v.get("type") != Some(&Value::String("null".into())))
            .collect();
        if non_null.len() == 1 && any_of.len() == 2 {
            *value = non_null[0].clone();
            to_gemini(value, definitions);
            if let Value::Object(inner) = value {
                inner.insert("nullable".to_string(), Value::Bool(true));
            }
            return;
        }
    }

    if let Some(Value::Array(types)) = map.get("type").cloned() {
        let concrete: Vec<&Value> = types.iter().filter(|t| t.as_str() != Some("null")).collect();
        if let Some(first) = concrete.first() {
            map.insert("type".to_string(), (*first).clone());
        }
        if concrete.len() < types.len() {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
    }

    if let Some(Value::String(ty)) = map.get("type").cloned() {
        map.insert("type".to_string(), Value::String(ty.to_uppercase()));
    }

    if let Some(Value::String(format)) = map.get("format") {
        if !SUPPORTED_FORMATS.contains(&format.as_str()) {
            map.remove("format");
        }
    }

    map.retain(|k, _| SUPPORTED_KEYS.contains(&k.as_str()));

    if let Some(Value::Object(props)) = map.get_mut("properties") {
        for (_, v) in props.iter_mut() {
            to_gemini(v, definitions);
        }
    }
    if let Some(items) = map.get_mut("items") {
        to_gemini(items, definitions);
    }
    if let Some(Value::Array(required)) = map.get("required") {
        if required.is_empty() {
            map.remove("required");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename_all = "lowercase")]
    #[allow(dead_code)]
    enum Verdict {
        Yes,
        No,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Citation {
        name: String,
        url: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Judgement {
        /// The call.
        verdict: Verdict,
        score: u8,
        citations: Vec<Citation>,
        note: Option<Citation>,
    }

    #[test]
    fn top_level_is_upper_case_object_without_definitions() {
        let schema = Judgement::gemini_schema();
        let obj = schema.as_object().unwrap();
        assert_eq!(obj.get("type"), Some(&Value::String("OBJECT".into())));
        assert!(!obj.contains_key("definitions"));
        assert!(!obj.contains_key("$schema"));
        assert!(!obj.contains_key("title"));
    }

    #[test]
    fn refs_are_inlined() {
        let schema = Judgement::gemini_schema();
        let text = serde_json::to_string(&schema).unwrap();
        assert!(!text.contains("$ref"));
        assert!(!text.contains("allOf"));
        assert!(!text.contains("anyOf"));

        let verdict = &schema["properties"]["verdict"];
        assert_eq!(verdict["type"], "STRING");
        assert_eq!(verdict["enum"], serde_json::json!(["yes", "no"]));
        assert_eq!(verdict["description"], "The call.");
    }

    #[test]
    fn option_becomes_nullable() {
        let schema = Judgement::gemini_schema();
        let url = &schema["properties"]["citations"]["items"]["properties"]["url"];
        assert_eq!(url["type"], "STRING");
        assert_eq!(url["nullable"], true);

        let note = &schema["properties"]["note"];
        assert_eq!(note["type"], "OBJECT");
        assert_eq!(note["nullable"], true);
    }

    #[test]
    fn unsupported_formats_are_dropped() {
        let schema = Judgement::gemini_schema();
        let score = schema["properties"]["score"].as_object().unwrap();
        assert_eq!(score.get("type"), Some(&Value::String("INTEGER".into())));
        assert!(!score.contains_key("format"));
    }
}
