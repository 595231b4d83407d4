//! Stringifies every JSON integer in a value tree so 64-bit counters
//! (campaign totals, sequence numbers, offsets, ...) survive the trip
//! through a JavaScript `JSON.parse` without losing precision past
//! `Number.MAX_SAFE_INTEGER` (§6). There is no `serde_with` in this
//! workspace's dependency stack, so this walks the already-serialized
//! `serde_json::Value` rather than annotating each struct field.

use serde_json::Value;

pub fn stringify_integers(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            *value = Value::String(n.to_string());
        }
        Value::Array(items) => items.iter_mut().for_each(stringify_integers),
        Value::Object(map) => map.values_mut().for_each(stringify_integers),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_become_strings_floats_do_not() {
        let mut value = json!({
            "total": 9_007_199_254_740_993i64,
            "progress": 0.5,
            "nested": { "sequence_number": 42u64 },
            "list": [1, 2, 3],
        });
        stringify_integers(&mut value);
        assert_eq!(value["total"], json!("9007199254740993"));
        assert_eq!(value["progress"], json!(0.5));
        assert_eq!(value["nested"]["sequence_number"], json!("42"));
        assert_eq!(value["list"], json!(["1", "2", "3"]));
    }
}
