//! JSON <-> `Term` conversion for command line values.

use rowvault_core::{Record, Term};
use serde_json::{json, Map, Number, Value};

pub fn term_from_json(value: Value) -> Term {
    match value {
        Value::Null => Term::Nil,
        Value::Bool(flag) => Term::Bool(flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Term::Int(int),
            None => Term::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => Term::Str(text),
        Value::Array(items) => Term::List(items.into_iter().map(term_from_json).collect()),
        Value::Object(entries) => Term::Map(
            entries
                .into_iter()
                .map(|(name, value)| (name, term_from_json(value)))
                .collect(),
        ),
    }
}

pub fn term_to_json(term: &Term) -> Value {
    match term {
        Term::Nil => Value::Null,
        Term::Bool(flag) => Value::Bool(*flag),
        Term::Int(int) => Value::from(*int),
        // JSON has no NaN or infinity.
        Term::Float(float) => Number::from_f64(*float).map_or(Value::Null, Value::Number),
        Term::Str(text) => Value::String(text.clone()),
        Term::Bytes(bytes) => Value::Array(bytes.iter().map(|byte| Value::from(*byte)).collect()),
        Term::List(items) => Value::Array(items.iter().map(term_to_json).collect()),
        Term::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(name, value)| (name.clone(), term_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
    }
}

pub fn record_to_json(record: &Record<Term>) -> Value {
    json!({
        "sequence_id": record.sequence_id,
        "key": String::from_utf8_lossy(&record.key),
        "value": record.value.as_ref().map_or(Value::Null, term_to_json),
        "created_at": record.created_at,
        "updated_at": record.updated_at,
    })
}
