use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Deepest bracket nesting accepted in a form key (`a[b][c]` is depth 2).
/// Keys nested deeper are dropped.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Decoded parameters keyed by name.
///
/// Values are strings, lists of strings for repeated keys, nested maps for
/// bracketed keys (`user[name]=x`) or arbitrary JSON for JSON bodies. The map is
/// ordered, so two decodes of the same input compare equal.
pub type Params = Map<String, Value>;

/// Query, body and merged parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedParameters {
    pub query: Params,
    pub body: Params,
    /// `query` overlaid by `body`; body wins on key collision
    pub merged: Params,
}

impl ParsedParameters {
    #[must_use]
    pub fn new(query: Params, body: Params) -> Self {
        let merged = merge_params(&query, &body);
        Self {
            query,
            body,
            merged,
        }
    }

    /// Merged value for `name`, if it is a plain string
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.merged.get(name).and_then(Value::as_str)
    }
}

/// Overlay `body` on top of `query`.
#[must_use]
pub fn merge_params(query: &Params, body: &Params) -> Params {
    let mut merged = query.clone();
    for (key, value) in body {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Decode an `application/x-www-form-urlencoded` payload (or a raw query string).
///
/// Percent sequences and `+` are decoded lossily; a pair without `=` gets an
/// empty value and pairs with an empty name are dropped. Repeated keys
/// accumulate into a list in input order.
#[must_use]
pub fn parse_form(input: &[u8]) -> Params {
    let mut params = Params::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        insert_form_value(&mut params, &key, Value::String(value.into_owned()));
    }
    params
}

/// Insert one decoded `name=value` pair, honouring bracket syntax.
///
/// `a[]` appends to a list, `a[k]` writes into a nested map, and both nest
/// (`a[k][]`). A key whose brackets never close is taken literally. A key with
/// more than [`MAX_NESTING_DEPTH`] bracket segments is dropped.
pub fn insert_form_value(params: &mut Params, key: &str, value: Value) {
    let Some((base, path)) = split_bracketed_key(key) else {
        debug!(
            key_len = key.len(),
            max_depth = MAX_NESTING_DEPTH,
            "Form key nested too deeply, dropped"
        );
        return;
    };
    if base.is_empty() {
        return;
    }
    if path.is_empty() {
        accumulate(params, base, value);
        return;
    }
    let slot = params.entry(base.to_string()).or_insert(Value::Null);
    insert_nested(slot, &path, value);
}

/// Parse a JSON request body into parameters.
///
/// A top-level object is used as-is and a top-level array is keyed by index.
/// Scalars and invalid documents produce an empty map.
#[must_use]
pub fn parse_json_body(body: &[u8]) -> Params {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Ok(_) => Params::new(),
        Err(err) => {
            debug!(error = %err, body_size_bytes = body.len(), "JSON body parse failed");
            Params::new()
        }
    }
}

fn split_bracketed_key(key: &str) -> Option<(&str, Vec<&str>)> {
    let Some(open) = key.find('[') else {
        return Some((key, Vec::new()));
    };
    let base = &key[..open];
    let mut rest = &key[open..];
    let mut path = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(close) => {
                if path.len() == MAX_NESTING_DEPTH {
                    return None;
                }
                path.push(&stripped[..close]);
                rest = &stripped[close + 1..];
            }
            None => break,
        }
    }
    if path.is_empty() || base.is_empty() {
        return Some((key, Vec::new()));
    }
    Some((base, path))
}

fn accumulate(params: &mut Params, key: &str, value: Value) {
    match params.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
        None => {
            params.insert(key.to_string(), value);
        }
    }
}

fn insert_nested(slot: &mut Value, path: &[&str], value: Value) {
    let (segment, rest) = match path.split_first() {
        Some(split) => split,
        None => {
            *slot = value;
            return;
        }
    };

    if segment.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            if rest.is_empty() {
                items.push(value);
            } else {
                let mut child = Value::Null;
                insert_nested(&mut child, rest, value);
                items.push(child);
            }
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        if rest.is_empty() {
            accumulate(map, segment, value);
        } else {
            let child = map.entry(segment.to_string()).or_insert(Value::Null);
            insert_nested(child, rest, value);
        }
    }
}
