use serde_json::Value;

use crate::domain::Industry;

/// Title-cases a raw industry category. `/` and `-` are padded out first so
/// the words around them are capitalized independently, then the padding is
/// collapsed again: `"oil/gas-pipeline"` becomes `"Oil/Gas-Pipeline"`.
pub fn industry_name(raw: &str) -> String {
    let padded = raw.replace('/', " / ").replace('-', " - ").to_lowercase();
    let title = padded
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    title.replace(" / ", "/").replace(" - ", "-")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Maps the raw industries payload into output entries, dropping every field
/// except count, amount, id and the normalized name. `None` when the payload
/// is not the expected array.
pub fn process_industries(raw: &Value) -> Option<Vec<Industry>> {
    let entries = raw.as_array()?;
    let industries = entries
        .iter()
        .map(|entry| Industry {
            count: entry.get("count").cloned().unwrap_or(Value::Null),
            amount: entry.get("amount").cloned().unwrap_or(Value::Null),
            id: entry.get("id").cloned().unwrap_or(Value::Null),
            name: industry_name(entry.get("name").and_then(Value::as_str).unwrap_or_default()),
        })
        .collect();
    Some(industries)
}
