use serde_json::Value;

/// Print just the key answer value from the output.
///
/// For a full decision result this is the traffic-light signal; other
/// commands fall back through their own headline fields, then to the
/// first field in the result object.
pub fn print_minimal(value: &Value) {
    // Unwrap the "result" envelope when present
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of headline output fields
    let priority_keys = [
        "signal",
        "score",
        "survivalMonths",
        "optimalExitMonth",
        "totalMonthlyPayment",
        "monthlyProfit",
        "paybackMonths",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
