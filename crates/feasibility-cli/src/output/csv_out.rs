use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// Row-oriented payloads (amortization schedules, exit-plan months,
/// improvement scenarios) become one CSV row per entry; everything else
/// flattens to two columns.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = map.get("result").unwrap_or(value);
            match result {
                Value::Object(res_map) => {
                    if let Some(rows) = tabular_section(res_map) {
                        write_array_csv(&mut wtr, rows);
                    } else {
                        let _ = wtr.write_record(["field", "value"]);
                        for (key, val) in res_map {
                            let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                        }
                    }
                }
                Value::Array(rows) => write_array_csv(&mut wtr, rows),
                other => {
                    let _ = wtr.write_record([&format_csv_value(other)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Pick the dominant row array out of a result object, if it has one.
fn tabular_section(map: &serde_json::Map<String, Value>) -> Option<&Vec<Value>> {
    for key in ["combined", "months", "scenarioTable"] {
        if let Some(Value::Array(rows)) = map.get(key) {
            if !rows.is_empty() {
                return Some(rows);
            }
        }
    }
    None
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(*h)
                            .map(|v| format_csv_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
