use colored::Colorize;
use serde_json::Value;
use tabled::{Table, builder::Builder};

/// Format output as a table using the tabled crate.
///
/// Full decision results get a dedicated multi-section rendering; other
/// payloads fall back to a generic field/value or row table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                if is_decision_result(result) {
                    print_decision_tables(result);
                } else {
                    print_result_table(result);
                }
                print_envelope_footer(map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn is_decision_result(result: &Value) -> bool {
    result
        .as_object()
        .map(|m| m.contains_key("finalJudgement") && m.contains_key("signal"))
        .unwrap_or(false)
}

fn print_decision_tables(result: &Value) {
    let map = match result.as_object() {
        Some(m) => m,
        None => return,
    };

    // Headline: colored signal, judgement label, score, survival
    if let Some(signal) = map.get("signal").and_then(|v| v.as_str()) {
        let label = map
            .get("finalJudgement")
            .and_then(|j| j.get("label"))
            .and_then(|v| v.as_str())
            .unwrap_or("");
        println!("{} {}", colorize_signal(signal), label.bold());
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    if let Some(score) = map.get("score").and_then(|s| s.get("score")) {
        builder.push_record(["score", &format_value(score)]);
    }
    if let Some(months) = map.get("survival").and_then(|s| s.get("months")) {
        builder.push_record(["survivalMonths", &format_value(months)]);
    }
    if let Some(finance) = map.get("finance").and_then(|f| f.as_object()) {
        for key in ["monthlyRevenue", "monthlyProfit", "paybackMonths"] {
            if let Some(val) = finance.get(key) {
                builder.push_record([key, &format_value(val)]);
            }
        }
    }
    if let Some(exit) = map.get("exitPlan").and_then(|e| e.get("optimalExitMonth")) {
        builder.push_record(["optimalExitMonth", &format_value(exit)]);
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Array(cards)) = map.get("riskCards") {
        if !cards.is_empty() {
            println!("\nRisk cards:");
            print_rows(cards, &["id", "title", "severity", "narrative"]);
        }
    }

    if let Some(Value::Array(scenarios)) = map.get("improvements") {
        if !scenarios.is_empty() {
            println!("\nImprovement scenarios:");
            print_rows(
                scenarios,
                &["id", "signal", "score", "survivalMonths", "monthlyProfit"],
            );
        }
    }

    if let Some(Value::Array(reasons)) = map.get("hardCutReasons") {
        if !reasons.is_empty() {
            println!("\nHard cuts:");
            for r in reasons {
                println!("  - {}", format_value(r).red());
            }
        }
    }
}

fn colorize_signal(signal: &str) -> colored::ColoredString {
    match signal {
        "green" => signal.green().bold(),
        "yellow" => signal.yellow().bold(),
        "red" => signal.red().bold(),
        other => other.normal(),
    }
}

fn print_result_table(result: &Value) {
    match result {
        Value::Object(res_map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in res_map {
                builder.push_record([key.as_str(), &format_value(val)]);
            }
            println!("{}", Table::from(builder));
        }
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", other),
    }
}

fn print_envelope_footer(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s.yellow());
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let header_refs: Vec<&str> = headers.iter().map(|h| h.as_str()).collect();
        print_rows(arr, &header_refs);
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn print_rows(arr: &[Value], headers: &[&str]) {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
