use serde_json::Value;

/// Print a single headline value, suitable for shell scripting.
///
/// Analysis output reduces to the monthly payment, a bare schedule reduces to
/// its payoff length in months, and a lifecycle position reduces to the
/// current balance. Anything unrecognized falls back to its first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Array(schedule) = result_obj {
        println!("{}", schedule.len());
        return;
    }

    let priority_keys = [
        "monthly_payment",
        "current_balance",
        "interest_saved",
        "months_to_payoff",
        "loan_amount",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            match map.get(*key) {
                Some(val) if !val.is_null() => {
                    println!("{}", render(val));
                    return;
                }
                _ => {}
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, render(val));
            return;
        }
    }

    println!("{}", render(result_obj));
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
