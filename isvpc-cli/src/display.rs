//! Plan and state rendering

use std::collections::HashMap;

use colored::{ColoredString, Colorize};
use isvpc_core::effect::Effect;
use isvpc_core::plan::Plan;
use isvpc_core::resource::{Resource, State, Value};
use isvpc_state::ResourceState;

pub fn print_plan(plan: &Plan) {
    if plan.has_no_changes() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        println!("  {} {}", colored_symbol(effect), effect.resource_id());
        match effect {
            Effect::Read(resource) | Effect::Create(resource) => {
                for (key, value) in sorted(&resource.attributes) {
                    println!("      {}: {}", key, format_value(value));
                }
            }
            Effect::Update {
                from,
                to,
                changed_attributes,
                ..
            } => {
                for key in changed_attributes {
                    println!("      {}", change_line(key, from, to));
                }
            }
            Effect::Replace {
                from,
                to,
                changed_attributes,
                ..
            } => {
                for key in changed_attributes {
                    println!(
                        "      {} {}",
                        change_line(key, from, to),
                        "(forces replacement)".yellow()
                    );
                }
            }
            Effect::Delete { identifier, .. } => {
                println!("      id: {}", identifier.dimmed());
            }
        }
    }

    println!();
    let summary = plan.summary();
    println!(
        "Plan: {} to add, {} to change, {} to replace, {} to destroy.",
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.replace.to_string().yellow(),
        summary.delete.to_string().red()
    );
}

/// `key: old → new`, with `(none)` for a side that lacks the attribute
fn change_line(key: &str, from: &State, to: &Resource) -> String {
    let side = |value: Option<&Value>| {
        value
            .map(format_value)
            .unwrap_or_else(|| "(none)".to_string())
    };
    format!(
        "{}: {} → {}",
        key,
        side(from.attributes.get(key)).red(),
        side(to.attributes.get(key)).green()
    )
}

fn colored_symbol(effect: &Effect) -> ColoredString {
    match effect {
        Effect::Read(_) => effect.symbol().cyan(),
        Effect::Create(_) => effect.symbol().green().bold(),
        Effect::Update { .. } => effect.symbol().yellow().bold(),
        Effect::Replace { .. } => effect.symbol().magenta().bold(),
        Effect::Delete { .. } => effect.symbol().red().bold(),
    }
}

fn sorted(attributes: &HashMap<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = attributes.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut strs: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            strs.sort();
            format!("{{{}}}", strs.join(", "))
        }
        Value::ResourceRef(binding, attr) => format!("(known after apply: {}.{})", binding, attr),
    }
}

/// `state show` output
pub fn print_resource_state(resource: &ResourceState) {
    println!(
        "{}",
        format!("{}.{}", resource.resource_type, resource.name).bold()
    );
    println!("  provider:   {}", resource.provider);
    println!(
        "  identifier: {}",
        resource.identifier.as_deref().unwrap_or("(none)")
    );
    let mut keys: Vec<_> = resource.attributes.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {} = {}", key, resource.attributes[key]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_nested_values() {
        let value = Value::Map(
            [
                ("b".to_string(), Value::List(vec![Value::Int(1), Value::Bool(true)])),
                ("a".to_string(), Value::String("x".to_string())),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(format_value(&value), "{a: \"x\", b: [1, true]}");
    }

    #[test]
    fn removed_attribute_renders_as_none() {
        colored::control::set_override(false);
        let from = State::existing(
            isvpc_core::resource::ResourceId::new("is_subnet", "web"),
            [("public_gateway".to_string(), Value::String("r006-pgw".to_string()))]
                .into_iter()
                .collect(),
        );
        let to = Resource::new("is_subnet", "web");
        assert_eq!(
            change_line("public_gateway", &from, &to),
            "public_gateway: \"r006-pgw\" → (none)"
        );
    }

    #[test]
    fn references_render_as_unknown() {
        let value = Value::ResourceRef("main".to_string(), "id".to_string());
        assert_eq!(format_value(&value), "(known after apply: main.id)");
    }
}
