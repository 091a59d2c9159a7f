//! Markdown sanitization of the frontend config

use serde_json::Value;

/// Converts operator-written markdown to HTML that is safe to inject
pub trait MarkdownConverter: Send + Sync {
    fn make_sanitized_html(&self, markdown: &str) -> String;
}

/// Return a copy of `config` with every markdown field converted
///
/// Converted fields (only when present and a non-empty string; values of any
/// other JSON type are left as they are):
///
/// ```text
/// alert.message
/// costObjects[].description
/// sla.description
/// addonDefinition.description
/// resourceQuotaHelp.text
/// controlPlaneHighAvailabilityHelp.text
/// accessRestriction.items[].{display,input}.description
/// accessRestriction.items[].options[].{display,input}.description
/// vendorHints[].message
/// ```
pub fn sanitize_frontend_config(config: &Value, converter: &dyn MarkdownConverter) -> Value {
    let mut sanitized = config.clone();

    convert_field(converter, sanitized.get_mut("alert"), "message");
    for cost_object in each_item(sanitized.get_mut("costObjects")) {
        convert_field(converter, Some(cost_object), "description");
    }
    convert_field(converter, sanitized.get_mut("sla"), "description");
    convert_field(converter, sanitized.get_mut("addonDefinition"), "description");
    convert_field(converter, sanitized.get_mut("resourceQuotaHelp"), "text");
    convert_field(converter, sanitized.get_mut("controlPlaneHighAvailabilityHelp"), "text");

    let items = sanitized
        .get_mut("accessRestriction")
        .and_then(|restriction| restriction.get_mut("items"));
    for item in each_item(items) {
        convert_display_and_input(converter, item);
        for option in each_item(item.get_mut("options")) {
            convert_display_and_input(converter, option);
        }
    }

    for vendor_hint in each_item(sanitized.get_mut("vendorHints")) {
        convert_field(converter, Some(vendor_hint), "message");
    }

    sanitized
}

fn convert_display_and_input(converter: &dyn MarkdownConverter, entry: &mut Value) {
    convert_field(converter, entry.get_mut("display"), "description");
    convert_field(converter, entry.get_mut("input"), "description");
}

fn convert_field(converter: &dyn MarkdownConverter, container: Option<&mut Value>, key: &str) {
    let Some(Value::Object(map)) = container else {
        return;
    };
    if let Some(Value::String(text)) = map.get_mut(key) {
        if !text.is_empty() {
            *text = converter.make_sanitized_html(text);
        }
    }
}

/// Elements of an array value; nothing for missing or non-array values
fn each_item(container: Option<&mut Value>) -> impl Iterator<Item = &mut Value> {
    container.and_then(Value::as_array_mut).into_iter().flatten()
}
