use docrev_core::model::{CanonicalField, DocumentLabel, ExtractionResult};
use docrev_core::regions::pages_with_regions;
use docrev_core::usage::{estimate_cost, Pricing, PRICE_PER_1K_INPUT_VAR, PRICE_PER_1K_OUTPUT_VAR};

pub fn print_result(result: &ExtractionResult, label: Option<&DocumentLabel>) {
    if let Some(label) = label {
        let conf = label
            .confidence
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "Document type: {} (confidence: {conf}) | Profile: {}",
            label.label, result.profile_id
        );
    }

    if let Some(usage) = &result.usage {
        let models = if usage.models.is_empty() {
            "Unknown".to_string()
        } else {
            usage.models.join(", ")
        };
        let cost_txt = match estimate_cost(usage, &Pricing::from_env()) {
            Some(cost) => format!("Estimated cost: ${cost:.4}"),
            None => format!(
                "Set {PRICE_PER_1K_INPUT_VAR} and {PRICE_PER_1K_OUTPUT_VAR} to estimate cost."
            ),
        };
        println!(
            "Model(s): {models} | Tokens: {} (in {} / out {}) | {cost_txt}",
            usage.total_tokens(),
            usage.input_tokens,
            usage.output_tokens
        );
    }

    println!();
    if result.fields.is_empty() {
        println!("(no fields extracted)");
        return;
    }

    println!("Extracted fields:");
    let max_name = result
        .fields
        .iter()
        .map(|f| f.name.len())
        .max()
        .unwrap_or(10);

    for field in &result.fields {
        print_field(field, max_name, 1);
    }
}

fn print_field(field: &CanonicalField, name_width: usize, depth: usize) {
    let pages = pages_with_regions(field);
    let pages_txt = if pages.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = pages.iter().map(u32::to_string).collect();
        format!("  (page {})", list.join(", "))
    };

    let indent = depth * 2;
    println!(
        "{:indent$}{:<name_width$}  {}{}",
        "",
        field.name,
        field.value.preview(),
        pages_txt,
        indent = indent,
        name_width = name_width
    );

    for child in field.value.children() {
        print_field(child, name_width, depth + 1);
    }
}
