use futures::future::join_all;
use insurance_form_core::domains::form::catalog::{FormCatalog, StaticFormCatalog};
use insurance_form_core::domains::form::rules::ValidationRuleset;
use insurance_form_core::domains::form::types::{FormSchema, FormValues};
use insurance_form_core::domains::form::visibility::active_fields;
use std::env;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Insurance Form Debug Tool");
    println!("============================");

    let args: Vec<String> = env::args().skip(1).collect();
    let catalog = StaticFormCatalog::new();

    match args.as_slice() {
        [] => print_overview(&catalog).await?,
        [category] => check_values(&catalog, category, FormValues::new()).await?,
        [category, values_path] => {
            let values = load_values(Path::new(values_path))?;
            check_values(&catalog, category, values).await?;
        }
        _ => {
            eprintln!("Usage: debug_forms [<category> [<values.json>]]");
            std::process::exit(2);
        }
    }

    println!("\n✅ DONE");
    Ok(())
}

fn load_values(path: &Path) -> Result<FormValues, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let values: FormValues = serde_json::from_str(&text)?;
    println!("📄 Loaded {} values from {}", values.len(), path.display());
    Ok(values)
}

async fn print_overview(catalog: &StaticFormCatalog) -> Result<(), Box<dyn std::error::Error>> {
    let categories = catalog.fetch_categories().await?;
    let schemas: Vec<_> = join_all(
        categories
            .iter()
            .map(|category| catalog.fetch_form_schema(&category.id)),
    )
    .await;

    println!("\n📋 CATEGORIES");
    println!("-------------");
    for (category, schema) in categories.iter().zip(schemas) {
        let schema = schema?;
        let required = schema.fields.iter().filter(|f| f.required).count();
        let conditional = schema.fields.iter().filter(|f| f.condition.is_some()).count();
        println!(
            "   {:<8} {:<20} {:>2} fields ({} required, {} conditional)",
            category.id,
            category.name,
            schema.fields.len(),
            required,
            conditional
        );
    }
    Ok(())
}

fn print_fields(schema: &FormSchema, values: &FormValues) {
    let shown: Vec<&str> = active_fields(schema, values)
        .iter()
        .map(|field| field.id.as_str())
        .collect();

    println!("\n📝 {}", schema.title);
    println!("{}", "-".repeat(schema.title.chars().count() + 3));
    for field in &schema.fields {
        let marker = if shown.contains(&field.id.as_str()) { "👁 " } else { "🚫" };
        let value = values
            .get(&field.id)
            .map(|v| serde_json::to_string(v).unwrap_or_default())
            .unwrap_or_else(|| "—".to_string());
        println!(
            "   {} {:<28} {:<9} {}{}",
            marker,
            field.id,
            field.kind.type_name(),
            value,
            if field.required { "  (required)" } else { "" }
        );
    }
}

async fn check_values(
    catalog: &StaticFormCatalog,
    category: &str,
    values: FormValues,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = catalog.fetch_form_schema(category).await?;
    if schema.is_empty() {
        println!("⚠️  No form is defined for '{}'", category);
        return Ok(());
    }

    let values = if values.is_empty() { schema.default_values() } else { values };
    print_fields(&schema, &values);

    let report = ValidationRuleset::build(&schema.fields).validate(&values);
    println!("\n🧪 VALIDATION");
    println!("-------------");
    if report.is_valid() {
        println!("   ✅ All visible fields are valid");
    } else {
        for failure in &report.failures {
            println!("   ❌ {:<28} {}", failure.field, failure.message);
        }
    }
    Ok(())
}
