//! Category specification listing.

use anyhow::Result;
use turbo_commerce::catalog::{CategorySpec, SpecField, SpecFieldKind};

use super::SpecsArgs;
use crate::context::Context;
use crate::output::Output;

/// Run the specs command.
pub async fn run(args: SpecsArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;

    match args.category {
        Some(category) => {
            let spec = backend.category_spec(&category).await?;
            if ctx.output.is_json() {
                ctx.output.json(&spec);
                return Ok(());
            }
            print_spec(&spec, &ctx.output);
        }
        None => {
            let specs = backend.category_specs().await?;
            if ctx.output.is_json() {
                ctx.output.json(&specs);
                return Ok(());
            }
            if specs.is_empty() {
                ctx.output.info("No category specifications");
                return Ok(());
            }
            for category in specs.categories() {
                if let Some(spec) = specs.get(category) {
                    print_spec(spec, &ctx.output);
                }
            }
        }
    }

    Ok(())
}

fn print_spec(spec: &CategorySpec, output: &Output) {
    output.header(&spec.category);
    for field in &spec.required {
        output.list_item(&format!("{} (required)", describe(field)));
    }
    for field in &spec.optional {
        output.list_item(&describe(field));
    }
    for (name, options) in &spec.filters {
        output.kv(name, &options.join(", "));
    }
}

fn describe(field: &SpecField) -> String {
    let kind = match field.kind {
        SpecFieldKind::String => "text",
        SpecFieldKind::Number => "number",
        SpecFieldKind::Boolean => "yes/no",
        SpecFieldKind::List => "list",
    };
    match &field.unit {
        Some(unit) => format!("{}: {} [{}]", field.name, kind, unit),
        None => format!("{}: {}", field.name, kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_field() {
        let ram = SpecField::new("ram", SpecFieldKind::Number).with_unit("GB");
        assert_eq!(describe(&ram), "ram: number [GB]");
        assert_eq!(describe(&SpecField::new("color", SpecFieldKind::String)), "color: text");
    }
}
