//! Catalog export: the fixed-layout CSV and its JSON twin.
//!
//! The CSV layout is what the downstream import expects and is not
//! negotiable: fifteen columns, one main row per product followed by one
//! row per variant. The "Product Descrption" header misspelling is part
//! of that contract; consumers key on it as-is.

use std::path::{Path, PathBuf};

use chrono::Utc;

use stockbook_core::colour::extract_colour;
use stockbook_core::{CatalogEntry, ProductDetail};

pub const HEADERS: [&str; 15] = [
    "Essential",
    "Item Code",
    "Item SKU",
    "Parent Cat",
    "Sub Cat",
    "Price",
    "Quantity",
    "Colour",
    "Hex code",
    "Product Specs",
    "SEO Title",
    "Product Title",
    "Product Descrption",
    "Long Product Description",
    "Meta Description",
];

/// Render the full catalog as CSV text.
pub fn generate_csv(entries: &[CatalogEntry]) -> String {
    let mut rows = vec![HEADERS.map(escape_field).join(",")];

    fn field(value: Option<&String>) -> &str {
        value.map(String::as_str).unwrap_or_default()
    }

    for entry in entries {
        let specs = build_product_specs(entry.detail.as_ref());
        let copy = entry.marketing_copy.as_ref();

        let main_row = [
            "",
            entry.code.as_str(),
            "",
            field(entry.parent_cat.as_ref()),
            field(entry.sub_cat.as_ref()),
            "",
            "",
            "",
            "",
            specs.as_str(),
            field(copy.map(|c| &c.seo_title)),
            field(copy.map(|c| &c.product_title)),
            field(copy.map(|c| &c.short_description)),
            field(copy.map(|c| &c.long_description)),
            field(copy.map(|c| &c.meta_description)),
        ];
        rows.push(main_row.map(escape_field).join(","));

        for variant in &entry.variants {
            let price = variant.price.to_string();
            let quantity = variant.quantity.to_string();
            let colour = extract_colour(&variant.description);

            let variant_row = [
                "",
                "",
                variant.item_code.as_str(),
                "",
                "",
                price.as_str(),
                quantity.as_str(),
                colour.as_str(),
                "",
                "",
                "",
                "",
                "",
                "",
                "",
            ];
            rows.push(variant_row.map(escape_field).join(","));
        }
    }

    rows.join("\n")
}

/// The specs block for the main row: one `Label : value` line per
/// non-blank field, printing methods joined by ` / `.
pub fn build_product_specs(detail: Option<&ProductDetail>) -> String {
    let Some(detail) = detail else {
        return String::new();
    };

    let mut parts = Vec::new();
    let mut append = |label: &str, value: Option<&str>| {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            parts.push(format!("{label} : {value}"));
        }
    };

    append("Material", detail.material.as_deref());
    append("Dimension", detail.dimension.as_deref());
    append("Weight", detail.weight.as_deref());
    append("Finished", detail.finish.as_deref());
    append("Function", detail.function.as_deref());

    if !detail.printing_methods.is_empty() {
        let joined = detail.printing_methods.join(" / ");
        append("Printing Methods", Some(&joined));
    }

    parts.join("\n")
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// `prefix-YYYY-MM-DDTHH-MM-SS.ext` in UTC.
pub fn timestamped_filename(prefix: &str, extension: &str) -> String {
    format!("{prefix}-{}.{extension}", Utc::now().format("%Y-%m-%dT%H-%M-%S"))
}

pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Write the timestamped CSV plus a pretty-printed JSON twin of the full
/// catalog into `output_dir`.
pub fn write_outputs(output_dir: &Path, entries: &[CatalogEntry]) -> std::io::Result<ExportPaths> {
    let csv_name = timestamped_filename("stock-and-specs", "csv");
    let csv = output_dir.join(&csv_name);
    std::fs::write(&csv, generate_csv(entries))?;

    let json = csv.with_extension("json");
    let payload = serde_json::to_string_pretty(entries).map_err(std::io::Error::other)?;
    std::fs::write(&json, payload)?;

    Ok(ExportPaths { csv, json })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockbook_core::{MarketingCopy, StockRow};

    fn copy() -> MarketingCopy {
        MarketingCopy {
            seo_title: "BP96 Backpack | BP96".into(),
            product_title: "BP96 Backpack".into(),
            short_description: "Short.".into(),
            long_description: "Long, with a comma.".into(),
            meta_description: "Meta.".into(),
        }
    }

    fn entry() -> CatalogEntry {
        CatalogEntry {
            code: "BP96".into(),
            parent_cat: Some("Bags".into()),
            sub_cat: None,
            image_url: None,
            images: Vec::new(),
            detail: Some(ProductDetail {
                material: Some("600D Polyester".into()),
                printing_methods: vec!["Silkscreen".into(), "Embroidery".into()],
                ..ProductDetail::empty("BP96")
            }),
            marketing_copy: Some(copy()),
            variants: vec![StockRow {
                item_code: "BP9601".into(),
                description: "GREY waterproof Backpack".into(),
                quantity: 1234,
                price: 19.9,
            }],
        }
    }

    #[test]
    fn test_header_row_layout() {
        let csv = generate_csv(&[]);
        assert_eq!(csv, "Essential,Item Code,Item SKU,Parent Cat,Sub Cat,Price,Quantity,Colour,\
                         Hex code,Product Specs,SEO Title,Product Title,Product Descrption,\
                         Long Product Description,Meta Description");
    }

    #[test]
    fn test_main_and_variant_rows() {
        let csv = generate_csv(&[entry()]);

        // The specs block keeps its newline inside the quoted field, so
        // the main row spans two physical lines: header, main row (x2),
        // variant row.
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);

        assert!(lines[1].starts_with(",BP96,,Bags,,"));
        assert!(lines[1].ends_with("\"Material : 600D Polyester"));
        assert!(lines[2].starts_with("Printing Methods : Silkscreen / Embroidery\","));
        assert!(lines[2].contains("BP96 Backpack | BP96"));
        assert!(lines[2].contains("\"Long, with a comma.\""));

        assert_eq!(lines[3], ",,BP9601,,,19.9,1234,Waterproof Backpack,,,,,,,");
    }

    #[test]
    fn test_specs_block_lines() {
        let specs = build_product_specs(entry().detail.as_ref());
        assert_eq!(specs, "Material : 600D Polyester\nPrinting Methods : Silkscreen / Embroidery");
    }

    #[test]
    fn test_specs_block_empty_without_detail() {
        assert_eq!(build_product_specs(None), "");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_write_outputs_produces_csv_and_json_twin() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_outputs(dir.path(), &[entry()]).unwrap();

        assert!(paths.csv.exists());
        assert!(paths.json.exists());
        assert_eq!(paths.json.extension().unwrap(), "json");

        let json = std::fs::read_to_string(&paths.json).unwrap();
        let parsed: Vec<CatalogEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].code, "BP96");
    }
}
