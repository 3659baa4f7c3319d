//! Product-list CSV loader.
//!
//! The input is a hand-maintained CSV: a `code` column is required, and
//! `parent_cat`, `sub_cat`, and `image_url` are picked up when present.
//! Fields may be double-quoted with `""` escapes. Rows with a blank code
//! are skipped; a missing file is a startup error, not an empty list.

use std::path::Path;

use thiserror::Error;

use stockbook_core::Product;

#[derive(Debug, Error)]
pub enum ProductListError {
    #[error("failed to read product list at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("product list must contain a \"code\" column")]
    MissingCodeColumn,
}

/// Load the product list from `path`.
pub fn load_products(path: &Path) -> Result<Vec<Product>, ProductListError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ProductListError::Read { path: path.display().to_string(), source })?;
    parse_products(&content)
}

/// Parse CSV content into products. Header names are matched
/// case-insensitively after trimming.
pub fn parse_products(content: &str) -> Result<Vec<Product>, ProductListError> {
    let lines: Vec<&str> = content.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let Some((header, rows)) = lines.split_first() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> =
        parse_line(header).iter().map(|h| h.trim().to_lowercase()).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let code_column = column("code").ok_or(ProductListError::MissingCodeColumn)?;
    let parent_column = column("parent_cat");
    let sub_column = column("sub_cat");
    let image_column = column("image_url");

    let mut products = Vec::new();
    for row in rows {
        let fields = parse_line(row);
        let field = |index: Option<usize>| {
            index
                .and_then(|i| fields.get(i))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let Some(code) = field(Some(code_column)) else { continue };
        products.push(Product {
            code,
            parent_cat: field(parent_column),
            sub_cat: field(sub_column),
            image_url: field(image_column),
        });
    }

    Ok(products)
}

/// Split one CSV line, honoring double-quoted fields and `""` escapes.
fn parse_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                values.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    values.push(current);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_code_column() {
        let result = parse_products("name,parent_cat\nfoo,bar\n");
        assert!(matches!(result, Err(ProductListError::MissingCodeColumn)));
    }

    #[test]
    fn test_parses_optional_columns() {
        let csv = "code,parent_cat,sub_cat,image_url\n\
                   BP96,Bags,Backpacks,https://x/bp96.jpg\n\
                   TB01,,,\n";

        let products = parse_products(csv).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].code, "BP96");
        assert_eq!(products[0].parent_cat.as_deref(), Some("Bags"));
        assert_eq!(products[0].image_url.as_deref(), Some("https://x/bp96.jpg"));
        assert!(products[1].parent_cat.is_none());
    }

    #[test]
    fn test_skips_blank_codes_and_empty_lines() {
        let csv = "code\n\nBP96\n   \n,\nTB01\n";
        let products = parse_products(csv).unwrap();
        let codes: Vec<&str> = products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["BP96", "TB01"]);
    }

    #[test]
    fn test_quoted_fields_with_commas_and_escapes() {
        let csv = "code,sub_cat\n\"BP,96\",\"say \"\"hi\"\"\"\n";
        let products = parse_products(csv).unwrap();
        assert_eq!(products[0].code, "BP,96");
        assert_eq!(products[0].sub_cat.as_deref(), Some(r#"say "hi""#));
    }

    #[test]
    fn test_empty_content_is_empty_list() {
        assert!(parse_products("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_products(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(ProductListError::Read { .. })));
    }
}
