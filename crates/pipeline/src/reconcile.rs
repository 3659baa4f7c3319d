//! Source reconciliation.
//!
//! Pure merge of the two scraped sources into catalog entries. Stock
//! results come first, in input order, each annotated with its detail
//! record (matched by normalized code) and a primary image chosen as the
//! detail's first image, falling back to the stock-side hint. Detail
//! records with no stock counterpart are appended afterwards with empty
//! variant lists, so every code seen by either source produces exactly
//! one entry.

use std::collections::{HashMap, HashSet};

use stockbook_core::{CatalogEntry, ProductDetail, ProductStockResult, normalize_code};

/// Merge stock results and detail records into catalog entries.
pub fn reconcile(stock: &[ProductStockResult], details: &[ProductDetail]) -> Vec<CatalogEntry> {
    let mut lookup: HashMap<String, &ProductDetail> = HashMap::new();
    for detail in details {
        if !detail.code.trim().is_empty() {
            lookup.insert(normalize_code(&detail.code), detail);
        }
    }

    let mut entries = Vec::new();
    let mut covered = HashSet::new();

    for item in stock {
        covered.insert(normalize_code(&item.code));
        let detail = lookup.get(&normalize_code(&item.code)).copied();

        let primary = detail
            .and_then(|d| d.images.first().cloned())
            .or_else(|| item.image_url.clone());

        let mut images = Vec::new();
        let mut seen = HashSet::new();
        push_unique(&mut images, &mut seen, primary.as_deref());
        for image in detail.map(|d| d.images.as_slice()).unwrap_or_default() {
            push_unique(&mut images, &mut seen, Some(image));
        }
        push_unique(&mut images, &mut seen, item.image_url.as_deref());

        entries.push(CatalogEntry {
            code: item.code.clone(),
            parent_cat: item.parent_cat.clone(),
            sub_cat: item.sub_cat.clone(),
            image_url: primary,
            images,
            detail: detail.cloned(),
            marketing_copy: None,
            variants: item.rows.clone(),
        });
    }

    for detail in details {
        if !covered.insert(normalize_code(&detail.code)) {
            continue;
        }

        let mut images = Vec::new();
        let mut seen = HashSet::new();
        for image in &detail.images {
            push_unique(&mut images, &mut seen, Some(image));
        }

        entries.push(CatalogEntry {
            code: detail.code.clone(),
            parent_cat: None,
            sub_cat: None,
            image_url: detail.images.first().cloned(),
            images,
            detail: Some(detail.clone()),
            marketing_copy: None,
            variants: Vec::new(),
        });
    }

    entries
}

fn push_unique(images: &mut Vec<String>, seen: &mut HashSet<String>, candidate: Option<&str>) {
    if let Some(candidate) = candidate.filter(|c| !c.is_empty())
        && seen.insert(candidate.to_string())
    {
        images.push(candidate.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockbook_core::{Product, StockRow};

    fn stock_result(code: &str, image_url: Option<&str>) -> ProductStockResult {
        let mut product = Product::new(code);
        product.image_url = image_url.map(str::to_string);
        ProductStockResult {
            rows: vec![StockRow {
                item_code: format!("{code}01"),
                description: "GREY waterproof Backpack".into(),
                quantity: 5,
                price: 19.9,
            }],
            ..ProductStockResult::empty(&product)
        }
    }

    fn detail(code: &str, images: &[&str]) -> ProductDetail {
        ProductDetail {
            images: images.iter().map(|s| (*s).to_string()).collect(),
            ..ProductDetail::empty(code)
        }
    }

    #[test]
    fn test_detail_attached_by_normalized_code() {
        let entries = reconcile(&[stock_result("BP96", None)], &[detail(" bp96 ", &[])]);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].detail.is_some());
    }

    #[test]
    fn test_primary_image_prefers_detail_over_hint() {
        let entries = reconcile(
            &[stock_result("BP96", Some("https://x/hint.jpg"))],
            &[detail("BP96", &["https://x/a.jpg", "https://x/b.jpg"])],
        );

        assert_eq!(entries[0].image_url.as_deref(), Some("https://x/a.jpg"));
        assert_eq!(entries[0].images, vec!["https://x/a.jpg", "https://x/b.jpg", "https://x/hint.jpg"]);
    }

    #[test]
    fn test_hint_used_when_detail_has_no_images() {
        let entries = reconcile(&[stock_result("BP96", Some("https://x/hint.jpg"))], &[detail("BP96", &[])]);
        assert_eq!(entries[0].image_url.as_deref(), Some("https://x/hint.jpg"));
        assert_eq!(entries[0].images, vec!["https://x/hint.jpg"]);
    }

    #[test]
    fn test_detail_only_codes_appended_with_empty_variants() {
        let entries = reconcile(
            &[stock_result("BP96", None)],
            &[detail("BP96", &[]), detail("ZZ99", &["https://x/z.jpg"])],
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].code, "ZZ99");
        assert!(entries[1].variants.is_empty());
        assert_eq!(entries[1].image_url.as_deref(), Some("https://x/z.jpg"));
    }

    #[test]
    fn test_entry_count_is_union_of_codes() {
        let stock = vec![stock_result("A", None), stock_result("B", None)];
        let details = vec![detail("b", &[]), detail("C", &[])];
        let entries = reconcile(&stock, &details);
        let codes: Vec<&str> = entries.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_deterministic() {
        let stock = vec![stock_result("A", Some("https://x/a.jpg"))];
        let details = vec![detail("A", &["https://x/1.jpg"]), detail("B", &[])];
        assert_eq!(reconcile(&stock, &details), reconcile(&stock, &details));
    }
}
