//! Pure extraction over detail-site page snapshots.
//!
//! Listing pages, product pages, and the anti-automation interstitial are
//! all classified from `Page::content()` HTML, keeping every heuristic
//! testable without a browser. Page markup is heterogeneous, so spec
//! extraction is best-effort: a primary table region, then a whole-page
//! fallback scan, with row labels mapped through a static alias table.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use stockbook_core::normalize_code;

/// One result on a product-listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingResult {
    pub title: Option<String>,
    pub link: String,
    pub image: Option<String>,
}

/// Canonical specification fields the alias table maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecField {
    Material,
    Dimension,
    Weight,
    Finish,
    Function,
    PrintingMethods,
}

/// Label synonyms per canonical field. Labels are lowercased and stripped
/// of non-letters before lookup, so "Printing Methods:" and
/// "printing-method" both land on [`SpecField::PrintingMethods`].
const FIELD_ALIASES: &[(SpecField, &[&str])] = &[
    (SpecField::Material, &["material", "materials"]),
    (SpecField::Dimension, &["dimension", "dimensions", "size"]),
    (SpecField::Weight, &["weight"]),
    (SpecField::Finish, &["finished", "finish", "finishing"]),
    (SpecField::Function, &["function", "functions"]),
    (SpecField::PrintingMethods, &["printingmethods", "printingmethod", "printing"]),
];

/// Map a free-text row label to its canonical field, if known.
pub fn canonical_field(label: &str) -> Option<SpecField> {
    let normalized: String = label.to_lowercase().chars().filter(char::is_ascii_lowercase).collect();
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(field, _)| *field)
}

/// Extracted spec values; first-seen value per field wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecValues {
    pub material: Option<String>,
    pub dimension: Option<String>,
    pub weight: Option<String>,
    pub finish: Option<String>,
    pub function: Option<String>,
    /// Raw printing-methods cell, before splitting.
    pub printing: Option<String>,
}

impl SpecValues {
    pub fn is_empty(&self) -> bool {
        self.material.is_none()
            && self.dimension.is_none()
            && self.weight.is_none()
            && self.finish.is_none()
            && self.function.is_none()
            && self.printing.is_none()
    }

    fn set_if_absent(&mut self, field: SpecField, value: String) {
        let slot = match field {
            SpecField::Material => &mut self.material,
            SpecField::Dimension => &mut self.dimension,
            SpecField::Weight => &mut self.weight,
            SpecField::Finish => &mut self.finish,
            SpecField::Function => &mut self.function,
            SpecField::PrintingMethods => &mut self.printing,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// Parse a listing page into its product results, resolving links and
/// thumbnails against `base`.
pub fn parse_listing(html: &str, base: &Url) -> Vec<ListingResult> {
    let document = Html::parse_document(html);
    let product_sel = Selector::parse(".hikashop_products_listing .hikashop_product").expect("invalid selector");
    let name_link_sel = Selector::parse(".hikashop_product_name a").expect("invalid selector");
    let any_link_sel = Selector::parse("a[href]").expect("invalid selector");
    let img_sel = Selector::parse("img[src]").expect("invalid selector");
    let image_link_sel = Selector::parse("a[href*='/images/']").expect("invalid selector");

    let mut results = Vec::new();
    for node in document.select(&product_sel) {
        let name_anchor = node.select(&name_link_sel).next();
        let title = name_anchor.map(|a| element_text(&a)).filter(|t| !t.is_empty());

        let href = name_anchor
            .and_then(|a| a.value().attr("href"))
            .or_else(|| node.select(&any_link_sel).next().and_then(|a| a.value().attr("href")));
        let Some(link) = href.and_then(|h| resolve(base, h)) else { continue };

        let image = node
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .or_else(|| node.select(&image_link_sel).next().and_then(|a| a.value().attr("href")))
            .and_then(|u| resolve(base, u));

        results.push(ListingResult { title, link, image });
    }

    results
}

/// Pick the listing result for a code: prefer a title containing the
/// normalized code, otherwise fall back to the first result.
pub fn select_match<'a>(results: &'a [ListingResult], code: &str) -> Option<&'a ListingResult> {
    let normalized = normalize_code(code);
    results
        .iter()
        .find(|r| r.title.as_deref().is_some_and(|t| t.to_lowercase().contains(&normalized)))
        .or_else(|| results.first())
}

/// Extract spec rows from a product page.
///
/// Scans the dedicated description/custom-value table region first; if that
/// yields nothing, falls back to every row on the product page.
pub fn extract_specs(html: &str) -> SpecValues {
    let document = Html::parse_document(html);
    let mut specs = SpecValues::default();

    let primary_sel = Selector::parse(
        "#hikashop_product_description_main table, \
         div[id^='hikashop_product_description_'] table, \
         div[id^='hikashop_product_custom_value_'] table",
    )
    .expect("invalid selector");
    let row_sel = Selector::parse("tr").expect("invalid selector");

    for table in document.select(&primary_sel) {
        for row in table.select(&row_sel) {
            collect_spec_row(&row, &mut specs);
        }
    }

    if specs.is_empty() {
        let fallback_sel = Selector::parse(".hikashop_product_page tr").expect("invalid selector");
        for row in document.select(&fallback_sel) {
            collect_spec_row(&row, &mut specs);
        }
    }

    specs
}

fn collect_spec_row(row: &ElementRef<'_>, specs: &mut SpecValues) {
    let cell_sel = Selector::parse("td,th").expect("invalid selector");
    let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
    if cells.len() < 2 {
        return;
    }

    let Some(field) = canonical_field(&element_text(&cells[0])) else { return };
    let value = element_text(&cells[1]);
    if !value.is_empty() {
        specs.set_if_absent(field, value);
    }
}

/// Collect image URLs from the product image region: full-size anchors
/// first, `img` sources as a fallback. Absolute, ordered, deduplicated.
pub fn extract_images(html: &str, origin: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_sel = Selector::parse("[id^='hikashop_product_image'] a[href]").expect("invalid selector");
    let img_sel = Selector::parse("[id^='hikashop_product_image'] img[src]").expect("invalid selector");

    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for anchor in document.select(&anchor_sel) {
        push_image(&mut images, &mut seen, anchor.value().attr("href").and_then(|h| resolve(origin, h)));
    }

    if images.is_empty() {
        for img in document.select(&img_sel) {
            push_image(&mut images, &mut seen, img.value().attr("src").and_then(|s| resolve(origin, s)));
        }
    }

    images
}

fn push_image(images: &mut Vec<String>, seen: &mut HashSet<String>, url: Option<String>) {
    if let Some(url) = url
        && seen.insert(url.clone())
    {
        images.push(url);
    }
}

/// Product display name: the first variant-name element that is not the
/// "Please select" placeholder, falling back to the generic name markup.
/// Variant suffixes after a colon are dropped.
pub fn extract_display_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let variant_sel = Selector::parse("[id^='hikashop_product_name_']").expect("invalid selector");
    let fallback_sel = Selector::parse("[itemprop='name'], .hikashop_product_name_main, h1").expect("invalid selector");

    let variant_name = document
        .select(&variant_sel)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty() && !text.contains("Please select"));

    let raw = variant_name.or_else(|| {
        document
            .select(&fallback_sel)
            .next()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
    })?;

    let name = raw.split(':').next().unwrap_or("").trim();
    if name.is_empty() { None } else { Some(name.to_string()) }
}

/// Whether the anti-automation interstitial is still showing: known page
/// title or its wrapper element.
pub fn challenge_active(html: &str) -> bool {
    let document = Html::parse_document(html);
    let title_sel = Selector::parse("title").expect("invalid selector");
    let wrapper_sel = Selector::parse("#outer-container").expect("invalid selector");

    let title_blocked = document
        .select(&title_sel)
        .next()
        .map(|t| element_text(&t).to_lowercase().contains("one moment"))
        .unwrap_or(false);

    title_blocked || document.select(&wrapper_sel).next().is_some()
}

/// Split a printing-methods value on comma/slash, trim, and deduplicate,
/// preserving first-seen order.
pub fn split_printing_methods(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    value
        .split([',', '/'])
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .filter(|m| seen.insert(m.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(|u| u.to_string())
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://specs.example.com").unwrap()
    }

    const LISTING: &str = r#"
        <div class="hikashop_products_listing">
            <div class="hikashop_product">
                <span class="hikashop_product_name"><a href="/p/bp96-backpack">BP96 Backpack</a></span>
                <img src="/images/bp96_thumb.jpg">
            </div>
            <div class="hikashop_product">
                <span class="hikashop_product_name"><a href="/p/other">Other Product</a></span>
            </div>
        </div>
    "#;

    #[test]
    fn test_parse_listing_resolves_urls() {
        let results = parse_listing(LISTING, &base());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].link, "https://specs.example.com/p/bp96-backpack");
        assert_eq!(results[0].image.as_deref(), Some("https://specs.example.com/images/bp96_thumb.jpg"));
        assert_eq!(results[0].title.as_deref(), Some("BP96 Backpack"));
    }

    #[test]
    fn test_select_match_prefers_title_containing_code() {
        let results = parse_listing(LISTING, &base());
        let matched = select_match(&results, " bp96 ").unwrap();
        assert_eq!(matched.title.as_deref(), Some("BP96 Backpack"));
    }

    #[test]
    fn test_select_match_falls_back_to_first() {
        let results = parse_listing(LISTING, &base());
        let matched = select_match(&results, "ZZ99").unwrap();
        assert_eq!(matched.title.as_deref(), Some("BP96 Backpack"));
    }

    #[test]
    fn test_select_match_empty() {
        assert!(select_match(&[], "BP96").is_none());
    }

    #[test]
    fn test_canonical_field_aliases() {
        for label in ["Dimension", "dimensions", "Size:"] {
            assert_eq!(canonical_field(label), Some(SpecField::Dimension));
        }
        assert_eq!(canonical_field("Printing Methods"), Some(SpecField::PrintingMethods));
        assert_eq!(canonical_field("Finishing"), Some(SpecField::Finish));
        assert_eq!(canonical_field("Colour"), None);
    }

    #[test]
    fn test_extract_specs_primary_region() {
        let html = r#"
            <div id="hikashop_product_description_main"><table>
                <tr><td>Material</td><td>600D  Polyester</td></tr>
                <tr><td>Size</td><td>30 x 40 cm</td></tr>
                <tr><td>Material</td><td>duplicate ignored</td></tr>
                <tr><td>only one cell</td></tr>
            </table></div>
        "#;

        let specs = extract_specs(html);
        assert_eq!(specs.material.as_deref(), Some("600D Polyester"));
        assert_eq!(specs.dimension.as_deref(), Some("30 x 40 cm"));
        assert!(specs.weight.is_none());
    }

    #[test]
    fn test_extract_specs_fallback_scan() {
        let html = r#"
            <div class="hikashop_product_page">
                <table><tr><th>Weight</th><td>250 g</td></tr></table>
            </div>
        "#;

        let specs = extract_specs(html);
        assert_eq!(specs.weight.as_deref(), Some("250 g"));
    }

    #[test]
    fn test_extract_images_anchors_first() {
        let html = r#"
            <div id="hikashop_product_image_1">
                <a href="/images/a.jpg"><img src="/images/a_thumb.jpg"></a>
                <a href="/images/b.jpg"></a>
                <a href="/images/a.jpg"></a>
            </div>
        "#;

        let images = extract_images(html, &base());
        assert_eq!(
            images,
            vec!["https://specs.example.com/images/a.jpg", "https://specs.example.com/images/b.jpg"]
        );
    }

    #[test]
    fn test_extract_images_img_fallback() {
        let html = r#"<div id="hikashop_product_image_1"><img src="/images/only.jpg"></div>"#;
        let images = extract_images(html, &base());
        assert_eq!(images, vec!["https://specs.example.com/images/only.jpg"]);
    }

    #[test]
    fn test_display_name_skips_placeholder_and_trims_variant() {
        let html = r#"
            <span id="hikashop_product_name_1">Please select a variant</span>
            <span id="hikashop_product_name_2">BP96 Backpack : Grey</span>
        "#;
        assert_eq!(extract_display_name(html).as_deref(), Some("BP96 Backpack"));
    }

    #[test]
    fn test_display_name_fallback_h1() {
        let html = "<h1> Plain Name </h1>";
        assert_eq!(extract_display_name(html).as_deref(), Some("Plain Name"));
    }

    #[test]
    fn test_challenge_detection() {
        assert!(challenge_active("<title>One moment, please...</title>"));
        assert!(challenge_active(r#"<div id="outer-container"></div>"#));
        assert!(!challenge_active("<title>BP96 Backpack</title><p>ok</p>"));
    }

    #[test]
    fn test_split_printing_methods() {
        assert_eq!(
            split_printing_methods("Silkscreen, Heat Transfer / Embroidery, silkscreen"),
            vec!["Silkscreen", "Heat Transfer", "Embroidery"]
        );
        assert!(split_printing_methods(" , /").is_empty());
    }
}
