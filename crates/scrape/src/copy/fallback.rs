//! Deterministic marketing copy.
//!
//! Used whenever the copy service is unconfigured, errors out, or returns
//! a partial draft. Every field is derived from the product's code and
//! whatever specification values exist, so the output is stable across
//! runs and never blank.

use stockbook_core::{MarketingCopy, ProductDetail};

/// Build complete copy for a product from its specifications alone.
pub fn fallback_copy(code: &str, detail: &ProductDetail) -> MarketingCopy {
    let name = detail.display_name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let seo_title = match name {
        Some(name) => format!("{name} | {code}"),
        None => format!("Premium {code} Product"),
    };

    let product_title = name.map_or_else(|| format!("Product {code}"), str::to_string);

    let short_description = match detail.function.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        Some(function) => format!("Experience the {code}, designed for {}.", function.to_lowercase()),
        None => format!("Discover the {code}, crafted for dependable daily use."),
    };

    let material = detail.material.as_deref().map(str::trim).filter(|m| !m.is_empty());

    let long_description = match material {
        Some(material) => format!(
            "Constructed with {material}, the {code} delivers reliable performance and everyday convenience."
        ),
        None => format!(
            "The {code} delivers reliable performance and everyday convenience, ideal for busy professionals and students alike."
        ),
    };

    let meta_description = match material {
        Some(material) => {
            format!("Shop the {code} made from {material} for durable, everyday versatility.")
        }
        None => format!("Shop the {code} for reliable performance and everyday versatility."),
    };

    MarketingCopy { seo_title, product_title, short_description, long_description, meta_description }
}

/// Replace blank fields of a service draft with their fallback values.
pub fn fill_blanks(mut copy: MarketingCopy, fallback: &MarketingCopy) -> MarketingCopy {
    fn fill(field: &mut String, fallback: &str) {
        if field.trim().is_empty() {
            *field = fallback.to_string();
        }
    }

    fill(&mut copy.seo_title, &fallback.seo_title);
    fill(&mut copy.product_title, &fallback.product_title);
    fill(&mut copy.short_description, &fallback.short_description);
    fill(&mut copy.long_description, &fallback.long_description);
    fill(&mut copy.meta_description, &fallback.meta_description);
    copy
}
