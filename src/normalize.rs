//! Pure transforms from raw vendor records to local entity shapes. No I/O, no
//! failure modes: malformed optional fields degrade to null, records without a
//! usable id are dropped.

use crate::catalog::{Category, ImageRow, PriceQuote, Product};
use crate::vendor::xml::RawRecord;
use bigdecimal::BigDecimal;
use std::str::FromStr;

fn parse_i64(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Category row: id/parentId coerced to integers. An absent, empty or
/// non-numeric parentId maps to root (no parent).
pub fn category_from_raw(rec: &RawRecord) -> Option<Category> {
    let id = parse_i64(rec.attr("id")?)?;
    let name = rec.attr("name").unwrap_or_default().trim().to_string();
    let parent_id = rec.attr("parentId").and_then(parse_i64);
    Some(Category {
        id,
        name,
        parent_id,
    })
}

/// Product row for a known category.
///
/// The soft-delete flag is true iff a property literally named `Deleted`
/// carries the exact string `"true"`. Any other value — `"false"`, `""`,
/// `"True"`, absence — is false. This is the authoritative delete signal;
/// deletion is never inferred from a product missing from a later listing.
pub fn product_from_raw(rec: &RawRecord, category_id: i64) -> Option<Product> {
    let id = parse_i64(rec.attr("id")?)?;
    let is_deleted = rec.prop("Deleted") == Some("true");
    let name = non_empty(rec.attr("name")).or_else(|| non_empty(rec.prop("Name")));
    let vendor = non_empty(rec.prop("Vendor"));
    Some(Product {
        id,
        category_id,
        is_deleted,
        name,
        vendor,
    })
}

/// Price and quantity from a generic property list, by exact property name.
/// Absence (or an unparseable value) leaves the field null rather than erroring.
pub fn price_from_raw(rec: &RawRecord) -> PriceQuote {
    let price = rec
        .prop("Price")
        .and_then(|v| BigDecimal::from_str(v.trim()).ok());
    let quantity = rec
        .prop("Quantity")
        .and_then(|v| v.trim().parse::<i32>().ok());
    PriceQuote { price, quantity }
}

/// Image URLs from a goods record: every property named `Url` yields one
/// image row for that product.
pub fn images_from_raw(rec: &RawRecord) -> Vec<ImageRow> {
    let Some(goods_id) = rec.attr("id").and_then(parse_i64) else {
        return Vec::new();
    };
    rec.props("Url")
        .into_iter()
        .filter(|u| !u.trim().is_empty())
        .map(|u| ImageRow {
            goods_id,
            url: u.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parent_id_maps_to_root() {
        let rec = RawRecord::new(vec![("id", "7"), ("name", "Servers"), ("parentId", "")], vec![]);
        let cat = category_from_raw(&rec).unwrap();
        assert_eq!(cat.parent_id, None);

        let rec = RawRecord::new(vec![("id", "8"), ("name", "Racks"), ("parentId", "7")], vec![]);
        assert_eq!(category_from_raw(&rec).unwrap().parent_id, Some(7));
    }

    #[test]
    fn category_without_numeric_id_is_dropped() {
        let rec = RawRecord::new(vec![("id", "n/a"), ("name", "X")], vec![]);
        assert!(category_from_raw(&rec).is_none());
        let rec = RawRecord::new(vec![("name", "X")], vec![]);
        assert!(category_from_raw(&rec).is_none());
    }

    #[test]
    fn deleted_requires_exact_string_true() {
        for (raw, expect) in [
            (Some("true"), true),
            (Some("false"), false),
            (Some("True"), false),
            (Some(""), false),
            (Some("1"), false),
            (None, false),
        ] {
            let props = raw.map(|v| vec![("Deleted", v)]).unwrap_or_default();
            let rec = RawRecord::new(vec![("id", "101")], props);
            let p = product_from_raw(&rec, 1).unwrap();
            assert_eq!(p.is_deleted, expect, "raw value {:?}", raw);
        }
    }

    #[test]
    fn product_optional_fields_degrade_to_none() {
        let rec = RawRecord::new(vec![("id", "101")], vec![("Vendor", "  ")]);
        let p = product_from_raw(&rec, 1).unwrap();
        assert_eq!(p.name, None);
        assert_eq!(p.vendor, None);
    }

    #[test]
    fn price_and_quantity_are_independent() {
        let rec = RawRecord::new(vec![], vec![("Price", "12345.00")]);
        let q = price_from_raw(&rec);
        assert_eq!(q.price, Some(BigDecimal::from_str("12345.00").unwrap()));
        assert_eq!(q.quantity, None);

        let rec = RawRecord::new(vec![], vec![("Quantity", "7"), ("Price", "not-a-number")]);
        let q = price_from_raw(&rec);
        assert_eq!(q.price, None);
        assert_eq!(q.quantity, Some(7));
    }

    #[test]
    fn multiple_url_properties_yield_multiple_images() {
        let rec = RawRecord::new(
            vec![("id", "101")],
            vec![("Url", "http://img/a.png"), ("Url", "http://img/b.png")],
        );
        let imgs = images_from_raw(&rec);
        assert_eq!(imgs.len(), 2);
        assert!(imgs.iter().all(|i| i.goods_id == 101));
    }
}
