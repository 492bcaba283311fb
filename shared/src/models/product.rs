//! Product Model
//!
//! Catalog entries as seen by checkout. Pricing and stock live either on the
//! product itself (`Simple`) or on each of its variants (`Variants`), never both.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub pricing: Pricing,
}

/// Price and stock source of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pricing {
    /// Single SKU, priced and stocked on the product
    Simple {
        price: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discount_price: Option<Decimal>,
        /// Percentage off the base price (e.g., 10 = 10%)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discount_percent: Option<Decimal>,
        stock: u32,
    },
    /// Independently priced and stocked sub-SKUs
    Variants { variants: Vec<Variant> },
}

/// Product variant (e.g. "6mg", "Large")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub label: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<Decimal>,
    pub stock: u32,
}

impl Product {
    /// Look up a variant by label (exact match)
    pub fn variant(&self, label: &str) -> Option<&Variant> {
        match &self.pricing {
            Pricing::Variants { variants } => variants.iter().find(|v| v.label == label),
            Pricing::Simple { .. } => None,
        }
    }

    /// Mutable stock counter for the given scope
    ///
    /// `None` when the scope does not exist on this product: a label on a simple
    /// product, a missing label, or no label on a variant product.
    pub fn stock_mut(&mut self, variant_label: Option<&str>) -> Option<&mut u32> {
        match (&mut self.pricing, variant_label) {
            (Pricing::Simple { stock, .. }, None) => Some(stock),
            (Pricing::Variants { variants }, Some(label)) => variants
                .iter_mut()
                .find(|v| v.label == label)
                .map(|v| &mut v.stock),
            _ => None,
        }
    }

    /// Current stock for the given scope (see [`Product::stock_mut`])
    pub fn stock(&self, variant_label: Option<&str>) -> Option<u32> {
        match (&self.pricing, variant_label) {
            (Pricing::Simple { stock, .. }, None) => Some(*stock),
            (Pricing::Variants { variants }, Some(label)) => {
                variants.iter().find(|v| v.label == label).map(|v| v.stock)
            }
            _ => None,
        }
    }
}

/// Display name of a product or product+variant line ("Mint (6mg)")
pub fn display_name(product_name: &str, variant_label: Option<&str>) -> String {
    match variant_label {
        Some(label) => format!("{} ({})", product_name, label),
        None => product_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn variant_product() -> Product {
        Product {
            id: "p-1".into(),
            name: "Mint".into(),
            pricing: Pricing::Variants {
                variants: vec![
                    Variant {
                        label: "3mg".into(),
                        price: dec!(450),
                        discount_price: None,
                        stock: 4,
                    },
                    Variant {
                        label: "6mg".into(),
                        price: dec!(500),
                        discount_price: Some(dec!(480)),
                        stock: 0,
                    },
                ],
            },
        }
    }

    #[test]
    fn test_stock_scopes() {
        let mut p = variant_product();
        assert_eq!(p.stock(Some("3mg")), Some(4));
        assert_eq!(p.stock(Some("6mg")), Some(0));
        assert_eq!(p.stock(Some("12mg")), None);
        assert_eq!(p.stock(None), None);

        *p.stock_mut(Some("3mg")).unwrap() -= 1;
        assert_eq!(p.variant("3mg").unwrap().stock, 3);
    }

    #[test]
    fn test_simple_product_rejects_label() {
        let p = Product {
            id: "p-2".into(),
            name: "Charger".into(),
            pricing: Pricing::Simple {
                price: dec!(500),
                discount_price: None,
                discount_percent: None,
                stock: 5,
            },
        };
        assert_eq!(p.stock(None), Some(5));
        assert_eq!(p.stock(Some("any")), None);
        assert!(matches!(p.pricing, Pricing::Simple { .. }));
    }

    #[test]
    fn test_pricing_serde_tagged() {
        let json = r#"{"id":"p-3","name":"Cable","pricing":{"kind":"SIMPLE","price":"199.00","stock":2}}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        match p.pricing {
            Pricing::Simple { price, stock, discount_price, .. } => {
                assert_eq!(price, dec!(199));
                assert_eq!(stock, 2);
                assert!(discount_price.is_none());
            }
            _ => panic!("expected simple pricing"),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Mint", Some("6mg")), "Mint (6mg)");
        assert_eq!(display_name("Charger", None), "Charger");
    }
}
