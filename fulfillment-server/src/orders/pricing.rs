//! Pricing & stock resolution
//!
//! Turns a requested basket into order lines with locked-in unit prices.
//! Runs against the catalog snapshot before the write transaction opens, so
//! the stock check here is advisory; the inventory ledger repeats it
//! atomically when the order commits.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::{Pricing, Product, display_name};
use shared::order::{CheckoutItem, OrderLine};

use super::error::{OrderError, OrderResult};
use crate::catalog::CatalogReader;

/// Upper bound for a single line quantity
pub const MAX_LINE_QUANTITY: u32 = 9999;

const MONEY_SCALE: u32 = 2;

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBasket {
    pub lines: Vec<OrderLine>,
    pub subtotal: Decimal,
}

/// Round to 2 places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Effective unit price of a product scope, or `None` if the scope does not exist
pub fn effective_unit_price(product: &Product, variant_label: Option<&str>) -> Option<Decimal> {
    let price = match (&product.pricing, variant_label) {
        (Pricing::Variants { .. }, Some(label)) => {
            let variant = product.variant(label)?;
            match variant.discount_price {
                Some(discount) if discount < variant.price => discount,
                _ => variant.price,
            }
        }
        (
            Pricing::Simple {
                price,
                discount_price,
                discount_percent,
                ..
            },
            None,
        ) => match (discount_price, discount_percent) {
            (Some(discount), _) if discount < price => *discount,
            (_, Some(percent)) if *percent > Decimal::ZERO && *percent <= Decimal::ONE_HUNDRED => {
                *price - *price * *percent / Decimal::ONE_HUNDRED
            }
            _ => *price,
        },
        _ => return None,
    };
    Some(round_money(price))
}

/// Resolve every requested item; any failing item fails the whole basket
///
/// Quantities of repeated `(product, variant)` pairs are checked cumulatively
/// against the snapshot stock.
pub fn resolve_items(catalog: &CatalogReader, items: &[CheckoutItem]) -> OrderResult<ResolvedBasket> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut products: HashMap<&str, Product> = HashMap::new();
    let mut requested: HashMap<(&str, Option<&str>), u32> = HashMap::new();
    let mut lines = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;

    for item in items {
        if item.quantity == 0 || item.quantity > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }

        let product = match products.entry(item.product_id.as_str()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(catalog.resolve(&item.product_id)?),
        };
        let variant = item.variant_label.as_deref();

        let (Some(unit_price), Some(available)) =
            (effective_unit_price(product, variant), product.stock(variant))
        else {
            return Err(OrderError::VariantNotFound {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                variant: item.variant_label.clone(),
            });
        };

        let wanted = requested
            .entry((item.product_id.as_str(), variant))
            .or_insert(0);
        *wanted += item.quantity;
        if *wanted > available {
            return Err(OrderError::InsufficientStock {
                product_id: product.id.clone(),
                name: display_name(&product.name, variant),
                variant: item.variant_label.clone(),
                requested: *wanted,
                available,
            });
        }

        let line = OrderLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            variant_label: item.variant_label.clone(),
            quantity: item.quantity,
            unit_price,
        };
        subtotal += line.line_total();
        lines.push(line);
    }

    Ok(ResolvedBasket {
        lines,
        subtotal: round_money(subtotal),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Storage;
    use rust_decimal_macros::dec;
    use shared::models::Variant;

    fn simple(id: &str, price: Decimal, discount: Option<Decimal>, percent: Option<Decimal>, stock: u32) -> Product {
        Product {
            id: id.into(),
            name: id.to_uppercase(),
            pricing: Pricing::Simple {
                price,
                discount_price: discount,
                discount_percent: percent,
                stock,
            },
        }
    }

    fn catalog() -> CatalogReader {
        let storage = Storage::open_in_memory().unwrap();
        storage.put_product(&simple("pod", dec!(500), None, None, 5)).unwrap();
        storage
            .put_product(&Product {
                id: "mint".into(),
                name: "Mint".into(),
                pricing: Pricing::Variants {
                    variants: vec![
                        Variant {
                            label: "3mg".into(),
                            price: dec!(450),
                            discount_price: Some(dec!(400)),
                            stock: 2,
                        },
                        Variant {
                            label: "6mg".into(),
                            price: dec!(500),
                            discount_price: Some(dec!(650)),
                            stock: 0,
                        },
                    ],
                },
            })
            .unwrap();
        CatalogReader::new(storage)
    }

    fn item(product_id: &str, variant: Option<&str>, quantity: u32) -> CheckoutItem {
        CheckoutItem {
            product_id: product_id.into(),
            variant_label: variant.map(str::to_string),
            quantity,
        }
    }

    #[test]
    fn test_simple_price_rules() {
        let p = simple("a", dec!(500), Some(dec!(450)), Some(dec!(50)), 1);
        assert_eq!(effective_unit_price(&p, None), Some(dec!(450)));

        // a discount price above base is ignored, percent applies instead
        let p = simple("a", dec!(500), Some(dec!(600)), Some(dec!(10)), 1);
        assert_eq!(effective_unit_price(&p, None), Some(dec!(450)));

        let p = simple("a", dec!(99.99), None, Some(dec!(15)), 1);
        assert_eq!(effective_unit_price(&p, None), Some(dec!(84.99)));

        let p = simple("a", dec!(500), None, None, 1);
        assert_eq!(effective_unit_price(&p, None), Some(dec!(500)));
        assert_eq!(effective_unit_price(&p, Some("6mg")), None);
    }

    #[test]
    fn test_resolve_simple_basket() {
        let basket = resolve_items(&catalog(), &[item("pod", None, 2)]).unwrap();
        assert_eq!(basket.subtotal, dec!(1000));
        assert_eq!(basket.lines.len(), 1);
        assert_eq!(basket.lines[0].unit_price, dec!(500));
        assert_eq!(basket.lines[0].product_name, "POD");
    }

    #[test]
    fn test_variant_uses_own_price_and_stock() {
        let catalog = catalog();
        let basket = resolve_items(&catalog, &[item("mint", Some("3mg"), 2)]).unwrap();
        assert_eq!(basket.lines[0].unit_price, dec!(400));
        assert_eq!(basket.subtotal, dec!(800));

        let err = resolve_items(&catalog, &[item("mint", Some("6mg"), 1)]).unwrap_err();
        match err {
            OrderError::InsufficientStock { name, available, .. } => {
                assert_eq!(name, "Mint (6mg)");
                assert_eq!(available, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scope_mismatch_is_variant_not_found() {
        let catalog = catalog();
        for bad in [item("mint", None, 1), item("mint", Some("12mg"), 1), item("pod", Some("xl"), 1)] {
            assert!(matches!(
                resolve_items(&catalog, &[bad]),
                Err(OrderError::VariantNotFound { .. })
            ));
        }
    }

    #[test]
    fn test_repeated_lines_are_checked_cumulatively() {
        let err = resolve_items(&catalog(), &[item("pod", None, 3), item("pod", None, 3)]).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        let catalog = catalog();
        assert!(matches!(resolve_items(&catalog, &[]), Err(OrderError::EmptyOrder)));
        assert!(matches!(
            resolve_items(&catalog, &[item("pod", None, 0)]),
            Err(OrderError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            resolve_items(&catalog, &[item("pod", None, MAX_LINE_QUANTITY + 1)]),
            Err(OrderError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            resolve_items(&catalog, &[item("pod", None, 1), item("ghost", None, 1)]),
            Err(OrderError::ProductNotFound(_))
        ));
    }
}
