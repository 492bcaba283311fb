use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Pricing, Product};

use crate::core::ServerState;
use crate::orders::pricing::effective_unit_price;
use crate::utils::{AppResult, blocking};

/// Sellable unit of a product
#[derive(Debug, Serialize)]
pub struct PriceView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_label: Option<String>,
    pub unit_price: Decimal,
    pub stock: u32,
}

#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Effective prices after discounts
    pub prices: Vec<PriceView>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let labels: Vec<Option<String>> = match &product.pricing {
            Pricing::Simple { .. } => vec![None],
            Pricing::Variants { variants } => {
                variants.iter().map(|v| Some(v.label.clone())).collect()
            }
        };
        let prices = labels
            .into_iter()
            .filter_map(|label| {
                let unit_price = effective_unit_price(&product, label.as_deref())?;
                let stock = product.stock(label.as_deref())?;
                Some(PriceView {
                    variant_label: label,
                    unit_price,
                    stock,
                })
            })
            .collect();
        Self { product, prices }
    }
}

pub async fn get_product(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ProductView>> {
    let catalog = state.catalog.clone();
    let product = blocking(move || catalog.resolve(&id)).await?;
    Ok(Json(product.into()))
}
