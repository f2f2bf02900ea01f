// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// One imported sales transaction. Rows are written once by the bulk import
/// pipeline and never mutated afterwards; every column except the primary key
/// is nullable in the store.
///
/// `final_amount` is derived from `total_amount` and `discount_percentage` at
/// import time and is only ever read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    pub transaction_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub customer_region: Option<String>,
    pub customer_type: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub product_category: Option<String>,
    pub tags: Option<String>,
    pub quantity: Option<i64>,
    pub price_per_unit: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub total_amount: Option<f64>,
    pub final_amount: Option<f64>,
    pub date: Option<String>,
    pub payment_method: Option<String>,
    pub order_status: Option<String>,
    pub delivery_type: Option<String>,
    pub store_id: Option<String>,
    pub store_location: Option<String>,
    pub salesperson_id: Option<String>,
    pub employee_name: Option<String>,
}
