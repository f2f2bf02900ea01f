#![forbid(unsafe_code)]
//! Sales query engine: compiles filter specifications into parameterized
//! SQL, executes the count/page query pair, and resolves facet metadata and
//! whole-table summary statistics over a read-only `sales` table.

use rusqlite::{params_from_iter, types::Value, Connection, Row};
use tilldeck_model::{page_count, FilterSpec, SaleRecord, SalesPage};

mod facets;
mod predicate;
mod summary;

pub use facets::{distinct_tags, distinct_values, normalize_tag_values, Facet};
pub use predicate::{escape_like, Clause, Predicate};
pub use summary::summary_stats;

pub const CRATE_NAME: &str = "tilldeck-query";

#[derive(Debug)]
pub struct QueryError(pub String);

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for QueryError {}

impl From<rusqlite::Error> for QueryError {
    fn from(e: rusqlite::Error) -> Self {
        Self(e.to_string())
    }
}

/// Projection order is a contract with `decode_sale_row`; both follow the
/// `sales` schema column order.
pub const SALE_COLUMNS: [&str; 27] = [
    "id",
    "transaction_id",
    "customer_id",
    "customer_name",
    "phone_number",
    "gender",
    "age",
    "customer_region",
    "customer_type",
    "product_id",
    "product_name",
    "brand",
    "product_category",
    "tags",
    "quantity",
    "price_per_unit",
    "discount_percentage",
    "total_amount",
    "final_amount",
    "date",
    "payment_method",
    "order_status",
    "delivery_type",
    "store_id",
    "store_location",
    "salesperson_id",
    "employee_name",
];

fn sale_projection() -> String {
    SALE_COLUMNS.join(", ")
}

/// Executes one browse request: normalizes the filter, compiles the
/// predicate, issues the count query, then the page query with the resolved
/// order and `LIMIT ? OFFSET ?`.
///
/// Ties on the sort key are broken by `id ASC` so that repeated identical
/// requests paginate identically. An offset past the end of the result set
/// returns an empty page with the totals intact.
pub fn query_sales(conn: &Connection, filter: &FilterSpec) -> Result<SalesPage, QueryError> {
    let filter = filter.normalized();
    let (where_sql, params) = Predicate::from_filter(&filter).compile();

    let count_sql = format!("SELECT COUNT(*) FROM sales{where_sql}");
    let total_items: i64 =
        conn.query_row(&count_sql, params_from_iter(params.iter()), |r| r.get(0))?;
    let total_items = u64::try_from(total_items).unwrap_or(0);

    let (order_column, order_direction) = filter.sort.order();
    let data_sql = format!(
        "SELECT {} FROM sales{} ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
        sale_projection(),
        where_sql,
        order_column,
        order_direction,
    );
    let mut data_params = params;
    data_params.push(Value::Integer(filter.limit as i64));
    data_params.push(Value::Integer(filter.offset() as i64));

    let mut stmt = conn.prepare(&data_sql)?;
    let data = stmt
        .query_map(params_from_iter(data_params.iter()), decode_sale_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SalesPage {
        data,
        total_items,
        total_pages: page_count(total_items, filter.limit),
        current_page: filter.page,
    })
}

/// The `limit` most recent transactions by date, newest first.
pub fn sample_recent(conn: &Connection, limit: u64) -> Result<Vec<SaleRecord>, QueryError> {
    let sql = format!(
        "SELECT {} FROM sales ORDER BY date DESC, id ASC LIMIT ?",
        sale_projection()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([limit as i64], decode_sale_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn decode_sale_row(row: &Row<'_>) -> rusqlite::Result<SaleRecord> {
    Ok(SaleRecord {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        customer_id: row.get(2)?,
        customer_name: row.get(3)?,
        phone_number: row.get(4)?,
        gender: row.get(5)?,
        age: row.get(6)?,
        customer_region: row.get(7)?,
        customer_type: row.get(8)?,
        product_id: row.get(9)?,
        product_name: row.get(10)?,
        brand: row.get(11)?,
        product_category: row.get(12)?,
        tags: row.get(13)?,
        quantity: row.get(14)?,
        price_per_unit: row.get(15)?,
        discount_percentage: row.get(16)?,
        total_amount: row.get(17)?,
        final_amount: row.get(18)?,
        date: row.get(19)?,
        payment_method: row.get(20)?,
        order_status: row.get(21)?,
        delivery_type: row.get(22)?,
        store_id: row.get(23)?,
        store_location: row.get(24)?,
        salesperson_id: row.get(25)?,
        employee_name: row.get(26)?,
    })
}
