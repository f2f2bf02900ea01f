use crate::QueryError;
use rusqlite::Connection;
use tilldeck_model::SummaryStats;

/// Whole-table summary in a single query. COALESCE keeps the monetary
/// aggregates at 0 for an empty table; the date bounds stay NULL.
pub fn summary_stats(conn: &Connection) -> Result<SummaryStats, QueryError> {
    let sql = "SELECT \
         COUNT(*), \
         COALESCE(SUM(final_amount), 0), \
         COALESCE(AVG(final_amount), 0), \
         COUNT(DISTINCT customer_id), \
         MIN(date), \
         MAX(date) \
         FROM sales";
    let stats = conn.query_row(sql, [], |row| {
        Ok(SummaryStats {
            total_transactions: row.get::<_, i64>(0)? as u64,
            total_revenue: row.get(1)?,
            avg_transaction: row.get(2)?,
            unique_customers: row.get::<_, i64>(3)? as u64,
            earliest_date: row.get(4)?,
            latest_date: row.get(5)?,
        })
    })?;
    Ok(stats)
}
