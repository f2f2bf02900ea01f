use crate::QueryError;
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Filterable columns with a simple distinct-value facet. Tags are handled
/// separately because the stored value is a comma-joined list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Region,
    Gender,
    Category,
    PaymentMethod,
}

impl Facet {
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Region => "customer_region",
            Self::Gender => "gender",
            Self::Category => "product_category",
            Self::PaymentMethod => "payment_method",
        }
    }
}

/// Sorted distinct non-empty values for one facet column. Each facet query
/// is independent and read-only; callers may run them concurrently and must
/// decide for themselves what to substitute on failure.
pub fn distinct_values(conn: &Connection, facet: Facet) -> Result<Vec<String>, QueryError> {
    let column = facet.column();
    let sql = format!(
        "SELECT DISTINCT {column} FROM sales \
         WHERE {column} IS NOT NULL AND {column} != '' ORDER BY {column}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

/// Distinct normalized tag values. Two tiers: the primary path distincts the
/// raw comma-joined strings in SQL before exploding them here; if that query
/// fails, fall back to fetching every raw tag string and normalizing the lot.
pub fn distinct_tags(conn: &Connection) -> Result<Vec<String>, QueryError> {
    let raw = fetch_tag_strings(
        conn,
        "SELECT DISTINCT tags FROM sales \
         WHERE tags IS NOT NULL AND tags != '' AND TRIM(tags) != ''",
    )
    .or_else(|_| {
        fetch_tag_strings(
            conn,
            "SELECT tags FROM sales WHERE tags IS NOT NULL AND tags != ''",
        )
    })?;
    Ok(normalize_tag_values(raw))
}

fn fetch_tag_strings(conn: &Connection, sql: &str) -> Result<Vec<String>, QueryError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Explodes comma-joined tag strings into clean individual values: split on
/// comma, strip stray brace/quote characters left by upstream formatting,
/// trim, drop empties, dedupe, sort.
#[must_use]
pub fn normalize_tag_values<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut values = BTreeSet::new();
    for joined in raw {
        for piece in joined.split(',') {
            let cleaned: String = piece
                .chars()
                .filter(|c| !matches!(c, '{' | '}' | '"'))
                .collect();
            let trimmed = cleaned.trim();
            if !trimmed.is_empty() {
                values.insert(trimmed.to_string());
            }
        }
    }
    values.into_iter().collect()
}
