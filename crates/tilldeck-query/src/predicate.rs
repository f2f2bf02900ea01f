// SPDX-License-Identifier: Apache-2.0

use rusqlite::types::Value;
use tilldeck_model::FilterSpec;

/// One typed WHERE-clause fragment. Column names are static table entries;
/// every caller-supplied value leaves `compile` as a bound parameter, never
/// as query text.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `column IN (?, ...)` over the allowed value set.
    Membership {
        column: &'static str,
        values: Vec<String>,
    },
    /// Case-insensitive substring match against one or more columns, ORed.
    Substring {
        columns: &'static [&'static str],
        needle: String,
    },
    /// Disjunction of case-insensitive substring matches against the stored
    /// comma-joined tag string.
    TagAny { needles: Vec<String> },
    /// Inclusive lower bound.
    AtLeast {
        column: &'static str,
        value: Value,
    },
    /// Inclusive upper bound.
    AtMost {
        column: &'static str,
        value: Value,
    },
}

/// Conjunctive predicate over the `sales` table, assembled from a normalized
/// [`FilterSpec`] and compiled once into parameterized SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

const SEARCH_COLUMNS: &[&str] = &["customer_name", "phone_number"];

impl Predicate {
    /// Expects `filter` in normalized form: trimmed search, no empty set
    /// members. Empty sets and absent bounds contribute no clause.
    #[must_use]
    pub fn from_filter(filter: &FilterSpec) -> Self {
        let mut clauses = Vec::new();
        if !filter.search.is_empty() {
            clauses.push(Clause::Substring {
                columns: SEARCH_COLUMNS,
                needle: filter.search.clone(),
            });
        }
        for (column, values) in [
            ("customer_region", &filter.regions),
            ("gender", &filter.gender),
            ("product_category", &filter.categories),
            ("payment_method", &filter.payment_methods),
        ] {
            if !values.is_empty() {
                clauses.push(Clause::Membership {
                    column,
                    values: values.clone(),
                });
            }
        }
        if !filter.tags.is_empty() {
            clauses.push(Clause::TagAny {
                needles: filter.tags.clone(),
            });
        }
        if let Some(age_min) = filter.age_min {
            clauses.push(Clause::AtLeast {
                column: "age",
                value: Value::Integer(age_min),
            });
        }
        if let Some(age_max) = filter.age_max {
            clauses.push(Clause::AtMost {
                column: "age",
                value: Value::Integer(age_max),
            });
        }
        if let Some(date_start) = &filter.date_start {
            clauses.push(Clause::AtLeast {
                column: "date",
                value: Value::Text(date_start.clone()),
            });
        }
        if let Some(date_end) = &filter.date_end {
            clauses.push(Clause::AtMost {
                column: "date",
                value: Value::Text(date_end.clone()),
            });
        }
        Self { clauses }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Compiles to `(" WHERE ...", params)`, or `("", [])` for the empty
    /// predicate. Clauses are ANDed in filter-field order.
    #[must_use]
    pub fn compile(&self) -> (String, Vec<Value>) {
        if self.clauses.is_empty() {
            return (String::new(), Vec::new());
        }
        let mut parts: Vec<String> = Vec::with_capacity(self.clauses.len());
        let mut params: Vec<Value> = Vec::new();
        for clause in &self.clauses {
            match clause {
                Clause::Membership { column, values } => {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    parts.push(format!("{column} IN ({placeholders})"));
                    params.extend(values.iter().cloned().map(Value::Text));
                }
                Clause::Substring { columns, needle } => {
                    let pattern = contains_pattern(needle);
                    let alternatives: Vec<String> = columns
                        .iter()
                        .map(|column| format!("LOWER({column}) LIKE ? ESCAPE '!'"))
                        .collect();
                    parts.push(format!("({})", alternatives.join(" OR ")));
                    params.extend(columns.iter().map(|_| Value::Text(pattern.clone())));
                }
                Clause::TagAny { needles } => {
                    let alternatives: Vec<String> = needles
                        .iter()
                        .map(|_| "LOWER(tags) LIKE ? ESCAPE '!'".to_string())
                        .collect();
                    parts.push(format!("({})", alternatives.join(" OR ")));
                    params.extend(needles.iter().map(|n| Value::Text(contains_pattern(n))));
                }
                Clause::AtLeast { column, value } => {
                    parts.push(format!("{column} >= ?"));
                    params.push(value.clone());
                }
                Clause::AtMost { column, value } => {
                    parts.push(format!("{column} <= ?"));
                    params.push(value.clone());
                }
            }
        }
        (format!(" WHERE {}", parts.join(" AND ")), params)
    }
}

/// Escapes LIKE metacharacters so caller text matches as a literal
/// substring under `ESCAPE '!'`.
#[must_use]
pub fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(&needle.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_compiles_to_no_where_clause() {
        let predicate = Predicate::from_filter(&FilterSpec::default());
        assert!(predicate.is_empty());
        assert_eq!(predicate.compile(), (String::new(), Vec::new()));
    }

    #[test]
    fn clauses_are_anded_and_fully_parameterized() {
        let filter = FilterSpec {
            search: "alice".to_string(),
            regions: vec!["North".to_string(), "South".to_string()],
            gender: vec!["Female".to_string()],
            age_min: Some(30),
            age_max: Some(20),
            ..FilterSpec::default()
        };
        let (sql, params) = Predicate::from_filter(&filter).compile();
        assert_eq!(
            sql,
            " WHERE (LOWER(customer_name) LIKE ? ESCAPE '!' OR LOWER(phone_number) LIKE ? ESCAPE '!') \
             AND customer_region IN (?, ?) AND gender IN (?) AND age >= ? AND age <= ?"
        );
        assert_eq!(params.len(), 7);
        assert!(!sql.contains("alice"), "values must never reach query text");
        assert!(!sql.contains("North"));
    }

    #[test]
    fn tag_clause_is_a_disjunction() {
        let filter = FilterSpec {
            tags: vec!["premium".to_string(), "sale".to_string()],
            ..FilterSpec::default()
        };
        let (sql, params) = Predicate::from_filter(&filter).compile();
        assert_eq!(
            sql,
            " WHERE (LOWER(tags) LIKE ? ESCAPE '!' OR LOWER(tags) LIKE ? ESCAPE '!')"
        );
        assert_eq!(
            params,
            vec![
                Value::Text("%premium%".to_string()),
                Value::Text("%sale%".to_string())
            ]
        );
    }

    #[test]
    fn like_metacharacters_match_literally() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
        let filter = FilterSpec {
            search: "100%".to_string(),
            ..FilterSpec::default()
        };
        let (_, params) = Predicate::from_filter(&filter).compile();
        assert_eq!(params[0], Value::Text("%100!%%".to_string()));
    }
}
