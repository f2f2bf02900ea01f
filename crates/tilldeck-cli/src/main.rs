#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tilldeck_model::{FacetMetadata, FilterSpec, SortKey};
use tilldeck_query::{
    distinct_tags, distinct_values, query_sales, sample_recent, summary_stats, Facet,
};

#[derive(Parser)]
#[command(name = "tilldeck")]
#[command(about = "Tilldeck sales database operations CLI")]
struct Cli {
    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long, global = true, default_value_t = false)]
    compact: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the sales table and show a few recent rows.
    Inspect {
        #[arg(long)]
        db: PathBuf,
        #[arg(long, default_value_t = 5)]
        sample_rows: u64,
    },
    /// Run one filtered, paginated browse query.
    Query {
        #[arg(long)]
        db: PathBuf,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_delimiter = ',')]
        regions: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        gender: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        payment_methods: Vec<String>,
        #[arg(long)]
        age_min: Option<i64>,
        #[arg(long)]
        age_max: Option<i64>,
        #[arg(long)]
        date_start: Option<String>,
        #[arg(long)]
        date_end: Option<String>,
        #[arg(long, default_value = "date_desc")]
        sort: String,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
    /// Print distinct facet values for every filterable column.
    Facets {
        #[arg(long)]
        db: PathBuf,
    },
    /// Print whole-table summary statistics.
    Stats {
        #[arg(long)]
        db: PathBuf,
    },
}

fn open_read_only(path: &Path) -> Result<Connection, String> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| format!("cannot open {}: {e}", path.display()))
}

fn emit(value: &Value, compact: bool) -> Result<(), String> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Inspect { db, sample_rows } => {
            let conn = open_read_only(&db)?;
            let has_sales_table: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sales'",
                    [],
                    |r| r.get::<_, i64>(0),
                )
                .map(|n| n > 0)
                .map_err(|e| e.to_string())?;
            if !has_sales_table {
                return Err("database has no sales table".to_string());
            }
            let row_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM sales", [], |r| r.get(0))
                .map_err(|e| e.to_string())?;
            let sample = sample_recent(&conn, sample_rows).map_err(|e| e.to_string())?;
            emit(
                &json!({
                    "db": db.display().to_string(),
                    "row_count": row_count,
                    "sample": sample,
                }),
                cli.compact,
            )
        }
        Commands::Query {
            db,
            search,
            regions,
            gender,
            categories,
            tags,
            payment_methods,
            age_min,
            age_max,
            date_start,
            date_end,
            sort,
            page,
            limit,
        } => {
            let conn = open_read_only(&db)?;
            let filter = FilterSpec {
                search,
                regions,
                gender,
                categories,
                tags,
                payment_methods,
                age_min,
                age_max,
                date_start,
                date_end,
                sort: SortKey::parse(&sort),
                page,
                limit,
            };
            let result = query_sales(&conn, &filter).map_err(|e| e.to_string())?;
            emit(
                &serde_json::to_value(&result).map_err(|e| e.to_string())?,
                cli.compact,
            )
        }
        Commands::Facets { db } => {
            let conn = open_read_only(&db)?;
            let facets = FacetMetadata {
                regions: distinct_values(&conn, Facet::Region).map_err(|e| e.to_string())?,
                genders: distinct_values(&conn, Facet::Gender).map_err(|e| e.to_string())?,
                categories: distinct_values(&conn, Facet::Category).map_err(|e| e.to_string())?,
                payment_methods: distinct_values(&conn, Facet::PaymentMethod)
                    .map_err(|e| e.to_string())?,
                tags: distinct_tags(&conn).map_err(|e| e.to_string())?,
            };
            emit(
                &serde_json::to_value(&facets).map_err(|e| e.to_string())?,
                cli.compact,
            )
        }
        Commands::Stats { db } => {
            let conn = open_read_only(&db)?;
            let stats = summary_stats(&conn).map_err(|e| e.to_string())?;
            emit(
                &serde_json::to_value(&stats).map_err(|e| e.to_string())?,
                cli.compact,
            )
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_split_into_set_members() {
        let cli = Cli::try_parse_from([
            "tilldeck",
            "query",
            "--db",
            "sales.sqlite",
            "--regions",
            "North,South",
            "--gender",
            "Female",
            "--sort",
            "amount_desc",
        ])
        .expect("parse args");
        match cli.command {
            Commands::Query {
                regions,
                gender,
                sort,
                page,
                limit,
                ..
            } => {
                assert_eq!(regions, vec!["North", "South"]);
                assert_eq!(gender, vec!["Female"]);
                assert_eq!(SortKey::parse(&sort), SortKey::AmountDesc);
                assert_eq!(page, 1);
                assert_eq!(limit, 10);
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn query_runs_against_a_fixture_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("sales.sqlite");
        let conn = Connection::open(&db).expect("create db");
        conn.execute_batch(
            "CREATE TABLE sales (
               id INTEGER PRIMARY KEY,
               transaction_id TEXT, customer_id TEXT, customer_name TEXT, phone_number TEXT,
               gender TEXT, age INTEGER, customer_region TEXT, customer_type TEXT,
               product_id TEXT, product_name TEXT, brand TEXT, product_category TEXT, tags TEXT,
               quantity INTEGER, price_per_unit REAL, discount_percentage REAL,
               total_amount REAL, final_amount REAL,
               date TEXT, payment_method TEXT, order_status TEXT, delivery_type TEXT,
               store_id TEXT, store_location TEXT, salesperson_id TEXT, employee_name TEXT
             );
             INSERT INTO sales (id, customer_name, customer_region, date)
               VALUES (1, 'Alice', 'North', '2024-01-01');",
        )
        .expect("seed");
        drop(conn);

        let cli = Cli::try_parse_from([
            "tilldeck",
            "query",
            "--db",
            db.to_str().expect("utf8 path"),
            "--regions",
            "North",
        ])
        .expect("parse args");
        run(cli).expect("query fixture db");
    }
}
