//! Bulk-copy and bulk-unload statements in the Redshift dialect.
//!
//! A [`BulkCommand`] renders twice: with the real `CREDENTIALS` clause for
//! execution, and with the clause redacted for logging (its `Display`).

use std::fmt;

use crate::schema::{RecordSchema, RecordType};
use crate::storage::AwsCredentials;

/// Timestamp layout passed to `COPY ... TIMEFORMAT`.
pub const COPY_TIMEFORMAT: &str = "YYYY-MM-DDTHH:MI:SSZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Parquet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCommand {
    head: String,
    options: String,
}

impl BulkCommand {
    /// Full statement, ready to execute.
    pub fn render(&self, creds: &AwsCredentials) -> String {
        format!(
            "{} CREDENTIALS {} {};",
            self.head,
            quote_literal(&credentials_clause(creds)),
            self.options
        )
    }
}

impl fmt::Display for BulkCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} CREDENTIALS '<redacted>' {};", self.head, self.options)
    }
}

/// `COPY table (cols) FROM 'location'` for a single staged object.
pub fn copy_from(schema: &RecordSchema, location: &str, format: DataFormat) -> BulkCommand {
    match format {
        DataFormat::Csv => BulkCommand {
            head: format!(
                "COPY {} {} FROM {}",
                schema.table(),
                schema.column_list(),
                quote_literal(location)
            ),
            options: format!("IGNOREHEADER 1 TIMEFORMAT '{}' CSV", COPY_TIMEFORMAT),
        },
        DataFormat::Parquet => BulkCommand {
            head: format!("COPY {} FROM {}", schema.table(), quote_literal(location)),
            options: "FORMAT AS PARQUET".to_string(),
        },
    }
}

/// `UNLOAD ('SELECT * FROM table') TO 'prefix'` as Parquet part-files.
pub fn unload_table(table: RecordType, prefix: &str) -> BulkCommand {
    let query = format!("SELECT * FROM {}", table);
    BulkCommand {
        head: format!("UNLOAD ({}) TO {}", quote_literal(&query), quote_literal(prefix)),
        options: "FORMAT AS PARQUET".to_string(),
    }
}

fn credentials_clause(creds: &AwsCredentials) -> String {
    let mut clause = format!(
        "aws_access_key_id={};aws_secret_access_key={}",
        creds.access_key_id, creds.secret_access_key
    );
    if let Some(ref token) = creds.session_token {
        clause.push_str(";token=");
        clause.push_str(token);
    }
    clause
}

/// Single-quoted SQL string literal with embedded quotes doubled.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
