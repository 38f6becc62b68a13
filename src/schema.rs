//! The three fixed record shapes and their column-level validation rules.
//!
//! Column order in each [`RecordSchema`] is the positional order of the
//! headerless upload, the column order of the staged CSV, and the explicit
//! column list of the bulk-copy command.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IngestError;

/// Timestamp layout accepted for `hired_employees.datetime` (`YYYY-MM-DDTHH:MM:SSZ`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Departments,
    Jobs,
    HiredEmployees,
}

impl RecordType {
    pub const ALL: [RecordType; 3] = [
        RecordType::Departments,
        RecordType::Jobs,
        RecordType::HiredEmployees,
    ];

    /// Destination table name in the warehouse.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Departments => "departments",
            RecordType::Jobs => "jobs",
            RecordType::HiredEmployees => "hired_employees",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "departments" => Ok(RecordType::Departments),
            "jobs" => Ok(RecordType::Jobs),
            "hired_employees" => Ok(RecordType::HiredEmployees),
            other => Err(IngestError::UnknownTable(other.to_string())),
        }
    }
}

/// Field values read as missing, matched after trimming. Same token set a
/// pandas `read_csv` treats as NA by default.
pub const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null(value: &str) -> bool {
    NULL_TOKENS.contains(&value.trim())
}

/// A single column check. The first failing validator names the rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    NotNull,
    Timestamp(&'static str),
}

impl Validator {
    pub fn name(&self) -> &'static str {
        match self {
            Validator::NotNull => "this field cannot be null",
            Validator::Timestamp(_) => "this field does not match the timestamp format",
        }
    }

    pub fn check(&self, value: &str) -> bool {
        match self {
            Validator::NotNull => !is_null(value),
            Validator::Timestamp(format) => {
                chrono::NaiveDateTime::parse_from_str(value, format).is_ok()
            }
        }
    }
}

#[derive(Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    /// Warehouse column type, used when creating the table.
    pub sql_type: &'static str,
    pub validators: &'static [Validator],
}

#[derive(Debug)]
pub struct RecordSchema {
    pub record_type: RecordType,
    pub columns: &'static [ColumnDef],
}

impl RecordSchema {
    pub fn table(&self) -> &'static str {
        self.record_type.as_str()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Parenthesised column list, e.g. `(id, department)`.
    pub fn column_list(&self) -> String {
        format!("({})", self.column_names().join(", "))
    }

    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {} NOT NULL", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.table(), columns)
    }
}

const NOT_NULL: &[Validator] = &[Validator::NotNull];
const TIMESTAMP: &[Validator] = &[Validator::NotNull, Validator::Timestamp(TIMESTAMP_FORMAT)];

static DEPARTMENTS: RecordSchema = RecordSchema {
    record_type: RecordType::Departments,
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: "INTEGER",
            validators: NOT_NULL,
        },
        ColumnDef {
            name: "department",
            sql_type: "VARCHAR(256)",
            validators: NOT_NULL,
        },
    ],
};

static JOBS: RecordSchema = RecordSchema {
    record_type: RecordType::Jobs,
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: "INTEGER",
            validators: NOT_NULL,
        },
        ColumnDef {
            name: "job",
            sql_type: "VARCHAR(256)",
            validators: NOT_NULL,
        },
    ],
};

static HIRED_EMPLOYEES: RecordSchema = RecordSchema {
    record_type: RecordType::HiredEmployees,
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: "INTEGER",
            validators: NOT_NULL,
        },
        ColumnDef {
            name: "name",
            sql_type: "VARCHAR(256)",
            validators: NOT_NULL,
        },
        ColumnDef {
            name: "datetime",
            sql_type: "TIMESTAMP",
            validators: TIMESTAMP,
        },
        ColumnDef {
            name: "department_id",
            sql_type: "INTEGER",
            validators: NOT_NULL,
        },
        ColumnDef {
            name: "job_id",
            sql_type: "INTEGER",
            validators: NOT_NULL,
        },
    ],
};

pub fn schema_for(record_type: RecordType) -> &'static RecordSchema {
    match record_type {
        RecordType::Departments => &DEPARTMENTS,
        RecordType::Jobs => &JOBS,
        RecordType::HiredEmployees => &HIRED_EMPLOYEES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_column_order() {
        assert_eq!(
            schema_for(RecordType::HiredEmployees).column_names(),
            vec!["id", "name", "datetime", "department_id", "job_id"]
        );
        assert_eq!(
            schema_for(RecordType::Departments).column_list(),
            "(id, department)"
        );
        assert_eq!(schema_for(RecordType::Jobs).column_list(), "(id, job)");
    }

    #[test]
    fn test_schema_matches_record_type() {
        for rt in RecordType::ALL {
            assert_eq!(schema_for(rt).record_type, rt);
            assert_eq!(schema_for(rt).table(), rt.as_str());
        }
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!(
            "hired_employees".parse::<RecordType>().unwrap(),
            RecordType::HiredEmployees
        );
        assert!(matches!(
            "employees".parse::<RecordType>(),
            Err(IngestError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_timestamp_validator() {
        let v = Validator::Timestamp(TIMESTAMP_FORMAT);
        assert!(v.check("2021-05-01T09:00:00Z"));
        assert!(!v.check("not-a-date"));
        assert!(!v.check("2021-05-01 09:00:00"));
    }

    #[test]
    fn test_not_null_validator() {
        assert!(Validator::NotNull.check("x"));
        assert!(!Validator::NotNull.check(""));
        assert!(!Validator::NotNull.check("   "));
        for token in ["NULL", "null", "NA", "N/A", "NaN", "nan", "None", "<NA>", "#N/A", " NULL "] {
            assert!(!Validator::NotNull.check(token), "{token:?} should be null");
        }
        assert!(Validator::NotNull.check("Nancy"));
        assert!(Validator::NotNull.check("0"));
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            schema_for(RecordType::Jobs).create_table_sql(),
            "CREATE TABLE IF NOT EXISTS jobs (id INTEGER NOT NULL, job VARCHAR(256) NOT NULL)"
        );
    }
}
