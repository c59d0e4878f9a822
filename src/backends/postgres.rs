//! PostgreSQL database backend implementation
//!
//! This module provides a PostgreSQL implementation of the [`Backend`] trait
//! using tokio-postgres. The backend owns a current-thread tokio runtime and
//! blocks on it for every call, so callers never see a future.

use crate::core::backend::{opens_transaction, Backend, Cursor};
use crate::core::connection::ConnectOptions;
use crate::core::database_types::DatabaseType;
use crate::core::error::{DatabaseError, Result};
use crate::core::value::{DatabaseRow, DatabaseValue};
use std::error::Error;
use tokio::runtime::{Builder, Runtime};
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, Config, NoTls, Row};

type Param = Box<dyn ToSql + Sync + Send>;

/// PostgreSQL backend over a connection URI
pub struct PostgresBackend {
    uri: String,
    runtime: Option<Runtime>,
    client: Option<Client>,
    in_transaction: bool,
}

impl PostgresBackend {
    /// Create a backend for `uri`; nothing is opened until [`Backend::connect`]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            runtime: None,
            client: None,
            in_transaction: false,
        }
    }

    /// Convert a tokio_postgres Row to a DatabaseRow
    fn row_to_database_row(row: &Row) -> Result<DatabaseRow> {
        let mut db_row = DatabaseRow::with_capacity(row.len());

        for (idx, column) in row.columns().iter().enumerate() {
            let value = match column.type_().name() {
                "bool" => row
                    .try_get::<_, Option<bool>>(idx)?
                    .map(|v| DatabaseValue::Integer(i64::from(v))),
                "int2" => row
                    .try_get::<_, Option<i16>>(idx)?
                    .map(|v| DatabaseValue::Integer(i64::from(v))),
                "int4" => row
                    .try_get::<_, Option<i32>>(idx)?
                    .map(|v| DatabaseValue::Integer(i64::from(v))),
                "int8" => row
                    .try_get::<_, Option<i64>>(idx)?
                    .map(DatabaseValue::Integer),
                "float4" => row
                    .try_get::<_, Option<f32>>(idx)?
                    .map(|v| DatabaseValue::Real(f64::from(v))),
                "float8" => row
                    .try_get::<_, Option<f64>>(idx)?
                    .map(DatabaseValue::Real),
                "numeric" => row
                    .try_get::<_, Option<PgNumeric>>(idx)?
                    .map(|v| v.0),
                // text, varchar, bpchar and anything else with a text form
                _ => row
                    .try_get::<_, Option<String>>(idx)?
                    .map(DatabaseValue::Text),
            };
            db_row.push(value.unwrap_or(DatabaseValue::Null));
        }

        Ok(db_row)
    }

    /// Convert DatabaseValue to a postgres parameter of the type the server inferred
    fn value_to_param(value: &DatabaseValue, ty: &Type) -> Result<Param> {
        let out_of_range = |v: &dyn std::fmt::Display| {
            DatabaseError::other(format!("Value {} is out of range for {}", v, ty))
        };

        let param: Param = match value {
            DatabaseValue::Null => {
                if *ty == Type::INT2 {
                    Box::new(None::<i16>)
                } else if *ty == Type::INT4 {
                    Box::new(None::<i32>)
                } else if *ty == Type::INT8 {
                    Box::new(None::<i64>)
                } else if *ty == Type::FLOAT4 {
                    Box::new(None::<f32>)
                } else if *ty == Type::FLOAT8 {
                    Box::new(None::<f64>)
                } else if *ty == Type::BOOL {
                    Box::new(None::<bool>)
                } else {
                    Box::new(None::<String>)
                }
            }
            DatabaseValue::Integer(v) => {
                if *ty == Type::INT2 {
                    Box::new(i16::try_from(*v).map_err(|_| out_of_range(v))?)
                } else if *ty == Type::INT4 {
                    Box::new(i32::try_from(*v).map_err(|_| out_of_range(v))?)
                } else if *ty == Type::FLOAT4 {
                    Box::new(*v as f32)
                } else if *ty == Type::FLOAT8 {
                    Box::new(*v as f64)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    Box::new(v.to_string())
                } else {
                    Box::new(*v)
                }
            }
            DatabaseValue::Real(v) => {
                if *ty == Type::FLOAT4 {
                    Box::new(*v as f32)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    Box::new(v.to_string())
                } else {
                    Box::new(*v)
                }
            }
            DatabaseValue::Text(v) => Box::new(v.clone()),
        };
        Ok(param)
    }

    fn finish_transaction(&mut self, command: &str) -> Result<()> {
        let (runtime, client) = match (&self.runtime, &self.client) {
            (Some(runtime), Some(client)) => (runtime, client),
            _ => return Err(DatabaseError::not_connected()),
        };
        if self.in_transaction {
            runtime.block_on(client.batch_execute(command))?;
            self.in_transaction = false;
        }
        Ok(())
    }
}

impl Backend for PostgresBackend {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn connect(&mut self, options: &ConnectOptions) -> Result<()> {
        // Clean up any existing connection first
        self.client = None;
        self.runtime = None;
        self.in_transaction = false;

        let mut config: Config = self
            .uri
            .parse()
            .map_err(|e: tokio_postgres::Error| DatabaseError::connection(e.to_string()))?;
        config.connect_timeout(options.timeout);

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let (client, connection) = runtime
            .block_on(config.connect(NoTls))
            .map_err(|e| DatabaseError::connection(e.to_string()))?;

        // The connection task makes progress whenever the runtime is blocked on
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        tracing::debug!("Connected to PostgreSQL");
        self.runtime = Some(runtime);
        self.client = Some(client);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> Result<Cursor> {
        let (runtime, client) = match (&self.runtime, &self.client) {
            (Some(runtime), Some(client)) => (runtime, client),
            _ => return Err(DatabaseError::not_connected()),
        };

        let statement = runtime.block_on(client.prepare(sql))?;

        if opens_transaction(sql) && !self.in_transaction {
            runtime.block_on(client.batch_execute("BEGIN"))?;
            self.in_transaction = true;
        }

        let postgres_params: Vec<Param> = params
            .iter()
            .zip(statement.params())
            .map(|(value, ty)| Self::value_to_param(value, ty))
            .collect::<Result<_>>()?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = postgres_params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        if statement.columns().is_empty() {
            let affected = runtime.block_on(client.execute(&statement, &param_refs))?;
            return Ok(Cursor::affected(affected));
        }

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let rows = runtime.block_on(client.query(&statement, &param_refs))?;
        let rows = rows
            .iter()
            .map(Self::row_to_database_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Cursor::from_rows(columns, rows))
    }

    fn commit(&mut self) -> Result<()> {
        self.finish_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.finish_transaction("ROLLBACK")
    }

    fn close(&mut self) -> Result<()> {
        self.in_transaction = false;
        // Dropping the client ends the session; the runtime goes with it
        self.client = None;
        self.runtime = None;
        Ok(())
    }
}

/// Decoded PostgreSQL NUMERIC
///
/// `SUM` and `AVG` over BIGINT columns come back as NUMERIC. Whole values that
/// fit an `i64` decode to an integer, everything else to a real.
#[derive(Debug, PartialEq)]
struct PgNumeric(DatabaseValue);

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        let word = |i: usize| -> std::result::Result<u16, Box<dyn Error + Sync + Send>> {
            raw.get(i * 2..i * 2 + 2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .ok_or_else(|| "truncated numeric value".into())
        };

        let ndigits = word(0)? as i16;
        let weight = word(1)? as i16;
        let sign = word(2)?;
        let dscale = word(3)?;

        match sign {
            NUMERIC_NAN => return Ok(PgNumeric(DatabaseValue::Real(f64::NAN))),
            NUMERIC_PINF => return Ok(PgNumeric(DatabaseValue::Real(f64::INFINITY))),
            NUMERIC_NINF => return Ok(PgNumeric(DatabaseValue::Real(f64::NEG_INFINITY))),
            _ => {}
        }

        let digits = (0..ndigits.max(0) as usize)
            .map(|i| word(4 + i))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let negative = sign == NUMERIC_NEG;

        if dscale == 0 {
            // digit i is worth 10000^(weight - i)
            let mut whole: Option<i128> = Some(0);
            for i in 0..=i32::from(weight) {
                let digit = digits.get(i as usize).copied().unwrap_or(0);
                whole = whole
                    .and_then(|w| w.checked_mul(10_000))
                    .and_then(|w| w.checked_add(i128::from(digit)));
            }
            if let Some(value) = whole
                .map(|w| if negative { -w } else { w })
                .and_then(|w| i64::try_from(w).ok())
            {
                return Ok(PgNumeric(DatabaseValue::Integer(value)));
            }
        }

        let magnitude: f64 = digits
            .iter()
            .enumerate()
            .map(|(i, digit)| {
                let exponent = i32::from(weight) - i as i32;
                if exponent >= 0 {
                    f64::from(*digit) * 10_000f64.powi(exponent)
                } else {
                    f64::from(*digit) / 10_000f64.powi(-exponent)
                }
            })
            .sum();
        Ok(PgNumeric(DatabaseValue::Real(if negative {
            -magnitude
        } else {
            magnitude
        })))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}
