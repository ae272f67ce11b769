//! Conversion of PostgreSQL wire values into `Value`

use sqlmon_core::Value;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio_postgres::Row as PgRow;
use tokio_postgres::types::{FromSql, Type};

type FromSqlResult<T> = std::result::Result<T, Box<dyn std::error::Error + Sync + Send>>;

/// NUMERIC decoded to its exact decimal text
#[derive(Debug)]
pub(crate) struct PgNumericString(pub(crate) String);

/// OID, XID and CID: unsigned 32-bit counters
#[derive(Debug)]
pub(crate) struct PgUnsigned(pub(crate) u32);

/// INTERVAL kept in its three wire components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PgInterval {
    pub(crate) microseconds: i64,
    pub(crate) days: i32,
    pub(crate) months: i32,
}

/// INET or CIDR rendered as the server prints it
#[derive(Debug)]
pub(crate) struct PgInet(pub(crate) String);

impl PgNumericString {
    pub(crate) fn parse(raw: &[u8]) -> FromSqlResult<String> {
        if raw.len() < 8 {
            return Err("invalid NUMERIC payload: too short".into());
        }

        let ndigits = i16::from_be_bytes([raw[0], raw[1]]) as usize;
        let weight = i16::from_be_bytes([raw[2], raw[3]]);
        let sign = u16::from_be_bytes([raw[4], raw[5]]);
        let dscale = i16::from_be_bytes([raw[6], raw[7]]) as usize;

        if raw.len() < 8 + ndigits * 2 {
            return Err("invalid NUMERIC payload: truncated digits".into());
        }
        if sign == 0xC000 {
            return Ok("NaN".to_string());
        }

        // Base-10000 digit groups
        let digits: Vec<u16> = raw[8..8 + ndigits * 2]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if digits.iter().any(|group| *group > 9999) {
            return Err("invalid NUMERIC payload: group out of range".into());
        }
        if digits.is_empty() {
            return Ok("0".to_string());
        }

        let integer_groups = if weight >= 0 { weight as usize + 1 } else { 0 };

        let mut integer_text = String::new();
        if integer_groups == 0 {
            integer_text.push('0');
        } else {
            for idx in 0..integer_groups {
                let group = digits.get(idx).copied().unwrap_or(0);
                if idx == 0 {
                    integer_text.push_str(&group.to_string());
                } else {
                    integer_text.push_str(&format!("{group:04}"));
                }
            }
        }

        let mut fraction_text = String::new();
        if dscale > 0 {
            // Negative weight means leading zero groups after the point
            if weight < -1 {
                fraction_text.push_str(&"0000".repeat((-weight - 1) as usize));
            }
            for group in digits.iter().skip(integer_groups.min(digits.len())) {
                fraction_text.push_str(&format!("{group:04}"));
            }
            // Display scale is part of the value: 12.50 stays 12.50
            if fraction_text.len() < dscale {
                fraction_text.push_str(&"0".repeat(dscale - fraction_text.len()));
            } else {
                fraction_text.truncate(dscale);
            }
        }

        let mut output = String::new();
        let is_zero = integer_text == "0" && fraction_text.bytes().all(|b| b == b'0');
        if sign == 0x4000 && !is_zero {
            output.push('-');
        }
        output.push_str(&integer_text);
        if !fraction_text.is_empty() {
            output.push('.');
            output.push_str(&fraction_text);
        }

        Ok(output)
    }
}

impl<'a> FromSql<'a> for PgNumericString {
    fn from_sql(_: &Type, raw: &'a [u8]) -> FromSqlResult<Self> {
        Ok(Self(Self::parse(raw)?))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

impl<'a> FromSql<'a> for PgUnsigned {
    fn from_sql(_: &Type, raw: &'a [u8]) -> FromSqlResult<Self> {
        let bytes: [u8; 4] = raw.try_into()?;
        Ok(Self(u32::from_be_bytes(bytes)))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::OID || *ty == Type::XID || *ty == Type::CID
    }
}

impl<'a> FromSql<'a> for PgInterval {
    fn from_sql(_: &Type, raw: &'a [u8]) -> FromSqlResult<Self> {
        if raw.len() != 16 {
            return Err("invalid INTERVAL payload".into());
        }
        Ok(Self {
            microseconds: i64::from_be_bytes(raw[0..8].try_into()?),
            days: i32::from_be_bytes(raw[8..12].try_into()?),
            months: i32::from_be_bytes(raw[12..16].try_into()?),
        })
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INTERVAL
    }
}

/// Same layout as the server's default `IntervalStyle = postgres`
impl std::fmt::Display for PgInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut is_zero = true;
        let mut is_before = false;

        let parts = [
            (i64::from(self.months / 12), "year"),
            (i64::from(self.months % 12), "mon"),
            (i64::from(self.days), "day"),
        ];
        for (value, unit) in parts {
            if value == 0 {
                continue;
            }
            write!(
                f,
                "{}{}{} {}{}",
                if is_zero { "" } else { " " },
                if is_before && value > 0 { "+" } else { "" },
                value,
                unit,
                if value != 1 { "s" } else { "" }
            )?;
            is_before = value < 0;
            is_zero = false;
        }

        if is_zero || self.microseconds != 0 {
            let micros = self.microseconds.unsigned_abs();
            let hours = micros / 3_600_000_000;
            let minutes = micros / 60_000_000 % 60;
            let seconds = micros / 1_000_000 % 60;
            let fraction = micros % 1_000_000;

            let sign = if self.microseconds < 0 {
                "-"
            } else if is_before {
                "+"
            } else {
                ""
            };
            write!(
                f,
                "{}{}{:02}:{:02}:{:02}",
                if is_zero { "" } else { " " },
                sign,
                hours,
                minutes,
                seconds
            )?;
            if fraction != 0 {
                let digits = format!("{fraction:06}");
                write!(f, ".{}", digits.trim_end_matches('0'))?;
            }
        }
        Ok(())
    }
}

impl<'a> FromSql<'a> for PgInet {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> FromSqlResult<Self> {
        if raw.len() < 4 {
            return Err("invalid INET payload: too short".into());
        }
        let (family, bits, address) = (raw[0], raw[1], &raw[4..]);
        if address.len() != raw[3] as usize {
            return Err("invalid INET payload: address length mismatch".into());
        }

        let (text, max_bits) = match family {
            2 => {
                let octets: [u8; 4] = address.try_into()?;
                (Ipv4Addr::from(octets).to_string(), 32)
            }
            3 => {
                let octets: [u8; 16] = address.try_into()?;
                (Ipv6Addr::from(octets).to_string(), 128)
            }
            other => return Err(format!("invalid INET payload: family {other}").into()),
        };

        // inet hides a full-length mask, cidr always shows it
        if *ty == Type::CIDR || bits != max_bits {
            Ok(Self(format!("{text}/{bits}")))
        } else {
            Ok(Self(text))
        }
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INET || *ty == Type::CIDR
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize, wrap: impl FnOnce(T) -> Value) -> Value {
    match row.try_get::<_, Option<T>>(idx) {
        Ok(Some(v)) => wrap(v),
        Ok(None) => Value::Null,
        Err(e) => {
            tracing::warn!(column = idx, error = %e, "could not decode PostgreSQL value");
            Value::Null
        }
    }
}

fn array<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize, wrap: fn(T) -> Value) -> Value {
    get::<Vec<T>>(row, idx, |items| Value::Array(items.into_iter().map(wrap).collect()))
}

/// Type names `postgres_to_value` decodes from the binary protocol
const BINARY_DECODED_TYPES: &[&str] = &[
    "bool", "int2", "int4", "int8", "float4", "float8", "numeric", "text", "varchar", "bpchar",
    "name", "bytea", "uuid", "json", "jsonb", "date", "time", "timestamp", "timestamptz", "oid",
    "xid", "cid", "interval", "inet", "cidr", "_text", "_varchar", "_bpchar", "_name", "_int2",
    "_int4", "_int8",
];

/// Whether a column of this type can be read through the binary protocol.
///
/// Any other type (money, enums, domains, reg* aliases) is only rendered
/// faithfully by the server's text output.
pub(crate) fn has_binary_decoder(ty: &Type) -> bool {
    BINARY_DECODED_TYPES.contains(&ty.name())
}

/// A value fetched through the simple query protocol
pub(crate) fn text_to_value(text: Option<&str>) -> Value {
    text.map_or(Value::Null, |t| Value::String(t.to_string()))
}

/// Convert the column at `idx` of a PostgreSQL row
pub(crate) fn postgres_to_value(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "bool" => get(row, idx, Value::Bool),
        "int2" => get(row, idx, Value::Int16),
        "int4" => get(row, idx, Value::Int32),
        "int8" => get(row, idx, Value::Int64),
        "float4" => get(row, idx, Value::Float32),
        "float8" => get(row, idx, Value::Float64),
        "numeric" => get(row, idx, |n: PgNumericString| Value::Decimal(n.0)),
        "text" | "varchar" | "bpchar" | "name" => get(row, idx, Value::String),
        "bytea" => get(row, idx, Value::Bytes),
        "uuid" => get(row, idx, Value::Uuid),
        "json" | "jsonb" => get(row, idx, Value::Json),
        "date" => get(row, idx, Value::Date),
        "time" => get(row, idx, Value::Time),
        "timestamp" => get(row, idx, Value::DateTime),
        "timestamptz" => get(row, idx, Value::DateTimeUtc),
        "oid" | "xid" | "cid" => get(row, idx, |n: PgUnsigned| Value::Int64(i64::from(n.0))),
        "interval" => get(row, idx, |i: PgInterval| Value::String(i.to_string())),
        "inet" | "cidr" => get(row, idx, |a: PgInet| Value::String(a.0)),
        "_text" | "_varchar" | "_bpchar" | "_name" => array(row, idx, Value::String),
        "_int2" => array(row, idx, Value::Int16),
        "_int4" => array(row, idx, Value::Int32),
        "_int8" => array(row, idx, Value::Int64),
        other => {
            tracing::warn!(column = idx, type_name = %other, "no binary decoder for PostgreSQL type");
            Value::Null
        }
    }
}
