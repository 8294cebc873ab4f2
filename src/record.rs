use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::columns::ColumnDescriptor;

/// A single cell value.
///
/// Numbers compare numerically, text lexically. Values of different kinds
/// order as `Null < numbers < Text` so every sort has a total order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
        }
    }

    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_nan() => write!(f, "NaN"),
            Value::Float(x) if x.is_infinite() => {
                if x.is_sign_negative() {
                    write!(f, "-Infinity")
                } else {
                    write!(f, "Infinity")
                }
            }
            // Avoid printing "-0"
            Value::Float(x) if *x == 0.0 => write!(f, "0"),
            // Very large and very small magnitudes switch to exponent form, e.g. "1e+21"
            Value::Float(x) if x.abs() >= 1e21 || x.abs() < 1e-6 => {
                let exp = format!("{x:e}");
                match exp.split_once('e') {
                    Some((mantissa, power)) if !power.starts_with('-') => {
                        write!(f, "{mantissa}e+{power}")
                    }
                    _ => write!(f, "{exp}"),
                }
            }
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// One row of data: a flat mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Missing fields read as `Value::Null`.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Null)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Column layout plus the raw rows, as handed to the model at start up.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Built-in data shown when no file is given on the command line.
    pub fn sample() -> Self {
        let rows = [
            ("John Doe", 25, "USA"),
            ("Jane Doe", 30, "Canada"),
            ("Bob Smith", 22, "UK"),
        ];
        let records = (0..3)
            .flat_map(|_| rows.iter())
            .map(|&(name, age, country)| {
                Record::from_iter([
                    ("name", Value::from(name)),
                    ("age", Value::Int(age)),
                    ("country", Value::from(country)),
                ])
            })
            .collect();

        Dataset {
            name: "sample".to_string(),
            columns: vec![
                ColumnDescriptor::new("name", "Name"),
                ColumnDescriptor::new("age", "Age"),
                ColumnDescriptor::new("country", "Country"),
            ],
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(Value::Int(9).compare(&Value::Int(10)), Ordering::Less);
        assert_eq!(Value::Float(2.5).compare(&Value::Int(2)), Ordering::Greater);
        assert_eq!(Value::Int(3).compare(&Value::Float(3.0)), Ordering::Equal);
    }

    #[test]
    fn text_compares_lexically() {
        assert_eq!(Value::from("10").compare(&Value::from("9")), Ordering::Less);
        assert_eq!(Value::from("Bob").compare(&Value::from("bob")), Ordering::Less);
    }

    #[test]
    fn mixed_kinds_have_a_fixed_order() {
        assert_eq!(Value::Null.compare(&Value::Int(-5)), Ordering::Less);
        assert_eq!(Value::Int(1000).compare(&Value::from("a")), Ordering::Less);
        assert_eq!(Value::from("a").compare(&Value::Null), Ordering::Greater);
    }

    #[test]
    fn display_is_total() {
        assert_eq!(Value::Int(25).to_string(), "25");
        assert_eq!(Value::Float(25.0).to_string(), "25");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(-0.0).to_string(), "0");
        assert_eq!(Value::Float(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from("Canada").to_string(), "Canada");
    }

    #[test]
    fn extreme_floats_use_exponent_form() {
        assert_eq!(Value::Float(1e21).to_string(), "1e+21");
        assert_eq!(Value::Float(-1.5e300).to_string(), "-1.5e+300");
        assert_eq!(Value::Float(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Float(2.5e-9).to_string(), "2.5e-9");
        assert_eq!(Value::Float(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::Float(0.000001).to_string(), "0.000001");
    }

    #[test]
    fn missing_field_reads_as_null() {
        let record = Record::from_iter([("name", "John Doe")]);
        assert!(record.get("age").is_null());
        assert_eq!(record.values().count(), 1);
    }

    #[test]
    fn sample_has_three_rows_repeated_three_times() {
        let data = Dataset::sample();
        assert_eq!(data.records.len(), 9);
        assert_eq!(data.columns.len(), 3);
        assert_eq!(data.records[0], data.records[3]);
        assert_eq!(data.records[2].get("name"), &Value::from("Bob Smith"));
    }
}
