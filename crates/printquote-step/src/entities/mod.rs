//! Typed views over raw STEP records.
//!
//! Each submodule turns the records of one entity family into plain Rust
//! values. Lookups go through [`RecordRef`], which pairs a record with the
//! ID of the instance it belongs to so errors can name the offending entity.

pub mod curves;
pub mod geometry;
pub mod surfaces;
pub mod topology;

pub use curves::*;
pub use geometry::*;
pub use surfaces::*;
pub use topology::*;

use crate::error::StepError;
use crate::parser::{StepFile, StepRecord, StepValue};

/// A record of an entity instance, tagged with the instance ID.
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'a> {
    /// ID of the owning instance.
    pub id: u64,
    /// The record.
    pub record: &'a StepRecord,
}

impl<'a> RecordRef<'a> {
    /// Type name of the record.
    pub fn name(&self) -> &'a str {
        &self.record.name
    }
}

/// Resolve `id` to its primary record: the only record of a simple
/// instance, or the first record in a complex one whose name is in `preferred`.
pub fn primary_record<'a>(
    file: &'a StepFile,
    id: u64,
    preferred: &[&str],
) -> Result<RecordRef<'a>, StepError> {
    let entity = file.require(id)?;
    let record = if entity.is_complex() {
        preferred
            .iter()
            .find_map(|name| entity.record(name))
            .ok_or_else(|| StepError::type_mismatch(preferred.join("|"), "COMPLEX"))?
    } else {
        &entity.records[0]
    };
    Ok(RecordRef { id, record })
}

/// Resolve `id` and require a record named `expected`.
pub fn require_record<'a>(
    file: &'a StepFile,
    id: u64,
    expected: &str,
) -> Result<RecordRef<'a>, StepError> {
    let entity = file.require(id)?;
    entity
        .record(expected)
        .map(|record| RecordRef { id, record })
        .ok_or_else(|| StepError::type_mismatch(expected, entity.type_name()))
}

/// Helper trait for extracting argument values from STEP records.
pub trait EntityArgs {
    /// Get a required real argument at index.
    fn real(&self, idx: usize) -> Result<f64, StepError>;

    /// Get a required integer argument at index.
    fn integer(&self, idx: usize) -> Result<i64, StepError>;

    /// Get a required enum argument at index.
    fn enumeration(&self, idx: usize) -> Result<&str, StepError>;

    /// Get a required boolean (`.T.`/`.F.`) argument at index.
    fn boolean(&self, idx: usize) -> Result<bool, StepError>;

    /// Get a required entity reference at index.
    fn entity_ref(&self, idx: usize) -> Result<u64, StepError>;

    /// Get a required list argument at index.
    fn list(&self, idx: usize) -> Result<&[StepValue], StepError>;

    /// Get a list of reals at index.
    fn real_list(&self, idx: usize) -> Result<Vec<f64>, StepError>;

    /// Get a list of integers at index.
    fn integer_list(&self, idx: usize) -> Result<Vec<i64>, StepError>;

    /// Get a list of entity references at index.
    fn entity_ref_list(&self, idx: usize) -> Result<Vec<u64>, StepError>;

    /// Check if argument at index is null or absent.
    fn is_null(&self, idx: usize) -> bool;
}

impl RecordRef<'_> {
    fn arg_error(&self, what: &str, idx: usize) -> StepError {
        StepError::parser(
            Some(self.id),
            format!("expected {what} at arg {idx} in {}", self.record.name),
        )
    }

    fn list_of<T>(
        &self,
        idx: usize,
        what: &str,
        convert: impl Fn(&StepValue) -> Option<T>,
    ) -> Result<Vec<T>, StepError> {
        self.list(idx)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                convert(v).ok_or_else(|| {
                    StepError::parser(
                        Some(self.id),
                        format!("expected {what} at list[{i}] in arg {idx} of {}", self.record.name),
                    )
                })
            })
            .collect()
    }
}

impl EntityArgs for RecordRef<'_> {
    fn real(&self, idx: usize) -> Result<f64, StepError> {
        self.record
            .args
            .get(idx)
            .and_then(StepValue::as_real)
            .ok_or_else(|| self.arg_error("real", idx))
    }

    fn integer(&self, idx: usize) -> Result<i64, StepError> {
        self.record
            .args
            .get(idx)
            .and_then(StepValue::as_integer)
            .ok_or_else(|| self.arg_error("integer", idx))
    }

    fn enumeration(&self, idx: usize) -> Result<&str, StepError> {
        self.record
            .args
            .get(idx)
            .and_then(StepValue::as_enum)
            .ok_or_else(|| self.arg_error("enum", idx))
    }

    fn boolean(&self, idx: usize) -> Result<bool, StepError> {
        match self.enumeration(idx)? {
            "T" | "TRUE" => Ok(true),
            "F" | "FALSE" => Ok(false),
            _ => Err(self.arg_error("boolean", idx)),
        }
    }

    fn entity_ref(&self, idx: usize) -> Result<u64, StepError> {
        self.record
            .args
            .get(idx)
            .and_then(StepValue::as_entity_ref)
            .ok_or_else(|| self.arg_error("entity ref", idx))
    }

    fn list(&self, idx: usize) -> Result<&[StepValue], StepError> {
        self.record
            .args
            .get(idx)
            .and_then(StepValue::as_list)
            .ok_or_else(|| self.arg_error("list", idx))
    }

    fn real_list(&self, idx: usize) -> Result<Vec<f64>, StepError> {
        self.list_of(idx, "real", StepValue::as_real)
    }

    fn integer_list(&self, idx: usize) -> Result<Vec<i64>, StepError> {
        self.list_of(idx, "integer", StepValue::as_integer)
    }

    fn entity_ref_list(&self, idx: usize) -> Result<Vec<u64>, StepError> {
        self.list_of(idx, "entity ref", StepValue::as_entity_ref)
    }

    fn is_null(&self, idx: usize) -> bool {
        self.record.args.get(idx).map_or(true, StepValue::is_null)
    }
}

#[cfg(test)]
pub(crate) fn parse_data(data: &str) -> StepFile {
    let input = format!("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n");
    crate::parser::Parser::parse(input.as_bytes()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_args() {
        let file = parse_data("#1 = THING('n', 2.5, 3, .T., #7, (1.0, 2), (#2, #3), $);");
        let r = primary_record(&file, 1, &[]).unwrap();
        assert_eq!(r.name(), "THING");
        assert_eq!(r.real(1).unwrap(), 2.5);
        assert_eq!(r.integer(2).unwrap(), 3);
        assert!(r.boolean(3).unwrap());
        assert_eq!(r.entity_ref(4).unwrap(), 7);
        assert_eq!(r.real_list(5).unwrap(), vec![1.0, 2.0]);
        assert_eq!(r.entity_ref_list(6).unwrap(), vec![2, 3]);
        assert!(r.is_null(7));
        assert!(r.is_null(99));
        assert!(r.real(0).is_err());
    }

    #[test]
    fn test_complex_primary_record() {
        let file = parse_data("#1 = ( LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT(.MILLI.,.METRE.) );");
        let r = primary_record(&file, 1, &["SI_UNIT"]).unwrap();
        assert_eq!(r.enumeration(1).unwrap(), "METRE");
        assert!(primary_record(&file, 1, &["PLANE"]).is_err());
        assert!(require_record(&file, 1, "NAMED_UNIT").is_ok());
        assert!(matches!(
            require_record(&file, 1, "PLANE"),
            Err(StepError::TypeMismatch { .. })
        ));
    }
}
