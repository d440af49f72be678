//! Length-unit inference from raw STEP text.
//!
//! The scan is a substring heuristic over the head of the file. It never
//! parses entities, so it works on files the kernel would reject and costs
//! nothing beyond one pass over at most [`SNIFF_LIMIT`] bytes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

/// Number of leading bytes inspected.
pub const SNIFF_LIMIT: usize = 200 * 1024;

/// Millimetres per native unit, with a human-readable label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitScale {
    /// Millimetres per native unit; always positive.
    pub mm_per_unit: f64,
    /// `inch`, `foot`, `mm`, `cm`, `dm`, `m`, `mm (assumed)` or `mm (default)`.
    pub label: &'static str,
}

impl UnitScale {
    const fn new(mm_per_unit: f64, label: &'static str) -> Self {
        Self { mm_per_unit, label }
    }

    /// Inches.
    pub const INCH: Self = Self::new(25.4, "inch");
    /// Feet.
    pub const FOOT: Self = Self::new(304.8, "foot");
    /// Millimetres, declared.
    pub const MILLIMETRE: Self = Self::new(1.0, "mm");
    /// Centimetres.
    pub const CENTIMETRE: Self = Self::new(10.0, "cm");
    /// Decimetres.
    pub const DECIMETRE: Self = Self::new(100.0, "dm");
    /// Metres.
    pub const METRE: Self = Self::new(1000.0, "m");
    /// No unit declaration found.
    pub const ASSUMED: Self = Self::new(1.0, "mm (assumed)");
    /// File could not be read.
    pub const DEFAULT: Self = Self::new(1.0, "mm (default)");
}

/// Infer the length unit from the first [`SNIFF_LIMIT`] bytes.
pub fn sniff_units(bytes: &[u8]) -> UnitScale {
    let head = &bytes[..bytes.len().min(SNIFF_LIMIT)];
    let text = String::from_utf8_lossy(head).to_uppercase();
    let has = |needle: &str| text.contains(needle);

    let scale = if has("INCH") || (has("'IN'") && has("CONVERSION_BASED_UNIT")) {
        UnitScale::INCH
    } else if has("FOOT") || has("FEET") {
        UnitScale::FOOT
    } else if has("SI_UNIT") && has("MILLI") && has("METRE") {
        UnitScale::MILLIMETRE
    } else if has("CENTI") && has("METRE") {
        UnitScale::CENTIMETRE
    } else if has("DECI") && has("METRE") {
        UnitScale::DECIMETRE
    } else if has("METRE") && !has("MILLI") && !has("CENTI") && !has("DECI") {
        UnitScale::METRE
    } else {
        UnitScale::ASSUMED
    };
    debug!(units = scale.label, "sniffed length unit");
    scale
}

/// Same as [`sniff_units`] on the head of a file; an unreadable file yields
/// [`UnitScale::DEFAULT`].
pub fn sniff_units_file(path: impl AsRef<Path>) -> UnitScale {
    let read_head = || -> std::io::Result<Vec<u8>> {
        let mut head = Vec::with_capacity(SNIFF_LIMIT);
        File::open(path.as_ref())?
            .take(SNIFF_LIMIT as u64)
            .read_to_end(&mut head)?;
        Ok(head)
    };
    match read_head() {
        Ok(head) => sniff_units(&head),
        Err(e) => {
            debug!(path = %path.as_ref().display(), error = %e, "cannot read file for unit sniffing");
            UnitScale::DEFAULT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sniff(text: &str) -> UnitScale {
        sniff_units(text.as_bytes())
    }

    #[test]
    fn test_each_marker() {
        assert_eq!(sniff("CONVERSION_BASED_UNIT('INCH',#5)"), UnitScale::INCH);
        assert_eq!(sniff("( CONVERSION_BASED_UNIT('IN',#5) LENGTH_UNIT() )"), UnitScale::INCH);
        assert_eq!(sniff("CONVERSION_BASED_UNIT('FOOT',#5)"), UnitScale::FOOT);
        assert_eq!(sniff("'FEET'"), UnitScale::FOOT);
        assert_eq!(sniff("SI_UNIT(.MILLI.,.METRE.)"), UnitScale::MILLIMETRE);
        assert_eq!(sniff("SI_UNIT(.CENTI.,.METRE.)"), UnitScale::CENTIMETRE);
        assert_eq!(sniff("SI_UNIT(.DECI.,.METRE.)"), UnitScale::DECIMETRE);
        assert_eq!(sniff("SI_UNIT($,.METRE.)"), UnitScale::METRE);
        assert_eq!(sniff("CARTESIAN_POINT('',(0.,0.,0.))"), UnitScale::ASSUMED);
        assert_eq!(sniff(""), UnitScale::ASSUMED);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(sniff("si_unit(.milli.,.metre.)"), UnitScale::MILLIMETRE);
        assert_eq!(sniff("Inches"), UnitScale::INCH);
    }

    #[test]
    fn test_precedence() {
        // An inch declaration wins over SI millimetres elsewhere in the file.
        assert_eq!(
            sniff("SI_UNIT(.MILLI.,.METRE.) CONVERSION_BASED_UNIT('INCH',#2)"),
            UnitScale::INCH
        );
        // 'IN' alone is not enough.
        assert_eq!(sniff("NAME('IN') SI_UNIT(.MILLI.,.METRE.)"), UnitScale::MILLIMETRE);
        // Any prefix blocks the bare-metre rule, even without SI_UNIT.
        assert_eq!(sniff("MILLI METRE"), UnitScale::ASSUMED);
    }

    #[test]
    fn test_markers_beyond_limit_ignored() {
        let mut bytes = vec![b' '; SNIFF_LIMIT];
        bytes.extend_from_slice(b"CONVERSION_BASED_UNIT('INCH',#5)");
        assert_eq!(sniff_units(&bytes), UnitScale::ASSUMED);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut bytes = vec![0xff, 0xfe];
        bytes.extend_from_slice(b"SI_UNIT(.MILLI.,.METRE.)");
        assert_eq!(sniff_units(&bytes), UnitScale::MILLIMETRE);
    }

    #[test]
    fn test_sniff_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"SI_UNIT(.CENTI.,.METRE.)").unwrap();
        assert_eq!(sniff_units_file(file.path()), UnitScale::CENTIMETRE);
    }

    #[test]
    fn test_unreadable_file_defaults() {
        assert_eq!(sniff_units_file("/nonexistent/part.step"), UnitScale::DEFAULT);
    }
}
