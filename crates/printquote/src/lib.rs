//! 3D-print quoting from STEP files.
//!
//! Bytes go through four stages: unit inference and shape loading (run
//! concurrently), quantity extraction, then pricing. Uploads go through a
//! temporary file ([`Quoter::report`]); files already on disk are read in
//! place ([`Quoter::report_file`], which sniffs units with
//! [`sniff_units_file`]).
//!
//! ```no_run
//! use printquote::{PricingParameters, Quoter, StepKernel};
//!
//! let bytes = std::fs::read("bracket.step").unwrap();
//! let quote = Quoter::new(StepKernel)
//!     .quote(&bytes, "PETG Basic", &PricingParameters::from_env())
//!     .unwrap();
//! println!("{:.2}", quote.estimated_price);
//! ```

mod config;
mod error;
mod extract;
mod kernel;
mod loader;
mod material;
mod pricing;
mod quote;
mod units;

pub use config::PricingParameters;
pub use error::{QuoteError, Result};
pub use extract::{extract, GeometryReading};
pub use kernel::{CadKernel, StepKernel};
pub use loader::ShapeLoader;
pub use material::{Material, MaterialProfile, FALLBACK_DENSITY, FALLBACK_PRICE_PER_KG};
pub use pricing::{price, PricingResult, FILL_FACTOR, HOURS_PER_CM3, MM_PER_EXTRA_HOUR};
pub use quote::{round_to, Inspection, Quote, QuoteReport, Quoter};
pub use units::{sniff_units, sniff_units_file, UnitScale, SNIFF_LIMIT};
