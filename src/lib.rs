//! PromptPack Core - Product Sheet to Prompt Package Compiler
//!
//! Turns validated product-sheet rows into per-product packages of prompt
//! sheets, overlay text sources, and JSON manifests for a downstream image
//! pipeline, and validates generated packages.
//!
//! # The Five Guarantees (Non-Negotiable)
//! 1. Identifiers Are Filesystem-Safe
//! 2. Derivation Is Deterministic
//! 3. Writes Are Atomic
//! 4. Manifests Declare Expected Outputs
//! 5. Validation Is Read-Only

pub mod error;
pub mod policy;
pub mod record;
pub mod sheet;
pub mod fsio;
pub mod package;
pub mod validation;

pub use error::{Error, Result};
pub use policy::{optional_text, require_english_text, safe_id};
pub use record::{ProductRecord, Units, DEFAULT_OUTPUT_SET, DEFAULT_STYLE_PACK};
pub use sheet::{ensure_unique_product_ids, read_product_sheet};
pub use package::{generate_package, ExpectedOutputs, Manifest, ProductSummary};
pub use validation::{discover_packages, validate_package};

/// Schema version written into every `manifest.json`.
pub const MANIFEST_VERSION: &str = "0.1.0";
