#![forbid(unsafe_code)]

//! Loading and checking of SwimFlow process documents.
//!
//! - [`load_value`] / [`load_document`]: read JSON, JSON5, YAML or a fenced
//!   block out of a language-model reply.
//! - [`validate`]: hard structural and referential checks; an empty result
//!   means the document may be compiled.
//! - [`lint`]: soft findings that never block compilation.

mod lint;
mod load;
mod validate;

pub use lint::lint;
pub use load::{MAX_NESTING_DEPTH, extract_fenced_block, load_document, load_value};
pub use validate::{validate, validate_document};

use serde_json::Value;
use sf_core::{ProcessDocument, SwimflowError};

/// Validate `value` and, when it passes, deserialize it.
///
/// This is the gate callers put in front of the compiler: on any validation
/// error the full list comes back as [`SwimflowError::Validation`].
pub fn validated_document(value: Value) -> Result<ProcessDocument, SwimflowError> {
    let errors = validate(&value);
    if !errors.is_empty() {
        return Err(SwimflowError::Validation { errors });
    }
    load::to_document(value)
}
