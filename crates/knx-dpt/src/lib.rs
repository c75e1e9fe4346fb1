//! knx-dpt: transcoders between KNX datapoint payloads and engineering values
//!
//! Every transcoder is a row in a static table: a string id (`value_type`), the DPT
//! main/sub number pair, an optional unit and the codec family with its parameters.
//! The [`TranscoderRegistry`] resolves rows by either key.

mod error;
pub use error::{DptError, Result};

mod types;
pub use types::{Charset, Codec, Domain, DptValue, Transcoder, Width};

mod encode;
mod decode;

mod catalogue;
pub use catalogue::TRANSCODERS;

pub mod registry;
pub use registry::{global, TranscoderRegistry};

/// Resolve a transcoder by its `value_type` in the process-wide registry.
pub fn resolve_by_value_type(value_type: &str) -> Result<&'static Transcoder> {
    global().resolve_by_value_type(value_type)
}

/// Resolve a transcoder by DPT main/sub number in the process-wide registry.
pub fn resolve_by_dpt_id(main: u16, sub: Option<u16>) -> Result<&'static Transcoder> {
    global().resolve_by_dpt_id(main, sub)
}

/// Resolve a transcoder from a `value_type` or a DPT string such as `9.001`.
pub fn parse_transcoder(query: &str) -> Result<&'static Transcoder> {
    global().parse_transcoder(query)
}
