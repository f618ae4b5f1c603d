pub mod chunk;
pub mod encode;
pub mod error;
pub mod form;
pub mod header;
pub mod segment;
pub mod types;

pub use chunk::{split, MissingSeparator, RawChunk};
pub use error::{HeaderError, HeaderErrorKind, InputError, ParseError};
pub use form::parse;
pub use header::parse_header;
pub use segment::segment;
pub use types::*;
