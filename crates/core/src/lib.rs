//! Client library generator core.
//!
//! Turns a Protobuf descriptor set or an OpenAPI v3 document into one
//! language-neutral [`model::Api`], checks and filters it, then lets a
//! per-language [`codec::Codec`] annotate it and renders templates into an
//! output tree.
//!
//! ## Module Structure
//!
//! - `config`: `clientgen.toml` and option maps
//! - `error`: error type and pipeline stages
//! - `model`: the API model and its ID-keyed state
//! - `parser`: Protobuf and OpenAPI front-ends
//! - `xref`: parent links, reference checks, query parameters
//! - `filter`: skipped/included element selection
//! - `codec`: per-language naming, typing and annotation
//! - `render`: template discovery and rendering
//! - `postprocess`: external formatters
//! - `pipeline`: the stage-by-stage driver

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod postprocess;
pub mod render;
pub mod xref;

pub use config::{CodecOptions, Config, SourceOptions};
pub use error::{Error, Result, Stage};
pub use parser::Format;
pub use pipeline::{GenerateRequest, generate, run};
