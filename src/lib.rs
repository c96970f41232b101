//! # mnl-codec
//!
//! Byte-exact codec for the Mario & Luigi handheld RPG series' FEvent
//! script format, its dialog/text tables, and the LZ77+RLE compression
//! used throughout the overlay and FEvent data.
//!
//! - [`compression`]: the block-segmented LZ77+RLE codec
//! - [`metadata`]: the fixed-size command-parameter metadata record
//! - [`script`]: commands, subroutines, and the FEvent script header
//! - [`text`]: per-language text tables and dialog textbox sizes
//! - [`chunk`]: the script-vs-language-table discriminator
//! - [`manager`]: whole-file load/save across overlays and `FEvent.dat`
//! - [`error`]: the hard-error type shared by every codec
//! - [`diagnostics`]: the recoverable-warning side channel
//!
//! ## Architecture
//!
//! The codecs are layered, each built only on the ones above it:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ manager:      whole-file load/save (overlays + FEvent)  │
//! ├─────────────────────────────────────────────────────────┤
//! │ chunk:        Script vs. LanguageTable discrimination   │
//! ├─────────────────────┬───────────────────────────────────┤
//! │ script:       commands/subroutines/header  │ text: tables│
//! ├─────────────────────┴───────────────────────────────────┤
//! │ metadata:     command-parameter metadata record          │
//! ├─────────────────────────────────────────────────────────┤
//! │ varint/consts: primitive codec utilities, build params   │
//! ├─────────────────────────────────────────────────────────┤
//! │ compression:  LZ77+RLE block codec (used on whole files  │
//! │               before any of the above ever sees them)    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mnl_codec::prelude::*;
//!
//! let original = b"the quick brown fox the quick brown fox".repeat(4);
//! let mut diagnostics = Diagnostics::new();
//! let compressed = compression::compress(&original).unwrap();
//! let decompressed = compression::decompress(&compressed, &mut diagnostics).unwrap();
//! assert_eq!(decompressed, original);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod compression;
pub mod consts;
pub mod diagnostics;
pub mod error;
pub mod manager;
pub mod metadata;
pub mod script;
pub mod text;
pub mod varint;

pub use chunk::{parse_fevent_chunk, FEventChunk};
pub use diagnostics::{Diagnostics, Warning};
pub use error::{CodecError, Result};
pub use manager::{CommandMetadataSet, CommandTableKind, Manager, ManagerBytes};
pub use metadata::CommandParameterMetadata;
pub use script::{Argument, Command, CommandMetadataTable, Script, ScriptHeader, Subroutine, Variable};
pub use text::{LanguagePayload, LanguageTable, TextTable};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::chunk::{parse_fevent_chunk, FEventChunk};
    pub use crate::compression;
    pub use crate::diagnostics::{Diagnostics, Warning};
    pub use crate::error::{CodecError, Result};
    pub use crate::manager::{CommandMetadataSet, CommandTableKind, Manager, ManagerBytes};
    pub use crate::metadata::CommandParameterMetadata;
    pub use crate::script::{
        Argument, Command, CommandMetadataTable, Script, ScriptHeader, Subroutine, Variable,
    };
    pub use crate::text::{LanguagePayload, LanguageTable, TextTable};
}
