//! PIO Assembler
//!
//! Decode PIO assembly text into [`pio_spec::Program`] values.
//!
//! ## Example
//!
//! ```rust
//! use pio_assembler::assemble;
//!
//! let source = r#"
//!     .wrap_target
//!         set pins, 1 [31]
//!         set pins, 0 [31]
//!     .wrap
//! "#;
//!
//! let program = assemble(source);
//! assert_eq!(program.executable_count(), 2);
//! assert_eq!(program.unrecognized_count(), 0);
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod assembler;

pub use error::{AssemblerError, Result};
pub use assembler::{assemble, assemble_lines, assemble_strict};
pub use parser::{decode, parse_line, Line};
