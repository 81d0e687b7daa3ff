//! `cpy` - copy files matched by glob patterns
//!
//! The heavy lifting lives in the `common` crate; this crate holds the command-line glue.
//!
//! # Usage
//!
//! ```bash
//! # Copy all .png files in src into dist except src/goat.png
//! cpy 'src/*.png' '!src/goat.png' dist
//!
//! # Copy everything inside src into ../dist keeping the directory structure
//! cpy . '../dist/' --cwd=src
//!
//! # Copy a single file to a specific filename
//! cpy .env.development .env
//!
//! # Prefix the copied image names
//! cpy 'src/*.png' dist --cwd=src --rename=hi-{{basename}}
//!
//! # Only copy when the source is newer
//! cpy src dist --update
//! ```

pub mod path;
