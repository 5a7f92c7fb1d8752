//! Special MPQ files handling: (listfile)

mod listfile;

pub use listfile::{LISTFILE_NAME, parse_listfile};
