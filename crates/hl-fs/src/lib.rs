pub mod atomic;
pub mod security;

pub use atomic::{tmp_sibling, write_bytes_atomic, write_json_atomic};
pub use security::{resolve_path, FsError, PathAuthority};
