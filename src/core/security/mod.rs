// Working-directory checks for adapters that shell out to a CLI.
//
// Every directory a CLI adapter runs in goes through `validate_working_dir`
// so a configured root cannot be escaped with `..` or a symlink.

pub mod path_validator;

pub use path_validator::{validate_working_dir, PathSecurityError};
