//! List commands implementation

use crate::backends;

/// List all compiled-in backends
pub fn list_backends() {
    print!("{}", backends::backend_help());
}
