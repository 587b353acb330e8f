pub mod applicator;

pub use applicator::{
    apply_fixes, apply_manifest_bump, apply_raw_fix, load_fixes, parse_bump, FixDescriptor,
};
