//! CLI command implementations

pub mod ddl;
pub mod inspect_type;
pub mod introspect;
pub mod split;
