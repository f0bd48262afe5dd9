pub mod compiler;
pub mod declarations;
pub mod enums;
pub mod plugin;
pub mod reconcile;
pub mod syntax;
pub mod type_mapper;

pub use plugin::{OpenApiTypeScriptPlugin, PLUGIN_NAME, TYPES_FILENAME};
