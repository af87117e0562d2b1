/// Plugin runtime
///
/// Workflows are Lua scripts executed by an embedded interpreter. Each
/// workflow gets its own Lua state; the registry only sees `LuaPlugin`.

// Embedded Lua host for workflow entry points
pub mod lua;

pub use lua::{LuaPlugin, ENTRY_FUNCTION, ENTRY_POINT_FILE};
