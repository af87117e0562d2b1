/// Embedded Lua plugin host
///
/// Each workflow directory is loaded into its own Lua state. The entry point
/// chunk (`main.lua`) runs once at load time and must leave a global
/// `run_graph(inputs)` function behind; that function is what the registry
/// invokes on every execution. Sibling `.lua` files are reachable through
/// `require` because the workflow directory is prepended to `package.path`.

use crate::workflow::error::LoadError;
use mlua::{Function, Lua, LuaSerdeExt};
use serde_json::{Map, Value};
use std::{fmt, path::Path};

/// File that holds the workflow entry point
pub const ENTRY_POINT_FILE: &str = "main.lua";

/// Global function every entry point must define
pub const ENTRY_FUNCTION: &str = "run_graph";

/// A loaded Lua workflow with its entry function bound
pub struct LuaPlugin {
    /// Owning Lua state; `entry` is only valid while this is alive
    lua: Lua,
    entry: Function,
    chunk_name: String,
}

impl LuaPlugin {
    /// Load the entry point of the workflow stored in `workflow_dir`
    pub fn load(workflow_dir: &Path) -> Result<Self, LoadError> {
        if !workflow_dir.is_dir() {
            return Err(LoadError::DirectoryMissing(workflow_dir.display().to_string()));
        }

        let entry_path = workflow_dir.join(ENTRY_POINT_FILE);
        if !entry_path.is_file() {
            return Err(LoadError::EntryPointMissing(entry_path.display().to_string()));
        }
        let source = std::fs::read_to_string(&entry_path)?;

        let lua = Lua::new();
        Self::configure_package_path(&lua, workflow_dir)
            .map_err(|e| LoadError::Script(describe_lua_error(&e)))?;

        let chunk_name = format!("@{}", entry_path.display());
        tracing::debug!("📝 Executing entry point chunk {}", chunk_name);
        lua.load(source.as_str())
            .set_name(chunk_name.clone())
            .exec()
            .map_err(|e| LoadError::Script(describe_lua_error(&e)))?;

        let entry = match lua.globals().get::<mlua::Value>(ENTRY_FUNCTION) {
            Ok(mlua::Value::Function(f)) => f,
            Ok(_) => return Err(LoadError::EntryFunctionMissing(ENTRY_FUNCTION)),
            Err(e) => return Err(LoadError::Script(describe_lua_error(&e))),
        };

        Ok(Self { lua, entry, chunk_name })
    }

    /// Invoke `run_graph(inputs)` and convert whatever it returns to JSON
    pub fn call(&self, inputs: &Map<String, Value>) -> Result<Value, String> {
        let arg = self
            .lua
            .to_value(inputs)
            .map_err(|e| format!("Failed to convert inputs for Lua: {}", describe_lua_error(&e)))?;

        let returned: mlua::Value = self.entry.call(arg).map_err(|e| describe_lua_error(&e))?;

        self.lua
            .from_value::<Value>(returned)
            .map_err(|e| format!("Workflow returned a value that is not JSON: {}", describe_lua_error(&e)))
    }

    /// Make `require("helper")` resolve to `<workflow_dir>/helper.lua`
    fn configure_package_path(lua: &Lua, workflow_dir: &Path) -> mlua::Result<()> {
        let package: mlua::Table = lua.globals().get("package")?;
        let existing: String = package.get("path")?;
        let dir = workflow_dir.display();
        package.set("path", format!("{dir}/?.lua;{dir}/?/init.lua;{existing}"))
    }
}

impl fmt::Debug for LuaPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuaPlugin").field("chunk", &self.chunk_name).finish()
    }
}

/// Message of a Lua error without the stack traceback mlua appends
fn describe_lua_error(err: &mlua::Error) -> String {
    let text = match err {
        mlua::Error::RuntimeError(msg) | mlua::Error::SyntaxError { message: msg, .. } => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => return describe_lua_error(cause),
        other => other.to_string(),
    };
    match text.find("\nstack traceback:") {
        Some(end) => text[..end].to_string(),
        None => text,
    }
}
