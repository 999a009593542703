// lib.rs
use kube::{config::KubeConfigOptions, Client, Config};
use mlua::prelude::*;
use mlua::Lua;
use std::backtrace::Backtrace;
use std::panic;
use std::sync::{Mutex, OnceLock};
use tokio::runtime::Runtime;
use tracing::error;

cfg_if::cfg_if! {
    if #[cfg(feature = "telemetry")] {
        use catalog_telemetry as logging;
    } else {
        mod log;
        use log as logging;
    }
}

mod editor_queue;
mod session;
mod structs;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();
static CLIENT_INSTANCE: Mutex<Option<Client>> = Mutex::new(None);

pub fn runtime() -> LuaResult<&'static Runtime> {
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }
    let rt = Runtime::new().map_err(LuaError::external)?;
    Ok(RUNTIME.get_or_init(|| rt))
}

pub fn current_client() -> LuaResult<Client> {
    CLIENT_INSTANCE
        .lock()
        .map_err(|_| LuaError::RuntimeError("poisoned CLIENT lock".into()))?
        .as_ref()
        .cloned()
        .ok_or_else(|| LuaError::external(catalog_content::ContentError::ClientNotInitialised))
}

#[tracing::instrument]
fn init_runtime(_lua: &Lua, context_name: Option<String>) -> LuaResult<bool> {
    let new_client = runtime()?.block_on(async {
        let options = KubeConfigOptions {
            context: context_name.clone(),
            cluster: None,
            user: None,
        };
        let config = Config::from_kubeconfig(&options)
            .await
            .map_err(LuaError::external)?;
        Client::try_from(config).map_err(LuaError::external)
    })?;

    let mut client_guard = CLIENT_INSTANCE
        .lock()
        .map_err(|_| LuaError::RuntimeError("poisoned CLIENT lock".into()))?;
    *client_guard = Some(new_client);

    Ok(true)
}

#[mlua::lua_module(skip_memory_check)]
fn catalog_client(lua: &Lua) -> LuaResult<mlua::Table> {
    let exports = lua.create_table()?;
    exports.set(
        "init_logging",
        lua.create_function(|_, path: String| {
            logging::setup_logger(&path, "http://localhost:4317")
                .map_err(|e| LuaError::external(format!("{:?}", e)))?;
            Ok(())
        })?,
    )?;
    exports.set(
        "shutdown_logging",
        lua.create_function(|_, ()| {
            logging::shutdown();
            Ok(())
        })?,
    )?;

    let default = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let bt = Backtrace::force_capture();
        error!(target: "panic",
               "panic: {panic_info}\n\nBacktrace:\n{bt}");
        default(panic_info);
    }));

    exports.set("init_runtime", lua.create_function(init_runtime)?)?;
    exports.set(
        "content_session",
        lua.create_function(session::content_session)?,
    )?;

    Ok(exports)
}
