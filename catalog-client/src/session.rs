//! `ContentSession`: one content pane exposed to Lua as userdata.

use std::sync::mpsc::Receiver;

use catalog_content::{
    Completion, Content, ContentConfig, CursorPosition, ItemId, KubeItemStore, MemoryTabRegistry,
    SaveOutcome, ScrollPosition, TabEdit,
};
use k8s_openapi::serde_json;
use kube::api::GroupVersionKind;
use mlua::{prelude::*, UserData, UserDataMethods};

use crate::editor_queue::{editor_queue, EditorCommand};
use crate::structs::{LoadArgs, TabEditArgs};
use crate::{current_client, runtime};

pub struct ContentSession {
    content: Content<KubeItemStore, MemoryTabRegistry>,
    commands: Receiver<EditorCommand>,
}

fn completion_str(c: Completion) -> &'static str {
    match c {
        Completion::Cleared => "cleared",
        Completion::Kept => "kept",
        Completion::Superseded => "superseded",
        Completion::Skipped => "skipped",
    }
}

fn save_str(o: SaveOutcome) -> &'static str {
    match o {
        SaveOutcome::Saved => "saved",
        SaveOutcome::Conflict => "conflict",
        SaveOutcome::Superseded => "superseded",
        SaveOutcome::Skipped => "skipped",
    }
}

fn parse_tab_edit(args: TabEditArgs) -> LuaResult<TabEdit> {
    match (args.action.as_str(), args.id) {
        ("add", _) => Ok(TabEdit::Add),
        ("remove", Some(id)) => Ok(TabEdit::Remove(ItemId::new(id))),
        ("remove", None) => Err(LuaError::RuntimeError("remove requires an id".into())),
        (other, _) => Err(LuaError::RuntimeError(format!(
            "unknown tab action: {other}"
        ))),
    }
}

impl ContentSession {
    pub fn new(config: ContentConfig) -> LuaResult<Self> {
        let store = KubeItemStore::new(current_client()?, config.field_manager.clone());
        let mut content = Content::new(store, MemoryTabRegistry::new(), config);
        let (editor, commands) = editor_queue();
        content.attach_editor(Box::new(editor));
        Ok(Self { content, commands })
    }

    fn render_json(&mut self) -> LuaResult<String> {
        self.content.sync();
        serde_json::to_string(self.content.render()).map_err(LuaError::external)
    }

    fn drain_commands(&self) -> LuaResult<String> {
        let commands: Vec<EditorCommand> = self.commands.try_iter().collect();
        serde_json::to_string(&commands).map_err(LuaError::external)
    }

    fn load(&mut self, json: String) -> LuaResult<usize> {
        let args: LoadArgs =
            serde_json::from_str(&json).map_err(|e| LuaError::external(format!("bad json: {e}")))?;
        let gvk = GroupVersionKind::gvk(&args.gvk.g, &args.gvk.v, &args.gvk.k);
        runtime()?
            .block_on(self.content.store().load(gvk, args.namespace))
            .map_err(LuaError::external)
    }
}

impl UserData for ContentSession {
    fn add_methods<M: UserDataMethods<Self>>(m: &mut M) {
        m.add_method_mut("render", |_, this, ()| this.render_json());
        m.add_method_mut("after_render", |_, this, ()| {
            this.content.after_render();
            Ok(())
        });
        m.add_method("pop_editor_commands", |_, this, ()| this.drain_commands());
        m.add_method_mut("focus", |_, this, ()| {
            this.content.focus_editor();
            Ok(())
        });
        m.add_method_mut("load", |_, this, json: String| this.load(json));

        m.add_method_mut("on_value", |_, this, yaml: String| {
            this.content.on_value(yaml);
            Ok(())
        });
        m.add_method_mut("on_cursor", |_, this, json: String| {
            let pos: CursorPosition = serde_json::from_str(&json).map_err(LuaError::external)?;
            this.content.on_cursor(pos);
            Ok(())
        });
        m.add_method_mut("on_scroll", |_, this, json: String| {
            let pos: ScrollPosition = serde_json::from_str(&json).map_err(LuaError::external)?;
            this.content.on_scroll(pos);
            Ok(())
        });

        m.add_method_mut("open", |_, this, id: String| {
            runtime()?
                .block_on(this.content.open(ItemId::new(id)))
                .map_err(LuaError::external)
        });
        m.add_method_mut("tab_edit", |_, this, json: String| {
            let args: TabEditArgs = serde_json::from_str(&json)
                .map_err(|e| LuaError::external(format!("bad json: {e}")))?;
            let edit = parse_tab_edit(args)?;
            runtime()?
                .block_on(this.content.on_tab_edit(edit))
                .map_err(LuaError::external)
        });
        m.add_method_mut("open_new", |_, this, ()| {
            runtime()?
                .block_on(this.content.open_new())
                .map_err(LuaError::external)
        });
        m.add_method_mut("close", |_, this, ()| {
            runtime()?
                .block_on(this.content.close_active())
                .map_err(LuaError::external)
        });
        m.add_method_mut("close_all", |_, this, ()| {
            runtime()?
                .block_on(this.content.close_all())
                .map_err(LuaError::external)
        });

        m.add_method_mut("save", |_, this, ()| {
            runtime()?
                .block_on(this.content.save())
                .map(save_str)
                .map_err(LuaError::external)
        });
        m.add_method_mut("reload", |_, this, ()| {
            runtime()?
                .block_on(this.content.reload())
                .map(completion_str)
                .map_err(LuaError::external)
        });
        m.add_method_mut("delete", |_, this, ()| {
            runtime()?
                .block_on(this.content.delete())
                .map(completion_str)
                .map_err(LuaError::external)
        });
    }
}

/// Create a content session. Called from Lua with an optional JSON config.
pub fn content_session(_lua: &Lua, json: Option<String>) -> LuaResult<ContentSession> {
    let config = match json {
        Some(json) => ContentConfig::from_json(&json).map_err(LuaError::external)?,
        None => ContentConfig::default(),
    };
    ContentSession::new(config)
}
