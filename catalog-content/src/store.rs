use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::{BoxFuture, FutureExt};
use kube::api::{
    Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, PostParams,
    ResourceExt, TypeMeta,
};
use kube::discovery::{self, Scope};
use kube::Client;
use rayon::prelude::*;
use tracing::{info, span, warn, Instrument, Level};

use crate::error::{ContentError, Result};
use crate::item::{CatalogFlags, Item, ItemId, ItemMap, ItemPayload};

/// Remote data layer the content pane talks to. Each call performs one
/// round-trip and resolves exactly once.
pub trait ItemStore {
    fn get(&self, id: ItemId) -> BoxFuture<'_, Result<ItemPayload>>;

    fn post(&self, id: ItemId, yaml: String) -> BoxFuture<'_, Result<ItemPayload>>;

    fn put(&self, id: ItemId, yaml: String) -> BoxFuture<'_, Result<ItemPayload>>;

    fn delete(&self, id: ItemId) -> BoxFuture<'_, Result<ItemPayload>>;

    fn snapshot(&self) -> ItemMap;

    fn flags(&self) -> CatalogFlags;
}

/// Parse edited YAML into an object plus its GVK.
pub fn parse_object(yaml: &str) -> Result<(DynamicObject, GroupVersionKind)> {
    let obj: DynamicObject = serde_yaml::from_str(yaml)?;
    let gvk = obj
        .types
        .as_ref()
        .ok_or(ContentError::MissingTypes)
        .and_then(|t| {
            GroupVersionKind::try_from(t).map_err(|e| ContentError::InvalidGvk(e.to_string()))
        })?;
    Ok((obj, gvk))
}

/// Build a catalog item from a live object, stripping managed fields.
pub fn item_from_object(id: ItemId, mut obj: DynamicObject) -> Result<Item> {
    obj.metadata.managed_fields = None;
    let resource_id = obj
        .types
        .as_ref()
        .map(|t| format!("{}/{}", t.api_version, t.kind))
        .unwrap_or_default();
    Ok(Item {
        id,
        namespace: obj.namespace(),
        name: obj.metadata.name.clone(),
        loading: false,
        yaml: serde_yaml::to_string(&obj)?,
        resource_id,
    })
}

fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409)
}

/// Result of a replace round-trip once a 409 has been told apart from
/// other failures.
#[derive(Debug)]
enum Replaced {
    Applied(DynamicObject),
    Conflict,
}

fn classify_replace(result: kube::Result<DynamicObject>) -> Result<Replaced> {
    match result {
        Ok(obj) => Ok(Replaced::Applied(obj)),
        Err(e) if is_conflict(&e) => Ok(Replaced::Conflict),
        Err(e) => Err(e.into()),
    }
}

/// Item store backed by the Kubernetes API through `DynamicObject`.
#[derive(Clone)]
pub struct KubeItemStore {
    client: Client,
    items: Arc<RwLock<ItemMap>>,
    loading_stage: Arc<AtomicBool>,
    field_manager: String,
}

impl KubeItemStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            items: Arc::new(RwLock::new(ItemMap::new())),
            loading_stage: Arc::new(AtomicBool::new(false)),
            field_manager: field_manager.into(),
        }
    }

    fn write_items<R>(&self, f: impl FnOnce(&mut ItemMap) -> R) -> R {
        let mut items = match self.items.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut items)
    }

    fn canonical(&self, id: &ItemId) -> Result<String> {
        let items = match self.items.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        items
            .get(id)
            .map(|item| item.yaml.clone())
            .ok_or_else(|| ContentError::UnknownItem(id.clone()))
    }

    fn set_loading(&self, id: &ItemId, loading: bool) {
        self.write_items(|items| {
            if let Some(item) = items.get_mut(id) {
                item.loading = loading;
            }
        });
    }

    fn store_item(&self, item: Item) -> Item {
        self.write_items(|items| items.insert(item.id.clone(), item.clone()));
        item
    }

    async fn api_for(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<(Api<DynamicObject>, ApiResource)> {
        let (ar, caps) = discovery::pinned_kind(&self.client, gvk).await?;
        let api = match (namespace, caps.scope) {
            (Some(ns), Scope::Namespaced) => Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => Api::all_with(self.client.clone(), &ar),
        };
        Ok((api, ar))
    }

    async fn fetch(&self, id: ItemId, yaml: &str) -> Result<Item> {
        let (obj, gvk) = parse_object(yaml)?;
        let name = obj.metadata.name.clone().ok_or(ContentError::MissingName)?;
        let (api, ar) = self.api_for(&gvk, obj.metadata.namespace.as_deref()).await?;
        let mut live = api.get(&name).await?;
        if live.types.is_none() {
            live.types = Some(TypeMeta {
                api_version: ar.api_version.clone(),
                kind: ar.kind.clone(),
            });
        }
        item_from_object(id, live)
    }

    /// List one kind into the catalog. The loading-stage flag is raised for
    /// the duration of the call.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, gvk: GroupVersionKind, namespace: Option<String>) -> Result<usize> {
        self.loading_stage.store(true, Ordering::Release);
        let result = self.load_inner(&gvk, namespace.as_deref()).await;
        self.loading_stage.store(false, Ordering::Release);
        result
    }

    async fn load_inner(&self, gvk: &GroupVersionKind, namespace: Option<&str>) -> Result<usize> {
        let (api, ar) = self.api_for(gvk, namespace).await?;
        let list = api
            .list(&ListParams::default())
            .instrument(span!(Level::INFO, "load.list", kind = %gvk.kind))
            .await?;

        let loaded: Vec<Item> = list
            .items
            .into_par_iter()
            .filter_map(|mut obj| {
                if obj.types.is_none() {
                    obj.types = Some(TypeMeta {
                        api_version: ar.api_version.clone(),
                        kind: ar.kind.clone(),
                    });
                }
                let id = ItemId::new(obj.uid().unwrap_or_else(|| obj.name_any()));
                item_from_object(id, obj).ok()
            })
            .collect();

        let count = loaded.len();
        self.write_items(|items| {
            for item in loaded {
                items.insert(item.id.clone(), item);
            }
        });
        info!(kind = %gvk.kind, count, "catalog loaded");
        Ok(count)
    }
}

impl ItemStore for KubeItemStore {
    #[tracing::instrument(skip(self))]
    fn get(&self, id: ItemId) -> BoxFuture<'_, Result<ItemPayload>> {
        async move {
            let yaml = self.canonical(&id)?;
            self.set_loading(&id, true);
            let fetched = self.fetch(id.clone(), &yaml).await;
            self.set_loading(&id, false);
            Ok(ItemPayload::item(self.store_item(fetched?)))
        }
        .boxed()
    }

    #[tracing::instrument(skip(self, yaml))]
    fn post(&self, id: ItemId, yaml: String) -> BoxFuture<'_, Result<ItemPayload>> {
        async move {
            let (obj, gvk) = parse_object(&yaml)?;
            let (api, _ar) = self.api_for(&gvk, obj.metadata.namespace.as_deref()).await?;
            let pp = PostParams {
                field_manager: Some(self.field_manager.clone()),
                ..Default::default()
            };
            let created = api.create(&pp, &obj).await?;
            let item = item_from_object(id, created)?;
            info!(name = ?item.name, "item created");
            Ok(ItemPayload::item(self.store_item(item)))
        }
        .boxed()
    }

    #[tracing::instrument(skip(self, yaml))]
    fn put(&self, id: ItemId, yaml: String) -> BoxFuture<'_, Result<ItemPayload>> {
        async move {
            let (obj, gvk) = parse_object(&yaml)?;
            let name = obj.name_any();
            let (api, _ar) = self.api_for(&gvk, obj.metadata.namespace.as_deref()).await?;
            let pp = PostParams {
                field_manager: Some(self.field_manager.clone()),
                ..Default::default()
            };

            self.set_loading(&id, true);
            let replaced = api.replace(&name, &pp, &obj).await;
            self.set_loading(&id, false);

            match classify_replace(replaced)? {
                Replaced::Applied(obj) => Ok(ItemPayload::item(
                    self.store_item(item_from_object(id, obj)?),
                )),
                Replaced::Conflict => {
                    warn!(%name, "replace conflicted with a newer revision");
                    let canonical = self.canonical(&id)?;
                    let fresh = self.fetch(id, &canonical).await?;
                    Ok(ItemPayload::conflict(Some(self.store_item(fresh))))
                }
            }
        }
        .boxed()
    }

    #[tracing::instrument(skip(self))]
    fn delete(&self, id: ItemId) -> BoxFuture<'_, Result<ItemPayload>> {
        async move {
            let yaml = self.canonical(&id)?;
            let (obj, gvk) = parse_object(&yaml)?;
            let name = obj.name_any();
            let (api, ar) = self.api_for(&gvk, obj.metadata.namespace.as_deref()).await?;

            self.set_loading(&id, true);
            let deleted = api.delete(&name, &DeleteParams::default()).await;
            if let Err(e) = deleted {
                self.set_loading(&id, false);
                return Err(e.into());
            }
            self.write_items(|items| items.remove(&id));
            info!("{}/{} deleted", ar.plural, name);
            Ok(ItemPayload::gone())
        }
        .boxed()
    }

    fn snapshot(&self) -> ItemMap {
        match self.items.read() {
            Ok(items) => items.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn flags(&self) -> CatalogFlags {
        CatalogFlags {
            loading_stage: self.loading_stage.load(Ordering::Acquire),
        }
    }
}
