//! Example REST API exposing a widget catalogue backed by the in-memory
//! store
//!
//! Run with `cargo run --example widgets_api`, then try:
//!
//! ```text
//! curl 'localhost:3000/widgets?_page=1&_perPage=5&_sortField=name&_sortDir=desc'
//! curl 'localhost:3000/widgets?color=Red'
//! curl 'localhost:3000/widgets?inStock=true'
//! curl -X POST localhost:3000/widgets -H 'x-auth-profile: admin' \
//!     -d '{"name":"gear","color":"silver","stock":3,"inStock":true}'
//! ```

use chrono::{DateTime, Utc};
use restable::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Widget {
    #[serde(default)]
    id: i64,
    name: String,
    color: String,
    stock: i64,
    in_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    restocked_at: Option<DateTime<Utc>>,
}

struct WidgetResource {
    repository: EntityRepository<Widget>,
}

impl Resource for WidgetResource {
    type Entity = Widget;

    fn resource_name(&self) -> &str {
        "widgets"
    }

    fn repository(&self) -> &EntityRepository<Widget> {
        &self.repository
    }

    fn entity_id(&self, entity: &Widget) -> i64 {
        entity.id
    }

    fn guard(&self) -> Option<&dyn AccessGuard> {
        Some(&WRITES_NEED_ADMIN)
    }
}

/// Reads are public; mutations require the `admin` profile
struct WritesNeedAdmin;

impl AccessGuard for WritesNeedAdmin {
    fn allow(&self, _resource: &str, action: &str, _path: &str, profile: &str) -> bool {
        matches!(action, "list" | "show") || profile == "admin"
    }
}

static WRITES_NEED_ADMIN: WritesNeedAdmin = WritesNeedAdmin;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let mut repository = EntityRepository::<Widget>::new(store, "widget");

    // `inStock` filters as a boolean, `name` as a substring; every other
    // field falls back to the default prefix/id rules
    repository.add_filter("inStock", Arc::new(boolean_filter));
    repository.add_filter("name", Arc::new(contains_filter));

    for (name, color, stock) in [
        ("anvil", "Red", 4),
        ("bolt", "Blue", 120),
        ("crank", "red velvet", 0),
        ("dynamo", "Green", 7),
        ("escapement", "Crimson", 2),
    ] {
        let widget = Widget {
            id: 0,
            name: name.to_string(),
            color: color.to_string(),
            stock,
            in_stock: stock > 0,
            restocked_at: (stock > 0).then(Utc::now),
        };
        let id = repository.save(&widget).await?;
        tracing::info!("Seeded widget {} ({})", id, name);
    }

    let config = match std::env::var("RESTABLE_CONFIG") {
        Ok(path) => ServerConfig::from_yaml_file(&path)?,
        Err(_) => ServerConfig::default(),
    };

    ServerBuilder::new()
        .with_config(config)
        .mount(Arc::new(WidgetResource { repository }))
        .serve()
        .await
}
