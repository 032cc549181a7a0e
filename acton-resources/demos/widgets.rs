//! Widgets API Example - Generic Resources
//!
//! This example demonstrates:
//! - A list+create resource backed by an in-memory store
//! - Pagination bounds taken from configuration
//! - Path parameters narrowing a list resource
//! - A hand-written view guarded by a permission class
//!
//! Run with: cargo run --example widgets
//! (add `--features openapi` to serve Swagger UI at /swagger-ui)
//!
//! The service runs on port 8080 by default (configurable via ACTON_SERVICE__PORT env var)
//!
//! Test with:
//!   curl http://localhost:8080/widgets
//!   curl -X POST -H 'content-type: application/json' -d '{"name": "sprocket"}' http://localhost:8080/widgets
//!   curl 'http://localhost:8080/widgets?offset=0&limit=5'
//!   curl http://localhost:8080/widgets/named/sprocket
//!   curl http://localhost:8080/widgets/count   # 401, needs an authenticated caller

use acton_resources::prelude::*;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
struct Widget {
    id: Option<u64>,
    name: String,
    colour: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateWidget {
    name: String,
    #[serde(default = "default_colour")]
    colour: String,
}

fn default_colour() -> String {
    "grey".to_string()
}

impl Model for Widget {
    type Args = CreateWidget;
    const NAME: &'static str = "widget";

    fn from_args(args: CreateWidget) -> Self {
        Widget {
            id: None,
            name: args.name,
            colour: args.colour,
        }
    }

    fn primary_key(&self) -> Option<u64> {
        self.id
    }

    fn set_primary_key(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}

fn descriptor(store: &InMemoryStore<Widget>) -> ResourceDescriptor<Widget> {
    ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
        .with_model(store.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let store = InMemoryStore::<Widget>::new();
    let pagination = PaginationParameters::from_config(&config.pagination);

    let mut ns = Namespace::new("widgets").with_description("Widget catalogue");

    // GET /widgets, POST /widgets
    ns.add_resource(
        "/",
        ListCreateResource::new(descriptor(&store).with_pagination(pagination))?,
    )?;

    // GET /widgets/named/{name}
    ns.add_resource("/named/{name}", ListResource::new(descriptor(&store))?)?;

    // GET /widgets/count
    let count = ResourceView::new(
        descriptor(&store).with_permission(permission_class(|| Authenticated)),
    )
    .on(Verb::Get, |descriptor, _ctx| async move {
        let count = descriptor
            .queryset()
            .map_err(|e| ApiError::from_contract(ApiOperation::List, e))?
            .count()
            .await
            .map_err(|e| ApiError::from_repository(ApiOperation::List, e))?;
        Ok::<_, ApiError>(Reply::ok(json!({ "count": count })))
    });
    ns.add_resource("/count", count)?;

    for path in ns.paths() {
        tracing::info!("Registered {}", path);
    }

    #[cfg(feature = "openapi")]
    let app = {
        let openapi = OpenApiBuilder::from_documentation(&ns.documentation())
            .title("Widget API")
            .build();
        ns.router().merge(SwaggerUI::with_spec("/swagger-ui", openapi))
    };

    #[cfg(not(feature = "openapi"))]
    let app = ns.router();

    Server::new(config).serve(app).await?;

    shutdown_tracing();
    Ok(())
}
