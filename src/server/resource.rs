//! Generic REST resource handlers
//!
//! One [`Resource`] implementation exposes one entity repository under the
//! conventional verb mapping:
//!
//! - `GET /{resource}`: collection read with sorting, filtering, and
//!   pagination; the `X-Total-Count` header reports the total matching
//!   count independent of pagination
//! - `GET /{resource}/{id}`: single-entity read
//! - `POST /{resource}`: insert; responds with the generated id only
//! - `PUT /{resource}/{id}`: update; echoes the updated entity
//! - `DELETE /{resource}/{id}`: delete; responds with an empty object
//!
//! Every request runs the same lifecycle: authorize (when the resource
//! implements the access-control capability), parse, invoke the repository,
//! shape the response. Failures are terminal; nothing is retried.

use crate::core::error::ApiError;
use crate::repo::EntityRepository;
use crate::server::params::parse_options;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

/// Access-control capability
///
/// A resource that returns a guard from [`Resource::guard`] has every
/// request checked before dispatch; `false` aborts with a 401. Resources
/// without a guard skip the step entirely; there is no default-deny.
pub trait AccessGuard: Send + Sync {
    /// Decide whether the caller may perform `action` on `resource`
    ///
    /// `profile` is the caller profile propagated by the authentication
    /// layer (see [`PROFILE_HEADER`]); empty when anonymous.
    fn allow(&self, resource: &str, action: &str, path: &str, profile: &str) -> bool;
}

/// One REST resource: an entity repository plus the capabilities the
/// generic handlers need
pub trait Resource: Send + Sync + 'static {
    /// The entity type served by this resource
    type Entity: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// URL path segment for the collection (e.g. `"widgets"`)
    fn resource_name(&self) -> &str;

    /// The repository backing this resource
    fn repository(&self) -> &EntityRepository<Self::Entity>;

    /// Entity-identity capability, used only for diagnostic messages on
    /// the update path
    fn entity_id(&self, entity: &Self::Entity) -> i64;

    /// Optional access-control capability
    fn guard(&self) -> Option<&dyn AccessGuard> {
        None
    }
}

/// Header carrying the caller profile, populated by the authentication
/// layer in front of the resource routes
pub const PROFILE_HEADER: &str = "x-auth-profile";

/// Build the five conventional routes for a resource
pub fn routes<R: Resource>(resource: Arc<R>) -> Router {
    let collection = format!("/{}", resource.resource_name());
    let member = format!("{}/{{id}}", collection);
    Router::new()
        .route(&collection, get(list::<R>).post(create::<R>))
        .route(
            &member,
            get(show::<R>).put(update::<R>).delete(destroy::<R>),
        )
        .with_state(resource)
}

fn caller_profile(headers: &HeaderMap) -> String {
    headers
        .get(PROFILE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn authorize<R: Resource>(
    resource: &R,
    action: &str,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    let Some(guard) = resource.guard() else {
        return Ok(());
    };
    let profile = caller_profile(headers);
    if guard.allow(resource.resource_name(), action, uri.path(), &profile) {
        return Ok(());
    }
    tracing::warn!("Access denied! Profile: {}, URL: {}", profile, uri.path());
    Err(ApiError::AccessDenied)
}

fn decode_body<T: DeserializeOwned>(entity_name: &str, body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!(
            "Error parsing {} {:?}: {}",
            entity_name,
            String::from_utf8_lossy(body),
            e
        );
        ApiError::Validation {
            message: e.to_string(),
        }
    })
}

/// `GET /{resource}`: collection read
///
/// The total matching count is computed with the same filters and reported
/// in `X-Total-Count`; a count failure only costs the header accuracy.
pub async fn list<R: Resource>(
    State(resource): State<Arc<R>>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    authorize(resource.as_ref(), "list", &uri, &headers)?;
    let options = parse_options(&params);
    let repository = resource.repository();

    let entities = repository
        .read_all(Some(&options))
        .await
        .inspect_err(|e| tracing::error!("Error reading {}: {}", repository.entity_name(), e))?;
    let total = repository.count(Some(&options)).await.unwrap_or_default();

    let mut response = Json(entities).into_response();
    response
        .headers_mut()
        .insert("x-total-count", HeaderValue::from(total));
    Ok(response)
}

/// `GET /{resource}/{id}`: single-entity read
pub async fn show<R: Resource>(
    State(resource): State<Arc<R>>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<R::Entity>, ApiError> {
    authorize(resource.as_ref(), "show", &uri, &headers)?;
    let repository = resource.repository();
    match repository.read(id).await {
        Ok(entity) => Ok(Json(entity)),
        Err(e @ ApiError::NotFound { .. }) => {
            tracing::warn!("{}", e);
            Err(e)
        }
        Err(e) => {
            tracing::error!("Error reading {} {}: {}", repository.entity_name(), id, e);
            Err(e)
        }
    }
}

/// `POST /{resource}`: insert
///
/// Responds with the generated identifier only, not the full entity.
pub async fn create<R: Resource>(
    State(resource): State<Arc<R>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(resource.as_ref(), "create", &uri, &headers)?;
    let repository = resource.repository();
    let entity: R::Entity = decode_body(repository.entity_name(), &body)?;
    let id = repository
        .save(&entity)
        .await
        .inspect_err(|e| tracing::error!("Error creating {}: {}", repository.entity_name(), e))?;
    Ok(Json(json!({ "id": id })))
}

/// `PUT /{resource}/{id}`: update
///
/// The row to update is identified by the entity's own primary key; the
/// path id only routes the request. Echoes the updated entity on success.
pub async fn update<R: Resource>(
    State(resource): State<Arc<R>>,
    Path(_id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<R::Entity>, ApiError> {
    authorize(resource.as_ref(), "update", &uri, &headers)?;
    let repository = resource.repository();
    let entity: R::Entity = decode_body(repository.entity_name(), &body)?;
    let id = resource.entity_id(&entity);
    match repository.update(&entity, &[]).await {
        Ok(()) => Ok(Json(entity)),
        Err(e @ ApiError::NotFound { .. }) => {
            tracing::warn!("{}", e);
            Err(e)
        }
        Err(e) => {
            tracing::error!("Error updating {} {}: {}", repository.entity_name(), id, e);
            Err(e)
        }
    }
}

/// `DELETE /{resource}/{id}`: delete
///
/// Responds with an empty object on success.
pub async fn destroy<R: Resource>(
    State(resource): State<Arc<R>>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(resource.as_ref(), "delete", &uri, &headers)?;
    let repository = resource.repository();
    match repository.delete(id).await {
        Ok(()) => Ok(Json(json!({}))),
        Err(e @ ApiError::NotFound { .. }) => {
            tracing::warn!("{}", e);
            Err(e)
        }
        Err(e) => {
            tracing::error!("Error deleting {} {}: {}", repository.entity_name(), id, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Gadget {
        #[serde(default)]
        id: i64,
        name: String,
    }

    struct GadgetResource {
        repository: EntityRepository<Gadget>,
        guarded: bool,
    }

    impl GadgetResource {
        fn new(guarded: bool) -> Self {
            Self {
                repository: EntityRepository::new(Arc::new(MemoryStore::new()), "gadget"),
                guarded,
            }
        }
    }

    struct AdminOnly;

    impl AccessGuard for AdminOnly {
        fn allow(&self, _resource: &str, _action: &str, _path: &str, profile: &str) -> bool {
            profile == "admin"
        }
    }

    static ADMIN_ONLY: AdminOnly = AdminOnly;

    impl Resource for GadgetResource {
        type Entity = Gadget;

        fn resource_name(&self) -> &str {
            "gadgets"
        }

        fn repository(&self) -> &EntityRepository<Gadget> {
            &self.repository
        }

        fn entity_id(&self, entity: &Gadget) -> i64 {
            entity.id
        }

        fn guard(&self) -> Option<&dyn AccessGuard> {
            if self.guarded { Some(&ADMIN_ONLY) } else { None }
        }
    }

    #[test]
    fn test_missing_guard_skips_authorization() {
        let resource = GadgetResource::new(false);
        let uri: Uri = "/gadgets".parse().unwrap();
        let headers = HeaderMap::new();
        assert!(authorize(&resource, "delete", &uri, &headers).is_ok());
    }

    #[test]
    fn test_guard_denies_without_profile() {
        let resource = GadgetResource::new(true);
        let uri: Uri = "/gadgets".parse().unwrap();
        let headers = HeaderMap::new();
        let err = authorize(&resource, "list", &uri, &headers).unwrap_err();
        assert_eq!(err, ApiError::AccessDenied);
    }

    #[test]
    fn test_guard_allows_matching_profile() {
        let resource = GadgetResource::new(true);
        let uri: Uri = "/gadgets".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(PROFILE_HEADER, HeaderValue::from_static("admin"));
        assert!(authorize(&resource, "list", &uri, &headers).is_ok());
    }

    #[test]
    fn test_caller_profile_defaults_to_empty() {
        assert_eq!(caller_profile(&HeaderMap::new()), "");
    }

    #[test]
    fn test_decode_body_maps_to_validation_error() {
        let body = Bytes::from_static(b"{not json");
        let err = decode_body::<Gadget>("gadget", &body).unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[test]
    fn test_routes_build_without_panicking() {
        let _router = routes(Arc::new(GadgetResource::new(false)));
    }
}
