//! Request handlers.
//!
//! Three route shapes: `/{kind}` (and `/{kind}/`) for type-scoped List and
//! Create, `/{kind}/{pkey}` for object operations, and `/id/{token}` for
//! identity-scoped operations. The token route resolves the stored object
//! first to learn its kind, then enforces that kind's method allow-list.

use crate::error::{Result, ServerError};
use crate::query;
use crate::{Action, AppState};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use std::collections::HashMap;
use strata_store::{Error, Object, ObjectIdentity};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/id/{token}", any(id_handler))
        .route("/{kind}", any(kind_handler))
        .route("/{kind}/", any(kind_handler))
        .route("/{kind}/{pkey}", any(object_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn check_allowed(state: &AppState, kind: &str, action: Action) -> Result<()> {
    match state.exposed.get(&kind.to_lowercase()) {
        Some(actions) if actions.contains(&action) => Ok(()),
        _ => Err(ServerError::method_not_allowed()),
    }
}

fn parse_body(state: &AppState, kind: &str, body: &Bytes) -> Result<Object> {
    state
        .schema
        .object_from_json(kind, body)
        .map_err(|e| ServerError::bad_request(&e))
}

/// `GET /{kind}` lists, `POST /{kind}` creates.
async fn kind_handler(
    State(state): State<AppState>,
    method: Method,
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response> {
    tracing::debug!(method = %method, kind = %kind, "type request");

    if !state.exposed.contains_key(&kind.to_lowercase()) {
        return Err(ServerError::not_found(&Error::UnknownKind(kind)));
    }

    match method {
        Method::GET => {
            check_allowed(&state, &kind, Action::Get)?;
            let opts =
                query::list_options(&params).map_err(|e| ServerError::bad_request(&e))?;
            let ret = state
                .store
                .list(&ObjectIdentity::kind_scope(&kind), &opts)
                .await
                .map_err(|e| ServerError::bad_request(&e))?;
            Ok(Json(ret).into_response())
        }
        Method::POST => {
            check_allowed(&state, &kind, Action::Create)?;
            let obj = parse_body(&state, &kind, &body)?;
            let ret = state
                .store
                .create(&obj, &[])
                .await
                .map_err(|e| ServerError::not_acceptable(&e))?;
            Ok(Json(ret).into_response())
        }
        _ => Err(ServerError::method_not_allowed()),
    }
}

/// Object operations addressed by `kind/primary-key`.
async fn object_handler(
    State(state): State<AppState>,
    method: Method,
    Path((kind, pkey)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response> {
    tracing::debug!(method = %method, kind = %kind, pkey = %pkey, "object request");

    if !state.exposed.contains_key(&kind.to_lowercase()) {
        return Err(ServerError::not_found(&Error::UnknownKind(kind)));
    }
    let action = Action::from_method(&method).ok_or_else(ServerError::method_not_allowed)?;
    check_allowed(&state, &kind, action)?;

    let identity = ObjectIdentity::of_kind(&kind, &pkey);
    dispatch(&state, &method, &identity, &kind, &body).await
}

/// Object operations addressed by identity token.
async fn id_handler(
    State(state): State<AppState>,
    method: Method,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Response> {
    tracing::debug!(method = %method, token = %token, "identity request");

    let identity = ObjectIdentity::from(token.as_str());

    // resolve the token to learn the kind, then apply its allow-list
    let existing = state.store.get(&identity, &[]).await.ok();
    let kind = match &existing {
        Some(obj) => {
            let action =
                Action::from_method(&method).ok_or_else(ServerError::method_not_allowed)?;
            check_allowed(&state, obj.kind(), action)?;
            obj.kind().to_string()
        }
        None => String::new(),
    };

    dispatch(&state, &method, &identity, &kind, &body).await
}

async fn dispatch(
    state: &AppState,
    method: &Method,
    identity: &ObjectIdentity,
    kind: &str,
    body: &Bytes,
) -> Result<Response> {
    match *method {
        Method::GET => {
            let ret = state
                .store
                .get(identity, &[])
                .await
                .map_err(|e| ServerError::not_found(&e))?;
            Ok(Json(ret).into_response())
        }
        Method::POST => {
            if kind.is_empty() {
                return Err(ServerError::not_acceptable(&Error::NoSuchObject));
            }
            let obj = parse_body(state, kind, body)?;
            let ret = state
                .store
                .create(&obj, &[])
                .await
                .map_err(|e| ServerError::not_acceptable(&e))?;
            Ok(Json(ret).into_response())
        }
        Method::PUT => {
            if kind.is_empty() {
                return Err(ServerError::not_acceptable(&Error::NoSuchObject));
            }
            let obj = parse_body(state, kind, body)?;
            let ret = state
                .store
                .update(identity, &obj, &[])
                .await
                .map_err(|e| ServerError::not_acceptable(&e))?;
            Ok(Json(ret).into_response())
        }
        Method::DELETE => {
            state
                .store
                .delete(identity, &[])
                .await
                .map_err(|e| ServerError::not_found(&e))?;
            Ok(().into_response())
        }
        _ => Err(ServerError::method_not_allowed()),
    }
}
