//! REST client store: the store contract over HTTP+JSON.

use crate::error::{Error, Result};
use crate::identity::ObjectIdentity;
use crate::object::Object;
use crate::options::{apply_options, CommonOptions, Op, OptionHolder, StoreOption};
use crate::rest;
use crate::store::{ObjectList, Store};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use uuid::Uuid;

/// Option holder with the REST client's header extension.
pub struct RestOptions {
    pub common: CommonOptions,
    pub headers: HashMap<String, String>,
}

impl OptionHolder for RestOptions {
    fn common_mut(&mut self) -> &mut CommonOptions {
        &mut self.common
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Attach a custom header to the outgoing request. Applies to every
/// operation, and only when a REST client layer processes the call.
pub fn header(key: impl Into<String>, value: impl Into<String>) -> StoreOption {
    let key = key.into();
    let value = value.into();
    StoreOption::new(
        &[Op::Get, Op::List, Op::Create, Op::Update, Op::Delete],
        move |holder| {
            let Some(opts) = holder.as_any_mut().downcast_mut::<RestOptions>() else {
                return Ok(());
            };
            if key.contains(' ') {
                return Err(Error::InvalidOption(format!("invalid header name [{key}]")));
            }
            opts.headers.insert(key.clone(), value.clone());
            Ok(())
        },
    )
}

/// Store implementation that talks to a REST server.
pub struct RestClient {
    base: Url,
    http: reqwest::Client,
    default_headers: Vec<StoreOption>,
}

impl RestClient {
    /// Build a client against a base URL. `headers` are applied to every
    /// request, before any per-call options.
    pub fn new(base_url: impl AsRef<str>, headers: Vec<StoreOption>) -> Result<Self> {
        let base = Url::parse(base_url.as_ref())
            .map_err(|e| Error::Transport(format!("invalid URL: {e}")))?;

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        tracing::debug!(target: "strata::client", base = %base, "initialized");
        Ok(Self {
            base,
            http,
            default_headers: headers,
        })
    }

    fn options(&self, opts: &[StoreOption], op: Op) -> Result<RestOptions> {
        let mut holder = RestOptions {
            common: CommonOptions::default(),
            headers: HashMap::new(),
        };
        // construction-time headers first, then per-call options
        for opt in &self.default_headers {
            opt.apply(&mut holder)?;
        }
        apply_options(&mut holder, opts, op)?;
        Ok(holder)
    }

    fn path_for_kind(&self, kind: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            kind.to_lowercase()
        )
    }

    fn path_for_identity(&self, identity: &ObjectIdentity) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            identity.path().trim_end_matches('/')
        )
    }

    fn list_parameters(common: &CommonOptions) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(order) = &common.order_by {
            params.push((rest::ORDER_BY_ARG.into(), order.clone()));
            params.push((
                rest::INCREMENTAL_ARG.into(),
                common.order_incremental.to_string(),
            ));
        }
        if common.page_offset > 0 {
            params.push((rest::PAGE_OFFSET_ARG.into(), common.page_offset.to_string()));
        }
        if common.page_size > 0 {
            params.push((rest::PAGE_SIZE_ARG.into(), common.page_size.to_string()));
        }
        if let Some(filter) = &common.prop_filter {
            params.push((
                rest::PROP_FILTER_ARG.into(),
                serde_json::to_string(filter).unwrap_or_default(),
            ));
        }
        if let Some(keys) = &common.key_filter {
            params.push((
                rest::KEY_FILTER_ARG.into(),
                serde_json::to_string(keys).unwrap_or_default(),
            ));
        }

        params
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<Value>,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<u8>> {
        let mut url = Url::parse(url).map_err(|e| Error::Transport(format!("invalid URL: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let mut header_map = HeaderMap::new();
        let origin = self.base.origin().ascii_serialization();
        header_map.insert("Origin", to_header_value(&origin)?);
        header_map.insert(
            "X-Request-ID",
            to_header_value(&Uuid::new_v4().to_string())?,
        );
        header_map.insert("Content-Type", HeaderValue::from_static("application/json"));
        header_map.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        for (k, v) in headers {
            let name: HeaderName = k
                .parse()
                .map_err(|_| Error::InvalidOption(format!("invalid header name [{k}]")))?;
            header_map.insert(name, to_header_value(v)?);
        }

        tracing::debug!(target: "strata::client", method = %method, url = %url, "request");

        let mut req = self.http.request(method, url).headers(header_map);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let data = resp.bytes().await?.to_vec();

        let envelope = envelope_message(&data);
        if !status.is_success() {
            if let Some(kind) = envelope.as_deref().and_then(Error::from_wire) {
                return Err(kind);
            }
            return Err(Error::Http {
                status: status.as_u16(),
                message: envelope.unwrap_or_default(),
            });
        }
        if let Some(message) = envelope {
            return Err(Error::from_wire(&message).unwrap_or(Error::Internal(message)));
        }

        Ok(data)
    }
}

/// Request bodies carry only the client-mutable section; the server
/// ignores everything else.
fn strip(obj: &Object) -> Value {
    json!({ "external": obj.external })
}

fn to_header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidOption(format!("invalid header value [{value}]")))
}

/// Detect a server error envelope: `{"errors": ["..."]}` or
/// `{"error": {"internal_code": N, "internal": "..."}}`.
fn envelope_message(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    let value: Value = serde_json::from_slice(data).ok()?;

    if let Some(first) = value
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
    {
        return Some(first.to_string());
    }

    let err = value.get("error")?.as_object()?;
    let code = err.get("internal_code").cloned().unwrap_or(Value::Null);
    let message = err.get("internal").and_then(Value::as_str).unwrap_or("");
    Some(format!("{code} {message}"))
}

#[async_trait]
impl Store for RestClient {
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::client", identity = %identity.path(), "get");

        let ropt = self.options(opts, Op::Get)?;
        let data = self
            .request(
                Method::GET,
                &self.path_for_identity(identity),
                &[],
                None,
                &ropt.headers,
            )
            .await?;

        serde_json::from_slice(&data).map_err(Error::from)
    }

    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList> {
        tracing::debug!(target: "strata::client", identity = %identity, "list");

        let ropt = self.options(opts, Op::List)?;
        let params = Self::list_parameters(&ropt.common);
        let data = self
            .request(
                Method::GET,
                &self.path_for_identity(identity),
                &params,
                None,
                &ropt.headers,
            )
            .await?;

        serde_json::from_slice(&data).map_err(Error::from)
    }

    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::client", kind = %obj.kind(), "create");

        let ropt = self.options(opts, Op::Create)?;
        let data = self
            .request(
                Method::POST,
                &self.path_for_kind(obj.kind()),
                &[],
                Some(strip(obj)),
                &ropt.headers,
            )
            .await?;

        serde_json::from_slice(&data).map_err(Error::from)
    }

    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object> {
        tracing::debug!(target: "strata::client", identity = %identity.path(), "update");

        let ropt = self.options(opts, Op::Update)?;
        let data = self
            .request(
                Method::PUT,
                &self.path_for_identity(identity),
                &[],
                Some(strip(obj)),
                &ropt.headers,
            )
            .await?;

        serde_json::from_slice(&data).map_err(Error::from)
    }

    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()> {
        tracing::debug!(target: "strata::client", identity = %identity.path(), "delete");

        let ropt = self.options(opts, Op::Delete)?;
        self.request(
            Method::DELETE,
            &self.path_for_identity(identity),
            &[],
            None,
            &ropt.headers,
        )
        .await?;

        Ok(())
    }
}
