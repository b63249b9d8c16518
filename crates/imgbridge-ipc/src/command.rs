//! Host-side commands decoded from incoming notifications.
//!
//! Image methods are one-way, so unlike a request/response bridge no variant
//! carries a reply channel.

use imgbridge_protocol::{
    method, HideImagesParams, JsonRpcRequest, ShowImageParams, UploadImageParams,
};

/// Commands sent from the socket server to the thread that owns the image store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Upload(UploadImageParams),
    Show(ShowImageParams),
    Hide(HideImagesParams),
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("invalid params for {method}: {source}")]
    InvalidParams {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HostCommand {
    /// Decode a notification addressed to `namespace`.
    pub fn from_notification(namespace: &str, req: JsonRpcRequest) -> Result<Self, RouteError> {
        let Some(op) = method::strip_namespace(namespace, &req.method) else {
            return Err(RouteError::UnknownMethod(req.method));
        };

        match op {
            method::IMG_UPLOAD => parse_params(&req.method, req.params).map(HostCommand::Upload),
            method::IMG_SHOW => parse_params(&req.method, req.params).map(HostCommand::Show),
            method::IMG_HIDE => parse_params(&req.method, req.params).map(HostCommand::Hide),
            _ => Err(RouteError::UnknownMethod(req.method.clone())),
        }
    }

    /// Operation name without namespace, for logging.
    pub fn op(&self) -> &'static str {
        match self {
            HostCommand::Upload(_) => method::IMG_UPLOAD,
            HostCommand::Show(_) => method::IMG_SHOW,
            HostCommand::Hide(_) => method::IMG_HIDE,
        }
    }
}

fn parse_params<P: serde::de::DeserializeOwned>(
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<P, RouteError> {
    serde_json::from_value(params.unwrap_or(serde_json::Value::Null)).map_err(|source| {
        RouteError::InvalidParams {
            method: method.to_string(),
            source,
        }
    })
}
