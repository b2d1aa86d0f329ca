use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::assets::io::ByteSource;
use crate::assets::loaders::GltfLoader;
use crate::assets::model::Model;
use crate::errors::AssetError;

/// What a load request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadRole {
    Model,
    Clip,
}

/// Identifies one issued request within its role. Monotonic per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub u64);

/// Issues tokens and remembers the latest one per role.
///
/// A response is applied only when its token is still current; anything
/// older was superseded by a later selection and is dropped.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next: u64,
    model: Option<RequestToken>,
    clip: Option<RequestToken>,
}

impl RequestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token for `role`, superseding any pending one.
    pub fn issue(&mut self, role: LoadRole) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        *self.slot_mut(role) = Some(token);
        token
    }

    #[must_use]
    pub fn is_current(&self, role: LoadRole, token: RequestToken) -> bool {
        self.slot(role) == Some(token)
    }

    /// Marks `token` as answered. Returns `false` for stale tokens.
    pub fn complete(&mut self, role: LoadRole, token: RequestToken) -> bool {
        if self.is_current(role, token) {
            *self.slot_mut(role) = None;
            true
        } else {
            false
        }
    }

    /// Forgets the pending request of `role`; its response will be dropped.
    pub fn invalidate(&mut self, role: LoadRole) {
        *self.slot_mut(role) = None;
    }

    /// Token still awaiting a response, if any.
    #[must_use]
    pub fn pending(&self, role: LoadRole) -> Option<RequestToken> {
        self.slot(role)
    }

    fn slot(&self, role: LoadRole) -> Option<RequestToken> {
        match role {
            LoadRole::Model => self.model,
            LoadRole::Clip => self.clip,
        }
    }

    fn slot_mut(&mut self, role: LoadRole) -> &mut Option<RequestToken> {
        match role {
            LoadRole::Model => &mut self.model,
            LoadRole::Clip => &mut self.clip,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub role: LoadRole,
    pub token: RequestToken,
    /// Model label or clip name the request was issued for.
    pub name: String,
    pub source: ByteSource,
}

#[derive(Debug)]
pub enum LoadedAsset {
    Model(Box<Model>),
    Clip(Arc<AnimationClip>),
}

#[derive(Debug)]
pub struct LoadResponse {
    pub role: LoadRole,
    pub token: RequestToken,
    pub name: String,
    pub result: Result<LoadedAsset, AssetError>,
}

impl LoadResponse {
    fn from_request(request: &LoadRequest, result: Result<LoadedAsset, AssetError>) -> Self {
        Self {
            role: request.role,
            token: request.token,
            name: request.name.clone(),
            result,
        }
    }
}

/// Runs load requests somewhere and hands back their responses.
///
/// [`AssetServer`](crate::assets::AssetServer) runs them on a tokio runtime;
/// tests can queue requests and answer them in any order.
pub trait LoadExecutor {
    fn submit(&self, request: LoadRequest);

    /// Responses that arrived since the last call, in arrival order.
    fn drain(&self) -> Vec<LoadResponse>;
}

/// Decodes already-read bytes according to the request's role.
pub fn decode_request(request: &LoadRequest, bytes: &[u8]) -> LoadResponse {
    let label = request.source.label();
    let result = match request.role {
        LoadRole::Model => {
            GltfLoader::load_model(bytes, &label).map(|model| LoadedAsset::Model(Box::new(model)))
        }
        LoadRole::Clip => GltfLoader::load_clip(bytes, &label)
            .map(|clip| LoadedAsset::Clip(Arc::new(clip.with_name(request.name.clone())))),
    };
    LoadResponse::from_request(request, result)
}

/// Reads and decodes on the calling thread.
pub fn execute_blocking(request: &LoadRequest) -> LoadResponse {
    match request.source.read_bytes_blocking() {
        Ok(bytes) => decode_request(request, &bytes),
        Err(e) => LoadResponse::from_request(request, Err(e)),
    }
}

/// Wraps a failure that happened before decoding started.
pub(crate) fn failed_response(request: &LoadRequest, error: AssetError) -> LoadResponse {
    LoadResponse::from_request(request, Err(error))
}
