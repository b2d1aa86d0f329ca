//! Asset loading: models and standalone clips.
//!
//! Loading is an explicit request/response protocol. Every request carries a
//! [`RequestToken`] issued per [`LoadRole`]; the coordinator applies a
//! response only when its token is still the latest for that role, so a late
//! result from a superseded request is discarded on arrival.
//!
//! - [`ByteSource`]: where the bytes come from (memory or file)
//! - [`GltfLoader`]: decodes glTF 2.0 (`.glb` / embedded `.gltf`)
//! - [`AssetServer`]: runs reads and decodes off the render thread
//! - [`ClipLibrary`]: the uploaded and embedded clip descriptors

pub mod io;
pub mod library;
pub mod loaders;
pub mod model;
pub mod request;
pub mod server;

pub use io::ByteSource;
pub use library::{ClipDescriptor, ClipLibrary};
pub use loaders::GltfLoader;
pub use model::Model;
pub use request::{
    LoadExecutor, LoadRequest, LoadResponse, LoadRole, LoadedAsset, RequestToken, RequestTracker,
};
pub use server::AssetServer;
