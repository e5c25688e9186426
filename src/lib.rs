//! # routegen
//!
//! **routegen** scans annotated handler methods in a crate's source tree and
//! generates the glue that registers them on a dispatch table, together with
//! an [OpenAPI 3.1](https://spec.openapis.org/oas/v3.1.0) description of the
//! resulting API.
//!
//! ## Overview
//!
//! A handler is an inherent method with a receiver, at least one typed input
//! and exactly one result, annotated either with a tag block
//!
//! ```rust,ignore
//! impl PetController {
//!     // get_pet Fetch one pet
//!     // @URL /pets/:id
//!     // @Method get
//!     fn get_pet(&self, id: Path<i64>) -> JsonResponse<Pet> { .. }
//! }
//! ```
//!
//! or a one-line directive (`//routegen:api GET /pets/:id`). Running
//! `routegen generate` writes `routegen_gen.rs` next to the entry file. Each
//! input type is a [`Binder`] that extracts itself from the request, and each
//! result type is a [`Responder`] that writes itself to the response.
//!
//! ## Architecture
//!
//! - **[`scanner`]** - comment grammars, type resolution and the route table
//! - **[`generator`]** - askama rendering, format pass and atomic output
//! - **[`config`]** - manifest metadata, flag overrides and path validation
//! - **[`binding`]** - request binders (`Path`, `Query`, `Header`, `Form`, `Json`, raw access)
//! - **[`response`]** - the response writer and built-in responders
//! - **[`dispatch`]** - the runtime table generated code registers into
//! - **[`openapi`]** - schemas from `utoipa::ToSchema` and document synthesis
//! - **[`cli`]** / **[`logging`]** - the `routegen` binary's front end
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as routegen generate
//!     participant Config as config::GenerateConfig
//!     participant Scan as scanner::scan
//!     participant Gen as generator
//!     participant FS as File System
//!
//!     CLI->>Config: resolve(root, overrides)
//!     Config-->>CLI: paths, grammar, crate prefix
//!     CLI->>Scan: walk handler dir
//!     Scan->>Scan: comment groups → annotations
//!     Scan->>Scan: impl methods → HandlerSpec
//!     Scan-->>Gen: RouteTable
//!     Gen->>Gen: askama render + prettyplease
//!     Gen->>FS: write routegen_gen.rs (atomic)
//! ```
//!
//! ## Runtime
//!
//! ```rust,ignore
//! mod routegen_gen;
//!
//! let mut table = routegen::DispatchTable::new();
//! routegen_gen::register_pet_controller(&mut table, Arc::new(PetController::default()))?;
//! let response = table.handle(request);
//! let doc = routegen_gen::api_document("Pets", "1.0.0");
//! ```

pub mod binding;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod logging;
pub mod openapi;
pub mod response;
pub mod scanner;

pub use binding::{
    bind, BindRequest, Binder, Form, Header, Json, Path, Query, RawRequest, RawResponse,
    RequestHead, ScalarKind, ScalarValue, ValidationError,
};
pub use dispatch::{join_path, DispatchError, DispatchTable, RouteInfo};
pub use error::GenerateError;
pub use openapi::{ApiDocument, ApiSchema, OperationDoc};
pub use response::{JsonResponse, Responder, ResponseWriter, StreamResponse};
