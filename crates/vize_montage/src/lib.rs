//! # vize_montage
//!
//! Montage - The assembly stage of Vize build tooling.
//! Bundler plugin pipeline for Vue.js Single File Components.
//!
//! ## Name Origin
//!
//! **Montage** (/mɒnˈtɑːʒ/) is the art of building one picture out of many
//! separately made pieces. `vize_montage` cuts a `.vue` file into script,
//! template and style fragments, sends each through its own compiler, and
//! assembles the results back into modules a bundler can link.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------------+
//! |                       vize_montage                         |
//! +-----------------------------------------------------------+
//! |                                                            |
//! |  +----------------+   hooks    +-------------------------+ |
//! |  | MontagePlugin  |----------->| HookRegistry (host)     | |
//! |  | - defines      |            | - on_resolve / on_load  | |
//! |  | - alias rules  |            | - on_start / on_end     | |
//! |  +----------------+            +-------------------------+ |
//! |          |                                                 |
//! |          v                                                 |
//! |  +----------------+     +------------------------------+   |
//! |  | ModuleRouter   |<--->| AsyncCache (single-flight)   |   |
//! |  | - stub         |     +------------------------------+   |
//! |  | - script       |     +------------------------------+   |
//! |  | - template     |<--->| ContextRegistry / ScopeIds   |   |
//! |  | - style        |     +------------------------------+   |
//! |  +----------------+                                        |
//! |          |                                                 |
//! |          v                                                 |
//! |  +------------------------------------------------------+  |
//! |  | Compilers: Sfc / Template / Style / Markup / Pug     |  |
//! |  +------------------------------------------------------+  |
//! |                                                            |
//! +-----------------------------------------------------------+
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use vize_montage::{load_config, BuildOptions, MontagePlugin};
//!
//! let mut build = BuildOptions::new(std::env::current_dir()?);
//! let plugin = MontagePlugin::new(load_config(None), compilers);
//! let router = plugin.setup(&mut build, &mut host).await?;
//! ```

pub mod alias;
pub mod cache;
pub mod compilers;
pub mod context;
pub mod descriptor;
pub mod diagnostic;
pub mod directive;
mod error;
pub mod fs;
pub mod options;
pub mod plugin;
pub mod report;
pub mod router;
pub mod scope_id;
pub mod virtual_path;

pub use alias::{AliasPolicy, AliasResolver, AliasRule};
pub use cache::AsyncCache;
pub use compilers::{
    Compilers, MarkupTransformer, SfcCompiler, StyleCompiler, TemplateCompiler,
    TemplatePreprocessor,
};
pub use descriptor::{ScriptFragment, ScriptLang, SourceDocument, StyleFragment, TemplateFragment};
pub use diagnostic::{map_location, FragmentLocation, Location, Message};
pub use directive::{DirectiveTransform, DirectiveTransforms};
pub use error::{MontageError, MontageResult};
pub use fs::{FileSystem, MemoryFs, NativeFs};
pub use options::{load_config, MontageOptions};
pub use plugin::{BuildOptions, HookRegistry, MontagePlugin};
pub use report::{BuildEndReporter, BuildResult, HtmlGenerator};
pub use router::{LoadResult, Loader, ModuleRouter, ResolveArgs, RouterConfig};
pub use scope_id::{ScopeId, ScopeIdGenerator};
pub use virtual_path::{Namespace, VirtualModuleRequest};
