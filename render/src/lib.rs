//! Composable renderers that turn a [`Report`](topoview_core::Report) into
//! the node graphs of each view.

mod combinators;
pub mod diff;
pub mod filters;
pub mod join;
pub mod known_services;
pub mod mapping;
pub mod memoise;
pub mod networks;
pub mod renderer;
pub mod views;
pub mod volumes;

pub use diff::{diff, Diff};
pub use filters::FilterFunc;
pub use memoise::{RenderCache, RenderCacheConfig};
pub use networks::local_networks;
pub use renderer::{MapFunc, RenderContext, Rendered, Renderer, Stats};
pub use views::Views;
