//! Built-in interceptors.
//!
//! `Auth`, `ContentType` and `RefreshAuth` are attached to every client at
//! construction time; the response-shaping ones (`FormatUser`, `MapIncluded`,
//! `RemoveLinks`) are meant to be passed per call through
//! [`RequestConfig`](crate::RequestConfig).

mod auth;
mod content_type;
mod format_user;
mod map_included;
mod refresh_auth;
mod remove_links;

pub use auth::AuthInterceptor;
pub use content_type::ContentTypeInterceptor;
pub use format_user::FormatUserInterceptor;
pub use map_included::MapIncludedInterceptor;
pub use refresh_auth::RefreshAuthInterceptor;
pub use remove_links::RemoveLinksInterceptor;
