//! Operation handlers, one module per resource family.
//!
//! Handlers take decoded arguments and return [`LocalResult`](crate::error::LocalResult);
//! the [`Boundary`](uplink_sys::Boundary) impl in `provider` does the
//! marshalling on either side.

mod access;
mod bucket;
mod edge;
mod list;
mod multipart;
mod object;

pub(crate) use edge::join_share_url;
pub(crate) use list::ListOptions;
