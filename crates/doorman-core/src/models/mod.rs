//! Typed records for the five managed resource families.
//!
//! Each record mirrors the management API's JSON shape field for field and
//! implements [`Entity`](crate::entity::Entity).

mod api;
mod group;
mod role;
mod routing;
mod user;

pub use api::Api;
pub use group::Group;
pub use role::Role;
pub use routing::Routing;
pub use user::User;

/// Number of items as a sort key.
pub(crate) fn count<T>(items: &[T]) -> crate::entity::SortKey {
    crate::entity::SortKey::Count(u64::try_from(items.len()).unwrap_or(u64::MAX))
}
