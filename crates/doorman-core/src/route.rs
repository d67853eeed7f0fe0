//! Console navigation targets.

use std::fmt;

use crate::entity::EntityKind;

/// Where the console goes next after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    List(EntityKind),
    Detail { kind: EntityKind, key: String },
    Create(EntityKind),
    Logs,
    Monitor,
    Settings,
}

impl Route {
    /// Web-console path for this route. Detail keys are percent-encoded as a
    /// single segment.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/".to_owned(),
            Self::Dashboard => "/dashboard".to_owned(),
            Self::List(kind) => format!("/{}", kind.plural()),
            Self::Detail { kind, key } => {
                // User detail pages live under the singular.
                let section = match kind {
                    EntityKind::User => "user",
                    other => other.plural(),
                };
                format!("/{section}/{}", urlencoding::encode(key))
            }
            Self::Create(kind) => format!("/{}/add", kind.plural()),
            Self::Logs => "/logging".to_owned(),
            Self::Monitor => "/monitor".to_owned(),
            Self::Settings => "/settings".to_owned(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(Route::List(EntityKind::Api).path(), "/apis");
        assert_eq!(Route::Create(EntityKind::Routing).path(), "/routings/add");
        assert_eq!(
            Route::Detail {
                kind: EntityKind::Api,
                key: "orders/v1".into()
            }
            .path(),
            "/apis/orders%2Fv1"
        );
        assert_eq!(Route::Logs.to_string(), "/logging");
    }

    #[test]
    fn user_detail_uses_singular_section() {
        let route = Route::Detail {
            kind: EntityKind::User,
            key: "ada lovelace".into(),
        };
        assert_eq!(route.path(), "/user/ada%20lovelace");
        assert_eq!(Route::List(EntityKind::User).path(), "/users");
        assert_eq!(
            Route::Detail {
                kind: EntityKind::Group,
                key: "ops".into()
            }
            .path(),
            "/groups/ops"
        );
    }
}
