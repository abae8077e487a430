use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

document_id!(
    /// Login account identifier.
    UserId,
    "usr"
);
document_id!(StudentId, "stu");
document_id!(CompanyId, "cmp");
document_id!(TpoId, "tpo");
document_id!(JobId, "job");
document_id!(
    /// Identifier wrapper for submitted applications.
    ApplicationId,
    "app"
);
document_id!(NotificationId, "ntf");
document_id!(QuestionSetId, "qset");
document_id!(QuestionId, "qst");
document_id!(TestSessionId, "tst");

impl ApplicationId {
    /// Human facing reference such as `APP-3F9A1C`.
    pub fn application_number(&self) -> String {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(6)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("APP-{}", tail.to_ascii_uppercase())
    }
}
