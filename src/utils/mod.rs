pub mod cookie;
pub mod jwt;
pub mod password;
pub mod sanitize;
pub mod slug;

pub use jwt::encode_token;
pub use password::{hash_password, verify_password};
pub use sanitize::{derive_excerpt, sanitize_html};
pub use slug::slugify;
