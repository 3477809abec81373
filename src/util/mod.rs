pub mod subscribe;
pub mod url_match;

pub use subscribe::Unsubscribe;
pub use url_match::{matches_any, UrlRule};
