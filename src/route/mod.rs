pub mod auth;
pub mod docs;
pub mod groups;
pub mod model;
pub mod posts;
pub mod users;
