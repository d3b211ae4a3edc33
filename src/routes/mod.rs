pub mod tweet;
pub mod user;

mod model;

pub use model::{ProxyResponse, TimelineQuery};
