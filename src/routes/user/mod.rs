mod handler;

pub use handler::{get_user, get_user_tweets};
