mod handler;

pub use handler::get_tweet;
