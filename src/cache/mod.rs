pub mod redis;

const KEY_PREFIX: &str = "views:";

/// Cache key holding the view history of `user_id`.
pub fn cache_key(user_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, user_id)
}
