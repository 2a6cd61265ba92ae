pub mod producer;
pub mod subscriber;
