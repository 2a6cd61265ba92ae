pub mod scylladb;
