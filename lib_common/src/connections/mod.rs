pub mod store_file;
pub mod store_redis;
