mod connection_pool;
mod pending_queue;

pub use connection_pool::ConnectionPool;
pub use pending_queue::SqlitePendingQueue;
