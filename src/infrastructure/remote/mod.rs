mod http_remote_store;

pub use http_remote_store::HttpRemoteStore;
