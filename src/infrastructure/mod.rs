pub mod auth;
pub mod capture;
pub mod database;
pub mod handoff;
pub mod media;
pub mod remote;
