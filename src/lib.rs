
pub mod config;
pub mod constants;
pub mod geodesy;
pub mod interpolate;
pub mod net;
pub mod output;
pub mod ranking;
pub mod session;
pub mod store;
pub mod validate;
