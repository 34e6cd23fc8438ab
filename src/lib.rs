pub mod cli;
pub mod config;
pub mod copy;
pub mod gopath;
pub mod ignore;
pub mod imports;
pub mod model;
pub mod resolver;
pub mod rewrite;
pub mod vendor;

mod api;

pub use api::{Vendorize, VendorizeBuilder};
