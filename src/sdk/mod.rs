pub mod auth;
pub mod config;
pub mod layers;
pub mod routing;
pub mod selection;
pub mod session;
pub mod travel;
pub mod trip;
pub mod util;
