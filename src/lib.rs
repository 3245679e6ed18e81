pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod pages;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;
