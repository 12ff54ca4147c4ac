pub mod app;
pub mod cli;
pub mod config;
pub mod directory;
pub mod output;
pub mod proxy;
pub mod server;

#[cfg(test)]
mod tests;
