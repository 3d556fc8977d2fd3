pub mod auth;
pub mod config;
pub mod duration;
pub mod error;
pub mod establishments;
pub mod extract;
pub mod followers;
pub mod middleware;
pub mod password;
pub mod posts;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;
pub mod validation;

#[cfg(test)]
mod test_support;
