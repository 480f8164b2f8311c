pub mod config;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod startup;

#[cfg(test)]
pub(crate) mod test_support;
