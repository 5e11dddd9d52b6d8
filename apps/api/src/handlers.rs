pub mod board;
pub mod health;
pub mod manifests;
pub mod performance;

#[cfg(test)]
mod tests;
