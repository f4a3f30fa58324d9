// Processing: label cleaning and the population/air-quality join

pub mod normalize;
pub mod reconcile;

pub use normalize::{join_key, normalize_name};
pub use reconcile::{reconcile, Reconciliation};
