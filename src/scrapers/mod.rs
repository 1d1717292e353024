pub mod fixture;
pub mod rent;
pub mod rightmove;
pub mod traits;
pub mod types;

pub use fixture::FixtureSource;
pub use rightmove::RightmoveSource;
pub use traits::{ListingSource, LocationSource};
pub use types::ListingSearch;
