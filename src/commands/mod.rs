pub mod seasons;
pub mod series;
pub mod summary;
