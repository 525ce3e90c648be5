pub mod adapters;
pub mod payload;
pub mod placements;
pub mod targeting;
