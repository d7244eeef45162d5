pub mod auction;
pub mod candidates;
pub mod guards;
pub mod hierarchy;
pub mod index;
pub mod marketplace;
pub mod priority;
pub mod statistics;
