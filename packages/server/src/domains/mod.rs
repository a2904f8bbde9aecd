// Business domains
pub mod crosspost;
