pub mod collector;
pub mod identity;
pub mod marker;
pub mod parsers;
pub mod record;
