pub mod feedback;
pub mod product;
pub mod query;
pub mod recommendation;
