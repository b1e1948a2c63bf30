pub mod agent;
pub mod object_store;
