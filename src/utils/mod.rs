pub mod draft_store;
pub mod pagination;
