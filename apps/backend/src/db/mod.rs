pub mod locks;
pub mod txn;
