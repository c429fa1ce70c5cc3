pub mod ai;
pub mod chunker;
pub mod pdf;
pub mod scheduler;
pub mod storage;
pub mod study;
