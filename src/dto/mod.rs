pub mod book;
pub mod card;
pub mod concept;
pub mod material;
pub mod review;
