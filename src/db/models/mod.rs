pub mod book;
pub mod card;
pub mod chunk;
pub mod concept;
pub mod deck;
pub mod material;
pub mod review;
