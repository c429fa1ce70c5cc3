pub mod books;
pub mod cards;
pub mod concepts;
pub mod decks;
pub mod generate;
pub mod health;
pub mod materials;
pub mod reviews;
