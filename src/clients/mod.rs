pub mod scryfall;
pub mod seventeen_lands;
