//! Common values accepted by the 17Lands query parameters.

pub mod event_types {
    pub const PREMIER_DRAFT: &str = "PremierDraft";
    pub const TRADITIONAL_DRAFT: &str = "TradDraft";
    pub const QUICK_DRAFT: &str = "QuickDraft";
    pub const SEALED: &str = "Sealed";
    pub const TRADITIONAL_SEALED: &str = "TradSealed";
    pub const CUBE_DRAFT: &str = "CubeDraft";
}

pub mod player_tiers {
    pub const TOP: &str = "top";
    pub const MIDDLE: &str = "middle";
    pub const BOTTOM: &str = "bottom";
}

pub mod rarities {
    pub const COMMON: &str = "common";
    pub const UNCOMMON: &str = "uncommon";
    pub const RARE: &str = "rare";
    pub const MYTHIC: &str = "mythic";
}

pub mod colors {
    pub const COLORLESS: &str = "Colorless";
    pub const MULTICOLOR: &str = "Multicolor";
    pub const WHITE: &str = "W";
    pub const BLUE: &str = "U";
    pub const BLACK: &str = "B";
    pub const RED: &str = "R";
    pub const GREEN: &str = "G";

    pub const AZORIUS: &str = "WU";
    pub const ORZHOV: &str = "WB";
    pub const BOROS: &str = "WR";
    pub const SELESNYA: &str = "WG";
    pub const DIMIR: &str = "UB";
    pub const IZZET: &str = "UR";
    pub const SIMIC: &str = "UG";
    pub const RAKDOS: &str = "BR";
    pub const GOLGARI: &str = "BG";
    pub const GRUUL: &str = "RG";

    pub const ESPER: &str = "WUB";
    pub const JESKAI: &str = "WUR";
    pub const BANT: &str = "WUG";
    pub const MARDU: &str = "WBR";
    pub const ABZAN: &str = "WBG";
    pub const NAYA: &str = "WRG";
    pub const GRIXIS: &str = "UBR";
    pub const SULTAI: &str = "UBG";
    pub const TEMUR: &str = "URG";
    pub const JUND: &str = "BRG";

    pub const WUBRG: &str = "WUBRG";
}
