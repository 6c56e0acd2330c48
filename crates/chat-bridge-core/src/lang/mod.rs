pub mod catalog;

pub use catalog::{
    Language, LanguagePair, all_languages, display_name, is_valid_pair, target_languages,
};
