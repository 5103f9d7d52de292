pub mod config;
pub mod keyword;
pub mod match_result;
pub mod partner;
pub mod repository;

pub use config::{ConfigError, MatchConfig, SettingsSource};
pub use keyword::{
    Keyword, KeywordRejection, KeywordRules, DEFAULT_MIN_KEYWORD_LENGTH, DEFAULT_STOPWORDS,
};
pub use match_result::KeywordMatch;
pub use partner::{KeywordAggregate, KeywordFrequency, PartnerData, PartnerRef, PartnerType};
pub use repository::{PartnerDataRepository, RepositoryError};
