pub mod error;
pub mod extractor;
pub mod matching;
pub mod partner_data;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::MatchError;
pub use extractor::KeywordExtractor;
pub use matching::KeywordMatchingService;
pub use partner_data::PartnerDataService;
