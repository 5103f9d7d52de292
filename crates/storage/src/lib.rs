pub mod db;
pub mod partner_data;
pub mod settings;

pub use db::{create_db, DbPool};
pub use partner_data::SqlitePartnerDataRepository;
pub use settings::{load_match_config, load_settings, save_setting};
