use counterparty_core::config::{CONFIDENCE_THRESHOLD_KEY, STOPWORDS_KEY};
use counterparty_core::{PartnerDataRepository, PartnerRef, PartnerType};
use counterparty_match::{KeywordMatchingService, MatchError, PartnerDataService};
use counterparty_storage::{create_db, load_match_config, save_setting, SqlitePartnerDataRepository};
use std::sync::Arc;

const CUSTOMER: PartnerType = PartnerType(2);
const SUPPLIER: PartnerType = PartnerType(3);

async fn store() -> (tempfile::TempDir, Arc<SqlitePartnerDataRepository>) {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_db(&dir.path().join("ledger.db")).await.unwrap();
    (dir, Arc::new(SqlitePartnerDataRepository::new(pool)))
}

#[tokio::test]
async fn learned_memos_drive_suggestions() {
    let (_dir, repo) = store().await;
    let config = load_match_config(repo.pool()).await.unwrap();
    let writer = PartnerDataService::new(repo.clone(), &config);
    let matcher = KeywordMatchingService::new(repo.clone(), config);

    let shoppers = PartnerRef::new(10, SUPPLIER, 0);
    let rexall = PartnerRef::new(11, SUPPLIER, 0);
    let landlord = PartnerRef::new(20, CUSTOMER, 0);
    repo.register_partner_name(shoppers, "Shoppers Drug Mart").await.unwrap();
    repo.register_partner_name(rexall, "Rexall").await.unwrap();

    for _ in 0..3 {
        writer
            .save_keywords_from_text(shoppers, "SHOPPERS DRUG MART #1234 TORONTO")
            .await;
    }
    writer
        .save_keywords_from_text(rexall, "REXALL PHARMACY #88 PHARMACY PURCHASE")
        .await;
    writer.save_keyword(landlord, "rent", 6).await.unwrap();

    let results = matcher
        .search("SHOPPERS DRUG MART #123 - PHARMACY PURCHASE", None, 5)
        .await
        .unwrap();

    assert_eq!(results[0].partner, shoppers);
    assert_eq!(results[0].partner_name, "Shoppers Drug Mart");
    assert_eq!(results[0].matched_keywords, vec!["drug", "mart", "shoppers"]);
    assert_eq!(results[0].raw_score, 9.0);
    assert!((results[0].final_score - 12.6).abs() < 1e-9);
    assert!(results.iter().all(|m| m.partner != landlord));

    let best = matcher
        .top_match("rexall pharmacy", Some(SUPPLIER))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(best.partner, rexall);
    assert!(matcher
        .top_match("rexall pharmacy", Some(CUSTOMER))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn nothing_to_match_is_an_empty_list() {
    let (_dir, repo) = store().await;
    let matcher = KeywordMatchingService::new(repo.clone(), Default::default());

    assert!(matcher.search("", None, 5).await.unwrap().is_empty());
    assert!(matcher.search("the and or", None, 5).await.unwrap().is_empty());
    assert!(matcher.search("unknown merchant", None, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_keywords_never_reach_storage() {
    let (_dir, repo) = store().await;
    let writer = PartnerDataService::new(repo.clone(), &Default::default());
    let partner = PartnerRef::new(1, CUSTOMER, 0);

    assert!(matches!(
        writer.save_keyword(partner, "the", 1).await,
        Err(MatchError::InvalidKeyword { .. })
    ));
    assert!(matches!(
        writer.save_keyword(partner, "4411", 1).await,
        Err(MatchError::InvalidKeyword { .. })
    ));
    assert_eq!(repo.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn settings_table_tunes_the_engine() {
    let (_dir, repo) = store().await;
    save_setting(repo.pool(), STOPWORDS_KEY, "pos,purchase").await.unwrap();
    save_setting(repo.pool(), CONFIDENCE_THRESHOLD_KEY, "90").await.unwrap();
    let config = load_match_config(repo.pool()).await.unwrap();

    let writer = PartnerDataService::new(repo.clone(), &config);
    let matcher = KeywordMatchingService::new(repo.clone(), config);

    let costco = PartnerRef::new(1, SUPPLIER, 0);
    let saved = writer
        .save_keywords_from_text(costco, "POS PURCHASE COSTCO WHOLESALE")
        .await;
    assert_eq!(saved, 2);
    assert!(!repo.exists(costco, "purchase").await.unwrap());

    // One of two keywords matched: 0.5 * 0.6 + 0.4 = 0.7, below the 0.9 threshold.
    assert!(matcher
        .search("costco gasoline", None, 5)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        matcher
            .search("costco wholesale", None, 5)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn symbol_keywords_match_the_memo_they_came_from() {
    let (_dir, repo) = store().await;
    let writer = PartnerDataService::new(repo.clone(), &Default::default());
    let matcher = KeywordMatchingService::new(repo.clone(), Default::default());

    let carrier = PartnerRef::new(7, SUPPLIER, 0);
    writer.save_keyword(carrier, "AT&T", 5).await.unwrap();
    writer.save_keyword(carrier, "#Verizon", 1).await.unwrap();
    assert!(repo.exists(carrier, "att").await.unwrap());
    assert!(repo.exists(carrier, "verizon").await.unwrap());

    let results = matcher.search("AT&T WIRELESS", None, 5).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].partner, carrier);
    assert_eq!(results[0].matched_keywords, vec!["att"]);
}

#[tokio::test]
async fn typographic_punctuation_matches_learned_words() {
    let (_dir, repo) = store().await;
    let writer = PartnerDataService::new(repo.clone(), &Default::default());
    let matcher = KeywordMatchingService::new(repo.clone(), Default::default());

    let utility = PartnerRef::new(8, SUPPLIER, 0);
    writer.save_keywords_from_text(utility, "HYDRO ONE BILLING").await;

    let results = matcher
        .search("HYDRO\u{2014}ONE BILLING", None, 5)
        .await
        .unwrap();
    assert_eq!(results[0].partner, utility);
    assert_eq!(results[0].matched_keywords, vec!["billing", "hydro", "one"]);
}
