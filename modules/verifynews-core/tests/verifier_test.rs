use std::sync::Arc;

use verifynews_common::{is_valid_slug, Article, Veracity, VerificationResult};
use verifynews_core::testing::{false_verdict, FixedOracle, MockDocumentStore, StoreCall};
use verifynews_core::{ErrorKind, RetryPolicy, Submission, TrendingFeed, VerificationService, Verifier};

fn setup(oracle: FixedOracle) -> (Arc<MockDocumentStore>, Arc<FixedOracle>, Arc<VerificationService>, Verifier) {
    let store = Arc::new(MockDocumentStore::new());
    let oracle = Arc::new(oracle);
    let service = Arc::new(
        VerificationService::new(store.clone(), "main", "verifications").with_retry(RetryPolicy::none()),
    );
    let verifier = Verifier::new(oracle.clone(), service.clone());
    (store, oracle, service, verifier)
}

#[tokio::test]
async fn submission_is_assessed_and_saved() {
    let (store, oracle, service, verifier) = setup(FixedOracle::new(false_verdict(92)));

    let submitted = verifier
        .submit(Submission {
            query: "  The moon landing was staged  ".into(),
            user_id: Some("user-7".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(submitted.title, "The moon landing was staged");
    assert!(submitted.slug.starts_with("the-moon-landing-was-staged-"));
    assert!(is_valid_slug(&submitted.slug));
    assert_eq!(submitted.result.veracity, Veracity::False);

    let claims = oracle.claims();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].query, "The moon landing was staged");

    assert_eq!(store.len(), 1);
    let record = service.get_by_slug(&submitted.slug).await.unwrap().unwrap();
    assert_eq!(record.id, submitted.id);
    assert_eq!(record.confidence, 92);
    assert_eq!(record.user_id.as_deref(), Some("user-7"));
    assert_eq!(record.title.as_deref(), Some("The moon landing was staged"));
}

#[tokio::test]
async fn article_title_names_the_record() {
    let verdict = VerificationResult {
        veracity: Veracity::Uncertain,
        confidence: 40,
        explanation: "Mixed evidence.".into(),
        sources: vec![],
    };
    let (_store, oracle, _service, verifier) = setup(FixedOracle::new(verdict));

    let submitted = verifier
        .submit(Submission {
            query: "Coffee cures colds".into(),
            content: "Full article text".into(),
            article: Some(Article {
                title: "Does coffee cure colds?".into(),
                url: "https://news.example.com/coffee".into(),
                snippet: String::new(),
            }),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(submitted.title, "Does coffee cure colds?");
    assert_eq!(oracle.claims()[0].content, "Full article text");
}

#[tokio::test]
async fn blank_claim_is_rejected_before_the_oracle() {
    let (store, oracle, _service, verifier) = setup(FixedOracle::new(false_verdict(90)));

    let err = verifier
        .submit(Submission {
            query: "   ".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.user_message(), "Please enter a claim to verify");
    assert!(oracle.claims().is_empty());
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn oracle_failure_saves_nothing() {
    let (store, _oracle, _service, verifier) = setup(FixedOracle::failing());

    let err = verifier
        .submit(Submission {
            query: "Vaccines contain microchips".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Oracle);
    assert!(store.is_empty());
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn out_of_range_confidence_from_oracle_is_not_saved() {
    let (store, _oracle, _service, verifier) = setup(FixedOracle::new(false_verdict(150)));

    let err = verifier
        .submit(Submission {
            query: "Claim".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(store.is_empty());
}

#[tokio::test]
async fn unconfigured_store_skips_the_oracle() {
    let store = Arc::new(MockDocumentStore::unconfigured());
    let oracle = Arc::new(FixedOracle::new(false_verdict(90)));
    let service = Arc::new(VerificationService::new(store.clone(), "main", "verifications"));
    let verifier = Verifier::new(oracle.clone(), service);

    let err = verifier
        .submit(Submission {
            query: "Claim".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotConfigured);
    assert!(oracle.claims().is_empty());
}

#[tokio::test]
async fn same_claim_twice_gets_distinct_slugs() {
    let (store, _oracle, _service, verifier) = setup(FixedOracle::new(false_verdict(90)));
    let submission = Submission {
        query: "Same claim".into(),
        ..Default::default()
    };

    let a = verifier.submit(submission.clone()).await.unwrap();
    let b = verifier.submit(submission).await.unwrap();

    assert_ne!(a.slug, b.slug);
    assert_ne!(a.id, b.id);
    let creates = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::Create { .. }))
        .count();
    assert_eq!(creates, 2);
}

#[tokio::test]
async fn trending_feed_picks_up_new_false_verdicts() {
    let (_store, _oracle, service, verifier) = setup(FixedOracle::new(false_verdict(95)));
    let mut feed = TrendingFeed::default();

    verifier
        .submit(Submission {
            query: "Drinking bleach cures flu".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let raised = feed.refresh(&service, 20).await.unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].headline, "Drinking bleach cures flu");

    assert!(feed.refresh(&service, 20).await.unwrap().is_empty());
    assert_eq!(feed.len(), 1);
}
