//! Review Workflow Tests
//!
//! Eligibility resolution and the sequential review session, run end to end against the
//! in-memory store.

use std::sync::Arc;

use db::{
    InMemoryStore, TaskStore,
    models::{
        applicant::{Applicant, ApplicantStatus},
        review::{RatingDimension, Ratings, Review, ReviewDirection},
        task::{Task, TaskStatus},
    },
};
use services::services::{
    eligibility::{
        Counterpart, ReviewStatus, resolve_eligible_reviewees, unreviewed, with_review_status,
    },
    review_session::{ReviewSession, ReviewSessionError, SessionPhase, SubmitOutcome},
};

const TASK_ID: i64 = 7;
const CREATOR: i64 = 100;
const VOLUNTEER_X: i64 = 11;
const VOLUNTEER_Y: i64 = 12;

// ============================================================================
// TEST SETUP UTILITIES
// ============================================================================

async fn completed_task_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_task(Task {
            id: TASK_ID,
            title: "Assemble bookshelf".to_string(),
            required_volunteer_count: Some(2),
            status: TaskStatus::Completed,
            creator_id: CREATOR,
            assignee_ids: vec![],
        })
        .await;

    for (id, user_id) in [(1, VOLUNTEER_X), (2, VOLUNTEER_Y)] {
        store
            .insert_applicant(Applicant {
                id,
                user_id,
                task_id: TASK_ID,
                status: ApplicantStatus::Accepted,
            })
            .await;
    }
    store
}

async fn eligible_for(
    store: &InMemoryStore,
    viewer_id: i64,
) -> Result<Vec<Counterpart>, Box<dyn std::error::Error>> {
    let task = store.get_task(TASK_ID).await?;
    let accepted = store
        .list_applicants(TASK_ID, Some(ApplicantStatus::Accepted))
        .await?;
    Ok(resolve_eligible_reviewees(&task, viewer_id, &accepted))
}

fn fill_draft(session: &mut ReviewSession, rating: u8, comment: &str) -> Result<(), ReviewSessionError> {
    let dimensions = session
        .draft()
        .ok_or(ReviewSessionError::NotActive)?
        .dimensions();
    for dimension in dimensions {
        session.set_rating(*dimension, Some(rating))?;
    }
    session.set_comment(comment)
}

async fn reviews_for_pair(store: &InMemoryStore, reviewer_id: i64, reviewee_id: i64) -> Vec<Review> {
    store
        .list_reviews(TASK_ID)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|review| review.is_for(TASK_ID, reviewer_id, reviewee_id))
        .collect()
}

// ============================================================================
// SESSION ROUND TRIP TESTS
// ============================================================================

#[tokio::test]
async fn test_creator_reviews_every_volunteer_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    let candidates = eligible_for(&store, CREATOR).await?;
    assert_eq!(
        candidates,
        vec![Counterpart::volunteer(VOLUNTEER_X), Counterpart::volunteer(VOLUNTEER_Y)]
    );

    let mut session = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    session.open(candidates).await?;
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.candidate_count(), 2);
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.draft().map(|d| d.dimensions().len()), Some(4));

    fill_draft(&mut session, 5, "Showed up early")?;
    assert_eq!(
        session.submit_current().await?,
        SubmitOutcome::Advanced { current_index: 1 }
    );
    assert_eq!(
        session.current_candidate(),
        Some(Counterpart::volunteer(VOLUNTEER_Y))
    );
    assert_eq!(session.draft().map(|d| d.comment.as_str()), Some(""));

    fill_draft(&mut session, 4, "Careful with the tools")?;
    assert_eq!(
        session.submit_current().await?,
        SubmitOutcome::Completed { submitted: 2 }
    );
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert_eq!(session.current_index(), None);

    let reviews = store.list_reviews(TASK_ID).await?;
    assert_eq!(reviews.len(), 2);
    assert!(reviews.iter().all(|r| r.reviewer_id == CREATOR));
    assert!(
        reviews
            .iter()
            .all(|r| r.direction() == Some(ReviewDirection::RequesterToVolunteer))
    );

    let annotated = with_review_status(TASK_ID, &eligible_for(&store, CREATOR).await?, &reviews, CREATOR);
    assert!(ReviewStatus::from_annotated(&annotated).is_complete());
    assert!(unreviewed(&annotated).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_volunteer_reviews_creator_on_requester_dimensions()
-> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    let candidates = eligible_for(&store, VOLUNTEER_Y).await?;
    assert_eq!(candidates, vec![Counterpart::creator(CREATOR)]);

    let mut session = ReviewSession::new(store.clone(), TASK_ID, VOLUNTEER_Y);
    session.open(candidates).await?;

    let err = session
        .set_rating(RatingDimension::Reliability, Some(5))
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewSessionError::ForeignDimension(RatingDimension::Reliability)
    ));

    fill_draft(&mut session, 3, "Instructions were clear")?;
    session.submit_current().await?;

    let reviews = reviews_for_pair(&store, VOLUNTEER_Y, CREATOR).await;
    assert_eq!(reviews.len(), 1);
    assert_eq!(
        reviews[0].direction(),
        Some(ReviewDirection::VolunteerToRequester)
    );
    assert!((reviews[0].score() - 3.0).abs() < f64::EPSILON);

    Ok(())
}

#[tokio::test]
async fn test_open_with_no_candidates_stays_idle() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    let mut session = ReviewSession::new(store.clone(), TASK_ID, 555);

    let candidates = eligible_for(&store, 555).await?;
    let err = session.open(candidates).await.unwrap_err();

    assert!(matches!(err, ReviewSessionError::NothingToReview));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(matches!(
        session.submit_current().await,
        Err(ReviewSessionError::NotActive)
    ));

    Ok(())
}

// ============================================================================
// VALIDATION AND FAILURE TESTS
// ============================================================================

#[tokio::test]
async fn test_invalid_draft_never_reaches_store() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    let mut session = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    session.open(eligible_for(&store, CREATOR).await?).await?;

    // ratings but no comment
    fill_draft(&mut session, 4, "   ")?;
    let err = session.submit_current().await.unwrap_err();
    match err {
        ReviewSessionError::Validation(validation) => {
            assert!(validation.missing_comment);
            assert!(validation.missing_ratings.is_empty());
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // comment but one rating cleared
    session.set_comment("Great")?;
    session.set_rating(RatingDimension::SafetyAndRespect, None)?;
    let validation = session.validation().ok_or("session should be active")?;
    assert!(validation.is_missing(RatingDimension::SafetyAndRespect));
    assert!(session.submit_current().await.is_err());

    assert_eq!(store.upsert_calls().await, 0);
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.draft().map(|d| d.comment.as_str()), Some("Great"));

    Ok(())
}

#[tokio::test]
async fn test_store_failure_keeps_index_and_draft() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    let mut session = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    session.open(eligible_for(&store, CREATOR).await?).await?;

    fill_draft(&mut session, 5, "First")?;
    session.submit_current().await?;

    fill_draft(&mut session, 2, "Second")?;
    let draft_before = session.draft().cloned();
    store.fail_next_upsert("service unavailable").await;

    let err = session.submit_current().await.unwrap_err();
    assert!(matches!(err, ReviewSessionError::Store(_)));
    assert_eq!(err.to_string(), "service unavailable");
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.current_index(), Some(1));
    assert_eq!(session.draft().cloned(), draft_before);

    // the first submission survives the later failure
    assert_eq!(reviews_for_pair(&store, CREATOR, VOLUNTEER_X).await.len(), 1);
    assert!(reviews_for_pair(&store, CREATOR, VOLUNTEER_Y).await.is_empty());

    // retry with the same draft succeeds
    assert_eq!(
        session.submit_current().await?,
        SubmitOutcome::Completed { submitted: 2 }
    );
    assert_eq!(reviews_for_pair(&store, CREATOR, VOLUNTEER_Y).await.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_cancel_discards_current_draft() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    let mut session = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    session.open(eligible_for(&store, CREATOR).await?).await?;

    fill_draft(&mut session, 5, "First")?;
    session.submit_current().await?;
    fill_draft(&mut session, 1, "Never sent")?;

    assert!(session.cancel());
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.draft().is_none());
    assert!(!session.cancel());

    assert_eq!(store.upsert_calls().await, 1);
    assert!(reviews_for_pair(&store, CREATOR, VOLUNTEER_Y).await.is_empty());

    Ok(())
}

// ============================================================================
// EDIT / RESUME TESTS
// ============================================================================

#[tokio::test]
async fn test_edit_preloads_and_updates_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    store
        .insert_review(Review {
            id: 40,
            task_id: TASK_ID,
            reviewer_id: CREATOR,
            reviewee_id: VOLUNTEER_X,
            ratings: Ratings {
                reliability: Some(4),
                task_completion: Some(4),
                communication_requester_to_volunteer: Some(3),
                safety_and_respect: Some(5),
                ..Default::default()
            },
            comment: "Good work".to_string(),
            created_at: None,
        })
        .await;
    let before = reviews_for_pair(&store, CREATOR, VOLUNTEER_X).await.len();

    let mut session = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    session.edit(Counterpart::volunteer(VOLUNTEER_X)).await?;

    let draft = session.draft().cloned().ok_or("session should be active")?;
    assert!(draft.editing);
    assert_eq!(draft.comment, "Good work");
    assert_eq!(draft.ratings.get(RatingDimension::CommunicationRequesterToVolunteer), Some(3));

    // unchanged re-submit is an update, not a second record
    assert_eq!(
        session.submit_current().await?,
        SubmitOutcome::Completed { submitted: 1 }
    );

    let after = reviews_for_pair(&store, CREATOR, VOLUNTEER_X).await;
    assert_eq!(after.len(), before);
    assert_eq!(after[0].id, 40);

    Ok(())
}

#[tokio::test]
async fn test_unchanged_resubmit_keeps_stored_comment() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    store
        .insert_review(Review {
            id: 41,
            task_id: TASK_ID,
            reviewer_id: VOLUNTEER_X,
            reviewee_id: CREATOR,
            ratings: Ratings {
                accuracy_of_request: Some(5),
                communication_volunteer_to_requester: Some(4),
                safety_and_preparedness: Some(4),
                ..Default::default()
            },
            comment: "Good work\n".to_string(),
            created_at: None,
        })
        .await;

    let mut session = ReviewSession::new(store.clone(), TASK_ID, VOLUNTEER_X);
    session.edit(Counterpart::creator(CREATOR)).await?;
    session.submit_current().await?;

    let stored = reviews_for_pair(&store, VOLUNTEER_X, CREATOR).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].comment, "Good work\n");

    Ok(())
}

#[tokio::test]
async fn test_resume_skips_reviewed_counterparts() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;

    let mut first_pass = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    first_pass.open(vec![Counterpart::volunteer(VOLUNTEER_X)]).await?;
    fill_draft(&mut first_pass, 5, "Done")?;
    first_pass.submit_current().await?;

    let eligible = eligible_for(&store, CREATOR).await?;
    let reviews = store.list_reviews(TASK_ID).await?;
    let annotated = with_review_status(TASK_ID, &eligible, &reviews, CREATOR);
    assert_eq!(
        annotated,
        vec![
            (Counterpart::volunteer(VOLUNTEER_X), true),
            (Counterpart::volunteer(VOLUNTEER_Y), false),
        ]
    );

    let mut resumed = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    resumed.open(unreviewed(&annotated)).await?;
    assert_eq!(resumed.candidate_count(), 1);
    assert_eq!(
        resumed.current_candidate(),
        Some(Counterpart::volunteer(VOLUNTEER_Y))
    );

    Ok(())
}

#[tokio::test]
async fn test_open_while_active_is_refused() -> Result<(), Box<dyn std::error::Error>> {
    let store = completed_task_store().await;
    let mut session = ReviewSession::new(store.clone(), TASK_ID, CREATOR);
    session.open(eligible_for(&store, CREATOR).await?).await?;

    let err = session
        .open(vec![Counterpart::volunteer(VOLUNTEER_Y)])
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewSessionError::AlreadyActive));
    assert_eq!(session.candidate_count(), 2);

    Ok(())
}
