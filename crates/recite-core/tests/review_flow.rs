//! End-to-end review flow against a scratch database: import, due selection,
//! the commit protocol, and the review history.

use recite_core::{Card, CardKind, Grade, NewCard, NewContext, Store, StoreError};
use tempfile::TempDir;

fn test_store() -> (Store, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Store::new(Some(dir.path().join("test.db"))).unwrap();
    (store, dir)
}

fn cloze(prompt: &str, answer: &str) -> NewCard {
    NewCard {
        kind: CardKind::Cloze,
        prompt: prompt.to_string(),
        answer: answer.to_string(),
        choices: Some(serde_json::json!([answer, "distractor-a", "distractor-b"])),
        explanation: None,
        lemma: Some(answer.to_string()),
    }
}

fn seed_context(store: &Store, owner: &str, title: &str) -> String {
    store
        .create_context(
            owner,
            NewContext {
                title: title.to_string(),
                level: "B1".to_string(),
                notes: Some(format!("Practicing: {title}")),
            },
        )
        .unwrap()
        .id
}

fn seed_one(store: &Store, owner: &str, title: &str, answer: &str) -> Card {
    let context = seed_context(store, owner, title);
    store
        .add_cards(
            owner,
            &context,
            vec![cloze(&format!("A sentence missing ____ ({title})."), answer)],
        )
        .unwrap();
    store.next_due(owner, Some(&context)).unwrap().unwrap()
}

#[test]
fn review_ladder_walks_one_three_then_ease_scaled() {
    let (store, _dir) = test_store();
    let card = seed_one(&store, "ana", "Airport check-in", "luggage");
    assert_eq!(card.interval, 0);

    let first = store.submit_review("ana", &card.id, Grade::Good).unwrap();
    assert_eq!(first.interval, 1);

    let second = store.submit_review("ana", &card.id, Grade::Good).unwrap();
    assert_eq!(second.interval, 3);

    let third = store.submit_review("ana", &card.id, Grade::Good).unwrap();
    assert_eq!(third.interval, (3.0 * third.ease).round() as i64);
    assert!(third.interval > 3);
}

#[test]
fn due_date_strictly_advances_on_every_successful_submission() {
    let (store, _dir) = test_store();
    let card = seed_one(&store, "ana", "Restaurant", "menu");
    let mut previous_due = card.due;

    for grade in [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy] {
        let outcome = store.submit_review("ana", &card.id, grade).unwrap();
        assert!(
            outcome.next_due > previous_due,
            "due did not advance on {grade}"
        );
        previous_due = outcome.next_due;

        // The outcome echoes exactly what was persisted
        let persisted = store.get_card("ana", &card.id).unwrap().unwrap();
        assert_eq!(persisted.due, outcome.next_due);
        assert_eq!(persisted.ease, outcome.ease);
        assert_eq!(persisted.interval, outcome.interval);
    }
}

#[test]
fn every_commit_appends_exactly_one_history_row_in_order() {
    let (store, _dir) = test_store();
    let card = seed_one(&store, "ana", "Pharmacy", "prescription");

    let grades = [Grade::Good, Grade::Again, Grade::Easy];
    for grade in grades {
        store.submit_review("ana", &card.id, grade).unwrap();
    }

    let history = store.reviews_for_card("ana", &card.id).unwrap();
    assert_eq!(history.len(), grades.len());
    for (record, grade) in history.iter().zip(grades) {
        assert_eq!(record.grade, grade);
        assert_eq!(record.card_id, card.id);
        assert_eq!(record.owner_id, "ana");
    }
    // Submission order is preserved
    assert!(history.windows(2).all(|w| w[0].id < w[1].id));
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[test]
fn due_selection_is_oldest_due_first() {
    let (store, _dir) = test_store();
    let context = seed_context(&store, "ana", "Train station");

    // Two batches: the first batch's card carries the earlier due timestamp
    store
        .add_cards("ana", &context, vec![cloze("The ____ leaves at nine.", "train")])
        .unwrap();
    store
        .add_cards("ana", &context, vec![cloze("Stamp your ____ first.", "ticket")])
        .unwrap();

    let next = store.next_due("ana", None).unwrap().unwrap();
    assert_eq!(next.answer, "train");
    assert_eq!(store.due_count("ana", None).unwrap(), 2);

    // Reviewing the oldest pushes it into the future; the other surfaces
    store.submit_review("ana", &next.id, Grade::Good).unwrap();
    let next = store.next_due("ana", None).unwrap().unwrap();
    assert_eq!(next.answer, "ticket");
    assert_eq!(store.due_count("ana", None).unwrap(), 1);
}

#[test]
fn reviewed_cards_are_no_longer_due() {
    let (store, _dir) = test_store();
    let card = seed_one(&store, "ana", "Hotel", "reception");

    store.submit_review("ana", &card.id, Grade::Again).unwrap();

    // Even a failed recall reschedules at least a day out
    assert!(store.next_due("ana", None).unwrap().is_none());
    assert_eq!(store.due_count("ana", None).unwrap(), 0);
}

#[test]
fn due_selection_respects_the_context_filter() {
    let (store, _dir) = test_store();
    let airport = seed_context(&store, "ana", "Airport");
    let bakery = seed_context(&store, "ana", "Bakery");

    store
        .add_cards("ana", &airport, vec![cloze("Your ____ pass, please.", "boarding")])
        .unwrap();
    store
        .add_cards("ana", &bakery, vec![cloze("Two ____ rolls, please.", "crusty")])
        .unwrap();

    let from_bakery = store.next_due("ana", Some(&bakery)).unwrap().unwrap();
    assert_eq!(from_bakery.context_id, bakery);
    assert_eq!(store.due_count("ana", Some(&airport)).unwrap(), 1);
}

#[test]
fn foreign_owner_gets_not_found_and_no_mutation() {
    let (store, _dir) = test_store();
    let card = seed_one(&store, "ana", "Doctor's appointment", "symptom");

    let result = store.submit_review("bruno", &card.id, Grade::Good);
    assert!(matches!(result, Err(StoreError::NotFound(_))));
    assert!(store.get_card("bruno", &card.id).unwrap().is_none());

    let untouched = store.get_card("ana", &card.id).unwrap().unwrap();
    assert_eq!(untouched.interval, 0);
    assert!(store.reviews_for_card("ana", &card.id).unwrap().is_empty());
}

#[test]
fn out_of_range_quality_fails_before_any_write() {
    let (store, _dir) = test_store();
    let card = seed_one(&store, "ana", "Supermarket", "receipt");

    for quality in [-1, 1, 2, 6] {
        let result = store.submit_graded("ana", &card.id, quality);
        assert!(matches!(result, Err(StoreError::InvalidGrade(q)) if q == quality));
    }
    assert!(store.reviews_for_card("ana", &card.id).unwrap().is_empty());

    // The boundary accepts exactly the closed set
    for quality in [0, 3, 4, 5] {
        store.submit_graded("ana", &card.id, quality).unwrap();
    }
    assert_eq!(store.reviews_for_card("ana", &card.id).unwrap().len(), 4);
}

#[test]
fn context_listing_counts_due_and_total_cards() {
    let (store, _dir) = test_store();
    let context = seed_context(&store, "ana", "Post office");
    store
        .add_cards(
            "ana",
            &context,
            vec![
                cloze("I need to ____ this parcel.", "send"),
                cloze("A ____ for this letter, please.", "stamp"),
            ],
        )
        .unwrap();

    let summaries = store.list_contexts("ana").unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_cards, 2);
    assert_eq!(summaries[0].due_count, 2);

    // Another owner sees nothing
    assert!(store.list_contexts("bruno").unwrap().is_empty());

    // Reviewing one card drops the due count but not the total
    let card = store.next_due("ana", None).unwrap().unwrap();
    store.submit_review("ana", &card.id, Grade::Good).unwrap();
    let summaries = store.list_contexts("ana").unwrap();
    assert_eq!(summaries[0].total_cards, 2);
    assert_eq!(summaries[0].due_count, 1);
}
