//! Behaviour of the ordered collections against a real SQLite database.

mod common;

use common::*;
use db::{Collection, Direction, MoveOutcome, OrderingError, PositionChange};
use sqlx::SqlitePool;

async fn ids(pool: &SqlitePool, collection: Collection) -> Vec<i64> {
    collection
        .list_ordered(pool)
        .await
        .expect("list collection")
        .into_iter()
        .map(|m| m.id)
        .collect()
}

async fn positions(pool: &SqlitePool, collection: Collection) -> Vec<Option<i64>> {
    collection
        .list_ordered(pool)
        .await
        .expect("list collection")
        .into_iter()
        .map(|m| m.position)
        .collect()
}

// ----------------------------------------------------------------------------
// Assignment
// ----------------------------------------------------------------------------

#[tokio::test]
async fn assign_appends_after_current_max() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;

    assert_eq!(Collection::Masthead.assign(&pool, a).await.unwrap(), 0);
    assert_eq!(Collection::Masthead.assign(&pool, b).await.unwrap(), 1);
    assert_eq!(Collection::Masthead.assign(&pool, c).await.unwrap(), 2);
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, b, c]);
}

#[tokio::test]
async fn assign_uses_max_not_count_when_positions_have_gaps() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    force_media_slot(&pool, a, "is_featured", "featured_order", Some(7)).await;

    assert_eq!(Collection::FeaturedMedia.assign(&pool, b).await.unwrap(), 8);
}

#[tokio::test]
async fn assign_to_empty_collection_starts_at_zero_even_with_stale_positions() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    // Non-member with a leftover position must not count towards the max.
    sqlx::query("UPDATE media SET masthead_order = 9 WHERE id = ?1")
        .bind(a)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(Collection::Masthead.assign(&pool, b).await.unwrap(), 0);
}

#[tokio::test]
async fn assign_is_idempotent_for_members() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    Collection::Masthead.assign(&pool, a).await.unwrap();
    Collection::Masthead.assign(&pool, b).await.unwrap();

    assert_eq!(Collection::Masthead.assign(&pool, a).await.unwrap(), 0);
    assert_eq!(positions(&pool, Collection::Masthead).await, vec![Some(0), Some(1)]);
}

#[tokio::test]
async fn assign_gives_member_without_position_a_slot() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    Collection::Masthead.assign(&pool, a).await.unwrap();
    force_media_slot(&pool, b, "is_masthead", "masthead_order", None).await;

    assert_eq!(Collection::Masthead.assign(&pool, b).await.unwrap(), 1);
}

#[tokio::test]
async fn assign_unknown_id_is_not_found() {
    let (pool, _dir) = create_test_pool().await;
    let err = Collection::Masthead.assign(&pool, 404).await.unwrap_err();
    assert!(matches!(err, OrderingError::NotFound { id: 404, .. }));
}

#[tokio::test]
async fn assign_many_yields_consecutive_positions_in_caller_order() {
    let (pool, _dir) = create_test_pool().await;
    let existing = insert_media(&pool, "existing").await;
    Collection::FeaturedMedia.assign(&pool, existing).await.unwrap();

    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;

    let assigned = Collection::FeaturedMedia
        .assign_many(&pool, &[c, a, b])
        .await
        .unwrap();
    assert_eq!(assigned, vec![1, 2, 3]);
    assert_eq!(ids(&pool, Collection::FeaturedMedia).await, vec![existing, c, a, b]);
}

#[tokio::test]
async fn assign_many_rolls_back_on_unknown_id() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;

    let err = Collection::FeaturedMedia
        .assign_many(&pool, &[a, 999])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderingError::NotFound { id: 999, .. }));
    assert!(ids(&pool, Collection::FeaturedMedia).await.is_empty());
}

#[tokio::test]
async fn concurrent_assigns_get_distinct_positions() {
    let (pool, _dir) = create_test_pool().await;
    let mut media = Vec::new();
    for i in 0..8 {
        media.push(insert_media(&pool, &format!("m{i}")).await);
    }

    let handles: Vec<_> = media
        .iter()
        .map(|id| {
            let pool = pool.clone();
            let id = *id;
            tokio::spawn(async move { Collection::Masthead.assign(&pool, id).await })
        })
        .collect();

    let mut assigned = Vec::new();
    for handle in handles {
        assigned.push(handle.await.unwrap().unwrap());
    }
    assigned.sort_unstable();
    assert_eq!(assigned, (0..8).collect::<Vec<i64>>());
}

// ----------------------------------------------------------------------------
// Clearing
// ----------------------------------------------------------------------------

#[tokio::test]
async fn clear_is_idempotent_and_resets_position() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    Collection::Masthead.assign(&pool, a).await.unwrap();

    Collection::Masthead.clear(&pool, a).await.unwrap();
    assert_eq!(media_slot(&pool, a, "is_masthead", "masthead_order").await, (false, None));

    Collection::Masthead.clear(&pool, a).await.unwrap();
    assert_eq!(media_slot(&pool, a, "is_masthead", "masthead_order").await, (false, None));
}

#[tokio::test]
async fn clear_does_not_renumber_remaining_members() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    Collection::Masthead.assign_many(&pool, &[a, b, c]).await.unwrap();

    Collection::Masthead.clear(&pool, b).await.unwrap();
    assert_eq!(positions(&pool, Collection::Masthead).await, vec![Some(0), Some(2)]);
}

#[tokio::test]
async fn reassign_after_clear_goes_to_the_end() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    Collection::Masthead.assign_many(&pool, &[a, b]).await.unwrap();

    Collection::Masthead.clear(&pool, a).await.unwrap();
    assert_eq!(Collection::Masthead.assign(&pool, a).await.unwrap(), 2);
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![b, a]);
}

#[tokio::test]
async fn clearing_one_axis_preserves_the_other() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    Collection::Masthead.assign(&pool, a).await.unwrap();
    Collection::FeaturedMedia.assign(&pool, a).await.unwrap();

    Collection::Masthead.clear(&pool, a).await.unwrap();

    assert_eq!(media_slot(&pool, a, "is_featured", "featured_order").await, (true, Some(0)));
    assert_eq!(ids(&pool, Collection::FeaturedMedia).await, vec![a]);
}

#[tokio::test]
async fn clear_unknown_id_is_not_found() {
    let (pool, _dir) = create_test_pool().await;
    let err = Collection::FeaturedStories.clear(&pool, 12).await.unwrap_err();
    assert!(matches!(err, OrderingError::NotFound { id: 12, .. }));
}

#[tokio::test]
async fn story_images_cannot_be_cleared() {
    let (pool, _dir) = create_test_pool().await;
    let story = insert_story(&pool, "s").await;
    let image = insert_story_image(&pool, story, 0).await;

    let err = Collection::StoryImages { story_id: story }
        .clear(&pool, image)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderingError::ImplicitMembership(_)));
}

#[tokio::test]
async fn clear_many_clears_every_listed_member() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    Collection::FeaturedMedia.assign_many(&pool, &[a, b, c]).await.unwrap();

    Collection::FeaturedMedia.clear_many(&pool, &[a, c]).await.unwrap();
    assert_eq!(ids(&pool, Collection::FeaturedMedia).await, vec![b]);
}

// ----------------------------------------------------------------------------
// Full reorder
// ----------------------------------------------------------------------------

#[tokio::test]
async fn reorder_round_trips_and_is_contiguous() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    Collection::Masthead.assign_many(&pool, &[a, b, c]).await.unwrap();
    // Introduce a gap and a duplicate so reorder has something to repair.
    force_media_slot(&pool, a, "is_masthead", "masthead_order", Some(5)).await;
    force_media_slot(&pool, b, "is_masthead", "masthead_order", Some(5)).await;

    let members = Collection::Masthead.reorder(&pool, &[c, a, b]).await.unwrap();

    let listed: Vec<i64> = members.iter().map(|m| m.id).collect();
    assert_eq!(listed, vec![c, a, b]);
    let positions: Vec<Option<i64>> = members.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);
}

#[tokio::test]
async fn reorder_appends_unlisted_members_in_reader_order() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    let d = insert_media(&pool, "d").await;
    Collection::FeaturedMedia.assign_many(&pool, &[a, b, c, d]).await.unwrap();

    Collection::FeaturedMedia.reorder(&pool, &[d, b]).await.unwrap();

    assert_eq!(ids(&pool, Collection::FeaturedMedia).await, vec![d, b, a, c]);
    assert_eq!(
        positions(&pool, Collection::FeaturedMedia).await,
        vec![Some(0), Some(1), Some(2), Some(3)]
    );
}

#[tokio::test]
async fn reorder_rejects_non_members_without_writing() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let outsider = insert_media(&pool, "outsider").await;
    Collection::Masthead.assign_many(&pool, &[a, b]).await.unwrap();

    let err = Collection::Masthead
        .reorder(&pool, &[b, outsider, a])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderingError::NotMember { id, .. } if id == outsider));

    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, b]);
    assert_eq!(
        media_slot(&pool, outsider, "is_masthead", "masthead_order").await,
        (false, None)
    );
}

#[tokio::test]
async fn reorder_rejects_duplicates_without_writing() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    Collection::Masthead.assign_many(&pool, &[a, b]).await.unwrap();

    let err = Collection::Masthead.reorder(&pool, &[b, b, a]).await.unwrap_err();
    assert!(matches!(err, OrderingError::DuplicateId { id, .. } if id == b));
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, b]);
}

#[tokio::test]
async fn reorder_with_empty_list_changes_nothing() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    force_media_slot(&pool, a, "is_masthead", "masthead_order", Some(4)).await;
    force_media_slot(&pool, b, "is_masthead", "masthead_order", Some(9)).await;

    let members = Collection::Masthead.reorder(&pool, &[]).await.unwrap();
    let positions: Vec<Option<i64>> = members.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![Some(4), Some(9)]);
}

#[tokio::test]
async fn story_image_reorder_is_scoped_to_the_story() {
    let (pool, _dir) = create_test_pool().await;
    let story = insert_story(&pool, "one").await;
    let other = insert_story(&pool, "two").await;
    let first = insert_story_image(&pool, story, 0).await;
    let second = insert_story_image(&pool, story, 1).await;
    let third = insert_story_image(&pool, story, 2).await;
    let foreign = insert_story_image(&pool, other, 0).await;

    let collection = Collection::StoryImages { story_id: story };
    collection.reorder(&pool, &[third, first, second]).await.unwrap();
    assert_eq!(ids(&pool, collection).await, vec![third, first, second]);

    let err = collection.reorder(&pool, &[foreign]).await.unwrap_err();
    assert!(matches!(err, OrderingError::NotMember { id, .. } if id == foreign));

    let untouched = Collection::StoryImages { story_id: other };
    assert_eq!(positions(&pool, untouched).await, vec![Some(0)]);
}

#[tokio::test]
async fn featured_stories_reorder() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_story(&pool, "a").await;
    let b = insert_story(&pool, "b").await;
    Collection::FeaturedStories.assign_many(&pool, &[a, b]).await.unwrap();

    Collection::FeaturedStories.reorder(&pool, &[b, a]).await.unwrap();
    assert_eq!(ids(&pool, Collection::FeaturedStories).await, vec![b, a]);
}

// ----------------------------------------------------------------------------
// Pairwise move
// ----------------------------------------------------------------------------

#[tokio::test]
async fn move_at_boundary_is_a_no_op() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    Collection::Masthead.assign_many(&pool, &[a, b]).await.unwrap();

    let up = Collection::Masthead
        .move_adjacent(&pool, a, Direction::Up)
        .await
        .unwrap();
    let down = Collection::Masthead
        .move_adjacent(&pool, b, Direction::Down)
        .await
        .unwrap();

    assert_eq!(up, MoveOutcome::Unchanged);
    assert_eq!(down, MoveOutcome::Unchanged);
    assert_eq!(positions(&pool, Collection::Masthead).await, vec![Some(0), Some(1)]);
}

#[tokio::test]
async fn move_swaps_exactly_two_positions() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    force_media_slot(&pool, a, "is_featured", "featured_order", Some(0)).await;
    force_media_slot(&pool, b, "is_featured", "featured_order", Some(3)).await;
    force_media_slot(&pool, c, "is_featured", "featured_order", Some(10)).await;

    let outcome = Collection::FeaturedMedia
        .move_adjacent(&pool, c, Direction::Up)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        MoveOutcome::Swapped {
            moved: PositionChange { id: c, from: Some(10), to: Some(3) },
            neighbor: PositionChange { id: b, from: Some(3), to: Some(10) },
        }
    );
    assert_eq!(ids(&pool, Collection::FeaturedMedia).await, vec![a, c, b]);
    assert_eq!(
        media_slot(&pool, a, "is_featured", "featured_order").await,
        (true, Some(0))
    );
}

#[tokio::test]
async fn move_with_tied_positions_still_changes_rank() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    force_media_slot(&pool, a, "is_masthead", "masthead_order", Some(1)).await;
    force_media_slot(&pool, b, "is_masthead", "masthead_order", Some(1)).await;
    set_created_at(&pool, "media", a, "2024-01-01 00:00:00.000").await;
    set_created_at(&pool, "media", b, "2024-01-02 00:00:00.000").await;
    // Newer row wins the tie.
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![b, a]);

    Collection::Masthead
        .move_adjacent(&pool, a, Direction::Up)
        .await
        .unwrap();

    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, b]);
}

#[tokio::test]
async fn tied_move_leaves_other_members_untouched() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    force_media_slot(&pool, a, "is_masthead", "masthead_order", Some(5)).await;
    force_media_slot(&pool, b, "is_masthead", "masthead_order", Some(7)).await;
    force_media_slot(&pool, c, "is_masthead", "masthead_order", Some(7)).await;
    set_created_at(&pool, "media", c, "2024-01-01 00:00:00.000").await;
    set_created_at(&pool, "media", b, "2024-01-02 00:00:00.000").await;
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, b, c]);

    let outcome = Collection::Masthead
        .move_adjacent(&pool, c, Direction::Up)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        MoveOutcome::Swapped {
            moved: PositionChange { id: c, from: Some(7), to: Some(7) },
            neighbor: PositionChange { id: b, from: Some(7), to: Some(8) },
        }
    );
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, c, b]);
    assert_eq!(
        media_slot(&pool, a, "is_masthead", "masthead_order").await,
        (true, Some(5))
    );
}

#[tokio::test]
async fn move_next_to_unranked_member_keeps_the_rest() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    force_media_slot(&pool, a, "is_featured", "featured_order", Some(0)).await;
    force_media_slot(&pool, b, "is_featured", "featured_order", Some(4)).await;
    force_media_slot(&pool, c, "is_featured", "featured_order", None).await;

    Collection::FeaturedMedia
        .move_adjacent(&pool, c, Direction::Up)
        .await
        .unwrap();

    assert_eq!(ids(&pool, Collection::FeaturedMedia).await, vec![a, c, b]);
    assert_eq!(
        media_slot(&pool, a, "is_featured", "featured_order").await,
        (true, Some(0))
    );
}

#[tokio::test]
async fn move_inside_a_run_of_ties_still_changes_rank() {
    let (pool, _dir) = create_test_pool().await;
    let mut media = Vec::new();
    for (i, day) in ["04", "03", "02", "01"].iter().enumerate() {
        let id = insert_media(&pool, &format!("m{i}")).await;
        force_media_slot(&pool, id, "is_masthead", "masthead_order", Some(2)).await;
        set_created_at(&pool, "media", id, &format!("2024-01-{day} 00:00:00.000")).await;
        media.push(id);
    }
    assert_eq!(ids(&pool, Collection::Masthead).await, media);

    Collection::Masthead
        .move_adjacent(&pool, media[2], Direction::Up)
        .await
        .unwrap();

    assert_eq!(
        ids(&pool, Collection::Masthead).await,
        vec![media[0], media[2], media[1], media[3]]
    );
}

#[tokio::test]
async fn move_of_non_member_is_rejected() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;

    let err = Collection::Masthead
        .move_adjacent(&pool, a, Direction::Down)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderingError::NotMember { id, .. } if id == a));
}

#[tokio::test]
async fn story_image_move_down() {
    let (pool, _dir) = create_test_pool().await;
    let story = insert_story(&pool, "s").await;
    let first = insert_story_image(&pool, story, 0).await;
    let second = insert_story_image(&pool, story, 1).await;
    let collection = Collection::StoryImages { story_id: story };

    collection
        .move_adjacent(&pool, first, Direction::Down)
        .await
        .unwrap();
    assert_eq!(ids(&pool, collection).await, vec![second, first]);
}

#[tokio::test]
async fn story_image_move_up_swaps_with_previous() {
    let (pool, _dir) = create_test_pool().await;
    let story = insert_story(&pool, "s").await;
    let a = insert_story_image(&pool, story, 0).await;
    let b = insert_story_image(&pool, story, 1).await;
    let c = insert_story_image(&pool, story, 2).await;
    let collection = Collection::StoryImages { story_id: story };

    collection
        .move_adjacent(&pool, b, Direction::Up)
        .await
        .unwrap();

    assert_eq!(ids(&pool, collection).await, vec![b, a, c]);
    assert_eq!(
        positions(&pool, collection).await,
        vec![Some(0), Some(1), Some(2)]
    );
}

// ----------------------------------------------------------------------------
// Reader
// ----------------------------------------------------------------------------

#[tokio::test]
async fn reader_sorts_null_positions_last_newest_first() {
    let (pool, _dir) = create_test_pool().await;
    let ranked_late = insert_media(&pool, "ranked-late").await;
    let ranked_early = insert_media(&pool, "ranked-early").await;
    let old_unranked = insert_media(&pool, "old-unranked").await;
    let new_unranked = insert_media(&pool, "new-unranked").await;
    force_media_slot(&pool, ranked_late, "is_masthead", "masthead_order", Some(5)).await;
    force_media_slot(&pool, ranked_early, "is_masthead", "masthead_order", Some(1)).await;
    force_media_slot(&pool, old_unranked, "is_masthead", "masthead_order", None).await;
    force_media_slot(&pool, new_unranked, "is_masthead", "masthead_order", None).await;
    set_created_at(&pool, "media", old_unranked, "2023-01-01 00:00:00.000").await;
    set_created_at(&pool, "media", new_unranked, "2024-01-01 00:00:00.000").await;

    assert_eq!(
        ids(&pool, Collection::Masthead).await,
        vec![ranked_early, ranked_late, new_unranked, old_unranked]
    );
}

#[tokio::test]
async fn reader_excludes_non_members_even_with_positions() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    sqlx::query("UPDATE media SET featured_order = 0 WHERE id = ?1")
        .bind(a)
        .execute(&pool)
        .await
        .unwrap();

    assert!(ids(&pool, Collection::FeaturedMedia).await.is_empty());
}

// ----------------------------------------------------------------------------
// Maintenance
// ----------------------------------------------------------------------------

#[tokio::test]
async fn backfill_ranks_unpositioned_members_oldest_first() {
    let (pool, _dir) = create_test_pool().await;
    let ranked = insert_media(&pool, "ranked").await;
    let newer = insert_media(&pool, "newer").await;
    let older = insert_media(&pool, "older").await;
    force_media_slot(&pool, ranked, "is_featured", "featured_order", Some(2)).await;
    force_media_slot(&pool, newer, "is_featured", "featured_order", None).await;
    force_media_slot(&pool, older, "is_featured", "featured_order", None).await;
    set_created_at(&pool, "media", older, "2022-06-01 00:00:00.000").await;
    set_created_at(&pool, "media", newer, "2023-06-01 00:00:00.000").await;

    let updated = Collection::FeaturedMedia.backfill_positions(&pool).await.unwrap();

    assert_eq!(updated, 2);
    assert_eq!(media_slot(&pool, older, "is_featured", "featured_order").await.1, Some(3));
    assert_eq!(media_slot(&pool, newer, "is_featured", "featured_order").await.1, Some(4));
    assert_eq!(Collection::FeaturedMedia.backfill_positions(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn compact_renumbers_in_reader_order() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;
    force_media_slot(&pool, a, "is_masthead", "masthead_order", Some(10)).await;
    force_media_slot(&pool, b, "is_masthead", "masthead_order", Some(4)).await;
    force_media_slot(&pool, c, "is_masthead", "masthead_order", None).await;

    let members = Collection::Masthead.compact(&pool).await.unwrap();

    let listed: Vec<(i64, Option<i64>)> = members.iter().map(|m| (m.id, m.position)).collect();
    assert_eq!(listed, vec![(b, Some(0)), (a, Some(1)), (c, Some(2))]);
}

#[tokio::test]
async fn deleting_media_removes_it_from_every_collection() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    Collection::Masthead.assign_many(&pool, &[a, b]).await.unwrap();
    Collection::FeaturedMedia.assign(&pool, a).await.unwrap();

    db::models::media::Media::delete(&pool, a).await.unwrap();

    assert_eq!(ids(&pool, Collection::Masthead).await, vec![b]);
    assert!(ids(&pool, Collection::FeaturedMedia).await.is_empty());
}

// ----------------------------------------------------------------------------
// End-to-end curation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn masthead_curation_flow() {
    let (pool, _dir) = create_test_pool().await;
    let a = insert_media(&pool, "a").await;
    let b = insert_media(&pool, "b").await;
    let c = insert_media(&pool, "c").await;

    for id in [a, b, c] {
        Collection::Masthead.assign(&pool, id).await.unwrap();
    }
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, b, c]);

    Collection::Masthead
        .move_adjacent(&pool, c, Direction::Up)
        .await
        .unwrap();
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![a, c, b]);

    Collection::Masthead.clear(&pool, a).await.unwrap();
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![c, b]);

    Collection::Masthead.reorder(&pool, &[b, c]).await.unwrap();
    assert_eq!(ids(&pool, Collection::Masthead).await, vec![b, c]);
    assert_eq!(positions(&pool, Collection::Masthead).await, vec![Some(0), Some(1)]);
}
