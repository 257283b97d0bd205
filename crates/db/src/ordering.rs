//! Ordered collections.
//!
//! Four curated collections share one set of rules:
//!
//! | Collection | Table | Position column | Membership |
//! |---|---|---|---|
//! | masthead | `media` | `masthead_order` | `is_masthead` |
//! | featured media | `media` | `featured_order` | `is_featured` |
//! | featured stories | `stories` | `featured_order` | `is_featured` |
//! | story images | `story_images` | `order_index` | every image of the story |
//!
//! Positions sort ascending, missing positions sort last, and ties fall back
//! to the newest row first. Positions are not required to be unique or
//! contiguous; only [`Collection::reorder`] and [`Collection::compact`]
//! restore a `0..n` sequence.
//!
//! Every mutation runs inside a single transaction. The pool-taking methods
//! open and commit that transaction themselves; the `*_in` variants take an
//! open connection so callers can fold them into a wider transaction.

use std::{cmp::Ordering, collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;

/// Unscoped name of a collection, as used on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollectionKind {
    Masthead,
    #[serde(rename = "featured")]
    #[strum(serialize = "featured")]
    FeaturedMedia,
    FeaturedStories,
    StoryImages,
}

/// A concrete ordered collection. Story images are partitioned per story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Masthead,
    FeaturedMedia,
    FeaturedStories,
    StoryImages { story_id: i64 },
}

/// Membership of one entity in one flagged collection.
///
/// Written only through [`Collection::set_membership_in`], which updates the
/// flag and the position column in the same statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Membership {
    NotMember,
    Member { position: i64 },
}

impl Membership {
    pub fn is_member(&self) -> bool {
        matches!(self, Membership::Member { .. })
    }

    pub fn position(&self) -> Option<i64> {
        match self {
            Membership::NotMember => None,
            Membership::Member { position } => Some(*position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// One member of a collection as seen by the reader.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, TS)]
pub struct Member {
    pub id: i64,
    pub position: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub struct PositionChange {
    pub id: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Result of [`Collection::move_adjacent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Already first (moving up) or last (moving down).
    Unchanged,
    Swapped {
        moved: PositionChange,
        neighbor: PositionChange,
    },
}

#[derive(Debug, Error)]
pub enum OrderingError {
    #[error("{collection}: no entity with id {id}")]
    NotFound { collection: Collection, id: i64 },
    #[error("{collection}: entity {id} is not a member")]
    NotMember { collection: Collection, id: i64 },
    #[error("{collection}: id {id} is listed more than once")]
    DuplicateId { collection: Collection, id: i64 },
    #[error("{0}: membership follows the parent row and cannot be revoked")]
    ImplicitMembership(Collection),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Reader comparator: position ascending with missing positions last, then
/// newest first, then highest id first.
pub fn reader_order(a: &Member, b: &Member) -> Ordering {
    let by_position = match (a.position, b.position) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_position
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// New positions for the reader-adjacent rows at `upper` and `lower` that put
/// the lower row first while leaving every other member where it is.
///
/// Returns `(rising, falling)`: the value for the row at `lower` and the value
/// for the row at `upper`. `None` when no two-row write achieves that.
fn swapped_positions(
    members: &[Member],
    upper: usize,
    lower: usize,
) -> Option<(Option<i64>, Option<i64>)> {
    let (above, below) = (members[upper].position, members[lower].position);
    let before = upper
        .checked_sub(1)
        .and_then(|i| members[i].position)
        .map(|p| p + 1);
    let after = members.get(lower + 1).and_then(|m| m.position).map(|p| p - 1);

    let mut candidates = vec![(above, below)];
    for anchor in [above, below, before, after].into_iter().flatten() {
        candidates.push((Some(anchor), Some(anchor + 1)));
        candidates.push((Some(anchor - 1), Some(anchor)));
    }

    let mut wanted: Vec<i64> = members.iter().map(|m| m.id).collect();
    wanted.swap(upper, lower);

    candidates.into_iter().find(|&(rising, falling)| {
        if rising.is_some_and(|p| p < 0) || falling.is_some_and(|p| p < 0) {
            return false;
        }
        let mut trial = members.to_vec();
        trial[lower].position = rising;
        trial[upper].position = falling;
        trial.sort_by(reader_order);
        trial.iter().map(|m| m.id).eq(wanted.iter().copied())
    })
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::StoryImages { story_id } => write!(f, "story_images[{story_id}]"),
            other => write!(f, "{}", other.kind()),
        }
    }
}

impl Collection {
    /// Resolve a wire name into a collection. Story images need the owning story.
    pub fn from_kind(kind: CollectionKind, story_id: Option<i64>) -> Option<Self> {
        match (kind, story_id) {
            (CollectionKind::Masthead, _) => Some(Collection::Masthead),
            (CollectionKind::FeaturedMedia, _) => Some(Collection::FeaturedMedia),
            (CollectionKind::FeaturedStories, _) => Some(Collection::FeaturedStories),
            (CollectionKind::StoryImages, Some(story_id)) => {
                Some(Collection::StoryImages { story_id })
            }
            (CollectionKind::StoryImages, None) => None,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Collection::Masthead => CollectionKind::Masthead,
            Collection::FeaturedMedia => CollectionKind::FeaturedMedia,
            Collection::FeaturedStories => CollectionKind::FeaturedStories,
            Collection::StoryImages { .. } => CollectionKind::StoryImages,
        }
    }

    fn table(&self) -> &'static str {
        match self {
            Collection::Masthead | Collection::FeaturedMedia => "media",
            Collection::FeaturedStories => "stories",
            Collection::StoryImages { .. } => "story_images",
        }
    }

    fn position_column(&self) -> &'static str {
        match self {
            Collection::Masthead => "masthead_order",
            Collection::FeaturedMedia | Collection::FeaturedStories => "featured_order",
            Collection::StoryImages { .. } => "order_index",
        }
    }

    /// `None` when membership is implied by the parent row.
    fn membership_column(&self) -> Option<&'static str> {
        match self {
            Collection::Masthead => Some("is_masthead"),
            Collection::FeaturedMedia | Collection::FeaturedStories => Some("is_featured"),
            Collection::StoryImages { .. } => None,
        }
    }

    /// Trailing assignment that bumps `updated_at` on tables that track it.
    fn touch(&self) -> &'static str {
        match self {
            Collection::StoryImages { .. } => "",
            _ => ", updated_at = datetime('now', 'subsec')",
        }
    }

    /// SQL predicate selecting the members of this collection.
    fn member_predicate(&self) -> String {
        match (self, self.membership_column()) {
            (Collection::StoryImages { story_id }, _) => format!("story_id = {story_id}"),
            (_, Some(flag)) => format!("{flag} = 1"),
            (_, None) => "1 = 1".to_string(),
        }
    }

    /// Predicate restricting a statement to rows this collection may touch,
    /// members or not.
    fn row_scope(&self) -> String {
        match self {
            Collection::StoryImages { story_id } => format!("story_id = {story_id}"),
            _ => "1 = 1".to_string(),
        }
    }

    /// `ORDER BY` body implementing [`reader_order`] in SQL.
    pub fn order_by(&self) -> String {
        let position = self.position_column();
        format!("{position} IS NULL, {position} ASC, created_at DESC, id DESC")
    }

    // ------------------------------------------------------------------
    // Reader
    // ------------------------------------------------------------------

    pub async fn list_ordered(&self, pool: &SqlitePool) -> Result<Vec<Member>, OrderingError> {
        let mut conn = pool.acquire().await?;
        self.list_ordered_in(&mut conn).await
    }

    pub async fn list_ordered_in(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Member>, OrderingError> {
        let sql = format!(
            "SELECT id, {position} AS position, created_at FROM {table} WHERE {members} ORDER BY {order}",
            position = self.position_column(),
            table = self.table(),
            members = self.member_predicate(),
            order = self.order_by(),
        );
        let members = sqlx::query_as::<_, Member>(&sql)
            .fetch_all(&mut *conn)
            .await?;
        Ok(members)
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    /// Append `id` to the end of the collection and return its position.
    ///
    /// An entity that is already a ranked member keeps its position. Story
    /// images are always members, so assigning one moves it to the end.
    pub async fn assign(&self, pool: &SqlitePool, id: i64) -> Result<i64, OrderingError> {
        let mut tx = pool.begin().await?;
        let position = self.assign_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(position)
    }

    pub async fn assign_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<i64, OrderingError> {
        let table = self.table();
        let position = self.position_column();

        // The new position is computed inside the writing statement so the
        // max read and the write cannot interleave with another writer.
        let (flag_set, eligible) = match self.membership_column() {
            Some(flag) => (
                format!("{flag} = 1, "),
                format!(" AND ({flag} = 0 OR {position} IS NULL)"),
            ),
            None => (String::new(), String::new()),
        };
        let sql = format!(
            "UPDATE {table}
             SET {flag_set}{position} = (
                 SELECT COALESCE(MAX({position}), -1) + 1 FROM {table}
                 WHERE {members} AND id <> ?1
             ){touch}
             WHERE id = ?1 AND {scope}{eligible}
             RETURNING {position}",
            members = self.member_predicate(),
            touch = self.touch(),
            scope = self.row_scope(),
        );

        if let Some(assigned) = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(assigned);
        }

        // Nothing updated: either the row is missing or it is already ranked.
        let sql = format!(
            "SELECT {position} FROM {table} WHERE id = ?1 AND {scope}",
            scope = self.row_scope(),
        );
        match sqlx::query_scalar::<_, Option<i64>>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        {
            Some(Some(existing)) => Ok(existing),
            _ => Err(OrderingError::NotFound {
                collection: *self,
                id,
            }),
        }
    }

    /// Assign several entities in the given order inside one transaction.
    /// Fresh members receive consecutive positions after the current maximum.
    pub async fn assign_many(
        &self,
        pool: &SqlitePool,
        ids: &[i64],
    ) -> Result<Vec<i64>, OrderingError> {
        let mut tx = pool.begin().await?;
        let positions = self.assign_many_in(&mut tx, ids).await?;
        tx.commit().await?;
        Ok(positions)
    }

    pub async fn assign_many_in(
        &self,
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> Result<Vec<i64>, OrderingError> {
        self.ensure_unique(ids)?;
        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            positions.push(self.assign_in(conn, *id).await?);
        }
        Ok(positions)
    }

    // ------------------------------------------------------------------
    // Clearing
    // ------------------------------------------------------------------

    /// Remove `id` from the collection. Its row, and its membership in any
    /// other collection, are left alone; remaining positions are not renumbered.
    pub async fn clear(&self, pool: &SqlitePool, id: i64) -> Result<(), OrderingError> {
        let mut conn = pool.acquire().await?;
        self.clear_in(&mut conn, id).await
    }

    pub async fn clear_in(&self, conn: &mut SqliteConnection, id: i64) -> Result<(), OrderingError> {
        self.set_membership_in(conn, id, Membership::NotMember).await
    }

    pub async fn clear_many(&self, pool: &SqlitePool, ids: &[i64]) -> Result<(), OrderingError> {
        let mut tx = pool.begin().await?;
        for id in ids {
            self.clear_in(&mut tx, *id).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Write flag and position together.
    pub async fn set_membership_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        membership: Membership,
    ) -> Result<(), OrderingError> {
        let Some(flag) = self.membership_column() else {
            return Err(OrderingError::ImplicitMembership(*self));
        };

        let sql = format!(
            "UPDATE {table} SET {flag} = ?1, {position} = ?2{touch} WHERE id = ?3",
            table = self.table(),
            position = self.position_column(),
            touch = self.touch(),
        );
        let result = sqlx::query(&sql)
            .bind(membership.is_member())
            .bind(membership.position())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrderingError::NotFound {
                collection: *self,
                id,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Full reorder
    // ------------------------------------------------------------------

    /// Rewrite positions to follow `ids`: the i-th listed id gets position i.
    ///
    /// Every id must be a current member and appear once. Members missing
    /// from the list keep their relative order and follow the listed ones,
    /// so the whole collection ends up numbered `0..n`. Nothing is written
    /// if any check fails.
    pub async fn reorder(
        &self,
        pool: &SqlitePool,
        ids: &[i64],
    ) -> Result<Vec<Member>, OrderingError> {
        let mut tx = pool.begin().await?;
        let members = self.reorder_in(&mut tx, ids).await?;
        tx.commit().await?;
        Ok(members)
    }

    pub async fn reorder_in(
        &self,
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> Result<Vec<Member>, OrderingError> {
        if ids.is_empty() {
            return self.list_ordered_in(conn).await;
        }
        self.ensure_unique(ids)?;

        let current = self.list_ordered_in(conn).await?;
        let member_ids: HashSet<i64> = current.iter().map(|m| m.id).collect();
        if let Some(stranger) = ids.iter().find(|id| !member_ids.contains(*id)) {
            return Err(OrderingError::NotMember {
                collection: *self,
                id: *stranger,
            });
        }

        let listed: HashSet<i64> = ids.iter().copied().collect();
        let final_order = ids
            .iter()
            .copied()
            .chain(current.iter().map(|m| m.id).filter(|id| !listed.contains(id)));

        self.write_positions(conn, final_order).await?;
        self.list_ordered_in(conn).await
    }

    /// Renumber the collection `0..n` in its current reader order.
    pub async fn compact(&self, pool: &SqlitePool) -> Result<Vec<Member>, OrderingError> {
        let mut tx = pool.begin().await?;
        let current = self.list_ordered_in(&mut tx).await?;
        self.write_positions(&mut tx, current.iter().map(|m| m.id))
            .await?;
        let members = self.list_ordered_in(&mut tx).await?;
        tx.commit().await?;
        Ok(members)
    }

    async fn write_positions(
        &self,
        conn: &mut SqliteConnection,
        ordered_ids: impl Iterator<Item = i64>,
    ) -> Result<(), OrderingError> {
        let sql = format!(
            "UPDATE {table} SET {position} = ?1{touch} WHERE id = ?2 AND {members}",
            table = self.table(),
            position = self.position_column(),
            touch = self.touch(),
            members = self.member_predicate(),
        );
        for (index, id) in ordered_ids.enumerate() {
            sqlx::query(&sql)
                .bind(index as i64)
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pairwise move
    // ------------------------------------------------------------------

    /// Swap `id` with its neighbour in `direction`.
    ///
    /// Only the two rows are written. Distinct positions are exchanged; a
    /// pair that shares a position (or lacks one) gets two adjacent values
    /// next to the shared one, chosen so every other member keeps its rank.
    /// Only when no such pair of values exists (a run of three or more tied
    /// positions) is the collection renumbered first.
    pub async fn move_adjacent(
        &self,
        pool: &SqlitePool,
        id: i64,
        direction: Direction,
    ) -> Result<MoveOutcome, OrderingError> {
        let mut tx = pool.begin().await?;
        let outcome = self.move_adjacent_in(&mut tx, id, direction).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn move_adjacent_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        direction: Direction,
    ) -> Result<MoveOutcome, OrderingError> {
        let mut members = self.list_ordered_in(conn).await?;
        let Some(index) = members.iter().position(|m| m.id == id) else {
            return Err(OrderingError::NotMember {
                collection: *self,
                id,
            });
        };

        let neighbor_index = match direction {
            Direction::Up if index == 0 => return Ok(MoveOutcome::Unchanged),
            Direction::Down if index + 1 == members.len() => return Ok(MoveOutcome::Unchanged),
            Direction::Up => index - 1,
            Direction::Down => index + 1,
        };
        let upper = index.min(neighbor_index);
        let lower = index.max(neighbor_index);

        let (rising_to, falling_to) = match swapped_positions(&members, upper, lower) {
            Some(values) => values,
            None => {
                self.write_positions(conn, members.iter().map(|m| m.id))
                    .await?;
                members = self.list_ordered_in(conn).await?;
                (members[upper].position, members[lower].position)
            }
        };

        let (moved_to, neighbor_to) = if index == lower {
            (rising_to, falling_to)
        } else {
            (falling_to, rising_to)
        };
        let moved = &members[index];
        let neighbor = &members[neighbor_index];

        let sql = format!(
            "UPDATE {table} SET {position} = ?1{touch} WHERE id = ?2",
            table = self.table(),
            position = self.position_column(),
            touch = self.touch(),
        );
        sqlx::query(&sql)
            .bind(moved_to)
            .bind(moved.id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(&sql)
            .bind(neighbor_to)
            .bind(neighbor.id)
            .execute(&mut *conn)
            .await?;

        Ok(MoveOutcome::Swapped {
            moved: PositionChange {
                id: moved.id,
                from: moved.position,
                to: moved_to,
            },
            neighbor: PositionChange {
                id: neighbor.id,
                from: neighbor.position,
                to: neighbor_to,
            },
        })
    }

    // ------------------------------------------------------------------
    // Backfill
    // ------------------------------------------------------------------

    /// Give members without a position one after the current maximum, oldest
    /// first. Returns how many rows were updated.
    pub async fn backfill_positions(&self, pool: &SqlitePool) -> Result<u64, OrderingError> {
        let mut tx = pool.begin().await?;
        let table = self.table();
        let position = self.position_column();
        let members = self.member_predicate();

        let sql = format!(
            "SELECT id FROM {table} WHERE {members} AND {position} IS NULL ORDER BY created_at ASC, id ASC"
        );
        let unranked: Vec<i64> = sqlx::query_scalar(&sql).fetch_all(&mut *tx).await?;

        let sql = format!("SELECT COALESCE(MAX({position}), -1) FROM {table} WHERE {members}");
        let max: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *tx).await?;

        let sql = format!(
            "UPDATE {table} SET {position} = ?1{touch} WHERE id = ?2",
            touch = self.touch(),
        );
        for (offset, id) in unranked.iter().enumerate() {
            sqlx::query(&sql)
                .bind(max + 1 + offset as i64)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(unranked.len() as u64)
    }

    fn ensure_unique(&self, ids: &[i64]) -> Result<(), OrderingError> {
        let mut seen = HashSet::with_capacity(ids.len());
        match ids.iter().find(|id| !seen.insert(**id)) {
            Some(duplicate) => Err(OrderingError::DuplicateId {
                collection: *self,
                id: *duplicate,
            }),
            None => Ok(()),
        }
    }
}
