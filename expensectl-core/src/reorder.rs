//! Kanban reorder planning
//!
//! Pure functions over a snapshot of a board: where did a drop land, and
//! which stored `(column, order)` pairs must change so that every affected
//! column reads 0..n again. The server applies a plan inside one transaction.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::BoardWithColumns;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("card {0} is not on this board")]
    UnknownCard(Uuid),

    #[error("column {0} is not on this board")]
    UnknownColumn(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnSlots {
    id: Uuid,
    /// (card id, stored order), sorted by stored order
    cards: Vec<(Uuid, u32)>,
}

/// Snapshot of a board's columns and the cards in each, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardLayout {
    columns: Vec<ColumnSlots>,
}

impl BoardLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Cards are sorted by their stored order; ties keep
    /// the given sequence.
    pub fn push_column<I>(&mut self, id: Uuid, cards: I)
    where
        I: IntoIterator<Item = (Uuid, u32)>,
    {
        let mut cards: Vec<(Uuid, u32)> = cards.into_iter().collect();
        cards.sort_by_key(|(_, order)| *order);
        self.columns.push(ColumnSlots { id, cards });
    }

    pub fn with_column<I>(mut self, id: Uuid, cards: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, u32)>,
    {
        self.push_column(id, cards);
        self
    }

    pub fn from_board(board: &BoardWithColumns) -> Self {
        let mut layout = Self::new();
        for column in &board.columns {
            layout.push_column(
                column.column.id,
                column.cards.iter().map(|card| (card.id, card.order)),
            );
        }
        layout
    }

    pub fn column_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.columns.iter().map(|c| c.id)
    }

    /// Card ids of a column in display order
    pub fn cards_in(&self, column: Uuid) -> Option<Vec<Uuid>> {
        self.columns
            .iter()
            .find(|c| c.id == column)
            .map(|c| c.cards.iter().map(|(id, _)| *id).collect())
    }

    /// Column and position of a card
    pub fn locate(&self, card: Uuid) -> Option<(Uuid, usize)> {
        self.find_card(card)
            .map(|(col_idx, pos)| (self.columns[col_idx].id, pos))
    }

    fn column_index(&self, column: Uuid) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column)
    }

    fn find_card(&self, card: Uuid) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(col_idx, column)| {
            column
                .cards
                .iter()
                .position(|(id, _)| *id == card)
                .map(|pos| (col_idx, pos))
        })
    }

    /// Update the snapshot as if the plan had been written.
    pub fn apply(&mut self, placements: &[Placement]) {
        for placement in placements {
            for column in &mut self.columns {
                column.cards.retain(|(id, _)| *id != placement.card);
            }
        }
        for placement in placements {
            if let Some(idx) = self.column_index(placement.column) {
                self.columns[idx].cards.push((placement.card, placement.order));
            }
        }
        for column in &mut self.columns {
            column.cards.sort_by_key(|(_, order)| *order);
        }
    }
}

/// Where a dragged card should land
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropTarget {
    pub column: Uuid,
    pub position: usize,
}

/// New stored location of one card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub card: Uuid,
    pub column: Uuid,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePlan {
    pub card: Uuid,
    pub from_column: Uuid,
    pub to_column: Uuid,
    pub order: u32,
    /// Only the cards whose stored column or order differs
    pub updates: Vec<Placement>,
}

impl MovePlan {
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn changes_column(&self) -> bool {
        self.from_column != self.to_column
    }
}

/// Resolve the element a card was released over.
///
/// Over a column appends to it; over a card takes that card's position.
/// Returns `None` when either id is not on the board.
pub fn resolve_drop(layout: &BoardLayout, card: Uuid, over: Uuid) -> Option<DropTarget> {
    layout.find_card(card)?;

    if let Some(idx) = layout.column_index(over) {
        let column = &layout.columns[idx];
        let len = column.cards.len();
        // already in this column: append means last slot after removal
        let position = if column.cards.iter().any(|(id, _)| *id == card) {
            len - 1
        } else {
            len
        };
        return Some(DropTarget {
            column: column.id,
            position,
        });
    }

    layout
        .locate(over)
        .map(|(column, position)| DropTarget { column, position })
}

/// Dense orders for a sequence of ids
pub fn reindex(ids: &[Uuid]) -> Vec<(Uuid, u32)> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (*id, i as u32))
        .collect()
}

fn collect_changes(stored: &[(Uuid, u32)], sequence: &[Uuid], column: Uuid, out: &mut Vec<Placement>) {
    for (card, order) in reindex(sequence) {
        let previous = stored.iter().find(|(id, _)| *id == card).map(|(_, o)| *o);
        if previous != Some(order) {
            out.push(Placement { card, column, order });
        }
    }
}

/// Plan moving `card` to `position` in `target_column`.
///
/// Position is clamped to the target length (excluding the card itself).
pub fn plan_move(
    layout: &BoardLayout,
    card: Uuid,
    target_column: Uuid,
    position: usize,
) -> Result<MovePlan, ReorderError> {
    let (source_idx, _) = layout
        .find_card(card)
        .ok_or(ReorderError::UnknownCard(card))?;
    let target_idx = layout
        .column_index(target_column)
        .ok_or(ReorderError::UnknownColumn(target_column))?;

    let source = &layout.columns[source_idx];
    let mut source_seq: Vec<Uuid> = source
        .cards
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| *id != card)
        .collect();

    let mut updates = Vec::new();
    let position = if source_idx == target_idx {
        let position = position.min(source_seq.len());
        source_seq.insert(position, card);
        collect_changes(&source.cards, &source_seq, source.id, &mut updates);
        position
    } else {
        let target = &layout.columns[target_idx];
        let mut target_seq: Vec<Uuid> = target.cards.iter().map(|(id, _)| *id).collect();
        let position = position.min(target_seq.len());
        target_seq.insert(position, card);
        collect_changes(&source.cards, &source_seq, source.id, &mut updates);
        collect_changes(&target.cards, &target_seq, target.id, &mut updates);
        position
    };

    Ok(MovePlan {
        card,
        from_column: source.id,
        to_column: target_column,
        order: position as u32,
        updates,
    })
}

/// Reindex a card's column as if the card were gone.
pub fn plan_removal(layout: &BoardLayout, card: Uuid) -> Result<Vec<Placement>, ReorderError> {
    let (col_idx, _) = layout
        .find_card(card)
        .ok_or(ReorderError::UnknownCard(card))?;
    let column = &layout.columns[col_idx];
    let remaining: Vec<Uuid> = column
        .cards
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| *id != card)
        .collect();

    let mut updates = Vec::new();
    collect_changes(&column.cards, &remaining, column.id, &mut updates);
    Ok(updates)
}

/// Plan moving a column within its board.
///
/// `columns` are `(id, stored order)`; returns the columns whose order changes.
pub fn plan_column_move(
    columns: &[(Uuid, u32)],
    column: Uuid,
    position: usize,
) -> Result<Vec<(Uuid, u32)>, ReorderError> {
    let mut stored = columns.to_vec();
    stored.sort_by_key(|(_, order)| *order);
    if !stored.iter().any(|(id, _)| *id == column) {
        return Err(ReorderError::UnknownColumn(column));
    }

    let mut sequence: Vec<Uuid> = stored
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| *id != column)
        .collect();
    sequence.insert(position.min(sequence.len()), column);

    // reuse the card planner with the board itself as the only "column"
    let board = Uuid::nil();
    let mut updates = Vec::new();
    collect_changes(&stored, &sequence, board, &mut updates);
    Ok(updates.into_iter().map(|p| (p.card, p.order)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn dense(cards: &[Uuid]) -> Vec<(Uuid, u32)> {
        reindex(cards)
    }

    struct Fixture {
        layout: BoardLayout,
        todo: Uuid,
        done: Uuid,
        todo_cards: Vec<Uuid>,
        done_cards: Vec<Uuid>,
    }

    fn fixture() -> Fixture {
        let (todo, done) = (Uuid::new_v4(), Uuid::new_v4());
        let todo_cards = ids(3);
        let done_cards = ids(2);
        let layout = BoardLayout::new()
            .with_column(todo, dense(&todo_cards))
            .with_column(done, dense(&done_cards));
        Fixture {
            layout,
            todo,
            done,
            todo_cards,
            done_cards,
        }
    }

    #[test]
    fn drop_on_column_appends() {
        let f = fixture();
        let target = resolve_drop(&f.layout, f.todo_cards[0], f.done).unwrap();
        assert_eq!(target, DropTarget { column: f.done, position: 2 });
    }

    #[test]
    fn drop_on_own_column_goes_last() {
        let f = fixture();
        let target = resolve_drop(&f.layout, f.todo_cards[0], f.todo).unwrap();
        assert_eq!(target.position, 2);
    }

    #[test]
    fn drop_on_card_takes_its_position() {
        let f = fixture();
        let target = resolve_drop(&f.layout, f.todo_cards[2], f.done_cards[1]).unwrap();
        assert_eq!(target, DropTarget { column: f.done, position: 1 });
    }

    #[test]
    fn drop_on_unknown_is_none() {
        let f = fixture();
        assert!(resolve_drop(&f.layout, f.todo_cards[0], Uuid::new_v4()).is_none());
        assert!(resolve_drop(&f.layout, Uuid::new_v4(), f.done).is_none());
    }

    #[test]
    fn cross_column_move_reindexes_both() {
        let mut f = fixture();
        let card = f.todo_cards[0];
        let plan = plan_move(&f.layout, card, f.done, 1).unwrap();
        assert!(plan.changes_column());
        assert_eq!(plan.order, 1);

        f.layout.apply(&plan.updates);
        assert_eq!(
            f.layout.cards_in(f.todo).unwrap(),
            vec![f.todo_cards[1], f.todo_cards[2]]
        );
        assert_eq!(
            f.layout.cards_in(f.done).unwrap(),
            vec![f.done_cards[0], card, f.done_cards[1]]
        );
        // done_cards[0] keeps order 0 so it is not rewritten
        assert!(plan.updates.iter().all(|p| p.card != f.done_cards[0]));
    }

    #[test]
    fn same_column_move_reorders() {
        let mut f = fixture();
        let plan = plan_move(&f.layout, f.todo_cards[0], f.todo, 2).unwrap();
        assert!(!plan.changes_column());
        f.layout.apply(&plan.updates);
        assert_eq!(
            f.layout.cards_in(f.todo).unwrap(),
            vec![f.todo_cards[1], f.todo_cards[2], f.todo_cards[0]]
        );
    }

    #[test]
    fn move_to_own_slot_is_noop() {
        let f = fixture();
        let plan = plan_move(&f.layout, f.todo_cards[1], f.todo, 1).unwrap();
        assert!(plan.is_noop());
    }

    #[test]
    fn position_is_clamped() {
        let mut f = fixture();
        let plan = plan_move(&f.layout, f.todo_cards[0], f.done, 99).unwrap();
        assert_eq!(plan.order, 2);
        f.layout.apply(&plan.updates);
        assert_eq!(f.layout.cards_in(f.done).unwrap()[2], f.todo_cards[0]);
    }

    #[test]
    fn gaps_are_closed() {
        let column = Uuid::new_v4();
        let cards = ids(3);
        let layout = BoardLayout::new()
            .with_column(column, vec![(cards[0], 0), (cards[1], 4), (cards[2], 9)]);
        let plan = plan_move(&layout, cards[0], column, 0).unwrap();
        let orders: Vec<_> = plan.updates.iter().map(|p| (p.card, p.order)).collect();
        assert_eq!(orders, vec![(cards[1], 1), (cards[2], 2)]);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let f = fixture();
        let stray = Uuid::new_v4();
        assert_eq!(
            plan_move(&f.layout, stray, f.done, 0),
            Err(ReorderError::UnknownCard(stray))
        );
        assert_eq!(
            plan_move(&f.layout, f.todo_cards[0], stray, 0),
            Err(ReorderError::UnknownColumn(stray))
        );
    }

    #[test]
    fn removal_reindexes_remaining() {
        let f = fixture();
        let updates = plan_removal(&f.layout, f.todo_cards[0]).unwrap();
        let orders: Vec<_> = updates.iter().map(|p| (p.card, p.order)).collect();
        assert_eq!(orders, vec![(f.todo_cards[1], 0), (f.todo_cards[2], 1)]);
        assert!(plan_removal(&f.layout, f.todo_cards[2]).unwrap().is_empty());
    }

    #[test]
    fn column_move_reorders_columns() {
        let cols = ids(4);
        let updates = plan_column_move(&dense(&cols), cols[3], 0).unwrap();
        assert_eq!(
            updates,
            vec![(cols[3], 0), (cols[0], 1), (cols[1], 2), (cols[2], 3)]
        );
        assert!(plan_column_move(&dense(&cols), Uuid::new_v4(), 0).is_err());
    }

    #[test]
    fn layout_from_board() {
        use crate::models::{Board, Card, Column};
        use chrono::Utc;

        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: "b".into(),
            created_at: now,
        };
        let column = Column {
            id: Uuid::new_v4(),
            board_id: board.id,
            user_id: Uuid::nil(),
            name: "To Log".into(),
            order: 0,
            created_at: now,
        };
        let card = Card {
            id: Uuid::new_v4(),
            board_id: board.id,
            column_id: column.id,
            user_id: Uuid::nil(),
            title: "c".into(),
            description: String::new(),
            labels: vec![],
            order: 0,
            due_date: None,
            expense_id: None,
            created_at: now,
            updated_at: now,
        };
        let full = BoardWithColumns::assemble(board, vec![column.clone()], vec![card.clone()]);
        let layout = BoardLayout::from_board(&full);
        assert_eq!(layout.locate(card.id), Some((column.id, 0)));
    }

    fn arb_layout() -> impl Strategy<Value = (BoardLayout, Vec<Uuid>, Vec<Uuid>)> {
        prop::collection::vec(0usize..6, 1..5).prop_map(|sizes| {
            let mut layout = BoardLayout::new();
            let mut columns = Vec::new();
            let mut cards = Vec::new();
            for size in sizes {
                let column = Uuid::new_v4();
                let column_cards = ids(size);
                layout.push_column(column, dense(&column_cards));
                columns.push(column);
                cards.extend(column_cards);
            }
            (layout, columns, cards)
        })
    }

    proptest! {
        #[test]
        fn moves_keep_columns_dense_and_cards_intact(
            (layout, columns, cards) in arb_layout(),
            card_pick in any::<prop::sample::Index>(),
            column_pick in any::<prop::sample::Index>(),
            position in 0usize..10,
        ) {
            prop_assume!(!cards.is_empty());
            let card = cards[card_pick.index(cards.len())];
            let target = columns[column_pick.index(columns.len())];

            let plan = plan_move(&layout, card, target, position).unwrap();
            let mut after = layout.clone();
            after.apply(&plan.updates);

            let mut seen = Vec::new();
            for column in &after.columns {
                let orders: Vec<u32> = column.cards.iter().map(|(_, o)| *o).collect();
                let expected: Vec<u32> = (0..orders.len() as u32).collect();
                prop_assert_eq!(orders, expected);
                seen.extend(column.cards.iter().map(|(id, _)| *id));
            }
            seen.sort();
            let mut all = cards.clone();
            all.sort();
            prop_assert_eq!(seen, all);

            let (column, pos) = after.locate(card).unwrap();
            prop_assert_eq!(column, target);
            prop_assert_eq!(pos as u32, plan.order);
        }

        #[test]
        fn replanning_a_finished_move_is_noop(
            (layout, columns, cards) in arb_layout(),
            card_pick in any::<prop::sample::Index>(),
            column_pick in any::<prop::sample::Index>(),
            position in 0usize..10,
        ) {
            prop_assume!(!cards.is_empty());
            let card = cards[card_pick.index(cards.len())];
            let target = columns[column_pick.index(columns.len())];

            let plan = plan_move(&layout, card, target, position).unwrap();
            let mut after = layout.clone();
            after.apply(&plan.updates);

            let again = plan_move(&after, card, target, plan.order as usize).unwrap();
            prop_assert!(again.is_noop());
        }
    }
}
