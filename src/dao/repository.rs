//! Typed access to the sheets on top of a raw [`SheetStore`].
//!
//! Rows are addressed by their data index as returned by `read_rows`; an index
//! is only meaningful until the next deletion on the same sheet, so callers
//! read, decide and write while holding the application write gate.

use std::sync::Arc;

use tracing::debug;

use crate::dao::{
    models::{Sheet, SheetRow},
    sheet_store::SheetStore,
    storage::{StorageError, StorageResult},
};

/// Entity decoded from a sheet together with the data row it came from.
#[derive(Debug, Clone)]
pub struct Indexed<T> {
    pub row: usize,
    pub entity: T,
}

/// Cheap handle over the installed sheet store.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn SheetStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self { store }
    }

    /// Decode every row of `T`'s sheet, skipping blank or malformed rows.
    pub async fn list<T: SheetRow>(&self) -> StorageResult<Vec<Indexed<T>>> {
        let rows = self.store.read_rows(T::SHEET).await?;
        Ok(rows
            .iter()
            .enumerate()
            .filter_map(|(row, cells)| T::from_row(cells).map(|entity| Indexed { row, entity }))
            .collect())
    }

    /// Entities of `T` accepted by `predicate`, in sheet order.
    pub async fn list_where<T, P>(&self, predicate: P) -> StorageResult<Vec<T>>
    where
        T: SheetRow,
        P: Fn(&T) -> bool,
    {
        Ok(self
            .list::<T>()
            .await?
            .into_iter()
            .map(|indexed| indexed.entity)
            .filter(|entity| predicate(entity))
            .collect())
    }

    /// First entity of `T` accepted by `predicate`.
    pub async fn find<T, P>(&self, predicate: P) -> StorageResult<Option<Indexed<T>>>
    where
        T: SheetRow,
        P: Fn(&T) -> bool,
    {
        Ok(self
            .list::<T>()
            .await?
            .into_iter()
            .find(|indexed| predicate(&indexed.entity)))
    }

    pub async fn insert<T: SheetRow>(&self, entity: &T) -> StorageResult<()> {
        self.store.append_row(T::SHEET, entity.to_row()).await
    }

    /// Overwrite a single named cell of a previously read row.
    pub async fn set_cell<T: SheetRow>(
        &self,
        row: usize,
        column: &str,
        value: String,
    ) -> StorageResult<()> {
        let index = column_of(T::SHEET, column)?;
        self.store.update_cell(T::SHEET, row, index, value).await
    }

    /// Delete every entity of `T` accepted by `predicate`, returning how many rows went away.
    pub async fn delete_where<T, P>(&self, predicate: P) -> StorageResult<usize>
    where
        T: SheetRow,
        P: Fn(&T) -> bool,
    {
        let rows: Vec<usize> = self
            .list::<T>()
            .await?
            .into_iter()
            .filter(|indexed| predicate(&indexed.entity))
            .map(|indexed| indexed.row)
            .collect();
        self.delete_rows(T::SHEET, rows).await
    }

    /// Delete every raw row of `sheet` whose `column` cell equals `value`.
    pub async fn delete_by_cell(
        &self,
        sheet: Sheet,
        column: &str,
        value: &str,
    ) -> StorageResult<usize> {
        let index = column_of(sheet, column)?;
        let rows: Vec<usize> = self
            .store
            .read_rows(sheet)
            .await?
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.get(index).map(|cell| cell.trim()) == Some(value))
            .map(|(row, _)| row)
            .collect();
        self.delete_rows(sheet, rows).await
    }

    async fn delete_rows(&self, sheet: Sheet, rows: Vec<usize>) -> StorageResult<usize> {
        let count = rows.len();
        if count > 0 {
            debug!(%sheet, count, "deleting matching rows");
            self.store.delete_rows(sheet, rows).await?;
        }
        Ok(count)
    }
}

fn column_of(sheet: Sheet, column: &str) -> StorageResult<usize> {
    sheet
        .column_index(column)
        .ok_or_else(|| StorageError::UnknownColumn {
            sheet: sheet.to_string(),
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        models::{PlayerEntity, JoinMode},
        sheet_store::memory::MemorySheetStore,
    };

    fn player(id: &str, session: &str, name: &str) -> PlayerEntity {
        PlayerEntity {
            player_id: id.into(),
            session_id: session.into(),
            team_id: None,
            player_name: name.into(),
            join_mode: JoinMode::Single,
            created_at: String::new(),
        }
    }

    async fn repository() -> (MemorySheetStore, Repository) {
        let store = MemorySheetStore::new().await;
        let repository = Repository::new(Arc::new(store.clone()));
        (store, repository)
    }

    #[tokio::test]
    async fn list_keeps_row_indices_across_blank_rows() {
        let (store, repository) = repository().await;
        repository.insert(&player("p1", "AAAAAA", "ann")).await.unwrap();
        store
            .append_row(Sheet::Players, vec![String::new(); 6])
            .await
            .unwrap();
        repository.insert(&player("p2", "AAAAAA", "bob")).await.unwrap();

        let players = repository.list::<PlayerEntity>().await.unwrap();
        let rows: Vec<usize> = players.iter().map(|p| p.row).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[tokio::test]
    async fn set_cell_targets_named_column() {
        let (_, repository) = repository().await;
        repository.insert(&player("p1", "AAAAAA", "ann")).await.unwrap();

        repository
            .set_cell::<PlayerEntity>(0, "playerName", "anna".into())
            .await
            .unwrap();
        let found = repository
            .find::<PlayerEntity, _>(|p| p.player_id == "p1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.entity.player_name, "anna");

        assert!(matches!(
            repository
                .set_cell::<PlayerEntity>(0, "nickname", "x".into())
                .await,
            Err(StorageError::UnknownColumn { .. })
        ));
    }

    #[tokio::test]
    async fn delete_where_removes_only_matches() {
        let (_, repository) = repository().await;
        for (id, session) in [("p1", "AAAAAA"), ("p2", "BBBBBB"), ("p3", "AAAAAA")] {
            repository.insert(&player(id, session, id)).await.unwrap();
        }

        let deleted = repository
            .delete_where::<PlayerEntity, _>(|p| p.session_id == "AAAAAA")
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let left = repository
            .list_where::<PlayerEntity, _>(|_| true)
            .await
            .unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].player_id, "p2");
    }

    #[tokio::test]
    async fn delete_by_cell_matches_raw_values() {
        let (_, repository) = repository().await;
        repository.insert(&player("p1", "AAAAAA", "ann")).await.unwrap();
        repository.insert(&player("p2", "AAAAAA", "bob")).await.unwrap();

        let deleted = repository
            .delete_by_cell(Sheet::Players, "playerName", "bob")
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(
            repository
                .delete_by_cell(Sheet::Players, "playerName", "nobody")
                .await
                .unwrap(),
            0
        );
    }
}
