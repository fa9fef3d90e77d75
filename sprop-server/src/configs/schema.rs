use crate::models::{SensorRecordTable, SystemSettingTable, Table, UserTable};

/// Orders table definitions so every table is created after the tables it references.
pub struct SchemaManager {
    tables: Vec<Box<dyn Table>>,
}

impl SchemaManager {
    pub fn new(tables: Vec<Box<dyn Table>>) -> Self {
        Self { tables: Self::sort_tables(tables) }
    }

    fn sort_tables(mut pending: Vec<Box<dyn Table>>) -> Vec<Box<dyn Table>> {
        let mut sorted: Vec<Box<dyn Table>> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready = pending.iter().position(|table| {
                table
                    .dependencies()
                    .iter()
                    .all(|dep| sorted.iter().any(|done| done.name() == *dep))
            });

            match ready {
                Some(index) => sorted.push(pending.remove(index)),
                None => {
                    let names: Vec<_> = pending.iter().map(|t| t.name()).collect();
                    tracing::error!("unresolved table dependencies, keeping declared order: {:?}", names);
                    sorted.append(&mut pending);
                }
            }
        }

        sorted
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![
            Box::new(SensorRecordTable),
            Box::new(SystemSettingTable),
            Box::new(UserTable),
        ])
    }
}
