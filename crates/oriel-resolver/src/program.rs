use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use oriel_symbols::SymbolTable;

/// The symbol space shared by every unit of a run.
///
/// Readers share the lock; merging, instantiation, type assignment and
/// hierarchy links take it exclusively, one writer at a time.
#[derive(Debug, Default)]
pub struct Program {
    table: RwLock<SymbolTable>,
}

impl Program {
    pub fn new(table: SymbolTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SymbolTable> {
        self.table.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, SymbolTable> {
        self.table.write()
    }

    pub fn into_table(self) -> SymbolTable {
        self.table.into_inner()
    }
}
