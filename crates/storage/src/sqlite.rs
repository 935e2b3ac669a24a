//! SQLite order store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use policy::{Identity, UserId};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::debug;

use crate::store::{check_new, check_transition};
use crate::{Error, NewOrder, Order, OrderId, OrderStatus, OrderStore, Result};

const COLUMNS: &str = "id, owner, restaurant, item_count, total, status, created_at";

/// SQLite-backed order store.
///
/// The connection sits behind a mutex, so each operation (including the
/// read-modify-write of a status change) runs alone.
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
}

impl SqliteOrderStore {
    /// Open or create an order store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory order store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            owner TEXT NOT NULL,
            restaurant TEXT NOT NULL,
            item_count INTEGER NOT NULL,
            total TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_owner
            ON orders(owner, seq);
        "#,
    )?;
    Ok(())
}

impl OrderStore for SqliteOrderStore {
    fn create(&self, new: NewOrder) -> Result<Order> {
        check_new(&new)?;
        let order = Order::pending(new);
        insert_order(&self.lock(), &order)?;

        debug!(order = %order.id, owner = %order.owner, total = %order.total, "order created");
        Ok(order)
    }

    fn create_if_empty(&self, new: NewOrder) -> Result<Option<Order>> {
        check_new(&new)?;
        let mut conn = self.lock();
        // IMMEDIATE takes the write lock up front, so other processes on the
        // same file wait instead of also seeing an empty table.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(None);
        }
        let order = Order::pending(new);
        insert_order(&tx, &order)?;
        tx.commit()?;

        debug!(order = %order.id, owner = %order.owner, "store seeded");
        Ok(Some(order))
    }

    fn get(&self, id: OrderId) -> Result<Order> {
        let conn = self.lock();
        load_order(&conn, id)
    }

    fn list_for(&self, identity: &Identity) -> Result<Vec<Order>> {
        let conn = self.lock();
        let rows = if identity.is_admin() {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM orders ORDER BY seq"))?;
            let rows = stmt
                .query_map([], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM orders WHERE owner = ?1 ORDER BY seq"
            ))?;
            let rows = stmt
                .query_map([identity.id().as_str()], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        rows.into_iter().map(StoredRow::into_order).collect()
    }

    fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM orders WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let status: OrderStatus = status
            .ok_or(Error::NotFound(id))?
            .parse()
            .map_err(Error::Corrupt)?;
        check_transition(id, status, to)?;

        tx.execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2",
            params![to.as_str(), id.to_string()],
        )?;
        let order = load_order(&tx, id)?;
        tx.commit()?;

        debug!(order = %id, status = %to, "order status changed");
        Ok(order)
    }
}

fn insert_order(conn: &Connection, order: &Order) -> Result<()> {
    conn.execute(
        "INSERT INTO orders (id, owner, restaurant, item_count, total, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            order.id.to_string(),
            order.owner.as_str(),
            order.restaurant,
            order.item_count,
            order.total.to_string(),
            order.status.as_str(),
            order.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn load_order(conn: &Connection, id: OrderId) -> Result<Order> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM orders WHERE id = ?1"),
        [id.to_string()],
        read_row,
    )
    .optional()?
    .ok_or(Error::NotFound(id))?
    .into_order()
}

/// A row as SQLite hands it back, before parsing.
struct StoredRow {
    id: String,
    owner: String,
    restaurant: String,
    item_count: u32,
    total: String,
    status: String,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        id: row.get(0)?,
        owner: row.get(1)?,
        restaurant: row.get(2)?,
        item_count: row.get(3)?,
        total: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl StoredRow {
    fn into_order(self) -> Result<Order> {
        let corrupt = |field: &str, detail: String| {
            Error::Corrupt(format!("order {}: bad {field}: {detail}", self.id))
        };

        Ok(Order {
            id: self.id.parse().map_err(|e: uuid::Error| corrupt("id", e.to_string()))?,
            owner: UserId::new(self.owner.clone()),
            restaurant: self.restaurant.clone(),
            item_count: self.item_count,
            total: self
                .total
                .parse()
                .map_err(|e: rust_decimal::Error| corrupt("total", e.to_string()))?,
            status: self.status.parse().map_err(|e| corrupt("status", e))?,
            created_at: self
                .created_at
                .parse()
                .map_err(|e: chrono::ParseError| corrupt("created_at", e.to_string()))?,
        })
    }
}
