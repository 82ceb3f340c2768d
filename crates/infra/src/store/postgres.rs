//! Postgres-backed warehouse store.
//!
//! A unit of work is one SQL transaction. Transaction rows and item rows are
//! read with `SELECT ... FOR UPDATE`, so concurrent approvals of the same
//! transaction (or of transactions sharing an item) queue behind each other.
//! Two further guards back the row locks:
//!
//! - transaction writes are fenced on the `version` column,
//! - stock writes are compare-and-set on `current_stock`.
//!
//! ## Error Mapping
//!
//! | PostgreSQL code | StoreError | Scenario |
//! |-----------------|------------|----------|
//! | `23505` | `Conflict` | duplicate number / SKU / id |
//! | `40001` | `Conflict` | serialization failure |
//! | `40P01` | `Conflict` | deadlock victim |
//! | other | `Backend` | everything else |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, Row};
use tracing::instrument;
use uuid::Uuid;

use stockroom_core::{
    AggregateRoot, CategoryId, ExpectedVersion, ItemId, MovementId, SupplierId, TransactionId,
    UserId,
};
use stockroom_inventory::{Category, Item, StockMovement, Supplier};
use stockroom_transactions::{Transaction, TransactionHeader, TransactionLine, TransactionRecord};

use super::{MovementFilter, StoreError, UnitOfWork, WarehouseStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS suppliers (
        id           UUID PRIMARY KEY,
        name         TEXT NOT NULL,
        contact_name TEXT NOT NULL DEFAULT '',
        phone        TEXT NOT NULL DEFAULT '',
        email        TEXT NOT NULL DEFAULT '',
        address      TEXT NOT NULL DEFAULT '',
        created_at   TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id            UUID PRIMARY KEY,
        sku           TEXT NOT NULL UNIQUE,
        name          TEXT NOT NULL,
        category_id   UUID NOT NULL REFERENCES categories(id),
        unit          TEXT NOT NULL,
        min_stock     BIGINT NOT NULL CHECK (min_stock >= 0),
        current_stock BIGINT NOT NULL,
        location      TEXT NOT NULL DEFAULT '',
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id              UUID PRIMARY KEY,
        kind            TEXT NOT NULL,
        number          TEXT NOT NULL UNIQUE,
        status          TEXT NOT NULL,
        header          JSONB NOT NULL,
        created_by      UUID NOT NULL,
        created_at      TIMESTAMPTZ NOT NULL,
        updated_at      TIMESTAMPTZ NOT NULL,
        submitted_at    TIMESTAMPTZ NULL,
        approved_by     UUID NULL,
        approved_at     TIMESTAMPTZ NULL,
        signature_image TEXT NULL,
        rejected_by     UUID NULL,
        rejected_at     TIMESTAMPTZ NULL,
        reject_reason   TEXT NULL,
        version         BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transaction_lines (
        transaction_id UUID NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
        line_no        INT NOT NULL,
        item_id        UUID NOT NULL REFERENCES items(id),
        quantity       BIGINT NOT NULL CHECK (quantity > 0),
        unit_price     BIGINT NULL,
        PRIMARY KEY (transaction_id, line_no),
        UNIQUE (transaction_id, item_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_movements (
        seq            BIGSERIAL PRIMARY KEY,
        id             UUID NOT NULL UNIQUE,
        item_id        UUID NOT NULL REFERENCES items(id),
        direction      TEXT NOT NULL CHECK (direction IN ('in', 'out')),
        quantity       BIGINT NOT NULL CHECK (quantity > 0),
        previous_stock BIGINT NOT NULL,
        new_stock      BIGINT NOT NULL,
        reference      TEXT NOT NULL,
        performed_by   UUID NOT NULL,
        notes          TEXT NOT NULL DEFAULT '',
        created_at     TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS stock_movements_item_idx ON stock_movements (item_id, seq)",
];

const SELECT_TRANSACTION: &str = r#"
    SELECT id, kind, number, status, header, created_by, created_at, updated_at,
           submitted_at, approved_by, approved_at, signature_image,
           rejected_by, rejected_at, reject_reason, version
    FROM transactions
    WHERE id = $1
"#;

const SELECT_ITEM: &str = r#"
    SELECT id, sku, name, category_id, unit, min_stock, current_stock, location,
           created_at, updated_at
    FROM items
"#;

/// Postgres-backed warehouse store.
///
/// Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct PostgresWarehouseStore {
    pool: Arc<PgPool>,
}

impl PostgresWarehouseStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes that do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<Postgres>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))
    }
}

#[async_trait]
impl WarehouseStore for PostgresWarehouseStore {
    type Uow = PostgresUnitOfWork;

    async fn begin(&self) -> Result<Self::Uow, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresUnitOfWork { tx })
    }

    #[instrument(skip(self), fields(transaction_id = %id), err)]
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_transaction(&mut *conn, id, false).await
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let sql = format!("{SELECT_ITEM} WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;
        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_low_stock_items(&self) -> Result<Vec<Item>, StoreError> {
        let sql = format!("{SELECT_ITEM} WHERE current_stock <= min_stock ORDER BY sku ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_low_stock_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<StockMovement>, StoreError> {
        let item_param: Option<Uuid> = filter.item_id.map(|id| *id.as_uuid());
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, direction, quantity, previous_stock, new_stock,
                   reference, performed_by, notes, created_at
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR item_id = $1)
            ORDER BY seq ASC
            "#,
        )
        .bind(item_param)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;
        rows.iter().map(movement_from_row).collect()
    }
}

/// One SQL transaction. Dropping it without `commit` rolls back.
pub struct PostgresUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PostgresUnitOfWork {
    async fn write_lines(
        &mut self,
        id: TransactionId,
        lines: &[TransactionLine],
    ) -> Result<(), StoreError> {
        for (line_no, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_lines (transaction_id, line_no, item_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id.as_uuid())
            .bind(line_no as i32)
            .bind(line.item_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_transaction_line", e))?;
        }
        Ok(())
    }

    async fn exists(&mut self, operation: &str, sql: &str, key: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query(sql)
            .bind(key)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        column(&row, "found")
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn lock_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        fetch_transaction(&mut *self.tx, id, true).await
    }

    async fn transaction_number_exists(&mut self, number: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM transactions WHERE number = $1) AS found")
            .bind(number)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("transaction_number_exists", e))?;
        column(&row, "found")
    }

    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.id()), err)]
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        let r = transaction.record();
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, kind, number, status, header, created_by, created_at, updated_at,
                submitted_at, approved_by, approved_at, signature_image,
                rejected_by, rejected_at, reject_reason, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(r.id.as_uuid())
        .bind(r.kind.as_str())
        .bind(&r.number)
        .bind(r.status.as_str())
        .bind(Json(&r.header))
        .bind(r.created_by.as_uuid())
        .bind(r.created_at)
        .bind(r.updated_at)
        .bind(r.submitted_at)
        .bind(r.approved_by.map(Uuid::from))
        .bind(r.approved_at)
        .bind(r.signature_image.as_deref())
        .bind(r.rejected_by.map(Uuid::from))
        .bind(r.rejected_at)
        .bind(r.reject_reason.as_deref())
        .bind(r.version as i64)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_transaction", e))?;

        self.write_lines(r.id, &r.lines).await
    }

    #[instrument(
        skip(self, transaction),
        fields(transaction_id = %transaction.id(), expected = ?expected),
        err
    )]
    async fn update_transaction(
        &mut self,
        transaction: &Transaction,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let r = transaction.record();
        let expected_param: Option<i64> = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(v as i64),
        };

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $2, header = $3, updated_at = $4, submitted_at = $5,
                approved_by = $6, approved_at = $7, signature_image = $8,
                rejected_by = $9, rejected_at = $10, reject_reason = $11, version = $12
            WHERE id = $1 AND ($13::BIGINT IS NULL OR version = $13)
            "#,
        )
        .bind(r.id.as_uuid())
        .bind(r.status.as_str())
        .bind(Json(&r.header))
        .bind(r.updated_at)
        .bind(r.submitted_at)
        .bind(r.approved_by.map(Uuid::from))
        .bind(r.approved_at)
        .bind(r.signature_image.as_deref())
        .bind(r.rejected_by.map(Uuid::from))
        .bind(r.rejected_at)
        .bind(r.reject_reason.as_deref())
        .bind(transaction.version() as i64)
        .bind(expected_param)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_transaction", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "transaction {} changed concurrently (expected {expected:?})",
                r.id
            )));
        }

        sqlx::query("DELETE FROM transaction_lines WHERE transaction_id = $1")
            .bind(r.id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("replace_transaction_lines", e))?;
        self.write_lines(r.id, &r.lines).await
    }

    async fn delete_transaction(&mut self, id: TransactionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_transaction", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let sql = format!("{SELECT_ITEM} WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_item", e))?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn item_exists(&mut self, id: ItemId) -> Result<bool, StoreError> {
        self.exists(
            "item_exists",
            "SELECT EXISTS (SELECT 1 FROM items WHERE id = $1) AS found",
            *id.as_uuid(),
        )
        .await
    }

    async fn sku_exists(&mut self, sku: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM items WHERE sku = $1) AS found")
            .bind(sku)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("sku_exists", e))?;
        column(&row, "found")
    }

    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id, sku, name, category_id, unit, min_stock, current_stock, location,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.category_id.as_uuid())
        .bind(&item.unit)
        .bind(item.min_stock)
        .bind(item.current_stock)
        .bind(&item.location)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    #[instrument(skip(self, at), fields(item_id = %id), err)]
    async fn compare_and_set_stock(
        &mut self,
        id: ItemId,
        expected: i64,
        new_stock: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET current_stock = $3, updated_at = $4
            WHERE id = $1 AND current_stock = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected)
        .bind(new_stock)
        .bind(at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("compare_and_set_stock", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "item {id} stock is no longer {expected}"
            )));
        }
        Ok(())
    }

    async fn append_movement(&mut self, movement: &StockMovement) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, item_id, direction, quantity, previous_stock, new_stock,
                reference, performed_by, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.item_id.as_uuid())
        .bind(movement.direction.as_str())
        .bind(movement.quantity)
        .bind(movement.previous_stock)
        .bind(movement.new_stock)
        .bind(&movement.reference)
        .bind(movement.performed_by.as_uuid())
        .bind(&movement.notes)
        .bind(movement.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_movement", e))?;
        Ok(())
    }

    async fn category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at FROM categories WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("category", e))?;

        row.map(|row| {
            Ok(Category {
                id: CategoryId::from_uuid(column(&row, "id")?),
                name: column(&row, "name")?,
                description: column(&row, "description")?,
                created_at: column(&row, "created_at")?,
            })
        })
        .transpose()
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(())
    }

    async fn supplier_exists(&mut self, id: SupplierId) -> Result<bool, StoreError> {
        self.exists(
            "supplier_exists",
            "SELECT EXISTS (SELECT 1 FROM suppliers WHERE id = $1) AS found",
            *id.as_uuid(),
        )
        .await
    }

    async fn insert_supplier(&mut self, supplier: &Supplier) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, contact_name, phone, email, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(&supplier.contact_name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

async fn fetch_transaction(
    conn: &mut PgConnection,
    id: TransactionId,
    for_update: bool,
) -> Result<Option<Transaction>, StoreError> {
    let sql = if for_update {
        format!("{SELECT_TRANSACTION} FOR UPDATE")
    } else {
        SELECT_TRANSACTION.to_string()
    };

    let Some(row) = sqlx::query(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("fetch_transaction", e))?
    else {
        return Ok(None);
    };

    let line_rows = sqlx::query(
        r#"
        SELECT item_id, quantity, unit_price
        FROM transaction_lines
        WHERE transaction_id = $1
        ORDER BY line_no ASC
        "#,
    )
    .bind(id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_transaction_lines", e))?;

    let lines = line_rows
        .iter()
        .map(|row| {
            Ok(TransactionLine {
                item_id: ItemId::from_uuid(column(row, "item_id")?),
                quantity: column(row, "quantity")?,
                unit_price: column(row, "unit_price")?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    transaction_from_row(&row, lines).map(Some)
}

fn transaction_from_row(row: &PgRow, lines: Vec<TransactionLine>) -> Result<Transaction, StoreError> {
    let kind: String = column(row, "kind")?;
    let status: String = column(row, "status")?;
    let header: Json<TransactionHeader> = column(row, "header")?;
    let version: i64 = column(row, "version")?;
    let approved_by: Option<Uuid> = column(row, "approved_by")?;
    let rejected_by: Option<Uuid> = column(row, "rejected_by")?;

    let record = TransactionRecord {
        id: TransactionId::from_uuid(column(row, "id")?),
        kind: kind.parse().map_err(corrupt)?,
        number: column(row, "number")?,
        status: status.parse().map_err(corrupt)?,
        header: header.0,
        lines,
        created_by: UserId::from_uuid(column(row, "created_by")?),
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
        submitted_at: column(row, "submitted_at")?,
        approved_by: approved_by.map(UserId::from_uuid),
        approved_at: column(row, "approved_at")?,
        signature_image: column(row, "signature_image")?,
        rejected_by: rejected_by.map(UserId::from_uuid),
        rejected_at: column(row, "rejected_at")?,
        reject_reason: column(row, "reject_reason")?,
        version: version as u64,
    };

    Transaction::restore(record).map_err(corrupt)
}

fn item_from_row(row: &PgRow) -> Result<Item, StoreError> {
    Ok(Item {
        id: ItemId::from_uuid(column(row, "id")?),
        sku: column(row, "sku")?,
        name: column(row, "name")?,
        category_id: CategoryId::from_uuid(column(row, "category_id")?),
        unit: column(row, "unit")?,
        min_stock: column(row, "min_stock")?,
        current_stock: column(row, "current_stock")?,
        location: column(row, "location")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn movement_from_row(row: &PgRow) -> Result<StockMovement, StoreError> {
    let direction: String = column(row, "direction")?;
    Ok(StockMovement {
        id: MovementId::from_uuid(column(row, "id")?),
        item_id: ItemId::from_uuid(column(row, "item_id")?),
        direction: direction.parse().map_err(corrupt)?,
        quantity: column(row, "quantity")?,
        previous_stock: column(row, "previous_stock")?,
        new_stock: column(row, "new_stock")?,
        reference: column(row, "reference")?,
        performed_by: UserId::from_uuid(column(row, "performed_by")?),
        notes: column(row, "notes")?,
        created_at: column(row, "created_at")?,
    })
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("failed to read column {name}: {e}")))
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
