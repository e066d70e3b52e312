//! Initial database migration.
//!
//! Creates the enums, tables, indexes, and triggers for the liquidation
//! back office.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(SESSIONS_SQL).await?;
        db.execute_unprepared(STORES_SQL).await?;
        db.execute_unprepared(CASH_ADVANCES_SQL).await?;
        db.execute_unprepared(LIQUIDATIONS_SQL).await?;
        db.execute_unprepared(LIQUIDATION_ITEMS_SQL).await?;
        db.execute_unprepared(ATTACHMENTS_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r"
            DROP TABLE IF EXISTS attachments;
            DROP TABLE IF EXISTS liquidation_items;
            DROP TABLE IF EXISTS liquidations;
            DROP TABLE IF EXISTS cash_advances;
            DROP TABLE IF EXISTS stores;
            DROP TABLE IF EXISTS sessions;
            DROP TABLE IF EXISTS users;
            DROP FUNCTION IF EXISTS set_updated_at();
            DROP TYPE IF EXISTS storage_provider;
            DROP TYPE IF EXISTS liquidation_status;
            DROP TYPE IF EXISTS cash_advance_type;
            DROP TYPE IF EXISTS cash_advance_status;
            DROP TYPE IF EXISTS user_role;
            ",
        )
        .await?;

        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('employee', 'supervisor', 'manager', 'admin');
CREATE TYPE cash_advance_status AS ENUM ('pending', 'approved', 'rejected', 'liquidated');
CREATE TYPE cash_advance_type AS ENUM ('support', 'reimbursement', 'payroll');
CREATE TYPE liquidation_status AS ENUM ('pending', 'level1_approved', 'approved', 'rejected');
CREATE TYPE storage_provider AS ENUM ('s3', 'azure_blob', 'local');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role user_role NOT NULL DEFAULT 'employee',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SESSIONS_SQL: &str = r"
CREATE TABLE sessions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    refresh_token_hash TEXT NOT NULL,
    user_agent TEXT,
    expires_at TIMESTAMPTZ NOT NULL,
    revoked_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_sessions_user ON sessions(user_id);
CREATE INDEX idx_sessions_token_hash ON sessions(refresh_token_hash);
";

const STORES_SQL: &str = r"
CREATE TABLE stores (
    id UUID PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const CASH_ADVANCES_SQL: &str = r"
CREATE TABLE cash_advances (
    id UUID PRIMARY KEY,
    employee_id UUID NOT NULL REFERENCES users(id),
    amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
    status cash_advance_status NOT NULL DEFAULT 'pending',
    advance_type cash_advance_type NOT NULL,
    purpose TEXT NOT NULL,
    advance_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_cash_advances_employee ON cash_advances(employee_id);
CREATE INDEX idx_cash_advances_status ON cash_advances(status);
";

const LIQUIDATIONS_SQL: &str = r"
CREATE TABLE liquidations (
    id UUID PRIMARY KEY,
    cash_advance_id UUID NOT NULL UNIQUE REFERENCES cash_advances(id),
    employee_id UUID NOT NULL REFERENCES users(id),
    store_id UUID NOT NULL REFERENCES stores(id),
    ticket_id UUID,
    liquidation_date DATE NOT NULL,
    remarks TEXT,
    status liquidation_status NOT NULL DEFAULT 'pending',
    advance_amount NUMERIC(12, 2) NOT NULL,
    total_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    return_to_company NUMERIC(12, 2) NOT NULL DEFAULT 0,
    reimbursement NUMERIC(12, 2) NOT NULL DEFAULT 0,
    level1_approved_by UUID REFERENCES users(id),
    level1_approved_at TIMESTAMPTZ,
    level1_comment TEXT,
    level2_approved_by UUID REFERENCES users(id),
    level2_approved_at TIMESTAMPTZ,
    level2_comment TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    deleted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- level ordering: level 2 audit implies level 1 audit
    CONSTRAINT chk_level_ordering CHECK (
        level2_approved_by IS NULL OR level1_approved_by IS NOT NULL
    ),
    -- the split sides are mutually exclusive
    CONSTRAINT chk_split_exclusive CHECK (
        return_to_company = 0 OR reimbursement = 0
    )
);

CREATE INDEX idx_liquidations_employee ON liquidations(employee_id);
CREATE INDEX idx_liquidations_store ON liquidations(store_id);
CREATE INDEX idx_liquidations_status ON liquidations(status) WHERE deleted_at IS NULL;
";

const LIQUIDATION_ITEMS_SQL: &str = r"
CREATE TABLE liquidation_items (
    id UUID PRIMARY KEY,
    liquidation_id UUID NOT NULL REFERENCES liquidations(id) ON DELETE CASCADE,
    expense_date DATE NOT NULL,
    from_destination TEXT NOT NULL,
    to_destination TEXT NOT NULL,
    jeep NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (jeep >= 0),
    bus NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (bus >= 0),
    fx_van NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (fx_van >= 0),
    gas NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (gas >= 0),
    toll NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (toll >= 0),
    meals NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (meals >= 0),
    lodging NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (lodging >= 0),
    others NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (others >= 0),
    remarks TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_liquidation_items_liquidation ON liquidation_items(liquidation_id);
";

const ATTACHMENTS_SQL: &str = r"
CREATE TABLE attachments (
    id UUID PRIMARY KEY,
    liquidation_id UUID NOT NULL REFERENCES liquidations(id) ON DELETE CASCADE,
    liquidation_item_id UUID REFERENCES liquidation_items(id),
    file_name TEXT NOT NULL,
    file_type TEXT NOT NULL,
    file_size BIGINT NOT NULL CHECK (file_size >= 0),
    storage_provider storage_provider NOT NULL,
    storage_bucket TEXT NOT NULL,
    storage_key TEXT NOT NULL,
    uploaded_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_attachments_liquidation ON attachments(liquidation_id);
CREATE INDEX idx_attachments_item ON attachments(liquidation_item_id)
    WHERE liquidation_item_id IS NOT NULL;
";

const TRIGGERS_SQL: &str = r"
CREATE FUNCTION set_updated_at() RETURNS trigger AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
    BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_cash_advances_updated_at
    BEFORE UPDATE ON cash_advances
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";
