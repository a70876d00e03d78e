/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `AUDITLENS_DUCKDB_MEMORY`, default `"1GB"`).
///
/// IMPORTANT:
///   - Columns that are updated after insert (`page_count`, `ended_at`,
///     `exited_at`, durations) carry no index. DuckDB rewrites updates on
///     indexed columns as delete + insert, which trips its unique-constraint
///     check when the same row is updated twice in one transaction.
///   - `users` and the order/payment tables belong to other subsystems. They
///     live here so analytics can read them; this crate only writes them
///     through the fixture helpers in `fixtures.rs`.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- VISITS (one browsing session)
-- ===========================================
CREATE TABLE IF NOT EXISTS visits (
    id                      VARCHAR PRIMARY KEY,   -- UUID v4
    visitor_id              VARCHAR NOT NULL,      -- device/browser-stable token
    session_id              VARCHAR NOT NULL,
    user_id                 VARCHAR,               -- NULL for anonymous traffic
    ip_address              VARCHAR,               -- server-derived, never client-supplied
    user_agent              VARCHAR,
    referrer                VARCHAR,
    utm_source              VARCHAR,
    utm_medium              VARCHAR,
    utm_campaign            VARCHAR,
    device_type             VARCHAR,
    browser                 VARCHAR,
    os                      VARCHAR,
    country                 VARCHAR,
    city                    VARCHAR,
    started_at              TIMESTAMP NOT NULL,
    ended_at                TIMESTAMP,             -- set by close; overwritten on re-close
    page_count              BIGINT NOT NULL DEFAULT 0,
    total_duration_seconds  BIGINT NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_visits_started
    ON visits(started_at DESC);
CREATE INDEX IF NOT EXISTS idx_visits_visitor_started
    ON visits(visitor_id, started_at);

-- ===========================================
-- PAGE VIEWS
-- ===========================================
CREATE TABLE IF NOT EXISTS page_views (
    id                      VARCHAR PRIMARY KEY,
    visit_id                VARCHAR,               -- NULL when the begin-visit call was lost
    visitor_id              VARCHAR NOT NULL,
    session_id              VARCHAR NOT NULL,
    user_id                 VARCHAR,
    page_path               VARCHAR NOT NULL,
    page_title              VARCHAR,
    referrer_path           VARCHAR,
    entered_at              TIMESTAMP NOT NULL,
    exited_at               TIMESTAMP,
    duration_seconds        BIGINT NOT NULL DEFAULT 0,
    scroll_depth_percent    BIGINT NOT NULL DEFAULT 0      -- 0-100
);
CREATE INDEX IF NOT EXISTS idx_page_views_entered
    ON page_views(entered_at DESC);
CREATE INDEX IF NOT EXISTS idx_page_views_path_entered
    ON page_views(page_path, entered_at);
CREATE INDEX IF NOT EXISTS idx_page_views_visit
    ON page_views(visit_id);

-- ===========================================
-- EXPRESS CHECKS (append-only)
-- ===========================================
CREATE TABLE IF NOT EXISTS express_checks (
    id                      VARCHAR PRIMARY KEY,
    visitor_id              VARCHAR,
    session_id              VARCHAR,
    user_id                 VARCHAR,
    website_url             VARCHAR NOT NULL,
    normalized_url          VARCHAR NOT NULL,
    company_name            VARCHAR,
    email                   VARCHAR,
    phone                   VARCHAR,
    tax_id                  VARCHAR,
    score_percent           DOUBLE,
    severity                VARCHAR,
    result_payload          VARCHAR,               -- JSON text
    ip_address              VARCHAR,
    user_agent              VARCHAR,
    conversion_type         VARCHAR NOT NULL DEFAULT 'none',
    created_at              TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_express_checks_created
    ON express_checks(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_express_checks_user
    ON express_checks(user_id);
CREATE INDEX IF NOT EXISTS idx_express_checks_url
    ON express_checks(normalized_url, created_at);

-- ===========================================
-- USERS (owned by the auth subsystem; read-only here)
-- ===========================================
CREATE TABLE IF NOT EXISTS users (
    id                      VARCHAR PRIMARY KEY,
    email                   VARCHAR NOT NULL,
    name                    VARCHAR,
    phone                   VARCHAR,
    role                    VARCHAR NOT NULL DEFAULT 'user',
    email_verified_at       TIMESTAMP,
    created_at              TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_users_created
    ON users(created_at DESC);

-- ===========================================
-- ORDER FACTS (owned by ordering/payments; read-only here)
-- ===========================================
CREATE TABLE IF NOT EXISTS express_report_orders (
    id                      VARCHAR PRIMARY KEY,
    user_id                 VARCHAR,
    express_check_id        VARCHAR,
    status                  VARCHAR NOT NULL,
    price                   DOUBLE NOT NULL DEFAULT 0,
    created_at              TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_express_report_orders_created
    ON express_report_orders(created_at, status);
CREATE INDEX IF NOT EXISTS idx_express_report_orders_user
    ON express_report_orders(user_id);

CREATE TABLE IF NOT EXISTS full_audit_orders (
    id                      VARCHAR PRIMARY KEY,
    user_id                 VARCHAR,
    status                  VARCHAR NOT NULL,
    price                   DOUBLE NOT NULL DEFAULT 0,
    created_at              TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_full_audit_orders_created
    ON full_audit_orders(created_at, status);
CREATE INDEX IF NOT EXISTS idx_full_audit_orders_user
    ON full_audit_orders(user_id);

CREATE TABLE IF NOT EXISTS payments (
    id                      VARCHAR PRIMARY KEY,
    user_id                 VARCHAR,
    order_id                VARCHAR,
    status                  VARCHAR NOT NULL,      -- 'pending' | 'succeeded' | 'failed' | ...
    amount                  DOUBLE NOT NULL DEFAULT 0,
    created_at              TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_payments_status_created
    ON payments(status, created_at);
"#
    )
}
