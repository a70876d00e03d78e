use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use auditlens_core::analytics::{AnalyticsBackend, Granularity, DETAIL_LIMIT};
use auditlens_core::event::{NewExpressCheck, NewPageView, NewVisit, PageViewExit, VisitEnd};
use auditlens_core::period::DateRange;
use auditlens_duckdb::fixtures::SeedUser;
use auditlens_duckdb::DuckDbBackend;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .expect("date")
        .and_hms_opt(hour, 0, 0)
        .expect("time")
        .and_utc()
}

fn october() -> DateRange {
    DateRange {
        start: at(1, 0),
        end: at(31, 23),
    }
}

fn visit(id: &str, visitor_id: &str, started_at: DateTime<Utc>) -> NewVisit {
    NewVisit {
        id: id.to_string(),
        visitor_id: visitor_id.to_string(),
        session_id: format!("session_{id}"),
        user_id: None,
        ip_address: None,
        user_agent: None,
        referrer: None,
        utm_source: None,
        utm_medium: None,
        utm_campaign: None,
        device_type: Some("desktop".to_string()),
        browser: Some("Chrome".to_string()),
        os: Some("Windows".to_string()),
        country: Some("PL".to_string()),
        city: Some("Warsaw".to_string()),
        started_at,
    }
}

fn page_view(path: &str, visitor_id: &str, entered_at: DateTime<Utc>) -> NewPageView {
    NewPageView {
        id: uuid::Uuid::new_v4().to_string(),
        visit_id: None,
        visitor_id: visitor_id.to_string(),
        session_id: "session".to_string(),
        user_id: None,
        page_path: path.to_string(),
        page_title: None,
        referrer_path: None,
        entered_at,
    }
}

fn check(url: &str, score: f64, user_id: Option<&str>, created_at: DateTime<Utc>) -> NewExpressCheck {
    NewExpressCheck {
        id: uuid::Uuid::new_v4().to_string(),
        visitor_id: Some("visitor_1".to_string()),
        session_id: None,
        user_id: user_id.map(str::to_string),
        website_url: format!("https://{url}/"),
        normalized_url: url.to_string(),
        company_name: None,
        email: None,
        phone: None,
        tax_id: None,
        score_percent: Some(score),
        severity: Some("medium".to_string()),
        result_payload: None,
        ip_address: None,
        user_agent: None,
        conversion_type: "none".to_string(),
        created_at,
    }
}

#[tokio::test]
async fn test_average_session_duration_skips_unclosed_visits() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    for (i, seconds) in [0_i64, 10, 20].into_iter().enumerate() {
        let id = format!("visit_{i}");
        db.insert_visit(&visit(&id, &format!("visitor_{i}"), at(19, 10)))
            .await
            .expect("visit");
        db.close_visit(
            &id,
            &VisitEnd {
                ended_at: at(19, 11),
                total_duration_seconds: seconds,
            },
        )
        .await
        .expect("close");
    }

    let overview = db.get_overview(&october()).await.expect("overview");
    assert_eq!(overview.total_visits, 3);
    assert_eq!(overview.avg_session_duration, 15.0);
}

#[tokio::test]
async fn test_overview_counts_users_and_orders_in_window() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.seed_user(&SeedUser::new("u1", at(5, 9))).await.expect("user");
    db.seed_user(&SeedUser::new("u2", at(20, 9))).await.expect("user");
    db.seed_user(&SeedUser::new("old", at(1, 0) - Duration::days(40)))
        .await
        .expect("user");
    db.insert_express_check(&check("example.com", 70.0, Some("u1"), at(6, 9)))
        .await
        .expect("check");
    db.seed_express_report_order("r1", Some("u1"), "paid", 900.0, at(7, 9))
        .await
        .expect("order");
    db.seed_full_audit_order("a1", Some("u2"), "pending", 5000.0, at(21, 9))
        .await
        .expect("order");

    let overview = db.get_overview(&october()).await.expect("overview");
    assert_eq!(overview.new_users, 2);
    assert_eq!(overview.express_checks, 1);
    assert_eq!(overview.express_report_orders, 1);
    assert_eq!(overview.full_audit_orders, 1);
}

#[tokio::test]
async fn test_page_stats_ordered_by_views() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    for (path, views) in [("/b", 5), ("/a", 9), ("/c", 2)] {
        for i in 0..views {
            let view = page_view(path, &format!("visitor_{}", i % 3), at(19, 10));
            db.insert_page_view(&view).await.expect("page view");
            db.close_page_view(
                &view.id,
                &PageViewExit {
                    exited_at: at(19, 11),
                    duration_seconds: 30,
                    scroll_depth_percent: 50,
                },
            )
            .await
            .expect("close");
        }
    }

    let pages = db.get_page_stats(&october(), 20).await.expect("pages");
    let views: Vec<i64> = pages.iter().map(|p| p.views).collect();
    assert_eq!(views, vec![9, 5, 2]);
    assert_eq!(pages[0].page_path, "/a");
    assert_eq!(pages[0].unique_visitors, 3);
    assert_eq!(pages[0].avg_duration, 30.0);
    assert_eq!(pages[0].avg_scroll_depth, 50.0);

    let top = db.get_page_stats(&october(), 1).await.expect("pages");
    assert_eq!(top.len(), 1);
}

#[tokio::test]
async fn test_conversions_grouped_by_status() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    for i in 0..3 {
        db.seed_express_report_order(&format!("paid_{i}"), None, "paid", 900.0, at(10, 9))
            .await
            .expect("order");
    }
    db.seed_express_report_order("pending_1", None, "pending", 900.0, at(10, 9))
        .await
        .expect("order");
    db.seed_full_audit_order("audit_1", None, "in_progress", 4000.0, at(10, 9))
        .await
        .expect("order");
    db.seed_payment("pay_1", Some("paid_0"), "succeeded", 900.0, at(10, 9))
        .await
        .expect("payment");
    db.seed_payment("pay_2", Some("paid_1"), "succeeded", 900.0, at(10, 9))
        .await
        .expect("payment");
    db.seed_payment("pay_3", Some("pending_1"), "failed", 900.0, at(10, 9))
        .await
        .expect("payment");

    let conversions = db.get_conversions(&october()).await.expect("conversions");

    let paid = conversions
        .express_report_orders
        .iter()
        .find(|r| r.status == "paid")
        .expect("paid group");
    assert_eq!(paid.count, 3);
    assert_eq!(paid.revenue, 2700.0);
    let pending = conversions
        .express_report_orders
        .iter()
        .find(|r| r.status == "pending")
        .expect("pending group");
    assert_eq!(pending.count, 1);

    assert_eq!(conversions.full_audit_orders.len(), 1);
    assert_eq!(conversions.full_audit_orders[0].status, "in_progress");

    assert_eq!(conversions.payments.len(), 1);
    assert_eq!(conversions.payments[0].status, "succeeded");
    assert_eq!(conversions.payments[0].count, 2);
    assert_eq!(conversions.payments[0].amount, 1800.0);
}

async fn drop_table(db: &DuckDbBackend, table: &str) {
    let conn = db.conn_for_test().await;
    conn.execute_batch(&format!("DROP TABLE {table}"))
        .expect("drop table");
}

#[tokio::test]
async fn test_overview_fails_when_any_read_fails() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_visit(&visit("v1", "visitor_1", at(19, 8))).await.expect("visit");
    drop_table(&db, "full_audit_orders").await;

    let err = db
        .get_overview(&october())
        .await
        .expect_err("overview must fail");
    assert!(err.to_string().contains("full_audit_orders"));
}

#[tokio::test]
async fn test_conversions_fail_when_any_read_fails() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    drop_table(&db, "payments").await;

    assert!(db.get_conversions(&october()).await.is_err());
}

#[tokio::test]
async fn test_devices_fail_when_reads_fail() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    drop_table(&db, "visits").await;

    assert!(db.get_devices(&october()).await.is_err());
}

#[tokio::test]
async fn test_timeline_is_sparse_by_day() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_visit(&visit("v1", "visitor_1", at(19, 8))).await.expect("visit");
    db.insert_visit(&visit("v2", "visitor_1", at(19, 17))).await.expect("visit");
    db.insert_visit(&visit("v3", "visitor_2", at(21, 9))).await.expect("visit");
    db.insert_express_check(&check("example.com", 50.0, None, at(21, 9)))
        .await
        .expect("check");

    let timeline = db
        .get_timeline(&october(), Granularity::Day, Tz::UTC)
        .await
        .expect("timeline");

    let buckets: Vec<(&str, i64, i64)> = timeline
        .visits
        .iter()
        .map(|b| (b.bucket.as_str(), b.visits, b.unique_visitors))
        .collect();
    assert_eq!(
        buckets,
        vec![("2026-10-19", 2, 1), ("2026-10-21", 1, 1)]
    );
    assert_eq!(timeline.express_checks.len(), 1);
    assert_eq!(timeline.express_checks[0].bucket, "2026-10-21");
    assert_eq!(timeline.express_checks[0].checks, 1);
}

#[tokio::test]
async fn test_timeline_weeks_use_iso_labels() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    // 2026-10-19 is a Monday.
    db.insert_visit(&visit("v1", "visitor_1", at(19, 8))).await.expect("visit");
    db.insert_visit(&visit("v2", "visitor_2", at(25, 22))).await.expect("visit");
    db.insert_visit(&visit("v3", "visitor_3", at(26, 1))).await.expect("visit");

    let timeline = db
        .get_timeline(&october(), Granularity::Week, Tz::UTC)
        .await
        .expect("timeline");

    let buckets: Vec<(&str, i64)> = timeline
        .visits
        .iter()
        .map(|b| (b.bucket.as_str(), b.visits))
        .collect();
    assert_eq!(buckets, vec![("2026-W43", 2), ("2026-W44", 1)]);
}

#[tokio::test]
async fn test_timeline_hour_and_month_labels() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_visit(&visit("v1", "visitor_1", at(19, 8))).await.expect("visit");

    let hourly = db
        .get_timeline(&october(), Granularity::Hour, Tz::UTC)
        .await
        .expect("timeline");
    assert_eq!(hourly.visits[0].bucket, "2026-10-19 08:00");

    let monthly = db
        .get_timeline(&october(), Granularity::Month, Tz::UTC)
        .await
        .expect("timeline");
    assert_eq!(monthly.visits[0].bucket, "2026-10");
}

fn utc(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2026, month, day)
        .expect("date")
        .and_hms_opt(hour, minute, 0)
        .expect("time")
        .and_utc()
}

#[tokio::test]
async fn test_timeline_buckets_follow_configured_zone() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    // October in Warsaw: CEST (+2) until 2026-10-25 01:00 UTC, then CET (+1).
    let warsaw_october = DateRange {
        start: utc(9, 30, 22, 0),
        end: utc(10, 31, 22, 59),
    };
    db.insert_visit(&visit("v1", "visitor_1", utc(9, 30, 22, 30))).await.expect("visit");
    db.insert_visit(&visit("v2", "visitor_2", utc(10, 18, 23, 30))).await.expect("visit");
    db.insert_visit(&visit("v3", "visitor_2", utc(10, 19, 8, 0))).await.expect("visit");
    db.insert_visit(&visit("v4", "visitor_3", utc(10, 25, 23, 30))).await.expect("visit");
    db.insert_express_check(&check("example.com", 50.0, None, utc(10, 31, 22, 30)))
        .await
        .expect("check");

    let daily = db
        .get_timeline(&warsaw_october, Granularity::Day, Tz::Europe__Warsaw)
        .await
        .expect("timeline");
    let buckets: Vec<(&str, i64, i64)> = daily
        .visits
        .iter()
        .map(|b| (b.bucket.as_str(), b.visits, b.unique_visitors))
        .collect();
    assert_eq!(
        buckets,
        vec![
            ("2026-10-01", 1, 1),
            ("2026-10-19", 2, 1),
            ("2026-10-26", 1, 1),
        ]
    );
    assert_eq!(daily.express_checks[0].bucket, "2026-10-31");

    let hourly = db
        .get_timeline(&warsaw_october, Granularity::Hour, Tz::Europe__Warsaw)
        .await
        .expect("timeline");
    assert_eq!(hourly.visits[0].bucket, "2026-10-01 00:00");
    assert_eq!(hourly.visits[1].bucket, "2026-10-19 01:00");

    let monthly = db
        .get_timeline(&warsaw_october, Granularity::Month, Tz::Europe__Warsaw)
        .await
        .expect("timeline");
    assert_eq!(monthly.visits.len(), 1);
    assert_eq!(monthly.visits[0].bucket, "2026-10");
    assert_eq!(monthly.visits[0].visits, 4);

    let utc_daily = db
        .get_timeline(&warsaw_october, Granularity::Day, Tz::UTC)
        .await
        .expect("timeline");
    let utc_buckets: Vec<&str> = utc_daily.visits.iter().map(|b| b.bucket.as_str()).collect();
    assert_eq!(
        utc_buckets,
        vec!["2026-09-30", "2026-10-18", "2026-10-19", "2026-10-25"]
    );
}

#[tokio::test]
async fn test_devices_cap_browsers_and_label_unknown() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    for i in 0..3 {
        db.insert_visit(&visit(&format!("chrome_{i}"), &format!("c{i}"), at(19, 8)))
            .await
            .expect("visit");
    }
    for i in 0..12 {
        let mut v = visit(&format!("other_{i}"), &format!("o{i}"), at(19, 9));
        v.browser = Some(format!("Browser {i:02}"));
        db.insert_visit(&v).await.expect("visit");
    }
    let mut bare = visit("bare", "b0", at(19, 10));
    bare.device_type = None;
    bare.browser = None;
    bare.os = None;
    db.insert_visit(&bare).await.expect("visit");

    let devices = db.get_devices(&october()).await.expect("devices");

    assert_eq!(devices.browsers.len(), 10);
    assert_eq!(devices.browsers[0].value, "Chrome");
    assert_eq!(devices.browsers[0].count, 3);

    let unknown = devices
        .devices
        .iter()
        .find(|row| row.value == "unknown")
        .expect("unknown device");
    assert_eq!(unknown.count, 1);
    assert_eq!(devices.devices[0].value, "desktop");
    assert_eq!(devices.devices[0].count, 15);
    assert_eq!(devices.devices[0].unique_visitors, 15);

    assert!(devices
        .operating_systems
        .iter()
        .any(|row| row.value == "unknown"));
}

#[tokio::test]
async fn test_visitor_rollup_paginates_most_recent_first() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_visit(&visit("v1", "alice", at(3, 9))).await.expect("visit");
    db.insert_visit(&visit("v2", "alice", at(4, 9))).await.expect("visit");
    db.insert_visit(&visit("v3", "bob", at(10, 9))).await.expect("visit");
    db.insert_visit(&visit("v4", "carol", at(20, 9))).await.expect("visit");
    db.close_visit(
        "v1",
        &VisitEnd {
            ended_at: at(3, 10),
            total_duration_seconds: 100,
        },
    )
    .await
    .expect("close");
    db.close_visit(
        "v2",
        &VisitEnd {
            ended_at: at(4, 10),
            total_duration_seconds: 50,
        },
    )
    .await
    .expect("close");

    let first = db.get_visitor_rollup(&october(), 2, 0).await.expect("page 1");
    let ids: Vec<&str> = first.iter().map(|r| r.visitor_id.as_str()).collect();
    assert_eq!(ids, vec!["carol", "bob"]);

    let second = db.get_visitor_rollup(&october(), 2, 2).await.expect("page 2");
    assert_eq!(second.len(), 1);
    let alice = &second[0];
    assert_eq!(alice.visitor_id, "alice");
    assert_eq!(alice.sessions, 2);
    assert_eq!(alice.total_duration, 150);
    assert_eq!(alice.first_visit, "2026-10-03 09:00:00");
    assert_eq!(alice.last_visit, "2026-10-04 09:00:00");
}

#[tokio::test]
async fn test_express_checks_total_and_top_websites() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    for (score, day) in [(80.0, 5), (90.0, 6), (100.0, 7)] {
        db.insert_express_check(&check("example.com", score, None, at(day, 9)))
            .await
            .expect("check");
    }
    db.insert_express_check(&check("other.org", 50.0, None, at(8, 9)))
        .await
        .expect("check");

    let page = db.get_express_checks(&october(), 2, 0).await.expect("checks");

    assert_eq!(page.total, 4);
    assert_eq!(page.checks.len(), 2);
    assert_eq!(page.checks[0].normalized_url, "other.org");
    assert_eq!(page.limit, 2);
    assert_eq!(page.offset, 0);

    assert_eq!(page.top_websites.len(), 2);
    assert_eq!(page.top_websites[0].normalized_url, "example.com");
    assert_eq!(page.top_websites[0].checks, 3);
    assert_eq!(page.top_websites[0].avg_score, 90.0);
}

#[tokio::test]
async fn test_users_detail_uses_fixed_number_of_queries() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    let base = at(2, 0);
    for i in 0..520 {
        let user = SeedUser::new(&format!("user_{i:03}"), base + Duration::minutes(i));
        db.seed_user(&user).await.expect("user");
    }
    let newest = "user_519";
    db.insert_express_check(&check("example.com", 60.0, Some(newest), at(20, 9)))
        .await
        .expect("check");
    db.insert_express_check(&check("example.com", 70.0, Some(newest), at(21, 9)))
        .await
        .expect("check");
    db.seed_express_report_order("r1", Some(newest), "paid", 900.0, at(21, 10))
        .await
        .expect("order");
    // Lifetime counts: an order from before the window still counts.
    db.seed_full_audit_order("a1", Some(newest), "paid", 5000.0, at(1, 0) - Duration::days(60))
        .await
        .expect("order");

    let before = db.queries_issued();
    let users = db.get_users_detail(&october()).await.expect("users");
    assert_eq!(db.queries_issued() - before, 4);

    assert_eq!(users.len() as i64, DETAIL_LIMIT);
    assert_eq!(users[0].id, newest);
    assert_eq!(users[0].express_checks, 2);
    assert_eq!(users[0].express_report_orders, 1);
    assert_eq!(users[0].full_audit_orders, 1);
    assert_eq!(users[1].express_checks, 0);
}

#[tokio::test]
async fn test_express_detail_joins_user_identity() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.seed_user(&SeedUser::new("u1", at(1, 9))).await.expect("user");
    for i in 0..30 {
        let owner = if i % 2 == 0 { Some("u1") } else { None };
        db.insert_express_check(&check("example.com", 50.0, owner, at(10, 9) + Duration::minutes(i)))
            .await
            .expect("check");
    }

    let before = db.queries_issued();
    let details = db.get_express_detail(&october()).await.expect("details");
    assert_eq!(db.queries_issued() - before, 2);

    assert_eq!(details.len(), 30);
    let owned = details
        .iter()
        .find(|d| d.check.user_id.as_deref() == Some("u1"))
        .expect("owned check");
    assert_eq!(owned.user_email.as_deref(), Some("u1@example.com"));
    assert_eq!(owned.user_name.as_deref(), Some("User u1"));

    let anonymous = details
        .iter()
        .find(|d| d.check.user_id.is_none())
        .expect("anonymous check");
    assert!(anonymous.user_email.is_none());
}
