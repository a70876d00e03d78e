use async_trait::async_trait;
use chrono_tz::Tz;

use auditlens_core::analytics::{
    AnalyticsBackend, Conversions, Devices, ExpressChecksPage, ExpressDetail, Granularity,
    Overview, PageStat, Timeline, UserDetail, VisitorRollup,
};
use auditlens_core::event::{NewExpressCheck, NewPageView, NewVisit, PageViewExit, VisitEnd};
use auditlens_core::period::DateRange;

use crate::queries;
use crate::DuckDbBackend;

#[async_trait]
impl AnalyticsBackend for DuckDbBackend {
    async fn insert_visit(&self, visit: &NewVisit) -> anyhow::Result<()> {
        DuckDbBackend::insert_visit(self, visit).await
    }

    async fn insert_page_view(&self, page_view: &NewPageView) -> anyhow::Result<bool> {
        DuckDbBackend::insert_page_view(self, page_view).await
    }

    async fn insert_express_check(&self, check: &NewExpressCheck) -> anyhow::Result<()> {
        DuckDbBackend::insert_express_check(self, check).await
    }

    async fn close_page_view(&self, id: &str, exit: &PageViewExit) -> anyhow::Result<bool> {
        DuckDbBackend::close_page_view(self, id, exit).await
    }

    async fn close_visit(&self, id: &str, end: &VisitEnd) -> anyhow::Result<bool> {
        DuckDbBackend::close_visit(self, id, end).await
    }

    async fn get_overview(&self, range: &DateRange) -> anyhow::Result<Overview> {
        queries::overview::get_overview_inner(self, range).await
    }

    async fn get_page_stats(
        &self,
        range: &DateRange,
        limit: i64,
    ) -> anyhow::Result<Vec<PageStat>> {
        queries::pages::get_page_stats_inner(self, range, limit).await
    }

    async fn get_visitor_rollup(
        &self,
        range: &DateRange,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<VisitorRollup>> {
        queries::visitors::get_visitor_rollup_inner(self, range, limit, offset).await
    }

    async fn get_express_checks(
        &self,
        range: &DateRange,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<ExpressChecksPage> {
        queries::express_checks::get_express_checks_inner(self, range, limit, offset).await
    }

    async fn get_conversions(&self, range: &DateRange) -> anyhow::Result<Conversions> {
        queries::conversions::get_conversions_inner(self, range).await
    }

    async fn get_timeline(
        &self,
        range: &DateRange,
        granularity: Granularity,
        tz: Tz,
    ) -> anyhow::Result<Timeline> {
        queries::timeline::get_timeline_inner(self, range, granularity, tz).await
    }

    async fn get_devices(&self, range: &DateRange) -> anyhow::Result<Devices> {
        queries::devices::get_devices_inner(self, range).await
    }

    async fn get_users_detail(&self, range: &DateRange) -> anyhow::Result<Vec<UserDetail>> {
        queries::details::get_users_detail_inner(self, range).await
    }

    async fn get_express_detail(&self, range: &DateRange) -> anyhow::Result<Vec<ExpressDetail>> {
        queries::details::get_express_detail_inner(self, range).await
    }
}
