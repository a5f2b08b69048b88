use crate::core::accessibility::classify_region;
use crate::core::cache::{RegionCache, RegionState};
use crate::core::loader::{fetch_region_data, load_catalog};
use crate::core::registry::FacilityRegistry;
use crate::core::scheduler::{UpdateScheduler, DEFAULT_QUIET_PERIOD};
use crate::core::summary::compute_summary;
use crate::domain::model::{
    Region, RegionData, RegionView, RenderProgress, SummaryRow, SummaryScope,
};
use crate::domain::ports::{DataSource, Presenter};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub quiet_period: Duration,
    pub scope: Option<SummaryScope>, // None: 目錄第一個地區
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            scope: None,
        }
    }
}

#[derive(Debug)]
pub struct SessionState {
    pub cache: RegionCache,
    pub registry: FacilityRegistry,
    pub scope: SummaryScope,
}

impl SessionState {
    fn view(&self, code: &str) -> Option<(Region, Arc<RegionData>, RegionView)> {
        let region = self.cache.region(code)?.clone();
        let data = self.cache.loaded(code)?;
        let view = RegionView {
            region_code: region.code.clone(),
            cells: classify_region(&data, self.registry.active_set()),
            markers: self.registry.markers(code),
        };
        Some((region, data, view))
    }

    fn summary(&self) -> Vec<SummaryRow> {
        compute_summary(&self.cache, &self.scope, self.registry.active_set())
    }
}

struct Inner {
    source: Arc<dyn DataSource>,
    presenter: Arc<dyn Presenter>,
    state: Mutex<SessionState>,
    scheduler: UpdateScheduler,
}

/// One visualization session: owns the region cache, the facility selection
/// and the debounced recompute. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub async fn open(
        source: Arc<dyn DataSource>,
        presenter: Arc<dyn Presenter>,
        options: SessionOptions,
    ) -> Result<Self> {
        let catalog = load_catalog(source.as_ref()).await?;
        let scope = options.scope.unwrap_or_else(|| {
            catalog
                .regions
                .first()
                .map(|r| SummaryScope::Region(r.code.clone()))
                .unwrap_or_default()
        });
        let registry = FacilityRegistry::new(catalog.facilities);
        presenter.active_count(registry.active_count(), registry.total_count());

        Ok(Self {
            inner: Arc::new(Inner {
                source,
                presenter,
                state: Mutex::new(SessionState {
                    cache: RegionCache::new(catalog.regions),
                    registry,
                    scope,
                }),
                scheduler: UpdateScheduler::new(options.quiet_period),
            }),
        })
    }

    pub async fn start(
        source: Arc<dyn DataSource>,
        presenter: Arc<dyn Presenter>,
        options: SessionOptions,
    ) -> Result<Self> {
        let result = Self::open(source, Arc::clone(&presenter), options).await;
        let session = match result {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("❌ Startup failed while loading catalog: {}", e);
                presenter.startup_finished();
                return Err(e);
            }
        };

        session.load_all().await;
        session.render_all().await;
        session.publish_summary().await;
        presenter.startup_finished();
        Ok(session)
    }

    /// Single-flight per region: a no-op unless the region has never been attempted.
    pub async fn load_region(&self, code: &str) -> Result<()> {
        let region = {
            let mut state = self.inner.state.lock().await;
            if !state.cache.begin_load(code)? {
                tracing::debug!("Region {} already attempted, skipping load", code);
                return Ok(());
            }
            match state.cache.region(code) {
                Some(region) => region.clone(),
                None => return Ok(()),
            }
        };

        let outcome = fetch_region_data(self.inner.source.as_ref(), &region).await;

        let mut state = self.inner.state.lock().await;
        let progress = match outcome {
            Ok(data) => {
                let data = Arc::new(data);
                let progress = state.cache.complete_load(code, Ok(Arc::clone(&data)));
                tracing::info!(
                    "✅ Loaded {} ({} cells, {} facilities in matrix)",
                    region.name,
                    data.mesh.len(),
                    data.matrix.columns().len()
                );
                self.inner.presenter.render_static(&region, &data);
                progress
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to load data for {}: {}", code, e);
                state.cache.complete_load(code, Err(e.to_string()))
            }
        };
        // 鎖內送出，確保 completed 單調遞增
        self.inner.presenter.load_progress(&progress);
        Ok(())
    }

    pub async fn load_all(&self) {
        let codes: Vec<String> = {
            let state = self.inner.state.lock().await;
            state.cache.regions().iter().map(|r| r.code.clone()).collect()
        };

        let mut tasks = JoinSet::new();
        for code in codes {
            let session = self.clone();
            tasks.spawn(async move { session.load_region(&code).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("⚠️ Region load skipped: {}", e),
                Err(e) => tracing::warn!("⚠️ Region load task failed: {}", e),
            }
        }
    }

    pub async fn render_all(&self) {
        let regions: Vec<Region> = {
            let state = self.inner.state.lock().await;
            state.cache.regions().to_vec()
        };
        let total = regions.len();

        for (i, region) in regions.iter().enumerate() {
            let view = {
                let state = self.inner.state.lock().await;
                state.view(&region.code)
            };
            let Some((region, data, view)) = view else {
                continue;
            };

            self.inner.presenter.render_progress(&RenderProgress {
                index: i + 1,
                total,
                region_name: region.name.clone(),
            });
            tokio::task::yield_now().await;

            self.render_one(&region, &data, &view);
        }
    }

    fn render_one(&self, region: &Region, data: &RegionData, view: &RegionView) {
        if let Err(e) = self.inner.presenter.render_region(region, data, view) {
            tracing::warn!("⚠️ Render error for {}: {}", region.code, e);
        }
    }

    pub async fn recompute(&self) {
        let (views, scope, rows) = {
            let state = self.inner.state.lock().await;
            let views: Vec<_> = state
                .cache
                .regions()
                .iter()
                .filter_map(|r| state.view(&r.code))
                .collect();
            (views, state.scope.clone(), state.summary())
        };

        tracing::debug!("🔄 Recomputing {} loaded regions", views.len());
        for (region, data, view) in &views {
            self.render_one(region, data, view);
        }
        self.inner.presenter.show_summary(&scope, &rows);
    }

    async fn publish_summary(&self) {
        let (scope, rows) = {
            let state = self.inner.state.lock().await;
            (state.scope.clone(), state.summary())
        };
        self.inner.presenter.show_summary(&scope, &rows);
    }

    fn schedule_update(&self) {
        let session = self.clone();
        self.inner.scheduler.schedule(async move {
            session.recompute().await;
        });
    }

    async fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut FacilityRegistry),
    {
        let (active, total) = {
            let mut state = self.inner.state.lock().await;
            f(&mut state.registry);
            (state.registry.active_count(), state.registry.total_count())
        };
        self.inner.presenter.active_count(active, total);
        self.schedule_update();
    }

    pub async fn toggle_facility(&self, name: &str) {
        self.mutate(|registry| {
            registry.toggle(name);
        })
        .await;
    }

    pub async fn select_region(&self, code: &str) {
        self.mutate(|registry| registry.select_region(code)).await;
    }

    pub async fn deselect_region(&self, code: &str) {
        self.mutate(|registry| registry.deselect_region(code)).await;
    }

    pub async fn select_all(&self) {
        self.mutate(FacilityRegistry::select_all).await;
    }

    pub async fn deselect_all(&self) {
        self.mutate(FacilityRegistry::deselect_all).await;
    }

    /// Scope changes refresh the summary immediately, without debounce.
    pub async fn set_summary_scope(&self, scope: SummaryScope) {
        {
            let mut state = self.inner.state.lock().await;
            state.scope = scope;
        }
        self.publish_summary().await;
    }

    pub async fn wait_for_updates(&self) {
        self.inner.scheduler.wait_idle().await;
    }

    pub fn has_pending_update(&self) -> bool {
        self.inner.scheduler.is_pending()
    }

    pub async fn region_view(&self, code: &str) -> Option<RegionView> {
        let state = self.inner.state.lock().await;
        state.view(code).map(|(_, _, view)| view)
    }

    pub async fn summary(&self, scope: &SummaryScope) -> Vec<SummaryRow> {
        let state = self.inner.state.lock().await;
        compute_summary(&state.cache, scope, state.registry.active_set())
    }

    pub async fn current_summary(&self) -> Vec<SummaryRow> {
        let state = self.inner.state.lock().await;
        state.summary()
    }

    pub async fn summary_scope(&self) -> SummaryScope {
        self.inner.state.lock().await.scope.clone()
    }

    pub async fn region_state(&self, code: &str) -> Option<RegionState> {
        self.inner.state.lock().await.cache.state(code).cloned()
    }

    pub async fn regions(&self) -> Vec<Region> {
        self.inner.state.lock().await.cache.regions().to_vec()
    }

    pub async fn is_active(&self, name: &str) -> bool {
        self.inner.state.lock().await.registry.is_active(name)
    }

    pub async fn active_count(&self) -> (usize, usize) {
        let state = self.inner.state.lock().await;
        (state.registry.active_count(), state.registry.total_count())
    }
}
