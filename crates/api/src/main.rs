mod cache;
mod config;
mod metrics;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cache::{CacheStats, ExtractionCache};
use communities::ClusteringResult;
use config::{AppConfig, LogFormat};
use extract::{ExtractionResult, RfslExtractor};
use ingest::PatentRecord;
use metrics::{Metrics, MetricsSnapshot, TimedOperation};
use pipeline::{PipelineConfig, TaxonomyReport};
use pkg::{BuildError, BuildReport, GraphStats, KnowledgeGraph, PatentBuildStats, PkgBuilder};
use serde::{Deserialize, Serialize};
use similarity::{PatentSimilarity, SimilarityAnalyzer};
use std::sync::Arc;
use taxonomy::Taxonomy;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

struct AppState {
    config: AppConfig,
    extractor: Arc<RfslExtractor>,
    taxonomy: Taxonomy,
    graph: RwLock<KnowledgeGraph>,
    cache: ExtractionCache,
    metrics: Arc<Metrics>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    patents: usize,
    nodes: usize,
}

#[derive(Serialize)]
struct StatsResponse {
    graph: GraphStats,
    metrics: MetricsSnapshot,
    cache: CacheStats,
}

#[derive(Debug, Serialize)]
struct AddPatentResponse {
    extraction: ExtractionResult,
    merged: PatentBuildStats,
}

#[derive(Deserialize)]
struct PairQuery {
    patent1: String,
    patent2: String,
}

#[derive(Deserialize)]
struct TopQuery {
    top_n: Option<usize>,
}

#[derive(Deserialize)]
struct ClusterRequest {
    k: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let state = build_state(config)?;
    let addr = state.config.addr.clone();
    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let extractor = RfslExtractor::new(config.pipeline.load_lexicon()?)?
        .with_description_limit(config.pipeline.description_limit);

    // Resume from the persisted graph when one exists
    let graph_path = config.pipeline.graph_path();
    let graph = if graph_path.is_file() {
        KnowledgeGraph::load(&graph_path)?
    } else {
        KnowledgeGraph::new()
    };
    info!(patents = graph.patent_ids().len(), nodes = graph.node_count(), "Graph ready");

    let max_entries = if config.cache.enabled {
        config.cache.max_entries
    } else {
        0
    };

    Ok(Arc::new(AppState {
        extractor: Arc::new(extractor),
        taxonomy: Taxonomy::from_version(config.pipeline.taxonomy),
        graph: RwLock::new(graph),
        cache: ExtractionCache::new(max_entries),
        metrics: Metrics::new(),
        config,
    }))
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/extract", post(extract_patent))
        .route("/patents", post(add_patent))
        .route("/build", post(rebuild_graph))
        .route("/stats", get(get_stats))
        .route("/similarity", get(pair_similarity))
        .route("/similarity/:patent_id", get(similar_patents))
        .route("/cluster", post(cluster_patents))
        .route("/categorize", post(categorize_patent))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Count the request outcome before handing it back
fn finish<T>(state: &AppState, result: Result<T, StatusCode>) -> Result<T, StatusCode> {
    state.metrics.record_request(result.is_ok());
    result
}

fn internal(e: impl std::fmt::Display) -> StatusCode {
    error!(error = %e, "Request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Write the graph snapshot under the configured graph directory
async fn persist_graph(config: &PipelineConfig, graph: KnowledgeGraph) -> Result<(), StatusCode> {
    let graph_dir = config.graph_dir.clone();
    let path = config.graph_path();

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        std::fs::create_dir_all(&graph_dir)?;
        graph.save(&path)
    })
    .await
    .map_err(internal)?
    .map_err(internal)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let graph = state.graph.read().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        patents: graph.patent_ids().len(),
        nodes: graph.node_count(),
    })
}

async fn run_extraction(
    state: &AppState,
    record: PatentRecord,
) -> Result<ExtractionResult, StatusCode> {
    if record.patent_id.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if let Some(hit) = state.cache.get(&record) {
        return Ok(hit);
    }

    let timer = TimedOperation::start();
    let extractor = state.extractor.clone();
    let (record, result) = tokio::task::spawn_blocking(move || {
        let result = extractor.extract_from_patent(&record);
        (record, result)
    })
    .await
    .map_err(internal)?;

    state
        .metrics
        .record_extract(timer.elapsed(), result.stats.total_entities);
    state.cache.insert(&record, result.clone());
    Ok(result)
}

async fn extract_patent(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PatentRecord>,
) -> Result<Json<ExtractionResult>, StatusCode> {
    let result = run_extraction(&state, record).await.map(Json);
    finish(&state, result)
}

/// Extract one record, merge it into the live graph and persist the graph.
async fn add_patent(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PatentRecord>,
) -> Result<Json<AddPatentResponse>, StatusCode> {
    let result = async {
        let extraction = run_extraction(&state, record).await?;

        let timer = TimedOperation::start();
        let mut graph = state.graph.write().await;
        let mut builder =
            PkgBuilder::from_graph(std::mem::take(&mut *graph), state.config.pipeline.build);
        let merged = builder.add_extraction(&extraction);
        *graph = builder.into_graph();
        state.metrics.record_build(timer.elapsed());

        let merged = match merged {
            Ok(merged) => merged,
            Err(BuildError::DuplicatePatent(id)) => {
                warn!(patent_id = %id, "Patent already in graph");
                return Err(StatusCode::CONFLICT);
            }
            Err(e) => {
                warn!(error = %e, "Rejected extraction");
                return Err(StatusCode::UNPROCESSABLE_ENTITY);
            }
        };

        // saved under the write lock so snapshots land in merge order
        persist_graph(&state.config.pipeline, graph.clone()).await?;
        drop(graph);

        Ok(Json(AddPatentResponse { extraction, merged }))
    }
    .await;

    finish(&state, result)
}

/// Rebuild the graph from the extraction directory and persist it.
async fn rebuild_graph(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BuildReport>, StatusCode> {
    let result = async {
        let timer = TimedOperation::start();
        let config = state.config.pipeline.clone();

        let (graph, report) = tokio::task::spawn_blocking(move || {
            let mut builder = PkgBuilder::new(config.build);
            let report = builder.build_from_dir(&config.rfsl_dir)?;
            let graph = builder.into_graph();

            std::fs::create_dir_all(&config.graph_dir)?;
            graph.save(&config.graph_path())?;
            anyhow::Ok((graph, report))
        })
        .await
        .map_err(internal)?
        .map_err(internal)?;

        *state.graph.write().await = graph;
        state.metrics.record_build(timer.elapsed());
        Ok(Json(report))
    }
    .await;

    finish(&state, result)
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let graph = state.graph.read().await.stats();

    Json(StatsResponse {
        graph,
        metrics: state.metrics.snapshot(),
        cache: state.cache.stats(),
    })
}

async fn pair_similarity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PairQuery>,
) -> Result<Json<PatentSimilarity>, StatusCode> {
    let result = async {
        let timer = TimedOperation::start();
        let graph = state.graph.read().await;

        for id in [&query.patent1, &query.patent2] {
            if !graph.contains_patent(id) {
                return Err(StatusCode::NOT_FOUND);
            }
        }

        let similarity = SimilarityAnalyzer::new(&graph)
            .calculate(&query.patent1, &query.patent2)
            .map_err(internal)?;
        state.metrics.record_analysis(timer.elapsed());
        Ok(Json(similarity))
    }
    .await;

    finish(&state, result)
}

async fn similar_patents(
    State(state): State<Arc<AppState>>,
    Path(patent_id): Path<String>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<PatentSimilarity>>, StatusCode> {
    let result = async {
        let timer = TimedOperation::start();
        let graph = state.graph.read().await;

        if !graph.contains_patent(&patent_id) {
            return Err(StatusCode::NOT_FOUND);
        }

        let top_n = query.top_n.unwrap_or(state.config.pipeline.similarity.top_n);
        let results = SimilarityAnalyzer::new(&graph)
            .most_similar(&patent_id, top_n)
            .map_err(internal)?;
        state.metrics.record_analysis(timer.elapsed());
        Ok(Json(results))
    }
    .await;

    finish(&state, result)
}

async fn cluster_patents(
    State(state): State<Arc<AppState>>,
    request: Option<Json<ClusterRequest>>,
) -> Result<Json<ClusteringResult>, StatusCode> {
    let result = async {
        let k = request.and_then(|Json(r)| r.k);
        let timer = TimedOperation::start();

        let graph = state.graph.read().await.clone();
        if graph.is_empty() {
            return Err(StatusCode::CONFLICT);
        }

        let config = state.config.pipeline.clustering.clone();
        let clustering = tokio::task::spawn_blocking(move || {
            communities::PatentClusterer::from_graph(&graph, config).cluster(k)
        })
        .await
        .map_err(internal)?
        .map_err(|e| {
            warn!(error = %e, "Clustering rejected");
            StatusCode::UNPROCESSABLE_ENTITY
        })?;

        state.metrics.record_analysis(timer.elapsed());
        Ok(Json(clustering))
    }
    .await;

    finish(&state, result)
}

async fn categorize_patent(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PatentRecord>,
) -> Result<Json<TaxonomyReport>, StatusCode> {
    let report = pipeline::categorize_record(&state.taxonomy, &record);
    finish(&state, Ok(Json(report)))
}
