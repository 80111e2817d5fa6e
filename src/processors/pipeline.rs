use crate::error::{PipelineStage, ProcessingError, Result};
use crate::models::{EmissionGrid, EmissionPoint, EstimatedSegment, RoadClass, RoadNetwork};
use crate::processors::spatial_aggregator::{PointLayer, SkippedRecord};
use crate::processors::{EmissionEstimator, SpatialAggregator};
use crate::settings::PipelineConfig;
use crate::utils::progress::ProgressReporter;
use crate::writers::ArtifactWriter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Per road class totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassBreakdown {
    pub class: RoadClass,
    pub segments: usize,
    pub length_km: f64,
    pub co2_kg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationReport {
    pub place: String,
    pub generated_at: DateTime<Utc>,
    pub emission_factor: f64,
    pub grid_size: usize,
    pub total_segments: usize,
    pub points: usize,
    pub skipped: Vec<SkippedRecord>,
    pub segment_co2_kg: f64,
    pub point_co2_kg: f64,
    pub grid_co2_kg: f64,
    pub non_empty_cells: usize,
    /// `(min_lon, min_lat, max_lon, max_lat)` of the binned centroids
    pub extent: (f64, f64, f64, f64),
    pub classes: Vec<ClassBreakdown>,
}

impl AggregationReport {
    fn new(
        place: &str,
        emission_factor: f64,
        estimated: &[EstimatedSegment],
        layer: &PointLayer,
        grid: &EmissionGrid,
    ) -> Self {
        let classes = RoadClass::PRIORITY
            .iter()
            .chain(std::iter::once(&RoadClass::Other))
            .map(|class| {
                let matching = estimated.iter().filter(|s| s.segment.road_class == *class);
                let (segments, length_km, co2_kg) =
                    matching.fold((0, 0.0, 0.0), |(n, km, co2), s| {
                        (n + 1, km + s.segment.length_km(), co2 + s.co2_kg)
                    });
                ClassBreakdown {
                    class: *class,
                    segments,
                    length_km,
                    co2_kg,
                }
            })
            .collect();

        Self {
            place: place.to_string(),
            generated_at: Utc::now(),
            emission_factor,
            grid_size: grid.size,
            total_segments: estimated.len(),
            points: layer.points.len(),
            skipped: layer.skipped.clone(),
            segment_co2_kg: estimated.iter().map(|s| s.co2_kg).sum(),
            point_co2_kg: layer.points.iter().map(|p| p.co2).sum(),
            grid_co2_kg: grid.total_co2(),
            non_empty_cells: grid.non_empty_cells(),
            extent: grid.extent,
            classes,
        }
    }

    /// Grid total matches the point total within a relative tolerance
    pub fn is_conserved(&self, tolerance: f64) -> bool {
        (self.grid_co2_kg - self.point_co2_kg).abs() <= tolerance * self.point_co2_kg.abs().max(1.0)
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== EMISSION AGGREGATION REPORT ===\n");
        summary.push_str(&format!("Place: {}\n", self.place));
        summary.push_str(&format!(
            "Emission factor: {} kg CO₂/km, grid: {}x{}\n\n",
            self.emission_factor, self.grid_size, self.grid_size
        ));

        summary.push_str(&format!("Segments: {}\n", self.total_segments));
        summary.push_str(&format!("Emission points: {}\n", self.points));
        summary.push_str(&format!("Skipped segments: {}\n", self.skipped.len()));
        summary.push_str(&format!(
            "Total CO₂: {:.3} kg (grid: {:.3} kg)\n",
            self.segment_co2_kg, self.grid_co2_kg
        ));
        summary.push_str(&format!(
            "Non-empty cells: {}/{}\n",
            self.non_empty_cells,
            self.grid_size * self.grid_size
        ));
        summary.push_str(&format!(
            "Extent: lon [{:.5}, {:.5}], lat [{:.5}, {:.5}]\n",
            self.extent.0, self.extent.2, self.extent.1, self.extent.3
        ));

        summary.push_str("\nBy road class:\n");
        for class in self.classes.iter().filter(|c| c.segments > 0) {
            summary.push_str(&format!(
                "  {:<12} {:>7} segments {:>10.1} km {:>10.3} kg\n",
                class.class.as_str(),
                class.segments,
                class.length_km,
                class.co2_kg
            ));
        }

        if !self.skipped.is_empty() {
            summary.push_str("\nFirst skipped segments:\n");
            for skipped in self.skipped.iter().take(5) {
                summary.push_str(&format!(
                    "  #{} ({} -> {}): {}\n",
                    skipped.index, skipped.edge.0, skipped.edge.1, skipped.reason
                ));
            }
        }

        summary
    }
}

/// Everything one run produces, held in memory
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub points: Vec<EmissionPoint>,
    pub grid: EmissionGrid,
    pub report: AggregationReport,
}

/// Estimate → points → grid over one network
pub struct EmissionPipeline {
    estimator: EmissionEstimator,
    aggregator: SpatialAggregator,
    max_workers: usize,
}

impl EmissionPipeline {
    pub fn new(max_workers: usize) -> Self {
        Self {
            estimator: EmissionEstimator::new(),
            aggregator: SpatialAggregator::new(),
            max_workers: max_workers.max(1),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let estimator =
            EmissionEstimator::new().with_emission_factor(config.estimator.emission_factor)?;
        let aggregator = SpatialAggregator::new().with_grid_size(config.grid.size)?;

        Ok(Self::new(config.processing.max_workers)
            .with_estimator(estimator)
            .with_aggregator(aggregator))
    }

    pub fn with_estimator(mut self, estimator: EmissionEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_aggregator(mut self, aggregator: SpatialAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Run all stages in memory
    pub fn process(&self, network: &RoadNetwork) -> Result<PipelineOutput> {
        let pool = self.thread_pool()?;

        let estimated = self.estimate(&pool, network);
        let layer = self.locate(&pool, &estimated);
        let grid = self.grid(&layer)?;
        let report = self.report(network, &estimated, &layer, &grid);

        Ok(PipelineOutput {
            points: layer.points,
            grid,
            report,
        })
    }

    /// Run all stages, writing each artifact as soon as it is ready.
    ///
    /// The point file is written before the grid is computed, so a grid
    /// failure leaves the points in place.
    pub fn run(
        &self,
        network: &RoadNetwork,
        writer: &ArtifactWriter,
        progress: Option<&ProgressReporter>,
    ) -> Result<AggregationReport> {
        let pool = self.thread_pool()?;

        if let Some(p) = progress {
            p.set_message("Estimating segment emissions...");
        }
        let estimated = self.estimate(&pool, network);

        if let Some(p) = progress {
            p.set_message("Exporting emission points...");
        }
        let layer = self.locate(&pool, &estimated);
        if let Some(p) = progress.filter(|_| !layer.skipped.is_empty()) {
            p.println(&format!(
                "Skipped {} segments with unusable geometry",
                layer.skipped.len()
            ));
        }
        writer
            .write_points(&layer.points)
            .map_err(|e| e.in_stage(PipelineStage::Write))?;

        if let Some(p) = progress {
            p.set_message("Generating grid...");
        }
        let grid = self.grid(&layer)?;
        writer
            .write_grid(&grid)
            .map_err(|e| e.in_stage(PipelineStage::Write))?;

        let report = self.report(network, &estimated, &layer, &grid);
        writer
            .write_summary(&report)
            .map_err(|e| e.in_stage(PipelineStage::Write))?;

        if let Some(p) = progress {
            p.finish_with_message("Pipeline complete");
        }

        Ok(report)
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()).in_stage(PipelineStage::Estimate))
    }

    fn estimate(&self, pool: &rayon::ThreadPool, network: &RoadNetwork) -> Vec<EstimatedSegment> {
        let segments = network.to_segments();
        let estimated = pool.install(|| self.estimator.estimate(&segments));
        info!(segments = estimated.len(), "Computed emissions");
        estimated
    }

    fn locate(&self, pool: &rayon::ThreadPool, estimated: &[EstimatedSegment]) -> PointLayer {
        let layer = pool.install(|| self.aggregator.locate(estimated));
        info!(
            points = layer.points.len(),
            skipped = layer.skipped.len(),
            "Located emission points"
        );
        layer
    }

    fn grid(&self, layer: &PointLayer) -> Result<EmissionGrid> {
        let grid = self
            .aggregator
            .grid_from_points(&layer.points)
            .map_err(|e| e.in_stage(PipelineStage::Grid))?;
        info!(
            grid_size = grid.size,
            non_empty = grid.non_empty_cells(),
            "Generated grid"
        );
        Ok(grid)
    }

    fn report(
        &self,
        network: &RoadNetwork,
        estimated: &[EstimatedSegment],
        layer: &PointLayer,
        grid: &EmissionGrid,
    ) -> AggregationReport {
        AggregationReport::new(
            &network.place,
            self.estimator.emission_factor(),
            estimated,
            layer,
            grid,
        )
    }
}

impl Default for EmissionPipeline {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HighwayTag, NetworkEdge, NetworkNode};
    use crate::settings::PipelineConfig;
    use tempfile::TempDir;

    fn edge(
        u: i64,
        v: i64,
        from: (f64, f64),
        to: (f64, f64),
        length_m: f64,
        tag: &str,
    ) -> NetworkEdge {
        NetworkEdge::new(u, v, vec![from, to], Some(length_m))
            .with_highway(HighwayTag::Single(tag.to_string()))
    }

    fn network() -> RoadNetwork {
        RoadNetwork::new(
            "Testville".to_string(),
            vec![
                NetworkNode::new(1, 12.90, 77.50),
                NetworkNode::new(2, 12.90, 77.60),
                NetworkNode::new(3, 13.00, 77.60),
            ],
            vec![
                edge(1, 2, (77.50, 12.90), (77.60, 12.90), 1000.0, "motorway"),
                edge(2, 1, (77.60, 12.90), (77.50, 12.90), 1000.0, "motorway"),
                edge(2, 3, (77.60, 12.90), (77.60, 13.00), 2000.0, "residential"),
                NetworkEdge::new(3, 1, vec![], Some(500.0)),
            ],
        )
    }

    #[test]
    fn test_process_in_memory() -> Result<()> {
        let output = EmissionPipeline::new(2).process(&network())?;

        assert_eq!(output.points.len(), 3);
        assert_eq!(output.grid.cells.len(), 100);
        assert_eq!(output.report.total_segments, 4);
        assert_eq!(output.report.skipped.len(), 1);
        assert_eq!(output.report.skipped[0].edge, (3, 1));

        // 0.18 + 0.18 + 2 * 0.12 * 0.8 + 0.5 * 0.12
        assert!((output.report.segment_co2_kg - 0.612).abs() < 1e-9);
        assert!((output.report.point_co2_kg - 0.552).abs() < 1e-9);
        assert!(output.report.is_conserved(1e-9));

        let motorway = &output.report.classes[0];
        assert_eq!(motorway.class, RoadClass::Motorway);
        assert_eq!(motorway.segments, 2);
        assert!((motorway.length_km - 2.0).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn test_run_writes_all_artifacts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = PipelineConfig::default();
        config.output.dir = temp_dir.path().join("out");
        config.grid.size = 4;

        let pipeline = EmissionPipeline::from_config(&config)?;
        let writer = ArtifactWriter::from_config(&config)?;
        let report = pipeline.run(&network(), &writer, None)?;

        assert_eq!(report.grid_size, 4);
        assert!(config.output.points_path().exists());
        assert!(config.output.grid_path(config.grid.format).exists());
        assert!(config.output.summary_path().exists());

        Ok(())
    }

    #[test]
    fn test_grid_failure_is_attributed_and_keeps_points() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = PipelineConfig::default();
        config.output.dir = temp_dir.path().to_path_buf();

        let only_bad = RoadNetwork::new(
            "Nowhere".to_string(),
            vec![],
            vec![NetworkEdge::new(1, 2, vec![], Some(10.0))],
        );

        let writer = ArtifactWriter::from_config(&config)?;
        let err = EmissionPipeline::new(1)
            .run(&only_bad, &writer, None)
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Grid));
        assert!(config.output.points_path().exists());
        assert!(!config.output.grid_path(config.grid.format).exists());

        Ok(())
    }

    #[test]
    fn test_summary_mentions_classes() -> Result<()> {
        let output = EmissionPipeline::new(1).process(&network())?;
        let summary = output.report.summary();

        assert!(summary.contains("Testville"));
        assert!(summary.contains("motorway"));
        assert!(summary.contains("residential"));
        assert!(summary.contains("Skipped segments: 1"));

        Ok(())
    }
}
